// src/audio/metadata.rs
//! Track metadata: write album/artist/cover/lyrics tags with Lofty and read them back.

use std::borrow::Cow;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use lofty::config::WriteOptions;
use lofty::file::{AudioFile, TaggedFileExt};
use lofty::id3::v2::{
    BinaryFrame, Frame, FrameId, Id3v2Tag, SyncTextContentType, SynchronizedTextFrame, TimestampFormat,
    UnsynchronizedTextFrame,
};
use lofty::picture::{MimeType, Picture, PictureType};
use lofty::probe::Probe;
use lofty::tag::{Accessor, ItemKey, Tag, TagExt, TagType};
use lofty::TextEncoding;
use tracing::{debug, info, warn};

use super::artwork::prepare_cover;
use crate::error::{Error, Result};
use crate::lyrics::{lrc_path_for, parse_lrc, SyncedLyric};

/// ISO-639-2 language written into both lyrics frames.
pub const LYRICS_LANGUAGE: [u8; 3] = *b"zho";

/// Container duration from the file's audio properties. Zero when the
/// container does not record one.
pub fn read_duration(path: &Path) -> Result<Duration> {
    if !path.exists() {
        return Err(Error::FileNotFound(path.to_path_buf()));
    }
    let tagged_file = Probe::open(path)?.read()?;
    Ok(tagged_file.properties().duration())
}

/// Fields to attach to an exported file. Every field is optional.
#[derive(Debug, Clone, Default)]
pub struct TrackTags {
    pub album: Option<String>,
    pub artist: Option<String>,
    /// Image file to normalise and embed as the front cover.
    pub cover: Option<PathBuf>,
    /// LRC (or plain text) file providing the lyric block.
    pub lyrics: Option<PathBuf>,
    /// Also copy the lyrics to `<audio stem>.lrc` next to the audio file.
    pub write_sidecar: bool,
}

/// Attach `tags` to `audio` as an ID3v2 tag.
///
/// Cover and lyric problems are logged and skipped so the remaining fields
/// still land; only failing to read or save the tag itself is returned.
pub fn write_metadata(audio: &Path, tags: &TrackTags) -> Result<()> {
    if !audio.exists() {
        return Err(Error::FileNotFound(audio.to_path_buf()));
    }
    let mut tag = existing_id3(audio)?;

    if let Some(album) = &tags.album {
        tag.set_album(album.clone());
        info!(%album, "album set");
    }
    if let Some(artist) = &tags.artist {
        tag.set_artist(artist.clone());
        info!(%artist, "artist set");
    }

    match tags.cover.as_deref() {
        Some(cover) => match prepare_cover(cover) {
            Ok(jpeg) => {
                let size = jpeg.len();
                tag.remove_picture_type(PictureType::CoverFront);
                tag.push_picture(Picture::new_unchecked(
                    PictureType::CoverFront,
                    Some(MimeType::Jpeg),
                    Some("Cover".to_string()),
                    jpeg,
                ));
                info!(cover = %cover.display(), size, "cover image added");
            }
            Err(e) => warn!(cover = %cover.display(), error = %e, "skipping cover image"),
        },
        None => debug!("no cover image given"),
    }

    let mut unsynced = None;
    let mut synced = Vec::new();
    if let Some(lyrics) = tags.lyrics.as_deref() {
        match fs::read_to_string(lyrics) {
            Ok(content) => {
                debug!(chars = content.chars().count(), "lyric content loaded");
                match parse_lrc(&content) {
                    Ok(events) => synced = events,
                    Err(e) => warn!(error = %e, "lyrics are not valid LRC; skipping synced lyrics"),
                }
                if tags.write_sidecar {
                    write_sidecar(audio, lyrics, &content);
                }
                tag.remove_key(&ItemKey::Lyrics);
                unsynced = Some(content);
            }
            Err(e) => warn!(lyrics = %lyrics.display(), error = %e, "skipping lyrics"),
        }
    }

    let mut id3 = Id3v2Tag::from(tag);
    if let Some(content) = unsynced {
        // stale timings from an earlier tagging pass
        id3.remove(&sylt_id()).for_each(drop);
        id3.insert(Frame::UnsynchronizedText(UnsynchronizedTextFrame::new(
            TextEncoding::UTF8,
            LYRICS_LANGUAGE,
            String::new(),
            content,
        )));
    }
    if !synced.is_empty() {
        match sylt_frame(&synced) {
            Ok(frame) => {
                id3.insert(frame);
                info!(events = synced.len(), "synchronized lyrics added");
            }
            Err(e) => warn!(error = %e, "skipping synchronized lyrics"),
        }
    }

    id3.save_to_path(audio, WriteOptions::default())?;
    info!(path = %audio.display(), "metadata saved");
    Ok(())
}

/// The file's current ID3v2 tag, or a fresh one.
fn existing_id3(audio: &Path) -> Result<Tag> {
    let tagged_file = Probe::open(audio)?.read()?;
    Ok(tagged_file
        .tag(TagType::Id3v2)
        .cloned()
        .unwrap_or_else(|| Tag::new(TagType::Id3v2)))
}

fn write_sidecar(audio: &Path, source: &Path, content: &str) {
    let sidecar = lrc_path_for(audio);
    if sidecar == source {
        return;
    }
    match fs::write(&sidecar, content) {
        Ok(()) => info!(path = %sidecar.display(), "external LRC file created"),
        Err(e) => warn!(path = %sidecar.display(), error = %e, "could not write LRC sidecar"),
    }
}

fn sylt_id() -> FrameId<'static> {
    FrameId::Valid(Cow::Borrowed("SYLT"))
}

/// SYLT frame with millisecond stamps. Lofty keeps SYLT as raw bytes, so the
/// typed frame is serialised and wrapped.
fn sylt_frame(events: &[SyncedLyric]) -> Result<Frame<'static>> {
    let content = events.iter().map(|e| (e.offset_ms, e.text.clone())).collect();
    let sylt = SynchronizedTextFrame::new(
        TextEncoding::UTF8,
        LYRICS_LANGUAGE,
        TimestampFormat::MS,
        SyncTextContentType::Lyrics,
        None,
        content,
    );
    Ok(Frame::Binary(BinaryFrame::new(sylt_id(), sylt.as_bytes()?)))
}

/// The file's ID3v2 tag with its format-specific frames (SYLT, language codes).
fn read_id3(audio: &Path) -> Result<Option<Id3v2Tag>> {
    let tagged_file = Probe::open(audio)?.read()?;
    Ok(tagged_file.tag(TagType::Id3v2).cloned().map(Id3v2Tag::from))
}

fn synced_lyrics_of(id3: &Id3v2Tag) -> Result<Vec<SyncedLyric>> {
    let Some(Frame::Binary(frame)) = id3.get(&sylt_id()) else {
        return Ok(Vec::new());
    };
    let sylt = SynchronizedTextFrame::parse(&frame.data, frame.flags())?;
    Ok(sylt
        .content
        .into_iter()
        .map(|(offset_ms, text)| SyncedLyric { offset_ms, text })
        .collect())
}

/// Timed lines stored in the file's SYLT frame, empty when there is none.
pub fn read_synced_lyrics(audio: &Path) -> Result<Vec<SyncedLyric>> {
    match read_id3(audio)? {
        Some(id3) => synced_lyrics_of(&id3),
        None => Ok(Vec::new()),
    }
}

/// Which tag fields were found on a file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MetadataReport {
    pub album: Option<String>,
    pub artist: Option<String>,
    /// Size of the front cover in bytes, when present.
    pub cover_bytes: Option<usize>,
    pub lyrics: Option<String>,
    /// ISO-639-2 code of the USLT frame.
    pub lyrics_language: Option<String>,
    /// Number of SYLT entries.
    pub synced_lines: usize,
}

impl MetadataReport {
    pub fn is_complete(&self) -> bool {
        self.album.is_some() && self.artist.is_some() && self.cover_bytes.is_some() && self.lyrics.is_some()
    }
}

/// Re-open `audio` and log which fields are present. Diagnostics only: a
/// missing field is reported, never raised.
pub fn verify_metadata(audio: &Path) -> Result<MetadataReport> {
    let tagged_file = Probe::open(audio)?.read()?;
    let Some(tag) = tagged_file.tag(TagType::Id3v2) else {
        warn!(path = %audio.display(), "no ID3v2 tag present");
        return Ok(MetadataReport::default());
    };
    let id3 = Id3v2Tag::from(tag.clone());

    let synced_lines = match synced_lyrics_of(&id3) {
        Ok(lines) => lines.len(),
        Err(e) => {
            warn!(error = %e, "unreadable synchronized lyrics");
            0
        }
    };
    let report = MetadataReport {
        album: tag.album().map(|s| s.into_owned()),
        artist: tag.artist().map(|s| s.into_owned()),
        cover_bytes: tag
            .get_picture_type(PictureType::CoverFront)
            .or_else(|| tag.pictures().first())
            .map(|p| p.data().len()),
        lyrics: tag.get_string(&ItemKey::Lyrics).map(str::to_owned),
        lyrics_language: id3
            .unsync_text()
            .next()
            .map(|f| String::from_utf8_lossy(&f.language).into_owned()),
        synced_lines,
    };

    info!(path = %audio.display(), "verifying metadata");
    info!("album: {}", report.album.as_deref().unwrap_or("not set"));
    info!("artist: {}", report.artist.as_deref().unwrap_or("not set"));
    match report.cover_bytes {
        Some(size) => info!("cover image: present ({size} bytes)"),
        None => info!("cover image: not present"),
    }
    match &report.lyrics {
        Some(l) => {
            let preview: String = l.chars().take(100).collect();
            let lang = report.lyrics_language.as_deref().unwrap_or("?");
            info!("lyrics: present ({} characters, {lang}): {preview}", l.chars().count());
        }
        None => info!("lyrics: not present"),
    }
    info!("synchronized lyrics: {} lines", report.synced_lines);

    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sylt_frame_layout() {
        let Frame::Binary(frame) = sylt_frame(&[SyncedLyric { offset_ms: 3000, text: "ab".into() }]).unwrap() else {
            panic!("SYLT is stored as a binary frame");
        };
        assert_eq!(frame.id(), &sylt_id());
        assert_eq!(
            frame.data,
            vec![3, b'z', b'h', b'o', 2, 1, 0, b'a', b'b', 0, 0, 0, 0x0B, 0xB8]
        );
    }

    #[test]
    fn read_duration_of_missing_file() {
        assert!(matches!(read_duration(Path::new("/nope/in.wav")), Err(Error::FileNotFound(_))));
    }

    #[test]
    fn missing_audio_is_an_error() {
        let err = write_metadata(Path::new("/nope/out.mp3"), &TrackTags::default()).unwrap_err();
        assert!(matches!(err, Error::FileNotFound(_)));
    }

    #[test]
    fn report_completeness() {
        let mut report = MetadataReport {
            album: Some("X".into()),
            artist: Some("Y".into()),
            cover_bytes: Some(10),
            ..MetadataReport::default()
        };
        assert!(!report.is_complete());
        report.lyrics = Some("[00:03.00]x".into());
        assert!(report.is_complete());
    }
}
