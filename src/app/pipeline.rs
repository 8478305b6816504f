// src/app/pipeline.rs
//! Voice + music bed -> exported, timed and tagged track.

use std::path::{Path, PathBuf};

use tracing::{info, warn};

use crate::audio::{
    export, load_audio, mix_background, verify_metadata, write_metadata, AudioFormat, MetadataReport,
    MixSettings, TrackTags,
};
use crate::error::Result;
use crate::lyrics::{lrc_path_for, LyricTimer};

/// Everything [`add_background_music`] needs for one track.
#[derive(Debug, Clone)]
pub struct BgmRequest {
    pub voice: PathBuf,
    pub music: PathBuf,
    /// Plain text; one lyric per non-blank line.
    pub lyrics: Option<PathBuf>,
    /// Defaults to `<voice dir>/<voice stem>_with_bgm.mp3`.
    pub output: Option<PathBuf>,
    pub settings: MixSettings,
    pub album: Option<String>,
    pub artist: Option<String>,
    pub cover: Option<PathBuf>,
}

impl BgmRequest {
    pub fn new(voice: impl Into<PathBuf>, music: impl Into<PathBuf>) -> Self {
        Self {
            voice: voice.into(),
            music: music.into(),
            lyrics: None,
            output: None,
            settings: MixSettings::default(),
            album: None,
            artist: None,
            cover: None,
        }
    }

    pub fn output_path(&self) -> PathBuf {
        match &self.output {
            Some(path) => path.clone(),
            None => default_output_for(&self.voice),
        }
    }
}

pub fn default_output_for(voice: &Path) -> PathBuf {
    let stem = voice
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    voice.with_file_name(format!("{stem}_with_bgm.mp3"))
}

/// What the pipeline produced.
#[derive(Debug, Clone)]
pub struct BgmOutput {
    pub path: PathBuf,
    pub format: AudioFormat,
    pub duration_ms: u64,
    /// Set when lyric timing succeeded.
    pub lrc: Option<PathBuf>,
    /// Set when the output was tagged and read back.
    pub report: Option<MetadataReport>,
}

/// Mix, export, time lyrics and tag.
///
/// Format and decode problems abort before anything is written. Lyric and
/// metadata problems are logged and leave a playable, possibly untagged file.
pub fn add_background_music(request: &BgmRequest) -> Result<BgmOutput> {
    let output = request.output_path();
    AudioFormat::from_path(&request.voice)?;
    AudioFormat::from_path(&request.music)?;
    AudioFormat::from_path(&output)?;

    let voice = load_audio(&request.voice)?;
    let music = load_audio(&request.music)?;
    let mixed = mix_background(&voice, &music, &request.settings)?;
    let duration_ms = mixed.duration_ms();
    let track_secs = mixed.duration_secs();

    let format = export(&mixed, &output)?;
    info!(path = %output.display(), duration_ms, "background music added");

    let lrc = request.lyrics.as_deref().and_then(|lyrics| {
        info!(lyrics = %lyrics.display(), "generating timestamped lyrics");
        let lrc = lrc_path_for(&output);
        match LyricTimer::default()
            .schedule_file(track_secs, lyrics)
            .and_then(|timed| timed.write_lrc(&lrc))
        {
            Ok(()) => Some(lrc),
            Err(e) => {
                warn!(error = %e, "lyric timing failed; continuing without LRC");
                None
            }
        }
    });

    let report = if format.is_tag_capable() {
        let tags = TrackTags {
            album: request.album.clone(),
            artist: request.artist.clone(),
            cover: request.cover.clone(),
            lyrics: lrc.clone(),
            write_sidecar: false,
        };
        match write_metadata(&output, &tags).and_then(|()| verify_metadata(&output)) {
            Ok(report) => Some(report),
            Err(e) => {
                warn!(error = %e, "could not tag output");
                None
            }
        }
    } else {
        info!(%format, "format does not carry ID3 tags; skipping metadata");
        None
    };

    Ok(BgmOutput {
        path: output,
        format,
        duration_ms,
        lrc,
        report,
    })
}
