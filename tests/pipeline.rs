mod common;

use std::fs;
use std::io::Cursor;
use std::path::Path;

use image::{DynamicImage, ImageFormat, Rgba, RgbaImage};
use warbler::app::{add_background_music, BgmRequest};
use warbler::audio::{read_synced_lyrics, verify_metadata, write_metadata, AudioFormat, TrackTags};
use warbler::lyrics::parse_lrc;
use warbler::Error;

use common::{wav_duration_ms, write_sine};

const LYRICS: &str = "程序员之歌\n\n清晨的键盘\n深夜的灯光\n代码里的远方\n";

fn fixtures(dir: &Path) -> BgmRequest {
    let voice = dir.join("voice.wav");
    let music = dir.join("bed.wav");
    write_sine(&voice, 1, 22_050, 10_000, 440.0);
    // Wider and at a different rate, so the mix has to reconcile layouts.
    write_sine(&music, 2, 16_000, 4_000, 220.0);
    BgmRequest::new(voice, music)
}

fn png_cover(path: &Path) {
    let mut bytes = Vec::new();
    DynamicImage::ImageRgba8(RgbaImage::from_pixel(40, 30, Rgba([30, 90, 200, 180])))
        .write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
        .unwrap();
    fs::write(path, bytes).unwrap();
}

#[test]
fn mixes_times_and_tags_a_wav() {
    let dir = tempfile::tempdir().unwrap();
    let lyrics = dir.path().join("poem.txt");
    fs::write(&lyrics, LYRICS).unwrap();

    let request = BgmRequest {
        lyrics: Some(lyrics),
        output: Some(dir.path().join("out").join("song.wav")),
        album: Some("X".into()),
        artist: Some("Y".into()),
        ..fixtures(dir.path())
    };
    let output = add_background_music(&request).unwrap();

    assert_eq!(output.format, AudioFormat::Wav);
    assert_eq!(output.duration_ms, 12_000);
    let on_disk = wav_duration_ms(&output.path);
    assert_eq!(on_disk, 12_000);
    let spec = hound::WavReader::open(&output.path).unwrap().spec();
    assert_eq!((spec.channels, spec.sample_rate), (2, 22_050));

    let lrc = output.lrc.expect("lrc written");
    assert_eq!(lrc, dir.path().join("out").join("song.lrc"));
    let events = parse_lrc(&fs::read_to_string(&lrc).unwrap()).unwrap();
    assert_eq!(events.len(), 4);
    assert_eq!(events[0].offset_ms, 3000);
    assert!(events.windows(2).all(|w| w[0].offset_ms < w[1].offset_ms));
    assert!(events.last().unwrap().offset_ms < 12_000);

    let report = output.report.expect("tags written");
    assert_eq!(report.album.as_deref(), Some("X"));
    assert_eq!(report.artist.as_deref(), Some("Y"));
    assert!(report.lyrics.unwrap().starts_with("[00:03.00]程序员之歌"));
    assert_eq!(report.lyrics_language.as_deref(), Some("zho"));
    assert_eq!(report.synced_lines, 4);
    assert_eq!(report.cover_bytes, None);

    let synced = read_synced_lyrics(&output.path).unwrap();
    let stamps: Vec<u32> = synced.iter().map(|l| l.offset_ms).collect();
    let lrc_stamps: Vec<u32> = events.iter().map(|l| l.offset_ms).collect();
    assert_eq!(stamps, lrc_stamps);
    assert_eq!(synced[0].text, "程序员之歌");
}

#[test]
fn default_output_is_an_mp3_with_cover() {
    let dir = tempfile::tempdir().unwrap();
    let cover = dir.path().join("cover.png");
    png_cover(&cover);

    let request = BgmRequest {
        album: Some("X".into()),
        artist: Some("Y".into()),
        cover: Some(cover),
        ..fixtures(dir.path())
    };
    let output = add_background_music(&request).unwrap();

    assert_eq!(output.path, dir.path().join("voice_with_bgm.mp3"));
    assert_eq!(output.format, AudioFormat::Mp3);
    assert!(output.lrc.is_none());

    let report = verify_metadata(&output.path).unwrap();
    assert_eq!(report.album.as_deref(), Some("X"));
    assert_eq!(report.artist.as_deref(), Some("Y"));
    assert!(report.cover_bytes.unwrap() > 0);
}

#[test]
fn corrupt_cover_still_leaves_other_tags() {
    let dir = tempfile::tempdir().unwrap();
    let audio = dir.path().join("song.wav");
    write_sine(&audio, 1, 8_000, 1_000, 330.0);
    let cover = dir.path().join("cover.png");
    fs::write(&cover, b"\x89PNG\r\n\x1a\nthis is not really a png").unwrap();
    let lyrics = dir.path().join("song.lrc");
    fs::write(&lyrics, "[00:00.50]one\n[00:00.80]two\n").unwrap();

    let tags = TrackTags {
        album: Some("X".into()),
        artist: Some("Y".into()),
        cover: Some(cover),
        lyrics: Some(lyrics),
        write_sidecar: true,
    };
    write_metadata(&audio, &tags).unwrap();

    let report = verify_metadata(&audio).unwrap();
    assert_eq!(report.album.as_deref(), Some("X"));
    assert_eq!(report.artist.as_deref(), Some("Y"));
    assert_eq!(report.lyrics.as_deref(), Some("[00:00.50]one\n[00:00.80]two\n"));
    assert_eq!(report.cover_bytes, None);
    assert!(!report.is_complete());
}

#[test]
fn retagging_replaces_both_lyric_frames() {
    let dir = tempfile::tempdir().unwrap();
    let audio = dir.path().join("song.mp3");
    let request = BgmRequest {
        output: Some(audio.clone()),
        ..fixtures(dir.path())
    };
    add_background_music(&request).unwrap();

    for body in ["[00:03.00]旧\n", "[00:03.00]新\n[00:05.00]词\n"] {
        let lyrics = dir.path().join("lyrics.lrc");
        fs::write(&lyrics, body).unwrap();
        let tags = TrackTags {
            lyrics: Some(lyrics),
            ..TrackTags::default()
        };
        write_metadata(&audio, &tags).unwrap();
    }

    let report = verify_metadata(&audio).unwrap();
    assert_eq!(report.lyrics.as_deref(), Some("[00:03.00]新\n[00:05.00]词\n"));
    assert_eq!(report.lyrics_language.as_deref(), Some("zho"));
    let synced = read_synced_lyrics(&audio).unwrap();
    assert_eq!(synced.len(), 2);
    assert_eq!((synced[1].offset_ms, synced[1].text.as_str()), (5000, "词"));
}

#[test]
fn unsupported_extensions_fail_before_decoding() {
    let dir = tempfile::tempdir().unwrap();
    let request = fixtures(dir.path());

    let bad_input = BgmRequest {
        voice: dir.path().join("voice.xyz"),
        ..request.clone()
    };
    assert!(matches!(add_background_music(&bad_input), Err(Error::UnsupportedFormat(_))));

    let bad_output = BgmRequest {
        output: Some(dir.path().join("song.xyz")),
        ..request.clone()
    };
    assert!(matches!(add_background_music(&bad_output), Err(Error::UnsupportedFormat(_))));
    assert!(!dir.path().join("song.xyz").exists());

    let no_encoder = BgmRequest {
        output: Some(dir.path().join("song.flac")),
        ..request
    };
    assert!(matches!(add_background_music(&no_encoder), Err(Error::EncoderUnavailable(AudioFormat::Flac))));
}

#[test]
fn short_track_skips_lyrics_but_keeps_audio() {
    let dir = tempfile::tempdir().unwrap();
    let voice = dir.path().join("blip.wav");
    let music = dir.path().join("bed.wav");
    write_sine(&voice, 1, 8_000, 200, 440.0);
    write_sine(&music, 1, 8_000, 500, 220.0);
    let lyrics = dir.path().join("poem.txt");
    fs::write(&lyrics, LYRICS).unwrap();

    let request = BgmRequest {
        lyrics: Some(lyrics),
        output: Some(dir.path().join("blip_mix.wav")),
        ..BgmRequest::new(voice, music)
    };
    let output = add_background_music(&request).unwrap();
    assert!(output.path.exists());
    assert!(output.lrc.is_none());
}
