// src/error.rs
//! Error taxonomy shared by every stage of the pipeline.

use std::path::PathBuf;

use thiserror::Error;

use crate::audio::format::AudioFormat;

/// Everything that can go wrong while building, tagging or playing a track.
#[derive(Debug, Error)]
pub enum Error {
    /// File extension is not in the supported audio table.
    #[error("unsupported audio format: {0}")]
    UnsupportedFormat(String),

    /// A referenced input path does not exist.
    #[error("file not found: {}", .0.display())]
    FileNotFound(PathBuf),

    /// An audio source decoded to zero samples.
    #[error("audio source is empty: {0}")]
    EmptyAudioSource(String),

    /// The track ends before the first lyric line would start.
    #[error(
        "track lasts {duration_secs:.2}s but lyrics start at {start_secs:.2}s; nothing left to time"
    )]
    InsufficientDuration { duration_secs: f64, start_secs: f64 },

    /// Background volume outside `0.0..=1.0`.
    #[error("background volume {0} is outside 0..=1")]
    InvalidVolume(f32),

    /// A lyric source contained no non-blank lines.
    #[error("no lyric lines to time")]
    NoLyrics,

    /// An LRC line carried a timestamp that could not be parsed.
    #[error("invalid lyric timestamp: {0}")]
    InvalidTimestamp(String),

    #[error("{format} decoding failed: {details}")]
    Decode { format: AudioFormat, details: String },

    /// The format is recognised but this build has no encoder for it.
    #[error("{0} export is not available; use wav or mp3")]
    EncoderUnavailable(AudioFormat),

    #[error("{format} encoding failed: {details}")]
    Encode { format: AudioFormat, details: String },

    /// The output device could not be opened or rejected the stream.
    #[error("playback failed: {0}")]
    Playback(String),

    /// No usable input device, or the capture stream failed.
    #[error("recording failed: {0}")]
    Recording(String),

    /// A cloud call failed or returned an error/cancellation result.
    #[error("{service} request failed: {details}")]
    ExternalService { service: &'static str, details: String },

    /// A response was missing fields of its declared schema.
    #[error("malformed response: {0}")]
    MalformedResponse(String),

    /// Missing or invalid configuration value.
    #[error("configuration error: {0}")]
    Config(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Tag(#[from] lofty::error::LoftyError),

    #[error(transparent)]
    Image(#[from] image::ImageError),

    #[error(transparent)]
    Toml(#[from] toml::de::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

/// Crate-wide result alias.
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Wrap any displayable failure from a cloud collaborator.
    pub fn service(service: &'static str, details: impl ToString) -> Self {
        Self::ExternalService {
            service,
            details: details.to_string(),
        }
    }
}
