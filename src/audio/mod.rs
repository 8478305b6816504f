// src/audio/mod.rs
//! Audio module - decoding, mixing, export, tagging and playback.

pub mod artwork;
pub mod export;
pub mod format;
pub mod loader;
pub mod metadata;
pub mod mixer;
pub mod player;
pub mod recorder;
pub mod waveform;

// Re-export commonly used types
pub use export::export;
pub use format::AudioFormat;
pub use loader::load_audio;
pub use metadata::{
    read_duration, read_synced_lyrics, verify_metadata, write_metadata, MetadataReport, TrackTags,
};
pub use mixer::{mix_background, MixSettings};
pub use player::{PlaybackReporter, PlaybackState, StopReason};
pub use recorder::Microphone;
pub use waveform::Waveform;
