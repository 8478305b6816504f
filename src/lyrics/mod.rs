// src/lyrics/mod.rs
//! Lyric module - even-spaced LRC timing and LRC parsing.

pub mod lrc;
pub mod timer;

// Re-export commonly used types
pub use lrc::{parse_lrc, SyncedLyric};
pub use timer::{format_timestamp, lrc_path_for, LyricLine, LyricTimer, TimestampedLyrics};
