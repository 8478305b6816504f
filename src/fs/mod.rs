// src/fs/mod.rs
//! Filesystem helpers: content sniffing.

pub mod detection;

pub use detection::{detect_bytes, detect_file_type, FileCategory, FileType};
