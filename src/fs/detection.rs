// src/fs/detection.rs
//! File type detection using magic numbers and extension-based fallback.

use std::{fmt, path::Path};

use infer::{Infer, MatcherType};
use mime_guess::MimeGuess;

use crate::error::Result;

/// High-level file categories.
#[derive(Debug, PartialEq, Clone, Copy)]
pub enum FileCategory {
    Image,
    Audio,
    Text,
    Binary,
}

impl fmt::Display for FileCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            FileCategory::Image => "Image",
            FileCategory::Audio => "Audio",
            FileCategory::Text => "Text",
            FileCategory::Binary => "Binary",
        };
        write!(f, "{}", s)
    }
}

/// Holds a detected MIME type + category.
#[derive(Debug, Clone, PartialEq)]
pub struct FileType {
    pub mime: String,
    pub category: FileCategory,
}

/// Detect MIME type & category from raw bytes (magic numbers only).
pub fn detect_bytes(bytes: &[u8]) -> Option<FileType> {
    Infer::new().get(bytes).map(|kind| FileType {
        mime: kind.mime_type().to_string(),
        category: category_for_matcher(kind.matcher_type()),
    })
}

/// Detect MIME type & category for a given file path.
pub fn detect_file_type(path: &Path) -> Result<FileType> {
    // 1. Try magic-number sniffing
    if let Some(kind) = Infer::new().get_from_path(path)? {
        return Ok(FileType {
            mime: kind.mime_type().to_string(),
            category: category_for_matcher(kind.matcher_type()),
        });
    }

    // 2. Fallback to extension-based lookup
    let mime = MimeGuess::from_path(path).first_or_octet_stream().to_string();

    // 3. Map top-level type to category
    let category = match mime.split('/').next().unwrap_or("application") {
        "image" => FileCategory::Image,
        "audio" => FileCategory::Audio,
        "text" => FileCategory::Text,
        _ => FileCategory::Binary,
    };

    Ok(FileType { mime, category })
}

fn category_for_matcher(matcher: MatcherType) -> FileCategory {
    match matcher {
        MatcherType::Image => FileCategory::Image,
        MatcherType::Audio => FileCategory::Audio,
        MatcherType::Text => FileCategory::Text,
        _ => FileCategory::Binary,
    }
}
