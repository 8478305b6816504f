// src/audio/format.rs
//! Extension-based audio format dispatch.

use std::{fmt, path::Path};

use crate::error::{Error, Result};

/// Containers the pipeline recognises on input and output paths.
#[derive(Debug, PartialEq, Eq, Clone, Copy, Hash)]
pub enum AudioFormat {
    Wav,
    Mp3,
    Ogg,
    Flac,
    Aac,
    M4a,
    Wma,
}

/// The fixed extension table, lower-case and without the dot.
const SUPPORTED: [(&str, AudioFormat); 7] = [
    ("wav", AudioFormat::Wav),
    ("mp3", AudioFormat::Mp3),
    ("ogg", AudioFormat::Ogg),
    ("flac", AudioFormat::Flac),
    ("aac", AudioFormat::Aac),
    ("m4a", AudioFormat::M4a),
    ("wma", AudioFormat::Wma),
];

impl AudioFormat {
    /// Look up the format for `path` by its extension, case-insensitively.
    ///
    /// Fails with [`Error::UnsupportedFormat`] without touching the file.
    pub fn from_path(path: &Path) -> Result<Self> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase)
            .ok_or_else(|| {
                Error::UnsupportedFormat(format!("{} has no extension", path.display()))
            })?;

        SUPPORTED
            .iter()
            .find(|(known, _)| *known == ext)
            .map(|(_, format)| *format)
            .ok_or(Error::UnsupportedFormat(format!(".{ext}")))
    }

    pub fn extension(self) -> &'static str {
        SUPPORTED
            .iter()
            .find(|(_, format)| *format == self)
            .map(|(ext, _)| *ext)
            .unwrap_or("bin")
    }

    /// MIME type for this container, resolved through `mime_guess`.
    pub fn mime(self) -> String {
        mime_guess::from_ext(self.extension())
            .first_or_octet_stream()
            .to_string()
    }

    /// Whether the metadata writer can attach an ID3v2 tag to this container.
    pub fn is_tag_capable(self) -> bool {
        matches!(self, AudioFormat::Mp3 | AudioFormat::Wav)
    }
}

impl fmt::Display for AudioFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.extension())
    }
}
