// src/lyrics/timer.rs
//! Spread lyric lines evenly over the voiced part of a track.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::info;

use crate::error::{Error, Result};

pub const DEFAULT_INTRO_SECS: f64 = 2.0;
pub const DEFAULT_CROSSFADE_SECS: f64 = 1.0;
/// Closest two lines may sit: one LRC centisecond tick.
pub const MIN_LINE_SPACING_SECS: f64 = 0.01;

/// One lyric line and the moment it starts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LyricLine {
    pub start_ms: u64,
    pub text: String,
}

impl LyricLine {
    /// `[MM:SS.ss]` tag for this line.
    pub fn timestamp(&self) -> String {
        format_timestamp(self.start_ms)
    }

    pub fn to_lrc(&self) -> String {
        format!("{}{}", self.timestamp(), self.text)
    }
}

/// The timed lines of a single track, in order.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TimestampedLyrics {
    lines: Vec<LyricLine>,
}

impl TimestampedLyrics {
    pub fn lines(&self) -> &[LyricLine] {
        &self.lines
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// LRC body: one `[MM:SS.ss]text` per line, newline-terminated.
    pub fn to_lrc(&self) -> String {
        self.lines.iter().map(|l| l.to_lrc() + "\n").collect()
    }

    pub fn write_lrc(&self, path: &Path) -> Result<()> {
        fs::write(path, self.to_lrc())?;
        info!(path = %path.display(), lines = self.len(), "wrote LRC file");
        Ok(())
    }
}

/// Even-spacing lyric scheduler.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LyricTimer {
    pub intro_secs: f64,
    pub crossfade_secs: f64,
}

impl Default for LyricTimer {
    fn default() -> Self {
        Self {
            intro_secs: DEFAULT_INTRO_SECS,
            crossfade_secs: DEFAULT_CROSSFADE_SECS,
        }
    }
}

impl LyricTimer {
    pub fn new(intro_secs: f64, crossfade_secs: f64) -> Self {
        Self {
            intro_secs,
            crossfade_secs,
        }
    }

    /// Offset of the first line, in seconds.
    pub fn start_secs(&self) -> f64 {
        self.intro_secs + self.crossfade_secs
    }

    /// Assign a start time to each non-blank line of `lines`.
    ///
    /// Lines start at `intro + crossfade` and are spaced by
    /// `(track - start) / count`, floored to the millisecond so the last line
    /// stays inside the track. A track too short to give every line at least
    /// one LRC tick is rejected.
    pub fn schedule<S: AsRef<str>>(&self, track_secs: f64, lines: &[S]) -> Result<TimestampedLyrics> {
        let lines: Vec<&str> = lines
            .iter()
            .map(AsRef::as_ref)
            .filter(|l| !l.trim().is_empty())
            .collect();
        if lines.is_empty() {
            return Err(Error::NoLyrics);
        }

        let start = self.start_secs();
        if track_secs <= start {
            return Err(Error::InsufficientDuration {
                duration_secs: track_secs,
                start_secs: start,
            });
        }

        let per_line = (track_secs - start) / lines.len() as f64;
        if per_line < MIN_LINE_SPACING_SECS {
            return Err(Error::InsufficientDuration {
                duration_secs: track_secs,
                start_secs: start,
            });
        }
        let lines = lines
            .into_iter()
            .enumerate()
            .map(|(i, text)| LyricLine {
                start_ms: ((start + i as f64 * per_line) * 1000.0).floor() as u64,
                text: text.to_string(),
            })
            .collect();

        Ok(TimestampedLyrics { lines })
    }

    /// Read a plain text lyric file and schedule its lines.
    pub fn schedule_file(&self, track_secs: f64, lyrics: &Path) -> Result<TimestampedLyrics> {
        if !lyrics.exists() {
            return Err(Error::FileNotFound(lyrics.to_path_buf()));
        }
        let text = fs::read_to_string(lyrics)?;
        let lines: Vec<&str> = text.lines().collect();
        self.schedule(track_secs, &lines)
    }
}

/// `[MM:SS.ss]` for a millisecond offset, rounded to centiseconds.
pub fn format_timestamp(ms: u64) -> String {
    let centis = (ms + 5) / 10;
    let minutes = centis / 6000;
    let seconds = (centis % 6000) / 100;
    let hundredths = centis % 100;
    format!("[{minutes:02}:{seconds:02}.{hundredths:02}]")
}

/// Sidecar path: same directory and stem as the audio, `.lrc` extension.
pub fn lrc_path_for(audio: &Path) -> PathBuf {
    audio.with_extension("lrc")
}
