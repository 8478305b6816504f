// src/lyrics/lrc.rs
//! Parse `[mm:ss.xx]text` lines back into synchronized lyric events.

use crate::error::{Error, Result};

/// A lyric line with its offset from the start of the track.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncedLyric {
    pub offset_ms: u32,
    pub text: String,
}

/// Parse LRC content into timed events.
///
/// Lines without a leading `[` are ignored, as are ID tags such as `[ar:Name]`.
/// A bracket that looks numeric but does not parse as `mm:ss(.xx)` is an error.
pub fn parse_lrc(content: &str) -> Result<Vec<SyncedLyric>> {
    let mut events = Vec::new();

    for line in content.lines() {
        let line = line.trim();
        let Some(rest) = line.strip_prefix('[') else {
            continue;
        };
        let Some((tag, text)) = rest.split_once(']') else {
            return Err(Error::InvalidTimestamp(line.to_string()));
        };
        if is_id_tag(tag) {
            continue;
        }

        events.push(SyncedLyric {
            offset_ms: parse_offset(tag)?,
            text: text.trim().to_string(),
        });
    }

    Ok(events)
}

/// `ti`, `ar`, `al`, `by`, `offset`... keys start with a letter.
fn is_id_tag(tag: &str) -> bool {
    tag.chars().next().is_some_and(|c| c.is_ascii_alphabetic())
}

fn parse_offset(tag: &str) -> Result<u32> {
    let invalid = || Error::InvalidTimestamp(format!("[{tag}]"));
    let (minutes, seconds) = tag.split_once(':').ok_or_else(invalid)?;
    let minutes: u32 = minutes.trim().parse().map_err(|_| invalid())?;
    let seconds: f64 = seconds.trim().parse().map_err(|_| invalid())?;
    if !(0.0..60.0).contains(&seconds) {
        return Err(invalid());
    }
    Ok(((minutes as f64 * 60.0 + seconds) * 1000.0).round() as u32)
}
