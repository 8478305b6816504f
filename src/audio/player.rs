// src/audio/player.rs
//! Blocking playback with a live elapsed-time gauge.

use std::io::IsTerminal;
use std::path::Path;
use std::thread;
use std::time::Duration;

use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use rodio::{OutputStream, Sink};
use tracing::{debug, info, warn};

use super::loader::load_audio;
use super::metadata::read_duration;
use crate::error::{Error, Result};
use crate::ui::progress::{progress_label, ProgressTerminal};

/// How often the gauge is redrawn and the keyboard checked.
pub const POLL_INTERVAL: Duration = Duration::from_millis(100);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackState {
    NotStarted,
    Playing,
    Stopped,
}

/// Why playback ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    Finished,
    Interrupted,
}

/// Plays one file at a time and reports progress until the sink drains.
pub struct PlaybackReporter {
    state: PlaybackState,
    interval: Duration,
}

impl Default for PlaybackReporter {
    fn default() -> Self {
        Self::new()
    }
}

impl PlaybackReporter {
    pub fn new() -> Self {
        Self {
            state: PlaybackState::NotStarted,
            interval: POLL_INTERVAL,
        }
    }

    pub fn state(&self) -> PlaybackState {
        self.state
    }

    /// Play `path` to the end, or until the user presses `q`, `Esc` or Ctrl-C.
    pub fn play(&mut self, path: &Path) -> Result<StopReason> {
        if !path.exists() {
            return Err(Error::FileNotFound(path.to_path_buf()));
        }
        let waveform = load_audio(path)?;
        let total = match read_duration(path) {
            Ok(duration) if !duration.is_zero() => duration,
            Ok(_) => Duration::from_millis(waveform.duration_ms()),
            Err(e) => {
                debug!(error = %e, "no container duration, using decoded length");
                Duration::from_millis(waveform.duration_ms())
            }
        };

        let (_stream, handle) = OutputStream::try_default().map_err(|e| Error::Playback(e.to_string()))?;
        let sink = Sink::try_new(&handle).map_err(|e| Error::Playback(e.to_string()))?;
        sink.append(waveform.into_source());
        self.state = PlaybackState::Playing;
        info!(path = %path.display(), total = %progress_label(total, total), "playback started");

        let title = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();

        let result = if std::io::stdout().is_terminal() {
            self.gauge_loop(&sink, &title, total)
        } else {
            self.headless_loop(&sink, total)
        };
        sink.stop();
        self.state = PlaybackState::Stopped;

        let reason = result?;
        info!(?reason, "playback stopped");
        Ok(reason)
    }

    fn gauge_loop(&self, sink: &Sink, title: &str, total: Duration) -> Result<StopReason> {
        let mut ui = ProgressTerminal::new()?;
        loop {
            let elapsed = sink.get_pos().min(total);
            if sink.empty() {
                ui.draw(title, total, total)?;
                return Ok(StopReason::Finished);
            }
            ui.draw(title, elapsed, total)?;

            if event::poll(self.interval)? {
                if let Event::Key(key) = event::read()? {
                    if is_stop_key(&key) {
                        return Ok(StopReason::Interrupted);
                    }
                }
            }
        }
    }

    /// Without a terminal there is no keyboard; log once per second instead.
    fn headless_loop(&self, sink: &Sink, total: Duration) -> Result<StopReason> {
        warn!("stdout is not a terminal; progress is logged instead of drawn");
        let mut last_logged = u64::MAX;
        while !sink.empty() {
            let elapsed = sink.get_pos().min(total);
            if elapsed.as_secs() != last_logged {
                last_logged = elapsed.as_secs();
                info!("{}", progress_label(elapsed, total));
            }
            thread::sleep(self.interval);
        }
        Ok(StopReason::Finished)
    }
}

fn is_stop_key(key: &KeyEvent) -> bool {
    if key.kind != KeyEventKind::Press {
        return false;
    }
    match key.code {
        KeyCode::Char('q') | KeyCode::Esc => true,
        KeyCode::Char('c') => key.modifiers.contains(KeyModifiers::CONTROL),
        _ => false,
    }
}
