// src/ui/progress.rs
//! Elapsed-time gauge drawn inline below the shell prompt.

use std::io::{self, Stdout};
use std::time::Duration;

use crossterm::terminal::{disable_raw_mode, enable_raw_mode};
use ratatui::{
    backend::CrosstermBackend,
    layout::Rect,
    style::{Color, Modifier, Style},
    widgets::{Block, Borders, Gauge},
    Frame, Terminal, TerminalOptions, Viewport,
};

/// `MM:SS / MM:SS`
pub fn progress_label(elapsed: Duration, total: Duration) -> String {
    let (e, t) = (elapsed.as_secs(), total.as_secs());
    format!("{:02}:{:02} / {:02}:{:02}", e / 60, e % 60, t / 60, t % 60)
}

pub fn progress_ratio(elapsed: Duration, total: Duration) -> f64 {
    if total.is_zero() {
        return 0.0;
    }
    (elapsed.as_secs_f64() / total.as_secs_f64()).clamp(0.0, 1.0)
}

/// Render the playback gauge for one track.
pub fn render_progress(f: &mut Frame<'_>, area: Rect, title: &str, elapsed: Duration, total: Duration) {
    f.render_widget(
        Gauge::default()
            .block(Block::default().borders(Borders::ALL).title(title.to_string()))
            .gauge_style(Style::default().fg(Color::Magenta).add_modifier(Modifier::ITALIC))
            .ratio(progress_ratio(elapsed, total))
            .label(progress_label(elapsed, total)),
        area,
    );
}

/// A three-row inline terminal in raw mode. Raw mode is left on drop.
pub struct ProgressTerminal {
    terminal: Terminal<CrosstermBackend<Stdout>>,
}

impl ProgressTerminal {
    pub fn new() -> io::Result<Self> {
        enable_raw_mode()?;
        let terminal = Terminal::with_options(
            CrosstermBackend::new(io::stdout()),
            TerminalOptions {
                viewport: Viewport::Inline(3),
            },
        );
        match terminal {
            Ok(terminal) => Ok(Self { terminal }),
            Err(e) => {
                let _ = disable_raw_mode();
                Err(e)
            }
        }
    }

    pub fn draw(&mut self, title: &str, elapsed: Duration, total: Duration) -> io::Result<()> {
        self.terminal
            .draw(|f| render_progress(f, f.area(), title, elapsed, total))?;
        Ok(())
    }
}

impl Drop for ProgressTerminal {
    fn drop(&mut self) {
        let _ = disable_raw_mode();
        println!();
    }
}
