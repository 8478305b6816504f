// src/ui/mod.rs
//! UI module - terminal progress rendering.

pub mod progress;

pub use progress::{progress_label, render_progress, ProgressTerminal};
