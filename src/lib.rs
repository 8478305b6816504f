// src/lib.rs
//! Warbler - narrated tracks with a music bed, timed lyrics and ID3 tags.
//!
//! This library provides the pipeline stages and the cloud clients used by
//! the `warbler` binary.

pub mod app;
pub mod audio;
pub mod config;
pub mod error;
pub mod fs;
pub mod lyrics;
pub mod poem;
pub mod services;
pub mod ui;

pub use error::{Error, Result};
