// src/app/mod.rs
//! Application module - the background-music pipeline, narration workflows and spoken chat.

pub mod composer;
pub mod conversation;
pub mod pipeline;

pub use composer::Composer;
pub use conversation::{play_sound, Conversation, Ending};
pub use pipeline::{add_background_music, BgmOutput, BgmRequest};
