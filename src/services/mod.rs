// src/services/mod.rs
//! Cloud collaborators: chat completion, speech and image generation.

pub mod chat;
pub mod image;
pub mod speech;

use std::time::Duration;

use reqwest::blocking::{Client, Response};

use crate::error::{Error, Result};

pub use chat::{ChatClient, ChatMessage, ChatSession, Completion, Role};
pub use self::image::ImageClient;
pub use speech::SpeechClient;

/// Blocking HTTP client with a per-request timeout.
pub(crate) fn http_client(service: &'static str, timeout_secs: u64) -> Result<Client> {
    Client::builder()
        .timeout(Duration::from_secs(timeout_secs))
        .build()
        .map_err(|e| Error::service(service, e))
}

/// Pass successful responses through; turn anything else into `ExternalService`
/// carrying the status and body.
pub(crate) fn check_status(service: &'static str, resp: Response) -> Result<Response> {
    if resp.status().is_success() {
        return Ok(resp);
    }
    let status = resp.status();
    let body = resp.text().unwrap_or_default();
    Err(Error::service(service, format!("HTTP {status}: {body}")))
}
