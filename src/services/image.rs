// src/services/image.rs
//! Azure OpenAI image generation for cover art.

use std::fs;
use std::path::Path;

use base64::{engine::general_purpose, Engine};
use reqwest::blocking::Client;
use serde::Deserialize;
use serde_json::json;
use tracing::info;

use super::{check_status, http_client};
use crate::config::{require, ImageConfig};
use crate::error::{Error, Result};

const SERVICE: &str = "image";

#[derive(Debug, Deserialize)]
struct GenerationResponse {
    data: Vec<GeneratedImage>,
}

#[derive(Debug, Deserialize)]
struct GeneratedImage {
    url: Option<String>,
    b64_json: Option<String>,
}

/// Where the first generated image can be found.
#[derive(Debug, PartialEq, Eq)]
enum ImageSource {
    Url(String),
    Inline(Vec<u8>),
}

fn first_image(body: &str) -> Result<ImageSource> {
    let parsed: GenerationResponse = serde_json::from_str(body)
        .map_err(|e| Error::MalformedResponse(format!("image generation: {e}")))?;
    let image = parsed
        .data
        .into_iter()
        .next()
        .ok_or_else(|| Error::MalformedResponse("image generation returned no data".into()))?;
    match (image.url, image.b64_json) {
        (Some(url), _) => Ok(ImageSource::Url(url)),
        (None, Some(b64)) => general_purpose::STANDARD
            .decode(b64)
            .map(ImageSource::Inline)
            .map_err(|e| Error::MalformedResponse(format!("b64_json: {e}"))),
        (None, None) => Err(Error::MalformedResponse("image has neither url nor b64_json".into())),
    }
}

pub struct ImageClient {
    http: Client,
    url: String,
    api_version: String,
    api_key: String,
}

impl ImageClient {
    pub fn new(config: &ImageConfig) -> Result<Self> {
        let endpoint = require(&config.endpoint, "image.endpoint")?;
        Ok(Self {
            http: http_client(SERVICE, config.timeout_secs)?,
            url: format!(
                "{}/openai/deployments/{}/images/generations",
                endpoint.trim_end_matches('/'),
                config.deployment
            ),
            api_version: config.api_version.clone(),
            api_key: require(&config.api_key, "image.api_key")?.to_string(),
        })
    }

    /// Generate one image for `prompt` and return its encoded bytes.
    pub fn generate(&self, prompt: &str) -> Result<Vec<u8>> {
        let resp = self
            .http
            .post(&self.url)
            .query(&[("api-version", self.api_version.as_str())])
            .header("api-key", &self.api_key)
            .json(&json!({ "prompt": prompt, "n": 1 }))
            .send()
            .map_err(|e| Error::service(SERVICE, e))?;
        let body = check_status(SERVICE, resp)?
            .text()
            .map_err(|e| Error::service(SERVICE, e))?;

        match first_image(&body)? {
            ImageSource::Inline(bytes) => Ok(bytes),
            ImageSource::Url(url) => {
                let resp = self.http.get(url).send().map_err(|e| Error::service(SERVICE, e))?;
                let bytes = check_status(SERVICE, resp)?
                    .bytes()
                    .map_err(|e| Error::service(SERVICE, e))?;
                Ok(bytes.to_vec())
            }
        }
    }

    pub fn generate_to_file(&self, prompt: &str, save_path: &Path) -> Result<()> {
        let bytes = self.generate(prompt)?;
        if let Some(parent) = save_path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(save_path, &bytes)?;
        info!(path = %save_path.display(), size = bytes.len(), "cover image generated");
        Ok(())
    }
}
