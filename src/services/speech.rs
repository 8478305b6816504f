// src/services/speech.rs
//! Azure Speech REST: text-to-speech with an on-disk cache, and short-audio
//! recognition.

use std::fs;
use std::path::{Path, PathBuf};

use reqwest::blocking::Client;
use serde::Deserialize;
use sha2::{Digest, Sha256};
use tracing::{info, warn};

use super::{check_status, http_client};
use crate::config::{require, SpeechConfig};
use crate::error::{Error, Result};

const SERVICE: &str = "speech";

pub struct SpeechClient {
    http: Client,
    region: String,
    key: String,
    voice: String,
    language: String,
    output_format: String,
    cache_dir: PathBuf,
}

impl SpeechClient {
    pub fn new(config: &SpeechConfig, cache_dir: impl Into<PathBuf>) -> Result<Self> {
        Ok(Self {
            http: http_client(SERVICE, config.timeout_secs)?,
            region: require(&config.region, "speech.region")?.to_string(),
            key: require(&config.key, "speech.key")?.to_string(),
            voice: config.voice.clone(),
            language: config.language.clone(),
            output_format: config.output_format.clone(),
            cache_dir: cache_dir.into(),
        })
    }

    pub fn voice(&self) -> &str {
        &self.voice
    }

    /// Synthesize `text` and return the encoded audio (RIFF PCM by default).
    pub fn synthesize(&self, text: &str) -> Result<Vec<u8>> {
        let url = format!("https://{}.tts.speech.microsoft.com/cognitiveservices/v1", self.region);
        let resp = self
            .http
            .post(url)
            .header("Ocp-Apim-Subscription-Key", &self.key)
            .header("Content-Type", "application/ssml+xml")
            .header("X-Microsoft-OutputFormat", &self.output_format)
            .header("User-Agent", concat!("warbler/", env!("CARGO_PKG_VERSION")))
            .body(ssml(&self.language, &self.voice, text))
            .send()
            .map_err(|e| Error::service(SERVICE, e))?;
        let bytes = check_status(SERVICE, resp)?
            .bytes()
            .map_err(|e| Error::service(SERVICE, e))?;
        if bytes.is_empty() {
            return Err(Error::service(SERVICE, "synthesis returned no audio"));
        }
        Ok(bytes.to_vec())
    }

    /// Narrate `text` into a wav file.
    ///
    /// Without `save_path` the file lives in the cache and is reused when it
    /// already exists. An explicit `save_path` is always regenerated.
    pub fn get_or_create_audio(&self, text: &str, save_path: Option<&Path>) -> Result<PathBuf> {
        let path = match save_path {
            Some(path) => path.to_path_buf(),
            None => {
                let cached = cache_path(&self.cache_dir, text, &self.voice);
                if cached.exists() {
                    info!(path = %cached.display(), "using existing audio file");
                    return Ok(cached);
                }
                cached
            }
        };

        info!(path = %path.display(), "generating new audio file");
        let audio = self.synthesize(text)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, audio)?;
        Ok(path)
    }

    /// Recognize speech in a short wav file. `Ok(None)` when nothing was heard.
    pub fn recognize_file(&self, wav: &Path) -> Result<Option<String>> {
        if !wav.exists() {
            return Err(Error::FileNotFound(wav.to_path_buf()));
        }
        let audio = fs::read(wav)?;
        let url = format!(
            "https://{}.stt.speech.microsoft.com/speech/recognition/conversation/cognitiveservices/v1",
            self.region
        );
        let resp = self
            .http
            .post(url)
            .query(&[("language", self.language.as_str()), ("format", "simple")])
            .header("Ocp-Apim-Subscription-Key", &self.key)
            .header("Content-Type", "audio/wav; codecs=audio/pcm")
            .header("Accept", "application/json")
            .body(audio)
            .send()
            .map_err(|e| Error::service(SERVICE, e))?;
        let body = check_status(SERVICE, resp)?
            .text()
            .map_err(|e| Error::service(SERVICE, e))?;
        recognition_text(&body)
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "PascalCase")]
struct Recognition {
    recognition_status: String,
    #[serde(default)]
    display_text: Option<String>,
}

fn recognition_text(body: &str) -> Result<Option<String>> {
    let result: Recognition =
        serde_json::from_str(body).map_err(|e| Error::MalformedResponse(format!("recognition: {e}")))?;
    match result.recognition_status.as_str() {
        "Success" => {
            let text = result
                .display_text
                .ok_or_else(|| Error::MalformedResponse("recognition has no DisplayText".into()))?;
            info!(%text, "recognized");
            Ok(Some(text))
        }
        "NoMatch" | "InitialSilenceTimeout" => {
            warn!(status = %result.recognition_status, "no speech could be recognized");
            Ok(None)
        }
        other => Err(Error::service(SERVICE, format!("recognition status {other}"))),
    }
}

/// `<dir>/<first 16 hex chars of sha256(text.trim())>_<voice>.wav`
pub fn cache_path(dir: &Path, text: &str, voice: &str) -> PathBuf {
    let digest = Sha256::digest(text.trim().as_bytes());
    dir.join(format!("{}_{voice}.wav", hex::encode(&digest[..8])))
}

fn ssml(language: &str, voice: &str, text: &str) -> String {
    format!(
        "<speak version='1.0' xml:lang='{language}'><voice xml:lang='{language}' name='{voice}'>{}</voice></speak>",
        escape_xml(text)
    )
}

fn escape_xml(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            c => out.push(c),
        }
    }
    out
}
