// src/config/mod.rs
//! Configuration module: data locations, mix defaults and cloud credentials.
//!
//! Values come from an optional TOML file and are then overridden from the
//! environment. The resulting [`Config`] is handed to each client
//! explicitly; nothing is read from process globals after loading.

use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use tracing::debug;

use crate::audio::mixer::{DEFAULT_CROSSFADE_MS, DEFAULT_INTRO_MS};
use crate::error::{Error, Result};

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub paths: PathsConfig,
    pub mix: MixConfig,
    pub chat: ChatConfig,
    pub speech: SpeechConfig,
    pub image: ImageConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PathsConfig {
    pub data_dir: PathBuf,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("data"),
        }
    }
}

impl PathsConfig {
    /// Narration, raw responses and generated text land here.
    pub fn speech_cache_dir(&self) -> PathBuf {
        self.data_dir.join("speech_cache")
    }

    pub fn bgm_dir(&self) -> PathBuf {
        self.data_dir.join("bgm")
    }

    pub fn default_bgm(&self) -> PathBuf {
        self.bgm_dir().join("default.mp3")
    }

    /// Where a generated cover for `stem` is stored.
    pub fn cover_for(&self, stem: &str) -> PathBuf {
        self.data_dir.join(format!("{stem}.png"))
    }

    pub fn stories_log(&self) -> PathBuf {
        self.data_dir.join("text").join("stories.txt")
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct MixConfig {
    pub bg_volume: f32,
    pub intro_ms: u64,
    pub crossfade_ms: u64,
    pub artist: String,
    pub album: Option<String>,
}

impl Default for MixConfig {
    fn default() -> Self {
        Self {
            bg_volume: 0.3,
            intro_ms: DEFAULT_INTRO_MS,
            crossfade_ms: DEFAULT_CROSSFADE_MS,
            artist: "azure".to_string(),
            album: None,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ChatConfig {
    pub endpoint: Option<String>,
    pub api_key: Option<String>,
    pub api_version: String,
    pub deployment: String,
    pub timeout_secs: u64,
    /// Sent as the user turn after the first reply.
    pub follow_up: String,
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            endpoint: None,
            api_key: None,
            api_version: "2024-02-01".to_string(),
            deployment: "gpt-4o".to_string(),
            timeout_secs: 120,
            follow_up: "再来一个".to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SpeechConfig {
    pub region: Option<String>,
    pub key: Option<String>,
    pub voice: String,
    pub language: String,
    /// `X-Microsoft-OutputFormat` for synthesis.
    pub output_format: String,
    pub timeout_secs: u64,
}

impl Default for SpeechConfig {
    fn default() -> Self {
        Self {
            region: None,
            key: None,
            voice: "zh-CN-XiaoqiuNeural".to_string(),
            language: "zh-CN".to_string(),
            output_format: "riff-24khz-16bit-mono-pcm".to_string(),
            timeout_secs: 60,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ImageConfig {
    pub endpoint: Option<String>,
    pub api_key: Option<String>,
    pub api_version: String,
    pub deployment: String,
    pub timeout_secs: u64,
}

impl Default for ImageConfig {
    fn default() -> Self {
        Self {
            endpoint: None,
            api_key: None,
            api_version: "2024-02-01".to_string(),
            deployment: "dalle3".to_string(),
            timeout_secs: 120,
        }
    }
}

impl Config {
    /// Read `path` (if given), then apply environment overrides.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        config.apply_env(|key| std::env::var(key).ok());
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(Error::FileNotFound(path.to_path_buf()));
        }
        let contents = fs::read_to_string(path)?;
        let config = toml::from_str(&contents)?;
        debug!(path = %path.display(), "configuration file loaded");
        Ok(config)
    }

    /// Override fields from `lookup`, normally the process environment.
    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(v) = get("WARBLER_DATA_DIR") {
            self.paths.data_dir = PathBuf::from(v);
        }
        if let Some(v) = get("AZURE_OPENAI_ENDPOINT") {
            self.chat.endpoint = Some(v);
        }
        if let Some(v) = get("AZURE_OPENAI_API_KEY") {
            self.chat.api_key = Some(v);
        }
        if let Some(v) = get("AZURE_OPENAI_DEPLOYMENT") {
            self.chat.deployment = v;
        }
        if let Some(v) = get("AZURE_DALLE_ENDPOINT") {
            self.image.endpoint = Some(v);
        }
        if let Some(v) = get("AZURE_DALLE_API_KEY") {
            self.image.api_key = Some(v);
        }
        if let Some(v) = get("AZURE_SPEECH_KEY") {
            self.speech.key = Some(v);
        }
        if let Some(v) = get("AZURE_SPEECH_REGION") {
            self.speech.region = Some(v);
        }
        if let Some(v) = get("AZURE_SPEECH_VOICE") {
            self.speech.voice = v;
        }
    }
}

/// Unwrap an optional credential or name the setting that is missing.
pub fn require<'a>(value: &'a Option<String>, name: &str) -> Result<&'a str> {
    value
        .as_deref()
        .filter(|v| !v.trim().is_empty())
        .ok_or_else(|| Error::Config(format!("{name} is not set")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn defaults_match_the_narration_setup() {
        let config = Config::default();
        assert_eq!(config.mix.bg_volume, 0.3);
        assert_eq!(config.mix.intro_ms, 3000);
        assert_eq!(config.speech.voice, "zh-CN-XiaoqiuNeural");
        assert_eq!(config.image.deployment, "dalle3");
        assert_eq!(config.paths.default_bgm(), Path::new("data/bgm/default.mp3"));
        assert_eq!(config.paths.stories_log(), Path::new("data/text/stories.txt"));
    }

    #[test]
    fn toml_sections_are_optional() {
        let config: Config = toml::from_str(
            r#"
            [mix]
            bg_volume = 0.5
            artist = "narrator"

            [speech]
            region = "eastasia"
            "#,
        )
        .unwrap();
        assert_eq!(config.mix.bg_volume, 0.5);
        assert_eq!(config.mix.crossfade_ms, 1000);
        assert_eq!(config.mix.artist, "narrator");
        assert_eq!(config.speech.region.as_deref(), Some("eastasia"));
        assert_eq!(config.chat.api_version, "2024-02-01");
    }

    #[test]
    fn env_overrides_file_values() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("warbler.toml");
        fs::write(&path, "[speech]\nvoice = \"zh-CN-YunyeNeural\"\nkey = \"file-key\"\n").unwrap();

        let mut config = Config::from_file(&path).unwrap();
        let env: HashMap<&str, &str> = HashMap::from([
            ("AZURE_SPEECH_KEY", "env-key"),
            ("WARBLER_DATA_DIR", "/tmp/warbler"),
            ("AZURE_SPEECH_VOICE", "  "),
        ]);
        config.apply_env(|k| env.get(k).map(|v| v.to_string()));

        assert_eq!(config.speech.key.as_deref(), Some("env-key"));
        assert_eq!(config.speech.voice, "zh-CN-YunyeNeural");
        assert_eq!(config.paths.speech_cache_dir(), Path::new("/tmp/warbler/speech_cache"));
    }

    #[test]
    fn missing_file_and_bad_toml() {
        assert!(matches!(
            Config::from_file(Path::new("/no/such/warbler.toml")),
            Err(Error::FileNotFound(_))
        ));
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.toml");
        fs::write(&path, "[mix\nbg_volume = ").unwrap();
        assert!(matches!(Config::from_file(&path), Err(Error::Toml(_))));
    }

    #[test]
    fn require_reports_setting_name() {
        let err = require(&None, "speech.key").unwrap_err();
        assert!(err.to_string().contains("speech.key"));
        assert_eq!(require(&Some("k".into()), "speech.key").unwrap(), "k");
        assert!(require(&Some(" ".into()), "speech.key").is_err());
    }
}
