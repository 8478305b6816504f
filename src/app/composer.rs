// src/app/composer.rs
//! End-to-end narration: chat reply -> speech -> cover -> music bed -> tags.

use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::Local;
use tracing::{info, warn};

use super::pipeline::{add_background_music, BgmRequest};
use crate::audio::{MixSettings, PlaybackReporter, StopReason};
use crate::config::Config;
use crate::poem::PoemDraft;
use crate::services::{ChatSession, Completion, ImageClient, SpeechClient};

pub struct Composer {
    config: Config,
    speech: SpeechClient,
    image: Option<ImageClient>,
    bgm: PathBuf,
}

impl Composer {
    /// Speech credentials are required; without image credentials tracks get
    /// no generated cover.
    pub fn new(config: Config) -> Result<Self> {
        let speech = SpeechClient::new(&config.speech, config.paths.speech_cache_dir())
            .context("speech client")?;
        let image = match ImageClient::new(&config.image) {
            Ok(client) => Some(client),
            Err(e) => {
                warn!(error = %e, "cover generation disabled");
                None
            }
        };
        let bgm = config.paths.default_bgm();
        Ok(Self {
            config,
            speech,
            image,
            bgm,
        })
    }

    /// Use `bgm` instead of `<data>/bgm/default.mp3`.
    pub fn with_bgm(mut self, bgm: impl Into<PathBuf>) -> Self {
        self.bgm = bgm.into();
        self
    }

    fn mix_settings(&self) -> MixSettings {
        MixSettings {
            bg_volume: self.config.mix.bg_volume,
            intro_ms: self.config.mix.intro_ms,
            crossfade_ms: self.config.mix.crossfade_ms,
        }
    }

    /// Ask for up to `turns` structured poems and turn each into a tagged track.
    ///
    /// A reply that cannot be produced is logged and skipped. Interrupting
    /// playback ends the session.
    pub fn compose<C: Completion>(&self, chat: C, prompt: &str, turns: usize, play: bool) -> Result<Vec<PathBuf>> {
        let mut session = ChatSession::new(chat, prompt, self.config.chat.follow_up.clone());
        let mut tracks = Vec::new();
        session.run(turns, |turn, reply| match self.produce_poem(reply) {
            Ok(track) => {
                info!(turn = turn + 1, path = %track.display(), "track ready");
                let keep_going = !play || self.play(&track);
                tracks.push(track);
                keep_going
            }
            Err(e) => {
                warn!(turn = turn + 1, error = %format!("{e:#}"), "skipping reply");
                true
            }
        })?;
        Ok(tracks)
    }

    fn produce_poem(&self, reply: &str) -> Result<PathBuf> {
        let draft = PoemDraft::parse(reply)?;
        let stem = draft.file_stem();
        let cache = self.config.paths.speech_cache_dir();
        fs::create_dir_all(&cache).with_context(|| format!("creating {}", cache.display()))?;

        fs::write(cache.join(format!("{stem}.json")), reply)?;
        let text_path = cache.join(format!("{stem}.txt"));
        fs::write(&text_path, draft.full_text())?;

        let wav = self
            .speech
            .get_or_create_audio(&draft.full_text(), Some(&cache.join(format!("{stem}_ori.wav"))))
            .context("narrating poem")?;

        let request = BgmRequest {
            lyrics: Some(text_path),
            settings: self.mix_settings(),
            album: self.config.mix.album.clone(),
            artist: Some(self.config.mix.artist.clone()),
            cover: self.cover_for(&stem, &draft.photo_desc),
            ..BgmRequest::new(wav, &self.bgm)
        };
        let output = add_background_music(&request).context("adding background music")?;
        Ok(output.path)
    }

    /// Existing `<data>/<stem>.png`, or a freshly generated one.
    fn cover_for(&self, stem: &str, photo_desc: &str) -> Option<PathBuf> {
        let path = self.config.paths.cover_for(stem);
        if path.exists() {
            return Some(path);
        }
        let client = self.image.as_ref()?;
        match client.generate_to_file(photo_desc, &path) {
            Ok(()) => Some(path),
            Err(e) => {
                warn!(error = %e, "cover generation failed; continuing without cover");
                None
            }
        }
    }

    /// Free-form replies: narrate each, add music and log it to the stories file.
    pub fn recite<C: Completion>(
        &self,
        chat: C,
        prompt: &str,
        follow_up: &str,
        turns: usize,
        play: bool,
    ) -> Result<Vec<PathBuf>> {
        let mut session = ChatSession::new(chat, prompt, follow_up);
        let mut tracks = Vec::new();
        session.run(turns, |turn, reply| {
            let text = clean_reply(reply);
            println!("AI: {text}");
            match self.produce_recital(text) {
                Ok(track) => {
                    info!(turn = turn + 1, path = %track.display(), "track ready");
                    let keep_going = !play || self.play(&track);
                    tracks.push(track);
                    keep_going
                }
                Err(e) => {
                    warn!(turn = turn + 1, error = %format!("{e:#}"), "skipping reply");
                    true
                }
            }
        })?;
        Ok(tracks)
    }

    fn produce_recital(&self, text: &str) -> Result<PathBuf> {
        let wav = self.speech.get_or_create_audio(text, None).context("narrating reply")?;
        let request = BgmRequest {
            settings: self.mix_settings(),
            ..BgmRequest::new(wav, &self.bgm)
        };
        let output = add_background_music(&request).context("adding background music")?;
        append_story(&self.config.paths.stories_log(), text, &output.path)?;
        Ok(output.path)
    }

    /// Returns `false` when the listener asked to stop.
    fn play(&self, track: &Path) -> bool {
        match PlaybackReporter::new().play(track) {
            Ok(StopReason::Finished) => true,
            Ok(StopReason::Interrupted) => false,
            Err(e) => {
                warn!(error = %e, "playback failed");
                true
            }
        }
    }
}

/// Strip Markdown heading and emphasis markers from both ends.
fn clean_reply(reply: &str) -> &str {
    reply.trim().trim_matches(|c| c == '#' || c == '*').trim()
}

fn append_story(log: &Path, text: &str, track: &Path) -> Result<()> {
    if let Some(parent) = log.parent() {
        fs::create_dir_all(parent)?;
    }
    let mut file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(log)
        .with_context(|| format!("opening {}", log.display()))?;
    writeln!(
        file,
        "{}\n{}\n{}\n",
        Local::now().format("%Y-%m-%d %H:%M:%S"),
        text,
        track.display()
    )?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn markdown_markers_are_trimmed() {
        assert_eq!(clean_reply("## 秋夜 **\n"), "秋夜");
        assert_eq!(clean_reply("*a* b"), "a* b");
    }

    #[test]
    fn stories_are_appended() {
        let dir = tempfile::tempdir().unwrap();
        let log = dir.path().join("text").join("stories.txt");
        append_story(&log, "first", Path::new("a.mp3")).unwrap();
        append_story(&log, "second", Path::new("b.mp3")).unwrap();
        let content = fs::read_to_string(&log).unwrap();
        let blocks: Vec<&str> = content.split("\n\n").filter(|b| !b.is_empty()).collect();
        assert_eq!(blocks.len(), 2);
        assert!(blocks[0].ends_with("first\na.mp3"));
        assert!(blocks[1].ends_with("second\nb.mp3"));
    }
}
