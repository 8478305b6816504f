// src/app/conversation.rs
//! Spoken question and answer: listen, ask the chat model, speak the reply.

use std::path::PathBuf;
use std::time::Duration;

use tracing::{info, warn};

use crate::audio::{Microphone, PlaybackReporter, StopReason};
use crate::error::Result;
use crate::services::{ChatMessage, Completion, Role, SpeechClient};

pub const GREETING: &str = "hello 我来咯";
pub const FAREWELL: &str = "bye bye";
/// Earlier messages (questions and answers) sent along with each question.
pub const CONTEXT_MESSAGES: usize = 10;
/// Extra attempts when the model answers with the stop word itself.
const STOP_WORD_RETRIES: usize = 3;

/// A question starting with `退出`, or exactly `quit`, ends the conversation.
pub fn is_stop_word(question: &str) -> bool {
    let q = question.trim();
    q.starts_with("退出") || q.eq_ignore_ascii_case("quit")
}

/// Drop a leading speaker tag such as `AI:` or `Assistant：`.
fn strip_role_prefix(reply: &str) -> &str {
    let is_tag = |tag: &str| {
        let tag = tag.trim();
        !tag.is_empty() && tag.len() <= 12 && tag.chars().all(|c| c.is_ascii_alphabetic())
    };
    match reply.split_once([':', '：']) {
        Some((tag, rest)) if is_tag(tag) => rest.trim(),
        _ => reply.trim(),
    }
}

/// Source of spoken questions. `Ok(None)` when nothing was understood.
pub trait Listener {
    fn hear(&mut self) -> Result<Option<String>>;
}

/// Voices a reply. Returns `false` when the user asked to stop.
pub trait Speaker {
    fn say(&mut self, text: &str) -> Result<bool>;
}

/// Records a clip from the microphone for each question.
pub struct MicrophoneListener<'a> {
    mic: Microphone,
    speech: &'a SpeechClient,
    clip: Duration,
    scratch: PathBuf,
}

impl<'a> MicrophoneListener<'a> {
    pub fn new(speech: &'a SpeechClient, clip: Duration, scratch: PathBuf) -> Result<Self> {
        Ok(Self {
            mic: Microphone::open_default()?,
            speech,
            clip,
            scratch,
        })
    }
}

impl Listener for MicrophoneListener<'_> {
    fn hear(&mut self) -> Result<Option<String>> {
        self.mic.record_wav(self.clip, &self.scratch)?;
        self.speech.recognize_file(&self.scratch)
    }
}

/// Transcribes pre-recorded wav files in order, then reports silence.
pub struct RecordingListener<'a> {
    speech: &'a SpeechClient,
    files: std::vec::IntoIter<PathBuf>,
}

impl<'a> RecordingListener<'a> {
    pub fn new(speech: &'a SpeechClient, files: Vec<PathBuf>) -> Self {
        Self {
            speech,
            files: files.into_iter(),
        }
    }
}

impl Listener for RecordingListener<'_> {
    fn hear(&mut self) -> Result<Option<String>> {
        match self.files.next() {
            Some(wav) => self.speech.recognize_file(&wav),
            None => Ok(None),
        }
    }
}

/// Synthesizes (or reuses) speech for the text and plays it.
pub fn play_sound(speech: &SpeechClient, text: &str) -> Result<StopReason> {
    let wav = speech.get_or_create_audio(text, None)?;
    PlaybackReporter::new().play(&wav)
}

pub struct VoiceSpeaker<'a> {
    speech: &'a SpeechClient,
}

impl<'a> VoiceSpeaker<'a> {
    pub fn new(speech: &'a SpeechClient) -> Self {
        Self { speech }
    }
}

impl Speaker for VoiceSpeaker<'_> {
    fn say(&mut self, text: &str) -> Result<bool> {
        Ok(play_sound(self.speech, text)? == StopReason::Finished)
    }
}

/// How a conversation ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Ending {
    /// The user said the stop word.
    Farewell,
    /// Playback was interrupted from the keyboard.
    Interrupted,
    /// Every listening turn was used.
    TurnLimit,
}

/// Chat with a sliding window of recent context.
pub struct Conversation<C> {
    chat: C,
    history: Vec<ChatMessage>,
    context: usize,
}

impl<C: Completion> Conversation<C> {
    pub fn new(chat: C) -> Self {
        Self {
            chat,
            history: Vec::new(),
            context: CONTEXT_MESSAGES,
        }
    }

    pub fn with_context(mut self, messages: usize) -> Self {
        self.context = messages;
        self
    }

    /// Every question and answer so far.
    pub fn history(&self) -> &[ChatMessage] {
        &self.history
    }

    pub fn answered(&self) -> usize {
        self.history.iter().filter(|m| m.role == Role::Assistant).count()
    }

    /// Ask `question` with the most recent context and record the exchange.
    pub fn ask(&mut self, question: &str) -> Result<String> {
        let start = self.history.len().saturating_sub(self.context);
        let mut messages = self.history[start..].to_vec();
        messages.push(ChatMessage::new(Role::User, question));

        let mut reply = self.chat.complete(&messages)?;
        for _ in 0..STOP_WORD_RETRIES {
            if !is_stop_word(&reply) {
                break;
            }
            reply = self.chat.complete(&messages)?;
        }

        self.history.push(ChatMessage::new(Role::User, question));
        self.history.push(ChatMessage::new(Role::Assistant, reply.clone()));
        Ok(strip_role_prefix(&reply).to_string())
    }

    /// Greet, then listen up to `max_turns` times. Listening, chat and speech
    /// failures are logged and the turn is skipped.
    pub fn run<L, S>(&mut self, listener: &mut L, speaker: &mut S, max_turns: usize) -> Ending
    where
        L: Listener,
        S: Speaker,
    {
        if !say(speaker, GREETING) {
            return Ending::Interrupted;
        }

        for turn in 1..=max_turns {
            let question = match listener.hear() {
                Ok(Some(q)) => q,
                Ok(None) => {
                    info!(turn, "no speech detected");
                    continue;
                }
                Err(e) => {
                    warn!(turn, error = %e, "listening failed");
                    continue;
                }
            };
            let question = question.trim();
            if is_stop_word(question) {
                say(speaker, FAREWELL);
                return Ending::Farewell;
            }
            if question.is_empty() {
                info!(turn, "empty question");
                continue;
            }

            println!("Q: {question}");
            let reply = match self.ask(question) {
                Ok(reply) => reply,
                Err(e) => {
                    warn!(turn, error = %e, "no answer");
                    continue;
                }
            };
            println!("AI: {reply}");
            if !say(speaker, &reply) {
                return Ending::Interrupted;
            }
        }
        Ending::TurnLimit
    }
}

/// `false` only when the listener interrupted playback.
fn say<S: Speaker>(speaker: &mut S, text: &str) -> bool {
    match speaker.say(text) {
        Ok(keep_going) => keep_going,
        Err(e) => {
            warn!(error = %e, "could not speak");
            true
        }
    }
}
