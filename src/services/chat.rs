// src/services/chat.rs
//! Azure OpenAI chat completions and a bounded conversation loop.

use reqwest::blocking::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::{check_status, http_client};
use crate::config::{require, ChatConfig};
use crate::error::{Error, Result};

const SERVICE: &str = "chat";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }
}

/// Anything that can turn a message history into the next assistant reply.
pub trait Completion {
    fn complete(&self, messages: &[ChatMessage]) -> Result<String>;
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    messages: &'a [ChatMessage],
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ReplyMessage,
}

#[derive(Deserialize)]
struct ReplyMessage {
    content: Option<String>,
}

/// First choice's content, or `MalformedResponse`.
fn first_choice(body: &str) -> Result<String> {
    let parsed: ChatResponse =
        serde_json::from_str(body).map_err(|e| Error::MalformedResponse(format!("chat completion: {e}")))?;
    parsed
        .choices
        .into_iter()
        .next()
        .and_then(|c| c.message.content)
        .ok_or_else(|| Error::MalformedResponse("chat completion has no message content".into()))
}

pub struct ChatClient {
    http: Client,
    url: String,
    api_version: String,
    api_key: String,
}

impl ChatClient {
    pub fn new(config: &ChatConfig) -> Result<Self> {
        let endpoint = require(&config.endpoint, "chat.endpoint")?;
        let api_key = require(&config.api_key, "chat.api_key")?;
        Ok(Self {
            http: http_client(SERVICE, config.timeout_secs)?,
            url: completions_url(endpoint, &config.deployment),
            api_version: config.api_version.clone(),
            api_key: api_key.to_string(),
        })
    }
}

fn completions_url(endpoint: &str, deployment: &str) -> String {
    format!(
        "{}/openai/deployments/{deployment}/chat/completions",
        endpoint.trim_end_matches('/')
    )
}

impl Completion for ChatClient {
    fn complete(&self, messages: &[ChatMessage]) -> Result<String> {
        debug!(messages = messages.len(), "requesting chat completion");
        let resp = self
            .http
            .post(&self.url)
            .query(&[("api-version", self.api_version.as_str())])
            .header("api-key", &self.api_key)
            .json(&ChatRequest { messages })
            .send()
            .map_err(|e| Error::service(SERVICE, e))?;
        let body = check_status(SERVICE, resp)?
            .text()
            .map_err(|e| Error::service(SERVICE, e))?;
        first_choice(&body)
    }
}

/// A conversation seeded with a system prompt. The first user turn repeats
/// the prompt; every later turn sends `follow_up`.
pub struct ChatSession<C> {
    client: C,
    prompt: String,
    follow_up: String,
    messages: Vec<ChatMessage>,
}

impl<C: Completion> ChatSession<C> {
    pub fn new(client: C, prompt: impl Into<String>, follow_up: impl Into<String>) -> Self {
        let prompt = prompt.into();
        Self {
            client,
            messages: vec![ChatMessage::new(Role::System, prompt.clone())],
            prompt,
            follow_up: follow_up.into(),
        }
    }

    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    /// Send the next user turn and record the reply.
    pub fn next_reply(&mut self) -> Result<String> {
        let user = if self.messages.len() == 1 {
            self.prompt.clone()
        } else {
            self.follow_up.clone()
        };
        self.messages.push(ChatMessage::new(Role::User, user));
        let reply = self.client.complete(&self.messages)?;
        self.messages.push(ChatMessage::new(Role::Assistant, reply.clone()));
        Ok(reply)
    }

    /// Request up to `max_turns` replies, handing each to `on_reply`.
    /// Stops early when `on_reply` returns `false`. Returns the turns taken.
    pub fn run<F>(&mut self, max_turns: usize, mut on_reply: F) -> Result<usize>
    where
        F: FnMut(usize, &str) -> bool,
    {
        for turn in 0..max_turns {
            let reply = self.next_reply()?;
            info!(turn = turn + 1, chars = reply.chars().count(), "reply received");
            if !on_reply(turn, &reply) {
                return Ok(turn + 1);
            }
        }
        Ok(max_turns)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;

    /// Replies "reply N" and records the history length of each call.
    struct Scripted {
        calls: RefCell<Vec<usize>>,
    }

    impl Completion for &Scripted {
        fn complete(&self, messages: &[ChatMessage]) -> Result<String> {
            let mut calls = self.calls.borrow_mut();
            calls.push(messages.len());
            Ok(format!("reply {}", calls.len()))
        }
    }

    #[test]
    fn stops_at_turn_limit() {
        let fake = Scripted { calls: RefCell::new(Vec::new()) };
        let mut session = ChatSession::new(&fake, "write a poem", "another");
        let mut seen = Vec::new();
        let turns = session
            .run(3, |_, reply| {
                seen.push(reply.to_string());
                true
            })
            .unwrap();
        assert_eq!(turns, 3);
        assert_eq!(seen, ["reply 1", "reply 2", "reply 3"]);
        assert_eq!(*fake.calls.borrow(), [2, 4, 6]);
    }

    #[test]
    fn predicate_stops_early() {
        let fake = Scripted { calls: RefCell::new(Vec::new()) };
        let mut session = ChatSession::new(&fake, "p", "f");
        let turns = session.run(10, |turn, _| turn < 1).unwrap();
        assert_eq!(turns, 2);
        assert_eq!(fake.calls.borrow().len(), 2);
    }

    #[test]
    fn history_uses_follow_up_after_first_turn() {
        let fake = Scripted { calls: RefCell::new(Vec::new()) };
        let mut session = ChatSession::new(&fake, "prompt", "再来一个");
        session.next_reply().unwrap();
        session.next_reply().unwrap();
        let roles: Vec<Role> = session.messages().iter().map(|m| m.role).collect();
        assert_eq!(
            roles,
            [Role::System, Role::User, Role::Assistant, Role::User, Role::Assistant]
        );
        assert_eq!(session.messages()[1].content, "prompt");
        assert_eq!(session.messages()[2].content, "reply 1");
        assert_eq!(session.messages()[3].content, "再来一个");
    }

    #[test]
    fn parses_first_choice() {
        let body = r#"{"choices":[{"message":{"role":"assistant","content":"hi"}}]}"#;
        assert_eq!(first_choice(body).unwrap(), "hi");
        assert!(matches!(first_choice(r#"{"choices":[]}"#), Err(Error::MalformedResponse(_))));
        assert!(matches!(first_choice("not json"), Err(Error::MalformedResponse(_))));
    }

    #[test]
    fn role_serializes_lowercase() {
        let json = serde_json::to_string(&ChatMessage::new(Role::Assistant, "x")).unwrap();
        assert_eq!(json, r#"{"role":"assistant","content":"x"}"#);
    }

    #[test]
    fn url_and_missing_credentials() {
        assert_eq!(
            completions_url("https://res.openai.azure.com/", "gpt-4o"),
            "https://res.openai.azure.com/openai/deployments/gpt-4o/chat/completions"
        );
        assert!(matches!(ChatClient::new(&ChatConfig::default()), Err(Error::Config(_))));
    }
}
