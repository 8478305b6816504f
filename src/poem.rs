// src/poem.rs
//! The structured reply a poem prompt asks for.

use serde::Deserialize;

use crate::error::{Error, Result};

/// Appended to a topic so the reply matches [`PoemDraft`].
pub const SCHEMA_INSTRUCTIONS: &str = r#"以json格式返回，标准如下：
{
    "title": "文章标题",
    "content": "文章内容",
    "photo_desc": "面向 dalle3 编写一套用于生成对应封面的prompt"
}"#;

/// Full prompt asking for a structured poem about `topic`.
pub fn poem_prompt(topic: &str) -> String {
    format!("{topic}，{SCHEMA_INSTRUCTIONS}")
}

/// `{ "title": ..., "content": ..., "photo_desc": ... }`
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct PoemDraft {
    pub title: String,
    pub content: String,
    /// Image-generation prompt for the cover.
    pub photo_desc: String,
}

impl PoemDraft {
    /// Parse a chat reply, tolerating a surrounding Markdown code fence.
    pub fn parse(reply: &str) -> Result<Self> {
        let json = strip_code_fence(reply);
        let draft: PoemDraft = serde_json::from_str(json).map_err(|e| Error::MalformedResponse(e.to_string()))?;
        if draft.title.trim().is_empty() {
            return Err(Error::MalformedResponse("title is empty".into()));
        }
        Ok(draft)
    }

    /// Title line followed by the body; this is what gets narrated.
    pub fn full_text(&self) -> String {
        format!("{}\n{}", self.title, self.content)
    }

    /// The title made safe to use as a file name.
    pub fn file_stem(&self) -> String {
        sanitize_stem(&self.title)
    }
}

fn strip_code_fence(reply: &str) -> &str {
    let trimmed = reply.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    // Drop the info string (`json`) on the opening fence line.
    let body = rest.split_once('\n').map_or("", |(_, body)| body);
    body.trim_end().strip_suffix("```").unwrap_or(body).trim()
}

/// Replace path separators and other characters file systems reject.
pub fn sanitize_stem(title: &str) -> String {
    let stem: String = title
        .trim()
        .chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect();
    let stem = stem.trim_matches('.').trim();
    if stem.is_empty() {
        "untitled".to_string()
    } else {
        stem.to_string()
    }
}
