use std::cell::RefCell;
use std::collections::VecDeque;

use warbler::app::conversation::{Conversation, Ending, Listener, Speaker, CONTEXT_MESSAGES, FAREWELL, GREETING};
use warbler::services::{ChatMessage, Completion};
use warbler::{Error, Result};

/// Replies from a fixed script and records how many messages each call carried.
struct Scripted {
    replies: RefCell<VecDeque<&'static str>>,
    sent: RefCell<Vec<usize>>,
}

impl Scripted {
    fn new(replies: &[&'static str]) -> Self {
        Self {
            replies: RefCell::new(replies.iter().copied().collect()),
            sent: RefCell::new(Vec::new()),
        }
    }
}

impl Completion for &Scripted {
    fn complete(&self, messages: &[ChatMessage]) -> Result<String> {
        self.sent.borrow_mut().push(messages.len());
        self.replies
            .borrow_mut()
            .pop_front()
            .map(str::to_string)
            .ok_or_else(|| Error::service("chat", "script exhausted"))
    }
}

struct Heard(VecDeque<Option<&'static str>>);

impl Heard {
    fn new(questions: &[Option<&'static str>]) -> Self {
        Self(questions.iter().copied().collect())
    }
}

impl Listener for Heard {
    fn hear(&mut self) -> Result<Option<String>> {
        Ok(self.0.pop_front().flatten().map(str::to_string))
    }
}

#[derive(Default)]
struct Spoken {
    lines: Vec<String>,
    interrupt_after: Option<usize>,
}

impl Speaker for Spoken {
    fn say(&mut self, text: &str) -> Result<bool> {
        self.lines.push(text.to_string());
        Ok(self.interrupt_after.is_none_or(|n| self.lines.len() < n))
    }
}

#[test]
fn answers_until_the_stop_word() {
    let chat = Scripted::new(&["AI: 你好", "今天晴"]);
    let mut ears = Heard::new(&[Some("你好"), None, Some("  "), Some("天气如何"), Some("退出"), Some("never asked")]);
    let mut mouth = Spoken::default();

    let mut talk = Conversation::new(&chat);
    let ending = talk.run(&mut ears, &mut mouth, 10);

    assert_eq!(ending, Ending::Farewell);
    assert_eq!(mouth.lines, [GREETING, "你好", "今天晴", FAREWELL]);
    assert_eq!(talk.answered(), 2);
    assert_eq!(*chat.sent.borrow(), [1, 3]);
    assert_eq!(ears.0.len(), 1);
}

#[test]
fn quit_ends_the_conversation() {
    let chat = Scripted::new(&[]);
    let mut mouth = Spoken::default();
    let ending = Conversation::new(&chat).run(&mut Heard::new(&[Some("quit")]), &mut mouth, 3);
    assert_eq!(ending, Ending::Farewell);
    assert!(chat.sent.borrow().is_empty());
}

#[test]
fn listening_is_bounded_by_the_turn_limit() {
    let chat = Scripted::new(&[]);
    let mut ears = Heard::new(&[None; 8]);
    let mut mouth = Spoken::default();

    let ending = Conversation::new(&chat).run(&mut ears, &mut mouth, 5);

    assert_eq!(ending, Ending::TurnLimit);
    assert_eq!(ears.0.len(), 3);
    assert_eq!(mouth.lines, [GREETING]);
}

#[test]
fn context_is_limited_to_recent_messages() {
    let replies = ["一", "二", "三", "四", "五", "六", "七", "八"];
    let chat = Scripted::new(&replies);
    let mut talk = Conversation::new(&chat);
    for i in 0..replies.len() {
        talk.ask(&format!("问题{i}")).unwrap();
    }

    let sent = chat.sent.borrow();
    assert_eq!(sent[..3], [1, 3, 5]);
    assert!(sent.iter().all(|&n| n <= CONTEXT_MESSAGES + 1));
    assert_eq!(*sent.last().unwrap(), CONTEXT_MESSAGES + 1);
    assert_eq!(talk.history().len(), 2 * replies.len());
}

#[test]
fn stop_word_replies_are_asked_again() {
    let chat = Scripted::new(&["退出", "退出", "好的"]);
    let mut talk = Conversation::new(&chat);
    assert_eq!(talk.ask("讲个笑话").unwrap(), "好的");
    assert_eq!(chat.sent.borrow().len(), 3);
    assert_eq!(talk.answered(), 1);
}

#[test]
fn chat_failures_skip_the_turn() {
    let chat = Scripted::new(&[]);
    let mut ears = Heard::new(&[Some("在吗"), Some("退出")]);
    let mut mouth = Spoken::default();
    let mut talk = Conversation::new(&chat);

    assert_eq!(talk.run(&mut ears, &mut mouth, 5), Ending::Farewell);
    assert_eq!(talk.answered(), 0);
    assert_eq!(mouth.lines, [GREETING, FAREWELL]);
}

#[test]
fn interrupted_playback_ends_the_conversation() {
    let chat = Scripted::new(&["一", "二"]);
    let mut ears = Heard::new(&[Some("a"), Some("b"), Some("c")]);
    let mut mouth = Spoken {
        interrupt_after: Some(2),
        ..Spoken::default()
    };

    let ending = Conversation::new(&chat).run(&mut ears, &mut mouth, 5);

    assert_eq!(ending, Ending::Interrupted);
    assert_eq!(mouth.lines, [GREETING, "一"]);
    assert_eq!(ears.0.len(), 2);
}
