//! # Transcript
//!
//! The ordered message list of one conversation.
//!
//! ```text
//! Transcript
//! └── messages: Vec<Message>
//!     ├── Message { sender: User,      pending: false }   "What is Q3 revenue?"
//!     └── Message { sender: Assistant, pending: true  }   "Q3 rev" ← deltas land here
//! ```
//!
//! Assistant replies are created empty and pending. Streaming deltas append to
//! them until `finish` seals the text; after that every mutation is a no-op.

use chrono::Local;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sender {
    User,
    Assistant,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    pub id: String,
    pub text: String,
    pub sender: Sender,
    /// Local wall-clock time of creation, `HH:MM`.
    pub timestamp: String,
    /// True while the reply is still streaming in.
    pub pending: bool,
}

fn display_time() -> String {
    Local::now().format("%H:%M").to_string()
}

impl Message {
    /// A complete user-authored message.
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            text: text.into(),
            sender: Sender::User,
            timestamp: display_time(),
            pending: false,
        }
    }

    /// An empty assistant reply waiting for its text.
    pub fn assistant_placeholder() -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            text: String::new(),
            sender: Sender::Assistant,
            timestamp: display_time(),
            pending: true,
        }
    }

    pub fn is_user(&self) -> bool {
        self.sender == Sender::User
    }
}

#[derive(Debug, Clone, Default)]
pub struct Transcript {
    messages: Vec<Message>,
}

impl Transcript {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, message: Message) {
        self.messages.push(message);
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn last(&self) -> Option<&Message> {
        self.messages.last()
    }

    pub fn has_user_message(&self) -> bool {
        self.messages.iter().any(Message::is_user)
    }

    fn pending_mut(&mut self, message_id: &str) -> Option<&mut Message> {
        self.messages
            .iter_mut()
            .find(|m| m.id == message_id)
            .filter(|m| m.pending)
    }

    /// Appends to the most recent message if it is still pending.
    pub fn append_to_last(&mut self, delta: &str) -> bool {
        match self.messages.last_mut() {
            Some(last) if last.pending => {
                last.text.push_str(delta);
                true
            }
            _ => false,
        }
    }

    pub fn append_to(&mut self, message_id: &str, delta: &str) -> bool {
        match self.pending_mut(message_id) {
            Some(message) => {
                message.text.push_str(delta);
                true
            }
            None => false,
        }
    }

    pub fn replace_text(&mut self, message_id: &str, text: &str) -> bool {
        match self.pending_mut(message_id) {
            Some(message) => {
                message.text = text.to_string();
                true
            }
            None => false,
        }
    }

    /// Seals a pending message. Returns false if it was unknown or already final.
    pub fn finish(&mut self, message_id: &str) -> bool {
        match self.pending_mut(message_id) {
            Some(message) => {
                message.pending = false;
                true
            }
            None => false,
        }
    }
}
