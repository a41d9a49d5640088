//! # Conversations
//!
//! `ConversationRegistry` owns every conversation of the session plus the
//! active pointer. The list is never empty: construction and `clear_all`
//! both leave exactly one default conversation behind.
//!
//! ```text
//! ConversationRegistry
//! ├── conversations: Vec<Conversation>   // newest insert first
//! ├── active_id: String                  // always names a member
//! └── last_stamp: i64                    // monotonic updated_at source
//! ```
//!
//! Mutations address conversations (and messages) by id, so work that
//! finishes after the user switched chats still lands in the right place,
//! and work that outlives `clear_all` lands nowhere.

use chrono::Utc;
use uuid::Uuid;

use crate::core::transcript::{Message, Transcript};

pub const DEFAULT_CONVERSATION_ID: &str = "welcome";
pub const DEFAULT_CONVERSATION_TITLE: &str = "Welcome to Koko";
pub const NEW_CONVERSATION_TITLE: &str = "New chat";

const TITLE_MAX_CHARS: usize = 40;

#[derive(Debug, Clone)]
pub struct Conversation {
    pub id: String,
    pub title: String,
    /// Milliseconds since the epoch; strictly increasing across the registry.
    pub updated_at: i64,
    pub pinned: bool,
    pub bookmarked: bool,
    pub transcript: Transcript,
}

impl Conversation {
    fn new(id: String, title: &str, updated_at: i64) -> Self {
        Self {
            id,
            title: title.to_string(),
            updated_at,
            pinned: false,
            bookmarked: false,
            transcript: Transcript::new(),
        }
    }

    pub fn has_placeholder_title(&self) -> bool {
        self.title == NEW_CONVERSATION_TITLE || self.title == DEFAULT_CONVERSATION_TITLE
    }
}

/// Builds a sidebar title from the first thing the user said.
///
/// Whitespace runs collapse to one space; anything past 40 characters is cut
/// and replaced by `…`.
pub fn summarize_title(text: &str) -> String {
    let collapsed = text.split_whitespace().collect::<Vec<_>>().join(" ");
    if collapsed.chars().count() > TITLE_MAX_CHARS {
        let mut title: String = collapsed.chars().take(TITLE_MAX_CHARS).collect();
        title.push('…');
        title
    } else {
        collapsed
    }
}

#[derive(Debug)]
pub struct ConversationRegistry {
    conversations: Vec<Conversation>,
    active_id: String,
    last_stamp: i64,
}

impl Default for ConversationRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl ConversationRegistry {
    pub fn new() -> Self {
        let mut registry = Self {
            conversations: Vec::new(),
            active_id: String::new(),
            last_stamp: 0,
        };
        registry.reset_to_default();
        registry
    }

    fn reset_to_default(&mut self) {
        let stamp = self.next_stamp();
        self.conversations = vec![Conversation::new(
            DEFAULT_CONVERSATION_ID.to_string(),
            DEFAULT_CONVERSATION_TITLE,
            stamp,
        )];
        self.active_id = DEFAULT_CONVERSATION_ID.to_string();
    }

    /// Wall-clock millis, nudged forward so no two stamps are equal.
    fn next_stamp(&mut self) -> i64 {
        let stamp = Utc::now().timestamp_millis().max(self.last_stamp + 1);
        self.last_stamp = stamp;
        stamp
    }

    fn get_mut(&mut self, id: &str) -> Option<&mut Conversation> {
        self.conversations.iter_mut().find(|c| c.id == id)
    }

    pub fn conversations(&self) -> &[Conversation] {
        &self.conversations
    }

    pub fn get(&self, id: &str) -> Option<&Conversation> {
        self.conversations.iter().find(|c| c.id == id)
    }

    pub fn active_id(&self) -> &str {
        &self.active_id
    }

    pub fn active(&self) -> &Conversation {
        // active_id always names a member; fall back to the head just in case
        self.get(&self.active_id)
            .unwrap_or_else(|| &self.conversations[0])
    }

    pub fn create_conversation(&mut self) -> String {
        self.insert_conversation(Uuid::new_v4().to_string())
    }

    /// Inserts an empty conversation at the front and activates it. An id that
    /// already exists is only activated.
    pub fn insert_conversation(&mut self, id: String) -> String {
        if self.get(&id).is_none() {
            let stamp = self.next_stamp();
            self.conversations
                .insert(0, Conversation::new(id.clone(), NEW_CONVERSATION_TITLE, stamp));
        }
        self.active_id = id.clone();
        id
    }

    /// Returns false (and changes nothing) for an unknown id.
    pub fn select_conversation(&mut self, id: &str) -> bool {
        if self.get(id).is_some() {
            self.active_id = id.to_string();
            true
        } else {
            false
        }
    }

    pub fn clear_all(&mut self) {
        self.reset_to_default();
    }

    pub fn append_message(&mut self, conversation_id: &str, message: Message) {
        let stamp = self.next_stamp();
        if let Some(conversation) = self.get_mut(conversation_id) {
            conversation.transcript.push(message);
            conversation.updated_at = stamp;
        }
    }

    pub fn update_last_assistant_message(&mut self, conversation_id: &str, delta: &str) -> bool {
        self.get_mut(conversation_id)
            .is_some_and(|c| c.transcript.append_to_last(delta))
    }

    pub fn append_to_message(&mut self, conversation_id: &str, message_id: &str, delta: &str) -> bool {
        self.get_mut(conversation_id)
            .is_some_and(|c| c.transcript.append_to(message_id, delta))
    }

    pub fn replace_message_text(&mut self, conversation_id: &str, message_id: &str, text: &str) -> bool {
        self.get_mut(conversation_id)
            .is_some_and(|c| c.transcript.replace_text(message_id, text))
    }

    pub fn finish_message(&mut self, conversation_id: &str, message_id: &str) -> bool {
        self.get_mut(conversation_id)
            .is_some_and(|c| c.transcript.finish(message_id))
    }

    /// Titles a conversation from `candidate`, once. Only applies while the
    /// conversation has no user message and still carries a placeholder title.
    pub fn derive_title_if_needed(&mut self, conversation_id: &str, candidate: &str) -> bool {
        let title = summarize_title(candidate);
        if title.is_empty() {
            return false;
        }
        match self.get_mut(conversation_id) {
            Some(c) if !c.transcript.has_user_message() && c.has_placeholder_title() => {
                c.title = title;
                true
            }
            _ => false,
        }
    }

    pub fn toggle_pinned(&mut self, id: &str) -> bool {
        match self.get_mut(id) {
            Some(c) => {
                c.pinned = !c.pinned;
                true
            }
            None => false,
        }
    }

    pub fn toggle_bookmarked(&mut self, id: &str) -> bool {
        match self.get_mut(id) {
            Some(c) => {
                c.bookmarked = !c.bookmarked;
                true
            }
            None => false,
        }
    }

    /// Most recently updated first.
    pub fn ordered(&self) -> Vec<&Conversation> {
        let mut ordered: Vec<&Conversation> = self.conversations.iter().collect();
        ordered.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        ordered
    }
}
