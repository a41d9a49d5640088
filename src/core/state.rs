//! # Application State
//!
//! Core business state for Koko. This module contains domain logic only -
//! no TUI-specific types. Presentation state lives in the `tui` module.
//!
//! ```text
//! App
//! ├── backend: Arc<dyn KokoBackend>     // HTTP contract
//! ├── registry: ConversationRegistry    // chats + active pointer
//! ├── memory: MemoryPanel               // memory cache, note, status
//! ├── typing: HashMap                   // conversation id → streaming reply id
//! ├── is_uploading: bool                // one upload at a time
//! ├── selected_file: Option<PathBuf>    // picked document, cleared after upload
//! ├── status_message: String            // status bar text
//! ├── suggestions: Vec<String>          // quick-prompt chips
//! └── api_base: String                  // resolved backend URL (display only)
//! ```
//!
//! State changes only happen through `update(state, action)` in action.rs.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

use crate::api::KokoBackend;
use crate::core::config::{DEFAULT_API_BASE, ResolvedConfig, default_suggestions};
use crate::core::conversation::ConversationRegistry;
use crate::core::memory::MemoryPanel;

pub struct App {
    pub backend: Arc<dyn KokoBackend>,
    pub registry: ConversationRegistry,
    pub memory: MemoryPanel,
    /// Conversations with a reply streaming in, mapped to that reply's message id.
    pub typing: HashMap<String, String>,
    pub is_uploading: bool,
    pub selected_file: Option<PathBuf>,
    pub status_message: String,
    pub suggestions: Vec<String>,
    pub api_base: String,
}

impl App {
    pub fn new(backend: Arc<dyn KokoBackend>) -> Self {
        Self {
            backend,
            registry: ConversationRegistry::new(),
            memory: MemoryPanel::new(),
            typing: HashMap::new(),
            is_uploading: false,
            selected_file: None,
            status_message: String::from("Welcome to Koko!"),
            suggestions: default_suggestions(),
            api_base: DEFAULT_API_BASE.to_string(),
        }
    }

    pub fn from_config(backend: Arc<dyn KokoBackend>, config: &ResolvedConfig) -> Self {
        Self {
            suggestions: config.suggestions.clone(),
            api_base: config.api_base.clone(),
            ..Self::new(backend)
        }
    }

    pub fn is_typing(&self, conversation_id: &str) -> bool {
        self.typing.contains_key(conversation_id)
    }

    /// Whether the conversation on screen is waiting on a reply.
    pub fn active_is_typing(&self) -> bool {
        self.is_typing(self.registry.active_id())
    }
}
