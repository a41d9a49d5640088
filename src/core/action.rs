//! # Actions
//!
//! Everything that can happen in Koko becomes an `Action`.
//! User presses Enter? That's `Action::SubmitMessage`.
//! A stream delta arrives? That's `Action::ResponseDelta { .. }`.
//!
//! The `update()` function takes the current state and an action,
//! mutates the state, and returns an `Effect` describing any I/O the
//! adapter should start. No side effects here. I/O happens elsewhere.
//!
//! ```text
//! State + Action  →  update()  →  New State + Effect
//! ```
//!
//! Results of I/O come back as more actions, always carrying the ids of the
//! conversation and message they belong to.

use std::path::PathBuf;

use log::{debug, info, warn};

use crate::api::{ApiError, MemoryEntry};
use crate::core::memory::MemoryStatus;
use crate::core::state::App;
use crate::core::transcript::Message;

pub const UPLOAD_FALLBACK_MESSAGE: &str = "Document uploaded. Ask me anything about it!";

#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    // Chat
    SubmitMessage(String),
    ResponseDelta {
        conversation_id: String,
        message_id: String,
        text: String,
    },
    ResponseDone {
        conversation_id: String,
        message_id: String,
    },
    ResponseFailed {
        conversation_id: String,
        message_id: String,
        error: ApiError,
    },

    // Documents
    PickFile(PathBuf),
    UploadDocument,
    UploadSucceeded {
        conversation_id: String,
        message_id: String,
        message: Option<String>,
    },
    UploadFailed {
        conversation_id: String,
        message_id: String,
        error: ApiError,
    },

    // Sidebar
    NewConversation,
    SelectConversation(String),
    ClearAll,
    TogglePinned(String),
    ToggleBookmarked(String),

    // Memories
    LoadMemories,
    MemoriesLoaded(Vec<MemoryEntry>),
    EditMemoryNote(String),
    SaveMemory,
    MemorySaved(Option<MemoryEntry>),
    MemorySaveFailed(ApiError),
    ClearMemories,
    MemoriesCleared,
    MemoryClearFailed(ApiError),

    Quit,
}

/// I/O the adapter should perform after an update.
#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    None,
    Quit,
    SpawnChatStream {
        conversation_id: String,
        message_id: String,
        text: String,
    },
    SpawnUpload {
        conversation_id: String,
        message_id: String,
        path: PathBuf,
    },
    SpawnLoadMemories,
    SpawnSaveMemory(String),
    SpawnClearMemories,
}

pub fn update(app: &mut App, action: Action) -> Effect {
    match action {
        Action::SubmitMessage(text) => submit_message(app, &text),
        Action::ResponseDelta {
            conversation_id,
            message_id,
            text,
        } => {
            app.registry
                .append_to_message(&conversation_id, &message_id, &text);
            Effect::None
        }
        Action::ResponseDone {
            conversation_id,
            message_id,
        } => {
            app.registry.finish_message(&conversation_id, &message_id);
            stop_typing(app, &conversation_id, &message_id);
            Effect::None
        }
        Action::ResponseFailed {
            conversation_id,
            message_id,
            error,
        } => {
            warn!("Chat stream failed for {}: {}", conversation_id, error);
            app.registry.replace_message_text(
                &conversation_id,
                &message_id,
                &format!("[Server error] {error}"),
            );
            app.registry.finish_message(&conversation_id, &message_id);
            stop_typing(app, &conversation_id, &message_id);
            app.status_message = String::from("Server error");
            Effect::None
        }

        Action::PickFile(path) => {
            // The selection of an upload in flight stays put
            if app.is_uploading {
                debug!("Upload in flight, ignoring pick of {}", path.display());
                app.status_message = String::from("Upload already in progress");
                return Effect::None;
            }
            app.status_message = format!("Selected {}", path.display());
            app.selected_file = Some(path);
            Effect::None
        }
        Action::UploadDocument => upload_document(app),
        Action::UploadSucceeded {
            conversation_id,
            message_id,
            message,
        } => {
            let text = message
                .filter(|m| !m.trim().is_empty())
                .unwrap_or_else(|| UPLOAD_FALLBACK_MESSAGE.to_string());
            settle_upload(app, &conversation_id, &message_id, &text);
            app.status_message = String::from("Document uploaded");
            Effect::None
        }
        Action::UploadFailed {
            conversation_id,
            message_id,
            error,
        } => {
            warn!("Upload failed: {}", error);
            settle_upload(
                app,
                &conversation_id,
                &message_id,
                &format!("[Upload error] {error}"),
            );
            app.status_message = String::from("Upload failed");
            Effect::None
        }

        Action::NewConversation => {
            let id = app.registry.create_conversation();
            debug!("Created conversation {}", id);
            Effect::None
        }
        Action::SelectConversation(id) => {
            if !app.registry.select_conversation(&id) {
                debug!("Ignoring selection of unknown conversation {}", id);
            }
            Effect::None
        }
        Action::ClearAll => {
            info!("Clearing all conversations");
            app.registry.clear_all();
            app.typing.clear();
            app.status_message = String::from("All chats cleared");
            Effect::None
        }
        Action::TogglePinned(id) => {
            app.registry.toggle_pinned(&id);
            Effect::None
        }
        Action::ToggleBookmarked(id) => {
            app.registry.toggle_bookmarked(&id);
            Effect::None
        }

        Action::LoadMemories => {
            if app.memory.status != MemoryStatus::Idle {
                return Effect::None;
            }
            app.memory.status = MemoryStatus::Loading;
            Effect::SpawnLoadMemories
        }
        Action::MemoriesLoaded(entries) => {
            debug!("Loaded {} memories", entries.len());
            app.memory.entries = entries;
            // A save or clear may have started while the list was loading
            if app.memory.status == MemoryStatus::Loading {
                app.memory.status = MemoryStatus::Idle;
            }
            Effect::None
        }
        Action::EditMemoryNote(note) => {
            app.memory.note = note;
            Effect::None
        }
        Action::SaveMemory => {
            if app.memory.is_saving() {
                app.status_message = String::from("Memory request in progress");
                return Effect::None;
            }
            let Some(note) = app.memory.trimmed_note() else {
                return Effect::None;
            };
            app.memory.status = MemoryStatus::Saving;
            Effect::SpawnSaveMemory(note)
        }
        Action::MemorySaved(entry) => {
            app.memory.note.clear();
            match entry {
                Some(entry) => {
                    app.memory.entries.push(entry);
                    app.memory.status = MemoryStatus::Idle;
                    app.status_message = String::from("Memory saved");
                    Effect::None
                }
                None => {
                    // Saved, but the server did not echo the entry back
                    app.memory.status = MemoryStatus::Loading;
                    Effect::SpawnLoadMemories
                }
            }
        }
        Action::MemorySaveFailed(error) => {
            warn!("Failed to save memory: {}", error);
            app.memory.note.clear();
            app.memory.status = MemoryStatus::Idle;
            Effect::None
        }
        Action::ClearMemories => {
            if app.memory.is_saving() {
                app.status_message = String::from("Memory request in progress");
                return Effect::None;
            }
            app.memory.status = MemoryStatus::Saving;
            Effect::SpawnClearMemories
        }
        Action::MemoriesCleared => {
            app.memory.entries.clear();
            app.memory.status = MemoryStatus::Idle;
            app.status_message = String::from("Memories cleared");
            Effect::None
        }
        Action::MemoryClearFailed(error) => {
            warn!("Failed to clear memories: {}", error);
            app.memory.status = MemoryStatus::Idle;
            Effect::None
        }

        Action::Quit => Effect::Quit,
    }
}

fn submit_message(app: &mut App, text: &str) -> Effect {
    let text = text.trim();
    if text.is_empty() {
        return Effect::None;
    }
    let conversation_id = app.registry.active_id().to_string();
    if app.is_typing(&conversation_id) {
        debug!("Reply already streaming in {}, ignoring submit", conversation_id);
        return Effect::None;
    }

    app.registry.derive_title_if_needed(&conversation_id, text);
    app.registry
        .append_message(&conversation_id, Message::user(text));
    let reply = Message::assistant_placeholder();
    let message_id = reply.id.clone();
    app.registry.append_message(&conversation_id, reply);
    app.typing
        .insert(conversation_id.clone(), message_id.clone());

    info!("Submitting message in {} ({} chars)", conversation_id, text.len());
    Effect::SpawnChatStream {
        conversation_id,
        message_id,
        text: text.to_string(),
    }
}

fn upload_document(app: &mut App) -> Effect {
    if app.is_uploading {
        return Effect::None;
    }
    let Some(path) = app.selected_file.clone() else {
        return Effect::None;
    };
    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());

    let conversation_id = app.registry.active_id().to_string();
    let notice = format!("Uploaded document: {file_name}");
    app.registry.derive_title_if_needed(&conversation_id, &notice);
    app.registry
        .append_message(&conversation_id, Message::user(notice));
    let placeholder = Message::assistant_placeholder();
    let message_id = placeholder.id.clone();
    app.registry.append_message(&conversation_id, placeholder);
    app.is_uploading = true;
    app.status_message = format!("Uploading {file_name}...");

    info!("Uploading {} into {}", path.display(), conversation_id);
    Effect::SpawnUpload {
        conversation_id,
        message_id,
        path,
    }
}

fn settle_upload(app: &mut App, conversation_id: &str, message_id: &str, text: &str) {
    app.registry
        .replace_message_text(conversation_id, message_id, text);
    app.registry.finish_message(conversation_id, message_id);
    app.is_uploading = false;
    app.selected_file = None;
}

/// Clears the typing flag, unless a newer reply in the same conversation owns it.
fn stop_typing(app: &mut App, conversation_id: &str, message_id: &str) {
    if app.typing.get(conversation_id).map(String::as_str) == Some(message_id) {
        app.typing.remove(conversation_id);
    }
}
