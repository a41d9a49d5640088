//! Client-side view of the long-term memory store: a read-through cache of
//! entries, the note being typed, and which request (if any) is in flight.

use crate::api::MemoryEntry;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum MemoryStatus {
    #[default]
    Idle,
    Loading,
    Saving,
}

#[derive(Debug, Default)]
pub struct MemoryPanel {
    pub entries: Vec<MemoryEntry>,
    pub note: String,
    pub status: MemoryStatus,
}

impl MemoryPanel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_saving(&self) -> bool {
        self.status == MemoryStatus::Saving
    }

    /// The note as it would be sent, or `None` when there is nothing to save.
    pub fn trimmed_note(&self) -> Option<String> {
        let trimmed = self.note.trim();
        (!trimmed.is_empty()).then(|| trimmed.to_string())
    }

    pub fn status_label(&self) -> &'static str {
        match self.status {
            MemoryStatus::Idle => "",
            MemoryStatus::Loading => "Loading...",
            MemoryStatus::Saving => "Saving...",
        }
    }
}
