use serde::{Deserialize, Serialize};

/// A single event decoded from the `/chat_stream` body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreamEvent {
    /// Incremental assistant text to append to the in-progress reply.
    Delta(String),
    /// The server finished the reply. Nothing after this is read.
    Done,
}

/// A long-term memory note as stored by the backend.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct MemoryEntry {
    pub text: String,
    #[serde(default)]
    pub created_at: String,
}

/// What the backend said after accepting an uploaded document.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UploadReceipt {
    /// Confirmation text, `None` when the server sent none (or an empty one).
    pub message: Option<String>,
}

#[derive(Serialize, Debug)]
pub(crate) struct ChatStreamRequest<'a> {
    pub message: &'a str,
}

#[derive(Serialize, Debug)]
pub(crate) struct SaveMemoryRequest<'a> {
    pub text: &'a str,
}

/// Union of the JSON bodies returned by the non-streaming endpoints.
///
/// Every field is optional: an unparseable or empty body deserializes to
/// `ResponseBody::default()` rather than failing the request.
#[derive(Deserialize, Debug, Default)]
pub(crate) struct ResponseBody {
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub memory: Option<MemoryEntry>,
    /// Kept untyped so a non-array value degrades to an empty list.
    #[serde(default)]
    pub memories: Option<serde_json::Value>,
}

impl ResponseBody {
    /// Parse a raw body, treating anything that is not a JSON object as empty.
    pub fn parse(text: &str) -> Self {
        serde_json::from_str(text).unwrap_or_default()
    }

    /// The server-supplied error text, or `fallback` when absent or blank.
    pub fn error_or(&self, fallback: &str) -> String {
        self.error
            .as_deref()
            .filter(|e| !e.trim().is_empty())
            .unwrap_or(fallback)
            .to_string()
    }

    /// Entries from the `memories` array. Non-arrays and malformed entries are skipped.
    pub fn memory_list(&self) -> Vec<MemoryEntry> {
        match &self.memories {
            Some(serde_json::Value::Array(items)) => items
                .iter()
                .filter_map(|item| serde_json::from_value(item.clone()).ok())
                .collect(),
            _ => Vec::new(),
        }
    }
}
