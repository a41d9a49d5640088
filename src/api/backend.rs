use std::fmt;
use std::path::Path;

use async_trait::async_trait;
use futures::stream::BoxStream;

use super::types::{MemoryEntry, StreamEvent, UploadReceipt};

/// Errors that can occur while talking to the Koko backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApiError {
    /// Connection-level failure (DNS, refused, reset mid-stream).
    Network(String),
    /// The server answered with a non-2xx status.
    Http { status: u16, message: String },
    /// A `data:` record in the event stream was not valid JSON.
    Parse(String),
    /// The document picked for upload could not be read.
    File(String),
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApiError::Network(msg) => write!(f, "network error: {msg}"),
            ApiError::Http { status, message } => write!(f, "HTTP {status}: {message}"),
            ApiError::Parse(msg) => write!(f, "stream parse error: {msg}"),
            ApiError::File(msg) => write!(f, "file error: {msg}"),
        }
    }
}

impl std::error::Error for ApiError {}

/// Lazily decoded `/chat_stream` events. Ends after `Done`, at end of body, or
/// after the first `Err`.
pub type EventStream = BoxStream<'static, Result<StreamEvent, ApiError>>;

/// The HTTP contract the client relies on. `HttpBackend` is the real
/// implementation; tests substitute scripted ones.
#[async_trait]
pub trait KokoBackend: Send + Sync {
    /// Opens a chat stream for `message`. Fails before any event if the
    /// request could not be sent or the status was not 2xx.
    async fn chat_stream(&self, message: &str) -> Result<EventStream, ApiError>;

    /// Uploads the file at `path` as multipart field `file`.
    async fn upload_document(&self, path: &Path) -> Result<UploadReceipt, ApiError>;

    async fn list_memories(&self) -> Result<Vec<MemoryEntry>, ApiError>;

    /// Saves a note. `Ok(None)` means the server accepted it without echoing the entry.
    async fn save_memory(&self, text: &str) -> Result<Option<MemoryEntry>, ApiError>;

    async fn clear_memories(&self) -> Result<(), ApiError>;
}
