//! Test utilities shared across the crate.
//!
//! This module is only compiled during tests (`#[cfg(test)]`).

use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use futures::StreamExt;
use futures::stream;

use crate::api::{ApiError, EventStream, KokoBackend, MemoryEntry, StreamEvent, UploadReceipt};

/// A backend that accepts everything and returns nothing.
pub struct NoopBackend;

#[async_trait]
impl KokoBackend for NoopBackend {
    async fn chat_stream(&self, _message: &str) -> Result<EventStream, ApiError> {
        Ok(stream::empty().boxed())
    }

    async fn upload_document(&self, _path: &Path) -> Result<UploadReceipt, ApiError> {
        Ok(UploadReceipt::default())
    }

    async fn list_memories(&self) -> Result<Vec<MemoryEntry>, ApiError> {
        Ok(Vec::new())
    }

    async fn save_memory(&self, _text: &str) -> Result<Option<MemoryEntry>, ApiError> {
        Ok(None)
    }

    async fn clear_memories(&self) -> Result<(), ApiError> {
        Ok(())
    }
}

/// A backend that replays canned results.
pub struct ScriptedBackend {
    /// Returned by `chat_stream` instead of opening a stream.
    pub open_error: Option<ApiError>,
    pub events: Vec<Result<StreamEvent, ApiError>>,
    pub upload: Result<UploadReceipt, ApiError>,
    pub memories: Result<Vec<MemoryEntry>, ApiError>,
    pub saved: Result<Option<MemoryEntry>, ApiError>,
    pub cleared: Result<(), ApiError>,
}

impl Default for ScriptedBackend {
    fn default() -> Self {
        Self {
            open_error: None,
            events: Vec::new(),
            upload: Ok(UploadReceipt::default()),
            memories: Ok(Vec::new()),
            saved: Ok(None),
            cleared: Ok(()),
        }
    }
}

#[async_trait]
impl KokoBackend for ScriptedBackend {
    async fn chat_stream(&self, _message: &str) -> Result<EventStream, ApiError> {
        if let Some(err) = &self.open_error {
            return Err(err.clone());
        }
        Ok(stream::iter(self.events.clone()).boxed())
    }

    async fn upload_document(&self, _path: &Path) -> Result<UploadReceipt, ApiError> {
        self.upload.clone()
    }

    async fn list_memories(&self) -> Result<Vec<MemoryEntry>, ApiError> {
        self.memories.clone()
    }

    async fn save_memory(&self, _text: &str) -> Result<Option<MemoryEntry>, ApiError> {
        self.saved.clone()
    }

    async fn clear_memories(&self) -> Result<(), ApiError> {
        self.cleared.clone()
    }
}

/// Creates a test App with a NoopBackend.
pub fn test_app() -> crate::core::state::App {
    crate::core::state::App::new(Arc::new(NoopBackend))
}
