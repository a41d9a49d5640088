//! reqwest implementation of [`KokoBackend`].

use std::path::Path;

use async_trait::async_trait;
use futures::StreamExt;
use log::{debug, info, warn};
use reqwest::multipart::{Form, Part};

use super::backend::{ApiError, EventStream, KokoBackend};
use super::sse::decode_stream;
use super::types::{
    ChatStreamRequest, MemoryEntry, ResponseBody, SaveMemoryRequest, UploadReceipt,
};

/// HTTP client for the Koko backend rooted at `base_url`.
pub struct HttpBackend {
    base_url: String,
    client: reqwest::Client,
}

impl HttpBackend {
    /// Creates a backend for `base_url`. Trailing slashes are dropped so
    /// endpoint paths can be appended directly.
    pub fn new(base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self {
            base_url,
            client: reqwest::Client::new(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path)
    }
}

fn network(e: reqwest::Error) -> ApiError {
    ApiError::Network(e.to_string())
}

/// Reads a JSON body leniently: unparseable bodies become an empty object.
async fn read_body(response: reqwest::Response) -> (reqwest::StatusCode, ResponseBody) {
    let status = response.status();
    let text = response.text().await.unwrap_or_default();
    debug!("Response {}: {} bytes", status, text.len());
    (status, ResponseBody::parse(&text))
}

#[async_trait]
impl KokoBackend for HttpBackend {
    async fn chat_stream(&self, message: &str) -> Result<EventStream, ApiError> {
        info!("POST /chat_stream ({} chars)", message.len());
        let response = self
            .client
            .post(self.endpoint("chat_stream"))
            .json(&ChatStreamRequest { message })
            .send()
            .await
            .map_err(network)?;

        debug!("chat_stream response status: {}", response.status());

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            warn!("chat_stream error: {} - {}", status, body);
            let message = if body.trim().is_empty() {
                "server error".to_string()
            } else {
                body
            };
            return Err(ApiError::Http { status, message });
        }

        Ok(decode_stream(Box::pin(response.bytes_stream())).boxed())
    }

    async fn upload_document(&self, path: &Path) -> Result<UploadReceipt, ApiError> {
        let bytes = tokio::fs::read(path)
            .await
            .map_err(|e| ApiError::File(format!("{}: {}", path.display(), e)))?;
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "document".to_string());

        info!("POST /upload_doc: {} ({} bytes)", file_name, bytes.len());
        let form = Form::new().part("file", Part::bytes(bytes).file_name(file_name));
        let response = self
            .client
            .post(self.endpoint("upload_doc"))
            .multipart(form)
            .send()
            .await
            .map_err(network)?;

        let (status, body) = read_body(response).await;
        if !status.is_success() {
            warn!("upload_doc error: {}", status);
            return Err(ApiError::Http {
                status: status.as_u16(),
                message: body.error_or("Upload failed."),
            });
        }

        Ok(UploadReceipt {
            message: body.message.filter(|m| !m.is_empty()),
        })
    }

    async fn list_memories(&self) -> Result<Vec<MemoryEntry>, ApiError> {
        let response = self
            .client
            .get(self.endpoint("memories"))
            .send()
            .await
            .map_err(network)?;

        let (status, body) = read_body(response).await;
        if !status.is_success() {
            return Err(ApiError::Http {
                status: status.as_u16(),
                message: body.error_or("Failed to load memories."),
            });
        }
        Ok(body.memory_list())
    }

    async fn save_memory(&self, text: &str) -> Result<Option<MemoryEntry>, ApiError> {
        let response = self
            .client
            .post(self.endpoint("memories"))
            .json(&SaveMemoryRequest { text })
            .send()
            .await
            .map_err(network)?;

        let (status, body) = read_body(response).await;
        if !status.is_success() {
            return Err(ApiError::Http {
                status: status.as_u16(),
                message: body.error_or("Failed to save memory."),
            });
        }
        Ok(body.memory)
    }

    async fn clear_memories(&self) -> Result<(), ApiError> {
        let response = self
            .client
            .delete(self.endpoint("memories"))
            .send()
            .await
            .map_err(network)?;

        let (status, body) = read_body(response).await;
        if !status.is_success() {
            return Err(ApiError::Http {
                status: status.as_u16(),
                message: body.error_or("Failed to clear memories."),
            });
        }
        Ok(())
    }
}
