//! # Backend API
//!
//! Everything that crosses the wire to the Koko server lives here:
//!
//! - [`backend`]: the `KokoBackend` trait and `ApiError`
//! - [`client`]: `HttpBackend`, the reqwest implementation
//! - [`sse`]: the incremental `/chat_stream` decoder
//! - [`types`]: wire types shared with `core`

pub mod backend;
pub mod client;
pub mod sse;
pub mod types;

pub use backend::{ApiError, EventStream, KokoBackend};
pub use client::HttpBackend;
pub use sse::{StreamDecoder, decode_stream};
pub use types::{MemoryEntry, StreamEvent, UploadReceipt};
