//! # Core Application Logic
//!
//! This module contains Koko's business logic.
//! It knows nothing about any specific UI technology.
//!
//! ```text
//!                    ┌─────────────────────────┐
//!                    │         CORE            │
//!                    │  (this module)          │
//!                    │                         │
//!                    │  • State (app data)     │
//!                    │  • Action (events)      │
//!                    │  • update() (reducer)   │
//!                    │                         │
//!                    │  No I/O. No UI. Pure.   │
//!                    └───────────┬─────────────┘
//!                                │
//!                 ┌──────────────┴──────────────┐
//!                 ▼                             ▼
//!          ┌────────────┐                ┌────────────┐
//!          │    TUI     │  Effects  →    │    API     │
//!          │  Adapter   │  ← Actions     │  (reqwest) │
//!          │ (ratatui)  │                │            │
//!          └────────────┘                └────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`state`]: The `App` struct, all application state in one place
//! - [`action`]: The `Action` enum and the `update()` reducer
//! - [`conversation`]: Conversation registry, titles, pin/bookmark flags
//! - [`transcript`]: Per-conversation message lists
//! - [`memory`]: The memory panel cache
//! - [`config`]: `~/.koko/config.toml` loading and resolution

pub mod action;
pub mod config;
pub mod conversation;
pub mod memory;
pub mod state;
pub mod transcript;
