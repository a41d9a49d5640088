//! # TUI Components
//!
//! All UI components for the terminal interface.
//!
//! ## Component Architecture
//!
//! ### Stateless Components (Props-Based Rendering)
//!
//! Display components that receive all data as props:
//! - `TitleBar`: app name, conversation title, typing/uploading flags, status
//! - `Message`: one transcript message as a bordered bubble
//! - `Suggestions`: F1..F4 prompt chips
//!
//! ### Stateful Components (Event-Driven)
//!
//! Components that keep local state and emit events:
//! - `InputBox`: single-line text field (chat input and memory note)
//! - `MessageList`: scrollable transcript with layout caching
//! - `Sidebar`: conversation search, groups and shortcuts
//! - `MemoryPanel`: memory entries plus the note `InputBox`
//!
//! Stateful components follow the persistent state + transient wrapper
//! pattern: the `*State` struct lives in `TuiState`, and the wrapper is
//! rebuilt each frame borrowing that state and the core data it shows.
//!
//! ```text
//! components/
//! ├── mod.rs
//! ├── title_bar.rs
//! ├── message.rs
//! ├── message_list.rs
//! ├── sidebar.rs
//! ├── memory_panel.rs
//! ├── suggestions.rs
//! └── input_box/
//! ```

mod title_bar;
pub use title_bar::TitleBar;

pub mod input_box;
pub mod memory_panel;
pub mod message;
pub mod message_list;
pub mod sidebar;
pub mod suggestions;

pub use input_box::{InputBox, InputEvent};
pub use memory_panel::MemoryPanel;
pub use message_list::{MessageList, MessageListState};
pub use sidebar::{Sidebar, SidebarEvent, SidebarState};
pub use suggestions::Suggestions;
