//! # TitleBar Component
//!
//! Top status bar: app name, active conversation title, activity flags and
//! the latest status message.
//!
//! TitleBar is purely presentational. It receives all data as props and has
//! no internal state:
//!
//! ```rust,ignore
//! let mut title_bar = TitleBar {
//!     title: app.registry.active().title.clone(),
//!     is_typing: app.active_is_typing(),
//!     is_uploading: app.is_uploading,
//!     status_message: app.status_message.clone(),
//! };
//! title_bar.render(frame, area);
//! ```
//!
//! Segments are joined with `" | "` in priority order, so the conversation
//! title stays visible on narrow terminals and the status is cut first:
//!
//! `"Koko | Quarterly numbers | Typing... | Uploading... | Welcome to Koko!"`

use crate::tui::component::Component;
use ratatui::Frame;
use ratatui::layout::Rect;
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};

const APP_NAME: &str = "Koko";
const SEPARATOR: &str = " | ";

pub struct TitleBar {
    /// Title of the active conversation
    pub title: String,
    /// A reply is streaming into the active conversation
    pub is_typing: bool,
    pub is_uploading: bool,
    pub status_message: String,
}

impl TitleBar {
    pub fn new(title: String, is_typing: bool, is_uploading: bool, status_message: String) -> Self {
        Self {
            title,
            is_typing,
            is_uploading,
            status_message,
        }
    }

    fn segments(&self) -> Vec<Span<'_>> {
        let mut spans = vec![Span::styled(
            APP_NAME,
            Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
        )];
        let mut push = |text: &str, style: Style| {
            spans.push(Span::raw(SEPARATOR));
            spans.push(Span::styled(text.to_string(), style));
        };

        push(&self.title, Style::default());
        if self.is_typing {
            push("Typing...", Style::default().fg(Color::Yellow));
        }
        if self.is_uploading {
            push("Uploading...", Style::default().fg(Color::Yellow));
        }
        if !self.status_message.is_empty() {
            push(&self.status_message, Style::default().fg(Color::DarkGray));
        }
        spans
    }
}

impl Component for TitleBar {
    fn render(&mut self, frame: &mut Frame, area: Rect) {
        frame.render_widget(Line::from(self.segments()), area);
    }
}
