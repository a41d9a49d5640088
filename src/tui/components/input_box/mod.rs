//! # InputBox Component
//!
//! Single-line text field used for both the chat input and the memory note.
//!
//! ## Responsibilities
//!
//! - Capture text input (typed characters and bracketed paste)
//! - Handle editing (backspace, delete, cursor movement)
//! - Emit `Submit` on Enter
//! - Scroll horizontally so the cursor stays visible
//!
//! The buffer and cursor are internal state; `title`, `placeholder` and
//! `focused` are props set by the parent each frame.

use ratatui::Frame;
use ratatui::layout::Rect;
use ratatui::style::{Color, Modifier, Style};
use ratatui::widgets::{Block, BorderType, Paragraph};
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

use crate::tui::component::{Component, EventHandler};
use crate::tui::event::TuiEvent;

/// Border (2) + padding (2) consumed horizontally.
const HORIZONTAL_OVERHEAD: u16 = 4;
pub const INPUT_HEIGHT: u16 = 3;

/// High-level events emitted by the InputBox
#[derive(Debug, Clone, PartialEq)]
pub enum InputEvent {
    /// Enter pressed; carries the buffer, which is cleared
    Submit(String),
    ContentChanged,
}

pub struct InputBox {
    buffer: String,
    /// Cursor position as byte offset in buffer (0..=buffer.len())
    cursor: usize,
    pub title: String,
    pub placeholder: String,
    pub focused: bool,
}

fn prev_char_boundary(text: &str, pos: usize) -> usize {
    text[..pos]
        .char_indices()
        .next_back()
        .map(|(i, _)| i)
        .unwrap_or(0)
}

fn next_char_boundary(text: &str, pos: usize) -> usize {
    text[pos..]
        .chars()
        .next()
        .map(|c| pos + c.len_utf8())
        .unwrap_or(text.len())
}

impl InputBox {
    pub fn new(title: impl Into<String>, placeholder: impl Into<String>) -> Self {
        Self {
            buffer: String::new(),
            cursor: 0,
            title: title.into(),
            placeholder: placeholder.into(),
            focused: false,
        }
    }

    pub fn text(&self) -> &str {
        &self.buffer
    }

    /// Replaces the buffer and moves the cursor to its end.
    pub fn set_text(&mut self, text: &str) {
        self.buffer = text.replace('\n', " ");
        self.cursor = self.buffer.len();
    }

    pub fn clear(&mut self) {
        self.buffer.clear();
        self.cursor = 0;
    }

    fn insert_str(&mut self, text: &str) {
        // Single-line field: pasted newlines become spaces
        let flat = text.replace(['\n', '\r'], " ");
        self.buffer.insert_str(self.cursor, &flat);
        self.cursor += flat.len();
    }

    /// Columns skipped on the left so the cursor fits in `inner_width`.
    fn scroll_columns(&self, inner_width: usize) -> usize {
        let before = self.buffer[..self.cursor].width();
        if inner_width == 0 {
            return before;
        }
        (before + 1).saturating_sub(inner_width)
    }

    /// Visible slice of the buffer after skipping `skip` columns.
    fn visible_from(&self, skip: usize) -> &str {
        let mut skipped = 0;
        for (i, c) in self.buffer.char_indices() {
            if skipped >= skip {
                return &self.buffer[i..];
            }
            skipped += c.width().unwrap_or(0);
        }
        ""
    }
}

impl Component for InputBox {
    fn render(&mut self, frame: &mut Frame, area: Rect) {
        let inner_width = area.width.saturating_sub(HORIZONTAL_OVERHEAD) as usize;

        let border_style = if self.focused {
            Style::default().fg(Color::Cyan)
        } else {
            Style::default().fg(Color::DarkGray)
        };
        let block = Block::bordered()
            .border_type(BorderType::Rounded)
            .border_style(border_style)
            .title(self.title.as_str())
            .padding(ratatui::widgets::Padding::horizontal(1));

        let skip = self.scroll_columns(inner_width);
        let paragraph = if self.buffer.is_empty() {
            Paragraph::new(self.placeholder.as_str())
                .style(Style::default().fg(Color::DarkGray).add_modifier(Modifier::ITALIC))
        } else {
            Paragraph::new(self.visible_from(skip)).style(Style::default().fg(Color::Green))
        };
        frame.render_widget(paragraph.block(block), area);

        if self.focused {
            let column = self.buffer[..self.cursor].width().saturating_sub(skip) as u16;
            frame.set_cursor_position((area.x + 2 + column, area.y + 1));
        }
    }
}

impl EventHandler for InputBox {
    type Event = InputEvent;

    fn handle_event(&mut self, event: &TuiEvent) -> Option<Self::Event> {
        match event {
            TuiEvent::InputChar(c) => {
                let mut tmp = [0u8; 4];
                self.insert_str(c.encode_utf8(&mut tmp));
                Some(InputEvent::ContentChanged)
            }
            TuiEvent::Paste(text) => {
                self.insert_str(text);
                Some(InputEvent::ContentChanged)
            }
            TuiEvent::Backspace if self.cursor > 0 => {
                let prev = prev_char_boundary(&self.buffer, self.cursor);
                self.buffer.drain(prev..self.cursor);
                self.cursor = prev;
                Some(InputEvent::ContentChanged)
            }
            TuiEvent::Delete if self.cursor < self.buffer.len() => {
                let next = next_char_boundary(&self.buffer, self.cursor);
                self.buffer.drain(self.cursor..next);
                Some(InputEvent::ContentChanged)
            }
            TuiEvent::CursorLeft => {
                self.cursor = prev_char_boundary(&self.buffer, self.cursor);
                None
            }
            TuiEvent::CursorRight => {
                self.cursor = next_char_boundary(&self.buffer, self.cursor);
                None
            }
            TuiEvent::CursorHome => {
                self.cursor = 0;
                None
            }
            TuiEvent::CursorEnd => {
                self.cursor = self.buffer.len();
                None
            }
            TuiEvent::Submit => {
                let text = std::mem::take(&mut self.buffer);
                self.cursor = 0;
                Some(InputEvent::Submit(text))
            }
            _ => None,
        }
    }
}
