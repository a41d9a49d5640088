//! # Sidebar Component
//!
//! Conversation browser: search box, three groups (CHATS, PINNED,
//! BOOKMARKS) and the shortcuts that create, select, flag and clear
//! conversations.
//!
//! Follows the persistent state + transient wrapper pattern:
//! - `SidebarState` lives in `TuiState` (query, selection, clear confirmation)
//! - `Sidebar` is created each frame with borrowed state and the conversations
//!
//! Grouping is a pure function (`group_conversations`) so it can be tested
//! without a terminal. A conversation that is both pinned and bookmarked is
//! listed in both groups; CHATS only holds unflagged ones.

use ratatui::Frame;
use ratatui::layout::Rect;
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, BorderType, Padding, Paragraph};
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

use crate::core::conversation::Conversation;
use crate::tui::component::{Component, EventHandler};
use crate::tui::event::TuiEvent;

const EMPTY_CHATS: &str = "New chat";
const EMPTY_PINNED: &str = "No pinned chats";
const EMPTY_BOOKMARKS: &str = "No bookmarks";

/// Conversations filtered by the search query and split into groups,
/// each ordered most recently updated first.
#[derive(Debug, Default)]
pub struct SidebarGroups<'a> {
    pub chats: Vec<&'a Conversation>,
    pub pinned: Vec<&'a Conversation>,
    pub bookmarks: Vec<&'a Conversation>,
}

impl<'a> SidebarGroups<'a> {
    /// Ids in display order: CHATS, then PINNED, then BOOKMARKS.
    pub fn row_ids(&self) -> Vec<String> {
        self.chats
            .iter()
            .chain(&self.pinned)
            .chain(&self.bookmarks)
            .map(|c| c.id.clone())
            .collect()
    }
}

/// Case-insensitive title substring match; a blank query matches everything.
pub fn matches_query(conversation: &Conversation, query: &str) -> bool {
    let q = query.trim().to_lowercase();
    q.is_empty() || conversation.title.to_lowercase().contains(&q)
}

pub fn group_conversations<'a>(conversations: &'a [Conversation], query: &str) -> SidebarGroups<'a> {
    let mut groups = SidebarGroups::default();
    for conversation in conversations.iter().filter(|c| matches_query(c, query)) {
        if !conversation.pinned && !conversation.bookmarked {
            groups.chats.push(conversation);
        }
        if conversation.pinned {
            groups.pinned.push(conversation);
        }
        if conversation.bookmarked {
            groups.bookmarks.push(conversation);
        }
    }
    for group in [&mut groups.chats, &mut groups.pinned, &mut groups.bookmarks] {
        group.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
    }
    groups
}

/// Events emitted by the sidebar.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SidebarEvent {
    Select(String),
    NewChat,
    TogglePin(String),
    ToggleBookmark(String),
    ClearAll,
}

/// Persistent state for the sidebar.
#[derive(Debug, Default)]
pub struct SidebarState {
    pub query: String,
    /// Index into `rows`
    pub selected: usize,
    /// First Ctrl+D arms, second Ctrl+D clears
    pub confirm_clear: bool,
    /// Conversation ids in display order as of the last `sync`
    rows: Vec<String>,
}

impl SidebarState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Recompute the selectable rows from the current conversations.
    pub fn sync(&mut self, conversations: &[Conversation]) {
        self.rows = group_conversations(conversations, &self.query).row_ids();
        self.selected = self.selected.min(self.rows.len().saturating_sub(1));
    }

    pub fn selected_id(&self) -> Option<&str> {
        self.rows.get(self.selected).map(String::as_str)
    }

    fn set_query(&mut self, query: String) {
        self.query = query;
        self.selected = 0;
    }
}

impl EventHandler for SidebarState {
    type Event = SidebarEvent;

    fn handle_event(&mut self, event: &TuiEvent) -> Option<Self::Event> {
        if !matches!(event, TuiEvent::ClearChats) {
            self.confirm_clear = false;
        }

        match event {
            TuiEvent::InputChar(c) => {
                let mut query = std::mem::take(&mut self.query);
                query.push(*c);
                self.set_query(query);
                None
            }
            TuiEvent::Paste(text) => {
                let query = format!("{}{}", self.query, text.replace('\n', " "));
                self.set_query(query);
                None
            }
            TuiEvent::Backspace => {
                let mut query = std::mem::take(&mut self.query);
                query.pop();
                self.set_query(query);
                None
            }
            TuiEvent::Escape => {
                self.set_query(String::new());
                None
            }
            TuiEvent::CursorUp => {
                self.selected = self.selected.saturating_sub(1);
                None
            }
            TuiEvent::CursorDown => {
                if !self.rows.is_empty() {
                    self.selected = (self.selected + 1).min(self.rows.len() - 1);
                }
                None
            }
            TuiEvent::Submit => self.selected_id().map(|id| SidebarEvent::Select(id.to_string())),
            TuiEvent::NewChat => Some(SidebarEvent::NewChat),
            TuiEvent::TogglePin => self
                .selected_id()
                .map(|id| SidebarEvent::TogglePin(id.to_string())),
            TuiEvent::ToggleBookmark => self
                .selected_id()
                .map(|id| SidebarEvent::ToggleBookmark(id.to_string())),
            TuiEvent::ClearChats => {
                if self.confirm_clear {
                    self.confirm_clear = false;
                    Some(SidebarEvent::ClearAll)
                } else {
                    self.confirm_clear = true;
                    None
                }
            }
            _ => None,
        }
    }
}

/// Cut `text` to `max_width` columns, ending in `…` when shortened.
fn truncate_to_width(text: &str, max_width: usize) -> String {
    if text.width() <= max_width {
        return text.to_string();
    }
    let mut out = String::new();
    let mut used = 0;
    for c in text.chars() {
        let w = c.width().unwrap_or(0);
        if used + w + 1 > max_width {
            break;
        }
        out.push(c);
        used += w;
    }
    out.push('…');
    out
}

/// Transient render wrapper for the sidebar.
pub struct Sidebar<'a> {
    pub state: &'a mut SidebarState,
    pub conversations: &'a [Conversation],
    pub active_id: &'a str,
    pub focused: bool,
}

impl<'a> Sidebar<'a> {
    pub fn new(
        state: &'a mut SidebarState,
        conversations: &'a [Conversation],
        active_id: &'a str,
        focused: bool,
    ) -> Self {
        Self {
            state,
            conversations,
            active_id,
            focused,
        }
    }

    fn group_lines(
        &self,
        lines: &mut Vec<Line<'static>>,
        label: &'static str,
        empty_label: &'static str,
        members: &[&Conversation],
        first_row: usize,
        width: usize,
    ) -> Option<usize> {
        let mut selected_line = None;
        lines.push(Line::default());
        lines.push(Line::from(Span::styled(
            label,
            Style::default().fg(Color::DarkGray).add_modifier(Modifier::BOLD),
        )));
        if members.is_empty() {
            lines.push(Line::from(Span::styled(
                format!("  {empty_label}"),
                Style::default().fg(Color::DarkGray).add_modifier(Modifier::ITALIC),
            )));
            return None;
        }
        for (offset, conversation) in members.iter().enumerate() {
            let marker = if conversation.id == self.active_id { "▸ " } else { "  " };
            let title = truncate_to_width(&conversation.title, width.saturating_sub(2));
            let mut style = if conversation.id == self.active_id {
                Style::default().fg(Color::Cyan)
            } else {
                Style::default().fg(Color::Gray)
            };
            if self.focused && first_row + offset == self.state.selected {
                style = style.add_modifier(Modifier::REVERSED | Modifier::BOLD);
                selected_line = Some(lines.len());
            }
            lines.push(Line::from(vec![
                Span::styled(marker, style),
                Span::styled(title, style),
            ]));
        }
        selected_line
    }
}

impl<'a> Component for Sidebar<'a> {
    fn render(&mut self, frame: &mut Frame, area: Rect) {
        self.state.sync(self.conversations);

        let help = if self.state.confirm_clear {
            " ^D again to clear all "
        } else {
            " ^N New ^P Pin ^B Mark ^D Clear "
        };
        let border_style = if self.focused {
            Style::default().fg(Color::Cyan)
        } else {
            Style::default().fg(Color::DarkGray)
        };
        let block = Block::bordered()
            .border_type(BorderType::Rounded)
            .border_style(border_style)
            .title(" Koko AI ")
            .title_bottom(Line::from(help).centered())
            .padding(Padding::horizontal(1));
        let inner = block.inner(area);
        let width = inner.width as usize;

        let search = if self.state.query.is_empty() {
            Line::from(Span::styled(
                "Search chats... (Esc: All)",
                Style::default().fg(Color::DarkGray).add_modifier(Modifier::ITALIC),
            ))
        } else {
            Line::from(vec![
                Span::styled("Search: ", Style::default().fg(Color::DarkGray)),
                Span::raw(truncate_to_width(&self.state.query, width.saturating_sub(8))),
            ])
        };
        let mut lines = vec![search];

        let groups = group_conversations(self.conversations, &self.state.query);
        let mut first_row = 0;
        let mut selected_line = None;
        for (label, empty, members) in [
            ("CHATS", EMPTY_CHATS, &groups.chats),
            ("PINNED", EMPTY_PINNED, &groups.pinned),
            ("BOOKMARKS", EMPTY_BOOKMARKS, &groups.bookmarks),
        ] {
            if let Some(line) = self.group_lines(&mut lines, label, empty, members, first_row, width) {
                selected_line = Some(line);
            }
            first_row += members.len();
        }

        // Keep the highlighted row on screen
        let scroll = selected_line
            .map(|line| (line as u16 + 1).saturating_sub(inner.height))
            .unwrap_or(0);

        frame.render_widget(Paragraph::new(lines).scroll((scroll, 0)).block(block), area);
    }
}
