//! # MemoryPanel Component
//!
//! Long-term memory strip between the transcript and the input: the most
//! recent entries, the in-flight status, and the note input.
//!
//! The note text itself lives in core (`MemoryPanel::note`); the parent
//! copies it into the `InputBox` each frame so a note cleared by the
//! reducer after a save also disappears from the screen.

use ratatui::Frame;
use ratatui::layout::{Constraint, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::Paragraph;

use crate::core::memory::MemoryPanel as MemoryState;
use crate::tui::component::Component;
use crate::tui::components::input_box::{INPUT_HEIGHT, InputBox};

/// Entries shown above the note input.
pub const VISIBLE_ENTRIES: u16 = 3;
/// Header + entries + note input.
pub const MEMORY_PANEL_HEIGHT: u16 = 1 + VISIBLE_ENTRIES + INPUT_HEIGHT;

pub struct MemoryPanel<'a> {
    pub memory: &'a MemoryState,
    pub note_input: &'a mut InputBox,
}

impl<'a> MemoryPanel<'a> {
    pub fn new(memory: &'a MemoryState, note_input: &'a mut InputBox) -> Self {
        Self { memory, note_input }
    }

    fn header(&self) -> Line<'static> {
        let mut spans = vec![Span::styled(
            format!("Memories ({})", self.memory.entries.len()),
            Style::default().fg(Color::Magenta).add_modifier(Modifier::BOLD),
        )];
        let status = self.memory.status_label();
        if !status.is_empty() {
            spans.push(Span::styled(
                format!("  {status}"),
                Style::default().fg(Color::Yellow),
            ));
        }
        spans.push(Span::styled(
            "  ^X clear all",
            Style::default().fg(Color::DarkGray),
        ));
        Line::from(spans)
    }

    fn entry_lines(&self) -> Vec<Line<'static>> {
        if self.memory.entries.is_empty() {
            return vec![Line::from(Span::styled(
                "No memories yet.",
                Style::default().fg(Color::DarkGray).add_modifier(Modifier::ITALIC),
            ))];
        }
        let skip = self
            .memory
            .entries
            .len()
            .saturating_sub(VISIBLE_ENTRIES as usize);
        self.memory
            .entries
            .iter()
            .skip(skip)
            .map(|entry| {
                let mut spans = vec![Span::raw(format!("• {}", entry.text))];
                if !entry.created_at.is_empty() {
                    spans.push(Span::styled(
                        format!("  {}", entry.created_at),
                        Style::default().fg(Color::DarkGray),
                    ));
                }
                Line::from(spans)
            })
            .collect()
    }
}

impl<'a> Component for MemoryPanel<'a> {
    fn render(&mut self, frame: &mut Frame, area: Rect) {
        let [header_area, entries_area, input_area] = Layout::vertical([
            Constraint::Length(1),
            Constraint::Length(VISIBLE_ENTRIES),
            Constraint::Length(INPUT_HEIGHT),
        ])
        .areas(area);

        frame.render_widget(Paragraph::new(self.header()), header_area);
        frame.render_widget(Paragraph::new(self.entry_lines()), entries_area);
        self.note_input.render(frame, input_area);
    }
}
