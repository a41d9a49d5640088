use ratatui::Frame;
use ratatui::layout::Rect;
use ratatui::style::{Color, Style};
use ratatui::text::{Line, Span};

use crate::tui::component::Component;

/// Suggestion chips bound to F1..F4.
pub const MAX_CHIPS: usize = 4;

/// One-line row of prompt chips: `F1 Summarize  F2 Key numbers ...`.
pub struct Suggestions<'a> {
    pub chips: &'a [String],
}

impl<'a> Suggestions<'a> {
    pub fn new(chips: &'a [String]) -> Self {
        Self { chips }
    }
}

impl<'a> Component for Suggestions<'a> {
    fn render(&mut self, frame: &mut Frame, area: Rect) {
        let key_style = Style::default().fg(Color::Black).bg(Color::Cyan);
        let chip_style = Style::default().fg(Color::Cyan);
        let spans: Vec<Span> = self
            .chips
            .iter()
            .take(MAX_CHIPS)
            .enumerate()
            .flat_map(|(i, chip)| {
                [
                    Span::styled(format!("F{}", i + 1), key_style),
                    Span::styled(format!(" {chip}  "), chip_style),
                ]
            })
            .collect();
        frame.render_widget(Line::from(spans), area);
    }
}
