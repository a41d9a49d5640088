use ratatui::Frame;
use ratatui::layout::Rect;
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::Text;
use ratatui::widgets::{Block, BorderType, Padding, Paragraph, Widget, Wrap};

use crate::core::transcript::{Message as TranscriptMessage, Sender};
use crate::tui::component::Component;
use crate::tui::markdown;

/// Horizontal padding (per side) between the border and text content.
const CONTENT_PAD_H: u16 = 1;
/// Total horizontal space consumed by borders (1 left + 1 right) and padding.
const HORIZONTAL_OVERHEAD: u16 = 2 + CONTENT_PAD_H * 2;
/// Total vertical space consumed by borders (1 top + 1 bottom).
const VERTICAL_OVERHEAD: u16 = 2;

/// Shown inside an assistant bubble before the first delta lands.
const PENDING_PLACEHOLDER: &str = "…";

/// A stateless component that renders one transcript message as a bordered bubble.
///
/// `Message` is a **transient component**: it's created fresh each frame with
/// the data it needs. User text is shown verbatim; assistant text goes through
/// the markdown renderer.
#[derive(Clone, Copy)]
pub struct Message<'a> {
    pub message: &'a TranscriptMessage,
    /// Current pulse intensity (0.0 to 1.0) while the reply is streaming
    pub pulse_intensity: f32,
}

impl<'a> Message<'a> {
    pub fn new(message: &'a TranscriptMessage, pulse_intensity: f32) -> Self {
        Self {
            message,
            pulse_intensity,
        }
    }

    fn base_style(sender: Sender) -> Style {
        match sender {
            Sender::User => Style::default().fg(Color::Green),
            Sender::Assistant => Style::default().fg(Color::Blue),
        }
    }

    fn body(message: &TranscriptMessage) -> Text<'static> {
        let content = message.text.trim();
        match message.sender {
            Sender::User => Text::styled(content.to_string(), Self::base_style(Sender::User)),
            Sender::Assistant if content.is_empty() && message.pending => Text::styled(
                PENDING_PLACEHOLDER,
                Self::base_style(Sender::Assistant).add_modifier(Modifier::DIM),
            ),
            Sender::Assistant => markdown::render(content, Color::Blue),
        }
    }

    /// Predicts the rendered height for `width` without rendering.
    ///
    /// User text is measured with `textwrap` using options that match
    /// `Paragraph`'s wrapping; assistant markdown is measured on the rendered
    /// lines, since re-spacing and list markers change the line count.
    pub fn calculate_height(message: &TranscriptMessage, width: u16) -> u16 {
        let content_width = width.saturating_sub(HORIZONTAL_OVERHEAD);
        if content_width == 0 {
            // Too narrow for borders + padding; still occupy a row
            return 1;
        }

        let content = message.text.trim();
        let lines = match message.sender {
            Sender::User => {
                if content.is_empty() {
                    return VERTICAL_OVERHEAD;
                }
                let options = textwrap::Options::new(content_width as usize)
                    .break_words(true)
                    .word_separator(textwrap::WordSeparator::AsciiSpace);
                textwrap::wrap(content, options).len()
            }
            Sender::Assistant => Paragraph::new(Self::body(message))
                .wrap(Wrap { trim: false })
                .line_count(content_width),
        };
        (lines as u16).max(1) + VERTICAL_OVERHEAD
    }
}

impl<'a> Widget for Message<'a> {
    fn render(self, area: Rect, buf: &mut ratatui::buffer::Buffer) {
        let role = match self.message.sender {
            Sender::User => "you",
            Sender::Assistant => "koko",
        };
        let style = Self::base_style(self.message.sender);

        // Breathing border while streaming: DIM → normal → BOLD
        let mut border_style = style.add_modifier(Modifier::DIM);
        if self.pulse_intensity > 0.6 {
            border_style = border_style
                .remove_modifier(Modifier::DIM)
                .add_modifier(Modifier::BOLD);
        } else if self.pulse_intensity > 0.2 {
            border_style = border_style.remove_modifier(Modifier::DIM);
        }

        let block = Block::bordered()
            .title(format!("{role} · {}", self.message.timestamp))
            .border_type(BorderType::Rounded)
            .border_style(border_style)
            .title_style(border_style)
            .padding(Padding::horizontal(CONTENT_PAD_H));

        let inner_area = block.inner(area);
        block.render(area, buf);

        Paragraph::new(Self::body(self.message))
            .wrap(Wrap { trim: false })
            .render(inner_area, buf);
    }
}

impl<'a> Component for Message<'a> {
    fn render(&mut self, frame: &mut Frame, area: Rect) {
        frame.render_widget(*self, area);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ratatui::Terminal;
    use ratatui::backend::TestBackend;

    fn user(text: &str) -> TranscriptMessage {
        TranscriptMessage::user(text)
    }

    fn reply(text: &str, pending: bool) -> TranscriptMessage {
        let mut msg = TranscriptMessage::assistant_placeholder();
        msg.text = text.to_string();
        msg.pending = pending;
        msg
    }

    #[test]
    fn calculate_height_empty_user_content_returns_border_height() {
        assert_eq!(Message::calculate_height(&user("   \n"), 80), VERTICAL_OVERHEAD);
    }

    #[test]
    fn calculate_height_zero_width_returns_minimum() {
        assert_eq!(Message::calculate_height(&user("Hello world"), 0), 1);
        assert_eq!(
            Message::calculate_height(&user("Hello world"), HORIZONTAL_OVERHEAD),
            1
        );
    }

    #[test]
    fn calculate_height_wraps_user_text() {
        // content_width = 9 - 4 = 5 → "Hello" | "world"
        assert_eq!(
            Message::calculate_height(&user("Hello world"), 9),
            2 + VERTICAL_OVERHEAD
        );
        // Long words break: "abcd" | "efgh" | "ij"
        assert_eq!(
            Message::calculate_height(&user("abcdefghij"), 8),
            3 + VERTICAL_OVERHEAD
        );
    }

    #[test]
    fn calculate_height_pending_reply_has_placeholder_line() {
        assert_eq!(
            Message::calculate_height(&reply("", true), 80),
            1 + VERTICAL_OVERHEAD
        );
    }

    #[test]
    fn calculate_height_counts_markdown_blocks() {
        // "Intro" | blank | rule | blank | "Outro"
        assert_eq!(
            Message::calculate_height(&reply("Intro---Outro", false), 80),
            5 + VERTICAL_OVERHEAD
        );
    }

    #[test]
    fn render_shows_role_and_text() {
        let backend = TestBackend::new(40, 3);
        let mut terminal = Terminal::new(backend).unwrap();
        let msg = user("Hi Koko");
        terminal
            .draw(|f| {
                let area = f.area();
                f.render_widget(Message::new(&msg, 0.0), area);
            })
            .unwrap();
        let text: String = terminal
            .backend()
            .buffer()
            .content()
            .iter()
            .map(|c| c.symbol())
            .collect();
        assert!(text.contains("you"));
        assert!(text.contains("Hi Koko"));
    }
}
