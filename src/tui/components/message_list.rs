//! # MessageList Component
//!
//! Scrollable view of the active conversation's transcript.
//!
//! ## Responsibilities
//!
//! - Display the transcript as message bubbles
//! - Manage scrolling (sticky bottom while replies stream in)
//! - Cache per-message heights so only changed bubbles are re-measured
//! - Show the empty-state greeting when the conversation has no messages
//!
//! ## Architecture
//!
//! `MessageList` is a transient component (created each frame) that wraps
//! `&'a mut MessageListState` (persistent state) and the active `Conversation`
//! (props). `render` mutates the layout cache and scroll state in place,
//! in the spirit of ratatui's `StatefulWidget`.

use ratatui::Frame;
use ratatui::layout::{Alignment, Position, Rect, Size};
use ratatui::style::{Color, Modifier, Style};
use ratatui::widgets::Paragraph;
use tui_scrollview::{ScrollView, ScrollViewState, ScrollbarVisibility};

use crate::core::conversation::Conversation;
use crate::core::transcript::Message as TranscriptMessage;
use crate::tui::component::{Component, EventHandler};
use crate::tui::components::message::Message;
use crate::tui::event::TuiEvent;

pub const EMPTY_STATE_TEXT: &str = "How can I help you today?";

/// Layout and scroll state for the message list.
/// Must be persisted in the parent TuiState.
pub struct MessageListState {
    pub scroll_state: ScrollViewState,
    pub layout: LayoutCache,
    /// When true, auto-scroll to bottom on new content
    pub stick_to_bottom: bool,
    /// Last known viewport height (for scroll clamping between frames)
    pub viewport_height: u16,
}

impl Default for MessageListState {
    fn default() -> Self {
        Self::new()
    }
}

impl MessageListState {
    pub fn new() -> Self {
        Self {
            scroll_state: ScrollViewState::default(),
            layout: LayoutCache::new(),
            stick_to_bottom: true,
            viewport_height: 0,
        }
    }

    fn max_offset(&self) -> u16 {
        let total: u16 = self.layout.heights.iter().sum();
        total.saturating_sub(self.viewport_height)
    }

    /// Clamp scroll offset so it never exceeds the content bounds.
    pub fn clamp_scroll(&mut self) {
        let max_y = self.max_offset();
        let current = self.scroll_state.offset();
        if current.y > max_y {
            self.scroll_state.set_offset(Position {
                x: current.x,
                y: max_y,
            });
        }
    }

    /// Re-engage auto-scroll once the user scrolls back to the bottom.
    pub fn repin_if_at_bottom(&mut self) {
        let max_y = self.max_offset();
        let current = self.scroll_state.offset();
        if current.y >= max_y {
            self.stick_to_bottom = true;
            self.scroll_state.set_offset(Position {
                x: current.x,
                y: max_y,
            });
        }
    }

    /// Jump back to the newest message, e.g. after switching conversations.
    pub fn reset(&mut self) {
        self.stick_to_bottom = true;
        self.scroll_state.scroll_to_bottom();
    }
}

/// Scrollable transcript view.
/// Created fresh each frame with references to state and data.
pub struct MessageList<'a> {
    pub state: &'a mut MessageListState,
    pub conversation: &'a Conversation,
    pub is_typing: bool,
    pub pulse_value: f32,
}

impl<'a> MessageList<'a> {
    pub fn new(
        state: &'a mut MessageListState,
        conversation: &'a Conversation,
        is_typing: bool,
        pulse_value: f32,
    ) -> Self {
        Self {
            state,
            conversation,
            is_typing,
            pulse_value,
        }
    }

    fn render_empty(frame: &mut Frame, area: Rect) {
        let y = area.y + area.height / 2;
        let line_area = Rect::new(area.x, y.min(area.bottom().saturating_sub(1)), area.width, 1);
        let greeting = Paragraph::new(EMPTY_STATE_TEXT)
            .alignment(Alignment::Center)
            .style(Style::default().fg(Color::DarkGray).add_modifier(Modifier::ITALIC));
        frame.render_widget(greeting, line_area);
    }
}

impl<'a> Component for MessageList<'a> {
    fn render(&mut self, frame: &mut Frame, area: Rect) {
        let conversation = self.conversation;
        let messages = conversation.transcript.messages();
        if messages.is_empty() {
            self.state.layout.invalidate();
            Self::render_empty(frame, area);
            return;
        }

        let content_width = area.width.saturating_sub(1); // -1 for scrollbar
        let layout = &mut self.state.layout;
        let reusable = layout.reusable_count(&conversation.id, messages, content_width);
        layout.heights.truncate(reusable.min(layout.heights.len()));
        for message in messages.iter().skip(layout.heights.len()) {
            layout.heights.push(Message::calculate_height(message, content_width));
        }
        layout.rebuild_prefix_heights();
        layout.update_metadata(&conversation.id, messages, content_width);

        let total_height: u16 = self.state.layout.heights.iter().sum();

        self.state.viewport_height = area.height;
        if !self.state.stick_to_bottom {
            self.state.clamp_scroll();
        }

        let scroll_offset = self.state.scroll_state.offset().y;
        let visible_range = self.state.layout.visible_range(scroll_offset, area.height);

        let mut scroll_view = ScrollView::new(Size::new(content_width, total_height))
            .vertical_scrollbar_visibility(ScrollbarVisibility::Always)
            .horizontal_scrollbar_visibility(ScrollbarVisibility::Never);

        let mut y_offset: u16 = if visible_range.start > 0 {
            self.state.layout.prefix_heights[visible_range.start - 1]
        } else {
            0
        };

        for i in visible_range {
            let message = &messages[i];
            let height = self.state.layout.heights[i];
            let pulse = if message.pending && self.is_typing {
                self.pulse_value
            } else {
                0.0
            };
            let rect = Rect::new(0, y_offset, content_width, height);
            scroll_view.render_widget(Message::new(message, pulse), rect);
            y_offset += height;
        }

        if self.state.stick_to_bottom {
            self.state.scroll_state.scroll_to_bottom();
        }

        frame.render_stateful_widget(scroll_view, area, &mut self.state.scroll_state);
    }
}

/// Implemented on the persistent state: `MessageList` is rebuilt every frame
/// and cannot hold the scroll position itself.
impl EventHandler for MessageListState {
    type Event = ();

    fn handle_event(&mut self, event: &TuiEvent) -> Option<Self::Event> {
        match event {
            TuiEvent::ScrollUp => {
                self.scroll_state.scroll_up();
                self.stick_to_bottom = false;
            }
            TuiEvent::ScrollDown => {
                self.scroll_state.scroll_down();
                self.repin_if_at_bottom();
            }
            TuiEvent::ScrollPageUp => {
                self.scroll_state.scroll_page_up();
                self.stick_to_bottom = false;
            }
            TuiEvent::ScrollPageDown => {
                self.scroll_state.scroll_page_down();
                self.repin_if_at_bottom();
            }
            _ => {}
        }
        None
    }
}

/// Cached layout measurements for one conversation at one width.
pub struct LayoutCache {
    pub heights: Vec<u16>,
    pub prefix_heights: Vec<u16>,
    conversation_id: String,
    message_count: usize,
    content_width: u16,
}

impl Default for LayoutCache {
    fn default() -> Self {
        Self::new()
    }
}

impl LayoutCache {
    pub fn new() -> Self {
        Self {
            heights: Vec::new(),
            prefix_heights: Vec::new(),
            conversation_id: String::new(),
            message_count: 0,
            content_width: 0,
        }
    }

    pub fn invalidate(&mut self) {
        self.heights.clear();
        self.prefix_heights.clear();
        self.message_count = 0;
    }

    /// Number of leading cached heights still valid for `messages`.
    ///
    /// Finished messages never change, so only a pending reply (whose text
    /// grows with every delta) and anything after it needs re-measuring. A
    /// reply that finished between frames is still re-measured once, since
    /// its last cached height came from a partial stream.
    pub fn reusable_count(
        &self,
        conversation_id: &str,
        messages: &[TranscriptMessage],
        content_width: u16,
    ) -> usize {
        if self.content_width != content_width
            || self.conversation_id != conversation_id
            || self.heights.is_empty()
            || messages.len() < self.message_count
        {
            return 0;
        }

        let cached = self.message_count.min(self.heights.len());
        let first_pending = messages[..cached]
            .iter()
            .position(|m| m.pending)
            .unwrap_or(cached);
        // Last cached message may have been pending when measured
        first_pending.min(cached.saturating_sub(1))
    }

    pub fn update_metadata(
        &mut self,
        conversation_id: &str,
        messages: &[TranscriptMessage],
        content_width: u16,
    ) {
        if self.conversation_id != conversation_id {
            self.conversation_id = conversation_id.to_string();
        }
        self.message_count = messages.len();
        self.content_width = content_width;
    }

    pub fn rebuild_prefix_heights(&mut self) {
        self.prefix_heights = self
            .heights
            .iter()
            .scan(0u16, |acc, &h| {
                *acc += h;
                Some(*acc)
            })
            .collect();
    }

    pub fn visible_range(&self, scroll_offset: u16, viewport_height: u16) -> std::ops::Range<usize> {
        let buffer = viewport_height / 2;
        let buffered_start = scroll_offset.saturating_sub(buffer);
        let buffered_end = scroll_offset
            .saturating_add(viewport_height)
            .saturating_add(buffer);

        let start = self
            .prefix_heights
            .partition_point(|&end| end <= buffered_start);
        let end = self
            .prefix_heights
            .partition_point(|&end| end < buffered_end)
            .saturating_add(1)
            .min(self.prefix_heights.len());

        start..end
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::conversation::ConversationRegistry;
    use ratatui::Terminal;
    use ratatui::backend::TestBackend;

    fn finished(text: &str) -> TranscriptMessage {
        let mut msg = TranscriptMessage::assistant_placeholder();
        msg.text = text.to_string();
        msg.pending = false;
        msg
    }

    fn measure(cache: &mut LayoutCache, id: &str, messages: &[TranscriptMessage], width: u16) {
        let reusable = cache.reusable_count(id, messages, width);
        cache.heights.truncate(reusable);
        for m in messages.iter().skip(cache.heights.len()) {
            cache.heights.push(Message::calculate_height(m, width));
        }
        cache.rebuild_prefix_heights();
        cache.update_metadata(id, messages, width);
    }

    fn screen(terminal: &Terminal<TestBackend>) -> String {
        terminal
            .backend()
            .buffer()
            .content()
            .iter()
            .map(|c| c.symbol())
            .collect()
    }

    #[test]
    fn test_layout_cache_reusable() {
        let messages = vec![
            TranscriptMessage::user("a"),
            finished("b"),
            TranscriptMessage::user("c"),
        ];
        let mut cache = LayoutCache::new();
        assert_eq!(cache.reusable_count("c1", &messages, 80), 0);

        measure(&mut cache, "c1", &messages, 80);
        // Same transcript: everything but the last cached entry
        assert_eq!(cache.reusable_count("c1", &messages, 80), 2);

        // Width change or another conversation invalidates everything
        assert_eq!(cache.reusable_count("c1", &messages, 40), 0);
        assert_eq!(cache.reusable_count("c2", &messages, 80), 0);

        // Fewer messages (conversation cleared) invalidates everything
        assert_eq!(cache.reusable_count("c1", &messages[..1], 80), 0);
    }

    #[test]
    fn test_pending_reply_is_remeasured() {
        let width = 30;
        let mut messages = vec![
            TranscriptMessage::user("hi"),
            TranscriptMessage::assistant_placeholder(),
            TranscriptMessage::user("later"),
        ];
        let mut cache = LayoutCache::new();
        measure(&mut cache, "c1", &messages, width);
        let stale = cache.heights[1];

        assert_eq!(cache.reusable_count("c1", &messages, width), 1);

        messages[1].text =
            "this response is long enough to wrap across multiple lines at width 30".into();
        measure(&mut cache, "c1", &messages, width);
        assert!(cache.heights[1] > stale);
        assert_eq!(
            cache.heights[0],
            Message::calculate_height(&messages[0], width)
        );
    }

    #[test]
    fn test_visible_range() {
        let mut cache = LayoutCache::new();
        cache.heights = vec![10; 10];
        cache.rebuild_prefix_heights();

        // Viewport 20 at offset 0 with a 10-row buffer below → items 0..3
        assert_eq!(cache.visible_range(0, 20), 0..3);
        // Offset 50: buffered window 40..80
        assert_eq!(cache.visible_range(50, 20), 4..8);
        assert_eq!(cache.visible_range(95, 20), 8..10);
    }

    #[test]
    fn test_scroll_up_unpins_and_scroll_down_repins() {
        let mut state = MessageListState::new();
        state.layout.heights = vec![10, 10];
        state.viewport_height = 30;
        state.handle_event(&TuiEvent::ScrollUp);
        assert!(!state.stick_to_bottom);
        // Content shorter than viewport: bottom is offset 0
        state.handle_event(&TuiEvent::ScrollDown);
        assert!(state.stick_to_bottom);
    }

    #[test]
    fn test_empty_conversation_shows_greeting() {
        let registry = ConversationRegistry::new();
        let mut state = MessageListState::new();
        let mut terminal = Terminal::new(TestBackend::new(50, 6)).unwrap();
        terminal
            .draw(|f| {
                MessageList::new(&mut state, registry.active(), false, 0.0).render(f, f.area())
            })
            .unwrap();
        assert!(screen(&terminal).contains(EMPTY_STATE_TEXT));
    }

    #[test]
    fn test_renders_messages() {
        let mut registry = ConversationRegistry::new();
        let id = registry.active_id().to_string();
        registry.append_message(&id, TranscriptMessage::user("What is Koko?"));
        registry.append_message(&id, finished("A chat client."));

        let mut state = MessageListState::new();
        let mut terminal = Terminal::new(TestBackend::new(50, 12)).unwrap();
        terminal
            .draw(|f| {
                MessageList::new(&mut state, registry.active(), false, 0.0).render(f, f.area())
            })
            .unwrap();
        let text = screen(&terminal);
        assert!(text.contains("What is Koko?"));
        assert!(text.contains("A chat client."));
        assert_eq!(state.layout.heights.len(), 2);
    }
}
