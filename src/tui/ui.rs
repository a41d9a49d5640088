use crate::core::state::App;
use crate::tui::component::Component;
use crate::tui::components::memory_panel::MEMORY_PANEL_HEIGHT;
use crate::tui::components::input_box::INPUT_HEIGHT;
use crate::tui::components::{MemoryPanel, MessageList, Sidebar, Suggestions, TitleBar};
use crate::tui::{Focus, TuiState};

use ratatui::Frame;
use ratatui::layout::{Constraint, Layout, Rect};

pub const SIDEBAR_WIDTH: u16 = 32;

/// Whether the sidebar fits next to the main column.
pub fn sidebar_visible(width: u16, narrow_width: u16) -> bool {
    width >= narrow_width
}

pub fn draw_ui(frame: &mut Frame, app: &App, tui: &mut TuiState) {
    use Constraint::{Length, Min};

    let area = frame.area();
    let show_sidebar = sidebar_visible(area.width, tui.narrow_width);
    let main_area = if show_sidebar {
        let [sidebar_area, main_area] =
            Layout::horizontal([Length(SIDEBAR_WIDTH), Min(0)]).areas(area);
        draw_sidebar(frame, sidebar_area, app, tui);
        main_area
    } else {
        area
    };

    let [title_area, messages_area, memory_area, chips_area, input_area] = Layout::vertical([
        Length(1),
        Min(0),
        Length(MEMORY_PANEL_HEIGHT),
        Length(1),
        Length(INPUT_HEIGHT),
    ])
    .areas(main_area);

    let active = app.registry.active();
    TitleBar::new(
        active.title.clone(),
        app.active_is_typing(),
        app.is_uploading,
        app.status_message.clone(),
    )
    .render(frame, title_area);

    MessageList::new(
        &mut tui.message_list,
        active,
        app.active_is_typing(),
        tui.pulse_value,
    )
    .render(frame, messages_area);

    tui.note_input.focused = tui.focus == Focus::Memory;
    MemoryPanel::new(&app.memory, &mut tui.note_input).render(frame, memory_area);

    Suggestions::new(&app.suggestions).render(frame, chips_area);

    tui.chat_input.focused = tui.focus == Focus::Chat;
    tui.chat_input.render(frame, input_area);
}

fn draw_sidebar(frame: &mut Frame, area: Rect, app: &App, tui: &mut TuiState) {
    Sidebar::new(
        &mut tui.sidebar,
        app.registry.conversations(),
        app.registry.active_id(),
        tui.focus == Focus::Sidebar,
    )
    .render(frame, area);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::action::{Action, update};
    use crate::test_support::test_app;
    use ratatui::Terminal;
    use ratatui::backend::TestBackend;

    fn draw(app: &App, tui: &mut TuiState, width: u16, height: u16) -> String {
        let mut terminal = Terminal::new(TestBackend::new(width, height)).unwrap();
        terminal.draw(|f| draw_ui(f, app, tui)).unwrap();
        terminal
            .backend()
            .buffer()
            .content()
            .iter()
            .map(|c| c.symbol())
            .collect()
    }

    #[test]
    fn test_wide_layout_shows_every_region() {
        let app = test_app();
        let mut tui = TuiState::new(80);
        let text = draw(&app, &mut tui, 120, 40);
        assert!(text.contains("Koko AI"), "sidebar missing");
        assert!(text.contains("Koko | Welcome to Koko"));
        assert!(text.contains("How can I help you today?"));
        assert!(text.contains("Memories (0)"));
        assert!(text.contains("F1 Summarize"));
        assert!(text.contains("Message"));
    }

    #[test]
    fn test_narrow_layout_hides_sidebar() {
        let app = test_app();
        let mut tui = TuiState::new(80);
        let text = draw(&app, &mut tui, 70, 40);
        assert!(!text.contains("Koko AI"));
        assert!(text.contains("How can I help you today?"));
    }

    #[test]
    fn test_typing_flag_reaches_title_bar() {
        let mut app = test_app();
        update(&mut app, Action::SubmitMessage("Quarterly summary".into()));
        let mut tui = TuiState::new(80);
        let text = draw(&app, &mut tui, 120, 40);
        assert!(text.contains("Koko | Quarterly summary | Typing..."));
        assert!(text.contains("Quarterly summary"));
        assert!(!text.contains("How can I help you today?"));
    }

    #[test]
    fn test_sidebar_breakpoint() {
        assert!(sidebar_visible(80, 80));
        assert!(!sidebar_visible(79, 80));
    }
}
