//! # TUI Adapter
//!
//! The ratatui-specific layer. Handles terminal I/O, renders the UI,
//! translates keyboard events into core::Action values, and turns the
//! returned effects into background tasks.
//!
//! This is the only module that knows about ratatui and crossterm.
//!
//! ## Redraw Strategy
//!
//! - **Animating** (a reply streaming, an upload or memory request in
//!   flight): draws every ~80ms so the pending bubble can pulse.
//! - **Idle**: sleeps up to 500ms and only redraws on input or when a
//!   background task reports back.
//!
//! A `SteadyBlock` cursor style is used instead of a blinking cursor because
//! ratatui's `set_cursor_position` resets the terminal's blink timer on every
//! `draw()` call, making blinking cursors appear erratic during continuous redraws.

mod component;
mod components;
mod event;
pub mod markdown;
mod tasks;
mod ui;

use log::{debug, info};
use std::io::stdout;
use std::path::PathBuf;
use std::sync::{Arc, mpsc};
use std::time::{Duration, Instant};

use crossterm::cursor::{Hide, SetCursorStyle, Show};
use crossterm::event::{
    DisableBracketedPaste, DisableMouseCapture, EnableBracketedPaste, EnableMouseCapture,
    KeyboardEnhancementFlags, PopKeyboardEnhancementFlags, PushKeyboardEnhancementFlags,
};
use crossterm::execute;

use crate::api::{HttpBackend, KokoBackend};
use crate::core::action::{Action, Effect, update};
use crate::core::config::ResolvedConfig;
use crate::core::memory::MemoryStatus;
use crate::core::state::App;
use crate::tui::component::EventHandler;
use crate::tui::components::{InputBox, InputEvent, MessageListState, SidebarEvent, SidebarState};
use crate::tui::event::{TuiEvent, poll_event_immediate, poll_event_timeout};

/// Which pane receives text input. Tab cycles in this order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Focus {
    Chat,
    Memory,
    Sidebar,
}

impl Focus {
    /// Next pane in the Tab cycle, skipping the sidebar while it is hidden.
    pub fn next(self, sidebar_visible: bool) -> Self {
        match self {
            Focus::Chat => Focus::Memory,
            Focus::Memory if sidebar_visible => Focus::Sidebar,
            Focus::Memory | Focus::Sidebar => Focus::Chat,
        }
    }
}

/// TUI-specific presentation state (not part of core business logic)
pub struct TuiState {
    // Persistent component states
    pub message_list: MessageListState,
    pub chat_input: InputBox,
    pub note_input: InputBox,
    pub sidebar: SidebarState,
    pub focus: Focus,
    /// Sidebar hides below this terminal width
    pub narrow_width: u16,
    // Animation state
    pub pulse_value: f32,
    /// Conversation shown last frame; a change resets the scroll position
    last_active_id: String,
}

impl TuiState {
    pub fn new(narrow_width: u16) -> Self {
        Self {
            message_list: MessageListState::new(),
            chat_input: InputBox::new(" Message ", "Ask Koko anything... (/upload <path>, /new, /clear)"),
            note_input: InputBox::new(" Memory note ", "Remember something... (Enter to save)"),
            sidebar: SidebarState::new(),
            focus: Focus::Chat, // User expects to type immediately
            narrow_width,
            pulse_value: 0.0,
            last_active_id: String::new(),
        }
    }

    /// Pull core-owned values into the widgets before drawing.
    fn sync(&mut self, app: &App) {
        if self.note_input.text() != app.memory.note {
            self.note_input.set_text(&app.memory.note);
        }
        if self.last_active_id != app.registry.active_id() {
            self.last_active_id = app.registry.active_id().to_string();
            self.message_list.reset();
        }
        self.sidebar.sync(app.registry.conversations());
    }
}

/// What a line typed into the chat input asks for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Send(String),
    Upload(PathBuf),
    /// `/upload` without a path
    UploadUsage,
    NewChat,
    ClearAll,
}

fn expand_home(path: &str) -> PathBuf {
    if let Some(rest) = path.strip_prefix("~/")
        && let Some(home) = dirs::home_dir()
    {
        return home.join(rest);
    }
    PathBuf::from(path)
}

pub fn parse_command(input: &str) -> Command {
    let trimmed = input.trim();
    if let Some(rest) = trimmed.strip_prefix("/upload")
        && (rest.is_empty() || rest.starts_with(char::is_whitespace))
    {
        let path = rest.trim();
        return if path.is_empty() {
            Command::UploadUsage
        } else {
            Command::Upload(expand_home(path))
        };
    }
    match trimmed {
        "/new" => Command::NewChat,
        "/clear" => Command::ClearAll,
        _ => Command::Send(input.to_string()),
    }
}

struct TerminalModeGuard;

impl TerminalModeGuard {
    fn new() -> std::io::Result<Self> {
        // Kitty keyboard protocol is ignored by terminals that lack it
        execute!(
            stdout(),
            EnableMouseCapture,
            EnableBracketedPaste,
            Show,
            SetCursorStyle::SteadyBlock,
            PushKeyboardEnhancementFlags(
                KeyboardEnhancementFlags::DISAMBIGUATE_ESCAPE_CODES
                    | KeyboardEnhancementFlags::REPORT_EVENT_TYPES
            )
        )?;
        info!(
            "Terminal modes enabled (mouse, bracketed paste, steady block cursor, keyboard enhancement)"
        );
        Ok(Self)
    }
}

impl Drop for TerminalModeGuard {
    fn drop(&mut self) {
        let _ = execute!(
            stdout(),
            PopKeyboardEnhancementFlags,
            DisableMouseCapture,
            DisableBracketedPaste,
            Hide
        );
    }
}

/// Run one action through the reducer and start whatever I/O it asks for.
/// Returns true when the app should quit.
fn dispatch(app: &mut App, action: Action, tx: &mpsc::Sender<Action>) -> bool {
    let effect = update(app, action);
    if effect == Effect::Quit {
        return true;
    }
    tasks::spawn_effect(effect, &app.backend, tx);
    false
}

fn run_command(
    app: &mut App,
    tui: &mut TuiState,
    command: Command,
    tx: &mpsc::Sender<Action>,
) -> bool {
    match command {
        Command::Send(text) => {
            let effect = update(app, Action::SubmitMessage(text.clone()));
            if effect == Effect::None {
                // Rejected: hand the text back so nothing typed is lost
                tui.chat_input.set_text(&text);
                return false;
            }
            tui.message_list.reset();
            tasks::spawn_effect(effect, &app.backend, tx);
            false
        }
        Command::Upload(path) => {
            dispatch(app, Action::PickFile(path), tx) || dispatch(app, Action::UploadDocument, tx)
        }
        Command::UploadUsage => {
            app.status_message = String::from("Usage: /upload <path>");
            false
        }
        Command::NewChat => dispatch(app, Action::NewConversation, tx),
        Command::ClearAll => dispatch(app, Action::ClearAll, tx),
    }
}

fn sidebar_action(event: SidebarEvent) -> Action {
    match event {
        SidebarEvent::Select(id) => Action::SelectConversation(id),
        SidebarEvent::NewChat => Action::NewConversation,
        SidebarEvent::TogglePin(id) => Action::TogglePinned(id),
        SidebarEvent::ToggleBookmark(id) => Action::ToggleBookmarked(id),
        SidebarEvent::ClearAll => Action::ClearAll,
    }
}

/// Route one terminal event. Returns true when the app should quit.
fn handle_event(
    app: &mut App,
    tui: &mut TuiState,
    event: TuiEvent,
    sidebar_visible: bool,
    tx: &mpsc::Sender<Action>,
) -> bool {
    // Ctrl+D must be pressed twice in a row, from any pane
    if !matches!(event, TuiEvent::ClearChats) && tui.focus != Focus::Sidebar {
        tui.sidebar.confirm_clear = false;
    }

    match event {
        TuiEvent::Resize => false,
        TuiEvent::ForceQuit => dispatch(app, Action::Quit, tx),
        TuiEvent::FocusNext => {
            tui.focus = tui.focus.next(sidebar_visible);
            false
        }
        TuiEvent::ScrollUp
        | TuiEvent::ScrollDown
        | TuiEvent::ScrollPageUp
        | TuiEvent::ScrollPageDown => {
            tui.message_list.handle_event(&event);
            false
        }
        TuiEvent::Suggestion(index) => {
            if let Some(chip) = app.suggestions.get(index) {
                tui.chat_input.set_text(chip);
                tui.focus = Focus::Chat;
            }
            false
        }
        TuiEvent::ClearMemories => dispatch(app, Action::ClearMemories, tx),
        _ => match tui.focus {
            Focus::Chat => handle_chat_event(app, tui, event, tx),
            Focus::Memory => handle_memory_event(app, tui, event, tx),
            Focus::Sidebar => match tui.sidebar.handle_event(&event) {
                Some(sidebar_event) => dispatch(app, sidebar_action(sidebar_event), tx),
                None => false,
            },
        },
    }
}

fn handle_chat_event(
    app: &mut App,
    tui: &mut TuiState,
    event: TuiEvent,
    tx: &mpsc::Sender<Action>,
) -> bool {
    let active_id = app.registry.active_id().to_string();
    match event {
        TuiEvent::CursorUp => {
            tui.message_list.handle_event(&TuiEvent::ScrollUp);
            false
        }
        TuiEvent::CursorDown => {
            tui.message_list.handle_event(&TuiEvent::ScrollDown);
            false
        }
        TuiEvent::NewChat => dispatch(app, Action::NewConversation, tx),
        TuiEvent::TogglePin => dispatch(app, Action::TogglePinned(active_id), tx),
        TuiEvent::ToggleBookmark => dispatch(app, Action::ToggleBookmarked(active_id), tx),
        TuiEvent::ClearChats => match tui.sidebar.handle_event(&event) {
            Some(sidebar_event) => dispatch(app, sidebar_action(sidebar_event), tx),
            None => false,
        },
        _ => match tui.chat_input.handle_event(&event) {
            Some(InputEvent::Submit(text)) => run_command(app, tui, parse_command(&text), tx),
            Some(InputEvent::ContentChanged) | None => false,
        },
    }
}

fn handle_memory_event(
    app: &mut App,
    tui: &mut TuiState,
    event: TuiEvent,
    tx: &mpsc::Sender<Action>,
) -> bool {
    match event {
        TuiEvent::NewChat => dispatch(app, Action::NewConversation, tx),
        _ => match tui.note_input.handle_event(&event) {
            Some(InputEvent::ContentChanged) => dispatch(
                app,
                Action::EditMemoryNote(tui.note_input.text().to_string()),
                tx,
            ),
            // The core note still holds the text; the reducer clears it once the save settles
            Some(InputEvent::Submit(_)) => dispatch(app, Action::SaveMemory, tx),
            None => false,
        },
    }
}

fn is_animating(app: &App) -> bool {
    !app.typing.is_empty() || app.is_uploading || app.memory.status != MemoryStatus::Idle
}

pub fn run(config: ResolvedConfig) -> std::io::Result<()> {
    let backend: Arc<dyn KokoBackend> = Arc::new(HttpBackend::new(config.api_base.clone()));
    let mut app = App::from_config(backend, &config);
    let mut tui = TuiState::new(config.narrow_width);
    info!("Koko TUI starting against {}", app.api_base);

    let mut terminal = ratatui::init();
    let _terminal_mode_guard = TerminalModeGuard::new();

    // Channel for actions from background tasks
    let (tx, rx) = mpsc::channel();

    dispatch(&mut app, Action::LoadMemories, &tx);

    let start_time = Instant::now();
    let mut needs_redraw = true; // Force first frame

    'main: loop {
        let animating = is_animating(&app);
        if animating {
            needs_redraw = true;
        }

        if needs_redraw {
            let elapsed = start_time.elapsed().as_secs_f32();
            tui.pulse_value = (elapsed * 5.0).sin() * 0.5 + 0.5;
            tui.sync(&app);
            terminal.draw(|f| ui::draw_ui(f, &app, &mut tui))?;
            needs_redraw = false;
        }

        let timeout = if animating {
            Duration::from_millis(80)
        } else {
            Duration::from_millis(500)
        };
        let first_event = poll_event_timeout(timeout);
        if first_event.is_some() {
            needs_redraw = true;
        }

        let width = terminal.size()?.width;
        let sidebar_visible = ui::sidebar_visible(width, tui.narrow_width);
        if !sidebar_visible && tui.focus == Focus::Sidebar {
            tui.focus = Focus::Chat;
        }

        // Process first event + drain everything pending before the next draw
        for event in first_event
            .into_iter()
            .chain(std::iter::from_fn(poll_event_immediate))
        {
            tui.sync(&app);
            if handle_event(&mut app, &mut tui, event, sidebar_visible, &tx) {
                break 'main;
            }
        }

        // Handle background task actions
        while let Ok(action) = rx.try_recv() {
            needs_redraw = true;
            debug!("Event loop received: {:?}", action);
            if dispatch(&mut app, action, &tx) {
                break 'main;
            }
        }
    }

    ratatui::restore();
    Ok(())
}
