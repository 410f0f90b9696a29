//! TUI application state
//!
//! Pure data structures for the TUI. No rendering logic here. The session
//! itself lives in the runner; the few session facts that key handling
//! depends on are mirrored here by [`AppState::sync_session`].

use std::time::Instant;

use rand::seq::IndexedRandom;
use tracing::debug;

use crate::session::{Layout, SessionController};

/// Words for the waiting indicator
pub const THINKING_WORDS: &[&str] = &["Thinking", "Counting", "Tabulating", "Surveying", "Crunching", "Querying"];

/// Shown when a question is entered while another is queued or in flight
pub const WAIT_MESSAGE: &str = "Please wait for the current answer.";

/// Where keystrokes go
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum InteractionMode {
    /// Typing a question
    #[default]
    Input,
    /// Inspecting rows of the data table
    Table,
    /// Help overlay
    Help,
}

/// All state needed to draw a frame
#[derive(Debug)]
pub struct AppState {
    pub interaction_mode: InteractionMode,
    /// Mode to return to when the help overlay closes
    pub mode_before_help: InteractionMode,
    pub should_quit: bool,
    /// Transient message shown in the footer until the next key press
    pub error_message: Option<String>,

    // === Input ===
    pub input: String,
    /// Byte offset of the cursor within `input`
    pub cursor_pos: usize,
    /// Question waiting for the runner to submit
    pub pending_submit: Option<String>,

    // === Log scroll ===
    /// Manual scroll offset; `None` follows the newest turn
    pub log_scroll: Option<usize>,
    /// Largest useful offset, updated during render
    pub log_max_scroll: usize,
    /// Lines per page, updated during render
    pub log_page: usize,

    // === Table inspection ===
    pub table_selection: Option<usize>,

    // === Mirrored session facts ===
    pub layout: Layout,
    pub busy: bool,
    pub table_len: usize,
    pub client_name: String,

    // === Waiting indicator ===
    pub thinking_word: String,
    pub thinking_start: Option<Instant>,
}

impl Default for AppState {
    fn default() -> Self {
        Self {
            interaction_mode: InteractionMode::default(),
            mode_before_help: InteractionMode::default(),
            should_quit: false,
            error_message: None,
            input: String::new(),
            cursor_pos: 0,
            pending_submit: None,
            log_scroll: None,
            log_max_scroll: 0,
            log_page: 10,
            table_selection: None,
            layout: Layout::Empty,
            busy: false,
            table_len: 0,
            client_name: String::new(),
            thinking_word: String::new(),
            thinking_start: None,
        }
    }
}

impl AppState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_error(&mut self, msg: impl Into<String>) {
        let msg = msg.into();
        debug!(%msg, "AppState::set_error: called");
        self.error_message = Some(msg);
    }

    pub fn clear_error(&mut self) {
        self.error_message = None;
    }

    /// A question is queued for the next tick or its request is outstanding
    pub fn awaiting_answer(&self) -> bool {
        self.busy || self.pending_submit.is_some()
    }

    /// Copy the session facts key handling needs
    pub fn sync_session(&mut self, session: &SessionController) {
        self.layout = session.layout();
        self.client_name = session.client_name().to_string();

        let was_busy = self.busy;
        self.busy = session.is_busy();
        if was_busy && !self.busy {
            self.thinking_start = None;
        }

        self.table_len = session.displayed_view().map(|v| v.table.len()).unwrap_or(0);
        if self.table_len == 0 {
            self.table_selection = None;
            if self.interaction_mode == InteractionMode::Table {
                self.interaction_mode = InteractionMode::Input;
            }
        } else if let Some(selected) = self.table_selection {
            self.table_selection = Some(selected.min(self.table_len - 1));
        }
    }

    /// A question was accepted; show the waiting indicator
    pub fn start_thinking(&mut self) {
        let mut rng = rand::rng();
        self.thinking_word = THINKING_WORDS.choose(&mut rng).unwrap_or(&"Thinking").to_string();
        self.thinking_start = Some(Instant::now());
        self.log_scroll = None;
    }

    /// A new chart replaced the old one
    pub fn reset_table_selection(&mut self) {
        self.table_selection = None;
        if self.interaction_mode == InteractionMode::Table {
            self.interaction_mode = InteractionMode::Input;
        }
    }

    pub fn scroll_log_up(&mut self, lines: usize) {
        let current = self.log_scroll.unwrap_or(self.log_max_scroll);
        self.log_scroll = Some(current.saturating_sub(lines));
    }

    pub fn scroll_log_down(&mut self, lines: usize) {
        let current = self.log_scroll.unwrap_or(self.log_max_scroll);
        let next = current.saturating_add(lines);
        // Reaching the bottom resumes following
        self.log_scroll = if next >= self.log_max_scroll { None } else { Some(next) };
    }

    pub fn select_next_row(&mut self) {
        if self.table_len == 0 {
            return;
        }
        self.table_selection = Some(match self.table_selection {
            None => 0,
            Some(i) => (i + 1).min(self.table_len - 1),
        });
    }

    pub fn select_prev_row(&mut self) {
        if self.table_len == 0 {
            return;
        }
        self.table_selection = Some(match self.table_selection {
            None => 0,
            Some(i) => i.saturating_sub(1),
        });
    }
}
