//! TUI application - keyboard handling
//!
//! The App struct owns the AppState and handles all keyboard events.
//! It does not do any rendering or networking: submissions are queued in
//! `pending_submit` for the runner to pick up on the next tick.

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use tracing::{debug, trace};

use super::state::{AppState, InteractionMode, WAIT_MESSAGE};
use crate::api::SUGGESTED_PROMPTS;
use crate::session::Layout;

/// TUI application
#[derive(Debug, Default)]
pub struct App {
    state: AppState,
}

impl App {
    pub fn new() -> Self {
        debug!("App::new: called");
        Self { state: AppState::new() }
    }

    pub fn state(&self) -> &AppState {
        trace!("App::state: called");
        &self.state
    }

    pub fn state_mut(&mut self) -> &mut AppState {
        trace!("App::state_mut: called");
        &mut self.state
    }

    /// Handle a key event
    ///
    /// Returns true if the application should exit.
    pub fn handle_key(&mut self, key: KeyEvent) -> bool {
        debug!(?key, "App::handle_key: called");
        self.state.clear_error();

        if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
            debug!("App::handle_key: Ctrl+C - quit");
            self.state.should_quit = true;
            return true;
        }

        let quit = match self.state.interaction_mode {
            InteractionMode::Input => self.handle_input_key(key),
            InteractionMode::Table => self.handle_table_key(key),
            InteractionMode::Help => self.handle_help_key(key),
        };
        if quit {
            self.state.should_quit = true;
        }
        quit
    }

    fn open_help(&mut self) {
        self.state.mode_before_help = self.state.interaction_mode;
        self.state.interaction_mode = InteractionMode::Help;
    }

    fn handle_input_key(&mut self, key: KeyEvent) -> bool {
        debug!(?key, "App::handle_input_key: called");
        let input_empty = self.state.input.is_empty();
        match key.code {
            KeyCode::F(1) => self.open_help(),
            KeyCode::Char('?') if input_empty => self.open_help(),
            KeyCode::Char('q') if input_empty => {
                debug!("App::handle_input_key: q on empty input - quit");
                return true;
            }
            KeyCode::Char(c @ '1'..='9') if input_empty && self.state.layout == Layout::Empty => {
                let index = (c as usize) - ('1' as usize);
                match SUGGESTED_PROMPTS.get(index) {
                    Some(prompt) => {
                        debug!(index, "App::handle_input_key: suggested prompt");
                        self.queue_submit(prompt.to_string());
                    }
                    None => self.insert_char(c),
                }
            }
            KeyCode::Enter => {
                debug!("App::handle_input_key: Enter - submit");
                if self.state.input.trim().is_empty() {
                    return false;
                }
                if self.state.awaiting_answer() {
                    self.state.set_error(WAIT_MESSAGE);
                    return false;
                }
                let input = std::mem::take(&mut self.state.input);
                self.state.cursor_pos = 0;
                self.queue_submit(input);
            }
            KeyCode::Esc => {
                debug!("App::handle_input_key: Esc - clear input");
                self.state.input.clear();
                self.state.cursor_pos = 0;
            }
            KeyCode::Tab => {
                if self.state.table_len > 0 {
                    debug!("App::handle_input_key: Tab - focus table");
                    self.state.interaction_mode = InteractionMode::Table;
                    if self.state.table_selection.is_none() {
                        self.state.table_selection = Some(0);
                    }
                }
            }
            KeyCode::Backspace => {
                if self.state.cursor_pos > 0 {
                    let new_pos = self.prev_char_boundary(self.state.cursor_pos);
                    self.state.input.drain(new_pos..self.state.cursor_pos);
                    self.state.cursor_pos = new_pos;
                }
            }
            KeyCode::Delete => {
                if self.state.cursor_pos < self.state.input.len() {
                    let end_pos = self.next_char_boundary(self.state.cursor_pos);
                    self.state.input.drain(self.state.cursor_pos..end_pos);
                }
            }
            KeyCode::Left => {
                if self.state.cursor_pos > 0 {
                    self.state.cursor_pos = self.prev_char_boundary(self.state.cursor_pos);
                }
            }
            KeyCode::Right => {
                if self.state.cursor_pos < self.state.input.len() {
                    self.state.cursor_pos = self.next_char_boundary(self.state.cursor_pos);
                }
            }
            KeyCode::Home => self.state.cursor_pos = 0,
            KeyCode::End => self.state.cursor_pos = self.state.input.len(),
            KeyCode::Up => self.state.scroll_log_up(1),
            KeyCode::Down => self.state.scroll_log_down(1),
            KeyCode::PageUp => {
                let page = self.state.log_page;
                self.state.scroll_log_up(page);
            }
            KeyCode::PageDown => {
                let page = self.state.log_page;
                self.state.scroll_log_down(page);
            }
            KeyCode::Char(c) => self.insert_char(c),
            _ => {
                trace!("App::handle_input_key: unhandled key");
            }
        }
        false
    }

    fn handle_table_key(&mut self, key: KeyEvent) -> bool {
        debug!(?key, "App::handle_table_key: called");
        match key.code {
            KeyCode::Char('q') => return true,
            KeyCode::Char('?') | KeyCode::F(1) => self.open_help(),
            KeyCode::Char('j') | KeyCode::Down => self.state.select_next_row(),
            KeyCode::Char('k') | KeyCode::Up => self.state.select_prev_row(),
            KeyCode::Tab | KeyCode::Esc => {
                debug!("App::handle_table_key: back to input");
                self.state.interaction_mode = InteractionMode::Input;
            }
            _ => {
                trace!("App::handle_table_key: unhandled key");
            }
        }
        false
    }

    fn handle_help_key(&mut self, key: KeyEvent) -> bool {
        debug!(?key, "App::handle_help_key: called");
        match key.code {
            KeyCode::Esc | KeyCode::Char('?') | KeyCode::Char('q') | KeyCode::F(1) => {
                self.state.interaction_mode = self.state.mode_before_help;
            }
            _ => {
                trace!("App::handle_help_key: unhandled key");
            }
        }
        false
    }

    fn queue_submit(&mut self, question: String) {
        if self.state.awaiting_answer() {
            debug!(%question, "App::queue_submit: refused, a question is already queued or in flight");
            self.state.set_error(WAIT_MESSAGE);
            return;
        }
        debug!(%question, "App::queue_submit: queued");
        self.state.pending_submit = Some(question);
    }

    fn insert_char(&mut self, c: char) {
        self.state.input.insert(self.state.cursor_pos, c);
        self.state.cursor_pos += c.len_utf8();
    }

    fn prev_char_boundary(&self, pos: usize) -> usize {
        let input = &self.state.input;
        let mut new_pos = pos.saturating_sub(1);
        while new_pos > 0 && !input.is_char_boundary(new_pos) {
            new_pos -= 1;
        }
        new_pos
    }

    fn next_char_boundary(&self, pos: usize) -> usize {
        let input = &self.state.input;
        let mut new_pos = pos + 1;
        while new_pos < input.len() && !input.is_char_boundary(new_pos) {
            new_pos += 1;
        }
        new_pos.min(input.len())
    }
}
