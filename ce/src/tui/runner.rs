//! TUI Runner - main loop that owns the terminal and the session
//!
//! The TuiRunner is responsible for:
//! - Dispatching terminal events to App for handling
//! - Submitting queued questions to the session on each tick
//! - Applying finished answers and rendering at ~30 FPS

use std::time::Duration;

use eyre::Result;
use tracing::{debug, info, warn};

use super::Tui;
use super::app::App;
use super::events::{Event, EventHandler};
use super::views;
use crate::session::SessionController;
use crate::submit::SubmitError;

/// Frame interval
const TICK_RATE: Duration = Duration::from_millis(33);

/// TUI Runner that manages the terminal and event loop
pub struct TuiRunner {
    app: App,
    terminal: Tui,
    session: SessionController,
    event_handler: EventHandler,
}

impl TuiRunner {
    pub fn new(terminal: Tui, session: SessionController) -> Self {
        debug!(client = session.client_name(), "TuiRunner::new: called");
        Self {
            app: App::new(),
            terminal,
            session,
            event_handler: EventHandler::new(TICK_RATE),
        }
    }

    pub async fn run(&mut self) -> Result<()> {
        debug!("TuiRunner::run: entering main loop");
        loop {
            self.app.state_mut().sync_session(&self.session);
            self.terminal
                .draw(|frame| views::render(self.app.state_mut(), &self.session, frame))?;

            match self.event_handler.next().await? {
                Event::Tick => self.handle_tick(),
                Event::Key(key) => {
                    if self.app.handle_key(key) {
                        break;
                    }
                }
                Event::Resize(width, height) => {
                    debug!(width, height, "TuiRunner::run: resize");
                }
            }

            if self.app.state().should_quit {
                break;
            }
        }

        info!(turns = self.session.turns().len(), "TUI session ended");
        Ok(())
    }

    /// Submit any queued question, then apply any finished answer
    fn handle_tick(&mut self) {
        if let Some(question) = self.app.state_mut().pending_submit.take() {
            match self.session.submit(&question) {
                Ok(turn) => {
                    info!("Submitted question as turn {}", turn);
                    self.app.state_mut().start_thinking();
                }
                Err(SubmitError::Blank) => {
                    debug!("TuiRunner::handle_tick: blank question ignored");
                }
                Err(e @ SubmitError::Busy) => {
                    // App holds questions back while one is in flight
                    warn!(%question, "Submission refused: {}", e);
                }
            }
        }

        if self.session.poll() {
            debug!("TuiRunner::handle_tick: answer applied");
            self.app.state_mut().reset_table_selection();
        }
    }
}
