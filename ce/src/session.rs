//! Session controller
//!
//! Composes the submission unit, the conversation store and the
//! visualization dispatcher. Submissions append a pending turn before the
//! remote call starts; completed answers fulfil their turn and replace the
//! displayed chart. Every failure ends in state the views can show.

use std::collections::HashSet;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{debug, info, warn};

use crate::api::CensusApi;
use crate::conversation::{ConversationLog, ConversationTurn, TurnId};
use crate::payload::{AnswerEnvelope, ChartPayload};
use crate::render::{RenderedView, render};
use crate::submit::{QuerySubmitter, SubmissionEvent, SubmitError};
use crate::transcript::Transcript;

/// Screen layout
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Layout {
    /// No turns yet: prompt screen
    Empty,
    /// At least one turn: log beside chart
    Active,
}

/// An answer that arrived with no pending turn to attach to
#[derive(Debug, Clone)]
pub struct OrphanAnswer {
    pub envelope: AnswerEnvelope,
    pub received_at: DateTime<Utc>,
}

/// Top-level conversation state
pub struct SessionController {
    log: ConversationLog,
    submitter: QuerySubmitter,
    transcript: Transcript,
    layout: Layout,
    displayed_chart: Option<ChartPayload>,
    displayed_view: Option<RenderedView>,
    submit_error: Option<String>,
    failed_turns: HashSet<TurnId>,
    orphans: Vec<OrphanAnswer>,
}

impl SessionController {
    pub fn new(api: Arc<dyn CensusApi>) -> Self {
        Self::with_transcript(api, Transcript::disabled())
    }

    pub fn with_transcript(api: Arc<dyn CensusApi>, transcript: Transcript) -> Self {
        debug!(client = api.name(), transcript = transcript.is_enabled(), "SessionController::new: called");
        Self {
            log: ConversationLog::new(),
            submitter: QuerySubmitter::new(api),
            transcript,
            layout: Layout::Empty,
            displayed_chart: None,
            displayed_view: None,
            submit_error: None,
            failed_turns: HashSet::new(),
            orphans: Vec::new(),
        }
    }

    /// Submit raw input
    ///
    /// Blank input and submissions while busy change nothing. Otherwise the
    /// pending turn is appended and the layout switches to `Active` before
    /// the request is dispatched.
    pub fn submit(&mut self, raw: &str) -> Result<TurnId, SubmitError> {
        debug!(raw_len = raw.len(), "SessionController::submit: called");
        let question = self.submitter.accept(raw)?;

        let turn = self.log.append_pending(question.clone());
        if self.layout == Layout::Empty {
            info!("First question submitted, switching to active layout");
            self.layout = Layout::Active;
        }
        self.submit_error = None;
        self.transcript.log_question(turn, &question);

        self.submitter.dispatch(turn, question)?;
        Ok(turn)
    }

    /// Apply any finished request; returns true when state changed
    pub fn poll(&mut self) -> bool {
        match self.submitter.poll() {
            Some(event) => {
                self.apply(event);
                true
            }
            None => false,
        }
    }

    /// Wait for the outstanding request and apply it
    ///
    /// Returns the turn it concerned, or `None` when nothing was outstanding.
    pub async fn wait(&mut self) -> Option<TurnId> {
        let event = self.submitter.next_event().await?;
        let turn = event.turn();
        self.apply(event);
        Some(turn)
    }

    fn apply(&mut self, event: SubmissionEvent) {
        match event {
            SubmissionEvent::Answered { turn, envelope, .. } => self.on_answer(turn, envelope),
            SubmissionEvent::Failed { turn, question, error } => {
                let message = error.user_message();
                warn!(%turn, %question, %error, "Question failed");
                self.transcript.log_failure(turn, &question, &message);
                self.failed_turns.insert(turn);
                self.submit_error = Some(message);
            }
        }
    }

    fn on_answer(&mut self, turn: TurnId, envelope: AnswerEnvelope) {
        debug!(%turn, success = envelope.is_success(), "SessionController::on_answer: called");
        self.transcript.log_answer(turn, &envelope);
        let payload = envelope.payload.clone();

        if let Err(e) = self.log.fulfil_turn(turn, envelope.clone()) {
            warn!(error = %e, "Answer matched no pending turn; keeping it as an orphan");
            self.record_orphan(envelope);
            return;
        }
        self.set_displayed(payload);
    }

    /// Deliver an answer that is matched by question text
    ///
    /// Used for answers that did not come through this session's submitter.
    pub fn deliver(&mut self, envelope: AnswerEnvelope) -> Option<TurnId> {
        debug!(question = %envelope.original_question, "SessionController::deliver: called");
        let payload = envelope.payload.clone();
        match self.log.fulfil(&envelope.original_question, envelope.clone()) {
            Ok(turn) => {
                self.failed_turns.remove(&turn);
                self.transcript.log_answer(turn, &envelope);
                self.set_displayed(payload);
                Some(turn)
            }
            Err(e) => {
                warn!(error = %e, "Delivered answer matched no pending turn; keeping it as an orphan");
                self.record_orphan(envelope);
                None
            }
        }
    }

    fn record_orphan(&mut self, envelope: AnswerEnvelope) {
        self.transcript.log_orphan(&envelope);
        self.orphans.push(OrphanAnswer {
            envelope,
            received_at: Utc::now(),
        });
    }

    fn set_displayed(&mut self, payload: Option<ChartPayload>) {
        self.displayed_view = payload.as_ref().map(render);
        self.displayed_chart = payload;
    }

    pub fn layout(&self) -> Layout {
        self.layout
    }

    pub fn turns(&self) -> &[ConversationTurn] {
        self.log.all_turns()
    }

    pub fn log(&self) -> &ConversationLog {
        &self.log
    }

    /// Payload of the most recently fulfilled turn
    pub fn displayed_chart(&self) -> Option<&ChartPayload> {
        self.displayed_chart.as_ref()
    }

    /// Rendered form of [`displayed_chart`](Self::displayed_chart)
    pub fn displayed_view(&self) -> Option<&RenderedView> {
        self.displayed_view.as_ref()
    }

    /// Message from the last failed submission, until the next one
    pub fn submit_error(&self) -> Option<&str> {
        self.submit_error.as_deref()
    }

    pub fn dismiss_error(&mut self) {
        self.submit_error = None;
    }

    pub fn is_failed(&self, turn: TurnId) -> bool {
        self.failed_turns.contains(&turn)
    }

    pub fn is_busy(&self) -> bool {
        self.submitter.is_busy()
    }

    pub fn orphans(&self) -> &[OrphanAnswer] {
        &self.orphans
    }

    pub fn client_name(&self) -> &'static str {
        self.submitter.client_name()
    }
}
