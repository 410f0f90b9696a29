//! Query submission
//!
//! Validates input, then runs the remote call on a background task and hands
//! the outcome back over a channel. Only one request is outstanding at a
//! time; while it is, further submissions are rejected without side effects.

use std::sync::Arc;

use thiserror::Error;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::api::{ApiError, CensusApi};
use crate::conversation::TurnId;
use crate::payload::AnswerEnvelope;

/// Reasons a submission is refused before any network call
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SubmitError {
    #[error("question is blank")]
    Blank,

    #[error("a question is already being answered")]
    Busy,
}

/// Outcome of a dispatched question
#[derive(Debug)]
pub enum SubmissionEvent {
    Answered {
        turn: TurnId,
        question: String,
        envelope: AnswerEnvelope,
    },
    Failed {
        turn: TurnId,
        question: String,
        error: ApiError,
    },
}

impl SubmissionEvent {
    pub fn turn(&self) -> TurnId {
        match self {
            Self::Answered { turn, .. } | Self::Failed { turn, .. } => *turn,
        }
    }
}

/// Submits questions to a [`CensusApi`] one at a time
pub struct QuerySubmitter {
    api: Arc<dyn CensusApi>,
    result_rx: Option<mpsc::Receiver<SubmissionEvent>>,
    task: Option<JoinHandle<()>>,
    /// Turn and question of the outstanding request
    in_flight: Option<(TurnId, String)>,
}

impl QuerySubmitter {
    pub fn new(api: Arc<dyn CensusApi>) -> Self {
        debug!(client = api.name(), "QuerySubmitter::new: called");
        Self {
            api,
            result_rx: None,
            task: None,
            in_flight: None,
        }
    }

    /// Name of the underlying client
    pub fn client_name(&self) -> &'static str {
        self.api.name()
    }

    /// True while a dispatched question has not reported back
    pub fn is_busy(&self) -> bool {
        self.result_rx.is_some()
    }

    /// Validate raw input and return the question to ask
    pub fn accept(&self, raw: &str) -> Result<String, SubmitError> {
        debug!(raw_len = raw.len(), busy = self.is_busy(), "QuerySubmitter::accept: called");
        if self.is_busy() {
            return Err(SubmitError::Busy);
        }
        let question = raw.trim();
        if question.is_empty() {
            return Err(SubmitError::Blank);
        }
        Ok(question.to_string())
    }

    /// Ask `question` on a background task
    ///
    /// Must run inside a tokio runtime. The outcome is picked up by
    /// [`poll`](Self::poll) or [`next_event`](Self::next_event).
    pub fn dispatch(&mut self, turn: TurnId, question: String) -> Result<(), SubmitError> {
        debug!(%turn, %question, "QuerySubmitter::dispatch: called");
        if self.is_busy() {
            return Err(SubmitError::Busy);
        }

        let (result_tx, result_rx) = mpsc::channel::<SubmissionEvent>(1);
        self.result_rx = Some(result_rx);
        self.in_flight = Some((turn, question.clone()));

        let api = Arc::clone(&self.api);
        info!("Dispatching question for turn {} to {}", turn, api.name());
        self.task = Some(tokio::spawn(async move {
            let event = match api.ask(&question).await {
                Ok(envelope) => {
                    debug!(%turn, "question task: answered");
                    SubmissionEvent::Answered {
                        turn,
                        question,
                        envelope,
                    }
                }
                Err(error) => {
                    warn!(%turn, %error, "question task: request failed");
                    SubmissionEvent::Failed { turn, question, error }
                }
            };
            let _ = result_tx.send(event).await;
        }));
        Ok(())
    }

    /// Collect any finished outcome without waiting
    pub fn poll(&mut self) -> Option<SubmissionEvent> {
        let rx = self.result_rx.as_mut()?;
        match rx.try_recv() {
            Ok(event) => {
                self.finish();
                Some(event)
            }
            Err(mpsc::error::TryRecvError::Empty) => None,
            Err(mpsc::error::TryRecvError::Disconnected) => {
                warn!("QuerySubmitter::poll: question task ended without reporting");
                self.interrupted()
            }
        }
    }

    /// Wait for the outstanding outcome, if any
    pub async fn next_event(&mut self) -> Option<SubmissionEvent> {
        match self.result_rx.as_mut()?.recv().await {
            Some(event) => {
                self.finish();
                Some(event)
            }
            None => {
                warn!("QuerySubmitter::next_event: question task ended without reporting");
                self.interrupted()
            }
        }
    }

    /// Report the outstanding question as failed when its task died silently
    fn interrupted(&mut self) -> Option<SubmissionEvent> {
        let (turn, question) = self.in_flight.take()?;
        self.finish();
        Some(SubmissionEvent::Failed {
            turn,
            question,
            error: ApiError::Interrupted,
        })
    }

    fn finish(&mut self) {
        self.result_rx = None;
        self.task = None;
        self.in_flight = None;
    }
}

impl Drop for QuerySubmitter {
    fn drop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::{FixtureCensusApi, GENERIC_FAILURE_MESSAGE, ScriptedReply};
    use crate::conversation::ConversationLog;
    use async_trait::async_trait;

    /// Client whose request task panics
    struct PanickingApi;

    #[async_trait]
    impl CensusApi for PanickingApi {
        async fn ask(&self, _question: &str) -> Result<AnswerEnvelope, ApiError> {
            panic!("request task crashed");
        }

        fn name(&self) -> &'static str {
            "panicking"
        }
    }

    fn turn_id() -> TurnId {
        ConversationLog::new().append_pending("q")
    }

    #[test]
    fn test_blank_input_is_rejected() {
        let api = Arc::new(FixtureCensusApi::scripted(vec![]));
        let submitter = QuerySubmitter::new(api.clone());
        assert_eq!(submitter.accept(""), Err(SubmitError::Blank));
        assert_eq!(submitter.accept("   \t\n"), Err(SubmitError::Blank));
        assert_eq!(api.call_count(), 0);
    }

    #[test]
    fn test_accept_trims() {
        let submitter = QuerySubmitter::new(Arc::new(FixtureCensusApi::scripted(vec![])));
        assert_eq!(submitter.accept("  Show me population by county \n").unwrap(), "Show me population by county");
    }

    #[tokio::test]
    async fn test_answer_is_delivered() {
        let api = Arc::new(FixtureCensusApi::scripted(vec![ScriptedReply::answer("Kings is second", None)]));
        let mut submitter = QuerySubmitter::new(api.clone());
        let turn = turn_id();

        submitter.dispatch(turn, "Q".to_string()).unwrap();
        assert!(submitter.is_busy());

        match submitter.next_event().await {
            Some(SubmissionEvent::Answered { turn: t, question, envelope }) => {
                assert_eq!(t, turn);
                assert_eq!(question, "Q");
                assert_eq!(envelope.text_answer, "Kings is second");
            }
            other => panic!("expected answer, got {:?}", other),
        }
        assert!(!submitter.is_busy());
        assert_eq!(api.asked(), vec!["Q"]);
    }

    #[tokio::test]
    async fn test_busy_rejects_second_submission() {
        let api = Arc::new(FixtureCensusApi::scripted(vec![
            ScriptedReply::answer("one", None),
            ScriptedReply::answer("two", None),
        ]));
        let mut submitter = QuerySubmitter::new(api.clone());

        submitter.dispatch(turn_id(), "first".to_string()).unwrap();
        assert_eq!(submitter.accept("second"), Err(SubmitError::Busy));
        assert_eq!(submitter.dispatch(turn_id(), "second".to_string()), Err(SubmitError::Busy));

        submitter.next_event().await.unwrap();
        assert_eq!(api.asked(), vec!["first"]);
        assert!(submitter.accept("second").is_ok());
    }

    #[tokio::test]
    async fn test_failures_map_to_user_messages() {
        let api = Arc::new(FixtureCensusApi::scripted(vec![
            ScriptedReply::Remote {
                status: 422,
                detail: "Question must mention New York".to_string(),
            },
            ScriptedReply::Unreachable,
        ]));
        let mut submitter = QuerySubmitter::new(api);

        submitter.dispatch(turn_id(), "a".to_string()).unwrap();
        let Some(SubmissionEvent::Failed { error, .. }) = submitter.next_event().await else {
            panic!("expected failure");
        };
        assert_eq!(error.user_message(), "Question must mention New York");

        submitter.dispatch(turn_id(), "b".to_string()).unwrap();
        let Some(SubmissionEvent::Failed { error, .. }) = submitter.next_event().await else {
            panic!("expected failure");
        };
        assert_eq!(error.user_message(), GENERIC_FAILURE_MESSAGE);
    }

    #[tokio::test]
    async fn test_crashed_task_reports_failure() {
        let mut submitter = QuerySubmitter::new(Arc::new(PanickingApi));
        let turn = turn_id();

        submitter.dispatch(turn, "Show me population by county".to_string()).unwrap();
        match submitter.next_event().await {
            Some(SubmissionEvent::Failed { turn: t, question, error }) => {
                assert_eq!(t, turn);
                assert_eq!(question, "Show me population by county");
                assert!(matches!(error, ApiError::Interrupted));
                assert_eq!(error.user_message(), GENERIC_FAILURE_MESSAGE);
            }
            other => panic!("expected failure, got {:?}", other),
        }
        assert!(!submitter.is_busy());
        assert!(submitter.next_event().await.is_none());
    }

    #[tokio::test]
    async fn test_poll_reports_crashed_task() {
        let mut submitter = QuerySubmitter::new(Arc::new(PanickingApi));
        let turn = turn_id();
        submitter.dispatch(turn, "q".to_string()).unwrap();

        let event = loop {
            if let Some(event) = submitter.poll() {
                break event;
            }
            tokio::task::yield_now().await;
        };
        assert_eq!(event.turn(), turn);
        assert!(matches!(event, SubmissionEvent::Failed { error: ApiError::Interrupted, .. }));
        assert!(!submitter.is_busy());
    }

    #[test]
    fn test_poll_when_idle() {
        let mut submitter = QuerySubmitter::new(Arc::new(FixtureCensusApi::scripted(vec![])));
        assert!(submitter.poll().is_none());
    }
}
