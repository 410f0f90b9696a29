//! Conversation store
//!
//! An ordered, append-only log of question/answer turns. Turns are created
//! pending the moment a question is submitted and are fulfilled at most once.
//! They are never removed or reordered, so the log always reads in
//! submission order regardless of the order answers arrive in.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, warn};

use crate::payload::AnswerEnvelope;

/// Stable identifier of a turn within one log
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct TurnId(u64);

impl TurnId {
    pub fn as_u64(self) -> u64 {
        self.0
    }
}

impl fmt::Display for TurnId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Store errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    /// An answer arrived that no pending turn is waiting for
    #[error("no pending turn matches question '{question}'")]
    NoMatchingPendingTurn { question: String },

    /// The identified turn does not exist or was already answered
    #[error("turn {id} is not pending")]
    TurnNotPending { id: TurnId },
}

/// One question and its (possibly pending) answer
#[derive(Debug, Clone)]
pub struct ConversationTurn {
    pub id: TurnId,
    pub question: String,
    /// `None` while pending
    pub answer: Option<AnswerEnvelope>,
    pub submitted_at: DateTime<Utc>,
    pub answered_at: Option<DateTime<Utc>>,
}

impl ConversationTurn {
    pub fn is_pending(&self) -> bool {
        self.answer.is_none()
    }
}

/// Ordered log of turns, oldest first
#[derive(Debug, Default)]
pub struct ConversationLog {
    turns: Vec<ConversationTurn>,
    next_id: u64,
}

impl ConversationLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a pending turn for `question`
    pub fn append_pending(&mut self, question: impl Into<String>) -> TurnId {
        let id = TurnId(self.next_id);
        self.next_id += 1;

        let question = question.into();
        debug!(%id, %question, "ConversationLog::append_pending: called");
        self.turns.push(ConversationTurn {
            id,
            question,
            answer: None,
            submitted_at: Utc::now(),
            answered_at: None,
        });
        id
    }

    /// Fulfil the most recent pending turn whose question equals `question`
    ///
    /// Scans from the newest turn backwards. Identical questions pending at
    /// the same time are ambiguous here; [`fulfil_turn`](Self::fulfil_turn)
    /// avoids that by matching on the id handed out at submission.
    pub fn fulfil(&mut self, question: &str, envelope: AnswerEnvelope) -> Result<TurnId, StoreError> {
        debug!(%question, "ConversationLog::fulfil: called");
        let index = self
            .turns
            .iter()
            .rposition(|t| t.is_pending() && t.question == question)
            .ok_or_else(|| {
                warn!(%question, "fulfil: no matching pending turn");
                StoreError::NoMatchingPendingTurn {
                    question: question.to_string(),
                }
            })?;
        Ok(self.fulfil_at(index, envelope))
    }

    /// Fulfil the turn with the given id, if it is still pending
    pub fn fulfil_turn(&mut self, id: TurnId, envelope: AnswerEnvelope) -> Result<TurnId, StoreError> {
        debug!(%id, "ConversationLog::fulfil_turn: called");
        let index = self
            .index_of(id)
            .filter(|&i| self.turns[i].is_pending())
            .ok_or_else(|| {
                warn!(%id, "fulfil_turn: turn missing or already answered");
                StoreError::TurnNotPending { id }
            })?;
        Ok(self.fulfil_at(index, envelope))
    }

    /// The single mutation point for answers
    fn fulfil_at(&mut self, index: usize, envelope: AnswerEnvelope) -> TurnId {
        let turn = &mut self.turns[index];
        turn.answer = Some(envelope);
        turn.answered_at = Some(Utc::now());
        debug!(id = %turn.id, "ConversationLog::fulfil_at: turn fulfilled");
        turn.id
    }

    fn index_of(&self, id: TurnId) -> Option<usize> {
        // Ids are dense and assigned in append order
        let index = usize::try_from(id.0).ok()?;
        self.turns.get(index).filter(|t| t.id == id).map(|_| index)
    }

    /// All turns in submission order
    pub fn all_turns(&self) -> &[ConversationTurn] {
        &self.turns
    }

    pub fn get(&self, id: TurnId) -> Option<&ConversationTurn> {
        self.index_of(id).map(|i| &self.turns[i])
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    pub fn pending_count(&self) -> usize {
        self.turns.iter().filter(|t| t.is_pending()).count()
    }

    /// Most recently answered turn, by answer time
    pub fn last_fulfilled(&self) -> Option<&ConversationTurn> {
        self.turns
            .iter()
            .filter(|t| t.answered_at.is_some())
            .max_by_key(|t| t.answered_at)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn envelope(question: &str, text: &str) -> AnswerEnvelope {
        AnswerEnvelope::success(question, text, None)
    }

    #[test]
    fn test_append_then_fulfil_single_turn() {
        let mut log = ConversationLog::new();
        let id = log.append_pending("Q");
        assert_eq!(log.pending_count(), 1);

        let fulfilled = log.fulfil("Q", envelope("Q", "E")).unwrap();
        assert_eq!(fulfilled, id);

        let turns = log.all_turns();
        assert_eq!(turns.len(), 1);
        assert_eq!(turns[0].answer.as_ref().map(|a| a.text_answer.as_str()), Some("E"));
        assert!(turns[0].answered_at.is_some());
        assert_eq!(log.pending_count(), 0);
    }

    #[test]
    fn test_fulfil_without_pending_fails_and_mutates_nothing() {
        let mut log = ConversationLog::new();
        let err = log.fulfil("Q", envelope("Q", "E")).unwrap_err();
        assert_eq!(
            err,
            StoreError::NoMatchingPendingTurn {
                question: "Q".to_string()
            }
        );
        assert!(log.is_empty());

        log.append_pending("Other");
        assert!(log.fulfil("Q", envelope("Q", "E")).is_err());
        assert!(log.all_turns()[0].is_pending());
    }

    #[test]
    fn test_out_of_order_fulfilment_keeps_submission_order() {
        let mut log = ConversationLog::new();
        log.append_pending("A");
        log.append_pending("B");

        log.fulfil("B", envelope("B", "Eb")).unwrap();
        log.fulfil("A", envelope("A", "Ea")).unwrap();

        let turns: Vec<_> = log
            .all_turns()
            .iter()
            .map(|t| (t.question.as_str(), t.answer.as_ref().map(|a| a.text_answer.as_str())))
            .collect();
        assert_eq!(turns, vec![("A", Some("Ea")), ("B", Some("Eb"))]);
    }

    #[test]
    fn test_second_answer_for_same_question_is_rejected() {
        let mut log = ConversationLog::new();
        log.append_pending("Q");
        log.fulfil("Q", envelope("Q", "first")).unwrap();

        assert!(log.fulfil("Q", envelope("Q", "second")).is_err());
        assert_eq!(
            log.all_turns()[0].answer.as_ref().map(|a| a.text_answer.as_str()),
            Some("first")
        );
    }

    #[test]
    fn test_duplicate_text_matches_most_recent_pending() {
        let mut log = ConversationLog::new();
        let older = log.append_pending("Q");
        let newer = log.append_pending("Q");

        assert_eq!(log.fulfil("Q", envelope("Q", "1")).unwrap(), newer);
        assert_eq!(log.fulfil("Q", envelope("Q", "2")).unwrap(), older);
    }

    #[test]
    fn test_fulfil_turn_by_id_disambiguates() {
        let mut log = ConversationLog::new();
        let older = log.append_pending("Q");
        let _newer = log.append_pending("Q");

        log.fulfil_turn(older, envelope("Q", "for older")).unwrap();
        let turns = log.all_turns();
        assert!(!turns[0].is_pending());
        assert!(turns[1].is_pending());

        assert_eq!(
            log.fulfil_turn(older, envelope("Q", "again")),
            Err(StoreError::TurnNotPending { id: older })
        );
    }

    #[test]
    fn test_fulfil_turn_unknown_id() {
        let mut log = ConversationLog::new();
        let err = log.fulfil_turn(TurnId(7), envelope("Q", "E")).unwrap_err();
        assert!(matches!(err, StoreError::TurnNotPending { .. }));
    }

    #[test]
    fn test_last_fulfilled_follows_answer_time() {
        let mut log = ConversationLog::new();
        let a = log.append_pending("A");
        let b = log.append_pending("B");
        assert!(log.last_fulfilled().is_none());

        log.fulfil_turn(b, envelope("B", "b")).unwrap();
        assert_eq!(log.last_fulfilled().map(|t| t.id), Some(b));

        std::thread::sleep(std::time::Duration::from_millis(2));
        log.fulfil_turn(a, envelope("A", "a")).unwrap();
        assert_eq!(log.last_fulfilled().map(|t| t.id), Some(a));
    }

    #[test]
    fn test_get_and_ids() {
        let mut log = ConversationLog::new();
        let a = log.append_pending("A");
        let b = log.append_pending("B");
        assert!(a < b);
        assert_eq!(log.get(b).map(|t| t.question.as_str()), Some("B"));
        assert_eq!(a.to_string(), "#0");
    }
}
