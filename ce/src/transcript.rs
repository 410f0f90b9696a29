//! Conversation transcript for debugging
//!
//! When enabled via config (debug.log-conversations = true), every question,
//! answer, failure and orphaned answer is appended to a JSONL file under
//! `<data_local_dir>/census-explorer/conversations/`. The file is only ever
//! written; nothing reads it back.

use std::fs::{self, File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, error, warn};
use uuid::Uuid;

use crate::conversation::TurnId;
use crate::payload::AnswerEnvelope;

/// One line of the transcript
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranscriptEntry {
    pub timestamp: DateTime<Utc>,
    /// Identifies the client session the entry belongs to
    pub session: Uuid,
    pub entry: EntryKind,
}

/// Type of transcript entry
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum EntryKind {
    SessionStart {
        client: String,
    },
    Question {
        turn: u64,
        question: String,
    },
    Answer {
        turn: u64,
        question: String,
        status: String,
        text_answer: String,
        /// Discriminant of the attached chart, if any
        chart_type: Option<String>,
    },
    /// The request failed; the turn stays pending
    Failure {
        turn: u64,
        question: String,
        message: String,
    },
    /// An answer that matched no pending turn
    Orphan {
        question: String,
        text_answer: String,
    },
    SessionEnd,
}

/// JSONL transcript writer
pub struct Transcript {
    writer: Option<BufWriter<File>>,
    path: Option<PathBuf>,
    session: Uuid,
}

impl Transcript {
    /// A transcript that writes nothing
    pub fn disabled() -> Self {
        Self {
            writer: None,
            path: None,
            session: Uuid::now_v7(),
        }
    }

    /// Start a transcript in the default conversations directory
    pub fn enabled(client: &str) -> Self {
        match Self::conversations_dir() {
            Some(dir) => Self::enabled_in(&dir, client),
            None => {
                warn!("No local data directory; conversation transcript disabled");
                Self::disabled()
            }
        }
    }

    /// Start a transcript in `dir`
    ///
    /// Failing to open the file disables the transcript instead of failing
    /// the session.
    pub fn enabled_in(dir: &Path, client: &str) -> Self {
        let mut transcript = Self::disabled();
        if let Err(e) = transcript.start_session(dir, client) {
            error!("Failed to start conversation transcript: {}", e);
        }
        transcript
    }

    pub fn is_enabled(&self) -> bool {
        self.writer.is_some()
    }

    /// File being written, when enabled
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    fn start_session(&mut self, dir: &Path, client: &str) -> std::io::Result<()> {
        fs::create_dir_all(dir)?;

        let timestamp = Utc::now().format("%Y-%m-%dT%H-%M-%S");
        let path = dir.join(format!("conversation-{}.jsonl", timestamp));
        let file = OpenOptions::new().create(true).append(true).open(&path)?;

        self.writer = Some(BufWriter::new(file));
        self.path = Some(path.clone());
        debug!(session = %self.session, "Started conversation transcript at: {}", path.display());

        self.log(EntryKind::SessionStart {
            client: client.to_string(),
        });
        Ok(())
    }

    fn conversations_dir() -> Option<PathBuf> {
        dirs::data_local_dir().map(|dir| dir.join("census-explorer").join("conversations"))
    }

    pub fn log_question(&mut self, turn: TurnId, question: &str) {
        self.log(EntryKind::Question {
            turn: turn.as_u64(),
            question: question.to_string(),
        });
    }

    pub fn log_answer(&mut self, turn: TurnId, envelope: &AnswerEnvelope) {
        let status = match envelope.error_detail() {
            None => "success".to_string(),
            Some(detail) => format!("error: {}", detail),
        };
        self.log(EntryKind::Answer {
            turn: turn.as_u64(),
            question: envelope.original_question.clone(),
            status,
            text_answer: envelope.text_answer.clone(),
            chart_type: envelope.payload.as_ref().map(|p| p.kind().to_string()),
        });
    }

    pub fn log_failure(&mut self, turn: TurnId, question: &str, message: &str) {
        self.log(EntryKind::Failure {
            turn: turn.as_u64(),
            question: question.to_string(),
            message: message.to_string(),
        });
    }

    pub fn log_orphan(&mut self, envelope: &AnswerEnvelope) {
        self.log(EntryKind::Orphan {
            question: envelope.original_question.clone(),
            text_answer: envelope.text_answer.clone(),
        });
    }

    fn log(&mut self, entry: EntryKind) {
        let Some(writer) = &mut self.writer else {
            return;
        };

        let line = TranscriptEntry {
            timestamp: Utc::now(),
            session: self.session,
            entry,
        };

        match serde_json::to_string(&line) {
            Ok(json) => {
                if let Err(e) = writeln!(writer, "{}", json) {
                    warn!("Failed to write transcript entry: {}", e);
                }
                // Flush per entry so a crash still leaves a readable file
                if let Err(e) = writer.flush() {
                    warn!("Failed to flush transcript: {}", e);
                }
            }
            Err(e) => {
                warn!("Failed to serialize transcript entry: {}", e);
            }
        }
    }
}

impl Drop for Transcript {
    fn drop(&mut self) {
        if self.writer.is_some() {
            self.log(EntryKind::SessionEnd);
            if let Some(path) = &self.path {
                debug!("Conversation transcript saved to: {}", path.display());
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::conversation::ConversationLog;
    use tempfile::TempDir;

    fn read_entries(path: &Path) -> Vec<TranscriptEntry> {
        fs::read_to_string(path)
            .unwrap()
            .lines()
            .map(|line| serde_json::from_str(line).unwrap())
            .collect()
    }

    #[test]
    fn test_disabled_writes_nothing() {
        let mut transcript = Transcript::disabled();
        transcript.log_question(ConversationLog::new().append_pending("Q"), "Q");
        assert!(!transcript.is_enabled());
        assert!(transcript.path().is_none());
    }

    #[test]
    fn test_entries_are_appended_as_jsonl() {
        let temp = TempDir::new().unwrap();
        let mut log = ConversationLog::new();
        let turn = log.append_pending("Show me population by county");

        let path = {
            let mut transcript = Transcript::enabled_in(temp.path(), "fixture");
            assert!(transcript.is_enabled());
            transcript.log_question(turn, "Show me population by county");
            transcript.log_answer(
                turn,
                &AnswerEnvelope::error("Show me population by county", "Sorry", "table missing"),
            );
            transcript.log_failure(turn, "Show me population by county", "timeout");
            transcript.path().unwrap().to_path_buf()
        };

        let entries = read_entries(&path);
        assert_eq!(entries.len(), 5);
        assert!(matches!(entries[0].entry, EntryKind::SessionStart { .. }));
        assert!(matches!(entries[1].entry, EntryKind::Question { turn: 0, .. }));
        match &entries[2].entry {
            EntryKind::Answer { status, chart_type, .. } => {
                assert_eq!(status, "error: table missing");
                assert!(chart_type.is_none());
            }
            other => panic!("expected answer entry, got {:?}", other),
        }
        assert!(matches!(entries[4].entry, EntryKind::SessionEnd));
        assert!(entries.iter().all(|e| e.session == entries[0].session));
    }
}
