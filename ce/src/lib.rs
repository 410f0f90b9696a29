//! Census Explorer - conversational client for regional census data
//!
//! Users type natural-language questions about New York census data. Each
//! question goes to an external answer service, which replies with a text
//! answer and optionally a chart payload. Answers are shown as a running
//! conversation next to the most recent chart and its data table.
//!
//! # Modules
//!
//! - [`payload`] - Chart payloads and the answer envelope
//! - [`conversation`] - Ordered question/answer store
//! - [`render`] - Payload to chart and table views
//! - [`api`] - Answer service clients (HTTP and fixtures)
//! - [`submit`] - Single-flight question dispatch
//! - [`session`] - Submission flow, layout and displayed chart
//! - [`tui`] - Terminal interface
//! - [`config`] - Configuration types and loading
//! - [`cli`] - Command-line interface

pub mod api;
pub mod cli;
pub mod config;
pub mod conversation;
pub mod payload;
pub mod render;
pub mod session;
pub mod submit;
pub mod transcript;
pub mod tui;

// Re-export commonly used types
pub use api::{ApiError, CensusApi, FixtureCensusApi, HttpCensusApi, SUGGESTED_PROMPTS, create_client};
pub use config::Config;
pub use conversation::{ConversationLog, ConversationTurn, StoreError, TurnId};
pub use payload::{AnswerEnvelope, AnswerStatus, BarSeries, ChartPayload, ScatterSeries};
pub use render::{RenderedView, render};
pub use session::{Layout, SessionController};
pub use submit::SubmitError;
pub use transcript::Transcript;
