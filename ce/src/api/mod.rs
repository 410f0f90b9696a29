//! Census answer service clients
//!
//! The answer service is an external collaborator reached through a single
//! request/response contract (`POST /ask`). Everything here speaks that
//! contract: the HTTP client for the real service and the fixture client
//! used for offline development and tests.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::debug;

mod error;
mod fixture;
mod http;

pub use error::{ApiError, GENERIC_FAILURE_MESSAGE};
pub use fixture::{FixtureCensusApi, SUGGESTED_PROMPTS, ScriptedReply};
pub use http::HttpCensusApi;

use crate::config::Config;
use crate::payload::AnswerEnvelope;

/// A service that answers natural-language questions about the dataset
///
/// Each call is independent; the service keeps no conversation state.
#[async_trait]
pub trait CensusApi: Send + Sync {
    /// Ask one question and wait for the envelope
    async fn ask(&self, question: &str) -> Result<AnswerEnvelope, ApiError>;

    /// Short name for logs and the header
    fn name(&self) -> &'static str;
}

/// Create the client selected by configuration
pub fn create_client(config: &Config) -> Result<Arc<dyn CensusApi>, ApiError> {
    debug!(mock = config.mock.enabled, base_url = %config.api.base_url, "create_client: called");
    if config.mock.enabled {
        debug!("create_client: creating fixture client");
        Ok(Arc::new(FixtureCensusApi::from_config(&config.mock)))
    } else {
        debug!("create_client: creating HTTP client");
        Ok(Arc::new(HttpCensusApi::from_config(&config.api)?))
    }
}
