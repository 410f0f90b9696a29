//! HTTP client for the census answer service

use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;
use tracing::{debug, warn};

use super::{ApiError, CensusApi};
use crate::config::ApiConfig;
use crate::payload::{AnswerEnvelope, ApiErrorBody, AskRequest, AskResponse};

/// Client for `POST <base-url>/ask`
pub struct HttpCensusApi {
    base_url: String,
    http: Client,
    timeout: Duration,
}

impl HttpCensusApi {
    /// Create a new client from configuration
    pub fn from_config(config: &ApiConfig) -> Result<Self, ApiError> {
        debug!(?config, "HttpCensusApi::from_config: called");
        let timeout = Duration::from_millis(config.timeout_ms);
        let http = Client::builder().timeout(timeout).build().map_err(ApiError::Network)?;

        Ok(Self {
            base_url: config.base_url.trim_end_matches('/').to_string(),
            http,
            timeout,
        })
    }

    fn ask_url(&self) -> String {
        format!("{}/ask", self.base_url)
    }

    /// Map a non-2xx body to an error
    ///
    /// Only a well-formed `{"detail": ...}` body counts as a structured
    /// error; anything else is treated as an unusable response.
    fn error_from_body(status: u16, body: &str) -> ApiError {
        match serde_json::from_str::<ApiErrorBody>(body) {
            Ok(err) => {
                debug!(status, detail = %err.detail, "error_from_body: structured error");
                ApiError::Remote {
                    status,
                    detail: err.detail,
                }
            }
            Err(e) => {
                debug!(status, error = %e, "error_from_body: unstructured error body");
                ApiError::InvalidResponse(format!("HTTP {} with unparsable body", status))
            }
        }
    }

    /// Decode a 2xx body into an envelope for `question`
    fn envelope_from_body(question: &str, body: &str) -> Result<AnswerEnvelope, ApiError> {
        let response: AskResponse =
            serde_json::from_str(body).map_err(|e| ApiError::InvalidResponse(e.to_string()))?;
        Ok(response.into_envelope(question))
    }
}

#[async_trait]
impl CensusApi for HttpCensusApi {
    async fn ask(&self, question: &str) -> Result<AnswerEnvelope, ApiError> {
        let url = self.ask_url();
        debug!(%url, question_len = question.len(), "HttpCensusApi::ask: called");

        let request = AskRequest {
            question: question.to_string(),
        };

        let response = self.http.post(&url).json(&request).send().await.map_err(|e| {
            if e.is_timeout() {
                warn!(error = %e, "ask: request timed out");
                ApiError::Timeout(self.timeout)
            } else {
                warn!(error = %e, "ask: network error");
                ApiError::Network(e)
            }
        })?;

        let status = response.status();
        let body = response.text().await.map_err(ApiError::Network)?;
        debug!(status = status.as_u16(), body_len = body.len(), "HttpCensusApi::ask: response");

        if !status.is_success() {
            return Err(Self::error_from_body(status.as_u16(), &body));
        }

        Self::envelope_from_body(question, &body)
    }

    fn name(&self) -> &'static str {
        "http"
    }
}
