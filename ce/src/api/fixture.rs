//! Offline fixture service
//!
//! Answers from a small built-in table of New York county answers so the
//! client can be developed and demoed without the backend. Also supports a
//! scripted mode that replays a fixed queue of replies for tests.

use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use rand::Rng;
use tracing::debug;

use super::{ApiError, CensusApi};
use crate::config::MockConfig;
use crate::payload::{AnswerEnvelope, BarSeries, ChartPayload, PayloadError, ScatterSeries};

/// Starter questions shown on the empty screen
pub const SUGGESTED_PROMPTS: [&str; 5] = [
    "Show me population by county",
    "Where are the richest areas in New York?",
    "Does income correlate with education?",
    "Where should I buy a home in New York?",
    "Where should I open a grocery store in New York?",
];

/// One canned answer
#[derive(Debug, Clone)]
struct Fixture {
    keywords: &'static [&'static str],
    text_answer: &'static str,
    payload: fn() -> Result<ChartPayload, PayloadError>,
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

fn income_by_county() -> Result<ChartPayload, PayloadError> {
    BarSeries::new(
        strings(&["Suffolk", "Nassau", "Westchester", "Rockland", "Putnam"]),
        vec![89283.0, 87658.0, 78456.0, 72341.0, 68922.0],
        "County",
        "Median Income ($)",
        "Top 5 NY Counties by Median Household Income",
    )
    .map(ChartPayload::Bar)
}

fn population_by_county() -> Result<ChartPayload, PayloadError> {
    BarSeries::new(
        strings(&["New York", "Kings", "Queens", "Bronx", "Nassau"]),
        vec![1629054.0, 1596273.0, 1472654.0, 1385108.0, 953671.0],
        "County",
        "Population",
        "Top 5 Most Populous NY Counties",
    )
    .map(ChartPayload::Bar)
}

fn income_vs_education() -> Result<ChartPayload, PayloadError> {
    ScatterSeries::new(
        strings(&[
            "Suffolk",
            "Nassau",
            "Westchester",
            "Rockland",
            "Putnam",
            "Erie",
            "Monroe",
            "Onondaga",
        ]),
        vec![45.2, 52.8, 38.9, 41.7, 49.3, 35.6, 44.1, 39.8],
        vec![89283.0, 87658.0, 78456.0, 72341.0, 68922.0, 54320.0, 65780.0, 58940.0],
        "College Graduates (%)",
        "Median Income ($)",
        "Income vs Education Level by County",
    )
    .map(ChartPayload::Scatter)
}

fn housing_vs_density() -> Result<ChartPayload, PayloadError> {
    ScatterSeries::new(
        strings(&[
            "New York", "Kings", "Queens", "Bronx", "Nassau", "Hamilton", "Essex", "Oneida",
        ]),
        vec![72033.0, 37137.0, 21460.0, 34653.0, 4832.0, 1390.0, 2256.0, 8847.0],
        vec![2850.0, 1890.0, 1650.0, 2100.0, 980.0, 750.0, 820.0, 1250.0],
        "Population Density (per sq mile)",
        "Median Home Value ($1000s)",
        "Housing Costs vs Population Density",
    )
    .map(ChartPayload::Scatter)
}

// Order matters: the first fixture whose keyword appears wins.
const FIXTURES: [Fixture; 4] = [
    Fixture {
        keywords: &["education", "college", "correlate"],
        text_answer: "There's a strong positive correlation between median household income and education level \
                      across NY counties. Counties with higher percentages of college graduates tend to have \
                      significantly higher median incomes, with correlation coefficients showing r > 0.75.",
        payload: income_vs_education,
    },
    Fixture {
        keywords: &["density", "housing", "home", "house"],
        text_answer: "Population density and housing costs show a clear relationship in NY counties. More densely \
                      populated areas like NYC boroughs command higher housing prices, while rural counties with \
                      lower density have more affordable housing markets.",
        payload: housing_vs_density,
    },
    Fixture {
        keywords: &["population", "populous", "people"],
        text_answer: "New York County (Manhattan) has the highest population with 1,629,054 residents, followed by \
                      Kings County (Brooklyn) with 1,596,273 residents. These urban counties represent the most \
                      densely populated areas in the state.",
        payload: population_by_county,
    },
    Fixture {
        keywords: &["income", "richest", "wealth", "earn"],
        text_answer: "Suffolk County has the highest median household income in New York at $89,283, followed by \
                      Nassau County at $87,658. These counties on Long Island consistently rank among the highest \
                      income areas in the state.",
        payload: income_by_county,
    },
];

/// A reply in scripted mode
#[derive(Debug, Clone)]
pub enum ScriptedReply {
    /// Successful envelope with this text and payload
    Answer {
        text_answer: String,
        payload: Option<ChartPayload>,
    },
    /// Envelope whose status is `Error`
    FailedAnswer { text_answer: String, detail: String },
    /// Structured non-2xx error
    Remote { status: u16, detail: String },
    /// Connectivity failure
    Unreachable,
}

impl ScriptedReply {
    pub fn answer(text_answer: impl Into<String>, payload: Option<ChartPayload>) -> Self {
        Self::Answer {
            text_answer: text_answer.into(),
            payload,
        }
    }

    fn into_result(self, question: &str) -> Result<AnswerEnvelope, ApiError> {
        match self {
            Self::Answer { text_answer, payload } => Ok(AnswerEnvelope::success(question, text_answer, payload)),
            Self::FailedAnswer { text_answer, detail } => Ok(AnswerEnvelope::error(question, text_answer, detail)),
            Self::Remote { status, detail } => Err(ApiError::Remote { status, detail }),
            Self::Unreachable => Err(ApiError::InvalidResponse("connection refused".to_string())),
        }
    }
}

enum Mode {
    Fixtures { min_delay: Duration, max_delay: Duration },
    Scripted(Mutex<VecDeque<ScriptedReply>>),
}

/// Fixture-backed implementation of [`CensusApi`]
pub struct FixtureCensusApi {
    mode: Mode,
    asked: Mutex<Vec<String>>,
}

impl FixtureCensusApi {
    /// Built-in fixtures with latency from configuration
    pub fn from_config(config: &MockConfig) -> Self {
        debug!(?config, "FixtureCensusApi::from_config: called");
        Self {
            mode: Mode::Fixtures {
                min_delay: Duration::from_millis(config.min_delay_ms),
                max_delay: Duration::from_millis(config.max_delay_ms.max(config.min_delay_ms)),
            },
            asked: Mutex::new(Vec::new()),
        }
    }

    /// Replay `replies` in order, one per question, without delay
    pub fn scripted(replies: Vec<ScriptedReply>) -> Self {
        debug!(reply_count = replies.len(), "FixtureCensusApi::scripted: called");
        Self {
            mode: Mode::Scripted(Mutex::new(replies.into())),
            asked: Mutex::new(Vec::new()),
        }
    }

    /// Questions received so far, in call order
    pub fn asked(&self) -> Vec<String> {
        self.asked.lock().map(|a| a.clone()).unwrap_or_default()
    }

    /// Number of questions received so far
    pub fn call_count(&self) -> usize {
        self.asked.lock().map(|a| a.len()).unwrap_or_default()
    }

    /// Index of the fixture whose keywords match, if any
    fn match_fixture(question: &str) -> Option<usize> {
        let question = question.to_lowercase();
        FIXTURES
            .iter()
            .position(|f| f.keywords.iter().any(|k| question.contains(k)))
    }

    fn fixture_envelope(index: usize, question: &str) -> Result<AnswerEnvelope, ApiError> {
        let fixture = &FIXTURES[index % FIXTURES.len()];
        let payload = (fixture.payload)().map_err(|e| ApiError::InvalidResponse(e.to_string()))?;
        Ok(AnswerEnvelope::success(question, fixture.text_answer, Some(payload)))
    }
}

#[async_trait]
impl CensusApi for FixtureCensusApi {
    async fn ask(&self, question: &str) -> Result<AnswerEnvelope, ApiError> {
        debug!(%question, "FixtureCensusApi::ask: called");
        if let Ok(mut asked) = self.asked.lock() {
            asked.push(question.to_string());
        }

        match &self.mode {
            Mode::Fixtures { min_delay, max_delay } => {
                // ThreadRng is not Send; keep it out of the await
                let (index, delay) = {
                    let mut rng = rand::rng();
                    let index = Self::match_fixture(question).unwrap_or_else(|| rng.random_range(0..FIXTURES.len()));
                    let delay = if max_delay > min_delay {
                        rng.random_range(*min_delay..=*max_delay)
                    } else {
                        *min_delay
                    };
                    (index, delay)
                };
                debug!(index, delay_ms = delay.as_millis() as u64, "FixtureCensusApi::ask: fixture selected");
                if !delay.is_zero() {
                    tokio::time::sleep(delay).await;
                }
                Self::fixture_envelope(index, question)
            }
            Mode::Scripted(replies) => {
                let reply = replies.lock().ok().and_then(|mut r| r.pop_front());
                match reply {
                    Some(reply) => reply.into_result(question),
                    None => {
                        debug!("FixtureCensusApi::ask: no more scripted replies");
                        Err(ApiError::InvalidResponse("No more scripted replies".to_string()))
                    }
                }
            }
        }
    }

    fn name(&self) -> &'static str {
        "fixture"
    }
}
