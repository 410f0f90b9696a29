//! Payload model
//!
//! Typed answers coming back from the census answer service: the chart
//! payload (a tagged variant discriminated by `chart_type`) and the envelope
//! wrapping the text answer, the status and the optional payload.
//!
//! Decoding never fails on an unknown discriminant. Anything outside the
//! closed tag set becomes [`ChartPayload::Unsupported`], which keeps the raw
//! JSON so it can be shown and re-serialized unchanged.

use serde::de::{self, Deserializer};
use serde::ser::Serializer;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

/// Wire tag for bar payloads
pub const BAR_TAG: &str = "bar";

/// Wire tag for scatter payloads
pub const SCATTER_TAG: &str = "scatter";

/// Primary discriminant field name on the wire
const TAG_FIELD: &str = "chart_type";

/// Alternate discriminant field name accepted on decode
const ALT_TAG_FIELD: &str = "kind";

/// Detail used when the service reports an error without saying why
pub const MISSING_ERROR_DETAIL: &str = "The census data service reported an error without details.";

/// Errors raised while constructing a payload series
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PayloadError {
    #[error("bar series has {labels} labels but {values} values")]
    BarLengthMismatch { labels: usize, values: usize },

    #[error("scatter series has {labels} labels, {x_values} x values and {y_values} y values")]
    ScatterLengthMismatch {
        labels: usize,
        x_values: usize,
        y_values: usize,
    },
}

/// Ranked categories with one value each
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "BarSeriesWire")]
pub struct BarSeries {
    #[serde(rename = "labels")]
    category_labels: Vec<String>,
    values: Vec<f64>,
    x_axis_title: String,
    y_axis_title: String,
    #[serde(rename = "chart_title")]
    title: String,
}

#[derive(Deserialize)]
struct BarSeriesWire {
    labels: Vec<String>,
    values: Vec<f64>,
    #[serde(default)]
    x_axis_title: String,
    #[serde(default)]
    y_axis_title: String,
    #[serde(default)]
    chart_title: String,
}

impl TryFrom<BarSeriesWire> for BarSeries {
    type Error = PayloadError;

    fn try_from(wire: BarSeriesWire) -> Result<Self, Self::Error> {
        BarSeries::new(
            wire.labels,
            wire.values,
            wire.x_axis_title,
            wire.y_axis_title,
            wire.chart_title,
        )
    }
}

impl BarSeries {
    /// Build a bar series, rejecting label/value count mismatches
    pub fn new(
        category_labels: Vec<String>,
        values: Vec<f64>,
        x_axis_title: impl Into<String>,
        y_axis_title: impl Into<String>,
        title: impl Into<String>,
    ) -> Result<Self, PayloadError> {
        if category_labels.len() != values.len() {
            debug!(
                labels = category_labels.len(),
                values = values.len(),
                "BarSeries::new: length mismatch"
            );
            return Err(PayloadError::BarLengthMismatch {
                labels: category_labels.len(),
                values: values.len(),
            });
        }
        Ok(Self {
            category_labels,
            values,
            x_axis_title: x_axis_title.into(),
            y_axis_title: y_axis_title.into(),
            title: title.into(),
        })
    }

    pub fn category_labels(&self) -> &[String] {
        &self.category_labels
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    pub fn x_axis_title(&self) -> &str {
        &self.x_axis_title
    }

    pub fn y_axis_title(&self) -> &str {
        &self.y_axis_title
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    /// Number of categories
    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Label/value pairs in the order the service ranked them
    pub fn entries(&self) -> impl Iterator<Item = (&str, f64)> {
        self.category_labels
            .iter()
            .map(String::as_str)
            .zip(self.values.iter().copied())
    }
}

/// Labelled points on two numeric axes
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "ScatterSeriesWire")]
pub struct ScatterSeries {
    #[serde(rename = "labels")]
    point_labels: Vec<String>,
    x_values: Vec<f64>,
    y_values: Vec<f64>,
    x_axis_title: String,
    y_axis_title: String,
    #[serde(rename = "chart_title")]
    title: String,
}

#[derive(Deserialize)]
struct ScatterSeriesWire {
    labels: Vec<String>,
    x_values: Vec<f64>,
    y_values: Vec<f64>,
    #[serde(default)]
    x_axis_title: String,
    #[serde(default)]
    y_axis_title: String,
    #[serde(default)]
    chart_title: String,
}

impl TryFrom<ScatterSeriesWire> for ScatterSeries {
    type Error = PayloadError;

    fn try_from(wire: ScatterSeriesWire) -> Result<Self, Self::Error> {
        ScatterSeries::new(
            wire.labels,
            wire.x_values,
            wire.y_values,
            wire.x_axis_title,
            wire.y_axis_title,
            wire.chart_title,
        )
    }
}

impl ScatterSeries {
    /// Build a scatter series, rejecting mismatched label/x/y counts
    pub fn new(
        point_labels: Vec<String>,
        x_values: Vec<f64>,
        y_values: Vec<f64>,
        x_axis_title: impl Into<String>,
        y_axis_title: impl Into<String>,
        title: impl Into<String>,
    ) -> Result<Self, PayloadError> {
        if point_labels.len() != x_values.len() || point_labels.len() != y_values.len() {
            debug!(
                labels = point_labels.len(),
                x_values = x_values.len(),
                y_values = y_values.len(),
                "ScatterSeries::new: length mismatch"
            );
            return Err(PayloadError::ScatterLengthMismatch {
                labels: point_labels.len(),
                x_values: x_values.len(),
                y_values: y_values.len(),
            });
        }
        Ok(Self {
            point_labels,
            x_values,
            y_values,
            x_axis_title: x_axis_title.into(),
            y_axis_title: y_axis_title.into(),
            title: title.into(),
        })
    }

    pub fn point_labels(&self) -> &[String] {
        &self.point_labels
    }

    pub fn x_values(&self) -> &[f64] {
        &self.x_values
    }

    pub fn y_values(&self) -> &[f64] {
        &self.y_values
    }

    pub fn x_axis_title(&self) -> &str {
        &self.x_axis_title
    }

    pub fn y_axis_title(&self) -> &str {
        &self.y_axis_title
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    /// Number of points
    pub fn len(&self) -> usize {
        self.point_labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.point_labels.is_empty()
    }

    /// (label, x, y) triples in payload order
    pub fn points(&self) -> impl Iterator<Item = (&str, f64, f64)> {
        self.point_labels
            .iter()
            .zip(self.x_values.iter().zip(self.y_values.iter()))
            .map(|(label, (x, y))| (label.as_str(), *x, *y))
    }
}

/// Structured chart data attached to an answer
#[derive(Debug, Clone, PartialEq)]
pub enum ChartPayload {
    Bar(BarSeries),
    Scatter(ScatterSeries),
    /// Discriminant outside the closed tag set (or missing)
    Unsupported {
        /// Raw discriminant as received; empty when absent
        kind: String,
        /// Original JSON object
        raw: serde_json::Value,
    },
}

impl ChartPayload {
    pub fn is_bar(&self) -> bool {
        matches!(self, Self::Bar(_))
    }

    pub fn is_scatter(&self) -> bool {
        matches!(self, Self::Scatter(_))
    }

    pub fn is_unsupported(&self) -> bool {
        matches!(self, Self::Unsupported { .. })
    }

    /// The discriminant as it appears on the wire
    pub fn kind(&self) -> &str {
        match self {
            Self::Bar(_) => BAR_TAG,
            Self::Scatter(_) => SCATTER_TAG,
            Self::Unsupported { kind, .. } => kind,
        }
    }

    /// Chart title, when the variant carries one
    pub fn title(&self) -> Option<&str> {
        match self {
            Self::Bar(bar) => Some(bar.title()),
            Self::Scatter(scatter) => Some(scatter.title()),
            Self::Unsupported { .. } => None,
        }
    }

    /// Decode from a JSON value, routing on the discriminant only
    pub fn from_value(value: serde_json::Value) -> Result<Self, serde_json::Error> {
        let kind = value
            .get(TAG_FIELD)
            .or_else(|| value.get(ALT_TAG_FIELD))
            .and_then(serde_json::Value::as_str)
            .unwrap_or_default()
            .to_string();
        debug!(%kind, "ChartPayload::from_value: called");

        match kind.as_str() {
            BAR_TAG => Ok(Self::Bar(serde_json::from_value(value)?)),
            SCATTER_TAG => Ok(Self::Scatter(serde_json::from_value(value)?)),
            _ => Ok(Self::Unsupported { kind, raw: value }),
        }
    }
}

impl From<BarSeries> for ChartPayload {
    fn from(series: BarSeries) -> Self {
        Self::Bar(series)
    }
}

impl From<ScatterSeries> for ChartPayload {
    fn from(series: ScatterSeries) -> Self {
        Self::Scatter(series)
    }
}

#[derive(Serialize)]
#[serde(tag = "chart_type")]
enum TaggedRef<'a> {
    #[serde(rename = "bar")]
    Bar(&'a BarSeries),
    #[serde(rename = "scatter")]
    Scatter(&'a ScatterSeries),
}

impl Serialize for ChartPayload {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Bar(bar) => TaggedRef::Bar(bar).serialize(serializer),
            Self::Scatter(scatter) => TaggedRef::Scatter(scatter).serialize(serializer),
            Self::Unsupported { raw, .. } => raw.serialize(serializer),
        }
    }
}

impl<'de> Deserialize<'de> for ChartPayload {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = serde_json::Value::deserialize(deserializer)?;
        Self::from_value(value).map_err(de::Error::custom)
    }
}

/// Outcome reported by the service for a question
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AnswerStatus {
    Success,
    Error { detail: String },
}

/// Full response to a question: text, status and optional chart
#[derive(Debug, Clone, PartialEq)]
pub struct AnswerEnvelope {
    pub text_answer: String,
    pub payload: Option<ChartPayload>,
    pub original_question: String,
    pub status: AnswerStatus,
}

impl AnswerEnvelope {
    pub fn success(
        original_question: impl Into<String>,
        text_answer: impl Into<String>,
        payload: Option<ChartPayload>,
    ) -> Self {
        Self {
            text_answer: text_answer.into(),
            payload,
            original_question: original_question.into(),
            status: AnswerStatus::Success,
        }
    }

    pub fn error(original_question: impl Into<String>, text_answer: impl Into<String>, detail: impl Into<String>) -> Self {
        Self {
            text_answer: text_answer.into(),
            payload: None,
            original_question: original_question.into(),
            status: AnswerStatus::Error { detail: detail.into() },
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self.status, AnswerStatus::Success)
    }

    /// Present iff the status is `Error`
    pub fn error_detail(&self) -> Option<&str> {
        match &self.status {
            AnswerStatus::Success => None,
            AnswerStatus::Error { detail } => Some(detail),
        }
    }
}

/// Request body for `POST /ask`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AskRequest {
    pub question: String,
}

/// Wire status tag
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WireStatus {
    Success,
    Error,
}

/// Success body of `POST /ask`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AskResponse {
    pub text_answer: String,
    #[serde(default)]
    pub data: Option<ChartPayload>,
    #[serde(default)]
    pub question: String,
    pub status: WireStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Body of a non-2xx response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiErrorBody {
    pub detail: String,
}

impl AskResponse {
    /// Convert into an envelope for `asked`, the question as submitted
    ///
    /// The echoed `question` field is only used when the submitted text is
    /// unavailable, so fulfilment always keys on what the user actually sent.
    pub fn into_envelope(self, asked: &str) -> AnswerEnvelope {
        let original_question = if asked.is_empty() { self.question } else { asked.to_string() };
        let status = match self.status {
            WireStatus::Success => AnswerStatus::Success,
            WireStatus::Error => AnswerStatus::Error {
                detail: self
                    .error
                    .filter(|e| !e.trim().is_empty())
                    .unwrap_or_else(|| MISSING_ERROR_DETAIL.to_string()),
            },
        };
        AnswerEnvelope {
            text_answer: self.text_answer,
            payload: self.data,
            original_question,
            status,
        }
    }

    /// Wire form of an envelope
    pub fn from_envelope(envelope: &AnswerEnvelope) -> Self {
        let (status, error) = match &envelope.status {
            AnswerStatus::Success => (WireStatus::Success, None),
            AnswerStatus::Error { detail } => (WireStatus::Error, Some(detail.clone())),
        };
        Self {
            text_answer: envelope.text_answer.clone(),
            data: envelope.payload.clone(),
            question: envelope.original_question.clone(),
            status,
            error,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn county_bar() -> BarSeries {
        BarSeries::new(
            vec!["Suffolk".into(), "Nassau".into()],
            vec![89283.0, 87658.0],
            "County",
            "Median Income ($)",
            "Top Counties",
        )
        .unwrap()
    }

    #[test]
    fn test_predicates_are_exclusive() {
        let bar = ChartPayload::Bar(county_bar());
        assert!(bar.is_bar());
        assert!(!bar.is_scatter());

        let scatter = ChartPayload::Scatter(
            ScatterSeries::new(vec!["Erie".into()], vec![35.6], vec![54320.0], "x", "y", "t").unwrap(),
        );
        assert!(scatter.is_scatter());
        assert!(!scatter.is_bar());

        let other = ChartPayload::from_value(json!({"chart_type": "pie"})).unwrap();
        assert!(!other.is_bar());
        assert!(!other.is_scatter());
        assert!(other.is_unsupported());
        assert_eq!(other.kind(), "pie");
    }

    #[test]
    fn test_bar_length_mismatch_rejected() {
        let err = BarSeries::new(vec!["a".into()], vec![1.0, 2.0], "x", "y", "t").unwrap_err();
        assert_eq!(err, PayloadError::BarLengthMismatch { labels: 1, values: 2 });
    }

    #[test]
    fn test_scatter_length_mismatch_rejected() {
        let err = ScatterSeries::new(vec!["a".into(), "b".into()], vec![1.0, 2.0], vec![1.0], "x", "y", "t")
            .unwrap_err();
        assert!(matches!(err, PayloadError::ScatterLengthMismatch { y_values: 1, .. }));
    }

    #[test]
    fn test_decode_bar_from_wire() {
        let payload: ChartPayload = serde_json::from_value(json!({
            "chart_type": "bar",
            "values": [1629054, 1596273],
            "labels": ["New York", "Kings"],
            "x_axis_title": "County",
            "y_axis_title": "Population",
            "chart_title": "Most Populous"
        }))
        .unwrap();

        let ChartPayload::Bar(bar) = payload else {
            panic!("expected bar payload");
        };
        assert_eq!(bar.category_labels(), &["New York".to_string(), "Kings".to_string()]);
        assert_eq!(bar.values(), &[1629054.0, 1596273.0]);
        assert_eq!(bar.title(), "Most Populous");
    }

    #[test]
    fn test_decode_accepts_kind_field() {
        let payload = ChartPayload::from_value(json!({
            "kind": "scatter",
            "labels": ["Erie"],
            "x_values": [35.6],
            "y_values": [54320],
        }))
        .unwrap();
        assert!(payload.is_scatter());
    }

    #[test]
    fn test_decode_mismatched_bar_fails() {
        let result: Result<ChartPayload, _> = serde_json::from_value(json!({
            "chart_type": "bar",
            "values": [1, 2, 3],
            "labels": ["a"],
        }));
        assert!(result.is_err());
    }

    #[test]
    fn test_missing_tag_is_unsupported() {
        let payload = ChartPayload::from_value(json!({"values": [1], "labels": ["a"]})).unwrap();
        assert!(payload.is_unsupported());
        assert_eq!(payload.kind(), "");
    }

    #[test]
    fn test_unsupported_reserializes_raw() {
        let raw = json!({"chart_type": "heatmap", "cells": [[1, 2]]});
        let payload = ChartPayload::from_value(raw.clone()).unwrap();
        assert_eq!(serde_json::to_value(&payload).unwrap(), raw);
    }

    #[test]
    fn test_serialize_uses_wire_names() {
        let value = serde_json::to_value(ChartPayload::Bar(county_bar())).unwrap();
        assert_eq!(value["chart_type"], "bar");
        assert_eq!(value["labels"][0], "Suffolk");
        assert_eq!(value["chart_title"], "Top Counties");
    }

    #[test]
    fn test_error_status_carries_detail() {
        let response: AskResponse = serde_json::from_value(json!({
            "text_answer": "Sorry",
            "data": null,
            "question": "q",
            "status": "error",
            "error": "table missing"
        }))
        .unwrap();
        let envelope = response.into_envelope("q");
        assert!(!envelope.is_success());
        assert_eq!(envelope.error_detail(), Some("table missing"));
    }

    #[test]
    fn test_error_status_without_detail_gets_placeholder() {
        let response: AskResponse =
            serde_json::from_value(json!({"text_answer": "Sorry", "status": "error"})).unwrap();
        let envelope = response.into_envelope("q");
        assert_eq!(envelope.error_detail(), Some(MISSING_ERROR_DETAIL));
    }

    #[test]
    fn test_success_ignores_error_field() {
        let response: AskResponse = serde_json::from_value(json!({
            "text_answer": "ok",
            "data": null,
            "question": "echo",
            "status": "success",
            "error": "stale"
        }))
        .unwrap();
        let envelope = response.into_envelope("asked");
        assert!(envelope.is_success());
        assert_eq!(envelope.error_detail(), None);
        assert_eq!(envelope.original_question, "asked");
    }

    #[test]
    fn test_envelope_with_unknown_chart_decodes() {
        let response: AskResponse = serde_json::from_value(json!({
            "text_answer": "see map",
            "data": {"chart_type": "choropleth"},
            "question": "q",
            "status": "success"
        }))
        .unwrap();
        let envelope = response.into_envelope("q");
        assert_eq!(envelope.payload.map(|p| p.kind().to_string()), Some("choropleth".to_string()));
    }
}
