//! Detector contract and span validation.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use thiserror::Error;

/// Category tags used across the pipeline.
pub mod categories {
    pub const PERSON: &str = "PERSON";
    pub const PHONE_NUMBER: &str = "PHONE_NUMBER";
    pub const EMAIL_ADDRESS: &str = "EMAIL_ADDRESS";
    pub const US_SSN: &str = "US_SSN";
    pub const CREDIT_CARD: &str = "CREDIT_CARD";
    pub const IP_ADDRESS: &str = "IP_ADDRESS";
    /// Geopolitical entity (countries, cities, states).
    pub const GPE: &str = "GPE";
    /// Nationalities, religious or political groups.
    pub const NRP: &str = "NRP";
    /// Caller-supplied custom secrets.
    pub const CONFIDENTIAL: &str = "CONFIDENTIAL";
    /// URLs removed before entity detection.
    pub const LINK: &str = "LINK";

    /// Categories requested from the detector when none are configured.
    pub fn default_set() -> Vec<String> {
        [PERSON, PHONE_NUMBER, EMAIL_ADDRESS, US_SSN, CREDIT_CARD, GPE, NRP]
            .iter()
            .map(|c| c.to_string())
            .collect()
    }
}

/// A detected sensitive region of the scanned text.
///
/// `start..end` is a half-open UTF-8 byte range into the text handed to the
/// detector; both ends must sit on char boundaries.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Span {
    pub category: String,
    pub start: usize,
    pub end: usize,
}

impl Span {
    pub fn new(category: impl Into<String>, start: usize, end: usize) -> Self {
        Self { category: category.into(), start, end }
    }

    pub fn len(&self) -> usize {
        self.end.saturating_sub(self.start)
    }

    pub fn is_empty(&self) -> bool {
        self.start >= self.end
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DetectionError {
    #[error("Detector engine failure: {0}")]
    Engine(String),
    #[error("Malformed input: {0}")]
    MalformedInput(String),
    #[error("Span {start}..{end} out of bounds for text of length {len}")]
    SpanOutOfBounds { start: usize, end: usize, len: usize },
    #[error("Span {start}..{end} does not fall on character boundaries")]
    SpanNotOnCharBoundary { start: usize, end: usize },
    #[error("Spans {first:?} and {second:?} overlap")]
    OverlappingSpans { first: (usize, usize), second: (usize, usize) },
}

/// External classifier returning sensitive spans.
///
/// Implementations must return non-overlapping spans that lie within `text`.
/// The redactor validates both and fails the whole call otherwise.
pub trait EntityDetector: Send + Sync {
    fn analyze(
        &self,
        text: &str,
        categories: &BTreeSet<String>,
        locale: &str,
    ) -> Result<Vec<Span>, DetectionError>;
}

/// Check the detector contract against `text`.
///
/// Returns the spans sorted ascending by `(start, end)`.
pub fn validate_spans(text: &str, mut spans: Vec<Span>) -> Result<Vec<Span>, DetectionError> {
    for span in &spans {
        if span.start >= span.end || span.end > text.len() {
            return Err(DetectionError::SpanOutOfBounds {
                start: span.start,
                end: span.end,
                len: text.len(),
            });
        }
        if !text.is_char_boundary(span.start) || !text.is_char_boundary(span.end) {
            return Err(DetectionError::SpanNotOnCharBoundary { start: span.start, end: span.end });
        }
    }

    spans.sort_by_key(|s| (s.start, s.end));
    for pair in spans.windows(2) {
        if pair[1].start < pair[0].end {
            return Err(DetectionError::OverlappingSpans {
                first: (pair[0].start, pair[0].end),
                second: (pair[1].start, pair[1].end),
            });
        }
    }
    Ok(spans)
}
