//! Regex-backed entity detector for structured PII.
//!
//! # Security
//! Uses NFKC normalization before pattern matching so that compatibility
//! forms (fullwidth digits, ligatures, circled letters) cannot slip past the
//! patterns. Match offsets are mapped back onto the caller's text, so spans
//! always index the original input.

use regex::Regex;
use std::collections::BTreeSet;
use std::sync::Arc;
use unicode_normalization::UnicodeNormalization;

use super::entity_detector::{DetectionError, EntityDetector, Span};
use super::pattern_rules::{self, PatternMatch};
use super::categories;

/// NFKC-normalized text plus, for every normalized byte, the byte range of
/// the original character it came from.
struct Normalized {
    text: String,
    origin: Vec<(usize, usize)>,
}

impl Normalized {
    fn new(input: &str) -> Self {
        let mut text = String::with_capacity(input.len());
        let mut origin = Vec::with_capacity(input.len());
        for (idx, ch) in input.char_indices() {
            let orig = (idx, idx + ch.len_utf8());
            let before = text.len();
            text.extend(std::iter::once(ch).nfkc());
            origin.extend(std::iter::repeat(orig).take(text.len() - before));
        }
        Self { text, origin }
    }

    /// Map a normalized match range onto the original text.
    fn original_range(&self, start: usize, end: usize) -> (usize, usize) {
        (self.origin[start].0, self.origin[end - 1].1)
    }

    /// Map sorted, non-overlapping normalized matches onto the original
    /// text. Neighbours that expand from the same original character are
    /// merged into one span covering both.
    fn map_back(&self, matches: Vec<PatternMatch>) -> Vec<PatternMatch> {
        let mut mapped: Vec<PatternMatch> = Vec::with_capacity(matches.len());
        for m in matches {
            let (start, end) = self.original_range(m.start, m.end);
            match mapped.last_mut() {
                Some(prev) if start < prev.end => {
                    prev.end = prev.end.max(end);
                    if m.confidence > prev.confidence {
                        prev.category = m.category;
                        prev.confidence = m.confidence;
                    }
                }
                _ => mapped.push(PatternMatch { start, end, ..m }),
            }
        }
        mapped
    }
}

/// Matches scoring below this are dropped.
const MIN_CONFIDENCE: f32 = 0.6;

/// Detector with compiled regex patterns.
pub struct PatternDetector {
    patterns: Arc<Vec<(&'static str, Regex)>>,
    validate_credit_cards: bool,
}

impl PatternDetector {
    pub fn new() -> Self {
        Self {
            patterns: Arc::new(pattern_rules::build_patterns()),
            validate_credit_cards: true,
        }
    }

    /// Detect matches in text, restricted to `wanted` when it is non-empty.
    pub fn detect(&self, text: &str, wanted: &BTreeSet<String>) -> Vec<PatternMatch> {
        let normalized = Normalized::new(text);
        let mut matches = Vec::new();

        for (category, regex) in self.patterns.iter() {
            if !wanted.is_empty() && !wanted.contains(*category) {
                continue;
            }
            for m in regex.find_iter(&normalized.text) {
                let matched_text = m.as_str();
                if *category == categories::CREDIT_CARD && self.validate_credit_cards {
                    let digits: String = matched_text.chars().filter(|c| c.is_ascii_digit()).collect();
                    if !pattern_rules::luhn_check(&digits) { continue; }
                }
                let confidence = pattern_rules::calculate_confidence(category, matched_text);
                if confidence < MIN_CONFIDENCE { continue; }
                matches.push(PatternMatch { category, start: m.start(), end: m.end(), confidence });
            }
        }

        // Overlaps are resolved on the text the patterns actually saw.
        matches.sort_by_key(|m| (m.start, m.end));
        normalized.map_back(pattern_rules::remove_overlaps(matches))
    }
}

impl Default for PatternDetector {
    fn default() -> Self { Self::new() }
}

impl EntityDetector for PatternDetector {
    fn analyze(
        &self,
        text: &str,
        categories: &BTreeSet<String>,
        _locale: &str,
    ) -> Result<Vec<Span>, DetectionError> {
        Ok(self
            .detect(text, categories)
            .into_iter()
            .map(|m| Span::new(m.category, m.start, m.end))
            .collect())
    }
}

#[cfg(test)]
#[path = "pattern_tests.rs"]
mod tests;
