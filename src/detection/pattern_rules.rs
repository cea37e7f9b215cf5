//! Detection patterns, confidence scoring, and match post-processing.

use regex::Regex;

use super::categories;

/// A pattern hit before it is turned into a [`super::Span`].
#[derive(Debug, Clone)]
pub struct PatternMatch {
    pub category: &'static str,
    pub start: usize,
    pub end: usize,
    pub confidence: f32,
}

/// Build the compiled regex patterns for every structured category.
pub fn build_patterns() -> Vec<(&'static str, Regex)> {
    vec![
        (categories::CREDIT_CARD, Regex::new(r"\b(?:\d{4}[-\s]?){3}\d{4}\b").unwrap()),
        (categories::CREDIT_CARD, Regex::new(r"\b\d{13,19}\b").unwrap()),
        (categories::US_SSN, Regex::new(r"\b\d{3}-\d{2}-\d{4}\b").unwrap()),
        (categories::EMAIL_ADDRESS, Regex::new(r"\b[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}\b").unwrap()),
        (categories::PHONE_NUMBER, Regex::new(r"(?:\+?1[-.\s]?)?\(?\b[0-9]{3}\)?[-.\s]?[0-9]{3}[-.\s]?[0-9]{4}\b").unwrap()),
        (categories::PHONE_NUMBER, Regex::new(r"\+[1-9]\d{7,14}\b").unwrap()),
        (categories::IP_ADDRESS, Regex::new(r"\b(?:(?:25[0-5]|2[0-4]\d|1?\d?\d)\.){3}(?:25[0-5]|2[0-4]\d|1?\d?\d)\b").unwrap()),
        (categories::IP_ADDRESS, Regex::new(r"\b(?:[a-fA-F0-9]{1,4}:){7}[a-fA-F0-9]{1,4}\b").unwrap()),
    ]
}

/// Calculate confidence score for a match.
pub fn calculate_confidence(category: &str, text: &str) -> f32 {
    match category {
        categories::EMAIL_ADDRESS => {
            if text.contains('@') && text.contains('.') { 0.95 } else { 0.7 }
        }
        categories::CREDIT_CARD => 0.95,
        categories::US_SSN => {
            let digits: String = text.chars().filter(|c| c.is_ascii_digit()).collect();
            if digits.len() == 9 {
                let area = &digits[0..3];
                if area != "000" && area != "666" && area < "900" { 0.9 } else { 0.5 }
            } else { 0.6 }
        }
        categories::PHONE_NUMBER => {
            if text.starts_with('+') || text.chars().filter(|c| c.is_ascii_digit()).count() == 10 {
                0.85
            } else { 0.6 }
        }
        _ => 0.75,
    }
}

/// Luhn algorithm for credit card validation.
pub fn luhn_check(number: &str) -> bool {
    let digits: Vec<u32> = number.chars().filter_map(|c| c.to_digit(10)).collect();
    if digits.len() < 13 || digits.len() > 19 { return false; }
    let mut sum = 0u32;
    let mut double = false;
    for &digit in digits.iter().rev() {
        let mut d = digit;
        if double { d *= 2; if d > 9 { d -= 9; } }
        sum += d;
        double = !double;
    }
    sum % 10 == 0
}

/// Remove overlapping matches, keeping the highest confidence.
///
/// Input must be sorted ascending by start. On equal confidence the longer
/// match wins.
pub fn remove_overlaps(mut matches: Vec<PatternMatch>) -> Vec<PatternMatch> {
    if matches.len() <= 1 { return matches; }
    let mut result = Vec::new();
    let mut current = matches.remove(0);
    for m in matches {
        if m.start < current.end {
            let longer = m.end - m.start > current.end - current.start;
            if m.confidence > current.confidence
                || (m.confidence == current.confidence && longer)
            {
                current = m;
            }
        } else {
            result.push(current);
            current = m;
        }
    }
    result.push(current);
    result
}
