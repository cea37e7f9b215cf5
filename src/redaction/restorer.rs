//! Placeholder restoration.
//!
//! Entries are applied newest first. A later phase may have captured an
//! earlier placeholder inside its original value (an entity span that
//! covered a `<LINK_1>`, say); expanding the newer entry first re-exposes
//! the older placeholder before it is resolved.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use super::mapping::Mapping;
use super::token_minter::placeholder_pattern;
use crate::telemetry::{log_privacy_event, PrivacyEvent};

/// Presentation of restored values. Has no bearing on correctness.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Marker {
    #[default]
    None,
    /// `**value**`, rendered as bold by the chat UI.
    Emphasis,
}

impl Marker {
    fn decorate(&self, value: &str) -> String {
        match self {
            Marker::None => value.to_string(),
            Marker::Emphasis => format!("**{}**", value),
        }
    }
}

/// Outcome of a restoration with diagnostics.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RestoreReport {
    pub text: String,
    /// Placeholder occurrences replaced.
    pub restored: usize,
    /// Mapping entries with no occurrence in the text.
    pub unused: Vec<String>,
    /// Placeholder-shaped tokens absent from the mapping, left untouched.
    pub unknown_placeholders: Vec<String>,
}

/// Reverses a redaction using its mapping. Stateless.
#[derive(Debug, Clone, Copy, Default)]
pub struct Restorer {
    marker: Marker,
}

impl Restorer {
    pub fn new(marker: Marker) -> Self {
        Self { marker }
    }

    pub fn marker(&self) -> Marker {
        self.marker
    }

    pub fn restore(&self, text: &str, mapping: &Mapping) -> String {
        self.restore_with_report(text, mapping).text
    }

    pub fn restore_with_report(&self, text: &str, mapping: &Mapping) -> RestoreReport {
        let unknown_placeholders = unknown_placeholders(text, mapping);
        if !unknown_placeholders.is_empty() {
            metrics::counter!("ghost_gate_mapping_mismatch_total")
                .increment(unknown_placeholders.len() as u64);
            log_privacy_event(
                PrivacyEvent::MappingMismatch,
                "Placeholder-shaped tokens not present in mapping; passing through",
                &[
                    ("count", &unknown_placeholders.len().to_string()),
                    ("tokens", &unknown_placeholders.join(",")),
                ],
            );
        }

        let mut result = text.to_string();
        let mut restored = 0;
        let mut unused = Vec::new();
        for entry in mapping.iter().rev() {
            let occurrences = result.matches(entry.placeholder.as_str()).count();
            if occurrences == 0 {
                unused.push(entry.placeholder.clone());
                continue;
            }
            result = result.replace(entry.placeholder.as_str(), &self.marker.decorate(&entry.original));
            restored += occurrences;
        }
        unused.reverse();

        metrics::counter!("ghost_gate_restorations_total").increment(1);
        if !unused.is_empty() {
            log_privacy_event(
                PrivacyEvent::UnusedPlaceholders,
                "Mapping entries absent from upstream response",
                &[("count", &unused.len().to_string())],
            );
        }

        RestoreReport { text: result, restored, unused, unknown_placeholders }
    }
}

/// Placeholder-shaped tokens in `text` that `mapping` does not know, in
/// order of first appearance.
pub fn unknown_placeholders(text: &str, mapping: &Mapping) -> Vec<String> {
    let mut seen = BTreeSet::new();
    placeholder_pattern()
        .find_iter(text)
        .map(|m| m.as_str())
        .filter(|token| !mapping.contains(token) && seen.insert(*token))
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
#[path = "restorer_tests.rs"]
mod tests;
