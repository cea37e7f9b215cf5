//! Three-phase redaction: custom secrets, then URLs, then detected entities.
//!
//! Phase order matters. Secrets and URLs are removed before the detector
//! runs, so it never sees them and cannot split them into partial spans.
//! Phases 1 and 2 only search text that has not been replaced yet, so a later
//! secret cannot match inside an earlier placeholder.

use regex::{Regex, RegexBuilder};
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::{Arc, OnceLock};
use tracing::debug;

use super::mapping::Mapping;
use super::token_minter::{TokenMinter, TokenScheme};
use crate::detection::{categories, validate_spans, DetectionError, EntityDetector};

/// Trailing characters that end a sentence rather than a URL.
const URL_TRAILING_PUNCTUATION: &[char] = &['.', ',', ';', ':', '!', '?', ')', ']', '}'];

fn url_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r#"(?i)\b(?:https?://|www\.)[^\s<>"']+"#).unwrap())
}

/// Locate URLs in `text` as byte ranges, trimming sentence punctuation.
pub fn find_urls(text: &str) -> Vec<(usize, usize)> {
    url_pattern()
        .find_iter(text)
        .filter_map(|m| {
            let trimmed = m.as_str().trim_end_matches(URL_TRAILING_PUNCTUATION);
            let lower = trimmed.to_ascii_lowercase();
            let prefix = if lower.starts_with("https://") {
                8
            } else if lower.starts_with("http://") {
                7
            } else {
                4
            };
            (trimmed.len() > prefix).then(|| (m.start(), m.start() + trimmed.len()))
        })
        .collect()
}

/// Redactor settings.
#[derive(Debug, Clone)]
pub struct RedactorConfig {
    pub token_scheme: TokenScheme,
    /// Categories requested from the detector.
    pub categories: BTreeSet<String>,
    pub locale: String,
}

impl Default for RedactorConfig {
    fn default() -> Self {
        Self {
            token_scheme: TokenScheme::Counter,
            categories: categories::default_set().into_iter().collect(),
            locale: "en".to_string(),
        }
    }
}

/// Placeholders minted per phase, and per category across all phases.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RedactionStats {
    pub secrets: usize,
    pub links: usize,
    pub entities: usize,
    pub by_category: BTreeMap<String, usize>,
}

impl RedactionStats {
    pub fn total(&self) -> usize {
        self.secrets + self.links + self.entities
    }

    fn count(&mut self, category: &str, n: usize) {
        if n > 0 {
            *self.by_category.entry(category.to_string()).or_insert(0) += n;
        }
    }
}

/// Output of one redaction pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Protected {
    pub text: String,
    pub mapping: Mapping,
    pub stats: RedactionStats,
}

impl Protected {
    fn empty() -> Self {
        Self { text: String::new(), mapping: Mapping::new(), stats: RedactionStats::default() }
    }
}

enum Piece {
    Plain(String),
    Token(String),
}

/// Working copy for phases 1 and 2: original text interleaved with the
/// placeholders already substituted into it.
struct Draft {
    pieces: Vec<Piece>,
}

impl Draft {
    fn new(text: &str) -> Self {
        Self { pieces: vec![Piece::Plain(text.to_string())] }
    }

    /// Replace every range `find` reports inside plain pieces. Identical
    /// matched strings share a placeholder. Returns placeholders minted.
    fn substitute<F>(
        &mut self,
        category: &str,
        minter: &mut TokenMinter<'_>,
        mapping: &mut Mapping,
        find: F,
    ) -> usize
    where
        F: Fn(&str) -> Vec<(usize, usize)>,
    {
        let mut assigned: HashMap<String, String> = HashMap::new();
        let mut pieces = Vec::with_capacity(self.pieces.len());

        for piece in self.pieces.drain(..) {
            let plain = match piece {
                Piece::Plain(plain) => plain,
                token => {
                    pieces.push(token);
                    continue;
                }
            };
            let mut cursor = 0;
            for (start, end) in find(&plain) {
                let value = &plain[start..end];
                let placeholder = assigned
                    .entry(value.to_string())
                    .or_insert_with(|| {
                        let placeholder = minter.mint(category);
                        mapping.push(placeholder.clone(), value.to_string());
                        placeholder
                    })
                    .clone();
                if start > cursor {
                    pieces.push(Piece::Plain(plain[cursor..start].to_string()));
                }
                pieces.push(Piece::Token(placeholder));
                cursor = end;
            }
            if cursor < plain.len() {
                pieces.push(Piece::Plain(plain[cursor..].to_string()));
            }
        }

        self.pieces = pieces;
        assigned.len()
    }

    fn into_text(self) -> String {
        self.pieces
            .into_iter()
            .map(|p| match p {
                Piece::Plain(s) | Piece::Token(s) => s,
            })
            .collect()
    }
}

/// Orchestrates the redaction phases. Stateless between calls.
pub struct Redactor {
    detector: Arc<dyn EntityDetector>,
    config: RedactorConfig,
}

impl Redactor {
    pub fn new(detector: Arc<dyn EntityDetector>, config: RedactorConfig) -> Self {
        Self { detector, config }
    }

    pub fn config(&self) -> &RedactorConfig {
        &self.config
    }

    /// Redact `text`.
    ///
    /// Custom secrets are applied in the order given; a secret contained in
    /// an earlier one only finds what the earlier one left behind. Blank
    /// secrets are skipped and surrounding whitespace is ignored.
    ///
    /// # Errors
    /// Any detector failure or contract violation is returned unchanged and
    /// no partial mapping is produced.
    pub fn protect<S: AsRef<str>>(
        &self,
        text: &str,
        custom_secrets: &[S],
    ) -> Result<Protected, DetectionError> {
        if text.is_empty() {
            return Ok(Protected::empty());
        }

        let mut minter = TokenMinter::new(self.config.token_scheme, text);
        let mut mapping = Mapping::new();
        let mut stats = RedactionStats::default();
        let mut draft = Draft::new(text);

        for secret in custom_secrets.iter().map(|s| s.as_ref().trim()) {
            if secret.is_empty() {
                continue;
            }
            let matcher = RegexBuilder::new(&regex::escape(secret))
                .case_insensitive(true)
                .build()
                .map_err(|e| DetectionError::MalformedInput(format!("custom secret: {}", e)))?;
            stats.secrets += draft.substitute(categories::CONFIDENTIAL, &mut minter, &mut mapping, |s| {
                matcher.find_iter(s).map(|m| (m.start(), m.end())).collect()
            });
        }
        stats.count(categories::CONFIDENTIAL, stats.secrets);

        stats.links = draft.substitute(categories::LINK, &mut minter, &mut mapping, find_urls);
        stats.count(categories::LINK, stats.links);

        let scanned = draft.into_text();
        let spans = self
            .detector
            .analyze(&scanned, &self.config.categories, &self.config.locale)?;
        let mut spans = validate_spans(&scanned, spans)?;

        // Mint back to front so mapping order matches splice order.
        spans.reverse();
        let mut substitutions = Vec::with_capacity(spans.len());
        for span in &spans {
            let placeholder = minter.mint(&span.category);
            mapping.push(placeholder.clone(), scanned[span.start..span.end].to_string());
            metrics::counter!("ghost_gate_entities_redacted_total", "category" => span.category.clone())
                .increment(1);
            stats.count(&span.category, 1);
            substitutions.push((span, placeholder));
        }
        stats.entities = substitutions.len();

        let mut output = String::with_capacity(scanned.len());
        let mut cursor = 0;
        for (span, placeholder) in substitutions.iter().rev() {
            output.push_str(&scanned[cursor..span.start]);
            output.push_str(placeholder);
            cursor = span.end;
        }
        output.push_str(&scanned[cursor..]);

        metrics::counter!("ghost_gate_redactions_total").increment(1);
        debug!(
            secrets = stats.secrets,
            links = stats.links,
            entities = stats.entities,
            scheme = self.config.token_scheme.as_str(),
            "Redaction pass complete"
        );

        Ok(Protected { text: output, mapping, stats })
    }
}

#[cfg(test)]
#[path = "redactor_tests.rs"]
mod tests;
