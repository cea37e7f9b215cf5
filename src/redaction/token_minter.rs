//! Placeholder minting.
//!
//! A minter lives for exactly one redaction pass. It never hands out the
//! same placeholder twice and never hands out one that already occurs in the
//! text being redacted, so restoration by literal replacement cannot touch
//! content the user wrote.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::sync::OnceLock;

/// Bytes of randomness behind a random-scheme suffix (six hex chars).
const RANDOM_SUFFIX_BYTES: usize = 3;

/// Label used when a detector hands back an empty category.
const FALLBACK_LABEL: &str = "ENTITY";

/// Placeholder naming scheme. Fixed per deployment; one mapping never mixes
/// schemes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TokenScheme {
    /// `<CATEGORY_1>`, `<CATEGORY_2>`, ... counted per category per pass.
    #[default]
    Counter,
    /// `<CATEGORY_3fa91c>` with a CSPRNG suffix; needed when placeholders
    /// from concurrent requests share one vault.
    Random,
}

impl TokenScheme {
    pub fn as_str(&self) -> &'static str {
        match self {
            TokenScheme::Counter => "counter",
            TokenScheme::Random => "random",
        }
    }
}

impl std::str::FromStr for TokenScheme {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "counter" => Ok(TokenScheme::Counter),
            "random" => Ok(TokenScheme::Random),
            other => Err(format!("unknown token scheme '{}'", other)),
        }
    }
}

/// Matches anything shaped like a placeholder minted by either scheme.
pub fn placeholder_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"<[A-Z0-9_]+_[0-9a-f]+>").unwrap())
}

/// Reduce a category tag to the placeholder alphabet (`A-Z`, `0-9`, `_`).
pub fn normalize_label(category: &str) -> String {
    let label: String = category
        .trim()
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c.to_ascii_uppercase() } else { '_' })
        .collect();
    if label.is_empty() { FALLBACK_LABEL.to_string() } else { label }
}

fn random_suffix() -> String {
    use rand::RngCore;
    let mut bytes = [0u8; RANDOM_SUFFIX_BYTES];
    rand::rngs::OsRng.fill_bytes(bytes.as_mut_slice());
    hex::encode(bytes)
}

/// Per-pass placeholder generator.
pub struct TokenMinter<'a> {
    scheme: TokenScheme,
    haystack: &'a str,
    counters: HashMap<String, u64>,
    issued: HashSet<String>,
}

impl<'a> TokenMinter<'a> {
    /// `haystack` is the input of the pass; candidates occurring in it are
    /// skipped.
    pub fn new(scheme: TokenScheme, haystack: &'a str) -> Self {
        Self {
            scheme,
            haystack,
            counters: HashMap::new(),
            issued: HashSet::new(),
        }
    }

    /// Mint a fresh placeholder for `category`.
    pub fn mint(&mut self, category: &str) -> String {
        let label = normalize_label(category);
        loop {
            let candidate = match self.scheme {
                TokenScheme::Counter => {
                    let n = self.counters.entry(label.clone()).or_insert(0);
                    *n += 1;
                    format!("<{}_{}>", label, n)
                }
                TokenScheme::Random => format!("<{}_{}>", label, random_suffix()),
            };
            if self.issued.contains(&candidate) || self.haystack.contains(&candidate) {
                continue;
            }
            self.issued.insert(candidate.clone());
            return candidate;
        }
    }
}

#[cfg(test)]
#[path = "token_minter_tests.rs"]
mod tests;
