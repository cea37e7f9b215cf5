//! TTL-bounded placeholder store.
//!
//! The in-memory mapping returned by the redactor covers a synchronous round
//! trip. The vault is for redaction and restoration that happen in different
//! process lifetimes or request scopes. Tokens must come from the random
//! scheme when several requests share one vault.

pub mod memory_vault;

pub use memory_vault::MemoryVault;

use std::collections::HashMap;
use std::time::Duration;
use thiserror::Error;

use crate::redaction::{placeholder_pattern, Mapping};

/// Time-to-live applied when none is configured.
pub const DEFAULT_TTL: Duration = Duration::from_secs(600);

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum VaultError {
    #[error("Vault backend failure: {0}")]
    Backend(String),
    #[error("Token {0} already holds a live value")]
    Occupied(String),
}

/// Store with atomic set-if-absent semantics per token.
pub trait Vault: Send + Sync {
    /// Write `value` under `token` with the vault's TTL.
    ///
    /// A token that still holds a live value is never overwritten; the call
    /// fails with [`VaultError::Occupied`] and the stored value is unchanged.
    fn store(&self, token: &str, value: &str) -> Result<(), VaultError>;

    /// Read a live entry. Expired entries read as `None`, never stale data.
    fn retrieve(&self, token: &str) -> Result<Option<String>, VaultError>;

    /// Drop `token`. Absent tokens are not an error.
    fn remove(&self, token: &str) -> Result<(), VaultError>;

    /// Write every entry of a mapping, or none of them.
    ///
    /// On the first failed write, entries already written by this call are
    /// removed again and the error is returned.
    fn store_mapping(&self, mapping: &Mapping) -> Result<(), VaultError> {
        let mut written: Vec<&str> = Vec::with_capacity(mapping.len());
        for entry in mapping {
            if let Err(e) = self.store(&entry.placeholder, &entry.original) {
                for token in written {
                    // Entries left behind still expire with the TTL.
                    let _ = self.remove(token);
                }
                return Err(e);
            }
            written.push(&entry.placeholder);
        }
        Ok(())
    }
}

/// Bound on how deep placeholders nested inside stored values are followed.
const MAX_NESTING: usize = 8;

fn placeholders_in(text: &str) -> impl Iterator<Item = String> + '_ {
    placeholder_pattern().find_iter(text).map(|m| m.as_str().to_string())
}

/// Rebuild the part of a mapping that `text` references, from the vault.
///
/// Values may themselves hold older placeholders; those are followed and
/// ordered so that [`crate::redaction::Restorer`] expands outer entries
/// first. Expired or unknown placeholders are absent from the result and
/// stay untouched when it is used for restoration.
pub fn recover_mapping(vault: &dyn Vault, text: &str) -> Result<Mapping, VaultError> {
    let mut found: HashMap<String, (usize, String)> = HashMap::new();
    let mut frontier: Vec<String> = placeholders_in(text).collect();
    let mut depth = 0;

    while !frontier.is_empty() && depth < MAX_NESTING {
        let mut next = Vec::new();
        for token in frontier {
            let value = match found.get(&token) {
                Some((_, value)) => value.clone(),
                None => match vault.retrieve(&token)? {
                    Some(value) => value,
                    None => continue,
                },
            };
            next.extend(placeholders_in(&value));
            found.insert(token, (depth, value));
        }
        frontier = next;
        depth += 1;
    }

    let mut entries: Vec<(String, (usize, String))> = found.into_iter().collect();
    entries.sort_by(|a, b| b.1 .0.cmp(&a.1 .0).then_with(|| a.0.cmp(&b.0)));
    let mut mapping = Mapping::new();
    for (token, (_, value)) in entries {
        mapping.push(token, value);
    }
    Ok(mapping)
}

#[cfg(test)]
#[path = "vault_tests.rs"]
mod tests;
