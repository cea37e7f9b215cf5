//! Ordered placeholder -> original value association.
//!
//! Insertion order is substitution order. Original values are wiped from
//! memory when an entry is dropped.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use thiserror::Error;
use zeroize::{Zeroize, ZeroizeOnDrop};

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MappingError {
    #[error("Placeholder already mapped: {0}")]
    DuplicatePlaceholder(String),
}

/// One substitution made by the redactor.
#[derive(Debug, Clone, PartialEq, Eq, Zeroize, ZeroizeOnDrop)]
pub struct MappingEntry {
    pub placeholder: String,
    pub original: String,
}

/// Serialized as an ordered list of `[placeholder, original]` pairs.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<(String, String)>", into = "Vec<(String, String)>")]
pub struct Mapping {
    entries: Vec<MappingEntry>,
    index: HashMap<String, usize>,
}

impl Mapping {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an entry. Placeholders are unique keys.
    pub fn insert(
        &mut self,
        placeholder: impl Into<String>,
        original: impl Into<String>,
    ) -> Result<(), MappingError> {
        let placeholder = placeholder.into();
        if self.index.contains_key(&placeholder) {
            return Err(MappingError::DuplicatePlaceholder(placeholder));
        }
        self.push(placeholder, original.into());
        Ok(())
    }

    /// Append an entry whose placeholder came from this pass's minter.
    pub(crate) fn push(&mut self, placeholder: String, original: String) {
        debug_assert!(!self.index.contains_key(&placeholder));
        self.index.insert(placeholder.clone(), self.entries.len());
        self.entries.push(MappingEntry { placeholder, original });
    }

    pub fn get(&self, placeholder: &str) -> Option<&str> {
        self.index
            .get(placeholder)
            .map(|&i| self.entries[i].original.as_str())
    }

    pub fn contains(&self, placeholder: &str) -> bool {
        self.index.contains_key(placeholder)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries in insertion order.
    pub fn iter(&self) -> impl DoubleEndedIterator<Item = &MappingEntry> {
        self.entries.iter()
    }

    pub fn placeholders(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|e| e.placeholder.as_str())
    }
}

impl<'a> IntoIterator for &'a Mapping {
    type Item = &'a MappingEntry;
    type IntoIter = std::slice::Iter<'a, MappingEntry>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

impl TryFrom<Vec<(String, String)>> for Mapping {
    type Error = MappingError;

    fn try_from(pairs: Vec<(String, String)>) -> Result<Self, Self::Error> {
        let mut mapping = Mapping::new();
        for (placeholder, original) in pairs {
            mapping.insert(placeholder, original)?;
        }
        Ok(mapping)
    }
}

impl From<Mapping> for Vec<(String, String)> {
    fn from(mapping: Mapping) -> Self {
        mapping
            .iter()
            .map(|e| (e.placeholder.clone(), e.original.clone()))
            .collect()
    }
}
