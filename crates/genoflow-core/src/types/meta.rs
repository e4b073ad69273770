//! Metadata carried alongside tokens.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::Value;

/// Provenance metadata attached to a token.
///
/// Metadata cascades through the net: each firing folds the metadata of its
/// input tokens into one value that is attached to the produced token.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct TokenMeta {
    entries: BTreeMap<String, Value>,
}

impl TokenMeta {
    /// Empty metadata.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert.
    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.insert(key, value);
        self
    }

    /// Insert or replace an entry.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.entries.insert(key.into(), value.into());
    }

    /// Look up an entry.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.entries.get(key)
    }

    /// Merge `other` into `self`; entries of `other` win.
    pub fn merge_from(&mut self, other: &TokenMeta) {
        for (k, v) in &other.entries {
            self.entries.insert(k.clone(), v.clone());
        }
    }

    /// Left-to-right merge of several metadata values.
    pub fn cascade<'a>(metas: impl IntoIterator<Item = &'a TokenMeta>) -> TokenMeta {
        metas.into_iter().fold(TokenMeta::new(), |mut acc, meta| {
            acc.merge_from(meta);
            acc
        })
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Iterate entries in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.entries.iter()
    }
}
