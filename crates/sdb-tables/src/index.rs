//! Derived indices: mappings computed by scanning many archive entries
//!
//! Unlike declared tables, a derived index tolerates duplicate keys: the
//! first value recorded for a key wins and later ones are dropped.

use sdb_core::SdbResult;
use std::collections::hash_map::{self, HashMap};
use std::fmt;

/// Pairs one matching archive entry contributes to an index.
pub type Extracted = Vec<(String, i32)>;

/// Which entries feed an index and how each one is read.
#[derive(Clone, Copy)]
pub struct DerivedIndexDescriptor {
    pub name: &'static str,
    /// Entry name prefixes; an entry matching any of them is scanned
    pub prefixes: &'static [&'static str],
    pub extract: fn(&str, &[u8]) -> SdbResult<Extracted>,
}

impl DerivedIndexDescriptor {
    pub fn matches(&self, entry: &str) -> bool {
        self.prefixes.iter().any(|prefix| entry.starts_with(prefix))
    }
}

impl fmt::Debug for DerivedIndexDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DerivedIndexDescriptor")
            .field("name", &self.name)
            .field("prefixes", &self.prefixes)
            .finish()
    }
}

/// String key → integer value, first write wins.
#[derive(Debug, Clone)]
pub struct DerivedIndex {
    name: &'static str,
    values: HashMap<String, i32>,
    ignored: usize,
}

impl DerivedIndex {
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            values: HashMap::new(),
            ignored: 0,
        }
    }

    /// Merge per-entry extractions in the order given.
    pub fn from_parts(name: &'static str, parts: impl IntoIterator<Item = Extracted>) -> Self {
        let mut index = Self::new(name);
        for (key, value) in parts.into_iter().flatten() {
            index.try_insert(key, value);
        }
        index
    }

    /// Returns `false` (and keeps the existing value) if `key` is present.
    pub fn try_insert(&mut self, key: String, value: i32) -> bool {
        match self.values.entry(key) {
            hash_map::Entry::Occupied(slot) => {
                tracing::trace!(
                    index = self.name,
                    key = %slot.key(),
                    kept = *slot.get(),
                    dropped = value,
                    "duplicate derived key ignored"
                );
                self.ignored += 1;
                false
            }
            hash_map::Entry::Vacant(slot) => {
                slot.insert(value);
                true
            }
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn get(&self, key: &str) -> Option<i32> {
        self.values.get(key).copied()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// How many insertions were dropped as duplicates.
    pub fn ignored(&self) -> usize {
        self.ignored
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, i32)> {
        self.values.iter().map(|(k, v)| (k.as_str(), *v))
    }
}
