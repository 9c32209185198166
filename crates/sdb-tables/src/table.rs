use serde::de::DeserializeOwned;
use std::collections::hash_map::{self, HashMap};
use std::fmt;
use std::hash::Hash;

/// A record type stored in one table of the bundle.
///
/// `ENTRY` is the inner archive entry the table is read from and
/// `KEY_FIELD` names the record field [`TableRecord::key`] returns.
pub trait TableRecord: DeserializeOwned + Send + Sync + 'static {
    type Key: Eq + Hash + Clone + fmt::Debug + fmt::Display + Send + Sync + 'static;

    const TABLE: &'static str;
    const ENTRY: &'static str;
    const KEY_FIELD: &'static str;

    fn key(&self) -> Self::Key;
}

/// Primary key → record, keys unique.
pub struct RecordTable<R: TableRecord> {
    records: HashMap<R::Key, R>,
}

impl<R: TableRecord> RecordTable<R> {
    pub fn new() -> Self {
        Self {
            records: HashMap::new(),
        }
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            records: HashMap::with_capacity(capacity),
        }
    }

    /// Insert unless the key is taken; on collision the existing record is
    /// kept and the rejected key is returned.
    pub fn try_insert(&mut self, record: R) -> Result<(), R::Key> {
        match self.records.entry(record.key()) {
            hash_map::Entry::Occupied(slot) => Err(slot.key().clone()),
            hash_map::Entry::Vacant(slot) => {
                slot.insert(record);
                Ok(())
            }
        }
    }

    pub fn get(&self, key: &R::Key) -> Option<&R> {
        self.records.get(key)
    }

    pub fn contains_key(&self, key: &R::Key) -> bool {
        self.records.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Iteration order is unspecified.
    pub fn iter(&self) -> impl Iterator<Item = (&R::Key, &R)> {
        self.records.iter()
    }

    pub fn keys(&self) -> impl Iterator<Item = &R::Key> {
        self.records.keys()
    }

    pub fn values(&self) -> impl Iterator<Item = &R> {
        self.records.values()
    }
}

impl<R: TableRecord> Default for RecordTable<R> {
    fn default() -> Self {
        Self::new()
    }
}

impl<R: TableRecord> fmt::Debug for RecordTable<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RecordTable")
            .field("table", &R::TABLE)
            .field("records", &self.records.len())
            .finish()
    }
}
