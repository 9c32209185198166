use sdb_core::SdbResult;
use std::any::{Any, TypeId};
use std::fmt;

use crate::ingest::ingest_enveloped;
use crate::table::{RecordTable, TableRecord};

/// Static description of one table: where it lives in the archive, how it
/// is keyed, and how to ingest it without knowing its record type.
#[derive(Clone, Copy)]
pub struct TableDescriptor {
    pub table: &'static str,
    pub entry: &'static str,
    pub key_field: &'static str,
    type_id: fn() -> TypeId,
    ingest: fn(&[u8]) -> SdbResult<IngestedTable>,
}

impl TableDescriptor {
    pub const fn of<R: TableRecord>() -> Self {
        Self {
            table: R::TABLE,
            entry: R::ENTRY,
            key_field: R::KEY_FIELD,
            type_id: TypeId::of::<R>,
            ingest: ingest_erased::<R>,
        }
    }

    /// Type of the records this descriptor produces.
    pub fn record_type(&self) -> TypeId {
        (self.type_id)()
    }

    /// Ingest this table from its entry's bytes.
    pub fn ingest(&self, bytes: &[u8]) -> SdbResult<IngestedTable> {
        (self.ingest)(bytes)
    }
}

impl fmt::Debug for TableDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TableDescriptor")
            .field("table", &self.table)
            .field("entry", &self.entry)
            .field("key_field", &self.key_field)
            .finish()
    }
}

fn ingest_erased<R: TableRecord>(bytes: &[u8]) -> SdbResult<IngestedTable> {
    let table = ingest_enveloped::<R>(bytes)?;
    Ok(IngestedTable {
        record_type: TypeId::of::<R>(),
        table: R::TABLE,
        entry: R::ENTRY,
        records: table.len(),
        data: Box::new(table),
    })
}

/// A fully ingested table with its record type erased.
pub struct IngestedTable {
    record_type: TypeId,
    table: &'static str,
    entry: &'static str,
    records: usize,
    data: Box<dyn Any + Send + Sync>,
}

impl IngestedTable {
    pub fn record_type(&self) -> TypeId {
        self.record_type
    }

    pub fn table(&self) -> &'static str {
        self.table
    }

    pub fn entry(&self) -> &'static str {
        self.entry
    }

    pub fn len(&self) -> usize {
        self.records
    }

    pub fn is_empty(&self) -> bool {
        self.records == 0
    }

    pub fn downcast<R: TableRecord>(&self) -> Option<&RecordTable<R>> {
        self.data.downcast_ref::<RecordTable<R>>()
    }
}

impl fmt::Debug for IngestedTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IngestedTable")
            .field("table", &self.table)
            .field("records", &self.records)
            .finish()
    }
}
