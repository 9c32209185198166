//! TableIngestor: entry bytes → tables and derived indices
//!
//! Two entry shapes are read:
//! - enveloped tables, `{"records": [ {...}, ... ]}`, keyed per record type
//!   with duplicate keys fatal;
//! - raw-array map entries, `[ {"ItemSpawner": [ {...}, ... ]}, ... ]`,
//!   whose spawners feed a first-write-wins derived index.
//!
//! Every table is independent once the bundle is decoded, so [`Ingestor`]
//! fans them out over a bounded rayon pool. Map entries are parsed in
//! parallel too, but their pairs are merged into the index sequentially in
//! archive order, which keeps "first" well defined.

use rayon::prelude::*;
use sdb_bundle::DecodedBundle;
use sdb_core::{SdbError, SdbResult};
use std::time::Instant;
use tracing::{debug, info, warn};

use crate::catalog::Catalog;
use crate::descriptor::IngestedTable;
use crate::index::{DerivedIndex, DerivedIndexDescriptor, Extracted};
use crate::json::{self, Node};
use crate::store::RecordStore;
use crate::table::{RecordTable, TableRecord};

/// Envelope field holding the record array
pub const RECORDS_FIELD: &str = "records";

/// Map entry field holding the spawner collection
pub const ITEM_SPAWNER_FIELD: &str = "ItemSpawner";

/// Ingest one enveloped table.
///
/// Fails with `MalformedTable` if the envelope or any record does not match
/// `R`'s shape, and with `DuplicateKey` on the first repeated key.
pub fn ingest_enveloped<R: TableRecord>(bytes: &[u8]) -> SdbResult<RecordTable<R>> {
    let entry = R::ENTRY;
    let doc = json::parse(entry, bytes)?;
    let records = Node::root(entry, &doc).get(RECORDS_FIELD)?;

    let mut table = RecordTable::with_capacity(records.len()?);
    for node in records.elements()? {
        let record: R = node.deserialize()?;
        table
            .try_insert(record)
            .map_err(|key| SdbError::DuplicateKey {
                table: R::TABLE.to_string(),
                key: key.to_string(),
            })?;
    }

    debug!(entry, records = table.len(), "table ingested");
    Ok(table)
}

/// Read `(positionId, itemId)` pairs from a map entry's first element.
///
/// A map without a spawner collection contributes nothing; a spawner
/// missing either field is malformed. Numeric position ids and string item
/// ids are accepted.
pub fn extract_spawner_rewards(entry: &str, bytes: &[u8]) -> SdbResult<Extracted> {
    let doc = json::parse(entry, bytes)?;
    let first = Node::root(entry, &doc).at(0)?;

    let Some(spawners) = first.find(ITEM_SPAWNER_FIELD)? else {
        warn!(entry, "map entry has no {ITEM_SPAWNER_FIELD} collection, skipped");
        return Ok(Vec::new());
    };

    let pairs = spawners
        .elements()?
        .map(|spawner| -> SdbResult<(String, i32)> {
            let position = spawner.get("positionId")?.coerce_string()?;
            let item = spawner.get("itemId")?.coerce_i32()?;
            Ok((position, item))
        })
        .collect();
    pairs
}

/// Runs a catalog's ingestion over a decoded bundle with bounded parallelism.
pub struct Ingestor {
    pool: rayon::ThreadPool,
}

impl Ingestor {
    /// `workers == 0` uses the available parallelism.
    pub fn new(workers: usize) -> SdbResult<Self> {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(workers)
            .thread_name(|i| format!("sdb-ingest-{i}"))
            .build()
            .map_err(|e| SdbError::Configuration(format!("ingest worker pool: {e}")))?;
        Ok(Self { pool })
    }

    pub fn workers(&self) -> usize {
        self.pool.current_num_threads()
    }

    /// Ingest every table and index `catalog` declares.
    ///
    /// All or nothing: the first failure is returned and no store is built.
    pub fn ingest(&self, bundle: &DecodedBundle, catalog: &Catalog) -> SdbResult<RecordStore> {
        let started = Instant::now();

        let (tables, indices) = self.pool.install(|| {
            rayon::join(
                || ingest_tables(bundle, catalog),
                || build_indices(bundle, catalog),
            )
        });
        let store = RecordStore::assemble(bundle.identity(), catalog, tables?, indices?)?;

        info!(
            bundle = %bundle.identity(),
            tables = store.table_count(),
            records = store.record_count(),
            workers = self.workers(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "record store ready"
        );
        Ok(store)
    }
}

impl std::fmt::Debug for Ingestor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Ingestor")
            .field("workers", &self.workers())
            .finish()
    }
}

fn ingest_tables(bundle: &DecodedBundle, catalog: &Catalog) -> SdbResult<Vec<IngestedTable>> {
    catalog
        .tables
        .par_iter()
        .map(|descriptor| {
            let bytes = bundle.read(descriptor.entry)?;
            descriptor.ingest(&bytes)
        })
        .collect()
}

fn build_indices(bundle: &DecodedBundle, catalog: &Catalog) -> SdbResult<Vec<DerivedIndex>> {
    catalog
        .indices
        .iter()
        .map(|descriptor| build_index(bundle, descriptor))
        .collect()
}

fn build_index(bundle: &DecodedBundle, descriptor: &DerivedIndexDescriptor) -> SdbResult<DerivedIndex> {
    let sources: Vec<&str> = bundle
        .entries()
        .iter()
        .map(String::as_str)
        .filter(|name| descriptor.matches(name))
        .collect();

    let parts: Vec<Extracted> = sources
        .par_iter()
        .map(|name| {
            let bytes = bundle.read(name)?;
            (descriptor.extract)(name, &bytes)
        })
        .collect::<SdbResult<_>>()?;

    let index = DerivedIndex::from_parts(descriptor.name, parts);
    debug!(
        index = descriptor.name,
        sources = sources.len(),
        keys = index.len(),
        ignored = index.ignored(),
        "derived index built"
    );
    Ok(index)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::records::UserExpRecord;

    #[test]
    fn test_unique_keys_yield_one_entry_per_record() {
        let table = ingest_enveloped::<UserExpRecord>(
            br#"{"records":[{"level":1,"exp":0},{"level":2,"exp":100},{"level":3,"exp":250}]}"#,
        )
        .unwrap();

        assert_eq!(table.len(), 3);
        assert_eq!(table.get(&3).unwrap().exp, 250);
    }

    #[test]
    fn test_duplicate_key_is_fatal() {
        let err = ingest_enveloped::<UserExpRecord>(
            br#"{"records":[{"level":1,"exp":0},{"level":1,"exp":100}]}"#,
        )
        .unwrap_err();

        match err {
            SdbError::DuplicateKey { table, key } => {
                assert_eq!(table, "UserExpTable");
                assert_eq!(key, "1");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_missing_records_field_is_malformed() {
        let err = ingest_enveloped::<UserExpRecord>(br#"{"data":[]}"#).unwrap_err();
        assert!(matches!(err, SdbError::MalformedTable { ref entry, .. } if entry == "UserExpTable.json"));
    }

    #[test]
    fn test_bad_record_is_malformed() {
        let err = ingest_enveloped::<UserExpRecord>(br#"{"records":[{"level":1,"exp":0},{"level":"two"}]}"#)
            .unwrap_err();

        match err {
            SdbError::MalformedTable { reason, .. } => assert!(reason.starts_with("$.records[1]")),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_empty_records_is_empty_table() {
        let table = ingest_enveloped::<UserExpRecord>(br#"{"records":[]}"#).unwrap();
        assert!(table.is_empty());
    }

    #[test]
    fn test_spawner_pairs_in_document_order() {
        let pairs = extract_spawner_rewards(
            "CampaignMap/m1.json",
            br#"[{"ItemSpawner":[{"positionId":"A-1","itemId":10},{"positionId":"A-2","itemId":11}]}]"#,
        )
        .unwrap();

        assert_eq!(pairs, vec![("A-1".to_string(), 10), ("A-2".to_string(), 11)]);
    }

    #[test]
    fn test_spawner_ids_tolerate_numeric_and_string_forms() {
        let pairs = extract_spawner_rewards(
            "EventMap/e1.json",
            br#"[{"ItemSpawner":[{"positionId":1001,"itemId":"12"},{"positionId":"B-3","itemId":13}]}]"#,
        )
        .unwrap();

        assert_eq!(pairs, vec![("1001".to_string(), 12), ("B-3".to_string(), 13)]);
    }

    #[test]
    fn test_map_without_spawners_contributes_nothing() {
        let pairs = extract_spawner_rewards("CampaignMap/m1.json", br#"[{"Other":[]}]"#).unwrap();
        assert!(pairs.is_empty());
    }

    #[test]
    fn test_spawner_missing_position_is_malformed() {
        let err = extract_spawner_rewards("EventMap/e1.json", br#"[{"ItemSpawner":[{"itemId":1}]}]"#)
            .unwrap_err();
        assert!(matches!(err, SdbError::MalformedTable { .. }));
    }

    #[test]
    fn test_map_must_be_array() {
        let err = extract_spawner_rewards("EventMap/e1.json", br#"{"ItemSpawner":[]}"#).unwrap_err();
        assert!(matches!(err, SdbError::MalformedTable { .. }));
    }

    #[test]
    fn test_worker_count_is_bounded() {
        let ingestor = Ingestor::new(2).unwrap();
        assert_eq!(ingestor.workers(), 2);
    }
}
