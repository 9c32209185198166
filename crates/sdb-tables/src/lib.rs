//! sdb-tables: typed record tables ingested from a decoded bundle
//!
//! A static [`Catalog`] of [`TableDescriptor`]s names every table file in the
//! inner archive. [`Ingestor`] turns each into a [`RecordTable`] (fanning out
//! over a bounded worker pool), builds the derived indices, and assembles
//! them into an immutable [`RecordStore`]. [`StaticData`] owns the one-shot
//! fetch → decode → ingest sequence and hands out the shared store.

pub mod catalog;
pub mod descriptor;
pub mod index;
pub mod ingest;
pub mod init;
pub mod json;
pub mod records;
pub mod store;
pub mod table;

pub use catalog::{Catalog, CATALOG, POSITION_REWARD};
pub use descriptor::TableDescriptor;
pub use index::{DerivedIndex, DerivedIndexDescriptor};
pub use ingest::Ingestor;
pub use init::StaticData;
pub use store::{is_valid_scenario_stage, RecordStore, TableSummary};
pub use table::{RecordTable, TableRecord};
