//! sdb-archive: the named-entry container used at both archive levels of a bundle
//!
//! An archive is treated as a read-only `name → bytes` map. Entry names can be
//! enumerated, so path-prefixed groups (`CampaignMap/...`) can be discovered
//! without knowing them in advance.

pub mod reader;
pub mod writer;

pub use reader::Archive;
pub use writer::ArchiveWriter;
