pub mod config;
pub mod error;
pub mod types;

pub use config::SdbConfig;
pub use error::{FailureClass, SdbError, SdbResult};
pub use types::{ArchiveKind, BundleIdentity, DecodeStage};
