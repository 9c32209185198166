use thiserror::Error;

use crate::types::ArchiveKind;

pub type SdbResult<T> = Result<T, SdbError>;

/// Every way loading the static data bundle can fail.
///
/// All variants abort initialization as a whole; no partially populated
/// store is ever handed out.
#[derive(Debug, Error)]
pub enum SdbError {
    #[error("configuration error: {0}")]
    Configuration(String),

    #[error("decryption error: {0}")]
    Decryption(String),

    #[error("integrity error: {0}")]
    Integrity(String),

    #[error("{archive} archive has no entry named {name:?}")]
    EntryNotFound { archive: ArchiveKind, name: String },

    #[error("{archive} archive is unreadable: {reason}")]
    Archive { archive: ArchiveKind, reason: String },

    #[error("malformed table {entry}: {reason}")]
    MalformedTable { entry: String, reason: String },

    #[error("duplicate key {key} in table {table}")]
    DuplicateKey { table: String, key: String },

    #[error("table {table} was not ingested")]
    IncompleteStore { table: String },

    #[error("bundle source error: {0}")]
    Source(#[from] anyhow::Error),

    #[error("initialization timed out after {secs}s")]
    Timeout { secs: u64 },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Coarse classification of a failure, for callers deciding what to do next.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureClass {
    /// Embedded constants or config values are unusable
    Configuration,
    /// Acquiring the raw bytes failed (network, disk)
    Fetch,
    /// Wrong keys or a corrupted download
    KeysOrCorruption,
    /// The signed payload does not match its signature
    Tampering,
    /// Decoded tables do not have the expected shape
    SchemaDrift,
    /// The caller's deadline elapsed
    Timeout,
}

impl SdbError {
    pub fn class(&self) -> FailureClass {
        match self {
            SdbError::Configuration(_) => FailureClass::Configuration,
            SdbError::Source(_) | SdbError::Io(_) => FailureClass::Fetch,
            SdbError::Decryption(_) => FailureClass::KeysOrCorruption,
            SdbError::Archive { archive, .. } | SdbError::EntryNotFound { archive, .. } => {
                match archive {
                    ArchiveKind::Outer => FailureClass::KeysOrCorruption,
                    ArchiveKind::Inner => FailureClass::SchemaDrift,
                }
            }
            SdbError::Integrity(_) => FailureClass::Tampering,
            SdbError::MalformedTable { .. }
            | SdbError::DuplicateKey { .. }
            | SdbError::IncompleteStore { .. } => FailureClass::SchemaDrift,
            SdbError::Timeout { .. } => FailureClass::Timeout,
        }
    }

    /// Only failures outside the decode pipeline are worth retrying.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self.class(),
            FailureClass::Fetch | FailureClass::Timeout
        )
    }

    pub fn malformed(entry: impl Into<String>, reason: impl Into<String>) -> Self {
        SdbError::MalformedTable {
            entry: entry.into(),
            reason: reason.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_fetch_and_timeout_retry() {
        assert!(SdbError::Source(anyhow::anyhow!("connection reset")).is_retryable());
        assert!(SdbError::Timeout { secs: 30 }.is_retryable());

        assert!(!SdbError::Integrity("bad signature".into()).is_retryable());
        assert!(!SdbError::Decryption("bad padding".into()).is_retryable());
        assert!(!SdbError::DuplicateKey {
            table: "character".into(),
            key: "1".into()
        }
        .is_retryable());
    }

    #[test]
    fn test_missing_entry_class_depends_on_archive() {
        let outer = SdbError::EntryNotFound {
            archive: ArchiveKind::Outer,
            name: "sign".into(),
        };
        let inner = SdbError::EntryNotFound {
            archive: ArchiveKind::Inner,
            name: "CharacterTable.json".into(),
        };

        assert_eq!(outer.class(), FailureClass::KeysOrCorruption);
        assert_eq!(inner.class(), FailureClass::SchemaDrift);
    }

    #[test]
    fn test_display_names_entry() {
        let err = SdbError::EntryNotFound {
            archive: ArchiveKind::Inner,
            name: "missing".into(),
        };
        assert_eq!(err.to_string(), "inner archive has no entry named \"missing\"");
    }
}
