//! Read-only access to an in-memory ZIP archive
//!
//! Lookups take `&self`: each read works on a cheap clone of the archive
//! handle (shared central directory, shared bytes), so one `Archive` can be
//! read from many threads at once.

use bytes::Bytes;
use sdb_core::{ArchiveKind, SdbError, SdbResult};
use std::io::{Cursor, Read};
use zip::result::ZipError;
use zip::ZipArchive;

/// Upper bound on the buffer reserved from an entry's declared size; the
/// header value is unauthenticated.
const MAX_PREALLOC: u64 = 1 << 20;

#[derive(Clone)]
pub struct Archive {
    kind: ArchiveKind,
    zip: ZipArchive<Cursor<Bytes>>,
    /// File entry names in archive order (directories excluded)
    names: Vec<String>,
}

impl Archive {
    /// Parse the central directory of `bytes`.
    pub fn open(kind: ArchiveKind, bytes: impl Into<Bytes>) -> SdbResult<Self> {
        let zip = ZipArchive::new(Cursor::new(bytes.into())).map_err(|e| SdbError::Archive {
            archive: kind,
            reason: e.to_string(),
        })?;

        let names: Vec<String> = zip
            .file_names()
            .filter(|name| !name.ends_with('/'))
            .map(str::to_owned)
            .collect();

        tracing::debug!(archive = %kind, entries = names.len(), "archive opened");

        Ok(Self { kind, zip, names })
    }

    pub fn kind(&self) -> ArchiveKind {
        self.kind
    }

    /// All file entry names, in archive order.
    pub fn entries(&self) -> &[String] {
        &self.names
    }

    pub fn contains(&self, name: &str) -> bool {
        self.names.iter().any(|n| n == name)
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// The full, decompressed content of entry `name`.
    pub fn read(&self, name: &str) -> SdbResult<Vec<u8>> {
        let mut zip = self.zip.clone();
        let mut file = match zip.by_name(name) {
            Ok(file) => file,
            Err(ZipError::FileNotFound) => {
                return Err(SdbError::EntryNotFound {
                    archive: self.kind,
                    name: name.to_string(),
                })
            }
            Err(e) => return Err(self.unreadable(name, e)),
        };
        if file.is_dir() {
            return Err(SdbError::EntryNotFound {
                archive: self.kind,
                name: name.to_string(),
            });
        }

        let mut content = Vec::with_capacity(file.size().min(MAX_PREALLOC) as usize);
        file.read_to_end(&mut content)
            .map_err(|e| self.unreadable(name, e))?;
        Ok(content)
    }

    fn unreadable(&self, name: &str, err: impl std::fmt::Display) -> SdbError {
        SdbError::Archive {
            archive: self.kind,
            reason: format!("reading {name}: {err}"),
        }
    }
}

impl std::fmt::Debug for Archive {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Archive")
            .field("kind", &self.kind)
            .field("entries", &self.names.len())
            .finish()
    }
}
