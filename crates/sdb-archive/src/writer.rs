//! Building in-memory ZIP archives (bundle fixtures and re-packing)

use sdb_core::{ArchiveKind, SdbError, SdbResult};
use std::io::{Cursor, Write};
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

pub struct ArchiveWriter {
    kind: ArchiveKind,
    zip: ZipWriter<Cursor<Vec<u8>>>,
    options: SimpleFileOptions,
}

impl ArchiveWriter {
    pub fn new(kind: ArchiveKind) -> Self {
        Self {
            kind,
            zip: ZipWriter::new(Cursor::new(Vec::new())),
            options: SimpleFileOptions::default().compression_method(CompressionMethod::Deflated),
        }
    }

    /// Store entries without compression (the outer archive of a bundle
    /// holds already-encrypted data).
    pub fn stored(mut self) -> Self {
        self.options = self.options.compression_method(CompressionMethod::Stored);
        self
    }

    pub fn add(&mut self, name: &str, content: &[u8]) -> SdbResult<()> {
        self.zip
            .start_file(name, self.options)
            .map_err(|e| self.failed(name, e))?;
        self.zip
            .write_all(content)
            .map_err(|e| self.failed(name, e))?;
        Ok(())
    }

    pub fn add_directory(&mut self, name: &str) -> SdbResult<()> {
        self.zip
            .add_directory(name, self.options)
            .map_err(|e| self.failed(name, e))
    }

    pub fn finish(self) -> SdbResult<Vec<u8>> {
        let kind = self.kind;
        let cursor = self.zip.finish().map_err(|e| SdbError::Archive {
            archive: kind,
            reason: format!("finishing archive: {e}"),
        })?;
        Ok(cursor.into_inner())
    }

    fn failed(&self, name: &str, err: impl std::fmt::Display) -> SdbError {
        SdbError::Archive {
            archive: self.kind,
            reason: format!("writing {name}: {err}"),
        }
    }
}

impl std::fmt::Debug for ArchiveWriter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ArchiveWriter").field("kind", &self.kind).finish()
    }
}
