//! Where raw bundle bytes come from

use bytes::Bytes;
use sdb_core::{SdbError, SdbResult};
use std::future::Future;
use std::path::PathBuf;

use crate::raw::RawBundle;

/// Acquires the raw bundle for a location (file path, URL, ...).
///
/// Implementations own their transport and retry policy; the decoder only
/// ever sees the complete byte sequence.
pub trait BundleSource: Send + Sync {
    fn fetch(&self, location: &str) -> impl Future<Output = anyhow::Result<Vec<u8>>> + Send;
}

/// Fetch from `source` and wrap the result as a [`RawBundle`].
pub async fn load<S: BundleSource>(source: &S, location: &str) -> SdbResult<RawBundle> {
    let bytes = source.fetch(location).await.map_err(SdbError::Source)?;
    let raw = RawBundle::new(bytes);
    tracing::info!(
        location,
        size = raw.len(),
        sha256 = %raw.identity().sha256_hex(),
        "fetched static data bundle"
    );
    Ok(raw)
}

/// Reads the location as a filesystem path, optionally relative to a root.
#[derive(Debug, Clone, Default)]
pub struct FileSource {
    root: Option<PathBuf>,
}

impl FileSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_root(root: impl Into<PathBuf>) -> Self {
        Self {
            root: Some(root.into()),
        }
    }

    fn resolve(&self, location: &str) -> PathBuf {
        match &self.root {
            Some(root) => root.join(location),
            None => PathBuf::from(location),
        }
    }
}

impl BundleSource for FileSource {
    async fn fetch(&self, location: &str) -> anyhow::Result<Vec<u8>> {
        let path = self.resolve(location);
        let bytes = tokio::fs::read(&path)
            .await
            .map_err(|e| anyhow::anyhow!("reading {}: {e}", path.display()))?;
        Ok(bytes)
    }
}

/// Serves one in-memory bundle regardless of location.
#[derive(Debug, Clone)]
pub struct MemorySource {
    bytes: Bytes,
}

impl MemorySource {
    pub fn new(bytes: impl Into<Bytes>) -> Self {
        Self {
            bytes: bytes.into(),
        }
    }
}

impl BundleSource for MemorySource {
    async fn fetch(&self, _location: &str) -> anyhow::Result<Vec<u8>> {
        Ok(self.bytes.to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sdb_core::FailureClass;

    #[tokio::test]
    async fn test_file_source_reads_relative_to_root() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("bundle.bin"), b"payload").unwrap();

        let source = FileSource::with_root(dir.path());
        let raw = load(&source, "bundle.bin").await.unwrap();

        assert_eq!(raw.as_bytes(), b"payload");
        assert_eq!(raw.identity().size, 7);
    }

    #[tokio::test]
    async fn test_missing_file_is_fetch_failure() {
        let dir = tempfile::tempdir().unwrap();
        let source = FileSource::with_root(dir.path());

        let err = load(&source, "absent.bin").await.unwrap_err();
        assert!(matches!(err, SdbError::Source(_)));
        assert_eq!(err.class(), FailureClass::Fetch);
        assert!(err.is_retryable());
    }

    #[tokio::test]
    async fn test_memory_source_ignores_location() {
        let source = MemorySource::new(vec![1u8, 2, 3]);
        let a = load(&source, "x").await.unwrap();
        let b = load(&source, "y").await.unwrap();
        assert_eq!(a.identity(), b.identity());
    }
}
