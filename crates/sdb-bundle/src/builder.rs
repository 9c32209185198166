//! Producing bundles: the decode pipeline run backwards
//!
//! Used by tests and tooling to create bundles the decoder accepts; the
//! signing key never ships with a consumer.

use rsa::RsaPrivateKey;
use sdb_archive::ArchiveWriter;
use sdb_core::{ArchiveKind, SdbResult};
use sdb_crypto::{cbc, counter, signature, BundleKeys};

use crate::{DATA_ENTRY, SIGN_ENTRY};

/// Collects inner entries and seals them into a raw bundle.
pub struct BundleBuilder<'a> {
    keys: &'a BundleKeys,
    signing_key: &'a RsaPrivateKey,
    entries: Vec<(String, Vec<u8>)>,
}

impl<'a> BundleBuilder<'a> {
    pub fn new(keys: &'a BundleKeys, signing_key: &'a RsaPrivateKey) -> Self {
        Self {
            keys,
            signing_key,
            entries: Vec::new(),
        }
    }

    pub fn entry(mut self, name: impl Into<String>, content: impl Into<Vec<u8>>) -> Self {
        self.add(name, content);
        self
    }

    pub fn add(&mut self, name: impl Into<String>, content: impl Into<Vec<u8>>) {
        self.entries.push((name.into(), content.into()));
    }

    /// Inner zip → counter stream → sign → outer zip → CBC.
    pub fn build(&self) -> SdbResult<Vec<u8>> {
        let mut inner = ArchiveWriter::new(ArchiveKind::Inner);
        for (name, content) in &self.entries {
            inner.add(name, content)?;
        }
        let inner_bytes = inner.finish()?;

        let stream = self.keys.stream_material()?;
        let data = counter::process(&inner_bytes, stream.key(), stream.iv())?;
        let sign = signature::sign(self.signing_key, &data)?;

        let raw = seal(self.keys, &sign, &data)?;
        tracing::debug!(
            entries = self.entries.len(),
            size = raw.len(),
            "built static data bundle"
        );
        Ok(raw)
    }
}

/// Wrap arbitrary `sign` and `data` entries in the outer layer.
///
/// No relationship between the two is checked, so this can produce bundles
/// that fail signature verification.
pub fn seal(keys: &BundleKeys, sign: &[u8], data: &[u8]) -> SdbResult<Vec<u8>> {
    let mut outer = ArchiveWriter::new(ArchiveKind::Outer).stored();
    outer.add(SIGN_ENTRY, sign)?;
    outer.add(DATA_ENTRY, data)?;
    seal_archive(keys, &outer.finish()?)
}

/// Encrypt an already-built outer archive.
pub fn seal_archive(keys: &BundleKeys, outer_archive: &[u8]) -> SdbResult<Vec<u8>> {
    let layer = keys.layer_material()?;
    Ok(cbc::encrypt(outer_archive, layer.key(), layer.iv())?)
}

impl std::fmt::Debug for BundleBuilder<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BundleBuilder")
            .field("entries", &self.entries.len())
            .field("signing_key", &"[REDACTED]")
            .finish()
    }
}
