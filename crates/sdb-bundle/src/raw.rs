use bytes::Bytes;
use sdb_core::BundleIdentity;
use sha2::{Digest, Sha256};

/// The bundle exactly as fetched, with its identity computed once.
pub struct RawBundle {
    bytes: Bytes,
    identity: BundleIdentity,
}

impl RawBundle {
    pub fn new(bytes: impl Into<Bytes>) -> Self {
        let bytes = bytes.into();
        let identity = BundleIdentity {
            sha256: Sha256::digest(&bytes).into(),
            size: bytes.len() as u64,
        };
        Self { bytes, identity }
    }

    pub fn identity(&self) -> BundleIdentity {
        self.identity
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

impl std::fmt::Debug for RawBundle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RawBundle")
            .field("identity", &self.identity)
            .finish()
    }
}
