use serde::{Deserialize, Serialize};
use std::fmt;

/// Position of a decode in the bundle pipeline.
///
/// Stages are strictly ordered; a decode never moves backwards and never
/// skips one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum DecodeStage {
    RawLoaded,
    Layer1Decrypted,
    OuterArchiveOpened,
    SignatureChecked,
    InnerStreamDecrypted,
    InnerArchiveOpened,
    Ready,
}

impl DecodeStage {
    pub const ALL: [DecodeStage; 7] = [
        DecodeStage::RawLoaded,
        DecodeStage::Layer1Decrypted,
        DecodeStage::OuterArchiveOpened,
        DecodeStage::SignatureChecked,
        DecodeStage::InnerStreamDecrypted,
        DecodeStage::InnerArchiveOpened,
        DecodeStage::Ready,
    ];

    /// The stage after this one, `None` once `Ready`.
    pub fn next(self) -> Option<DecodeStage> {
        let idx = Self::ALL.iter().position(|s| *s == self)?;
        Self::ALL.get(idx + 1).copied()
    }
}

/// Which of the two nested containers an archive is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ArchiveKind {
    /// Holds the `sign` and `data` entries; pre-authentication
    Outer,
    /// Holds the table files; only reachable after signature verification
    Inner,
}

impl fmt::Display for ArchiveKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArchiveKind::Outer => f.write_str("outer"),
            ArchiveKind::Inner => f.write_str("inner"),
        }
    }
}

/// Identity of a raw bundle: SHA-256 of the exact bytes plus their length.
///
/// Stable for a given source file; used by external code for caching and
/// version checks.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct BundleIdentity {
    pub sha256: [u8; 32],
    pub size: u64,
}

impl BundleIdentity {
    pub fn sha256_hex(&self) -> String {
        let mut s = String::with_capacity(64);
        for byte in &self.sha256 {
            s.push_str(&format!("{:02x}", byte));
        }
        s
    }
}

impl fmt::Display for BundleIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({} bytes)", self.sha256_hex(), self.size)
    }
}
