//! Layered bundle decode: CBC → outer zip → signature → counter stream → inner zip

use sdb_archive::Archive;
use sdb_core::{ArchiveKind, BundleIdentity, DecodeStage, SdbError, SdbResult};
use sdb_crypto::{cbc, counter, BundleKeys, SignatureVerifier};
use std::time::Instant;
use tracing::{debug, warn};

use crate::raw::RawBundle;
use crate::{DATA_ENTRY, SIGN_ENTRY};

/// Decodes raw bundles with one set of keys.
#[derive(Debug, Clone)]
pub struct BundleDecoder {
    keys: BundleKeys,
    verifier: SignatureVerifier,
}

impl BundleDecoder {
    /// Fails with a configuration error if the public key is unusable.
    pub fn new(keys: BundleKeys) -> SdbResult<Self> {
        let verifier = SignatureVerifier::new(keys.public_key())?;
        Ok(Self { keys, verifier })
    }

    pub fn keys(&self) -> &BundleKeys {
        &self.keys
    }

    /// Run the full pipeline over `raw`.
    ///
    /// Either every stage succeeds and the inner archive is returned, or the
    /// first failing stage's error is.
    pub fn decode(&self, raw: &RawBundle) -> SdbResult<DecodedBundle> {
        let mut progress = Progress::new(raw.identity());
        let result = self.run(raw, &mut progress);
        if let Err(e) = &result {
            warn!(
                stage = ?progress.stage,
                class = ?e.class(),
                "bundle decode failed: {e}"
            );
        }
        result
    }

    fn run(&self, raw: &RawBundle, progress: &mut Progress) -> SdbResult<DecodedBundle> {
        let layer = self.keys.layer_material()?;
        let outer_bytes = cbc::decrypt(raw.as_bytes(), layer.key(), layer.iv())?;
        drop(layer);
        progress.advance(DecodeStage::Layer1Decrypted);

        let outer = Archive::open(ArchiveKind::Outer, outer_bytes)?;
        progress.advance(DecodeStage::OuterArchiveOpened);

        let signature = outer.read(SIGN_ENTRY)?;
        let data = outer.read(DATA_ENTRY)?;
        drop(outer);
        if !self.verifier.verify(&data, &signature) {
            return Err(SdbError::Integrity(format!(
                "signature over {} bytes of {DATA_ENTRY:?} does not verify",
                data.len()
            )));
        }
        progress.advance(DecodeStage::SignatureChecked);

        let stream = self.keys.stream_material()?;
        let mut inner_bytes = Vec::with_capacity(data.len());
        counter::process_stream(data.as_slice(), &mut inner_bytes, stream.key(), stream.iv())?;
        drop(stream);
        progress.advance(DecodeStage::InnerStreamDecrypted);

        let archive = Archive::open(ArchiveKind::Inner, inner_bytes)?;
        progress.advance(DecodeStage::InnerArchiveOpened);

        progress.advance(DecodeStage::Ready);
        Ok(DecodedBundle {
            identity: progress.identity,
            archive,
        })
    }
}

struct Progress {
    identity: BundleIdentity,
    stage: DecodeStage,
    started: Instant,
}

impl Progress {
    fn new(identity: BundleIdentity) -> Self {
        debug!(bundle = %identity, "decode started");
        Self {
            identity,
            stage: DecodeStage::RawLoaded,
            started: Instant::now(),
        }
    }

    fn advance(&mut self, next: DecodeStage) {
        debug_assert_eq!(self.stage.next(), Some(next), "decode stages are strictly linear");
        self.stage = next;
        debug!(
            stage = ?next,
            elapsed_ms = self.started.elapsed().as_millis() as u64,
            "decode stage reached"
        );
    }
}

/// A fully verified and decrypted bundle: the inner archive plus the
/// identity of the raw bytes it came from.
#[derive(Debug, Clone)]
pub struct DecodedBundle {
    identity: BundleIdentity,
    archive: Archive,
}

impl DecodedBundle {
    pub fn identity(&self) -> BundleIdentity {
        self.identity
    }

    pub fn archive(&self) -> &Archive {
        &self.archive
    }

    /// Entry names in archive order.
    pub fn entries(&self) -> &[String] {
        self.archive.entries()
    }

    pub fn read(&self, name: &str) -> SdbResult<Vec<u8>> {
        self.archive.read(name)
    }
}
