#![allow(dead_code)]

use rsa::RsaPrivateKey;
use sdb_bundle::{BundleBuilder, BundleSource};
use sdb_crypto::{BundleKeys, PublicKey};
use sdb_tables::CATALOG;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::OnceLock;
use std::time::Duration;

pub const ITERATIONS: u32 = 32;

pub fn signing_key() -> &'static RsaPrivateKey {
    static KEY: OnceLock<RsaPrivateKey> = OnceLock::new();
    KEY.get_or_init(|| RsaPrivateKey::new(&mut rand::thread_rng(), 1024).expect("RSA key generation"))
}

pub fn keys() -> BundleKeys {
    BundleKeys::new(
        b"tables-test-secret".to_vec(),
        [0x31; 16],
        [0x32; 16],
        ITERATIONS,
        PublicKey::from(&signing_key().to_public_key()),
    )
}

/// Seal `entries` (in order) into a bundle `keys()` decodes.
pub fn bundle<N: AsRef<str>, C: AsRef<[u8]>>(entries: &[(N, C)]) -> Vec<u8> {
    let keys = keys();
    let mut builder = BundleBuilder::new(&keys, signing_key());
    for (name, content) in entries {
        builder.add(name.as_ref(), content.as_ref());
    }
    builder.build().expect("building test bundle")
}

/// Every catalog table, empty unless overridden, followed by `extra` entries.
pub fn catalog_bundle(overrides: &[(&str, &str)], extra: &[(&str, &str)]) -> Vec<u8> {
    let mut tables: BTreeMap<&str, &str> = CATALOG
        .tables
        .iter()
        .map(|d| (d.entry, r#"{"records":[]}"#))
        .collect();
    for &(entry, content) in overrides {
        tables.insert(entry, content);
    }

    let mut entries: Vec<(&str, &str)> = tables.into_iter().collect();
    entries.extend_from_slice(extra);
    bundle(&entries)
}

/// Serves fixed bytes, counting fetches, optionally slow and failing at first.
pub struct CountingSource {
    bytes: Vec<u8>,
    delay: Duration,
    failures_left: AtomicUsize,
    fetches: AtomicUsize,
}

impl CountingSource {
    pub fn new(bytes: Vec<u8>) -> Self {
        Self {
            bytes,
            delay: Duration::ZERO,
            failures_left: AtomicUsize::new(0),
            fetches: AtomicUsize::new(0),
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn failing_first(self, failures: usize) -> Self {
        self.failures_left.store(failures, Ordering::SeqCst);
        self
    }

    pub fn fetches(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }
}

impl BundleSource for CountingSource {
    async fn fetch(&self, _location: &str) -> anyhow::Result<Vec<u8>> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        tokio::time::sleep(self.delay).await;

        let failing = self
            .failures_left
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if failing {
            anyhow::bail!("simulated fetch failure");
        }
        Ok(self.bytes.clone())
    }
}
