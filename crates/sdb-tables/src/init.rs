//! One-shot initialization: fetch → decode → ingest, at most once
//!
//! [`StaticData`] owns the inputs and a `tokio::sync::OnceCell`. The first
//! caller of [`StaticData::get`] runs the pipeline; callers arriving while it
//! is in flight wait on the same cell and share the resulting `Arc`. A failed
//! or timed-out attempt leaves the cell empty, so the next call starts over
//! from the fetch.

use sdb_bundle::source::{self, BundleSource};
use sdb_bundle::BundleDecoder;
use sdb_core::{SdbConfig, SdbError, SdbResult};
use sdb_crypto::BundleKeys;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::OnceCell;
use tracing::{info, warn};

use crate::catalog::{Catalog, CATALOG};
use crate::ingest::Ingestor;
use crate::store::RecordStore;

pub struct StaticData<S> {
    source: S,
    location: String,
    keys: BundleKeys,
    catalog: &'static Catalog,
    workers: usize,
    timeout: Option<Duration>,
    store: OnceCell<Arc<RecordStore>>,
}

impl<S: BundleSource> StaticData<S> {
    pub fn new(source: S, location: impl Into<String>, keys: BundleKeys) -> Self {
        Self {
            source,
            location: location.into(),
            keys,
            catalog: &CATALOG,
            workers: 0,
            timeout: None,
            store: OnceCell::new(),
        }
    }

    /// Location, keys, worker count and timeout from `config`.
    pub fn from_config(source: S, config: &SdbConfig) -> SdbResult<Self> {
        let keys = BundleKeys::from_config(&config.bundle)?;
        let timeout = (config.ingest.timeout_secs > 0)
            .then(|| Duration::from_secs(config.ingest.timeout_secs));

        Ok(Self::new(source, config.bundle.location.clone(), keys)
            .with_workers(config.ingest.effective_workers())
            .with_timeout(timeout))
    }

    pub fn with_catalog(mut self, catalog: &'static Catalog) -> Self {
        self.catalog = catalog;
        self
    }

    /// Ingest worker pool size; 0 uses the available parallelism.
    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers;
        self
    }

    /// Bound on one whole initialization attempt.
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    /// The shared store, initializing it first if no attempt has succeeded yet.
    pub async fn get(&self) -> SdbResult<Arc<RecordStore>> {
        self.store
            .get_or_try_init(|| self.initialize())
            .await
            .map(Arc::clone)
    }

    /// The store if initialization already succeeded; never starts one.
    pub fn try_get(&self) -> Option<Arc<RecordStore>> {
        self.store.get().cloned()
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    pub fn is_initialized(&self) -> bool {
        self.store.initialized()
    }

    async fn initialize(&self) -> SdbResult<Arc<RecordStore>> {
        let started = Instant::now();
        let result = match self.timeout {
            Some(limit) => tokio::time::timeout(limit, self.run())
                .await
                .unwrap_or(Err(SdbError::Timeout {
                    secs: limit.as_secs(),
                })),
            None => self.run().await,
        };

        match &result {
            Ok(store) => info!(
                bundle = %store.identity(),
                elapsed_ms = started.elapsed().as_millis() as u64,
                "static data initialized"
            ),
            Err(e) => warn!(
                class = ?e.class(),
                retryable = e.is_retryable(),
                "static data initialization failed: {e}"
            ),
        }
        result
    }

    async fn run(&self) -> SdbResult<Arc<RecordStore>> {
        let raw = source::load(&self.source, &self.location).await?;

        let keys = self.keys.clone();
        let catalog = self.catalog;
        let workers = self.workers;

        // A timeout abandons this task; it runs to completion and is dropped.
        let decoded = tokio::task::spawn_blocking(move || -> SdbResult<RecordStore> {
            let bundle = BundleDecoder::new(keys)?.decode(&raw)?;
            Ingestor::new(workers)?.ingest(&bundle, catalog)
        })
        .await;

        match decoded {
            Ok(store) => Ok(Arc::new(store?)),
            Err(e) if e.is_panic() => std::panic::resume_unwind(e.into_panic()),
            Err(e) => Err(SdbError::Io(std::io::Error::other(format!(
                "initialization task cancelled: {e}"
            )))),
        }
    }
}

impl<S> std::fmt::Debug for StaticData<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StaticData")
            .field("location", &self.location)
            .field("workers", &self.workers)
            .field("timeout", &self.timeout)
            .field("initialized", &self.store.initialized())
            .finish()
    }
}
