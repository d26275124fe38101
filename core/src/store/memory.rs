//! In-memory backend. Clones share the same underlying map so a test can
//! keep a handle after the store takes ownership.

use super::{BundleMap, BundleStorage};
use crate::error::{NoDropError, NoDropResult};
use std::sync::{Arc, Mutex, MutexGuard};

#[derive(Debug, Default)]
struct Inner {
    bundles:    BundleMap,
    fail_reads: bool,
    writes:     usize,
}

#[derive(Debug, Clone, Default)]
pub struct MemoryStorage {
    inner: Arc<Mutex<Inner>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_bundles(bundles: BundleMap) -> Self {
        let storage = Self::new();
        storage.lock().bundles = bundles;
        storage
    }

    /// Make every subsequent read fail, as an unreadable file would.
    pub fn fail_reads(&self, fail: bool) {
        self.lock().fail_reads = fail;
    }

    /// Snapshot of what was last written.
    pub fn persisted(&self) -> BundleMap {
        self.lock().bundles.clone()
    }

    pub fn write_count(&self) -> usize {
        self.lock().writes
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl BundleStorage for MemoryStorage {
    fn read_all(&self) -> NoDropResult<BundleMap> {
        let inner = self.lock();
        if inner.fail_reads {
            return Err(NoDropError::Other(anyhow::anyhow!("memory storage is unreadable")));
        }
        Ok(inner.bundles.clone())
    }

    fn write_all(&mut self, bundles: &BundleMap) -> NoDropResult<()> {
        let mut inner = self.lock();
        inner.bundles = bundles.clone();
        inner.writes += 1;
        Ok(())
    }
}
