//! Snapshot store: owns every captured bundle between capture and restore.
//!
//! RULE: Only this module mutates the bundle map. Durable I/O is
//! delegated to a BundleStorage backend and always happens whole-map:
//! load replaces everything, persist rewrites everything.

mod json_file;
mod memory;
mod sqlite;

pub use json_file::JsonFileStorage;
pub use memory::MemoryStorage;
pub use sqlite::SqliteStorage;

use crate::{error::NoDropResult, snapshot::SubjectBundle, types::SubjectId};
use std::collections::BTreeMap;

pub type BundleMap = BTreeMap<SubjectId, SubjectBundle>;

/// Durable home of the bundle map.
pub trait BundleStorage {
    /// Read the whole map. A store that has never been written reads as empty.
    fn read_all(&self) -> NoDropResult<BundleMap>;

    /// Replace the whole stored map with `bundles`.
    fn write_all(&mut self, bundles: &BundleMap) -> NoDropResult<()>;
}

pub struct SnapshotStore {
    bundles: BundleMap,
    storage: Box<dyn BundleStorage>,
    dirty:   bool,
}

impl SnapshotStore {
    pub fn new(storage: Box<dyn BundleStorage>) -> Self {
        Self { bundles: BundleMap::new(), storage, dirty: false }
    }

    /// A store backed by a fresh MemoryStorage (used in tests).
    pub fn in_memory() -> Self {
        Self::new(Box::new(MemoryStorage::new()))
    }

    /// Store `bundle` for `subject`, replacing any earlier capture.
    pub fn put(&mut self, subject: SubjectId, bundle: SubjectBundle) {
        if self.bundles.insert(subject, bundle).is_some() {
            log::debug!("subject={subject} replaced an unrestored bundle");
        }
        self.dirty = true;
    }

    /// Remove and return the bundle for `subject`. A bundle can be taken once.
    pub fn take(&mut self, subject: SubjectId) -> Option<SubjectBundle> {
        let bundle = self.bundles.remove(&subject);
        if bundle.is_some() {
            self.dirty = true;
        }
        bundle
    }

    pub fn peek(&self, subject: SubjectId) -> Option<&SubjectBundle> {
        self.bundles.get(&subject)
    }

    pub fn contains(&self, subject: SubjectId) -> bool {
        self.bundles.contains_key(&subject)
    }

    pub fn len(&self) -> usize {
        self.bundles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bundles.is_empty()
    }

    pub fn subjects(&self) -> impl Iterator<Item = SubjectId> + '_ {
        self.bundles.keys().copied()
    }

    /// Drop every bundle. Returns how many were dropped.
    pub fn clear_all(&mut self) -> usize {
        let dropped = self.bundles.len();
        self.bundles.clear();
        self.dirty = true;
        dropped
    }

    /// Replace the in-memory map with the backend's contents.
    /// On error the in-memory map is left untouched.
    pub fn load(&mut self) -> NoDropResult<usize> {
        self.bundles = self.storage.read_all()?;
        self.dirty = false;
        Ok(self.bundles.len())
    }

    /// Rewrite the backend if anything changed since the last load/persist.
    pub fn persist(&mut self) -> NoDropResult<()> {
        if !self.dirty {
            return Ok(());
        }
        self.force_persist()
    }

    pub fn force_persist(&mut self) -> NoDropResult<()> {
        self.storage.write_all(&self.bundles)?;
        self.dirty = false;
        Ok(())
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }
}
