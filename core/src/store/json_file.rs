//! Single-document JSON backend, keyed by subject id.

use super::{BundleMap, BundleStorage};
use crate::error::NoDropResult;
use std::path::{Path, PathBuf};

pub struct JsonFileStorage {
    path: PathBuf,
}

impl JsonFileStorage {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl BundleStorage for JsonFileStorage {
    fn read_all(&self) -> NoDropResult<BundleMap> {
        let content = match std::fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(BundleMap::new()),
            Err(e) => return Err(e.into()),
        };
        if content.trim().is_empty() {
            return Ok(BundleMap::new());
        }
        let bundles: Option<BundleMap> = serde_json::from_str(&content)?;
        Ok(bundles.unwrap_or_default())
    }

    fn write_all(&mut self, bundles: &BundleMap) -> NoDropResult<()> {
        if let Some(dir) = self.path.parent().filter(|d| !d.as_os_str().is_empty()) {
            std::fs::create_dir_all(dir)?;
        }
        // Write beside the target and rename so a crash never leaves half a file.
        let tmp = self.path.with_extension("json.tmp");
        std::fs::write(&tmp, serde_json::to_vec_pretty(bundles)?)?;
        std::fs::rename(&tmp, &self.path)?;
        Ok(())
    }
}
