//! Policy configuration: the resolved switches the controller consumes.
//!
//! The document on disk is pretty-printed JSON. Snake-case keys are
//! canonical; the older human-readable keys are still accepted on read.

use crate::types::{ContainerSlot, ItemKind};
use serde::{Deserialize, Serialize};
use std::path::Path;

pub const SMALL_BACKPACK_KIND: ItemKind = 2068884361;
pub const LARGE_BACKPACK_KIND: ItemKind = -907422733;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PolicyConfig {
    /// When false, the held item is vetoed from dropping on death.
    #[serde(alias = "Drop Held Item on Death")]
    pub drop_held_item_on_death:   bool,
    /// When false, suicides are neither captured nor restored.
    #[serde(alias = "Restore Inventory on Suicide")]
    pub restore_on_suicide:        bool,
    /// Keep backpack-type items equipped through death.
    #[serde(alias = "Restore Backpacks on Death")]
    pub restore_backpacks_on_death: bool,
    /// When false, a world reset purges every stored bundle.
    #[serde(alias = "Restore Inventory on Wipe")]
    pub restore_inventory_on_wipe: bool,
    /// Catalog ids treated as backpack-type containers.
    pub backpack_kinds:            Vec<ItemKind>,
    /// Containers emptied of starter items before a restore.
    pub starter_containers:        Vec<ContainerSlot>,
}

impl Default for PolicyConfig {
    fn default() -> Self {
        Self {
            drop_held_item_on_death:    false,
            restore_on_suicide:         true,
            restore_backpacks_on_death: true,
            restore_inventory_on_wipe:  false,
            backpack_kinds:             vec![SMALL_BACKPACK_KIND, LARGE_BACKPACK_KIND],
            starter_containers:         vec![ContainerSlot::Belt, ContainerSlot::Worn],
        }
    }
}

impl PolicyConfig {
    /// Load from `path`. A missing or malformed document is replaced on
    /// disk by the defaults, which are then returned. Only a failure to
    /// write that replacement is an error.
    pub fn load(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let content = match std::fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                log::info!("No config at {}, writing defaults", path.display());
                let config = Self::default();
                config.save(path)?;
                return Ok(config);
            }
            Err(e) => return Err(anyhow::anyhow!("Cannot read {}: {e}", path.display())),
        };

        match Self::from_json(&content) {
            Ok(config) => Ok(config),
            Err(e) => {
                log::error!("Error reading config {}: {e}. Generating new config.", path.display());
                let config = Self::default();
                config.save(path)?;
                Ok(config)
            }
        }
    }

    /// Parse a config document. `null` parses as the defaults.
    pub fn from_json(content: &str) -> serde_json::Result<Self> {
        let parsed: Option<Self> = serde_json::from_str(content)?;
        Ok(parsed.unwrap_or_default())
    }

    pub fn save(&self, path: impl AsRef<Path>) -> anyhow::Result<()> {
        let path = path.as_ref();
        if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
            std::fs::create_dir_all(dir)?;
        }
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)
            .map_err(|e| anyhow::anyhow!("Cannot write {}: {e}", path.display()))?;
        Ok(())
    }

    pub fn is_backpack(&self, kind: ItemKind) -> bool {
        self.backpack_kinds.contains(&kind)
    }

    /// Config with hardcoded defaults for use in tests.
    pub fn default_test() -> Self {
        Self::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_values() {
        let config = PolicyConfig::default();
        assert!(!config.drop_held_item_on_death);
        assert!(config.restore_on_suicide);
        assert!(config.restore_backpacks_on_death);
        assert!(!config.restore_inventory_on_wipe);
        assert!(config.is_backpack(SMALL_BACKPACK_KIND));
        assert!(config.is_backpack(LARGE_BACKPACK_KIND));
    }

    #[test]
    fn missing_fields_fall_back_to_defaults() {
        let config = PolicyConfig::from_json(r#"{ "restore_on_suicide": false }"#).unwrap();
        assert!(!config.restore_on_suicide);
        assert!(config.restore_backpacks_on_death);
        assert_eq!(config.starter_containers, vec![ContainerSlot::Belt, ContainerSlot::Worn]);
    }

    #[test]
    fn legacy_keys_are_accepted() {
        let config = PolicyConfig::from_json(
            r#"{
                "Drop Held Item on Death": true,
                "Restore Inventory on Suicide": false,
                "Restore Backpacks on Death": false,
                "Restore Inventory on Wipe": true
            }"#,
        )
        .unwrap();
        assert!(config.drop_held_item_on_death);
        assert!(!config.restore_on_suicide);
        assert!(!config.restore_backpacks_on_death);
        assert!(config.restore_inventory_on_wipe);
    }

    #[test]
    fn unknown_keys_are_ignored_and_null_is_default() {
        let config = PolicyConfig::from_json(r#"{ "Some Future Switch": 3 }"#).unwrap();
        assert_eq!(config, PolicyConfig::default());
        assert_eq!(PolicyConfig::from_json("null").unwrap(), PolicyConfig::default());
    }

    #[test]
    fn malformed_document_is_an_error() {
        assert!(PolicyConfig::from_json("{ not json").is_err());
        assert!(PolicyConfig::from_json(r#"{ "restore_on_suicide": "yes" }"#).is_err());
    }
}
