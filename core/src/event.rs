//! Life-cycle triggers coming in from the host, and the outcomes the
//! controller reports back.
//! Variants are appended, never removed or reordered.

use crate::types::SubjectId;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeathCause {
    Suicide,
    Other,
}

/// Every trigger the host can deliver.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum LifecycleEvent {
    ServerInitialized,
    Death { subject: SubjectId, cause: DeathCause },
    Respawn { subject: SubjectId },
    Disconnect { subject: SubjectId },
    HeldItemDropQuery { subject: SubjectId },
    WorldReset,
    WorldSave,
    Unload,
    Tick,
}

/// Answer to a held-item drop query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DropDecision {
    /// Do not drop the held item.
    Veto,
    /// Let the host do whatever it does by default.
    NoOpinion,
}

/// What the controller did in response to a trigger.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum LifecycleOutcome {
    InventoryCaptured    { subject: SubjectId, items: usize },
    CaptureSkipped       { subject: SubjectId, reason: String },
    BackpacksKept        { subject: SubjectId, count: usize },
    InventoryRestored    { subject: SubjectId, restored: usize, skipped: usize },
    RestoreFailed        { subject: SubjectId, reason: String },
    NoBundle             { subject: SubjectId },
    StarterItemsStripped { subject: SubjectId, items: usize },
    DropVetoed           { subject: SubjectId },
    DropDeferred         { subject: SubjectId },
    StoreLoaded          { bundles: usize },
    StorePurged          { bundles: usize },
    StorePersisted       { bundles: usize },
    MarkerStripped       { subject: SubjectId, items: usize },
    MarkerMissing        { subject: SubjectId },
}

impl LifecycleOutcome {
    /// Stable name for log lines.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::InventoryCaptured { .. }    => "inventory_captured",
            Self::CaptureSkipped { .. }       => "capture_skipped",
            Self::BackpacksKept { .. }        => "backpacks_kept",
            Self::InventoryRestored { .. }    => "inventory_restored",
            Self::RestoreFailed { .. }        => "restore_failed",
            Self::NoBundle { .. }             => "no_bundle",
            Self::StarterItemsStripped { .. } => "starter_items_stripped",
            Self::DropVetoed { .. }           => "drop_vetoed",
            Self::DropDeferred { .. }         => "drop_deferred",
            Self::StoreLoaded { .. }          => "store_loaded",
            Self::StorePurged { .. }          => "store_purged",
            Self::StorePersisted { .. }       => "store_persisted",
            Self::MarkerStripped { .. }       => "marker_stripped",
            Self::MarkerMissing { .. }        => "marker_missing",
        }
    }
}
