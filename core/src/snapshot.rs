//! Snapshot model: the persisted shape of a captured inventory.
//!
//! RULE: This module is pure data. Capturing lives in builder.rs,
//! reconstruction in restore.rs. Field names are the stable on-disk
//! names; never rename one without a migration.

use crate::types::{ContainerSlot, ItemFlags, ItemKind, SkinId};
use serde::{Deserialize, Serialize};

/// One captured item and, transitively, everything nested inside it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItemSnapshot {
    pub item_kind:     ItemKind,
    #[serde(default)]
    pub skin_id:       SkinId,
    pub amount:        u32,
    pub condition:     f32,
    pub max_condition: f32,
    /// Slot index inside the parent container.
    pub slot_position: i32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub custom_text:   Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name:  Option<String>,
    #[serde(default)]
    pub flags:         ItemFlags,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ammo:          Option<AmmoState>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub frequency:     Option<FrequencyState>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub instance_data: Option<InstanceData>,
    /// Flattened copy of `instance_data.blueprint_amount`. Informational only;
    /// restore reads the nested copy.
    #[serde(default)]
    pub blueprint_amount: i32,
    /// Flattened copy of `instance_data.blueprint_target`. Informational only.
    #[serde(default)]
    pub blueprint_target: i32,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub attachments:   Vec<ModSnapshot>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub contents:      Vec<ItemSnapshot>,
}

impl ItemSnapshot {
    /// A plain item with full condition and no payload.
    pub fn new(item_kind: ItemKind, amount: u32, slot_position: i32) -> Self {
        Self {
            item_kind,
            skin_id: 0,
            amount,
            condition: 100.0,
            max_condition: 100.0,
            slot_position,
            custom_text: None,
            display_name: None,
            flags: ItemFlags::NONE,
            ammo: None,
            frequency: None,
            instance_data: None,
            blueprint_amount: 0,
            blueprint_target: 0,
            attachments: Vec::new(),
            contents: Vec::new(),
        }
    }

    pub fn with_contents(mut self, contents: Vec<ItemSnapshot>) -> Self {
        self.contents = contents;
        self
    }

    pub fn with_attachments(mut self, attachments: Vec<ModSnapshot>) -> Self {
        self.attachments = attachments;
        self
    }

    /// Number of items in this subtree, attachments included.
    pub fn item_count(&self) -> usize {
        1 + self.attachments.len()
            + self.contents.iter().map(ItemSnapshot::item_count).sum::<usize>()
    }

    /// Nesting depth. A leaf item has depth 1.
    pub fn depth(&self) -> usize {
        1 + self.contents.iter().map(ItemSnapshot::depth).max().unwrap_or(0)
    }
}

/// Loaded magazine state of a ranged weapon.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AmmoState {
    pub loaded:    u32,
    /// Catalog short name of the loaded ammunition, if it had one.
    #[serde(default)]
    pub ammo_kind: Option<String>,
}

/// Tuned channel of a radio device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FrequencyState {
    pub channel: i32,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstanceData {
    #[serde(default)]
    pub data_int:         i32,
    #[serde(default)]
    pub blueprint_target: i32,
    #[serde(default)]
    pub blueprint_amount: i32,
}

impl InstanceData {
    /// The only gate for writing instance data back on restore.
    pub fn is_valid(&self) -> bool {
        self.data_int != 0 || self.blueprint_target != 0 || self.blueprint_amount != 0
    }
}

/// An attachment. Attachments never hold contents of their own.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModSnapshot {
    pub item_kind: ItemKind,
    pub amount:    u32,
    pub condition: f32,
}

/// Occupied slots of one physical container, in slot order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ContainerSnapshot(pub Vec<ItemSnapshot>);

impl ContainerSnapshot {
    pub fn items(&self) -> &[ItemSnapshot] { &self.0 }

    pub fn len(&self) -> usize { self.0.len() }

    pub fn is_empty(&self) -> bool { self.0.is_empty() }

    pub fn item_count(&self) -> usize {
        self.0.iter().map(ItemSnapshot::item_count).sum()
    }
}

impl From<Vec<ItemSnapshot>> for ContainerSnapshot {
    fn from(items: Vec<ItemSnapshot>) -> Self {
        Self(items)
    }
}

/// Everything captured for one subject at one event.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SubjectBundle {
    #[serde(default)]
    pub main: ContainerSnapshot,
    #[serde(default)]
    pub belt: ContainerSnapshot,
    #[serde(default)]
    pub worn: ContainerSnapshot,
}

impl SubjectBundle {
    pub fn container(&self, slot: ContainerSlot) -> &ContainerSnapshot {
        match slot {
            ContainerSlot::Main => &self.main,
            ContainerSlot::Belt => &self.belt,
            ContainerSlot::Worn => &self.worn,
        }
    }

    pub fn item_count(&self) -> usize {
        ContainerSlot::ALL
            .iter()
            .map(|slot| self.container(*slot).item_count())
            .sum()
    }
}
