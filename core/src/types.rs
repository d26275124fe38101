//! Shared primitive types used across the entire crate.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{BitOr, BitOrAssign};

/// A scheduling tick of the hosting runtime.
pub type Tick = u64;

/// A stable, unique identifier for a player account.
pub type SubjectId = u64;

/// Catalog id of an item type. Negative ids are valid catalog entries.
pub type ItemKind = i32;

/// Cosmetic variant id.
pub type SkinId = u64;

/// Handle to a live container in the hosting world. Never persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ContainerId(pub u64);

/// Handle to a live item in the hosting world. Never persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ItemId(pub u64);

/// Handle to a live death marker (corpse) in the hosting world.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MarkerId(pub u64);

/// The three per-subject containers a bundle captures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContainerSlot {
    Main,
    Belt,
    Worn,
}

impl ContainerSlot {
    pub const ALL: [ContainerSlot; 3] = [Self::Main, Self::Belt, Self::Worn];

    pub fn name(&self) -> &'static str {
        match self {
            Self::Main => "main",
            Self::Belt => "belt",
            Self::Worn => "worn",
        }
    }
}

/// Opaque item state bit-set. Unknown bits are carried through untouched.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ItemFlags(pub u32);

impl ItemFlags {
    pub const NONE:         ItemFlags = ItemFlags(0);
    pub const BLUEPRINT:    ItemFlags = ItemFlags(1 << 0);
    pub const ON_FIRE:      ItemFlags = ItemFlags(1 << 1);
    pub const NON_TRADABLE: ItemFlags = ItemFlags(1 << 2);
    pub const COOKING:      ItemFlags = ItemFlags(1 << 3);
    pub const IS_LOCKED:    ItemFlags = ItemFlags(1 << 4);

    pub fn bits(&self) -> u32 { self.0 }

    pub fn is_empty(&self) -> bool { self.0 == 0 }

    pub fn contains(&self, other: ItemFlags) -> bool {
        self.0 & other.0 == other.0
    }
}

impl BitOr for ItemFlags {
    type Output = ItemFlags;

    fn bitor(self, rhs: Self) -> Self::Output {
        ItemFlags(self.0 | rhs.0)
    }
}

impl BitOrAssign for ItemFlags {
    fn bitor_assign(&mut self, rhs: Self) {
        self.0 |= rhs.0;
    }
}

impl fmt::Display for ItemFlags {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#x}", self.0)
    }
}
