//! The live-world seam.
//!
//! RULE: The core never owns live items. Everything it reads or writes
//! in the running world goes through these two traits; the hosting
//! runtime (or MemoryWorld in tests) implements them.

use crate::types::{
    ContainerId, ContainerSlot, ItemFlags, ItemId, ItemKind, MarkerId, SkinId, SubjectId,
};

/// Per-item state the snapshot engine reads on capture and writes on restore.
#[derive(Debug, Clone, PartialEq)]
pub struct LiveItem {
    pub kind:          ItemKind,
    pub skin:          SkinId,
    pub amount:        u32,
    pub condition:     f32,
    pub max_condition: f32,
    pub position:      i32,
    pub text:          Option<String>,
    pub name:          Option<String>,
    pub flags:         ItemFlags,
    pub instance_data: Option<LiveInstanceData>,
    pub held:          HeldEntity,
    /// Set for the duration of a death event to keep the item equipped.
    pub non_droppable: bool,
    /// Needs network/persistence refresh.
    pub dirty:         bool,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LiveInstanceData {
    pub data_int:         i32,
    pub blueprint_target: i32,
    pub blueprint_amount: i32,
    /// Whether the host may recycle this object through its pool.
    pub should_pool:      bool,
}

/// The world entity an item deploys as when held.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum HeldEntity {
    #[default]
    None,
    Projectile {
        loaded:    u32,
        ammo_kind: Option<ItemKind>,
    },
    Pager {
        frequency: i32,
    },
}

/// Item/container graph plus the item catalog.
pub trait ItemHost {
    /// Occupied items in ascending slot order. `None` if the container
    /// does not exist or cannot be used.
    fn container_items(&self, container: ContainerId) -> Option<Vec<ItemId>>;

    fn item(&self, id: ItemId) -> Option<&LiveItem>;

    fn item_mut(&mut self, id: ItemId) -> Option<&mut LiveItem>;

    /// Sub-container holding weapon mods and similar attachments.
    fn attachment_container(&self, id: ItemId) -> Option<ContainerId>;

    /// Sub-container holding general contents (backpacks, boxes).
    fn contents_container(&self, id: ItemId) -> Option<ContainerId>;

    /// Instantiate a new, unplaced item with catalog defaults.
    /// `None` if the catalog has no such kind.
    fn create_item(&mut self, kind: ItemKind, amount: u32, skin: SkinId) -> Option<ItemId>;

    /// Place an item. `slot = None` takes the first free slot.
    /// Returns false if the container rejects the item.
    fn move_to_container(&mut self, id: ItemId, container: ContainerId, slot: Option<i32>) -> bool;

    /// Remove from whatever holds the item and destroy it, sub-containers included.
    fn destroy_item(&mut self, id: ItemId);

    fn mark_dirty(&mut self, id: ItemId);

    fn kind_by_short_name(&self, short_name: &str) -> Option<ItemKind>;

    fn short_name(&self, kind: ItemKind) -> Option<String>;
}

/// The three containers every player carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SubjectContainers {
    pub main: ContainerId,
    pub belt: ContainerId,
    pub worn: ContainerId,
}

impl SubjectContainers {
    pub fn get(&self, slot: ContainerSlot) -> ContainerId {
        match slot {
            ContainerSlot::Main => self.main,
            ContainerSlot::Belt => self.belt,
            ContainerSlot::Worn => self.worn,
        }
    }
}

/// Subject-level view of the world: players, their remains, chat.
pub trait SubjectHost: ItemHost {
    /// False for NPCs and other non-account subjects.
    fn is_player(&self, subject: SubjectId) -> bool;

    fn subject_containers(&self, subject: SubjectId) -> Option<SubjectContainers>;

    fn is_alive(&self, subject: SubjectId) -> bool;

    /// The subject's most recent death marker.
    fn find_death_marker(&self, subject: SubjectId) -> Option<MarkerId>;

    fn marker_containers(&self, marker: MarkerId) -> Vec<ContainerId>;

    fn destroy_marker(&mut self, marker: MarkerId);

    fn notify(&mut self, subject: SubjectId, message: &str);
}
