//! MemoryWorld: a self-contained host for tests and the headless runner.
//!
//! Models just enough of a survival game: a catalog, slotted containers,
//! items with attachment/contents sub-containers, players with
//! main/belt/worn, and corpses that collect dropped items on death.

use crate::{
    types::{
        ContainerId, ContainerSlot, ItemFlags, ItemId, ItemKind, MarkerId, SkinId, SubjectId,
    },
    world::{HeldEntity, ItemHost, LiveInstanceData, LiveItem, SubjectContainers, SubjectHost},
};
use std::collections::{BTreeMap, HashMap};

/// Catalog ids used by `MemoryWorld::demo()`.
pub mod kinds {
    use crate::config::{LARGE_BACKPACK_KIND, SMALL_BACKPACK_KIND};
    use crate::types::ItemKind;

    pub const WOOD:           ItemKind = 3;
    pub const NOTE:           ItemKind = 10;
    pub const BOX:            ItemKind = 101;
    pub const AMMO_RIFLE:     ItemKind = 205;
    pub const AMMO_RIFLE_HV:  ItemKind = 206;
    pub const LUNCHBOX:       ItemKind = 300;
    pub const HOLOSIGHT:      ItemKind = 442289265;
    pub const FLASHLIGHT:     ItemKind = 952603248;
    pub const RIFLE:          ItemKind = 1545779598;
    pub const PAGER:          ItemKind = 1272194103;
    pub const ROCK:           ItemKind = 963906841;
    pub const TORCH:          ItemKind = 795236088;
    pub const BLUEPRINT:      ItemKind = -996920608;
    pub const SMALL_BACKPACK: ItemKind = SMALL_BACKPACK_KIND;
    pub const LARGE_BACKPACK: ItemKind = LARGE_BACKPACK_KIND;
}

pub const MAIN_SLOTS: usize = 24;
pub const BELT_SLOTS: usize = 6;
pub const WORN_SLOTS: usize = 7;

/// What an item deploys as when held.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum HeldKind {
    #[default]
    None,
    Projectile,
    Pager,
}

/// Catalog entry.
#[derive(Debug, Clone)]
pub struct ItemDef {
    pub kind:             ItemKind,
    pub short_name:       String,
    pub default_flags:    ItemFlags,
    pub content_slots:    usize,
    pub attachment_slots: usize,
    pub held:             HeldKind,
    /// Items the catalog puts inside a fresh instance.
    pub default_contents: Vec<(ItemKind, u32)>,
    /// Attachments the catalog mounts on a fresh instance.
    pub default_attachments: Vec<ItemKind>,
}

impl ItemDef {
    pub fn new(kind: ItemKind, short_name: &str) -> Self {
        Self {
            kind,
            short_name: short_name.to_string(),
            default_flags: ItemFlags::NONE,
            content_slots: 0,
            attachment_slots: 0,
            held: HeldKind::None,
            default_contents: Vec::new(),
            default_attachments: Vec::new(),
        }
    }

    pub fn container(mut self, slots: usize) -> Self {
        self.content_slots = slots;
        self
    }

    pub fn mod_slots(mut self, slots: usize) -> Self {
        self.attachment_slots = slots;
        self
    }

    pub fn weapon(mut self) -> Self {
        self.held = HeldKind::Projectile;
        self
    }

    pub fn pager(mut self) -> Self {
        self.held = HeldKind::Pager;
        self
    }

    pub fn flags(mut self, flags: ItemFlags) -> Self {
        self.default_flags = flags;
        self
    }

    pub fn prefilled(mut self, kind: ItemKind, amount: u32) -> Self {
        self.default_contents.push((kind, amount));
        self
    }

    pub fn prefitted(mut self, kind: ItemKind) -> Self {
        self.default_attachments.push(kind);
        self
    }
}

/// Owned, handle-free view of an item tree for equality assertions.
#[derive(Debug, Clone, PartialEq)]
pub struct ItemView {
    pub kind:          ItemKind,
    pub skin:          SkinId,
    pub amount:        u32,
    pub condition:     f32,
    pub max_condition: f32,
    pub position:      i32,
    pub text:          Option<String>,
    pub name:          Option<String>,
    pub flags:         ItemFlags,
    pub instance_data: Option<(i32, i32, i32)>,
    pub held:          HeldEntity,
    pub attachments:   Vec<(ItemKind, u32, f32)>,
    pub contents:      Vec<ItemView>,
}

#[derive(Debug)]
struct Container {
    capacity: usize,
    slots:    BTreeMap<i32, ItemId>,
}

#[derive(Debug)]
struct ItemEntry {
    live:        LiveItem,
    parent:      Option<ContainerId>,
    attachments: Option<ContainerId>,
    contents:    Option<ContainerId>,
}

#[derive(Debug)]
struct Player {
    containers: SubjectContainers,
    alive:      bool,
    npc:        bool,
}

#[derive(Debug)]
struct Marker {
    subject:    SubjectId,
    containers: Vec<ContainerId>,
}

#[derive(Debug, Default)]
pub struct MemoryWorld {
    catalog:       HashMap<ItemKind, ItemDef>,
    containers:    HashMap<ContainerId, Container>,
    items:         HashMap<ItemId, ItemEntry>,
    players:       HashMap<SubjectId, Player>,
    markers:       BTreeMap<MarkerId, Marker>,
    starter_items: Vec<(ContainerSlot, ItemKind, u32)>,
    notifications: Vec<(SubjectId, String)>,
    next_id:       u64,
}

impl MemoryWorld {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, def: ItemDef) {
        self.catalog.insert(def.kind, def);
    }

    pub fn with_items(defs: impl IntoIterator<Item = ItemDef>) -> Self {
        let mut world = Self::new();
        for def in defs {
            world.register(def);
        }
        world
    }

    /// A small survival catalog with rock and torch as starter items.
    pub fn demo() -> Self {
        let mut world = Self::with_items([
            ItemDef::new(kinds::WOOD, "wood"),
            ItemDef::new(kinds::NOTE, "note").flags(ItemFlags::NON_TRADABLE),
            ItemDef::new(kinds::BOX, "box.wooden").container(12),
            ItemDef::new(kinds::AMMO_RIFLE, "ammo.rifle"),
            ItemDef::new(kinds::AMMO_RIFLE_HV, "ammo.rifle.hv"),
            ItemDef::new(kinds::LUNCHBOX, "lunchbox").container(4).prefilled(kinds::WOOD, 10),
            ItemDef::new(kinds::HOLOSIGHT, "weapon.mod.holosight"),
            ItemDef::new(kinds::FLASHLIGHT, "weapon.mod.flashlight"),
            ItemDef::new(kinds::RIFLE, "rifle.ak").weapon().mod_slots(3),
            ItemDef::new(kinds::PAGER, "rf.pager").pager(),
            ItemDef::new(kinds::ROCK, "rock"),
            ItemDef::new(kinds::TORCH, "torch"),
            ItemDef::new(kinds::BLUEPRINT, "blueprintbase").flags(ItemFlags::BLUEPRINT),
            ItemDef::new(kinds::SMALL_BACKPACK, "smallbackpack").container(6),
            ItemDef::new(kinds::LARGE_BACKPACK, "largebackpack").container(12),
        ]);
        world.set_starter_items(vec![
            (ContainerSlot::Belt, kinds::ROCK, 1),
            (ContainerSlot::Belt, kinds::TORCH, 1),
        ]);
        world
    }

    /// Items handed out on every respawn (e.g. rock and torch).
    pub fn set_starter_items(&mut self, items: Vec<(ContainerSlot, ItemKind, u32)>) {
        self.starter_items = items;
    }

    fn next(&mut self) -> u64 {
        self.next_id += 1;
        self.next_id
    }

    pub fn new_container(&mut self, capacity: usize) -> ContainerId {
        let id = ContainerId(self.next());
        self.containers.insert(id, Container { capacity, slots: BTreeMap::new() });
        id
    }

    /// Destroy a container and everything in it, leaving dangling handles.
    pub fn remove_container(&mut self, container: ContainerId) {
        for id in self.container_items(container).unwrap_or_default() {
            self.destroy_item(id);
        }
        self.containers.remove(&container);
    }

    // ── Players ────────────────────────────────────────────────

    pub fn add_player(&mut self, subject: SubjectId) -> SubjectContainers {
        self.add_subject(subject, false)
    }

    pub fn add_npc(&mut self, subject: SubjectId) -> SubjectContainers {
        self.add_subject(subject, true)
    }

    fn add_subject(&mut self, subject: SubjectId, npc: bool) -> SubjectContainers {
        let containers = SubjectContainers {
            main: self.new_container(MAIN_SLOTS),
            belt: self.new_container(BELT_SLOTS),
            worn: self.new_container(WORN_SLOTS),
        };
        self.players.insert(subject, Player { containers, alive: true, npc });
        containers
    }

    /// Mark the player dead and drop every droppable item into a fresh
    /// corpse. Non-droppable items stay put and lose the mark.
    pub fn kill_player(&mut self, subject: SubjectId) -> Option<MarkerId> {
        let containers = {
            let player = self.players.get_mut(&subject)?;
            player.alive = false;
            player.containers
        };

        let marker_id = MarkerId(self.next());
        let mut marker_containers = Vec::new();
        for slot in ContainerSlot::ALL {
            let source = containers.get(slot);
            let capacity = self.containers.get(&source).map_or(0, |c| c.capacity);
            let target = self.new_container(capacity);
            for id in self.container_items(source).unwrap_or_default() {
                let keep = self.item(id).is_some_and(|item| item.non_droppable);
                if keep {
                    if let Some(item) = self.item_mut(id) {
                        item.non_droppable = false;
                    }
                    continue;
                }
                let position = self.item(id).map_or(-1, |item| item.position);
                self.move_to_container(id, target, Some(position));
            }
            marker_containers.push(target);
        }
        self.markers.insert(marker_id, Marker { subject, containers: marker_containers });
        Some(marker_id)
    }

    /// Bring the player back with starter items in fresh belt/worn slots.
    pub fn respawn_player(&mut self, subject: SubjectId) -> Option<SubjectContainers> {
        let containers = {
            let player = self.players.get_mut(&subject)?;
            player.alive = true;
            player.containers
        };
        for (slot, kind, amount) in self.starter_items.clone() {
            self.give(subject, slot, kind, amount);
        }
        Some(containers)
    }

    /// Create an item and put it in the first free slot of a player container.
    pub fn give(&mut self, subject: SubjectId, slot: ContainerSlot, kind: ItemKind, amount: u32) -> Option<ItemId> {
        let target = self.players.get(&subject)?.containers.get(slot);
        self.give_to(target, kind, amount, None)
    }

    /// Create an item inside another item's contents.
    pub fn give_into(&mut self, parent: ItemId, kind: ItemKind, amount: u32) -> Option<ItemId> {
        let target = self.items.get(&parent)?.contents?;
        self.give_to(target, kind, amount, None)
    }

    /// Create an attachment on another item.
    pub fn attach(&mut self, parent: ItemId, kind: ItemKind) -> Option<ItemId> {
        let target = self.items.get(&parent)?.attachments?;
        self.give_to(target, kind, 1, None)
    }

    pub fn give_to(&mut self, container: ContainerId, kind: ItemKind, amount: u32, slot: Option<i32>) -> Option<ItemId> {
        let id = self.create_item(kind, amount, 0)?;
        if self.move_to_container(id, container, slot) {
            Some(id)
        } else {
            self.destroy_item(id);
            None
        }
    }

    // ── Inspection ─────────────────────────────────────────────

    pub fn describe_container(&self, container: ContainerId) -> Vec<ItemView> {
        self.container_items(container)
            .unwrap_or_default()
            .into_iter()
            .filter_map(|id| self.describe_item(id))
            .collect()
    }

    pub fn describe_item(&self, id: ItemId) -> Option<ItemView> {
        let entry = self.items.get(&id)?;
        let live = &entry.live;
        let attachments = entry
            .attachments
            .and_then(|c| self.container_items(c))
            .unwrap_or_default()
            .into_iter()
            .filter_map(|m| self.item(m))
            .map(|m| (m.kind, m.amount, m.condition))
            .collect();
        let contents = entry.contents.map(|c| self.describe_container(c)).unwrap_or_default();
        Some(ItemView {
            kind: live.kind,
            skin: live.skin,
            amount: live.amount,
            condition: live.condition,
            max_condition: live.max_condition,
            position: live.position,
            text: live.text.clone(),
            name: live.name.clone(),
            flags: live.flags,
            instance_data: live
                .instance_data
                .map(|d| (d.data_int, d.blueprint_target, d.blueprint_amount)),
            held: live.held.clone(),
            attachments,
            contents,
        })
    }

    pub fn describe_subject(&self, subject: SubjectId, slot: ContainerSlot) -> Vec<ItemView> {
        self.players
            .get(&subject)
            .map(|p| self.describe_container(p.containers.get(slot)))
            .unwrap_or_default()
    }

    pub fn item_total(&self) -> usize {
        self.items.len()
    }

    pub fn marker_count(&self) -> usize {
        self.markers.len()
    }

    pub fn notifications(&self) -> &[(SubjectId, String)] {
        &self.notifications
    }

    /// Overwrite an item's instance data as the game would on crafting.
    pub fn set_instance_data(&mut self, id: ItemId, data_int: i32, target: i32, amount: i32) {
        if let Some(item) = self.item_mut(id) {
            item.instance_data = Some(LiveInstanceData {
                data_int,
                blueprint_target: target,
                blueprint_amount: amount,
                should_pool: true,
            });
        }
    }
}

impl ItemHost for MemoryWorld {
    fn container_items(&self, container: ContainerId) -> Option<Vec<ItemId>> {
        self.containers.get(&container).map(|c| c.slots.values().copied().collect())
    }

    fn item(&self, id: ItemId) -> Option<&LiveItem> {
        self.items.get(&id).map(|e| &e.live)
    }

    fn item_mut(&mut self, id: ItemId) -> Option<&mut LiveItem> {
        self.items.get_mut(&id).map(|e| &mut e.live)
    }

    fn attachment_container(&self, id: ItemId) -> Option<ContainerId> {
        self.items.get(&id)?.attachments
    }

    fn contents_container(&self, id: ItemId) -> Option<ContainerId> {
        self.items.get(&id)?.contents
    }

    fn create_item(&mut self, kind: ItemKind, amount: u32, skin: SkinId) -> Option<ItemId> {
        let def = self.catalog.get(&kind)?.clone();

        let attachments = (def.attachment_slots > 0).then(|| self.new_container(def.attachment_slots));
        let contents = (def.content_slots > 0).then(|| self.new_container(def.content_slots));
        let held = match def.held {
            HeldKind::None => HeldEntity::None,
            HeldKind::Projectile => HeldEntity::Projectile { loaded: 0, ammo_kind: None },
            HeldKind::Pager => HeldEntity::Pager { frequency: 0 },
        };

        let id = ItemId(self.next());
        self.items.insert(id, ItemEntry {
            live: LiveItem {
                kind,
                skin,
                amount,
                condition: 100.0,
                max_condition: 100.0,
                position: -1,
                text: None,
                name: None,
                flags: def.default_flags,
                instance_data: None,
                held,
                non_droppable: false,
                dirty: false,
            },
            parent: None,
            attachments,
            contents,
        });

        if let Some(inner) = contents {
            for (child_kind, child_amount) in &def.default_contents {
                self.give_to(inner, *child_kind, *child_amount, None);
            }
        }
        if let Some(mounts) = attachments {
            for mod_kind in &def.default_attachments {
                self.give_to(mounts, *mod_kind, 1, None);
            }
        }
        Some(id)
    }

    fn move_to_container(&mut self, id: ItemId, container: ContainerId, slot: Option<i32>) -> bool {
        if !self.items.contains_key(&id) {
            return false;
        }
        let Some(target) = self.containers.get(&container) else {
            return false;
        };
        let position = match slot {
            Some(s) if s >= 0 && (s as usize) < target.capacity && !target.slots.contains_key(&s) => s,
            Some(_) => return false,
            None => match (0..target.capacity as i32).find(|s| !target.slots.contains_key(s)) {
                Some(s) => s,
                None => return false,
            },
        };

        let previous = self.items.get(&id).and_then(|e| e.parent);
        if let Some(old) = previous.and_then(|p| self.containers.get_mut(&p)) {
            old.slots.retain(|_, held| *held != id);
        }
        if let Some(target) = self.containers.get_mut(&container) {
            target.slots.insert(position, id);
        }
        if let Some(entry) = self.items.get_mut(&id) {
            entry.parent = Some(container);
            entry.live.position = position;
        }
        true
    }

    fn destroy_item(&mut self, id: ItemId) {
        let mut pending = vec![id];
        while let Some(next) = pending.pop() {
            let Some(entry) = self.items.remove(&next) else {
                continue;
            };
            if let Some(parent) = entry.parent.and_then(|p| self.containers.get_mut(&p)) {
                parent.slots.retain(|_, held| *held != next);
            }
            for sub in [entry.attachments, entry.contents].into_iter().flatten() {
                if let Some(container) = self.containers.remove(&sub) {
                    pending.extend(container.slots.values().copied());
                }
            }
        }
    }

    fn mark_dirty(&mut self, id: ItemId) {
        if let Some(item) = self.item_mut(id) {
            item.dirty = true;
        }
    }

    fn kind_by_short_name(&self, short_name: &str) -> Option<ItemKind> {
        self.catalog
            .values()
            .find(|def| def.short_name == short_name)
            .map(|def| def.kind)
    }

    fn short_name(&self, kind: ItemKind) -> Option<String> {
        self.catalog.get(&kind).map(|def| def.short_name.clone())
    }
}

impl SubjectHost for MemoryWorld {
    fn is_player(&self, subject: SubjectId) -> bool {
        self.players.get(&subject).is_some_and(|p| !p.npc)
    }

    fn subject_containers(&self, subject: SubjectId) -> Option<SubjectContainers> {
        self.players.get(&subject).map(|p| p.containers)
    }

    fn is_alive(&self, subject: SubjectId) -> bool {
        self.players.get(&subject).is_some_and(|p| p.alive)
    }

    fn find_death_marker(&self, subject: SubjectId) -> Option<MarkerId> {
        self.markers
            .iter()
            .rev()
            .find(|(_, marker)| marker.subject == subject)
            .map(|(id, _)| *id)
    }

    fn marker_containers(&self, marker: MarkerId) -> Vec<ContainerId> {
        self.markers.get(&marker).map(|m| m.containers.clone()).unwrap_or_default()
    }

    fn destroy_marker(&mut self, marker: MarkerId) {
        if let Some(removed) = self.markers.remove(&marker) {
            for container in removed.containers {
                self.remove_container(container);
            }
        }
    }

    fn notify(&mut self, subject: SubjectId, message: &str) {
        self.notifications.push((subject, message.to_string()));
    }
}
