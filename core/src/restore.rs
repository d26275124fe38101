//! Restore engine: rebuilds live items from a container snapshot.
//!
//! ORDER per item (fixed):
//!   1. Clear the target container (once per container, before any insert).
//!   2. Instantiate from kind/amount/skin; unknown kinds are skipped.
//!   3. Apply condition, placement, text, name; OR the saved flags on.
//!   4. Apply valid instance data and pin it out of the host pool.
//!   5. Move into the target at the recorded slot.
//!   6. Clear the attachment sub-container and fill it from the snapshot.
//!   7. Clear the contents sub-container and queue nested snapshots.
//!   8. Magazine state for ranged weapons.
//!   9. Channel for radio devices.
//!  10. Mark dirty.
//!
//! Nested levels go through a FIFO work queue instead of recursion, so
//! arbitrarily deep snapshots cannot exhaust the stack.

use crate::{
    error::RestoreError,
    snapshot::{ContainerSnapshot, ItemSnapshot},
    types::{ContainerId, ItemId},
    world::{HeldEntity, ItemHost},
};
use std::collections::VecDeque;

/// Per-pass counters. Attachments count as items.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RestoreSummary {
    pub restored: usize,
    pub skipped:  usize,
}

impl RestoreSummary {
    pub fn merge(&mut self, other: RestoreSummary) {
        self.restored += other.restored;
        self.skipped += other.skipped;
    }
}

/// Replace the contents of `container` with `snapshot`.
pub fn restore<H: ItemHost + ?Sized>(
    host:      &mut H,
    container: ContainerId,
    snapshot:  &ContainerSnapshot,
) -> Result<RestoreSummary, RestoreError> {
    if host.container_items(container).is_none() {
        return Err(RestoreError::ContainerUnavailable { container });
    }

    let cleared = clear_container(host, container);
    if cleared > 0 {
        log::debug!("restore: cleared {cleared} pre-existing items from {container:?}");
    }

    let mut summary = RestoreSummary::default();
    let mut queue: VecDeque<(ContainerId, &ItemSnapshot)> =
        snapshot.items().iter().map(|snap| (container, snap)).collect();

    while let Some((target, snap)) = queue.pop_front() {
        let Some(id) = place_item(host, target, snap, &mut summary) else {
            continue;
        };

        restore_attachments(host, id, snap, &mut summary);

        match host.contents_container(id) {
            Some(sub) => {
                clear_container(host, sub);
                queue.extend(snap.contents.iter().map(|child| (sub, child)));
            }
            None if !snap.contents.is_empty() => {
                let lost: usize = snap.contents.iter().map(ItemSnapshot::item_count).sum();
                log::warn!(
                    "restore: kind={} has no contents container, dropping {lost} nested items",
                    snap.item_kind
                );
                summary.skipped += lost;
            }
            None => {}
        }

        apply_held_state(host, id, snap);
        host.mark_dirty(id);
    }

    Ok(summary)
}

/// Destroy everything in `container`. Returns how many items were removed.
/// An unusable container counts as already empty.
pub fn clear_container<H: ItemHost + ?Sized>(host: &mut H, container: ContainerId) -> usize {
    let ids = host.container_items(container).unwrap_or_default();
    for id in ids.iter().rev() {
        host.destroy_item(*id);
    }
    ids.len()
}

/// Steps 2–5. Returns the placed item, or `None` if the whole subtree
/// was skipped.
fn place_item<H: ItemHost + ?Sized>(
    host:    &mut H,
    target:  ContainerId,
    snap:    &ItemSnapshot,
    summary: &mut RestoreSummary,
) -> Option<ItemId> {
    let Some(id) = host.create_item(snap.item_kind, snap.amount, snap.skin_id) else {
        log::warn!("restore: unknown item kind {}, skipping", snap.item_kind);
        summary.skipped += snap.item_count();
        return None;
    };

    if let Some(item) = host.item_mut(id) {
        item.condition = snap.condition;
        item.max_condition = snap.max_condition;
        item.position = snap.slot_position;
        if let Some(text) = &snap.custom_text {
            item.text = Some(text.clone());
        }
        if let Some(name) = &snap.display_name {
            item.name = Some(name.clone());
        }
        item.flags |= snap.flags;

        if let Some(data) = snap.instance_data.filter(|d| d.is_valid()) {
            let slot = item.instance_data.get_or_insert_with(Default::default);
            slot.data_int = data.data_int;
            slot.blueprint_target = data.blueprint_target;
            slot.blueprint_amount = data.blueprint_amount;
            slot.should_pool = false;
        }
    }

    if !host.move_to_container(id, target, Some(snap.slot_position)) {
        log::warn!(
            "restore: slot {} of {target:?} rejected kind={}, skipping",
            snap.slot_position,
            snap.item_kind
        );
        host.destroy_item(id);
        summary.skipped += snap.item_count();
        return None;
    }

    summary.restored += 1;
    Some(id)
}

fn restore_attachments<H: ItemHost + ?Sized>(
    host:    &mut H,
    id:      ItemId,
    snap:    &ItemSnapshot,
    summary: &mut RestoreSummary,
) {
    let slots = host.attachment_container(id);
    if let Some(slots) = slots {
        clear_container(host, slots);
    }
    if snap.attachments.is_empty() {
        return;
    }
    let Some(slots) = slots else {
        log::warn!(
            "restore: kind={} takes no attachments, dropping {}",
            snap.item_kind,
            snap.attachments.len()
        );
        summary.skipped += snap.attachments.len();
        return;
    };

    for modification in &snap.attachments {
        let Some(mod_id) = host.create_item(modification.item_kind, modification.amount, 0) else {
            log::warn!("restore: unknown attachment kind {}, skipping", modification.item_kind);
            summary.skipped += 1;
            continue;
        };
        if let Some(item) = host.item_mut(mod_id) {
            item.condition = modification.condition;
        }
        if host.move_to_container(mod_id, slots, None) {
            host.mark_dirty(mod_id);
            summary.restored += 1;
        } else {
            host.destroy_item(mod_id);
            summary.skipped += 1;
        }
    }
}

/// Steps 8–9.
fn apply_held_state<H: ItemHost + ?Sized>(host: &mut H, id: ItemId, snap: &ItemSnapshot) {
    let ammo_kind = snap
        .ammo
        .as_ref()
        .and_then(|ammo| ammo.ammo_kind.as_deref())
        .and_then(|name| {
            let kind = host.kind_by_short_name(name);
            if kind.is_none() {
                log::debug!("restore: unknown ammunition '{name}', leaving magazine type unset");
            }
            kind
        });

    let Some(item) = host.item_mut(id) else { return };
    match &mut item.held {
        HeldEntity::Projectile { loaded, ammo_kind: kind } => {
            if let Some(ammo) = &snap.ammo {
                *loaded = ammo.loaded;
                *kind = ammo_kind;
            }
        }
        HeldEntity::Pager { frequency } => {
            if let Some(state) = snap.frequency {
                *frequency = state.channel;
            }
        }
        HeldEntity::None => {}
    }
}
