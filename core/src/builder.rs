//! Snapshot builder: flattens live container trees into snapshots.
//!
//! Capture is strictly read-only against the host.

use crate::{
    snapshot::{
        AmmoState, ContainerSnapshot, FrequencyState, InstanceData, ItemSnapshot, ModSnapshot,
        SubjectBundle,
    },
    types::{ContainerId, ItemId, SubjectId},
    world::{HeldEntity, ItemHost, SubjectHost},
};

/// Capture every occupied slot of `container`, in slot order.
/// A missing or unusable container captures as empty.
pub fn capture<H: ItemHost + ?Sized>(host: &H, container: Option<ContainerId>) -> ContainerSnapshot {
    let Some(container) = container else {
        return ContainerSnapshot::default();
    };
    let Some(ids) = host.container_items(container) else {
        log::debug!("capture: container {container:?} unavailable, capturing as empty");
        return ContainerSnapshot::default();
    };
    ContainerSnapshot(ids.into_iter().filter_map(|id| capture_item(host, id)).collect())
}

/// Capture one item and everything below it.
pub fn capture_item<H: ItemHost + ?Sized>(host: &H, id: ItemId) -> Option<ItemSnapshot> {
    let item = host.item(id)?;

    let mut snap = ItemSnapshot {
        item_kind:        item.kind,
        skin_id:          item.skin,
        amount:           item.amount,
        condition:        item.condition,
        max_condition:    item.max_condition,
        slot_position:    item.position,
        custom_text:      item.text.clone(),
        display_name:     item.name.clone(),
        flags:            item.flags,
        ammo:             None,
        frequency:        None,
        instance_data:    None,
        blueprint_amount: 0,
        blueprint_target: 0,
        attachments:      Vec::new(),
        contents:         Vec::new(),
    };

    match &item.held {
        HeldEntity::Projectile { loaded, ammo_kind } => {
            snap.ammo = Some(AmmoState {
                loaded:    *loaded,
                ammo_kind: ammo_kind.and_then(|kind| host.short_name(kind)),
            });
        }
        HeldEntity::Pager { frequency } => {
            snap.frequency = Some(FrequencyState { channel: *frequency });
        }
        HeldEntity::None => {}
    }

    if let Some(live) = item.instance_data {
        let data = InstanceData {
            data_int:         live.data_int,
            blueprint_target: live.blueprint_target,
            blueprint_amount: live.blueprint_amount,
        };
        if data.is_valid() {
            snap.blueprint_amount = data.blueprint_amount;
            snap.blueprint_target = data.blueprint_target;
            snap.instance_data = Some(data);
        }
    }

    if let Some(mods) = host.attachment_container(id).and_then(|c| host.container_items(c)) {
        snap.attachments = mods
            .into_iter()
            .filter_map(|mod_id| host.item(mod_id))
            .map(|m| ModSnapshot {
                item_kind: m.kind,
                amount:    m.amount,
                condition: m.condition,
            })
            .collect();
    }

    if let Some(contents) = host.contents_container(id) {
        snap.contents = capture(host, Some(contents)).0;
    }

    Some(snap)
}

/// Capture main, belt and worn for a subject. `None` if the subject
/// has no containers in the world.
pub fn capture_subject<H: SubjectHost + ?Sized>(host: &H, subject: SubjectId) -> Option<SubjectBundle> {
    let containers = host.subject_containers(subject)?;
    Some(SubjectBundle {
        main: capture(host, Some(containers.main)),
        belt: capture(host, Some(containers.belt)),
        worn: capture(host, Some(containers.worn)),
    })
}
