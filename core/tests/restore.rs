//! Restore engine tests.
//!
//! Tests cover: container clearing, flag OR semantics, the instance-data
//! gate, partial-failure resilience, attachments vs contents, held state,
//! and structural errors.

use nodrop_core::{
    error::RestoreError,
    memory_world::{kinds, ItemDef, MemoryWorld},
    restore::{restore, RestoreSummary},
    snapshot::{AmmoState, ContainerSnapshot, FrequencyState, InstanceData, ItemSnapshot, ModSnapshot},
    types::{ContainerId, ItemFlags},
    world::{HeldEntity, ItemHost},
};

fn init_logs() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn fresh(world: &mut MemoryWorld) -> ContainerId {
    world.new_container(24)
}

#[test]
fn restore_replaces_every_pre_existing_item() {
    init_logs();
    let mut world = MemoryWorld::demo();

    for pre_existing in [0usize, 1, 5, 24] {
        let target = fresh(&mut world);
        for slot in 0..pre_existing {
            world.give_to(target, kinds::ROCK, 1, Some(slot as i32)).unwrap();
        }

        let snapshot = ContainerSnapshot(vec![
            ItemSnapshot::new(kinds::WOOD, 500, 0),
            ItemSnapshot::new(kinds::NOTE, 1, 7),
        ]);
        let summary = restore(&mut world, target, &snapshot).unwrap();
        assert_eq!(summary, RestoreSummary { restored: 2, skipped: 0 });

        let items = world.describe_container(target);
        assert_eq!(items.len(), 2, "pre_existing={pre_existing}: {items:?}");
        assert_eq!((items[0].kind, items[0].amount, items[0].position), (kinds::WOOD, 500, 0));
        assert_eq!((items[1].kind, items[1].position), (kinds::NOTE, 7));
        assert!(items.iter().all(|i| i.kind != kinds::ROCK));
    }
}

#[test]
fn saved_flags_are_ored_onto_catalog_defaults() {
    let mut world = MemoryWorld::demo();
    let target = fresh(&mut world);

    // Catalog sets NON_TRADABLE on notes; the snapshot carries BLUEPRINT and an unknown bit.
    let mut note = ItemSnapshot::new(kinds::NOTE, 1, 0);
    note.flags = ItemFlags::BLUEPRINT | ItemFlags(1 << 20);

    restore(&mut world, target, &ContainerSnapshot(vec![note])).unwrap();

    let flags = world.describe_container(target)[0].flags;
    assert!(flags.contains(ItemFlags::NON_TRADABLE), "catalog bit lost: {flags}");
    assert!(flags.contains(ItemFlags::BLUEPRINT), "saved bit lost: {flags}");
    assert!(flags.contains(ItemFlags(1 << 20)), "unknown bit lost: {flags}");
}

#[test]
fn all_zero_instance_data_never_creates_a_slot() {
    let mut world = MemoryWorld::demo();
    let target = fresh(&mut world);

    let mut item = ItemSnapshot::new(kinds::BLUEPRINT, 1, 0);
    item.instance_data = Some(InstanceData::default());

    restore(&mut world, target, &ContainerSnapshot(vec![item])).unwrap();

    let id = world.container_items(target).unwrap()[0];
    assert_eq!(world.item(id).unwrap().instance_data, None);
}

#[test]
fn valid_instance_data_is_applied_and_pinned_out_of_the_pool() {
    let mut world = MemoryWorld::demo();
    let target = fresh(&mut world);

    let mut item = ItemSnapshot::new(kinds::BLUEPRINT, 1, 3);
    item.instance_data = Some(InstanceData { data_int: 0, blueprint_target: kinds::RIFLE, blueprint_amount: 1 });
    // The flattened copy is informational; a conflicting value must not leak through.
    item.blueprint_target = 42;

    restore(&mut world, target, &ContainerSnapshot(vec![item])).unwrap();

    let id = world.container_items(target).unwrap()[0];
    let data = world.item(id).unwrap().instance_data.unwrap();
    assert_eq!(data.blueprint_target, kinds::RIFLE);
    assert_eq!(data.blueprint_amount, 1);
    assert!(!data.should_pool);
}

#[test]
fn unknown_kind_is_skipped_without_losing_siblings() {
    init_logs();
    let mut world = MemoryWorld::demo();
    let target = fresh(&mut world);

    let snapshot = ContainerSnapshot(vec![
        ItemSnapshot::new(kinds::WOOD, 10, 0),
        ItemSnapshot::new(424_242, 1, 1).with_contents(vec![ItemSnapshot::new(kinds::WOOD, 1, 0)]),
        ItemSnapshot::new(kinds::NOTE, 1, 2),
        ItemSnapshot::new(kinds::TORCH, 1, 3),
    ]);

    let summary = restore(&mut world, target, &snapshot).expect("item failures are not structural");
    assert_eq!(summary, RestoreSummary { restored: 3, skipped: 2 });

    let kinds_restored: Vec<_> = world.describe_container(target).iter().map(|i| (i.kind, i.position)).collect();
    assert_eq!(kinds_restored, vec![(kinds::WOOD, 0), (kinds::NOTE, 2), (kinds::TORCH, 3)]);
}

#[test]
fn unusable_target_is_a_structural_error() {
    let mut world = MemoryWorld::demo();
    let target = fresh(&mut world);
    world.remove_container(target);

    let err = restore(&mut world, target, &ContainerSnapshot(vec![ItemSnapshot::new(kinds::WOOD, 1, 0)]))
        .unwrap_err();
    assert_eq!(err, RestoreError::ContainerUnavailable { container: target });
}

#[test]
fn attachments_and_contents_use_separate_sub_containers() {
    let mut world = MemoryWorld::demo();
    world.register(ItemDef::new(7000, "rifle.cased").weapon().mod_slots(2).container(2));
    let target = fresh(&mut world);

    let rifle = ItemSnapshot::new(7000, 1, 0)
        .with_attachments(vec![
            ModSnapshot { item_kind: kinds::HOLOSIGHT, amount: 1, condition: 40.0 },
            ModSnapshot { item_kind: 31337, amount: 1, condition: 1.0 },
        ])
        .with_contents(vec![ItemSnapshot::new(kinds::AMMO_RIFLE, 64, 1)]);

    let summary = restore(&mut world, target, &ContainerSnapshot(vec![rifle])).unwrap();
    assert_eq!(summary, RestoreSummary { restored: 3, skipped: 1 });

    let view = &world.describe_container(target)[0];
    assert_eq!(view.attachments, vec![(kinds::HOLOSIGHT, 1, 40.0)]);
    assert_eq!(view.contents.len(), 1);
    assert_eq!((view.contents[0].kind, view.contents[0].amount, view.contents[0].position), (kinds::AMMO_RIFLE, 64, 1));
}

#[test]
fn catalog_mounted_attachments_are_replaced_by_saved_ones() {
    let mut world = MemoryWorld::demo();
    world.register(ItemDef::new(7100, "rifle.kitted").weapon().mod_slots(2).prefitted(kinds::FLASHLIGHT));
    let target = fresh(&mut world);

    let saved = ItemSnapshot::new(7100, 1, 0)
        .with_attachments(vec![ModSnapshot { item_kind: kinds::HOLOSIGHT, amount: 1, condition: 75.0 }]);
    let bare = ItemSnapshot::new(7100, 1, 1);

    let summary = restore(&mut world, target, &ContainerSnapshot(vec![saved, bare])).unwrap();
    assert_eq!(summary, RestoreSummary { restored: 3, skipped: 0 });

    let items = world.describe_container(target);
    assert_eq!(items[0].attachments, vec![(kinds::HOLOSIGHT, 1, 75.0)]);
    assert!(items[1].attachments.is_empty(), "catalog flashlight should be gone: {:?}", items[1].attachments);
}

#[test]
fn catalog_prefilled_contents_are_cleared_before_nested_restore() {
    let mut world = MemoryWorld::demo();
    let target = fresh(&mut world);

    let lunchbox = ItemSnapshot::new(kinds::LUNCHBOX, 1, 0)
        .with_contents(vec![ItemSnapshot::new(kinds::NOTE, 1, 2)]);
    restore(&mut world, target, &ContainerSnapshot(vec![lunchbox])).unwrap();

    let contents = &world.describe_container(target)[0].contents;
    assert_eq!(contents.len(), 1, "catalog wood should be gone: {contents:?}");
    assert_eq!((contents[0].kind, contents[0].position), (kinds::NOTE, 2));
}

#[test]
fn weapon_magazine_and_pager_channel_are_restored() {
    let mut world = MemoryWorld::demo();
    let target = fresh(&mut world);

    let mut rifle = ItemSnapshot::new(kinds::RIFLE, 1, 0);
    rifle.ammo = Some(AmmoState { loaded: 27, ammo_kind: Some("ammo.rifle.hv".into()) });
    let mut pager = ItemSnapshot::new(kinds::PAGER, 1, 1);
    pager.frequency = Some(FrequencyState { channel: 4417 });

    restore(&mut world, target, &ContainerSnapshot(vec![rifle, pager])).unwrap();

    let items = world.describe_container(target);
    assert_eq!(items[0].held, HeldEntity::Projectile { loaded: 27, ammo_kind: Some(kinds::AMMO_RIFLE_HV) });
    assert_eq!(items[1].held, HeldEntity::Pager { frequency: 4417 });
}

#[test]
fn unresolvable_ammo_kind_leaves_magazine_type_unset() {
    let mut world = MemoryWorld::demo();
    let target = fresh(&mut world);

    let mut rifle = ItemSnapshot::new(kinds::RIFLE, 1, 0);
    rifle.ammo = Some(AmmoState { loaded: 12, ammo_kind: Some("ammo.removed.from.game".into()) });

    let summary = restore(&mut world, target, &ContainerSnapshot(vec![rifle])).unwrap();
    assert_eq!(summary.skipped, 0);
    assert_eq!(
        world.describe_container(target)[0].held,
        HeldEntity::Projectile { loaded: 12, ammo_kind: None }
    );
}

#[test]
fn presentation_overrides_only_when_present() {
    let mut world = MemoryWorld::demo();
    let target = fresh(&mut world);

    let mut named = ItemSnapshot::new(kinds::NOTE, 1, 0);
    named.custom_text = Some("meet at the dome".into());
    named.display_name = Some("Orders".into());
    named.condition = 12.5;
    named.max_condition = 80.0;
    named.skin_id = 77;
    let plain = ItemSnapshot::new(kinds::NOTE, 1, 1);

    restore(&mut world, target, &ContainerSnapshot(vec![named, plain])).unwrap();

    let items = world.describe_container(target);
    assert_eq!(items[0].text.as_deref(), Some("meet at the dome"));
    assert_eq!(items[0].name.as_deref(), Some("Orders"));
    assert_eq!((items[0].condition, items[0].max_condition, items[0].skin), (12.5, 80.0, 77));
    assert_eq!((items[1].text.clone(), items[1].name.clone()), (None, None));
}

#[test]
fn colliding_slots_skip_the_later_item() {
    let mut world = MemoryWorld::demo();
    let target = fresh(&mut world);

    let snapshot = ContainerSnapshot(vec![
        ItemSnapshot::new(kinds::WOOD, 1, 4),
        ItemSnapshot::new(kinds::NOTE, 1, 4),
        ItemSnapshot::new(kinds::TORCH, 1, 99),
    ]);
    let summary = restore(&mut world, target, &snapshot).unwrap();

    assert_eq!(summary, RestoreSummary { restored: 1, skipped: 2 });
    assert_eq!(world.describe_container(target).len(), 1);
}

#[test]
fn every_restored_item_is_marked_dirty() {
    let mut world = MemoryWorld::demo();
    let target = fresh(&mut world);

    let snapshot = ContainerSnapshot(vec![ItemSnapshot::new(kinds::BOX, 1, 0)
        .with_contents(vec![ItemSnapshot::new(kinds::WOOD, 5, 0)])]);
    restore(&mut world, target, &snapshot).unwrap();

    let outer = world.container_items(target).unwrap()[0];
    let inner_container = world.contents_container(outer).unwrap();
    let inner = world.container_items(inner_container).unwrap()[0];
    assert!(world.item(outer).unwrap().dirty);
    assert!(world.item(inner).unwrap().dirty);
}
