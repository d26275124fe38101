//! Capture → restore round-trip tests.
//!
//! Random inventories are generated from fixed seeds, so every run
//! exercises the same trees.

use nodrop_core::{
    builder::capture,
    memory_world::{kinds, ItemDef, MemoryWorld},
    restore::restore,
    snapshot::{ContainerSnapshot, ItemSnapshot},
    types::{ContainerId, ItemFlags, ItemKind},
    world::{HeldEntity, ItemHost},
};
use rand::{seq::SliceRandom, Rng, SeedableRng};
use rand_pcg::Pcg64Mcg;

const POOL: &[ItemKind] = &[
    kinds::WOOD,
    kinds::NOTE,
    kinds::BOX,
    kinds::LUNCHBOX,
    kinds::RIFLE,
    kinds::PAGER,
    kinds::BLUEPRINT,
    kinds::SMALL_BACKPACK,
    kinds::AMMO_RIFLE,
];

/// Fill `container` with a random tree no deeper than `depth`.
fn populate(world: &mut MemoryWorld, rng: &mut Pcg64Mcg, container: ContainerId, capacity: usize, depth: usize) {
    let mut positions: Vec<i32> = (0..capacity as i32).collect();
    positions.shuffle(rng);
    let count = rng.gen_range(0..=capacity.min(5));

    for &position in positions.iter().take(count) {
        let kind = *POOL.choose(rng).unwrap_or(&kinds::WOOD);
        let Some(id) = world.give_to(container, kind, rng.gen_range(1..=1000), Some(position)) else {
            continue; // slot taken by catalog defaults
        };

        {
            let item = world.item_mut(id).unwrap();
            item.condition = rng.gen_range(0.0..100.0);
            item.skin = rng.gen_range(0..3);
            if rng.gen_bool(0.3) {
                item.flags |= ItemFlags(1 << rng.gen_range(0..12));
            }
            if rng.gen_bool(0.2) {
                item.text = Some(format!("text-{}", rng.gen::<u16>()));
            }
            match &mut item.held {
                HeldEntity::Projectile { loaded, ammo_kind } => {
                    *loaded = rng.gen_range(0..31);
                    *ammo_kind = [None, Some(kinds::AMMO_RIFLE), Some(kinds::AMMO_RIFLE_HV)][rng.gen_range(0..3)];
                }
                HeldEntity::Pager { frequency } => *frequency = rng.gen_range(1..10_000),
                HeldEntity::None => {}
            }
        }

        if kind == kinds::BLUEPRINT {
            world.set_instance_data(id, 0, kinds::RIFLE, rng.gen_range(1..4));
        }
        if kind == kinds::RIFLE {
            for _ in 0..rng.gen_range(0..=2) {
                world.attach(id, [kinds::HOLOSIGHT, kinds::FLASHLIGHT][rng.gen_range(0..2)]);
            }
        }
        if depth > 1 {
            if let Some(inner) = world.contents_container(id) {
                let inner_capacity = match kind {
                    kinds::BOX => 12,
                    kinds::SMALL_BACKPACK => 6,
                    _ => 4,
                };
                populate(world, rng, inner, inner_capacity, depth - 1);
            }
        }
    }
}

#[test]
fn random_trees_survive_capture_and_restore() {
    for seed in [1u64, 7, 42, 0xDEAD_BEEF, 0x5EED_0000_0001] {
        let mut rng = Pcg64Mcg::seed_from_u64(seed);
        let mut world = MemoryWorld::demo();
        let original = world.new_container(24);
        populate(&mut world, &mut rng, original, 24, 4);

        let snapshot = capture(&world, Some(original));
        let target = world.new_container(24);
        let summary = restore(&mut world, target, &snapshot).unwrap();

        assert_eq!(summary.skipped, 0, "seed={seed}");
        assert_eq!(summary.restored, snapshot.item_count(), "seed={seed}");
        assert_eq!(
            world.describe_container(target),
            world.describe_container(original),
            "seed={seed} diverged"
        );
    }
}

#[test]
fn snapshot_survives_json_between_capture_and_restore() {
    let mut rng = Pcg64Mcg::seed_from_u64(0xC0FFEE);
    let mut world = MemoryWorld::demo();
    let original = world.new_container(24);
    populate(&mut world, &mut rng, original, 24, 3);

    let json = serde_json::to_string(&capture(&world, Some(original))).unwrap();
    let decoded: ContainerSnapshot = serde_json::from_str(&json).unwrap();

    let target = world.new_container(24);
    restore(&mut world, target, &decoded).unwrap();
    assert_eq!(world.describe_container(target), world.describe_container(original));
}

#[test]
fn restoring_twice_gives_the_same_container() {
    let mut rng = Pcg64Mcg::seed_from_u64(99);
    let mut world = MemoryWorld::demo();
    let original = world.new_container(24);
    populate(&mut world, &mut rng, original, 24, 3);
    let snapshot = capture(&world, Some(original));

    let target = world.new_container(24);
    restore(&mut world, target, &snapshot).unwrap();
    let live_after_first = world.item_total();
    restore(&mut world, target, &snapshot).unwrap();

    assert_eq!(world.item_total(), live_after_first, "second pass leaked or lost items");
    assert_eq!(world.describe_container(target), world.describe_container(original));
}

#[test]
fn nesting_deeper_than_three_levels_is_preserved() {
    const LEVELS: usize = 40;
    let mut world = MemoryWorld::demo();
    let original = world.new_container(24);

    let mut parent = world.give_to(original, kinds::BOX, 1, Some(0)).unwrap();
    for level in 1..LEVELS {
        let kind = if level % 2 == 0 { kinds::BOX } else { kinds::SMALL_BACKPACK };
        parent = world.give_into(parent, kind, 1).unwrap();
    }
    world.give_into(parent, kinds::WOOD, 7).unwrap();

    let snapshot = capture(&world, Some(original));
    assert_eq!(snapshot.items()[0].depth(), LEVELS + 1);

    let target = world.new_container(24);
    restore(&mut world, target, &snapshot).unwrap();
    assert_eq!(world.describe_container(target), world.describe_container(original));
}

#[test]
fn very_deep_snapshots_restore_without_recursion() {
    const LEVELS: usize = 2_000;
    let mut world = MemoryWorld::with_items([
        ItemDef::new(1, "nest").container(1),
        ItemDef::new(2, "pebble"),
    ]);

    let mut node = ItemSnapshot::new(2, 3, 0);
    for _ in 0..LEVELS {
        node = ItemSnapshot::new(1, 1, 0).with_contents(vec![node]);
    }
    let snapshot: ContainerSnapshot = vec![node].into();

    let target = world.new_container(1);
    let summary = restore(&mut world, target, &snapshot).unwrap();
    assert_eq!(summary.restored, LEVELS + 1);

    let mut container = target;
    let mut seen = 0;
    while let Some(&id) = world.container_items(container).unwrap_or_default().first() {
        seen += 1;
        match world.contents_container(id) {
            Some(inner) => container = inner,
            None => {
                assert_eq!(world.item(id).unwrap().amount, 3);
                break;
            }
        }
    }
    assert_eq!(seen, LEVELS + 1);
}
