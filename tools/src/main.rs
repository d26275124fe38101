//! nodrop-runner: headless death/respawn runner for the NoDrop engine.
//!
//! Usage:
//!   nodrop-runner --seed 12345 --players 8 --cycles 20 --db run.db
//!   nodrop-runner --config NoDrop.json --ipc-mode

use anyhow::Result;
use nodrop_core::{
    config::PolicyConfig,
    controller::LifecycleController,
    event::{DeathCause, LifecycleEvent, LifecycleOutcome},
    memory_world::{kinds, ItemView, MemoryWorld},
    store::{SnapshotStore, SqliteStorage},
    types::{ContainerId, ContainerSlot, ItemFlags, ItemKind, SubjectId},
    world::{HeldEntity, ItemHost, SubjectHost},
};
use rand::{seq::SliceRandom, Rng, SeedableRng};
use rand_pcg::Pcg64Mcg;
use std::env;
use std::io::{self, BufRead, Write};

const FIRST_SUBJECT: SubjectId = 76561198000000000;

const LOOT: &[ItemKind] = &[
    kinds::WOOD,
    kinds::NOTE,
    kinds::BOX,
    kinds::LUNCHBOX,
    kinds::RIFLE,
    kinds::PAGER,
    kinds::BLUEPRINT,
    kinds::AMMO_RIFLE,
    kinds::AMMO_RIFLE_HV,
];

#[derive(Default)]
struct RunTally {
    deaths:     usize,
    restores:   usize,
    restored:   usize,
    skipped:    usize,
    mismatches: usize,
}

fn main() -> Result<()> {
    env_logger::init();

    let args: Vec<String> = env::args().collect();
    let seed = parse_arg(&args, "--seed", 42u64);
    let players = parse_arg(&args, "--players", 4u64);
    let cycles = parse_arg(&args, "--cycles", 10u64);
    let ipc_mode = args.iter().any(|a| a == "--ipc-mode");
    let db = args
        .windows(2)
        .find(|w| w[0] == "--db")
        .map(|w| w[1].as_str())
        .unwrap_or(":memory:");
    let config_path = args
        .windows(2)
        .find(|w| w[0] == "--config")
        .map(|w| w[1].as_str())
        .unwrap_or("./data/NoDrop.json");

    let policy = PolicyConfig::load(config_path)?;

    if !ipc_mode {
        println!("NoDrop runner");
        println!("  seed:      {seed}");
        println!("  players:   {players}");
        println!("  cycles:    {cycles}");
        println!("  db:        {db}");
        println!("  config:    {config_path}");
        println!();
    }

    let storage = if db == ":memory:" { SqliteStorage::in_memory()? } else { SqliteStorage::open(db)? };
    storage.migrate()?;

    let mut controller = LifecycleController::new(policy, SnapshotStore::new(Box::new(storage)));
    let mut world = MemoryWorld::demo();
    let mut rng = Pcg64Mcg::seed_from_u64(seed);

    let subjects: Vec<SubjectId> = (0..players).map(|i| FIRST_SUBJECT + i).collect();
    for &subject in &subjects {
        world.add_player(subject);
        equip(&mut world, &mut rng, subject);
    }

    controller.handle(&mut world, &LifecycleEvent::ServerInitialized);

    if ipc_mode {
        run_ipc_loop(&mut controller, &mut world)?;
    } else {
        let started = chrono::Utc::now();
        let mut tally = RunTally::default();
        for cycle in 1..=cycles {
            run_cycle(&mut controller, &mut world, &mut rng, &subjects, cycle, &mut tally);
        }
        controller.handle(&mut world, &LifecycleEvent::WorldSave);
        controller.handle(&mut world, &LifecycleEvent::Unload);
        print_summary(&controller, &tally, started);

        if tally.mismatches > 0 {
            anyhow::bail!("{} restored inventories did not match their capture", tally.mismatches);
        }
    }

    Ok(())
}

/// One death → tick → respawn round for every player, with verification.
fn run_cycle(
    controller: &mut LifecycleController,
    world:      &mut MemoryWorld,
    rng:        &mut Pcg64Mcg,
    subjects:   &[SubjectId],
    cycle:      u64,
    tally:      &mut RunTally,
) {
    let mut before = Vec::with_capacity(subjects.len());
    for &subject in subjects {
        before.push(describe(world, subject));
        let cause = if rng.gen_bool(0.1) { DeathCause::Suicide } else { DeathCause::Other };
        controller.handle(world, &LifecycleEvent::Death { subject, cause });
        world.kill_player(subject);
        tally.deaths += 1;
    }

    controller.handle(world, &LifecycleEvent::Tick);

    for (&subject, expected) in subjects.iter().zip(before) {
        world.respawn_player(subject);
        let outcomes = controller.handle(world, &LifecycleEvent::Respawn { subject });

        let restored = outcomes.iter().find_map(|o| match o {
            LifecycleOutcome::InventoryRestored { restored, skipped, .. } => Some((*restored, *skipped)),
            _ => None,
        });
        match restored {
            Some((restored, skipped)) => {
                tally.restores += 1;
                tally.restored += restored;
                tally.skipped += skipped;
                if describe(world, subject) != expected {
                    log::error!("cycle={cycle} subject={subject} restored inventory differs from capture");
                    tally.mismatches += 1;
                }
            }
            None => {
                // Nothing was captured; give the player something new to lose.
                log::info!("cycle={cycle} subject={subject} respawned empty-handed");
                equip(world, rng, subject);
            }
        }
    }
}

fn run_ipc_loop(controller: &mut LifecycleController, world: &mut MemoryWorld) -> Result<()> {
    let stdin = io::stdin();
    let mut stdout = io::stdout();
    let mut handle = stdin.lock();
    let mut buffer = String::new();

    loop {
        buffer.clear();
        let bytes_read = handle.read_line(&mut buffer)?;
        if bytes_read == 0 {
            break; // EOF
        }

        let event: LifecycleEvent = match serde_json::from_str(&buffer) {
            Ok(e) => e,
            Err(e) => {
                let err_json = serde_json::json!({ "error": e.to_string() });
                writeln!(stdout, "{}", err_json)?;
                stdout.flush()?;
                continue;
            }
        };

        // The world plays the host's part around each trigger.
        let outcomes = match &event {
            LifecycleEvent::Death { subject, .. } => {
                let outcomes = controller.handle(world, &event);
                world.kill_player(*subject);
                outcomes
            }
            LifecycleEvent::Respawn { subject } => {
                if !world.is_alive(*subject) {
                    world.respawn_player(*subject);
                }
                controller.handle(world, &event)
            }
            _ => controller.handle(world, &event),
        };
        writeln!(stdout, "{}", serde_json::to_string(&outcomes)?)?;
        stdout.flush()?;

        if event == LifecycleEvent::Unload {
            break;
        }
    }
    Ok(())
}

fn describe(world: &MemoryWorld, subject: SubjectId) -> Vec<Vec<ItemView>> {
    ContainerSlot::ALL
        .iter()
        .map(|slot| world.describe_subject(subject, *slot))
        .collect()
}

fn equip(world: &mut MemoryWorld, rng: &mut Pcg64Mcg, subject: SubjectId) {
    let Some(containers) = world.subject_containers(subject) else {
        return;
    };
    populate(world, rng, containers.main, 24, 3);
    populate(world, rng, containers.belt, 6, 2);
    if rng.gen_bool(0.5) {
        world.give(subject, ContainerSlot::Worn, kinds::SMALL_BACKPACK, 1);
    }
}

/// Fill `container` with a random tree no deeper than `depth`.
fn populate(world: &mut MemoryWorld, rng: &mut Pcg64Mcg, container: ContainerId, capacity: usize, depth: usize) {
    let mut positions: Vec<i32> = (0..capacity as i32).collect();
    positions.shuffle(rng);
    let count = rng.gen_range(0..=capacity.min(6));

    for &position in positions.iter().take(count) {
        let kind = *LOOT.choose(rng).unwrap_or(&kinds::WOOD);
        let Some(id) = world.give_to(container, kind, rng.gen_range(1..=500), Some(position)) else {
            continue;
        };
        if let Some(item) = world.item_mut(id) {
            item.condition = rng.gen_range(1.0..100.0);
            if rng.gen_bool(0.2) {
                item.flags |= ItemFlags::IS_LOCKED;
            }
            match &mut item.held {
                HeldEntity::Projectile { loaded, ammo_kind } => {
                    *loaded = rng.gen_range(0..31);
                    *ammo_kind = Some(kinds::AMMO_RIFLE);
                }
                HeldEntity::Pager { frequency } => *frequency = rng.gen_range(1..10_000),
                HeldEntity::None => {}
            }
        }
        match kind {
            kinds::BLUEPRINT => world.set_instance_data(id, 0, kinds::RIFLE, 1),
            kinds::RIFLE if rng.gen_bool(0.5) => {
                world.attach(id, kinds::HOLOSIGHT);
            }
            _ => {}
        }
        if depth > 1 {
            if let Some(inner) = world.contents_container(id) {
                populate(world, rng, inner, 4, depth - 1);
            }
        }
    }
}

fn print_summary(controller: &LifecycleController, tally: &RunTally, started: chrono::DateTime<chrono::Utc>) {
    let elapsed = chrono::Utc::now() - started;

    println!("=== RUN SUMMARY ===");
    println!("  started:        {}", started.to_rfc3339());
    println!("  elapsed ms:     {}", elapsed.num_milliseconds());
    println!("  final tick:     {}", controller.clock.current_tick);
    println!("  deaths:         {}", tally.deaths);
    println!("  restores:       {}", tally.restores);
    println!("  items restored: {}", tally.restored);
    println!("  items skipped:  {}", tally.skipped);
    println!("  mismatches:     {}", tally.mismatches);
    println!("  bundles held:   {}", controller.store().len());
}

fn parse_arg<T: std::str::FromStr + Copy>(args: &[String], flag: &str, default: T) -> T {
    args.windows(2)
        .find(|w| w[0] == flag)
        .and_then(|w| w[1].parse().ok())
        .unwrap_or(default)
}
