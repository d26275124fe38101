//! Life-cycle controller: decides, per trigger, whether to capture,
//! restore, veto, purge, or do nothing.
//!
//! TRIGGERS:
//!   Death            capture + schedule death-marker strip for next tick
//!   Respawn          strip starter items, take bundle, restore
//!   Disconnect       capture if still alive
//!   HeldItemDrop     veto or no opinion, per policy
//!   WorldReset       purge or keep, per policy
//!   WorldSave/Unload persist
//!   Tick             run deferred work
//!
//! RULES:
//!   - Non-player subjects are ignored by every trigger.
//!   - A bundle leaves the store only through a successful restore
//!     (or a purge). A structural restore failure puts it back.
//!   - Nothing here panics or propagates; failures are logged and degraded.

use crate::{
    builder::capture_subject,
    clock::{DeferredTask, TickClock},
    config::PolicyConfig,
    event::{DeathCause, DropDecision, LifecycleEvent, LifecycleOutcome},
    restore::{clear_container, restore, RestoreSummary},
    store::SnapshotStore,
    types::{ContainerSlot, SubjectId, Tick},
    world::SubjectHost,
};

pub const RESTORED_MESSAGE: &str = "Your inventory has been restored.";

pub struct LifecycleController {
    pub clock: TickClock,
    policy:    PolicyConfig,
    store:     SnapshotStore,
}

impl LifecycleController {
    pub fn new(policy: PolicyConfig, store: SnapshotStore) -> Self {
        Self { clock: TickClock::new(), policy, store }
    }

    pub fn policy(&self) -> &PolicyConfig {
        &self.policy
    }

    pub fn store(&self) -> &SnapshotStore {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut SnapshotStore {
        &mut self.store
    }

    fn tick(&self) -> Tick {
        self.clock.current_tick
    }

    /// Dispatch one host trigger.
    pub fn handle<H: SubjectHost + ?Sized>(
        &mut self,
        host:  &mut H,
        event: &LifecycleEvent,
    ) -> Vec<LifecycleOutcome> {
        let outcomes = match event {
            LifecycleEvent::ServerInitialized          => self.on_server_initialized(),
            LifecycleEvent::Death { subject, cause }   => self.on_death(host, *subject, *cause),
            LifecycleEvent::Respawn { subject }        => self.on_respawn(host, *subject),
            LifecycleEvent::Disconnect { subject }     => self.on_disconnect(host, *subject),
            LifecycleEvent::HeldItemDropQuery { subject } => {
                match self.can_drop_held_item(host, *subject) {
                    DropDecision::Veto      => vec![LifecycleOutcome::DropVetoed { subject: *subject }],
                    DropDecision::NoOpinion => vec![LifecycleOutcome::DropDeferred { subject: *subject }],
                }
            }
            LifecycleEvent::WorldReset => self.on_world_reset(),
            LifecycleEvent::WorldSave  => self.on_world_save(),
            LifecycleEvent::Unload     => self.on_unload(),
            LifecycleEvent::Tick       => self.on_tick(host),
        };

        for outcome in &outcomes {
            log::debug!("tick={} outcome={}", self.tick(), outcome.kind());
        }
        outcomes
    }

    // ── Store lifecycle ────────────────────────────────────────

    /// Load persisted bundles. Unreadable storage degrades to an empty store.
    pub fn on_server_initialized(&mut self) -> Vec<LifecycleOutcome> {
        match self.store.load() {
            Ok(count) => log::info!("Loaded {count} saved inventories"),
            Err(e) => log::error!("Could not load saved inventories, starting empty: {e}"),
        }
        vec![LifecycleOutcome::StoreLoaded { bundles: self.store.len() }]
    }

    pub fn on_world_reset(&mut self) -> Vec<LifecycleOutcome> {
        if self.policy.restore_inventory_on_wipe {
            log::info!("World reset: saved inventories preserved (restore_inventory_on_wipe)");
            return vec![];
        }
        let dropped = self.store.clear_all();
        log::info!("World reset: cleared {dropped} saved inventories");
        self.persist_quietly();
        vec![LifecycleOutcome::StorePurged { bundles: dropped }]
    }

    pub fn on_world_save(&mut self) -> Vec<LifecycleOutcome> {
        match self.store.persist() {
            Ok(()) => vec![LifecycleOutcome::StorePersisted { bundles: self.store.len() }],
            Err(e) => {
                log::error!("World save: could not persist inventories: {e}");
                vec![]
            }
        }
    }

    pub fn on_unload(&mut self) -> Vec<LifecycleOutcome> {
        match self.store.force_persist() {
            Ok(()) => vec![LifecycleOutcome::StorePersisted { bundles: self.store.len() }],
            Err(e) => {
                log::error!("Unload: could not persist inventories: {e}");
                vec![]
            }
        }
    }

    fn persist_quietly(&mut self) {
        if let Err(e) = self.store.persist() {
            log::error!("tick={} could not persist inventories: {e}", self.tick());
        }
    }

    // ── Death / disconnect ─────────────────────────────────────

    pub fn on_death<H: SubjectHost + ?Sized>(
        &mut self,
        host:    &mut H,
        subject: SubjectId,
        cause:   DeathCause,
    ) -> Vec<LifecycleOutcome> {
        if !host.is_player(subject) {
            return vec![];
        }
        if cause == DeathCause::Suicide && !self.policy.restore_on_suicide {
            log::info!(
                "tick={} subject={subject} committed suicide, not saving inventory",
                self.tick()
            );
            // An earlier disconnect capture would restore loot that is now on the corpse.
            if self.store.take(subject).is_some() {
                log::info!("tick={} subject={subject} discarded stale inventory", self.tick());
                self.persist_quietly();
            }
            return vec![LifecycleOutcome::CaptureSkipped {
                subject,
                reason: "suicide".into(),
            }];
        }

        let mut out = Vec::new();

        if self.policy.restore_backpacks_on_death {
            let count = self.keep_backpacks_equipped(host, subject);
            if count > 0 {
                out.push(LifecycleOutcome::BackpacksKept { subject, count });
            }
        }

        log::info!("tick={} subject={subject} died, saving inventory", self.tick());
        match self.capture_into_store(host, subject) {
            Some(outcome) => out.push(outcome),
            None => {
                out.push(LifecycleOutcome::CaptureSkipped {
                    subject,
                    reason: "no inventory containers".into(),
                });
                return out;
            }
        }

        self.clock.schedule(DeferredTask::StripDeathMarker { subject });
        out
    }

    pub fn on_disconnect<H: SubjectHost + ?Sized>(
        &mut self,
        host:    &mut H,
        subject: SubjectId,
    ) -> Vec<LifecycleOutcome> {
        if !host.is_player(subject) {
            return vec![];
        }
        if !host.is_alive(subject) {
            log::debug!("subject={subject} disconnected while dead, death capture stands");
            return vec![];
        }

        log::info!("tick={} subject={subject} disconnected, saving inventory", self.tick());
        match self.capture_into_store(host, subject) {
            Some(outcome) => vec![outcome],
            None => vec![LifecycleOutcome::CaptureSkipped {
                subject,
                reason: "no inventory containers".into(),
            }],
        }
    }

    fn capture_into_store<H: SubjectHost + ?Sized>(
        &mut self,
        host:    &H,
        subject: SubjectId,
    ) -> Option<LifecycleOutcome> {
        let bundle = capture_subject(host, subject)?;
        let items = bundle.item_count();
        self.store.put(subject, bundle);
        self.persist_quietly();
        log::info!("tick={} subject={subject} saved {items} items", self.tick());
        Some(LifecycleOutcome::InventoryCaptured { subject, items })
    }

    /// Mark backpack-type items on belt and worn as non-droppable for this death.
    fn keep_backpacks_equipped<H: SubjectHost + ?Sized>(&self, host: &mut H, subject: SubjectId) -> usize {
        let Some(containers) = host.subject_containers(subject) else {
            return 0;
        };
        let mut kept = 0;
        for slot in [ContainerSlot::Belt, ContainerSlot::Worn] {
            for id in host.container_items(containers.get(slot)).unwrap_or_default() {
                let Some(item) = host.item_mut(id) else { continue };
                if self.policy.is_backpack(item.kind) {
                    item.non_droppable = true;
                    kept += 1;
                    log::debug!("subject={subject} keeping backpack kind={} equipped", item.kind);
                }
            }
        }
        kept
    }

    // ── Respawn ────────────────────────────────────────────────

    pub fn on_respawn<H: SubjectHost + ?Sized>(
        &mut self,
        host:    &mut H,
        subject: SubjectId,
    ) -> Vec<LifecycleOutcome> {
        if !host.is_player(subject) {
            return vec![];
        }
        if !self.store.contains(subject) {
            return vec![LifecycleOutcome::NoBundle { subject }];
        }
        let Some(containers) = host.subject_containers(subject) else {
            log::error!("subject={subject} respawned without containers, keeping bundle");
            return vec![LifecycleOutcome::RestoreFailed {
                subject,
                reason: "no inventory containers".into(),
            }];
        };

        let mut out = Vec::new();

        let stripped: usize = self
            .policy
            .starter_containers
            .iter()
            .map(|slot| clear_container(host, containers.get(*slot)))
            .sum();
        out.push(LifecycleOutcome::StarterItemsStripped { subject, items: stripped });

        let Some(bundle) = self.store.take(subject) else {
            return out;
        };

        log::info!("tick={} subject={subject} respawned, restoring inventory", self.tick());
        let mut summary = RestoreSummary::default();
        let mut failure = None;
        for slot in ContainerSlot::ALL {
            match restore(host, containers.get(slot), bundle.container(slot)) {
                Ok(part) => summary.merge(part),
                Err(e) => {
                    log::error!("subject={subject} restoring {}: {e}", slot.name());
                    failure = Some(e);
                }
            }
        }

        if let Some(e) = failure {
            self.store.put(subject, bundle);
            out.push(LifecycleOutcome::RestoreFailed { subject, reason: e.to_string() });
            return out;
        }

        self.persist_quietly();
        host.notify(subject, RESTORED_MESSAGE);
        log::info!(
            "tick={} subject={subject} restored {} items ({} skipped)",
            self.tick(),
            summary.restored,
            summary.skipped
        );
        out.push(LifecycleOutcome::InventoryRestored {
            subject,
            restored: summary.restored,
            skipped:  summary.skipped,
        });
        out
    }

    // ── Held item ──────────────────────────────────────────────

    pub fn can_drop_held_item<H: SubjectHost + ?Sized>(&self, host: &H, subject: SubjectId) -> DropDecision {
        if host.is_player(subject) && !self.policy.drop_held_item_on_death {
            DropDecision::Veto
        } else {
            DropDecision::NoOpinion
        }
    }

    // ── Deferred work ──────────────────────────────────────────

    /// Advance the clock and run everything deferred to this tick.
    pub fn on_tick<H: SubjectHost + ?Sized>(&mut self, host: &mut H) -> Vec<LifecycleOutcome> {
        let (_, tasks) = self.clock.advance();
        tasks
            .into_iter()
            .map(|task| match task {
                DeferredTask::StripDeathMarker { subject } => self.strip_death_marker(host, subject),
            })
            .collect()
    }

    fn strip_death_marker<H: SubjectHost + ?Sized>(&self, host: &mut H, subject: SubjectId) -> LifecycleOutcome {
        let Some(marker) = host.find_death_marker(subject) else {
            log::warn!("tick={} subject={subject} no death marker found to strip", self.tick());
            return LifecycleOutcome::MarkerMissing { subject };
        };
        let items: usize = host
            .marker_containers(marker)
            .into_iter()
            .map(|container| clear_container(host, container))
            .sum();
        host.destroy_marker(marker);
        log::info!(
            "tick={} subject={subject} death marker stripped of {items} items and removed",
            self.tick()
        );
        LifecycleOutcome::MarkerStripped { subject, items }
    }
}
