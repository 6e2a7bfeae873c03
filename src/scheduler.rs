//! Scheduler for cooperative, frame-synchronous coroutines.
//!
//! The scheduler owns every coroutine, advances the active set once per
//! processing pass, and reacts to scene-graph removal notifications by
//! aborting owned coroutines. All mutation requested while the active set
//! is being iterated is staged into side buffers (`just_started`,
//! `pending_removal`, `pending_switches`) and applied as a batch in a fixed
//! phase order; the active set itself is never mutated mid-iteration.

use ahash::AHashMap;

use crate::clock::FrameClock;
use crate::coroutine::{Coroutine, CoroutineState, ExecEvent, OwnerRef, UpdateMode};
use crate::error::SchedError;
use crate::ids::{BehaviorUnitId, CoroutineId, EntityId};
use crate::sched_debug_log;
use crate::sequence::Sequence;

/// Staging handle handed to every body resumption.
///
/// A body runs while the scheduler is iterating the active set, so it must
/// not touch the scheduler directly. Intents raised here land in side
/// buffers and are drained after the execution phase of the same pass:
/// staged starts join `just_started` (and so first execute on the *next*
/// pass), staged aborts take effect before the pass returns.
#[derive(Debug, Default)]
pub struct SchedCommands {
    starts: Vec<Coroutine>,
    aborts: Vec<CoroutineId>,
}

impl SchedCommands {
    /// Create and start a coroutine from inside a body. The returned id is
    /// valid immediately, but the new coroutine is not executed until the
    /// next pass.
    pub fn start_coroutine(
        &mut self,
        body: impl Sequence + 'static,
        mode: UpdateMode,
        owner: OwnerRef,
    ) -> CoroutineId {
        let co = Coroutine::started(Box::new(body), mode, owner);
        let id = co.id();
        self.starts.push(co);
        id
    }

    /// Request an abort, of the calling coroutine itself or any other.
    /// Applied after the execution phase; unknown or already-Completed
    /// targets are left alone.
    pub fn abort(&mut self, id: CoroutineId) {
        self.aborts.push(id);
    }
}

/// The coroutine system.
///
/// Strictly single-threaded: every method is called from the host's update
/// thread, either between passes or synchronously from within one. One
/// `process_coroutines` call is one batch pass (fixed phase order: merge
/// starts, drain removals, execute, apply switches).
#[derive(Debug, Default)]
pub struct CoroutineScheduler {
    coroutines: AHashMap<CoroutineId, Coroutine>,
    /// Coroutines eligible for advancement, in activation order.
    active: Vec<CoroutineId>,
    /// Started since the last pass; merged into `active` at phase 1.
    just_started: Vec<CoroutineId>,
    /// Reported terminal since the last pass; drained at phase 2.
    pending_removal: Vec<CoroutineId>,
    /// Switch hand-offs requested during phase 3; applied at phase 4.
    pending_switches: Vec<(CoroutineId, CoroutineId)>,
    /// Intents bodies staged during phase 3; drained right after it.
    commands: SchedCommands,
    by_entity: AHashMap<EntityId, Vec<CoroutineId>>,
    by_unit: AHashMap<BehaviorUnitId, Vec<CoroutineId>>,
}

impl CoroutineScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocate a Pending coroutine and register it in the ownership
    /// indices. It does not execute until started.
    pub fn create_coroutine(
        &mut self,
        body: impl Sequence + 'static,
        mode: UpdateMode,
        owner: OwnerRef,
    ) -> CoroutineId {
        let id = self.register(Coroutine::new(Box::new(body), mode, owner));
        sched_debug_log!("[sched] created coroutine {}", id.raw());
        id
    }

    /// Take ownership of a coroutine and record it in the ownership indices.
    fn register(&mut self, co: Coroutine) -> CoroutineId {
        let id = co.id();
        let owner = co.owner();
        if let Some(entity) = owner.entity {
            self.by_entity.entry(entity).or_default().push(id);
        }
        if let Some(unit) = owner.unit {
            self.by_unit.entry(unit).or_default().push(id);
        }
        self.coroutines.insert(id, co);
        id
    }

    /// Create and immediately start a coroutine. It becomes eligible for
    /// execution at the next pass, not the current one.
    pub fn start_coroutine(
        &mut self,
        body: impl Sequence + 'static,
        mode: UpdateMode,
        owner: OwnerRef,
    ) -> Result<CoroutineId, SchedError> {
        let id = self.create_coroutine(body, mode, owner);
        self.start(id)?;
        Ok(id)
    }

    /// Start a previously created coroutine (`Pending -> Running`) and
    /// enqueue it for the next pass.
    pub fn start(&mut self, id: CoroutineId) -> Result<(), SchedError> {
        let co = self
            .coroutines
            .get_mut(&id)
            .ok_or(SchedError::unknown_coroutine(id))?;
        co.on_start()?;
        self.just_started.push(id);
        sched_debug_log!("[sched] started coroutine {}", id.raw());
        Ok(())
    }

    pub fn pause(&mut self, id: CoroutineId) -> Result<(), SchedError> {
        self.coroutines
            .get_mut(&id)
            .ok_or(SchedError::unknown_coroutine(id))?
            .pause()
    }

    pub fn resume(&mut self, id: CoroutineId) -> Result<(), SchedError> {
        self.coroutines
            .get_mut(&id)
            .ok_or(SchedError::unknown_coroutine(id))?
            .resume()
    }

    /// Abort a coroutine. Cooperative-immediate: the state changes now,
    /// removal from the bookkeeping happens at the next batch pass.
    pub fn abort(&mut self, id: CoroutineId) -> Result<(), SchedError> {
        let co = self
            .coroutines
            .get_mut(&id)
            .ok_or(SchedError::unknown_coroutine(id))?;
        if co.abort()? {
            self.pending_removal.push(id);
            sched_debug_log!("[sched] aborted coroutine {}", id.raw());
        }
        Ok(())
    }

    /// Current lifecycle state, or None once the coroutine has been removed
    /// by a batch pass.
    pub fn state(&self, id: CoroutineId) -> Option<CoroutineState> {
        self.coroutines.get(&id).map(|co| co.state())
    }

    /// Whether the coroutine is in the active set right now.
    pub fn is_active(&self, id: CoroutineId) -> bool {
        self.active.contains(&id)
    }

    pub fn active_len(&self) -> usize {
        self.active.len()
    }

    /// Total coroutines still owned, terminal-but-unremoved included.
    pub fn len(&self) -> usize {
        self.coroutines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.coroutines.is_empty()
    }

    /// Advance every active coroutine of the given update mode for one
    /// frame.
    ///
    /// Phase order is fixed: (1) merge `just_started` into the active set,
    /// (2) drain `pending_removal` out of every collection and both
    /// ownership indices, (3) execute each active coroutine exactly once,
    /// (4) apply staged switch hand-offs. Intents bodies raised through
    /// [`SchedCommands`] are drained between phases 3 and 4: staged starts
    /// first execute on the next pass, staged aborts take effect now.
    /// Relative order among coroutines within phase 3 is not part of the
    /// contract.
    ///
    /// Switching to an already-active coroutine is a call-order bug and
    /// fails the pass synchronously at phase 4.
    pub fn process_coroutines(
        &mut self,
        clock: &FrameClock,
        mode: UpdateMode,
    ) -> Result<(), SchedError> {
        // Phase 1: admit coroutines started since the last pass.
        self.active.append(&mut self.just_started);

        // Phase 2: drop coroutines that went terminal since the last pass.
        let removals = std::mem::take(&mut self.pending_removal);
        for id in removals {
            self.remove_everywhere(id);
        }

        // Phase 3: execute. Intents raised here only land in side buffers,
        // so the active set stays stable under iteration.
        for i in 0..self.active.len() {
            let id = self.active[i];
            let Some(co) = self.coroutines.get_mut(&id) else {
                continue;
            };
            if co.update_mode() != mode {
                continue;
            }
            match co.execute(clock, &mut self.commands) {
                ExecEvent::None => {}
                ExecEvent::Completed => {
                    sched_debug_log!("[sched] coroutine {} completed", id.raw());
                    self.pending_removal.push(id);
                }
                ExecEvent::SwitchRequested { to } => {
                    self.pending_switches.push((id, to));
                }
            }
        }

        // Drain intents bodies staged during phase 3. Starts join
        // `just_started` and are merged at the next pass's phase 1; aborts
        // take effect now, like a host-side abort between passes.
        let starts = std::mem::take(&mut self.commands.starts);
        for co in starts {
            let id = self.register(co);
            self.just_started.push(id);
            sched_debug_log!("[sched] body started coroutine {}", id.raw());
        }
        let aborts = std::mem::take(&mut self.commands.aborts);
        self.abort_owned(&aborts);

        // Phase 4: apply switch hand-offs. The target takes the source's
        // slot so frame-processing order is preserved, and the source is
        // retired so the coroutine table stays bounded under switch chains.
        let switches = std::mem::take(&mut self.pending_switches);
        for (from, to) in switches {
            if self.active.contains(&to) {
                return Err(SchedError::switch_to_active(to));
            }
            self.coroutines
                .get_mut(&to)
                .ok_or(SchedError::unknown_coroutine(to))?
                .on_start()?;
            sched_debug_log!(
                "[sched] switch: {} hands off to {}",
                from.raw(),
                to.raw()
            );
            match self.active.iter().position(|id| *id == from) {
                Some(slot) => self.active[slot] = to,
                None => self.active.push(to),
            }
            // The source never executes again; it was Running when it
            // yielded the switch, so this aborts it and stages removal.
            if let Some(src) = self.coroutines.get_mut(&from) {
                if src.abort().unwrap_or(false) {
                    self.pending_removal.push(from);
                }
            }
        }

        Ok(())
    }

    /// Scene-graph notification: the entity was destroyed. Aborts every
    /// indexed coroutine not yet Completed; completed ones are left alone.
    pub fn on_owner_removed(&mut self, entity: EntityId) {
        let ids = self.by_entity.get(&entity).cloned().unwrap_or_default();
        sched_debug_log!(
            "[sched] entity {} removed, {} owned coroutine(s)",
            entity.raw(),
            ids.len()
        );
        self.abort_owned(&ids);
    }

    /// Scene-graph notification: the behavior unit was detached.
    pub fn on_behavior_unit_removed(&mut self, unit: BehaviorUnitId) {
        let ids = self.by_unit.get(&unit).cloned().unwrap_or_default();
        sched_debug_log!(
            "[sched] behavior unit {} removed, {} owned coroutine(s)",
            unit.raw(),
            ids.len()
        );
        self.abort_owned(&ids);
    }

    fn abort_owned(&mut self, ids: &[CoroutineId]) {
        for &id in ids {
            let Some(co) = self.coroutines.get_mut(&id) else {
                continue;
            };
            if co.state() == CoroutineState::Completed {
                continue;
            }
            // Filtered to non-Completed, so abort cannot fail here; it
            // no-ops on repeated owner notifications for the same body.
            if co.abort().unwrap_or(false) {
                self.pending_removal.push(id);
            }
        }
    }

    fn remove_everywhere(&mut self, id: CoroutineId) {
        self.active.retain(|x| *x != id);
        let Some(co) = self.coroutines.remove(&id) else {
            return;
        };
        let owner = co.owner();
        if let Some(entity) = owner.entity {
            if let Some(list) = self.by_entity.get_mut(&entity) {
                list.retain(|x| *x != id);
                if list.is_empty() {
                    self.by_entity.remove(&entity);
                }
            }
        }
        if let Some(unit) = owner.unit {
            if let Some(list) = self.by_unit.get_mut(&unit) {
                list.retain(|x| *x != id);
                if list.is_empty() {
                    self.by_unit.remove(&unit);
                }
            }
        }
    }
}
