//! Coroutine: one suspendable execution context.
//!
//! A coroutine owns a call stack of nested sequences, the instruction
//! currently blocking it, and a lifecycle state machine. It is advanced by
//! exactly one scheduler; instead of holding a back-pointer to it, `execute`
//! returns an [`ExecEvent`] that the scheduler applies at its batch points.

use crate::clock::FrameClock;
use crate::error::SchedError;
use crate::ids::{BehaviorUnitId, CoroutineId, EntityId};
use crate::instruction::Instruction;
use crate::scheduler::SchedCommands;
use crate::sequence::{SeqStep, SequenceBox};

/// Lifecycle state of a coroutine.
///
/// Transitions are monotonic: `Pending -> Running`, `Running <-> Paused`,
/// and `Running | Paused | Pending -> Aborted`, `Running -> Completed`.
/// `Completed` and `Aborted` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CoroutineState {
    Pending,
    Running,
    Paused,
    Completed,
    Aborted,
}

impl CoroutineState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, CoroutineState::Completed | CoroutineState::Aborted)
    }
}

/// Which of the host loop's two update phases a coroutine is advanced in.
/// Set at creation, immutable thereafter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateMode {
    FixedTimeStep,
    VariableTimeStep,
}

/// Non-owning back-references to the scene-graph objects a coroutine is
/// associated with, used only for the scheduler's cancellation indices.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct OwnerRef {
    pub entity: Option<EntityId>,
    pub unit: Option<BehaviorUnitId>,
}

impl OwnerRef {
    pub fn none() -> Self {
        OwnerRef::default()
    }

    pub fn entity(entity: EntityId) -> Self {
        OwnerRef {
            entity: Some(entity),
            unit: None,
        }
    }

    pub fn unit(unit: BehaviorUnitId) -> Self {
        OwnerRef {
            entity: None,
            unit: Some(unit),
        }
    }

    pub fn attached(entity: EntityId, unit: BehaviorUnitId) -> Self {
        OwnerRef {
            entity: Some(entity),
            unit: Some(unit),
        }
    }
}

/// What one `execute` call asks the scheduler to do afterwards.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ExecEvent {
    /// Still blocked, advanced and re-suspended, or was not Running.
    None,
    /// Call stack emptied; the coroutine transitioned to Completed.
    Completed,
    /// Body yielded a switch; the scheduler stages the hand-off.
    SwitchRequested { to: CoroutineId },
}

#[derive(Debug)]
pub(crate) struct Coroutine {
    id: CoroutineId,
    state: CoroutineState,
    update_mode: UpdateMode,
    call_stack: Vec<SequenceBox>,
    /// The instruction most recently produced. Starts as `NextFrame` so a
    /// newly started coroutine always waits for the next pass before its
    /// first body step.
    current: Instruction,
    owner: OwnerRef,
}

impl Coroutine {
    pub(crate) fn new(body: SequenceBox, update_mode: UpdateMode, owner: OwnerRef) -> Self {
        Coroutine {
            id: CoroutineId::fresh(),
            state: CoroutineState::Pending,
            update_mode,
            call_stack: vec![body],
            current: Instruction::NextFrame,
            owner,
        }
    }

    /// Build a coroutine already in the Running state, for starts staged by
    /// a body through [`SchedCommands`]. There is no separate `start` call
    /// on that path, so the Pending hop is skipped here.
    pub(crate) fn started(body: SequenceBox, update_mode: UpdateMode, owner: OwnerRef) -> Self {
        let mut co = Coroutine::new(body, update_mode, owner);
        co.state = CoroutineState::Running;
        co
    }

    pub(crate) fn id(&self) -> CoroutineId {
        self.id
    }

    pub(crate) fn state(&self) -> CoroutineState {
        self.state
    }

    pub(crate) fn update_mode(&self) -> UpdateMode {
        self.update_mode
    }

    pub(crate) fn owner(&self) -> OwnerRef {
        self.owner
    }

    /// `Pending -> Running`. Illegal from any other state.
    pub(crate) fn on_start(&mut self) -> Result<(), SchedError> {
        if self.state != CoroutineState::Pending {
            return Err(SchedError::already_started(self.id, self.state));
        }
        self.state = CoroutineState::Running;
        Ok(())
    }

    /// `Running -> Paused`.
    pub(crate) fn pause(&mut self) -> Result<(), SchedError> {
        if self.state != CoroutineState::Running {
            return Err(SchedError::illegal_transition(self.id, self.state, "pause"));
        }
        self.state = CoroutineState::Paused;
        Ok(())
    }

    /// `Paused -> Running`.
    pub(crate) fn resume(&mut self) -> Result<(), SchedError> {
        if self.state != CoroutineState::Paused {
            return Err(SchedError::illegal_transition(self.id, self.state, "resume"));
        }
        self.state = CoroutineState::Running;
        Ok(())
    }

    /// `Pending | Running | Paused -> Aborted`. No-op when already Aborted;
    /// an error when Completed.
    ///
    /// Returns whether the state actually transitioned, so the scheduler
    /// stages removal exactly once across repeated aborts.
    pub(crate) fn abort(&mut self) -> Result<bool, SchedError> {
        match self.state {
            CoroutineState::Aborted => Ok(false),
            CoroutineState::Completed => Err(SchedError::abort_completed(self.id)),
            _ => {
                self.state = CoroutineState::Aborted;
                Ok(true)
            }
        }
    }

    /// Advance this coroutine for one frame.
    ///
    /// No-op unless Running. If the current instruction still blocks, this
    /// is the suspension point. Otherwise the top-of-stack sequence is
    /// resumed: exhausted sequences are popped (emptying the stack completes
    /// the coroutine), `Call` pushes the nested body and keeps resuming in
    /// the same frame, `SwitchTo` is reported to the scheduler, and any
    /// other instruction becomes the new suspension condition.
    pub(crate) fn execute(&mut self, clock: &FrameClock, sched: &mut SchedCommands) -> ExecEvent {
        if self.state != CoroutineState::Running {
            return ExecEvent::None;
        }
        if self.current.blocks(clock) {
            return ExecEvent::None;
        }

        loop {
            let Some(top) = self.call_stack.last_mut() else {
                self.state = CoroutineState::Completed;
                return ExecEvent::Completed;
            };
            match top.advance(sched) {
                SeqStep::Done => {
                    self.call_stack.pop();
                }
                SeqStep::Yield(Instruction::Call { body }) => {
                    self.call_stack.push(body);
                }
                SeqStep::Yield(Instruction::SwitchTo { target }) => {
                    // Armed against re-polling: the coroutine leaves the
                    // active set on the next batch phase and must not run
                    // its body again meanwhile.
                    self.current = Instruction::NextFrame;
                    return ExecEvent::SwitchRequested { to: target };
                }
                SeqStep::Yield(instr) => {
                    self.current = instr;
                    return ExecEvent::None;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sequence::{FnSequence, InstructionList};
    use std::cell::Cell;
    use std::rc::Rc;
    use std::time::Duration;

    fn running(body: impl crate::sequence::Sequence + 'static) -> Coroutine {
        let mut co = Coroutine::new(Box::new(body), UpdateMode::VariableTimeStep, OwnerRef::none());
        co.on_start().expect("fresh coroutine must start");
        co
    }

    #[test]
    fn test_execute_is_noop_unless_running() {
        let clock = FrameClock::from_millis(16);
        let mut cmds = SchedCommands::default();
        let mut co = Coroutine::new(
            Box::new(InstructionList::empty()),
            UpdateMode::VariableTimeStep,
            OwnerRef::none(),
        );

        // Pending: inert.
        assert_eq!(co.execute(&clock, &mut cmds), ExecEvent::None);
        assert_eq!(co.state(), CoroutineState::Pending);

        co.on_start().unwrap();
        co.pause().unwrap();
        assert_eq!(co.execute(&clock, &mut cmds), ExecEvent::None);
        assert_eq!(co.state(), CoroutineState::Paused);

        co.resume().unwrap();
        co.abort().unwrap();
        assert_eq!(co.execute(&clock, &mut cmds), ExecEvent::None);
        assert_eq!(co.state(), CoroutineState::Aborted);
    }

    #[test]
    fn test_empty_body_completes_on_first_execute() {
        let mut cmds = SchedCommands::default();
        let mut co = running(InstructionList::empty());
        let event = co.execute(&FrameClock::from_millis(16), &mut cmds);
        assert_eq!(event, ExecEvent::Completed);
        assert_eq!(co.state(), CoroutineState::Completed);
    }

    #[test]
    fn test_start_twice_fails() {
        let mut co = running(InstructionList::empty());
        let err = co.on_start().unwrap_err();
        assert!(matches!(err, SchedError::AlreadyStarted { .. }));
    }

    #[test]
    fn test_pause_from_pending_fails() {
        let mut co = Coroutine::new(
            Box::new(InstructionList::empty()),
            UpdateMode::VariableTimeStep,
            OwnerRef::none(),
        );
        assert!(matches!(
            co.pause(),
            Err(SchedError::IllegalTransition { .. })
        ));
    }

    #[test]
    fn test_abort_is_idempotent_but_fails_after_completed() {
        let mut cmds = SchedCommands::default();
        let mut co = running(InstructionList::empty());
        assert_eq!(co.abort().unwrap(), true);
        assert_eq!(co.abort().unwrap(), false);

        let mut done = running(InstructionList::empty());
        done.execute(&FrameClock::from_millis(16), &mut cmds);
        assert_eq!(done.state(), CoroutineState::Completed);
        assert!(matches!(
            done.abort(),
            Err(SchedError::AbortCompleted { .. })
        ));
    }

    #[test]
    fn test_abort_from_pending_is_legal() {
        let mut co = Coroutine::new(
            Box::new(InstructionList::empty()),
            UpdateMode::VariableTimeStep,
            OwnerRef::none(),
        );
        assert_eq!(co.abort().unwrap(), true);
        assert_eq!(co.state(), CoroutineState::Aborted);
    }

    #[test]
    fn test_wait_blocks_until_duration_accumulates() {
        let mut cmds = SchedCommands::default();
        let body = InstructionList::new([Instruction::wait(Duration::from_millis(100))]);
        let mut co = running(body);

        // First execute stores the wait; then 30+40 keeps blocking, 40 more
        // resolves it and the exhausted body completes the coroutine.
        assert_eq!(co.execute(&FrameClock::from_millis(16), &mut cmds), ExecEvent::None);
        assert_eq!(co.execute(&FrameClock::from_millis(30), &mut cmds), ExecEvent::None);
        assert_eq!(co.execute(&FrameClock::from_millis(40), &mut cmds), ExecEvent::None);
        assert_eq!(co.state(), CoroutineState::Running);
        assert_eq!(
            co.execute(&FrameClock::from_millis(40), &mut cmds),
            ExecEvent::Completed
        );
    }

    #[test]
    fn test_nested_call_unwinds_in_same_frame() {
        // Outer body calls an inner body that never yields; the call stack
        // must fully unwind within one execute and nothing of the call
        // remains observable except its side effects.
        let mut cmds = SchedCommands::default();
        let inner_ran = Rc::new(Cell::new(false));
        let flag = inner_ran.clone();
        let inner = FnSequence::new(move |_sched| {
            flag.set(true);
            SeqStep::Done
        });
        let outer = InstructionList::new([
            Instruction::call(inner),
            Instruction::next_frame(),
        ]);
        let mut co = running(outer);

        assert_eq!(co.execute(&FrameClock::from_millis(16), &mut cmds), ExecEvent::None);
        assert!(inner_ran.get());
        assert_eq!(co.state(), CoroutineState::Running);
        // The next-frame instruction after the call resumes one pass later.
        assert_eq!(
            co.execute(&FrameClock::from_millis(16), &mut cmds),
            ExecEvent::Completed
        );
    }

    #[test]
    fn test_two_deep_call_unwinds_before_frame_ends() {
        let mut cmds = SchedCommands::default();
        let depth_hits = Rc::new(Cell::new(0u32));
        let h1 = depth_hits.clone();
        let innermost = FnSequence::new(move |_sched| {
            h1.set(h1.get() + 1);
            SeqStep::Done
        });
        let middle = InstructionList::new([Instruction::call(innermost)]);
        let outer = InstructionList::new([Instruction::call(middle)]);
        let mut co = running(outer);

        assert_eq!(
            co.execute(&FrameClock::from_millis(16), &mut cmds),
            ExecEvent::Completed
        );
        assert_eq!(depth_hits.get(), 1);
    }

    #[test]
    fn test_switch_yield_reports_target_and_stops() {
        let mut cmds = SchedCommands::default();
        let target = CoroutineId::from_raw(77);
        let body = InstructionList::new([
            Instruction::switch_to(target),
            // Never reached: the coroutine is deactivated by the scheduler.
            Instruction::next_frame(),
        ]);
        let mut co = running(body);
        assert_eq!(
            co.execute(&FrameClock::from_millis(16), &mut cmds),
            ExecEvent::SwitchRequested { to: target }
        );
    }
}
