//! Sequence abstraction: the resumable body of a coroutine.
//!
//! A sequence is a lazy, finite producer of [`Instruction`]s. Game logic
//! implements [`Sequence`] directly (an explicit state machine) or uses one
//! of the adaptors below.

use std::fmt;

use crate::instruction::Instruction;
use crate::scheduler::SchedCommands;

/// A resumable producer of instructions.
///
/// `advance` runs the body until it yields the next instruction or finishes.
/// A sequence is driven by exactly one coroutine; once it reports
/// [`SeqStep::Done`] it is never advanced again.
///
/// The `sched` handle lets a body stage scheduler intents (start a new
/// coroutine, request an abort) while the active set is being iterated;
/// intents land in side buffers and are applied at the pass's batch points,
/// never immediately.
pub trait Sequence: fmt::Debug {
    fn advance(&mut self, sched: &mut SchedCommands) -> SeqStep;
}

/// One step of a sequence: a yielded instruction, or exhaustion.
#[derive(Debug)]
pub enum SeqStep {
    Yield(Instruction),
    Done,
}

pub type SequenceBox = Box<dyn Sequence>;

/// Sequence over a pre-built list of instructions, yielded front to back.
#[derive(Debug)]
pub struct InstructionList {
    items: std::collections::VecDeque<Instruction>,
}

impl InstructionList {
    pub fn new(items: impl IntoIterator<Item = Instruction>) -> Self {
        InstructionList {
            items: items.into_iter().collect(),
        }
    }

    /// The empty sequence; exhausted on first advance.
    pub fn empty() -> Self {
        Self::new([])
    }
}

impl Sequence for InstructionList {
    fn advance(&mut self, _sched: &mut SchedCommands) -> SeqStep {
        match self.items.pop_front() {
            Some(instr) => SeqStep::Yield(instr),
            None => SeqStep::Done,
        }
    }
}

/// Sequence backed by a closure returning one step per call.
///
/// The closure carries whatever resume-point state the body needs; this is
/// the escape hatch for bodies too irregular for [`InstructionList`].
pub struct FnSequence {
    step: Box<dyn FnMut(&mut SchedCommands) -> SeqStep>,
}

impl fmt::Debug for FnSequence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnSequence").finish()
    }
}

impl FnSequence {
    pub fn new(step: impl FnMut(&mut SchedCommands) -> SeqStep + 'static) -> Self {
        FnSequence {
            step: Box::new(step),
        }
    }
}

impl Sequence for FnSequence {
    fn advance(&mut self, sched: &mut SchedCommands) -> SeqStep {
        (self.step)(sched)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_instruction_list_yields_then_done() {
        let mut cmds = SchedCommands::default();
        let mut seq = InstructionList::new([Instruction::next_frame()]);
        assert!(matches!(seq.advance(&mut cmds), SeqStep::Yield(_)));
        assert!(matches!(seq.advance(&mut cmds), SeqStep::Done));
    }

    #[test]
    fn test_empty_list_is_done_immediately() {
        let mut cmds = SchedCommands::default();
        let mut seq = InstructionList::empty();
        assert!(matches!(seq.advance(&mut cmds), SeqStep::Done));
    }

    #[test]
    fn test_fn_sequence_runs_closure() {
        let mut cmds = SchedCommands::default();
        let mut remaining = 2;
        let mut seq = FnSequence::new(move |_sched| {
            if remaining == 0 {
                return SeqStep::Done;
            }
            remaining -= 1;
            SeqStep::Yield(Instruction::next_frame())
        });
        assert!(matches!(seq.advance(&mut cmds), SeqStep::Yield(_)));
        assert!(matches!(seq.advance(&mut cmds), SeqStep::Yield(_)));
        assert!(matches!(seq.advance(&mut cmds), SeqStep::Done));
    }
}
