//! Suspension instructions yielded by coroutine bodies.
//!
//! An instruction describes why the currently running step stays suspended
//! before the body is resumed, or requests a one-time control transfer.
//! Every instruction is consumed exactly once by the coroutine that stored
//! it; only `WaitFor` carries mutable progress (elapsed-time accumulation).

use std::fmt;
use std::time::Duration;

use crate::clock::FrameClock;
use crate::ids::CoroutineId;
use crate::sequence::{Sequence, SequenceBox};

pub enum Instruction {
    /// Resume the body on the next processing pass.
    NextFrame,
    /// Resume once `accumulated` elapsed frame time reaches `target`.
    /// Once satisfied it stays satisfied.
    WaitFor {
        target: Duration,
        accumulated: Duration,
    },
    /// Resume once the predicate returns true.
    WaitUntil {
        predicate: Box<dyn FnMut() -> bool>,
    },
    /// Push `body` onto the coroutine call stack and resume it in the same
    /// frame. Never costs a frame boundary.
    Call { body: SequenceBox },
    /// Hand scheduling eligibility to `target` on the next batch pass.
    SwitchTo { target: CoroutineId },
}

impl Instruction {
    pub fn next_frame() -> Self {
        Instruction::NextFrame
    }

    pub fn wait(target: Duration) -> Self {
        Instruction::WaitFor {
            target,
            accumulated: Duration::ZERO,
        }
    }

    pub fn wait_until(predicate: impl FnMut() -> bool + 'static) -> Self {
        Instruction::WaitUntil {
            predicate: Box::new(predicate),
        }
    }

    pub fn call(body: impl Sequence + 'static) -> Self {
        Instruction::Call {
            body: Box::new(body),
        }
    }

    pub fn switch_to(target: CoroutineId) -> Self {
        Instruction::SwitchTo { target }
    }

    /// Whether the owning coroutine is still suspended given the current
    /// frame clock.
    ///
    /// `NextFrame` polls unblocked: the one-frame wait comes from the gap
    /// between storing the instruction and the next processing pass.
    /// `Call` and `SwitchTo` poll unblocked so their one-time effect is
    /// applied exactly once, immediately after being produced.
    pub fn blocks(&mut self, clock: &FrameClock) -> bool {
        match self {
            Instruction::NextFrame => false,
            Instruction::WaitFor {
                target,
                accumulated,
            } => {
                if *accumulated < *target {
                    *accumulated += clock.delta;
                }
                *accumulated < *target
            }
            Instruction::WaitUntil { predicate } => !predicate(),
            Instruction::Call { .. } => false,
            Instruction::SwitchTo { .. } => false,
        }
    }
}

impl fmt::Debug for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Instruction::NextFrame => f.write_str("NextFrame"),
            Instruction::WaitFor {
                target,
                accumulated,
            } => f
                .debug_struct("WaitFor")
                .field("target", target)
                .field("accumulated", accumulated)
                .finish(),
            Instruction::WaitUntil { .. } => f.debug_struct("WaitUntil").finish(),
            Instruction::Call { body } => {
                f.debug_struct("Call").field("body", body).finish()
            }
            Instruction::SwitchTo { target } => f
                .debug_struct("SwitchTo")
                .field("target", target)
                .finish(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_next_frame_polls_unblocked() {
        let mut instr = Instruction::next_frame();
        assert!(!instr.blocks(&FrameClock::from_millis(16)));
    }

    #[test]
    fn test_wait_accumulates_across_frames() {
        // 100ms wait over 30/40/40ms frames resolves on the third poll.
        let mut instr = Instruction::wait(Duration::from_millis(100));
        assert!(instr.blocks(&FrameClock::from_millis(30)));
        assert!(instr.blocks(&FrameClock::from_millis(40)));
        assert!(!instr.blocks(&FrameClock::from_millis(40)));
    }

    #[test]
    fn test_wait_stays_satisfied() {
        let mut instr = Instruction::wait(Duration::from_millis(10));
        assert!(!instr.blocks(&FrameClock::from_millis(20)));
        assert!(!instr.blocks(&FrameClock::from_millis(0)));
    }

    #[test]
    fn test_wait_until_tracks_predicate() {
        let flag = std::rc::Rc::new(std::cell::Cell::new(false));
        let seen = flag.clone();
        let mut instr = Instruction::wait_until(move || seen.get());
        let clock = FrameClock::from_millis(16);
        assert!(instr.blocks(&clock));
        flag.set(true);
        assert!(!instr.blocks(&clock));
    }

    #[test]
    fn test_switch_to_polls_unblocked() {
        let mut instr = Instruction::switch_to(CoroutineId::from_raw(9));
        assert!(!instr.blocks(&FrameClock::from_millis(16)));
    }
}
