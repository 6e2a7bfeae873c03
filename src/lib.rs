//! gamecoro: frame-synchronous cooperative coroutine scheduler for game
//! logic.
//!
//! Game behaviors are written as sequences of steps that span multiple
//! frames (wait some time, wait for a condition, call a sub-sequence, hand
//! control to another coroutine) without blocking the host's update loop.
//!
//! # Architecture
//!
//! - **Instruction**: immutable suspension/control-transfer descriptions
//!   yielded by bodies, consumed exactly once
//! - **Coroutine**: one suspendable execution context with a call stack of
//!   sequences and a monotonic lifecycle state machine
//! - **Scheduler**: owns every coroutine, advances the active set once per
//!   pass, and applies staged starts/removals/switches in a fixed batch
//!   phase order so bodies can request control flow mid-iteration safely
//!
//! The model is strictly single-threaded and cooperative: no OS threads, no
//! preemption, no locks. Time comes in from the host as a [`FrameClock`]
//! value; scene-graph lifecycle comes in as owner-removal notifications.

pub mod clock;
pub mod coroutine;
pub mod error;
pub mod ids;
pub mod instruction;
mod logging;
pub mod scheduler;
pub mod sequence;

// Re-exports for convenience
pub use clock::FrameClock;
pub use coroutine::{CoroutineState, OwnerRef, UpdateMode};
pub use error::SchedError;
pub use ids::{BehaviorUnitId, CoroutineId, EntityId};
pub use instruction::Instruction;
pub use scheduler::{CoroutineScheduler, SchedCommands};
pub use sequence::{FnSequence, InstructionList, SeqStep, Sequence, SequenceBox};
