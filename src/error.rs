//! Error types for the scheduler.

use crate::coroutine::CoroutineState;
use crate::ids::CoroutineId;

/// Errors reported by the scheduler and by coroutine lifecycle calls.
///
/// These are call-order bugs in the host or in coroutine bodies, not
/// recoverable runtime conditions; callers are expected to fail fast.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SchedError {
    AlreadyStarted {
        id: CoroutineId,
        state: CoroutineState,
    },
    IllegalTransition {
        id: CoroutineId,
        from: CoroutineState,
        attempted: &'static str,
    },
    AbortCompleted {
        id: CoroutineId,
    },
    SwitchToActive {
        id: CoroutineId,
    },
    UnknownCoroutine {
        id: CoroutineId,
    },
}

impl std::fmt::Display for SchedError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SchedError::AlreadyStarted { id, state } => {
                write!(
                    f,
                    "coroutine {} already started or finished (state {:?})",
                    id.raw(),
                    state
                )
            }
            SchedError::IllegalTransition {
                id,
                from,
                attempted,
            } => {
                write!(
                    f,
                    "illegal transition: cannot {} coroutine {} from state {:?}",
                    attempted,
                    id.raw(),
                    from
                )
            }
            SchedError::AbortCompleted { id } => {
                write!(f, "cannot abort completed coroutine {}", id.raw())
            }
            SchedError::SwitchToActive { id } => {
                write!(
                    f,
                    "switch target coroutine {} is already active",
                    id.raw()
                )
            }
            SchedError::UnknownCoroutine { id } => {
                write!(f, "unknown coroutine {}", id.raw())
            }
        }
    }
}

impl std::error::Error for SchedError {}

impl SchedError {
    pub fn already_started(id: CoroutineId, state: CoroutineState) -> Self {
        SchedError::AlreadyStarted { id, state }
    }

    pub fn illegal_transition(
        id: CoroutineId,
        from: CoroutineState,
        attempted: &'static str,
    ) -> Self {
        SchedError::IllegalTransition {
            id,
            from,
            attempted,
        }
    }

    pub fn abort_completed(id: CoroutineId) -> Self {
        SchedError::AbortCompleted { id }
    }

    pub fn switch_to_active(id: CoroutineId) -> Self {
        SchedError::SwitchToActive { id }
    }

    pub fn unknown_coroutine(id: CoroutineId) -> Self {
        SchedError::UnknownCoroutine { id }
    }
}
