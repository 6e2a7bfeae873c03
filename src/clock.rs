//! Frame clock value type supplied by the host loop.
//!
//! The scheduler never measures time itself; the host hands it a clock
//! snapshot once per processing pass.

use std::time::Duration;

/// Time information for one frame of the host game loop.
///
/// `delta` is the wall time elapsed since the previous frame; `fixed_step`
/// is the host's fixed simulation step. Both are plain data; constructing a
/// clock has no side effects, which keeps scheduling fully deterministic in
/// tests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameClock {
    pub delta: Duration,
    pub fixed_step: Duration,
}

impl FrameClock {
    pub fn new(delta: Duration, fixed_step: Duration) -> Self {
        FrameClock { delta, fixed_step }
    }

    /// Clock for a variable-step frame with the given delta and the default
    /// 60 Hz fixed step.
    pub fn from_delta(delta: Duration) -> Self {
        FrameClock {
            delta,
            fixed_step: Duration::from_micros(16_667),
        }
    }

    /// Clock for a fixed-step tick: delta equals the fixed step.
    pub fn fixed(step: Duration) -> Self {
        FrameClock {
            delta: step,
            fixed_step: step,
        }
    }

    pub fn from_millis(delta_ms: u64) -> Self {
        Self::from_delta(Duration::from_millis(delta_ms))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_millis_sets_delta() {
        let clock = FrameClock::from_millis(33);
        assert_eq!(clock.delta, Duration::from_millis(33));
    }

    #[test]
    fn test_fixed_clock_delta_equals_step() {
        let clock = FrameClock::fixed(Duration::from_millis(20));
        assert_eq!(clock.delta, clock.fixed_step);
    }
}
