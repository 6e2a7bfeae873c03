//! Compile-time gated debug logging utilities for the scheduler.

/// Emit scheduler debug logs only when the `sched_debug_logs` Cargo feature
/// is enabled.
///
/// With the feature disabled (default), this macro compiles to a no-op while
/// still type-checking format arguments.
#[macro_export]
macro_rules! sched_debug_log {
    ($($arg:tt)*) => {{
        #[cfg(feature = "sched_debug_logs")]
        {
            eprintln!($($arg)*);
        }
        #[cfg(not(feature = "sched_debug_logs"))]
        {
            let _ = format_args!($($arg)*);
        }
    }};
}
