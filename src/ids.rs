//! Core identifier types for the scheduler.
//!
//! All IDs are lightweight Copy types using newtype pattern for type safety.

use std::sync::atomic::{AtomicU64, Ordering};

/// Unique identifier for a coroutine.
///
/// Minted by the scheduler when a coroutine is created. The handle stays
/// valid for lookups after the coroutine terminates; lookups simply miss.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct CoroutineId(pub u64);

/// Identity of an owning scene-graph entity.
///
/// The scene graph mints these; the scheduler only uses them as index keys
/// for automatic cancellation.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct EntityId(pub u64);

/// Identity of an owning behavior unit attached to an entity.
///
/// Like [`EntityId`], external identity used purely as an index key.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct BehaviorUnitId(pub u64);

// Global counter for ID generation
static COROUTINE_ID_COUNTER: AtomicU64 = AtomicU64::new(1);

impl CoroutineId {
    /// Create a fresh unique CoroutineId.
    pub fn fresh() -> Self {
        CoroutineId(COROUTINE_ID_COUNTER.fetch_add(1, Ordering::Relaxed))
    }

    /// Get the raw value.
    pub fn raw(&self) -> u64 {
        self.0
    }

    /// Create a CoroutineId with a specific value (for testing).
    pub fn from_raw(value: u64) -> Self {
        CoroutineId(value)
    }
}

impl EntityId {
    /// Get the raw value.
    pub fn raw(&self) -> u64 {
        self.0
    }

    /// Create an EntityId from a raw value.
    pub fn from_raw(value: u64) -> Self {
        EntityId(value)
    }
}

impl BehaviorUnitId {
    /// Get the raw value.
    pub fn raw(&self) -> u64 {
        self.0
    }

    /// Create a BehaviorUnitId from a raw value.
    pub fn from_raw(value: u64) -> Self {
        BehaviorUnitId(value)
    }
}
