//! Open addressing primitives: visibility scope and sentinel-aware
//! equality.
//!
//! Every atomic operation in the engine is parameterized by a [`Scope`]
//! describing the set of threads for which its effect must be ordered
//! and visible. Slot classification goes through [`EqualWrapper`] so no
//! caller ever compares a key against the empty sentinel as if it were
//! a regular key.

use std::sync::atomic::Ordering;

use crate::storage::SlotKey;

/// Thread-visibility scope for atomic operations.
///
/// A successful slot claim must become visible within the declared
/// scope before a subsequent find by a thread inside that scope is
/// guaranteed to observe it. Narrower scopes are cheaper but only safe
/// when all participating threads actually share the scope.
#[derive(Copy, Clone, PartialEq, Eq, Debug, Default)]
pub enum Scope {
    /// Visibility within one cooperating worker group only.
    ///
    /// No cross-group ordering is established; unsafe whenever two
    /// groups may probe the same keys.
    Group,

    /// Visibility across all threads of the process. Recommended
    /// default: release/acquire ordering on the slot CAS.
    #[default]
    Device,

    /// Sequentially consistent visibility, the widest and slowest
    /// scope. Use when slot writes must additionally be ordered against
    /// unrelated shared state.
    System,
}

impl Scope {
    /// Success/failure orderings for a slot compare-and-swap at this
    /// scope.
    #[inline]
    pub(crate) fn cas_orderings(self) -> (Ordering, Ordering) {
        match self {
            Scope::Group => (Ordering::Relaxed, Ordering::Relaxed),
            Scope::Device => (Ordering::AcqRel, Ordering::Acquire),
            Scope::System => (Ordering::SeqCst, Ordering::SeqCst),
        }
    }

    /// Ordering for slot and counter loads at this scope.
    #[inline]
    pub(crate) fn load_ordering(self) -> Ordering {
        match self {
            Scope::Group => Ordering::Relaxed,
            Scope::Device => Ordering::Acquire,
            Scope::System => Ordering::SeqCst,
        }
    }

    /// Ordering for counter read-modify-writes at this scope.
    #[inline]
    pub(crate) fn rmw_ordering(self) -> Ordering {
        match self {
            Scope::Group => Ordering::Relaxed,
            Scope::Device => Ordering::AcqRel,
            Scope::System => Ordering::SeqCst,
        }
    }
}

/// Result of classifying one slot against a probe key.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum EqualResult {
    /// Slot holds a different live key; keep scanning.
    Unequal,
    /// Slot holds the probe key.
    Equal,
    /// Slot is empty; terminates a find.
    Empty,
    /// Slot is empty from insert's point of view: claimable.
    Available,
}

/// User-customizable key equality.
///
/// The predicate is never invoked with a sentinel on either side; the
/// [`EqualWrapper`] filters sentinels out first with a bitwise check.
/// Slot keys are always the right-hand side.
pub trait KeyEqual<K>: Copy + Send + Sync {
    /// Whether the probe key and the key stored in a slot are
    /// equivalent.
    fn equal(&self, probe_key: &K, slot_key: &K) -> bool;
}

/// Default equality via `PartialEq`.
#[derive(Copy, Clone, Debug, Default)]
pub struct DefaultKeyEqual;

impl<K: PartialEq> KeyEqual<K> for DefaultKeyEqual {
    #[inline]
    fn equal(&self, probe_key: &K, slot_key: &K) -> bool {
        probe_key == slot_key
    }
}

/// Bundles the empty sentinel with a user equality predicate.
///
/// Emptiness is decided on the raw slot bits, never through the user
/// predicate, so slot classification cannot race through user logic.
/// This wrapper is the single place where key-equality semantics would
/// be extended (e.g. with an erased sentinel) without touching probing
/// or the insert algorithm.
pub struct EqualWrapper<K: SlotKey, E> {
    key_equal: E,
    empty_bits: K::Bits,
}

impl<K: SlotKey, E: Copy> Clone for EqualWrapper<K, E> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<K: SlotKey, E: Copy> Copy for EqualWrapper<K, E> {}

impl<K: SlotKey, E: KeyEqual<K>> EqualWrapper<K, E> {
    /// Creates a wrapper around `key_equal` with the given empty
    /// sentinel.
    pub fn new(empty_sentinel: K, key_equal: E) -> Self {
        Self {
            key_equal,
            empty_bits: empty_sentinel.to_bits(),
        }
    }

    /// Raw bit pattern of the empty sentinel (the CAS expected value).
    #[inline]
    pub(crate) fn empty_bits(&self) -> K::Bits {
        self.empty_bits
    }

    /// Classifies a slot for insertion: empty slots are claimable.
    #[inline]
    pub fn equal_for_insert(&self, probe_key: &K, slot_bits: K::Bits) -> EqualResult {
        if slot_bits == self.empty_bits {
            return EqualResult::Available;
        }
        if self.key_equal.equal(probe_key, &K::from_bits(slot_bits)) {
            EqualResult::Equal
        } else {
            EqualResult::Unequal
        }
    }

    /// Classifies a slot for lookup: an empty slot stops the probe.
    #[inline]
    pub fn equal_for_find(&self, probe_key: &K, slot_bits: K::Bits) -> EqualResult {
        if slot_bits == self.empty_bits {
            return EqualResult::Empty;
        }
        if self.key_equal.equal(probe_key, &K::from_bits(slot_bits)) {
            EqualResult::Equal
        } else {
            EqualResult::Unequal
        }
    }
}
