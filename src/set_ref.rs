//! Non-owning, capability-composed reference to a set.
//!
//! A [`SetRef`] is a trivially copyable bundle of sentinel, equality
//! wrapper, probing scheme, and storage view. It owns nothing; the
//! borrow it carries keeps it from outliving the container. Which
//! operations it exposes is decided at compile time by its operator
//! list: a ref built with only [`op::Contains`] has no `insert` method
//! at all, so read-only views can be handed to code that must not
//! mutate the table. There is no runtime dispatch anywhere on the
//! per-key path.

use std::marker::PhantomData;
use std::sync::atomic::AtomicUsize;

use crate::open_addressing::{EqualResult, EqualWrapper, KeyEqual, Scope};
use crate::probing::ProbingScheme;
use crate::storage::{SlotKey, WindowStorageRef};

/// Operator capabilities mixed into a [`SetRef`] at compile time.
pub mod op {
    /// Grants `insert`.
    #[derive(Copy, Clone, Debug, Default)]
    pub struct Insert;

    /// Grants `contains`.
    #[derive(Copy, Clone, Debug, Default)]
    pub struct Contains;

    /// Grants `count` (reading the shared insertion counter).
    #[derive(Copy, Clone, Debug, Default)]
    pub struct Count;
}

/// Compile-time membership test: the operator list `Self` carries `Op`.
///
/// Implemented for every tuple of distinct operators; requesting a
/// method whose operator is absent from the list is a compile error.
pub trait HasOperator<Op> {}

macro_rules! impl_has_operators {
    ($list:ty => $($member:ty),+) => {
        $(impl HasOperator<$member> for $list {})+
    };
}

impl_has_operators!((op::Insert,) => op::Insert);
impl_has_operators!((op::Contains,) => op::Contains);
impl_has_operators!((op::Count,) => op::Count);
impl_has_operators!((op::Insert, op::Contains) => op::Insert, op::Contains);
impl_has_operators!((op::Contains, op::Insert) => op::Insert, op::Contains);
impl_has_operators!((op::Insert, op::Count) => op::Insert, op::Count);
impl_has_operators!((op::Count, op::Insert) => op::Insert, op::Count);
impl_has_operators!((op::Contains, op::Count) => op::Contains, op::Count);
impl_has_operators!((op::Count, op::Contains) => op::Contains, op::Count);
impl_has_operators!((op::Insert, op::Contains, op::Count) => op::Insert, op::Contains, op::Count);
impl_has_operators!((op::Insert, op::Count, op::Contains) => op::Insert, op::Contains, op::Count);
impl_has_operators!((op::Contains, op::Insert, op::Count) => op::Insert, op::Contains, op::Count);
impl_has_operators!((op::Contains, op::Count, op::Insert) => op::Insert, op::Contains, op::Count);
impl_has_operators!((op::Count, op::Insert, op::Contains) => op::Insert, op::Contains, op::Count);
impl_has_operators!((op::Count, op::Contains, op::Insert) => op::Insert, op::Contains, op::Count);

/// The full operator list: insert, contains, count.
pub type FullOps = (op::Insert, op::Contains, op::Count);

/// A read-only operator list: contains and count.
pub type ReadOnlyOps = (op::Contains, op::Count);

/// Non-owning view over a set's state, exposing the operations named in
/// `Ops`.
///
/// Copy it freely; every worker of a bulk operation holds its own copy
/// aliasing the same storage, which is the intended sharing model.
pub struct SetRef<'a, K: SlotKey, S, E, const W: usize, Ops> {
    storage: WindowStorageRef<'a, K, W>,
    counter: &'a AtomicUsize,
    predicate: EqualWrapper<K, E>,
    probing: S,
    scope: Scope,
    _ops: PhantomData<Ops>,
}

impl<K: SlotKey, S: Copy, E: Copy, const W: usize, Ops> Clone for SetRef<'_, K, S, E, W, Ops> {
    fn clone(&self) -> Self {
        Self {
            storage: self.storage,
            counter: self.counter,
            predicate: self.predicate,
            probing: self.probing,
            scope: self.scope,
            _ops: PhantomData,
        }
    }
}

impl<K: SlotKey, S: Copy, E: Copy, const W: usize, Ops> Copy for SetRef<'_, K, S, E, W, Ops> {}

impl<'a, K, S, E, const W: usize, Ops> SetRef<'a, K, S, E, W, Ops>
where
    K: SlotKey,
    S: ProbingScheme<K>,
    E: KeyEqual<K>,
{
    /// Builds a reference from the table's components.
    ///
    /// The operator list is chosen by the caller's type annotation or
    /// by a later [`with`](Self::with) cast.
    pub fn new(
        empty_sentinel: K,
        key_equal: E,
        probing: S,
        storage: WindowStorageRef<'a, K, W>,
        counter: &'a AtomicUsize,
        scope: Scope,
    ) -> Self {
        Self {
            storage,
            counter,
            predicate: EqualWrapper::new(empty_sentinel, key_equal),
            probing,
            scope,
            _ops: PhantomData,
        }
    }

    /// Value-level capability cast: the same underlying state
    /// advertising a different operator list. Not a new table.
    pub fn with<NewOps>(self, _ops: NewOps) -> SetRef<'a, K, S, E, W, NewOps> {
        SetRef {
            storage: self.storage,
            counter: self.counter,
            predicate: self.predicate,
            probing: self.probing,
            scope: self.scope,
            _ops: PhantomData,
        }
    }

    /// Total slot count.
    #[inline]
    pub fn capacity(&self) -> usize {
        self.storage.capacity()
    }

    /// The reserved empty-key sentinel.
    #[inline]
    pub fn empty_key_sentinel(&self) -> K {
        K::from_bits(self.predicate.empty_bits())
    }

    /// Visibility scope of this reference's atomic operations.
    #[inline]
    pub fn scope(&self) -> Scope {
        self.scope
    }
}

impl<'a, K, S, E, const W: usize, Ops> SetRef<'a, K, S, E, W, Ops>
where
    K: SlotKey,
    S: ProbingScheme<K>,
    E: KeyEqual<K>,
    Ops: HasOperator<op::Insert>,
{
    /// Inserts `key`, returning `true` if it was newly inserted and
    /// `false` if it was already present or the table is full.
    ///
    /// Idempotent under arbitrary concurrency: racing inserts of the
    /// same key converge to exactly one physical slot and exactly one
    /// `true` return. Inserting the empty sentinel violates the
    /// container's contract and makes the slot indistinguishable from
    /// an unoccupied one.
    pub fn insert(&self, key: K) -> bool {
        let key_bits = key.to_bits();
        let empty_bits = self.predicate.empty_bits();
        let (success, failure) = self.scope.cas_orderings();
        let num_windows = self.storage.num_windows();
        let group = self.probing.group_size();

        let mut iter = self.probing.probe(&key, num_windows);
        let start = iter.current();

        loop {
            let base = iter.current();
            for lane in 0..group {
                let window = self.storage.window((base + lane) % num_windows);

                // Ballot pass: classify the whole window before acting,
                // so a present key wins over a claimable slot.
                let mut available: u32 = 0;
                let mut present = false;
                for (i, slot) in window.iter().enumerate() {
                    let bits = K::atomic_load(slot, self.scope.load_ordering());
                    match self.predicate.equal_for_insert(&key, bits) {
                        EqualResult::Equal => present = true,
                        EqualResult::Available => available |= 1 << i,
                        EqualResult::Unequal | EqualResult::Empty => {}
                    }
                }
                if present {
                    return false;
                }

                // Claim the lowest balloted slot; on a lost race,
                // re-inspect the winner and fall through to the next
                // candidate.
                while available != 0 {
                    let i = available.trailing_zeros() as usize;
                    available &= available - 1;

                    match K::atomic_compare_exchange(
                        &window[i],
                        empty_bits,
                        key_bits,
                        success,
                        failure,
                    ) {
                        Ok(_) => {
                            // Once committed, an empty-to-key
                            // transition is never undone.
                            self.counter.fetch_add(1, self.scope.rmw_ordering());
                            return true;
                        }
                        Err(winner) => {
                            if self.predicate.equal_for_insert(&key, winner)
                                == EqualResult::Equal
                            {
                                return false;
                            }
                        }
                    }
                }
            }

            iter.advance();
            if iter.current() == start {
                // Full wrap of the probe sequence: the set is full.
                return false;
            }
        }
    }
}

impl<'a, K, S, E, const W: usize, Ops> SetRef<'a, K, S, E, W, Ops>
where
    K: SlotKey,
    S: ProbingScheme<K>,
    E: KeyEqual<K>,
    Ops: HasOperator<op::Contains>,
{
    /// Whether `key` is in the set.
    ///
    /// Walks the same probe sequence as insert; a match anywhere in the
    /// probed group reports presence, and an empty slot proves the key
    /// was never inserted (insert always fills the first empty slot
    /// along the identical sequence, and slots are never erased).
    pub fn contains(&self, key: &K) -> bool {
        let num_windows = self.storage.num_windows();
        let group = self.probing.group_size();

        let mut iter = self.probing.probe(key, num_windows);
        let start = iter.current();

        loop {
            let base = iter.current();
            let mut saw_empty = false;
            for lane in 0..group {
                let window = self.storage.window((base + lane) % num_windows);
                for slot in window {
                    let bits = K::atomic_load(slot, self.scope.load_ordering());
                    match self.predicate.equal_for_find(key, bits) {
                        EqualResult::Equal => return true,
                        EqualResult::Empty => saw_empty = true,
                        EqualResult::Unequal | EqualResult::Available => {}
                    }
                }
            }
            // A match anywhere in the group outranks an empty slot, so
            // the group-wide reduction happens before this decision.
            if saw_empty {
                return false;
            }

            iter.advance();
            if iter.current() == start {
                return false;
            }
        }
    }
}

impl<'a, K, S, E, const W: usize, Ops> SetRef<'a, K, S, E, W, Ops>
where
    K: SlotKey,
    S: ProbingScheme<K>,
    E: KeyEqual<K>,
    Ops: HasOperator<op::Count>,
{
    /// Number of successful novel inserts observed at this reference's
    /// scope.
    #[inline]
    pub fn count(&self) -> usize {
        self.counter.load(self.scope.load_ordering())
    }
}
