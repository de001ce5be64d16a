//! Owning host container over window storage.

use std::sync::atomic::AtomicUsize;

use tracing::debug;

use crate::bulk;
use crate::error::{Error, Result};
use crate::hash::XxHash64;
use crate::open_addressing::{DefaultKeyEqual, KeyEqual, Scope};
use crate::probing::{LinearProbing, ProbingScheme};
use crate::set_ref::{FullOps, SetRef};
use crate::storage::{valid_window_extent, SlotKey, WindowStorage};

/// Fixed-capacity concurrent set of keys.
///
/// Owns the slot storage and the size counter. The requested capacity
/// is rounded up at construction so the window count divides evenly
/// into probing groups; [`capacity`](Self::capacity) reports the
/// rounded value. One key value must be reserved as the empty sentinel
/// and can never be inserted.
///
/// All mutation after construction goes through shared references:
/// [`insert`](Self::insert) takes `&self` and may be called from any
/// number of threads, as may [`as_ref`](Self::as_ref) views. `clear`
/// alone requires `&mut self` since it rewrites slots non-atomically.
pub struct StaticSet<K: SlotKey, S, E = DefaultKeyEqual, const W: usize = 1> {
    storage: WindowStorage<K, W>,
    counter: AtomicUsize,
    empty_key_sentinel: K,
    predicate: E,
    probing: S,
    scope: Scope,
}

impl<K, const W: usize> StaticSet<K, LinearProbing<K, XxHash64<K>>, DefaultKeyEqual, W>
where
    K: SlotKey,
{
    /// Builds a set with the default probing scheme and key equality:
    /// non-grouped linear probing over xxHash-64, device-wide
    /// visibility.
    pub fn new(capacity: usize, empty_key_sentinel: K) -> Result<Self> {
        Self::with_config(
            capacity,
            empty_key_sentinel,
            DefaultKeyEqual,
            LinearProbing::new(XxHash64::default()),
            Scope::Device,
        )
    }
}

impl<K, S, E, const W: usize> StaticSet<K, S, E, W>
where
    K: SlotKey,
    S: ProbingScheme<K>,
    E: KeyEqual<K>,
{
    /// Builds a set holding at least `capacity` slots with an explicit
    /// probing scheme, key equality predicate, and visibility scope.
    pub fn with_config(
        capacity: usize,
        empty_key_sentinel: K,
        predicate: E,
        probing: S,
        scope: Scope,
    ) -> Result<Self> {
        if capacity == 0 {
            return Err(Error::ZeroCapacity);
        }
        let num_windows = valid_window_extent(
            capacity,
            probing.group_size(),
            probing.uses_double_hashing(),
            W,
        );
        let storage = WindowStorage::new(num_windows, empty_key_sentinel)?;
        debug!(
            requested = capacity,
            slots = storage.capacity(),
            windows = num_windows,
            window_size = W,
            group_size = probing.group_size(),
            "allocated set storage"
        );
        Ok(Self {
            storage,
            counter: AtomicUsize::new(0),
            empty_key_sentinel,
            predicate,
            probing,
            scope,
        })
    }

    /// Builds a set sized so that inserting `num_keys` keys leaves it
    /// at the given load factor.
    ///
    /// # Panics
    ///
    /// Panics if `load_factor` is not in `(0, 1]`.
    pub fn with_load_factor(
        num_keys: usize,
        load_factor: f64,
        empty_key_sentinel: K,
        predicate: E,
        probing: S,
        scope: Scope,
    ) -> Result<Self> {
        assert!(
            load_factor > 0.0 && load_factor <= 1.0,
            "load factor must be in (0, 1], got {load_factor}"
        );
        let capacity = (num_keys as f64 / load_factor).ceil() as usize;
        Self::with_config(capacity, empty_key_sentinel, predicate, probing, scope)
    }

    /// Inserts every key in `keys`, returning how many were newly
    /// added. Keys equal to an already present key (or duplicated
    /// within `keys`) occupy a single slot and do not count.
    pub fn insert(&self, keys: &[K]) -> Result<usize> {
        let set_ref = self.as_ref();
        let inserted = AtomicUsize::new(0);
        bulk::for_each_index(keys.len(), |idx| {
            if set_ref.insert(keys[idx]) {
                inserted.fetch_add(1, std::sync::atomic::Ordering::Relaxed);
            }
        })?;
        Ok(inserted.into_inner())
    }

    /// Inserts every key and records per-key novelty in `inserted`:
    /// `inserted[i]` is true iff `keys[i]` claimed a new slot.
    pub fn insert_with_output(&self, keys: &[K], inserted: &mut [bool]) -> Result<()> {
        if keys.len() != inserted.len() {
            return Err(Error::LengthMismatch {
                inputs: keys.len(),
                outputs: inserted.len(),
            });
        }
        let set_ref = self.as_ref();
        bulk::map_into(inserted, |idx| set_ref.insert(keys[idx]))
    }

    /// Writes `output[i] = true` iff `keys[i]` is present.
    pub fn contains(&self, keys: &[K], output: &mut [bool]) -> Result<()> {
        if keys.len() != output.len() {
            return Err(Error::LengthMismatch {
                inputs: keys.len(),
                outputs: output.len(),
            });
        }
        let set_ref = self.as_ref();
        bulk::map_into(output, |idx| set_ref.contains(&keys[idx]))
    }

    /// Resets every slot to the empty sentinel and the size to zero.
    pub fn clear(&mut self) {
        self.storage.initialize(self.empty_key_sentinel);
        *self.counter.get_mut() = 0;
    }

    /// Total slots, after construction-time rounding.
    pub fn capacity(&self) -> usize {
        self.storage.capacity()
    }

    /// Number of keys currently stored.
    pub fn len(&self) -> usize {
        self.counter.load(self.scope.load_ordering())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Current fill ratio in `[0, 1]`.
    pub fn load_factor(&self) -> f64 {
        self.len() as f64 / self.capacity() as f64
    }

    /// The reserved key value standing for an unoccupied slot.
    pub fn empty_key_sentinel(&self) -> K {
        self.empty_key_sentinel
    }

    pub fn scope(&self) -> Scope {
        self.scope
    }

    /// Borrows a non-owning reference supporting insert, contains, and
    /// count.
    pub fn as_ref(&self) -> SetRef<'_, K, S, E, W, FullOps> {
        SetRef::new(
            self.empty_key_sentinel,
            self.predicate,
            self.probing,
            self.storage.storage_ref(),
            &self.counter,
            self.scope,
        )
    }

    /// Borrows a reference restricted to the given operation set.
    pub fn as_ref_with<Ops>(&self, ops: Ops) -> SetRef<'_, K, S, E, W, Ops> {
        self.as_ref().with(ops)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hash::IdentityHash;

    #[test]
    fn zero_capacity_is_rejected() {
        let res = StaticSet::<u32, _, _, 1>::new(0, u32::MAX);
        assert!(matches!(res, Err(Error::ZeroCapacity)));
    }

    #[test]
    fn capacity_rounds_up_to_group_multiple() {
        let probing = LinearProbing::<u32, _, 4>::new(IdentityHash::default());
        let set = StaticSet::<u32, _, _, 2>::with_config(
            10,
            u32::MAX,
            DefaultKeyEqual,
            probing,
            Scope::Device,
        )
        .unwrap();
        // 10 slots -> 5 windows -> rounded to 8 windows of 2 slots.
        assert_eq!(set.capacity(), 16);
    }

    #[test]
    fn load_factor_sizing() {
        let set = StaticSet::<u64, _, _, 1>::with_load_factor(
            50,
            0.5,
            u64::MAX,
            DefaultKeyEqual,
            LinearProbing::<_, _, 1>::new(XxHash64::default()),
            Scope::Device,
        )
        .unwrap();
        assert!(set.capacity() >= 100);
    }

    #[test]
    #[should_panic(expected = "load factor")]
    fn load_factor_out_of_range_panics() {
        let _ = StaticSet::<u32, _, _, 1>::with_load_factor(
            10,
            1.5,
            u32::MAX,
            DefaultKeyEqual,
            LinearProbing::<_, _, 1>::new(XxHash64::default()),
            Scope::Device,
        );
    }

    #[test]
    fn clear_resets_contents_and_size() {
        let mut set = StaticSet::<u32, _, _, 2>::new(64, u32::MAX).unwrap();
        assert_eq!(set.insert(&[1, 2, 3]).unwrap(), 3);
        assert_eq!(set.len(), 3);
        set.clear();
        assert_eq!(set.len(), 0);
        let mut out = [true; 3];
        set.contains(&[1, 2, 3], &mut out).unwrap();
        assert_eq!(out, [false; 3]);
    }

    #[test]
    fn mismatched_output_length_is_rejected() {
        let set = StaticSet::<u32, _, _, 1>::new(16, u32::MAX).unwrap();
        let mut out = [false; 2];
        let res = set.contains(&[1, 2, 3], &mut out);
        assert!(matches!(
            res,
            Err(Error::LengthMismatch {
                inputs: 3,
                outputs: 2
            })
        ));
    }
}
