//! Probing schemes: deterministic window sequences for collision
//! resolution.
//!
//! A scheme maps a key to a restartable sequence of window indices. The
//! same key always yields the same sequence, which is what lets a find
//! stop at the first empty slot: insert fills the first empty slot
//! along the identical sequence, so an empty slot proves the key was
//! never inserted past that point.

use std::marker::PhantomData;

use crate::hash::{HashOutput, KeyHash};

/// Iterator over a probe sequence of window indices.
///
/// Starts at an initial window and advances by a fixed step, wrapping
/// at the window count. The sequence is effectively infinite; the
/// caller bounds it by comparing the current index against the one it
/// started from.
#[derive(Clone, Copy, Debug)]
pub struct ProbeIterator {
    current: usize,
    step: usize,
    num_windows: usize,
}

impl ProbeIterator {
    /// Creates an iterator starting at `start`, stepping by `step`
    /// windows, wrapping at `num_windows`.
    pub const fn new(start: usize, step: usize, num_windows: usize) -> Self {
        Self {
            current: start,
            step,
            num_windows,
        }
    }

    /// Current window index.
    #[inline]
    pub const fn current(&self) -> usize {
        self.current
    }

    /// Advances to the next window in the sequence.
    #[inline]
    pub fn advance(&mut self) {
        self.current = (self.current + self.step) % self.num_windows;
    }
}

/// A collision-resolution strategy.
///
/// Schemes are parameterized by a cooperating-group size `G`: one probe
/// step covers the `G` contiguous windows of a group, and start/step
/// arithmetic is group-aligned so sequences stay identical no matter
/// which worker replays them.
pub trait ProbingScheme<K>: Copy + Send + Sync {
    /// Creates the probe sequence for `key` over a table of
    /// `num_windows` windows.
    ///
    /// `num_windows` must be a positive multiple of
    /// [`group_size`](Self::group_size); the storage extent computation
    /// guarantees this.
    fn probe(&self, key: &K, num_windows: usize) -> ProbeIterator;

    /// Number of windows jointly covered per probe step.
    fn group_size(&self) -> usize;

    /// Whether this scheme derives its step from a second hash.
    ///
    /// Double-hashing schemes need a prime group count so every step is
    /// coprime with the cycle length; the extent computation consults
    /// this.
    fn uses_double_hashing(&self) -> bool {
        false
    }
}

/// Linear probing: `window_i = ((h(key) mod groups) + i) * G mod num_windows`.
///
/// Simple and cache-friendly, at the cost of primary clustering near
/// full load factors.
#[derive(Debug)]
pub struct LinearProbing<K, H, const G: usize = 1> {
    hasher: H,
    _phantom: PhantomData<K>,
}

impl<K, H: Copy, const G: usize> Clone for LinearProbing<K, H, G> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<K, H: Copy, const G: usize> Copy for LinearProbing<K, H, G> {}

impl<K, H, const G: usize> LinearProbing<K, H, G> {
    /// Creates a linear probing scheme with the given hash function.
    pub const fn new(hasher: H) -> Self {
        assert!(G >= 1, "group size must be at least 1");
        Self {
            hasher,
            _phantom: PhantomData,
        }
    }
}

impl<K: Send + Sync, H: KeyHash<K>, const G: usize> ProbingScheme<K> for LinearProbing<K, H, G> {
    fn probe(&self, key: &K, num_windows: usize) -> ProbeIterator {
        let num_groups = num_windows / G;
        let start = (self.hasher.hash(key).to_usize() % num_groups) * G;
        ProbeIterator::new(start, G, num_windows)
    }

    fn group_size(&self) -> usize {
        G
    }
}

/// Double hashing: start from `h1(key)`, step by a second-hash-derived
/// stride.
///
/// The stride is `((h2(key) mod (num_groups - 1)) + 1) * G`: non-zero
/// and, with the prime group count the extent computation provides,
/// coprime with the cycle length, so the sequence covers the whole
/// table. Reduces clustering at the cost of a second hash evaluation.
#[derive(Debug)]
pub struct DoubleHashing<K, H1, H2, const G: usize = 1> {
    hasher1: H1,
    hasher2: H2,
    _phantom: PhantomData<K>,
}

impl<K, H1: Copy, H2: Copy, const G: usize> Clone for DoubleHashing<K, H1, H2, G> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<K, H1: Copy, H2: Copy, const G: usize> Copy for DoubleHashing<K, H1, H2, G> {}

impl<K, H1, H2, const G: usize> DoubleHashing<K, H1, H2, G> {
    /// Creates a double-hashing scheme from two independent hash
    /// functions.
    pub const fn new(hasher1: H1, hasher2: H2) -> Self {
        assert!(G >= 1, "group size must be at least 1");
        Self {
            hasher1,
            hasher2,
            _phantom: PhantomData,
        }
    }
}

impl<K, H1, H2, const G: usize> ProbingScheme<K> for DoubleHashing<K, H1, H2, G>
where
    K: Send + Sync,
    H1: KeyHash<K>,
    H2: KeyHash<K>,
{
    fn probe(&self, key: &K, num_windows: usize) -> ProbeIterator {
        let num_groups = num_windows / G;
        let start = (self.hasher1.hash(key).to_usize() % num_groups) * G;
        let step_base = if num_groups > 1 {
            (self.hasher2.hash(key).to_usize() % (num_groups - 1)) + 1
        } else {
            1
        };
        ProbeIterator::new(start, step_base * G, num_windows)
    }

    fn group_size(&self) -> usize {
        G
    }

    fn uses_double_hashing(&self) -> bool {
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hash::{IdentityHash, XxHash64};

    fn sequence<K, S: ProbingScheme<K>>(
        scheme: &S,
        key: &K,
        num_windows: usize,
        len: usize,
    ) -> Vec<usize> {
        let mut iter = scheme.probe(key, num_windows);
        (0..len)
            .map(|_| {
                let w = iter.current();
                iter.advance();
                w
            })
            .collect()
    }

    #[test]
    fn linear_sequence_is_deterministic() {
        let scheme = LinearProbing::<u64, _>::new(XxHash64::new(3));
        let a = sequence(&scheme, &99, 16, 32);
        let b = sequence(&scheme, &99, 16, 32);
        assert_eq!(a, b);
    }

    #[test]
    fn linear_probing_wraps_around() {
        let scheme = LinearProbing::<u64, _>::new(IdentityHash::new());
        // hash 3 mod 4 windows -> 3, then wraps 0, 1, 2, 3.
        assert_eq!(sequence(&scheme, &3, 4, 5), vec![3, 0, 1, 2, 3]);
    }

    #[test]
    fn linear_probing_visits_every_window() {
        let scheme = LinearProbing::<u64, _>::new(XxHash64::new(0));
        let seq = sequence(&scheme, &7, 13, 13);
        let mut sorted = seq.clone();
        sorted.sort_unstable();
        sorted.dedup();
        assert_eq!(sorted.len(), 13);
    }

    #[test]
    fn double_hashing_covers_every_group_when_prime() {
        let scheme =
            DoubleHashing::<u64, _, _>::new(XxHash64::new(1), XxHash64::new(2));
        // 13 is prime, so any step in 1..13 cycles through all windows.
        for key in 0u64..50 {
            let seq = sequence(&scheme, &key, 13, 13);
            let mut sorted = seq.clone();
            sorted.sort_unstable();
            sorted.dedup();
            assert_eq!(sorted.len(), 13, "key {key} did not cover the table");
        }
    }

    #[test]
    fn double_hashing_step_is_never_zero() {
        let scheme =
            DoubleHashing::<u64, _, _>::new(XxHash64::new(1), XxHash64::new(2));
        for key in 0u64..100 {
            let mut iter = scheme.probe(&key, 13);
            let first = iter.current();
            iter.advance();
            assert_ne!(iter.current(), first);
        }
    }

    #[test]
    fn grouped_probing_starts_on_group_boundaries() {
        let scheme = LinearProbing::<u64, _, 4>::new(XxHash64::new(0));
        for key in 0u64..64 {
            let iter = scheme.probe(&key, 16);
            assert_eq!(iter.current() % 4, 0);
        }
    }
}
