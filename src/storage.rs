//! Windowed slot storage for the hash set.
//!
//! Storage is a flat array of fixed-width windows, each holding `W`
//! slots. A window is the unit addressed by probing; a whole window is
//! inspected in one probe step. Every slot is its own atomic cell, so
//! slots never share an atomic access granule and a compare-and-swap on
//! one slot can never tear a neighbor.

use std::sync::atomic::{
    fence, AtomicU32, AtomicU64, AtomicUsize, Ordering,
};

use crate::error::{Error, Result};

/// Key types that fit a single atomic access granule.
///
/// A slot holds the raw bit pattern of one key, so keys must be
/// bitwise-comparable: equality and emptiness tests reduce to integer
/// comparisons and never invoke user logic that could itself race.
/// Implemented for the fixed-width integer types up to 8 bytes, the
/// same restriction the slot CAS strategy imposes in comparable
/// open-addressing containers.
pub trait SlotKey: Copy + PartialEq + Send + Sync + 'static {
    /// Atomic cell backing one slot of this key type.
    type Atomic: Send + Sync;
    /// Raw bit representation stored in the cell.
    type Bits: Copy + Eq + Send + Sync;

    /// Converts the key to its stored bit pattern.
    fn to_bits(self) -> Self::Bits;
    /// Reconstructs a key from a stored bit pattern.
    fn from_bits(bits: Self::Bits) -> Self;
    /// Creates a cell holding `bits`.
    fn atomic_new(bits: Self::Bits) -> Self::Atomic;
    /// Atomically loads the cell.
    fn atomic_load(cell: &Self::Atomic, order: Ordering) -> Self::Bits;
    /// Atomically compare-and-swaps the cell, returning the previous
    /// value on failure.
    fn atomic_compare_exchange(
        cell: &Self::Atomic,
        current: Self::Bits,
        new: Self::Bits,
        success: Ordering,
        failure: Ordering,
    ) -> std::result::Result<Self::Bits, Self::Bits>;
}

macro_rules! impl_slot_key {
    ($($key:ty => $atomic:ty, $bits:ty;)+) => {$(
        impl SlotKey for $key {
            type Atomic = $atomic;
            type Bits = $bits;

            #[inline]
            fn to_bits(self) -> $bits {
                self as $bits
            }

            #[inline]
            fn from_bits(bits: $bits) -> Self {
                bits as $key
            }

            #[inline]
            fn atomic_new(bits: $bits) -> $atomic {
                <$atomic>::new(bits)
            }

            #[inline]
            fn atomic_load(cell: &$atomic, order: Ordering) -> $bits {
                cell.load(order)
            }

            #[inline]
            fn atomic_compare_exchange(
                cell: &$atomic,
                current: $bits,
                new: $bits,
                success: Ordering,
                failure: Ordering,
            ) -> std::result::Result<$bits, $bits> {
                cell.compare_exchange(current, new, success, failure)
            }
        }
    )+};
}

impl_slot_key! {
    u32 => AtomicU32, u32;
    i32 => AtomicU32, u32;
    u64 => AtomicU64, u64;
    i64 => AtomicU64, u64;
    usize => AtomicUsize, usize;
    isize => AtomicUsize, usize;
}

/// Owning storage: `num_windows * W` atomic slots in one flat
/// allocation.
///
/// The container owning this storage is the exclusive owner of the
/// allocation; concurrent access happens only through non-owning
/// [`WindowStorageRef`] views whose lifetime is tied to it.
pub struct WindowStorage<K: SlotKey, const W: usize> {
    slots: Box<[K::Atomic]>,
    num_windows: usize,
}

impl<K: SlotKey, const W: usize> WindowStorage<K, W> {
    /// Allocates storage for `num_windows` windows with every slot set
    /// to the empty sentinel, then fences so the fill is visible to any
    /// thread that subsequently observes the storage.
    ///
    /// Allocation failure is reported as [`Error::Allocation`]; no
    /// partially usable storage is returned.
    pub fn new(num_windows: usize, empty_sentinel: K) -> Result<Self> {
        assert!(W >= 1 && W <= 32, "window size must be in 1..=32");

        let len = num_windows
            .checked_mul(W)
            .ok_or(Error::Allocation { bytes: usize::MAX })?;
        let bytes = len.saturating_mul(std::mem::size_of::<K::Atomic>());

        let mut slots = Vec::new();
        slots
            .try_reserve_exact(len)
            .map_err(|_| Error::Allocation { bytes })?;
        let sentinel_bits = empty_sentinel.to_bits();
        slots.resize_with(len, || K::atomic_new(sentinel_bits));

        // Publish the initialized slots before any insert/find starts.
        fence(Ordering::SeqCst);

        Ok(Self {
            slots: slots.into_boxed_slice(),
            num_windows,
        })
    }

    /// Total slot count (`num_windows * W`).
    pub fn capacity(&self) -> usize {
        self.num_windows * W
    }

    /// Number of windows.
    pub fn num_windows(&self) -> usize {
        self.num_windows
    }

    /// Refills every slot with the empty sentinel.
    ///
    /// Takes `&mut self`, so no concurrent readers or writers can exist
    /// while the table is wiped; the trailing fence orders the fill
    /// before any later shared access.
    pub fn initialize(&mut self, empty_sentinel: K) {
        let bits = empty_sentinel.to_bits();
        for slot in self.slots.iter_mut() {
            *slot = K::atomic_new(bits);
        }
        fence(Ordering::SeqCst);
    }

    /// Returns a non-owning view of the storage.
    pub fn storage_ref(&self) -> WindowStorageRef<'_, K, W> {
        WindowStorageRef {
            slots: &self.slots,
            num_windows: self.num_windows,
        }
    }
}

/// Non-owning, trivially copyable view over window storage.
///
/// Many refs may alias the same storage concurrently; that is the
/// intended sharing model. The borrow ties every ref to the owning
/// container, so a ref can never outlive the allocation.
pub struct WindowStorageRef<'a, K: SlotKey, const W: usize> {
    slots: &'a [K::Atomic],
    num_windows: usize,
}

impl<K: SlotKey, const W: usize> Clone for WindowStorageRef<'_, K, W> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<K: SlotKey, const W: usize> Copy for WindowStorageRef<'_, K, W> {}

impl<'a, K: SlotKey, const W: usize> WindowStorageRef<'a, K, W> {
    /// Total slot count.
    #[inline]
    pub fn capacity(&self) -> usize {
        self.num_windows * W
    }

    /// Number of windows.
    #[inline]
    pub fn num_windows(&self) -> usize {
        self.num_windows
    }

    /// The `W` slots of window `index`.
    ///
    /// # Panics
    /// Panics if `index >= num_windows()`; probe iterators only yield
    /// in-bounds window indices.
    #[inline]
    pub fn window(&self, index: usize) -> &'a [K::Atomic] {
        &self.slots[index * W..index * W + W]
    }
}

/// Smallest prime `>= n` (trial division; extents are computed once at
/// construction, never on the probe path).
fn next_prime(n: usize) -> usize {
    fn is_prime(x: usize) -> bool {
        if x < 2 {
            return false;
        }
        if x % 2 == 0 {
            return x == 2;
        }
        let mut d = 3;
        while d * d <= x {
            if x % d == 0 {
                return false;
            }
            d += 2;
        }
        true
    }

    let mut candidate = n.max(2);
    while !is_prime(candidate) {
        candidate += 1;
    }
    candidate
}

/// Computes the number of windows backing a table of at least
/// `capacity` slots.
///
/// The window count is always a whole number of probe groups. For
/// double hashing the group count is additionally rounded up to a
/// prime, so every step size the scheme produces is coprime with the
/// cycle length and the probe sequence covers the full table.
pub fn valid_window_extent(
    capacity: usize,
    group_size: usize,
    uses_double_hashing: bool,
    window_size: usize,
) -> usize {
    debug_assert!(group_size >= 1);
    let min_windows = capacity.div_ceil(window_size).max(1);
    let mut num_groups = min_windows.div_ceil(group_size);
    if uses_double_hashing {
        num_groups = next_prime(num_groups);
    }
    num_groups * group_size
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn initializes_every_slot_with_sentinel() {
        let storage = WindowStorage::<u64, 2>::new(8, u64::MAX).unwrap();
        let storage_ref = storage.storage_ref();
        assert_eq!(storage.capacity(), 16);
        for w in 0..storage_ref.num_windows() {
            for slot in storage_ref.window(w) {
                assert_eq!(u64::atomic_load(slot, Ordering::Relaxed), u64::MAX);
            }
        }
    }

    #[test]
    fn reinitialize_wipes_claimed_slots() {
        let mut storage = WindowStorage::<u32, 1>::new(4, u32::MAX).unwrap();
        {
            let slot = &storage.storage_ref().window(0)[0];
            u32::atomic_compare_exchange(
                slot,
                u32::MAX,
                7,
                Ordering::AcqRel,
                Ordering::Acquire,
            )
            .unwrap();
        }
        storage.initialize(u32::MAX);
        let slot = &storage.storage_ref().window(0)[0];
        assert_eq!(u32::atomic_load(slot, Ordering::Relaxed), u32::MAX);
    }

    #[test]
    fn signed_keys_round_trip_through_bits() {
        let bits = (-1i64).to_bits();
        assert_eq!(i64::from_bits(bits), -1);
        let bits = (-1i32).to_bits();
        assert_eq!(i32::from_bits(bits), -1);
    }

    #[test]
    fn extent_is_a_multiple_of_the_group() {
        assert_eq!(valid_window_extent(8, 1, false, 2), 4);
        assert_eq!(valid_window_extent(9, 1, false, 2), 5);
        assert_eq!(valid_window_extent(10, 4, false, 1), 12);
    }

    #[test]
    fn double_hashing_extent_has_prime_group_count() {
        // 100 slots, window 2 -> 50 windows -> next prime is 53.
        assert_eq!(valid_window_extent(100, 1, true, 2), 53);
        // Group size stays a divisor of the window count.
        assert_eq!(valid_window_extent(64, 2, true, 1), 2 * 37);
    }

    #[test]
    fn next_prime_small_values() {
        assert_eq!(next_prime(0), 2);
        assert_eq!(next_prime(2), 2);
        assert_eq!(next_prime(4), 5);
        assert_eq!(next_prime(90), 97);
    }
}
