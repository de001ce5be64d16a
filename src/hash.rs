//! Hash function family consumed by the probing schemes.
//!
//! Probing needs a map from key to fixed-width integer; double hashing
//! needs two independent ones. The family is an external collaborator:
//! any `Copy` type implementing [`KeyHash`] plugs in.

use std::marker::PhantomData;

use crate::storage::SlotKey;

mod identity;
mod xxhash;

pub use identity::IdentityHash;
pub use xxhash::{XxHash32, XxHash64};

/// Valid hash output widths.
///
/// Only `u32` and `u64` implement this, so a scheme's modulo arithmetic
/// always starts from a fixed-width integer.
pub trait HashOutput: Copy {
    /// Widens the hash to `usize` for index arithmetic.
    fn to_usize(self) -> usize;
}

impl HashOutput for u32 {
    #[inline]
    fn to_usize(self) -> usize {
        self as usize
    }
}

impl HashOutput for u64 {
    #[inline]
    fn to_usize(self) -> usize {
        self as usize
    }
}

/// A hash function over keys of type `K`.
///
/// Implementations must be pure: the same key always hashes to the same
/// value, which is what makes probe sequences deterministic across
/// threads and across time.
pub trait KeyHash<K>: Copy + Send + Sync {
    /// Hash output type.
    type Output: HashOutput;

    /// Hashes one key.
    fn hash(&self, key: &K) -> Self::Output;
}

/// Reinterprets a key as its raw bytes for byte-oriented hashers.
///
/// Bounded to `SlotKey`, so `K` is always a primitive integer with no
/// padding and every byte is initialized.
#[inline]
pub(crate) fn key_bytes<K: SlotKey>(key: &K) -> &[u8] {
    // Safety: `key` is a valid reference and the slice covers exactly
    // `size_of::<K>()` initialized bytes that live as long as the
    // borrow.
    unsafe {
        std::slice::from_raw_parts(key as *const K as *const u8, std::mem::size_of::<K>())
    }
}

/// Marker carried by the hashers so one hasher instance is bound to one
/// key type.
pub(crate) struct KeyMarker<K>(pub(crate) PhantomData<K>);

impl<K> Clone for KeyMarker<K> {
    fn clone(&self) -> Self {
        KeyMarker(PhantomData)
    }
}

impl<K> Copy for KeyMarker<K> {}

impl<K> std::fmt::Debug for KeyMarker<K> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("KeyMarker")
    }
}
