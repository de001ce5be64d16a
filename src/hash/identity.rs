//! Identity hash: the key is its own hash.
//!
//! A perfect hash whenever the table capacity covers the key range, and
//! the tool of choice in tests where slot placement must be predictable.

use std::marker::PhantomData;

use super::{KeyHash, KeyMarker};

/// Hash function returning the key as-is.
///
/// Deterministic by construction, so it takes no seed. Keys of 4 bytes
/// or fewer hash to `u32`, wider keys to `u64`.
#[derive(Debug)]
pub struct IdentityHash<K> {
    _marker: KeyMarker<K>,
}

impl<K> Clone for IdentityHash<K> {
    fn clone(&self) -> Self {
        Self::new()
    }
}

impl<K> Copy for IdentityHash<K> {}

impl<K> Default for IdentityHash<K> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K> IdentityHash<K> {
    /// Creates an identity hash bound to `K`.
    pub const fn new() -> Self {
        Self {
            _marker: KeyMarker(PhantomData),
        }
    }
}

macro_rules! impl_identity_small {
    ($($t:ty),+) => {$(
        impl KeyHash<$t> for IdentityHash<$t> {
            type Output = u32;

            #[inline]
            fn hash(&self, key: &$t) -> u32 {
                *key as u32
            }
        }
    )+};
}

macro_rules! impl_identity_large {
    ($($t:ty),+) => {$(
        impl KeyHash<$t> for IdentityHash<$t> {
            type Output = u64;

            #[inline]
            fn hash(&self, key: &$t) -> u64 {
                *key as u64
            }
        }
    )+};
}

impl_identity_small!(u8, u16, u32, i8, i16, i32);
impl_identity_large!(u64, i64);

#[cfg(target_pointer_width = "64")]
impl_identity_large!(usize, isize);

#[cfg(target_pointer_width = "32")]
impl_identity_small!(usize, isize);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn returns_key_unchanged() {
        assert_eq!(IdentityHash::<u64>::new().hash(&123), 123);
        assert_eq!(IdentityHash::<u32>::new().hash(&7), 7);
    }

    #[test]
    fn negative_keys_widen_through_cast() {
        // -1i32 as u32 keeps the bit pattern.
        assert_eq!(IdentityHash::<i32>::new().hash(&-1), u32::MAX);
    }
}
