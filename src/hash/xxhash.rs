//! Seeded xxHash-32 and xxHash-64 over the key's byte representation.
//!
//! Double hashing wants two independent hash functions; two instances
//! with different seeds provide that.

use std::marker::PhantomData;

use super::{key_bytes, KeyHash, KeyMarker};
use crate::storage::SlotKey;

#[inline]
fn read_u32(bytes: &[u8]) -> u32 {
    u32::from_le_bytes(bytes[..4].try_into().unwrap())
}

#[inline]
fn read_u64(bytes: &[u8]) -> u64 {
    u64::from_le_bytes(bytes[..8].try_into().unwrap())
}

/// xxHash-32.
#[derive(Debug)]
pub struct XxHash32<K> {
    seed: u32,
    _marker: KeyMarker<K>,
}

impl<K> Clone for XxHash32<K> {
    fn clone(&self) -> Self {
        Self::new(self.seed)
    }
}

impl<K> Copy for XxHash32<K> {}

impl<K> Default for XxHash32<K> {
    fn default() -> Self {
        Self::new(0)
    }
}

impl<K> XxHash32<K> {
    const PRIME1: u32 = 0x9e37_79b1;
    const PRIME2: u32 = 0x85eb_ca77;
    const PRIME3: u32 = 0xc2b2_ae3d;
    const PRIME4: u32 = 0x27d4_eb2f;
    const PRIME5: u32 = 0x1656_67b1;

    /// Creates an xxHash-32 instance with the given seed.
    pub const fn new(seed: u32) -> Self {
        Self {
            seed,
            _marker: KeyMarker(PhantomData),
        }
    }

    #[inline]
    fn round(acc: u32, lane: u32) -> u32 {
        acc.wrapping_add(lane.wrapping_mul(Self::PRIME2))
            .rotate_left(13)
            .wrapping_mul(Self::PRIME1)
    }

    fn avalanche(mut h: u32) -> u32 {
        h ^= h >> 15;
        h = h.wrapping_mul(Self::PRIME2);
        h ^= h >> 13;
        h = h.wrapping_mul(Self::PRIME3);
        h ^= h >> 16;
        h
    }

    fn hash_bytes(&self, bytes: &[u8]) -> u32 {
        let len = bytes.len();
        let mut rest = bytes;

        let mut h32 = if len >= 16 {
            let mut v1 = self
                .seed
                .wrapping_add(Self::PRIME1)
                .wrapping_add(Self::PRIME2);
            let mut v2 = self.seed.wrapping_add(Self::PRIME2);
            let mut v3 = self.seed;
            let mut v4 = self.seed.wrapping_sub(Self::PRIME1);

            while rest.len() >= 16 {
                v1 = Self::round(v1, read_u32(&rest[0..]));
                v2 = Self::round(v2, read_u32(&rest[4..]));
                v3 = Self::round(v3, read_u32(&rest[8..]));
                v4 = Self::round(v4, read_u32(&rest[12..]));
                rest = &rest[16..];
            }

            v1.rotate_left(1)
                .wrapping_add(v2.rotate_left(7))
                .wrapping_add(v3.rotate_left(12))
                .wrapping_add(v4.rotate_left(18))
        } else {
            self.seed.wrapping_add(Self::PRIME5)
        };

        h32 = h32.wrapping_add(len as u32);

        while rest.len() >= 4 {
            h32 = h32
                .wrapping_add(read_u32(rest).wrapping_mul(Self::PRIME3))
                .rotate_left(17)
                .wrapping_mul(Self::PRIME4);
            rest = &rest[4..];
        }

        for &byte in rest {
            h32 = h32
                .wrapping_add(u32::from(byte).wrapping_mul(Self::PRIME5))
                .rotate_left(11)
                .wrapping_mul(Self::PRIME1);
        }

        Self::avalanche(h32)
    }
}

impl<K: SlotKey> KeyHash<K> for XxHash32<K> {
    type Output = u32;

    #[inline]
    fn hash(&self, key: &K) -> u32 {
        self.hash_bytes(key_bytes(key))
    }
}

/// xxHash-64.
#[derive(Debug)]
pub struct XxHash64<K> {
    seed: u64,
    _marker: KeyMarker<K>,
}

impl<K> Clone for XxHash64<K> {
    fn clone(&self) -> Self {
        Self::new(self.seed)
    }
}

impl<K> Copy for XxHash64<K> {}

impl<K> Default for XxHash64<K> {
    fn default() -> Self {
        Self::new(0)
    }
}

impl<K> XxHash64<K> {
    const PRIME1: u64 = 11_400_714_785_074_694_791;
    const PRIME2: u64 = 14_029_467_366_897_019_727;
    const PRIME3: u64 = 1_609_587_929_392_839_161;
    const PRIME4: u64 = 9_650_029_242_287_828_579;
    const PRIME5: u64 = 2_870_177_450_012_600_261;

    /// Creates an xxHash-64 instance with the given seed.
    pub const fn new(seed: u64) -> Self {
        Self {
            seed,
            _marker: KeyMarker(PhantomData),
        }
    }

    #[inline]
    fn round(acc: u64, lane: u64) -> u64 {
        acc.wrapping_add(lane.wrapping_mul(Self::PRIME2))
            .rotate_left(31)
            .wrapping_mul(Self::PRIME1)
    }

    #[inline]
    fn merge_round(mut h: u64, v: u64) -> u64 {
        h ^= Self::round(0, v);
        h.wrapping_mul(Self::PRIME1).wrapping_add(Self::PRIME4)
    }

    fn avalanche(mut h: u64) -> u64 {
        h ^= h >> 33;
        h = h.wrapping_mul(Self::PRIME2);
        h ^= h >> 29;
        h = h.wrapping_mul(Self::PRIME3);
        h ^= h >> 32;
        h
    }

    fn hash_bytes(&self, bytes: &[u8]) -> u64 {
        let len = bytes.len();
        let mut rest = bytes;

        let mut h64 = if len >= 32 {
            let mut v1 = self
                .seed
                .wrapping_add(Self::PRIME1)
                .wrapping_add(Self::PRIME2);
            let mut v2 = self.seed.wrapping_add(Self::PRIME2);
            let mut v3 = self.seed;
            let mut v4 = self.seed.wrapping_sub(Self::PRIME1);

            while rest.len() >= 32 {
                v1 = Self::round(v1, read_u64(&rest[0..]));
                v2 = Self::round(v2, read_u64(&rest[8..]));
                v3 = Self::round(v3, read_u64(&rest[16..]));
                v4 = Self::round(v4, read_u64(&rest[24..]));
                rest = &rest[32..];
            }

            let mut h = v1
                .rotate_left(1)
                .wrapping_add(v2.rotate_left(7))
                .wrapping_add(v3.rotate_left(12))
                .wrapping_add(v4.rotate_left(18));
            h = Self::merge_round(h, v1);
            h = Self::merge_round(h, v2);
            h = Self::merge_round(h, v3);
            Self::merge_round(h, v4)
        } else {
            self.seed.wrapping_add(Self::PRIME5)
        };

        h64 = h64.wrapping_add(len as u64);

        while rest.len() >= 8 {
            let k1 = Self::round(0, read_u64(rest));
            h64 = (h64 ^ k1)
                .rotate_left(27)
                .wrapping_mul(Self::PRIME1)
                .wrapping_add(Self::PRIME4);
            rest = &rest[8..];
        }

        if rest.len() >= 4 {
            h64 = (h64 ^ (u64::from(read_u32(rest)).wrapping_mul(Self::PRIME1)))
                .rotate_left(23)
                .wrapping_mul(Self::PRIME2)
                .wrapping_add(Self::PRIME3);
            rest = &rest[4..];
        }

        for &byte in rest {
            h64 = (h64 ^ u64::from(byte).wrapping_mul(Self::PRIME5))
                .rotate_left(11)
                .wrapping_mul(Self::PRIME1);
        }

        Self::avalanche(h64)
    }
}

impl<K: SlotKey> KeyHash<K> for XxHash64<K> {
    type Output = u64;

    #[inline]
    fn hash(&self, key: &K) -> u64 {
        self.hash_bytes(key_bytes(key))
    }
}
