//! A fixed-capacity, open-addressing hash set built for massive
//! concurrency.
//!
//! Capacity is fixed at construction and slots are never erased or
//! rehashed, which keeps every probe lock-free: an insert is a single
//! compare-and-swap on an atomic slot, and a lookup is a sequence of
//! plain atomic loads that may terminate early at the first empty slot.
//! One key value is reserved as the *empty sentinel* marking unoccupied
//! slots; it can never be stored.
//!
//! Storage is organized into contiguous *windows* of `W` slots, probed
//! window-at-a-time, optionally in *groups* of `G` consecutive windows
//! covered by a single probe step. Both [`LinearProbing`] and
//! [`DoubleHashing`] keep their arithmetic group-aligned, so any two
//! actors probing the same key walk the identical window sequence.
//!
//! [`StaticSet`] owns the storage and runs bulk operations across a
//! worker pool; [`SetRef`] is a `Copy`, non-owning view whose available
//! operations are declared in its type through an operator list, so a
//! reference handed to untrusted code can be restricted to lookups at
//! compile time:
//!
//! ```
//! use static_set::{StaticSet, op};
//!
//! let set = StaticSet::<u32, _, _, 2>::new(100, u32::MAX)?;
//! assert_eq!(set.insert(&[1, 2, 3, 2])?, 3);
//!
//! let read_only = set.as_ref_with((op::Contains, op::Count));
//! assert!(read_only.contains(&2));
//! assert_eq!(read_only.count(), 3);
//! # Ok::<(), static_set::Error>(())
//! ```

mod bulk;
mod error;
mod hash;
mod open_addressing;
mod probing;
mod set_ref;
mod static_set;
mod storage;

pub use error::{Error, Result};
pub use hash::{HashOutput, IdentityHash, KeyHash, XxHash32, XxHash64};
pub use open_addressing::{DefaultKeyEqual, EqualResult, KeyEqual, Scope};
pub use probing::{DoubleHashing, LinearProbing, ProbeIterator, ProbingScheme};
pub use set_ref::{op, FullOps, HasOperator, ReadOnlyOps, SetRef};
pub use static_set::StaticSet;
pub use storage::{valid_window_extent, SlotKey};
