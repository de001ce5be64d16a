//! Error types for host-side operations.
//!
//! Per-key hot-path operations never return errors; precondition
//! violations there (e.g. inserting the empty sentinel) are documented
//! contracts instead. Errors only surface from container construction
//! and from bulk operations after they have been joined.

use thiserror::Error;

/// Errors reported by container construction and bulk operations.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    /// The requested capacity was zero.
    #[error("capacity must be greater than zero")]
    ZeroCapacity,

    /// Backing storage could not be allocated. No partial table is left
    /// usable when this is returned.
    #[error("failed to allocate table storage ({bytes} bytes)")]
    Allocation {
        /// Size of the failed allocation request.
        bytes: usize,
    },

    /// A bulk operation was handed input and output ranges of different
    /// lengths.
    #[error("input and output lengths differ ({inputs} keys, {outputs} outputs)")]
    LengthMismatch {
        /// Number of input keys.
        inputs: usize,
        /// Number of output elements.
        outputs: usize,
    },

    /// A bulk-operation worker panicked. The whole operation is
    /// reported failed once; results for it are undefined and it is not
    /// retried.
    #[error("bulk operation aborted: a worker panicked")]
    BulkAborted,
}

/// Result alias used throughout the crate.
pub type Result<T, E = Error> = std::result::Result<T, E>;
