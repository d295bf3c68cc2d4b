//! Crate-wide error and result types.
use thiserror::Error;

/// Result alias used by the fallible entry points.
pub type Result<T> = std::result::Result<T, Error>;

/// The small, closed error taxonomy the core hash can produce.
///
/// There are no error conditions intrinsic to the hashing math itself:
/// the algorithm is total over every input byte string. These variants
/// only cover resource acquisition and caller misuse at the boundary.
#[derive(Debug, Error, Eq, PartialEq)]
pub enum Error {
    /// The scratchpad allocation failed. No digest is produced and the
    /// output buffer, if any was supplied, is left untouched.
    #[error("failed to allocate a {size} byte scratchpad")]
    AllocationFailure {
        /// The size, in bytes, of the allocation that failed.
        size: usize,
    },

    /// `cn_slow_hash` was invoked with something other than variant 0, or
    /// with `prehashed` set.
    #[error("unsupported cryptonight variant: {0}")]
    UnsupportedVariant(u8),

    /// `try_hash`'s blob exceeded the 256-byte internal mining buffer.
    #[error("input blob of {len} bytes exceeds the {max} byte mining buffer")]
    InvalidInputLength {
        /// The length of the rejected blob.
        len: usize,
        /// The maximum length accepted.
        max: usize,
    },
}
