use std::fmt;
use thiserror::Error;

/// Construction-time errors for [`MpmcRing`](crate::MpmcRing).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum RingError {
    /// Requested capacity is below the minimum of 2.
    #[error("capacity must be at least 2 (got {0})")]
    CapacityTooSmall(usize),

    /// Requested capacity is not a power of two.
    #[error("capacity must be a power of two (got {0})")]
    NotPowerOfTwo(usize),
}

/// Returned by `try_push` when the ring is full.
///
/// Carries the rejected value back to the caller untouched, so a failed
/// push never consumes the argument.
pub struct Full<T>(pub T);

// Hand-rolled so `Full<T>` stays usable for any payload type; a derived
// `Debug` would demand `T: Debug` and the value itself is not interesting.
impl<T> fmt::Debug for Full<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Full(..)")
    }
}

impl<T> fmt::Display for Full<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ring is full")
    }
}

impl<T> std::error::Error for Full<T> {}

impl<T> Full<T> {
    /// Consumes the error, yielding the rejected value.
    pub fn into_inner(self) -> T {
        self.0
    }
}
