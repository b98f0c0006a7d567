//! Debug assertion macros for ring buffer invariants.
//!
//! Active only in debug builds (`debug_assert!`), so there is zero overhead
//! in release builds. Each macro guards a point where the unsafe slot
//! accesses in `ring.rs` rely on the ticket/code protocol holding.

// =============================================================================
// Slot code protocol
// =============================================================================

/// Assert that a claimed producer slot carries the ticket's seed code.
///
/// Holds between a successful head CAS (or fetch_add wait) and the payload
/// write: `code == ticket` means the slot is empty and reserved for us.
macro_rules! debug_assert_producer_claim {
    ($code:expr, $ticket:expr) => {
        debug_assert!(
            $code == $ticket,
            "claimed slot code {} does not match producer ticket {}",
            $code,
            $ticket
        )
    };
}

/// Assert that a claimed consumer slot carries a published value.
///
/// Holds between a successful tail CAS (or fetch_add wait) and the payload
/// read: `code == ticket + 1` means the producer's release store landed.
macro_rules! debug_assert_consumer_claim {
    ($code:expr, $ticket:expr) => {
        debug_assert!(
            $code == $ticket.wrapping_add(1),
            "claimed slot code {} does not match consumer ticket {} + 1",
            $code,
            $ticket
        )
    };
}

// =============================================================================
// Quiescent occupancy
// =============================================================================

/// Assert that the live range seen at destruction is within capacity.
///
/// With exclusive access (`&mut self`), `head - tail` must land in
/// `[0, capacity]`; anything else means a cursor was corrupted.
macro_rules! debug_assert_bounded_live_range {
    ($head:expr, $tail:expr, $capacity:expr) => {
        debug_assert!(
            $head.wrapping_sub($tail) <= $capacity as u64,
            "live range [{}, {}) exceeds capacity {}",
            $tail,
            $head,
            $capacity
        )
    };
}

pub(crate) use debug_assert_bounded_live_range;
pub(crate) use debug_assert_consumer_claim;
pub(crate) use debug_assert_producer_claim;
