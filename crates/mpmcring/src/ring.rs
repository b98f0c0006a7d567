use crate::invariants::{
    debug_assert_bounded_live_range, debug_assert_consumer_claim, debug_assert_producer_claim,
};
use crate::layout::{CursorLayout, PaddedCursors};
use crate::{Full, RingError};
use std::cell::UnsafeCell;
use std::hint;
use std::mem::MaybeUninit;
use std::sync::atomic::{AtomicU64, Ordering};

// =============================================================================
// MEMORY ORDERING & SYNCHRONIZATION STRATEGY
// =============================================================================
//
// Every slot carries a `code`, a sequence number that walks the cycle
//
//   i  →  i+1  →  i+capacity  →  i+capacity+1  →  i+2·capacity  →  …
//
// for slot index `i`. `code == ticket` means "empty, reserved for the
// producer holding `ticket`"; `code == ticket + 1` means "holds the value
// produced under `ticket`, awaiting the consumer holding `ticket`".
//
// ## Tickets (ABA prevention)
//
// `head` and `tail` are unbounded u64 ticket counters; a ticket selects a
// slot via `ticket & mask`. Counters never wrap within a realistic program
// lifetime, and codes are only ever compared with nearby tickets (less than
// `capacity` apart) as signed differences, so the arithmetic stays
// well-defined regardless of absolute magnitude.
//
// ## Ordering protocol
//
// **Producer:** load `head` Relaxed → load `slot.code` Acquire → claim the
// ticket with a Relaxed CAS (or `fetch_add`) → write the payload → store
// `slot.code = ticket + 1` Release.
//
// **Consumer:** mirror image on `tail`; after moving the payload out, store
// `slot.code = ticket + capacity` Release.
//
// The Release on the code store after a push synchronizes with the Acquire
// on the code load in the matching pop, which gives the happens-before edge
// for the payload bytes. The cursors themselves can stay Relaxed: the
// per-slot code is the sole source of truth for element visibility.
//
// Full/empty detection is structural — the sign of `code - ticket` — not a
// cursor comparison, so there is no empty/full ambiguity at any capacity
// down to the minimum of 2.
//
// =============================================================================

/// One element of the ring: a sequence code plus possibly-uninitialized
/// payload storage. The code alone decides whether the storage is live.
struct Slot<T> {
    code: AtomicU64,
    value: UnsafeCell<MaybeUninit<T>>,
}

/// Bounded lock-free MPMC queue over ticketed cursors and per-slot
/// sequence codes.
///
/// - `try_push` / `try_pop` never block; they report full/empty through
///   their return value and are lock-free (some thread always progresses).
/// - `push` / `pop` claim a ticket unconditionally and spin with a CPU
///   pause hint until the slot cycles around to them.
///
/// Capacity is fixed at construction and must be a power of two ≥ 2. The
/// cursor layout (padded vs compact, see [`CursorLayout`]) is a type
/// parameter so both variants share one implementation.
///
/// Insertion order is per-producer: each value is delivered to exactly one
/// consumer exactly once, but two producers racing their claims may be
/// observed in either order.
pub struct MpmcRing<T, L: CursorLayout = PaddedCursors> {
    slots: Box<[Slot<T>]>,
    mask: u64,
    cursors: L,
}

// SAFETY: all slot access is mediated by the acquire/release code protocol
// above; the ring hands each payload from exactly one producer to exactly
// one consumer, so `T: Send` suffices for cross-thread use.
unsafe impl<T: Send, L: CursorLayout> Send for MpmcRing<T, L> {}
unsafe impl<T: Send, L: CursorLayout> Sync for MpmcRing<T, L> {}

impl<T, L: CursorLayout> std::fmt::Debug for MpmcRing<T, L> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MpmcRing")
            .field("capacity", &self.capacity())
            .field("size", &self.size())
            .finish()
    }
}

impl<T, L: CursorLayout> MpmcRing<T, L> {
    /// Creates an empty ring with the given capacity.
    ///
    /// Slot `i` is seeded with `code = i`, i.e. ready for the producer
    /// holding ticket `i`.
    ///
    /// # Errors
    ///
    /// [`RingError::CapacityTooSmall`] if `capacity < 2`,
    /// [`RingError::NotPowerOfTwo`] if it is not a power of two.
    pub fn new(capacity: usize) -> Result<Self, RingError> {
        if capacity < 2 {
            return Err(RingError::CapacityTooSmall(capacity));
        }
        if !capacity.is_power_of_two() {
            return Err(RingError::NotPowerOfTwo(capacity));
        }

        let mut slots = Vec::with_capacity(capacity);
        for i in 0..capacity {
            slots.push(Slot {
                code: AtomicU64::new(i as u64),
                value: UnsafeCell::new(MaybeUninit::uninit()),
            });
        }

        Ok(Self {
            slots: slots.into_boxed_slice(),
            mask: capacity as u64 - 1,
            cursors: L::new(),
        })
    }

    // ---------------------------------------------------------------------
    // QUERIES
    // ---------------------------------------------------------------------

    /// Returns the fixed capacity.
    #[inline]
    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// Returns the current number of items, clamped to `[0, capacity]`.
    ///
    /// Advisory: uses relaxed loads, exact only in quiescent states. Under
    /// concurrent blocking calls the raw cursor difference can transiently
    /// leave the valid range in either direction; both ends are clamped.
    #[inline]
    pub fn size(&self) -> usize {
        let head = self.cursors.head().load(Ordering::Relaxed);
        let tail = self.cursors.tail().load(Ordering::Relaxed);
        let diff = head.wrapping_sub(tail) as i64;
        if diff <= 0 {
            0
        } else {
            (diff as usize).min(self.capacity())
        }
    }

    /// Returns true if the ring appears empty (advisory, see [`size`](Self::size)).
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.size() == 0
    }

    /// Returns true if the ring appears full (advisory, see [`size`](Self::size)).
    #[inline]
    pub fn is_full(&self) -> bool {
        self.size() == self.capacity()
    }

    /// Maps a ticket to its slot.
    #[inline]
    fn slot(&self, ticket: u64) -> &Slot<T> {
        // The mask keeps the index in bounds for any ticket value.
        &self.slots[(ticket & self.mask) as usize]
    }

    // ---------------------------------------------------------------------
    // PRODUCER API
    // ---------------------------------------------------------------------

    /// Non-blocking push. Returns [`Full`] with the value handed back,
    /// untouched, when the ring is full.
    pub fn try_push(&self, v: T) -> Result<(), Full<T>> {
        loop {
            let ticket = self.cursors.head().load(Ordering::Relaxed);
            let slot = self.slot(ticket);
            let code = slot.code.load(Ordering::Acquire);
            let diff = code.wrapping_sub(ticket) as i64;

            if diff > 0 {
                // Stale head snapshot: a newer producer already advanced
                // past this slot's cycle start. Reload and retry.
                continue;
            }
            if diff < 0 {
                // Slot still holds a value not yet consumed: ring is full.
                return Err(Full(v));
            }

            // Slot is ready for this ticket; claim it.
            if self
                .cursors
                .head()
                .compare_exchange_weak(ticket, ticket + 1, Ordering::Relaxed, Ordering::Relaxed)
                .is_err()
            {
                continue;
            }

            debug_assert_producer_claim!(code, ticket);
            // SAFETY: the successful CAS makes this thread the unique owner
            // of `ticket`; `code == ticket` means the previous occupant (if
            // any) was read out and the storage is ours to initialize. The
            // Release store below publishes the write to the matching pop.
            unsafe {
                (*slot.value.get()).write(v);
            }
            slot.code.store(ticket + 1, Ordering::Release);
            return Ok(());
        }
    }

    /// Blocking push. Claims a ticket unconditionally and spins with a CPU
    /// pause hint until the slot cycles around, then publishes.
    ///
    /// The claim commits this thread to completing the handoff; there is no
    /// cancellation or timeout at this level.
    pub fn push(&self, v: T) {
        let ticket = self.cursors.head().fetch_add(1, Ordering::Relaxed);
        let slot = self.slot(ticket);

        let mut code = slot.code.load(Ordering::Acquire);
        while code != ticket {
            hint::spin_loop();
            code = slot.code.load(Ordering::Acquire);
        }

        debug_assert_producer_claim!(code, ticket);
        // SAFETY: as in `try_push`; `fetch_add` made the ticket uniquely
        // ours and the observed seed code means the storage is vacant.
        unsafe {
            (*slot.value.get()).write(v);
        }
        slot.code.store(ticket + 1, Ordering::Release);
    }

    // ---------------------------------------------------------------------
    // CONSUMER API
    // ---------------------------------------------------------------------

    /// Non-blocking pop. Returns `None` when the ring is empty.
    pub fn try_pop(&self) -> Option<T> {
        loop {
            let ticket = self.cursors.tail().load(Ordering::Relaxed);
            let slot = self.slot(ticket);
            let code = slot.code.load(Ordering::Acquire);
            let diff = code.wrapping_sub(ticket.wrapping_add(1)) as i64;

            if diff > 0 {
                // Stale tail snapshot; reload and retry.
                continue;
            }
            if diff < 0 {
                // Slot not yet published: ring is empty.
                return None;
            }

            if self
                .cursors
                .tail()
                .compare_exchange_weak(ticket, ticket + 1, Ordering::Relaxed, Ordering::Relaxed)
                .is_err()
            {
                continue;
            }

            debug_assert_consumer_claim!(code, ticket);
            // SAFETY: the successful CAS makes this thread the unique owner
            // of `ticket`, and `code == ticket + 1` means the producer's
            // Release store (and therefore the payload write) is visible
            // through our Acquire load. `assume_init_read` moves the value
            // out; the Release store below recycles the slot for the
            // producer holding `ticket + capacity`.
            let value = unsafe { (*slot.value.get()).assume_init_read() };
            slot.code
                .store(ticket + self.capacity() as u64, Ordering::Release);
            return Some(value);
        }
    }

    /// Blocking pop. Claims a consumer ticket and spins until the matching
    /// value is published, then moves it out.
    pub fn pop(&self) -> T {
        let ticket = self.cursors.tail().fetch_add(1, Ordering::Relaxed);
        let slot = self.slot(ticket);

        let mut code = slot.code.load(Ordering::Acquire);
        while code != ticket.wrapping_add(1) {
            hint::spin_loop();
            code = slot.code.load(Ordering::Acquire);
        }

        debug_assert_consumer_claim!(code, ticket);
        // SAFETY: as in `try_pop`; the observed code proves the payload
        // write happened-before this read.
        let value = unsafe { (*slot.value.get()).assume_init_read() };
        slot.code
            .store(ticket + self.capacity() as u64, Ordering::Release);
        value
    }
}

impl<T, L: CursorLayout> Drop for MpmcRing<T, L> {
    /// Destroys the live elements in `[tail, head)`, then the storage.
    ///
    /// A slot in that range is only live if its code equals `ticket + 1`;
    /// anything else (a claimed-but-unpublished ticket from an abandoned
    /// blocking call) is skipped. Exclusive access is guaranteed by
    /// `&mut self`, so relaxed cursor loads suffice.
    fn drop(&mut self) {
        if !std::mem::needs_drop::<T>() {
            return;
        }

        let head = self.cursors.head().load(Ordering::Relaxed);
        let tail = self.cursors.tail().load(Ordering::Relaxed);
        debug_assert_bounded_live_range!(head, tail, self.capacity());

        let mut ticket = tail;
        while ticket != head {
            let slot = &self.slots[(ticket & self.mask) as usize];
            if slot.code.load(Ordering::Acquire) == ticket.wrapping_add(1) {
                // SAFETY: code == ticket + 1 is exactly the live state; the
                // value was written and never read out.
                unsafe {
                    (*slot.value.get()).assume_init_drop();
                }
            }
            ticket = ticket.wrapping_add(1);
        }
    }
}
