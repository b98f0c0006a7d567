//! Loom-based concurrency tests for the per-slot handoff protocol.
//!
//! Run with: `cargo test -p mpmcring --features loom --test loom_tests --release`
//!
//! Loom exhaustively explores thread interleavings. We model the ticket /
//! slot-code protocol in isolation with a capacity-2 ring so the state
//! space stays tractable, rather than instrumenting the production type.

#![cfg(feature = "loom")]

use loom::sync::atomic::{AtomicU64, Ordering};
use loom::sync::Arc;
use loom::thread;
use std::cell::UnsafeCell;

const CAP: u64 = 2;

struct LoomSlot {
    code: AtomicU64,
    value: UnsafeCell<u64>,
}

/// Capacity-2 model of the ring: same codes, same orderings, plain u64
/// payload so the protocol itself is the only thing under test.
struct LoomRing {
    head: AtomicU64,
    tail: AtomicU64,
    slots: [LoomSlot; 2],
}

unsafe impl Send for LoomRing {}
unsafe impl Sync for LoomRing {}

impl LoomRing {
    fn new() -> Self {
        Self {
            head: AtomicU64::new(0),
            tail: AtomicU64::new(0),
            slots: [
                LoomSlot {
                    code: AtomicU64::new(0),
                    value: UnsafeCell::new(0),
                },
                LoomSlot {
                    code: AtomicU64::new(1),
                    value: UnsafeCell::new(0),
                },
            ],
        }
    }

    fn try_push(&self, v: u64) -> bool {
        loop {
            let ticket = self.head.load(Ordering::Relaxed);
            let slot = &self.slots[(ticket % CAP) as usize];
            let code = slot.code.load(Ordering::Acquire);
            let diff = code.wrapping_sub(ticket) as i64;

            if diff < 0 {
                return false; // full
            }
            if diff == 0
                && self
                    .head
                    .compare_exchange(ticket, ticket + 1, Ordering::Relaxed, Ordering::Relaxed)
                    .is_ok()
            {
                // SAFETY: the CAS reserved this ticket exclusively; the code
                // store below publishes the write
                unsafe {
                    *slot.value.get() = v;
                }
                slot.code.store(ticket + 1, Ordering::Release);
                return true;
            }
            loom::thread::yield_now(); // stale snapshot or lost CAS
        }
    }

    fn try_pop(&self) -> Option<u64> {
        loop {
            let ticket = self.tail.load(Ordering::Relaxed);
            let slot = &self.slots[(ticket % CAP) as usize];
            let code = slot.code.load(Ordering::Acquire);
            let diff = code.wrapping_sub(ticket + 1) as i64;

            if diff < 0 {
                return None; // empty
            }
            if diff == 0
                && self
                    .tail
                    .compare_exchange(ticket, ticket + 1, Ordering::Relaxed, Ordering::Relaxed)
                    .is_ok()
            {
                // SAFETY: acquire on the code saw the producer's release, so
                // the payload write happened-before this read
                let v = unsafe { *slot.value.get() };
                slot.code.store(ticket + CAP, Ordering::Release);
                return Some(v);
            }
            loom::thread::yield_now();
        }
    }
}

/// SPSC handoff: the consumer never observes a torn or stale payload, and
/// order is preserved.
#[test]
fn loom_spsc_handoff() {
    loom::model(|| {
        let ring = Arc::new(LoomRing::new());
        let ring2 = Arc::clone(&ring);

        let producer = thread::spawn(move || {
            assert!(ring2.try_push(42));
            // second push may find the ring full; that is a valid outcome
            let _ = ring2.try_push(43);
        });

        let mut received = Vec::new();
        for _ in 0..4 {
            if let Some(v) = ring.try_pop() {
                received.push(v);
            }
            if received.len() == 2 {
                break;
            }
            loom::thread::yield_now();
        }

        producer.join().unwrap();

        // Whatever arrived must be the pushed values in push order
        if !received.is_empty() {
            assert_eq!(received[0], 42);
        }
        if received.len() >= 2 {
            assert_eq!(received[1], 43);
        }
    });
}

/// Two racing producers: both claims land, in distinct slots, and a drain
/// recovers both values exactly once.
#[test]
fn loom_two_producers_exclusive_claims() {
    loom::model(|| {
        let ring = Arc::new(LoomRing::new());
        let a = Arc::clone(&ring);
        let b = Arc::clone(&ring);

        let t1 = thread::spawn(move || assert!(a.try_push(100)));
        let t2 = thread::spawn(move || assert!(b.try_push(200)));
        t1.join().unwrap();
        t2.join().unwrap();

        let first = ring.try_pop().expect("two values were published");
        let second = ring.try_pop().expect("two values were published");
        assert!(ring.try_pop().is_none());

        // exactly once each, either claim order
        assert!(
            (first == 100 && second == 200) || (first == 200 && second == 100),
            "duplicated or lost value: {first}, {second}"
        );
    });
}

/// Full-ring boundary: a push blocked by a full ring succeeds once a
/// consumer recycles a slot.
#[test]
fn loom_full_boundary_recycles() {
    loom::model(|| {
        let ring = Arc::new(LoomRing::new());
        let ring2 = Arc::clone(&ring);

        assert!(ring.try_push(1));
        assert!(ring.try_push(2));
        assert!(!ring.try_push(3));

        let consumer = thread::spawn(move || ring2.try_pop());
        let popped = consumer.join().unwrap();
        assert_eq!(popped, Some(1));

        assert!(ring.try_push(3));
    });
}
