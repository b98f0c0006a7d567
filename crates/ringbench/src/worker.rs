//! Producer and consumer measurement loops.
//!
//! Both run the same shape: pin (optional), an unmeasured warmup loop, then
//! the measured loop reading the cycle counter around every operation.
//! Extrema are tracked per success; the histogram is fed every
//! `SAMPLE_RATE`-th success with weight `SAMPLE_RATE` so downstream counts
//! stay interpretable as per-operation.

use crate::affinity::{self, PinError};
use crate::config::BenchConfig;
use crate::payload::Payload;
use crate::results::WorkerStats;
use crate::tsc;
use mpmcring::{Backoff, CursorLayout, MpmcRing};
use std::sync::atomic::{AtomicBool, Ordering};

/// Every Nth successful operation lands in the histogram.
pub(crate) const SAMPLE_RATE: u64 = 100;

/// Phase flags shared between the main thread and every worker.
///
/// Plain relaxed booleans: workers only need to observe the transitions
/// eventually, and a stale read costs at most one extra loop iteration.
pub(crate) struct PhaseFlags {
    collecting: AtomicBool,
    done: AtomicBool,
}

impl PhaseFlags {
    pub(crate) fn new() -> Self {
        Self {
            collecting: AtomicBool::new(false),
            done: AtomicBool::new(false),
        }
    }

    pub(crate) fn start_collecting(&self) {
        self.collecting.store(true, Ordering::Relaxed);
    }

    pub(crate) fn finish(&self) {
        self.done.store(true, Ordering::Relaxed);
    }

    #[inline]
    fn collecting(&self) -> bool {
        self.collecting.load(Ordering::Relaxed)
    }

    #[inline]
    fn done(&self) -> bool {
        self.done.load(Ordering::Relaxed)
    }
}

/// Producer body: pushes `id, id + P, id + 2P, …` until `done`.
pub(crate) fn producer_loop<T: Payload, L: CursorLayout>(
    id: usize,
    ring: &MpmcRing<T, L>,
    config: &BenchConfig,
    flags: &PhaseFlags,
    ns_per_cycle: f64,
) -> Result<WorkerStats, PinError> {
    if config.pinning {
        affinity::pin_to_core(id % affinity::core_count())?;
    }

    let mut stats = WorkerStats::new(config);
    let mut backoff = Backoff::new();
    let stride = config.producers as u64;
    let mut seq = id as u64;

    // warmup: identical traffic, nothing recorded
    while !flags.collecting() {
        if flags.done() {
            return Ok(stats);
        }
        if push_once(ring, config.blocking, T::from_seq(seq)) {
            seq += stride;
            backoff.reset();
        } else {
            backoff.spin();
        }
    }

    while !flags.done() {
        // payload construction is inside the timed region: for the owning
        // shapes the per-message allocation is part of the push cost
        let t0 = tsc::read_tsc();
        let ok = push_once(ring, config.blocking, T::from_seq(seq));
        let t1 = tsc::read_tsc();
        let latency_ns = (t1.wrapping_sub(t0) as f64 * ns_per_cycle) as u64;

        if ok {
            stats.ok += 1;
            stats.min_ns = stats.min_ns.min(latency_ns);
            stats.max_ns = stats.max_ns.max(latency_ns);
            if stats.ok % SAMPLE_RATE == 0 {
                stats.histogram.record(latency_ns, SAMPLE_RATE);
            }
            seq += stride;
            backoff.reset();
        } else {
            stats.failed += 1;
            backoff.spin();
        }
    }

    Ok(stats)
}

/// Consumer body: pops and discards until `done`.
pub(crate) fn consumer_loop<T: Payload, L: CursorLayout>(
    id: usize,
    ring: &MpmcRing<T, L>,
    config: &BenchConfig,
    flags: &PhaseFlags,
    ns_per_cycle: f64,
) -> Result<WorkerStats, PinError> {
    if config.pinning {
        affinity::pin_to_core((id + config.producers) % affinity::core_count())?;
    }

    let mut stats = WorkerStats::new(config);
    let mut backoff = Backoff::new();

    while !flags.collecting() {
        if flags.done() {
            return Ok(stats);
        }
        if pop_once(ring, config.blocking).is_some() {
            backoff.reset();
        } else {
            backoff.spin();
        }
    }

    while !flags.done() {
        let t0 = tsc::read_tsc();
        let popped = pop_once(ring, config.blocking);
        let t1 = tsc::read_tsc();
        let latency_ns = (t1.wrapping_sub(t0) as f64 * ns_per_cycle) as u64;

        if popped.is_some() {
            stats.ok += 1;
            stats.min_ns = stats.min_ns.min(latency_ns);
            stats.max_ns = stats.max_ns.max(latency_ns);
            if stats.ok % SAMPLE_RATE == 0 {
                stats.histogram.record(latency_ns, SAMPLE_RATE);
            }
            backoff.reset();
        } else {
            stats.failed += 1;
            backoff.spin();
        }
    }

    Ok(stats)
}

#[inline]
fn push_once<T: Payload, L: CursorLayout>(ring: &MpmcRing<T, L>, blocking: bool, value: T) -> bool {
    if blocking {
        ring.push(value);
        true
    } else {
        // a rejected value is dropped here; the next attempt rebuilds it
        ring.try_push(value).is_ok()
    }
}

#[inline]
fn pop_once<T: Payload, L: CursorLayout>(ring: &MpmcRing<T, L>, blocking: bool) -> Option<T> {
    if blocking {
        Some(ring.pop())
    } else {
        ring.try_pop()
    }
}
