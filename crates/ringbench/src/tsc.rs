//! Timestamp-counter access and calibration.
//!
//! Per-operation latencies are measured with the CPU cycle counter; the
//! cycle-to-nanosecond factor is calibrated once per trial against the
//! monotonic clock. On modern hardware with an invariant TSC the counter
//! is consistent across cores; machines with heavy frequency scaling will
//! see some skew, which the calibration sleep amortizes but cannot remove.

use std::thread;
use std::time::{Duration, Instant};

/// How long [`calibrate`] samples the counter against the wall clock.
pub const CALIBRATION_SLEEP: Duration = Duration::from_millis(100);

/// Read the CPU cycle counter.
#[cfg(target_arch = "x86_64")]
#[inline(always)]
pub fn read_tsc() -> u64 {
    // SAFETY: RDTSC has no preconditions on x86_64.
    unsafe { core::arch::x86_64::_rdtsc() }
}

/// Fallback for non-x86 targets: nanoseconds from the monotonic clock, so
/// `ns_per_cycle` calibrates to ~1.0 and the rest of the pipeline is
/// unchanged.
#[cfg(not(target_arch = "x86_64"))]
#[inline(always)]
pub fn read_tsc() -> u64 {
    use std::sync::OnceLock;
    static EPOCH: OnceLock<Instant> = OnceLock::new();
    EPOCH.get_or_init(Instant::now).elapsed().as_nanos() as u64
}

/// Measures nanoseconds per counter tick over a `sleep`-long window.
///
/// Reads `(t0, c0)` before and `(c1, t1)` after the sleep and returns
/// `(t1 - t0) / (c1 - c0)`.
pub fn calibrate(sleep: Duration) -> f64 {
    let t0 = Instant::now();
    let c0 = read_tsc();
    thread::sleep(sleep);
    let c1 = read_tsc();
    let elapsed = t0.elapsed();

    let cycles = c1.wrapping_sub(c0);
    if cycles == 0 {
        return 1.0; // degenerate counter; report ticks as nanoseconds
    }
    elapsed.as_nanos() as f64 / cycles as f64
}
