//! ringbench - measurement harness for the `mpmcring` queue
//!
//! Runs one trial per invocation: spin up N producers and M consumers over
//! a shared ring, warm up, measure for a fixed window with cycle-counter
//! timestamps around every operation, aggregate per-thread latency
//! histograms, and append one CSV row per trial.
//!
//! # Pipeline
//!
//! 1. Validate the [`BenchConfig`], build the ring (payload shape and
//!    cursor padding are monomorphized per trial)
//! 2. Calibrate TSC-to-nanoseconds against the monotonic clock
//! 3. Spawn workers (optionally pinned), run warmup then measurement,
//!    signalled through shared relaxed flags
//! 4. Fold per-worker counters and histograms into [`Results`], recover
//!    quantiles at bucket-midpoint precision
//! 5. Append the row ([`csv`]), header written once per file

mod affinity;
mod config;
pub mod csv;
mod harness;
mod histogram;
mod payload;
mod results;
mod tsc;
mod worker;

pub use affinity::{core_count, pin_to_core, PinError};
pub use config::{BenchConfig, ConfigError};
pub use harness::{BenchError, Harness};
pub use histogram::Histogram;
pub use payload::{Block, Payload};
pub use results::{LatencyStats, Results, WorkerStats};
pub use tsc::{calibrate, read_tsc, CALIBRATION_SLEEP};
