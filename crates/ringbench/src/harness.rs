//! Trial orchestration: ring construction, TSC calibration, worker
//! spawning, phase sequencing, and result aggregation.

use crate::affinity::PinError;
use crate::config::{BenchConfig, ConfigError};
use crate::payload::{Block, Payload};
use crate::results::{Results, WorkerStats};
use crate::tsc;
use crate::worker::{self, PhaseFlags};
use mpmcring::{CompactCursors, CursorLayout, MpmcRing, PaddedCursors, RingError};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Instant;
use thiserror::Error;
use tracing::{debug, info};

/// A trial that could not start or could not finish.
#[derive(Debug, Error)]
pub enum BenchError {
    /// Configuration precondition violated.
    #[error("invalid configuration: {0}")]
    Config(#[from] ConfigError),

    /// Ring construction rejected the capacity. Validation makes this
    /// unreachable in practice, but the conversion keeps `?` clean.
    #[error(transparent)]
    Ring(#[from] RingError),

    /// A worker could not pin itself; the measurement would be invalid.
    #[error("thread affinity failed: {0}")]
    Platform(#[from] PinError),

    /// A worker thread panicked mid-trial.
    #[error("worker thread panicked")]
    WorkerPanic,
}

/// Runs one measurement trial per [`BenchConfig`].
pub struct Harness {
    config: BenchConfig,
}

impl Harness {
    /// Validates the configuration up front; an invalid trial never starts.
    pub fn new(config: BenchConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self { config })
    }

    /// The configuration this harness runs.
    pub fn config(&self) -> &BenchConfig {
        &self.config
    }

    /// Runs one trial, dispatching on the payload shape and cursor layout
    /// so each combination is monomorphized into its own hot loop.
    pub fn run_once(&self) -> Result<Results, BenchError> {
        let cfg = &self.config;
        match (cfg.move_only_payload, cfg.large_payload, cfg.padding) {
            (false, false, true) => self.run_trial::<u64, PaddedCursors>(),
            (false, false, false) => self.run_trial::<u64, CompactCursors>(),
            (false, true, true) => self.run_trial::<Block, PaddedCursors>(),
            (false, true, false) => self.run_trial::<Block, CompactCursors>(),
            (true, false, true) => self.run_trial::<Box<u64>, PaddedCursors>(),
            (true, false, false) => self.run_trial::<Box<u64>, CompactCursors>(),
            (true, true, true) => self.run_trial::<Box<Block>, PaddedCursors>(),
            (true, true, false) => self.run_trial::<Box<Block>, CompactCursors>(),
        }
    }

    fn run_trial<T: Payload, L: CursorLayout>(&self) -> Result<Results, BenchError> {
        let config = Arc::new(self.config.clone());
        let ring = Arc::new(MpmcRing::<T, L>::new(config.capacity)?);
        let flags = Arc::new(PhaseFlags::new());

        let ns_per_cycle = tsc::calibrate(tsc::CALIBRATION_SLEEP);
        debug!(ns_per_cycle, "calibrated cycle counter");

        let mut producers: Vec<JoinHandle<Result<WorkerStats, PinError>>> =
            Vec::with_capacity(config.producers);
        for id in 0..config.producers {
            let ring = Arc::clone(&ring);
            let flags = Arc::clone(&flags);
            let config = Arc::clone(&config);
            producers.push(thread::spawn(move || {
                worker::producer_loop(id, &ring, &config, &flags, ns_per_cycle)
            }));
        }

        let mut consumers: Vec<JoinHandle<Result<WorkerStats, PinError>>> =
            Vec::with_capacity(config.consumers);
        for id in 0..config.consumers {
            let ring = Arc::clone(&ring);
            let flags = Arc::clone(&flags);
            let config = Arc::clone(&config);
            consumers.push(thread::spawn(move || {
                worker::consumer_loop(id, &ring, &config, &flags, ns_per_cycle)
            }));
        }

        thread::sleep(config.warmup);
        let measurement_start = Instant::now();
        flags.start_collecting();
        info!("measurement phase started");

        thread::sleep(config.measured());
        flags.finish();

        // A blocking worker can be parked mid-claim when `done` lands with
        // the ring full (producer) or empty (consumer). Its ticket commits
        // it to finishing that handoff, so pump both sides until every
        // thread has wound down. Pumped values sit outside the measurement
        // window; leftovers are reclaimed by the ring's destructor.
        if config.blocking {
            while producers.iter().chain(&consumers).any(|h| !h.is_finished()) {
                let _ = ring.try_pop();
                let _ = ring.try_push(T::from_seq(0));
                thread::yield_now();
            }
        }

        let mut producer_stats = Vec::with_capacity(producers.len());
        for handle in producers {
            producer_stats.push(handle.join().map_err(|_| BenchError::WorkerPanic)??);
        }
        let mut consumer_stats = Vec::with_capacity(consumers.len());
        for handle in consumers {
            consumer_stats.push(handle.join().map_err(|_| BenchError::WorkerPanic)??);
        }
        let wall_time = measurement_start.elapsed();

        let mut results = Results::new(self.config.clone());
        results.wall_time = wall_time;
        for stats in &producer_stats {
            results.absorb_producer(stats);
        }
        for stats in &consumer_stats {
            results.absorb_consumer(stats);
        }
        results.finalize();

        info!(
            pushes_ok = results.pushes_ok,
            pops_ok = results.pops_ok,
            "trial complete"
        );
        Ok(results)
    }
}
