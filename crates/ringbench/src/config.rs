use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Configuration violations caught before a trial starts.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    /// At least one producer thread is required.
    #[error("producers must be >= 1")]
    NoProducers,

    /// At least one consumer thread is required.
    #[error("consumers must be >= 1")]
    NoConsumers,

    /// Ring capacity must be a power of two and at least 2.
    #[error("capacity must be a power of two >= 2 (got {0})")]
    InvalidCapacity(usize),

    /// The measured phase would be empty or negative.
    #[error("total duration ({duration:?}) must exceed warmup ({warmup:?})")]
    DurationTooShort {
        /// Configured total trial duration.
        duration: Duration,
        /// Configured warmup duration.
        warmup: Duration,
    },

    /// Histogram bucket width must be positive.
    #[error("histogram bucket width must be > 0 ns")]
    ZeroBucketWidth,

    /// Histogram bucket count must be positive.
    #[error("histogram bucket count must be > 0")]
    ZeroBucketCount,
}

/// One trial's worth of knobs: thread counts, ring shape, phase timing,
/// histogram resolution, and output location.
#[derive(Debug, Clone)]
pub struct BenchConfig {
    /// Producer thread count.
    pub producers: usize,
    /// Consumer thread count.
    pub consumers: usize,
    /// Ring capacity in slots (power of two >= 2).
    pub capacity: usize,
    /// Use blocking `push`/`pop` rather than the `try_` variants.
    pub blocking: bool,
    /// Total trial wall time, warmup included.
    pub duration: Duration,
    /// Unmeasured settling phase at the start of the trial.
    pub warmup: Duration,
    /// Histogram bucket width in nanoseconds.
    pub hist_bucket_ns: u64,
    /// Number of histogram buckets per side.
    pub hist_buckets: usize,
    /// Pin workers to cores.
    pub pinning: bool,
    /// Keep `head`/`tail` on separate cache lines.
    pub padding: bool,
    /// 1024-byte payload instead of 8 bytes.
    pub large_payload: bool,
    /// Owning-pointer payload instead of by-value.
    pub move_only_payload: bool,
    /// Where to append the result row.
    pub csv_path: PathBuf,
    /// Free-form notes, escaped into the CSV.
    pub notes: String,
}

impl Default for BenchConfig {
    fn default() -> Self {
        Self {
            producers: 1,
            consumers: 1,
            capacity: 65_536,
            blocking: true,
            duration: Duration::from_millis(17_500),
            warmup: Duration::from_millis(2_500),
            hist_bucket_ns: 5,
            hist_buckets: 4_096,
            pinning: true,
            padding: true,
            large_payload: false,
            move_only_payload: false,
            csv_path: PathBuf::from("results/raw/results.csv"),
            notes: String::new(),
        }
    }
}

impl BenchConfig {
    /// A sub-second trial for CI and smoke testing: tiny ring, pinning off
    /// so it behaves on shared runners.
    pub fn smoke() -> Self {
        Self {
            capacity: 64,
            duration: Duration::from_millis(300),
            warmup: Duration::from_millis(50),
            pinning: false,
            ..Self::default()
        }
    }

    /// Checks every precondition; a trial must not start otherwise.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.producers == 0 {
            return Err(ConfigError::NoProducers);
        }
        if self.consumers == 0 {
            return Err(ConfigError::NoConsumers);
        }
        if self.capacity < 2 || !self.capacity.is_power_of_two() {
            return Err(ConfigError::InvalidCapacity(self.capacity));
        }
        if self.duration <= self.warmup {
            return Err(ConfigError::DurationTooShort {
                duration: self.duration,
                warmup: self.warmup,
            });
        }
        if self.hist_bucket_ns == 0 {
            return Err(ConfigError::ZeroBucketWidth);
        }
        if self.hist_buckets == 0 {
            return Err(ConfigError::ZeroBucketCount);
        }
        Ok(())
    }

    /// Length of the measured phase (`duration - warmup`).
    pub fn measured(&self) -> Duration {
        self.duration.saturating_sub(self.warmup)
    }
}
