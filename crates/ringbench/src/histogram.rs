//! Bounded fixed-width latency histogram.
//!
//! Trades worst-case memory for O(1) insertion and quantile recovery exact
//! to within one bucket width. Samples beyond the covered range land in a
//! separate overflow count rather than the last bucket, so the in-range
//! distribution stays honest.

/// Per-worker latency histogram: `buckets` fixed-width bins plus an
/// overflow counter.
#[derive(Debug, Clone)]
pub struct Histogram {
    bucket_width_ns: u64,
    counts: Vec<u64>,
    overflow: u64,
}

impl Histogram {
    /// Creates an empty histogram covering `[0, buckets * bucket_width_ns)`.
    pub fn new(bucket_width_ns: u64, buckets: usize) -> Self {
        debug_assert!(bucket_width_ns > 0);
        debug_assert!(buckets > 0);
        Self {
            bucket_width_ns,
            counts: vec![0; buckets],
            overflow: 0,
        }
    }

    /// Records one sampled latency with the given weight.
    ///
    /// The bucket index is `ns / width`; out-of-range samples increment the
    /// overflow count instead.
    #[inline]
    pub fn record(&mut self, ns: u64, weight: u64) {
        let idx = (ns / self.bucket_width_ns) as usize;
        if idx < self.counts.len() {
            self.counts[idx] += weight;
        } else {
            self.overflow += weight;
        }
    }

    /// Bucket-wise sum of another histogram into this one.
    ///
    /// Both sides must share the same shape; per-worker histograms are all
    /// built from the same config so this holds by construction.
    pub fn merge(&mut self, other: &Histogram) {
        debug_assert_eq!(self.bucket_width_ns, other.bucket_width_ns);
        debug_assert_eq!(self.counts.len(), other.counts.len());
        for (dst, src) in self.counts.iter_mut().zip(&other.counts) {
            *dst += src;
        }
        self.overflow += other.overflow;
    }

    /// Total in-range weight (overflow excluded); the rank domain for
    /// quantile recovery.
    pub fn total(&self) -> u64 {
        self.counts.iter().sum()
    }

    /// Weight that fell beyond the covered range.
    #[inline]
    pub fn overflow(&self) -> u64 {
        self.overflow
    }

    /// Bucket width in nanoseconds.
    #[inline]
    pub fn bucket_width_ns(&self) -> u64 {
        self.bucket_width_ns
    }

    /// In-range bucket counts, lowest latency first.
    #[inline]
    pub fn counts(&self) -> &[u64] {
        &self.counts
    }

    /// Midpoint of bucket `idx` in nanoseconds.
    #[inline]
    pub fn midpoint_ns(&self, idx: usize) -> u64 {
        idx as u64 * self.bucket_width_ns + self.bucket_width_ns / 2
    }
}
