//! Per-trial result aggregation: worker counters fold into one `Results`
//! record, and quantiles are recovered from the merged histograms.

use crate::config::BenchConfig;
use crate::histogram::Histogram;
use std::time::Duration;

/// Counters one worker accumulates during the measured phase.
///
/// Extrema are tracked on every successful operation; the histogram only
/// receives every `SAMPLE_RATE`-th sample (credited with that weight).
#[derive(Debug)]
pub struct WorkerStats {
    /// Successful operations.
    pub ok: u64,
    /// Failed try-operations (ring full / ring empty).
    pub failed: u64,
    /// Smallest observed latency, ns. `u64::MAX` until the first success.
    pub min_ns: u64,
    /// Largest observed latency, ns.
    pub max_ns: u64,
    /// Sampled latency distribution.
    pub histogram: Histogram,
}

impl WorkerStats {
    /// Fresh counters with an empty histogram shaped per the config.
    pub fn new(config: &BenchConfig) -> Self {
        Self {
            ok: 0,
            failed: 0,
            min_ns: u64::MAX,
            max_ns: 0,
            histogram: Histogram::new(config.hist_bucket_ns, config.hist_buckets),
        }
    }
}

/// Latency summary for one side (push or pop) of a trial.
#[derive(Debug, Clone, Copy)]
pub struct LatencyStats {
    /// Smallest latency over all successful operations, ns.
    pub min_ns: u64,
    /// Median, reported as the midpoint of its bucket.
    pub p50_ns: u64,
    /// 95th percentile bucket midpoint.
    pub p95_ns: u64,
    /// 99th percentile bucket midpoint.
    pub p99_ns: u64,
    /// 99.9th percentile bucket midpoint.
    pub p999_ns: u64,
    /// Largest latency over all successful operations, ns.
    pub max_ns: u64,
    /// Weighted mean of bucket midpoints, ns.
    pub mean_ns: u64,
    /// Samples above 10x the median, histogram overflow included.
    pub spikes_over_10x_p50: u64,
}

impl Default for LatencyStats {
    fn default() -> Self {
        Self {
            min_ns: u64::MAX,
            p50_ns: 0,
            p95_ns: 0,
            p99_ns: 0,
            p999_ns: 0,
            max_ns: 0,
            mean_ns: 0,
            spikes_over_10x_p50: 0,
        }
    }
}

/// Everything one trial produces: the configuration it ran under,
/// throughput counters, and per-side latency summaries plus the raw
/// histograms they were derived from.
#[derive(Debug)]
pub struct Results {
    /// The configuration this trial ran under.
    pub config: BenchConfig,
    /// Measured-phase wall time (warmup excluded).
    pub wall_time: Duration,

    /// Successful pushes.
    pub pushes_ok: u64,
    /// Successful pops.
    pub pops_ok: u64,
    /// `try_push` rejections (ring full).
    pub try_push_failures: u64,
    /// `try_pop` rejections (ring empty).
    pub try_pop_failures: u64,

    /// Push-side latency summary.
    pub push_latency: LatencyStats,
    /// Pop-side latency summary.
    pub pop_latency: LatencyStats,

    /// Merged push-side histogram.
    pub push_histogram: Histogram,
    /// Merged pop-side histogram.
    pub pop_histogram: Histogram,
}

impl Results {
    /// Empty results shaped for `config`.
    pub fn new(config: BenchConfig) -> Self {
        let push_histogram = Histogram::new(config.hist_bucket_ns, config.hist_buckets);
        let pop_histogram = push_histogram.clone();
        Self {
            config,
            wall_time: Duration::ZERO,
            pushes_ok: 0,
            pops_ok: 0,
            try_push_failures: 0,
            try_pop_failures: 0,
            push_latency: LatencyStats::default(),
            pop_latency: LatencyStats::default(),
            push_histogram,
            pop_histogram,
        }
    }

    /// Folds one producer's counters into the push side.
    pub fn absorb_producer(&mut self, stats: &WorkerStats) {
        self.pushes_ok += stats.ok;
        self.try_push_failures += stats.failed;
        self.push_latency.min_ns = self.push_latency.min_ns.min(stats.min_ns);
        self.push_latency.max_ns = self.push_latency.max_ns.max(stats.max_ns);
        self.push_histogram.merge(&stats.histogram);
    }

    /// Folds one consumer's counters into the pop side.
    pub fn absorb_consumer(&mut self, stats: &WorkerStats) {
        self.pops_ok += stats.ok;
        self.try_pop_failures += stats.failed;
        self.pop_latency.min_ns = self.pop_latency.min_ns.min(stats.min_ns);
        self.pop_latency.max_ns = self.pop_latency.max_ns.max(stats.max_ns);
        self.pop_histogram.merge(&stats.histogram);
    }

    /// Recovers quantiles, mean, and spike counts from the merged
    /// histograms. Call once, after every worker has been absorbed.
    pub fn finalize(&mut self) {
        summarize(&self.push_histogram, &mut self.push_latency);
        summarize(&self.pop_histogram, &mut self.pop_latency);
        if self.pushes_ok == 0 {
            self.push_latency.min_ns = 0;
        }
        if self.pops_ok == 0 {
            self.pop_latency.min_ns = 0;
        }
    }

    /// Push throughput over the measured phase.
    pub fn push_ops_per_sec(&self) -> f64 {
        let secs = self.wall_time.as_secs_f64();
        if secs > 0.0 {
            self.pushes_ok as f64 / secs
        } else {
            0.0
        }
    }

    /// Pop throughput over the measured phase.
    pub fn pop_ops_per_sec(&self) -> f64 {
        let secs = self.wall_time.as_secs_f64();
        if secs > 0.0 {
            self.pops_ok as f64 / secs
        } else {
            0.0
        }
    }
}

/// Fills `stats` from a merged histogram.
///
/// Quantile `q` is the midpoint of the first bucket whose cumulative count
/// reaches rank `ceil(total * q)`; the mean is the weighted midpoint sum.
/// The spike count is every in-range sample at or beyond `10 * p50`, plus
/// the whole overflow weight (overflowed samples exceeded the histogram
/// range, which in practice dwarfs any plausible 10x-median threshold).
fn summarize(histogram: &Histogram, stats: &mut LatencyStats) {
    stats.spikes_over_10x_p50 = histogram.overflow();

    let total = histogram.total();
    if total == 0 {
        return;
    }

    let ranks = [
        (total * 50).div_ceil(100),
        (total * 95).div_ceil(100),
        (total * 99).div_ceil(100),
        (total * 999).div_ceil(1_000),
    ];
    let mut found = [None::<usize>; 4];

    let mut cumulative = 0u64;
    for (idx, &count) in histogram.counts().iter().enumerate() {
        cumulative += count;
        for (slot, &rank) in found.iter_mut().zip(&ranks) {
            if slot.is_none() && cumulative >= rank {
                *slot = Some(idx);
            }
        }
        if found[3].is_some() {
            break;
        }
    }

    // every rank is <= total, so all four landed
    stats.p50_ns = histogram.midpoint_ns(found[0].unwrap_or(0));
    stats.p95_ns = histogram.midpoint_ns(found[1].unwrap_or(0));
    stats.p99_ns = histogram.midpoint_ns(found[2].unwrap_or(0));
    stats.p999_ns = histogram.midpoint_ns(found[3].unwrap_or(0));

    let weighted_sum: f64 = histogram
        .counts()
        .iter()
        .enumerate()
        .map(|(idx, &count)| count as f64 * histogram.midpoint_ns(idx) as f64)
        .sum();
    stats.mean_ns = (weighted_sum / total as f64) as u64;

    let spike_idx = (10 * stats.p50_ns / histogram.bucket_width_ns()) as usize;
    if spike_idx < histogram.counts().len() {
        stats.spikes_over_10x_p50 += histogram.counts()[spike_idx..].iter().sum::<u64>();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::BenchConfig;

    fn config(width: u64, buckets: usize) -> BenchConfig {
        BenchConfig {
            hist_bucket_ns: width,
            hist_buckets: buckets,
            ..BenchConfig::smoke()
        }
    }

    #[test]
    fn quantiles_are_bucket_midpoints() {
        let mut results = Results::new(config(10, 16));
        // 100 samples in bucket 3 (30..40 ns): every quantile is its midpoint
        let mut worker = WorkerStats::new(&results.config);
        worker.histogram.record(35, 100);
        worker.ok = 100;
        worker.min_ns = 31;
        worker.max_ns = 39;
        results.absorb_producer(&worker);
        results.finalize();

        assert_eq!(results.push_latency.p50_ns, 35);
        assert_eq!(results.push_latency.p95_ns, 35);
        assert_eq!(results.push_latency.p99_ns, 35);
        assert_eq!(results.push_latency.p999_ns, 35);
        assert_eq!(results.push_latency.mean_ns, 35);
        assert_eq!(results.push_latency.min_ns, 31);
        assert_eq!(results.push_latency.max_ns, 39);
        assert_eq!(results.push_latency.spikes_over_10x_p50, 0);
    }

    #[test]
    fn quantiles_split_across_buckets() {
        let mut results = Results::new(config(10, 16));
        let mut worker = WorkerStats::new(&results.config);
        // 90 fast samples in bucket 0, 10 slow in bucket 9
        worker.histogram.record(5, 90);
        worker.histogram.record(95, 10);
        results.absorb_consumer(&worker);
        results.finalize();

        let stats = results.pop_latency;
        assert_eq!(stats.p50_ns, 5); // rank 50 lands in bucket 0
        assert_eq!(stats.p95_ns, 95); // rank 95 needs the slow bucket
        assert_eq!(stats.p99_ns, 95);
        assert_eq!(stats.mean_ns, (90 * 5 + 10 * 95) / 100);
        // spike threshold = 50 ns = bucket 5; the 10 slow samples qualify
        assert_eq!(stats.spikes_over_10x_p50, 10);
    }

    #[test]
    fn overflow_folds_into_spikes() {
        let mut results = Results::new(config(5, 4));
        let mut worker = WorkerStats::new(&results.config);
        worker.histogram.record(2, 100); // in range
        worker.histogram.record(10_000, 300); // beyond 20 ns range
        results.absorb_producer(&worker);
        results.finalize();

        assert_eq!(results.push_histogram.overflow(), 300);
        assert_eq!(results.push_latency.spikes_over_10x_p50, 300);
        assert_eq!(results.push_latency.p50_ns, 2); // midpoint of bucket 0
    }

    #[test]
    fn workers_fold_per_side() {
        let mut results = Results::new(config(5, 8));
        let mut a = WorkerStats::new(&results.config);
        a.ok = 10;
        a.failed = 2;
        a.min_ns = 7;
        a.max_ns = 90;
        let mut b = WorkerStats::new(&results.config);
        b.ok = 20;
        b.failed = 1;
        b.min_ns = 4;
        b.max_ns = 40;

        results.absorb_producer(&a);
        results.absorb_producer(&b);
        results.finalize();

        assert_eq!(results.pushes_ok, 30);
        assert_eq!(results.try_push_failures, 3);
        assert_eq!(results.push_latency.min_ns, 4);
        assert_eq!(results.push_latency.max_ns, 90);
        // pop side untouched
        assert_eq!(results.pops_ok, 0);
        assert_eq!(results.pop_latency.min_ns, 0);
    }

    #[test]
    fn ops_per_sec_uses_wall_time() {
        let mut results = Results::new(config(5, 8));
        results.pushes_ok = 1_000_000;
        results.wall_time = Duration::from_secs(2);
        assert_eq!(results.push_ops_per_sec() as u64, 500_000);
        assert_eq!(results.pop_ops_per_sec() as u64, 0);
    }
}
