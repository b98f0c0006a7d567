//! CSV emission: one row per trial, appended to the configured path.
//!
//! The header is written only when the file is missing or empty, so
//! repeated runs against the same path accumulate comparable rows. String
//! cells are RFC 4180 quoted; histograms are serialized as
//! semicolon-separated bucket counts in a single cell.

use crate::histogram::Histogram;
use crate::results::Results;
use std::fs::{self, OpenOptions};
use std::io::{self, BufWriter, Write};

/// Appends one result row, creating the file (and parent directories,
/// best-effort) and the header as needed.
///
/// I/O failure here must not lose the trial: callers log the error and
/// keep the in-memory results.
pub fn append(results: &Results) -> io::Result<()> {
    let path = &results.config.csv_path;

    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            let _ = fs::create_dir_all(parent); // best-effort; open() reports the real error
        }
    }

    let need_header = fs::metadata(path).map(|m| m.len() == 0).unwrap_or(true);

    let file = OpenOptions::new().create(true).append(true).open(path)?;
    let mut out = BufWriter::new(file);
    if need_header {
        write_header(&mut out)?;
    }
    write_row(&mut out, results)?;
    out.flush()
}

/// Fixed column order; every row writer below must match it.
pub fn write_header(out: &mut impl Write) -> io::Result<()> {
    writeln!(
        out,
        "producers,consumers,capacity,blocking,pinning_on,padding_on,\
         large_payload,move_only_payload,warmup_ms,duration_ms,wall_time_ns,\
         pushes_ok,pops_ok,try_push_failures,try_pop_failures,\
         try_push_failures_pct,try_pop_failures_pct,push_ops_per_sec,pop_ops_per_sec,\
         push_lat_min_ns,push_lat_p50_ns,push_lat_p95_ns,push_lat_p99_ns,\
         push_lat_p999_ns,push_lat_max_ns,push_lat_mean_ns,push_spikes_over_10x_p50,\
         pop_lat_min_ns,pop_lat_p50_ns,pop_lat_p95_ns,pop_lat_p99_ns,\
         pop_lat_p999_ns,pop_lat_max_ns,pop_lat_mean_ns,pop_spikes_over_10x_p50,\
         hist_bucket_ns,push_overflow_pct,pop_overflow_pct,push_hist_bins,pop_hist_bins,\
         notes"
    )
}

/// Writes one data row for `results`.
pub fn write_row(out: &mut impl Write, results: &Results) -> io::Result<()> {
    let cfg = &results.config;

    let try_push_pct = percentage(results.try_push_failures, results.pushes_ok + results.try_push_failures);
    let try_pop_pct = percentage(results.try_pop_failures, results.pops_ok + results.try_pop_failures);
    let push_overflow_pct = percentage(results.push_histogram.overflow(), results.pushes_ok);
    let pop_overflow_pct = percentage(results.pop_histogram.overflow(), results.pops_ok);

    // metadata
    write!(
        out,
        "{},{},{},{},{},{},{},{},{},{},{},",
        cfg.producers,
        cfg.consumers,
        cfg.capacity,
        cfg.blocking as u8,
        cfg.pinning as u8,
        cfg.padding as u8,
        cfg.large_payload as u8,
        cfg.move_only_payload as u8,
        cfg.warmup.as_millis(),
        cfg.duration.as_millis(),
        results.wall_time.as_nanos(),
    )?;

    // throughput
    write!(
        out,
        "{},{},{},{},{try_push_pct:.2},{try_pop_pct:.2},{},{},",
        results.pushes_ok,
        results.pops_ok,
        results.try_push_failures,
        results.try_pop_failures,
        results.push_ops_per_sec() as u64,
        results.pop_ops_per_sec() as u64,
    )?;

    // latency, both sides
    for stats in [&results.push_latency, &results.pop_latency] {
        write!(
            out,
            "{},{},{},{},{},{},{},{},",
            stats.min_ns,
            stats.p50_ns,
            stats.p95_ns,
            stats.p99_ns,
            stats.p999_ns,
            stats.max_ns,
            stats.mean_ns,
            stats.spikes_over_10x_p50,
        )?;
    }

    // histograms
    write!(
        out,
        "{},{push_overflow_pct:.2},{pop_overflow_pct:.2},{},{},",
        cfg.hist_bucket_ns,
        escape(&serialize_hist(&results.push_histogram)),
        escape(&serialize_hist(&results.pop_histogram)),
    )?;

    writeln!(out, "{}", escape(&cfg.notes))
}

fn percentage(part: u64, whole: u64) -> f64 {
    if whole > 0 {
        100.0 * part as f64 / whole as f64
    } else {
        0.0
    }
}

/// Bucket counts as a semicolon-separated list, lowest bucket first.
fn serialize_hist(hist: &Histogram) -> String {
    let mut s = String::with_capacity(hist.counts().len() * 2);
    for (i, count) in hist.counts().iter().enumerate() {
        if i > 0 {
            s.push(';');
        }
        s.push_str(&count.to_string());
    }
    s
}

/// RFC 4180 quoting: a cell containing a comma, double quote, or line
/// break is wrapped in double quotes, with embedded quotes doubled.
fn escape(s: &str) -> String {
    if !s.contains([',', '"', '\n', '\r']) {
        return s.to_string();
    }
    let mut out = String::with_capacity(s.len() + 2);
    out.push('"');
    for c in s.chars() {
        if c == '"' {
            out.push('"');
        }
        out.push(c);
    }
    out.push('"');
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::BenchConfig;
    use std::path::PathBuf;
    use std::time::Duration;

    #[test]
    fn escape_plain_passthrough() {
        assert_eq!(escape("plain notes"), "plain notes");
        assert_eq!(escape(""), "");
        assert_eq!(escape("1;2;3"), "1;2;3");
    }

    #[test]
    fn escape_quotes_specials() {
        assert_eq!(escape("a,b"), "\"a,b\"");
        assert_eq!(escape("say \"hi\""), "\"say \"\"hi\"\"\"");
        assert_eq!(escape("line\nbreak"), "\"line\nbreak\"");
        assert_eq!(escape("cr\rhere"), "\"cr\rhere\"");
    }

    #[test]
    fn row_matches_header_arity() {
        let mut results = Results::new(BenchConfig {
            hist_buckets: 8,
            notes: "smoke".to_string(),
            ..BenchConfig::smoke()
        });
        results.wall_time = Duration::from_millis(250);
        results.pushes_ok = 1_000;
        results.pops_ok = 1_000;
        results.finalize();

        let mut header = Vec::new();
        let mut row = Vec::new();
        write_header(&mut header).unwrap();
        write_row(&mut row, &results).unwrap();

        let header = String::from_utf8(header).unwrap();
        let row = String::from_utf8(row).unwrap();
        // no quoted commas in this row, so a plain split is honest
        assert_eq!(
            header.trim_end().split(',').count(),
            row.trim_end().split(',').count()
        );
        assert!(header.starts_with("producers,consumers,capacity,"));
        assert!(header.trim_end().ends_with(",notes"));
    }

    #[test]
    fn header_written_once_per_file() {
        let path = std::env::temp_dir().join(format!(
            "ringbench-csv-header-once-{}.csv",
            std::process::id()
        ));
        let _ = std::fs::remove_file(&path);

        let mut results = Results::new(BenchConfig {
            csv_path: PathBuf::from(&path),
            ..BenchConfig::smoke()
        });
        results.finalize();

        append(&results).unwrap();
        append(&results).unwrap();

        let contents = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = contents.lines().collect();
        assert_eq!(lines.len(), 3, "header plus two rows");
        assert!(lines[0].starts_with("producers,"));
        assert!(!lines[1].starts_with("producers,"));
        assert!(!lines[2].starts_with("producers,"));

        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn notes_with_commas_stay_one_cell() {
        let mut results = Results::new(BenchConfig {
            hist_buckets: 4,
            notes: "run 3, padded, \"hot\" box".to_string(),
            ..BenchConfig::smoke()
        });
        results.finalize();

        let mut row = Vec::new();
        write_row(&mut row, &results).unwrap();
        let row = String::from_utf8(row).unwrap();
        assert!(row.trim_end().ends_with("\"run 3, padded, \"\"hot\"\" box\""));
    }
}
