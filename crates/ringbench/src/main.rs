use clap::error::ErrorKind;
use clap::Parser;
use ringbench::{csv, BenchConfig, BenchError, Harness};
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::{Duration, Instant};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "ringbench")]
#[command(about = "Bounded MPMC ring buffer measurement harness")]
#[command(version)]
struct Cli {
    /// Number of producer threads
    #[arg(short, long, default_value_t = 1)]
    producers: usize,

    /// Number of consumer threads
    #[arg(short, long, default_value_t = 1)]
    consumers: usize,

    /// Ring capacity in slots (power of two >= 2)
    #[arg(short = 'k', long, default_value_t = 65_536)]
    capacity: usize,

    /// Total trial duration in milliseconds
    #[arg(short, long = "duration-ms", default_value_t = 17_500)]
    duration_ms: u64,

    /// Warmup phase in milliseconds
    #[arg(short, long = "warmup-ms", default_value_t = 2_500)]
    warmup_ms: u64,

    /// Histogram bucket width in nanoseconds
    #[arg(long, default_value_t = 5)]
    hist_bucket_ns: u64,

    /// Histogram bucket count per side
    #[arg(long, default_value_t = 4_096)]
    hist_buckets: usize,

    /// Pin workers to cores
    #[arg(long, default_value = "on", value_parser = parse_switch, value_name = "on|off")]
    pinning: bool,

    /// Keep head/tail cursors on separate cache lines
    #[arg(long, default_value = "on", value_parser = parse_switch, value_name = "on|off")]
    padding: bool,

    /// Use blocking push/pop instead of the try variants
    #[arg(long, default_value = "on", value_parser = parse_switch, value_name = "on|off")]
    blocking: bool,

    /// Use the 1024-byte payload instead of 8 bytes
    #[arg(long, default_value = "off", value_parser = parse_switch, value_name = "on|off")]
    large_payload: bool,

    /// Use an owning-pointer payload instead of by-value
    #[arg(long, default_value = "off", value_parser = parse_switch, value_name = "on|off")]
    move_only_payload: bool,

    /// CSV output path (header written if the file is absent or empty)
    #[arg(long = "csv", default_value = "results/raw/results.csv")]
    csv_path: PathBuf,

    /// Free-form notes stored with the result row
    #[arg(long, default_value = "")]
    notes: String,
}

impl Cli {
    fn into_config(self) -> BenchConfig {
        BenchConfig {
            producers: self.producers,
            consumers: self.consumers,
            capacity: self.capacity,
            blocking: self.blocking,
            duration: Duration::from_millis(self.duration_ms),
            warmup: Duration::from_millis(self.warmup_ms),
            hist_bucket_ns: self.hist_bucket_ns,
            hist_buckets: self.hist_buckets,
            pinning: self.pinning,
            padding: self.padding,
            large_payload: self.large_payload,
            move_only_payload: self.move_only_payload,
            csv_path: self.csv_path,
            notes: self.notes,
        }
    }
}

fn parse_switch(value: &str) -> Result<bool, String> {
    match value.to_ascii_lowercase().as_str() {
        "on" | "true" | "1" => Ok(true),
        "off" | "false" | "0" => Ok(false),
        other => Err(format!("expected on|off, got '{other}'")),
    }
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) if matches!(e.kind(), ErrorKind::DisplayHelp | ErrorKind::DisplayVersion) => {
            let _ = e.print();
            return ExitCode::SUCCESS;
        }
        Err(e) => {
            let _ = e.print();
            return ExitCode::from(1);
        }
    };

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{e}");
            ExitCode::from(1)
        }
    }
}

fn run(cli: Cli) -> Result<(), BenchError> {
    let config = cli.into_config();
    info!(
        producers = config.producers,
        consumers = config.consumers,
        capacity = config.capacity,
        blocking = config.blocking,
        pinning = config.pinning,
        padding = config.padding,
        large_payload = config.large_payload,
        move_only_payload = config.move_only_payload,
        duration_ms = config.duration.as_millis() as u64,
        warmup_ms = config.warmup.as_millis() as u64,
        csv = %config.csv_path.display(),
        "configuration"
    );

    let harness = Harness::new(config)?;
    let t0 = Instant::now();
    let results = harness.run_once()?;
    let elapsed = t0.elapsed();

    let messages = (results.pushes_ok + results.pops_ok) / 2;
    let active_secs = harness.config().measured().as_secs_f64();
    info!("ran in {:.2} s", elapsed.as_secs_f64());
    info!(
        "messages processed (active phase): {:.1} million",
        messages as f64 / 1e6
    );
    info!(
        "average speed (active phase): {:.1} million messages/s",
        messages as f64 / active_secs / 1e6
    );

    if let Err(e) = csv::append(&results) {
        // measurement data must not be lost for lack of storage
        error!(
            "failed to append CSV row to {}: {e}",
            results.config.csv_path.display()
        );
    }

    Ok(())
}
