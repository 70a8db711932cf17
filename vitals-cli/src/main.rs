//! CLI for the vitals in-memory time-series store.
//!
//! Provides commands for benchmarking the write path, running a simulated
//! dashboard against a live store, and inspecting configuration.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::{Duration, Instant};

use clap::{Parser, Subcommand, ValueEnum};
use tracing_subscriber::EnvFilter;
use vitals::{SeriesSnapshot, Store, StoreConfig};

/// vitals — Embedded in-memory time-series store CLI.
#[derive(Parser)]
#[command(name = "vitals", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

/// Available CLI commands.
#[derive(Subcommand)]
enum Commands {
    /// Run a write-path microbenchmark.
    Bench {
        /// Number of data points to write.
        #[arg(long, default_value = "10000000")]
        points: u64,

        /// Number of series to write to.
        #[arg(long, default_value = "30")]
        series: u32,

        /// Number of writer threads sharing the series.
        #[arg(long, default_value = "1")]
        threads: u32,
    },

    /// Feed simulated collectors and render dashboard frames.
    Demo {
        /// JSON store configuration file.
        #[arg(long)]
        config: Option<PathBuf>,

        /// Number of one-second frames to render.
        #[arg(long, default_value = "5")]
        seconds: u32,

        /// Output format.
        #[arg(long, default_value = "text")]
        format: OutputFormat,
    },

    /// Print the effective store configuration as JSON.
    Config {
        /// JSON store configuration file.
        #[arg(long)]
        config: Option<PathBuf>,
    },
}

/// Output format for dashboard frames.
#[derive(Clone, Copy, ValueEnum)]
enum OutputFormat {
    /// Sparklines and aggregates, one line per series.
    Text,
    /// One JSON object per frame.
    Json,
}

/// Simulated collectors: series name, host label, metric label, baseline.
const COLLECTORS: [(&str, &str, &str, f64); 4] = [
    ("honey.cpu", "honey", "cpu", 35.0),
    ("honey.mem", "honey", "mem", 60.0),
    ("yoga.cpu", "yoga", "cpu", 20.0),
    ("yoga.mem", "yoga", "mem", 45.0),
];

/// Interval between simulated samples.
const SAMPLE_INTERVAL: Duration = Duration::from_millis(100);

/// Width of a rendered sparkline, in samples.
const SPARK_WIDTH: usize = 40;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Bench {
            points,
            series,
            threads,
        } => cmd_bench(points, series, threads),
        Commands::Demo {
            config,
            seconds,
            format,
        } => cmd_demo(config.as_deref(), seconds, format),
        Commands::Config { config } => cmd_config(config.as_deref()),
    };

    if let Err(e) = result {
        tracing::error!("command failed: {e}");
        std::process::exit(1);
    }
}

/// Loads the configuration file if given, otherwise the defaults.
fn load_config(path: Option<&Path>) -> Result<StoreConfig, Box<dyn std::error::Error>> {
    let config = match path {
        Some(path) => StoreConfig::load(path)?,
        None => StoreConfig::default(),
    };
    Ok(config)
}

/// Implements `vitals config`.
fn cmd_config(path: Option<&Path>) -> Result<(), Box<dyn std::error::Error>> {
    let config = load_config(path)?;
    config.validate()?;
    println!("{}", serde_json::to_string_pretty(&config.resolved())?);
    Ok(())
}

/// Implements `vitals bench`.
#[allow(clippy::cast_precision_loss)] // Benchmark stats are fine with f64 precision
fn cmd_bench(points: u64, series_count: u32, threads: u32) -> Result<(), Box<dyn std::error::Error>> {
    if series_count == 0 || threads == 0 {
        return Err("--series and --threads must be at least 1".into());
    }

    println!("vitals write-path benchmark");
    println!("  Points: {points}");
    println!("  Series: {series_count}");
    println!("  Threads: {threads}");
    println!();

    let store = Store::try_new(StoreConfig::default())?;
    let names: Vec<String> = (0..series_count).map(|i| format!("metric_{i}")).collect();
    for (i, name) in names.iter().enumerate() {
        store.set_labels(name, [("id", i.to_string())]);
    }

    println!("Writing {points} data points across {series_count} series...");

    let base_time = 1_700_000_000_000_000_000u64;
    let points_per_series = points / u64::from(series_count);
    let threads = usize::try_from(threads)?.min(names.len());
    let chunk = names.len().div_ceil(threads);

    let start = Instant::now();

    thread::scope(|s| {
        for shard in names.chunks(chunk) {
            let store = &store;
            s.spawn(move || {
                let mut ts = base_time;
                for _ in 0..points_per_series {
                    ts += 1_000_000_000;
                    for (i, name) in shard.iter().enumerate() {
                        store.add_point(name, ts, i as f64);
                    }
                }
            });
        }
    });

    let elapsed = start.elapsed();
    let total_writes = points_per_series * u64::from(series_count);
    let ns_per_write = elapsed.as_nanos() as f64 / total_writes.max(1) as f64;
    let writes_per_sec = total_writes as f64 / elapsed.as_secs_f64();

    println!();
    println!("Results:");
    println!("  Total writes: {total_writes}");
    println!("  Retained points: {}", store.point_count());
    println!("  Elapsed: {elapsed:.3?}");
    println!("  Avg latency: {ns_per_write:.1} ns/write");
    println!("  Throughput: {writes_per_sec:.0} writes/sec");

    Ok(())
}

/// Implements `vitals demo`.
fn cmd_demo(
    path: Option<&Path>,
    seconds: u32,
    format: OutputFormat,
) -> Result<(), Box<dyn std::error::Error>> {
    let config = load_config(path)?;
    let store = Store::try_new(config)?;
    let prune_interval = store.config().prune_interval;

    for (name, host, metric, _) in COLLECTORS {
        store.set_labels(name, [("host", host), ("metric", metric)]);
    }

    tracing::info!(
        "demo starting: {} collectors, {seconds} frame(s)",
        COLLECTORS.len()
    );

    let stop = AtomicBool::new(false);

    thread::scope(|s| -> Result<(), Box<dyn std::error::Error>> {
        for (phase, (name, _, _, baseline)) in (0u32..).zip(COLLECTORS) {
            let store = &store;
            let stop = &stop;
            s.spawn(move || run_collector(store, stop, name, baseline, phase));
        }

        let mut last_prune = Instant::now();
        let result = (1..=seconds).try_for_each(|frame| {
            thread::sleep(Duration::from_secs(1));
            render_frame(&store, frame, format)?;

            if last_prune.elapsed() >= prune_interval {
                store.prune();
                last_prune = Instant::now();
            }
            Ok::<_, Box<dyn std::error::Error>>(())
        });

        stop.store(true, Ordering::Relaxed);
        result
    })?;

    let stats = store.prune();
    tracing::info!(
        "demo finished: {} series, {} points, final prune removed {}",
        store.series_count(),
        store.point_count(),
        stats.points_removed
    );
    Ok(())
}

/// Feeds one simulated series until `stop` is set.
fn run_collector(store: &Store, stop: &AtomicBool, name: &str, baseline: f64, phase: u32) {
    let mut step = 0u32;
    while !stop.load(Ordering::Relaxed) {
        let angle = f64::from(step) / 8.0 + f64::from(phase);
        let value = baseline + baseline * 0.4 * angle.sin();
        store.add_point(name, store.clock().now_ns(), value);
        step = step.wrapping_add(1);
        thread::sleep(SAMPLE_INTERVAL);
    }
}

/// Renders every series from one frozen moment.
fn render_frame(
    store: &Store,
    frame: u32,
    format: OutputFormat,
) -> Result<(), Box<dyn std::error::Error>> {
    let token = store.freeze(&[]);
    let panels: Vec<SeriesSnapshot> = store
        .list_series()
        .iter()
        .flat_map(|name| store.query(name).last(SPARK_WIDTH).execute())
        .collect();
    store.unfreeze(token);

    match format {
        OutputFormat::Text => {
            println!("-- frame {frame} ({token}) --");
            for panel in &panels {
                println!(
                    "{:<10} {:<width$} avg={:>6.1} max={:>6.1} last={:>6.1}",
                    panel.name,
                    sparkline(&panel.values),
                    panel.avg(),
                    panel.max(),
                    panel.last(),
                    width = SPARK_WIDTH,
                );
            }
        }
        OutputFormat::Json => {
            let series: Vec<serde_json::Value> = panels
                .iter()
                .map(|panel| {
                    serde_json::json!({
                        "name": panel.name,
                        "labels": panel.labels,
                        "count": panel.len(),
                        "min": panel.min(),
                        "max": panel.max(),
                        "avg": panel.avg(),
                        "last": panel.last(),
                    })
                })
                .collect();

            let output = serde_json::json!({
                "frame": frame,
                "token": token.id(),
                "series": series,
            });
            println!("{}", serde_json::to_string(&output)?);
        }
    }

    Ok(())
}

/// Draws values as a unicode block sparkline scaled to their own range.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)] // Index is clamped to the bar table
fn sparkline(values: &[f64]) -> String {
    const BARS: [char; 8] = ['▁', '▂', '▃', '▄', '▅', '▆', '▇', '█'];

    let lo = values.iter().copied().fold(f64::INFINITY, f64::min);
    let hi = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let span = hi - lo;

    values
        .iter()
        .map(|&v| {
            if span <= f64::EPSILON {
                return BARS[0];
            }
            let level = ((v - lo) / span * 7.0).round() as usize;
            BARS[level.min(BARS.len() - 1)]
        })
        .collect()
}
