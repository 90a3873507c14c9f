//! # Electrochemical Stimulus Simulator
//!
//! Runs the stimulus core on simulated peripherals and prints one JSON report
//! line per report interval, the same line the board streams to its host.
//!
//! Simulated time runs as fast as possible unless `--realtime` is given, in
//! which case each simulated millisecond takes one wall-clock millisecond and
//! Ctrl-C ends the run early.

use clap::Parser;
use echem_common::sampling::SamplingSubsystem;
use echem_common::waveform::RunMode;
use echem_stimulus::config::{StimulusConfig, load_config};
use echem_stimulus::report::ReportLine;
use echem_stimulus::sim::SimulationBoard;
use std::io::Write;
use std::path::PathBuf;
use std::process;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tracing::{Level, error, info};
use tracing_subscriber::EnvFilter;

/// Foreground service period [ms].
const SERVICE_PERIOD_MS: u32 = 10;

/// Electrochemical stimulus core on simulated hardware
#[derive(Parser, Debug)]
#[command(name = "echem_stimulus")]
#[command(author = "RTS007")]
#[command(version)]
#[command(about = "CV / DPV / IT waveform generation on simulated DAC, DMA and timers")]
struct Args {
    /// Path to stimulus configuration TOML (compiled defaults when omitted).
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Override the configured technique (cv, dpv, it).
    #[arg(short, long)]
    mode: Option<RunMode>,

    /// Simulated run length in milliseconds.
    #[arg(short, long, default_value_t = 1000)]
    duration_ms: u32,

    /// Pace simulated time to the wall clock.
    #[arg(long)]
    realtime: bool,

    /// Enable verbose logging (DEBUG level).
    #[arg(short, long)]
    verbose: bool,

    /// Output logs in JSON format.
    #[arg(long)]
    json: bool,
}

fn main() {
    let args = Args::parse();

    let config = match &args.config {
        Some(path) => load_config(path),
        None => Ok(StimulusConfig::default()),
    };
    let level = match &config {
        Ok(c) => Level::from(c.shared.log_level),
        Err(_) => Level::INFO,
    };
    setup_tracing(&args, level);

    info!("Stimulus simulator v{} starting...", env!("CARGO_PKG_VERSION"));

    let result = config
        .map_err(|e| Box::new(e) as Box<dyn std::error::Error>)
        .and_then(|config| run(&args, config));
    if let Err(e) = result {
        error!("FATAL: {e}");
        process::exit(1);
    }

    info!("Stimulus simulator shutdown complete");
}

fn run(args: &Args, mut config: StimulusConfig) -> Result<(), Box<dyn std::error::Error>> {
    if let Some(mode) = args.mode {
        config.defaults.mode = mode;
        config.validate()?;
    }
    info!(
        "{}: mode {}, report every {} ms, {} ms",
        config.shared.service_name, config.defaults.mode, config.report.interval_ms, args.duration_ms
    );

    let running = Arc::new(AtomicBool::new(true));
    if args.realtime {
        let r = running.clone();
        ctrlc::set_handler(move || {
            info!("Received shutdown signal");
            r.store(false, Ordering::SeqCst);
        })?;
    }

    let mut board = SimulationBoard::new(&config);
    let mode = board.system().mode();
    let monitor = board.system().scan_monitor();
    board.system_mut().start();

    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    let interval = config.report.interval_ms;

    for ms in 1..=args.duration_ms {
        if !running.load(Ordering::SeqCst) {
            break;
        }
        board.run_ms(1);

        if ms % SERVICE_PERIOD_MS == 0 {
            let system = board.system_mut();
            system.sampler_mut().service();
            system.update_tick();
        }

        if ms % interval == 0 {
            let line = ReportLine::new(
                ms,
                mode,
                board.system().sampler().readings(),
                monitor.code(),
                monitor.consume_sample_flags(),
            );
            writeln!(out, "{}", line.to_json()?)?;
        }

        if args.realtime {
            std::thread::sleep(Duration::from_millis(1));
        }
    }

    board.system_mut().stop();
    info!(
        "Run finished after {} ms ({} display ticks)",
        board.elapsed_ms(),
        board.system().tick_count()
    );
    Ok(())
}

fn setup_tracing(args: &Args, configured: Level) {
    let level = if args.verbose { Level::DEBUG } else { configured };

    let filter = EnvFilter::from_default_env().add_directive(level.into());

    if args.json {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .json()
            .with_writer(std::io::stderr)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .init();
    }
}
