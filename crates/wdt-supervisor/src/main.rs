//! wdt-keepalive - hardware watchdog keep-alive daemon
//!
//! Opens `/dev/watchdog`, keeps it fed until SIGINT/SIGTERM, then disarms it
//! with the magic close handshake when the driver requires one.

#![deny(static_mut_refs)]
#![deny(unused_must_use)]
#![deny(clippy::unwrap_used)]

use anyhow::{Context, Result};
use clap::Parser;
use std::process::ExitCode;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use wdt_supervisor::prelude::*;

#[derive(Parser)]
#[command(name = "wdt-keepalive")]
#[command(about = "Keep a hardware watchdog alive and disarm it cleanly on shutdown")]
#[command(version)]
#[command(long_about = "
wdt-keepalive opens /dev/watchdog, logs its identity and capabilities, and
sends a keep-alive pulse at a fixed cadence until it receives SIGINT or
SIGTERM. On shutdown it sends the magic close character when the driver
advertises MAGICCLOSE, so releasing the device does not reset the machine.

Exit status: 0 on graceful shutdown, 2 if the device cannot be opened,
3 if keep-alives fail repeatedly, 1 on any other failure.
")]
struct Cli {
    /// Watchdog timeout to configure, in seconds (values below 10 are raised to 10)
    #[arg(short, long, value_name = "SECS")]
    timeout: Option<u32>,

    /// Stop after this many keep-alive pulses instead of waiting for a signal
    #[arg(long, value_name = "N", value_parser = clap::value_parser!(u64).range(1..))]
    cycles: Option<u64>,

    /// Verbose logging
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let log_level = match cli.verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(log_level))
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();

    match run(&cli) {
        Ok(report) => {
            info!(
                keep_alives = report.keep_alives_sent,
                failures = report.keep_alive_failures,
                stop_reason = ?report.stop_reason,
                magic_close = ?report.magic_close,
                "Watchdog keep-alive finished"
            );
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!("{e:#}");
            let exit_code = e
                .downcast_ref::<SupervisorError>()
                .map_or(1, SupervisorError::exit_code);
            ExitCode::from(exit_code)
        }
    }
}

fn run(cli: &Cli) -> Result<RunReport> {
    let mut builder = SupervisorConfig::builder().timeout(TimeoutConfig::new(cli.timeout));
    if let Some(cycles) = cli.cycles {
        builder = builder.max_cycles(cycles);
    }
    let config = builder.build()?;

    info!(
        version = env!("CARGO_PKG_VERSION"),
        device = %config.device_path().display(),
        "Starting watchdog keep-alive"
    );

    let mut supervisor = Supervisor::new(config);
    install_signal_handlers(&supervisor.shutdown_signal())
        .context("failed to route SIGINT/SIGTERM to the supervisor")?;

    Ok(supervise(&mut supervisor)?)
}

#[cfg(target_os = "linux")]
fn supervise(supervisor: &mut Supervisor) -> SupervisorResult<RunReport> {
    supervisor.run()
}

#[cfg(not(target_os = "linux"))]
fn supervise(supervisor: &mut Supervisor) -> SupervisorResult<RunReport> {
    use watchdogdev::{DeviceError, SoftwareWatchdog};

    supervisor.run_with(|path| {
        Err::<SoftwareWatchdog, _>(DeviceError::unavailable(
            path,
            std::io::Error::from(std::io::ErrorKind::Unsupported),
        ))
    })
}
