use std::time::Duration;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use intake_roller::config::{CMD_TIMEOUT, LOOP_HZ, MAX_LOOP_HZ};
use intake_roller::runtime::RunOptions;

/// Intake roller runtime: drives the roller from zenoh commands
#[derive(Parser, Debug)]
#[command(version, about)]
struct Args {
    /// Control loop rate in Hz
    #[arg(
        long,
        default_value_t = LOOP_HZ,
        value_parser = clap::value_parser!(u64).range(1..=MAX_LOOP_HZ)
    )]
    loop_hz: u64,

    /// Stop the roller if no command arrives within this many milliseconds
    #[arg(long, default_value_t = CMD_TIMEOUT.as_millis() as u64)]
    cmd_timeout_ms: u64,

    /// Default log level when RUST_LOG is unset
    #[arg(long, default_value = "info")]
    log_level: String,
}

#[tokio::main]
async fn main() {
    let args = Args::parse();

    // Setup logging (RUST_LOG takes precedence over --log-level)
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&args.log_level));
    tracing_subscriber::fmt().with_env_filter(filter).init(); // installs the subscriber globally

    let options = RunOptions {
        loop_hz: args.loop_hz,
        cmd_timeout: Duration::from_millis(args.cmd_timeout_ms),
    };

    if let Err(e) = intake_roller::runtime::run(options).await {
        eprintln!("Runtime error: {}", e);
        std::process::exit(1);
    }
}
