//! # cann - command line interface
//!
//! Create, run, inspect and export recurrent Hebbian networks.

use cann_cli::config::CliConfig;
use cann_cli::CannCli;
use clap::Parser;
use tracing::error;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

fn main() {
    let cli = CannCli::parse();

    // RUST_LOG wins, then -v, then the config file
    let default_level = if cli.verbose {
        "debug".to_string()
    } else {
        CliConfig::resolve(cli.config.as_deref())
            .ok()
            .and_then(|c| c.log_level)
            .unwrap_or_else(|| "info".to_string())
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
        .with(filter)
        .init();

    if let Err(err) = cli.execute() {
        error!("Command failed: {}", err);
        std::process::exit(1);
    }
}
