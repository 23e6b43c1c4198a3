//! CLI command implementations for cann

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::config::CliConfig;
use crate::error::CliResult;

pub mod bench;
pub mod create;
pub mod export;
pub mod inspect;
pub mod run;

/// cann - recurrent network simulator
#[derive(Parser, Debug)]
#[command(
    name = "cann",
    version,
    about = "Create, run and export recurrent Hebbian networks",
    long_about = "cann builds fixed-size recurrent networks with per-neuron Hebbian \
                  plasticity, runs them over a pool of partition workers, and stores \
                  them as .pcn files or exports them as .rnn images for embedded controllers."
)]
pub struct CannCli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Configuration file path
    #[arg(short, long, global = true, env = "CANN_CONFIG")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Create a network file
    #[command(alias = "new")]
    Create(create::CreateCommand),

    /// Clamp inputs, run ticks and print outputs
    Run(run::RunCommand),

    /// Show header, partition layout and statistics of a network file
    Inspect(inspect::InspectCommand),

    /// Export a network for embedded controllers
    Export(export::ExportCommand),

    /// Time a random network
    Bench(bench::BenchCommand),
}

impl CannCli {
    /// Execute the CLI command
    pub fn execute(self) -> CliResult<()> {
        let config = CliConfig::resolve(self.config.as_deref())?;

        match self.command {
            Commands::Create(cmd) => cmd.execute(&config),
            Commands::Run(cmd) => cmd.execute(&config),
            Commands::Inspect(cmd) => cmd.execute(&config),
            Commands::Export(cmd) => cmd.execute(&config),
            Commands::Bench(cmd) => cmd.execute(&config),
        }
    }
}

/// Format a float list compactly
pub(crate) fn format_values(values: &[f32]) -> String {
    let items: Vec<String> = values.iter().map(|v| format!("{}", v)).collect();
    format!("[{}]", items.join(", "))
}
