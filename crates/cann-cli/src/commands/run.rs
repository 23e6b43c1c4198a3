//! Running a stored network

use cann_runtime::{Consistency, IdleStrategy};
use clap::Args;
use serde::Serialize;
use std::path::PathBuf;
use std::time::Instant;
use tracing::{debug, info, warn};

use super::format_values;
use crate::config::CliConfig;
use crate::error::CliResult;

/// Clamp inputs, run ticks and print outputs
#[derive(Args, Debug)]
pub struct RunCommand {
    /// Network `.pcn` file
    pub network: PathBuf,

    /// Ticks to run
    #[arg(short, long, default_value_t = 1)]
    pub ticks: u32,

    /// Comma-separated input values; keeps the stored inputs if omitted
    #[arg(short, long, value_delimiter = ',', allow_hyphen_values = true)]
    pub input: Option<Vec<f32>>,

    /// Worker count (overrides the config file)
    #[arg(short, long)]
    pub workers: Option<usize>,

    /// Cross-partition consistency
    #[arg(long)]
    pub consistency: Option<Consistency>,

    /// Idle strategy of waiting workers
    #[arg(long)]
    pub idle: Option<IdleStrategy>,

    /// Save the network after running
    #[arg(long)]
    pub save: Option<PathBuf>,

    /// Print a JSON report instead of text
    #[arg(long)]
    pub json: bool,

    /// Also print every activation
    #[arg(long)]
    pub all: bool,
}

/// Result of a run
#[derive(Debug, Serialize)]
pub struct RunReport {
    /// Ticks executed
    pub ticks: u32,
    /// Live workers
    pub workers: usize,
    /// Wall time in seconds
    pub seconds: f64,
    /// Output activations
    pub outputs: Vec<f32>,
    /// All activations, with `--all`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub activations: Option<Vec<f32>>,
}

impl RunCommand {
    /// Load, run and report
    pub fn execute(self, config: &CliConfig) -> CliResult<()> {
        let scheduler = config.scheduler(self.workers, self.consistency, self.idle);
        debug!("Scheduler: {:?}", scheduler);
        let mut net = cann_storage::load_from_path(&self.network, scheduler)?;
        if let Some(e) = net.last_error() {
            warn!("{}", e);
        }

        if let Some(values) = &self.input {
            net.set_inputs(values)?;
        }

        let started = Instant::now();
        net.run(self.ticks);
        let seconds = started.elapsed().as_secs_f64();
        info!("Ran {} ticks in {:.6}s", self.ticks, seconds);

        let report = RunReport {
            ticks: self.ticks,
            workers: net.scheduler().worker_count(),
            seconds,
            outputs: net.outputs(),
            activations: self.all.then(|| net.activations()),
        };

        if self.json {
            println!("{}", serde_json::to_string_pretty(&report)?);
        } else {
            println!("outputs: {}", format_values(&report.outputs));
            if let Some(all) = &report.activations {
                println!("activations: {}", format_values(all));
            }
        }

        if let Some(path) = &self.save {
            cann_storage::save_to_path(&net, path)?;
            info!("Saved network to {}", path.display());
        }
        Ok(())
    }
}
