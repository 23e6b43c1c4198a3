//! Random-network timing

use cann_runtime::{Consistency, IdleStrategy, Network, NetworkConfig, RandomInit};
use clap::Args;
use serde::Serialize;
use std::time::Instant;
use tracing::info;

use crate::config::CliConfig;
use crate::error::{CliError, CliResult};

/// Time a random network
#[derive(Args, Debug)]
pub struct BenchCommand {
    /// Neuron count
    #[arg(short, long, default_value_t = 1000)]
    pub neurons: usize,

    /// Incoming connections per neuron
    #[arg(long, default_value_t = 25)]
    pub connections: usize,

    /// Draw each synapse with this probability instead
    #[arg(long, value_name = "RATE", conflicts_with = "connections")]
    pub connrate: Option<f32>,

    /// Ticks to run
    #[arg(short, long, default_value_t = 1)]
    pub ticks: u32,

    /// Worker count (overrides the config file)
    #[arg(short, long)]
    pub workers: Option<usize>,

    /// Cross-partition consistency
    #[arg(long)]
    pub consistency: Option<Consistency>,

    /// Idle strategy of waiting workers
    #[arg(long)]
    pub idle: Option<IdleStrategy>,

    /// Give three quarters of the neurons a modulatory connection
    #[arg(long)]
    pub learning: bool,

    /// RNG seed
    #[arg(long, default_value_t = 1)]
    pub seed: u64,

    /// Print a JSON report instead of text
    #[arg(long)]
    pub json: bool,
}

/// Timing summary
#[derive(Debug, Serialize)]
pub struct BenchReport {
    /// Neuron count
    pub neurons: usize,
    /// Non-zero synapses
    pub connections: usize,
    /// Per-synapse connection probability, when used
    #[serde(skip_serializing_if = "Option::is_none")]
    pub connection_rate: Option<f32>,
    /// Live workers
    pub workers: usize,
    /// Ticks executed
    pub ticks: u32,
    /// Seconds spent building the network
    pub setup_seconds: f64,
    /// Mean seconds per tick
    pub seconds_per_tick: f64,
    /// Bytes held by the network
    pub memory_usage: usize,
}

impl BenchCommand {
    /// Build, run and report
    pub fn execute(self, config: &CliConfig) -> CliResult<()> {
        if self.ticks == 0 {
            return Err(CliError::invalid_args("--ticks must be at least 1"));
        }
        let scheduler = config.scheduler(self.workers, self.consistency, self.idle);

        let started = Instant::now();
        let mut net = Network::new(
            NetworkConfig::new(self.neurons, self.neurons / 3, 0).with_scheduler(scheduler),
        )?;
        if self.learning {
            net.set_learning_rate(1.0);
        }
        let init = RandomInit {
            connections_per_neuron: Some(self.connections),
            connection_rate: self.connrate,
            mod_fraction: if self.learning { 0.75 } else { 0.0 },
            seed: Some(self.seed),
            ..RandomInit::default()
        };
        init.apply(&mut net)?;
        let setup_seconds = started.elapsed().as_secs_f64();
        info!("Built {}-neuron network in {:.3}s", self.neurons, setup_seconds);

        let started = Instant::now();
        net.run(self.ticks);
        let seconds_per_tick = started.elapsed().as_secs_f64() / self.ticks as f64;

        let report = BenchReport {
            neurons: net.size(),
            connections: net.snapshot().weights.iter().filter(|&&w| w != 0.0).count(),
            connection_rate: self.connrate,
            workers: net.scheduler().worker_count(),
            ticks: self.ticks,
            setup_seconds,
            seconds_per_tick,
            memory_usage: net.memory_usage(),
        };

        if self.json {
            println!("{}", serde_json::to_string_pretty(&report)?);
        } else {
            println!("neurons:      {}", report.neurons);
            match report.connection_rate {
                Some(rate) => println!("connections:  {} (rate {})", report.connections, rate),
                None => println!(
                    "connections:  {} ({} per neuron)",
                    report.connections, self.connections
                ),
            }
            println!("workers:      {}", report.workers);
            println!("ticks:        {}", report.ticks);
            println!("time/tick:    {:.6}s", report.seconds_per_tick);
            println!("memory usage: {} bytes", report.memory_usage);
        }
        Ok(())
    }
}
