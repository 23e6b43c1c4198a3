//! Network file inspection

use cann_runtime::{ActivationFunction, Network};
use clap::Args;
use std::fs::File;
use std::io::BufReader;
use std::path::PathBuf;
use tracing::info;

use super::format_values;
use crate::config::CliConfig;
use crate::error::CliResult;

/// Show header, partition layout and statistics of a network file
#[derive(Args, Debug)]
pub struct InspectCommand {
    /// Network `.pcn` file
    pub network: PathBuf,

    /// Print the weight matrix row by row
    #[arg(long)]
    pub weights: bool,

    /// Worker count used for the partition layout (overrides the config file)
    #[arg(short, long)]
    pub workers: Option<usize>,
}

impl InspectCommand {
    /// Print the report
    pub fn execute(self, config: &CliConfig) -> CliResult<()> {
        info!("Inspecting {}", self.network.display());
        let header = cann_storage::read_header(BufReader::new(File::open(&self.network)?))?;
        let scheduler = config.scheduler(self.workers, None, None);
        let net = cann_storage::load_from_path(&self.network, scheduler)?;

        println!("format version: {}", header.version);
        println!("neurons:        {}", net.size());
        println!("inputs:         {}", net.num_inputs());
        println!("outputs:        {}", net.num_outputs());
        println!("learning rate:  {}", net.learning_rate());
        println!("memory usage:   {} bytes", net.memory_usage());

        println!("partitions:");
        for (k, p) in net.partitions().iter().enumerate() {
            println!("  #{}: {}..{} ({} neurons)", k, p.start, p.end, p.len());
        }

        println!("activation functions:");
        for (name, count) in function_histogram(&net) {
            if count > 0 {
                println!("  {:<15} {}", name, count);
            }
        }

        let snapshot = net.snapshot();
        let synapses = snapshot.weights.iter().filter(|&&w| w != 0.0).count();
        let modulated = snapshot.mod_weights.iter().filter(|&&w| w != 0.0).count();
        println!("synapses:       {}", synapses);
        println!("modulated:      {}", modulated);

        if self.weights {
            println!("weights (row i = inputs into neuron i):");
            for i in 0..net.size() {
                println!("  {:>4}: {}", i, format_values(&net.state().weight_row(i)));
            }
        }
        Ok(())
    }
}

/// Neuron count per activation function, unknown codes last
fn function_histogram(net: &Network) -> Vec<(&'static str, usize)> {
    let mut counts = [0usize; ActivationFunction::ALL.len() + 1];
    for i in 0..net.size() {
        match net.activation_function(i) {
            Some(f) => counts[f.code() as usize] += 1,
            None => counts[ActivationFunction::ALL.len()] += 1,
        }
    }
    ActivationFunction::ALL
        .iter()
        .map(|f| f.name())
        .chain(std::iter::once("unknown"))
        .zip(counts)
        .collect()
}
