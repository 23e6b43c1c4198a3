//! Network creation

use cann_runtime::{NetworkConfig, RandomInit};
use clap::Args;
use std::path::PathBuf;
use tracing::info;

use crate::config::CliConfig;
use crate::description::NetworkDescription;
use crate::error::{CliError, CliResult};
use crate::presets::Preset;

/// Create a network file
#[derive(Args, Debug)]
pub struct CreateCommand {
    /// Output `.pcn` file
    pub output: PathBuf,

    /// TOML network description
    #[arg(long, conflicts_with_all = ["preset", "size"])]
    pub from: Option<PathBuf>,

    /// Built-in logic gate
    #[arg(long, value_enum, conflicts_with = "size")]
    pub preset: Option<Preset>,

    /// Neuron count of a blank network
    #[arg(long)]
    pub size: Option<usize>,

    /// Input count of a blank network
    #[arg(long, default_value_t = 0, requires = "size")]
    pub inputs: usize,

    /// Output count of a blank network
    #[arg(long, default_value_t = 0, requires = "size")]
    pub outputs: usize,

    /// Global learning rate
    #[arg(long)]
    pub learning_rate: Option<f32>,

    /// Fill weights uniformly from [-1, 1]
    #[arg(long)]
    pub random: bool,

    /// Incoming connections per neuron when randomizing
    #[arg(long, requires = "random")]
    pub connections: Option<usize>,

    /// Seed for --random
    #[arg(long, requires = "random")]
    pub seed: Option<u64>,
}

impl CreateCommand {
    /// Build the network and save it
    pub fn execute(self, _config: &CliConfig) -> CliResult<()> {
        let mut net = if let Some(path) = &self.from {
            info!("Building network from {}", path.display());
            let desc = NetworkDescription::load(path)?;
            desc.build(desc.network_config())?
        } else if let Some(preset) = self.preset {
            info!("Building {:?} preset", preset);
            preset.build()?
        } else if let Some(size) = self.size {
            cann_runtime::Network::new(NetworkConfig::new(size, self.inputs, self.outputs))?
        } else {
            return Err(CliError::invalid_args(
                "one of --from, --preset or --size is required",
            ));
        };

        if let Some(rate) = self.learning_rate {
            net.set_learning_rate(rate);
        }
        if self.random {
            let init = RandomInit {
                connections_per_neuron: self.connections,
                seed: self.seed,
                ..RandomInit::default()
            };
            init.apply(&mut net)?;
        }

        cann_storage::save_to_path(&net, &self.output)?;
        info!(
            "Wrote {}-neuron network ({} inputs, {} outputs) to {}",
            net.size(),
            net.num_inputs(),
            net.num_outputs(),
            self.output.display()
        );
        Ok(())
    }
}
