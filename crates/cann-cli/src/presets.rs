//! Built-in logic-gate networks
//!
//! Input neurons are `0` and `1`; the output is the last neuron. All gates
//! settle within a single tick on one worker.

use cann_runtime::{Network, NetworkConfig};
use clap::ValueEnum;

use crate::error::CliResult;

/// Logic-gate preset
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Preset {
    /// Fires if either input is high
    Or,
    /// Fires only if both inputs are high
    And,
    /// Fires if exactly one input is high (one hidden neuron)
    Xor,
}

impl Preset {
    /// Build the gate
    pub fn build(self) -> CliResult<Network> {
        let net = match self {
            Self::Or => gate(1.0)?,
            Self::And => gate(2.0)?,
            Self::Xor => {
                let mut net = Network::new(NetworkConfig::new(4, 2, 1))?;
                input_thresholds(&mut net);
                // hidden AND neuron
                net.set_threshold(2, 2.0);
                net.set_weight(2, 0, 1.0);
                net.set_weight(2, 1, 1.0);
                // OR that is vetoed by the AND
                net.set_threshold(3, 1.0);
                net.set_weight(3, 0, 1.0);
                net.set_weight(3, 1, 1.0);
                net.set_weight(3, 2, -2.0);
                net
            }
        };
        Ok(net)
    }
}

fn input_thresholds(net: &mut Network) {
    net.set_threshold(0, 0.5);
    net.set_threshold(1, 0.5);
}

fn gate(threshold: f32) -> CliResult<Network> {
    let mut net = Network::new(NetworkConfig::new(3, 2, 1))?;
    input_thresholds(&mut net);
    net.set_threshold(2, threshold);
    net.set_weight(2, 0, 1.0);
    net.set_weight(2, 1, 1.0);
    Ok(net)
}
