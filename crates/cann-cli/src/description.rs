//! TOML network descriptions for `cann create --from`
//!
//! ```toml
//! size = 3
//! inputs = 1
//! outputs = 1
//! learning_rate = 0.0
//!
//! [[synapse]]
//! from = 0
//! to = 1
//! weight = 1.0
//!
//! [[neuron]]
//! index = 1
//! threshold = 0.5
//! activation = "step"
//! ```

use anyhow::Context;
use cann_runtime::{ActivationFunction, Network, NetworkConfig, RandomInit, GAMMA_COUNT};
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::{CliError, CliResult};

/// Whole-network description
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NetworkDescription {
    /// Neuron count
    pub size: usize,
    /// Length of the clamped input prefix
    #[serde(default)]
    pub inputs: usize,
    /// Length of the read-out suffix
    #[serde(default)]
    pub outputs: usize,
    /// Global plasticity multiplier, applied before any modulatory connection
    #[serde(default)]
    pub learning_rate: f32,
    /// Optional random weights, applied before explicit synapses
    #[serde(default)]
    pub random: Option<RandomInit>,
    /// Explicit synapses
    #[serde(default, rename = "synapse")]
    pub synapses: Vec<SynapseDescription>,
    /// Per-neuron overrides
    #[serde(default, rename = "neuron")]
    pub neurons: Vec<NeuronDescription>,
}

/// One synapse, `from` feeding into `to`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SynapseDescription {
    /// Source neuron
    pub from: usize,
    /// Target neuron
    pub to: usize,
    /// Strength
    pub weight: f32,
}

/// Per-neuron settings; omitted fields keep their defaults
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NeuronDescription {
    /// Neuron index
    pub index: usize,
    /// Firing threshold
    pub threshold: Option<f32>,
    /// Activation function
    pub activation: Option<ActivationFunction>,
    /// Hebbian coefficients
    pub gamma: Option<[f32; GAMMA_COUNT]>,
    /// Modulatory connection
    #[serde(rename = "mod")]
    pub modulation: Option<ModDescription>,
}

/// Modulatory connection of a neuron
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModDescription {
    /// Neuron whose activation gates plasticity
    pub source: usize,
    /// Weight before learning-rate scaling
    pub weight: f32,
}

impl NetworkDescription {
    /// Read a description file
    pub fn load(path: &Path) -> CliResult<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("reading network description {}", path.display()))?;
        let description = toml::from_str(&content)
            .with_context(|| format!("parsing network description {}", path.display()))?;
        Ok(description)
    }

    /// Reject indices outside the network
    pub fn validate(&self) -> CliResult<()> {
        let check = |what: &str, index: usize| {
            if index >= self.size {
                Err(CliError::config(format!(
                    "{} index {} is outside a {}-neuron network",
                    what, index, self.size
                )))
            } else {
                Ok(())
            }
        };
        for s in &self.synapses {
            check("synapse source", s.from)?;
            check("synapse target", s.to)?;
        }
        for n in &self.neurons {
            check("neuron", n.index)?;
            if let Some(m) = &n.modulation {
                check("modulatory source", m.source)?;
            }
        }
        Ok(())
    }

    /// Build the described network
    pub fn build(&self, config: NetworkConfig) -> CliResult<Network> {
        self.validate()?;
        let mut net = Network::new(config)?;
        net.set_learning_rate(self.learning_rate);

        if let Some(random) = &self.random {
            random.apply(&mut net)?;
        }
        for s in &self.synapses {
            net.set_weight(s.to, s.from, s.weight);
        }
        for n in &self.neurons {
            if let Some(t) = n.threshold {
                net.set_threshold(n.index, t);
            }
            if let Some(f) = n.activation {
                net.set_activation_function(n.index, f);
            }
            if let Some(g) = n.gamma {
                net.set_gammas(n.index, g);
            }
            if let Some(m) = &n.modulation {
                net.set_mod(n.index, m.source, m.weight);
            }
        }
        Ok(net)
    }

    /// Dimensions as a network configuration
    pub fn network_config(&self) -> NetworkConfig {
        NetworkConfig::new(self.size, self.inputs, self.outputs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const THREE: &str = r#"
        size = 3
        inputs = 1
        outputs = 1
        learning_rate = 0.5

        [[synapse]]
        from = 0
        to = 1
        weight = 1.0

        [[neuron]]
        index = 1
        threshold = 0.5
        activation = "linear"
        gamma = [0.1, 0.0, 0.0, 0.0]
        mod = { source = 2, weight = 2.0 }
    "#;

    #[test]
    fn test_parse_and_build() {
        let desc: NetworkDescription = toml::from_str(THREE).unwrap();
        let net = desc.build(desc.network_config()).unwrap();
        assert_eq!(net.weight(1, 0), 1.0);
        assert_eq!(net.threshold(1), 0.5);
        assert_eq!(net.activation_function(1), Some(ActivationFunction::Linear));
        assert_eq!(net.gamma(1, 0), 0.1);
        assert_eq!(net.mod_connection(1), (2, 1.0));
    }

    #[test]
    fn test_out_of_range_index_rejected() {
        let desc: NetworkDescription = toml::from_str(
            r#"
            size = 2
            [[synapse]]
            from = 0
            to = 5
            weight = 1.0
            "#,
        )
        .unwrap();
        assert!(desc.build(desc.network_config()).is_err());
    }

    #[test]
    fn test_load_errors_name_the_file() {
        let dir = tempfile::tempdir().unwrap();

        let missing = dir.path().join("missing.toml");
        let err = NetworkDescription::load(&missing).unwrap_err();
        assert!(matches!(err, CliError::Generic(_)));
        assert!(err.to_string().contains("missing.toml"), "{}", err);

        let broken = dir.path().join("broken.toml");
        std::fs::write(&broken, "size = \"three\"").unwrap();
        let err = NetworkDescription::load(&broken).unwrap_err().to_string();
        assert!(err.contains("parsing network description"), "{}", err);
        assert!(err.contains("broken.toml"), "{}", err);

        let good = dir.path().join("three.toml");
        std::fs::write(&good, THREE).unwrap();
        assert_eq!(NetworkDescription::load(&good).unwrap().size, 3);
    }
}
