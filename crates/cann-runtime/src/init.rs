//! Random weight initialization

use crate::error::{Result, RuntimeError};
use crate::network::Network;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Parameters for filling a network with random weights
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct RandomInit {
    /// Lower bound of the uniform weight distribution
    pub weight_min: f32,
    /// Upper bound of the uniform weight distribution
    pub weight_max: f32,
    /// Incoming connections per neuron, taken from the lowest source
    /// indices; `None` fills the whole row
    pub connections_per_neuron: Option<usize>,
    /// Probability that each synapse is drawn; takes precedence over
    /// `connections_per_neuron`
    pub connection_rate: Option<f32>,
    /// Fraction of neurons given a random modulatory neuron
    pub mod_fraction: f32,
    /// Lower bound of the modulatory weight
    pub mod_weight_min: f32,
    /// Upper bound of the modulatory weight
    pub mod_weight_max: f32,
    /// RNG seed; `None` seeds from the OS
    pub seed: Option<u64>,
}

impl Default for RandomInit {
    fn default() -> Self {
        Self {
            weight_min: -1.0,
            weight_max: 1.0,
            connections_per_neuron: None,
            connection_rate: None,
            mod_fraction: 0.0,
            mod_weight_min: -1.0,
            mod_weight_max: 1.0,
            seed: None,
        }
    }
}

impl RandomInit {
    /// Dense uniform weights in `[-1, 1]` with the given seed
    pub fn seeded(seed: u64) -> Self {
        Self {
            seed: Some(seed),
            ..Self::default()
        }
    }

    /// Validate the distribution bounds
    pub fn validate(&self) -> Result<()> {
        if !(self.weight_min <= self.weight_max) {
            return Err(RuntimeError::invalid_parameter(
                "weight_max",
                self.weight_max.to_string(),
                format!(">= weight_min ({})", self.weight_min),
            ));
        }
        if !(self.mod_weight_min <= self.mod_weight_max) {
            return Err(RuntimeError::invalid_parameter(
                "mod_weight_max",
                self.mod_weight_max.to_string(),
                format!(">= mod_weight_min ({})", self.mod_weight_min),
            ));
        }
        if let Some(rate) = self.connection_rate {
            if !(0.0..=1.0).contains(&rate) {
                return Err(RuntimeError::invalid_parameter(
                    "connection_rate",
                    rate.to_string(),
                    "in [0.0, 1.0]",
                ));
            }
        }
        if !(0.0..=1.0).contains(&self.mod_fraction) {
            return Err(RuntimeError::invalid_parameter(
                "mod_fraction",
                self.mod_fraction.to_string(),
                "in [0.0, 1.0]",
            ));
        }
        Ok(())
    }

    /// Overwrite the weights (and optionally modulatory connections) of
    /// every neuron
    ///
    /// Modulatory weights go through [`Network::set_mod`], so they are scaled
    /// by the network's current learning rate.
    pub fn apply(&self, network: &mut Network) -> Result<()> {
        self.validate()?;
        let mut rng = match self.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        let size = network.size();
        let connections = self.connections_per_neuron.unwrap_or(size).min(size);
        let mut drawn = 0usize;
        for i in 0..size {
            for j in 0..size {
                let connected = match self.connection_rate {
                    Some(rate) => rng.gen::<f32>() < rate,
                    None => j < connections,
                };
                let w = if connected {
                    drawn += 1;
                    self.sample(&mut rng, self.weight_min, self.weight_max)
                } else {
                    0.0
                };
                network.set_weight(i, j, w);
            }
        }

        if self.mod_fraction > 0.0 {
            for i in 0..size {
                if rng.gen::<f32>() < self.mod_fraction {
                    let source = rng.gen_range(0..size);
                    let weight = self.sample(&mut rng, self.mod_weight_min, self.mod_weight_max);
                    network.set_mod(i, source, weight);
                }
            }
        }

        log::debug!(
            "Randomized {} neurons ({} of {} synapses drawn, mod fraction {})",
            size,
            drawn,
            size * size,
            self.mod_fraction
        );
        Ok(())
    }

    fn sample(&self, rng: &mut StdRng, min: f32, max: f32) -> f32 {
        if min < max {
            rng.gen_range(min..max)
        } else {
            min
        }
    }
}
