//! Recurrent network runtime
//!
//! A fixed-topology network of neurons joined by a dense weight matrix. Each
//! neuron has a threshold, an activation function and a local Hebbian rule
//! gated by one modulatory neuron. [`Network::run`] advances every neuron by
//! whole ticks, spread over a fixed pool of partition workers.
//!
//! ```
//! use cann_runtime::{Network, NetworkConfig};
//!
//! let mut net = Network::new(NetworkConfig::new(3, 1, 1)).unwrap();
//! net.set_weight(1, 0, 1.0);
//! net.set_threshold(1, 0.5);
//! net.set_inputs(&[1.0]).unwrap();
//! net.run(1);
//! assert_eq!(net.activation(1), 1.0);
//! ```

#![deny(missing_docs)]
#![warn(clippy::all)]

mod atomic;

pub mod activation;
pub mod config;
pub mod error;
pub mod init;
pub mod network;
pub mod scheduler;
pub mod state;
pub mod step;

pub use activation::ActivationFunction;
pub use config::{Consistency, IdleStrategy, NetworkConfig, SchedulerConfig};
pub use error::{Result, RuntimeError};
pub use init::RandomInit;
pub use network::Network;
pub use scheduler::{partition_ranges, Partition, Scheduler};
pub use state::{NetworkSnapshot, NetworkState, GAMMA_COUNT};

/// Runtime crate version for compatibility checking
pub const RUNTIME_VERSION: u32 = 1;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_basic_integration() {
        let mut net = Network::new(NetworkConfig::new(4, 1, 1).with_workers(2)).unwrap();
        assert_eq!(net.partitions().len(), 2);
        net.set_inputs(&[1.0]).unwrap();
        net.run(2);
        assert_eq!(net.outputs().len(), 1);
    }
}
