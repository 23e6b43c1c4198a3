//! Network facade
//!
//! [`Network`] ties the shared [`NetworkState`] to its [`Scheduler`] and is
//! the entry point used by persistence, the CLI and the C ABI.

use crate::activation::ActivationFunction;
use crate::config::{NetworkConfig, SchedulerConfig};
use crate::error::{Result, RuntimeError};
use crate::scheduler::{spawn_named, Partition, Scheduler, Spawner};
use crate::state::{NetworkSnapshot, NetworkState, GAMMA_COUNT};
use parking_lot::Mutex;
use std::sync::Arc;

/// Fixed-size recurrent network with its worker pool
#[derive(Debug)]
pub struct Network {
    config: NetworkConfig,
    state: Arc<NetworkState>,
    scheduler: Scheduler,
    last_error: Mutex<Option<RuntimeError>>,
}

impl Network {
    /// Allocate a zeroed network and start its workers
    ///
    /// Fails only on invalid dimensions. A worker that cannot be started
    /// reduces the effective worker count and is reported through
    /// [`Network::last_error`].
    pub fn new(config: NetworkConfig) -> Result<Self> {
        Self::with_spawner(config, &mut spawn_named)
    }

    pub(crate) fn with_spawner(config: NetworkConfig, spawner: &mut Spawner) -> Result<Self> {
        config.validate()?;
        let state = Arc::new(NetworkState::new(
            config.size,
            config.num_inputs,
            config.num_outputs,
        ));
        let scheduler = Scheduler::with_spawner(Arc::clone(&state), &config.scheduler, spawner);
        let last_error = scheduler.spawn_errors().last().cloned();

        log::debug!(
            "Created network: {} neurons, {} inputs, {} outputs, {} workers",
            config.size,
            config.num_inputs,
            config.num_outputs,
            scheduler.worker_count()
        );

        Ok(Self {
            config,
            state,
            scheduler,
            last_error: Mutex::new(last_error),
        })
    }

    /// Build a network from a snapshot, replacing every array wholesale
    pub fn from_snapshot(snapshot: &NetworkSnapshot, scheduler: SchedulerConfig) -> Result<Self> {
        snapshot.validate()?;
        let config = NetworkConfig::new(snapshot.size, snapshot.num_inputs, snapshot.num_outputs)
            .with_scheduler(scheduler);
        let network = Self::new(config)?;
        network.state.restore(snapshot)?;
        Ok(network)
    }

    /// Configuration the network was built with
    pub fn config(&self) -> &NetworkConfig {
        &self.config
    }

    /// Shared state
    pub fn state(&self) -> &NetworkState {
        &self.state
    }

    /// Worker pool
    pub fn scheduler(&self) -> &Scheduler {
        &self.scheduler
    }

    /// Partition layout in index order
    pub fn partitions(&self) -> Vec<Partition> {
        self.scheduler.partitions()
    }

    /// Neuron count
    pub fn size(&self) -> usize {
        self.state.size()
    }

    /// Length of the clamped input prefix
    pub fn num_inputs(&self) -> usize {
        self.state.num_inputs()
    }

    /// Length of the read-out suffix
    pub fn num_outputs(&self) -> usize {
        self.state.num_outputs()
    }

    /// Bytes held by the network arrays
    pub fn memory_usage(&self) -> usize {
        self.state.memory_usage() + core::mem::size_of::<Self>()
    }

    /// Advance every neuron by `ticks` ticks
    pub fn run(&mut self, ticks: u32) {
        self.scheduler.run(ticks);
    }

    /// Global plasticity multiplier
    pub fn learning_rate(&self) -> f32 {
        self.state.learning_rate()
    }

    /// Set the global plasticity multiplier
    pub fn set_learning_rate(&mut self, value: f32) {
        self.state.set_learning_rate(value);
    }

    /// Hebbian coefficient `k` of neuron `i`
    ///
    /// `k >= 4` records an error and returns `0.0`.
    pub fn gamma(&self, i: usize, k: usize) -> f32 {
        match self.state.gamma(i, k) {
            Ok(value) => value,
            Err(e) => {
                self.record(e);
                0.0
            }
        }
    }

    /// Set Hebbian coefficient `k` of neuron `i`
    ///
    /// `k >= 4` records an error and changes nothing.
    pub fn set_gamma(&mut self, i: usize, k: usize, value: f32) {
        if let Err(e) = self.state.set_gamma(i, k, value) {
            self.record(e);
        }
    }

    /// All coefficients of neuron `i`
    pub fn gammas(&self, i: usize) -> [f32; GAMMA_COUNT] {
        self.state.gammas(i)
    }

    /// Set all coefficients of neuron `i`
    pub fn set_gammas(&mut self, i: usize, gammas: [f32; GAMMA_COUNT]) {
        for (k, value) in gammas.into_iter().enumerate() {
            self.set_gamma(i, k, value);
        }
    }

    /// Synaptic strength from `j` into `i`
    pub fn weight(&self, i: usize, j: usize) -> f32 {
        self.state.weight(i, j)
    }

    /// Set the synaptic strength from `j` into `i`
    pub fn set_weight(&mut self, i: usize, j: usize, value: f32) {
        self.state.set_weight(i, j, value);
    }

    /// Firing threshold of neuron `i`
    pub fn threshold(&self, i: usize) -> f32 {
        self.state.threshold(i)
    }

    /// Set the firing threshold of neuron `i`
    pub fn set_threshold(&mut self, i: usize, value: f32) {
        self.state.set_threshold(i, value);
    }

    /// Current activation of neuron `i`
    pub fn activation(&self, i: usize) -> f32 {
        self.state.activation(i)
    }

    /// Overwrite the activation of neuron `i`
    pub fn set_activation(&mut self, i: usize, value: f32) {
        self.state.set_activation(i, value);
    }

    /// Copy of the whole activation vector
    pub fn activations(&self) -> Vec<f32> {
        self.state.activations()
    }

    /// Activation function of neuron `i`
    pub fn activation_function(&self, i: usize) -> Option<ActivationFunction> {
        self.state.activation_function(i)
    }

    /// Set the activation function of neuron `i`
    pub fn set_activation_function(&mut self, i: usize, function: ActivationFunction) {
        self.state.set_activation_function(i, function);
    }

    /// Modulatory connection of neuron `i` as `(source, weight)`
    pub fn mod_connection(&self, i: usize) -> (usize, f32) {
        (self.state.mod_target(i), self.state.mod_weight(i))
    }

    /// Route neuron `j`'s activation into neuron `i`'s plasticity
    ///
    /// The stored weight is scaled by the learning rate current at call time.
    pub fn set_mod(&mut self, i: usize, j: usize, weight: f32) {
        self.state.set_mod(i, j, weight);
    }

    /// Copy exactly `num_inputs` values into the input buffer
    pub fn set_inputs(&mut self, values: &[f32]) -> Result<()> {
        self.state.set_inputs(values)
    }

    /// Current input buffer
    pub fn inputs(&self) -> Vec<f32> {
        self.state.inputs()
    }

    /// Activations of the last `num_outputs` neurons
    pub fn outputs(&self) -> Vec<f32> {
        self.state.outputs()
    }

    /// Owned copy of the complete state
    pub fn snapshot(&self) -> NetworkSnapshot {
        self.state.snapshot()
    }

    /// Overwrite the complete state from a snapshot of the same dimensions
    pub fn restore(&mut self, snapshot: &NetworkSnapshot) -> Result<()> {
        self.state.restore(snapshot)
    }

    /// Most recent recoverable error, if any
    pub fn last_error(&self) -> Option<RuntimeError> {
        self.last_error.lock().clone()
    }

    /// Forget the recorded error
    pub fn clear_error(&self) {
        *self.last_error.lock() = None;
    }

    fn record(&self, error: RuntimeError) {
        log::warn!("{}", error);
        *self.last_error.lock() = Some(error);
    }
}
