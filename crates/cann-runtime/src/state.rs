//! Per-neuron and per-synapse network state
//!
//! All arrays are fixed at construction. Index arguments outside
//! `[0, size)` never panic: reads return a neutral default (`0.0`, or index
//! `0` for modulatory targets) and writes are ignored.
//!
//! Cells are shared with the partition workers and are read and written
//! without locks (see [`crate::scheduler`]).

use crate::activation::ActivationFunction;
use crate::atomic::{cells, AtomicF32};
use crate::error::{Result, RuntimeError};
use std::sync::atomic::{AtomicU32, AtomicU8, Ordering};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Number of Hebbian coefficients per neuron
pub const GAMMA_COUNT: usize = 4;

/// Shared network state
#[derive(Debug)]
pub struct NetworkState {
    size: usize,
    num_inputs: usize,
    num_outputs: usize,
    learning_rate: AtomicF32,
    /// Row-major, `weights[i * size + j]` is the synapse from `j` into `i`
    weights: Box<[AtomicF32]>,
    thresholds: Box<[AtomicF32]>,
    activations: Box<[AtomicF32]>,
    functions: Box<[AtomicU8]>,
    gammas: Box<[[AtomicF32; GAMMA_COUNT]]>,
    mod_targets: Box<[AtomicU32]>,
    mod_weights: Box<[AtomicF32]>,
    inputs: Box<[AtomicF32]>,
}

impl NetworkState {
    /// Allocate a zeroed network
    ///
    /// Every neuron starts with threshold `0.0`, activation `0.0`, the
    /// `Step` function, zero gammas and an inert modulatory connection onto
    /// itself.
    pub fn new(size: usize, num_inputs: usize, num_outputs: usize) -> Self {
        let num_inputs = num_inputs.min(size);
        let num_outputs = num_outputs.min(size);
        Self {
            size,
            num_inputs,
            num_outputs,
            learning_rate: AtomicF32::new(0.0),
            weights: cells(size * size, 0.0),
            thresholds: cells(size, 0.0),
            activations: cells(size, 0.0),
            functions: (0..size)
                .map(|_| AtomicU8::new(ActivationFunction::Step.code()))
                .collect(),
            gammas: (0..size).map(|_| Default::default()).collect(),
            mod_targets: (0..size as u32).map(AtomicU32::new).collect(),
            mod_weights: cells(size, 0.0),
            inputs: cells(num_inputs, 0.0),
        }
    }

    /// Neuron count
    pub fn size(&self) -> usize {
        self.size
    }

    /// Length of the clamped input prefix
    pub fn num_inputs(&self) -> usize {
        self.num_inputs
    }

    /// Length of the read-out suffix
    pub fn num_outputs(&self) -> usize {
        self.num_outputs
    }

    /// Global plasticity multiplier
    pub fn learning_rate(&self) -> f32 {
        self.learning_rate.load()
    }

    /// Set the global plasticity multiplier
    pub fn set_learning_rate(&self, value: f32) {
        self.learning_rate.store(value);
    }

    /// Hebbian coefficient `k` of neuron `i`
    ///
    /// An out-of-range neuron reads as `0.0`; an out-of-range coefficient is
    /// an error the caller is expected to record.
    pub fn gamma(&self, i: usize, k: usize) -> Result<f32> {
        if k >= GAMMA_COUNT {
            return Err(RuntimeError::GammaIndex { index: k });
        }
        Ok(self.gammas.get(i).map_or(0.0, |g| g[k].load()))
    }

    /// Set Hebbian coefficient `k` of neuron `i`
    pub fn set_gamma(&self, i: usize, k: usize, value: f32) -> Result<()> {
        if k >= GAMMA_COUNT {
            return Err(RuntimeError::GammaIndex { index: k });
        }
        if let Some(g) = self.gammas.get(i) {
            g[k].store(value);
        }
        Ok(())
    }

    /// All four coefficients of neuron `i`
    pub fn gammas(&self, i: usize) -> [f32; GAMMA_COUNT] {
        match self.gammas.get(i) {
            Some(g) => [g[0].load(), g[1].load(), g[2].load(), g[3].load()],
            None => [0.0; GAMMA_COUNT],
        }
    }

    /// Synaptic strength from `j` into `i`
    pub fn weight(&self, i: usize, j: usize) -> f32 {
        self.weight_cell(i, j).map_or(0.0, AtomicF32::load)
    }

    /// Set the synaptic strength from `j` into `i`
    pub fn set_weight(&self, i: usize, j: usize, value: f32) {
        if let Some(cell) = self.weight_cell(i, j) {
            cell.store(value);
        }
    }

    /// Copy of the incoming weight row of neuron `i`
    pub fn weight_row(&self, i: usize) -> Vec<f32> {
        self.row(i).map_or_else(Vec::new, |row| row.iter().map(AtomicF32::load).collect())
    }

    /// Firing threshold of neuron `i`
    pub fn threshold(&self, i: usize) -> f32 {
        self.thresholds.get(i).map_or(0.0, AtomicF32::load)
    }

    /// Set the firing threshold of neuron `i`
    pub fn set_threshold(&self, i: usize, value: f32) {
        if let Some(cell) = self.thresholds.get(i) {
            cell.store(value);
        }
    }

    /// Current activation of neuron `i`
    pub fn activation(&self, i: usize) -> f32 {
        self.activations.get(i).map_or(0.0, AtomicF32::load)
    }

    /// Overwrite the activation of neuron `i`
    pub fn set_activation(&self, i: usize, value: f32) {
        if let Some(cell) = self.activations.get(i) {
            cell.store(value);
        }
    }

    /// Copy of the whole activation vector
    pub fn activations(&self) -> Vec<f32> {
        self.activations.iter().map(AtomicF32::load).collect()
    }

    /// Raw activation function code of neuron `i` (`Step` when out of range)
    pub fn activation_function_code(&self, i: usize) -> u8 {
        self.functions
            .get(i)
            .map_or(ActivationFunction::Step.code(), |c| c.load(Ordering::Relaxed))
    }

    /// Activation function of neuron `i`, `None` if out of range or the
    /// stored code is unknown
    pub fn activation_function(&self, i: usize) -> Option<ActivationFunction> {
        self.functions
            .get(i)
            .and_then(|c| ActivationFunction::from_code(c.load(Ordering::Relaxed)))
    }

    /// Set the activation function of neuron `i`
    pub fn set_activation_function(&self, i: usize, function: ActivationFunction) {
        self.set_activation_function_code(i, function.code());
    }

    /// Store a raw activation function code; unknown codes evaluate to `0.0`
    pub fn set_activation_function_code(&self, i: usize, code: u8) {
        if let Some(cell) = self.functions.get(i) {
            cell.store(code, Ordering::Relaxed);
        }
    }

    /// Modulatory source neuron of neuron `i` (`0` when out of range)
    pub fn mod_target(&self, i: usize) -> usize {
        self.mod_targets
            .get(i)
            .map_or(0, |t| t.load(Ordering::Relaxed) as usize)
    }

    /// Modulatory weight of neuron `i`
    pub fn mod_weight(&self, i: usize) -> f32 {
        self.mod_weights.get(i).map_or(0.0, AtomicF32::load)
    }

    /// Route neuron `j`'s activation into neuron `i`'s plasticity
    ///
    /// The stored weight is `learning_rate * weight` using the learning rate
    /// current at call time; later learning-rate changes do not rescale it.
    pub fn set_mod(&self, i: usize, j: usize, weight: f32) {
        if i < self.size && j < self.size {
            self.mod_targets[i].store(j as u32, Ordering::Relaxed);
            self.mod_weights[i].store(self.learning_rate() * weight);
        }
    }

    /// Copy the externally supplied input values
    pub fn set_inputs(&self, values: &[f32]) -> Result<()> {
        if values.len() != self.num_inputs {
            return Err(RuntimeError::InputLength {
                expected: self.num_inputs,
                found: values.len(),
            });
        }
        for (cell, &v) in self.inputs.iter().zip(values) {
            cell.store(v);
        }
        Ok(())
    }

    /// Current input buffer
    pub fn inputs(&self) -> Vec<f32> {
        self.inputs.iter().map(AtomicF32::load).collect()
    }

    /// Input value clamped onto neuron `i` (`0.0` outside the input prefix)
    pub fn input(&self, i: usize) -> f32 {
        self.inputs.get(i).map_or(0.0, AtomicF32::load)
    }

    /// Activations of the last `num_outputs` neurons
    pub fn outputs(&self) -> Vec<f32> {
        self.activations[self.size - self.num_outputs..]
            .iter()
            .map(AtomicF32::load)
            .collect()
    }

    /// Bytes held by the state arrays
    pub fn memory_usage(&self) -> usize {
        let f = core::mem::size_of::<AtomicF32>();
        core::mem::size_of::<Self>()
            + self.weights.len() * f
            + (self.thresholds.len() + self.activations.len() + self.mod_weights.len()) * f
            + self.inputs.len() * f
            + self.gammas.len() * GAMMA_COUNT * f
            + self.functions.len() * core::mem::size_of::<AtomicU8>()
            + self.mod_targets.len() * core::mem::size_of::<AtomicU32>()
    }

    /// Copy every array out as plain data
    pub fn snapshot(&self) -> NetworkSnapshot {
        let load = |cells: &[AtomicF32]| cells.iter().map(AtomicF32::load).collect::<Vec<_>>();
        NetworkSnapshot {
            size: self.size,
            learning_rate: self.learning_rate(),
            num_inputs: self.num_inputs,
            num_outputs: self.num_outputs,
            gammas: (0..self.size).map(|i| self.gammas(i)).collect(),
            weights: load(&self.weights),
            thresholds: load(&self.thresholds),
            activations: load(&self.activations),
            mod_weights: load(&self.mod_weights),
            inputs: load(&self.inputs),
            activation_functions: self
                .functions
                .iter()
                .map(|c| c.load(Ordering::Relaxed))
                .collect(),
            mod_targets: self
                .mod_targets
                .iter()
                .map(|t| t.load(Ordering::Relaxed))
                .collect(),
        }
    }

    /// Overwrite every array from a snapshot of identical dimensions
    pub fn restore(&self, snapshot: &NetworkSnapshot) -> Result<()> {
        snapshot.validate()?;
        if snapshot.size != self.size
            || snapshot.num_inputs != self.num_inputs
            || snapshot.num_outputs != self.num_outputs
        {
            return Err(RuntimeError::invalid_config(format!(
                "snapshot dimensions {}/{}/{} do not match network {}/{}/{}",
                snapshot.size,
                snapshot.num_inputs,
                snapshot.num_outputs,
                self.size,
                self.num_inputs,
                self.num_outputs
            )));
        }

        let store = |cells: &[AtomicF32], values: &[f32]| {
            for (cell, &v) in cells.iter().zip(values) {
                cell.store(v);
            }
        };
        self.set_learning_rate(snapshot.learning_rate);
        store(&self.weights, &snapshot.weights);
        store(&self.thresholds, &snapshot.thresholds);
        store(&self.activations, &snapshot.activations);
        store(&self.mod_weights, &snapshot.mod_weights);
        store(&self.inputs, &snapshot.inputs);
        for (cells, values) in self.gammas.iter().zip(&snapshot.gammas) {
            store(cells, values);
        }
        for (cell, &code) in self.functions.iter().zip(&snapshot.activation_functions) {
            cell.store(code, Ordering::Relaxed);
        }
        for (cell, &target) in self.mod_targets.iter().zip(&snapshot.mod_targets) {
            cell.store(target, Ordering::Relaxed);
        }
        Ok(())
    }

    #[inline]
    fn weight_cell(&self, i: usize, j: usize) -> Option<&AtomicF32> {
        if i < self.size && j < self.size {
            Some(&self.weights[i * self.size + j])
        } else {
            None
        }
    }

    #[inline]
    pub(crate) fn row(&self, i: usize) -> Option<&[AtomicF32]> {
        if i < self.size {
            Some(&self.weights[i * self.size..(i + 1) * self.size])
        } else {
            None
        }
    }

    #[inline]
    pub(crate) fn activation_cell(&self, i: usize) -> Option<&AtomicF32> {
        self.activations.get(i)
    }
}

/// Owned copy of the complete network state
///
/// This is the raw-array interface used by persistence: every field is a
/// flat array in the same order as the on-disk layout.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct NetworkSnapshot {
    /// Neuron count
    pub size: usize,
    /// Global plasticity multiplier
    pub learning_rate: f32,
    /// Length of the clamped input prefix
    pub num_inputs: usize,
    /// Length of the read-out suffix
    pub num_outputs: usize,
    /// Hebbian coefficients per neuron
    pub gammas: Vec<[f32; GAMMA_COUNT]>,
    /// Row-major weight matrix, `size * size` entries
    pub weights: Vec<f32>,
    /// Thresholds per neuron
    pub thresholds: Vec<f32>,
    /// Activations per neuron
    pub activations: Vec<f32>,
    /// Modulatory weights per neuron
    pub mod_weights: Vec<f32>,
    /// Input buffer, `num_inputs` entries
    pub inputs: Vec<f32>,
    /// Raw activation function codes per neuron
    pub activation_functions: Vec<u8>,
    /// Modulatory source indices per neuron
    pub mod_targets: Vec<u32>,
}

impl NetworkSnapshot {
    /// Check array lengths and index ranges against the declared dimensions
    pub fn validate(&self) -> Result<()> {
        let n = self.size;
        if n == 0 {
            return Err(RuntimeError::invalid_parameter("size", "0", ">= 1"));
        }
        if self.num_inputs > n || self.num_outputs > n {
            return Err(RuntimeError::invalid_config(format!(
                "inputs {} / outputs {} exceed size {}",
                self.num_inputs, self.num_outputs, n
            )));
        }

        let lengths = [
            ("gammas", self.gammas.len(), n),
            ("weights", self.weights.len(), n * n),
            ("thresholds", self.thresholds.len(), n),
            ("activations", self.activations.len(), n),
            ("mod_weights", self.mod_weights.len(), n),
            ("inputs", self.inputs.len(), self.num_inputs),
            ("activation_functions", self.activation_functions.len(), n),
            ("mod_targets", self.mod_targets.len(), n),
        ];
        for (name, found, expected) in lengths {
            if found != expected {
                return Err(RuntimeError::invalid_parameter(
                    name,
                    format!("{} entries", found),
                    format!("{} entries", expected),
                ));
            }
        }

        if let Some((i, &t)) = self
            .mod_targets
            .iter()
            .enumerate()
            .find(|(_, &t)| t as usize >= n)
        {
            return Err(RuntimeError::invalid_parameter(
                format!("mod_targets[{}]", i),
                t.to_string(),
                format!("< {}", n),
            ));
        }
        Ok(())
    }
}
