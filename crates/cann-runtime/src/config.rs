//! Network and scheduler configuration

use crate::error::{Result, RuntimeError};
use core::fmt;
use core::str::FromStr;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Cross-partition consistency within a single `run(n)` call
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "kebab-case"))]
pub enum Consistency {
    /// Partitions advance independently between `run` boundaries and may
    /// read each other's state from a different tick index.
    #[default]
    Relaxed,
    /// Partitions meet at a barrier after every tick. Within a partition
    /// updates stay Gauss–Seidel; neurons of other partitions are read as
    /// they stood at the end of the previous tick.
    ///
    /// Repeated runs from the same state with the same partition layout are
    /// bit-identical. They differ from a single-worker run whenever
    /// partitions are connected.
    Barriered,
}

/// How idle workers and the waiting caller spend their time
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "kebab-case"))]
pub enum IdleStrategy {
    /// Poll the pending counter and yield the processor between polls
    #[default]
    Yield,
    /// Block on a condition variable until work or completion is signalled
    Park,
}

/// Scheduler parameters
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct SchedulerConfig {
    /// Requested worker count, including the calling (primary) worker
    pub workers: usize,
    /// Cross-partition consistency mode
    pub consistency: Consistency,
    /// Idle behaviour of secondary workers and of the waiting caller
    pub idle: IdleStrategy,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            workers: 1,
            consistency: Consistency::Relaxed,
            idle: IdleStrategy::Yield,
        }
    }
}

impl SchedulerConfig {
    /// Worker count actually used for a network of `size` neurons
    pub fn effective_workers(&self, size: usize) -> usize {
        self.workers.clamp(1, size.max(1))
    }
}

/// Fixed dimensions of a network plus its scheduler parameters
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct NetworkConfig {
    /// Neuron count
    pub size: usize,
    /// Length of the clamped input prefix
    pub num_inputs: usize,
    /// Length of the read-out suffix
    pub num_outputs: usize,
    /// Scheduler parameters
    #[cfg_attr(feature = "serde", serde(default))]
    pub scheduler: SchedulerConfig,
}

impl NetworkConfig {
    /// Create a configuration with the default single-worker scheduler
    pub fn new(size: usize, num_inputs: usize, num_outputs: usize) -> Self {
        Self {
            size,
            num_inputs,
            num_outputs,
            scheduler: SchedulerConfig::default(),
        }
    }

    /// Set the requested worker count
    pub fn with_workers(mut self, workers: usize) -> Self {
        self.scheduler.workers = workers;
        self
    }

    /// Set the consistency mode
    pub fn with_consistency(mut self, consistency: Consistency) -> Self {
        self.scheduler.consistency = consistency;
        self
    }

    /// Set the idle strategy
    pub fn with_idle(mut self, idle: IdleStrategy) -> Self {
        self.scheduler.idle = idle;
        self
    }

    /// Replace the whole scheduler configuration
    pub fn with_scheduler(mut self, scheduler: SchedulerConfig) -> Self {
        self.scheduler = scheduler;
        self
    }

    /// Validate dimensions
    ///
    /// Input and output ranges may overlap; that is reported at debug level
    /// and otherwise accepted.
    pub fn validate(&self) -> Result<()> {
        if self.size == 0 {
            return Err(RuntimeError::invalid_parameter("size", "0", ">= 1"));
        }
        if self.size > u32::MAX as usize {
            return Err(RuntimeError::invalid_parameter(
                "size",
                self.size.to_string(),
                "<= u32::MAX",
            ));
        }
        if self.num_inputs > self.size {
            return Err(RuntimeError::invalid_parameter(
                "num_inputs",
                format!("{} (with size={})", self.num_inputs, self.size),
                "<= size",
            ));
        }
        if self.num_outputs > self.size {
            return Err(RuntimeError::invalid_parameter(
                "num_outputs",
                format!("{} (with size={})", self.num_outputs, self.size),
                "<= size",
            ));
        }
        if self.num_inputs + self.num_outputs > self.size {
            log::debug!(
                "input prefix [0, {}) overlaps output suffix [{}, {})",
                self.num_inputs,
                self.size - self.num_outputs,
                self.size
            );
        }
        Ok(())
    }
}

impl fmt::Display for Consistency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Relaxed => f.write_str("relaxed"),
            Self::Barriered => f.write_str("barriered"),
        }
    }
}

impl FromStr for Consistency {
    type Err = RuntimeError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "relaxed" => Ok(Self::Relaxed),
            "barriered" | "barrier" => Ok(Self::Barriered),
            _ => Err(RuntimeError::invalid_parameter("consistency", s, "relaxed | barriered")),
        }
    }
}

impl fmt::Display for IdleStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Yield => f.write_str("yield"),
            Self::Park => f.write_str("park"),
        }
    }
}

impl FromStr for IdleStrategy {
    type Err = RuntimeError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "yield" => Ok(Self::Yield),
            "park" => Ok(Self::Park),
            _ => Err(RuntimeError::invalid_parameter("idle", s, "yield | park")),
        }
    }
}
