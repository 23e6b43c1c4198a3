//! Activation functions applied to a neuron's summed input

use crate::error::RuntimeError;
use core::fmt;
use core::str::FromStr;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Steepness of the exponential sigmoid
pub const SIGMOID_STEEPNESS: f32 = 10.0;

/// Per-neuron activation function selector
///
/// The discriminants are the on-disk codes used by the persistence and
/// embedded export formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "kebab-case"))]
#[repr(u8)]
pub enum ActivationFunction {
    /// `1.0` if `o >= t`, else `0.0`
    #[default]
    Step = 0,
    /// `1 / (1 + exp(beta * (t - o)))`
    #[cfg_attr(feature = "serde", serde(alias = "sigmoid"))]
    ExpSigmoid = 1,
    /// Piecewise-linear sigmoid with the same centre and centre slope as `ExpSigmoid`
    ApproxSigmoid = 2,
    /// `o` clamped to `[0, 1]`
    Linear = 3,
}

impl ActivationFunction {
    /// All functions in code order
    pub const ALL: [ActivationFunction; 4] = [
        ActivationFunction::Step,
        ActivationFunction::ExpSigmoid,
        ActivationFunction::ApproxSigmoid,
        ActivationFunction::Linear,
    ];

    /// Stable numeric code
    pub const fn code(self) -> u8 {
        self as u8
    }

    /// Decode a numeric code, `None` for unknown codes
    pub const fn from_code(code: u8) -> Option<Self> {
        match code {
            0 => Some(Self::Step),
            1 => Some(Self::ExpSigmoid),
            2 => Some(Self::ApproxSigmoid),
            3 => Some(Self::Linear),
            _ => None,
        }
    }

    /// Short lowercase name
    pub const fn name(self) -> &'static str {
        match self {
            Self::Step => "step",
            Self::ExpSigmoid => "sigmoid",
            Self::ApproxSigmoid => "approx-sigmoid",
            Self::Linear => "linear",
        }
    }

    /// Apply the function to summed input `o` against threshold `t`
    #[inline]
    pub fn apply(self, o: f32, t: f32) -> f32 {
        match self {
            Self::Step => {
                if o >= t {
                    1.0
                } else {
                    0.0
                }
            }
            Self::ExpSigmoid => 1.0 / (1.0 + (SIGMOID_STEEPNESS * (t - o)).exp()),
            Self::ApproxSigmoid => (0.5 + 0.25 * SIGMOID_STEEPNESS * (o - t)).clamp(0.0, 1.0),
            Self::Linear => o.clamp(0.0, 1.0),
        }
    }
}

/// Evaluate a raw function code; unknown codes yield `0.0`
#[inline]
pub fn evaluate(code: u8, o: f32, t: f32) -> f32 {
    match ActivationFunction::from_code(code) {
        Some(function) => function.apply(o, t),
        None => 0.0,
    }
}

impl fmt::Display for ActivationFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ActivationFunction {
    type Err = RuntimeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('_', "-").as_str() {
            "step" => Ok(Self::Step),
            "sigmoid" | "exp-sigmoid" => Ok(Self::ExpSigmoid),
            "approx-sigmoid" | "sigmoid-step" => Ok(Self::ApproxSigmoid),
            "linear" => Ok(Self::Linear),
            _ => Err(RuntimeError::invalid_parameter(
                "activation_function",
                s,
                "step | sigmoid | approx-sigmoid | linear",
            )),
        }
    }
}
