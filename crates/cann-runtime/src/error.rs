//! Error types for the network runtime

use thiserror::Error;

/// Result type for runtime operations
pub type Result<T> = std::result::Result<T, RuntimeError>;

/// Errors that can occur in the network runtime
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RuntimeError {
    /// Invalid network configuration
    #[error("Invalid network configuration: {reason}")]
    InvalidConfiguration {
        /// Reason for invalid configuration
        reason: String,
    },

    /// Invalid parameter value
    #[error("Invalid parameter {parameter}: {value} (expected {constraint})")]
    InvalidParameter {
        /// Parameter name
        parameter: String,
        /// Invalid value
        value: String,
        /// Constraint description
        constraint: String,
    },

    /// Input vector does not match the clamped input prefix
    #[error("Expected {expected} input values, got {found}")]
    InputLength {
        /// Number of input neurons
        expected: usize,
        /// Number of values supplied
        found: usize,
    },

    /// Gamma coefficient index outside `0..4`
    #[error("Invalid gamma index: {index}")]
    GammaIndex {
        /// Offending coefficient index
        index: usize,
    },

    /// A secondary worker thread could not be started
    #[error("Could not start worker #{worker}: {reason}")]
    WorkerSpawn {
        /// Index of the secondary worker
        worker: usize,
        /// Reason reported by the OS
        reason: String,
    },
}

impl RuntimeError {
    /// Create an invalid configuration error
    pub fn invalid_config(reason: impl Into<String>) -> Self {
        Self::InvalidConfiguration {
            reason: reason.into(),
        }
    }

    /// Create an invalid parameter error
    pub fn invalid_parameter(
        parameter: impl Into<String>,
        value: impl Into<String>,
        constraint: impl Into<String>,
    ) -> Self {
        Self::InvalidParameter {
            parameter: parameter.into(),
            value: value.into(),
            constraint: constraint.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_creation() {
        let err = RuntimeError::invalid_config("size must be at least 1");
        assert!(matches!(err, RuntimeError::InvalidConfiguration { .. }));

        let err = RuntimeError::invalid_parameter("workers", "0", ">= 1");
        assert!(matches!(err, RuntimeError::InvalidParameter { .. }));
    }

    #[test]
    fn test_error_display() {
        let err = RuntimeError::GammaIndex { index: 7 };
        assert_eq!(err.to_string(), "Invalid gamma index: 7");

        let err = RuntimeError::InputLength { expected: 2, found: 3 };
        assert!(err.to_string().contains("Expected 2 input values"));
    }
}
