//! Error types for the sampling layer.
//!
//! This module provides:
//! - `ConfigError`: invalid distribution or correlation parameters, raised
//!   before any value is drawn
//! - `SamplingError`: failures during generation (rejection budget exhaustion)
//! - `CoreError`: union of the two, returned by sampling entry points

use thiserror::Error;

/// Configuration error for distributions and correlated sampling.
///
/// These errors are raised during validation, before any sampling starts.
///
/// # Examples
/// ```
/// use risk_core::ConfigError;
///
/// let err = ConfigError::InvalidDistribution {
///     kind: "Beta",
///     reason: "alpha must be > 0, got 0".to_string(),
/// };
/// assert!(err.to_string().contains("Beta"));
/// ```
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    /// Invalid parameter value with name and description.
    #[error("Invalid parameter '{name}': {value}")]
    InvalidParameter {
        /// Parameter name.
        name: &'static str,
        /// Description of the invalid value.
        value: String,
    },

    /// Distribution parameters violate the variant's constraints.
    #[error("Invalid {kind} distribution: {reason}")]
    InvalidDistribution {
        /// Distribution variant name.
        kind: &'static str,
        /// Human-readable reason.
        reason: String,
    },

    /// Matrix or vector has the wrong number of elements.
    #[error("Invalid dimensions: expected {expected} elements, got {got}")]
    InvalidDimensions {
        /// Expected element count.
        expected: usize,
        /// Provided element count.
        got: usize,
    },

    /// Correlation diagonal element is not 1.0.
    #[error("Diagonal element at index {index} is {value}, expected 1.0")]
    InvalidDiagonal {
        /// Diagonal index.
        index: usize,
        /// Offending value.
        value: f64,
    },

    /// Correlation matrix is not symmetric.
    #[error("Correlation matrix is not symmetric at ({i}, {j})")]
    NotSymmetric {
        /// Row index.
        i: usize,
        /// Column index.
        j: usize,
    },

    /// Correlation outside [-1, 1].
    #[error("Correlation at ({i}, {j}) is {value}, must be in [-1, 1]")]
    OutOfRange {
        /// Row index.
        i: usize,
        /// Column index.
        j: usize,
        /// Offending value.
        value: f64,
    },

    /// Covariance D·R·D is not positive semi-definite.
    #[error(
        "Covariance matrix is not positive semi-definite: pivot {pivot:e} at dimension {index}"
    )]
    NotPositiveSemiDefinite {
        /// Dimension at which the factorisation failed.
        index: usize,
        /// Residual pivot (or off-diagonal residual) that broke the factorisation.
        pivot: f64,
    },

    /// A sampling strategy with zero dimensions.
    #[error("Sampling strategy must define at least one dimension")]
    EmptyStrategy,
}

/// Error raised while drawing values.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SamplingError {
    /// Rejection sampling ran out of attempts for a single draw.
    #[error(
        "Rejection sampling exhausted {attempts} attempts without a draw in [{min}, {max}]"
    )]
    RejectionBudgetExhausted {
        /// Attempts made for the failing draw.
        attempts: usize,
        /// Lower acceptance bound.
        min: f64,
        /// Upper acceptance bound.
        max: f64,
    },
}

/// Union of configuration and sampling failures.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CoreError {
    /// Invalid configuration, detected before sampling.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Failure during generation.
    #[error(transparent)]
    Sampling(#[from] SamplingError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_error_display() {
        let err = ConfigError::InvalidParameter {
            name: "n",
            value: "must be positive".to_string(),
        };
        assert_eq!(err.to_string(), "Invalid parameter 'n': must be positive");

        let err = ConfigError::NotSymmetric { i: 0, j: 2 };
        assert!(err.to_string().contains("(0, 2)"));

        let err = ConfigError::NotPositiveSemiDefinite {
            index: 2,
            pivot: -0.5,
        };
        assert!(err.to_string().contains("not positive semi-definite"));
        assert!(err.to_string().contains("dimension 2"));
    }

    #[test]
    fn test_sampling_error_display() {
        let err = SamplingError::RejectionBudgetExhausted {
            attempts: 10,
            min: 0.5,
            max: 1.0,
        };
        assert!(err.to_string().contains("10 attempts"));
        assert!(err.to_string().contains("[0.5, 1]"));
    }

    #[test]
    fn test_core_error_is_transparent() {
        let err: CoreError = ConfigError::EmptyStrategy.into();
        assert_eq!(
            err.to_string(),
            "Sampling strategy must define at least one dimension"
        );
        assert!(matches!(err, CoreError::Config(ConfigError::EmptyStrategy)));
    }
}
