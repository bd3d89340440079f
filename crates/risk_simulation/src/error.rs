//! Error types for the simulation engine.
//!
//! Every failure surfaces immediately through [`SimulationError`]; nothing is
//! retried or degraded to partial output.

use risk_core::{ConfigError, CoreError, SamplingError};
use thiserror::Error;

/// Boxed oracle failure preserved as an error source.
pub type BoxedOracleError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Settings file or environment problems.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SettingsError {
    /// Reading a settings file failed.
    #[error("IO error: {0}")]
    Io(String),

    /// Settings text is not valid TOML for the expected shape.
    #[error("Parse error: {0}")]
    Parse(String),

    /// One or more settings are out of range.
    #[error("Validation errors: {}", .0.join("; "))]
    Validation(Vec<String>),
}

/// Error returned by simulation entry points.
#[derive(Error, Debug)]
pub enum SimulationError {
    /// Invalid distribution, correlation or strategy parameters.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Drawing inputs failed.
    #[error(transparent)]
    Sampling(#[from] SamplingError),

    /// Invalid run settings.
    #[error(transparent)]
    Settings(#[from] SettingsError),

    /// The oracle rejected a sample; the run is aborted.
    #[error("Oracle failed on sample {index}")]
    Oracle {
        /// Generation index of the failing sample.
        index: usize,
        /// Error returned by the oracle.
        #[source]
        source: BoxedOracleError,
    },

    /// An aggregate broke one of its invariants.
    #[error("Consistency check failed: {0}")]
    Consistency(String),

    /// The run was cancelled; partial results were discarded.
    #[error("Simulation cancelled after {completed} of {requested} samples")]
    Cancelled {
        /// Samples evaluated before cancellation was observed.
        completed: usize,
        /// Samples requested.
        requested: usize,
    },

    /// JSON encoding or decoding failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// CSV export failed.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

impl From<CoreError> for SimulationError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::Config(e) => Self::Config(e),
            CoreError::Sampling(e) => Self::Sampling(e),
        }
    }
}

impl SimulationError {
    /// Wraps an oracle failure with the sample index it occurred at.
    pub fn oracle<E>(index: usize, source: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::Oracle {
            index,
            source: Box::new(source),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as _;

    #[derive(Debug, Error)]
    #[error("oracle down")]
    struct Down;

    #[test]
    fn test_oracle_error_keeps_source() {
        let err = SimulationError::oracle(17, Down);
        assert_eq!(err.to_string(), "Oracle failed on sample 17");
        let source = err.source().expect("source preserved");
        assert_eq!(source.to_string(), "oracle down");
        assert!(source.downcast_ref::<Down>().is_some());
    }

    #[test]
    fn test_core_error_is_flattened() {
        let err: SimulationError = CoreError::from(ConfigError::EmptyStrategy).into();
        assert!(matches!(
            err,
            SimulationError::Config(ConfigError::EmptyStrategy)
        ));
    }

    #[test]
    fn test_settings_validation_display() {
        let err = SettingsError::Validation(vec![
            "n_samples must be at least 1".to_string(),
            "batch_size must be at least 1".to_string(),
        ]);
        let display = err.to_string();
        assert!(display.contains("n_samples"));
        assert!(display.contains("batch_size"));
    }

    #[test]
    fn test_cancelled_display() {
        let err = SimulationError::Cancelled {
            completed: 2000,
            requested: 10_000,
        };
        assert_eq!(
            err.to_string(),
            "Simulation cancelled after 2000 of 10000 samples"
        );
    }
}
