//! Sampling strategies for whole input vectors.
//!
//! A run samples its input vectors in exactly one of two ways:
//!
//! - [`SamplingStrategy::Independent`]: one [`DistributionSpec`] per dimension
//! - [`SamplingStrategy::Correlated`]: one [`CorrelatedSpec`] for all
//!   dimensions jointly
//!
//! Both produce rows in a flat row-major buffer through [`RowSampler`],
//! which is built once per run after validation.

use crate::correlation::{CorrelatedSampler, CorrelatedSpec};
use crate::distributions::{DistributionSpec, DEFAULT_MAX_REJECTION_ATTEMPTS};
use crate::error::{ConfigError, CoreError};
use crate::rng::SimRng;
use serde::{Deserialize, Serialize};

/// How input vectors are drawn for a run.
///
/// Deserialises from a table tagged by `method`:
///
/// ```
/// use risk_core::sampling::SamplingStrategy;
///
/// let strategy: SamplingStrategy = toml::from_str(r#"
///     method = "independent"
///
///     [[dimensions]]
///     kind = "beta"
///     alpha = 5.5
///     beta = 9.0
///
///     [[dimensions]]
///     kind = "triangular"
///     min = 0.45
///     mode = 0.75
///     max = 0.95
/// "#).unwrap();
///
/// assert_eq!(strategy.dims(), 2);
/// assert_eq!(strategy.method_name(), "independent");
/// ```
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "method", rename_all = "snake_case")]
pub enum SamplingStrategy {
    /// Each dimension sampled from its own distribution.
    Independent {
        /// One distribution per dimension, in input-vector order.
        dimensions: Vec<DistributionSpec>,
    },
    /// All dimensions drawn jointly from a clipped multivariate normal.
    Correlated(CorrelatedSpec),
}

impl SamplingStrategy {
    /// Validated independent strategy.
    pub fn independent(dimensions: Vec<DistributionSpec>) -> Result<Self, ConfigError> {
        let strategy = Self::Independent { dimensions };
        strategy.validate()?;
        Ok(strategy)
    }

    /// Validated correlated strategy.
    pub fn correlated(spec: CorrelatedSpec) -> Result<Self, ConfigError> {
        let strategy = Self::Correlated(spec);
        strategy.validate()?;
        Ok(strategy)
    }

    /// Number of input dimensions.
    pub fn dims(&self) -> usize {
        match self {
            Self::Independent { dimensions } => dimensions.len(),
            Self::Correlated(spec) => spec.dims(),
        }
    }

    /// Method name recorded in run metadata.
    pub fn method_name(&self) -> &'static str {
        match self {
            Self::Independent { .. } => "independent",
            Self::Correlated(_) => "correlated",
        }
    }

    /// The correlated spec, if this strategy uses one.
    pub fn correlated_spec(&self) -> Option<&CorrelatedSpec> {
        match self {
            Self::Independent { .. } => None,
            Self::Correlated(spec) => Some(spec),
        }
    }

    /// Validates every component of the strategy.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.row_sampler(DEFAULT_MAX_REJECTION_ATTEMPTS).map(|_| ())
    }

    /// Builds a validated row sampler.
    ///
    /// `max_attempts` caps rejection attempts per truncated normal draw.
    pub fn row_sampler(&self, max_attempts: usize) -> Result<RowSampler, ConfigError> {
        if max_attempts == 0 {
            return Err(ConfigError::InvalidParameter {
                name: "max_attempts",
                value: "must be at least 1".to_string(),
            });
        }
        match self {
            Self::Independent { dimensions } => {
                if dimensions.is_empty() {
                    return Err(ConfigError::EmptyStrategy);
                }
                for spec in dimensions {
                    spec.validate()?;
                }
                Ok(RowSampler::Independent {
                    dimensions: dimensions.clone(),
                    max_attempts,
                })
            }
            Self::Correlated(spec) => Ok(RowSampler::Correlated(spec.sampler()?)),
        }
    }

    /// Draws `n` rows (flat row-major) with the default rejection budget.
    pub fn sample(&self, n: usize, rng: &mut SimRng) -> Result<Vec<f64>, CoreError> {
        let sampler = self.row_sampler(DEFAULT_MAX_REJECTION_ATTEMPTS)?;
        let mut rows = vec![0.0; n * sampler.dims()];
        sampler.fill_rows(&mut rows, rng)?;
        Ok(rows)
    }
}

/// Validated, ready-to-draw form of a [`SamplingStrategy`].
#[derive(Clone, Debug)]
pub enum RowSampler {
    /// Column-by-column draws from independent distributions.
    Independent {
        /// Per-dimension distributions.
        dimensions: Vec<DistributionSpec>,
        /// Rejection budget per draw.
        max_attempts: usize,
    },
    /// Joint draws from a factorised covariance.
    Correlated(CorrelatedSampler),
}

impl RowSampler {
    /// Number of columns per row.
    pub fn dims(&self) -> usize {
        match self {
            Self::Independent { dimensions, .. } => dimensions.len(),
            Self::Correlated(sampler) => sampler.dims(),
        }
    }

    /// Fills a row-major buffer whose length is a multiple of `dims`.
    ///
    /// Independent strategies draw each column in turn for the whole buffer,
    /// so the consumption order of the generator is column-major within one
    /// call.
    ///
    /// # Errors
    ///
    /// - `ConfigError::EmptyStrategy` for a sampler without dimensions
    /// - `ConfigError::InvalidDimensions` for a misaligned buffer
    /// - `SamplingError` if a rejection budget is exhausted
    pub fn fill_rows(&self, rows: &mut [f64], rng: &mut SimRng) -> Result<(), CoreError> {
        let dims = self.dims();
        if dims == 0 {
            return Err(ConfigError::EmptyStrategy.into());
        }
        if rows.len() % dims != 0 {
            return Err(ConfigError::InvalidDimensions {
                expected: (rows.len() / dims + 1) * dims,
                got: rows.len(),
            }
            .into());
        }

        match self {
            Self::Independent {
                dimensions,
                max_attempts,
            } => {
                let n_rows = rows.len() / dims;
                let mut column = vec![0.0; n_rows];
                for (d, spec) in dimensions.iter().enumerate() {
                    spec.fill(&mut column, rng, *max_attempts)?;
                    for (row, value) in rows.chunks_exact_mut(dims).zip(&column) {
                        row[d] = *value;
                    }
                }
            }
            Self::Correlated(sampler) => sampler.fill_rows(rows, rng),
        }
        Ok(())
    }
}
