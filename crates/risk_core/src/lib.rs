//! # risk_core: Sampling Foundation for Oracle Risk Simulation
//!
//! ## Layer 1 (Foundation) Role
//!
//! risk_core is the bottom layer of the simulation workspace, providing:
//! - Seeded, per-run random number generation (`rng`)
//! - Single-dimension distributions over the unit interval (`distributions`)
//! - Correlation matrices and PSD-tolerant Cholesky factors (`correlation`)
//! - Whole-vector sampling strategies (`sampling`)
//! - Error types: `ConfigError`, `SamplingError`, `CoreError` (`error`)
//!
//! ## Minimal Dependencies
//!
//! Layer 1 has no dependencies on other workspace crates:
//! - num-traits: generic normal CDF
//! - rand / rand_distr: generators and base distributions
//! - serde: distribution and strategy specs load from configuration files
//! - thiserror: error types
//!
//! ## Usage Examples
//!
//! ```rust
//! use risk_core::{CorrelatedSpec, CorrelationMatrix, SamplingStrategy, SimRng};
//!
//! let corr = CorrelationMatrix::from_rows(&[
//!     vec![1.0, 0.58, 0.42],
//!     vec![0.58, 1.0, 0.49],
//!     vec![0.42, 0.49, 1.0],
//! ])
//! .unwrap();
//! let spec = CorrelatedSpec::new(vec![0.6, 0.65, 0.7], vec![0.12, 0.1, 0.08], corr).unwrap();
//! let strategy = SamplingStrategy::correlated(spec).unwrap();
//!
//! let rows = strategy.sample(500, &mut SimRng::from_seed(7)).unwrap();
//! assert_eq!(rows.len(), 500 * 3);
//! assert!(rows.iter().all(|v| (0.0..=1.0).contains(v)));
//! ```

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

pub mod correlation;
pub mod distributions;
pub mod error;
pub mod normal;
pub mod rng;
pub mod sampling;

pub use correlation::{CholeskyFactor, CorrelatedSampler, CorrelatedSpec, CorrelationMatrix};
pub use distributions::{DistributionSpec, DEFAULT_MAX_REJECTION_ATTEMPTS};
pub use error::{ConfigError, CoreError, SamplingError};
pub use rng::SimRng;
pub use sampling::{RowSampler, SamplingStrategy};
