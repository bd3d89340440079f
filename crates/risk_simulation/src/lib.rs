//! # risk_simulation: Monte Carlo Engine for Oracle Decision Stability
//!
//! ## Layer 2 (Engine) Role
//!
//! risk_simulation drives a deterministic scoring function (the *oracle*)
//! over many sampled input vectors and summarises how stable its decisions
//! are:
//! - Oracle interface and decision types (`oracle`)
//! - Run settings from code, TOML or environment (`config`)
//! - Sampling and evaluation pipeline with cancellation (`orchestrator`)
//! - Decision frequencies and distribution statistics (`aggregate`)
//! - Batch-mean convergence diagnostics (`convergence`)
//! - Lowest-primary and highest-secondary rankings (`worst_case`)
//! - Validated, serialisable results (`result`)
//! - Named scenarios, what-if shifts and sweeps (`scenarios`)
//! - Baseline versus candidate comparison (`comparison`)
//!
//! Sampling itself lives in `risk_core`.
//!
//! ## Usage Examples
//!
//! ```rust
//! use risk_core::{DistributionSpec, SamplingStrategy};
//! use risk_simulation::{Decision, Simulator, SimulationConfig, WeightedThresholdOracle};
//!
//! let strategy = SamplingStrategy::independent(vec![
//!     DistributionSpec::uniform(0.3, 0.4).unwrap(),
//!     DistributionSpec::uniform(0.8, 0.9).unwrap(),
//!     DistributionSpec::uniform(0.7, 0.8).unwrap(),
//! ])
//! .unwrap();
//! let config = SimulationConfig::builder().n_samples(100).seed(42).build().unwrap();
//!
//! let result = Simulator::new(config)
//!     .simulate(&strategy, &WeightedThresholdOracle::default())
//!     .unwrap();
//!
//! assert_eq!(result.proportion(Decision::Hold), 1.0);
//! ```
//!
//! ## Logging
//!
//! Stage transitions are emitted as `tracing` debug events and each
//! completed run as an info event. No subscriber is installed here.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

pub mod aggregate;
pub mod comparison;
pub mod config;
pub mod convergence;
pub mod error;
pub mod oracle;
pub mod orchestrator;
pub mod result;
pub mod scenarios;
pub mod worst_case;

pub use comparison::{compare_results, RunComparison};
pub use config::{EvaluationMode, SimulationConfig, SimulationPlan};
pub use error::{SettingsError, SimulationError};
pub use oracle::{Decision, Oracle, Outcome, WeightedThresholdOracle};
pub use orchestrator::{run, CancellationToken, SimulationRun, Simulator};
pub use result::SimulationResult;
