//! Oracle interface and decision types.
//!
//! The engine treats the scoring function as a black box: it maps one input
//! vector to an [`Outcome`] and may fail. Anything implementing [`Oracle`]
//! can be driven, including plain closures:
//!
//! ```
//! use risk_simulation::oracle::{Decision, Oracle, Outcome};
//! use std::convert::Infallible;
//!
//! let oracle = |x: &[f64]| -> Result<Outcome, Infallible> {
//!     let score = x.iter().sum::<f64>() / x.len() as f64;
//!     Ok(Outcome::new(Decision::Hold, score, score * 10.0))
//! };
//! let outcome = oracle.evaluate(&[0.2, 0.4]).unwrap();
//! assert_eq!(outcome.decision, Decision::Hold);
//! ```
//!
//! [`WeightedThresholdOracle`] is a reference implementation: a weighted sum
//! followed by a threshold lookup.

use risk_core::ConfigError;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Decision label produced by an oracle.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Decision {
    /// Proceed as proposed.
    Accept,
    /// Proceed with a counter-proposal.
    Counter,
    /// Do not proceed.
    Reject,
    /// Defer.
    Hold,
}

impl Decision {
    /// Every label, in canonical order.
    pub const ALL: [Decision; 4] = [
        Decision::Accept,
        Decision::Counter,
        Decision::Reject,
        Decision::Hold,
    ];

    /// Upper-case label.
    pub fn as_str(&self) -> &'static str {
        match self {
            Decision::Accept => "ACCEPT",
            Decision::Counter => "COUNTER",
            Decision::Reject => "REJECT",
            Decision::Hold => "HOLD",
        }
    }
}

impl fmt::Display for Decision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of one oracle evaluation.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Outcome {
    /// Decision label.
    pub decision: Decision,
    /// Primary score (lower is worse).
    pub primary: f64,
    /// Secondary score (higher is worse).
    pub secondary: f64,
}

impl Outcome {
    /// Creates an outcome.
    #[inline]
    pub fn new(decision: Decision, primary: f64, secondary: f64) -> Self {
        Self {
            decision,
            primary,
            secondary,
        }
    }
}

/// Deterministic scoring function evaluated once per sample.
///
/// Implementations must be `Sync`: parallel evaluation shares one oracle
/// across worker threads.
pub trait Oracle: Sync {
    /// Failure type; preserved as the source of the run's error.
    type Error: std::error::Error + Send + Sync + 'static;

    /// Scores one input vector.
    fn evaluate(&self, inputs: &[f64]) -> Result<Outcome, Self::Error>;
}

impl<F, E> Oracle for F
where
    F: Fn(&[f64]) -> Result<Outcome, E> + Sync,
    E: std::error::Error + Send + Sync + 'static,
{
    type Error = E;

    #[inline]
    fn evaluate(&self, inputs: &[f64]) -> Result<Outcome, E> {
        self(inputs)
    }
}

/// Inputs the reference oracle refuses to score.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum OracleInputError {
    /// Wrong number of input factors.
    #[error("Expected {expected} inputs, got {got}")]
    WrongDimension {
        /// Number of weights.
        expected: usize,
        /// Length of the input vector.
        got: usize,
    },

    /// An input factor outside `[0, 1]`.
    #[error("Input {index} is {value}, must be in [0, 1]")]
    OutOfRange {
        /// Input position.
        index: usize,
        /// Offending value.
        value: f64,
    },
}

/// Score cut-offs for [`WeightedThresholdOracle`].
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct DecisionThresholds {
    /// Scores below this are `Reject`.
    pub reject_below: f64,
    /// Scores below this (and not rejected) are `Counter`.
    pub counter_below: f64,
    /// Scores at or above this are `Accept`; everything between
    /// `counter_below` and here is `Hold`.
    pub accept_at: f64,
}

impl Default for DecisionThresholds {
    fn default() -> Self {
        Self {
            reject_below: 0.30,
            counter_below: 0.50,
            accept_at: 0.85,
        }
    }
}

impl DecisionThresholds {
    /// Maps a primary score to its label.
    pub fn classify(&self, score: f64) -> Decision {
        if score < self.reject_below {
            Decision::Reject
        } else if score < self.counter_below {
            Decision::Counter
        } else if score < self.accept_at {
            Decision::Hold
        } else {
            Decision::Accept
        }
    }
}

/// Default factor weights.
pub const DEFAULT_WEIGHTS: [f64; 3] = [0.40, 0.35, 0.25];

/// Default primary-to-secondary multiplier.
pub const DEFAULT_SECONDARY_MULTIPLIER: f64 = 10.0;

fn round_to(value: f64, decimals: i32) -> f64 {
    let scale = 10f64.powi(decimals);
    (value * scale).round() / scale
}

/// Weighted-sum oracle with a threshold decision table.
///
/// - primary = Σ wᵢ·xᵢ, rounded to 3 decimals
/// - secondary = primary × multiplier, rounded to 2 decimals
/// - decision from [`DecisionThresholds`]
///
/// # Examples
/// ```
/// use risk_simulation::oracle::{Decision, Oracle, WeightedThresholdOracle};
///
/// let oracle = WeightedThresholdOracle::default();
/// let outcome = oracle.evaluate(&[0.35, 0.85, 0.75]).unwrap();
///
/// assert_eq!(outcome.primary, 0.625);
/// assert_eq!(outcome.secondary, 6.25);
/// assert_eq!(outcome.decision, Decision::Hold);
/// ```
#[derive(Clone, Debug, PartialEq)]
pub struct WeightedThresholdOracle {
    weights: Vec<f64>,
    multiplier: f64,
    thresholds: DecisionThresholds,
}

impl Default for WeightedThresholdOracle {
    fn default() -> Self {
        Self {
            weights: DEFAULT_WEIGHTS.to_vec(),
            multiplier: DEFAULT_SECONDARY_MULTIPLIER,
            thresholds: DecisionThresholds::default(),
        }
    }
}

impl WeightedThresholdOracle {
    /// Creates an oracle with custom weights and the default thresholds.
    ///
    /// # Errors
    ///
    /// `InvalidParameter` if `weights` is empty or contains non-finite
    /// values, or if `multiplier` is not finite.
    pub fn new(weights: Vec<f64>, multiplier: f64) -> Result<Self, ConfigError> {
        if weights.is_empty() {
            return Err(ConfigError::InvalidParameter {
                name: "weights",
                value: "must not be empty".to_string(),
            });
        }
        if let Some(w) = weights.iter().find(|w| !w.is_finite()) {
            return Err(ConfigError::InvalidParameter {
                name: "weights",
                value: format!("must be finite, got {}", w),
            });
        }
        if !multiplier.is_finite() {
            return Err(ConfigError::InvalidParameter {
                name: "multiplier",
                value: format!("must be finite, got {}", multiplier),
            });
        }
        Ok(Self {
            weights,
            multiplier,
            thresholds: DecisionThresholds::default(),
        })
    }

    /// Replaces the decision thresholds.
    pub fn with_thresholds(mut self, thresholds: DecisionThresholds) -> Self {
        self.thresholds = thresholds;
        self
    }

    /// Number of input factors expected.
    pub fn dims(&self) -> usize {
        self.weights.len()
    }

    /// Factor weights.
    pub fn weights(&self) -> &[f64] {
        &self.weights
    }

    /// Decision thresholds.
    pub fn thresholds(&self) -> &DecisionThresholds {
        &self.thresholds
    }
}

impl Oracle for WeightedThresholdOracle {
    type Error = OracleInputError;

    fn evaluate(&self, inputs: &[f64]) -> Result<Outcome, OracleInputError> {
        if inputs.len() != self.weights.len() {
            return Err(OracleInputError::WrongDimension {
                expected: self.weights.len(),
                got: inputs.len(),
            });
        }
        if let Some((index, &value)) = inputs
            .iter()
            .enumerate()
            .find(|(_, x)| !(0.0..=1.0).contains(*x))
        {
            return Err(OracleInputError::OutOfRange { index, value });
        }

        let weighted: f64 = self.weights.iter().zip(inputs).map(|(w, x)| w * x).sum();
        let primary = round_to(weighted, 3);
        let secondary = round_to(primary * self.multiplier, 2);

        Ok(Outcome::new(
            self.thresholds.classify(primary),
            primary,
            secondary,
        ))
    }
}
