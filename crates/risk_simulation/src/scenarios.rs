//! Named stress scenarios, what-if shifts and one-dimensional sweeps.
//!
//! These evaluate the oracle at chosen points instead of sampled ones:
//!
//! - [`evaluate_scenarios`] scores a list of named input vectors
//! - [`shift`] derives a what-if vector by moving one factor
//! - [`sweep_dimension`] / [`evaluate_sweep`] walk one factor across
//!   `[0, 1]` and report where the decision label changes

use crate::error::SimulationError;
use crate::oracle::{Decision, Oracle, Outcome};
use risk_core::ConfigError;
use serde::{Deserialize, Serialize};

/// Default number of sweep steps (21 points).
pub const DEFAULT_SWEEP_STEPS: usize = 20;

/// A named input vector.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Scenario {
    /// Short identifier.
    pub name: String,
    /// What the scenario represents.
    pub description: String,
    /// Input vector.
    pub inputs: Vec<f64>,
}

impl Scenario {
    /// Creates a scenario.
    pub fn new(name: impl Into<String>, description: impl Into<String>, inputs: Vec<f64>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            inputs,
        }
    }

    /// Derived scenario with dimension `dim` moved by `delta`.
    ///
    /// # Examples
    /// ```
    /// use risk_simulation::scenarios::Scenario;
    ///
    /// let base = Scenario::new("base", "current estimate", vec![0.38, 0.86, 0.75]);
    /// let hostile = base
    ///     .shifted("judge_hostile", "procedural advantage reduced", 1, -0.36)
    ///     .unwrap();
    /// assert!((hostile.inputs[1] - 0.5).abs() < 1e-12);
    /// assert_eq!(hostile.inputs[0], 0.38);
    /// ```
    pub fn shifted(
        &self,
        name: impl Into<String>,
        description: impl Into<String>,
        dim: usize,
        delta: f64,
    ) -> Result<Self, ConfigError> {
        Ok(Self::new(name, description, shift(&self.inputs, dim, delta)?))
    }
}

/// A scenario and the outcome it produced.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ScenarioResult {
    /// The evaluated scenario.
    pub scenario: Scenario,
    /// Oracle outcome.
    pub outcome: Outcome,
}

/// Standard stress points for `dims` factors: all at 1, all at 0, all at 0.5.
pub fn preset_scenarios(dims: usize) -> Vec<Scenario> {
    vec![
        Scenario::new("perfect_case", "All factors maximised", vec![1.0; dims]),
        Scenario::new("worst_case", "All factors minimised", vec![0.0; dims]),
        Scenario::new("neutral", "All factors at the midpoint", vec![0.5; dims]),
    ]
}

/// Evaluates scenarios in order. The first oracle failure aborts with the
/// scenario's position as index.
pub fn evaluate_scenarios<O: Oracle>(
    oracle: &O,
    scenarios: &[Scenario],
) -> Result<Vec<ScenarioResult>, SimulationError> {
    scenarios
        .iter()
        .enumerate()
        .map(|(index, scenario)| {
            let outcome = oracle
                .evaluate(&scenario.inputs)
                .map_err(|e| SimulationError::oracle(index, e))?;
            Ok(ScenarioResult {
                scenario: scenario.clone(),
                outcome,
            })
        })
        .collect()
}

/// Copy of `inputs` with dimension `dim` moved by `delta`, clamped to `[0, 1]`.
///
/// # Errors
///
/// `InvalidParameter` if `dim` is out of range or `delta` is not finite.
pub fn shift(inputs: &[f64], dim: usize, delta: f64) -> Result<Vec<f64>, ConfigError> {
    check_dim(inputs, dim)?;
    if !delta.is_finite() {
        return Err(ConfigError::InvalidParameter {
            name: "delta",
            value: format!("must be finite, got {}", delta),
        });
    }
    let mut shifted = inputs.to_vec();
    shifted[dim] = (shifted[dim] + delta).clamp(0.0, 1.0);
    Ok(shifted)
}

fn check_dim(inputs: &[f64], dim: usize) -> Result<(), ConfigError> {
    if dim >= inputs.len() {
        return Err(ConfigError::InvalidParameter {
            name: "dim",
            value: format!("{} out of range for {} dimensions", dim, inputs.len()),
        });
    }
    Ok(())
}

/// `steps + 1` copies of `base` with dimension `dim` set to `i / steps`.
///
/// # Errors
///
/// `InvalidParameter` if `dim` is out of range or `steps` is zero.
pub fn sweep_dimension(
    base: &[f64],
    dim: usize,
    steps: usize,
) -> Result<Vec<Vec<f64>>, ConfigError> {
    check_dim(base, dim)?;
    if steps == 0 {
        return Err(ConfigError::InvalidParameter {
            name: "steps",
            value: "must be at least 1".to_string(),
        });
    }
    Ok((0..=steps)
        .map(|i| {
            let mut point = base.to_vec();
            point[dim] = i as f64 / steps as f64;
            point
        })
        .collect())
}

/// One evaluated sweep point.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct SweepPoint {
    /// Value of the swept dimension.
    pub value: f64,
    /// Oracle outcome at this point.
    pub outcome: Outcome,
}

/// A change of decision label between two adjacent sweep points.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct DecisionTransition {
    /// Last value with the old label.
    pub before: f64,
    /// First value with the new label.
    pub after: f64,
    /// Old label.
    pub from: Decision,
    /// New label.
    pub to: Decision,
}

/// Evaluated sweep with its label transitions.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SweepResult {
    /// Swept dimension.
    pub dim: usize,
    /// Points in ascending order of the swept value.
    pub points: Vec<SweepPoint>,
    /// Label changes, in ascending order.
    pub transitions: Vec<DecisionTransition>,
}

/// Sweeps dimension `dim` of `base` and evaluates every point.
pub fn evaluate_sweep<O: Oracle>(
    oracle: &O,
    base: &[f64],
    dim: usize,
    steps: usize,
) -> Result<SweepResult, SimulationError> {
    let grid = sweep_dimension(base, dim, steps)?;

    let points = grid
        .iter()
        .enumerate()
        .map(|(index, point)| {
            let outcome = oracle
                .evaluate(point)
                .map_err(|e| SimulationError::oracle(index, e))?;
            Ok(SweepPoint {
                value: point[dim],
                outcome,
            })
        })
        .collect::<Result<Vec<_>, SimulationError>>()?;

    let transitions = points
        .windows(2)
        .filter(|w| w[0].outcome.decision != w[1].outcome.decision)
        .map(|w| DecisionTransition {
            before: w[0].value,
            after: w[1].value,
            from: w[0].outcome.decision,
            to: w[1].outcome.decision,
        })
        .collect();

    Ok(SweepResult {
        dim,
        points,
        transitions,
    })
}
