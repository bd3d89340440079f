//! Side-by-side comparison of two results.
//!
//! Typically a baseline run with independent sampling against a candidate
//! run with correlated sampling over the same marginals. All changes are
//! `candidate - baseline`.

use crate::aggregate::DistributionStats;
use crate::oracle::Decision;
use crate::result::SimulationResult;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Field-by-field change between two [`DistributionStats`].
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct StatsDelta {
    /// Change in mean.
    pub mean: f64,
    /// Change in standard deviation.
    pub std: f64,
    /// Change in minimum.
    pub min: f64,
    /// Change in maximum.
    pub max: f64,
    /// Change in median.
    pub median: f64,
    /// Change in 5th percentile.
    pub p5: f64,
    /// Change in 95th percentile.
    pub p95: f64,
}

impl StatsDelta {
    /// `candidate - baseline` for every field.
    pub fn between(baseline: &DistributionStats, candidate: &DistributionStats) -> Self {
        Self {
            mean: candidate.mean - baseline.mean,
            std: candidate.std - baseline.std,
            min: candidate.min - baseline.min,
            max: candidate.max - baseline.max,
            median: candidate.median - baseline.median,
            p5: candidate.p5 - baseline.p5,
            p95: candidate.p95 - baseline.p95,
        }
    }
}

/// How a candidate run differs from a baseline run.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RunComparison {
    /// Change in the share of each decision label.
    pub proportion_changes: BTreeMap<Decision, f64>,
    /// Change in primary score statistics.
    pub primary: StatsDelta,
    /// Change in secondary score statistics.
    pub secondary: StatsDelta,
    /// `(p5_candidate - p5_baseline) / |p5_baseline|` for the primary score;
    /// `None` when the baseline 5th percentile is zero.
    pub relative_tail_change: Option<f64>,
}

impl RunComparison {
    /// Change in the share of `decision`.
    pub fn proportion_change(&self, decision: Decision) -> f64 {
        self.proportion_changes
            .get(&decision)
            .copied()
            .unwrap_or(0.0)
    }
}

/// Compares a candidate result against a baseline.
///
/// # Examples
/// ```
/// use risk_core::{CorrelatedSpec, CorrelationMatrix, DistributionSpec, SamplingStrategy};
/// use risk_simulation::comparison::compare_results;
/// use risk_simulation::config::SimulationConfig;
/// use risk_simulation::oracle::WeightedThresholdOracle;
/// use risk_simulation::orchestrator::Simulator;
///
/// let simulator = Simulator::new(
///     SimulationConfig::builder().n_samples(5_000).seed(1).build().unwrap(),
/// );
/// let oracle = WeightedThresholdOracle::default();
///
/// let independent = SamplingStrategy::independent(vec![
///     DistributionSpec::normal(0.38, 0.05).unwrap(),
///     DistributionSpec::normal(0.86, 0.03).unwrap(),
///     DistributionSpec::normal(0.75, 0.08).unwrap(),
/// ])
/// .unwrap();
/// let correlation = CorrelationMatrix::from_rows(&[
///     vec![1.0, 0.58, 0.36],
///     vec![0.58, 1.0, 0.62],
///     vec![0.36, 0.62, 1.0],
/// ])
/// .unwrap();
/// let correlated = SamplingStrategy::correlated(
///     CorrelatedSpec::new(vec![0.38, 0.86, 0.75], vec![0.05, 0.03, 0.08], correlation).unwrap(),
/// )
/// .unwrap();
///
/// let baseline = simulator.simulate(&independent, &oracle).unwrap();
/// let candidate = simulator.simulate(&correlated, &oracle).unwrap();
/// let comparison = compare_results(&baseline, &candidate);
///
/// // Positive correlation widens the spread of the weighted sum.
/// assert!(comparison.primary.std > 0.0);
/// ```
pub fn compare_results(baseline: &SimulationResult, candidate: &SimulationResult) -> RunComparison {
    let proportion_changes = Decision::ALL
        .iter()
        .map(|d| (*d, candidate.proportion(*d) - baseline.proportion(*d)))
        .collect();

    let base_p5 = baseline.primary.p5;
    let relative_tail_change =
        (base_p5 != 0.0).then(|| (candidate.primary.p5 - base_p5) / base_p5.abs());

    RunComparison {
        proportion_changes,
        primary: StatsDelta::between(&baseline.primary, &candidate.primary),
        secondary: StatsDelta::between(&baseline.secondary, &candidate.secondary),
        relative_tail_change,
    }
}
