//! Decision frequencies and distribution summaries.
//!
//! All functions are pure and deterministic.
//!
//! Percentiles use linear interpolation between closest ranks on the sorted
//! series: for quantile `q` the rank is `q * (n - 1)`. Standard deviation is
//! the population form (divide by `n`).

use crate::oracle::{Decision, Outcome};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Count of each decision label. Every label is present.
pub fn decision_frequencies(outcomes: &[Outcome]) -> BTreeMap<Decision, u64> {
    let mut counts: BTreeMap<Decision, u64> = Decision::ALL.iter().map(|d| (*d, 0)).collect();
    for outcome in outcomes {
        *counts.entry(outcome.decision).or_insert(0) += 1;
    }
    counts
}

/// Share of each decision label. Every label is present.
///
/// An empty input yields zero for every label.
pub fn decision_proportions(outcomes: &[Outcome]) -> BTreeMap<Decision, f64> {
    proportions_from_frequencies(&decision_frequencies(outcomes), outcomes.len())
}

/// Converts counts to shares of `n`.
pub fn proportions_from_frequencies(
    frequencies: &BTreeMap<Decision, u64>,
    n: usize,
) -> BTreeMap<Decision, f64> {
    Decision::ALL
        .iter()
        .map(|d| {
            let count = frequencies.get(d).copied().unwrap_or(0);
            let share = if n == 0 { 0.0 } else { count as f64 / n as f64 };
            (*d, share)
        })
        .collect()
}

/// Percentile `q` (in `[0, 100]`) of an ascending-sorted, non-empty slice.
///
/// # Panics
///
/// Panics if `sorted` is empty.
pub fn percentile(sorted: &[f64], q: f64) -> f64 {
    assert!(!sorted.is_empty(), "percentile of an empty series");
    let rank = (q / 100.0).clamp(0.0, 1.0) * (sorted.len() - 1) as f64;
    let lower = rank.floor() as usize;
    let upper = rank.ceil() as usize;
    if lower == upper {
        return sorted[lower];
    }
    let (a, b) = (sorted[lower], sorted[upper]);
    let weight = rank - lower as f64;
    // Rounding must not push the result outside its bracket.
    (a + (b - a) * weight).max(a).min(b)
}

/// Arithmetic mean; zero for an empty slice.
pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Population standard deviation; zero for an empty slice.
pub fn population_std(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let m = mean(values);
    let var = values.iter().map(|v| (v - m) * (v - m)).sum::<f64>() / values.len() as f64;
    var.sqrt()
}

/// Summary statistics of one series.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct DistributionStats {
    /// Arithmetic mean.
    pub mean: f64,
    /// Population standard deviation.
    pub std: f64,
    /// Smallest value.
    pub min: f64,
    /// Largest value.
    pub max: f64,
    /// 50th percentile.
    pub median: f64,
    /// 5th percentile.
    pub p5: f64,
    /// 95th percentile.
    pub p95: f64,
}

impl DistributionStats {
    /// Summarises `values`; `None` if empty.
    ///
    /// # Examples
    /// ```
    /// use risk_simulation::aggregate::DistributionStats;
    ///
    /// let stats = DistributionStats::from_values(&[1.0, 2.0, 3.0, 4.0, 5.0]).unwrap();
    /// assert_eq!(stats.median, 3.0);
    /// assert!((stats.p5 - 1.2).abs() < 1e-12);
    /// assert!((stats.std - 2.0_f64.sqrt()).abs() < 1e-12);
    /// ```
    pub fn from_values(values: &[f64]) -> Option<Self> {
        if values.is_empty() {
            return None;
        }
        let mut sorted = values.to_vec();
        sorted.sort_by(f64::total_cmp);

        Some(Self {
            mean: mean(values),
            std: population_std(values),
            min: sorted[0],
            max: sorted[sorted.len() - 1],
            median: percentile(&sorted, 50.0),
            p5: percentile(&sorted, 5.0),
            p95: percentile(&sorted, 95.0),
        })
    }

    /// Whether every field is finite.
    pub fn is_finite(&self) -> bool {
        [
            self.mean,
            self.std,
            self.min,
            self.max,
            self.median,
            self.p5,
            self.p95,
        ]
        .iter()
        .all(|v| v.is_finite())
    }

    /// Whether `min <= p5 <= median <= p95 <= max`.
    pub fn is_ordered(&self) -> bool {
        self.min <= self.p5
            && self.p5 <= self.median
            && self.median <= self.p95
            && self.p95 <= self.max
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn outcome(decision: Decision) -> Outcome {
        Outcome::new(decision, 0.5, 5.0)
    }

    #[test]
    fn test_frequencies_include_every_label() {
        let outcomes = vec![outcome(Decision::Hold); 3];
        let freqs = decision_frequencies(&outcomes);

        assert_eq!(freqs.len(), 4);
        assert_eq!(freqs[&Decision::Hold], 3);
        assert_eq!(freqs[&Decision::Accept], 0);
        assert_eq!(freqs[&Decision::Counter], 0);
        assert_eq!(freqs[&Decision::Reject], 0);
    }

    #[test]
    fn test_proportions() {
        let outcomes = vec![
            outcome(Decision::Accept),
            outcome(Decision::Reject),
            outcome(Decision::Reject),
            outcome(Decision::Hold),
        ];
        let props = decision_proportions(&outcomes);
        assert_relative_eq!(props[&Decision::Reject], 0.5);
        assert_relative_eq!(props[&Decision::Accept], 0.25);
        assert_relative_eq!(props[&Decision::Counter], 0.0);
        assert_relative_eq!(props.values().sum::<f64>(), 1.0, epsilon = 1e-12);

        let empty = decision_proportions(&[]);
        assert!(empty.values().all(|p| *p == 0.0));
    }

    #[test]
    fn test_percentile_linear_interpolation() {
        let sorted = [10.0, 20.0, 30.0, 40.0];
        assert_relative_eq!(percentile(&sorted, 0.0), 10.0);
        assert_relative_eq!(percentile(&sorted, 100.0), 40.0);
        // rank 0.05 * 3 = 0.15
        assert_relative_eq!(percentile(&sorted, 5.0), 11.5, epsilon = 1e-12);
        assert_relative_eq!(percentile(&sorted, 50.0), 25.0, epsilon = 1e-12);
        assert_relative_eq!(percentile(&sorted, 95.0), 38.5, epsilon = 1e-12);
        assert_relative_eq!(percentile(&[7.0], 95.0), 7.0);
    }

    #[test]
    fn test_stats_single_value() {
        let stats = DistributionStats::from_values(&[0.42]).unwrap();
        assert_eq!(stats.mean, 0.42);
        assert_eq!(stats.std, 0.0);
        assert_eq!(stats.p5, 0.42);
        assert_eq!(stats.p95, 0.42);
        assert!(stats.is_ordered());
        assert!(DistributionStats::from_values(&[]).is_none());
    }

    #[test]
    fn test_stats_unsorted_input() {
        let stats = DistributionStats::from_values(&[5.0, 1.0, 4.0, 2.0, 3.0]).unwrap();
        assert_eq!(stats.min, 1.0);
        assert_eq!(stats.max, 5.0);
        assert_eq!(stats.median, 3.0);
        assert_relative_eq!(stats.mean, 3.0);
        assert!(stats.is_finite());
    }

    mod property_tests {
        use super::*;
        use proptest::prelude::*;

        fn decision() -> impl Strategy<Value = Decision> {
            prop_oneof![
                Just(Decision::Accept),
                Just(Decision::Counter),
                Just(Decision::Reject),
                Just(Decision::Hold),
            ]
        }

        proptest! {
            #[test]
            fn proportions_sum_to_one(decisions in prop::collection::vec(decision(), 1..500)) {
                let outcomes: Vec<Outcome> = decisions.into_iter().map(outcome).collect();
                let props = decision_proportions(&outcomes);
                let total: f64 = props.values().sum();
                prop_assert!((total - 1.0).abs() < 1e-6);
                prop_assert!(props.values().all(|p| (0.0..=1.0).contains(p)));

                let freqs = decision_frequencies(&outcomes);
                prop_assert_eq!(freqs.values().sum::<u64>(), outcomes.len() as u64);
            }

            #[test]
            fn percentiles_are_ordered(values in prop::collection::vec(-1e6f64..1e6, 1..300)) {
                let stats = DistributionStats::from_values(&values).unwrap();
                prop_assert!(stats.is_ordered());
                prop_assert!(stats.is_finite());
                prop_assert!(stats.std >= 0.0);
            }
        }
    }
}
