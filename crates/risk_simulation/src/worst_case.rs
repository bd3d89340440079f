//! Worst-case extraction.
//!
//! Two independent rankings over the whole run:
//!
//! - lowest primary score first
//! - highest secondary score first
//!
//! Ties keep generation order. Decision labels play no part in the ranking.

use crate::oracle::Outcome;
use crate::orchestrator::SimulationRun;
use risk_core::ConfigError;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// One ranked sample.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct WorstCase {
    /// Generation index within the run.
    pub index: usize,
    /// Full input vector.
    pub inputs: Vec<f64>,
    /// Oracle outcome.
    pub outcome: Outcome,
}

/// Both worst-case rankings of a run.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct WorstCaseSet {
    /// Maximum entries per list.
    pub k: usize,
    /// Ascending by primary score.
    pub lowest_primary: Vec<WorstCase>,
    /// Descending by secondary score.
    pub highest_secondary: Vec<WorstCase>,
}

impl WorstCaseSet {
    /// Extracts up to `k` entries per ranking from a run.
    ///
    /// # Errors
    ///
    /// `InvalidParameter` if `k` is zero.
    pub fn extract(run: &SimulationRun, k: usize) -> Result<Self, ConfigError> {
        Self::from_parts(run.inputs(), run.dims(), run.outcomes(), k)
    }

    /// Extracts from a flat row-major input buffer and matching outcomes.
    pub fn from_parts(
        inputs: &[f64],
        dims: usize,
        outcomes: &[Outcome],
        k: usize,
    ) -> Result<Self, ConfigError> {
        if k == 0 {
            return Err(ConfigError::InvalidParameter {
                name: "k",
                value: "must be at least 1".to_string(),
            });
        }
        if inputs.len() != outcomes.len() * dims {
            return Err(ConfigError::InvalidDimensions {
                expected: outcomes.len() * dims,
                got: inputs.len(),
            });
        }

        let entry = |index: usize| WorstCase {
            index,
            inputs: inputs[index * dims..(index + 1) * dims].to_vec(),
            outcome: outcomes[index],
        };

        let lowest = top_k(outcomes.len(), k, |a, b| {
            outcomes[a].primary.total_cmp(&outcomes[b].primary)
        });
        let highest = top_k(outcomes.len(), k, |a, b| {
            outcomes[b].secondary.total_cmp(&outcomes[a].secondary)
        });

        Ok(Self {
            k,
            lowest_primary: lowest.into_iter().map(entry).collect(),
            highest_secondary: highest.into_iter().map(entry).collect(),
        })
    }

    /// Whether both lists respect `k` and their ordering.
    pub fn is_consistent(&self) -> bool {
        self.lowest_primary.len() <= self.k
            && self.highest_secondary.len() <= self.k
            && self
                .lowest_primary
                .windows(2)
                .all(|w| w[0].outcome.primary <= w[1].outcome.primary)
            && self
                .highest_secondary
                .windows(2)
                .all(|w| w[0].outcome.secondary >= w[1].outcome.secondary)
    }
}

/// First `k` indices under `cmp`, ties broken by index.
///
/// Selects before sorting so large runs only fully sort `k` entries.
fn top_k<F>(n: usize, k: usize, cmp: F) -> Vec<usize>
where
    F: Fn(usize, usize) -> Ordering,
{
    let by_rank = |a: &usize, b: &usize| cmp(*a, *b).then(a.cmp(b));
    let mut order: Vec<usize> = (0..n).collect();
    if k < n {
        order.select_nth_unstable_by(k - 1, by_rank);
        order.truncate(k);
    }
    order.sort_by(by_rank);
    order
}
