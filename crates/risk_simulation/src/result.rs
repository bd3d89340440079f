//! Result model.
//!
//! [`SimulationResult`] packages everything a run produced: metadata,
//! per-dimension input summaries, decision frequencies and proportions,
//! score statistics, convergence diagnostics and worst cases.
//!
//! Construction checks the aggregate invariants; a violation is a
//! [`SimulationError::Consistency`] and no result is returned.

use crate::aggregate::{decision_frequencies, proportions_from_frequencies, DistributionStats};
use crate::config::{EvaluationMode, SimulationConfig};
use crate::convergence::{ConvergenceReport, ConvergenceTracker};
use crate::error::SimulationError;
use crate::oracle::Decision;
use crate::orchestrator::SimulationRun;
use crate::worst_case::{WorstCase, WorstCaseSet};
use chrono::{DateTime, Utc};
use risk_core::CorrelatedSpec;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::io::Write;

/// Tolerance on the sum of decision proportions.
pub const PROPORTION_SUM_TOLERANCE: f64 = 1e-6;

/// How a run was configured and seeded.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RunMetadata {
    /// Samples evaluated.
    pub n_samples: usize,
    /// Sampling method name (`independent` or `correlated`).
    pub method: String,
    /// Seed supplied by the caller.
    pub seed: Option<u64>,
    /// Seed actually used.
    pub effective_seed: u64,
    /// Correlated spec, when the correlated method was used.
    pub correlation: Option<CorrelatedSpec>,
    /// Convergence batch size.
    pub batch_size: usize,
    /// Worst-case list length.
    pub worst_case_k: usize,
    /// Oracle evaluation mode.
    pub evaluation: EvaluationMode,
    /// Input dimension names, in input-vector order.
    pub dimension_names: Vec<String>,
    /// When the result was assembled.
    pub created_at: DateTime<Utc>,
}

/// Summary of one input dimension.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DimensionSummary {
    /// Dimension name.
    pub name: String,
    /// Statistics of the sampled values.
    pub stats: DistributionStats,
}

/// Complete, validated output of one run.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SimulationResult {
    /// Run metadata.
    pub metadata: RunMetadata,
    /// Per-dimension input summaries.
    pub dimensions: Vec<DimensionSummary>,
    /// Count of each decision label.
    pub decision_frequencies: BTreeMap<Decision, u64>,
    /// Share of each decision label.
    pub decision_proportions: BTreeMap<Decision, f64>,
    /// Primary score statistics.
    pub primary: DistributionStats,
    /// Secondary score statistics.
    pub secondary: DistributionStats,
    /// Convergence diagnostics.
    pub convergence: ConvergenceReport,
    /// Worst-case rankings.
    pub worst_cases: WorstCaseSet,
}

fn consistency(message: impl Into<String>) -> SimulationError {
    SimulationError::Consistency(message.into())
}

fn summarise(values: &[f64], what: &str) -> Result<DistributionStats, SimulationError> {
    DistributionStats::from_values(values)
        .ok_or_else(|| consistency(format!("no values to summarise for {}", what)))
}

impl SimulationResult {
    /// Aggregates a completed run.
    ///
    /// # Errors
    ///
    /// - `Config` if `batch_size` or `worst_case_k` is zero
    /// - `Consistency` if the run is empty or any aggregate invariant fails
    pub fn from_run(
        run: &SimulationRun,
        config: &SimulationConfig,
    ) -> Result<Self, SimulationError> {
        if run.is_empty() {
            return Err(consistency("run contains no samples"));
        }

        let dimension_names: Vec<String> =
            (0..run.dims()).map(|d| config.dimension_name(d)).collect();
        let dimensions = dimension_names
            .iter()
            .enumerate()
            .map(|(d, name)| {
                Ok(DimensionSummary {
                    name: name.clone(),
                    stats: summarise(&run.column(d), name)?,
                })
            })
            .collect::<Result<Vec<_>, SimulationError>>()?;

        let primary_scores = run.primary_scores();
        let secondary_scores = run.secondary_scores();

        let frequencies = decision_frequencies(run.outcomes());
        let proportions = proportions_from_frequencies(&frequencies, run.len());
        let convergence = ConvergenceTracker::new(config.batch_size)?
            .assess(&primary_scores, &secondary_scores);
        let worst_cases = WorstCaseSet::extract(run, config.worst_case_k)?;

        let result = Self {
            metadata: RunMetadata {
                n_samples: run.len(),
                method: run.strategy().method_name().to_string(),
                seed: run.seed(),
                effective_seed: run.effective_seed(),
                correlation: run.strategy().correlated_spec().cloned(),
                batch_size: config.batch_size,
                worst_case_k: config.worst_case_k,
                evaluation: config.evaluation,
                dimension_names,
                created_at: Utc::now(),
            },
            dimensions,
            decision_frequencies: frequencies,
            decision_proportions: proportions,
            primary: summarise(&primary_scores, "primary score")?,
            secondary: summarise(&secondary_scores, "secondary score")?,
            convergence,
            worst_cases,
        };
        result.validate()?;
        Ok(result)
    }

    /// Checks every aggregate invariant.
    pub fn validate(&self) -> Result<(), SimulationError> {
        let n = self.metadata.n_samples;

        for decision in Decision::ALL {
            if !self.decision_frequencies.contains_key(&decision) {
                return Err(consistency(format!("frequency for {} missing", decision)));
            }
            if !self.decision_proportions.contains_key(&decision) {
                return Err(consistency(format!("proportion for {} missing", decision)));
            }
        }
        let total: u64 = self.decision_frequencies.values().sum();
        if total != n as u64 {
            return Err(consistency(format!(
                "frequencies sum to {}, expected {}",
                total, n
            )));
        }
        if let Some((d, p)) = self
            .decision_proportions
            .iter()
            .find(|(_, p)| !(0.0..=1.0).contains(*p))
        {
            return Err(consistency(format!("proportion for {} is {}", d, p)));
        }
        let sum: f64 = self.decision_proportions.values().sum();
        if (sum - 1.0).abs() > PROPORTION_SUM_TOLERANCE {
            return Err(consistency(format!("proportions sum to {}", sum)));
        }

        let named_stats = [("primary", &self.primary), ("secondary", &self.secondary)]
            .into_iter()
            .chain(self.dimensions.iter().map(|d| (d.name.as_str(), &d.stats)));
        for (name, stats) in named_stats {
            if !stats.is_finite() {
                return Err(consistency(format!("non-finite statistics for {}", name)));
            }
            if !stats.is_ordered() {
                return Err(consistency(format!("percentiles out of order for {}", name)));
            }
        }
        if self.dimensions.len() != self.metadata.dimension_names.len() {
            return Err(consistency(format!(
                "{} dimension summaries for {} dimension names",
                self.dimensions.len(),
                self.metadata.dimension_names.len()
            )));
        }

        let c = &self.convergence;
        let convergence_finite = c.sem_primary.is_finite()
            && c.sem_secondary.is_finite()
            && c.batch_means.iter().all(|m| m.is_finite())
            && c.cv.map_or(true, f64::is_finite);
        if !convergence_finite {
            return Err(consistency("non-finite convergence diagnostics"));
        }

        let w = &self.worst_cases;
        if w.k != self.metadata.worst_case_k || !w.is_consistent() {
            return Err(consistency("worst-case lists exceed k or are out of order"));
        }
        let worst_finite = w
            .lowest_primary
            .iter()
            .chain(&w.highest_secondary)
            .all(|c| {
                c.outcome.primary.is_finite()
                    && c.outcome.secondary.is_finite()
                    && c.inputs.iter().all(|x| x.is_finite())
            });
        if !worst_finite {
            return Err(consistency("non-finite worst-case entry"));
        }

        Ok(())
    }

    /// Proportion of samples with `decision`.
    pub fn proportion(&self, decision: Decision) -> f64 {
        self.decision_proportions
            .get(&decision)
            .copied()
            .unwrap_or(0.0)
    }

    /// Pretty-printed JSON.
    pub fn to_json_pretty(&self) -> Result<String, SimulationError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Parses and validates a result from JSON.
    pub fn from_json(json: &str) -> Result<Self, SimulationError> {
        let result: Self = serde_json::from_str(json)?;
        result.validate()?;
        Ok(result)
    }

    /// Writes both worst-case lists as CSV, one row per entry.
    ///
    /// Columns: `list`, `rank`, `index`, `decision`, `primary`, `secondary`,
    /// then one column per input dimension.
    pub fn write_worst_cases_csv<W: Write>(&self, writer: W) -> Result<(), SimulationError> {
        let mut out = csv::Writer::from_writer(writer);

        let mut header: Vec<String> = ["list", "rank", "index", "decision", "primary", "secondary"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        header.extend(self.metadata.dimension_names.iter().cloned());
        out.write_record(&header)?;

        let lists: [(&str, &[WorstCase]); 2] = [
            ("lowest_primary", &self.worst_cases.lowest_primary),
            ("highest_secondary", &self.worst_cases.highest_secondary),
        ];
        for (list, entries) in lists {
            for (rank, entry) in entries.iter().enumerate() {
                let mut record = vec![
                    list.to_string(),
                    (rank + 1).to_string(),
                    entry.index.to_string(),
                    entry.outcome.decision.to_string(),
                    entry.outcome.primary.to_string(),
                    entry.outcome.secondary.to_string(),
                ];
                record.extend(entry.inputs.iter().map(|x| x.to_string()));
                out.write_record(&record)?;
            }
        }

        out.flush().map_err(csv::Error::from)?;
        Ok(())
    }
}
