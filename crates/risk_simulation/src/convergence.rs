//! Convergence diagnostics.
//!
//! The ordered primary-score series is cut into consecutive batches of a
//! fixed size (a trailing partial batch is ignored). The coefficient of
//! variation of the batch means tells whether further samples would still
//! move the estimate:
//!
//! - CV = std(batch means) / mean(batch means)
//! - converged iff at least two full batches exist and CV < 0.05
//!
//! Standard errors of the mean are reported for both scores over the full
//! series.

use crate::aggregate::{mean, population_std};
use risk_core::ConfigError;
use serde::{Deserialize, Serialize};

/// CV below which a run counts as converged.
pub const CONVERGENCE_CV_THRESHOLD: f64 = 0.05;

/// Minimum number of full batches before convergence can be assessed.
pub const MIN_BATCHES: usize = 2;

/// Convergence diagnostics of one run.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ConvergenceReport {
    /// Batch size used.
    pub batch_size: usize,
    /// Mean primary score of each full batch, in order.
    pub batch_means: Vec<f64>,
    /// Standard error of the mean primary score.
    pub sem_primary: f64,
    /// Standard error of the mean secondary score.
    pub sem_secondary: f64,
    /// Coefficient of variation of the batch means, when defined.
    pub cv: Option<f64>,
    /// Whether the run is considered converged.
    pub converged: bool,
}

/// Computes [`ConvergenceReport`]s for a fixed batch size.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ConvergenceTracker {
    batch_size: usize,
}

impl ConvergenceTracker {
    /// Creates a tracker.
    ///
    /// # Errors
    ///
    /// `InvalidParameter` if `batch_size` is zero.
    pub fn new(batch_size: usize) -> Result<Self, ConfigError> {
        if batch_size == 0 {
            return Err(ConfigError::InvalidParameter {
                name: "batch_size",
                value: "must be at least 1".to_string(),
            });
        }
        Ok(Self { batch_size })
    }

    /// Batch size.
    pub fn batch_size(&self) -> usize {
        self.batch_size
    }

    /// Means of consecutive full batches.
    pub fn batch_means(&self, values: &[f64]) -> Vec<f64> {
        values
            .chunks_exact(self.batch_size)
            .map(mean)
            .collect()
    }

    /// Assesses convergence from both score series (same length, generation
    /// order).
    ///
    /// # Examples
    /// ```
    /// use risk_simulation::convergence::ConvergenceTracker;
    ///
    /// let tracker = ConvergenceTracker::new(100).unwrap();
    /// let primary = vec![0.6; 250];
    /// let secondary = vec![6.0; 250];
    ///
    /// let report = tracker.assess(&primary, &secondary);
    /// assert_eq!(report.batch_means.len(), 2);
    /// assert_eq!(report.cv, Some(0.0));
    /// assert!(report.converged);
    /// ```
    pub fn assess(&self, primary: &[f64], secondary: &[f64]) -> ConvergenceReport {
        let batch_means = self.batch_means(primary);
        let cv = coefficient_of_variation(&batch_means);
        let converged = matches!(cv, Some(cv) if cv < CONVERGENCE_CV_THRESHOLD);

        ConvergenceReport {
            batch_size: self.batch_size,
            batch_means,
            sem_primary: standard_error(primary),
            sem_secondary: standard_error(secondary),
            cv,
            converged,
        }
    }
}

/// Population standard deviation over √n; zero for an empty slice.
pub fn standard_error(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    population_std(values) / (values.len() as f64).sqrt()
}

/// CV of batch means relative to the magnitude of their mean; `None` with
/// fewer than two batches or a zero mean.
fn coefficient_of_variation(batch_means: &[f64]) -> Option<f64> {
    if batch_means.len() < MIN_BATCHES {
        return None;
    }
    let m = mean(batch_means);
    if m == 0.0 {
        return None;
    }
    let cv = population_std(batch_means) / m.abs();
    cv.is_finite().then_some(cv)
}
