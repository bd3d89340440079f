//! Simulation orchestrator.
//!
//! Drives one run as a one-shot pipeline:
//!
//! 1. **Sampling**: the whole input matrix is drawn from the run's own
//!    generator in fixed chunks of [`SAMPLING_CHUNK_ROWS`] rows, so results
//!    never depend on batch size or evaluation mode. Cancellation is checked
//!    before each chunk.
//! 2. **Evaluating**: the oracle scores the samples batch by batch, either
//!    sequentially or on the rayon pool. Cancellation is checked before each
//!    batch.
//! 3. **Aggregating**: handled by [`SimulationResult::from_run`].
//!
//! Outputs are kept in generation order. Any oracle failure aborts the run.

use crate::config::{EvaluationMode, SimulationConfig};
use crate::error::{SettingsError, SimulationError};
use crate::oracle::{Oracle, Outcome};
use crate::result::SimulationResult;
use rayon::prelude::*;
use risk_core::{ConfigError, SamplingStrategy, SimRng};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{debug, info};

/// Rows drawn between cancellation checks while sampling.
pub const SAMPLING_CHUNK_ROWS: usize = 4096;

/// Shareable flag for cooperative cancellation.
///
/// Clones observe the same flag. The orchestrator checks it once per
/// sampling chunk and once per evaluation batch.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken {
    cancelled: Arc<AtomicBool>,
}

impl CancellationToken {
    /// Creates an un-cancelled token.
    pub fn new() -> Self {
        Self::default()
    }

    /// Requests cancellation.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    /// Whether cancellation was requested.
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }
}

/// Ordered samples and outcomes of one completed run.
///
/// Inputs are stored row-major in a single buffer: sample `i` occupies
/// `inputs[i * dims..(i + 1) * dims]`.
#[derive(Debug, Clone, PartialEq)]
pub struct SimulationRun {
    strategy: SamplingStrategy,
    seed: Option<u64>,
    effective_seed: u64,
    dims: usize,
    inputs: Vec<f64>,
    outcomes: Vec<Outcome>,
}

impl SimulationRun {
    /// Number of samples.
    pub fn len(&self) -> usize {
        self.outcomes.len()
    }

    /// Whether the run holds no samples.
    pub fn is_empty(&self) -> bool {
        self.outcomes.is_empty()
    }

    /// Input dimensions per sample.
    pub fn dims(&self) -> usize {
        self.dims
    }

    /// Strategy the inputs were drawn with.
    pub fn strategy(&self) -> &SamplingStrategy {
        &self.strategy
    }

    /// Seed supplied by the caller.
    pub fn seed(&self) -> Option<u64> {
        self.seed
    }

    /// Seed actually used, drawn from OS entropy when none was supplied.
    pub fn effective_seed(&self) -> u64 {
        self.effective_seed
    }

    /// Flat row-major input buffer.
    pub fn inputs(&self) -> &[f64] {
        &self.inputs
    }

    /// Outcomes in generation order.
    pub fn outcomes(&self) -> &[Outcome] {
        &self.outcomes
    }

    /// Input vector of sample `index`.
    ///
    /// # Panics
    ///
    /// Panics if `index >= self.len()`.
    pub fn input(&self, index: usize) -> &[f64] {
        &self.inputs[index * self.dims..(index + 1) * self.dims]
    }

    /// `(input, outcome)` pairs in generation order.
    pub fn iter(&self) -> impl Iterator<Item = (&[f64], &Outcome)> + '_ {
        self.inputs.chunks_exact(self.dims).zip(&self.outcomes)
    }

    /// All values of input dimension `d`.
    pub fn column(&self, d: usize) -> Vec<f64> {
        self.inputs
            .chunks_exact(self.dims)
            .map(|row| row[d])
            .collect()
    }

    /// Primary scores in generation order.
    pub fn primary_scores(&self) -> Vec<f64> {
        self.outcomes.iter().map(|o| o.primary).collect()
    }

    /// Secondary scores in generation order.
    pub fn secondary_scores(&self) -> Vec<f64> {
        self.outcomes.iter().map(|o| o.secondary).collect()
    }
}

/// Runs simulations under one configuration.
///
/// # Examples
///
/// ```rust
/// use risk_core::{DistributionSpec, SamplingStrategy};
/// use risk_simulation::config::SimulationConfig;
/// use risk_simulation::oracle::WeightedThresholdOracle;
/// use risk_simulation::orchestrator::Simulator;
///
/// let strategy = SamplingStrategy::independent(vec![
///     DistributionSpec::beta(5.5, 9.0).unwrap(),
///     DistributionSpec::triangular(0.45, 0.75, 0.95).unwrap(),
///     DistributionSpec::truncated_normal(0.86, 0.06, 0.5, 1.0).unwrap(),
/// ])
/// .unwrap();
/// let config = SimulationConfig::builder().n_samples(2_000).seed(42).build().unwrap();
///
/// let run = Simulator::new(config)
///     .run(&strategy, &WeightedThresholdOracle::default())
///     .unwrap();
/// assert_eq!(run.len(), 2_000);
/// assert_eq!(run.effective_seed(), 42);
/// ```
#[derive(Debug, Clone)]
pub struct Simulator {
    config: SimulationConfig,
    cancellation: Option<CancellationToken>,
}

impl Simulator {
    /// Creates a simulator. The configuration is validated when a run starts.
    pub fn new(config: SimulationConfig) -> Self {
        Self {
            config,
            cancellation: None,
        }
    }

    /// Attaches a cancellation token.
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancellation = Some(token);
        self
    }

    /// Run settings.
    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }

    /// Draws `n_samples` inputs and evaluates each with `oracle`.
    ///
    /// # Errors
    ///
    /// - `Settings` / `Config` for invalid settings or strategy (nothing is drawn)
    /// - `Sampling` if a rejection budget is exhausted
    /// - `Oracle` with the failing sample index
    /// - `Cancelled` if the token fires before the last batch
    pub fn run<O: Oracle>(
        &self,
        strategy: &SamplingStrategy,
        oracle: &O,
    ) -> Result<SimulationRun, SimulationError> {
        let config = &self.config;
        config.validate()?;

        let sampler = strategy.row_sampler(config.max_rejection_attempts)?;
        let dims = sampler.dims();
        if let Some(names) = &config.dimension_names {
            if names.len() != dims {
                return Err(ConfigError::InvalidDimensions {
                    expected: dims,
                    got: names.len(),
                }
                .into());
            }
        }

        let n = config.n_samples;
        let mut rng = match config.seed {
            Some(seed) => SimRng::from_seed(seed),
            None => SimRng::from_entropy(),
        };
        let effective_seed = rng.seed();

        let too_large = || {
            SettingsError::Validation(vec![format!(
                "{} samples x {} dimensions x batch size {} overflows the input buffer",
                n, dims, config.batch_size
            )])
        };
        let total = n.checked_mul(dims).ok_or_else(too_large)?;
        let batch_len = config.batch_size.checked_mul(dims).ok_or_else(too_large)?;
        let chunk_len = SAMPLING_CHUNK_ROWS.checked_mul(dims).ok_or_else(too_large)?;

        debug!(
            n_samples = n,
            dims,
            method = strategy.method_name(),
            effective_seed,
            "sampling inputs"
        );
        let mut inputs = vec![0.0; total];
        for chunk in inputs.chunks_mut(chunk_len) {
            self.check_cancelled(0, n)?;
            sampler.fill_rows(chunk, &mut rng)?;
        }

        debug!(
            batch_size = config.batch_size,
            mode = config.evaluation.as_str(),
            "evaluating oracle"
        );
        let mut outcomes = Vec::with_capacity(n);
        for batch in inputs.chunks(batch_len) {
            self.check_cancelled(outcomes.len(), n)?;
            let start = outcomes.len();
            match config.evaluation {
                EvaluationMode::Sequential => {
                    evaluate_sequential(oracle, batch, dims, start, &mut outcomes)?
                }
                EvaluationMode::Parallel => {
                    evaluate_parallel(oracle, batch, dims, start, &mut outcomes)?
                }
            }
        }

        Ok(SimulationRun {
            strategy: strategy.clone(),
            seed: config.seed,
            effective_seed,
            dims,
            inputs,
            outcomes,
        })
    }

    /// Runs and aggregates in one call.
    pub fn simulate<O: Oracle>(
        &self,
        strategy: &SamplingStrategy,
        oracle: &O,
    ) -> Result<SimulationResult, SimulationError> {
        let run = self.run(strategy, oracle)?;
        debug!(n_samples = run.len(), "aggregating");
        let result = SimulationResult::from_run(&run, &self.config)?;
        info!(
            n_samples = result.metadata.n_samples,
            method = %result.metadata.method,
            effective_seed = result.metadata.effective_seed,
            primary_mean = result.primary.mean,
            converged = result.convergence.converged,
            "simulation complete"
        );
        Ok(result)
    }

    fn check_cancelled(&self, completed: usize, requested: usize) -> Result<(), SimulationError> {
        match &self.cancellation {
            Some(token) if token.is_cancelled() => {
                debug!(completed, requested, "simulation cancelled");
                Err(SimulationError::Cancelled {
                    completed,
                    requested,
                })
            }
            _ => Ok(()),
        }
    }
}

fn evaluate_sequential<O: Oracle>(
    oracle: &O,
    batch: &[f64],
    dims: usize,
    start: usize,
    outcomes: &mut Vec<Outcome>,
) -> Result<(), SimulationError> {
    for (offset, row) in batch.chunks_exact(dims).enumerate() {
        let outcome = oracle
            .evaluate(row)
            .map_err(|e| SimulationError::oracle(start + offset, e))?;
        outcomes.push(outcome);
    }
    Ok(())
}

fn evaluate_parallel<O: Oracle>(
    oracle: &O,
    batch: &[f64],
    dims: usize,
    start: usize,
    outcomes: &mut Vec<Outcome>,
) -> Result<(), SimulationError> {
    let results: Vec<Result<Outcome, O::Error>> = batch
        .par_chunks_exact(dims)
        .map(|row| oracle.evaluate(row))
        .collect();

    // Collected in generation order; the first failure by index wins.
    for (offset, result) in results.into_iter().enumerate() {
        let outcome = result.map_err(|e| SimulationError::oracle(start + offset, e))?;
        outcomes.push(outcome);
    }
    Ok(())
}

/// Runs `n_samples` evaluations with default settings.
///
/// Shorthand for a [`Simulator`] whose configuration differs from the default
/// only in sample count and seed.
pub fn run<O: Oracle>(
    n_samples: usize,
    strategy: &SamplingStrategy,
    oracle: &O,
    seed: Option<u64>,
) -> Result<SimulationRun, SimulationError> {
    let config = SimulationConfig::builder()
        .n_samples(n_samples)
        .maybe_seed(seed)
        .build()?;
    Simulator::new(config).run(strategy, oracle)
}
