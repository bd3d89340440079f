//! Simulation configuration.
//!
//! [`SimulationConfig`] holds the run settings and is built in one of two
//! ways:
//!
//! - [`SimulationConfig::builder`], validated at `build()`
//! - [`SimulationConfig::load`] from a TOML file, optionally followed by
//!   [`SimulationConfig::with_env_override`]
//!
//! [`SimulationPlan`] bundles a configuration with a sampling strategy so a
//! complete run can be described in a single file.

use crate::error::SettingsError;
use risk_core::{SamplingStrategy, DEFAULT_MAX_REJECTION_ATTEMPTS};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Maximum number of samples per run.
pub const MAX_SAMPLES: usize = 10_000_000;

/// Default number of samples per run.
pub const DEFAULT_N_SAMPLES: usize = 10_000;

/// Default convergence batch size.
pub const DEFAULT_BATCH_SIZE: usize = 1_000;

/// Default length of each worst-case list.
pub const DEFAULT_WORST_CASE_K: usize = 5;

/// How the oracle is evaluated within a batch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EvaluationMode {
    /// One sample after another on the calling thread.
    #[default]
    Sequential,
    /// Samples of a batch spread over the rayon pool.
    Parallel,
}

impl EvaluationMode {
    /// Lower-case mode name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Sequential => "sequential",
            Self::Parallel => "parallel",
        }
    }
}

/// Run settings.
///
/// # Examples
///
/// ```rust
/// use risk_simulation::config::{EvaluationMode, SimulationConfig};
///
/// let config = SimulationConfig::builder()
///     .n_samples(50_000)
///     .seed(42)
///     .evaluation(EvaluationMode::Parallel)
///     .build()
///     .expect("valid configuration");
///
/// assert_eq!(config.n_samples, 50_000);
/// assert_eq!(config.batch_size, 1_000);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationConfig {
    /// Number of samples to draw and evaluate.
    #[serde(default = "default_n_samples")]
    pub n_samples: usize,

    /// Generator seed; `None` draws one from OS entropy.
    #[serde(default)]
    pub seed: Option<u64>,

    /// Convergence batch size, also the cancellation granularity.
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,

    /// Entries kept in each worst-case list.
    #[serde(default = "default_worst_case_k")]
    pub worst_case_k: usize,

    /// Oracle evaluation mode.
    #[serde(default)]
    pub evaluation: EvaluationMode,

    /// Rejection attempts allowed per truncated normal draw.
    #[serde(default = "default_max_rejection_attempts")]
    pub max_rejection_attempts: usize,

    /// Optional names for the input dimensions, used in summaries and exports.
    #[serde(default)]
    pub dimension_names: Option<Vec<String>>,
}

fn default_n_samples() -> usize {
    DEFAULT_N_SAMPLES
}

fn default_batch_size() -> usize {
    DEFAULT_BATCH_SIZE
}

fn default_worst_case_k() -> usize {
    DEFAULT_WORST_CASE_K
}

fn default_max_rejection_attempts() -> usize {
    DEFAULT_MAX_REJECTION_ATTEMPTS
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            n_samples: default_n_samples(),
            seed: None,
            batch_size: default_batch_size(),
            worst_case_k: default_worst_case_k(),
            evaluation: EvaluationMode::default(),
            max_rejection_attempts: default_max_rejection_attempts(),
            dimension_names: None,
        }
    }
}

impl SimulationConfig {
    /// Creates a new configuration builder.
    #[inline]
    pub fn builder() -> SimulationConfigBuilder {
        SimulationConfigBuilder::default()
    }

    /// Parses a configuration from TOML text.
    pub fn from_toml_str(content: &str) -> Result<Self, SettingsError> {
        toml::from_str(content).map_err(|e| SettingsError::Parse(e.to_string()))
    }

    /// Loads a configuration from a TOML file.
    pub fn load(path: &Path) -> Result<Self, SettingsError> {
        let content =
            std::fs::read_to_string(path).map_err(|e| SettingsError::Io(e.to_string()))?;
        Self::from_toml_str(&content)
    }

    /// Applies `RISK_SIM_*` environment variable overrides.
    ///
    /// Unparseable values leave the setting unchanged.
    pub fn with_env_override(mut self) -> Self {
        if let Some(n) = env_parse("RISK_SIM_N_SAMPLES") {
            self.n_samples = n;
        }

        if let Ok(seed) = std::env::var("RISK_SIM_SEED") {
            self.seed = match seed.trim().to_lowercase().as_str() {
                "" | "none" => None,
                value => value.parse().ok().or(self.seed),
            };
        }

        if let Some(batch_size) = env_parse("RISK_SIM_BATCH_SIZE") {
            self.batch_size = batch_size;
        }

        if let Some(k) = env_parse("RISK_SIM_WORST_CASE_K") {
            self.worst_case_k = k;
        }

        if let Ok(mode) = std::env::var("RISK_SIM_EVALUATION") {
            self.evaluation = match mode.trim().to_lowercase().as_str() {
                "sequential" => EvaluationMode::Sequential,
                "parallel" => EvaluationMode::Parallel,
                _ => self.evaluation,
            };
        }

        self
    }

    /// Validates the configuration, collecting every problem found.
    pub fn validate(&self) -> Result<(), SettingsError> {
        let errors = self.problems();
        if errors.is_empty() {
            Ok(())
        } else {
            Err(SettingsError::Validation(errors))
        }
    }

    fn problems(&self) -> Vec<String> {
        let mut errors = Vec::new();

        if self.n_samples == 0 {
            errors.push("n_samples must be at least 1".to_string());
        }
        if self.n_samples > MAX_SAMPLES {
            errors.push(format!(
                "n_samples {} exceeds maximum allowed ({})",
                self.n_samples, MAX_SAMPLES
            ));
        }
        if self.batch_size == 0 {
            errors.push("batch_size must be at least 1".to_string());
        }
        if self.batch_size > MAX_SAMPLES {
            errors.push(format!(
                "batch_size {} exceeds maximum allowed ({})",
                self.batch_size, MAX_SAMPLES
            ));
        }
        if self.worst_case_k == 0 {
            errors.push("worst_case_k must be at least 1".to_string());
        }
        if self.max_rejection_attempts == 0 {
            errors.push("max_rejection_attempts must be at least 1".to_string());
        }

        if let Some(names) = &self.dimension_names {
            if names.iter().any(|n| n.trim().is_empty()) {
                errors.push("dimension_names cannot contain empty names".to_string());
            }
            let mut seen = std::collections::BTreeSet::new();
            if let Some(dup) = names.iter().find(|n| !seen.insert(n.as_str())) {
                errors.push(format!("dimension_names contains duplicate '{}'", dup));
            }
        }

        errors
    }

    /// Loads from file, applies environment overrides and validates.
    pub fn load_with_env_and_validate(path: &Path) -> Result<Self, SettingsError> {
        let config = Self::load(path)?.with_env_override();
        config.validate()?;
        Ok(config)
    }

    /// Name of dimension `index`, falling back to `x1`, `x2`, ...
    pub fn dimension_name(&self, index: usize) -> String {
        self.dimension_names
            .as_ref()
            .and_then(|names| names.get(index).cloned())
            .unwrap_or_else(|| format!("x{}", index + 1))
    }
}

fn env_parse(key: &str) -> Option<usize> {
    std::env::var(key).ok().and_then(|v| v.trim().parse().ok())
}

/// Builder for [`SimulationConfig`].
#[derive(Debug, Clone, Default)]
pub struct SimulationConfigBuilder {
    config: SimulationConfig,
}

impl SimulationConfigBuilder {
    /// Sets the number of samples, in [1, 10_000_000].
    #[inline]
    pub fn n_samples(mut self, n_samples: usize) -> Self {
        self.config.n_samples = n_samples;
        self
    }

    /// Sets the generator seed.
    #[inline]
    pub fn seed(mut self, seed: u64) -> Self {
        self.config.seed = Some(seed);
        self
    }

    /// Sets or clears the generator seed.
    #[inline]
    pub fn maybe_seed(mut self, seed: Option<u64>) -> Self {
        self.config.seed = seed;
        self
    }

    /// Sets the convergence batch size.
    #[inline]
    pub fn batch_size(mut self, batch_size: usize) -> Self {
        self.config.batch_size = batch_size;
        self
    }

    /// Sets the worst-case list length.
    #[inline]
    pub fn worst_case_k(mut self, k: usize) -> Self {
        self.config.worst_case_k = k;
        self
    }

    /// Sets the evaluation mode.
    #[inline]
    pub fn evaluation(mut self, mode: EvaluationMode) -> Self {
        self.config.evaluation = mode;
        self
    }

    /// Sets the per-draw rejection budget.
    #[inline]
    pub fn max_rejection_attempts(mut self, attempts: usize) -> Self {
        self.config.max_rejection_attempts = attempts;
        self
    }

    /// Names the input dimensions.
    pub fn dimension_names<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.config.dimension_names = Some(names.into_iter().map(Into::into).collect());
        self
    }

    /// Builds and validates the configuration.
    pub fn build(self) -> Result<SimulationConfig, SettingsError> {
        self.config.validate()?;
        Ok(self.config)
    }
}

/// A configuration plus the sampling strategy it drives.
///
/// # Examples
///
/// ```rust
/// use risk_simulation::config::SimulationPlan;
///
/// let plan = SimulationPlan::from_toml_str(r#"
///     [config]
///     n_samples = 2000
///     seed = 7
///     dimension_names = ["liability", "damages"]
///
///     [sampling]
///     method = "correlated"
///     means = [0.6, 0.65]
///     stds = [0.12, 0.1]
///     correlation = [[1.0, 0.58], [0.58, 1.0]]
/// "#).unwrap();
///
/// assert_eq!(plan.sampling.dims(), 2);
/// assert_eq!(plan.config.seed, Some(7));
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationPlan {
    /// Run settings.
    #[serde(default)]
    pub config: SimulationConfig,
    /// How inputs are drawn.
    pub sampling: SamplingStrategy,
}

impl SimulationPlan {
    /// Parses and validates a plan from TOML text.
    pub fn from_toml_str(content: &str) -> Result<Self, SettingsError> {
        let plan: Self = toml::from_str(content).map_err(|e| SettingsError::Parse(e.to_string()))?;
        plan.validate()?;
        Ok(plan)
    }

    /// Loads and validates a plan from a TOML file.
    pub fn load(path: &Path) -> Result<Self, SettingsError> {
        let content =
            std::fs::read_to_string(path).map_err(|e| SettingsError::Io(e.to_string()))?;
        Self::from_toml_str(&content)
    }

    /// Validates the settings, the strategy and their agreement on dimensions.
    pub fn validate(&self) -> Result<(), SettingsError> {
        let mut errors = self.config.problems();

        if let Err(e) = self.sampling.validate() {
            errors.push(format!("sampling: {}", e));
        }
        if let Some(names) = &self.config.dimension_names {
            let dims = self.sampling.dims();
            if names.len() != dims {
                errors.push(format!(
                    "dimension_names has {} entries but sampling defines {} dimensions",
                    names.len(),
                    dims
                ));
            }
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(SettingsError::Validation(errors))
        }
    }
}
