//! Single-dimension distribution catalog.
//!
//! [`DistributionSpec`] is a closed set of sampling strategies for one input
//! factor. Every variant draws values inside the unit interval:
//!
//! | Variant | Bounds | Mechanism |
//! |---------|--------|-----------|
//! | `Uniform` | `[min, max]` | direct |
//! | `Normal` | `[0, 1]` | draw, then clip |
//! | `Beta` | `[0, 1]` | direct |
//! | `Triangular` | `[min, max]` | direct |
//! | `TruncatedNormal` | `[min, max]` | bounded rejection |
//!
//! Parameters are validated before the first draw. Rejection sampling is
//! capped per draw; exhausting the budget is a [`SamplingError`], never an
//! unbounded loop.
//!
//! # Examples
//!
//! ```
//! use risk_core::distributions::DistributionSpec;
//! use risk_core::rng::SimRng;
//!
//! let spec = DistributionSpec::triangular(0.45, 0.75, 0.95).unwrap();
//! let mut rng = SimRng::from_seed(42);
//! let values = spec.sample(1000, &mut rng).unwrap();
//!
//! assert_eq!(values.len(), 1000);
//! assert!(values.iter().all(|v| (0.45..=0.95).contains(v)));
//! ```

use crate::error::{ConfigError, CoreError, SamplingError};
use crate::normal::norm_cdf;
use crate::rng::SimRng;
use rand::distributions::Uniform;
use rand_distr::{Beta, Distribution, Normal, Triangular};
use serde::{Deserialize, Serialize};

/// Default cap on rejection attempts for a single truncated normal draw.
pub const DEFAULT_MAX_REJECTION_ATTEMPTS: usize = 1_000_000;

/// Truncated normals accepting fewer draws than this are rejected as
/// unreachable from the mean.
pub const MIN_ACCEPTANCE_PROBABILITY: f64 = 1e-4;

/// Immutable description of how to sample one input factor.
///
/// Deserialises from a tagged table, e.g. in TOML:
///
/// ```toml
/// kind = "truncated_normal"
/// mean = 0.86
/// std = 0.06
/// min = 0.5
/// max = 1.0
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DistributionSpec {
    /// Uniform on `[min, max]`.
    Uniform {
        /// Lower bound.
        min: f64,
        /// Upper bound.
        max: f64,
    },
    /// Normal, clipped to `[0, 1]`.
    Normal {
        /// Mean.
        mean: f64,
        /// Standard deviation.
        std: f64,
    },
    /// Beta on `[0, 1]`.
    Beta {
        /// Shape parameter pulling mass towards 1.
        alpha: f64,
        /// Shape parameter pulling mass towards 0.
        beta: f64,
    },
    /// Triangular on `[min, max]` peaking at `mode`.
    Triangular {
        /// Lower bound.
        min: f64,
        /// Most likely value.
        mode: f64,
        /// Upper bound.
        max: f64,
    },
    /// Normal restricted to `[min, max]` by rejection.
    TruncatedNormal {
        /// Mean of the untruncated normal.
        mean: f64,
        /// Standard deviation of the untruncated normal.
        std: f64,
        /// Lower acceptance bound.
        min: f64,
        /// Upper acceptance bound.
        max: f64,
    },
}

impl DistributionSpec {
    /// Validated uniform distribution.
    pub fn uniform(min: f64, max: f64) -> Result<Self, ConfigError> {
        let spec = Self::Uniform { min, max };
        spec.validate()?;
        Ok(spec)
    }

    /// Validated normal distribution (clipped to `[0, 1]` when sampled).
    pub fn normal(mean: f64, std: f64) -> Result<Self, ConfigError> {
        let spec = Self::Normal { mean, std };
        spec.validate()?;
        Ok(spec)
    }

    /// Validated beta distribution.
    pub fn beta(alpha: f64, beta: f64) -> Result<Self, ConfigError> {
        let spec = Self::Beta { alpha, beta };
        spec.validate()?;
        Ok(spec)
    }

    /// Validated triangular distribution.
    pub fn triangular(min: f64, mode: f64, max: f64) -> Result<Self, ConfigError> {
        let spec = Self::Triangular { min, mode, max };
        spec.validate()?;
        Ok(spec)
    }

    /// Validated truncated normal distribution.
    pub fn truncated_normal(mean: f64, std: f64, min: f64, max: f64) -> Result<Self, ConfigError> {
        let spec = Self::TruncatedNormal {
            mean,
            std,
            min,
            max,
        };
        spec.validate()?;
        Ok(spec)
    }

    /// Variant name, used in run metadata.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Uniform { .. } => "Uniform",
            Self::Normal { .. } => "Normal",
            Self::Beta { .. } => "Beta",
            Self::Triangular { .. } => "Triangular",
            Self::TruncatedNormal { .. } => "TruncatedNormal",
        }
    }

    /// Declared bounds of every value this spec can produce.
    pub fn bounds(&self) -> (f64, f64) {
        match *self {
            Self::Uniform { min, max } => (min, max),
            Self::Normal { .. } | Self::Beta { .. } => (0.0, 1.0),
            Self::Triangular { min, max, .. } => (min, max),
            Self::TruncatedNormal { min, max, .. } => (min, max),
        }
    }

    /// Checks the variant's parameter constraints.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidDistribution` if:
    /// - any parameter is not finite
    /// - a declared bound lies outside `[0, 1]` or `min > max`
    /// - a standard deviation is negative
    /// - Beta `alpha` or `beta` is not strictly positive
    /// - Triangular `mode` lies outside `[min, max]`
    /// - TruncatedNormal has `min >= max`, or its acceptance probability is
    ///   below [`MIN_ACCEPTANCE_PROBABILITY`]
    pub fn validate(&self) -> Result<(), ConfigError> {
        let kind = self.name();
        match *self {
            Self::Uniform { min, max } => {
                check_unit_range(kind, min, max)?;
            }
            Self::Normal { mean, std } => {
                check_finite(kind, "mean", mean)?;
                check_std(kind, std)?;
            }
            Self::Beta { alpha, beta } => {
                for (name, value) in [("alpha", alpha), ("beta", beta)] {
                    check_finite(kind, name, value)?;
                    if value <= 0.0 {
                        return Err(invalid(kind, format!("{} must be > 0, got {}", name, value)));
                    }
                }
            }
            Self::Triangular { min, mode, max } => {
                check_unit_range(kind, min, max)?;
                check_finite(kind, "mode", mode)?;
                if mode < min || mode > max {
                    return Err(invalid(
                        kind,
                        format!("mode {} must lie in [{}, {}]", mode, min, max),
                    ));
                }
            }
            Self::TruncatedNormal {
                mean,
                std,
                min,
                max,
            } => {
                check_unit_range(kind, min, max)?;
                if min >= max {
                    return Err(invalid(
                        kind,
                        format!("min {} must be strictly below max {}", min, max),
                    ));
                }
                check_finite(kind, "mean", mean)?;
                check_std(kind, std)?;
                let acceptance = truncated_acceptance(mean, std, min, max);
                if acceptance < MIN_ACCEPTANCE_PROBABILITY {
                    return Err(invalid(
                        kind,
                        format!(
                            "bounds [{}, {}] are effectively unreachable from mean {} (acceptance probability {:e})",
                            min, max, mean, acceptance
                        ),
                    ));
                }
            }
        }
        Ok(())
    }

    /// Draws `n` values using the default rejection budget.
    ///
    /// # Errors
    ///
    /// `CoreError::Config` for invalid parameters (nothing is drawn),
    /// `CoreError::Sampling` if a truncated normal draw exhausts its budget.
    pub fn sample(&self, n: usize, rng: &mut SimRng) -> Result<Vec<f64>, CoreError> {
        self.sample_with_budget(n, rng, DEFAULT_MAX_REJECTION_ATTEMPTS)
    }

    /// Draws `n` values with an explicit per-draw rejection budget.
    pub fn sample_with_budget(
        &self,
        n: usize,
        rng: &mut SimRng,
        max_attempts: usize,
    ) -> Result<Vec<f64>, CoreError> {
        let mut values = vec![0.0; n];
        self.fill(&mut values, rng, max_attempts)?;
        Ok(values)
    }

    /// Fills `buffer` with draws. Parameters are validated first.
    pub fn fill(
        &self,
        buffer: &mut [f64],
        rng: &mut SimRng,
        max_attempts: usize,
    ) -> Result<(), CoreError> {
        self.validate()?;
        if max_attempts == 0 {
            return Err(ConfigError::InvalidParameter {
                name: "max_attempts",
                value: "must be at least 1".to_string(),
            }
            .into());
        }

        let kind = self.name();
        match *self {
            Self::Uniform { min, max } => {
                if min == max {
                    buffer.fill(min);
                } else {
                    let dist = Uniform::new_inclusive(min, max);
                    for value in buffer.iter_mut() {
                        *value = dist.sample(rng);
                    }
                }
            }
            Self::Normal { mean, std } => {
                let dist = Normal::new(mean, std).map_err(|e| invalid(kind, e.to_string()))?;
                for value in buffer.iter_mut() {
                    *value = dist.sample(rng).clamp(0.0, 1.0);
                }
            }
            Self::Beta { alpha, beta } => {
                let dist = Beta::new(alpha, beta).map_err(|e| invalid(kind, e.to_string()))?;
                for value in buffer.iter_mut() {
                    *value = dist.sample(rng);
                }
            }
            Self::Triangular { min, mode, max } => {
                let dist =
                    Triangular::new(min, max, mode).map_err(|e| invalid(kind, e.to_string()))?;
                for value in buffer.iter_mut() {
                    *value = dist.sample(rng).clamp(min, max);
                }
            }
            Self::TruncatedNormal {
                mean,
                std,
                min,
                max,
            } => {
                let dist = Normal::new(mean, std).map_err(|e| invalid(kind, e.to_string()))?;
                for value in buffer.iter_mut() {
                    *value = draw_truncated(&dist, rng, min, max, max_attempts)?;
                }
            }
        }
        Ok(())
    }
}

/// Acceptance probability of `[min, max]` under `N(mean, std²)`.
fn truncated_acceptance(mean: f64, std: f64, min: f64, max: f64) -> f64 {
    if std == 0.0 {
        return if (min..=max).contains(&mean) { 1.0 } else { 0.0 };
    }
    let upper = norm_cdf((max - mean) / std);
    let lower = norm_cdf((min - mean) / std);
    (upper - lower).max(0.0)
}

fn draw_truncated(
    dist: &Normal<f64>,
    rng: &mut SimRng,
    min: f64,
    max: f64,
    max_attempts: usize,
) -> Result<f64, SamplingError> {
    for _ in 0..max_attempts {
        let candidate = dist.sample(rng);
        if (min..=max).contains(&candidate) {
            return Ok(candidate);
        }
    }
    Err(SamplingError::RejectionBudgetExhausted {
        attempts: max_attempts,
        min,
        max,
    })
}

fn invalid(kind: &'static str, reason: String) -> ConfigError {
    ConfigError::InvalidDistribution { kind, reason }
}

fn check_finite(kind: &'static str, name: &str, value: f64) -> Result<(), ConfigError> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(invalid(kind, format!("{} must be finite, got {}", name, value)))
    }
}

fn check_std(kind: &'static str, std: f64) -> Result<(), ConfigError> {
    check_finite(kind, "std", std)?;
    if std < 0.0 {
        return Err(invalid(kind, format!("std must be >= 0, got {}", std)));
    }
    Ok(())
}

fn check_unit_range(kind: &'static str, min: f64, max: f64) -> Result<(), ConfigError> {
    check_finite(kind, "min", min)?;
    check_finite(kind, "max", max)?;
    if min < 0.0 || max > 1.0 {
        return Err(invalid(
            kind,
            format!("bounds [{}, {}] must lie within [0, 1]", min, max),
        ));
    }
    if min > max {
        return Err(invalid(
            kind,
            format!("min {} must not exceed max {}", min, max),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mean(values: &[f64]) -> f64 {
        values.iter().sum::<f64>() / values.len() as f64
    }

    // ================================================================
    // Validation
    // ================================================================

    #[test]
    fn test_beta_rejects_non_positive_shape() {
        assert!(matches!(
            DistributionSpec::beta(0.0, 2.0),
            Err(ConfigError::InvalidDistribution { kind: "Beta", .. })
        ));
        assert!(DistributionSpec::beta(2.0, -1.0).is_err());
        assert!(DistributionSpec::beta(5.5, 9.0).is_ok());
    }

    #[test]
    fn test_triangular_rejects_mode_outside_range() {
        let err = DistributionSpec::triangular(0.2, 0.9, 0.8).unwrap_err();
        assert!(err.to_string().contains("mode 0.9"));
        assert!(DistributionSpec::triangular(0.2, 0.2, 0.8).is_ok());
        assert!(DistributionSpec::triangular(0.2, 0.8, 0.8).is_ok());
    }

    #[test]
    fn test_uniform_rejects_bounds_outside_unit_interval() {
        assert!(DistributionSpec::uniform(-0.1, 0.5).is_err());
        assert!(DistributionSpec::uniform(0.1, 1.5).is_err());
        assert!(DistributionSpec::uniform(0.6, 0.5).is_err());
        assert!(DistributionSpec::uniform(f64::NAN, 0.5).is_err());
    }

    #[test]
    fn test_normal_rejects_negative_std() {
        assert!(DistributionSpec::normal(0.5, -0.1).is_err());
        assert!(DistributionSpec::normal(0.5, f64::INFINITY).is_err());
        assert!(DistributionSpec::normal(0.5, 0.0).is_ok());
    }

    #[test]
    fn test_truncated_normal_rejects_unreachable_bounds() {
        // P(Z > 4) ~ 3.2e-5, below the acceptance floor.
        let err = DistributionSpec::truncated_normal(0.5, 0.1, 0.9, 1.0).unwrap_err();
        assert!(err.to_string().contains("effectively unreachable"));

        // Degenerate std with the mean outside the window.
        assert!(DistributionSpec::truncated_normal(0.2, 0.0, 0.5, 1.0).is_err());
        assert!(DistributionSpec::truncated_normal(0.7, 0.0, 0.5, 1.0).is_ok());

        assert!(DistributionSpec::truncated_normal(0.86, 0.06, 0.5, 1.0).is_ok());
        assert!(DistributionSpec::truncated_normal(0.5, 0.1, 0.6, 0.6).is_err());
    }

    #[test]
    fn test_invalid_spec_draws_nothing() {
        let spec = DistributionSpec::Beta {
            alpha: -1.0,
            beta: 1.0,
        };
        let mut rng = SimRng::from_seed(1);
        let mut untouched = SimRng::from_seed(1);

        assert!(matches!(spec.sample(10, &mut rng), Err(CoreError::Config(_))));
        assert_eq!(rng.gen_uniform(), untouched.gen_uniform());
    }

    // ================================================================
    // Sampling
    // ================================================================

    #[test]
    fn test_uniform_mean_centered() {
        let spec = DistributionSpec::uniform(0.0, 1.0).unwrap();
        let mut rng = SimRng::from_seed(42);
        let values = spec.sample(10_000, &mut rng).unwrap();

        assert_eq!(values.len(), 10_000);
        assert!((mean(&values) - 0.5).abs() < 0.02);
    }

    #[test]
    fn test_degenerate_uniform_is_constant() {
        let spec = DistributionSpec::uniform(0.3, 0.3).unwrap();
        let mut rng = SimRng::from_seed(42);
        let values = spec.sample(50, &mut rng).unwrap();
        assert!(values.iter().all(|&v| v == 0.3));
    }

    #[test]
    fn test_normal_is_clipped() {
        let spec = DistributionSpec::normal(0.95, 0.2).unwrap();
        let mut rng = SimRng::from_seed(7);
        let values = spec.sample(5_000, &mut rng).unwrap();

        assert!(values.iter().all(|v| (0.0..=1.0).contains(v)));
        assert!(values.iter().any(|&v| v == 1.0), "expected clipped draws");
    }

    #[test]
    fn test_beta_mean_matches_theory() {
        let spec = DistributionSpec::beta(5.5, 9.0).unwrap();
        let mut rng = SimRng::from_seed(3);
        let values = spec.sample(20_000, &mut rng).unwrap();

        let expected = 5.5 / (5.5 + 9.0);
        assert!((mean(&values) - expected).abs() < 0.01);
    }

    #[test]
    fn test_triangular_mean_matches_theory() {
        let spec = DistributionSpec::triangular(0.45, 0.75, 0.95).unwrap();
        let mut rng = SimRng::from_seed(3);
        let values = spec.sample(20_000, &mut rng).unwrap();

        let expected = (0.45 + 0.75 + 0.95) / 3.0;
        assert!((mean(&values) - expected).abs() < 0.01);
    }

    #[test]
    fn test_truncated_normal_respects_bounds() {
        let spec = DistributionSpec::truncated_normal(0.86, 0.06, 0.5, 0.9).unwrap();
        let mut rng = SimRng::from_seed(11);
        let values = spec.sample(10_000, &mut rng).unwrap();

        assert!(values.iter().all(|v| (0.5..=0.9).contains(v)));
    }

    #[test]
    fn test_truncated_normal_budget_exhaustion() {
        // Acceptance ~0.6%, so a single attempt per draw fails quickly.
        let spec = DistributionSpec::truncated_normal(0.5, 0.1, 0.75, 1.0).unwrap();
        let mut rng = SimRng::from_seed(5);

        let result = spec.sample_with_budget(1_000, &mut rng, 1);
        assert!(matches!(
            result,
            Err(CoreError::Sampling(SamplingError::RejectionBudgetExhausted {
                attempts: 1,
                ..
            }))
        ));
    }

    #[test]
    fn test_zero_budget_is_config_error() {
        let spec = DistributionSpec::uniform(0.0, 1.0).unwrap();
        let mut rng = SimRng::from_seed(5);
        assert!(matches!(
            spec.sample_with_budget(3, &mut rng, 0),
            Err(CoreError::Config(ConfigError::InvalidParameter { .. }))
        ));
    }

    #[test]
    fn test_seeded_sampling_is_reproducible() {
        let spec = DistributionSpec::beta(2.0, 5.0).unwrap();
        let a = spec.sample(100, &mut SimRng::from_seed(9)).unwrap();
        let b = spec.sample(100, &mut SimRng::from_seed(9)).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_spec_deserialises_from_tagged_table() {
        let spec: DistributionSpec = toml::from_str(
            r#"
            kind = "truncated_normal"
            mean = 0.86
            std = 0.06
            min = 0.5
            max = 1.0
            "#,
        )
        .unwrap();
        assert_eq!(
            spec,
            DistributionSpec::TruncatedNormal {
                mean: 0.86,
                std: 0.06,
                min: 0.5,
                max: 1.0
            }
        );
        assert_eq!(spec.name(), "TruncatedNormal");
    }

    mod property_tests {
        use super::*;
        use proptest::prelude::*;

        fn unit_range() -> impl Strategy<Value = (f64, f64)> {
            (0.0..=1.0_f64, 0.0..=1.0_f64).prop_map(|(a, b)| (a.min(b), a.max(b)))
        }

        fn valid_spec() -> impl Strategy<Value = DistributionSpec> {
            prop_oneof![
                unit_range().prop_map(|(min, max)| DistributionSpec::Uniform { min, max }),
                (-1.0..2.0_f64, 0.0..1.0_f64)
                    .prop_map(|(mean, std)| DistributionSpec::Normal { mean, std }),
                (0.5..20.0_f64, 0.5..20.0_f64)
                    .prop_map(|(alpha, beta)| DistributionSpec::Beta { alpha, beta }),
                (unit_range(), 0.0..=1.0_f64).prop_map(|((min, max), t)| {
                    DistributionSpec::Triangular {
                        min,
                        mode: min + t * (max - min),
                        max,
                    }
                }),
                (0.0..0.8_f64, 0.05..0.2_f64, 0.0..=1.0_f64).prop_map(|(min, width, t)| {
                    let max = (min + width).min(1.0);
                    DistributionSpec::TruncatedNormal {
                        mean: min + t * (max - min),
                        std: 0.1,
                        min,
                        max,
                    }
                }),
            ]
        }

        proptest! {
            #![proptest_config(ProptestConfig::with_cases(200))]

            #[test]
            fn test_sample_len_and_bounds(spec in valid_spec(), n in 0usize..200, seed in any::<u64>()) {
                prop_assert!(spec.validate().is_ok(), "{:?} should be valid", spec);
                let mut rng = SimRng::from_seed(seed);
                let values = spec.sample(n, &mut rng).unwrap();
                let (lo, hi) = spec.bounds();

                prop_assert_eq!(values.len(), n);
                for v in values {
                    prop_assert!(v >= lo && v <= hi, "{} outside [{}, {}] for {:?}", v, lo, hi, spec);
                }
            }
        }
    }
}
