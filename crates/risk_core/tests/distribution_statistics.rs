//! Statistical integration tests for the sampling layer.
//!
//! These tests draw large samples through the public API and check the
//! moments, bounds and dependence structure each strategy promises.

use approx::assert_abs_diff_eq;
use risk_core::{
    ConfigError, CorrelatedSpec, CorrelationMatrix, DistributionSpec, SamplingStrategy, SimRng,
};

const N: usize = 100_000;

fn mean(values: &[f64]) -> f64 {
    values.iter().sum::<f64>() / values.len() as f64
}

fn pearson(xs: &[f64], ys: &[f64]) -> f64 {
    let mx = mean(xs);
    let my = mean(ys);
    let mut sxy = 0.0;
    let mut sxx = 0.0;
    let mut syy = 0.0;
    for (x, y) in xs.iter().zip(ys) {
        sxy += (x - mx) * (y - my);
        sxx += (x - mx) * (x - mx);
        syy += (y - my) * (y - my);
    }
    sxy / (sxx * syy).sqrt()
}

fn column(rows: &[f64], dims: usize, d: usize) -> Vec<f64> {
    rows.chunks_exact(dims).map(|row| row[d]).collect()
}

// ============================================================================
// Single-dimension moments
// ============================================================================

/// Sample means match the analytical means of each variant.
#[test]
fn test_sample_means_match_analytical() {
    let cases = [
        (DistributionSpec::uniform(0.2, 0.6).unwrap(), 0.4),
        (DistributionSpec::beta(5.5, 9.0).unwrap(), 5.5 / 14.5),
        (
            DistributionSpec::triangular(0.45, 0.75, 0.95).unwrap(),
            (0.45 + 0.75 + 0.95) / 3.0,
        ),
    ];

    for (spec, expected) in cases {
        let values = spec.sample(N, &mut SimRng::from_seed(2024)).unwrap();
        assert_abs_diff_eq!(mean(&values), expected, epsilon = 0.005);
    }
}

/// Symmetric truncation around the mean keeps the mean.
#[test]
fn test_symmetric_truncated_normal_mean() {
    let spec = DistributionSpec::truncated_normal(0.5, 0.2, 0.3, 0.7).unwrap();
    let values = spec.sample(N, &mut SimRng::from_seed(5)).unwrap();

    assert!(values.iter().all(|v| (0.3..=0.7).contains(v)));
    assert_abs_diff_eq!(mean(&values), 0.5, epsilon = 0.005);
}

/// Clipping puts an atom at each boundary for wide normals.
#[test]
fn test_wide_normal_has_boundary_atoms() {
    let spec = DistributionSpec::normal(0.5, 0.5).unwrap();
    let values = spec.sample(N, &mut SimRng::from_seed(8)).unwrap();

    let at_zero = values.iter().filter(|v| **v == 0.0).count() as f64 / N as f64;
    let at_one = values.iter().filter(|v| **v == 1.0).count() as f64 / N as f64;

    // P(Z < -1) ~= 0.159
    assert_abs_diff_eq!(at_zero, 0.159, epsilon = 0.01);
    assert_abs_diff_eq!(at_one, 0.159, epsilon = 0.01);
}

// ============================================================================
// Correlated sampling
// ============================================================================

/// Sample correlation follows the requested matrix away from the clip bounds.
#[test]
fn test_correlated_sample_follows_matrix() {
    let corr = CorrelationMatrix::from_rows(&[
        vec![1.0, 0.6, -0.3],
        vec![0.6, 1.0, 0.0],
        vec![-0.3, 0.0, 1.0],
    ])
    .unwrap();
    let spec = CorrelatedSpec::new(vec![0.5; 3], vec![0.05; 3], corr).unwrap();
    let strategy = SamplingStrategy::correlated(spec).unwrap();

    let rows = strategy.sample(N, &mut SimRng::from_seed(99)).unwrap();
    let x0 = column(&rows, 3, 0);
    let x1 = column(&rows, 3, 1);
    let x2 = column(&rows, 3, 2);

    assert_abs_diff_eq!(pearson(&x0, &x1), 0.6, epsilon = 0.02);
    assert_abs_diff_eq!(pearson(&x0, &x2), -0.3, epsilon = 0.02);
    assert_abs_diff_eq!(pearson(&x1, &x2), 0.0, epsilon = 0.02);
    assert_abs_diff_eq!(mean(&x0), 0.5, epsilon = 0.002);
}

/// Independent columns are uncorrelated.
#[test]
fn test_independent_columns_uncorrelated() {
    let strategy = SamplingStrategy::independent(vec![
        DistributionSpec::beta(2.0, 2.0).unwrap(),
        DistributionSpec::beta(2.0, 2.0).unwrap(),
    ])
    .unwrap();

    let rows = strategy.sample(N, &mut SimRng::from_seed(17)).unwrap();
    let r = pearson(&column(&rows, 2, 0), &column(&rows, 2, 1));
    assert!(r.abs() < 0.02, "independent columns correlated: {}", r);
}

/// A correlation matrix that is symmetric but indefinite never samples.
#[test]
fn test_indefinite_matrix_rejected_before_sampling() {
    let corr = CorrelationMatrix::from_rows(&[
        vec![1.0, 0.9, -0.9],
        vec![0.9, 1.0, 0.9],
        vec![-0.9, 0.9, 1.0],
    ])
    .unwrap();
    let spec = CorrelatedSpec {
        means: vec![0.5; 3],
        stds: vec![0.1; 3],
        correlation: corr,
    };

    let result = SamplingStrategy::correlated(spec);
    assert!(matches!(
        result,
        Err(ConfigError::NotPositiveSemiDefinite { .. })
    ));
}

// ============================================================================
// Reproducibility
// ============================================================================

/// Same seed, same strategy, same rows.
#[test]
fn test_strategy_sampling_is_reproducible() {
    let strategy = SamplingStrategy::independent(vec![
        DistributionSpec::truncated_normal(0.86, 0.06, 0.5, 1.0).unwrap(),
        DistributionSpec::triangular(0.45, 0.75, 0.95).unwrap(),
    ])
    .unwrap();

    let a = strategy.sample(1_000, &mut SimRng::from_seed(123)).unwrap();
    let b = strategy.sample(1_000, &mut SimRng::from_seed(123)).unwrap();
    let c = strategy.sample(1_000, &mut SimRng::from_seed(124)).unwrap();

    assert_eq!(a, b);
    assert_ne!(a, c);
}
