//! Criterion benchmarks for risk_core sampling.
//!
//! Benchmarks cover:
//! - Single-dimension draws for each distribution variant
//! - Truncated normal rejection at different acceptance rates
//! - Correlated row generation (Cholesky transform)
//! - Independent strategy row generation

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use risk_core::{
    CholeskyFactor, CorrelatedSpec, CorrelationMatrix, DistributionSpec, SamplingStrategy, SimRng,
    DEFAULT_MAX_REJECTION_ATTEMPTS,
};

/// Benchmark each distribution variant for a fixed draw count.
fn bench_distribution_fill(c: &mut Criterion) {
    let mut group = c.benchmark_group("distribution_fill");
    let specs = [
        DistributionSpec::Uniform { min: 0.3, max: 0.9 },
        DistributionSpec::Normal { mean: 0.5, std: 0.15 },
        DistributionSpec::Beta { alpha: 5.5, beta: 9.0 },
        DistributionSpec::Triangular { min: 0.45, mode: 0.75, max: 0.95 },
        DistributionSpec::TruncatedNormal { mean: 0.86, std: 0.06, min: 0.5, max: 1.0 },
    ];

    for spec in specs {
        let mut buffer = vec![0.0; 10_000];
        group.bench_with_input(BenchmarkId::new("fill", spec.name()), &spec, |b, spec| {
            let mut rng = SimRng::from_seed(42);
            b.iter(|| {
                spec.fill(black_box(&mut buffer), &mut rng, DEFAULT_MAX_REJECTION_ATTEMPTS)
            });
        });
    }

    group.finish();
}

/// Benchmark truncated normal rejection as acceptance probability falls.
fn bench_truncated_normal_acceptance(c: &mut Criterion) {
    let mut group = c.benchmark_group("truncated_normal_acceptance");

    // Lower bound in standard deviations above the mean
    for sigmas in [0.0_f64, 1.0, 2.0, 3.0] {
        let min = 0.5 + 0.1 * sigmas;
        let spec = DistributionSpec::TruncatedNormal { mean: 0.5, std: 0.1, min, max: 1.0 };
        let mut buffer = vec![0.0; 1_000];
        group.bench_with_input(
            BenchmarkId::new("sigmas", format!("{:.0}", sigmas)),
            &spec,
            |b, spec| {
                let mut rng = SimRng::from_seed(7);
                b.iter(|| {
                    spec.fill(black_box(&mut buffer), &mut rng, DEFAULT_MAX_REJECTION_ATTEMPTS)
                });
            },
        );
    }

    group.finish();
}

/// Equicorrelated matrix of the given dimension.
fn equicorrelated(dim: usize, rho: f64) -> CorrelationMatrix {
    let data: Vec<f64> = (0..dim * dim)
        .map(|k| if k / dim == k % dim { 1.0 } else { rho })
        .collect();
    CorrelationMatrix::new(&data, dim).expect("valid equicorrelation")
}

/// Benchmark Cholesky factorisation by dimension.
fn bench_cholesky(c: &mut Criterion) {
    let mut group = c.benchmark_group("cholesky");

    for dim in [3, 10, 50] {
        let corr = equicorrelated(dim, 0.4);
        let cov: Vec<f64> = (0..dim * dim).map(|k| corr.get(k / dim, k % dim) * 0.01).collect();
        group.bench_with_input(BenchmarkId::new("decompose", dim), &cov, |b, cov| {
            b.iter(|| CholeskyFactor::decompose(black_box(cov), dim));
        });
    }

    group.finish();
}

/// Benchmark row generation for both strategies.
fn bench_strategy_rows(c: &mut Criterion) {
    let mut group = c.benchmark_group("strategy_rows");
    let n_rows = 1_000;

    let independent = SamplingStrategy::independent(vec![
        DistributionSpec::Beta { alpha: 5.5, beta: 9.0 },
        DistributionSpec::Triangular { min: 0.45, mode: 0.75, max: 0.95 },
        DistributionSpec::TruncatedNormal { mean: 0.86, std: 0.06, min: 0.5, max: 1.0 },
    ])
    .expect("valid strategy");

    let spec = CorrelatedSpec::new(
        vec![0.6, 0.65, 0.7],
        vec![0.12, 0.1, 0.08],
        equicorrelated(3, 0.5),
    )
    .expect("valid spec");
    let correlated = SamplingStrategy::correlated(spec).expect("valid strategy");

    for strategy in [independent, correlated] {
        let sampler = strategy
            .row_sampler(DEFAULT_MAX_REJECTION_ATTEMPTS)
            .expect("valid sampler");
        let mut rows = vec![0.0; n_rows * sampler.dims()];
        group.bench_function(strategy.method_name(), |b| {
            let mut rng = SimRng::from_seed(11);
            b.iter(|| sampler.fill_rows(black_box(&mut rows), &mut rng));
        });
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_distribution_fill,
    bench_truncated_normal_acceptance,
    bench_cholesky,
    bench_strategy_rows,
);
criterion_main!(benches);
