//! Correlated multi-dimension sampling via Cholesky decomposition.
//!
//! ## Mathematical Background
//!
//! Given per-dimension means `μ`, standard deviations `σ` and a correlation
//! matrix `R`, the covariance is
//!
//! ```text
//! Σ = D · R · D,    D = diag(σ)
//! ```
//!
//! With `Σ = L · Lᵀ` (lower triangular `L`) and independent standard normals
//! `Z`, the vector `X = μ + L · Z` is multivariate normal with covariance `Σ`.
//! Each marginal is then clipped to `[0, 1]`.
//!
//! `Σ` only needs to be positive *semi*-definite: perfectly correlated
//! dimensions or zero standard deviations produce zero pivots, which are
//! accepted as long as the rest of their column is zero as well. Anything
//! else fails with [`ConfigError::NotPositiveSemiDefinite`] before a single
//! value is drawn.
//!
//! ## Usage
//!
//! ```
//! use risk_core::correlation::{CorrelatedSpec, CorrelationMatrix};
//! use risk_core::rng::SimRng;
//!
//! let corr = CorrelationMatrix::new(&[
//!     1.00, 0.58, 0.36,
//!     0.58, 1.00, 0.62,
//!     0.36, 0.62, 1.00,
//! ], 3).unwrap();
//!
//! let spec = CorrelatedSpec::new(vec![0.38, 0.86, 0.75], vec![0.05, 0.03, 0.08], corr).unwrap();
//! let sampler = spec.sampler().unwrap();
//!
//! let mut rng = SimRng::from_seed(42);
//! let rows = sampler.sample(100, &mut rng);
//! assert_eq!(rows.len(), 100 * 3);
//! assert!(rows.iter().all(|v| (0.0..=1.0).contains(v)));
//! ```

use crate::error::ConfigError;
use crate::rng::SimRng;
use serde::{Deserialize, Serialize};

/// Tolerance for unit diagonal and symmetry checks.
const STRUCTURE_EPSILON: f64 = 1e-10;

/// Relative tolerance for zero pivots in the semi-definite factorisation.
const PIVOT_EPSILON: f64 = 1e-10;

/// Validated correlation matrix (row-major).
///
/// A correlation matrix must be:
/// - square and symmetric
/// - unit diagonal
/// - off-diagonal elements in [-1, 1]
///
/// Positive semi-definiteness is checked later, against the covariance built
/// from it, because that is the matrix actually factorised.
///
/// Serialises as nested rows, e.g. `[[1.0, 0.5], [0.5, 1.0]]`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<Vec<f64>>", into = "Vec<Vec<f64>>")]
pub struct CorrelationMatrix {
    /// Matrix elements in row-major order
    data: Vec<f64>,
    /// Matrix dimension (n x n)
    dim: usize,
}

impl CorrelationMatrix {
    /// Create a new correlation matrix from a flat row-major array.
    ///
    /// # Errors
    ///
    /// - `InvalidDimensions` unless `data.len() == dim * dim`
    /// - `InvalidDiagonal` for a diagonal element other than 1.0
    /// - `NotSymmetric` if `R[i][j] != R[j][i]`
    /// - `OutOfRange` for an element outside [-1, 1] (or NaN)
    pub fn new(data: &[f64], dim: usize) -> Result<Self, ConfigError> {
        let expected = dim * dim;
        if data.len() != expected {
            return Err(ConfigError::InvalidDimensions {
                expected,
                got: data.len(),
            });
        }

        for i in 0..dim {
            let diag = data[i * dim + i];
            if !((diag - 1.0).abs() <= STRUCTURE_EPSILON) {
                return Err(ConfigError::InvalidDiagonal {
                    index: i,
                    value: diag,
                });
            }
        }

        for i in 0..dim {
            for j in (i + 1)..dim {
                let val_ij = data[i * dim + j];
                let val_ji = data[j * dim + i];

                if !(-1.0..=1.0).contains(&val_ij) {
                    return Err(ConfigError::OutOfRange { i, j, value: val_ij });
                }
                if !((val_ij - val_ji).abs() <= STRUCTURE_EPSILON) {
                    return Err(ConfigError::NotSymmetric { i, j });
                }
            }
        }

        Ok(Self {
            data: data.to_vec(),
            dim,
        })
    }

    /// Create a correlation matrix from nested rows.
    pub fn from_rows(rows: &[Vec<f64>]) -> Result<Self, ConfigError> {
        let dim = rows.len();
        if let Some(bad) = rows.iter().find(|row| row.len() != dim) {
            return Err(ConfigError::InvalidDimensions {
                expected: dim,
                got: bad.len(),
            });
        }
        let flat: Vec<f64> = rows.iter().flatten().copied().collect();
        Self::new(&flat, dim)
    }

    /// Identity correlation matrix (independent dimensions).
    pub fn identity(dim: usize) -> Self {
        let mut data = vec![0.0; dim * dim];
        for i in 0..dim {
            data[i * dim + i] = 1.0;
        }
        Self { data, dim }
    }

    /// Matrix dimension.
    pub fn dim(&self) -> usize {
        self.dim
    }

    /// Element at (i, j).
    pub fn get(&self, i: usize, j: usize) -> f64 {
        self.data[i * self.dim + j]
    }

    /// Nested-row copy of the matrix.
    pub fn to_rows(&self) -> Vec<Vec<f64>> {
        self.data.chunks(self.dim.max(1)).map(<[f64]>::to_vec).collect()
    }

    /// Covariance `D · R · D` for the given standard deviations (row-major).
    fn covariance(&self, stds: &[f64]) -> Vec<f64> {
        let n = self.dim;
        let mut cov = vec![0.0; n * n];
        for i in 0..n {
            for j in 0..n {
                cov[i * n + j] = stds[i] * self.get(i, j) * stds[j];
            }
        }
        cov
    }
}

impl TryFrom<Vec<Vec<f64>>> for CorrelationMatrix {
    type Error = ConfigError;

    fn try_from(rows: Vec<Vec<f64>>) -> Result<Self, Self::Error> {
        Self::from_rows(&rows)
    }
}

impl From<CorrelationMatrix> for Vec<Vec<f64>> {
    fn from(matrix: CorrelationMatrix) -> Self {
        matrix.to_rows()
    }
}

/// Lower triangular factor `L` of a positive semi-definite covariance.
#[derive(Clone, Debug)]
pub struct CholeskyFactor {
    /// Lower triangular matrix elements (row-major)
    data: Vec<f64>,
    /// Matrix dimension
    dim: usize,
}

impl CholeskyFactor {
    /// Factorise a symmetric positive semi-definite matrix (row-major).
    ///
    /// Zero pivots (within a tolerance relative to that dimension's variance)
    /// are accepted only when the remainder of their column is also zero,
    /// again relative to the variances involved.
    ///
    /// # Errors
    ///
    /// `ConfigError::NotPositiveSemiDefinite` naming the failing dimension.
    pub fn decompose(matrix: &[f64], dim: usize) -> Result<Self, ConfigError> {
        let expected = dim * dim;
        if matrix.len() != expected {
            return Err(ConfigError::InvalidDimensions {
                expected,
                got: matrix.len(),
            });
        }

        let n = dim;
        let variance = |i: usize| matrix[i * n + i].abs();
        let mut lower = vec![0.0; n * n];

        for j in 0..n {
            let sum: f64 = (0..j).map(|k| lower[j * n + k] * lower[j * n + k]).sum();
            let pivot = matrix[j * n + j] - sum;
            let tol = PIVOT_EPSILON * variance(j);

            if pivot < -tol || pivot.is_nan() {
                return Err(ConfigError::NotPositiveSemiDefinite { index: j, pivot });
            }

            if pivot <= tol {
                // Dimension j is a linear combination of earlier ones. A pivot
                // of at most tol bounds each residual by sqrt(tol * var_i).
                for i in (j + 1)..n {
                    let residual = matrix[i * n + j]
                        - (0..j)
                            .map(|k| lower[i * n + k] * lower[j * n + k])
                            .sum::<f64>();
                    let bound = (PIVOT_EPSILON * variance(i) * variance(j)).sqrt();
                    if residual.is_nan() || residual.abs() > bound {
                        return Err(ConfigError::NotPositiveSemiDefinite {
                            index: j,
                            pivot: residual,
                        });
                    }
                }
                continue;
            }

            let l_jj = pivot.sqrt();
            lower[j * n + j] = l_jj;
            for i in (j + 1)..n {
                let sum: f64 = (0..j).map(|k| lower[i * n + k] * lower[j * n + k]).sum();
                lower[i * n + j] = (matrix[i * n + j] - sum) / l_jj;
            }
        }

        Ok(Self { data: lower, dim: n })
    }

    /// Matrix dimension.
    pub fn dim(&self) -> usize {
        self.dim
    }

    /// Element at (i, j); zero above the diagonal.
    pub fn get(&self, i: usize, j: usize) -> f64 {
        if j > i {
            0.0
        } else {
            self.data[i * self.dim + j]
        }
    }

    /// Computes `out = L · z`.
    ///
    /// # Panics
    ///
    /// Panics if `z` or `out` is shorter than `self.dim()`.
    pub fn transform_into(&self, z: &[f64], out: &mut [f64]) {
        assert!(
            z.len() >= self.dim && out.len() >= self.dim,
            "Buffers shorter than matrix dimension {}",
            self.dim
        );

        let n = self.dim;
        for i in 0..n {
            let row = &self.data[i * n..i * n + i + 1];
            out[i] = row.iter().zip(z).map(|(l, z)| l * z).sum();
        }
    }
}

/// Joint sampling specification: means, standard deviations and correlation.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CorrelatedSpec {
    /// Per-dimension means.
    pub means: Vec<f64>,
    /// Per-dimension standard deviations.
    pub stds: Vec<f64>,
    /// Pairwise correlation structure.
    pub correlation: CorrelationMatrix,
}

impl CorrelatedSpec {
    /// Creates and validates a correlated sampling specification.
    pub fn new(
        means: Vec<f64>,
        stds: Vec<f64>,
        correlation: CorrelationMatrix,
    ) -> Result<Self, ConfigError> {
        let spec = Self {
            means,
            stds,
            correlation,
        };
        spec.validate()?;
        Ok(spec)
    }

    /// Number of jointly sampled dimensions.
    pub fn dims(&self) -> usize {
        self.correlation.dim()
    }

    /// Checks shapes, finiteness and positive semi-definiteness of `D·R·D`.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.sampler().map(|_| ())
    }

    /// Builds the sampler, factorising the covariance.
    ///
    /// # Errors
    ///
    /// - `EmptyStrategy` for a zero-dimensional spec
    /// - `InvalidDimensions` if `means`/`stds` lengths differ from the matrix
    /// - `InvalidParameter` for non-finite means or negative/non-finite stds
    /// - `NotPositiveSemiDefinite` if `D·R·D` cannot be factorised
    pub fn sampler(&self) -> Result<CorrelatedSampler, ConfigError> {
        let dim = self.correlation.dim();
        if dim == 0 {
            return Err(ConfigError::EmptyStrategy);
        }
        for len in [self.means.len(), self.stds.len()] {
            if len != dim {
                return Err(ConfigError::InvalidDimensions {
                    expected: dim,
                    got: len,
                });
            }
        }
        if let Some(mean) = self.means.iter().find(|m| !m.is_finite()) {
            return Err(ConfigError::InvalidParameter {
                name: "means",
                value: format!("must be finite, got {}", mean),
            });
        }
        if let Some(std) = self.stds.iter().find(|s| !(s.is_finite() && **s >= 0.0)) {
            return Err(ConfigError::InvalidParameter {
                name: "stds",
                value: format!("must be finite and >= 0, got {}", std),
            });
        }

        let covariance = self.correlation.covariance(&self.stds);
        let factor = CholeskyFactor::decompose(&covariance, dim)?;

        Ok(CorrelatedSampler {
            means: self.means.clone(),
            factor,
        })
    }
}

/// Multivariate normal sampler with per-column clipping to `[0, 1]`.
#[derive(Clone, Debug)]
pub struct CorrelatedSampler {
    means: Vec<f64>,
    factor: CholeskyFactor,
}

impl CorrelatedSampler {
    /// Number of columns per row.
    pub fn dims(&self) -> usize {
        self.means.len()
    }

    /// Draws `n` rows, returned flat in row-major order (`n * dims` values).
    pub fn sample(&self, n: usize, rng: &mut SimRng) -> Vec<f64> {
        let mut rows = vec![0.0; n * self.dims()];
        self.fill_rows(&mut rows, rng);
        rows
    }

    /// Fills a row-major buffer whose length is a multiple of `dims`.
    ///
    /// # Panics
    ///
    /// Panics if `rows.len()` is not a multiple of `self.dims()`.
    pub fn fill_rows(&self, rows: &mut [f64], rng: &mut SimRng) {
        let dims = self.dims();
        assert_eq!(
            rows.len() % dims,
            0,
            "Row buffer length {} is not a multiple of {}",
            rows.len(),
            dims
        );

        let mut z = vec![0.0; dims];
        for row in rows.chunks_exact_mut(dims) {
            rng.fill_normal(&mut z);
            self.factor.transform_into(&z, row);
            for (value, mean) in row.iter_mut().zip(&self.means) {
                *value = (*value + mean).clamp(0.0, 1.0);
            }
        }
    }
}
