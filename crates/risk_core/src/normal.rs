//! Standard normal cumulative distribution function.
//!
//! Used to compute the acceptance probability of truncated normal
//! distributions during validation.

use num_traits::Float;

/// Square root of 2.
const SQRT_2: f64 = std::f64::consts::SQRT_2;

/// Complementary error function approximation (Abramowitz and Stegun 7.1.26).
///
/// Maximum absolute error of 1.5e-7 for all x.
#[inline]
fn erfc_approx<T: Float>(x: T) -> T {
    let one = T::one();
    let abs_x = x.abs();

    let a1 = T::from(0.254829592).unwrap_or_else(T::zero);
    let a2 = T::from(-0.284496736).unwrap_or_else(T::zero);
    let a3 = T::from(1.421413741).unwrap_or_else(T::zero);
    let a4 = T::from(-1.453152027).unwrap_or_else(T::zero);
    let a5 = T::from(1.061405429).unwrap_or_else(T::zero);
    let p = T::from(0.3275911).unwrap_or_else(T::zero);

    let t = one / (one + p * abs_x);
    let poly = a1 + t * (a2 + t * (a3 + t * (a4 + t * a5)));
    let erfc_abs = t * poly * (-abs_x * abs_x).exp();

    // erfc(-x) = 2 - erfc(x)
    if x < T::zero() {
        (one + one) - erfc_abs
    } else {
        erfc_abs
    }
}

/// Standard normal CDF, Φ(x) = erfc(-x / √2) / 2.
///
/// Infinite arguments map to 0 and 1.
///
/// # Examples
/// ```
/// use risk_core::normal::norm_cdf;
///
/// assert!((norm_cdf(0.0_f64) - 0.5).abs() < 1e-7);
/// assert!(norm_cdf(-3.0_f64) < 0.01);
/// assert_eq!(norm_cdf(f64::INFINITY), 1.0);
/// ```
#[inline]
pub fn norm_cdf<T: Float>(x: T) -> T {
    if x.is_infinite() {
        return if x > T::zero() { T::one() } else { T::zero() };
    }
    let sqrt_2 = T::from(SQRT_2).unwrap_or_else(T::one);
    let half = T::from(0.5).unwrap_or_else(T::zero);
    half * erfc_approx(-x / sqrt_2)
}
