//! Standard normal distribution.

use fds_core::Real;
use statrs::function::erf::erfc;
use std::f64::consts::{PI, SQRT_2};

/// The standard normal probability density function.
///
/// `φ(x) = exp(-x²/2) / √(2π)`
#[inline]
pub fn normal_pdf(x: Real) -> Real {
    (-0.5 * x * x).exp() / (2.0 * PI).sqrt()
}

/// The standard normal cumulative distribution function Φ(x).
///
/// Evaluated as `½·erfc(-x/√2)`, which keeps full relative precision in the
/// lower tail where out-of-the-money Black prices live.
#[inline]
pub fn normal_cdf(x: Real) -> Real {
    if x == 0.0 {
        return 0.5;
    }
    0.5 * erfc(-x / SQRT_2)
}
