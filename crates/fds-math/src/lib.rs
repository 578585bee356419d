//! # fds-math
//!
//! Mathematical utilities: the standard normal distribution (via statrs),
//! 1-D bracketing root finders, and piecewise-linear interpolation.

#![warn(missing_docs)]
#![forbid(unsafe_code)]

// ── Modules ───────────────────────────────────────────────────────────────────

/// Probability distributions.
pub mod distributions;

/// 1D interpolation schemes.
pub mod interpolations;

/// 1D root-finding solvers.
pub mod solvers1d;

// ── Convenience re-exports ────────────────────────────────────────────────────

pub use distributions::{normal_cdf, normal_pdf};
pub use interpolations::{Interpolation1D, LinearInterpolation};
pub use solvers1d::{bisection, brent};
