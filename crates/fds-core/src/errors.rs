//! Error types for fdsabr.
//!
//! Every fallible operation in the workspace returns [`Result`] with the
//! single [`Error`] enum defined here.  Input-contract violations are raised
//! with [`ensure!`](crate::ensure), numerical breakdowns with
//! [`ensure_post!`](crate::ensure_post) and [`fail!`](crate::fail).

use thiserror::Error;

/// The top-level error type used throughout fdsabr.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum Error {
    /// A price, density or volatility was requested before the density
    /// solve reached the converged state.
    #[error("probability density is not ready: solve has not converged")]
    NotReady,

    /// Model parameters or solver settings lie outside the supported domain
    /// (e.g. `beta = 1`, non-positive grid size).
    #[error("invalid domain: {0}")]
    InvalidDomain(String),

    /// The discretised system became singular, or the time-stepped state is
    /// no longer finite.
    #[error("numerically degenerate: {0}")]
    NumericalDegenerate(String),

    /// The implied-volatility root finder could not match a premium.
    ///
    /// Local to one strike; sibling strikes of a batch are unaffected.
    #[error("volatility inversion failed at strike {strike}: {reason}")]
    VolatilityInversionFailed {
        /// The strike whose premium could not be inverted.
        strike: f64,
        /// Why the inversion failed.
        reason: String,
    },
}

/// Shorthand `Result` type used throughout fdsabr.
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Input-contract check.
///
/// Returns `Err(Error::InvalidDomain(...))` if `$cond` is false.
///
/// # Example
/// ```
/// use fds_core::{ensure, errors::Error};
/// fn positive(x: f64) -> fds_core::errors::Result<f64> {
///     ensure!(x > 0.0, "x must be positive, got {x}");
///     Ok(x)
/// }
/// assert!(positive(1.0).is_ok());
/// assert!(matches!(positive(-1.0), Err(Error::InvalidDomain(_))));
/// ```
#[macro_export]
macro_rules! ensure {
    ($cond:expr, $($msg:tt)*) => {
        if !$cond {
            return Err($crate::errors::Error::InvalidDomain(
                format!($($msg)*)
            ));
        }
    };
}

/// Numerical postcondition check.
///
/// Returns `Err(Error::NumericalDegenerate(...))` if `$cond` is false.
///
/// # Example
/// ```
/// use fds_core::{ensure_post, errors::Error};
/// fn halve(x: f64) -> fds_core::errors::Result<f64> {
///     let result = x / 2.0;
///     ensure_post!(result.is_finite(), "result must be finite, got {result}");
///     Ok(result)
/// }
/// assert!(halve(1.0).is_ok());
/// assert!(matches!(halve(f64::NAN), Err(Error::NumericalDegenerate(_))));
/// ```
#[macro_export]
macro_rules! ensure_post {
    ($cond:expr, $($msg:tt)*) => {
        if !$cond {
            return Err($crate::errors::Error::NumericalDegenerate(
                format!($($msg)*)
            ));
        }
    };
}

/// Returns `Err(Error::NumericalDegenerate(...))` immediately.
///
/// # Example
/// ```
/// use fds_core::{fail, errors::Error};
/// fn always_err() -> fds_core::errors::Result<()> {
///     fail!("pivot vanished");
/// }
/// assert!(always_err().is_err());
/// ```
#[macro_export]
macro_rules! fail {
    ($($msg:tt)*) => {
        return Err($crate::errors::Error::NumericalDegenerate(format!($($msg)*)))
    };
}
