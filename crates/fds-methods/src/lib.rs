//! # fds-methods
//!
//! Finite-difference building blocks: a tridiagonal operator with a checked
//! Thomas-algorithm solve, and the coefficients of the Lawson–Swayne
//! two-stage time integrator.
//!
//! # Modules
//!
//! * [`finite_differences`]: tridiagonal solver and Lawson–Swayne scheme

#![warn(missing_docs)]
#![forbid(unsafe_code)]

// ── Modules ───────────────────────────────────────────────────────────────────

/// Finite difference methods: tridiagonal solver, time-stepping scheme.
pub mod finite_differences;

// ── Convenience re-exports ────────────────────────────────────────────────────

pub use finite_differences::{LawsonSwayne, TridiagonalOperator};
