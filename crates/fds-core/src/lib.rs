//! # fds-core
//!
//! Core types, error definitions, and solver settings for fdsabr.
//!
//! This crate provides the foundational building blocks shared across all
//! other crates in the workspace – type aliases, the error enum with its
//! `ensure!` / `ensure_post!` / `fail!` macros, and [`FdSabrSettings`].

#![warn(missing_docs)]
#![forbid(unsafe_code)]

// ── Public modules ───────────────────────────────────────────────────────────

/// Error types and the `ensure!` / `fail!` / `ensure_post!` macros.
pub mod errors;

/// Discretisation settings for the density solver.
pub mod settings;

// ── Primitive type aliases ────────────────────────────────────────────────────

/// Floating-point type used throughout the library.
pub type Real = f64;

/// Alias used for array sizes / indices.
pub type Size = usize;

/// A price or value.
pub type Price = Real;

/// A volatility level expressed as a decimal.
pub type Volatility = Real;

/// A time measurement in years.
pub type Time = Real;

/// A discount factor in [0, 1].
pub type DiscountFactor = Real;

// ── Re-exports for convenience ────────────────────────────────────────────────

pub use errors::{Error, Result};
pub use settings::{FdSabrSettings, SabrVariant};
