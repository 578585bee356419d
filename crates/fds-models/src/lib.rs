//! # fds-models
//!
//! The SABR model on a transformed coordinate.
//!
//! ```text
//! ModelParameters ──▶ CoordinateTransform ──▶ build_grid ──▶ (GridSpec, TransformedArrays)
//!                     ├── PositiveForward
//!                     ├── FreeBoundary
//!                     └── SabrVariant (runtime choice)
//! ```
//!
//! [`hagan`] holds the closed-form Hagan smile used as a benchmark.

#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod grid;
pub mod hagan;
pub mod parameters;
pub mod transform;

pub use grid::{build_grid, compute_boundaries, GridSpec, TransformedArrays};
pub use hagan::{hagan_volatility, HaganSabr};
pub use parameters::ModelParameters;
pub use transform::{
    y_of_z, z_of_y, Boundaries, CoordinateTransform, FreeBoundary, PositiveForward,
};
