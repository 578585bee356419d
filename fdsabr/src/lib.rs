//! # fdsabr
//!
//! Finite-difference solver for the terminal density of the SABR model,
//! after Le Floc'h and Kennedy, "Finite difference techniques for arbitrage
//! free SABR".  Prices, densities and implied volatilities are extracted from
//! the discretised density.
//!
//! This crate is a **façade** that re-exports all public items from the
//! underlying workspace crates.
//!
//! ## Quick start
//!
//! ```rust
//! use fdsabr::prelude::*;
//!
//! let params = ModelParameters::new(0.0488, 0.026, 0.5, 0.4, -0.1, 0.02, 1.0).unwrap();
//! let solution = build_density(params, FdSabrSettings::default()).unwrap();
//!
//! let atm = solution.price_call(params.forward);
//! assert!(atm > 0.0 && atm < params.forward);
//!
//! let vols = solution.volatility(&[0.03, 0.0488, 0.07], VolatilityType::ShiftedLognormal);
//! assert!(vols.iter().all(|v| matches!(v, Ok(Some(_)))));
//! ```

#![warn(missing_docs)]
#![forbid(unsafe_code)]

/// Core types, aliases, error definitions and solver settings.
pub use fds_core as core;

/// Normal distribution, root finders and interpolation.
pub use fds_math as math;

/// Tridiagonal solves and the Lawson–Swayne scheme.
pub use fds_methods as methods;

/// SABR parameters, coordinate transforms, grids and the Hagan formula.
pub use fds_models as models;

/// Density solver, price/density/volatility extraction, Black formulas.
pub use fds_pricingengines as pricingengines;

/// The items most callers need.
pub mod prelude {
    pub use fds_core::{Error, FdSabrSettings, Result, SabrVariant};
    pub use fds_models::{
        CoordinateTransform, FreeBoundary, HaganSabr, ModelParameters, PositiveForward,
    };
    pub use fds_pricingengines::{
        build_density, build_density_with, BachelierInverter, CachedSolution, FdSabrSolver,
        OptionType, ShiftedBlackInverter, SolverStatus, VolatilityInverter, VolatilityType,
    };
}
