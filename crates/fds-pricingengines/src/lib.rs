//! # fds-pricingengines
//!
//! Option prices, densities and implied volatilities from the
//! finite-difference SABR density.
//!
//! ## Engines
//!
//! - [`FdSabrSolver`]: stateful solver (uninitialized → stepping → converged)
//! - [`build_density`]: one-shot solve returning a [`CachedSolution`]
//! - [`black_formula`]: Black / Bachelier formulas and implied-volatility inverters

#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod black_formula;
pub mod fd_sabr;

pub use black_formula::{
    bachelier_formula_implied_std_dev, bachelier_formula_std_dev, black_formula_implied_std_dev,
    black_formula_std_dev, BachelierInverter, OptionType, ShiftedBlackInverter,
    VolatilityInverter, VolatilityType,
};
pub use fd_sabr::{
    build_density, build_density_with, solve_step, CachedSolution, DensityState, FdSabrSolver,
    LawsonSwayneStepper, SolverStatus,
};
