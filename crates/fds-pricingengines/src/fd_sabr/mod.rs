//! Finite-difference SABR density on the transformed coordinate.
//!
//! ```text
//! ModelParameters + FdSabrSettings
//!        │  build_grid
//!        ▼
//! LawsonSwayneStepper ── step()* ──▶ finish() ──▶ CachedSolution
//!                                                  ├── price_call / price_put
//!                                                  ├── density
//!                                                  └── volatility
//! ```
//!
//! [`FdSabrSolver`] wraps the same pipeline behind a readiness state;
//! [`build_density`] is the one-shot entry point.

mod solution;
mod solver;
mod stepper;

pub use solution::CachedSolution;
pub use solver::{FdSabrSolver, SolverStatus};
pub use stepper::{solve_step, DensityState, LawsonSwayneStepper};

use fds_core::{errors::Result, FdSabrSettings, SabrVariant};
use fds_models::{CoordinateTransform, ModelParameters};

/// Solve the density for the variant named in `settings`.
pub fn build_density(
    params: ModelParameters,
    settings: FdSabrSettings,
) -> Result<CachedSolution<SabrVariant>> {
    build_density_with(settings.variant, params, settings)
}

/// Solve the density with an explicit coordinate transform.
pub fn build_density_with<T: CoordinateTransform>(
    transform: T,
    params: ModelParameters,
    settings: FdSabrSettings,
) -> Result<CachedSolution<T>> {
    LawsonSwayneStepper::new(transform, params, settings)?.finish()
}
