//! Solver front end with an explicit readiness state.

use super::solution::CachedSolution;
use super::stepper::LawsonSwayneStepper;
use crate::black_formula::{OptionType, VolatilityInverter, VolatilityType};
use fds_core::{
    errors::{Error, Result},
    DiscountFactor, FdSabrSettings, Price, Real, SabrVariant, Size, Volatility,
};
use fds_models::{CoordinateTransform, ModelParameters};
use std::sync::Arc;

/// Where a [`FdSabrSolver`] is in its life cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SolverStatus {
    /// Parameters are set, nothing has been computed.
    Uninitialized,
    /// Time stepping is in progress.
    Stepping {
        /// Increments performed so far.
        steps_taken: Size,
        /// Increments to maturity.
        timesteps: Size,
    },
    /// A converged solution is available.
    Converged,
}

#[derive(Debug)]
enum SolverState<T> {
    Uninitialized,
    Stepping(Box<LawsonSwayneStepper<T>>),
    Converged(Arc<CachedSolution<T>>),
}

/// Finite-difference SABR density solver.
///
/// Queries fail with [`Error::NotReady`] until the solver has converged.
/// A converged solution is immutable; [`rebuild`](Self::rebuild) starts over
/// with new parameters and leaves previously handed out solutions untouched.
///
/// ```
/// use fds_core::{FdSabrSettings, SabrVariant};
/// use fds_models::ModelParameters;
/// use fds_pricingengines::FdSabrSolver;
///
/// let params = ModelParameters::new(0.0488, 0.026, 0.5, 0.4, -0.1, 0.02, 1.0).unwrap();
/// let mut solver = FdSabrSolver::new(params, FdSabrSettings::new(SabrVariant::FreeBoundary)).unwrap();
/// assert!(solver.price_call(0.05).is_err());
/// solver.solve().unwrap();
/// assert!(solver.price_call(0.05).unwrap() > 0.0);
/// ```
#[derive(Debug)]
pub struct FdSabrSolver<T = SabrVariant> {
    transform: T,
    params: ModelParameters,
    settings: FdSabrSettings,
    state: SolverState<T>,
}

impl FdSabrSolver<SabrVariant> {
    /// Solver for the variant named in `settings`.
    pub fn new(params: ModelParameters, settings: FdSabrSettings) -> Result<Self> {
        Self::with_transform(settings.variant, params, settings)
    }
}

impl<T: CoordinateTransform + Clone> FdSabrSolver<T> {
    /// Solver for an explicit coordinate transform.
    ///
    /// Inputs are validated here so that a constructed solver can always be
    /// stepped.
    pub fn with_transform(
        transform: T,
        params: ModelParameters,
        settings: FdSabrSettings,
    ) -> Result<Self> {
        settings.validate()?;
        params.validate()?;
        transform.validate(&params)?;
        Ok(Self {
            transform,
            params,
            settings,
            state: SolverState::Uninitialized,
        })
    }

    /// Current life-cycle state.
    pub fn status(&self) -> SolverStatus {
        match &self.state {
            SolverState::Uninitialized => SolverStatus::Uninitialized,
            SolverState::Stepping(s) => SolverStatus::Stepping {
                steps_taken: s.steps_taken(),
                timesteps: s.timesteps(),
            },
            SolverState::Converged(_) => SolverStatus::Converged,
        }
    }

    /// `true` once a solution is available.
    pub fn is_ready(&self) -> bool {
        matches!(self.state, SolverState::Converged(_))
    }

    /// Model parameters.
    pub fn params(&self) -> &ModelParameters {
        &self.params
    }

    /// Solver settings.
    pub fn settings(&self) -> &FdSabrSettings {
        &self.settings
    }

    /// Discard any progress and start over with new parameters.
    ///
    /// On error the solver keeps its previous parameters and state.
    pub fn rebuild(&mut self, params: ModelParameters) -> Result<()> {
        params.validate()?;
        self.transform.validate(&params)?;
        self.params = params;
        self.state = SolverState::Uninitialized;
        Ok(())
    }

    /// Perform one time increment, starting the solve if needed.
    ///
    /// The solver converges on the increment that reaches maturity.  A
    /// failure resets it to [`SolverStatus::Uninitialized`].
    pub fn step(&mut self) -> Result<SolverStatus> {
        let state = std::mem::replace(&mut self.state, SolverState::Uninitialized);
        self.state = match state {
            SolverState::Converged(sol) => SolverState::Converged(sol),
            SolverState::Uninitialized => self.advance(Box::new(self.stepper()?))?,
            SolverState::Stepping(stepper) => self.advance(stepper)?,
        };
        Ok(self.status())
    }

    fn stepper(&self) -> Result<LawsonSwayneStepper<T>> {
        LawsonSwayneStepper::new(self.transform.clone(), self.params, self.settings)
    }

    fn advance(&self, mut stepper: Box<LawsonSwayneStepper<T>>) -> Result<SolverState<T>> {
        stepper.step()?;
        if stepper.is_complete() {
            Ok(SolverState::Converged(Arc::new(stepper.finish()?)))
        } else {
            Ok(SolverState::Stepping(stepper))
        }
    }

    /// Run to convergence and return the solution.
    pub fn solve(&mut self) -> Result<Arc<CachedSolution<T>>> {
        let state = std::mem::replace(&mut self.state, SolverState::Uninitialized);
        let solution = match state {
            SolverState::Converged(sol) => sol,
            SolverState::Uninitialized => Arc::new(self.stepper()?.finish()?),
            SolverState::Stepping(stepper) => Arc::new(stepper.finish()?),
        };
        self.state = SolverState::Converged(Arc::clone(&solution));
        Ok(solution)
    }

    /// The converged solution.
    ///
    /// # Errors
    /// [`Error::NotReady`] before convergence.
    pub fn solution(&self) -> Result<Arc<CachedSolution<T>>> {
        self.ready().map(Arc::clone)
    }

    fn ready(&self) -> Result<&Arc<CachedSolution<T>>> {
        match &self.state {
            SolverState::Converged(sol) => Ok(sol),
            _ => Err(Error::NotReady),
        }
    }

    /// See [`CachedSolution::price_call`].
    pub fn price_call(&self, strike: Real) -> Result<Price> {
        Ok(self.ready()?.price_call(strike))
    }

    /// See [`CachedSolution::price_put`].
    pub fn price_put(&self, strike: Real) -> Result<Price> {
        Ok(self.ready()?.price_put(strike))
    }

    /// See [`CachedSolution::option_price`].
    pub fn option_price(
        &self,
        strike: Real,
        option_type: OptionType,
        discount: DiscountFactor,
    ) -> Result<Price> {
        Ok(self.ready()?.option_price(strike, option_type, discount))
    }

    /// See [`CachedSolution::density`].
    pub fn density(&self, strikes: &[Real]) -> Result<Vec<Real>> {
        Ok(self.ready()?.density(strikes))
    }

    /// See [`CachedSolution::density_discounted`].
    pub fn density_discounted(
        &self,
        strikes: &[Real],
        discount: DiscountFactor,
    ) -> Result<Vec<Real>> {
        Ok(self.ready()?.density_discounted(strikes, discount))
    }

    /// See [`CachedSolution::volatility`].
    pub fn volatility(
        &self,
        strikes: &[Real],
        kind: VolatilityType,
    ) -> Result<Vec<Result<Option<Volatility>>>> {
        Ok(self.ready()?.volatility(strikes, kind))
    }

    /// See [`CachedSolution::volatility_with`].
    pub fn volatility_with(
        &self,
        strikes: &[Real],
        inverter: &dyn VolatilityInverter,
    ) -> Result<Vec<Result<Option<Volatility>>>> {
        Ok(self.ready()?.volatility_with(strikes, inverter))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fds_models::PositiveForward;

    fn params() -> ModelParameters {
        ModelParameters::new(0.0488, 0.026, 0.5, 0.4, -0.1, 0.02, 1.0).unwrap()
    }

    #[test]
    fn queries_fail_until_converged() {
        let mut solver = FdSabrSolver::new(params(), FdSabrSettings::default()).unwrap();
        assert_eq!(solver.status(), SolverStatus::Uninitialized);
        assert_eq!(solver.price_call(0.05), Err(Error::NotReady));
        assert_eq!(solver.density(&[0.05]), Err(Error::NotReady));
        assert!(matches!(
            solver.volatility(&[0.05], VolatilityType::Normal),
            Err(Error::NotReady)
        ));
        assert!(matches!(solver.solution(), Err(Error::NotReady)));

        solver.step().unwrap();
        assert_eq!(
            solver.status(),
            SolverStatus::Stepping { steps_taken: 1, timesteps: 100 }
        );
        assert_eq!(solver.price_call(0.05), Err(Error::NotReady));

        solver.solve().unwrap();
        assert!(solver.is_ready());
        assert!(solver.price_call(0.05).unwrap() > 0.0);
    }

    #[test]
    fn stepping_to_maturity_matches_direct_solve() {
        let settings = FdSabrSettings::default().with_timesteps(10);
        let mut stepped = FdSabrSolver::with_transform(PositiveForward, params(), settings).unwrap();
        let mut status = SolverStatus::Uninitialized;
        for _ in 0..10 {
            status = stepped.step().unwrap();
        }
        assert_eq!(status, SolverStatus::Converged);
        // further steps are no-ops
        assert_eq!(stepped.step().unwrap(), SolverStatus::Converged);

        let mut direct = FdSabrSolver::with_transform(PositiveForward, params(), settings).unwrap();
        let a = stepped.solution().unwrap();
        let b = direct.solve().unwrap();
        assert_eq!(a.state(), b.state());
    }

    #[test]
    fn rebuild_resets_and_keeps_old_solution() {
        let mut solver = FdSabrSolver::new(params(), FdSabrSettings::default()).unwrap();
        let first = solver.solve().unwrap();
        let old_price = first.price_call(0.05);

        solver.rebuild(ModelParameters { nu: 0.6, ..params() }).unwrap();
        assert_eq!(solver.status(), SolverStatus::Uninitialized);
        assert_eq!(solver.price_call(0.05), Err(Error::NotReady));
        let second = solver.solve().unwrap();
        assert_ne!(second.price_call(0.05), old_price);
        assert_eq!(first.price_call(0.05), old_price);
    }

    #[test]
    fn invalid_rebuild_keeps_state() {
        let mut solver = FdSabrSolver::new(params(), FdSabrSettings::default()).unwrap();
        solver.solve().unwrap();
        let beta_one = ModelParameters { beta: 1.0, ..params() };
        assert!(matches!(solver.rebuild(beta_one), Err(Error::InvalidDomain(_))));
        assert!(solver.is_ready());
        assert_eq!(solver.params().beta, 0.5);
    }

    #[test]
    fn construction_validates_inputs() {
        let beta_one = ModelParameters { beta: 1.0, ..params() };
        assert!(matches!(
            FdSabrSolver::new(beta_one, FdSabrSettings::default()),
            Err(Error::InvalidDomain(_))
        ));
        assert!(FdSabrSolver::new(params(), FdSabrSettings::default().with_grid_size(2)).is_err());
    }
}
