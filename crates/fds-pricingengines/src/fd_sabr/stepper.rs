//! Time stepping of the transformed SABR forward equation.
//!
//! Each implicit sub-step solves one tridiagonal system whose first and last
//! rows enforce zero flux through the ghost cells; the probability leaving the
//! physical domain is tallied in `pl` and `pr`.

use super::solution::CachedSolution;
use fds_core::{ensure, errors::Result, FdSabrSettings, Real, Size};
use fds_methods::{LawsonSwayne, TridiagonalOperator};
use fds_models::{build_grid, CoordinateTransform, GridSpec, ModelParameters, TransformedArrays};

/// Discretised density at one time level.
#[derive(Debug, Clone, PartialEq)]
pub struct DensityState {
    /// Density per cell, ghost entries included (size `J + 2`).
    pub p: Vec<Real>,
    /// Mass absorbed at the lower boundary.
    pub pl: Real,
    /// Mass absorbed at the upper boundary.
    pub pr: Real,
}

impl DensityState {
    /// Point mass `1/h` on the pivot cell.
    pub fn initial(layout: &GridSpec) -> Self {
        let mut p = vec![0.0; layout.node_count];
        p[layout.pivot] = 1.0 / layout.h;
        Self { p, pl: 0.0, pr: 0.0 }
    }

    /// `Σ p[i]·h` over the physical cells plus both absorbed masses.
    pub fn total_mass(&self, h: Real) -> Real {
        let m = self.p.len();
        self.p[1..m - 1].iter().sum::<Real>() * h + self.pl + self.pr
    }
}

/// One implicit Euler step of size `dt`.
///
/// `em` is the accumulated drift factor `exp(ρνα·Γ·t)` per cell.  The ghost
/// entries of the returned density are zero.
///
/// # Errors
/// `NumericalDegenerate` if the tridiagonal system is singular or the result
/// is not finite.
pub fn solve_step(
    fm: &[Real],
    cm: &[Real],
    em: &[Real],
    dt: Real,
    h: Real,
    state: &DensityState,
) -> Result<DensityState> {
    let m = state.p.len();
    ensure!(
        m >= 3 && fm.len() == m && cm.len() == m && em.len() == m,
        "array sizes disagree: p {m}, fm {}, cm {}, em {}",
        fm.len(),
        cm.len(),
        em.len()
    );
    let frac = dt / (2.0 * h);
    let ce: Vec<Real> = cm.iter().zip(em).map(|(c, e)| c * e).collect();
    let df: Vec<Real> = fm.windows(2).map(|w| w[1] - w[0]).collect();

    let mut op = TridiagonalOperator::new(m);
    op.diag[0] = ce[0] / df[0];
    op.upper[0] = ce[1] / df[0];
    for i in 1..m - 1 {
        op.lower[i] = -frac * ce[i - 1] / df[i - 1];
        op.diag[i] = 1.0 + frac * ce[i] * (1.0 / df[i] + 1.0 / df[i - 1]);
        op.upper[i] = -frac * ce[i + 1] / df[i];
    }
    op.lower[m - 1] = ce[m - 2] / df[m - 2];
    op.diag[m - 1] = ce[m - 1] / df[m - 2];

    let mut rhs = state.p.clone();
    rhs[0] = 0.0;
    rhs[m - 1] = 0.0;
    let mut p = op.solve(&rhs)?;

    let pl = state.pl + dt * ce[1] / df[0] * p[1];
    let pr = state.pr + dt * ce[m - 2] / df[m - 2] * p[m - 2];
    p[0] = 0.0;
    p[m - 1] = 0.0;
    Ok(DensityState { p, pl, pr })
}

/// Negative mass below which clipping is not reported.
const CLIP_WARN_MASS: Real = 1e-8;

/// Lawson–Swayne integration of the density from `t = 0` to maturity.
///
/// ```text
/// per increment:  E ← E·e1;  u1 = solve(dt1, u)
///                 E ← E·e1;  u2 = solve(dt1, u1)
///                 u ← (√2+1)·u2 − √2·u1
///                 E ← E·e2
/// ```
#[derive(Debug, Clone)]
pub struct LawsonSwayneStepper<T> {
    transform: T,
    params: ModelParameters,
    settings: FdSabrSettings,
    layout: GridSpec,
    arrays: TransformedArrays,
    scheme: LawsonSwayne,
    em: Vec<Real>,
    em_dt1: Vec<Real>,
    em_dt2: Vec<Real>,
    state: DensityState,
    steps_taken: Size,
}

impl<T: CoordinateTransform> LawsonSwayneStepper<T> {
    /// Validate the inputs, build the grid and place the initial point mass.
    pub fn new(transform: T, params: ModelParameters, settings: FdSabrSettings) -> Result<Self> {
        settings.validate()?;
        params.validate()?;
        transform.validate(&params)?;
        let (layout, arrays) =
            build_grid(&transform, &params, settings.grid_size, settings.boundary_width)?;

        let scheme = LawsonSwayne::new(params.maturity / settings.timesteps as Real);
        let drift = params.rho * params.nu * params.alpha;
        let growth = |dt: Real| -> Vec<Real> {
            let mut e: Vec<Real> = arrays.gamma.iter().map(|g| (drift * g * dt).exp()).collect();
            let last = e.len() - 1;
            e[0] = e[1];
            e[last] = e[last - 1];
            e
        };
        let em_dt1 = growth(scheme.dt1);
        let em_dt2 = growth(scheme.dt2);

        tracing::debug!(
            variant = transform.name(),
            timesteps = settings.timesteps,
            nodes = layout.node_count,
            dt = scheme.dt,
            "starting density solve"
        );

        Ok(Self {
            em: vec![1.0; layout.node_count],
            state: DensityState::initial(&layout),
            transform,
            params,
            settings,
            layout,
            arrays,
            scheme,
            em_dt1,
            em_dt2,
            steps_taken: 0,
        })
    }

    /// Advance by one increment.
    ///
    /// Returns `false` without doing anything once maturity is reached.
    pub fn step(&mut self) -> Result<bool> {
        if self.is_complete() {
            return Ok(false);
        }
        let (fm, cm, h, dt1) = (&self.arrays.fm, &self.arrays.cm, self.layout.h, self.scheme.dt1);

        mul_assign(&mut self.em, &self.em_dt1);
        let u1 = solve_step(fm, cm, &self.em, dt1, h, &self.state)?;
        mul_assign(&mut self.em, &self.em_dt1);
        let u2 = solve_step(fm, cm, &self.em, dt1, h, &u1)?;

        LawsonSwayne::combine_into(&u1.p, &u2.p, &mut self.state.p);
        self.state.pl = LawsonSwayne::combine(u1.pl, u2.pl);
        self.state.pr = LawsonSwayne::combine(u1.pr, u2.pr);
        mul_assign(&mut self.em, &self.em_dt2);

        self.steps_taken += 1;
        tracing::trace!(
            step = self.steps_taken,
            mass = self.state.total_mass(h),
            pl = self.state.pl,
            pr = self.state.pr,
            "density increment"
        );
        Ok(true)
    }

    /// Run all remaining increments.
    pub fn run(&mut self) -> Result<()> {
        while self.step()? {}
        Ok(())
    }

    /// Increments performed so far.
    pub fn steps_taken(&self) -> Size {
        self.steps_taken
    }

    /// Total number of increments to maturity.
    pub fn timesteps(&self) -> Size {
        self.settings.timesteps
    }

    /// `true` once maturity is reached.
    pub fn is_complete(&self) -> bool {
        self.steps_taken >= self.settings.timesteps
    }

    /// Current density state.
    pub fn state(&self) -> &DensityState {
        &self.state
    }

    /// Grid layout.
    pub fn grid(&self) -> &GridSpec {
        &self.layout
    }

    /// Run to maturity, clip negative densities and freeze the result.
    pub fn finish(mut self) -> Result<CachedSolution<T>> {
        self.run()?;
        let h = self.layout.h;
        let mut clipped = 0.0;
        for v in self.state.p.iter_mut().filter(|v| **v < 0.0) {
            clipped -= *v * h;
            *v = 0.0;
        }
        if clipped > CLIP_WARN_MASS {
            tracing::warn!(clipped, "negative density mass clipped");
        }
        tracing::debug!(
            total_mass = self.state.total_mass(h),
            pl = self.state.pl,
            pr = self.state.pr,
            "density solve converged"
        );
        CachedSolution::new(
            self.transform,
            self.params,
            self.settings,
            self.layout,
            self.arrays,
            self.state,
        )
    }
}

fn mul_assign(a: &mut [Real], b: &[Real]) {
    for (x, y) in a.iter_mut().zip(b) {
        *x *= y;
    }
}
