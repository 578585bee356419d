//! Coordinate transforms of the SABR forward equation.
//!
//! The solver works on a coordinate `z` in which the volatility process is a
//! Brownian motion.  `z` maps to an intermediate `y` through
//!
//! ```text
//! Y(z) = α/ν · (sinh(νz) + ρ·(cosh(νz) − 1))
//! ```
//!
//! and `y` maps to the shifted forward `F + s` through a variant-specific power
//! map.  The [`CoordinateTransform`] trait bundles the forward map, the local
//! volatility, the drift correction and the inverse strike map; the stepper
//! and the price extraction only ever talk to the trait.
//!
//! All forward levels produced here live in shifted space (`forward + shift`).

use crate::parameters::ModelParameters;
use fds_core::{ensure, errors::Result, Real, SabrVariant};

// ── Shared maps ───────────────────────────────────────────────────────────────

/// `Y(z) = α/ν · (sinh(νz) + ρ·(cosh(νz) − 1))`.
#[inline]
pub fn y_of_z(p: &ModelParameters, z: Real) -> Real {
    let nz = p.nu * z;
    p.alpha / p.nu * (nz.sinh() + p.rho * (nz.cosh() - 1.0))
}

/// Inverse of [`y_of_z`]:
///
/// ```text
/// z(y) = −1/ν · ln[(√(1 − ρ² + (ρ + νy/α)²) − ρ − νy/α) / (1 − ρ)]
/// ```
///
/// The numerator is rewritten as `(1 − ρ²)/(√(…) + ρ + νy/α)` when
/// `ρ + νy/α > 0` to avoid cancellation for large `y`.
pub fn z_of_y(p: &ModelParameters, y: Real) -> Real {
    let s = p.rho + p.nu * y / p.alpha;
    let one_minus_rho2 = 1.0 - p.rho * p.rho;
    let root = (one_minus_rho2 + s * s).sqrt();
    let numerator = if s > 0.0 {
        one_minus_rho2 / (root + s)
    } else {
        root - s
    };
    -(numerator / (1.0 - p.rho)).ln() / p.nu
}

/// `sign(x)·|x|^e` with `sign(0) = +1`.
#[inline]
fn signed_pow(x: Real, e: Real) -> Real {
    let m = x.abs().powf(e);
    if x >= 0.0 {
        m
    } else {
        -m
    }
}

/// Instantaneous volatility factor `√(α² + 2ραν·y + ν²y²)`.
#[inline]
fn vol_factor(p: &ModelParameters, y: Real) -> Real {
    (p.alpha * p.alpha + 2.0 * p.rho * p.alpha * p.nu * y + p.nu * p.nu * y * y).sqrt()
}

// ── Boundaries ────────────────────────────────────────────────────────────────

/// Lower and upper edge of the domain in the transformed coordinate.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Boundaries {
    /// Lower edge `zmin`.
    pub zmin: Real,
    /// Upper edge `zmax`.
    pub zmax: Real,
}

impl Boundaries {
    /// The centred window `±nd·√T`.
    pub fn centered(p: &ModelParameters, nd: Real) -> Self {
        let half = nd * p.maturity.sqrt();
        Self {
            zmin: -half,
            zmax: half,
        }
    }
}

// ── Transform trait ───────────────────────────────────────────────────────────

/// The variant-specific part of the transformed SABR equation.
///
/// Implementations must be mutually consistent: [`drift_correction`] is the
/// divided difference of `F^β` under the same map that
/// [`forward_of_y`] and [`local_vol`] use, and [`y_of_strike`] inverts
/// [`forward_of_y`].
///
/// [`drift_correction`]: CoordinateTransform::drift_correction
/// [`forward_of_y`]: CoordinateTransform::forward_of_y
/// [`local_vol`]: CoordinateTransform::local_vol
/// [`y_of_strike`]: CoordinateTransform::y_of_strike
pub trait CoordinateTransform: std::fmt::Debug + Send + Sync {
    /// Short human-readable name, used in log events.
    fn name(&self) -> &'static str;

    /// Variant-specific parameter checks, on top of
    /// [`ModelParameters::validate`].
    fn validate(&self, p: &ModelParameters) -> Result<()>;

    /// Shifted forward level reached at `y`.
    fn forward_of_y(&self, p: &ModelParameters, y: Real) -> Real;

    /// Local volatility coefficient `C(y, F)`.
    fn local_vol(&self, p: &ModelParameters, y: Real, f: Real) -> Real;

    /// Divided difference `(F^β − F₀^β)/(F − F₀)` at the shifted level `f`.
    fn drift_correction(&self, p: &ModelParameters, f: Real) -> Real;

    /// Exact limit of [`drift_correction`](Self::drift_correction) at
    /// `f = F₀`, i.e. `d(F^β)/dF` at the initial forward.
    fn drift_correction_at_forward(&self, p: &ModelParameters) -> Real;

    /// Domain edges for a window of `nd` standard deviations.
    fn boundaries(&self, p: &ModelParameters, nd: Real) -> Boundaries;

    /// `y` at which the shifted forward equals `strike + shift`.
    fn y_of_strike(&self, p: &ModelParameters, strike: Real) -> Real;

    /// Shifted forward level reached at `z`.
    fn forward_of_z(&self, p: &ModelParameters, z: Real) -> Real {
        self.forward_of_y(p, y_of_z(p, z))
    }

    /// Transformed coordinate of `strike`.
    fn z_of_strike(&self, p: &ModelParameters, strike: Real) -> Real {
        z_of_y(p, self.y_of_strike(p, strike))
    }
}

// ── Positive forward (arbitrage-free SABR) ────────────────────────────────────

/// Forward map that keeps the shifted forward non-negative.
///
/// `F(y) = (F₀^(1−β) + (1−β)·y)^(1/(1−β))`; the lower domain edge is pulled in
/// to the coordinate where this reaches zero.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PositiveForward;

impl PositiveForward {
    /// `y` at which the forward map reaches zero.
    fn y_at_zero(p: &ModelParameters) -> Real {
        -p.shifted_forward().powf(p.one_minus_beta()) / p.one_minus_beta()
    }
}

impl CoordinateTransform for PositiveForward {
    fn name(&self) -> &'static str {
        "positive-forward"
    }

    fn validate(&self, p: &ModelParameters) -> Result<()> {
        ensure!(
            p.shifted_forward() > 0.0,
            "positive-forward SABR needs forward + shift > 0, got {}",
            p.shifted_forward()
        );
        Ok(())
    }

    fn forward_of_y(&self, p: &ModelParameters, y: Real) -> Real {
        let b1 = p.one_minus_beta();
        // floored at zero: the boundary coordinate may round to a tiny negative base
        let u = p.shifted_forward().powf(b1) + b1 * y;
        u.max(0.0).powf(1.0 / b1)
    }

    fn local_vol(&self, p: &ModelParameters, y: Real, f: Real) -> Real {
        vol_factor(p, y) * f.powf(p.beta)
    }

    fn drift_correction(&self, p: &ModelParameters, f: Real) -> Real {
        let f0 = p.shifted_forward();
        if f == f0 {
            return self.drift_correction_at_forward(p);
        }
        (f.powf(p.beta) - f0.powf(p.beta)) / (f - f0)
    }

    fn drift_correction_at_forward(&self, p: &ModelParameters) -> Real {
        p.beta / p.shifted_forward().powf(p.one_minus_beta())
    }

    fn boundaries(&self, p: &ModelParameters, nd: Real) -> Boundaries {
        let mut b = Boundaries::centered(p, nd);
        let zbar = z_of_y(p, Self::y_at_zero(p));
        if zbar > b.zmin {
            b.zmin = zbar;
        }
        b
    }

    fn y_of_strike(&self, p: &ModelParameters, strike: Real) -> Real {
        let b1 = p.one_minus_beta();
        let k = (strike + p.shift).max(0.0);
        (k.powf(b1) - p.shifted_forward().powf(b1)) / b1
    }
}

// ── Free boundary ─────────────────────────────────────────────────────────────

/// Sign-preserving forward map that lets the shifted forward cross zero.
///
/// `F(y) = sign(u)·|u|^(1/(1−β))` with `u = sign(F₀)|F₀|^(1−β) + (1−β)·y`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FreeBoundary;

impl CoordinateTransform for FreeBoundary {
    fn name(&self) -> &'static str {
        "free-boundary"
    }

    fn validate(&self, p: &ModelParameters) -> Result<()> {
        ensure!(
            p.shifted_forward() != 0.0,
            "free-boundary SABR needs forward + shift != 0"
        );
        Ok(())
    }

    fn forward_of_y(&self, p: &ModelParameters, y: Real) -> Real {
        let b1 = p.one_minus_beta();
        let u = signed_pow(p.shifted_forward(), b1) + b1 * y;
        signed_pow(u, 1.0 / b1)
    }

    fn local_vol(&self, p: &ModelParameters, y: Real, f: Real) -> Real {
        vol_factor(p, y) * f.abs().powf(p.beta)
    }

    fn drift_correction(&self, p: &ModelParameters, f: Real) -> Real {
        let f0 = p.shifted_forward();
        if f == f0 {
            return self.drift_correction_at_forward(p);
        }
        (f.abs().powf(p.beta) - f0.abs().powf(p.beta)) / (f - f0)
    }

    fn drift_correction_at_forward(&self, p: &ModelParameters) -> Real {
        let f0 = p.shifted_forward();
        f0.signum() * p.beta / f0.abs().powf(p.one_minus_beta())
    }

    fn boundaries(&self, p: &ModelParameters, nd: Real) -> Boundaries {
        Boundaries::centered(p, nd)
    }

    fn y_of_strike(&self, p: &ModelParameters, strike: Real) -> Real {
        let b1 = p.one_minus_beta();
        (signed_pow(strike + p.shift, b1) - signed_pow(p.shifted_forward(), b1)) / b1
    }
}

// ── Runtime-selected variant ──────────────────────────────────────────────────

fn dispatch(variant: &SabrVariant) -> &'static dyn CoordinateTransform {
    match variant {
        SabrVariant::PositiveForward => &PositiveForward,
        SabrVariant::FreeBoundary => &FreeBoundary,
    }
}

impl CoordinateTransform for SabrVariant {
    fn name(&self) -> &'static str {
        dispatch(self).name()
    }

    fn validate(&self, p: &ModelParameters) -> Result<()> {
        dispatch(self).validate(p)
    }

    fn forward_of_y(&self, p: &ModelParameters, y: Real) -> Real {
        dispatch(self).forward_of_y(p, y)
    }

    fn local_vol(&self, p: &ModelParameters, y: Real, f: Real) -> Real {
        dispatch(self).local_vol(p, y, f)
    }

    fn drift_correction(&self, p: &ModelParameters, f: Real) -> Real {
        dispatch(self).drift_correction(p, f)
    }

    fn drift_correction_at_forward(&self, p: &ModelParameters) -> Real {
        dispatch(self).drift_correction_at_forward(p)
    }

    fn boundaries(&self, p: &ModelParameters, nd: Real) -> Boundaries {
        dispatch(self).boundaries(p, nd)
    }

    fn y_of_strike(&self, p: &ModelParameters, strike: Real) -> Real {
        dispatch(self).y_of_strike(p, strike)
    }
}
