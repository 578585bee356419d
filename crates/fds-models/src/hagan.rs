//! Hagan et al. (2002) closed-form SABR volatility.
//!
//! The asymptotic expansion returns a shifted lognormal (Black) volatility
//! for strikes with `strike + shift > 0`.  It is not arbitrage free in the
//! wings, which is what the finite-difference density fixes; here it serves
//! as the benchmark smile for the numerical solution.

use crate::parameters::ModelParameters;
use fds_core::{ensure, errors::Result, Real, Volatility};

/// Shifted Hagan lognormal volatility at `strike`.
///
/// # Errors
/// `InvalidDomain` if `forward + shift` or `strike + shift` is not positive.
pub fn hagan_volatility(p: &ModelParameters, strike: Real) -> Result<Volatility> {
    let f = p.shifted_forward();
    let k = strike + p.shift;
    ensure!(
        f > 0.0 && k > 0.0,
        "Hagan formula needs positive shifted levels, got forward {f} and strike {k}"
    );

    if (f - k).abs() < 1e-12 * f {
        return Ok(hagan_volatility_atm(p));
    }

    let (alpha, beta, nu, rho) = (p.alpha, p.beta, p.nu, p.rho);
    let one_minus_beta = p.one_minus_beta();

    let fk = f * k;
    let fk_beta = fk.powf(one_minus_beta);
    let fk_half_beta = fk.powf(one_minus_beta / 2.0);
    let log_fk = (f / k).ln();

    // z = (ν/α)·(FK)^((1−β)/2)·ln(F/K)
    let z = (nu / alpha) * fk_half_beta * log_fk;

    // x(z) = ln((√(1 − 2ρz + z²) + z − ρ) / (1 − ρ))
    let sqrt_val = (1.0 - 2.0 * rho * z + z * z).max(0.0).sqrt();
    let xz = ((sqrt_val + z - rho) / (1.0 - rho)).ln();
    if xz.abs() < 1e-15 {
        return Ok(hagan_volatility_atm(p));
    }

    let a = one_minus_beta * one_minus_beta;
    let denom = fk_half_beta * (1.0 + a / 24.0 * log_fk * log_fk + a * a / 1920.0 * log_fk.powi(4));
    let correction = 1.0
        + (a / 24.0 * alpha * alpha / fk_beta
            + 0.25 * rho * beta * nu * alpha / fk_half_beta
            + (2.0 - 3.0 * rho * rho) / 24.0 * nu * nu)
            * p.maturity;

    Ok(alpha / denom * (z / xz) * correction)
}

/// At-the-money limit of [`hagan_volatility`].
fn hagan_volatility_atm(p: &ModelParameters) -> Volatility {
    let (alpha, beta, nu, rho) = (p.alpha, p.beta, p.nu, p.rho);
    let one_minus_beta = p.one_minus_beta();
    let f_beta = p.shifted_forward().powf(one_minus_beta);

    let term1 = one_minus_beta * one_minus_beta / 24.0 * alpha * alpha / (f_beta * f_beta);
    let term2 = 0.25 * rho * beta * nu * alpha / f_beta;
    let term3 = (2.0 - 3.0 * rho * rho) / 24.0 * nu * nu;

    alpha / f_beta * (1.0 + (term1 + term2 + term3) * p.maturity)
}

/// The Hagan smile of one parameter set.
#[derive(Debug, Clone, Copy)]
pub struct HaganSabr {
    params: ModelParameters,
}

impl HaganSabr {
    /// Smile for validated `params`.
    pub fn new(params: ModelParameters) -> Result<Self> {
        params.validate()?;
        Ok(Self { params })
    }

    /// Model parameters of the smile.
    pub fn params(&self) -> &ModelParameters {
        &self.params
    }

    /// Shifted lognormal volatility at `strike`.
    pub fn volatility(&self, strike: Real) -> Result<Volatility> {
        hagan_volatility(&self.params, strike)
    }

    /// Volatilities at several strikes, failing on the first bad strike.
    pub fn volatilities(&self, strikes: &[Real]) -> Result<Vec<Volatility>> {
        strikes.iter().map(|&k| self.volatility(k)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use fds_core::Error;

    fn params(rho: Real) -> ModelParameters {
        ModelParameters::new(0.04, 0.04, 0.5, 0.4, rho, 0.0, 1.0).unwrap()
    }

    #[test]
    fn atm_consistency() {
        let p = params(-0.3);
        let v1 = hagan_volatility(&p, 0.04 * (1.0 + 1e-10)).unwrap();
        let v2 = hagan_volatility_atm(&p);
        assert!((v1 - v2).abs() < 1e-6, "ATM vol mismatch: {v1} vs {v2}");
        assert_eq!(hagan_volatility(&p, 0.04).unwrap(), v2);
    }

    #[test]
    fn smile_shape() {
        let smile = HaganSabr::new(params(-0.5)).unwrap();
        let v = smile.volatilities(&[0.02, 0.04, 0.08]).unwrap();
        assert!(v[0] > v[1], "negative rho skews the smile down: {v:?}");
        assert!(v.iter().all(|&x| x > 0.0));
    }

    #[test]
    fn shift_moves_the_smile() {
        let p = ModelParameters::new(0.0488, 0.026, 0.5, 0.4, -0.1, 0.02, 1.0).unwrap();
        let atm = hagan_volatility(&p, p.forward).unwrap();
        assert_abs_diff_eq!(atm, 0.1004, epsilon = 5e-4);
        // a strike below zero is fine as long as strike + shift > 0
        assert!(hagan_volatility(&p, -0.01).unwrap() > atm);
    }

    #[test]
    fn non_positive_shifted_strike_is_rejected() {
        let p = params(-0.3);
        assert!(matches!(
            hagan_volatility(&p, -0.01),
            Err(Error::InvalidDomain(_))
        ));
    }
}
