//! SABR model parameters for one expiry.
//!
//! ```text
//! dF = α_t·(F + s)^β dW₁
//! dα = ν·α_t dW₂
//! dW₁·dW₂ = ρ dt,   α_0 = alpha,   F_0 = forward
//! ```

use fds_core::{ensure, errors::Result, Real, Time};

/// Parameters of a (shifted) SABR diffusion up to a fixed maturity.
///
/// Fields are public so that parameter sets can be written as literals;
/// [`validate`](Self::validate) is run by every density solve.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ModelParameters {
    /// Forward level at time zero (unshifted).
    pub forward: Real,
    /// Initial volatility α.
    pub alpha: Real,
    /// CEV exponent β ∈ [0, 1).
    pub beta: Real,
    /// Volatility of volatility ν.
    pub nu: Real,
    /// Correlation ρ between forward and volatility.
    pub rho: Real,
    /// Additive shift applied to forward and strikes before the power map.
    pub shift: Real,
    /// Time to expiry in years.
    pub maturity: Time,
}

impl ModelParameters {
    /// Create and validate a parameter set.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        forward: Real,
        alpha: Real,
        beta: Real,
        nu: Real,
        rho: Real,
        shift: Real,
        maturity: Time,
    ) -> Result<Self> {
        let p = Self {
            forward,
            alpha,
            beta,
            nu,
            rho,
            shift,
            maturity,
        };
        p.validate()?;
        Ok(p)
    }

    /// Forward level in shifted space, `forward + shift`.
    #[inline]
    pub fn shifted_forward(&self) -> Real {
        self.forward + self.shift
    }

    /// `1 − β`, the exponent of the power map.
    #[inline]
    pub fn one_minus_beta(&self) -> Real {
        1.0 - self.beta
    }

    /// Check the variant-independent parameter domain.
    ///
    /// `beta = 1` is rejected: the `(1−β)` divisor of the forward map is
    /// undefined there.
    pub fn validate(&self) -> Result<()> {
        ensure!(
            [
                self.forward,
                self.alpha,
                self.beta,
                self.nu,
                self.rho,
                self.shift,
                self.maturity
            ]
            .iter()
            .all(|v| v.is_finite()),
            "SABR parameters must be finite: {self:?}"
        );
        ensure!(
            self.beta != 1.0,
            "beta = 1 is not supported: the forward map divides by (1 - beta)"
        );
        ensure!(
            (0.0..1.0).contains(&self.beta),
            "beta must lie in [0, 1), got {}",
            self.beta
        );
        ensure!(self.alpha > 0.0, "alpha must be positive, got {}", self.alpha);
        ensure!(self.nu > 0.0, "nu must be positive, got {}", self.nu);
        ensure!(
            self.rho > -1.0 && self.rho < 1.0,
            "rho must lie in (-1, 1), got {}",
            self.rho
        );
        ensure!(self.shift >= 0.0, "shift must be non-negative, got {}", self.shift);
        ensure!(
            self.maturity > 0.0,
            "maturity must be positive, got {}",
            self.maturity
        );
        Ok(())
    }
}
