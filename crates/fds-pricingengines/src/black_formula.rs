//! Black and Bachelier formulas on total standard deviation, and their
//! inverses.
//!
//! Prices are forward prices times a discount factor.  The shifted lognormal
//! formula works on `forward + displacement` and `strike + displacement`.
//! The [`VolatilityInverter`] trait is the seam through which the density
//! solver turns premiums into volatility quotes.

use fds_core::{
    ensure,
    errors::{Error, Result},
    fail, DiscountFactor, Price, Real, Time, Volatility,
};
use fds_math::{bisection, brent, normal_cdf, normal_pdf};

/// Call or put.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OptionType {
    /// Call option.
    Call,
    /// Put option.
    Put,
}

impl OptionType {
    /// `+1` for a call, `−1` for a put.
    #[inline]
    pub fn sign(self) -> Real {
        match self {
            OptionType::Call => 1.0,
            OptionType::Put => -1.0,
        }
    }

    /// Undiscounted intrinsic value.
    #[inline]
    pub fn intrinsic(self, forward: Real, strike: Real) -> Real {
        (self.sign() * (forward - strike)).max(0.0)
    }
}

/// Volatility quoting convention.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum VolatilityType {
    /// Shifted log-normal (Black) volatility.
    #[default]
    ShiftedLognormal,
    /// Normal (Bachelier) volatility.
    Normal,
}

// ── Formulas ──────────────────────────────────────────────────────────────────

/// Shifted Black price for total standard deviation `std_dev`.
///
/// Falls back to the discounted intrinsic value when `std_dev` is zero or a
/// shifted level is not positive.
pub fn black_formula_std_dev(
    option_type: OptionType,
    strike: Real,
    forward: Real,
    std_dev: Real,
    discount: DiscountFactor,
    displacement: Real,
) -> Price {
    let f = forward + displacement;
    let k = strike + displacement;
    if std_dev <= 0.0 || f <= 0.0 || k <= 0.0 {
        return discount * option_type.intrinsic(f, k);
    }
    let d1 = (f / k).ln() / std_dev + 0.5 * std_dev;
    let d2 = d1 - std_dev;
    match option_type {
        OptionType::Call => discount * (f * normal_cdf(d1) - k * normal_cdf(d2)),
        OptionType::Put => discount * (k * normal_cdf(-d2) - f * normal_cdf(-d1)),
    }
}

/// Bachelier price for total normal standard deviation `std_dev`.
pub fn bachelier_formula_std_dev(
    option_type: OptionType,
    strike: Real,
    forward: Real,
    std_dev: Real,
    discount: DiscountFactor,
) -> Price {
    if std_dev <= 0.0 {
        return discount * option_type.intrinsic(forward, strike);
    }
    let w = option_type.sign();
    let d = w * (forward - strike) / std_dev;
    discount * (std_dev * normal_pdf(d) + w * (forward - strike) * normal_cdf(d))
}

// ── Inverses ──────────────────────────────────────────────────────────────────

/// Relative slack below which a premium counts as pure intrinsic value.
const INTRINSIC_TOLERANCE: Real = 1e-14;

/// Number of bracket doublings before giving up.
const MAX_BRACKET_EXPANSIONS: u32 = 40;

/// Checks the premium against intrinsic value.
///
/// Returns `Ok(None)` when it carries no time value, `Ok(Some(time_value))`
/// otherwise.
fn time_value(intrinsic: Real, premium: Real, scale: Real) -> Result<Option<Real>> {
    ensure!(premium.is_finite(), "premium {premium} is not finite");
    let slack = INTRINSIC_TOLERANCE * scale.max(1.0);
    ensure!(
        premium >= intrinsic - slack,
        "premium {premium} is below intrinsic value {intrinsic}"
    );
    if premium <= intrinsic + slack {
        return Ok(None);
    }
    Ok(Some(premium - intrinsic))
}

/// Root of the increasing function `price(σ) − premium` on `[0, ∞)`.
///
/// Brent first; bisection if Brent runs out of iterations.
fn invert_increasing<F>(price: F, premium: Real, mut hi: Real, accuracy: Real) -> Result<Real>
where
    F: Fn(Real) -> Real,
{
    let f = |s: Real| price(s) - premium;
    let mut expansions = 0;
    while f(hi) < 0.0 {
        expansions += 1;
        if expansions > MAX_BRACKET_EXPANSIONS {
            fail!("could not bracket premium {premium}: price at std dev {hi} still below");
        }
        hi *= 2.0;
    }
    brent(&f, 0.0, hi, accuracy).or_else(|_| bisection(&f, 0.0, hi, accuracy))
}

/// Shifted Black total standard deviation matching `premium`.
///
/// Returns `0` when the premium is the intrinsic value.
///
/// # Errors
/// `InvalidDomain` if a shifted level is not positive or the premium lies
/// outside the no-arbitrage band `[intrinsic, upper bound)`;
/// `NumericalDegenerate` if the root finder fails.
pub fn black_formula_implied_std_dev(
    option_type: OptionType,
    strike: Real,
    forward: Real,
    premium: Price,
    discount: DiscountFactor,
    displacement: Real,
    accuracy: Real,
) -> Result<Real> {
    let f = forward + displacement;
    let k = strike + displacement;
    ensure!(
        f > 0.0 && k > 0.0,
        "shifted forward {f} and strike {k} must be positive for a lognormal volatility"
    );
    ensure!(discount > 0.0, "discount factor must be positive, got {discount}");
    let undiscounted = premium / discount;
    let intrinsic = option_type.intrinsic(f, k);
    let upper = match option_type {
        OptionType::Call => f,
        OptionType::Put => k,
    };
    if time_value(intrinsic, undiscounted, upper)?.is_none() {
        return Ok(0.0);
    }
    ensure!(
        undiscounted < upper,
        "premium {undiscounted} reaches the upper bound {upper}"
    );
    invert_increasing(
        |s| black_formula_std_dev(option_type, k, f, s, 1.0, 0.0),
        undiscounted,
        1.0,
        accuracy,
    )
}

/// Bachelier total standard deviation matching `premium`.
///
/// Returns `0` when the premium is the intrinsic value.
pub fn bachelier_formula_implied_std_dev(
    option_type: OptionType,
    strike: Real,
    forward: Real,
    premium: Price,
    discount: DiscountFactor,
    accuracy: Real,
) -> Result<Real> {
    ensure!(discount > 0.0, "discount factor must be positive, got {discount}");
    let undiscounted = premium / discount;
    let intrinsic = option_type.intrinsic(forward, strike);
    let scale = forward.abs().max(strike.abs());
    let Some(tv) = time_value(intrinsic, undiscounted, scale)? else {
        return Ok(0.0);
    };
    // the at-the-money std dev for this time value, bracketed upwards
    let guess = (tv * (2.0 * std::f64::consts::PI).sqrt()).max(1e-12);
    invert_increasing(
        |s| bachelier_formula_std_dev(option_type, strike, forward, s, 1.0),
        undiscounted,
        guess,
        accuracy,
    )
}

// ── Inverters ─────────────────────────────────────────────────────────────────

/// Converts an undiscounted call premium into a volatility quote.
pub trait VolatilityInverter: std::fmt::Debug + Send + Sync {
    /// Quoting convention produced by this inverter.
    fn volatility_type(&self) -> VolatilityType;

    /// Volatility implied by a call `premium`.
    ///
    /// `Ok(None)` when the implied standard deviation is zero.
    ///
    /// # Errors
    /// [`Error::VolatilityInversionFailed`] naming `strike`.
    fn implied_volatility(
        &self,
        premium: Price,
        strike: Real,
        forward: Real,
        maturity: Time,
        shift: Real,
    ) -> Result<Option<Volatility>>;
}

fn annualise(std_dev: Real, maturity: Time) -> Option<Volatility> {
    if std_dev == 0.0 {
        None
    } else {
        Some(std_dev / maturity.sqrt())
    }
}

fn inversion_failed(strike: Real) -> impl FnOnce(Error) -> Error {
    move |e| Error::VolatilityInversionFailed {
        strike,
        reason: e.to_string(),
    }
}

/// Shifted lognormal inverter (Brent on the Black formula).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ShiftedBlackInverter {
    /// Absolute accuracy on the standard deviation.
    pub accuracy: Real,
}

impl Default for ShiftedBlackInverter {
    fn default() -> Self {
        Self { accuracy: 1e-12 }
    }
}

impl VolatilityInverter for ShiftedBlackInverter {
    fn volatility_type(&self) -> VolatilityType {
        VolatilityType::ShiftedLognormal
    }

    fn implied_volatility(
        &self,
        premium: Price,
        strike: Real,
        forward: Real,
        maturity: Time,
        shift: Real,
    ) -> Result<Option<Volatility>> {
        let std_dev = black_formula_implied_std_dev(
            OptionType::Call,
            strike,
            forward,
            premium,
            1.0,
            shift,
            self.accuracy,
        )
        .map_err(inversion_failed(strike))?;
        Ok(annualise(std_dev, maturity))
    }
}

/// Normal (Bachelier) inverter; the shift drops out.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BachelierInverter {
    /// Absolute accuracy on the standard deviation.
    pub accuracy: Real,
}

impl Default for BachelierInverter {
    fn default() -> Self {
        Self { accuracy: 1e-14 }
    }
}

impl VolatilityInverter for BachelierInverter {
    fn volatility_type(&self) -> VolatilityType {
        VolatilityType::Normal
    }

    fn implied_volatility(
        &self,
        premium: Price,
        strike: Real,
        forward: Real,
        maturity: Time,
        _shift: Real,
    ) -> Result<Option<Volatility>> {
        let std_dev = bachelier_formula_implied_std_dev(
            OptionType::Call,
            strike,
            forward,
            premium,
            1.0,
            self.accuracy,
        )
        .map_err(inversion_failed(strike))?;
        Ok(annualise(std_dev, maturity))
    }
}

impl VolatilityType {
    /// Default inverter for this convention.
    pub fn inverter(self) -> Box<dyn VolatilityInverter> {
        match self {
            VolatilityType::ShiftedLognormal => Box::new(ShiftedBlackInverter::default()),
            VolatilityType::Normal => Box::new(BachelierInverter::default()),
        }
    }
}
