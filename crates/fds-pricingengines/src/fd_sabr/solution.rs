//! Converged density and the quantities extracted from it.

use super::stepper::DensityState;
use crate::black_formula::{OptionType, VolatilityInverter, VolatilityType};
use fds_core::{
    ensure_post, errors::Result, DiscountFactor, FdSabrSettings, Price, Real, SabrVariant, Volatility,
};
use fds_math::{Interpolation1D, LinearInterpolation};
use fds_models::{CoordinateTransform, GridSpec, ModelParameters, TransformedArrays};

/// Immutable snapshot of a converged density solve.
///
/// Prices are undiscounted forward prices unless a discount factor is passed
/// explicitly.  All queries take `&self`; a solution can be shared across
/// threads behind an `Arc`.
#[derive(Debug, Clone)]
pub struct CachedSolution<T = SabrVariant> {
    transform: T,
    params: ModelParameters,
    settings: FdSabrSettings,
    layout: GridSpec,
    arrays: TransformedArrays,
    state: DensityState,
    /// `fm − shift` on the physical cells.
    strike_nodes: Vec<Real>,
    /// `p / cm` on the physical cells.
    density_values: Vec<Real>,
    interpolation: LinearInterpolation,
}

impl<T: CoordinateTransform> CachedSolution<T> {
    pub(crate) fn new(
        transform: T,
        params: ModelParameters,
        settings: FdSabrSettings,
        layout: GridSpec,
        arrays: TransformedArrays,
        state: DensityState,
    ) -> Result<Self> {
        let cells = 1..=layout.last_cell();
        let strike_nodes: Vec<Real> = arrays.fm[cells.clone()]
            .iter()
            .map(|f| f - params.shift)
            .collect();
        let density_values: Vec<Real> = state.p[cells.clone()]
            .iter()
            .zip(&arrays.cm[cells])
            .map(|(p, c)| p / c)
            .collect();
        ensure_post!(
            density_values.iter().all(|v| v.is_finite()),
            "density is not finite on the forward grid"
        );
        let interpolation = LinearInterpolation::new(&strike_nodes, &density_values)?;
        Ok(Self {
            transform,
            params,
            settings,
            layout,
            arrays,
            state,
            strike_nodes,
            density_values,
            interpolation,
        })
    }

    /// Model parameters of the solve.
    pub fn params(&self) -> &ModelParameters {
        &self.params
    }

    /// Settings of the solve.
    pub fn settings(&self) -> &FdSabrSettings {
        &self.settings
    }

    /// Grid layout.
    pub fn grid(&self) -> &GridSpec {
        &self.layout
    }

    /// Coordinate transform of the solve.
    pub fn transform(&self) -> &T {
        &self.transform
    }

    /// Transformed coefficient arrays.
    pub fn arrays(&self) -> &TransformedArrays {
        &self.arrays
    }

    /// Final density state, ghost cells included.
    pub fn state(&self) -> &DensityState {
        &self.state
    }

    /// Unshifted forward levels of the physical cells.
    pub fn strike_nodes(&self) -> &[Real] {
        &self.strike_nodes
    }

    /// Probability density in forward space at [`strike_nodes`](Self::strike_nodes).
    pub fn probability_density(&self) -> &[Real] {
        &self.density_values
    }

    /// Mass on the grid plus both absorbed masses.
    pub fn total_mass(&self) -> Real {
        self.state.total_mass(self.layout.h)
    }

    /// Absorbed masses `(lower, upper)`.
    pub fn absorbed_mass(&self) -> (Real, Real) {
        (self.state.pl, self.state.pr)
    }

    /// Undiscounted call price at `strike`.
    ///
    /// Below the lower boundary the call is worth its intrinsic value
    /// `forward − strike`; above the upper boundary it is worth nothing.
    /// In between the price collects the upper absorbed mass, the part of
    /// the straddling cell above the strike, and the cells beyond it.
    pub fn price_call(&self, strike: Real) -> Price {
        let p = &self.params;
        let layout = &self.layout;
        let z = self.transform.z_of_strike(p, strike);
        if z <= layout.zmin {
            return p.forward - strike;
        }
        if z >= layout.zmax {
            return 0.0;
        }

        let shifted_strike = strike + p.shift;
        let f_max = self.transform.forward_of_z(p, layout.zmax);
        let mut price = (f_max - shifted_strike) * self.state.pr;

        let last = layout.last_cell();
        let k0 = (((z - layout.zmin) / layout.h).ceil() as usize).clamp(1, last);
        let z_tilde = layout.z(k0);
        let f_tilde = self.transform.forward_of_z(p, z_tilde);
        let term = f_tilde - shifted_strike;
        if term > self.settings.partial_cell_threshold {
            let z_mid = z_tilde - 0.5 * layout.h;
            let f_mid = self.transform.forward_of_z(p, z_mid);
            let dfdz = (f_tilde - f_mid) / (z_tilde - z_mid);
            price += 0.5 * term * term * self.state.p[k0] / dfdz;
        }

        price += (k0 + 1..=last)
            .map(|k| (self.arrays.fm[k] - shifted_strike) * layout.h * self.state.p[k])
            .sum::<Real>();
        price
    }

    /// Undiscounted put price by put–call parity.
    pub fn price_put(&self, strike: Real) -> Price {
        self.price_call(strike) - (self.params.forward - strike)
    }

    /// Discounted price of a call or put.
    pub fn option_price(
        &self,
        strike: Real,
        option_type: OptionType,
        discount: DiscountFactor,
    ) -> Price {
        let undiscounted = match option_type {
            OptionType::Call => self.price_call(strike),
            OptionType::Put => self.price_put(strike),
        };
        discount * undiscounted
    }

    /// Probability density at each strike, zero outside the forward grid.
    pub fn density(&self, strikes: &[Real]) -> Vec<Real> {
        self.density_discounted(strikes, 1.0)
    }

    /// [`density`](Self::density) scaled by a discount factor.
    pub fn density_discounted(&self, strikes: &[Real], discount: DiscountFactor) -> Vec<Real> {
        strikes
            .iter()
            .map(|&k| {
                if self.interpolation.is_in_range(k) {
                    discount * self.interpolation.operator(k)
                } else {
                    0.0
                }
            })
            .collect()
    }

    /// Implied volatilities in the given convention, one result per strike.
    ///
    /// `Ok(None)` marks a strike with zero implied standard deviation; a
    /// failed inversion only affects its own entry.
    pub fn volatility(
        &self,
        strikes: &[Real],
        kind: VolatilityType,
    ) -> Vec<Result<Option<Volatility>>> {
        self.volatility_with(strikes, kind.inverter().as_ref())
    }

    /// Implied volatilities through a caller-supplied inverter.
    pub fn volatility_with(
        &self,
        strikes: &[Real],
        inverter: &dyn VolatilityInverter,
    ) -> Vec<Result<Option<Volatility>>> {
        let p = &self.params;
        strikes
            .iter()
            .map(|&k| {
                inverter.implied_volatility(self.price_call(k), k, p.forward, p.maturity, p.shift)
            })
            .collect()
    }
}
