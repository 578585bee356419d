//! Solver settings for the finite-difference SABR density.
//!
//! [`FdSabrSettings`] collects the discretisation choices that are not part
//! of the model itself: grid size, number of time steps, the width of the
//! boundary window in standard deviations and which forward mapping to use.
//! It is a plain value; every solve takes its own copy.

use crate::{ensure, errors::Result, Real};

/// Smallest accepted number of grid nodes (including the two ghost nodes).
pub const MIN_GRID_SIZE: usize = 4;

/// Largest accepted number of grid nodes.
pub const MAX_GRID_SIZE: usize = 100_000;

/// Largest accepted number of time increments.
pub const MAX_TIMESTEPS: usize = 1_000_000;

/// Which forward mapping the density solver uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum SabrVariant {
    /// The shifted forward stays strictly positive; zero is an absorbing
    /// boundary (arbitrage-free SABR).
    #[default]
    PositiveForward,
    /// The shifted forward may cross zero and become negative.
    FreeBoundary,
}

/// Discretisation settings for one density solve.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct FdSabrSettings {
    /// Number of grid nodes `N`, ghost nodes included.
    pub grid_size: usize,
    /// Number of Lawson–Swayne time increments.
    pub timesteps: usize,
    /// Half-width `nd` of the `±nd·√T` window in the transformed coordinate.
    pub boundary_width: Real,
    /// Forward mapping.
    pub variant: SabrVariant,
    /// Minimum sub-cell payoff below which the partial-cell correction in
    /// call pricing is skipped.
    pub partial_cell_threshold: Real,
}

impl Default for FdSabrSettings {
    fn default() -> Self {
        Self {
            grid_size: 100,
            timesteps: 100,
            boundary_width: 6.0,
            variant: SabrVariant::PositiveForward,
            partial_cell_threshold: 1e-5,
        }
    }
}

impl FdSabrSettings {
    /// Default settings with the given forward mapping.
    pub fn new(variant: SabrVariant) -> Self {
        Self {
            variant,
            ..Self::default()
        }
    }

    /// Set the number of grid nodes.
    pub fn with_grid_size(mut self, grid_size: usize) -> Self {
        self.grid_size = grid_size;
        self
    }

    /// Set the number of time increments.
    pub fn with_timesteps(mut self, timesteps: usize) -> Self {
        self.timesteps = timesteps;
        self
    }

    /// Set the boundary window half-width `nd`.
    pub fn with_boundary_width(mut self, boundary_width: Real) -> Self {
        self.boundary_width = boundary_width;
        self
    }

    /// Set the forward mapping.
    pub fn with_variant(mut self, variant: SabrVariant) -> Self {
        self.variant = variant;
        self
    }

    /// Set the partial-cell correction threshold.
    pub fn with_partial_cell_threshold(mut self, threshold: Real) -> Self {
        self.partial_cell_threshold = threshold;
        self
    }

    /// Check that the settings describe a bounded, well-posed discretisation.
    pub fn validate(&self) -> Result<()> {
        ensure!(
            (MIN_GRID_SIZE..=MAX_GRID_SIZE).contains(&self.grid_size),
            "grid size must lie in [{MIN_GRID_SIZE}, {MAX_GRID_SIZE}], got {}",
            self.grid_size
        );
        ensure!(
            (1..=MAX_TIMESTEPS).contains(&self.timesteps),
            "timesteps must lie in [1, {MAX_TIMESTEPS}], got {}",
            self.timesteps
        );
        ensure!(
            self.boundary_width.is_finite() && self.boundary_width > 0.0,
            "boundary width must be positive, got {}",
            self.boundary_width
        );
        ensure!(
            self.partial_cell_threshold.is_finite() && self.partial_cell_threshold >= 0.0,
            "partial-cell threshold must be non-negative, got {}",
            self.partial_cell_threshold
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Error;
    use proptest::prelude::*;

    #[test]
    fn defaults_are_valid() {
        let s = FdSabrSettings::default();
        assert_eq!(s.grid_size, 100);
        assert_eq!(s.timesteps, 100);
        assert_eq!(s.boundary_width, 6.0);
        assert_eq!(s.variant, SabrVariant::PositiveForward);
        assert!(s.validate().is_ok());
    }

    #[test]
    fn builder_sets_fields() {
        let s = FdSabrSettings::new(SabrVariant::FreeBoundary)
            .with_grid_size(200)
            .with_timesteps(50)
            .with_boundary_width(4.0)
            .with_partial_cell_threshold(0.0);
        assert_eq!(s.variant, SabrVariant::FreeBoundary);
        assert_eq!(s.grid_size, 200);
        assert_eq!(s.timesteps, 50);
        assert_eq!(s.boundary_width, 4.0);
        assert_eq!(s.partial_cell_threshold, 0.0);
        assert!(s.validate().is_ok());
    }

    #[test]
    fn rejects_degenerate_settings() {
        let base = FdSabrSettings::default();
        for bad in [
            base.with_grid_size(0),
            base.with_grid_size(3),
            base.with_grid_size(MAX_GRID_SIZE + 1),
            base.with_timesteps(0),
            base.with_timesteps(MAX_TIMESTEPS + 1),
            base.with_boundary_width(0.0),
            base.with_boundary_width(-6.0),
            base.with_boundary_width(f64::NAN),
            base.with_partial_cell_threshold(-1e-5),
        ] {
            assert!(
                matches!(bad.validate(), Err(Error::InvalidDomain(_))),
                "{bad:?} should be rejected"
            );
        }
    }

    proptest! {
        #[test]
        fn bounded_settings_validate(
            n in MIN_GRID_SIZE..=2_000usize,
            steps in 1..=2_000usize,
            nd in 0.5_f64..10.0,
        ) {
            let s = FdSabrSettings::default()
                .with_grid_size(n)
                .with_timesteps(steps)
                .with_boundary_width(nd);
            prop_assert!(s.validate().is_ok());
        }
    }
}
