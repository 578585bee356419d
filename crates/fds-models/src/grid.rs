//! Non-uniform forward grid on the transformed coordinate.
//!
//! Cells of width `h` are laid out in `z` so that the centre of cell `j0` sits
//! exactly at `z = 0`, i.e. at the initial forward.  Mapped through the
//! coordinate transform, the cell centres give a forward grid that is dense
//! where the density is large and sparse in the tails.
//!
//! Node layout for `N` nodes (`J = N − 2` physical cells):
//!
//! ```text
//!   index     0      1      2    …    j0    …    J     J+1
//!   zm      ghost  zmin+h/2  …        0          …    ghost
//!   z       zmin   z[1]     …                    zmax = z[J]
//! ```

use crate::parameters::ModelParameters;
use crate::transform::{y_of_z, Boundaries, CoordinateTransform};
use fds_core::{ensure, ensure_post, errors::Result, Real, Size};

/// Domain edges for a window of `nd` standard deviations.
///
/// The window is `±nd·√T`; a positive-forward transform pulls the lower edge
/// in to the coordinate where the forward reaches zero.
pub fn compute_boundaries<T>(transform: &T, params: &ModelParameters, nd: Real) -> Boundaries
where
    T: CoordinateTransform + ?Sized,
{
    transform.boundaries(params, nd)
}

/// Layout of the transformed grid.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GridSpec {
    /// Lower domain edge.
    pub zmin: Real,
    /// Upper domain edge, `z[J]` after the layout.
    pub zmax: Real,
    /// Number of nodes including both ghosts, `J + 2`.
    pub node_count: Size,
    /// Cell width.
    pub h: Real,
    /// Index of the cell whose centre is `z = 0`.
    pub pivot: Size,
}

impl GridSpec {
    /// Lay out `node_count` nodes over `bounds`.
    ///
    /// # Errors
    /// `InvalidDomain` if the window does not contain the origin, or if the
    /// grid is too coarse for the pivot to land on a physical cell.
    pub fn new(bounds: Boundaries, node_count: Size) -> Result<Self> {
        ensure!(
            node_count >= 4,
            "grid needs at least 4 nodes, got {node_count}"
        );
        ensure!(
            bounds.zmin < 0.0 && bounds.zmax > 0.0,
            "domain [{}, {}] must contain the initial forward at z = 0",
            bounds.zmin,
            bounds.zmax
        );
        let cells = node_count - 2;
        let h0 = (bounds.zmax - bounds.zmin) / cells as Real;
        let j0 = (-bounds.zmin / h0).trunc();
        ensure!(
            j0 >= 1.0 && j0 <= cells as Real,
            "grid of {node_count} nodes is too coarse: pivot index {j0} outside 1..={cells}"
        );
        let pivot = j0 as Size;
        let h = -bounds.zmin / (j0 - 0.5);
        Ok(Self {
            zmin: bounds.zmin,
            zmax: bounds.zmin + cells as Real * h,
            node_count,
            h,
            pivot,
        })
    }

    /// Index `J` of the last physical cell.
    #[inline]
    pub fn last_cell(&self) -> Size {
        self.node_count - 2
    }

    /// Cell edge `z[i] = zmin + i·h`.
    #[inline]
    pub fn z(&self, i: Size) -> Real {
        self.zmin + i as Real * self.h
    }

    /// Cell centre `zm[i] = z[i] − h/2`, written relative to the pivot so
    /// that `zm[pivot]` is exactly zero.
    #[inline]
    pub fn zm(&self, i: Size) -> Real {
        (i as Real - self.pivot as Real) * self.h
    }
}

/// Coefficients of the forward equation at the cell centres.
///
/// All vectors have `node_count` entries.  Entries `0` and `J + 1` are ghost
/// values: `fm` is extrapolated linearly through the boundary forward, the
/// other arrays copy their neighbour.
#[derive(Debug, Clone, PartialEq)]
pub struct TransformedArrays {
    /// Shifted forward level `F(Y(zm))`.
    pub fm: Vec<Real>,
    /// Local volatility `C(Y(zm), fm)`.
    pub cm: Vec<Real>,
    /// Drift correction `Γ(fm)`.
    pub gamma: Vec<Real>,
}

/// Build the grid layout and the transformed coefficient arrays.
///
/// # Errors
/// `InvalidDomain` for an unusable layout (see [`GridSpec::new`]);
/// `NumericalDegenerate` if the mapped forward grid is not strictly increasing
/// or any coefficient is non-finite.
pub fn build_grid<T>(
    transform: &T,
    params: &ModelParameters,
    node_count: Size,
    nd: Real,
) -> Result<(GridSpec, TransformedArrays)>
where
    T: CoordinateTransform + ?Sized,
{
    let bounds = compute_boundaries(transform, params, nd);
    let layout = GridSpec::new(bounds, node_count)?;
    let last = layout.last_cell();

    let ym: Vec<Real> = (0..node_count).map(|i| y_of_z(params, layout.zm(i))).collect();
    let mut fm: Vec<Real> = ym.iter().map(|&y| transform.forward_of_y(params, y)).collect();
    let f_min = transform.forward_of_z(params, layout.zmin);
    let f_max = transform.forward_of_z(params, layout.zmax);
    fm[0] = 2.0 * f_min - fm[1];
    fm[last + 1] = 2.0 * f_max - fm[last];

    // C and Γ only on physical cells: the lower ghost forward may be negative.
    let mut cm = vec![0.0; node_count];
    let mut gamma = vec![0.0; node_count];
    for i in 1..=last {
        cm[i] = transform.local_vol(params, ym[i], fm[i]);
        gamma[i] = if i == layout.pivot {
            transform.drift_correction_at_forward(params)
        } else {
            transform.drift_correction(params, fm[i])
        };
    }
    cm[0] = cm[1];
    cm[last + 1] = cm[last];
    gamma[0] = gamma[1];
    gamma[last + 1] = gamma[last];

    ensure_post!(
        fm.iter().chain(&cm).chain(&gamma).all(|v| v.is_finite()),
        "non-finite transformed coefficients on a {node_count}-node grid"
    );
    ensure_post!(
        fm.windows(2).all(|w| w[1] > w[0]),
        "forward grid is not strictly increasing"
    );

    tracing::debug!(
        variant = transform.name(),
        zmin = layout.zmin,
        zmax = layout.zmax,
        h = layout.h,
        j0 = layout.pivot,
        nodes = node_count,
        "built transformed grid"
    );

    Ok((layout, TransformedArrays { fm, cm, gamma }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transform::{FreeBoundary, PositiveForward};
    use approx::assert_abs_diff_eq;
    use fds_core::Error;

    fn params() -> ModelParameters {
        ModelParameters::new(0.0488, 0.026, 0.5, 0.4, -0.1, 0.02, 1.0).unwrap()
    }

    #[test]
    fn pivot_cell_is_centred_on_forward() {
        let p = params();
        let (layout, arrays) = build_grid(&PositiveForward, &p, 100, 6.0).unwrap();
        assert_eq!(layout.node_count, 100);
        assert_eq!(layout.zm(layout.pivot), 0.0);
        assert_abs_diff_eq!(layout.z(layout.pivot) - 0.5 * layout.h, 0.0, epsilon = 1e-12);
        assert_abs_diff_eq!(arrays.fm[layout.pivot], p.shifted_forward(), epsilon = 1e-14);
        assert_eq!(
            arrays.gamma[layout.pivot],
            PositiveForward.drift_correction_at_forward(&p)
        );
    }

    #[test]
    fn layout_matches_window() {
        let p = params();
        let (layout, _) = build_grid(&FreeBoundary, &p, 101, 6.0).unwrap();
        // J = 99, h0 = 12/99, j0 = trunc(49.5) = 49
        assert_eq!(layout.pivot, 49);
        assert_abs_diff_eq!(layout.h, 6.0 / 48.5, epsilon = 1e-15);
        assert_eq!(layout.zmin, -6.0);
        assert_abs_diff_eq!(layout.zmax, layout.z(99), epsilon = 1e-15);
        assert!(layout.zmax > 6.0);
    }

    #[test]
    fn ghosts_are_extrapolated() {
        let p = params();
        let (layout, a) = build_grid(&PositiveForward, &p, 60, 6.0).unwrap();
        let last = layout.last_cell();
        let f_min = PositiveForward.forward_of_z(&p, layout.zmin);
        let f_max = PositiveForward.forward_of_z(&p, layout.zmax);
        assert_abs_diff_eq!(0.5 * (a.fm[0] + a.fm[1]), f_min, epsilon = 1e-15);
        assert_abs_diff_eq!(0.5 * (a.fm[last] + a.fm[last + 1]), f_max, epsilon = 1e-15);
        assert_eq!(a.cm[0], a.cm[1]);
        assert_eq!(a.cm[last + 1], a.cm[last]);
        assert_eq!(a.gamma[0], a.gamma[1]);
        assert_eq!(a.gamma[last + 1], a.gamma[last]);
    }

    #[test]
    fn positive_forward_physical_cells_stay_positive() {
        let p = ModelParameters::new(0.005, 0.03, 0.5, 0.4, -0.1, 0.0, 1.0).unwrap();
        let (layout, a) = build_grid(&PositiveForward, &p, 100, 6.0).unwrap();
        assert!(layout.zmin > -6.0);
        for i in 1..=layout.last_cell() {
            assert!(a.fm[i] > 0.0, "fm[{i}] = {}", a.fm[i]);
        }

        let (_, fb) = build_grid(&FreeBoundary, &p, 100, 6.0).unwrap();
        assert!(fb.fm[1] < 0.0);
    }

    #[test]
    fn coarse_grid_is_rejected() {
        // zmin is close to zero, so no whole cell fits below the forward.
        let p = ModelParameters::new(0.0005, 0.2, 0.5, 0.4, -0.1, 0.0, 1.0).unwrap();
        let err = build_grid(&PositiveForward, &p, 4, 6.0).unwrap_err();
        assert!(matches!(err, Error::InvalidDomain(_)), "{err:?}");
    }

    #[test]
    fn window_must_contain_origin() {
        let err = GridSpec::new(Boundaries { zmin: 0.5, zmax: 1.0 }, 10).unwrap_err();
        assert!(matches!(err, Error::InvalidDomain(_)));
        assert!(GridSpec::new(Boundaries { zmin: -1.0, zmax: 1.0 }, 3).is_err());
    }
}
