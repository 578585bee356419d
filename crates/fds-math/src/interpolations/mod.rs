//! 1D interpolation trait and piecewise-linear implementation.

use fds_core::{ensure, errors::Result, Real};

/// A 1D interpolation function `f: R → R` defined by a set of known points.
pub trait Interpolation1D: std::fmt::Debug {
    /// Evaluate the interpolation at `x`.
    fn operator(&self, x: Real) -> Real;

    /// Return the lower bound of the interpolation domain.
    fn x_min(&self) -> Real;

    /// Return the upper bound of the interpolation domain.
    fn x_max(&self) -> Real;

    /// Return `true` if `x` is within the interpolation range.
    fn is_in_range(&self, x: Real) -> bool {
        x >= self.x_min() && x <= self.x_max()
    }
}

// ── Linear ────────────────────────────────────────────────────────────────────

/// Linear interpolation.
///
/// `f(x) = y[i] + (y[i+1] - y[i]) * (x - x[i]) / (x[i+1] - x[i])`
///
/// Outside `[x_min, x_max]` the end segments are extended linearly; callers
/// that need a hard domain check [`Interpolation1D::is_in_range`] first.
#[derive(Debug, Clone)]
pub struct LinearInterpolation {
    xs: Vec<Real>,
    ys: Vec<Real>,
}

impl LinearInterpolation {
    /// Construct a linear interpolation from sorted `xs` and corresponding `ys`.
    ///
    /// # Errors
    /// Returns an error if the slices have different lengths, hold fewer than
    /// 2 points, or `xs` is not sorted in increasing order.
    pub fn new(xs: &[Real], ys: &[Real]) -> Result<Self> {
        ensure!(xs.len() >= 2, "need at least 2 points for interpolation");
        ensure!(
            xs.len() == ys.len(),
            "xs and ys must have the same length"
        );
        ensure!(
            xs.windows(2).all(|w| w[0] <= w[1]),
            "xs must be sorted in increasing order"
        );
        Ok(Self {
            xs: xs.to_vec(),
            ys: ys.to_vec(),
        })
    }

    fn locate(&self, x: Real) -> usize {
        let n = self.xs.len();
        if x <= self.xs[0] {
            return 0;
        }
        if x >= self.xs[n - 1] {
            return n - 2;
        }
        // index of the last node with xs[i] <= x
        self.xs.partition_point(|&xi| xi <= x) - 1
    }
}

impl Interpolation1D for LinearInterpolation {
    fn x_min(&self) -> Real {
        self.xs[0]
    }

    fn x_max(&self) -> Real {
        self.xs[self.xs.len() - 1]
    }

    fn operator(&self, x: Real) -> Real {
        let i = self.locate(x);
        let dx = self.xs[i + 1] - self.xs[i];
        if dx.abs() < f64::EPSILON {
            return self.ys[i];
        }
        self.ys[i] + (x - self.xs[i]) * (self.ys[i + 1] - self.ys[i]) / dx
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn linear_interpolation() {
        let xs = [0.0, 1.0, 2.0];
        let ys = [0.0, 1.0, 4.0];
        let interp = LinearInterpolation::new(&xs, &ys).unwrap();
        assert_abs_diff_eq!(interp.operator(0.5), 0.5, epsilon = 1e-12);
        assert_abs_diff_eq!(interp.operator(1.5), 2.5, epsilon = 1e-12);
        assert_abs_diff_eq!(interp.operator(1.0), 1.0, epsilon = 1e-12);
        assert_abs_diff_eq!(interp.operator(2.0), 4.0, epsilon = 1e-12);
    }

    #[test]
    fn range_and_extension() {
        let interp = LinearInterpolation::new(&[-1.0, 0.0, 1.0], &[2.0, 0.0, 2.0]).unwrap();
        assert!(interp.is_in_range(-1.0));
        assert!(interp.is_in_range(1.0));
        assert!(!interp.is_in_range(1.5));
        assert_abs_diff_eq!(interp.operator(1.5), 3.0, epsilon = 1e-12);
    }

    #[test]
    fn rejects_bad_input() {
        assert!(LinearInterpolation::new(&[0.0], &[0.0]).is_err());
        assert!(LinearInterpolation::new(&[0.0, 1.0], &[0.0]).is_err());
        assert!(LinearInterpolation::new(&[1.0, 0.0], &[0.0, 1.0]).is_err());
    }
}
