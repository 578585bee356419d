//! Finite difference building blocks for forward (Fokker–Planck) PDEs.
//!
//! # Overview
//!
//! * [`TridiagonalOperator`]: tridiagonal matrix with a checked Thomas solve
//! * [`LawsonSwayne`]: step sizes and extrapolation weights of the
//!   two-stage, second-order, L-stable Lawson–Swayne scheme

use fds_core::{ensure, ensure_post, errors::Result, fail, Real};

// ─── Tridiagonal operator ─────────────────────────────────────────────────────

/// A tridiagonal matrix operator.
///
/// Stores the lower, diagonal, and upper bands row by row: row `i` reads
/// `lower[i]·x[i-1] + diag[i]·x[i] + upper[i]·x[i+1]`.
#[derive(Debug, Clone)]
pub struct TridiagonalOperator {
    /// Lower diagonal (index 0 unused: starts from row 1).
    pub lower: Vec<Real>,
    /// Main diagonal.
    pub diag: Vec<Real>,
    /// Upper diagonal (last index unused: ends at row n−2).
    pub upper: Vec<Real>,
}

impl TridiagonalOperator {
    /// Create a zero tridiagonal operator of size `n`.
    pub fn new(n: usize) -> Self {
        Self {
            lower: vec![0.0; n],
            diag: vec![0.0; n],
            upper: vec![0.0; n],
        }
    }

    /// Size (number of rows/columns).
    pub fn size(&self) -> usize {
        self.diag.len()
    }

    /// Apply the operator: `y = A · x`.
    ///
    /// # Errors
    /// `InvalidDomain` if `x` does not match the operator size.
    pub fn apply(&self, x: &[Real]) -> Result<Vec<Real>> {
        let n = self.size();
        ensure!(
            x.len() == n,
            "vector has length {}, operator has size {n}",
            x.len()
        );
        if n == 0 {
            return Ok(Vec::new());
        }
        if n == 1 {
            return Ok(vec![self.diag[0] * x[0]]);
        }
        let mut y = vec![0.0; n];
        y[0] = self.diag[0] * x[0] + self.upper[0] * x[1];
        for i in 1..n - 1 {
            y[i] = self.lower[i] * x[i - 1] + self.diag[i] * x[i] + self.upper[i] * x[i + 1];
        }
        y[n - 1] = self.lower[n - 1] * x[n - 2] + self.diag[n - 1] * x[n - 1];
        Ok(y)
    }

    /// Solve `A · x = rhs` using the Thomas algorithm (LU decomposition
    /// for tridiagonal systems).
    ///
    /// # Errors
    /// `NumericalDegenerate` if a pivot vanishes or becomes non-finite, or if
    /// the solution is not finite.
    pub fn solve(&self, rhs: &[Real]) -> Result<Vec<Real>> {
        let n = self.size();
        ensure!(
            rhs.len() == n,
            "right-hand side has length {}, operator has size {n}",
            rhs.len()
        );
        ensure!(n > 0, "cannot solve an empty system");

        // Forward sweep
        let mut c_prime = vec![0.0; n];
        let mut d_prime = vec![0.0; n];

        let m0 = self.diag[0];
        if m0 == 0.0 || !m0.is_finite() {
            fail!("singular tridiagonal system: pivot 0 is {m0}");
        }
        c_prime[0] = self.upper[0] / m0;
        d_prime[0] = rhs[0] / m0;

        for i in 1..n {
            let m = self.diag[i] - self.lower[i] * c_prime[i - 1];
            if m == 0.0 || !m.is_finite() {
                fail!("singular tridiagonal system: pivot {i} is {m}");
            }
            if i < n - 1 {
                c_prime[i] = self.upper[i] / m;
            }
            d_prime[i] = (rhs[i] - self.lower[i] * d_prime[i - 1]) / m;
        }

        // Back substitution
        let mut x = vec![0.0; n];
        x[n - 1] = d_prime[n - 1];
        for i in (0..n - 1).rev() {
            x[i] = d_prime[i] - c_prime[i] * x[i + 1];
        }

        ensure_post!(
            x.iter().all(|v| v.is_finite()),
            "tridiagonal solve produced non-finite values"
        );
        Ok(x)
    }
}

// ─── Lawson–Swayne scheme ─────────────────────────────────────────────────────

/// The Lawson–Swayne two-stage composition for one time increment `dt`.
///
/// Two implicit Euler sub-steps of size `dt1 = b·dt` produce `u1` and `u2`;
/// the increment result is `(√2+1)·u2 − √2·u1`, which cancels the leading
/// error term and keeps L-stability.  Time-dependent coefficients are then
/// advanced by the remaining `dt2 = (1−2b)·dt` so that one increment covers
/// exactly `dt`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LawsonSwayne {
    /// Full increment.
    pub dt: Real,
    /// Implicit sub-step size `b·dt`.
    pub dt1: Real,
    /// Remaining coefficient advance `(1−2b)·dt`.
    pub dt2: Real,
}

impl LawsonSwayne {
    /// `b = 1 − √2/2`.
    pub const B: Real = 1.0 - 0.5 * std::f64::consts::SQRT_2;

    /// Weight applied to the second sub-step result.
    pub const W2: Real = std::f64::consts::SQRT_2 + 1.0;

    /// Weight applied to the first sub-step result (subtracted).
    pub const W1: Real = std::f64::consts::SQRT_2;

    /// Scheme for an increment of size `dt`.
    pub fn new(dt: Real) -> Self {
        Self {
            dt,
            dt1: Self::B * dt,
            dt2: (1.0 - 2.0 * Self::B) * dt,
        }
    }

    /// Richardson-type extrapolation of two scalar sub-step results.
    #[inline]
    pub fn combine(u1: Real, u2: Real) -> Real {
        Self::W2 * u2 - Self::W1 * u1
    }

    /// Element-wise [`combine`](Self::combine) of two sub-step vectors.
    pub fn combine_into(u1: &[Real], u2: &[Real], out: &mut [Real]) {
        debug_assert_eq!(u1.len(), u2.len());
        debug_assert_eq!(u1.len(), out.len());
        for ((o, &a), &b) in out.iter_mut().zip(u1).zip(u2) {
            *o = Self::combine(a, b);
        }
    }
}

// ─── Tests ────────────────────────────────────────────────────────────────────
