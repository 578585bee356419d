//! Probability distributions.
//!
//! Only the standard normal is needed by the Black and Bachelier formulas;
//! its CDF delegates to the `statrs` complementary error function.

pub mod normal;

pub use normal::{normal_cdf, normal_pdf};
