//! Trait for solving a design matrix against observations

use crate::error::FitResult;
use crate::model::InversionMethod;
use nalgebra::{DMatrix, DVector};

/// Solves `G m ≈ d` for the coefficient vector `m`.
///
/// `g` is N×order and `d` has length N. Implementations may assume the
/// caller has already checked that `g` has full column rank.
pub trait InversionStrategy: Send + Sync {
    /// Solve for the coefficients.
    fn invert(&self, g: &DMatrix<f64>, d: &DVector<f64>) -> FitResult<DVector<f64>>;

    /// Method identifier recorded on fitted models.
    fn method(&self) -> InversionMethod;
}
