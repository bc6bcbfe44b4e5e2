//! Fitted per-group trend model

use super::{GroupKey, PriceSeries};
use nalgebra::DMatrix;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Inversion method used to solve for polynomial coefficients.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InversionMethod {
    /// Normal equations, minimizing the L2 residual
    #[default]
    LeastSquares,
    /// Linear program minimizing the L1 residual
    L1Norm,
}

impl fmt::Display for InversionMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InversionMethod::LeastSquares => write!(f, "least_squares"),
            InversionMethod::L1Norm => write!(f, "l1_norm"),
        }
    }
}

/// Evaluate a polynomial with coefficients ordered from the highest power down.
pub fn polyval(coefficients: &[f64], x: f64) -> f64 {
    coefficients.iter().fold(0.0, |acc, &c| acc * x + c)
}

/// Immutable trend model owned by one group.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FittedModel {
    pub key: GroupKey,
    /// Polynomial coefficients, highest power first
    pub coefficients: Vec<f64>,
    /// Vandermonde matrix the coefficients were solved against
    pub design_matrix: DMatrix<f64>,
    /// Series the model was fitted to
    pub series: PriceSeries,
    /// Coefficient of determination of the fit (diagnostic only)
    pub r_squared: f64,
    /// Number of series points used
    pub n_observations: usize,
    /// Inversion method that produced `coefficients`
    pub method: InversionMethod,
    /// Whether the configured method failed and least squares was used instead
    pub fallback_used: bool,
}

impl FittedModel {
    /// Polynomial order (number of coefficients).
    pub fn order(&self) -> usize {
        self.coefficients.len()
    }

    /// Trend value at a time index.
    pub fn evaluate(&self, time_index: i32) -> f64 {
        polyval(&self.coefficients, time_index as f64)
    }

    /// Factor rescaling a price at `from` to its equivalent at `to`.
    pub fn factor(&self, from: i32, to: i32) -> f64 {
        self.evaluate(to) / self.evaluate(from)
    }
}
