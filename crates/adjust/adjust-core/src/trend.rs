//! Polynomial trend fitting
//!
//! Builds a Vandermonde design matrix from time indices and hands it to an
//! [`InversionStrategy`] for the coefficients.

use adjust_spi::{FitError, FitResult, InversionStrategy};
use nalgebra::{DMatrix, DVector};
use std::collections::BTreeSet;

/// Default number of polynomial coefficients (a degree-3 curve).
pub const DEFAULT_ORDER: usize = 4;

/// Coefficients together with the design matrix they were solved against.
#[derive(Debug, Clone, PartialEq)]
pub struct TrendFit {
    /// Highest power first
    pub coefficients: DVector<f64>,
    pub design_matrix: DMatrix<f64>,
}

/// N×order Vandermonde matrix, powers descending from `order - 1` to 0.
pub fn vandermonde(time_indices: &[i32], order: usize) -> DMatrix<f64> {
    DMatrix::from_fn(time_indices.len(), order, |row, col| {
        (time_indices[row] as f64).powi((order - 1 - col) as i32)
    })
}

/// Number of distinct time indices, which is the rank of the Vandermonde
/// matrix when it does not exceed the order.
pub fn distinct_points(time_indices: &[i32]) -> usize {
    time_indices.iter().collect::<BTreeSet<_>>().len()
}

/// Fit a polynomial of `order` coefficients to `(time_indices, prices)`.
///
/// Duplicate and out-of-order indices are accepted. Fails with
/// [`FitError::InsufficientData`] when the design matrix would be
/// rank-deficient.
pub fn fit(
    time_indices: &[i32],
    prices: &[f64],
    order: usize,
    strategy: &dyn InversionStrategy,
) -> FitResult<TrendFit> {
    if order == 0 {
        return Err(FitError::InvalidInput("order must be at least 1".to_string()));
    }
    if time_indices.len() != prices.len() {
        return Err(FitError::InvalidInput(format!(
            "{} time indices but {} prices",
            time_indices.len(),
            prices.len()
        )));
    }
    if let Some(bad) = prices.iter().find(|p| !p.is_finite()) {
        return Err(FitError::InvalidInput(format!("non-finite price {}", bad)));
    }

    let distinct = distinct_points(time_indices);
    if distinct < order {
        return Err(FitError::InsufficientData { distinct, order });
    }

    let design_matrix = vandermonde(time_indices, order);
    let d = DVector::from_column_slice(prices);
    let coefficients = strategy.invert(&design_matrix, &d)?;

    if coefficients.len() != order || coefficients.iter().any(|c| !c.is_finite()) {
        return Err(FitError::Numerical(
            "inversion produced non-finite coefficients".to_string(),
        ));
    }

    Ok(TrendFit {
        coefficients,
        design_matrix,
    })
}

/// Coefficient of determination of `design_matrix * coefficients` against `observed`.
///
/// A constant series scores 1.0 when fitted exactly and 0.0 otherwise.
pub fn r_squared(observed: &[f64], design_matrix: &DMatrix<f64>, coefficients: &DVector<f64>) -> f64 {
    if observed.is_empty() {
        return 0.0;
    }
    let fitted = design_matrix * coefficients;
    let n = observed.len() as f64;
    let mean = observed.iter().sum::<f64>() / n;

    let ss_tot: f64 = observed.iter().map(|y| (y - mean).powi(2)).sum();
    let ss_res: f64 = observed
        .iter()
        .zip(fitted.iter())
        .map(|(y, f)| (y - f).powi(2))
        .sum();

    if ss_tot > 0.0 {
        1.0 - ss_res / ss_tot
    } else if ss_res == 0.0 {
        1.0
    } else {
        0.0
    }
}
