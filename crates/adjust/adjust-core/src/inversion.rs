//! Inversion strategies for the trend fitter
//!
//! - [`LeastSquares`] solves the normal equations `(GᵗG) m = Gᵗd` directly.
//! - [`L1NormInversion`] minimizes `Σ|Gm - d|` by rewriting it as a linear
//!   program (Menke, *Geophysical Data Analysis: Discrete Inverse Theory*,
//!   3rd ed., pp. 153-157).

use adjust_spi::{FitError, FitResult, InversionMethod, InversionStrategy};
use good_lp::{
    constraint, default_solver, variable, Expression, ProblemVariables, Solution, SolverModel,
    Variable,
};
use nalgebra::{DMatrix, DVector};

/// Default multiple of the largest least-squares coefficient used to bound
/// the L1 coefficients.
pub const DEFAULT_UPPER_BOUND_SCALE: f64 = 10.0;

/// Ordinary least squares via the normal equations.
#[derive(Debug, Clone, Copy, Default)]
pub struct LeastSquares;

impl LeastSquares {
    pub fn new() -> Self {
        Self
    }
}

impl InversionStrategy for LeastSquares {
    fn invert(&self, g: &DMatrix<f64>, d: &DVector<f64>) -> FitResult<DVector<f64>> {
        least_squares(g, d)
    }

    fn method(&self) -> InversionMethod {
        InversionMethod::LeastSquares
    }
}

/// Solve `(GᵗG) m = Gᵗd` with an LU decomposition.
pub fn least_squares(g: &DMatrix<f64>, d: &DVector<f64>) -> FitResult<DVector<f64>> {
    if g.nrows() != d.len() {
        return Err(FitError::InvalidInput(format!(
            "design matrix has {} rows but {} observations",
            g.nrows(),
            d.len()
        )));
    }
    let gt = g.transpose();
    let gtg = &gt * g;
    let gtd = &gt * d;
    gtg.lu()
        .solve(&gtd)
        .ok_or_else(|| FitError::Numerical("normal equations are singular".to_string()))
}

/// L1-norm inversion solved as a linear program.
///
/// Coefficients are split into non-negative parts `m⁺ - m⁻`, each bounded
/// above by `upper_bound_scale × max|m_LS|`. The bound is heuristic: an L1
/// optimum larger than it gets clipped.
#[derive(Debug, Clone, Copy)]
pub struct L1NormInversion {
    pub upper_bound_scale: f64,
}

impl Default for L1NormInversion {
    fn default() -> Self {
        Self {
            upper_bound_scale: DEFAULT_UPPER_BOUND_SCALE,
        }
    }
}

impl L1NormInversion {
    pub fn new(upper_bound_scale: f64) -> Self {
        Self { upper_bound_scale }
    }
}

impl InversionStrategy for L1NormInversion {
    fn invert(&self, g: &DMatrix<f64>, d: &DVector<f64>) -> FitResult<DVector<f64>> {
        l1_norm_inversion(g, d, None, self.upper_bound_scale)
    }

    fn method(&self) -> InversionMethod {
        InversionMethod::L1Norm
    }
}

/// Minimize `Σ |(Gm - d)ᵢ| / σᵢ`.
///
/// The program has `2M + 3N` variables `[m⁺, m⁻, α, x₁, x₂]` and `2N`
/// equality constraints
///
/// ```text
/// G(m⁺ - m⁻) - α + x₁ = d
/// G(m⁺ - m⁻) + α - x₂ = d
/// ```
///
/// with every variable non-negative, which together force `α ≥ |Gm - d|`.
/// `sd` defaults to ones.
pub fn l1_norm_inversion(
    g: &DMatrix<f64>,
    d: &DVector<f64>,
    sd: Option<&[f64]>,
    upper_bound_scale: f64,
) -> FitResult<DVector<f64>> {
    let (n, m) = g.shape();
    if let Some(sd) = sd {
        if sd.len() != n {
            return Err(FitError::InvalidInput(format!(
                "{} standard deviations for {} observations",
                sd.len(),
                n
            )));
        }
        if sd.iter().any(|s| !(s.is_finite() && *s > 0.0)) {
            return Err(FitError::InvalidInput(
                "standard deviations must be positive and finite".to_string(),
            ));
        }
    }
    if !(upper_bound_scale.is_finite() && upper_bound_scale >= 0.0) {
        return Err(FitError::InvalidInput(format!(
            "upper bound scale {} must be finite and non-negative",
            upper_bound_scale
        )));
    }

    let mls = least_squares(g, d)?;
    let upper_bound = upper_bound_scale * mls.amax();

    let mut vars = ProblemVariables::new();
    let m_pos: Vec<Variable> = (0..m)
        .map(|_| vars.add(variable().min(0.0).max(upper_bound)))
        .collect();
    let m_neg: Vec<Variable> = (0..m)
        .map(|_| vars.add(variable().min(0.0).max(upper_bound)))
        .collect();
    let alpha: Vec<Variable> = (0..n).map(|_| vars.add(variable().min(0.0))).collect();
    let x1: Vec<Variable> = (0..n).map(|_| vars.add(variable().min(0.0))).collect();
    let x2: Vec<Variable> = (0..n).map(|_| vars.add(variable().min(0.0))).collect();

    let objective = alpha
        .iter()
        .enumerate()
        .fold(Expression::from(0.0), |acc, (i, &a)| {
            let weight = sd.map_or(1.0, |sd| 1.0 / sd[i]);
            acc + weight * a
        });

    let mut problem = vars.minimise(objective).using(default_solver);

    for i in 0..n {
        let prediction = (0..m).fold(Expression::from(0.0), |acc, j| {
            acc + g[(i, j)] * m_pos[j] - g[(i, j)] * m_neg[j]
        });
        let di = d[i];
        problem = problem.with(constraint!(prediction.clone() - alpha[i] + x1[i] == di));
        problem = problem.with(constraint!(prediction + alpha[i] - x2[i] == di));
    }

    let solution = problem
        .solve()
        .map_err(|e| FitError::Infeasible(format!("{:?}", e)))?;

    Ok(DVector::from_iterator(
        m,
        (0..m).map(|j| solution.value(m_pos[j]) - solution.value(m_neg[j])),
    ))
}
