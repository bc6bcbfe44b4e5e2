//! Adjustment error types

use thiserror::Error;

/// Errors raised while fitting a single trend model.
///
/// These carry no location; the engine attaches one through
/// [`AdjustError::from_fit`].
#[derive(Error, Debug, Clone, PartialEq)]
pub enum FitError {
    /// Fewer distinct time points than the polynomial order (rank-deficient design matrix)
    #[error("Insufficient data: need at least {order} distinct time points, got {distinct}")]
    InsufficientData { distinct: usize, order: usize },

    /// The linear program has no feasible or bounded solution
    #[error("Linear program failed: {0}")]
    Infeasible(String),

    /// Numerical computation error
    #[error("Numerical error: {0}")]
    Numerical(String),

    /// Malformed fitter input
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

/// Errors raised by the adjustment engine.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum AdjustError {
    /// The design matrix for a location is rank-deficient
    #[error("Insufficient data for location '{location}': need at least {order} distinct months, got {distinct}")]
    InsufficientData {
        location: String,
        distinct: usize,
        order: usize,
    },

    /// A location present in the records has no price series to fit
    #[error("No trend model for location '{location}': missing from price series")]
    MissingGroupModel { location: String },

    /// The L1 linear program failed for a location
    #[error("Fit did not converge for location '{location}': {reason}")]
    FitConvergence { location: String, reason: String },

    /// The fitted trend is not strictly positive where a factor is needed
    #[error("Trend for location '{location}' evaluates to {value} at index {index}")]
    NonPositiveTrend {
        location: String,
        index: i32,
        value: f64,
    },

    /// A record in the location has a negative or non-finite price
    #[error("Invalid price for location '{location}': record {record} has price {price}")]
    InvalidPrice {
        location: String,
        record: usize,
        price: f64,
    },

    /// Numerical failure scoped to a location
    #[error("Numerical error for location '{location}': {reason}")]
    Numerical { location: String, reason: String },

    /// Invalid parameter value
    #[error("Invalid parameter '{name}': {reason}")]
    InvalidParameter { name: String, reason: String },

    /// No records were supplied
    #[error("No transaction records to adjust")]
    EmptyInput,

    /// Configuration could not be loaded
    #[error("Configuration error: {0}")]
    Config(String),
}

impl AdjustError {
    /// Scope a fitter error to a location.
    pub fn from_fit(location: impl Into<String>, error: FitError) -> Self {
        let location = location.into();
        match error {
            FitError::InsufficientData { distinct, order } => AdjustError::InsufficientData {
                location,
                distinct,
                order,
            },
            FitError::Infeasible(reason) => AdjustError::FitConvergence { location, reason },
            FitError::Numerical(reason) | FitError::InvalidInput(reason) => {
                AdjustError::Numerical { location, reason }
            }
        }
    }

    /// The location this error is scoped to, if any.
    pub fn location(&self) -> Option<&str> {
        match self {
            AdjustError::InsufficientData { location, .. }
            | AdjustError::MissingGroupModel { location }
            | AdjustError::FitConvergence { location, .. }
            | AdjustError::NonPositiveTrend { location, .. }
            | AdjustError::InvalidPrice { location, .. }
            | AdjustError::Numerical { location, .. } => Some(location),
            AdjustError::InvalidParameter { .. } | AdjustError::EmptyInput | AdjustError::Config(_) => {
                None
            }
        }
    }
}
