//! Error module containing error types and result aliases

mod adjust_error;

pub use adjust_error::{AdjustError, FitError};

/// Result type for engine-level adjustment operations
pub type Result<T> = std::result::Result<T, AdjustError>;

/// Result type for trend fitting operations
pub type FitResult<T> = std::result::Result<T, FitError>;
