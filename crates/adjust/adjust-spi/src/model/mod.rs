//! Model module containing data structures

mod fitted_model;
mod outcome;
mod price_series;
mod transaction;
mod year_month;

pub use fitted_model::{polyval, FittedModel, InversionMethod};
pub use outcome::{AdjustmentOutcome, ErrorManifest};
pub use price_series::{GroupKey, PricePoint, PriceSeries};
pub use transaction::{AdjustedRecord, TransactionRecord};
pub use year_month::YearMonth;
