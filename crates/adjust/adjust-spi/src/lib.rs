//! Price Adjustment Service Provider Interface
//!
//! Defines the data model, error types, and collaborator traits for temporal
//! price adjustment: inversion strategies, price-series sources, and spatial
//! neighbourhood indices.

pub mod contract;
pub mod error;
pub mod model;

// Re-export all public items at crate root for convenience
pub use contract::{InversionStrategy, MedianSource, NeighborhoodIndex};
pub use error::{AdjustError, FitError, FitResult, Result};
pub use model::{
    polyval, AdjustedRecord, AdjustmentOutcome, ErrorManifest, FittedModel, GroupKey,
    InversionMethod, PricePoint, PriceSeries, TransactionRecord, YearMonth,
};
