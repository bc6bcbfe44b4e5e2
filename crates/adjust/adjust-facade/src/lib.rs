//! Price Adjustment Facade
//!
//! Unified re-exports for the adjust stack:
//! - `adjust_spi` - Traits, data model, and errors
//! - `adjust_api` - Configuration types and builders
//! - `adjust_core` - Trend fitting, aggregation, and the adjustment engine
//!
//! # Example
//!
//! ```rust
//! use adjust_facade::prelude::*;
//!
//! let start = YearMonth::new(2021, 1).unwrap();
//! let records: Vec<_> = (0..8)
//!     .map(|i| TransactionRecord::new("ANG MO KIO", start.add_months(i), 300_000.0 + 2_000.0 * i as f64))
//!     .collect();
//!
//! let outcome = adjust(&records, &AdjustmentConfig::default()).unwrap();
//! assert!(outcome.is_complete());
//! assert!(outcome.records[0].adjusted_price > 300_000);
//! ```

// Re-export everything from API (which includes SPI and core)
pub use adjust_api::*;

// Explicit re-exports for documentation
pub use adjust_api::prelude;

// Re-export core modules for direct access
pub use adjust_core::{aggregation, engine, inversion, time_index, trend};

// Re-export SPI traits and data model
pub use adjust_spi::{
    AdjustError, AdjustedRecord, AdjustmentOutcome, ErrorManifest, FitError, FittedModel,
    GroupKey, InversionMethod, InversionStrategy, MedianSource, NeighborhoodIndex, PricePoint,
    PriceSeries, TransactionRecord, YearMonth,
};
