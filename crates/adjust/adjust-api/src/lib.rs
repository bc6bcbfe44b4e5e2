//! Price Adjustment Consumer API
//!
//! Consumer configuration and builder APIs for the adjustment engine.
//!
//! This crate provides:
//! - Configuration types, loadable from JSON
//! - [`adjust`] for one-call adjustment from a configuration
//! - Re-exports from SPI and core for convenience

mod config;

pub use config::{AdjustmentConfig, AggregationConfig};

// Re-export from core
pub use adjust_core::{
    aggregation, engine, inversion, time_index, trend, AggregateStatistic, FallbackPolicy,
    GraphNeighborhood, GroupedMedian, KRingMedian, L1NormInversion, LeastSquares,
    PrecomputedSeries, PriceAdjuster, TargetMonthPolicy,
};

// Re-export types and traits from SPI
pub use adjust_spi::{
    polyval, AdjustError, AdjustedRecord, AdjustmentOutcome, ErrorManifest, FitError,
    FittedModel, GroupKey, InversionMethod, InversionStrategy, MedianSource, NeighborhoodIndex,
    PricePoint, PriceSeries, Result, TransactionRecord, YearMonth,
};

/// Adjust `records` with the engine described by `config`.
pub fn adjust(records: &[TransactionRecord], config: &AdjustmentConfig) -> Result<AdjustmentOutcome> {
    config.build()?.adjust(records)
}

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::{adjust, AdjustmentConfig, AggregationConfig};
    pub use adjust_core::{
        AggregateStatistic, FallbackPolicy, GroupedMedian, KRingMedian, PriceAdjuster,
        TargetMonthPolicy,
    };
    pub use adjust_spi::{
        AdjustError, AdjustedRecord, AdjustmentOutcome, FittedModel, GroupKey, InversionMethod,
        Result, TransactionRecord, YearMonth,
    };
}
