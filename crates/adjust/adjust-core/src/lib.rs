//! Price Adjustment Core
//!
//! Core implementations for temporal price adjustment: time index mapping,
//! polynomial trend fitting with least-squares and L1-norm inversion, monthly
//! price aggregation, and the per-location adjustment engine.

pub mod aggregation;
pub mod engine;
pub mod inversion;
pub mod time_index;
pub mod trend;

// Re-export SPI types for implementations
pub use adjust_spi::{
    AdjustError, AdjustedRecord, AdjustmentOutcome, ErrorManifest, FitError, FittedModel,
    GroupKey, InversionMethod, InversionStrategy, MedianSource, NeighborhoodIndex, PricePoint,
    PriceSeries, Result, TransactionRecord, YearMonth,
};

// Re-export main types
pub use aggregation::{
    AggregateStatistic, GraphNeighborhood, GroupedMedian, KRingMedian, PrecomputedSeries,
};
pub use engine::{FallbackPolicy, PriceAdjuster, TargetMonthPolicy};
pub use inversion::{L1NormInversion, LeastSquares};
pub use time_index::{index_to_month, to_index};
pub use trend::{r_squared, vandermonde, TrendFit, DEFAULT_ORDER};
