//! Price adjustment configuration types.

use adjust_core::{
    AggregateStatistic, FallbackPolicy, GroupedMedian, InversionMethod, KRingMedian,
    L1NormInversion, LeastSquares, NeighborhoodIndex, PriceAdjuster, TargetMonthPolicy,
    DEFAULT_ORDER,
};
use adjust_core::inversion::DEFAULT_UPPER_BOUND_SCALE;
use adjust_spi::{AdjustError, Result, YearMonth};
use serde::{Deserialize, Serialize};
use std::path::Path;

// ============================================================================
// Aggregation Configuration
// ============================================================================

/// How records are reduced to the monthly series each trend is fitted to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AggregationConfig {
    /// Statistic per month bucket.
    pub statistic: AggregateStatistic,
    /// Fit one trend per location (true) or one for the whole dataset.
    pub grouped: bool,
    /// Neighbourhood radius used by [`AdjustmentConfig::build_k_ring`].
    pub k_ring_radius: u32,
}

impl Default for AggregationConfig {
    fn default() -> Self {
        Self {
            statistic: AggregateStatistic::Median,
            grouped: true,
            k_ring_radius: 1,
        }
    }
}

// ============================================================================
// Adjustment Configuration
// ============================================================================

/// Adjustment engine configuration.
///
/// Every field is optional in serialized form and falls back to its default.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AdjustmentConfig {
    /// Number of polynomial coefficients (4 gives a cubic).
    pub order: usize,
    /// Inversion method for the trend fit.
    pub method: InversionMethod,
    /// Reference month prices are rescaled toward.
    pub target: TargetMonthPolicy,
    /// Time index anchor; the earliest record month when unset.
    pub start_month: Option<YearMonth>,
    /// Behaviour when the L1 program fails.
    pub fallback: FallbackPolicy,
    /// Multiple of the largest least-squares coefficient bounding L1 coefficients.
    pub l1_upper_bound_scale: f64,
    pub aggregation: AggregationConfig,
    /// Fit groups in parallel.
    pub parallel: bool,
}

impl Default for AdjustmentConfig {
    fn default() -> Self {
        Self {
            order: DEFAULT_ORDER,
            method: InversionMethod::LeastSquares,
            target: TargetMonthPolicy::Current,
            start_month: None,
            fallback: FallbackPolicy::Disabled,
            l1_upper_bound_scale: DEFAULT_UPPER_BOUND_SCALE,
            aggregation: AggregationConfig::default(),
            parallel: false,
        }
    }
}

impl AdjustmentConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Robust L1 fit that refits with least squares when the program fails.
    pub fn robust() -> Self {
        Self {
            method: InversionMethod::L1Norm,
            fallback: FallbackPolicy::LeastSquares,
            ..Self::default()
        }
    }

    pub fn with_order(mut self, order: usize) -> Self {
        self.order = order;
        self
    }

    pub fn with_method(mut self, method: InversionMethod) -> Self {
        self.method = method;
        self
    }

    pub fn with_target(mut self, target: TargetMonthPolicy) -> Self {
        self.target = target;
        self
    }

    pub fn with_start_month(mut self, start_month: YearMonth) -> Self {
        self.start_month = Some(start_month);
        self
    }

    pub fn with_fallback(mut self, fallback: FallbackPolicy) -> Self {
        self.fallback = fallback;
        self
    }

    pub fn with_aggregation(mut self, aggregation: AggregationConfig) -> Self {
        self.aggregation = aggregation;
        self
    }

    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    /// Check parameter ranges.
    pub fn validate(&self) -> Result<()> {
        if self.order == 0 {
            return Err(AdjustError::InvalidParameter {
                name: "order".to_string(),
                reason: "must be at least 1".to_string(),
            });
        }
        if !(self.l1_upper_bound_scale.is_finite() && self.l1_upper_bound_scale > 0.0) {
            return Err(AdjustError::InvalidParameter {
                name: "l1_upper_bound_scale".to_string(),
                reason: format!("must be positive and finite, got {}", self.l1_upper_bound_scale),
            });
        }
        Ok(())
    }

    /// Parse and validate a JSON configuration.
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self =
            serde_json::from_str(json).map_err(|e| AdjustError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse, and validate a JSON configuration file.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path)
            .map_err(|e| AdjustError::Config(format!("{}: {}", path.display(), e)))?;
        Self::from_json(&json)
    }

    /// Construct the engine this configuration describes.
    pub fn build(&self) -> Result<PriceAdjuster> {
        self.validate()?;
        Ok(self.engine().with_source(GroupedMedian {
            grouped: self.aggregation.grouped,
            statistic: self.aggregation.statistic,
        }))
    }

    /// Construct an engine whose series pool each cell's k-ring in `index`,
    /// with radius `aggregation.k_ring_radius`. `aggregation.grouped` is
    /// ignored; every cell gets its own series.
    pub fn build_k_ring<I>(&self, index: I) -> Result<PriceAdjuster>
    where
        I: NeighborhoodIndex + 'static,
    {
        self.validate()?;
        Ok(self.engine().with_source(
            KRingMedian::new(index, self.aggregation.k_ring_radius)
                .with_statistic(self.aggregation.statistic),
        ))
    }

    fn engine(&self) -> PriceAdjuster {
        let mut adjuster = PriceAdjuster::new()
            .with_order(self.order)
            .with_target(self.target)
            .with_fallback(self.fallback)
            .with_parallel(self.parallel);
        if let Some(start_month) = self.start_month {
            adjuster = adjuster.with_start_month(start_month);
        }
        match self.method {
            InversionMethod::LeastSquares => adjuster.with_strategy(LeastSquares),
            InversionMethod::L1Norm => {
                adjuster.with_strategy(L1NormInversion::new(self.l1_upper_bound_scale))
            }
        }
    }
}
