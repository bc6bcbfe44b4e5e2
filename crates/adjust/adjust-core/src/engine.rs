//! Price adjustment engine
//!
//! For every group of records: fit a polynomial trend to the group's monthly
//! price series, then rescale each record's price by
//! `trend(target) / trend(own month)`.
//!
//! Failures are scoped to a group. A group that cannot be fitted lands in the
//! outcome's [`ErrorManifest`] and its records are skipped; every other group
//! is still adjusted.

use crate::aggregation::GroupedMedian;
use crate::inversion::{L1NormInversion, LeastSquares};
use crate::time_index::to_index;
use crate::trend::{self, DEFAULT_ORDER};
use adjust_spi::{
    AdjustError, AdjustedRecord, AdjustmentOutcome, ErrorManifest, FitError, FittedModel,
    GroupKey, InversionMethod, InversionStrategy, MedianSource, PriceSeries, Result,
    TransactionRecord, YearMonth,
};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

/// Which month historical prices are rescaled toward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TargetMonthPolicy {
    /// Latest month present in the records
    #[default]
    Current,
    /// One month past the latest month present
    Next,
}

impl TargetMonthPolicy {
    pub fn resolve(&self, latest: YearMonth) -> YearMonth {
        match self {
            TargetMonthPolicy::Current => latest,
            TargetMonthPolicy::Next => latest.add_months(1),
        }
    }
}

/// What to do when the configured inversion fails to converge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FallbackPolicy {
    /// Report the failure for the group
    #[default]
    Disabled,
    /// Refit the group with least squares
    LeastSquares,
}

/// Fits per-group trend models and applies them to transaction records.
///
/// # Example
///
/// ```rust
/// use adjust_core::{PriceAdjuster, TargetMonthPolicy};
/// use adjust_spi::{TransactionRecord, YearMonth};
///
/// let start = YearMonth::new(2021, 1).unwrap();
/// let records: Vec<_> = [100.0, 102.0, 104.0, 108.0, 112.0, 120.0]
///     .iter()
///     .enumerate()
///     .map(|(i, &p)| TransactionRecord::new("A", start.add_months(i as i32), p))
///     .collect();
///
/// let outcome = PriceAdjuster::new()
///     .with_target(TargetMonthPolicy::Current)
///     .adjust(&records)
///     .unwrap();
/// assert_eq!(outcome.records.len(), 6);
/// assert_eq!(outcome.records[5].factor, 1.0);
/// ```
pub struct PriceAdjuster {
    order: usize,
    target: TargetMonthPolicy,
    start_month: Option<YearMonth>,
    fallback: FallbackPolicy,
    parallel: bool,
    source: Box<dyn MedianSource>,
    strategy: Box<dyn InversionStrategy>,
}

impl Default for PriceAdjuster {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for PriceAdjuster {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PriceAdjuster")
            .field("order", &self.order)
            .field("target", &self.target)
            .field("start_month", &self.start_month)
            .field("fallback", &self.fallback)
            .field("parallel", &self.parallel)
            .field("method", &self.strategy.method())
            .finish()
    }
}

impl PriceAdjuster {
    /// Order 4, least squares, grouped by location, targeting the latest month.
    pub fn new() -> Self {
        Self {
            order: DEFAULT_ORDER,
            target: TargetMonthPolicy::Current,
            start_month: None,
            fallback: FallbackPolicy::Disabled,
            parallel: false,
            source: Box::new(GroupedMedian::by_location()),
            strategy: Box::new(LeastSquares),
        }
    }

    /// Number of polynomial coefficients.
    pub fn with_order(mut self, order: usize) -> Self {
        self.order = order;
        self
    }

    pub fn with_target(mut self, target: TargetMonthPolicy) -> Self {
        self.target = target;
        self
    }

    /// Anchor the time index here instead of at the earliest record month.
    pub fn with_start_month(mut self, start_month: YearMonth) -> Self {
        self.start_month = Some(start_month);
        self
    }

    pub fn with_fallback(mut self, fallback: FallbackPolicy) -> Self {
        self.fallback = fallback;
        self
    }

    /// Fit groups on the rayon thread pool.
    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    pub fn with_source(mut self, source: impl MedianSource + 'static) -> Self {
        self.source = Box::new(source);
        self
    }

    pub fn with_strategy(mut self, strategy: impl InversionStrategy + 'static) -> Self {
        self.strategy = Box::new(strategy);
        self
    }

    /// Select a built-in strategy; L1 uses the default upper bound scale.
    pub fn with_method(self, method: InversionMethod) -> Self {
        match method {
            InversionMethod::LeastSquares => self.with_strategy(LeastSquares),
            InversionMethod::L1Norm => self.with_strategy(L1NormInversion::default()),
        }
    }

    pub fn order(&self) -> usize {
        self.order
    }

    pub fn method(&self) -> InversionMethod {
        self.strategy.method()
    }

    /// Fit one group's series with the time index anchored at `start_month`.
    pub fn fit_group(
        &self,
        key: &GroupKey,
        series: &PriceSeries,
        start_month: YearMonth,
    ) -> Result<FittedModel> {
        let time_indices: Vec<i32> = series.months().map(|m| to_index(m, start_month)).collect();
        let prices = series.prices();

        let fitted = match trend::fit(&time_indices, &prices, self.order, self.strategy.as_ref()) {
            Ok(fit) => Ok((fit, self.strategy.method(), false)),
            Err(FitError::Infeasible(reason)) if self.fallback == FallbackPolicy::LeastSquares => {
                tracing::warn!(
                    "{} fit failed for '{}' ({}), falling back to least squares",
                    self.strategy.method(),
                    key,
                    reason
                );
                trend::fit(&time_indices, &prices, self.order, &LeastSquares)
                    .map(|fit| (fit, InversionMethod::LeastSquares, true))
            }
            Err(e) => Err(e),
        };
        let (fit, method, fallback_used) =
            fitted.map_err(|e| AdjustError::from_fit(key.to_string(), e))?;

        let r_squared = trend::r_squared(&prices, &fit.design_matrix, &fit.coefficients);
        tracing::debug!(
            "fitted '{}': n={}, r2={:.4}, method={}",
            key,
            series.len(),
            r_squared,
            method
        );

        Ok(FittedModel {
            key: key.clone(),
            coefficients: fit.coefficients.iter().copied().collect(),
            design_matrix: fit.design_matrix,
            series: series.clone(),
            r_squared,
            n_observations: series.len(),
            method,
            fallback_used,
        })
    }

    /// Adjust every record toward the resolved target month.
    ///
    /// Returns `Err` only for batch-level problems (no records, invalid
    /// order, a failing price source). Per-group failures, including a group
    /// holding a negative or non-finite price, are collected in the
    /// outcome's manifest. Zero prices are valid and adjust to zero.
    pub fn adjust(&self, records: &[TransactionRecord]) -> Result<AdjustmentOutcome> {
        if self.order == 0 {
            return Err(AdjustError::InvalidParameter {
                name: "order".to_string(),
                reason: "must be at least 1".to_string(),
            });
        }
        let (earliest, latest) = match (
            records.iter().map(|r| r.month).min(),
            records.iter().map(|r| r.month).max(),
        ) {
            (Some(earliest), Some(latest)) => (earliest, latest),
            _ => return Err(AdjustError::EmptyInput),
        };
        let start_month = self.start_month.unwrap_or(earliest);
        let target_month = self.target.resolve(latest);
        let target_index = to_index(target_month, start_month);

        let keys: Vec<GroupKey> = records.iter().map(|r| self.source.group_key(r)).collect();
        let mut own_indices: BTreeMap<&GroupKey, BTreeSet<i32>> = BTreeMap::new();
        let mut invalid_prices: BTreeMap<&GroupKey, (usize, f64)> = BTreeMap::new();
        for (i, (key, record)) in keys.iter().zip(records).enumerate() {
            own_indices
                .entry(key)
                .or_default()
                .insert(to_index(record.month, start_month));
            if !is_valid_price(record.price) {
                invalid_prices.entry(key).or_insert((i, record.price));
            }
        }

        tracing::info!(
            "adjusting {} records across {} groups toward {} (index {})",
            records.len(),
            own_indices.len(),
            target_month,
            target_index
        );

        // bad prices never reach the aggregation
        let series = if invalid_prices.is_empty() {
            self.source.series(records)?
        } else {
            let valid: Vec<TransactionRecord> = records
                .iter()
                .filter(|r| is_valid_price(r.price))
                .cloned()
                .collect();
            self.source.series(&valid)?
        };

        let fit_one = |(key, indices): (&&GroupKey, &BTreeSet<i32>)| {
            let key: &GroupKey = key;
            if let Some(&(record, price)) = invalid_prices.get(&key) {
                let error = AdjustError::InvalidPrice {
                    location: key.to_string(),
                    record,
                    price,
                };
                return (key.clone(), Err(error));
            }
            let result = match series.get(key) {
                Some(s) => self
                    .fit_group(key, s, start_month)
                    .and_then(|model| check_positive(model, indices, target_index)),
                None => Err(AdjustError::MissingGroupModel {
                    location: key.to_string(),
                }),
            };
            (key.clone(), result)
        };

        let results: Vec<(GroupKey, Result<FittedModel>)> = if self.parallel {
            own_indices.par_iter().map(fit_one).collect()
        } else {
            own_indices.iter().map(fit_one).collect()
        };

        let mut models = BTreeMap::new();
        let mut manifest = ErrorManifest::default();
        for (key, result) in results {
            match result {
                Ok(model) => {
                    models.insert(key, model);
                }
                Err(e) => {
                    tracing::warn!("skipping '{}': {}", key, e);
                    manifest.failures.insert(key, e);
                }
            }
        }

        let mut adjusted = Vec::with_capacity(records.len());
        for (i, (key, record)) in keys.iter().zip(records).enumerate() {
            let Some(model) = models.get(key) else {
                manifest.skipped_records.push(i);
                continue;
            };
            let own = to_index(record.month, start_month);
            adjusted.push(AdjustedRecord::new(
                record.clone(),
                i,
                own,
                target_index,
                model.factor(own, target_index),
            ));
        }

        tracing::info!(
            "adjusted {} records, {} groups fitted, {} failed, {} records skipped",
            adjusted.len(),
            models.len(),
            manifest.len(),
            manifest.skipped_records.len()
        );

        Ok(AdjustmentOutcome {
            records: adjusted,
            models,
            start_month,
            target_month,
            target_index,
            manifest,
        })
    }
}

fn is_valid_price(price: f64) -> bool {
    price.is_finite() && price >= 0.0
}

/// Reject a model whose trend is not strictly positive where factors are taken.
fn check_positive(
    model: FittedModel,
    own_indices: &BTreeSet<i32>,
    target_index: i32,
) -> Result<FittedModel> {
    for &index in std::iter::once(&target_index).chain(own_indices) {
        let value = model.evaluate(index);
        if !(value.is_finite() && value > 0.0) {
            return Err(AdjustError::NonPositiveTrend {
                location: model.key.to_string(),
                index,
                value,
            });
        }
    }
    Ok(model)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregation::{AggregateStatistic, PrecomputedSeries};
    use adjust_spi::{FitResult, PricePoint};
    use nalgebra::{DMatrix, DVector};

    fn ym(year: i32, month: u32) -> YearMonth {
        YearMonth::new(year, month).unwrap()
    }

    fn rising(location: &str, start: YearMonth) -> Vec<TransactionRecord> {
        [100.0, 102.0, 104.0, 108.0, 112.0, 120.0]
            .iter()
            .enumerate()
            .map(|(i, &p)| TransactionRecord::new(location, start.add_months(i as i32), p))
            .collect()
    }

    /// Mock implementation: always reports an infeasible program
    struct Infeasible;

    impl InversionStrategy for Infeasible {
        fn invert(&self, _: &DMatrix<f64>, _: &DVector<f64>) -> FitResult<DVector<f64>> {
            Err(FitError::Infeasible("bound too tight".to_string()))
        }

        fn method(&self) -> InversionMethod {
            InversionMethod::L1Norm
        }
    }

    #[test]
    fn test_rising_prices_scenario() {
        let records = rising("A", ym(2021, 1));
        let outcome = PriceAdjuster::new().adjust(&records).unwrap();

        let model = outcome.model(&GroupKey::location("A")).unwrap();
        assert!(model.evaluate(6) > model.evaluate(1));
        assert_eq!(model.n_observations, 6);
        assert_eq!(model.order(), 4);
        assert_eq!(model.design_matrix.shape(), (6, 4));
        assert!(model.r_squared > 0.9);

        // older records are scaled up toward the latest level
        assert!(outcome.records[0].factor > 1.0);
        assert!(outcome.records[0].adjusted_price > 100);
    }

    #[test]
    fn test_target_month_factor_is_one() {
        let records = rising("A", ym(2021, 1));
        let outcome = PriceAdjuster::new().adjust(&records).unwrap();

        assert_eq!(outcome.target_month, ym(2021, 6));
        assert_eq!(outcome.target_index, 6);
        let last = &outcome.records[5];
        assert_eq!(last.time_index, outcome.target_index);
        assert_eq!(last.factor, 1.0);
        assert_eq!(last.adjusted_price, 120);
    }

    #[test]
    fn test_next_month_policy() {
        let records = rising("A", ym(2020, 10));
        let outcome = PriceAdjuster::new()
            .with_target(TargetMonthPolicy::Next)
            .adjust(&records)
            .unwrap();

        // latest month is March 2021
        assert_eq!(outcome.target_month, ym(2021, 4));
        assert_eq!(outcome.target_index, to_index(ym(2021, 3), outcome.start_month) + 1);
        assert!(outcome.records.iter().all(|r| r.factor != 1.0));
    }

    #[test]
    fn test_insufficient_group_is_reported_not_fatal() {
        let mut records = rising("A", ym(2021, 1));
        records.push(TransactionRecord::new("B", ym(2021, 1), 50.0));
        records.push(TransactionRecord::new("B", ym(2021, 2), 55.0));

        let outcome = PriceAdjuster::new().adjust(&records).unwrap();
        assert_eq!(outcome.records.len(), 6);
        assert_eq!(outcome.manifest.skipped_records, vec![6, 7]);
        assert_eq!(
            outcome.manifest.failure(&GroupKey::location("B")),
            Some(&AdjustError::InsufficientData {
                location: "B".to_string(),
                distinct: 2,
                order: 4,
            })
        );
        assert!(outcome.model(&GroupKey::location("B")).is_none());
        assert!(outcome.ensure_complete().is_err());
    }

    #[test]
    fn test_missing_group_in_precomputed_series() {
        let records = rising("A", ym(2021, 1));
        let mut other = rising("B", ym(2021, 1));
        other.extend(records.iter().cloned());

        let series = crate::aggregation::median_series(&records, true);
        let outcome = PriceAdjuster::new()
            .with_source(PrecomputedSeries::grouped(series))
            .adjust(&other)
            .unwrap();

        assert!(matches!(
            outcome.manifest.failure(&GroupKey::location("B")),
            Some(AdjustError::MissingGroupModel { location }) if location == "B"
        ));
        assert_eq!(outcome.manifest.skipped_records, (0..6).collect::<Vec<_>>());
        assert!(outcome.records.iter().all(|r| r.record.location == "A"));
    }

    #[test]
    fn test_ungrouped_single_model() {
        let mut records = rising("A", ym(2021, 1));
        records.extend(rising("B", ym(2021, 1)));
        let outcome = PriceAdjuster::new()
            .with_source(GroupedMedian::ungrouped())
            .adjust(&records)
            .unwrap();

        assert_eq!(outcome.models.keys().collect::<Vec<_>>(), vec![&GroupKey::All]);
        assert_eq!(outcome.records.len(), 12);
        assert_eq!(outcome.records[0].factor, outcome.records[6].factor);
    }

    #[test]
    fn test_convergence_failure_without_fallback() {
        let records = rising("A", ym(2021, 1));
        let outcome = PriceAdjuster::new()
            .with_strategy(Infeasible)
            .adjust(&records)
            .unwrap();
        assert!(matches!(
            outcome.manifest.failure(&GroupKey::location("A")),
            Some(AdjustError::FitConvergence { .. })
        ));
        assert!(outcome.records.is_empty());
    }

    #[test]
    fn test_convergence_failure_with_fallback() {
        let records = rising("A", ym(2021, 1));
        let outcome = PriceAdjuster::new()
            .with_strategy(Infeasible)
            .with_fallback(FallbackPolicy::LeastSquares)
            .adjust(&records)
            .unwrap();

        let model = outcome.model(&GroupKey::location("A")).unwrap();
        assert!(model.fallback_used);
        assert_eq!(model.method, InversionMethod::LeastSquares);
        assert_eq!(outcome.records.len(), 6);
    }

    #[test]
    fn test_non_positive_trend_rejected() {
        let series = PriceSeries::new(
            (1..=4)
                .map(|m| PricePoint {
                    month: ym(2021, m),
                    price: 35.0 - 10.0 * m as f64,
                    count: 1,
                })
                .collect(),
        );
        let records = vec![
            TransactionRecord::new("A", ym(2021, 1), 30.0),
            TransactionRecord::new("A", ym(2021, 4), 1.0),
        ];
        let outcome = PriceAdjuster::new()
            .with_order(2)
            .with_source(PrecomputedSeries::grouped(BTreeMap::from([(
                GroupKey::location("A"),
                series,
            )])))
            .adjust(&records)
            .unwrap();

        assert!(matches!(
            outcome.manifest.failure(&GroupKey::location("A")),
            Some(AdjustError::NonPositiveTrend { index: 4, .. })
        ));
    }

    #[test]
    fn test_batch_level_errors() {
        assert_eq!(PriceAdjuster::new().adjust(&[]).unwrap_err(), AdjustError::EmptyInput);

        let records = rising("A", ym(2021, 1));
        assert!(matches!(
            PriceAdjuster::new().with_order(0).adjust(&records),
            Err(AdjustError::InvalidParameter { .. })
        ));
    }

    #[test]
    fn test_invalid_price_fails_only_its_group() {
        let mut records = rising("A", ym(2021, 1));
        records.extend(rising("B", ym(2021, 1)));
        records.push(TransactionRecord::new("B", ym(2021, 3), f64::NAN));
        records.push(TransactionRecord::new("C", ym(2021, 2), -5.0));

        let outcome = PriceAdjuster::new().adjust(&records).unwrap();

        assert!(outcome.model(&GroupKey::location("A")).is_some());
        assert_eq!(outcome.records.len(), 6);
        assert!(outcome.records.iter().all(|r| r.record.location == "A"));
        assert!(matches!(
            outcome.manifest.failure(&GroupKey::location("B")),
            Some(AdjustError::InvalidPrice { record: 12, price, .. }) if price.is_nan()
        ));
        assert_eq!(
            outcome.manifest.failure(&GroupKey::location("C")),
            Some(&AdjustError::InvalidPrice {
                location: "C".to_string(),
                record: 13,
                price: -5.0,
            })
        );
        assert_eq!(outcome.manifest.skipped_records, (6..14).collect::<Vec<_>>());
    }

    #[test]
    fn test_zero_price_adjusts_to_zero() {
        let mut records = rising("A", ym(2021, 1));
        // month median stays at 100
        records.push(TransactionRecord::new("A", ym(2021, 1), 0.0));
        records.push(TransactionRecord::new("A", ym(2021, 1), 100.0));

        let outcome = PriceAdjuster::new().adjust(&records).unwrap();
        assert!(outcome.is_complete());

        let zero = &outcome.records[6];
        assert_eq!(zero.source_index, 6);
        assert!(zero.factor > 1.0);
        assert_eq!(zero.adjusted_price, 0);
        assert_eq!(outcome.records[0].factor, zero.factor);
    }

    #[test]
    fn test_invalid_price_in_ungrouped_series() {
        let mut records = rising("A", ym(2021, 1));
        records.push(TransactionRecord::new("B", ym(2021, 2), f64::INFINITY));

        let outcome = PriceAdjuster::new()
            .with_source(GroupedMedian::ungrouped())
            .adjust(&records)
            .unwrap();
        assert!(outcome.records.is_empty());
        assert!(matches!(
            outcome.manifest.failure(&GroupKey::All),
            Some(AdjustError::InvalidPrice { record: 6, .. })
        ));
    }

    #[test]
    fn test_parallel_matches_sequential() {
        let mut records = Vec::new();
        for (i, location) in ["A", "B", "C", "D"].iter().enumerate() {
            records.extend(rising(location, ym(2021, 1)).into_iter().map(|mut r| {
                r.price *= 1.0 + i as f64;
                r
            }));
        }

        let sequential = PriceAdjuster::new().adjust(&records).unwrap();
        let parallel = PriceAdjuster::new().with_parallel(true).adjust(&records).unwrap();
        assert_eq!(sequential.models, parallel.models);
        assert_eq!(sequential.records, parallel.records);
    }

    #[test]
    fn test_mean_statistic_source() {
        let mut records = rising("A", ym(2021, 1));
        records.push(TransactionRecord::new("A", ym(2021, 1), 160.0));
        records.push(TransactionRecord::new("A", ym(2021, 1), 40.0));

        let outcome = PriceAdjuster::new()
            .with_source(GroupedMedian::by_location().with_statistic(AggregateStatistic::Mean))
            .adjust(&records)
            .unwrap();
        let model = outcome.model(&GroupKey::location("A")).unwrap();
        assert_eq!(model.series.points()[0].price, 100.0);
        assert_eq!(model.series.points()[0].count, 3);
    }

    #[test]
    fn test_debug_and_accessors() {
        let adjuster = PriceAdjuster::new().with_method(InversionMethod::L1Norm).with_order(3);
        assert_eq!(adjuster.method(), InversionMethod::L1Norm);
        assert_eq!(adjuster.order(), 3);
        assert!(format!("{:?}", adjuster).contains("L1Norm"));
    }
}
