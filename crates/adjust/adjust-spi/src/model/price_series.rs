//! Aggregated price series and grouping keys

use super::YearMonth;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Key a price series and its trend model belong to.
///
/// `All` sorts before every location so ungrouped and grouped runs share a
/// deterministic iteration order.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum GroupKey {
    /// Whole dataset as a single series
    All,
    /// A location value (region name or spatial cell id)
    Location(String),
}

impl GroupKey {
    pub fn location(name: impl Into<String>) -> Self {
        GroupKey::Location(name.into())
    }
}

impl fmt::Display for GroupKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GroupKey::All => write!(f, "<all>"),
            GroupKey::Location(name) => write!(f, "{}", name),
        }
    }
}

/// One bucket of an aggregated series.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PricePoint {
    pub month: YearMonth,
    /// Median (or mean) raw price of the bucket
    pub price: f64,
    /// Number of records in the bucket
    pub count: usize,
}

/// Month-ordered price series for one group.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PriceSeries {
    points: Vec<PricePoint>,
}

impl PriceSeries {
    /// Build a series, sorting the points by month.
    pub fn new(mut points: Vec<PricePoint>) -> Self {
        points.sort_by_key(|p| p.month);
        Self { points }
    }

    pub fn points(&self) -> &[PricePoint] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn months(&self) -> impl Iterator<Item = YearMonth> + '_ {
        self.points.iter().map(|p| p.month)
    }

    pub fn prices(&self) -> Vec<f64> {
        self.points.iter().map(|p| p.price).collect()
    }

    /// Total records aggregated into the series.
    pub fn total_count(&self) -> usize {
        self.points.iter().map(|p| p.count).sum()
    }
}

impl FromIterator<PricePoint> for PriceSeries {
    fn from_iter<T: IntoIterator<Item = PricePoint>>(iter: T) -> Self {
        Self::new(iter.into_iter().collect())
    }
}
