//! Monthly price aggregation
//!
//! Reduces transaction records to per-group, per-month price series. Three
//! [`MedianSource`] implementations are provided:
//!
//! - [`GroupedMedian`] buckets by month, and by location when grouped.
//! - [`KRingMedian`] pools every cell in a k-ring around each cell before
//!   taking the median, for spatial cells too sparse to stand alone.
//! - [`PrecomputedSeries`] hands back series the caller already built.

use adjust_spi::{
    GroupKey, MedianSource, NeighborhoodIndex, PricePoint, PriceSeries, Result,
    TransactionRecord, YearMonth,
};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet, VecDeque};

/// Statistic used to reduce a month's prices to one value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AggregateStatistic {
    #[default]
    Median,
    Mean,
}

impl AggregateStatistic {
    /// Reduce `values`, `None` when empty. Reorders `values`.
    pub fn reduce(&self, values: &mut [f64]) -> Option<f64> {
        match self {
            AggregateStatistic::Median => median(values),
            AggregateStatistic::Mean => mean(values),
        }
    }
}

/// Median; the mean of the two middle values for even lengths.
pub fn median(values: &mut [f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    values.sort_by(f64::total_cmp);
    let mid = values.len() / 2;
    if values.len() % 2 == 0 {
        Some((values[mid - 1] + values[mid]) / 2.0)
    } else {
        Some(values[mid])
    }
}

pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

/// Reduce records to one point per month.
pub fn monthly_series<'a, I>(records: I, statistic: AggregateStatistic) -> PriceSeries
where
    I: IntoIterator<Item = &'a TransactionRecord>,
{
    let mut buckets: BTreeMap<YearMonth, Vec<f64>> = BTreeMap::new();
    for record in records {
        buckets.entry(record.month).or_default().push(record.price);
    }
    buckets
        .into_iter()
        .filter_map(|(month, mut prices)| {
            let count = prices.len();
            statistic
                .reduce(&mut prices)
                .map(|price| PricePoint { month, price, count })
        })
        .collect()
}

/// Per-group monthly series; a single [`GroupKey::All`] series when ungrouped.
pub fn grouped_series(
    records: &[TransactionRecord],
    grouped: bool,
    statistic: AggregateStatistic,
) -> BTreeMap<GroupKey, PriceSeries> {
    if !grouped {
        if records.is_empty() {
            return BTreeMap::new();
        }
        return BTreeMap::from([(GroupKey::All, monthly_series(records, statistic))]);
    }

    let mut by_location: BTreeMap<&str, Vec<&TransactionRecord>> = BTreeMap::new();
    for record in records {
        by_location
            .entry(record.location.as_str())
            .or_default()
            .push(record);
    }
    by_location
        .into_iter()
        .map(|(location, group)| {
            (
                GroupKey::location(location),
                monthly_series(group, statistic),
            )
        })
        .collect()
}

/// Monthly median price, per location when `grouped`.
pub fn median_series(records: &[TransactionRecord], grouped: bool) -> BTreeMap<GroupKey, PriceSeries> {
    grouped_series(records, grouped, AggregateStatistic::Median)
}

/// Monthly mean price, per location when `grouped`.
pub fn mean_series(records: &[TransactionRecord], grouped: bool) -> BTreeMap<GroupKey, PriceSeries> {
    grouped_series(records, grouped, AggregateStatistic::Mean)
}

/// Categorical grouping by record location, or a single whole-dataset series.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GroupedMedian {
    pub grouped: bool,
    pub statistic: AggregateStatistic,
}

impl Default for GroupedMedian {
    fn default() -> Self {
        Self::by_location()
    }
}

impl GroupedMedian {
    pub fn by_location() -> Self {
        Self {
            grouped: true,
            statistic: AggregateStatistic::Median,
        }
    }

    pub fn ungrouped() -> Self {
        Self {
            grouped: false,
            statistic: AggregateStatistic::Median,
        }
    }

    pub fn with_statistic(mut self, statistic: AggregateStatistic) -> Self {
        self.statistic = statistic;
        self
    }
}

impl MedianSource for GroupedMedian {
    fn series(&self, records: &[TransactionRecord]) -> Result<BTreeMap<GroupKey, PriceSeries>> {
        Ok(grouped_series(records, self.grouped, self.statistic))
    }

    fn group_key(&self, record: &TransactionRecord) -> GroupKey {
        if self.grouped {
            GroupKey::Location(record.location.clone())
        } else {
            GroupKey::All
        }
    }
}

/// Spatially smoothed aggregation over k-ring neighbourhoods.
///
/// Record locations are treated as cell ids. Each cell's series pools all
/// records whose cell lies within `radius` of it; overlapping neighbourhoods
/// are computed independently.
#[derive(Debug, Clone)]
pub struct KRingMedian<I> {
    index: I,
    radius: u32,
    statistic: AggregateStatistic,
}

impl<I: NeighborhoodIndex> KRingMedian<I> {
    pub fn new(index: I, radius: u32) -> Self {
        Self {
            index,
            radius,
            statistic: AggregateStatistic::Median,
        }
    }

    pub fn with_statistic(mut self, statistic: AggregateStatistic) -> Self {
        self.statistic = statistic;
        self
    }

    pub fn radius(&self) -> u32 {
        self.radius
    }
}

impl<I: NeighborhoodIndex> MedianSource for KRingMedian<I> {
    fn series(&self, records: &[TransactionRecord]) -> Result<BTreeMap<GroupKey, PriceSeries>> {
        let cells: BTreeSet<&str> = records.iter().map(|r| r.location.as_str()).collect();

        Ok(cells
            .into_iter()
            .map(|cell| {
                let ring: HashSet<String> = self.index.k_ring(cell, self.radius).into_iter().collect();
                let pooled = records.iter().filter(|r| ring.contains(&r.location));
                (GroupKey::location(cell), monthly_series(pooled, self.statistic))
            })
            .collect())
    }
}

/// Caller-supplied series, used as-is.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PrecomputedSeries {
    series: BTreeMap<GroupKey, PriceSeries>,
    grouped: bool,
}

impl PrecomputedSeries {
    /// Series keyed by location; records map to their own location.
    pub fn grouped(series: BTreeMap<GroupKey, PriceSeries>) -> Self {
        Self {
            series,
            grouped: true,
        }
    }

    /// A single series every record maps to.
    pub fn ungrouped(series: PriceSeries) -> Self {
        Self {
            series: BTreeMap::from([(GroupKey::All, series)]),
            grouped: false,
        }
    }
}

impl MedianSource for PrecomputedSeries {
    fn series(&self, _records: &[TransactionRecord]) -> Result<BTreeMap<GroupKey, PriceSeries>> {
        Ok(self.series.clone())
    }

    fn group_key(&self, record: &TransactionRecord) -> GroupKey {
        if self.grouped {
            GroupKey::Location(record.location.clone())
        } else {
            GroupKey::All
        }
    }
}

/// Neighbourhood index over an explicit cell adjacency graph.
///
/// Plug in adjacency exported from any spatial indexing system; the k-ring is
/// the set of cells within `k` hops.
#[derive(Debug, Clone, Default)]
pub struct GraphNeighborhood {
    adjacency: HashMap<String, BTreeSet<String>>,
}

impl GraphNeighborhood {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an undirected edge between two cells.
    pub fn with_edge(mut self, a: impl Into<String>, b: impl Into<String>) -> Self {
        self.add_edge(a, b);
        self
    }

    pub fn add_edge(&mut self, a: impl Into<String>, b: impl Into<String>) {
        let (a, b) = (a.into(), b.into());
        self.adjacency.entry(a.clone()).or_default().insert(b.clone());
        self.adjacency.entry(b).or_default().insert(a);
    }
}

impl<A: Into<String>, B: Into<String>> FromIterator<(A, B)> for GraphNeighborhood {
    fn from_iter<T: IntoIterator<Item = (A, B)>>(iter: T) -> Self {
        let mut graph = Self::new();
        for (a, b) in iter {
            graph.add_edge(a, b);
        }
        graph
    }
}

impl NeighborhoodIndex for GraphNeighborhood {
    fn k_ring(&self, cell: &str, k: u32) -> Vec<String> {
        let mut seen: BTreeSet<String> = BTreeSet::from([cell.to_string()]);
        let mut queue: VecDeque<(&str, u32)> = VecDeque::from([(cell, 0)]);

        while let Some((current, depth)) = queue.pop_front() {
            if depth == k {
                continue;
            }
            let Some(neighbors) = self.adjacency.get(current) else {
                continue;
            };
            for next in neighbors {
                if seen.insert(next.clone()) {
                    queue.push_back((next.as_str(), depth + 1));
                }
            }
        }

        seen.into_iter().collect()
    }
}
