//! Transaction record types

use super::YearMonth;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One historical sale.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransactionRecord {
    /// Location key (administrative region or spatial cell id)
    pub location: String,
    /// Month of the sale
    pub month: YearMonth,
    /// Raw sale price
    pub price: f64,
    /// Attributes carried through untouched
    #[serde(default)]
    pub attributes: BTreeMap<String, String>,
}

impl TransactionRecord {
    /// Create a record with no passthrough attributes.
    pub fn new(location: impl Into<String>, month: YearMonth, price: f64) -> Self {
        Self {
            location: location.into(),
            month,
            price,
            attributes: BTreeMap::new(),
        }
    }

    /// Attach a passthrough attribute.
    pub fn with_attribute(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.insert(key.into(), value.into());
        self
    }
}

/// A transaction record with its temporal adjustment applied.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdjustedRecord {
    /// The source record
    pub record: TransactionRecord,
    /// Position of the source record in the engine input
    pub source_index: usize,
    /// Time index of the record's own month
    pub time_index: i32,
    /// Time index of the reference month prices are rescaled toward
    pub target_index: i32,
    /// Multiplicative adjustment factor
    pub factor: f64,
    /// `trunc(price * factor)`
    pub adjusted_price: i64,
}

impl AdjustedRecord {
    /// Apply `factor` to `record`, truncating the adjusted price toward zero.
    pub fn new(
        record: TransactionRecord,
        source_index: usize,
        time_index: i32,
        target_index: i32,
        factor: f64,
    ) -> Self {
        let adjusted_price = (record.price * factor).trunc() as i64;
        Self {
            record,
            source_index,
            time_index,
            target_index,
            factor,
            adjusted_price,
        }
    }
}
