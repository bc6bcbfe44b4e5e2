//! Trait for the collaborator that supplies aggregated price series

use crate::error::Result;
use crate::model::{GroupKey, PriceSeries, TransactionRecord};
use std::collections::BTreeMap;

/// Supplies the per-group monthly price series the engine fits against.
pub trait MedianSource: Send + Sync {
    /// Aggregate `records` into one month-ordered series per group.
    fn series(&self, records: &[TransactionRecord]) -> Result<BTreeMap<GroupKey, PriceSeries>>;

    /// Group a record belongs to. Defaults to its location.
    fn group_key(&self, record: &TransactionRecord) -> GroupKey {
        GroupKey::Location(record.location.clone())
    }
}
