//! Result of an adjustment batch

use super::{AdjustedRecord, FittedModel, GroupKey, YearMonth};
use crate::error::{AdjustError, Result};
use std::collections::BTreeMap;

/// Per-group failures collected during a batch.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ErrorManifest {
    /// Failure for each group that could not be adjusted
    pub failures: BTreeMap<GroupKey, AdjustError>,
    /// Input positions of records left unadjusted because their group failed
    pub skipped_records: Vec<usize>,
}

impl ErrorManifest {
    pub fn is_empty(&self) -> bool {
        self.failures.is_empty()
    }

    /// Number of failed groups.
    pub fn len(&self) -> usize {
        self.failures.len()
    }

    pub fn failure(&self, key: &GroupKey) -> Option<&AdjustError> {
        self.failures.get(key)
    }
}

/// Adjusted records plus the per-group models that produced them.
#[derive(Debug, Clone)]
pub struct AdjustmentOutcome {
    /// Adjusted records, in input order, excluding skipped ones
    pub records: Vec<AdjustedRecord>,
    /// Trend model for every successfully fitted group
    pub models: BTreeMap<GroupKey, FittedModel>,
    /// Month the time index is anchored to
    pub start_month: YearMonth,
    /// Reference month every price is rescaled toward
    pub target_month: YearMonth,
    /// Time index of `target_month`
    pub target_index: i32,
    /// Groups that failed and the records they left unadjusted
    pub manifest: ErrorManifest,
}

impl AdjustmentOutcome {
    pub fn model(&self, key: &GroupKey) -> Option<&FittedModel> {
        self.models.get(key)
    }

    /// True when every group was fitted and every record adjusted.
    pub fn is_complete(&self) -> bool {
        self.manifest.is_empty()
    }

    /// Turn the first recorded group failure (in key order) into an error.
    pub fn ensure_complete(self) -> Result<Self> {
        match self.manifest.failures.values().next() {
            Some(error) => Err(error.clone()),
            None => Ok(self),
        }
    }
}
