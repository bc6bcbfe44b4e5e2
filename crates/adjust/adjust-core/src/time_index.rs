//! Time index mapping
//!
//! Converts calendar months to an integer regression feature. The index is
//! anchored at January of the start month's year:
//!
//! ```text
//! index = (month.year - start.year) * 12 + month.month
//! ```
//!
//! so January of the start year is index 1, and `index_to_month` is the exact
//! inverse of `to_index`.

use adjust_spi::YearMonth;

/// Months-since-epoch index of `month` relative to `start_month`.
pub fn to_index(month: YearMonth, start_month: YearMonth) -> i32 {
    (month.year() - start_month.year()) * 12 + month.month() as i32
}

/// Inverse of [`to_index`].
pub fn index_to_month(index: i32, start_month: YearMonth) -> YearMonth {
    let epoch = start_month.add_months(1 - start_month.month() as i32);
    epoch.add_months(index - 1)
}
