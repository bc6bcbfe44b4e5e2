//! Calendar month type

use crate::error::{AdjustError, Result};
use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A calendar month with no day component.
///
/// Ordering is chronological. Serialized as a `"YYYY-MM"` string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct YearMonth {
    year: i32,
    month: u32,
}

impl YearMonth {
    /// Create a month. `month` must be in `1..=12` and `year` within
    /// chrono's date range, which keeps month arithmetic inside `i32`.
    pub fn new(year: i32, month: u32) -> Result<Self> {
        if !(NaiveDate::MIN.year()..=NaiveDate::MAX.year()).contains(&year) {
            return Err(AdjustError::InvalidParameter {
                name: "year".to_string(),
                reason: format!(
                    "{} is outside {}..={}",
                    year,
                    NaiveDate::MIN.year(),
                    NaiveDate::MAX.year()
                ),
            });
        }
        if !(1..=12).contains(&month) {
            return Err(AdjustError::InvalidParameter {
                name: "month".to_string(),
                reason: format!("{} is not in 1..=12", month),
            });
        }
        Ok(Self { year, month })
    }

    /// Floor a date to its month.
    pub fn from_date(date: NaiveDate) -> Self {
        Self {
            year: date.year(),
            month: date.month(),
        }
    }

    /// Parse `"YYYY-MM"` or `"YYYY-MM-DD"` (the day is discarded).
    pub fn parse(s: &str) -> Result<Self> {
        let s = s.trim();
        NaiveDate::parse_from_str(s, "%Y-%m-%d")
            .or_else(|_| NaiveDate::parse_from_str(&format!("{}-01", s), "%Y-%m-%d"))
            .map(Self::from_date)
            .map_err(|e| AdjustError::InvalidParameter {
                name: "month".to_string(),
                reason: format!("cannot parse '{}': {}", s, e),
            })
    }

    pub fn year(&self) -> i32 {
        self.year
    }

    pub fn month(&self) -> u32 {
        self.month
    }

    /// First day of the month, `None` outside chrono's date range.
    pub fn first_day(&self) -> Option<NaiveDate> {
        NaiveDate::from_ymd_opt(self.year, self.month, 1)
    }

    /// Shift by a signed number of months.
    pub fn add_months(self, months: i32) -> Self {
        let total = self.year * 12 + (self.month as i32 - 1) + months;
        Self {
            year: total.div_euclid(12),
            month: total.rem_euclid(12) as u32 + 1,
        }
    }

    /// Whole months elapsed from `earlier` to `self` (negative if `self` is earlier).
    pub fn months_since(&self, earlier: YearMonth) -> i32 {
        (self.year - earlier.year) * 12 + (self.month as i32 - earlier.month as i32)
    }
}

impl fmt::Display for YearMonth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

impl FromStr for YearMonth {
    type Err = AdjustError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl TryFrom<String> for YearMonth {
    type Error = AdjustError;

    fn try_from(value: String) -> Result<Self> {
        Self::parse(&value)
    }
}

impl From<YearMonth> for String {
    fn from(value: YearMonth) -> Self {
        value.to_string()
    }
}

impl From<NaiveDate> for YearMonth {
    fn from(date: NaiveDate) -> Self {
        Self::from_date(date)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_rejects_year_outside_date_range() {
        assert!(YearMonth::new(i32::MAX, 1).is_err());
        assert!(YearMonth::new(i32::MIN, 12).is_err());
        assert!(matches!(
            YearMonth::new(NaiveDate::MAX.year() + 1, 1),
            Err(AdjustError::InvalidParameter { ref name, .. }) if name == "year"
        ));

        let last = YearMonth::new(NaiveDate::MAX.year(), 12).unwrap();
        let first = YearMonth::new(NaiveDate::MIN.year(), 1).unwrap();
        assert!(last.months_since(first) > 0);
        assert_eq!(last.add_months(-1).month(), 11);
    }

    #[test]
    fn test_new_rejects_month_out_of_range() {
        assert!(YearMonth::new(2021, 0).is_err());
        assert!(YearMonth::new(2021, 13).is_err());
        assert!(YearMonth::new(2021, 12).is_ok());
    }

    #[test]
    fn test_parse_formats() {
        let ym = YearMonth::parse("2021-03").unwrap();
        assert_eq!((ym.year(), ym.month()), (2021, 3));

        let ym = YearMonth::parse("2017-11-23").unwrap();
        assert_eq!((ym.year(), ym.month()), (2017, 11));

        assert!(YearMonth::parse("2021-13").is_err());
        assert!(YearMonth::parse("march").is_err());
    }

    #[test]
    fn test_add_months_crosses_years() {
        let ym = YearMonth::new(2021, 11).unwrap();
        assert_eq!(ym.add_months(2), YearMonth::new(2022, 1).unwrap());
        assert_eq!(ym.add_months(-11), YearMonth::new(2020, 12).unwrap());
        assert_eq!(ym.add_months(0), ym);
    }

    #[test]
    fn test_months_since() {
        let a = YearMonth::new(2015, 1).unwrap();
        let b = YearMonth::new(2017, 4).unwrap();
        assert_eq!(b.months_since(a), 27);
        assert_eq!(a.months_since(b), -27);
    }

    #[test]
    fn test_ordering_is_chronological() {
        let a = YearMonth::new(2019, 12).unwrap();
        let b = YearMonth::new(2020, 1).unwrap();
        assert!(a < b);
    }

    #[test]
    fn test_display_and_serde() {
        let ym = YearMonth::new(2021, 3).unwrap();
        assert_eq!(ym.to_string(), "2021-03");

        let json = serde_json::to_string(&ym).unwrap();
        assert_eq!(json, "\"2021-03\"");
        let back: YearMonth = serde_json::from_str(&json).unwrap();
        assert_eq!(back, ym);
        assert!(serde_json::from_str::<YearMonth>("\"2021-00\"").is_err());
    }

    #[test]
    fn test_from_date_floors_to_month() {
        let date = NaiveDate::from_ymd_opt(2020, 2, 29).unwrap();
        let ym = YearMonth::from(date);
        assert_eq!(ym.first_day(), NaiveDate::from_ymd_opt(2020, 2, 1));
    }
}
