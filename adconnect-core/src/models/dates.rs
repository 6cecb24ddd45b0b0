//! Inclusive date ranges and calendar helpers.

use std::fmt;

use chrono::{Datelike, Months, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// Inclusive range of report days, `[start, end]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DateRange {
    start: NaiveDate,
    end: NaiveDate,
}

impl DateRange {
    /// Creates a range, rejecting `start > end`.
    pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self, CoreError> {
        if start > end {
            return Err(CoreError::InvalidDateRange(format!(
                "start {start} is after end {end}"
            )));
        }
        Ok(Self { start, end })
    }

    /// A range covering exactly one day.
    pub fn single(day: NaiveDate) -> Self {
        Self { start: day, end: day }
    }

    /// Parses a range from two `YYYY-MM-DD` strings.
    pub fn parse(start: &str, end: &str) -> Result<Self, CoreError> {
        Self::new(parse_date(start)?, parse_date(end)?)
    }

    /// First day of the range.
    pub fn start(&self) -> NaiveDate {
        self.start
    }

    /// Last day of the range.
    pub fn end(&self) -> NaiveDate {
        self.end
    }

    /// Returns true if the day falls inside the range.
    pub fn contains(&self, day: NaiveDate) -> bool {
        self.start <= day && day <= self.end
    }

    /// Number of days in the range (at least 1).
    pub fn num_days(&self) -> i64 {
        (self.end - self.start).num_days() + 1
    }

    /// Iterates every day of the range in order.
    pub fn days(&self) -> impl Iterator<Item = NaiveDate> + use<> {
        let end = self.end;
        self.start.iter_days().take_while(move |d| *d <= end)
    }

    /// Splits the range into calendar months, clipping the first and last.
    pub fn months(&self) -> Vec<DateRange> {
        let mut out = Vec::new();
        let mut cursor = self.start;
        loop {
            let month_end = last_day_of_month(cursor.year(), cursor.month()).unwrap_or(self.end);
            let sub_end = month_end.min(self.end);
            out.push(Self {
                start: cursor,
                end: sub_end,
            });
            match sub_end.succ_opt() {
                Some(next) if next <= self.end => cursor = next,
                _ => break,
            }
        }
        out
    }

    /// Renders `"YYYY-MM-DD YYYY-MM-DD"`, the timeframe format used by
    /// Google Trends.
    pub fn timeframe(&self) -> String {
        format!("{} {}", self.start.format("%Y-%m-%d"), self.end.format("%Y-%m-%d"))
    }
}

impl fmt::Display for DateRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}..{}", self.start, self.end)
    }
}

/// Returns the last day of the given month.
pub fn last_day_of_month(year: i32, month: u32) -> Option<NaiveDate> {
    NaiveDate::from_ymd_opt(year, month, 1)?
        .checked_add_months(Months::new(1))?
        .pred_opt()
}

fn parse_date(s: &str) -> Result<NaiveDate, CoreError> {
    NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d")
        .map_err(|e| CoreError::InvalidDateRange(format!("{s}: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    #[test]
    fn test_rejects_reversed_range() {
        assert!(DateRange::new(d("2022-02-01"), d("2022-01-01")).is_err());
        assert!(DateRange::parse("2022-01-01", "not-a-date").is_err());
    }

    #[test]
    fn test_days_inclusive() {
        let range = DateRange::parse("2022-02-27", "2022-03-02").unwrap();
        let days: Vec<_> = range.days().collect();
        assert_eq!(days.len(), 4);
        assert_eq!(range.num_days(), 4);
        assert_eq!(days[0], d("2022-02-27"));
        assert_eq!(days[3], d("2022-03-02"));
    }

    #[test]
    fn test_months_clip_edges() {
        let range = DateRange::parse("2022-01-15", "2022-03-10").unwrap();
        let months = range.months();
        assert_eq!(months.len(), 3);
        assert_eq!(months[0], DateRange::parse("2022-01-15", "2022-01-31").unwrap());
        assert_eq!(months[1], DateRange::parse("2022-02-01", "2022-02-28").unwrap());
        assert_eq!(months[2], DateRange::parse("2022-03-01", "2022-03-10").unwrap());
    }

    #[test]
    fn test_months_single_day() {
        let range = DateRange::single(d("2022-12-31"));
        assert_eq!(range.months(), vec![range]);
    }

    #[test]
    fn test_last_day_of_month() {
        assert_eq!(last_day_of_month(2024, 2), Some(d("2024-02-29")));
        assert_eq!(last_day_of_month(2023, 12), Some(d("2023-12-31")));
        assert_eq!(last_day_of_month(2023, 13), None);
    }

    #[test]
    fn test_timeframe() {
        let range = DateRange::parse("2021-01-01", "2021-01-31").unwrap();
        assert_eq!(range.timeframe(), "2021-01-01 2021-01-31");
    }
}
