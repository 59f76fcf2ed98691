//! Common types used across the API

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Inclusive date range for report queries
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct DateRange {
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
}

impl DateRange {
    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start.map_or(true, |start| date >= start) && self.end.map_or(true, |end| date <= end)
    }

    pub fn is_valid(&self) -> bool {
        match (self.start, self.end) {
            (Some(start), Some(end)) => start <= end,
            _ => true,
        }
    }
}

/// Clamp a requested history size to `1..=max`, using `default` when absent
pub fn clamp_history_limit(requested: Option<i64>, default: i64, max: i64) -> i64 {
    requested.unwrap_or(default).clamp(1, max.max(1))
}

/// Export format of report endpoints
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum ReportFormat {
    #[default]
    Json,
    Csv,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clamp_history_limit() {
        assert_eq!(clamp_history_limit(None, 50, 500), 50);
        assert_eq!(clamp_history_limit(Some(0), 50, 500), 1);
        assert_eq!(clamp_history_limit(Some(-5), 50, 500), 1);
        assert_eq!(clamp_history_limit(Some(10_000), 50, 500), 500);
    }

    #[test]
    fn test_date_range() {
        let d = |day| NaiveDate::from_ymd_opt(2025, 3, day).unwrap();
        let range = DateRange { start: Some(d(1)), end: Some(d(10)) };
        assert!(range.contains(d(1)));
        assert!(range.contains(d(10)));
        assert!(!range.contains(d(11)));
        assert!(range.is_valid());

        let open = DateRange { start: None, end: None };
        assert!(open.contains(d(20)));
        assert!(!DateRange { start: Some(d(5)), end: Some(d(2)) }.is_valid());
    }
}
