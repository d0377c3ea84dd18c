use chrono::{DateTime, Days, NaiveDate, Utc};
use serde::Serialize;

use stockroom_core::{DomainError, DomainResult};

const DATE_FORMAT: &str = "%Y-%m-%d";

/// Longest allowed distance between `start` and `end`.
pub const MAX_SPAN_DAYS: i64 = 365;

/// Inclusive calendar-day range `[start, end]` (UTC).
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize)]
pub struct ReportRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl ReportRange {
    pub fn new(start: NaiveDate, end: NaiveDate) -> DomainResult<Self> {
        if start > end {
            return Err(DomainError::invalid(format!(
                "start_date {start} is after end_date {end}"
            )));
        }
        if (end - start).num_days() > MAX_SPAN_DAYS {
            return Err(DomainError::invalid(format!(
                "date range cannot exceed {MAX_SPAN_DAYS} days"
            )));
        }
        Ok(Self { start, end })
    }

    /// Parse two `YYYY-MM-DD` strings.
    pub fn parse(start: &str, end: &str) -> DomainResult<Self> {
        Self::new(parse_date("start_date", start)?, parse_date("end_date", end)?)
    }

    /// Timestamp bounds as `[from, until)`: `until` is midnight after `end`,
    /// so the whole end day counts.
    pub fn bounds(&self) -> (DateTime<Utc>, DateTime<Utc>) {
        let from = self.start.and_time(chrono::NaiveTime::MIN).and_utc();
        let until = self
            .end
            .checked_add_days(Days::new(1))
            .unwrap_or(NaiveDate::MAX)
            .and_time(chrono::NaiveTime::MIN)
            .and_utc();
        (from, until)
    }

    pub fn contains(&self, at: DateTime<Utc>) -> bool {
        let (from, until) = self.bounds();
        at >= from && at < until
    }
}

fn parse_date(field: &str, value: &str) -> DomainResult<NaiveDate> {
    NaiveDate::parse_from_str(value.trim(), DATE_FORMAT).map_err(|_| {
        DomainError::invalid(format!("{field} must be YYYY-MM-DD, got '{value}'"))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use chrono::TimeZone;

    #[test]
    fn start_after_end_is_invalid() {
        assert_matches!(
            ReportRange::parse("2024-02-01", "2024-01-31"),
            Err(DomainError::InvalidRequest(_))
        );
    }

    #[test]
    fn ranges_longer_than_a_year_are_invalid() {
        assert!(ReportRange::parse("2024-01-01", "2024-12-31").is_ok());
        assert!(ReportRange::parse("2023-01-01", "2024-01-01").is_ok());
        assert_matches!(
            ReportRange::parse("2024-01-01", "2025-01-01"),
            Err(DomainError::InvalidRequest(msg)) if msg.contains("365")
        );
    }

    #[test]
    fn bad_format_is_invalid() {
        assert!(ReportRange::parse("01/01/2024", "2024-01-31").is_err());
        assert!(ReportRange::parse("2024-01-01", "2024-13-01").is_err());
    }

    #[test]
    fn single_day_covers_the_whole_day() {
        let r = ReportRange::parse("2024-01-31", "2024-01-31").unwrap();
        assert!(r.contains(Utc.with_ymd_and_hms(2024, 1, 31, 0, 0, 0).unwrap()));
        assert!(r.contains(Utc.with_ymd_and_hms(2024, 1, 31, 23, 59, 59).unwrap()));
        assert!(!r.contains(Utc.with_ymd_and_hms(2024, 2, 1, 0, 0, 0).unwrap()));
        assert!(!r.contains(Utc.with_ymd_and_hms(2024, 1, 30, 23, 59, 59).unwrap()));
    }
}
