//! Reporting periods and calendar-month helpers
//!
//! A report period is a closed interval of UTC instants. It is written either
//! as a calendar month (`"2024-05"`) or as an explicit `"<start>/<end>"` pair
//! whose bounds are RFC3339 timestamps or bare `YYYY-MM-DD` dates.

use chrono::{DateTime, Datelike, Duration, Months, NaiveDate, NaiveTime, TimeZone, Timelike, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Errors from parsing a period expression
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PeriodParseError {
    #[error("period is required")]
    Empty,

    #[error("period must be in start/end or YYYY-MM format: {0}")]
    InvalidFormat(String),

    #[error("invalid period start: {0}")]
    InvalidStart(String),

    #[error("invalid period end: {0}")]
    InvalidEnd(String),

    #[error("period end before start")]
    EndBeforeStart,
}

/// A closed `[start, end]` reporting interval
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "PeriodBounds")]
pub struct ReportPeriod {
    start: DateTime<Utc>,
    end: DateTime<Utc>,
}

impl ReportPeriod {
    /// Create a period, rejecting an end that precedes the start
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Result<Self, PeriodParseError> {
        if end < start {
            return Err(PeriodParseError::EndBeforeStart);
        }
        Ok(Self { start, end })
    }

    /// The calendar month containing `instant`
    pub fn for_month(instant: DateTime<Utc>) -> Self {
        let (start, end) = month_bounds(instant);
        Self { start, end }
    }

    /// Parse a period expression
    pub fn parse(value: &str) -> Result<Self, PeriodParseError> {
        let value = value.trim();
        if value.is_empty() {
            return Err(PeriodParseError::Empty);
        }

        let Some((start_raw, end_raw)) = value.split_once('/') else {
            let start = parse_month(value)
                .ok_or_else(|| PeriodParseError::InvalidFormat(value.to_string()))?;
            return Ok(Self::for_month(start));
        };

        if end_raw.contains('/') {
            return Err(PeriodParseError::InvalidFormat(value.to_string()));
        }

        let start = parse_bound(start_raw, false)
            .ok_or_else(|| PeriodParseError::InvalidStart(start_raw.trim().to_string()))?;
        let end = parse_bound(end_raw, true)
            .ok_or_else(|| PeriodParseError::InvalidEnd(end_raw.trim().to_string()))?;

        Self::new(start, end)
    }

    /// First instant of the period
    pub fn start(&self) -> DateTime<Utc> {
        self.start
    }

    /// Last instant of the period (inclusive)
    pub fn end(&self) -> DateTime<Utc> {
        self.end
    }

    /// Check if an instant falls within the period, bounds included
    pub fn contains(&self, instant: DateTime<Utc>) -> bool {
        instant >= self.start && instant <= self.end
    }

    /// Number of calendar days shared with the month containing `month`
    ///
    /// Both ends count, so a period covering the 1st through the 15th
    /// overlaps its month by 15 days.
    pub fn overlap_days_with_month(&self, month: DateTime<Utc>) -> i64 {
        let start = self.start.date_naive();
        let end = self.end.date_naive();

        let month_first = month_start(month).date_naive();
        let month_last =
            month_first + Duration::days(i64::from(days_in_month(month.year(), month.month())) - 1);

        if end < month_first || month_last < start {
            return 0;
        }

        let overlap_start = start.max(month_first);
        let overlap_end = end.min(month_last);
        (overlap_end - overlap_start).num_days() + 1
    }
}

/// Unchecked wire form of [`ReportPeriod`]
#[derive(Deserialize)]
struct PeriodBounds {
    start: DateTime<Utc>,
    end: DateTime<Utc>,
}

impl TryFrom<PeriodBounds> for ReportPeriod {
    type Error = PeriodParseError;

    fn try_from(bounds: PeriodBounds) -> Result<Self, Self::Error> {
        Self::new(bounds.start, bounds.end)
    }
}

impl fmt::Display for ReportPeriod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.start.to_rfc3339(), self.end.to_rfc3339())
    }
}

/// Number of days in a calendar month, 0 for an invalid month
pub fn days_in_month(year: i32, month: u32) -> u32 {
    let Some(first) = NaiveDate::from_ymd_opt(year, month, 1) else {
        return 0;
    };
    first
        .checked_add_months(Months::new(1))
        .and_then(|next| u32::try_from((next - first).num_days()).ok())
        .unwrap_or(0)
}

/// Midnight UTC on the first day of the month containing `instant`
pub fn month_start(instant: DateTime<Utc>) -> DateTime<Utc> {
    let date = instant.date_naive();
    let first = date - Duration::days(i64::from(date.day0()));
    Utc.from_utc_datetime(&first.and_time(NaiveTime::MIN))
}

/// `[first instant, last instant]` of the month containing `instant`
pub fn month_bounds(instant: DateTime<Utc>) -> (DateTime<Utc>, DateTime<Utc>) {
    let start = month_start(instant);
    let next = start + Duration::days(i64::from(days_in_month(start.year(), start.month())));
    (start, next - Duration::nanoseconds(1))
}

/// True when `instant` is exactly midnight UTC on day 1
pub fn is_month_start(instant: DateTime<Utc>) -> bool {
    instant.day() == 1
        && instant.hour() == 0
        && instant.minute() == 0
        && instant.second() == 0
        && instant.nanosecond() == 0
}

/// Parse an RFC3339 timestamp into UTC
pub fn parse_rfc3339(value: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value.trim())
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

/// Parse strict `YYYY-MM` into the first instant of that month
fn parse_month(value: &str) -> Option<DateTime<Utc>> {
    let bytes = value.as_bytes();
    let well_formed = bytes.len() == 7
        && bytes[4] == b'-'
        && bytes
            .iter()
            .enumerate()
            .all(|(i, b)| i == 4 || b.is_ascii_digit());
    if !well_formed {
        return None;
    }

    let date = NaiveDate::parse_from_str(&format!("{}-01", value), "%Y-%m-%d").ok()?;
    Some(Utc.from_utc_datetime(&date.and_time(NaiveTime::MIN)))
}

/// Parse one bound of a `start/end` period
///
/// A bare date used as the end bound covers that whole day.
fn parse_bound(value: &str, is_end: bool) -> Option<DateTime<Utc>> {
    let value = value.trim();
    if value.is_empty() {
        return None;
    }

    if let Some(instant) = parse_rfc3339(value) {
        return Some(instant);
    }

    let date = NaiveDate::parse_from_str(value, "%Y-%m-%d").ok()?;
    let midnight = Utc.from_utc_datetime(&date.and_time(NaiveTime::MIN));
    if is_end {
        Some(midnight + Duration::days(1) - Duration::nanoseconds(1))
    } else {
        Some(midnight)
    }
}
