//! Date windows for statistics
//!
//! A range always ends today (UTC) and is inclusive on both ends, so a week
//! covers today plus the six previous days.

use chrono::{DateTime, Duration, NaiveDate, NaiveTime, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;

use crate::domain::Period;

static DAY_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\d{4}-\d{2}-\d{2}$").expect("invalid date regex"));

/// Today's date in UTC.
pub fn today_utc() -> NaiveDate {
    Utc::now().date_naive()
}

/// Resolve a `date=YYYY-MM-DD` query value, falling back to `today` when
/// the value is missing or malformed.
pub fn resolve_day(value: Option<&str>, today: NaiveDate) -> NaiveDate {
    value
        .filter(|v| DAY_RE.is_match(v))
        .and_then(|v| NaiveDate::parse_from_str(v, "%Y-%m-%d").ok())
        .unwrap_or(today)
}

/// UTC instant bounds of a single day: `[00:00:00.000, 23:59:59.999]`.
pub fn day_bounds(day: NaiveDate) -> (DateTime<Utc>, DateTime<Utc>) {
    let start = day.and_time(NaiveTime::MIN).and_utc();
    let end = start + Duration::days(1) - Duration::milliseconds(1);
    (start, end)
}

/// Inclusive window of days ending on a given date
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PeriodRange {
    pub period: Period,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    #[serde(serialize_with = "serialize_millis")]
    pub start_iso: DateTime<Utc>,
    #[serde(serialize_with = "serialize_millis")]
    pub end_iso: DateTime<Utc>,
    pub days: u32,
}

fn serialize_millis<S>(value: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error>
where
    S: serde::Serializer,
{
    serializer.serialize_str(&value.format("%Y-%m-%dT%H:%M:%S%.3fZ").to_string())
}

impl PeriodRange {
    /// Window of `period.days()` days ending on `today`.
    pub fn ending(period: Period, today: NaiveDate) -> Self {
        let days = period.days();
        let start_date = today - Duration::days(i64::from(days) - 1);
        let (start_iso, _) = day_bounds(start_date);
        let (_, end_iso) = day_bounds(today);

        Self {
            period,
            start_date,
            end_date: today,
            start_iso,
            end_iso,
            days,
        }
    }

    /// Window ending today (UTC).
    pub fn current(period: Period) -> Self {
        Self::ending(period, today_utc())
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        date >= self.start_date && date <= self.end_date
    }

    /// Every day in the window, oldest first.
    pub fn dates(&self) -> impl Iterator<Item = NaiveDate> {
        let end = self.end_date;
        self.start_date.iter_days().take_while(move |d| *d <= end)
    }
}
