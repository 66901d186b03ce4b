use chrono::{DateTime, NaiveDateTime};

/// Datetime layout used by the catalog's StartTime/EndTime columns.
pub const CATALOG_DATETIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

const DAY_SECS: i64 = 86_400;

/// Reporting window offered by the backup job report.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportPeriod {
    Week,
    TwoWeeks,
    Month,
}

impl ReportPeriod {
    pub const ALL: [ReportPeriod; 3] = [Self::Week, Self::TwoWeeks, Self::Month];

    /// Resolve a period from its length in days. Anything outside the
    /// supported set is rejected rather than guessed at.
    pub fn from_days(days: u32) -> Option<Self> {
        match days {
            7 => Some(Self::Week),
            14 => Some(Self::TwoWeeks),
            30 => Some(Self::Month),
            _ => None,
        }
    }

    pub fn days(self) -> u32 {
        match self {
            Self::Week => 7,
            Self::TwoWeeks => 14,
            Self::Month => 30,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Week => "Last week",
            Self::TwoWeeks => "Last 2 weeks",
            Self::Month => "Last month",
        }
    }

    /// The whole report window, ending at `now`.
    pub fn overall(self, now: i64) -> TimeRange {
        TimeRange {
            start: now - i64::from(self.days()) * DAY_SECS,
            end: now,
        }
    }

    /// One 24h bucket per day of the period, oldest first so the sequence
    /// matches left-to-right chart rendering. The most recent bucket ends
    /// exactly at `now`.
    pub fn day_buckets(self, now: i64) -> Vec<TimeRange> {
        (0..i64::from(self.days()))
            .rev()
            .map(|back| TimeRange {
                start: now - (back + 1) * DAY_SECS,
                end: now - back * DAY_SECS,
            })
            .collect()
    }
}

/// Half-open `[start, end)` interval of unix timestamps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TimeRange {
    pub start: i64,
    pub end: i64,
}

/// "MM-DD" chart label for a bucket start.
pub fn month_day_label(timestamp: i64) -> String {
    format_timestamp(timestamp, "%m-%d")
}

/// Format a unix timestamp (UTC) with a strftime-style pattern.
pub fn format_timestamp(timestamp: i64, pattern: &str) -> String {
    DateTime::from_timestamp(timestamp, 0)
        .map(|dt| dt.format(pattern).to_string())
        .unwrap_or_default()
}

/// Reformat a catalog datetime string for display. Input that does not parse
/// is returned unchanged.
pub fn format_catalog_datetime(value: &str, pattern: &str) -> String {
    match NaiveDateTime::parse_from_str(value, CATALOG_DATETIME_FORMAT) {
        Ok(dt) => dt.format(pattern).to_string(),
        Err(_) => value.to_string(),
    }
}

/// Whole seconds between two catalog datetime strings. `None` when either
/// side fails to parse or the end precedes the start.
pub fn elapsed_seconds(start: &str, end: &str) -> Option<i64> {
    let start = NaiveDateTime::parse_from_str(start, CATALOG_DATETIME_FORMAT).ok()?;
    let end = NaiveDateTime::parse_from_str(end, CATALOG_DATETIME_FORMAT).ok()?;
    let secs = (end - start).num_seconds();
    (secs >= 0).then_some(secs)
}
