use crate::utils::error::{Result, RoundingError};
use chrono::{Datelike, NaiveDate, NaiveDateTime, Timelike};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fmt::Write as _;

/// Calendar units, declared coarse to fine so the derived ordering reads "finer is greater".
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Unit {
    Year,
    Month,
    Day,
    Hour,
    Minute,
    Second,
}

impl Unit {
    pub const ALL: [Unit; 6] = [
        Unit::Year,
        Unit::Month,
        Unit::Day,
        Unit::Hour,
        Unit::Minute,
        Unit::Second,
    ];

    pub fn index(self) -> usize {
        self as usize
    }

    /// Value a unit is reset to when it is finer than the anchor and not overridden.
    pub fn minimum(self) -> i64 {
        match self {
            Unit::Month | Unit::Day => 1,
            Unit::Year | Unit::Hour | Unit::Minute | Unit::Second => 0,
        }
    }

    /// Inclusive range a component may take independent of the other components.
    pub fn range(self) -> (i64, i64) {
        match self {
            Unit::Year => (1, 9999),
            Unit::Month => (1, 12),
            Unit::Day => (1, 31),
            Unit::Hour => (0, 23),
            Unit::Minute | Unit::Second => (0, 59),
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Unit::Year => "year",
            Unit::Month => "month",
            Unit::Day => "day",
            Unit::Hour => "hour",
            Unit::Minute => "minute",
            Unit::Second => "second",
        }
    }
}

impl fmt::Display for Unit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A calendar date-time at whole-second precision.
///
/// Only constructible through [`Timestamp::from_parts`] (or the chrono conversions), so every
/// value is a real calendar instant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Timestamp {
    inner: NaiveDateTime,
}

impl Timestamp {
    pub fn new(year: i64, month: i64, day: i64, hour: i64, minute: i64, second: i64) -> Result<Self> {
        Self::from_parts([year, month, day, hour, minute, second])
    }

    /// Builds a timestamp from components ordered as [`Unit::ALL`], naming the first
    /// component that does not fit.
    pub fn from_parts(parts: [i64; 6]) -> Result<Self> {
        for unit in Unit::ALL {
            let value = parts[unit.index()];
            let (min, max) = unit.range();
            if value < min || value > max {
                return Err(RoundingError::InvalidDate {
                    unit,
                    value,
                    reason: format!("{} must be between {} and {}", unit, min, max),
                });
            }
        }

        let [year, month, day, hour, minute, second] = parts;
        let date = NaiveDate::from_ymd_opt(year as i32, month as u32, day as u32).ok_or_else(|| {
            RoundingError::InvalidDate {
                unit: Unit::Day,
                value: day,
                reason: format!(
                    "{:04}-{:02} has {} days",
                    year,
                    month,
                    days_in_month(year as i32, month as u32)
                ),
            }
        })?;
        // ranges were checked above, so the time is always representable
        let inner = date
            .and_hms_opt(hour as u32, minute as u32, second as u32)
            .ok_or_else(|| RoundingError::InvalidDate {
                unit: Unit::Hour,
                value: hour,
                reason: "time of day out of range".to_string(),
            })?;

        Ok(Self { inner })
    }

    pub fn get(&self, unit: Unit) -> i64 {
        match unit {
            Unit::Year => self.inner.year() as i64,
            Unit::Month => self.inner.month() as i64,
            Unit::Day => self.inner.day() as i64,
            Unit::Hour => self.inner.hour() as i64,
            Unit::Minute => self.inner.minute() as i64,
            Unit::Second => self.inner.second() as i64,
        }
    }

    pub fn parts(&self) -> [i64; 6] {
        Unit::ALL.map(|unit| self.get(unit))
    }

    /// Renders with a chrono format. Specifiers that need a time zone (`%z`, `%Z`) or that
    /// chrono does not know are reported instead of panicking.
    pub fn format(&self, fmt: &str) -> Result<String> {
        let mut out = String::new();
        write!(out, "{}", self.inner.format(fmt)).map_err(|_| {
            RoundingError::InvalidConfigValueError {
                field: "output_format".to_string(),
                value: fmt.to_string(),
                reason: "format cannot be rendered for a date-time without a time zone"
                    .to_string(),
            }
        })?;
        Ok(out)
    }

    /// Tries each chrono format in turn; date-only formats land on midnight.
    pub fn parse(value: &str, formats: &[String]) -> Result<Self> {
        let value = value.trim();
        for fmt in formats {
            if let Ok(dt) = NaiveDateTime::parse_from_str(value, fmt) {
                return Self::try_from(dt);
            }
        }
        for fmt in formats {
            if let Ok(date) = NaiveDate::parse_from_str(value, fmt) {
                if let Some(dt) = date.and_hms_opt(0, 0, 0) {
                    return Self::try_from(dt);
                }
            }
        }
        Err(RoundingError::TimestampParse {
            value: value.to_string(),
        })
    }
}

impl TryFrom<NaiveDateTime> for Timestamp {
    type Error = RoundingError;

    /// Sub-second precision is discarded; the year must be within 1..=9999.
    fn try_from(dt: NaiveDateTime) -> Result<Self> {
        Self::new(
            dt.year() as i64,
            dt.month() as i64,
            dt.day() as i64,
            dt.hour() as i64,
            dt.minute() as i64,
            dt.second() as i64,
        )
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.inner.format("%Y-%m-%d %H:%M:%S"))
    }
}

fn days_in_month(year: i32, month: u32) -> u32 {
    match month {
        1 | 3 | 5 | 7 | 8 | 10 | 12 => 31,
        4 | 6 | 9 | 11 => 30,
        2 => {
            if NaiveDate::from_ymd_opt(year, 2, 29).is_some() {
                29
            } else {
                28
            }
        }
        _ => 0,
    }
}

/// Per-unit overrides. Values are not range-checked here; building the rounded
/// [`Timestamp`] is what rejects them.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoundingSpec {
    pub year: Option<i64>,
    pub month: Option<i64>,
    pub day: Option<i64>,
    pub hour: Option<i64>,
    pub minute: Option<i64>,
    pub second: Option<i64>,
}

impl RoundingSpec {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, unit: Unit, value: i64) -> Self {
        *self.slot(unit) = Some(value);
        self
    }

    pub fn get(&self, unit: Unit) -> Option<i64> {
        match unit {
            Unit::Year => self.year,
            Unit::Month => self.month,
            Unit::Day => self.day,
            Unit::Hour => self.hour,
            Unit::Minute => self.minute,
            Unit::Second => self.second,
        }
    }

    fn slot(&mut self, unit: Unit) -> &mut Option<i64> {
        match unit {
            Unit::Year => &mut self.year,
            Unit::Month => &mut self.month,
            Unit::Day => &mut self.day,
            Unit::Hour => &mut self.hour,
            Unit::Minute => &mut self.minute,
            Unit::Second => &mut self.second,
        }
    }

    /// The coarsest overridden unit.
    pub fn anchor(&self) -> Option<Unit> {
        Unit::ALL.into_iter().find(|unit| self.get(*unit).is_some())
    }

    pub fn is_empty(&self) -> bool {
        self.anchor().is_none()
    }
}

impl fmt::Display for RoundingSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let set: Vec<String> = Unit::ALL
            .into_iter()
            .filter_map(|unit| self.get(unit).map(|value| format!("{}={}", unit, value)))
            .collect();
        if set.is_empty() {
            f.write_str("{}")
        } else {
            write!(f, "{{{}}}", set.join(", "))
        }
    }
}

/// What to do when a single row cannot be rounded.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "cli", derive(clap::ValueEnum))]
#[serde(rename_all = "lowercase")]
pub enum OnRowError {
    /// Log a warning and leave the new field empty for that row.
    #[default]
    Skip,
    /// Stop the run before anything is written.
    Abort,
}

#[derive(Debug)]
pub enum RowOutcome {
    Rounded(Timestamp),
    Null,
    Failed(RoundingError),
}

#[derive(Debug)]
pub struct RoundedRow {
    pub key: String,
    pub outcome: RowOutcome,
}

#[derive(Debug)]
pub struct TransformResult {
    pub table: crate::domain::table::Table,
    pub new_field: String,
    pub rows: Vec<RoundedRow>,
}

impl TransformResult {
    pub fn count(&self, pred: impl Fn(&RowOutcome) -> bool) -> usize {
        self.rows.iter().filter(|row| pred(&row.outcome)).count()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunSummary {
    pub output_path: String,
    pub new_field: String,
    pub total_rows: usize,
    pub rounded_rows: usize,
    pub null_rows: usize,
    pub failed_rows: usize,
}
