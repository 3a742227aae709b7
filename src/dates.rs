use chrono::{Duration, NaiveDate, NaiveDateTime};
use serde::{Serialize, Serializer};
use std::fmt;

pub const DISPLAY_FORMAT: &str = "%d/%m/%Y";

// Two-digit years go first: `%Y` also accepts "24" and would yield year 24.
const DATE_FORMATS: [&str; 6] = [
    "%d/%m/%y", "%d/%m/%Y", "%d-%m-%y", "%d-%m-%Y", "%d.%m.%Y", "%Y-%m-%d",
];

const DATETIME_FORMATS: [&str; 6] = [
    "%d/%m/%y %H:%M",
    "%d/%m/%Y %H:%M:%S",
    "%d/%m/%Y %H:%M",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M:%S%.f",
];

/// Result of coercing a cell into a calendar date.
///
/// Unparsable input is kept (with its original text) instead of failing the
/// whole table, and cannot be used in date arithmetic by accident.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScheduleDate {
    Valid(NaiveDate),
    Invalid(String),
}

impl ScheduleDate {
    pub fn parse(input: &str) -> Self {
        match parse_day_first(input) {
            Some(date) => ScheduleDate::Valid(date),
            None => ScheduleDate::Invalid(input.to_string()),
        }
    }

    pub fn valid(&self) -> Option<NaiveDate> {
        match self {
            ScheduleDate::Valid(date) => Some(*date),
            ScheduleDate::Invalid(_) => None,
        }
    }

    pub fn is_valid(&self) -> bool {
        matches!(self, ScheduleDate::Valid(_))
    }
}

impl From<NaiveDate> for ScheduleDate {
    fn from(value: NaiveDate) -> Self {
        ScheduleDate::Valid(value)
    }
}

impl fmt::Display for ScheduleDate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScheduleDate::Valid(date) => write!(f, "{}", format_date(*date)),
            ScheduleDate::Invalid(raw) => write!(f, "invalid date '{raw}'"),
        }
    }
}

impl Serialize for ScheduleDate {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            ScheduleDate::Valid(date) => serializer.serialize_str(&format_date(*date)),
            ScheduleDate::Invalid(_) => serializer.serialize_none(),
        }
    }
}

/// Parse a date written day-first (DD/MM/YYYY and friends).
///
/// A leading weekday token ("Seg 01/03/24") is ignored.
pub fn parse_day_first(input: &str) -> Option<NaiveDate> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return None;
    }

    parse_exact(trimmed).or_else(|| {
        let (head, rest) = trimmed.split_once(char::is_whitespace)?;
        if head.chars().all(char::is_alphabetic) {
            parse_exact(rest.trim())
        } else {
            None
        }
    })
}

fn parse_exact(input: &str) -> Option<NaiveDate> {
    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(input, fmt).ok())
        .or_else(|| {
            DATETIME_FORMATS
                .iter()
                .find_map(|fmt| NaiveDateTime::parse_from_str(input, fmt).ok())
                .map(|dt| dt.date())
        })
}

pub fn format_date(date: NaiveDate) -> String {
    date.format(DISPLAY_FORMAT).to_string()
}

/// Dash-separated rendering used in download file names.
pub fn format_date_for_file_name(date: NaiveDate) -> String {
    date.format("%d-%m-%Y").to_string()
}

/// Convert NaiveDate to Polars i32 date
pub fn date_to_i32(date: NaiveDate) -> i32 {
    (date - epoch()).num_days() as i32
}

pub fn date_from_i32(days: i32) -> NaiveDate {
    epoch() + Duration::days(days as i64)
}

fn epoch() -> NaiveDate {
    NaiveDate::from_ymd_opt(1970, 1, 1).unwrap()
}
