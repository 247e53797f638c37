// Cell coercion helpers and number formatting.
//
// Every value pulled out of an uploaded sheet goes through one of the
// `coerce_*` functions below, so the rest of the crate can assume clean,
// typed values. None of them fail: a missing or unusable cell becomes an
// empty string, a zero or `false`.
use crate::types::WinOutcome;
use chrono::{Days, NaiveDate, NaiveDateTime};
use num_format::{Locale, ToFormattedString};
use serde::{Deserialize, Serialize};

/// A decoded spreadsheet cell, independent of the spreadsheet library.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Cell {
    #[default]
    Empty,
    Text(String),
    Number(f64),
    Bool(bool),
    /// A date-formatted cell already resolved against the workbook's own
    /// date system.
    Date(NaiveDate),
}

impl Cell {
    /// Blank cells and whitespace-only text both count as empty.
    pub fn is_blank(&self) -> bool {
        match self {
            Cell::Empty => true,
            Cell::Text(s) => s.trim().is_empty(),
            Cell::Number(_) | Cell::Bool(_) | Cell::Date(_) => false,
        }
    }
}

/// Which calendar a plain numeric serial day-number counts from. Cells the
/// workbook itself formats as dates arrive as [`Cell::Date`] and ignore this.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DateEpoch {
    /// Serial 1 is 1900-01-01 and serial 60 is the phantom 1900-02-29.
    #[default]
    Excel1900,
    /// Serial 0 is 1904-01-01 (older Mac workbooks).
    Excel1904,
}

// 9999-12-31 in the 1900 system; anything past it is not a date.
const MAX_SERIAL: f64 = 2_958_465.0;

const DATE_FORMATS: [&str; 3] = ["%Y-%m-%d", "%Y/%m/%d", "%Y.%m.%d"];
const DATETIME_FORMATS: [&str; 4] = [
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%Y/%m/%d %H:%M:%S",
    "%Y-%m-%d %H:%M",
];

/// Convert a serial day-number into a calendar date.
///
/// The fractional (time of day) part is dropped. Returns `None` for values
/// before the epoch start, non-finite values, or values past year 9999.
pub fn serial_to_date(serial: f64, epoch: DateEpoch) -> Option<NaiveDate> {
    if !serial.is_finite() || serial > MAX_SERIAL {
        return None;
    }
    let days = serial.floor() as i64;
    match epoch {
        DateEpoch::Excel1900 => {
            if days < 1 {
                return None;
            }
            // Serials from 60 on are one ahead of the real calendar because
            // the format counts 1900 as a leap year. 60 itself lands on 02-28.
            let offset = if days >= 60 { days - 1 } else { days };
            NaiveDate::from_ymd_opt(1899, 12, 31)?.checked_add_days(Days::new(offset as u64))
        }
        DateEpoch::Excel1904 => {
            if days < 0 {
                return None;
            }
            NaiveDate::from_ymd_opt(1904, 1, 1)?.checked_add_days(Days::new(days as u64))
        }
    }
}

/// Parse a literal date string in one of the accepted layouts.
pub fn parse_date_text(s: &str) -> Option<NaiveDate> {
    let s = s.trim();
    if s.is_empty() {
        return None;
    }
    DATE_FORMATS
        .iter()
        .find_map(|f| NaiveDate::parse_from_str(s, f).ok())
        .or_else(|| {
            DATETIME_FORMATS
                .iter()
                .find_map(|f| NaiveDateTime::parse_from_str(s, f).ok())
                .map(|dt| dt.date())
        })
}

/// Normalize a date cell to `YYYY-MM-DD`, or an empty string.
pub fn coerce_date(cell: &Cell, epoch: DateEpoch) -> String {
    let date = match cell {
        Cell::Number(n) => serial_to_date(*n, epoch),
        Cell::Text(s) => parse_date_text(s),
        Cell::Date(d) => Some(*d),
        Cell::Empty | Cell::Bool(_) => None,
    };
    date.map(|d| d.format("%Y-%m-%d").to_string())
        .unwrap_or_default()
}

/// Free-form text. Numbers keep their integer form when they have no
/// fractional part (`3.0` becomes `"3"`).
pub fn coerce_text(cell: &Cell) -> String {
    match cell {
        Cell::Empty => String::new(),
        Cell::Text(s) => s.trim().to_string(),
        Cell::Number(n) if n.fract() == 0.0 && n.abs() < 1e15 => format!("{}", *n as i64),
        Cell::Number(n) => n.to_string(),
        Cell::Bool(true) => "TRUE".to_string(),
        Cell::Bool(false) => "FALSE".to_string(),
        Cell::Date(d) => d.format("%Y-%m-%d").to_string(),
    }
}

/// Non-negative integer metric. Thousands separators are accepted in text
/// cells; anything else that is not a plain integer gives zero.
pub fn coerce_count(cell: &Cell) -> u64 {
    match cell {
        Cell::Number(n) if n.is_finite() && *n >= 0.0 => n.trunc() as u64,
        Cell::Text(s) => s.trim().replace(',', "").parse::<u64>().unwrap_or(0),
        _ => 0,
    }
}

/// Rank position; zero is the "not ranked" sentinel.
pub fn coerce_position(cell: &Cell) -> u32 {
    u32::try_from(coerce_count(cell)).unwrap_or(0)
}

/// True only when the cell holds exactly `token`.
pub fn coerce_flag(cell: &Cell, token: &str) -> bool {
    matches!(cell, Cell::Text(s) if s == token)
}

pub fn coerce_outcome(cell: &Cell) -> WinOutcome {
    WinOutcome::from_token(&coerce_text(cell))
}

/// Round to one decimal place.
pub fn round1(v: f64) -> f64 {
    (v * 10.0).round() / 10.0
}

/// `part / whole` as a percentage with one decimal; zero when `whole` is zero.
pub fn percent(part: usize, whole: usize) -> f64 {
    if whole == 0 {
        return 0.0;
    }
    round1(part as f64 / whole as f64 * 100.0)
}

pub fn format_int<T>(n: T) -> String
where
    T: ToFormattedString,
{
    // Thin wrapper around `num-format` for counts in console messages
    // (e.g. `1,204 records imported`).
    n.to_formatted_string(&Locale::en)
}

/// Reads above ten thousand are shown in units of 万.
pub fn format_reads(reads: u64) -> String {
    if reads > 10_000 {
        format!("{:.2}万", reads as f64 / 10_000.0)
    } else {
        reads.to_string()
    }
}
