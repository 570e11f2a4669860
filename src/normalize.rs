//! Cell-level coercion: raw workbook cells into canonical scalar forms.
//!
//! Every function here degrades instead of failing: unparseable input maps
//! to `None` (dates, times, coordinates) or an empty string (text).

use calamine::Data;
use chrono::{Duration, NaiveDate, NaiveDateTime, NaiveTime};

/// Textual dates are parsed day-first: the workbook is UK-authored, so
/// "03/04/2024" means 3 April 2024.
const TEXT_DATE_FORMATS: &[&str] = &[
    "%Y-%m-%d",
    "%Y/%m/%d",
    "%d/%m/%Y",
    "%d-%m-%Y",
    "%d.%m.%Y",
    "%d/%m/%y",
    "%d %B %Y",
    "%d %b %Y",
];

const TEXT_DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M",
    "%d/%m/%Y %H:%M",
];

const TEXT_TIME_FORMATS: &[&str] = &["%H:%M:%S", "%H:%M", "%I:%M %p", "%I %p", "%I%p"];

/// Stringify a cell and trim it; blanks, NaN and error cells become "".
pub fn cell_text(cell: &Data) -> String {
    match cell {
        Data::Empty | Data::Error(_) => String::new(),
        Data::Float(f) if f.is_nan() => String::new(),
        Data::String(s) => s.trim().to_string(),
        other => other.to_string().trim().to_string(),
    }
}

/// Coerce a cell into a calendar date. Accepts native date/datetime cells,
/// numeric spreadsheet serials and permissively-parsed text.
pub fn parse_date(cell: &Data) -> Option<NaiveDate> {
    match cell {
        Data::DateTime(dt) => dt.as_datetime().map(|d| d.date()),
        Data::DateTimeIso(s) => parse_text_date(s),
        Data::Float(f) => date_from_serial(*f),
        Data::Int(i) => date_from_serial(*i as f64),
        Data::String(s) => parse_text_date(s),
        _ => None,
    }
}

/// Coerce a cell into a zero-padded `HH:MM` string. Accepts native
/// date/time cells, day fractions and permissively-parsed text, with a
/// last-resort slice for strings shaped like `13:00:00`.
pub fn parse_time(cell: &Data) -> Option<String> {
    match cell {
        Data::DateTime(dt) => dt.as_datetime().map(|d| fmt_hm(d.time())),
        Data::DateTimeIso(s) | Data::DurationIso(s) => parse_text_time(s),
        Data::Float(f) => time_from_fraction(*f).map(fmt_hm),
        Data::String(s) => parse_text_time(s),
        _ => None,
    }
}

/// Parse a pre-supplied coordinate cell; anything non-numeric is absent.
pub fn parse_coord(cell: &Data) -> Option<f64> {
    match cell {
        Data::Float(f) if f.is_finite() => Some(*f),
        Data::Int(i) => Some(*i as f64),
        Data::String(s) => s.trim().parse::<f64>().ok().filter(|v| v.is_finite()),
        _ => None,
    }
}

fn fmt_hm(t: NaiveTime) -> String {
    t.format("%H:%M").to_string()
}

// Spreadsheet serial dates count days from 1899-12-30.
fn date_from_serial(serial: f64) -> Option<NaiveDate> {
    if !serial.is_finite() || serial < 1.0 {
        return None;
    }
    NaiveDate::from_ymd_opt(1899, 12, 30)?.checked_add_signed(Duration::days(serial.trunc() as i64))
}

// Time-of-day stored as a fraction of a day.
fn time_from_fraction(f: f64) -> Option<NaiveTime> {
    if !(0.0..1.0).contains(&f) {
        return None;
    }
    let secs = (f * 86_400.0).round() as u32;
    NaiveTime::from_num_seconds_from_midnight_opt(secs % 86_400, 0)
}

fn parse_text_date(raw: &str) -> Option<NaiveDate> {
    let s = raw.trim();
    if s.is_empty() {
        return None;
    }
    for fmt in TEXT_DATE_FORMATS {
        if let Ok(d) = NaiveDate::parse_from_str(s, fmt) {
            return Some(d);
        }
    }
    for fmt in TEXT_DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(dt.date());
        }
    }
    None
}

fn parse_text_time(raw: &str) -> Option<String> {
    let s = raw.trim();
    if s.is_empty() {
        return None;
    }
    for fmt in TEXT_TIME_FORMATS {
        if let Ok(t) = NaiveTime::parse_from_str(s, fmt) {
            return Some(fmt_hm(t));
        }
    }
    for fmt in TEXT_DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(fmt_hm(dt.time()));
        }
    }
    // Accept "13:00..."-shaped strings even when structured parsing fails.
    if s.len() >= 5 && s.as_bytes()[2] == b':' {
        return s.get(..5).map(|p| p.to_string());
    }
    None
}
