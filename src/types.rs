use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// One scheduled event, normalized from a workbook row.
///
/// Fields that could not be parsed are `None` (dates, times, coordinates)
/// or empty strings (free text); a record only exists at all if its
/// location text was non-empty.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventRecord {
    /// Stable sequential identifier (`EVT-0001`, …) in sheet-then-row order.
    pub id: String,
    /// Name of the sheet the record came from.
    pub region: String,
    pub date: Option<NaiveDate>,
    /// 24-hour `HH:MM`, or `None` when unparseable.
    pub start_time: Option<String>,
    /// Raw free-text address/venue string, never empty.
    pub location: String,
    pub event_type: String,
    pub notes: String,
    pub lead: String,
    /// Normalized form of `location`; the grouping and cache key.
    pub location_key: String,
    pub lat: Option<f64>,
    pub lon: Option<f64>,
}

/// Normalized grouping/cache key for a location string. Pure function of
/// the input: records with equal locations always share a key.
pub fn location_key(location: &str) -> String {
    location.trim().to_lowercase()
}
