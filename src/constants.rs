/// Tunables and column-name aliases shared across the pipeline.

/// How many leading rows of a sheet are scanned when looking for the header
/// row. Sheets sometimes carry a title or preamble before the real table.
pub const HEADER_SCAN_ROWS: usize = 10;

/// Case-insensitive phrases that must all appear somewhere in a row's cells
/// for the row to be treated as the header.
pub const HEADER_MARKERS: [&str; 2] = ["event date", "event location"];

// Known header spellings per canonical field, lower-cased. Exact matches are
// preferred; a substring containment match is the fallback.
pub const DATE_ALIASES: &[&str] = &["event date"];
pub const LOCATION_ALIASES: &[&str] = &["event location"];
pub const START_TIME_ALIASES: &[&str] = &["start time"];
pub const EVENT_TYPE_ALIASES: &[&str] = &["event type"];
pub const NOTES_ALIASES: &[&str] = &["notes"];
pub const LEAD_ALIASES: &[&str] = &["lead rep/ staff member", "lead rep/staff member", "lead"];
pub const LAT_ALIASES: &[&str] = &["lat", "latitude"];
pub const LON_ALIASES: &[&str] = &["lon", "lng", "longitude"];

/// Nominatim's usage policy caps clients at roughly one request per second.
pub const GEOCODE_MIN_INTERVAL_MS: u64 = 1100;
pub const GEOCODE_TIMEOUT_SECS: u64 = 30;

/// Lookups are biased to this jurisdiction before retrying the raw string.
pub const COUNTRY_BIAS: &str = "United Kingdom";

pub const DEFAULT_EXCEL_PATH: &str = "events.xlsx";
pub const DEFAULT_OUT_DIR: &str = "docs/data";
pub const DEFAULT_CACHE_PATH: &str = ".geocode_cache.json";
pub const DEFAULT_USER_AGENT: &str = "events-map-builder/1.0 (contact: you@example.com)";
pub const DEFAULT_NOMINATIM_URL: &str = "https://nominatim.openstreetmap.org/search";

pub const OUTPUT_FILE_NAME: &str = "events.json";

/// Format a sequential event identifier, 1-based.
pub fn event_id(seq: usize) -> String {
    format!("EVT-{seq:04}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn event_ids_are_zero_padded() {
        assert_eq!(event_id(1), "EVT-0001");
        assert_eq!(event_id(42), "EVT-0042");
        assert_eq!(event_id(12345), "EVT-12345");
    }
}
