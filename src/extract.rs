//! Tabular extraction: workbook sheets into `EventRecord`s.
//!
//! Sheets are externally authored and inconsistent: the header row can sit
//! below a preamble, and column names vary in spelling. Header discovery
//! and column resolution are pure functions so both can be tested against
//! literal fixtures.

use crate::constants::{
    DATE_ALIASES, EVENT_TYPE_ALIASES, HEADER_MARKERS, HEADER_SCAN_ROWS, LAT_ALIASES, LEAD_ALIASES,
    LOCATION_ALIASES, LON_ALIASES, NOTES_ALIASES, START_TIME_ALIASES, event_id,
};
use crate::error::Result;
use crate::normalize::{cell_text, parse_coord, parse_date, parse_time};
use crate::types::{location_key, EventRecord};
use calamine::{open_workbook, Data, Range, Reader, Xlsx};
use tracing::{debug, info, warn};

/// Column indices resolved for one sheet. `None` means the canonical field
/// has no matching column; it is emitted empty/absent for every row rather
/// than being an error.
#[derive(Debug, Default)]
struct ColumnMap {
    date: Option<usize>,
    location: Option<usize>,
    start_time: Option<usize>,
    event_type: Option<usize>,
    notes: Option<usize>,
    lead: Option<usize>,
    lat: Option<usize>,
    lon: Option<usize>,
}

impl ColumnMap {
    fn resolve(headers: &[String]) -> Self {
        Self {
            date: resolve_column(headers, DATE_ALIASES),
            location: resolve_column(headers, LOCATION_ALIASES),
            start_time: resolve_column(headers, START_TIME_ALIASES),
            event_type: resolve_column(headers, EVENT_TYPE_ALIASES),
            notes: resolve_column(headers, NOTES_ALIASES),
            lead: resolve_column(headers, LEAD_ALIASES),
            lat: resolve_column(headers, LAT_ALIASES),
            lon: resolve_column(headers, LON_ALIASES),
        }
    }
}

/// Locate the header row: the first of the leading `HEADER_SCAN_ROWS` rows
/// whose cells jointly contain every marker phrase, compared
/// case-insensitively. Falls back to row 0, which covers sheets with no
/// preamble.
pub fn find_header_row(rows: &[Vec<String>]) -> usize {
    for (i, row) in rows.iter().take(HEADER_SCAN_ROWS).enumerate() {
        let lowered: Vec<String> = row.iter().map(|c| c.to_lowercase()).collect();
        if HEADER_MARKERS
            .iter()
            .all(|marker| lowered.iter().any(|cell| cell.contains(marker)))
        {
            return i;
        }
    }
    0
}

/// Map a canonical field to a column index: an exact lower-cased alias
/// match wins, then substring containment against every header cell.
pub fn resolve_column(headers: &[String], aliases: &[&str]) -> Option<usize> {
    let lowered: Vec<String> = headers.iter().map(|h| h.trim().to_lowercase()).collect();
    for alias in aliases {
        if let Some(i) = lowered.iter().position(|h| h == alias) {
            return Some(i);
        }
    }
    for alias in aliases {
        if let Some(i) = lowered.iter().position(|h| !h.is_empty() && h.contains(alias)) {
            return Some(i);
        }
    }
    None
}

/// Read every sheet of the workbook and return cleaned records in
/// sheet-then-row order, with sequential ids already assigned.
pub fn read_events(excel_path: &str) -> Result<Vec<EventRecord>> {
    let mut workbook: Xlsx<_> = open_workbook(excel_path)?;
    let sheet_names = workbook.sheet_names().to_vec();
    let mut events = Vec::new();

    for sheet in sheet_names {
        let range = match workbook.worksheet_range(&sheet) {
            Ok(r) => r,
            Err(e) => {
                warn!("Skipping unreadable sheet {:?}: {}", sheet, e);
                continue;
            }
        };
        if range.is_empty() {
            continue;
        }
        let before = events.len();
        extract_sheet(&sheet, &range, &mut events);
        debug!("Sheet {:?} yielded {} records", sheet, events.len() - before);
    }

    // Ordering above is load-bearing: ids must be stable across runs.
    for (i, event) in events.iter_mut().enumerate() {
        event.id = event_id(i + 1);
    }

    info!("Extracted {} events from {}", events.len(), excel_path);
    Ok(events)
}

fn extract_sheet(region: &str, range: &Range<Data>, out: &mut Vec<EventRecord>) {
    let data_rows: Vec<&[Data]> = range.rows().collect();
    let text_rows: Vec<Vec<String>> = data_rows
        .iter()
        .map(|row| row.iter().map(cell_text).collect())
        .collect();

    let header_row = find_header_row(&text_rows);
    let cols = ColumnMap::resolve(&text_rows[header_row]);
    if cols.location.is_none() {
        warn!("Sheet {:?} has no recognizable location column; skipping", region);
        return;
    }

    for (text_row, data_row) in text_rows.iter().zip(&data_rows).skip(header_row + 1) {
        if text_row.iter().all(|cell| cell.is_empty()) {
            continue;
        }
        let location = cols
            .location
            .and_then(|i| text_row.get(i))
            .cloned()
            .unwrap_or_default();
        if location.is_empty() {
            // Rows without a location carry no mappable information.
            continue;
        }

        let cell = |idx: Option<usize>| idx.and_then(|i| data_row.get(i));

        // Pre-supplied coordinates count only as a pair.
        let (lat, lon) = match (cell(cols.lat).and_then(parse_coord), cell(cols.lon).and_then(parse_coord)) {
            (Some(lat), Some(lon)) => (Some(lat), Some(lon)),
            _ => (None, None),
        };

        out.push(EventRecord {
            id: String::new(),
            region: region.trim().to_string(),
            date: cell(cols.date).and_then(parse_date),
            start_time: cell(cols.start_time).and_then(parse_time),
            location_key: location_key(&location),
            location,
            event_type: cell(cols.event_type).map(cell_text).unwrap_or_default(),
            notes: cell(cols.notes).map(cell_text).unwrap_or_default(),
            lead: cell(cols.lead).map(cell_text).unwrap_or_default(),
            lat,
            lon,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rows(raw: &[&[&str]]) -> Vec<Vec<String>> {
        raw.iter()
            .map(|row| row.iter().map(|c| c.to_string()).collect())
            .collect()
    }

    #[test]
    fn header_row_is_found_below_a_preamble() {
        let sheet = rows(&[
            &["North region events", "", ""],
            &["", "", ""],
            &["Event date", "Event location", "Notes"],
            &["2024-03-01", "Town Hall", ""],
        ]);
        assert_eq!(find_header_row(&sheet), 2);
    }

    #[test]
    fn header_discovery_is_case_insensitive_and_accepts_longer_names() {
        let sheet = rows(&[&["EVENT DATE (confirmed)", "Event Location / venue"]]);
        assert_eq!(find_header_row(&sheet), 0);
    }

    #[test]
    fn header_falls_back_to_row_zero() {
        let sheet = rows(&[&["Date", "Place"], &["2024-03-01", "Town Hall"]]);
        assert_eq!(find_header_row(&sheet), 0);
    }

    #[test]
    fn header_markers_beyond_scan_depth_are_ignored() {
        let mut raw: Vec<Vec<String>> = (0..12).map(|_| vec!["filler".to_string()]).collect();
        raw.push(vec!["Event date".to_string(), "Event location".to_string()]);
        assert_eq!(find_header_row(&raw), 0);
    }

    #[test]
    fn exact_alias_match_beats_containment() {
        let headers: Vec<String> = ["Event location details", "Event location"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        assert_eq!(resolve_column(&headers, &["event location"]), Some(1));
    }

    #[test]
    fn containment_match_is_the_fallback() {
        let headers: Vec<String> = ["Event date", "Event location (venue)"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        assert_eq!(resolve_column(&headers, &["event location"]), Some(1));
        assert_eq!(resolve_column(&headers, &["start time"]), None);
    }

    #[test]
    fn lead_column_matches_any_known_spelling() {
        let headers: Vec<String> = ["Event date", "Lead rep/ staff member"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        assert_eq!(resolve_column(&headers, crate::constants::LEAD_ALIASES), Some(1));
    }

    #[test]
    fn sheet_extraction_drops_blank_and_locationless_rows() {
        let cells = vec![
            Data::String("Event date".into()),
            Data::String("Event location".into()),
            Data::String("Notes".into()),
            // row 1: a real event
            Data::String("2024-03-01".into()),
            Data::String("Town Hall".into()),
            Data::String("bring leaflets".into()),
            // row 2: entirely blank
            Data::Empty,
            Data::Empty,
            Data::Empty,
            // row 3: no location
            Data::String("2024-03-02".into()),
            Data::String("  ".into()),
            Data::String("tbc".into()),
        ];
        let range = Range::from_sparse(
            cells
                .into_iter()
                .enumerate()
                .map(|(i, cell)| ((i as u32 / 3, i as u32 % 3), cell))
                .map(|((r, c), cell)| calamine::Cell::new((r, c), cell))
                .collect(),
        );

        let mut out = Vec::new();
        extract_sheet(" North ", &range, &mut out);

        assert_eq!(out.len(), 1);
        assert_eq!(out[0].region, "North");
        assert_eq!(out[0].location, "Town Hall");
        assert_eq!(out[0].location_key, "town hall");
        assert_eq!(out[0].notes, "bring leaflets");
        assert_eq!(out[0].date, chrono::NaiveDate::from_ymd_opt(2024, 3, 1));
        assert_eq!((out[0].lat, out[0].lon), (None, None));
    }

    #[test]
    fn pre_supplied_coordinates_survive_only_as_a_pair() {
        let header = ["Event location", "Lat", "Lon"];
        let rows: Vec<Vec<Data>> = vec![
            header.iter().map(|s| Data::String(s.to_string())).collect(),
            vec![
                Data::String("Town Hall".into()),
                Data::Float(51.5),
                Data::Float(-0.12),
            ],
            vec![
                Data::String("Library".into()),
                Data::Float(51.5),
                Data::String("unknown".into()),
            ],
        ];
        let cells: Vec<calamine::Cell<Data>> = rows
            .into_iter()
            .enumerate()
            .flat_map(|(r, row)| {
                row.into_iter()
                    .enumerate()
                    .map(move |(c, cell)| calamine::Cell::new((r as u32, c as u32), cell))
            })
            .collect();
        let range = Range::from_sparse(cells);

        let mut out = Vec::new();
        extract_sheet("South", &range, &mut out);

        assert_eq!(out.len(), 2);
        assert_eq!((out[0].lat, out[0].lon), (Some(51.5), Some(-0.12)));
        assert_eq!((out[1].lat, out[1].lon), (None, None));
    }
}
