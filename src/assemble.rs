//! Final assembly: merge resolved records with run metadata and write the
//! single JSON document the map front end consumes.

use crate::constants::OUTPUT_FILE_NAME;
use crate::error::Result;
use crate::types::EventRecord;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

#[derive(Debug, Serialize, Deserialize)]
pub struct Meta {
    pub generated_at: DateTime<Utc>,
    pub source_excel: String,
    pub event_count: usize,
    pub unique_locations: usize,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Payload {
    pub meta: Meta,
    pub events: Vec<EventRecord>,
}

impl Payload {
    pub fn new(events: Vec<EventRecord>, source_excel: &str, unique_locations: usize) -> Self {
        Self {
            meta: Meta {
                generated_at: Utc::now(),
                source_excel: source_excel.to_string(),
                event_count: events.len(),
                unique_locations,
            },
            events,
        }
    }
}

/// Serialize the payload into `<out_dir>/events.json`, creating the
/// directory if needed.
pub fn write_payload(payload: &Payload, out_dir: &str) -> Result<PathBuf> {
    fs::create_dir_all(out_dir)?;
    let path = Path::new(out_dir).join(OUTPUT_FILE_NAME);
    let json = serde_json::to_string_pretty(payload)?;
    fs::write(&path, json)?;
    info!("Wrote {} with {} events", path.display(), payload.meta.event_count);
    Ok(path)
}
