//! Persistent geocode cache: a flat JSON file mapping location keys to
//! resolved coordinates. Failures are cached too, so a location that does
//! not exist is never retried across runs.

use crate::error::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;
use tracing::{debug, warn};

/// One persisted geocode result. A failed lookup is stored with both
/// coordinates null.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheEntry {
    pub lat: Option<f64>,
    pub lon: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ts: Option<DateTime<Utc>>,
}

impl CacheEntry {
    pub fn hit(lat: f64, lon: f64, display_name: String) -> Self {
        Self {
            lat: Some(lat),
            lon: Some(lon),
            display_name: Some(display_name),
            ts: Some(Utc::now()),
        }
    }

    pub fn miss() -> Self {
        Self {
            lat: None,
            lon: None,
            display_name: None,
            ts: Some(Utc::now()),
        }
    }

    pub fn coords(&self) -> (Option<f64>, Option<f64>) {
        (self.lat, self.lon)
    }
}

/// Flat-file key-value store for geocode results. Loaded once at startup,
/// mutated in memory, persisted after every write so a crash mid-run keeps
/// the lookups already paid for.
#[derive(Debug)]
pub struct GeocodeCache {
    path: PathBuf,
    entries: HashMap<String, CacheEntry>,
}

impl GeocodeCache {
    /// Load the cache from disk. A missing or unreadable file yields an
    /// empty cache rather than an error.
    pub fn load(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let entries = match fs::read_to_string(&path) {
            Ok(text) => match serde_json::from_str(&text) {
                Ok(map) => map,
                Err(e) => {
                    warn!("Ignoring unreadable geocode cache {}: {}", path.display(), e);
                    HashMap::new()
                }
            },
            Err(_) => HashMap::new(),
        };
        debug!("Loaded {} geocode cache entries from {}", entries.len(), path.display());
        Self { path, entries }
    }

    pub fn get(&self, key: &str) -> Option<&CacheEntry> {
        self.entries.get(key)
    }

    pub fn put(&mut self, key: &str, entry: CacheEntry) {
        self.entries.insert(key.to_string(), entry);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Write the whole cache back to disk.
    pub fn persist(&self) -> Result<()> {
        let json = serde_json::to_string_pretty(&self.entries)?;
        fs::write(&self.path, json)?;
        debug!("Persisted {} cache entries to {}", self.entries.len(), self.path.display());
        Ok(())
    }
}
