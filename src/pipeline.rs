//! Orchestration of one batch run: extract, resolve, assemble.

use crate::assemble::{write_payload, Payload};
use crate::cache::GeocodeCache;
use crate::config::Config;
use crate::error::{BuildError, Result};
use crate::extract::read_events;
use crate::geocode::{resolve_locations, Geocoder};
use std::path::Path;
use tracing::{info, instrument, warn};

/// Summary of a complete build run.
#[derive(Debug)]
pub struct BuildResult {
    pub event_count: usize,
    pub unique_locations: usize,
    pub cache_hits: usize,
    pub network_calls: usize,
    pub failed_locations: usize,
    pub output_file: String,
}

/// Run the whole batch. The only fatal condition is a missing input
/// workbook; everything downstream degrades per record or per location.
#[instrument(skip(config, geocoder), fields(excel = %config.excel_path))]
pub async fn run_build(config: &Config, geocoder: &dyn Geocoder) -> Result<BuildResult> {
    if !Path::new(&config.excel_path).exists() {
        return Err(BuildError::InputMissing(config.excel_path.clone()));
    }

    info!("📖 Reading workbook {}", config.excel_path);
    let mut events = read_events(&config.excel_path)?;

    let mut cache = GeocodeCache::load(config.cache_path.as_str());
    info!("🌍 Resolving locations ({} cached entries)", cache.len());
    let stats = resolve_locations(&mut events, &mut cache, geocoder).await;
    // An unwritable cache costs future runs some lookups; it must not
    // cost this run its output document.
    if let Err(e) = cache.persist() {
        warn!("Failed to persist geocode cache: {}", e);
    }

    let payload = Payload::new(events, &config.excel_path, stats.unique_locations);
    let output = write_payload(&payload, &config.out_dir)?;

    info!(
        "✅ Build complete: {} events, {} unique locations, {} network calls",
        payload.meta.event_count, stats.unique_locations, stats.network_calls
    );

    Ok(BuildResult {
        event_count: payload.meta.event_count,
        unique_locations: stats.unique_locations,
        cache_hits: stats.cache_hits,
        network_calls: stats.network_calls,
        failed_locations: stats.failures,
        output_file: output.display().to_string(),
    })
}
