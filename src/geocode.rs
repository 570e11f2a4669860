//! Location resolution: distinct location keys to coordinates, via the
//! cache first and a rate-limited Nominatim lookup second.

use crate::cache::{CacheEntry, GeocodeCache};
use crate::constants::{COUNTRY_BIAS, GEOCODE_MIN_INTERVAL_MS, GEOCODE_TIMEOUT_SECS};
use crate::error::Result;
use crate::types::EventRecord;
use async_trait::async_trait;
use serde::Deserialize;
use std::collections::{HashMap, HashSet};
use std::time::Duration;
use tokio::time::{sleep_until, Instant};
use tracing::{debug, info, warn};

/// A resolved coordinate pair plus the provider's display name.
#[derive(Debug, Clone, PartialEq)]
pub struct GeocodeHit {
    pub lat: f64,
    pub lon: f64,
    pub display_name: String,
}

/// Address-to-coordinate lookup port. The production implementation talks
/// to Nominatim; tests substitute a stub.
#[async_trait]
pub trait Geocoder: Send + Sync {
    /// Look up a free-text query. `Ok(None)` means the service answered
    /// but found nothing.
    async fn search(&self, query: &str) -> Result<Option<GeocodeHit>>;
}

#[derive(Debug, Deserialize)]
struct NominatimPlace {
    lat: String,
    lon: String,
    #[serde(default)]
    display_name: String,
}

/// Nominatim search client. The identifying User-Agent is required by the
/// provider's usage policy.
pub struct NominatimClient {
    client: reqwest::Client,
    url: String,
    user_agent: String,
}

impl NominatimClient {
    pub fn new(url: impl Into<String>, user_agent: impl Into<String>) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(GEOCODE_TIMEOUT_SECS))
            .build()?;
        Ok(Self {
            client,
            url: url.into(),
            user_agent: user_agent.into(),
        })
    }
}

#[async_trait]
impl Geocoder for NominatimClient {
    async fn search(&self, query: &str) -> Result<Option<GeocodeHit>> {
        let response = self
            .client
            .get(&self.url)
            .query(&[
                ("q", query),
                ("format", "jsonv2"),
                ("limit", "1"),
                ("addressdetails", "0"),
            ])
            .header(reqwest::header::USER_AGENT, self.user_agent.as_str())
            .send()
            .await?
            .error_for_status()?;

        let places: Vec<NominatimPlace> = response.json().await?;
        let Some(top) = places.into_iter().next() else {
            return Ok(None);
        };
        let (Ok(lat), Ok(lon)) = (top.lat.parse::<f64>(), top.lon.parse::<f64>()) else {
            warn!("Nominatim returned non-numeric coordinates for {:?}", query);
            return Ok(None);
        };
        Ok(Some(GeocodeHit {
            lat,
            lon,
            display_name: top.display_name,
        }))
    }
}

/// Minimum-interval gate between successive external calls, so the run
/// stays under the provider's one-request-per-second ceiling. Built on
/// tokio time so tests can drive it with a paused clock.
pub struct MinIntervalGate {
    interval: Duration,
    earliest_next: Option<Instant>,
}

impl MinIntervalGate {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            earliest_next: None,
        }
    }

    /// Wait until the next external call is allowed.
    pub async fn wait(&mut self) {
        if let Some(at) = self.earliest_next {
            sleep_until(at).await;
        }
    }

    /// Record that a call was just made; the next one must wait out the
    /// full interval from now.
    pub fn note_call(&mut self) {
        self.earliest_next = Some(Instant::now() + self.interval);
    }
}

/// Counters from one resolution pass, reported by the CLI.
#[derive(Debug, Default, PartialEq)]
pub struct ResolveStats {
    pub unique_locations: usize,
    pub cache_hits: usize,
    pub network_calls: usize,
    pub failures: usize,
}

/// Resolve coordinates for every distinct location key and write them back
/// onto each record sharing that key.
///
/// A cache entry is authoritative, including a stored failure: any hit
/// short-circuits the network entirely. Cold keys get a query biased to
/// the configured jurisdiction, then one retry with the raw string; a
/// total miss is cached as null so the key is never retried. Records that
/// arrived with their own coordinate columns keep them.
pub async fn resolve_locations(
    events: &mut [EventRecord],
    cache: &mut GeocodeCache,
    geocoder: &dyn Geocoder,
) -> ResolveStats {
    let mut gate = MinIntervalGate::new(Duration::from_millis(GEOCODE_MIN_INTERVAL_MS));
    let mut stats = ResolveStats::default();

    stats.unique_locations = events
        .iter()
        .map(|e| e.location_key.as_str())
        .collect::<HashSet<_>>()
        .len();

    // Keys still needing coordinates, in first-seen order, with one
    // representative display string each.
    let mut pending: Vec<(String, String)> = Vec::new();
    let mut seen = HashSet::new();
    for event in events.iter() {
        if event.lat.is_some() && event.lon.is_some() {
            continue;
        }
        if seen.insert(event.location_key.clone()) {
            pending.push((event.location_key.clone(), event.location.clone()));
        }
    }

    let mut resolved: HashMap<String, (Option<f64>, Option<f64>)> = HashMap::new();
    for (key, location) in &pending {
        let coords = if let Some(entry) = cache.get(key) {
            stats.cache_hits += 1;
            debug!("Cache hit for {:?}", key);
            entry.coords()
        } else {
            let hit = lookup_with_fallback(geocoder, &mut gate, &mut stats, location).await;
            let entry = match &hit {
                Some(hit) => CacheEntry::hit(hit.lat, hit.lon, hit.display_name.clone()),
                None => {
                    stats.failures += 1;
                    warn!("No geocode result for {:?}; caching the miss", location);
                    CacheEntry::miss()
                }
            };
            let coords = entry.coords();
            cache.put(key, entry);
            // Persist incrementally so a crash keeps completed lookups.
            if let Err(e) = cache.persist() {
                warn!("Failed to persist geocode cache: {}", e);
            }
            coords
        };
        resolved.insert(key.clone(), coords);
    }

    for event in events.iter_mut() {
        if event.lat.is_some() && event.lon.is_some() {
            continue;
        }
        if let Some((lat, lon)) = resolved.get(&event.location_key) {
            event.lat = *lat;
            event.lon = *lon;
        }
    }

    stats
}

async fn lookup_with_fallback(
    geocoder: &dyn Geocoder,
    gate: &mut MinIntervalGate,
    stats: &mut ResolveStats,
    location: &str,
) -> Option<GeocodeHit> {
    let biased = format!("{location}, {COUNTRY_BIAS}");
    for query in [biased.as_str(), location] {
        gate.wait().await;
        let outcome = geocoder.search(query).await;
        gate.note_call();
        stats.network_calls += 1;
        match outcome {
            Ok(Some(hit)) => {
                info!("Resolved {:?} via {:?}", location, query);
                return Some(hit);
            }
            Ok(None) => debug!("No result for {:?}", query),
            // Transport and payload errors count as "no result"; they
            // must never abort the run.
            Err(e) => warn!("Geocode request failed for {:?}: {}", query, e),
        }
    }
    None
}
