use crate::constants;
use std::env;

/// Runtime configuration, sourced from the environment. Every knob has a
/// default that matches the expected repo layout, so the default workflow
/// needs no flags.
#[derive(Debug, Clone)]
pub struct Config {
    /// Path of the input workbook (`EXCEL_PATH`).
    pub excel_path: String,
    /// Directory the feed is written into (`OUT_DIR`).
    pub out_dir: String,
    /// Path of the persistent geocode cache (`GEOCODE_CACHE_PATH`).
    pub cache_path: String,
    /// Identifying User-Agent required by the geocoding provider
    /// (`NOMINATIM_USER_AGENT`).
    pub user_agent: String,
    /// Search endpoint (`NOMINATIM_URL`); overridable for tests.
    pub nominatim_url: String,
}

impl Config {
    pub fn from_env() -> Self {
        let var = |name: &str, default: &str| env::var(name).unwrap_or_else(|_| default.to_string());
        Self {
            excel_path: var("EXCEL_PATH", constants::DEFAULT_EXCEL_PATH),
            out_dir: var("OUT_DIR", constants::DEFAULT_OUT_DIR),
            cache_path: var("GEOCODE_CACHE_PATH", constants::DEFAULT_CACHE_PATH),
            user_agent: var("NOMINATIM_USER_AGENT", constants::DEFAULT_USER_AGENT),
            nominatim_url: var("NOMINATIM_URL", constants::DEFAULT_NOMINATIM_URL),
        }
    }
}
