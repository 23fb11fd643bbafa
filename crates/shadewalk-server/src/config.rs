//! Server configuration from environment.

use std::env;

#[derive(Debug, Clone)]
pub struct Config {
    pub server_port: u16,
    /// Base URL of the OSRM-compatible walking route provider.
    pub osrm_url: String,
    /// Overpass API endpoint for building footprints.
    pub overpass_url: String,
    /// Nominatim endpoint for geocoding.
    pub nominatim_url: String,
    /// Per-call timeout for route and geocoding requests, seconds.
    pub request_timeout_s: u64,
    /// Per-call timeout for building-footprint requests, seconds.
    pub overpass_timeout_s: u64,
    /// Building cache time-to-live, seconds.
    pub building_cache_ttl_s: u64,
    /// Feature cap for the /buildings endpoint.
    pub max_building_features: usize,
    /// Comma-separated ISO country codes limiting geocode results; empty
    /// disables the filter.
    pub geocode_country_codes: String,
    pub user_agent: String,
}

impl Config {
    pub fn from_env() -> Self {
        Self {
            server_port: env::var("SHADEWALK_PORT")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(3000),
            osrm_url: env::var("SHADEWALK_OSRM_URL")
                .unwrap_or_else(|_| "https://router.project-osrm.org".to_string()),
            overpass_url: env::var("SHADEWALK_OVERPASS_URL")
                .unwrap_or_else(|_| "https://overpass-api.de/api/interpreter".to_string()),
            nominatim_url: env::var("SHADEWALK_NOMINATIM_URL")
                .unwrap_or_else(|_| "https://nominatim.openstreetmap.org".to_string()),
            request_timeout_s: env::var("SHADEWALK_REQUEST_TIMEOUT_S")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(15),
            overpass_timeout_s: env::var("SHADEWALK_OVERPASS_TIMEOUT_S")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(30),
            building_cache_ttl_s: env::var("SHADEWALK_BUILDING_CACHE_TTL_S")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(300),
            max_building_features: env::var("SHADEWALK_MAX_BUILDING_FEATURES")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(1600),
            geocode_country_codes: env::var("SHADEWALK_GEOCODE_COUNTRIES")
                .unwrap_or_else(|_| "ae".to_string()),
            user_agent: env::var("SHADEWALK_USER_AGENT")
                .unwrap_or_else(|_| "ShadewalkServer/0.2 (ops@shadewalk.local)".to_string()),
        }
    }
}
