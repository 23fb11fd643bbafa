//! OSRM-compatible walking route provider.

use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;

use crate::config::Config;
use crate::error::ProviderError;
use crate::providers::response_error;
use shadewalk_core::models::{GeoPoint, RawRoute};

#[derive(Debug, Deserialize)]
struct OsrmResponse {
    #[serde(default)]
    routes: Vec<OsrmRoute>,
}

#[derive(Debug, Deserialize)]
struct OsrmRoute {
    distance: f64,
    duration: f64,
    geometry: OsrmGeometry,
}

#[derive(Debug, Deserialize)]
struct OsrmGeometry {
    /// GeoJSON LineString coordinates, [lng, lat] order.
    #[serde(default)]
    coordinates: Vec<[f64; 2]>,
}

/// Fetch walking routes through the given waypoints. Routes with fewer than
/// 2 geometry vertices are dropped. No retries.
pub async fn fetch_routes(
    client: &Client,
    config: &Config,
    waypoints: &[GeoPoint],
    alternatives: bool,
) -> Result<Vec<RawRoute>, ProviderError> {
    let coords = waypoints
        .iter()
        .map(|point| format!("{},{}", point.lng, point.lat))
        .collect::<Vec<_>>()
        .join(";");
    let url = format!(
        "{}/route/v1/foot/{}?overview=full&geometries=geojson&steps=false&alternatives={}",
        config.osrm_url.trim_end_matches('/'),
        coords,
        alternatives
    );

    let response = client
        .get(url)
        .timeout(Duration::from_secs(config.request_timeout_s))
        .send()
        .await?;

    if !response.status().is_success() {
        return Err(response_error(response).await);
    }

    let payload: OsrmResponse = response.json().await?;

    Ok(payload
        .routes
        .into_iter()
        .filter(|route| route.geometry.coordinates.len() >= 2)
        .map(|route| RawRoute {
            name: String::new(),
            distance_m: route.distance,
            duration_s: route.duration,
            geometry: route
                .geometry
                .coordinates
                .iter()
                .map(|&[lng, lat]| GeoPoint::new(lat, lng))
                .collect(),
        })
        .collect())
}
