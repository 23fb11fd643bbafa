//! Nominatim geocoding provider.

use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::config::Config;
use crate::error::ProviderError;
use crate::providers::response_error;

#[derive(Debug, Deserialize)]
struct NominatimPlace {
    display_name: Option<String>,
    lat: Option<String>,
    lon: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct GeocodeHit {
    pub label: String,
    pub lat: f64,
    pub lng: f64,
}

/// Forward geocoding. The caller validates that `query` has at least
/// 3 characters. Results with unparseable coordinates are dropped.
pub async fn geocode(
    client: &Client,
    config: &Config,
    query: &str,
) -> Result<Vec<GeocodeHit>, ProviderError> {
    let mut request = client
        .get(format!("{}/search", config.nominatim_url.trim_end_matches('/')))
        .query(&[
            ("q", query),
            ("format", "jsonv2"),
            ("limit", "5"),
            ("addressdetails", "1"),
        ])
        .header("Accept-Language", "en")
        .timeout(Duration::from_secs(config.request_timeout_s));
    if !config.geocode_country_codes.is_empty() {
        request = request.query(&[("countrycodes", config.geocode_country_codes.as_str())]);
    }

    let response = request.send().await?;
    if !response.status().is_success() {
        return Err(response_error(response).await);
    }

    let places: Vec<NominatimPlace> = response.json().await?;
    Ok(places.into_iter().filter_map(place_to_hit).collect())
}

/// Reverse geocoding at street-level zoom. Falls back to a coordinate
/// label when the response carries no display name.
pub async fn reverse_geocode(
    client: &Client,
    config: &Config,
    lat: f64,
    lng: f64,
) -> Result<GeocodeHit, ProviderError> {
    let response = client
        .get(format!("{}/reverse", config.nominatim_url.trim_end_matches('/')))
        .query(&[
            ("lat", lat.to_string().as_str()),
            ("lon", lng.to_string().as_str()),
            ("format", "jsonv2"),
            ("zoom", "18"),
            ("addressdetails", "1"),
            ("accept-language", "en"),
        ])
        .header("Accept-Language", "en")
        .timeout(Duration::from_secs(config.request_timeout_s))
        .send()
        .await?;
    if !response.status().is_success() {
        return Err(response_error(response).await);
    }

    let place: NominatimPlace = response.json().await?;
    Ok(GeocodeHit {
        label: place
            .display_name
            .unwrap_or_else(|| format!("{:.6}, {:.6}", lat, lng)),
        lat: place.lat.and_then(|v| v.parse().ok()).unwrap_or(lat),
        lng: place.lon.and_then(|v| v.parse().ok()).unwrap_or(lng),
    })
}

fn place_to_hit(place: NominatimPlace) -> Option<GeocodeHit> {
    let lat: f64 = place.lat?.parse().ok()?;
    let lng: f64 = place.lon?.parse().ok()?;
    if !lat.is_finite() || !lng.is_finite() {
        return None;
    }
    Some(GeocodeHit {
        label: place.display_name.unwrap_or_default(),
        lat,
        lng,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn drops_places_with_bad_coordinates() {
        let places: Vec<NominatimPlace> = serde_json::from_str(
            r#"[
                {"display_name": "Dubai Mall", "lat": "25.1972", "lon": "55.2797"},
                {"display_name": "Nowhere", "lat": "not-a-number", "lon": "55.0"}
            ]"#,
        )
        .unwrap();
        let hits: Vec<GeocodeHit> = places.into_iter().filter_map(place_to_hit).collect();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].label, "Dubai Mall");
        assert!((hits[0].lat - 25.1972).abs() < 1e-9);
    }
}
