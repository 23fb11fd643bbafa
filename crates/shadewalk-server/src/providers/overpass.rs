//! Overpass building footprint provider.
//!
//! Fetches `way["building"]` elements inside a bounding box, assembles
//! closed rings from the node list, and derives a height in meters from
//! OSM tags. Results are cached per bounding box for a short TTL.

use reqwest::Client;
use serde::Deserialize;
use std::collections::HashMap;
use std::time::Duration;

use crate::cache::TtlCache;
use crate::config::Config;
use crate::error::ProviderError;
use crate::providers::response_error;
use shadewalk_core::models::{BoundingBox, Building, GeoPoint};

pub const DEFAULT_BUILDING_HEIGHT_M: f64 = 12.0;
pub const METERS_PER_LEVEL: f64 = 3.2;
pub const MIN_BUILDING_HEIGHT_M: f64 = 3.0;
pub const MAX_BUILDING_HEIGHT_M: f64 = 350.0;
const FEET_TO_METERS: f64 = 0.3048;

#[derive(Debug, Deserialize)]
struct OverpassResponse {
    #[serde(default)]
    elements: Vec<OverpassElement>,
}

#[derive(Debug, Deserialize)]
struct OverpassElement {
    #[serde(rename = "type")]
    kind: String,
    id: i64,
    #[serde(default)]
    lat: Option<f64>,
    #[serde(default)]
    lon: Option<f64>,
    #[serde(default)]
    nodes: Vec<i64>,
    #[serde(default)]
    tags: HashMap<String, String>,
}

/// Cache key for a bounding box, stable to 4 decimal places.
pub fn cache_key(bbox: &BoundingBox) -> String {
    format!(
        "{:.4},{:.4},{:.4},{:.4}",
        bbox.south, bbox.west, bbox.north, bbox.east
    )
}

/// Fetch building footprints inside `bbox`, consulting the TTL cache first.
pub async fn fetch_buildings(
    client: &Client,
    config: &Config,
    cache: &TtlCache<String, Vec<Building>>,
    bbox: &BoundingBox,
) -> Result<Vec<Building>, ProviderError> {
    let key = cache_key(bbox);
    if let Some(hit) = cache.get(&key) {
        return Ok(hit);
    }

    let query = format!(
        "[out:json][timeout:25];\n(\n  way[\"building\"]({:.6},{:.6},{:.6},{:.6});\n);\nout body;\n>;\nout skel qt;",
        bbox.south, bbox.west, bbox.north, bbox.east
    );

    let response = client
        .post(&config.overpass_url)
        .header("Content-Type", "text/plain")
        .body(query)
        .timeout(Duration::from_secs(config.overpass_timeout_s))
        .send()
        .await?;

    if !response.status().is_success() {
        return Err(response_error(response).await);
    }

    let payload: OverpassResponse = response.json().await?;
    let buildings = assemble_buildings(payload.elements);
    cache.insert(key, buildings.clone());
    Ok(buildings)
}

/// All well-formed buildings in the payload. Never truncates: shadow
/// evaluation must see every footprint, response-size caps belong to the
/// HTTP handlers.
fn assemble_buildings(elements: Vec<OverpassElement>) -> Vec<Building> {
    let mut node_positions: HashMap<i64, GeoPoint> = HashMap::new();
    for element in &elements {
        if element.kind == "node" {
            if let (Some(lat), Some(lon)) = (element.lat, element.lon) {
                node_positions.insert(element.id, GeoPoint::new(lat, lon));
            }
        }
    }

    let mut buildings = Vec::new();
    for element in &elements {
        if element.kind != "way" || element.nodes.is_empty() {
            continue;
        }
        let mut ring: Vec<GeoPoint> = element
            .nodes
            .iter()
            .filter_map(|id| node_positions.get(id).copied())
            .collect();
        if let (Some(first), Some(last)) = (ring.first().copied(), ring.last()) {
            if first.lat != last.lat || first.lng != last.lng {
                ring.push(first);
            }
        }
        if ring.len() < 4 {
            continue;
        }
        buildings.push(Building {
            ring,
            height_m: parse_building_height(&element.tags),
        });
    }
    buildings
}

/// Derive a height in meters from OSM tags. Prefers an explicit `height`
/// tag, falls back to `building:levels`, then a flat default. The result
/// is clamped to a plausible range.
pub fn parse_building_height(tags: &HashMap<String, String>) -> f64 {
    let height = tags
        .get("height")
        .and_then(|raw| parse_metric(raw))
        .or_else(|| {
            tags.get("building:levels")
                .and_then(|raw| raw.trim().parse::<f64>().ok())
                .map(|levels| levels * METERS_PER_LEVEL)
        })
        .unwrap_or(DEFAULT_BUILDING_HEIGHT_M);
    height.clamp(MIN_BUILDING_HEIGHT_M, MAX_BUILDING_HEIGHT_M)
}

/// Parse a tag value like "25", "25 m", "25,5" or "82 ft" into meters.
fn parse_metric(raw: &str) -> Option<f64> {
    let cleaned = raw.trim().to_lowercase().replace(',', ".");
    if let Some(feet) = cleaned.strip_suffix("ft") {
        return feet.trim().parse::<f64>().ok().map(|v| v * FEET_TO_METERS);
    }
    let cleaned = cleaned.strip_suffix('m').unwrap_or(&cleaned).trim();
    cleaned.parse::<f64>().ok()
}
