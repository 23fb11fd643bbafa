//! REST API routes.

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use chrono::Utc;
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::info;

use crate::optimizer;
use crate::providers::{nominatim, overpass};
use crate::state::AppState;
use shadewalk_core::models::{BoundingBox, GeoPoint};

/// Widest bounding box span accepted by the buildings endpoint, degrees.
const MAX_BBOX_SPAN_DEG: f64 = 0.24;

/// Minimum lat/lng delta kept by ring simplification, degrees (~0.5 m).
const RING_SIMPLIFY_EPSILON_DEG: f64 = 0.000005;

/// Create the API router.
pub fn create_router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/optimize-route", post(optimize_route))
        .route("/api/buildings", get(get_buildings))
        .route("/api/geocode", get(geocode))
        .route("/api/reverse-geocode", get(reverse_geocode))
        .route("/health", get(health))
}

fn bad_request(message: &str) -> Response {
    (StatusCode::BAD_REQUEST, Json(json!({ "error": message }))).into_response()
}

fn bad_gateway(message: String) -> Response {
    (StatusCode::BAD_GATEWAY, Json(json!({ "error": message }))).into_response()
}

async fn health() -> impl IntoResponse {
    Json(json!({ "ok": true, "now": Utc::now() }))
}

/// POST /api/optimize-route
///
/// Body: `{from:{lat,lng}, to:{lat,lng}, autoPod?:bool}`. The body is taken
/// as a raw JSON value so missing or non-numeric coordinates answer 400
/// instead of a generic extractor rejection.
async fn optimize_route(State(state): State<Arc<AppState>>, Json(body): Json<Value>) -> Response {
    let (Some(from), Some(to)) = (normalize_point(&body["from"]), normalize_point(&body["to"]))
    else {
        return bad_request("Invalid coordinates. Expect {from:{lat,lng}, to:{lat,lng}}.");
    };
    let auto_pod = body["autoPod"].as_bool().unwrap_or(false);

    let now = Utc::now();
    match optimizer::optimize_route(&state, from, to, auto_pod, now).await {
        Ok(response) => {
            info!(
                best = %response.best_route.name,
                shade_ratio = response.summary.shade_ratio,
                "optimized route"
            );
            Json(response).into_response()
        }
        Err(err) => {
            (err.status(), Json(json!({ "error": err.to_string() }))).into_response()
        }
    }
}

fn normalize_point(value: &Value) -> Option<GeoPoint> {
    let lat = value.get("lat")?.as_f64()?;
    let lng = value.get("lng")?.as_f64()?;
    let point = GeoPoint::new(lat, lng);
    point.is_finite().then_some(point)
}

#[derive(Debug, Deserialize)]
struct BuildingsQuery {
    south: f64,
    west: f64,
    north: f64,
    east: f64,
}

/// GET /api/buildings?south&west&north&east
///
/// Answers a GeoJSON FeatureCollection of simplified building footprints
/// with a `height` property per feature.
async fn get_buildings(
    State(state): State<Arc<AppState>>,
    Query(query): Query<BuildingsQuery>,
) -> Response {
    let bbox = BoundingBox {
        south: query.south,
        west: query.west,
        north: query.north,
        east: query.east,
    };
    if ![bbox.south, bbox.west, bbox.north, bbox.east]
        .iter()
        .all(|v| v.is_finite())
    {
        return bad_request("Invalid bbox. Expect south,west,north,east query params.");
    }
    if bbox.south >= bbox.north || bbox.west >= bbox.east {
        return bad_request("Invalid bbox ordering.");
    }
    if bbox.lat_span() > MAX_BBOX_SPAN_DEG || bbox.lng_span() > MAX_BBOX_SPAN_DEG {
        return bad_request("BBox too large. Zoom in further.");
    }

    let buildings = match overpass::fetch_buildings(
        &state.client,
        &state.config,
        &state.building_cache,
        &bbox,
    )
    .await
    {
        Ok(buildings) => buildings,
        Err(err) => return bad_gateway(format!("Building fetch failed: {err}")),
    };

    let features: Vec<Value> = buildings
        .iter()
        .take(state.config.max_building_features)
        .enumerate()
        .map(|(index, building)| {
            let ring: Vec<[f64; 2]> = simplify_ring(&building.ring)
                .iter()
                .map(|point| [point.lng, point.lat])
                .collect();
            json!({
                "type": "Feature",
                "id": format!("b-{index}"),
                "properties": { "height": building.height_m },
                "geometry": {
                    "type": "Polygon",
                    "coordinates": [ring]
                }
            })
        })
        .collect();

    Json(json!({ "type": "FeatureCollection", "features": features })).into_response()
}

/// Drop ring vertices closer than [`RING_SIMPLIFY_EPSILON_DEG`] to their
/// predecessor on both axes, then re-close. Falls back to the original ring
/// when simplification would degenerate it.
fn simplify_ring(ring: &[GeoPoint]) -> Vec<GeoPoint> {
    if ring.len() < 4 {
        return ring.to_vec();
    }

    let mut reduced: Vec<GeoPoint> = Vec::with_capacity(ring.len());
    for &point in ring {
        match reduced.last() {
            None => reduced.push(point),
            Some(previous) => {
                if (point.lat - previous.lat).abs() > RING_SIMPLIFY_EPSILON_DEG
                    || (point.lng - previous.lng).abs() > RING_SIMPLIFY_EPSILON_DEG
                {
                    reduced.push(point);
                }
            }
        }
    }

    let first = reduced[0];
    if let Some(last) = reduced.last() {
        if last.lat != first.lat || last.lng != first.lng {
            reduced.push(first);
        }
    }

    if reduced.len() >= 4 {
        reduced
    } else {
        ring.to_vec()
    }
}

#[derive(Debug, Deserialize)]
struct GeocodeQuery {
    #[serde(default)]
    q: String,
}

/// GET /api/geocode?q=
async fn geocode(
    State(state): State<Arc<AppState>>,
    Query(query): Query<GeocodeQuery>,
) -> Response {
    let q = query.q.trim();
    if q.chars().count() < 3 {
        return bad_request("Query must be at least 3 characters.");
    }

    match nominatim::geocode(&state.client, &state.config, q).await {
        Ok(items) => Json(json!({ "items": items })).into_response(),
        Err(err) => bad_gateway(format!("Geocoding failed: {err}")),
    }
}

#[derive(Debug, Deserialize)]
struct ReverseGeocodeQuery {
    lat: f64,
    lng: f64,
}

/// GET /api/reverse-geocode?lat=&lng=
async fn reverse_geocode(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ReverseGeocodeQuery>,
) -> Response {
    if !query.lat.is_finite() || !query.lng.is_finite() {
        return bad_request("Invalid coordinates. Expect lat and lng query params.");
    }

    match nominatim::reverse_geocode(&state.client, &state.config, query.lat, query.lng).await {
        Ok(hit) => Json(hit).into_response(),
        Err(err) => bad_gateway(format!("Reverse geocoding failed: {err}")),
    }
}
