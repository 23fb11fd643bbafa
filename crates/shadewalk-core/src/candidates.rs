//! Pure half of candidate route generation: detour via points, geometry
//! deduplication, distance filtering and naming. The provider fan-out lives
//! with the network code in the server.

use crate::models::{GeoPoint, RawRoute};
use crate::spatial::{bearing_degrees, destination_point, normalize_bearing};

/// Lateral detour offsets from the direct line's midpoint, meters. Sign
/// selects the side of the direct bearing.
pub const DETOUR_OFFSETS_M: [f64; 6] = [120.0, -120.0, 220.0, -220.0, 320.0, -320.0];

/// A route may exceed the shortest candidate by at most this factor; anything
/// longer trades too much walking for shade.
const MAX_DETOUR_FACTOR: f64 = 1.65;

/// Quantized points used for the geometry hash.
const HASH_TARGET_POINTS: usize = 25;

/// Via points for lateral detour candidates, perpendicular to the direct
/// from→to bearing at its midpoint.
pub fn detour_via_points(from: GeoPoint, to: GeoPoint) -> Vec<GeoPoint> {
    let bearing = bearing_degrees(from, to);
    let midpoint = GeoPoint::new((from.lat + to.lat) / 2.0, (from.lng + to.lng) / 2.0);

    DETOUR_OFFSETS_M
        .iter()
        .map(|&offset| {
            let side = if offset >= 0.0 { 90.0 } else { -90.0 };
            let perpendicular = normalize_bearing(bearing + side);
            destination_point(midpoint, perpendicular, offset.abs())
        })
        .collect()
}

/// Shortlist collected routes: dedupe by geometry hash, drop candidates more
/// than [`MAX_DETOUR_FACTOR`] times the shortest, and name the survivors
/// ("Primary", then "Candidate N") in discovery order.
pub fn shortlist_candidates(collected: Vec<RawRoute>) -> Vec<RawRoute> {
    let shortest = collected
        .iter()
        .map(|route| route.distance_m)
        .fold(f64::INFINITY, f64::min);

    let mut seen = std::collections::HashSet::new();
    let mut shortlisted = Vec::new();

    for route in collected {
        if !seen.insert(route_hash(&route.geometry)) {
            continue;
        }
        if route.distance_m > shortest * MAX_DETOUR_FACTOR {
            continue;
        }
        shortlisted.push(route);
    }

    for (index, route) in shortlisted.iter_mut().enumerate() {
        route.name = if index == 0 {
            "Primary".to_string()
        } else {
            format!("Candidate {index}")
        };
    }

    shortlisted
}

/// Geometry hash for deduplication: ~25 evenly strided vertices plus the
/// final vertex, quantized to 4 decimal degrees (~11 m).
fn route_hash(geometry: &[GeoPoint]) -> String {
    let stride = (geometry.len() / HASH_TARGET_POINTS).max(1);
    let mut parts = Vec::with_capacity(HASH_TARGET_POINTS + 1);

    for point in geometry.iter().step_by(stride) {
        parts.push(format!("{:.4},{:.4}", point.lat, point.lng));
    }
    if let Some(end) = geometry.last() {
        parts.push(format!("{:.4},{:.4}", end.lat, end.lng));
    }

    parts.join("|")
}
