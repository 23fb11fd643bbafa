//! Route optimization orchestration: candidate fan-out, building fetch,
//! shade evaluation, ranking and response assembly.

use chrono::{DateTime, Utc};
use futures::future::join_all;
use serde::Serialize;
use tracing::{debug, warn};

use crate::error::OptimizeError;
use crate::providers::{osrm, overpass};
use crate::state::AppState;
use shadewalk_core::candidates::{detour_via_points, shortlist_candidates};
use shadewalk_core::dispatch::{simulate_pod_dispatch, PodDispatch};
use shadewalk_core::evaluate::{evaluate_route_shade, EvaluatedRoute};
use shadewalk_core::models::{BoundingBox, GeoPoint, SegmentGroup};
use shadewalk_core::score::score_and_rank;
use shadewalk_core::shadow::project_buildings;
use shadewalk_core::Projection;

/// Average walking pace used for duration estimates, m/s.
pub const WALKING_SPEED_MPS: f64 = 1.32;

/// Minimum sun-exposed remainder before a pod is dispatched, meters.
const POD_DISPATCH_MIN_REMAINING_M: f64 = 500.0;

/// Padding applied around the candidate routes' bounding box before the
/// building query, degrees.
const BBOX_PADDING_DEG: f64 = 0.0025;

/// Alternatives reported back to the client.
const MAX_REPORTED_ALTERNATIVES: usize = 5;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OptimizeResponse {
    pub generated_at: DateTime<Utc>,
    pub sun: SunReport,
    pub summary: RouteSummary,
    pub best_route: BestRoute,
    pub alternatives: Vec<AlternativeRoute>,
    pub pod_dispatch: Option<PodDispatch>,
    pub warnings: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SunReport {
    pub altitude_deg: f64,
    pub azimuth_deg: f64,
    pub is_daylight: bool,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RouteSummary {
    pub distance_meters: i64,
    pub duration_minutes: i64,
    pub shaded_meters: i64,
    pub sunny_meters: i64,
    /// Percentage with one decimal place.
    pub shade_ratio: f64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BestRoute {
    pub name: String,
    /// `[lat, lng]` vertex pairs.
    pub geometry: Vec<[f64; 2]>,
    pub segment_groups: Vec<WireSegmentGroup>,
    pub shadow_end: Option<WireShadowEnd>,
}

#[derive(Debug, Clone, Serialize)]
pub struct WireSegmentGroup {
    pub shaded: bool,
    pub points: Vec<[f64; 2]>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WireShadowEnd {
    pub point: [f64; 2],
    pub remaining_meters: i64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AlternativeRoute {
    pub name: String,
    pub distance_meters: i64,
    pub duration_minutes: i64,
    /// Percentage with one decimal place.
    pub shade_ratio: f64,
    pub score: f64,
}

/// Run the full optimization pipeline for one from/to pair.
pub async fn optimize_route(
    state: &AppState,
    from: GeoPoint,
    to: GeoPoint,
    auto_pod: bool,
    now: DateTime<Utc>,
) -> Result<OptimizeResponse, OptimizeError> {
    if !from.is_finite() || !to.is_finite() {
        return Err(OptimizeError::Validation(
            "Invalid coordinates. Expect {from:{lat,lng}, to:{lat,lng}}.".to_string(),
        ));
    }

    let candidates = build_route_candidates(state, from, to).await?;
    if candidates.is_empty() {
        return Err(OptimizeError::NoRoutes);
    }
    debug!(count = candidates.len(), "shortlisted route candidates");

    let bbox = BoundingBox::around_routes(&candidates)
        .ok_or(OptimizeError::NoRoutes)?
        .expanded(BBOX_PADDING_DEG);

    let mut warnings = Vec::new();
    let buildings = match overpass::fetch_buildings(
        &state.client,
        &state.config,
        &state.building_cache,
        &bbox,
    )
    .await
    {
        Ok(buildings) => buildings,
        Err(err) => {
            warn!(error = %err, "building fetch failed, evaluating without shadows");
            warnings.push(format!(
                "Building shadow data unavailable ({err}). Using route-only fallback."
            ));
            Vec::new()
        }
    };

    let projection = Projection::for_bbox(&bbox);
    let projected = project_buildings(&buildings, &projection);

    let mut evaluated: Vec<EvaluatedRoute> = candidates
        .iter()
        .map(|route| evaluate_route_shade(route, &projected, &projection, now))
        .collect();
    score_and_rank(&mut evaluated);

    let gate = pod_gate(&evaluated[0], auto_pod);
    let pod_dispatch = if gate.dispatch {
        Some(simulate_pod_dispatch(gate.pickup, to, gate.remaining_m, now))
    } else {
        None
    };

    Ok(assemble_response(now, &evaluated, gate.remaining_m, pod_dispatch, warnings))
}

/// Direct routes with alternatives plus lateral detours through via points.
/// Detour failures are dropped; a direct failure fails the request.
async fn build_route_candidates(
    state: &AppState,
    from: GeoPoint,
    to: GeoPoint,
) -> Result<Vec<shadewalk_core::models::RawRoute>, OptimizeError> {
    let direct = osrm::fetch_routes(&state.client, &state.config, &[from, to], true)
        .await
        .map_err(|err| OptimizeError::RouteProvider(err.to_string()))?;
    if direct.is_empty() {
        return Ok(Vec::new());
    }

    let mut collected = direct;

    let detour_requests = detour_via_points(from, to).into_iter().map(|via| {
        let client = &state.client;
        let config = &state.config;
        async move { osrm::fetch_routes(client, config, &[from, via, to], false).await }
    });
    for outcome in join_all(detour_requests).await {
        match outcome {
            Ok(routes) => {
                if let Some(route) = routes.into_iter().next() {
                    collected.push(route);
                }
            }
            Err(err) => debug!(error = %err, "detour request failed"),
        }
    }

    Ok(shortlist_candidates(collected))
}

/// The pod decision for the winning route.
#[derive(Debug, Clone, Copy)]
struct PodGate {
    /// Sun-exposed distance left after the cool path ends; the whole route
    /// when it never starts shaded.
    remaining_m: f64,
    /// Shadow exit point, or the route start when there is no cool path.
    pickup: GeoPoint,
    dispatch: bool,
}

fn pod_gate(best: &EvaluatedRoute, auto_pod: bool) -> PodGate {
    let remaining_m = best
        .shadow_end
        .as_ref()
        .map(|end| (best.route.distance_m - end.distance_along_m).max(0.0))
        .unwrap_or(best.route.distance_m);
    let pickup = best
        .shadow_end
        .as_ref()
        .map(|end| end.point)
        .unwrap_or(best.route.geometry[0]);

    PodGate {
        remaining_m,
        pickup,
        dispatch: auto_pod && remaining_m >= POD_DISPATCH_MIN_REMAINING_M,
    }
}

fn assemble_response(
    now: DateTime<Utc>,
    evaluated: &[EvaluatedRoute],
    remaining_m: f64,
    pod_dispatch: Option<PodDispatch>,
    warnings: Vec<String>,
) -> OptimizeResponse {
    let best = &evaluated[0];

    OptimizeResponse {
        generated_at: now,
        sun: SunReport {
            altitude_deg: round_to(best.sun.altitude_deg, 2),
            azimuth_deg: round_to(best.sun.azimuth_deg, 2),
            is_daylight: best.sun.altitude_deg > 0.0,
        },
        summary: RouteSummary {
            distance_meters: best.route.distance_m.round() as i64,
            duration_minutes: walking_duration_minutes(best.route.distance_m),
            shaded_meters: best.shaded_distance_m.round() as i64,
            sunny_meters: (best.route.distance_m - best.shaded_distance_m).round() as i64,
            shade_ratio: round_to(best.shade_ratio * 100.0, 1),
        },
        best_route: BestRoute {
            name: best.route.name.clone(),
            geometry: best.route.geometry.iter().map(GeoPoint::as_pair).collect(),
            segment_groups: best.segment_groups.iter().map(wire_group).collect(),
            shadow_end: best.shadow_end.as_ref().map(|end| WireShadowEnd {
                point: end.point.as_pair(),
                remaining_meters: remaining_m.round() as i64,
            }),
        },
        alternatives: evaluated
            .iter()
            .take(MAX_REPORTED_ALTERNATIVES)
            .map(|route| AlternativeRoute {
                name: route.route.name.clone(),
                distance_meters: route.route.distance_m.round() as i64,
                duration_minutes: walking_duration_minutes(route.route.distance_m),
                shade_ratio: round_to(route.shade_ratio * 100.0, 1),
                score: round_to(route.score, 3),
            })
            .collect(),
        pod_dispatch,
        warnings,
    }
}

fn wire_group(group: &SegmentGroup) -> WireSegmentGroup {
    WireSegmentGroup {
        shaded: group.shaded,
        points: group.points.iter().map(GeoPoint::as_pair).collect(),
    }
}

pub fn walking_duration_minutes(distance_m: f64) -> i64 {
    (distance_m / WALKING_SPEED_MPS / 60.0).round() as i64
}

fn round_to(value: f64, decimals: u32) -> f64 {
    let factor = 10f64.powi(decimals as i32);
    (value * factor).round() / factor
}

#[cfg(test)]
mod tests {
    use super::*;
    use shadewalk_core::evaluate::SunSnapshot;
    use shadewalk_core::models::{RawRoute, ShadowEnd};

    fn evaluated(name: &str, distance_m: f64, shade_ratio: f64) -> EvaluatedRoute {
        let geometry = vec![GeoPoint::new(25.20, 55.27), GeoPoint::new(25.21, 55.27)];
        EvaluatedRoute {
            route: RawRoute {
                name: name.to_string(),
                distance_m,
                duration_s: distance_m / WALKING_SPEED_MPS,
                geometry,
            },
            sun: SunSnapshot {
                altitude_deg: 61.234,
                azimuth_deg: 181.567,
            },
            shaded_distance_m: distance_m * shade_ratio,
            shade_ratio,
            segment_groups: Vec::new(),
            shadow_end: None,
            score: shade_ratio,
        }
    }

    #[test]
    fn summary_rounds_the_way_the_wire_expects() {
        let routes = vec![evaluated("Primary", 1434.6, 0.4215)];
        let response = assemble_response(Utc::now(), &routes, 1434.6, None, Vec::new());

        assert_eq!(response.summary.distance_meters, 1435);
        assert_eq!(response.summary.duration_minutes, 18);
        assert_eq!(response.summary.shade_ratio, 42.2);
        assert_eq!(response.sun.altitude_deg, 61.23);
        assert!(response.sun.is_daylight);
        assert!(response.best_route.shadow_end.is_none());
    }

    #[test]
    fn shadow_end_carries_rounded_remaining_meters() {
        let mut routes = vec![evaluated("Primary", 2000.0, 0.3)];
        routes[0].shadow_end = Some(ShadowEnd {
            point: GeoPoint::new(25.205, 55.27),
            distance_along_m: 600.0,
        });
        let remaining = 1400.4;
        let response = assemble_response(Utc::now(), &routes, remaining, None, Vec::new());
        let end = response.best_route.shadow_end.unwrap();
        assert_eq!(end.remaining_meters, 1400);
        assert_eq!(end.point, [25.205, 55.27]);
    }

    #[test]
    fn pod_dispatches_when_sun_exposed_remainder_is_long_enough() {
        // 1000 m route whose cool path ends at 400 m: 600 m left in the sun.
        let mut best = evaluated("Primary", 1000.0, 0.4);
        best.shadow_end = Some(ShadowEnd {
            point: GeoPoint::new(25.204, 55.27),
            distance_along_m: 400.0,
        });

        let gate = pod_gate(&best, true);
        assert!(gate.dispatch);
        assert_eq!(gate.remaining_m, 600.0);
        assert_eq!(gate.pickup, GeoPoint::new(25.204, 55.27));
    }

    #[test]
    fn pod_stays_home_below_the_distance_gate_or_without_opt_in() {
        let mut best = evaluated("Primary", 1000.0, 0.6);
        best.shadow_end = Some(ShadowEnd {
            point: GeoPoint::new(25.206, 55.27),
            distance_along_m: 600.0,
        });

        // 400 m remaining is under the 500 m gate.
        assert!(!pod_gate(&best, true).dispatch);

        // Long remainder but the rider never opted in.
        best.shadow_end = None;
        let gate = pod_gate(&best, false);
        assert!(!gate.dispatch);
        assert_eq!(gate.remaining_m, 1000.0);
    }

    #[test]
    fn sunny_start_dispatches_from_the_route_start() {
        // No cool path at all: pickup falls back to the first vertex and the
        // whole distance counts as exposed.
        let best = evaluated("Primary", 900.0, 0.0);
        let gate = pod_gate(&best, true);
        assert!(gate.dispatch);
        assert_eq!(gate.remaining_m, 900.0);
        assert_eq!(gate.pickup, best.route.geometry[0]);
    }

    #[test]
    fn alternatives_are_capped_at_five() {
        let routes: Vec<EvaluatedRoute> = (0..7)
            .map(|i| evaluated(&format!("Candidate {i}"), 1000.0 + i as f64, 0.5))
            .collect();
        let response = assemble_response(Utc::now(), &routes, 1000.0, None, Vec::new());
        assert_eq!(response.alternatives.len(), 5);
    }

    #[test]
    fn walking_duration_uses_fixed_pace() {
        // 1 km at 1.32 m/s is about 12.6 minutes.
        assert_eq!(walking_duration_minutes(1000.0), 13);
        assert_eq!(walking_duration_minutes(0.0), 0);
    }
}
