//! Per-route shade evaluation: sun position, sample classification, shaded
//! distance, renderable segment groups and the cool-path end.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::models::{RawRoute, SegmentGroup, ShadowEnd};
use crate::projection::Projection;
use crate::sampler::{sample_route, RouteSample};
use crate::shadow::{is_point_shaded, with_shadow_lengths, ProjectedBuilding};
use crate::solar::sun_position;
use crate::spatial::{bearing_unit_vector, normalize_bearing};

/// Sampling interval along a route.
const SAMPLE_STEP_M: f64 = 12.0;
/// A walker tolerates this much continuous sun before the leading shaded
/// stretch is considered over. Pod dispatch gating depends on this value.
const SUNNY_BREAK_LIMIT_M: f64 = 50.0;

/// Sun state at the route midpoint when the route was evaluated.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct SunSnapshot {
    pub altitude_deg: f64,
    pub azimuth_deg: f64,
}

/// A route plus its shade metrics. `score` is filled in by
/// [`crate::score::score_and_rank`].
#[derive(Debug, Clone)]
pub struct EvaluatedRoute {
    pub route: RawRoute,
    pub sun: SunSnapshot,
    pub shaded_distance_m: f64,
    pub shade_ratio: f64,
    pub segment_groups: Vec<SegmentGroup>,
    pub shadow_end: Option<ShadowEnd>,
    pub score: f64,
}

/// Evaluate one route against a shared set of projected buildings.
///
/// Pure: same route, buildings and timestamp always produce the same result,
/// so candidates can be evaluated in any order or in parallel.
pub fn evaluate_route_shade(
    route: &RawRoute,
    buildings: &[ProjectedBuilding],
    projection: &Projection,
    now: DateTime<Utc>,
) -> EvaluatedRoute {
    // Sun position is taken at the route midpoint. Empty geometry cannot
    // anchor one; answer the zeroed result instead of indexing.
    let Some(&sun_ref) = route.geometry.get(route.geometry.len() / 2) else {
        return EvaluatedRoute {
            route: route.clone(),
            sun: SunSnapshot {
                altitude_deg: 0.0,
                azimuth_deg: 0.0,
            },
            shaded_distance_m: 0.0,
            shade_ratio: 0.0,
            segment_groups: Vec::new(),
            shadow_end: None,
            score: 0.0,
        };
    };
    let position = sun_position(now, sun_ref.lat, sun_ref.lng);
    let altitude_deg = position.altitude_rad.to_degrees();
    // Re-base the south-zero astronomical azimuth to a compass bearing.
    let azimuth_deg = normalize_bearing(position.azimuth_rad.to_degrees() + 180.0);
    let sun = SunSnapshot {
        altitude_deg,
        azimuth_deg,
    };

    let mut samples = sample_route(&route.geometry, projection, SAMPLE_STEP_M);
    if samples.is_empty() {
        return EvaluatedRoute {
            route: route.clone(),
            sun,
            shaded_distance_m: 0.0,
            shade_ratio: 0.0,
            segment_groups: Vec::new(),
            shadow_end: None,
            score: 0.0,
        };
    }

    // Sun below the horizon: no direct sunlight to avoid, so the whole route
    // counts as shaded and no geometry is tested. Deliberate simplification.
    if altitude_deg <= 0.0 {
        let shadow_end = samples.last().map(|sample| ShadowEnd {
            point: sample.lat_lng,
            distance_along_m: route.distance_m,
        });
        return EvaluatedRoute {
            route: route.clone(),
            sun,
            shaded_distance_m: route.distance_m,
            shade_ratio: 1.0,
            segment_groups: build_segment_groups(&samples, true),
            shadow_end,
            score: 0.0,
        };
    }

    let shadowed = with_shadow_lengths(buildings, position.altitude_rad.tan());
    let toward_sun = bearing_unit_vector(azimuth_deg);
    for sample in &mut samples {
        sample.shaded = is_point_shaded(sample.xy, &shadowed, toward_sun);
    }

    // Conservative: only segments with both endpoints shaded count. A segment
    // straddling a shadow boundary is treated as unshaded.
    let mut shaded_distance = 0.0;
    for pair in samples.windows(2) {
        if pair[0].shaded && pair[1].shaded {
            shaded_distance += pair[1].distance_along_m - pair[0].distance_along_m;
        }
    }

    let segment_groups = build_segment_groups(&samples, false);
    let shadow_end = cool_path_end(&samples).map(|sample| ShadowEnd {
        point: sample.lat_lng,
        distance_along_m: sample.distance_along_m,
    });

    EvaluatedRoute {
        route: route.clone(),
        sun,
        shaded_distance_m: shaded_distance,
        shade_ratio: shaded_distance / route.distance_m.max(1.0),
        segment_groups,
        shadow_end,
        score: 0.0,
    }
}

/// Merge consecutive samples with the same both-endpoints-shaded
/// classification into runs for rendering.
fn build_segment_groups(samples: &[RouteSample], force_shaded: bool) -> Vec<SegmentGroup> {
    if samples.len() < 2 {
        return Vec::new();
    }

    let mut groups: Vec<SegmentGroup> = Vec::new();

    for pair in samples.windows(2) {
        let shaded = force_shaded || (pair[0].shaded && pair[1].shaded);

        match groups.last_mut() {
            Some(active) if active.shaded == shaded => active.points.push(pair[1].lat_lng),
            _ => groups.push(SegmentGroup {
                shaded,
                points: vec![pair[0].lat_lng, pair[1].lat_lng],
            }),
        }
    }

    groups
}

/// Last sample of the leading shaded stretch, tolerating sunny breaks shorter
/// than [`SUNNY_BREAK_LIMIT_M`]. `None` when the route starts unshaded.
fn cool_path_end(samples: &[RouteSample]) -> Option<&RouteSample> {
    let first = samples.first()?;
    if !first.shaded {
        return None;
    }

    let mut best = 0;
    let mut sunny_break = 0.0;

    for i in 1..samples.len() {
        if samples[i - 1].shaded && samples[i].shaded {
            best = i;
            sunny_break = 0.0;
            continue;
        }

        sunny_break += samples[i].distance_along_m - samples[i - 1].distance_along_m;
        if sunny_break >= SUNNY_BREAK_LIMIT_M {
            break;
        }
    }

    Some(&samples[best])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{BoundingBox, Building, GeoPoint};
    use crate::shadow::project_buildings;
    use chrono::TimeZone;

    fn bbox() -> BoundingBox {
        BoundingBox {
            south: 25.19,
            west: 55.26,
            north: 25.22,
            east: 55.29,
        }
    }

    fn straight_route(from_lat: f64, to_lat: f64, lng: f64) -> RawRoute {
        let from = GeoPoint::new(from_lat, lng);
        let to = GeoPoint::new(to_lat, lng);
        RawRoute {
            name: "Primary".to_string(),
            distance_m: crate::spatial::haversine_distance(from, to),
            duration_s: 600.0,
            geometry: vec![from, GeoPoint::new((from_lat + to_lat) / 2.0, lng), to],
        }
    }

    fn noon() -> DateTime<Utc> {
        // ~13:00 local in the Gulf: sun well above the horizon.
        Utc.with_ymd_and_hms(2024, 6, 15, 9, 0, 0).unwrap()
    }

    fn midnight() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 15, 21, 0, 0).unwrap()
    }

    #[test]
    fn ratio_stays_within_bounds() {
        let projection = Projection::for_bbox(&bbox());
        let route = straight_route(25.20, 25.21, 55.27);
        let result = evaluate_route_shade(&route, &[], &projection, noon());
        assert!((0.0..=1.0).contains(&result.shade_ratio));
        assert!(result.shaded_distance_m <= result.route.distance_m);
    }

    #[test]
    fn night_route_is_fully_shaded_regardless_of_buildings() {
        let projection = Projection::for_bbox(&bbox());
        let route = straight_route(25.20, 25.21, 55.27);
        let result = evaluate_route_shade(&route, &[], &projection, midnight());

        assert!(result.sun.altitude_deg <= 0.0);
        assert_eq!(result.shade_ratio, 1.0);
        assert_eq!(result.shaded_distance_m, result.route.distance_m);
        assert!(result.segment_groups.iter().all(|g| g.shaded));
        let end = result.shadow_end.expect("night routes end fully shaded");
        assert_eq!(end.distance_along_m, result.route.distance_m);
    }

    #[test]
    fn empty_geometry_evaluates_to_zero_without_panicking() {
        let projection = Projection::for_bbox(&bbox());
        let route = RawRoute {
            name: "Primary".to_string(),
            distance_m: 0.0,
            duration_s: 0.0,
            geometry: Vec::new(),
        };
        let result = evaluate_route_shade(&route, &[], &projection, noon());
        assert_eq!(result.shade_ratio, 0.0);
        assert_eq!(result.shaded_distance_m, 0.0);
        assert!(result.segment_groups.is_empty());
        assert!(result.shadow_end.is_none());
    }

    #[test]
    fn evaluation_is_idempotent() {
        let projection = Projection::for_bbox(&bbox());
        let route = straight_route(25.20, 25.21, 55.27);
        let buildings = project_buildings(
            &[building_straddling(25.205, 55.27, 40.0)],
            &projection,
        );
        let at = noon();

        let a = evaluate_route_shade(&route, &buildings, &projection, at);
        let b = evaluate_route_shade(&route, &buildings, &projection, at);
        assert_eq!(a.shade_ratio, b.shade_ratio);
        assert_eq!(a.shaded_distance_m, b.shaded_distance_m);
        assert_eq!(a.segment_groups.len(), b.segment_groups.len());
    }

    fn building_straddling(lat: f64, lng: f64, height_m: f64) -> Building {
        // ~40 m square centered on (lat, lng).
        let dlat = 20.0 / 110_540.0;
        let dlng = 20.0 / (111_320.0 * lat.to_radians().cos());
        Building {
            ring: vec![
                GeoPoint::new(lat - dlat, lng - dlng),
                GeoPoint::new(lat - dlat, lng + dlng),
                GeoPoint::new(lat + dlat, lng + dlng),
                GeoPoint::new(lat + dlat, lng - dlng),
                GeoPoint::new(lat - dlat, lng - dlng),
            ],
            height_m,
        }
    }

    #[test]
    fn building_straddling_route_produces_shade() {
        let projection = Projection::for_bbox(&bbox());
        // ~1.1 km route through the building at its midpoint.
        let route = straight_route(25.20, 25.21, 55.27);
        let buildings = project_buildings(
            &[building_straddling(25.205, 55.27, 40.0)],
            &projection,
        );

        let result = evaluate_route_shade(&route, &buildings, &projection, noon());
        assert!(result.sun.altitude_deg > 0.0);
        assert!(result.shade_ratio > 0.0, "ratio {}", result.shade_ratio);
        assert!(result.segment_groups.iter().any(|g| g.shaded));
    }

    #[test]
    fn route_starting_in_sun_has_no_shadow_end() {
        let projection = Projection::for_bbox(&bbox());
        let route = straight_route(25.20, 25.21, 55.27);
        // No buildings: every daytime sample is sunny.
        let result = evaluate_route_shade(&route, &[], &projection, noon());
        assert!(result.shadow_end.is_none());
        assert_eq!(result.shade_ratio, 0.0);
    }

    #[test]
    fn segment_groups_merge_runs() {
        let projection = Projection::for_bbox(&bbox());
        let mut samples = sample_route(
            &straight_route(25.20, 25.21, 55.27).geometry,
            &projection,
            12.0,
        );
        // Shade the first half only.
        let half = samples.len() / 2;
        for sample in samples.iter_mut().take(half) {
            sample.shaded = true;
        }

        let groups = build_segment_groups(&samples, false);
        assert!(groups.len() >= 2);
        assert!(groups[0].shaded);
        assert!(!groups.last().unwrap().shaded);
        for group in &groups {
            assert!(group.points.len() >= 2);
        }
    }

    #[test]
    fn cool_path_tolerates_short_sunny_breaks_only() {
        let projection = Projection::for_bbox(&bbox());
        let mut samples = sample_route(
            &straight_route(25.20, 25.21, 55.27).geometry,
            &projection,
            12.0,
        );
        // Shaded lead, a 2-sample (~24 m) sunny break, more shade, then a
        // long sunny tail.
        for (i, sample) in samples.iter_mut().enumerate() {
            sample.shaded = matches!(i, 0..=9 | 12..=19);
        }

        let end = cool_path_end(&samples).expect("leading shade exists");
        // The break is under 50 m, so the cool path extends into the second
        // shaded run and stops at its last sample.
        assert_eq!(end.distance_along_m, samples[19].distance_along_m);
    }

    #[test]
    fn cool_path_stops_at_long_sunny_break() {
        let projection = Projection::for_bbox(&bbox());
        let mut samples = sample_route(
            &straight_route(25.20, 25.21, 55.27).geometry,
            &projection,
            12.0,
        );
        // Shaded lead, then a >50 m sunny gap before more shade.
        for (i, sample) in samples.iter_mut().enumerate() {
            sample.shaded = matches!(i, 0..=9 | 15..=25);
        }

        let end = cool_path_end(&samples).expect("leading shade exists");
        assert_eq!(end.distance_along_m, samples[9].distance_along_m);
    }
}
