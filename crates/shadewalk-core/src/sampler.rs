//! Fixed-interval discretization of a route polyline.

use crate::models::{GeoPoint, PlanarPoint};
use crate::projection::Projection;

/// Segments shorter than this are skipped to avoid division instability.
const MIN_SEGMENT_LEN_M: f64 = 0.001;
/// The final vertex is appended when the last emitted sample lands farther
/// than this from it.
const LAST_VERTEX_SNAP_M: f64 = 1.0;

/// One point along a discretized route.
#[derive(Debug, Clone)]
pub struct RouteSample {
    pub lat_lng: GeoPoint,
    pub xy: PlanarPoint,
    pub distance_along_m: f64,
    pub shaded: bool,
}

/// Resample a polyline at a fixed step of cumulative planar distance.
///
/// The first vertex is always sample 0; interior samples are linear
/// interpolations between the bracketing vertices, unprojected back to
/// geographic coordinates; the final vertex is always represented. Routing
/// providers return vertices at irregular spacing, so shade classification
/// needs this decoupled discretization.
pub fn sample_route(
    geometry: &[GeoPoint],
    projection: &Projection,
    step_m: f64,
) -> Vec<RouteSample> {
    if geometry.len() < 2 {
        return Vec::new();
    }

    let projected: Vec<PlanarPoint> = geometry.iter().map(|p| projection.project(*p)).collect();
    let mut samples = vec![RouteSample {
        lat_lng: geometry[0],
        xy: projected[0],
        distance_along_m: 0.0,
        shaded: false,
    }];

    let mut distance_along = 0.0;
    let mut carry = step_m;

    for i in 1..projected.len() {
        let a = projected[i - 1];
        let b = projected[i];
        let seg_len = a.distance_to(&b);

        if seg_len < MIN_SEGMENT_LEN_M {
            continue;
        }

        while carry <= seg_len {
            let t = carry / seg_len;
            let xy = PlanarPoint::new(a.x + (b.x - a.x) * t, a.y + (b.y - a.y) * t);
            samples.push(RouteSample {
                lat_lng: projection.unproject(xy),
                xy,
                distance_along_m: distance_along + carry,
                shaded: false,
            });
            carry += step_m;
        }

        distance_along += seg_len;
        carry -= seg_len;
    }

    let last_projected = projected[projected.len() - 1];
    let needs_tail = samples
        .last()
        .map(|sample| sample.xy.distance_to(&last_projected) > LAST_VERTEX_SNAP_M)
        .unwrap_or(true);
    if needs_tail {
        samples.push(RouteSample {
            lat_lng: geometry[geometry.len() - 1],
            xy: last_projected,
            distance_along_m: distance_along,
            shaded: false,
        });
    }

    samples
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::BoundingBox;

    fn projection() -> Projection {
        Projection::for_bbox(&BoundingBox {
            south: 25.19,
            west: 55.26,
            north: 25.21,
            east: 55.28,
        })
    }

    #[test]
    fn short_geometry_yields_no_samples() {
        assert!(sample_route(&[GeoPoint::new(25.2, 55.27)], &projection(), 12.0).is_empty());
    }

    #[test]
    fn first_sample_is_route_start() {
        let proj = projection();
        // ~220 m of northward walking.
        let geometry = [GeoPoint::new(25.2, 55.27), GeoPoint::new(25.202, 55.27)];
        let samples = sample_route(&geometry, &proj, 12.0);
        assert_eq!(samples[0].distance_along_m, 0.0);
        assert!((samples[0].lat_lng.lat - 25.2).abs() < 1e-12);
    }

    #[test]
    fn samples_step_evenly_and_cover_route() {
        let proj = projection();
        let geometry = [GeoPoint::new(25.2, 55.27), GeoPoint::new(25.202, 55.27)];
        let total = proj
            .project(geometry[0])
            .distance_to(&proj.project(geometry[1]));
        let samples = sample_route(&geometry, &proj, 12.0);

        for pair in samples.windows(2) {
            let gap = pair[1].distance_along_m - pair[0].distance_along_m;
            assert!(gap > 0.0 && gap <= 12.0 + 1e-6, "gap {gap}");
        }
        let last = samples.last().unwrap();
        assert!((last.distance_along_m - total).abs() <= 12.0);
    }

    #[test]
    fn final_vertex_appended_when_stepping_misses_it() {
        let proj = projection();
        // 110 m is not a multiple of 12; the tail vertex must still appear.
        let geometry = [GeoPoint::new(25.2, 55.27), GeoPoint::new(25.201, 55.27)];
        let samples = sample_route(&geometry, &proj, 12.0);
        let last = samples.last().unwrap();
        assert!((last.lat_lng.lat - 25.201).abs() < 1e-12);
    }

    #[test]
    fn degenerate_segments_are_skipped() {
        let proj = projection();
        let p = GeoPoint::new(25.2, 55.27);
        let geometry = [p, p, GeoPoint::new(25.201, 55.27)];
        let samples = sample_route(&geometry, &proj, 12.0);
        assert!(samples.len() > 2);
        assert!(samples
            .windows(2)
            .all(|pair| pair[1].distance_along_m >= pair[0].distance_along_m));
    }
}
