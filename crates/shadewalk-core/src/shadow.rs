//! Building shadow geometry: footprint projection and the point-in-shadow
//! test.

use crate::models::{Building, PlanarPoint};
use crate::projection::Projection;

/// Tolerance added to the bounding-box reject so points just past a shadow's
/// nominal reach are still ray-tested. Fixed, not tunable: it absorbs
/// projection and sampling error near shadow boundaries.
const SHADOW_REACH_MARGIN_M: f64 = 3.0;
/// Tolerance added to the ray-hit acceptance distance. Same role as
/// [`SHADOW_REACH_MARGIN_M`], on the accept side.
const SHADOW_HIT_MARGIN_M: f64 = 2.0;
/// Shadows longer than this are truncated; beyond ~500 m the columnar
/// extrusion model stops being meaningful at street scale.
const MAX_SHADOW_LEN_M: f64 = 500.0;
/// Floor on tan(altitude) so near-horizon sun does not blow up the length.
const MIN_TAN_ALTITUDE: f64 = 0.01;

/// Axis-aligned planar bounds of a projected footprint.
#[derive(Debug, Clone, Copy)]
pub struct PlanarBounds {
    pub min_x: f64,
    pub max_x: f64,
    pub min_y: f64,
    pub max_y: f64,
}

/// A building footprint in the local planar frame.
///
/// `max_shadow_len_m` depends on the sun altitude at evaluation time; it is
/// zero until [`with_shadow_lengths`] recomputes it.
#[derive(Debug, Clone)]
pub struct ProjectedBuilding {
    pub ring: Vec<PlanarPoint>,
    pub bounds: PlanarBounds,
    pub height_m: f64,
    pub max_shadow_len_m: f64,
}

/// Project building rings into the planar frame, dropping degenerate rings
/// (< 4 points).
pub fn project_buildings(buildings: &[Building], projection: &Projection) -> Vec<ProjectedBuilding> {
    let mut projected = Vec::with_capacity(buildings.len());

    for building in buildings {
        let ring: Vec<PlanarPoint> = building
            .ring
            .iter()
            .map(|point| projection.project(*point))
            .collect();
        if ring.len() < 4 {
            continue;
        }

        let mut bounds = PlanarBounds {
            min_x: f64::INFINITY,
            max_x: f64::NEG_INFINITY,
            min_y: f64::INFINITY,
            max_y: f64::NEG_INFINITY,
        };
        for point in &ring {
            bounds.min_x = bounds.min_x.min(point.x);
            bounds.max_x = bounds.max_x.max(point.x);
            bounds.min_y = bounds.min_y.min(point.y);
            bounds.max_y = bounds.max_y.max(point.y);
        }

        projected.push(ProjectedBuilding {
            ring,
            bounds,
            height_m: building.height_m,
            max_shadow_len_m: 0.0,
        });
    }

    projected
}

/// Recompute shadow lengths for the sun altitude of one evaluation.
/// `tan_altitude` is tan of the solar altitude angle.
pub fn with_shadow_lengths(
    buildings: &[ProjectedBuilding],
    tan_altitude: f64,
) -> Vec<ProjectedBuilding> {
    buildings
        .iter()
        .map(|building| {
            let len = building.height_m / tan_altitude.max(MIN_TAN_ALTITUDE);
            ProjectedBuilding {
                max_shadow_len_m: len.clamp(0.0, MAX_SHADOW_LEN_M),
                ring: building.ring.clone(),
                bounds: building.bounds,
                height_m: building.height_m,
            }
        })
        .collect()
}

/// Whether a point is shaded by any building, given the direction *toward*
/// the sun as a planar unit vector.
///
/// Per building, in order: inside the footprint is shaded outright; a point
/// farther from the footprint bounds than the shadow could reach is skipped;
/// otherwise a ray toward the sun is intersected with the footprint edges and
/// a hit within the shadow length means the building blocks the sun here.
/// Short-circuits on the first shading building.
pub fn is_point_shaded(
    point: PlanarPoint,
    buildings: &[ProjectedBuilding],
    sun_direction: PlanarPoint,
) -> bool {
    for building in buildings {
        if point_in_ring(point, &building.ring) {
            return true;
        }

        let bbox_distance = min_distance_to_bounds(point, &building.bounds);
        if bbox_distance > building.max_shadow_len_m + SHADOW_REACH_MARGIN_M {
            continue;
        }

        if let Some(hit) = ray_ring_first_hit(point, sun_direction, &building.ring) {
            if hit <= building.max_shadow_len_m + SHADOW_HIT_MARGIN_M {
                return true;
            }
        }
    }

    false
}

/// Even-odd ray-crossing point-in-polygon test.
fn point_in_ring(point: PlanarPoint, ring: &[PlanarPoint]) -> bool {
    let mut inside = false;
    let mut j = ring.len() - 1;

    for i in 0..ring.len() {
        let (xi, yi) = (ring[i].x, ring[i].y);
        let (xj, yj) = (ring[j].x, ring[j].y);

        let dy = if (yj - yi).abs() < 1e-12 { 1e-12 } else { yj - yi };
        if (yi > point.y) != (yj > point.y) && point.x < (xj - xi) * (point.y - yi) / dy + xi {
            inside = !inside;
        }
        j = i;
    }

    inside
}

/// Nearest intersection distance of a ray with the ring's edges, or `None`
/// when the ray misses every edge.
fn ray_ring_first_hit(origin: PlanarPoint, dir: PlanarPoint, ring: &[PlanarPoint]) -> Option<f64> {
    let mut nearest: Option<f64> = None;

    for window in ring.windows(2) {
        if let Some(hit) = intersect_ray_segment(origin, dir, window[0], window[1]) {
            if nearest.map_or(true, |best| hit < best) {
                nearest = Some(hit);
            }
        }
    }

    nearest
}

/// Ray/segment intersection via 2D cross products: solves for ray parameter
/// t >= 0 and segment parameter u in [0, 1], returning t (distance along the
/// ray for a unit direction).
fn intersect_ray_segment(
    origin: PlanarPoint,
    dir: PlanarPoint,
    a: PlanarPoint,
    b: PlanarPoint,
) -> Option<f64> {
    let v = PlanarPoint::new(b.x - a.x, b.y - a.y);
    let ap = PlanarPoint::new(a.x - origin.x, a.y - origin.y);
    let denom = cross(dir, v);

    if denom.abs() < 1e-9 {
        return None;
    }

    let t = cross(ap, v) / denom;
    let u = cross(ap, dir) / denom;

    if t >= 0.0 && (0.0..=1.0).contains(&u) {
        Some(t)
    } else {
        None
    }
}

fn cross(a: PlanarPoint, b: PlanarPoint) -> f64 {
    a.x * b.y - a.y * b.x
}

fn min_distance_to_bounds(point: PlanarPoint, bounds: &PlanarBounds) -> f64 {
    let dx = if point.x < bounds.min_x {
        bounds.min_x - point.x
    } else if point.x > bounds.max_x {
        point.x - bounds.max_x
    } else {
        0.0
    };
    let dy = if point.y < bounds.min_y {
        bounds.min_y - point.y
    } else if point.y > bounds.max_y {
        point.y - bounds.max_y
    } else {
        0.0
    };
    dx.hypot(dy)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{BoundingBox, GeoPoint};

    fn square_ring(center_x: f64, center_y: f64, half: f64) -> Vec<PlanarPoint> {
        vec![
            PlanarPoint::new(center_x - half, center_y - half),
            PlanarPoint::new(center_x + half, center_y - half),
            PlanarPoint::new(center_x + half, center_y + half),
            PlanarPoint::new(center_x - half, center_y + half),
            PlanarPoint::new(center_x - half, center_y - half),
        ]
    }

    fn square_building(center_x: f64, center_y: f64, half: f64, height_m: f64) -> ProjectedBuilding {
        ProjectedBuilding {
            ring: square_ring(center_x, center_y, half),
            bounds: PlanarBounds {
                min_x: center_x - half,
                max_x: center_x + half,
                min_y: center_y - half,
                max_y: center_y + half,
            },
            height_m,
            max_shadow_len_m: 0.0,
        }
    }

    #[test]
    fn point_inside_footprint_is_shaded_even_at_high_noon() {
        // Near-vertical sun: shadow length practically zero, but standing
        // under the building still counts as shaded.
        let buildings = with_shadow_lengths(
            &[square_building(0.0, 0.0, 10.0, 40.0)],
            (89.0_f64).to_radians().tan(),
        );
        assert!(buildings[0].max_shadow_len_m < 1.0);
        let sun_dir = PlanarPoint::new(0.0, 1.0);
        assert!(is_point_shaded(PlanarPoint::new(0.0, 0.0), &buildings, sun_dir));
    }

    #[test]
    fn point_in_cast_shadow_is_shaded() {
        // 40 m building, 45 deg sun from due east: shadow extends 40 m west.
        let buildings = with_shadow_lengths(
            &[square_building(0.0, 0.0, 10.0, 40.0)],
            (45.0_f64).to_radians().tan(),
        );
        let toward_sun = PlanarPoint::new(1.0, 0.0);
        assert!(is_point_shaded(PlanarPoint::new(-30.0, 0.0), &buildings, toward_sun));
        // Beyond the 40 m shadow (+ margins) the point is sunny.
        assert!(!is_point_shaded(PlanarPoint::new(-60.0, 0.0), &buildings, toward_sun));
    }

    #[test]
    fn far_point_rejected_by_bounds_check() {
        let buildings = with_shadow_lengths(
            &[square_building(0.0, 0.0, 10.0, 40.0)],
            (45.0_f64).to_radians().tan(),
        );
        let toward_sun = PlanarPoint::new(1.0, 0.0);
        assert!(!is_point_shaded(
            PlanarPoint::new(-600.0, 0.0),
            &buildings,
            toward_sun
        ));
    }

    #[test]
    fn point_behind_building_relative_to_sun_is_sunny() {
        let buildings = with_shadow_lengths(
            &[square_building(0.0, 0.0, 10.0, 40.0)],
            (45.0_f64).to_radians().tan(),
        );
        // Sun is to the east; a point east of the building looks toward the
        // sun without the building in the way.
        let toward_sun = PlanarPoint::new(1.0, 0.0);
        assert!(!is_point_shaded(PlanarPoint::new(30.0, 0.0), &buildings, toward_sun));
    }

    #[test]
    fn shadow_length_clamped_and_guarded() {
        let building = square_building(0.0, 0.0, 10.0, 350.0);
        // Sun barely above the horizon: tan guard and 500 m clamp both apply.
        let low_sun = with_shadow_lengths(std::slice::from_ref(&building), 0.0001);
        assert!((low_sun[0].max_shadow_len_m - 500.0).abs() < 1e-9);

        let high_sun = with_shadow_lengths(&[building], (80.0_f64).to_radians().tan());
        assert!(high_sun[0].max_shadow_len_m < 70.0);
    }

    #[test]
    fn degenerate_rings_dropped_on_projection() {
        let bbox = BoundingBox {
            south: 25.0,
            west: 55.0,
            north: 25.01,
            east: 55.01,
        };
        let projection = Projection::for_bbox(&bbox);
        let buildings = vec![Building {
            ring: vec![
                GeoPoint::new(25.005, 55.005),
                GeoPoint::new(25.006, 55.005),
                GeoPoint::new(25.005, 55.005),
            ],
            height_m: 12.0,
        }];
        assert!(project_buildings(&buildings, &projection).is_empty());
    }
}
