//! Local planar projection for a bounding box.

use crate::models::{BoundingBox, GeoPoint, PlanarPoint};

const METERS_PER_DEG_LAT: f64 = 110_540.0;
const METERS_PER_DEG_LNG_EQUATOR: f64 = 111_320.0;

/// Equirectangular projection centered on a bounding box's midpoint.
///
/// Valid only for the small spans the HTTP boundary enforces (<= ~0.24 deg);
/// distortion grows quickly beyond that.
#[derive(Debug, Clone, Copy)]
pub struct Projection {
    lat0: f64,
    lng0: f64,
    lat_scale: f64,
    lng_scale: f64,
}

impl Projection {
    pub fn for_bbox(bbox: &BoundingBox) -> Self {
        let lat0 = bbox.mid_lat();
        Self {
            lat0,
            lng0: bbox.mid_lng(),
            lat_scale: METERS_PER_DEG_LAT,
            lng_scale: METERS_PER_DEG_LNG_EQUATOR * lat0.to_radians().cos(),
        }
    }

    pub fn project(&self, point: GeoPoint) -> PlanarPoint {
        PlanarPoint::new(
            (point.lng - self.lng0) * self.lng_scale,
            (point.lat - self.lat0) * self.lat_scale,
        )
    }

    pub fn unproject(&self, point: PlanarPoint) -> GeoPoint {
        GeoPoint::new(
            self.lat0 + point.y / self.lat_scale,
            self.lng0 + point.x / self.lng_scale,
        )
    }
}
