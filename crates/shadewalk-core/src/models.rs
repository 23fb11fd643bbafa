//! Core data models for shade-aware routing.

use serde::{Deserialize, Serialize};

/// A WGS84 coordinate in decimal degrees. The boundary type used everywhere
/// outside the planar projection.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub lat: f64,
    pub lng: f64,
}

impl GeoPoint {
    pub fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }

    /// Both coordinates are finite numbers.
    pub fn is_finite(&self) -> bool {
        self.lat.is_finite() && self.lng.is_finite()
    }

    /// `[lat, lng]` pair for wire payloads.
    pub fn as_pair(&self) -> [f64; 2] {
        [self.lat, self.lng]
    }
}

/// A point in a local tangent-plane frame, in meters. Only meaningful within
/// the [`crate::projection::Projection`] that produced it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlanarPoint {
    pub x: f64,
    pub y: f64,
}

impl PlanarPoint {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn distance_to(&self, other: &PlanarPoint) -> f64 {
        (other.x - self.x).hypot(other.y - self.y)
    }
}

/// Geographic bounding box in degrees. Invariant: south < north, west < east.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct BoundingBox {
    pub south: f64,
    pub west: f64,
    pub north: f64,
    pub east: f64,
}

impl BoundingBox {
    /// Smallest box covering every vertex of every route, or `None` when no
    /// finite vertex exists.
    pub fn around_routes(routes: &[RawRoute]) -> Option<Self> {
        let mut south = f64::INFINITY;
        let mut west = f64::INFINITY;
        let mut north = f64::NEG_INFINITY;
        let mut east = f64::NEG_INFINITY;

        for route in routes {
            for point in &route.geometry {
                if !point.is_finite() {
                    continue;
                }
                south = south.min(point.lat);
                north = north.max(point.lat);
                west = west.min(point.lng);
                east = east.max(point.lng);
            }
        }

        if !south.is_finite() || !west.is_finite() {
            return None;
        }

        Some(Self {
            south,
            west,
            north,
            east,
        })
    }

    pub fn expanded(&self, padding_deg: f64) -> Self {
        Self {
            south: self.south - padding_deg,
            west: self.west - padding_deg,
            north: self.north + padding_deg,
            east: self.east + padding_deg,
        }
    }

    pub fn lat_span(&self) -> f64 {
        self.north - self.south
    }

    pub fn lng_span(&self) -> f64 {
        self.east - self.west
    }

    pub fn mid_lat(&self) -> f64 {
        (self.north + self.south) / 2.0
    }

    pub fn mid_lng(&self) -> f64 {
        (self.east + self.west) / 2.0
    }
}

/// A walking route as returned by the route provider. Immutable once fetched.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawRoute {
    /// Display name assigned during candidate shortlisting ("Primary",
    /// "Candidate 1", ...).
    pub name: String,
    pub distance_m: f64,
    pub duration_s: f64,
    /// At least 2 vertices, in walking order.
    pub geometry: Vec<GeoPoint>,
}

/// A building footprint with its estimated height.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Building {
    /// Closed polygon ring (first == last, at least 4 points).
    pub ring: Vec<GeoPoint>,
    pub height_m: f64,
}

/// A maximal run of consecutive route samples sharing the same shaded state,
/// used for rendering without re-deriving shade per pixel.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SegmentGroup {
    pub shaded: bool,
    /// At least 2 points, in route order.
    pub points: Vec<GeoPoint>,
}

/// Where the leading shaded stretch of a route effectively ends.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ShadowEnd {
    pub point: GeoPoint,
    pub distance_along_m: f64,
}
