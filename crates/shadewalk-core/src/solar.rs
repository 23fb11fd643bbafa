//! Solar position for a place and time.
//!
//! Standard low-precision astronomical formulas (the SunCalc algorithm):
//! accurate to a fraction of a degree, which is far below the error already
//! accepted by the columnar shadow model.

use chrono::{DateTime, Utc};

/// Obliquity of the ecliptic.
const OBLIQUITY_RAD: f64 = 23.4397 * std::f64::consts::PI / 180.0;
const MS_PER_DAY: f64 = 86_400_000.0;
/// Days from the Unix epoch to J2000 (2451545.0 - 2440587.5).
const UNIX_TO_J2000_DAYS: f64 = 10_957.5;

/// Sun altitude and azimuth in radians.
///
/// Azimuth uses the astronomical convention this algorithm is defined in:
/// 0 = south, positive toward the west. Callers re-base to a compass bearing
/// by adding 180 degrees.
#[derive(Debug, Clone, Copy)]
pub struct SunPosition {
    pub altitude_rad: f64,
    pub azimuth_rad: f64,
}

pub fn sun_position(at: DateTime<Utc>, lat: f64, lng: f64) -> SunPosition {
    let d = days_since_j2000(at);
    let lw = -lng.to_radians();
    let phi = lat.to_radians();

    let (declination, right_ascension) = sun_coords(d);
    let hour_angle = sidereal_time(d, lw) - right_ascension;

    let altitude_rad = (phi.sin() * declination.sin()
        + phi.cos() * declination.cos() * hour_angle.cos())
    .asin();
    let azimuth_rad = hour_angle
        .sin()
        .atan2(hour_angle.cos() * phi.sin() - declination.tan() * phi.cos());

    SunPosition {
        altitude_rad,
        azimuth_rad,
    }
}

fn days_since_j2000(at: DateTime<Utc>) -> f64 {
    at.timestamp_millis() as f64 / MS_PER_DAY - UNIX_TO_J2000_DAYS
}

/// Ecliptic declination and right ascension of the sun for a given day count.
fn sun_coords(d: f64) -> (f64, f64) {
    let mean_anomaly = (357.5291 + 0.985_600_28 * d).to_radians();
    let center = (1.9148 * mean_anomaly.sin()
        + 0.02 * (2.0 * mean_anomaly).sin()
        + 0.0003 * (3.0 * mean_anomaly).sin())
    .to_radians();
    let perihelion = 102.9372_f64.to_radians();
    let ecliptic_lng = mean_anomaly + center + perihelion + std::f64::consts::PI;

    let declination = (OBLIQUITY_RAD.sin() * ecliptic_lng.sin()).asin();
    let right_ascension = (ecliptic_lng.sin() * OBLIQUITY_RAD.cos()).atan2(ecliptic_lng.cos());

    (declination, right_ascension)
}

fn sidereal_time(d: f64, lw: f64) -> f64 {
    (280.16 + 360.985_623_5 * d).to_radians() - lw
}
