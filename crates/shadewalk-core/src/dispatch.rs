//! Simulated micro-mobility pod dispatch for the unshaded remainder of a
//! route. No real vehicle integration; the record is synthesized per request
//! and never persisted.

use chrono::{DateTime, Duration, Utc};
use rand::Rng;
use serde::Serialize;

use crate::models::GeoPoint;

/// Remainders above this get the larger vehicle.
const MICRO_POD_MIN_REMAINING_M: f64 = 1200.0;
/// Fixed average-speed ETA model: 2 min dispatch overhead + 260 m/min.
const ETA_BASE_MIN: f64 = 2.0;
const ETA_METERS_PER_MIN: f64 = 260.0;
const ETA_MIN_MINUTES: i64 = 3;
const ETA_MAX_MINUTES: i64 = 14;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PodDispatch {
    pub dispatched: bool,
    pub dispatch_id: String,
    pub vehicle_type: String,
    pub eta_minutes: i64,
    pub eta_at: DateTime<Utc>,
    pub pickup: GeoPoint,
    pub destination: GeoPoint,
    pub message: String,
}

/// Synthesize a dispatch record for a pickup at the shadow exit point.
///
/// The dispatch ID is the only nondeterministic output in the system.
pub fn simulate_pod_dispatch(
    pickup: GeoPoint,
    destination: GeoPoint,
    remaining_m: f64,
    now: DateTime<Utc>,
) -> PodDispatch {
    let vehicle_type = if remaining_m > MICRO_POD_MIN_REMAINING_M {
        "micro-pod"
    } else {
        "e-scooter"
    };
    let eta_minutes = ((ETA_BASE_MIN + remaining_m / ETA_METERS_PER_MIN).round() as i64)
        .clamp(ETA_MIN_MINUTES, ETA_MAX_MINUTES);

    PodDispatch {
        dispatched: true,
        dispatch_id: generate_dispatch_id(),
        vehicle_type: vehicle_type.to_string(),
        eta_minutes,
        eta_at: now + Duration::minutes(eta_minutes),
        pickup,
        destination,
        message: format!(
            "{vehicle_type} auto-dispatched to shadow exit point ({:.0}m remaining in direct sun).",
            remaining_m
        ),
    }
}

fn generate_dispatch_id() -> String {
    const ALPHABET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";
    let mut rng = rand::rng();
    let suffix: String = (0..6)
        .map(|_| ALPHABET[rng.random_range(0..ALPHABET.len())] as char)
        .collect();
    format!("POD-{suffix}")
}
