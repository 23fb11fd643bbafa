//! Candidate ranking: shade rewarded, excess walking penalized.

use crate::evaluate::EvaluatedRoute;

/// Penalty applied per unit of excess distance over the shortest candidate.
const EXTRA_DISTANCE_PENALTY: f64 = 0.38;

/// Score every candidate and sort descending. Only the distance *beyond* the
/// shortest candidate is penalized; the shortest route pays nothing. The sort
/// is stable, so ties keep evaluation order.
pub fn score_and_rank(evaluated: &mut Vec<EvaluatedRoute>) {
    let shortest = evaluated
        .iter()
        .map(|route| route.route.distance_m)
        .fold(f64::INFINITY, f64::min);

    for route in evaluated.iter_mut() {
        let extra = (route.route.distance_m - shortest) / shortest.max(1.0);
        route.score = route.shade_ratio - extra.max(0.0) * EXTRA_DISTANCE_PENALTY;
    }

    evaluated.sort_by(|a, b| b.score.total_cmp(&a.score));
}
