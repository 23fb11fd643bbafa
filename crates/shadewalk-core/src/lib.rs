pub mod candidates;
pub mod dispatch;
pub mod evaluate;
pub mod models;
pub mod projection;
pub mod sampler;
pub mod score;
pub mod shadow;
pub mod solar;
pub mod spatial;

pub use candidates::{detour_via_points, shortlist_candidates};
pub use dispatch::{simulate_pod_dispatch, PodDispatch};
pub use evaluate::{evaluate_route_shade, EvaluatedRoute, SunSnapshot};
pub use models::{
    BoundingBox, Building, GeoPoint, PlanarPoint, RawRoute, SegmentGroup, ShadowEnd,
};
pub use projection::Projection;
pub use score::score_and_rank;
pub use shadow::{is_point_shaded, project_buildings, ProjectedBuilding};
pub use spatial::haversine_distance;
