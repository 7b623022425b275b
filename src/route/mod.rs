mod merge;
mod normalize;
mod window;

pub use merge::merge_route_points;
pub use normalize::{normalize_records, records_from_payload};
pub use window::TrackingWindow;
