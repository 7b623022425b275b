mod position_feed;
mod snapshot;
mod tracker;

pub use position_feed::PositionFeed;
pub use snapshot::{TrackingPhase, TrackingSnapshot};
pub use tracker::RouteTracker;
