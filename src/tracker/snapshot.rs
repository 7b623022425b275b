use crate::domain::{RoutePoint, TrackedDevice};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum TrackingPhase {
    #[default]
    Idle,
    FetchingHistory,
    Polling,
}

/// The state of a tracking session as published to listeners.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct TrackingSnapshot {
    /// Incremented on every start or cancel, updates of older sessions are discarded.
    pub session: u64,
    pub phase: TrackingPhase,
    pub device: Option<TrackedDevice>,
    pub route: Vec<RoutePoint>,
    /// Timestamp of the newest applied point, 0 before any point arrived.
    pub last_seen: i64,
    pub error: Option<String>,
}

impl TrackingSnapshot {
    pub fn vehicle_position(&self) -> Option<&RoutePoint> {
        self.route.last()
    }
}
