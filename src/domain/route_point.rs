use crate::domain::Coordinate;

/// A single position sample of the tracked vehicle. `timestamp` is in epoch milliseconds.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RoutePoint {
    pub lat: f64,
    pub lon: f64,
    pub timestamp: i64,
}

impl RoutePoint {
    pub fn new(lat: f64, lon: f64, timestamp: i64) -> Self {
        RoutePoint { lat, lon, timestamp }
    }

    pub fn coordinate(&self) -> Coordinate {
        Coordinate::new(self.lat, self.lon)
    }
}
