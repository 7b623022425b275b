use crate::domain::Coordinate;
use std::f64::consts::PI;

const EARTH_RADIUS_M: f64 = 6_378_137.0;
const MAX_LATITUDE: f64 = 85.051_128_779_806_6;

/// A point in Web Mercator (EPSG:3857) meters.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MercatorPoint {
    pub x: f64,
    pub y: f64,
}

pub fn to_mercator(coordinate: Coordinate) -> MercatorPoint {
    let lat = coordinate.lat.clamp(-MAX_LATITUDE, MAX_LATITUDE);
    MercatorPoint {
        x: EARTH_RADIUS_M * coordinate.lon.to_radians(),
        y: EARTH_RADIUS_M * (PI / 4.0 + lat.to_radians() / 2.0).tan().ln(),
    }
}

pub fn from_mercator(point: MercatorPoint) -> Coordinate {
    Coordinate {
        lat: (2.0 * (point.y / EARTH_RADIUS_M).exp().atan() - PI / 2.0).to_degrees(),
        lon: (point.x / EARTH_RADIUS_M).to_degrees(),
    }
}

/// Meters per pixel at zoom 0 for 256px tiles.
pub const MAX_RESOLUTION: f64 = 2.0 * PI * EARTH_RADIUS_M / 256.0;
