use serde::{Deserialize, Deserializer, de};
use std::fmt::{Display, Formatter};
use std::str::FromStr;
use thiserror::Error;

/// A WGS84 position in decimal degrees.
#[derive(Clone, Copy, Default, Debug, PartialEq)]
pub struct Coordinate {
    pub lat: f64,
    pub lon: f64,
}

impl Coordinate {
    pub fn new(lat: f64, lon: f64) -> Self {
        Coordinate { lat, lon }
    }
}

impl Display for Coordinate {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:.6},{:.6}", self.lat, self.lon)
    }
}

/// Parses free-text `"lat,lon"` locations as typed by dispatchers. Anything after the second
/// comma-separated part is ignored.
impl FromStr for Coordinate {
    type Err = ParseCoordinateError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            return Err(ParseCoordinateError::Empty);
        }

        let mut parts = trimmed.split(',');
        let (Some(lat), Some(lon)) = (parts.next(), parts.next()) else {
            return Err(ParseCoordinateError::MissingSeparator(trimmed.to_string()));
        };

        let lat = parse_degrees(lat)?;
        let lon = parse_degrees(lon)?;
        Ok(Coordinate { lat, lon })
    }
}

/// Configured positions are written as `{ latitude, longitude }`.
impl<'de> Deserialize<'de> for Coordinate {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        struct Inner {
            latitude: f64,
            longitude: f64,
        }

        let inner = Inner::deserialize(deserializer)?;
        if !(-90.0..=90.0).contains(&inner.latitude) {
            return Err(de::Error::custom(format!("invalid latitude: {}, must be between -90 and 90", inner.latitude)));
        }

        if !(-180.0..=180.0).contains(&inner.longitude) {
            return Err(de::Error::custom(format!("invalid longitude: {}, must be between -180 and 180", inner.longitude)));
        }

        Ok(Coordinate::new(inner.latitude, inner.longitude))
    }
}

fn parse_degrees(value: &str) -> Result<f64, ParseCoordinateError> {
    value
        .trim()
        .parse::<f64>()
        .ok()
        .filter(|degrees| degrees.is_finite())
        .ok_or_else(|| ParseCoordinateError::InvalidNumber(value.trim().to_string()))
}

#[derive(Error, Debug, PartialEq)]
pub enum ParseCoordinateError {
    #[error("location is empty")]
    Empty,
    #[error("expected 'lat,lon', found '{0}'")]
    MissingSeparator(String),
    #[error("'{0}' is not a number")]
    InvalidNumber(String),
}
