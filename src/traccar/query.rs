use crate::extensions::date_time_ext::ToIsoMillis;
use chrono::{DateTime, Utc};

pub const DEFAULT_ROUTE_LIMIT: u32 = 1000;

/// Query of `/api/positions`. Without a time range Traccar returns the latest known positions.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct PositionsQuery {
    pub device_id: Option<i64>,
    pub from: Option<DateTime<Utc>>,
    pub to: Option<DateTime<Utc>>,
    pub page: Option<u32>,
    pub limit: Option<u32>,
    pub id: Option<i64>,
    pub unique: Option<bool>,
}

impl PositionsQuery {
    pub fn latest(device_id: i64) -> Self {
        PositionsQuery {
            device_id: Some(device_id),
            ..Default::default()
        }
    }

    pub fn between(device_id: i64, from: DateTime<Utc>, to: DateTime<Utc>) -> Self {
        PositionsQuery {
            device_id: Some(device_id),
            from: Some(from),
            to: Some(to),
            ..Default::default()
        }
    }

    pub fn to_params(&self) -> Vec<(&'static str, String)> {
        let mut params = Vec::new();
        push(&mut params, "deviceId", self.device_id);
        push(&mut params, "from", self.from.map(|from| from.to_iso_millis()));
        push(&mut params, "to", self.to.map(|to| to.to_iso_millis()));
        push(&mut params, "page", self.page);
        push(&mut params, "limit", self.limit);
        push(&mut params, "id", self.id);
        push(&mut params, "unique", self.unique);
        params
    }
}

/// Query of `/api/reports/route`, the historical route of a single device.
#[derive(Clone, Debug, PartialEq)]
pub struct RouteQuery {
    pub device_id: i64,
    pub from: DateTime<Utc>,
    pub to: DateTime<Utc>,
    pub page: Option<u32>,
    pub limit: Option<u32>,
}

impl RouteQuery {
    pub fn new(device_id: i64, from: DateTime<Utc>, to: DateTime<Utc>) -> Self {
        RouteQuery {
            device_id,
            from,
            to,
            page: None,
            limit: None,
        }
    }

    pub fn to_params(&self) -> Vec<(&'static str, String)> {
        let mut params = vec![
            ("deviceId", self.device_id.to_string()),
            ("from", self.from.to_iso_millis()),
            ("to", self.to.to_iso_millis()),
        ];
        push(&mut params, "page", self.page);
        params.push(("limit", self.limit.unwrap_or(DEFAULT_ROUTE_LIMIT).to_string()));
        params
    }
}

fn push<T: ToString>(params: &mut Vec<(&'static str, String)>, key: &'static str, value: Option<T>) {
    if let Some(value) = value {
        params.push((key, value.to_string()));
    }
}
