use crate::traccar::client::{TraccarClient, TraccarClientError};
use crate::traccar::query::PositionsQuery;
use serde_json::{Map, Value};
use std::collections::HashMap;
use tracing::{info, instrument};

const DEVICE_KEYS: [&str; 6] = ["id", "deviceId", "device_id", "uniqueId", "uniqueID", "idDevice"];
const POSITION_DEVICE_KEYS: [&str; 4] = ["deviceId", "device_id", "device", "deviceID"];

/// A Traccar device joined with its latest known position.
#[derive(Clone, Debug, PartialEq)]
pub struct DeviceWithPosition {
    pub device: Map<String, Value>,
    pub position: Option<Map<String, Value>>,
    pub speed: f64,
    pub last_update: Option<String>,
}

#[instrument(skip_all)]
pub async fn fetch_devices_with_positions(client: &TraccarClient) -> Result<Vec<DeviceWithPosition>, TraccarClientError> {
    info!("📡 Retrieving Traccar devices and positions...");
    let latest = PositionsQuery::default();
    let (devices, positions) = futures::try_join!(client.fetch_devices(), client.fetch_positions(&latest))?;

    let devices = join_positions(devices, positions);
    info!("📡 Retrieving Traccar devices and positions... OK, {} found", devices.len());
    Ok(devices)
}

pub fn join_positions(devices: Vec<Value>, positions: Vec<Value>) -> Vec<DeviceWithPosition> {
    let mut positions_by_device: HashMap<String, Map<String, Value>> = positions
        .into_iter()
        .filter_map(|position| match position {
            Value::Object(position) => position_device_key(&position).map(|key| (key, position)),
            _ => None,
        })
        .collect();

    devices
        .into_iter()
        .filter_map(|device| match device {
            Value::Object(device) => Some(device),
            _ => None,
        })
        .map(|device| {
            let position = device_key(&device).and_then(|key| positions_by_device.remove(&key));
            let speed = position
                .as_ref()
                .and_then(|position| position.get("speed"))
                .and_then(Value::as_f64)
                .unwrap_or(0.0);
            let last_update = position.as_ref().and_then(|position| {
                ["deviceTime", "fixTime"]
                    .iter()
                    .find_map(|field| position.get(*field).and_then(Value::as_str).map(str::to_string))
            });

            DeviceWithPosition {
                device,
                position,
                speed,
                last_update,
            }
        })
        .collect()
}

fn device_key(device: &Map<String, Value>) -> Option<String> {
    DEVICE_KEYS.iter().find_map(|key| device.get(*key).and_then(key_of))
}

fn position_device_key(position: &Map<String, Value>) -> Option<String> {
    POSITION_DEVICE_KEYS
        .iter()
        .find_map(|key| match position.get(*key) {
            Some(Value::Object(device)) => device.get("id").and_then(key_of),
            Some(value) => key_of(value),
            None => None,
        })
}

fn key_of(value: &Value) -> Option<String> {
    match value {
        Value::String(key) if !key.is_empty() => Some(key.clone()),
        Value::Number(key) => Some(key.to_string()),
        Value::Bool(key) => Some(key.to_string()),
        _ => None,
    }
}
