use crate::app_config::Backend;
use crate::backend::api_response::ApiResponse;
use crate::backend::client::{BackendClient, BackendError};
use crate::domain::TrackedDevice;
use crate::lenient_deserializer::string_or_number;
use serde::Deserialize;
use thiserror::Error;
use tokio_retry::RetryIf;
use tokio_retry::strategy::{ExponentialBackoff, jitter};
use tracing::{info, instrument, warn};

#[derive(Debug, Deserialize)]
pub struct GpsDeviceGet {
    #[serde(default, deserialize_with = "string_or_number")]
    pub codigo: Option<String>,
    #[serde(default)]
    pub modelo: Option<String>,
}

/// Looks up the backend GPS device and maps it onto its Traccar identity. Transient backend
/// failures are retried with capped exponential backoff.
#[instrument(skip(client, config))]
pub async fn resolve_device(client: &BackendClient, config: &Backend, device_id: &str) -> Result<TrackedDevice, DeviceResolveError> {
    let device_id = device_id.trim();
    if device_id.is_empty() {
        return Err(DeviceResolveError::NoDeviceAssigned);
    }

    info!("🌐 Resolving GPS device '{}'...", device_id);
    let url = client.segment_url(&["api", "v1", "dispositivosGps", "id", device_id])?;

    let strategy = ExponentialBackoff::from_millis(config.retry_ms())
        .factor(2)
        .max_delay(config.retry_max_delay_ms())
        .map(jitter)
        .take(config.retry_attempts());

    let response = RetryIf::spawn(
        strategy,
        || client.get_json::<ApiResponse<GpsDeviceGet>>(&url),
        |e: &BackendError| {
            let transient = e.is_transient();
            if transient {
                warn!("⚠️ Resolving GPS device '{}' failed: {}. Retrying...", device_id, e);
            }
            transient
        },
    )
    .await?;

    let device = to_tracked_device(response.data)?;
    info!(traccar_id = device.traccar_id, "🌐 Resolving GPS device '{}'... OK, '{}'", device_id, device.label);
    Ok(device)
}

fn to_tracked_device(device: Option<GpsDeviceGet>) -> Result<TrackedDevice, DeviceResolveError> {
    let device = device.ok_or(DeviceResolveError::MissingCode)?;
    let code = device.codigo.as_deref().map(str::trim).unwrap_or_default();
    if code.is_empty() {
        return Err(DeviceResolveError::MissingCode);
    }

    let traccar_id = code
        .parse::<i64>()
        .map_err(|_| DeviceResolveError::NonNumericCode(code.to_string()))?;

    let label = match device.modelo.as_deref().map(str::trim) {
        Some(model) if !model.is_empty() => model.to_string(),
        _ => format!("ID {}", traccar_id),
    };

    Ok(TrackedDevice { traccar_id, label })
}

#[derive(Error, Debug)]
pub enum DeviceResolveError {
    #[error("No GPS device assigned to the vehicle.")]
    NoDeviceAssigned,
    #[error("The GPS device has no valid identifier.")]
    MissingCode,
    #[error("The GPS device has no numeric identifier: '{0}'.")]
    NonNumericCode(String),
    #[error(transparent)]
    Backend(#[from] BackendError),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app_config::AppConfigBuilder;
    use crate::auth::AuthSession;
    use crate::backend::new_client;
    use pretty_assertions::assert_eq;
    use rstest::rstest;
    use serde_json::{Value, json};

    fn device_get(value: Value) -> Option<GpsDeviceGet> {
        serde_json::from_value(value).unwrap()
    }

    #[rstest]
    #[case::model_label(json!({ "codigo": "7", "modelo": "Teltonika FMB920" }), 7, "Teltonika FMB920")]
    #[case::numeric_code(json!({ "codigo": 12 }), 12, "ID 12")]
    #[case::blank_model(json!({ "codigo": " 3 ", "modelo": "  " }), 3, "ID 3")]
    fn maps_devices(#[case] value: Value, #[case] traccar_id: i64, #[case] label: &str) {
        let device = to_tracked_device(device_get(value)).unwrap();
        assert_eq!(
            device,
            TrackedDevice {
                traccar_id,
                label: label.to_string()
            }
        );
    }

    #[rstest]
    #[case::missing(json!(null))]
    #[case::no_code(json!({ "modelo": "FMB920" }))]
    #[case::blank_code(json!({ "codigo": "  " }))]
    fn rejects_devices_without_code(#[case] value: Value) {
        assert!(matches!(to_tracked_device(device_get(value)), Err(DeviceResolveError::MissingCode)));
    }

    #[test]
    fn rejects_non_numeric_codes() {
        let result = to_tracked_device(device_get(json!({ "codigo": "FMB-7" })));
        assert!(matches!(result, Err(DeviceResolveError::NonNumericCode(code)) if code == "FMB-7"));
    }

    #[tokio::test]
    async fn resolves_a_device_through_the_backend() -> Result<(), DeviceResolveError> {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/api/v1/dispositivosGps/id/12")
            .with_status(200)
            .with_body(json!({ "data": { "codigo": "7", "modelo": "FMB920" } }).to_string())
            .create_async()
            .await;

        let config = AppConfigBuilder::new().backend_url(server.url()).build();
        let client = new_client(config.backend(), &AuthSession::with_token("token"))?;

        let device = resolve_device(&client, config.backend(), " 12 ").await?;

        mock.assert_async().await;
        assert_eq!(device.traccar_id, 7);
        assert_eq!(device.label, "FMB920");

        Ok(())
    }

    #[tokio::test]
    async fn retries_server_errors() -> Result<(), DeviceResolveError> {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/api/v1/dispositivosGps/id/12")
            .with_status(502)
            .expect(3)
            .create_async()
            .await;

        let config = AppConfigBuilder::new().backend_url(server.url()).build();
        let client = new_client(config.backend(), &AuthSession::with_token("token"))?;

        let result = resolve_device(&client, config.backend(), "12").await;

        mock.assert_async().await;
        assert!(matches!(result, Err(DeviceResolveError::Backend(BackendError::Status { .. }))));

        Ok(())
    }

    #[tokio::test]
    async fn does_not_retry_client_errors() -> Result<(), DeviceResolveError> {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/api/v1/dispositivosGps/id/12")
            .with_status(404)
            .with_body("device not found")
            .expect(1)
            .create_async()
            .await;

        let config = AppConfigBuilder::new().backend_url(server.url()).build();
        let client = new_client(config.backend(), &AuthSession::with_token("token"))?;

        let result = resolve_device(&client, config.backend(), "12").await;

        mock.assert_async().await;
        assert!(matches!(result, Err(DeviceResolveError::Backend(BackendError::Status { .. }))));

        Ok(())
    }

    #[tokio::test]
    async fn a_blank_device_id_means_no_device() -> Result<(), DeviceResolveError> {
        let config = AppConfigBuilder::new().build();
        let client = new_client(config.backend(), &AuthSession::with_token("token"))?;

        let result = resolve_device(&client, config.backend(), "  ").await;

        assert!(matches!(result, Err(DeviceResolveError::NoDeviceAssigned)));

        Ok(())
    }
}
