use crate::app_config::Traccar;
use crate::route::records_from_payload;
use crate::traccar::base_url::normalize_base_url;
use crate::traccar::query::{PositionsQuery, RouteQuery};
use crate::tracker::PositionFeed;
use async_trait::async_trait;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use reqwest::header::{self, HeaderValue};
use reqwest::{Client, StatusCode};
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, instrument};

#[derive(Debug, Clone)]
pub struct TraccarClient {
    client: Client,
    base_url: String,
}

/// Builds a client for the Traccar API. `base_url_override` is the address persisted in the
/// session, it wins over the configured one.
pub fn new_client(config: &Traccar, base_url_override: Option<&str>) -> Result<TraccarClient, TraccarClientError> {
    let mut headers = header::HeaderMap::new();
    let credentials = STANDARD.encode(format!("{}:{}", config.email(), config.password()));
    let mut authorization_value = HeaderValue::from_str(&format!("Basic {}", credentials))?;
    authorization_value.set_sensitive(true);
    headers.insert(header::AUTHORIZATION, authorization_value);
    headers.insert(header::ACCEPT, HeaderValue::from_static("application/json"));

    let client = Client::builder().default_headers(headers).build()?;
    let base_url = normalize_base_url(base_url_override.unwrap_or(config.url()), config.url());
    debug!(base_url, "📡 Using Traccar at {}", base_url);

    Ok(TraccarClient { client, base_url })
}

impl TraccarClient {
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn url(&self, path: &str) -> String {
        match path {
            "" => self.base_url.clone(),
            path if path.starts_with('/') => format!("{}{}", self.base_url, path),
            path => format!("{}/{}", self.base_url, path),
        }
    }

    #[instrument(skip(self))]
    pub async fn fetch_devices(&self) -> Result<Vec<Value>, TraccarClientError> {
        self.fetch_records("/api/devices", &[], "Unable to fetch the Traccar devices").await
    }

    #[instrument(skip(self))]
    pub async fn fetch_positions(&self, query: &PositionsQuery) -> Result<Vec<Value>, TraccarClientError> {
        self.fetch_records("/api/positions", &query.to_params(), "Unable to fetch the device positions")
            .await
    }

    #[instrument(skip(self))]
    pub async fn fetch_device_route(&self, query: &RouteQuery) -> Result<Vec<Value>, TraccarClientError> {
        if query.device_id <= 0 {
            return Err(TraccarClientError::InvalidParameter("deviceId"));
        }
        if query.from > query.to {
            return Err(TraccarClientError::InvalidParameter("from"));
        }

        self.fetch_records("/api/reports/route", &query.to_params(), "Unable to fetch the device route")
            .await
    }

    async fn fetch_records(&self, path: &str, params: &[(&'static str, String)], failure: &str) -> Result<Vec<Value>, TraccarClientError> {
        let url = self.url(path);
        debug!("📡 GET {} {:?}", url, params);

        let response = self.client.get(&url).query(params).send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = match body.trim() {
                "" => format!("{} ({})", failure, status.as_u16()),
                body => body.to_string(),
            };
            return Err(TraccarClientError::Status { status, message });
        }

        if status == StatusCode::NO_CONTENT {
            return Ok(Vec::new());
        }

        let payload = response.json::<Value>().await?;
        Ok(records_from_payload(payload))
    }
}

#[async_trait]
impl PositionFeed for TraccarClient {
    async fn positions(&self, query: &PositionsQuery) -> Result<Vec<Value>, TraccarClientError> {
        self.fetch_positions(query).await
    }
}

#[derive(Error, Debug)]
pub enum TraccarClientError {
    #[error("request error: {0}")]
    RequestError(#[from] reqwest::Error),
    #[error("Traccar client set an invalid header value: {0}")]
    InvalidHeaderValue(#[from] header::InvalidHeaderValue),
    #[error("{message}")]
    Status { status: StatusCode, message: String },
    #[error("a valid '{0}' is required to fetch the route report")]
    InvalidParameter(&'static str),
}
