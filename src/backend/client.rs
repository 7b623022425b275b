use crate::app_config::Backend;
use crate::auth::AuthSession;
use reqwest::header::{self, HeaderValue};
use reqwest::{Client, StatusCode, Url};
use serde::de::DeserializeOwned;
use thiserror::Error;
use tracing::debug;

/// HTTP client for the dispatch backend, every request carries the session's bearer token.
#[derive(Debug, Clone)]
pub struct BackendClient {
    client: Client,
    base_url: String,
}

pub fn new_client(config: &Backend, session: &AuthSession) -> Result<BackendClient, BackendError> {
    let token = session.token().ok_or(BackendError::MissingToken)?;

    let mut headers = header::HeaderMap::new();
    let mut authorization_value = HeaderValue::from_str(&format!("Bearer {}", token))?;
    authorization_value.set_sensitive(true);
    headers.insert(header::AUTHORIZATION, authorization_value);
    headers.insert(header::ACCEPT, HeaderValue::from_static("application/json"));

    let client = Client::builder().default_headers(headers).build()?;
    Ok(BackendClient {
        client,
        base_url: config.url().trim_end_matches('/').to_string(),
    })
}

impl BackendClient {
    /// Resolves `path` against the base URL. Absolute URLs are used as they are.
    pub fn url(&self, path: &str) -> String {
        if is_absolute_url(path) {
            return path.to_string();
        }

        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    /// Appends percent-encoded `segments` to the base URL.
    pub fn segment_url(&self, segments: &[&str]) -> Result<String, BackendError> {
        let mut url = Url::parse(&self.base_url).map_err(|e| BackendError::InvalidUrl(format!("{}: {}", self.base_url, e)))?;
        url.path_segments_mut()
            .map_err(|_| BackendError::InvalidUrl(self.base_url.clone()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url.to_string())
    }

    pub async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, BackendError> {
        let url = self.url(path);
        debug!("🌐 GET {}", url);

        let response = self.client.get(&url).send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(BackendError::Status { status, body });
        }

        Ok(response.json::<T>().await?)
    }
}

fn is_absolute_url(value: &str) -> bool {
    let lowercase = value.to_ascii_lowercase();
    lowercase.starts_with("http://") || lowercase.starts_with("https://") || lowercase.starts_with("//")
}

#[derive(Error, Debug)]
pub enum BackendError {
    #[error("no auth token available for API requests")]
    MissingToken,
    #[error("request error: {0}")]
    RequestError(#[from] reqwest::Error),
    #[error("backend client set an invalid header value: {0}")]
    InvalidHeaderValue(#[from] header::InvalidHeaderValue),
    #[error("invalid backend URL {0}")]
    InvalidUrl(String),
    #[error("backend responded with {status}: {body}")]
    Status { status: StatusCode, body: String },
}

impl BackendError {
    /// Whether repeating the request could succeed.
    pub fn is_transient(&self) -> bool {
        match self {
            BackendError::RequestError(e) => e.is_connect() || e.is_timeout(),
            BackendError::Status { status, .. } => status.is_server_error(),
            _ => false,
        }
    }

    /// Whether the backend rejected the bearer token.
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, BackendError::Status { status, .. } if *status == StatusCode::UNAUTHORIZED)
    }
}
