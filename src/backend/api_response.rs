use serde::Deserialize;

/// Envelope of every backend response.
#[derive(Debug, Deserialize)]
pub struct ApiResponse<T> {
    pub data: Option<T>,
}
