use crate::traccar::{PositionsQuery, TraccarClientError};
use async_trait::async_trait;
use serde_json::Value;
use std::fmt::Debug;

/// Source of raw telemetry records for the tracker.
#[async_trait]
pub trait PositionFeed: Debug + Send + Sync {
    async fn positions(&self, query: &PositionsQuery) -> Result<Vec<Value>, TraccarClientError>;
}
