mod base_url;
mod client;
mod devices;
mod query;

pub use client::{TraccarClientError, new_client};
pub use devices::fetch_devices_with_positions;
pub use query::{PositionsQuery, RouteQuery};
