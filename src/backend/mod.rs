mod api_response;
mod client;
mod gps_device;

pub use client::new_client;
pub use gps_device::{DeviceResolveError, resolve_device};
