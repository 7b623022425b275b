mod coordinate;
mod delivery_run;
mod delivery_stop;
mod route_point;
mod tracked_device;

pub use coordinate::Coordinate;
pub use delivery_run::DeliveryRun;
pub use delivery_stop::{DeliveryStatus, DeliveryStop};
pub use route_point::RoutePoint;
pub use tracked_device::TrackedDevice;
