use crate::domain::DeliveryStop;

/// A scheduled delivery run: one vehicle, one driver, one date and its stops.
#[derive(Clone, Debug, PartialEq)]
pub struct DeliveryRun {
    pub id: String,
    pub delivery_date: Option<String>,
    pub delivery_status: Option<i64>,
    pub vehicle_description: String,
    pub driver_name: String,
    /// Backend id of the GPS device installed in the vehicle, not the Traccar id.
    pub device_id: Option<String>,
    pub stops: Vec<DeliveryStop>,
}

impl DeliveryRun {
    pub fn mapped_stops(&self) -> impl Iterator<Item = &DeliveryStop> {
        self.stops.iter().filter(|stop| stop.is_mapped())
    }
}
