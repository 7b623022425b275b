use crate::domain::Coordinate;

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum DeliveryStatus {
    NotDelivered,
    Delivered,
    Late,
    Unknown,
}

impl DeliveryStatus {
    pub fn from_code(code: Option<i64>) -> Self {
        match code {
            Some(1) => DeliveryStatus::NotDelivered,
            Some(2) => DeliveryStatus::Delivered,
            Some(3) => DeliveryStatus::Late,
            _ => DeliveryStatus::Unknown,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            DeliveryStatus::NotDelivered => "Not delivered",
            DeliveryStatus::Delivered => "Delivered",
            DeliveryStatus::Late => "Late",
            DeliveryStatus::Unknown => "No status",
        }
    }

    pub fn pin_color(&self) -> &'static str {
        match self {
            DeliveryStatus::NotDelivered => "#facc15",
            DeliveryStatus::Delivered => "#22c55e",
            DeliveryStatus::Late => "#ef4444",
            DeliveryStatus::Unknown => "#9ca3af",
        }
    }
}

/// A delivery stop of a scheduled run. `coordinate` is `None` when `raw_location` could not be
/// parsed; such stops stay in the stop list but are never plotted.
#[derive(Clone, Debug, PartialEq)]
pub struct DeliveryStop {
    pub id: String,
    pub client: String,
    pub address: String,
    pub exit_number: String,
    pub priority_order: Option<i64>,
    pub status: DeliveryStatus,
    pub raw_location: String,
    pub coordinate: Option<Coordinate>,
}

impl DeliveryStop {
    pub fn is_mapped(&self) -> bool {
        self.coordinate.is_some()
    }
}
