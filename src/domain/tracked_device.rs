/// A GPS device resolved to its Traccar identity.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TrackedDevice {
    pub traccar_id: i64,
    pub label: String,
}
