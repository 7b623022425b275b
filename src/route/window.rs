use chrono::{DateTime, Local, NaiveDate, Utc};

/// The time range to request positions for, derived from a run's delivery date.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TrackingWindow {
    from: DateTime<Utc>,
    to: DateTime<Utc>,
    should_poll: bool,
}

impl TrackingWindow {
    /// Resolves the window against the local calendar day. `None` when there is no usable date.
    pub fn resolve(delivery_date: Option<&str>) -> Option<Self> {
        Self::for_date(delivery_date?, Local::now().date_naive(), Utc::now())
    }

    pub fn for_date(delivery_date: &str, today: NaiveDate, now: DateTime<Utc>) -> Option<Self> {
        let date = parse_delivery_date(delivery_date)?;
        let from = date.and_hms_opt(0, 0, 0)?.and_utc();

        if date == today {
            return Some(TrackingWindow {
                from,
                to: now,
                should_poll: true,
            });
        }

        let to = date.and_hms_milli_opt(23, 59, 59, 999)?.and_utc();
        Some(TrackingWindow {
            from,
            to,
            should_poll: false,
        })
    }

    pub fn from(&self) -> DateTime<Utc> {
        self.from
    }

    pub fn to(&self) -> DateTime<Utc> {
        self.to
    }

    /// Whether the run is happening today and positions should keep being polled.
    pub fn should_poll(&self) -> bool {
        self.should_poll
    }

    /// Upper bound of a request issued at `now`. A live window always reaches up to now.
    pub fn request_to(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        if self.should_poll { now } else { self.to }
    }
}

fn parse_delivery_date(value: &str) -> Option<NaiveDate> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return None;
    }

    // "2025-03-10T00:00:00" and friends, only the date part matters
    let date_part = match trimmed.get(..10) {
        Some(prefix) if is_iso_date(prefix) => prefix,
        _ => trimmed,
    };

    let mut parts = date_part.split('-');
    let (Some(year), Some(month), Some(day), None) = (parts.next(), parts.next(), parts.next(), parts.next()) else {
        return None;
    };

    NaiveDate::from_ymd_opt(year.trim().parse().ok()?, month.trim().parse().ok()?, day.trim().parse().ok()?)
}

fn is_iso_date(value: &str) -> bool {
    value.len() == 10
        && value.bytes().enumerate().all(|(index, byte)| match index {
            4 | 7 => byte == b'-',
            _ => byte.is_ascii_digit(),
        })
}
