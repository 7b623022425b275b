use chrono::{DateTime, SecondsFormat, Utc};

pub trait ToIsoMillis {
    /// Formats as `2025-03-10T12:00:00.000Z`, the form Traccar expects in query strings.
    fn to_iso_millis(&self) -> String;
}

impl ToIsoMillis for DateTime<Utc> {
    fn to_iso_millis(&self) -> String {
        self.to_rfc3339_opts(SecondsFormat::Millis, true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn formats_with_milliseconds_and_zulu() {
        let datetime = Utc.with_ymd_and_hms(2025, 3, 10, 12, 0, 0).unwrap();
        assert_eq!(datetime.to_iso_millis(), "2025-03-10T12:00:00.000Z");
    }
}
