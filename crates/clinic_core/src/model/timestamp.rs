//! Wire format for stored date-time values.
//!
//! Values are UTC with millisecond precision and a `Z` suffix, e.g.
//! `2024-05-01T09:30:00.000Z`. The same text is written to the store and
//! returned to callers.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::Serializer;

pub fn format_timestamp(value: DateTime<Utc>) -> String {
    value.to_rfc3339_opts(SecondsFormat::Millis, true)
}

pub(crate) fn serialize<S: Serializer>(
    value: &DateTime<Utc>,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&format_timestamp(*value))
}

pub(crate) fn serialize_optional<S: Serializer>(
    value: &Option<DateTime<Utc>>,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    match value {
        Some(value) => serialize(value, serializer),
        None => serializer.serialize_none(),
    }
}

#[cfg(test)]
mod tests {
    use super::format_timestamp;
    use chrono::{TimeZone, Utc};

    #[test]
    fn formats_whole_seconds_with_millis() {
        let value = Utc.with_ymd_and_hms(1990, 4, 12, 0, 0, 0).unwrap();
        assert_eq!(format_timestamp(value), "1990-04-12T00:00:00.000Z");
    }
}
