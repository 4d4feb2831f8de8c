use time::format_description::well_known::Rfc3339;
use time::OffsetDateTime;

use crate::schema::Timestamp;

/// Current wall-clock time in milliseconds since the Unix epoch.
#[must_use]
pub fn now_millis() -> Timestamp {
    let nanos = OffsetDateTime::now_utc().unix_timestamp_nanos();
    Timestamp::try_from(nanos / 1_000_000).unwrap_or(Timestamp::MAX)
}

/// Formats an epoch-millisecond timestamp as RFC3339, or `None` when out of range.
#[must_use]
pub fn format_timestamp(millis: Timestamp) -> Option<String> {
    let nanos = i128::from(millis) * 1_000_000;
    OffsetDateTime::from_unix_timestamp_nanos(nanos)
        .ok()
        .and_then(|datetime| datetime.format(&Rfc3339).ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn now_is_after_2020() {
        assert!(now_millis() > 1_577_836_800_000);
    }

    #[test]
    fn format_timestamp_renders_rfc3339() {
        assert_eq!(
            format_timestamp(1_771_027_200_000).as_deref(),
            Some("2026-02-14T00:00:00Z")
        );
    }
}
