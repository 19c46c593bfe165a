//! Version qualifier handling.
//!
//! relver versions look like `<base><separator><qualifier>`, where the
//! qualifier is either a run timestamp or a build number. The qualifier of
//! the previous run doubles as the change-detection reference instant.

use chrono::{DateTime, NaiveDateTime, Utc};

/// Format the run instant with the configured pattern.
pub fn format_timestamp(instant: DateTime<Utc>, pattern: &str) -> String {
    instant.format(pattern).to_string()
}

/// Parse a timestamp qualifier back into an instant.
pub fn parse_timestamp(qualifier: &str, pattern: &str) -> Option<DateTime<Utc>> {
    NaiveDateTime::parse_from_str(qualifier, pattern)
        .ok()
        .map(|naive| naive.and_utc())
}

/// The qualifier of a version string: the part after the last `-`, if any.
pub fn version_qualifier(version: &str) -> Option<&str> {
    let (_, qualifier) = version.rsplit_once('-')?;
    Some(qualifier)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    const PATTERN: &str = "%Y%m%d%H%M%S";

    #[test]
    fn timestamp_roundtrip() {
        let instant = Utc.with_ymd_and_hms(2026, 8, 1, 12, 30, 45).unwrap();
        let formatted = format_timestamp(instant, PATTERN);
        assert_eq!(formatted, "20260801123045");
        assert_eq!(parse_timestamp(&formatted, PATTERN), Some(instant));
    }

    #[test]
    fn invalid_qualifier_does_not_parse() {
        assert!(parse_timestamp("SNAPSHOT", PATTERN).is_none());
        assert!(parse_timestamp("", PATTERN).is_none());
    }

    #[test]
    fn qualifier_extraction() {
        assert_eq!(version_qualifier("1.0.0-20260801123045"), Some("20260801123045"));
        assert_eq!(version_qualifier("1.0.0-SNAPSHOT"), Some("SNAPSHOT"));
        assert_eq!(version_qualifier("1.0.0"), None);
    }
}
