use chrono::DateTime;
use chrono::Utc;
use logvault_state::LogFlag;
use uuid::Uuid;

use crate::LogServiceError;
use crate::Result;

pub(crate) fn parse_id(raw: &str) -> Result<Uuid> {
    Uuid::parse_str(raw.trim())
        .map_err(|err| LogServiceError::validation(format!("invalid log id `{raw}`: {err}")))
}

pub(crate) fn parse_flag(raw: &str) -> Result<LogFlag> {
    LogFlag::parse(raw).ok_or_else(|| LogServiceError::validation(format!("invalid flag `{raw}`")))
}

/// Like [`parse_flag`], but a missing or blank flag means `info`.
pub(crate) fn parse_flag_or_default(raw: Option<&str>) -> Result<LogFlag> {
    match raw {
        Some(raw) if !raw.trim().is_empty() => parse_flag(raw),
        _ => Ok(LogFlag::default()),
    }
}

/// Accepts RFC 3339 (with or without fractional seconds) or integer unix seconds.
pub(crate) fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>> {
    let value = raw.trim();
    if value.is_empty() {
        return Err(LogServiceError::validation("timestamp is required"));
    }
    if let Ok(secs) = value.parse::<i64>() {
        return DateTime::<Utc>::from_timestamp(secs, 0).ok_or_else(|| {
            LogServiceError::validation(format!("timestamp `{raw}` is out of range"))
        });
    }
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|err| {
            LogServiceError::validation(format!(
                "expected RFC 3339 or unix seconds, got `{raw}`: {err}"
            ))
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ErrorKind;
    use pretty_assertions::assert_eq;

    #[test]
    fn timestamps_with_and_without_fractions() {
        let whole = parse_timestamp("2024-05-01T12:30:00Z").expect("whole seconds");
        assert_eq!(whole, DateTime::<Utc>::from_timestamp(1_714_566_600, 0).expect("ts"));

        let nanos = parse_timestamp("2024-05-01T14:30:00.123456789+02:00").expect("nanos");
        assert_eq!(
            nanos,
            DateTime::<Utc>::from_timestamp(1_714_566_600, 123_456_789).expect("ts")
        );

        let unix = parse_timestamp(" 1714566600 ").expect("unix seconds");
        assert_eq!(unix, whole);
    }

    #[test]
    fn garbage_timestamps_are_validation_errors() {
        for raw in ["", "  ", "yesterday", "2024-05-01", "2024-13-01T00:00:00Z"] {
            let err = parse_timestamp(raw).expect_err("should reject");
            assert_eq!(err.kind(), ErrorKind::Validation, "input {raw:?}");
        }
    }

    #[test]
    fn missing_or_blank_flag_defaults_to_info() {
        assert_eq!(parse_flag_or_default(None).expect("none"), LogFlag::Info);
        assert_eq!(parse_flag_or_default(Some("")).expect("empty"), LogFlag::Info);
        assert_eq!(parse_flag_or_default(Some("  ")).expect("blank"), LogFlag::Info);
        assert_eq!(parse_flag_or_default(Some("ERROR")).expect("error"), LogFlag::Error);
        assert_eq!(
            parse_flag_or_default(Some("fatal")).expect_err("fatal").kind(),
            ErrorKind::Validation
        );
    }

    #[test]
    fn ids_must_be_uuids() {
        let id = Uuid::new_v4();
        assert_eq!(parse_id(&id.to_string()).expect("hyphenated"), id);
        assert_eq!(parse_id(&id.simple().to_string()).expect("simple"), id);
        assert_eq!(parse_id("42").expect_err("short").kind(), ErrorKind::Validation);
    }
}
