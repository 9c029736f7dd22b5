use serde::Deserialize;
use serde::Serialize;
use strum_macros::Display;

/// Rank reported for strings outside the canonical flag set.
pub const INVALID_RANK: i32 = -1;

/// Severity flag attached to every log record.
///
/// Variants are declared in rank order, so the derived `Ord` agrees with
/// [`LogFlag::rank`]. The rank is a deletion-eligibility ordering rather than
/// a conventional severity scale: `trace` ranks above `error`.
#[derive(
    Debug,
    Default,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
    Display,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum LogFlag {
    Log,
    Debug,
    #[default]
    Info,
    Warn,
    Error,
    Trace,
}

impl LogFlag {
    /// Every canonical flag, lowest rank first.
    pub const ALL: [LogFlag; 6] = [
        LogFlag::Log,
        LogFlag::Debug,
        LogFlag::Info,
        LogFlag::Warn,
        LogFlag::Error,
        LogFlag::Trace,
    ];

    pub const fn as_str(self) -> &'static str {
        match self {
            LogFlag::Log => "log",
            LogFlag::Debug => "debug",
            LogFlag::Info => "info",
            LogFlag::Warn => "warn",
            LogFlag::Error => "error",
            LogFlag::Trace => "trace",
        }
    }

    pub const fn rank(self) -> i32 {
        match self {
            LogFlag::Log => 0,
            LogFlag::Debug => 1,
            LogFlag::Info => 2,
            LogFlag::Warn => 3,
            LogFlag::Error => 4,
            LogFlag::Trace => 5,
        }
    }

    /// Trim and lower-case `raw`, then match it against the canonical set.
    pub fn parse(raw: &str) -> Option<Self> {
        let normalized = raw.trim().to_lowercase();
        Self::ALL
            .into_iter()
            .find(|flag| flag.as_str() == normalized)
    }
}

/// Rank of a free-form flag string, or [`INVALID_RANK`] when it is not canonical.
pub fn rank_of(raw: &str) -> i32 {
    LogFlag::parse(raw).map_or(INVALID_RANK, LogFlag::rank)
}

#[cfg(test)]
mod tests {
    use super::INVALID_RANK;
    use super::LogFlag;
    use super::rank_of;
    use pretty_assertions::assert_eq;

    #[test]
    fn ranks_follow_declaration_order() {
        let ranks: Vec<i32> = LogFlag::ALL.into_iter().map(LogFlag::rank).collect();
        assert_eq!(ranks, vec![0, 1, 2, 3, 4, 5]);

        let mut sorted = LogFlag::ALL;
        sorted.sort();
        assert_eq!(sorted, LogFlag::ALL);
        assert!(LogFlag::Error < LogFlag::Trace);
    }

    #[test]
    fn parse_normalizes_case_and_whitespace() {
        for raw in ["warn", "WARN", " warn ", "\tWaRn\n"] {
            assert_eq!(LogFlag::parse(raw), Some(LogFlag::Warn), "input {raw:?}");
        }
        assert_eq!(LogFlag::parse("trace"), Some(LogFlag::Trace));
    }

    #[test]
    fn unknown_strings_get_the_invalid_rank() {
        for raw in ["", "   ", "fatal", "warning", "in fo"] {
            assert_eq!(LogFlag::parse(raw), None, "input {raw:?}");
            assert_eq!(rank_of(raw), INVALID_RANK, "input {raw:?}");
        }
        assert_eq!(rank_of(" Error "), 4);
    }

    #[test]
    fn display_and_serde_use_the_canonical_names() {
        for flag in LogFlag::ALL {
            assert_eq!(flag.to_string(), flag.as_str());
            let json = serde_json::to_string(&flag).expect("serialize flag");
            assert_eq!(json, format!("\"{}\"", flag.as_str()));
        }
        assert_eq!(LogFlag::default(), LogFlag::Info);
    }
}
