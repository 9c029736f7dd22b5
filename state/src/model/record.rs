use anyhow::Result;
use chrono::DateTime;
use chrono::Utc;
use serde::Serialize;
use sqlx::FromRow;
use uuid::Uuid;

use super::LogFlag;

/// A persisted log record. Records are never updated in place.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LogRecord {
    /// Store-generated identifier.
    pub id: Uuid,
    pub flag: LogFlag,
    pub message: String,
    /// Insert time, truncated to microsecond precision.
    pub timestamp: DateTime<Utc>,
}

/// A record that has not been stored yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewLogRecord {
    pub flag: LogFlag,
    pub message: String,
    /// Explicit timestamp. The store uses the current time when unset.
    pub timestamp: Option<DateTime<Utc>>,
}

impl NewLogRecord {
    pub fn new(flag: LogFlag, message: impl Into<String>) -> Self {
        Self {
            flag,
            message: message.into(),
            timestamp: None,
        }
    }

    pub fn at(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = Some(timestamp);
        self
    }
}

#[derive(Debug, Clone, FromRow)]
pub(crate) struct LogRow {
    pub id: String,
    pub flag: String,
    pub message: String,
    pub timestamp: i64,
}

impl TryFrom<LogRow> for LogRecord {
    type Error = anyhow::Error;

    fn try_from(row: LogRow) -> Result<Self> {
        let flag = LogFlag::parse(&row.flag)
            .ok_or_else(|| anyhow::anyhow!("invalid stored log flag: {}", row.flag))?;
        Ok(Self {
            id: Uuid::parse_str(&row.id)?,
            flag,
            message: row.message,
            timestamp: epoch_micros_to_datetime(row.timestamp)?,
        })
    }
}

pub(crate) fn datetime_to_epoch_micros(dt: DateTime<Utc>) -> i64 {
    dt.timestamp_micros()
}

pub(crate) fn epoch_micros_to_datetime(micros: i64) -> Result<DateTime<Utc>> {
    DateTime::<Utc>::from_timestamp_micros(micros)
        .ok_or_else(|| anyhow::anyhow!("invalid unix timestamp (micros): {micros}"))
}

/// Drop sub-microsecond precision so a stored value compares equal to the
/// one handed back from the insert.
pub(crate) fn truncate_to_micros(dt: DateTime<Utc>) -> Result<DateTime<Utc>> {
    epoch_micros_to_datetime(datetime_to_epoch_micros(dt))
}
