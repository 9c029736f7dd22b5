use async_trait::async_trait;
use chrono::DateTime;
use chrono::Utc;
use uuid::Uuid;

use crate::LogFlag;
use crate::LogRecord;
use crate::NewLogRecord;

/// Result of a rank-gated delete.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeleteOutcome {
    /// The record ranked below the ceiling and was removed.
    Deleted(LogRecord),
    /// The record ranks at or above the ceiling; nothing was mutated.
    Denied(LogRecord),
}

/// Persistence contract for log records.
///
/// Absence is reported as `Ok(None)`; `Err` always means a backend failure.
/// Implementations never retry.
#[async_trait]
pub trait LogStore: Send + Sync {
    /// Insert one record inside its own transaction, minting its id and,
    /// when unset, its timestamp.
    async fn insert_log(&self, record: &NewLogRecord) -> anyhow::Result<LogRecord>;

    async fn get_log(&self, id: Uuid) -> anyhow::Result<Option<LogRecord>>;

    /// The record with the greatest timestamp not after `ts`. Ties between
    /// equal timestamps are resolved arbitrarily.
    async fn latest_log_at_or_before(
        &self,
        ts: DateTime<Utc>,
    ) -> anyhow::Result<Option<LogRecord>>;

    async fn list_logs(&self) -> anyhow::Result<Vec<LogRecord>>;

    async fn list_logs_by_flag(&self, flag: LogFlag) -> anyhow::Result<Vec<LogRecord>>;

    /// Remove a record unconditionally. Returns the number of rows removed;
    /// removing an absent record is not an error.
    async fn delete_log(&self, id: Uuid) -> anyhow::Result<u64>;

    /// Delete `id` only if its flag ranks below `rank_ceiling`. The check and
    /// the removal are one statement, so concurrent callers never observe a
    /// half-applied delete. Returns `None` when the record does not exist.
    async fn delete_log_below_rank(
        &self,
        id: Uuid,
        rank_ceiling: i32,
    ) -> anyhow::Result<Option<DeleteOutcome>>;
}
