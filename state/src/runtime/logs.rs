use async_trait::async_trait;
use chrono::DateTime;
use chrono::Utc;
use tracing::debug;
use uuid::Uuid;

use super::LogRuntime;
use crate::DeleteOutcome;
use crate::LogFlag;
use crate::LogRecord;
use crate::LogStore;
use crate::NewLogRecord;
use crate::model::LogRow;
use crate::model::datetime_to_epoch_micros;
use crate::model::truncate_to_micros;

const SELECT_LOG_COLUMNS: &str = "SELECT id, flag, message, timestamp FROM logs";

fn rows_to_records(rows: Vec<LogRow>) -> anyhow::Result<Vec<LogRecord>> {
    rows.into_iter().map(LogRecord::try_from).collect()
}

#[async_trait]
impl LogStore for LogRuntime {
    async fn insert_log(&self, record: &NewLogRecord) -> anyhow::Result<LogRecord> {
        let id = Uuid::new_v4();
        let timestamp = truncate_to_micros(record.timestamp.unwrap_or_else(Utc::now))?;

        let mut tx = self.pool.begin().await?;
        sqlx::query("INSERT INTO logs (id, flag, message, timestamp) VALUES (?, ?, ?, ?)")
            .bind(id.to_string())
            .bind(record.flag.as_str())
            .bind(record.message.as_str())
            .bind(datetime_to_epoch_micros(timestamp))
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;

        Ok(LogRecord {
            id,
            flag: record.flag,
            message: record.message.clone(),
            timestamp,
        })
    }

    async fn get_log(&self, id: Uuid) -> anyhow::Result<Option<LogRecord>> {
        let row = sqlx::query_as::<_, LogRow>(&format!("{SELECT_LOG_COLUMNS} WHERE id = ?"))
            .bind(id.to_string())
            .fetch_optional(self.pool.as_ref())
            .await?;
        row.map(LogRecord::try_from).transpose()
    }

    async fn latest_log_at_or_before(
        &self,
        ts: DateTime<Utc>,
    ) -> anyhow::Result<Option<LogRecord>> {
        let row = sqlx::query_as::<_, LogRow>(&format!(
            "{SELECT_LOG_COLUMNS} WHERE timestamp <= ? ORDER BY timestamp DESC LIMIT 1"
        ))
        .bind(datetime_to_epoch_micros(ts))
        .fetch_optional(self.pool.as_ref())
        .await?;
        row.map(LogRecord::try_from).transpose()
    }

    async fn list_logs(&self) -> anyhow::Result<Vec<LogRecord>> {
        let rows = sqlx::query_as::<_, LogRow>(&format!(
            "{SELECT_LOG_COLUMNS} ORDER BY timestamp ASC"
        ))
        .fetch_all(self.pool.as_ref())
        .await?;
        rows_to_records(rows)
    }

    async fn list_logs_by_flag(&self, flag: LogFlag) -> anyhow::Result<Vec<LogRecord>> {
        let rows = sqlx::query_as::<_, LogRow>(&format!(
            "{SELECT_LOG_COLUMNS} WHERE flag = ? ORDER BY timestamp ASC"
        ))
        .bind(flag.as_str())
        .fetch_all(self.pool.as_ref())
        .await?;
        rows_to_records(rows)
    }

    async fn delete_log(&self, id: Uuid) -> anyhow::Result<u64> {
        let result = sqlx::query("DELETE FROM logs WHERE id = ?")
            .bind(id.to_string())
            .execute(self.pool.as_ref())
            .await?;
        Ok(result.rows_affected())
    }

    async fn delete_log_below_rank(
        &self,
        id: Uuid,
        rank_ceiling: i32,
    ) -> anyhow::Result<Option<DeleteOutcome>> {
        // Must stay a single write statement: a deferred transaction that
        // reads before writing cannot wait on the busy handler in WAL mode.
        let mut deleted = sqlx::query_as::<_, LogRow>(
            r#"
DELETE FROM logs
WHERE id = ?
  AND flag IN (SELECT name FROM log_flag WHERE rank < ?)
RETURNING id, flag, message, timestamp
            "#,
        )
        .bind(id.to_string())
        .bind(rank_ceiling)
        .fetch_all(self.pool.as_ref())
        .await?;
        if let Some(row) = deleted.pop() {
            return Ok(Some(DeleteOutcome::Deleted(LogRecord::try_from(row)?)));
        }

        // Flags never change, so a record still present here is protected.
        match self.get_log(id).await? {
            Some(record) => {
                debug!(
                    "delete of log {id} refused: `{}` ranks at or above {rank_ceiling}",
                    record.flag
                );
                Ok(Some(DeleteOutcome::Denied(record)))
            }
            None => Ok(None),
        }
    }
}
