use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use logvault_state::DeleteOutcome;
use logvault_state::LogFlag;
use logvault_state::LogRecord;
use logvault_state::LogStore;
use logvault_state::NewLogRecord;
use tracing::info;
use tracing::warn;

use crate::LogServiceError;
use crate::Result;
use crate::parse::parse_flag;
use crate::parse::parse_flag_or_default;
use crate::parse::parse_id;
use crate::parse::parse_timestamp;

/// Records whose flag ranks at or above this value cannot be deleted.
pub const DELETION_RANK_CEILING: i32 = 4;

/// Deletion policy: `log`, `debug`, `info` and `warn` records may be deleted;
/// `error` and `trace` records are protected.
pub fn is_deletable(flag: LogFlag) -> bool {
    flag.rank() < DELETION_RANK_CEILING
}

/// Validates requests and orchestrates store calls.
///
/// Cheap to clone; every clone shares the same store.
#[derive(Clone)]
pub struct LogService {
    store: Arc<dyn LogStore>,
    request_timeout: Option<Duration>,
}

impl LogService {
    pub fn new(store: Arc<dyn LogStore>) -> Self {
        Self {
            store,
            request_timeout: None,
        }
    }

    /// Bound every store call. When the bound elapses the in-flight call is
    /// dropped, rolling back any open transaction.
    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = Some(timeout);
        self
    }

    /// Ingest a record. A missing or blank `flag` defaults to `info`.
    pub async fn create(&self, flag: Option<&str>, message: &str) -> Result<LogRecord> {
        if message.trim().is_empty() {
            return Err(LogServiceError::validation("message must not be empty"));
        }
        let flag = parse_flag_or_default(flag)?;

        let record = self
            .storage(self.store.insert_log(&NewLogRecord::new(flag, message)))
            .await?;
        info!(id = %record.id, flag = %record.flag, "log created");
        Ok(record)
    }

    pub async fn fetch_by_id(&self, raw_id: &str) -> Result<LogRecord> {
        let id = parse_id(raw_id)?;
        self.storage(self.store.get_log(id))
            .await?
            .ok_or_else(|| LogServiceError::not_found(format!("log {id} not found")))
    }

    /// The newest record at or before the timestamp in `raw`.
    pub async fn fetch_at_or_before(&self, raw: &str) -> Result<LogRecord> {
        let ts = parse_timestamp(raw)?;
        self.storage(self.store.latest_log_at_or_before(ts))
            .await?
            .ok_or_else(|| {
                LogServiceError::not_found(format!("no log at or before {}", ts.to_rfc3339()))
            })
    }

    /// Every record carrying the flag in `raw`. An empty result is not an error.
    pub async fn fetch_by_flag(&self, raw: &str) -> Result<Vec<LogRecord>> {
        let flag = parse_flag(raw)?;
        self.storage(self.store.list_logs_by_flag(flag)).await
    }

    pub async fn list(&self) -> Result<Vec<LogRecord>> {
        self.storage(self.store.list_logs()).await
    }

    /// Delete a record if the deletion policy allows it, returning the
    /// removed record.
    pub async fn delete(&self, raw_id: &str) -> Result<LogRecord> {
        let id = parse_id(raw_id)?;
        match self
            .storage(self.store.delete_log_below_rank(id, DELETION_RANK_CEILING))
            .await?
        {
            Some(DeleteOutcome::Deleted(record)) => {
                info!(%id, flag = %record.flag, "log deleted");
                Ok(record)
            }
            Some(DeleteOutcome::Denied(record)) => {
                warn!(%id, flag = %record.flag, "refused to delete protected log");
                Err(LogServiceError::Forbidden {
                    id,
                    flag: record.flag,
                })
            }
            None => Err(LogServiceError::not_found(format!("log {id} not found"))),
        }
    }

    async fn storage<T, F>(&self, call: F) -> Result<T>
    where
        F: Future<Output = anyhow::Result<T>>,
    {
        let Some(timeout) = self.request_timeout else {
            return Ok(call.await?);
        };
        match tokio::time::timeout(timeout, call).await {
            Ok(result) => Ok(result?),
            Err(_) => Err(LogServiceError::Storage(anyhow::anyhow!(
                "storage call timed out after {timeout:?}"
            ))),
        }
    }
}
