use crate::SchemaState;
use crate::migrations;
use log::LevelFilter;
use sqlx::ConnectOptions;
use sqlx::SqlitePool;
use sqlx::sqlite::SqliteConnectOptions;
use sqlx::sqlite::SqliteJournalMode;
use sqlx::sqlite::SqlitePoolOptions;
use sqlx::sqlite::SqliteSynchronous;
use std::path::Path;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;
use tracing::warn;

mod logs;
#[cfg(test)]
pub(crate) mod test_support;

pub const LOG_DB_FILENAME: &str = "logvault.sqlite";

/// Owns the SQLite pool backing the log store.
///
/// The pool is the only state shared between requests; SQLite serializes
/// conflicting writes.
#[derive(Clone)]
pub struct LogRuntime {
    db_path: PathBuf,
    pool: Arc<SqlitePool>,
}

impl LogRuntime {
    /// Open (creating if missing) the SQLite database at `db_path`.
    ///
    /// This does not touch the schema; call [`LogRuntime::provision_schema`]
    /// or use [`LogRuntime::init`].
    pub async fn open(db_path: PathBuf) -> anyhow::Result<Arc<Self>> {
        if let Some(parent) = db_path.parent()
            && !parent.as_os_str().is_empty()
        {
            tokio::fs::create_dir_all(parent).await?;
        }
        let existed = tokio::fs::try_exists(&db_path).await.unwrap_or(false);
        let pool = match open_sqlite(&db_path).await {
            Ok(pool) => Arc::new(pool),
            Err(err) => {
                warn!("failed to open log db at {}: {err}", db_path.display());
                return Err(err);
            }
        };
        if existed {
            info!("opened log db at {}", db_path.display());
        } else {
            info!("created log db at {}", db_path.display());
        }
        Ok(Arc::new(Self { db_path, pool }))
    }

    /// Open the database and provision its schema, failing if provisioning fails.
    pub async fn init(db_path: PathBuf) -> anyhow::Result<Arc<Self>> {
        let runtime = Self::open(db_path).await?;
        runtime.provision_schema().await?;
        Ok(runtime)
    }

    pub fn db_path(&self) -> &Path {
        self.db_path.as_path()
    }

    /// Create the flag type and log table if they are missing. Safe to re-run.
    pub async fn provision_schema(&self) -> anyhow::Result<()> {
        migrations::apply(self.pool.as_ref()).await
    }

    /// Drop the log table and flag type if they exist. Safe to re-run.
    pub async fn revert_schema(&self) -> anyhow::Result<()> {
        migrations::revert(self.pool.as_ref()).await
    }

    pub async fn schema_state(&self) -> anyhow::Result<SchemaState> {
        migrations::schema_state(self.pool.as_ref()).await
    }

    #[cfg(test)]
    pub(crate) fn pool(&self) -> &SqlitePool {
        self.pool.as_ref()
    }
}

async fn open_sqlite(path: &Path) -> anyhow::Result<SqlitePool> {
    let options = SqliteConnectOptions::new()
        .filename(path)
        .create_if_missing(true)
        .foreign_keys(true)
        .journal_mode(SqliteJournalMode::Wal)
        .synchronous(SqliteSynchronous::Normal)
        .busy_timeout(Duration::from_secs(5))
        .log_statements(LevelFilter::Off);
    let pool = SqlitePoolOptions::new()
        .max_connections(5)
        .connect_with(options)
        .await?;
    Ok(pool)
}
