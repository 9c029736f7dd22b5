//! Idempotent provisioning of the log schema.
//!
//! Every step checks the catalog before creating or dropping anything, so
//! `apply` and `revert` can be re-run at any point, including by several
//! processes starting against the same database. A step that loses a creation
//! race falls through its `IF NOT EXISTS` / `ON CONFLICT DO NOTHING` clauses
//! instead of failing. Nothing is rolled back across steps: a failed run is
//! resumed by running it again.

use anyhow::Context;
use anyhow::Result;
use sqlx::QueryBuilder;
use sqlx::Sqlite;
use sqlx::SqlitePool;
use tracing::debug;
use tracing::info;

use crate::LogFlag;

/// SQLite has no `CREATE TYPE`; the flag enum is a lookup table that the
/// `logs.flag` column references.
pub(crate) const FLAG_TYPE_NAME: &str = "log_flag";
pub(crate) const LOG_TABLE_NAME: &str = "logs";

/// Which schema objects currently exist.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SchemaState {
    pub flag_type: bool,
    pub log_table: bool,
}

impl SchemaState {
    pub fn is_provisioned(self) -> bool {
        self.flag_type && self.log_table
    }

    pub fn is_empty(self) -> bool {
        !self.flag_type && !self.log_table
    }
}

pub(crate) async fn apply(pool: &SqlitePool) -> Result<()> {
    // Record ids are UUID v4 values minted by the store, so SQLite needs no
    // extension for identifier generation.
    ensure_flag_type(pool)
        .await
        .with_context(|| format!("failed to provision `{FLAG_TYPE_NAME}` type"))?;
    ensure_log_table(pool)
        .await
        .with_context(|| format!("failed to provision `{LOG_TABLE_NAME}` table"))?;
    Ok(())
}

pub(crate) async fn revert(pool: &SqlitePool) -> Result<()> {
    // `logs.flag` references the flag type, so the table goes first.
    drop_table_if_exists(pool, LOG_TABLE_NAME)
        .await
        .with_context(|| format!("failed to drop `{LOG_TABLE_NAME}` table"))?;
    drop_table_if_exists(pool, FLAG_TYPE_NAME)
        .await
        .with_context(|| format!("failed to drop `{FLAG_TYPE_NAME}` type"))?;
    Ok(())
}

pub(crate) async fn schema_state(pool: &SqlitePool) -> Result<SchemaState> {
    Ok(SchemaState {
        flag_type: table_exists(pool, FLAG_TYPE_NAME).await?,
        log_table: table_exists(pool, LOG_TABLE_NAME).await?,
    })
}

async fn ensure_flag_type(pool: &SqlitePool) -> Result<()> {
    if table_exists(pool, FLAG_TYPE_NAME).await? {
        debug!("`{FLAG_TYPE_NAME}` type already present");
        return Ok(());
    }

    let mut tx = pool.begin().await?;
    sqlx::query(
        r#"
CREATE TABLE IF NOT EXISTS log_flag (
    name TEXT PRIMARY KEY NOT NULL,
    rank INTEGER NOT NULL UNIQUE
)
        "#,
    )
    .execute(&mut *tx)
    .await?;

    let mut seed = QueryBuilder::<Sqlite>::new("INSERT INTO log_flag (name, rank) ");
    seed.push_values(LogFlag::ALL, |mut row, flag| {
        row.push_bind(flag.as_str()).push_bind(flag.rank());
    });
    seed.push(" ON CONFLICT(name) DO NOTHING");
    seed.build().execute(&mut *tx).await?;
    tx.commit().await?;

    info!("created `{FLAG_TYPE_NAME}` type");
    Ok(())
}

async fn ensure_log_table(pool: &SqlitePool) -> Result<()> {
    if table_exists(pool, LOG_TABLE_NAME).await? {
        debug!("`{LOG_TABLE_NAME}` table already present");
        return Ok(());
    }

    let mut tx = pool.begin().await?;
    sqlx::query(
        r#"
CREATE TABLE IF NOT EXISTS logs (
    id TEXT PRIMARY KEY NOT NULL,
    flag TEXT NOT NULL DEFAULT 'info' REFERENCES log_flag(name),
    message TEXT NOT NULL CHECK (message <> ''),
    timestamp INTEGER NOT NULL
)
        "#,
    )
    .execute(&mut *tx)
    .await?;
    sqlx::query("CREATE INDEX IF NOT EXISTS idx_logs_timestamp ON logs(timestamp)")
        .execute(&mut *tx)
        .await?;
    sqlx::query("CREATE INDEX IF NOT EXISTS idx_logs_flag ON logs(flag)")
        .execute(&mut *tx)
        .await?;
    tx.commit().await?;

    info!("created `{LOG_TABLE_NAME}` table");
    Ok(())
}

async fn drop_table_if_exists(pool: &SqlitePool, name: &str) -> Result<()> {
    if !table_exists(pool, name).await? {
        debug!("`{name}` absent, nothing to drop");
        return Ok(());
    }
    // Identifiers cannot be bound; `name` is always one of the constants above.
    sqlx::query(&format!("DROP TABLE IF EXISTS {name}"))
        .execute(pool)
        .await?;
    info!("dropped `{name}`");
    Ok(())
}

async fn table_exists(pool: &SqlitePool, name: &str) -> Result<bool> {
    let count: i64 =
        sqlx::query_scalar("SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = ?")
            .bind(name)
            .fetch_one(pool)
            .await?;
    Ok(count > 0)
}

#[cfg(test)]
mod tests {
    use super::SchemaState;
    use crate::LogFlag;
    use crate::LogStore;
    use crate::NewLogRecord;
    use crate::runtime::test_support::open_unprovisioned;
    use crate::runtime::test_support::unique_temp_dir;
    use pretty_assertions::assert_eq;
    use sqlx::Row;

    #[tokio::test]
    async fn fresh_database_has_no_schema() {
        let (runtime, dir) = open_unprovisioned().await;
        let state = runtime.schema_state().await.expect("schema state");
        assert_eq!(state, SchemaState::default());
        assert!(state.is_empty());

        let _ = tokio::fs::remove_dir_all(dir).await;
    }

    #[tokio::test]
    async fn apply_twice_matches_apply_once() {
        let (runtime, dir) = open_unprovisioned().await;

        runtime.provision_schema().await.expect("first apply");
        let once = runtime.schema_state().await.expect("state after one apply");
        runtime.provision_schema().await.expect("second apply");
        let twice = runtime.schema_state().await.expect("state after two applies");

        assert!(once.is_provisioned());
        assert_eq!(once, twice);

        let rows = sqlx::query("SELECT name, rank FROM log_flag ORDER BY rank")
            .fetch_all(runtime.pool())
            .await
            .expect("read flag type");
        let values: Vec<(String, i32)> = rows
            .iter()
            .map(|row| (row.get::<String, _>("name"), row.get::<i32, _>("rank")))
            .collect();
        let expected: Vec<(String, i32)> = LogFlag::ALL
            .into_iter()
            .map(|flag| (flag.as_str().to_string(), flag.rank()))
            .collect();
        assert_eq!(values, expected);

        let _ = tokio::fs::remove_dir_all(dir).await;
    }

    #[tokio::test]
    async fn reapplying_keeps_existing_records() {
        let (runtime, dir) = open_unprovisioned().await;
        runtime.provision_schema().await.expect("apply");
        let stored = runtime
            .insert_log(&NewLogRecord::new(LogFlag::Warn, "disk almost full"))
            .await
            .expect("insert");

        runtime.provision_schema().await.expect("re-apply");

        let fetched = runtime.get_log(stored.id).await.expect("get log");
        assert_eq!(fetched, Some(stored));

        let _ = tokio::fs::remove_dir_all(dir).await;
    }

    #[tokio::test]
    async fn revert_is_idempotent_and_safe_on_empty_database() {
        let (runtime, dir) = open_unprovisioned().await;

        runtime.revert_schema().await.expect("revert never provisioned");
        assert!(runtime.schema_state().await.expect("state").is_empty());

        runtime.provision_schema().await.expect("apply");
        runtime
            .insert_log(&NewLogRecord::new(LogFlag::Error, "boom"))
            .await
            .expect("insert");
        runtime.revert_schema().await.expect("first revert");
        let once = runtime.schema_state().await.expect("state after one revert");
        runtime.revert_schema().await.expect("second revert");
        let twice = runtime.schema_state().await.expect("state after two reverts");

        assert!(once.is_empty());
        assert_eq!(once, twice);

        runtime.provision_schema().await.expect("apply after revert");
        assert!(runtime.schema_state().await.expect("state").is_provisioned());
        assert_eq!(runtime.list_logs().await.expect("list"), Vec::<crate::LogRecord>::new());

        let _ = tokio::fs::remove_dir_all(dir).await;
    }

    #[tokio::test]
    async fn apply_resumes_after_partial_provisioning() {
        let (runtime, dir) = open_unprovisioned().await;
        sqlx::query("CREATE TABLE log_flag (name TEXT PRIMARY KEY NOT NULL, rank INTEGER NOT NULL UNIQUE)")
            .execute(runtime.pool())
            .await
            .expect("create flag type by hand");
        sqlx::query("INSERT INTO log_flag (name, rank) VALUES ('log', 0), ('debug', 1), ('info', 2), ('warn', 3), ('error', 4), ('trace', 5)")
            .execute(runtime.pool())
            .await
            .expect("seed flag type by hand");

        runtime.provision_schema().await.expect("resume apply");

        let state = runtime.schema_state().await.expect("state");
        assert_eq!(
            state,
            SchemaState {
                flag_type: true,
                log_table: true,
            }
        );

        let _ = tokio::fs::remove_dir_all(dir).await;
    }

    #[tokio::test]
    async fn concurrent_apply_from_two_processes_succeeds() {
        let dir = unique_temp_dir();
        let db_path = dir.join(crate::LOG_DB_FILENAME);
        let first = crate::LogRuntime::open(db_path.clone())
            .await
            .expect("open first runtime");
        let second = crate::LogRuntime::open(db_path)
            .await
            .expect("open second runtime");

        let (a, b) = tokio::join!(first.provision_schema(), second.provision_schema());
        a.expect("first apply");
        b.expect("second apply");

        assert!(first.schema_state().await.expect("state").is_provisioned());
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM log_flag")
            .fetch_one(second.pool())
            .await
            .expect("count flags");
        assert_eq!(count, LogFlag::ALL.len() as i64);

        let _ = tokio::fs::remove_dir_all(dir).await;
    }

    #[tokio::test]
    async fn flag_column_rejects_values_outside_the_enum() {
        let (runtime, dir) = open_unprovisioned().await;
        runtime.provision_schema().await.expect("apply");

        let result = sqlx::query(
            "INSERT INTO logs (id, flag, message, timestamp) VALUES ('x', 'fatal', 'nope', 0)",
        )
        .execute(runtime.pool())
        .await;
        assert!(result.is_err());

        let result = sqlx::query(
            "INSERT INTO logs (id, flag, message, timestamp) VALUES ('y', 'info', '', 0)",
        )
        .execute(runtime.pool())
        .await;
        assert!(result.is_err());

        let _ = tokio::fs::remove_dir_all(dir).await;
    }
}
