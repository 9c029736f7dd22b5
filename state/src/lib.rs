//! SQLite-backed storage for ingested log records.
//!
//! This crate owns the severity model, the idempotent schema provisioner and
//! the [`LogStore`] contract. Request validation and the deletion policy live
//! in `logvault-service`.

mod migrations;
mod model;
mod runtime;
mod store;

pub use migrations::SchemaState;
pub use model::INVALID_RANK;
pub use model::LogFlag;
pub use model::LogRecord;
pub use model::NewLogRecord;
pub use model::rank_of;
/// Preferred entrypoint: owns the connection pool and schema lifecycle.
pub use runtime::LogRuntime;
pub use runtime::LOG_DB_FILENAME;
pub use store::DeleteOutcome;
pub use store::LogStore;
