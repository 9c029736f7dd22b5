use chrono::DateTime;
use chrono::Utc;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::SystemTime;
use std::time::UNIX_EPOCH;
use uuid::Uuid;

use crate::LOG_DB_FILENAME;
use crate::LogRuntime;

pub(crate) fn unique_temp_dir() -> PathBuf {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |duration| duration.as_nanos());
    std::env::temp_dir().join(format!(
        "logvault-state-runtime-test-{nanos}-{}",
        Uuid::new_v4()
    ))
}

pub(crate) async fn open_unprovisioned() -> (Arc<LogRuntime>, PathBuf) {
    let dir = unique_temp_dir();
    let runtime = LogRuntime::open(dir.join(LOG_DB_FILENAME))
        .await
        .expect("open runtime");
    (runtime, dir)
}

pub(crate) async fn open_provisioned() -> (Arc<LogRuntime>, PathBuf) {
    let dir = unique_temp_dir();
    let runtime = LogRuntime::init(dir.join(LOG_DB_FILENAME))
        .await
        .expect("initialize runtime");
    (runtime, dir)
}

pub(crate) fn ts(secs: i64) -> DateTime<Utc> {
    DateTime::<Utc>::from_timestamp(secs, 0).expect("timestamp")
}
