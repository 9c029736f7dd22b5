mod flag;
mod record;

pub use flag::INVALID_RANK;
pub use flag::LogFlag;
pub use flag::rank_of;
pub use record::LogRecord;
pub use record::NewLogRecord;

pub(crate) use record::LogRow;
pub(crate) use record::datetime_to_epoch_micros;
pub(crate) use record::truncate_to_micros;
