//! Request-level operations over the log store.
//!
//! [`LogService`] validates and normalizes raw string input, enforces the
//! severity-gated deletion policy, and only then calls into a
//! [`logvault_state::LogStore`].

mod error;
mod parse;
mod service;

pub use error::ErrorKind;
pub use error::LogServiceError;
pub use error::Result;
pub use service::DELETION_RANK_CEILING;
pub use service::LogService;
pub use service::is_deletable;
