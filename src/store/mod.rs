//! Persisted per-sender request-time store backing the rate limiter.

mod libsql_backend;
mod migrations;
mod traits;

pub use libsql_backend::LibSqlStore;
pub use traits::RateLimitStore;
