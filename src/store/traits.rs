//! `RateLimitStore` trait — the single persisted resource in the system.

use async_trait::async_trait;

use crate::error::StoreError;

/// Persisted mapping from sender address to last-accepted-request time
/// (epoch seconds). One record per sender, upsert-only, never deleted.
#[async_trait]
pub trait RateLimitStore: Send + Sync {
    /// Point lookup of a sender's last accepted request time.
    async fn last_request_at(&self, sender: &str) -> Result<Option<i64>, StoreError>;

    /// Check the cooldown and charge it in one atomic write.
    ///
    /// Returns `true` and records `now` if the sender has no prior record
    /// or the prior record is at least `cooldown_secs` old. Returns `false`
    /// (leaving the stored timestamp untouched) otherwise. The charge
    /// happens before any downstream processing, so a slow or failing
    /// generation still counts against the window.
    async fn try_begin_request(
        &self,
        sender: &str,
        now: i64,
        cooldown_secs: u64,
    ) -> Result<bool, StoreError>;
}
