//! The storage collaborator's write contract.

use async_trait::async_trait;
use tg_domain::error::Result;
use tg_domain::records::{CrisisAlert, SessionRecord, UsageIncrement};

/// Write-only sink for gateway side effects.
///
/// Callers treat every method as best effort: an `Err` is logged and
/// dropped, never retried.
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Persist a newly raised crisis alert.
    async fn insert_crisis_alert(&self, alert: &CrisisAlert) -> Result<()>;

    /// Persist the transcript of a completed episode.
    async fn insert_session(&self, record: &SessionRecord) -> Result<()>;

    /// Add `inc.delta` to the student's counter for `inc.date`.
    async fn increment_usage(&self, inc: &UsageIncrement) -> Result<()>;

    /// Short backend name for logs and `/v1/health`.
    fn backend(&self) -> &'static str;
}
