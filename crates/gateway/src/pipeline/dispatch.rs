//! Fire-and-forget side-effect writes.
//!
//! Every write runs on its own tracked task so the response never waits
//! on storage. Failures are logged here and go no further.

use std::future::Future;
use std::sync::Arc;

use tg_domain::error::Result;
use tg_domain::records::{CrisisAlert, SessionRecord, UsageIncrement};
use tg_records::RecordStore;
use tokio_util::task::TaskTracker;

#[derive(Clone)]
pub struct SideEffectDispatcher {
    store: Arc<dyn RecordStore>,
    tracker: TaskTracker,
}

impl SideEffectDispatcher {
    pub fn new(store: Arc<dyn RecordStore>) -> Self {
        Self {
            store,
            tracker: TaskTracker::new(),
        }
    }

    pub fn crisis_alert(&self, alert: CrisisAlert) {
        let store = self.store.clone();
        self.spawn("crisis_alert", async move { store.insert_crisis_alert(&alert).await });
    }

    pub fn session(&self, record: SessionRecord) {
        let store = self.store.clone();
        self.spawn("session", async move { store.insert_session(&record).await });
    }

    pub fn usage(&self, inc: UsageIncrement) {
        let store = self.store.clone();
        self.spawn("usage", async move { store.increment_usage(&inc).await });
    }

    fn spawn<F>(&self, kind: &'static str, write: F)
    where
        F: Future<Output = Result<()>> + Send + 'static,
    {
        let backend = self.store.backend();
        self.tracker.spawn(async move {
            if let Err(e) = write.await {
                tracing::warn!(kind, backend, error = %e, "side-effect write failed");
            }
        });
    }

    /// Writes still running.
    pub fn in_flight(&self) -> usize {
        self.tracker.len()
    }

    /// Wait for every write spawned so far. New writes may be spawned
    /// afterwards.
    pub async fn drain(&self) {
        self.tracker.close();
        self.tracker.wait().await;
        self.tracker.reopen();
    }
}
