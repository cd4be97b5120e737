//! In-process [`RecordStore`] used by tests and throwaway dev runs.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use chrono::NaiveDate;
use parking_lot::Mutex;
use tg_domain::error::{Error, Result};
use tg_domain::records::{CrisisAlert, SessionRecord, UsageIncrement};

use crate::store::RecordStore;

#[derive(Default)]
pub struct MemoryRecordStore {
    alerts: Mutex<Vec<CrisisAlert>>,
    sessions: Mutex<Vec<SessionRecord>>,
    usage: Mutex<HashMap<(String, NaiveDate), u64>>,
    /// Number of write attempts, including failed ones.
    attempts: Mutex<u64>,
    failing: AtomicBool,
}

impl MemoryRecordStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// A store whose every write fails after being counted.
    pub fn failing() -> Self {
        let store = Self::default();
        store.failing.store(true, Ordering::SeqCst);
        store
    }

    pub fn alerts(&self) -> Vec<CrisisAlert> {
        self.alerts.lock().clone()
    }

    pub fn sessions(&self) -> Vec<SessionRecord> {
        self.sessions.lock().clone()
    }

    pub fn usage_for(&self, student_id: &str, date: NaiveDate) -> u64 {
        self.usage
            .lock()
            .get(&(student_id.to_owned(), date))
            .copied()
            .unwrap_or(0)
    }

    pub fn write_attempts(&self) -> u64 {
        *self.attempts.lock()
    }

    fn attempt(&self) -> Result<()> {
        *self.attempts.lock() += 1;
        if self.failing.load(Ordering::SeqCst) {
            return Err(Error::Storage {
                backend: "memory".into(),
                message: "simulated write failure".into(),
            });
        }
        Ok(())
    }
}

#[async_trait]
impl RecordStore for MemoryRecordStore {
    async fn insert_crisis_alert(&self, alert: &CrisisAlert) -> Result<()> {
        self.attempt()?;
        self.alerts.lock().push(alert.clone());
        Ok(())
    }

    async fn insert_session(&self, record: &SessionRecord) -> Result<()> {
        self.attempt()?;
        self.sessions.lock().push(record.clone());
        Ok(())
    }

    async fn increment_usage(&self, inc: &UsageIncrement) -> Result<()> {
        self.attempt()?;
        *self
            .usage
            .lock()
            .entry((inc.student_id.clone(), inc.date))
            .or_insert(0) += u64::from(inc.delta);
        Ok(())
    }

    fn backend(&self) -> &'static str {
        "memory"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn usage_accumulates_per_student_and_day() {
        let store = MemoryRecordStore::new();
        let inc = UsageIncrement::today("s1");
        store.increment_usage(&inc).await.unwrap();
        store.increment_usage(&inc).await.unwrap();
        store
            .increment_usage(&UsageIncrement::today("s2"))
            .await
            .unwrap();
        assert_eq!(store.usage_for("s1", inc.date), 2);
        assert_eq!(store.usage_for("s2", inc.date), 1);
        assert_eq!(store.write_attempts(), 3);
    }

    #[tokio::test]
    async fn failing_store_counts_attempts_but_keeps_nothing() {
        let store = MemoryRecordStore::failing();
        let inc = UsageIncrement::today("s1");
        assert!(store.increment_usage(&inc).await.is_err());
        assert_eq!(store.write_attempts(), 1);
        assert_eq!(store.usage_for("s1", inc.date), 0);
    }
}
