//! Append-only JSON-lines record store.
//!
//! One file per record kind under the configured directory:
//! `crisis_alerts.jsonl`, `sessions.jsonl` and `usage.jsonl`. Each write is
//! a single line appended on a blocking thread. Usage totals for the
//! current UTC day are kept in memory and rebuilt from `usage.jsonl` on
//! open; earlier days are dropped when the date rolls over.

use std::collections::HashMap;
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;
use chrono::NaiveDate;
use parking_lot::{Mutex, RwLock};
use serde::{Deserialize, Serialize};
use tg_domain::error::{Error, Result};
use tg_domain::records::{CrisisAlert, SessionRecord, UsageIncrement};
use tg_domain::trace::TraceEvent;

use crate::store::RecordStore;

const ALERTS_FILE: &str = "crisis_alerts.jsonl";
const SESSIONS_FILE: &str = "sessions.jsonl";
const USAGE_FILE: &str = "usage.jsonl";

pub struct JsonlRecordStore {
    dir: PathBuf,
    /// Serialises appends so concurrent lines never interleave.
    write_lock: Arc<Mutex<()>>,
    usage: RwLock<DailyUsage>,
}

/// Per-student totals for a single day.
#[derive(Default)]
struct DailyUsage {
    date: Option<NaiveDate>,
    totals: HashMap<String, u64>,
}

impl DailyUsage {
    fn add(&mut self, student_id: &str, date: NaiveDate, delta: u32) {
        match self.date {
            Some(current) if date < current => return,
            Some(current) if date == current => {}
            _ => {
                self.totals.clear();
                self.date = Some(date);
            }
        }
        *self.totals.entry(student_id.to_owned()).or_insert(0) += u64::from(delta);
    }

    fn get(&self, student_id: &str, date: NaiveDate) -> u64 {
        if self.date != Some(date) {
            return 0;
        }
        self.totals.get(student_id).copied().unwrap_or(0)
    }

    #[cfg(test)]
    fn students(&self) -> usize {
        self.totals.len()
    }
}

#[derive(Deserialize)]
struct UsageLine {
    student_id: String,
    date: NaiveDate,
    delta: u32,
}

impl JsonlRecordStore {
    /// Open (creating if needed) the store rooted at `dir`.
    pub fn open(dir: &Path) -> Result<Self> {
        std::fs::create_dir_all(dir)?;
        let usage = replay_usage(&dir.join(USAGE_FILE))?;
        Ok(Self {
            dir: dir.to_path_buf(),
            write_lock: Arc::new(Mutex::new(())),
            usage: RwLock::new(usage),
        })
    }

    /// Total usage for a student on `date`, including replayed history.
    /// Zero for any day other than the most recent one seen.
    pub fn usage_for(&self, student_id: &str, date: NaiveDate) -> u64 {
        self.usage.read().get(student_id, date)
    }

    async fn append<T: Serialize>(&self, kind: &'static str, file: &str, record: &T) -> Result<()> {
        let mut line = serde_json::to_string(record)?;
        line.push('\n');
        let path = self.dir.join(file);
        let lock = self.write_lock.clone();
        let start = Instant::now();

        let result = tokio::task::spawn_blocking(move || {
            let _guard = lock.lock();
            let mut f = std::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(&path)?;
            f.write_all(line.as_bytes())?;
            Ok::<(), Error>(())
        })
        .await
        .map_err(|e| Error::Other(format!("spawn_blocking join: {e}")))
        .and_then(|r| r);

        TraceEvent::RecordWrite {
            kind: kind.into(),
            backend: "jsonl".into(),
            ok: result.is_ok(),
            duration_ms: start.elapsed().as_millis() as u64,
        }
        .emit();

        result.map_err(|e| Error::Storage {
            backend: "jsonl".into(),
            message: format!("{file}: {e}"),
        })
    }
}

fn replay_usage(path: &Path) -> Result<DailyUsage> {
    let mut totals = DailyUsage::default();
    let file = match std::fs::File::open(path) {
        Ok(f) => f,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(totals),
        Err(e) => return Err(e.into()),
    };
    for (idx, line) in BufReader::new(file).lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        match serde_json::from_str::<UsageLine>(&line) {
            Ok(u) => totals.add(&u.student_id, u.date, u.delta),
            // A torn final line from a crash is skipped, not fatal.
            Err(e) => tracing::warn!(line = idx + 1, error = %e, "skipping malformed usage line"),
        }
    }
    Ok(totals)
}

#[async_trait]
impl RecordStore for JsonlRecordStore {
    async fn insert_crisis_alert(&self, alert: &CrisisAlert) -> Result<()> {
        self.append("crisis_alert", ALERTS_FILE, alert).await
    }

    async fn insert_session(&self, record: &SessionRecord) -> Result<()> {
        self.append("session", SESSIONS_FILE, record).await
    }

    async fn increment_usage(&self, inc: &UsageIncrement) -> Result<()> {
        self.append("usage", USAGE_FILE, inc).await?;
        self.usage
            .write()
            .add(&inc.student_id, inc.date, inc.delta);
        Ok(())
    }

    fn backend(&self) -> &'static str {
        "jsonl"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use tg_domain::conversation::{ConversationTurn, PedagogicalMode};
    use tg_domain::records::{AlertStatus, CrisisCategory};

    fn read_lines(path: &Path) -> Vec<serde_json::Value> {
        std::fs::read_to_string(path)
            .unwrap()
            .lines()
            .map(|l| serde_json::from_str(l).unwrap())
            .collect()
    }

    #[tokio::test]
    async fn alert_is_appended_as_one_line() {
        let tmp = tempfile::tempdir().unwrap();
        let store = JsonlRecordStore::open(tmp.path()).unwrap();
        let alert = CrisisAlert {
            id: uuid::Uuid::new_v4(),
            student_id: "s1".into(),
            class_id: "c1".into(),
            lesson_id: "l1".into(),
            category: CrisisCategory::Helplessness,
            trigger_text: "nothing matters".into(),
            context: vec![ConversationTurn::user("nothing matters", 100)],
            status: AlertStatus::Unread,
            created_at: Utc::now(),
        };
        store.insert_crisis_alert(&alert).await.unwrap();

        let lines = read_lines(&tmp.path().join(ALERTS_FILE));
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0]["category"], "helplessness");
        assert_eq!(lines[0]["status"], "unread");
        assert_eq!(lines[0]["context"][0]["role"], "user");
    }

    #[tokio::test]
    async fn sessions_accumulate() {
        let tmp = tempfile::tempdir().unwrap();
        let store = JsonlRecordStore::open(tmp.path()).unwrap();
        for n in 0..3 {
            let record = SessionRecord {
                id: uuid::Uuid::new_v4(),
                student_id: "s1".into(),
                lesson_id: "l1".into(),
                class_id: "c1".into(),
                mode: PedagogicalMode::Reflection,
                transcript: vec![ConversationTurn::assistant("done", 100)],
                exchange_count: n,
                completed_at: Utc::now(),
            };
            store.insert_session(&record).await.unwrap();
        }
        let lines = read_lines(&tmp.path().join(SESSIONS_FILE));
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[2]["exchange_count"], 2);
        assert_eq!(lines[0]["mode"], "reflection");
    }

    #[tokio::test]
    async fn usage_survives_reopen() {
        let tmp = tempfile::tempdir().unwrap();
        let inc = UsageIncrement::today("s1");
        {
            let store = JsonlRecordStore::open(tmp.path()).unwrap();
            store.increment_usage(&inc).await.unwrap();
            store.increment_usage(&inc).await.unwrap();
            assert_eq!(store.usage_for("s1", inc.date), 2);
        }
        let reopened = JsonlRecordStore::open(tmp.path()).unwrap();
        assert_eq!(reopened.usage_for("s1", inc.date), 2);
        assert_eq!(reopened.usage_for("s2", inc.date), 0);
    }

    #[tokio::test]
    async fn past_days_are_dropped_on_rollover() {
        let tmp = tempfile::tempdir().unwrap();
        let store = JsonlRecordStore::open(tmp.path()).unwrap();
        let monday = NaiveDate::from_ymd_opt(2026, 3, 2).unwrap();
        let tuesday = NaiveDate::from_ymd_opt(2026, 3, 3).unwrap();
        let inc = |student: &str, date| UsageIncrement {
            student_id: student.into(),
            date,
            delta: 1,
        };

        store.increment_usage(&inc("s1", monday)).await.unwrap();
        store.increment_usage(&inc("s2", monday)).await.unwrap();
        assert_eq!(store.usage.read().students(), 2);

        store.increment_usage(&inc("s1", tuesday)).await.unwrap();
        assert_eq!(store.usage.read().students(), 1);
        assert_eq!(store.usage_for("s1", tuesday), 1);
        assert_eq!(store.usage_for("s1", monday), 0);

        // A late write for an earlier day is still appended to disk but
        // does not resurrect that day in memory.
        store.increment_usage(&inc("s2", monday)).await.unwrap();
        assert_eq!(store.usage.read().students(), 1);
        assert_eq!(read_lines(&tmp.path().join(USAGE_FILE)).len(), 4);

        let reopened = JsonlRecordStore::open(tmp.path()).unwrap();
        assert_eq!(reopened.usage_for("s1", tuesday), 1);
        assert_eq!(reopened.usage.read().students(), 1);
    }

    #[test]
    fn torn_usage_line_is_skipped() {
        let tmp = tempfile::tempdir().unwrap();
        std::fs::write(
            tmp.path().join(USAGE_FILE),
            "{\"student_id\":\"s1\",\"date\":\"2026-03-01\",\"delta\":1}\n{\"student_id\":\"s1\",\"da",
        )
        .unwrap();
        let store = JsonlRecordStore::open(tmp.path()).unwrap();
        let date = NaiveDate::from_ymd_opt(2026, 3, 1).unwrap();
        assert_eq!(store.usage_for("s1", date), 1);
    }
}
