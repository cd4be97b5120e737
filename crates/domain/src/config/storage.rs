use std::path::PathBuf;

use serde::{Deserialize, Serialize};

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Record storage (crisis alerts, sessions, usage counters)
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    #[serde(default)]
    pub backend: StorageBackend,
    /// Directory for the `jsonl` backend.
    #[serde(default = "d_path")]
    pub path: PathBuf,
    #[serde(default)]
    pub rest: RestStorageConfig,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: StorageBackend::Jsonl,
            path: d_path(),
            rest: RestStorageConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    /// In-process only; lost on restart.
    Memory,
    /// Append-only JSON lines under `path`.
    #[default]
    Jsonl,
    /// PostgREST-style HTTP API owned by the storage service.
    Rest,
}

/// Connection details for the `rest` backend.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RestStorageConfig {
    #[serde(default = "d_rest_url")]
    pub base_url: String,
    /// Env var holding the service key (sent as `apikey` and bearer).
    #[serde(default = "d_key_env")]
    pub service_key_env: String,
    #[serde(default = "d_alerts")]
    pub alerts_table: String,
    #[serde(default = "d_sessions")]
    pub sessions_table: String,
    #[serde(default = "d_usage_rpc")]
    pub usage_rpc: String,
    #[serde(default = "d_5000")]
    pub timeout_ms: u64,
}

impl Default for RestStorageConfig {
    fn default() -> Self {
        Self {
            base_url: d_rest_url(),
            service_key_env: d_key_env(),
            alerts_table: d_alerts(),
            sessions_table: d_sessions(),
            usage_rpc: d_usage_rpc(),
            timeout_ms: 5000,
        }
    }
}

// ── serde default helpers ───────────────────────────────────────────

fn d_path() -> PathBuf {
    PathBuf::from("./data/records")
}
fn d_rest_url() -> String {
    "http://localhost:54321".into()
}
fn d_key_env() -> String {
    "TG_STORAGE_KEY".into()
}
fn d_alerts() -> String {
    "crisis_alerts".into()
}
fn d_sessions() -> String {
    "tutor_sessions".into()
}
fn d_usage_rpc() -> String {
    "increment_daily_usage".into()
}
fn d_5000() -> u64 {
    5000
}
