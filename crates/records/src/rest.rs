//! PostgREST-style [`RecordStore`].
//!
//! Tables are written with `POST {base}/rest/v1/{table}` and the usage
//! counter goes through `POST {base}/rest/v1/rpc/{usage_rpc}`. Every call is
//! a single attempt; side effects are best effort and never retried.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, StatusCode};
use serde::Serialize;
use tg_domain::config::RestStorageConfig;
use tg_domain::error::{Error, Result};
use tg_domain::records::{CrisisAlert, SessionRecord, UsageIncrement};
use tg_domain::trace::TraceEvent;

use crate::store::RecordStore;

#[derive(Debug, Clone)]
pub struct RestRecordStore {
    http: Client,
    base_url: String,
    service_key: Option<String>,
    alerts_table: String,
    sessions_table: String,
    usage_rpc: String,
}

/// Argument object for the usage RPC.
#[derive(Serialize)]
struct UsageRpcArgs<'a> {
    p_student_id: &'a str,
    p_date: String,
    p_delta: u32,
}

impl RestRecordStore {
    pub fn new(cfg: &RestStorageConfig) -> Result<Self> {
        let http = Client::builder()
            .timeout(Duration::from_millis(cfg.timeout_ms))
            .build()
            .map_err(|e| Error::Http(e.to_string()))?;

        let service_key = std::env::var(&cfg.service_key_env)
            .ok()
            .filter(|k| !k.trim().is_empty());
        if service_key.is_none() {
            tracing::warn!(
                env = %cfg.service_key_env,
                "storage service key not set; rest writes will be unauthenticated"
            );
        }

        Ok(Self {
            http,
            base_url: cfg.base_url.trim_end_matches('/').to_owned(),
            service_key,
            alerts_table: cfg.alerts_table.clone(),
            sessions_table: cfg.sessions_table.clone(),
            usage_rpc: cfg.usage_rpc.clone(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/rest/v1/{}", self.base_url, path)
    }

    fn decorate(&self, rb: RequestBuilder) -> RequestBuilder {
        let rb = rb.header("Prefer", "return=minimal");
        match &self.service_key {
            Some(key) => rb.header("apikey", key).bearer_auth(key),
            None => rb,
        }
    }

    async fn post<T: Serialize + ?Sized>(
        &self,
        kind: &'static str,
        path: &str,
        body: &T,
    ) -> Result<()> {
        let start = Instant::now();
        let result = self.send(path, body).await;
        TraceEvent::RecordWrite {
            kind: kind.into(),
            backend: "rest".into(),
            ok: result.is_ok(),
            duration_ms: start.elapsed().as_millis() as u64,
        }
        .emit();
        result
    }

    async fn send<T: Serialize + ?Sized>(&self, path: &str, body: &T) -> Result<()> {
        let resp = self
            .decorate(self.http.post(self.url(path)).json(body))
            .send()
            .await
            .map_err(from_reqwest)?;

        let status = resp.status();
        if status.is_success() {
            return Ok(());
        }
        let text = resp.text().await.unwrap_or_default();
        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            return Err(Error::Auth(format!("{path} rejected ({status}): {text}")));
        }
        Err(Error::Storage {
            backend: "rest".into(),
            message: format!("{path} returned {status}: {text}"),
        })
    }
}

fn from_reqwest(e: reqwest::Error) -> Error {
    if e.is_timeout() {
        Error::Timeout(e.to_string())
    } else {
        Error::Http(e.to_string())
    }
}

#[async_trait]
impl RecordStore for RestRecordStore {
    async fn insert_crisis_alert(&self, alert: &CrisisAlert) -> Result<()> {
        self.post("crisis_alert", &self.alerts_table, alert).await
    }

    async fn insert_session(&self, record: &SessionRecord) -> Result<()> {
        self.post("session", &self.sessions_table, record).await
    }

    async fn increment_usage(&self, inc: &UsageIncrement) -> Result<()> {
        let args = UsageRpcArgs {
            p_student_id: &inc.student_id,
            p_date: inc.date.to_string(),
            p_delta: inc.delta,
        };
        let path = format!("rpc/{}", self.usage_rpc);
        self.post("usage", &path, &args).await
    }

    fn backend(&self) -> &'static str {
        "rest"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn urls_follow_postgrest_layout() {
        let cfg = RestStorageConfig {
            base_url: "http://db.local:54321/".into(),
            ..Default::default()
        };
        let store = RestRecordStore::new(&cfg).unwrap();
        assert_eq!(store.url("crisis_alerts"), "http://db.local:54321/rest/v1/crisis_alerts");
        assert_eq!(
            store.url(&format!("rpc/{}", store.usage_rpc)),
            "http://db.local:54321/rest/v1/rpc/increment_daily_usage"
        );
    }

    #[tokio::test]
    async fn unreachable_service_is_an_error_not_a_panic() {
        let cfg = RestStorageConfig {
            base_url: "http://127.0.0.1:1".into(),
            timeout_ms: 500,
            ..Default::default()
        };
        let store = RestRecordStore::new(&cfg).unwrap();
        let err = store
            .increment_usage(&UsageIncrement::today("s1"))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Http(_) | Error::Timeout(_)));
    }
}
