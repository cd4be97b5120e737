use serde::{Deserialize, Serialize};

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Server
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "d_8787")]
    pub port: u16,
    #[serde(default = "d_host")]
    pub host: String,
    #[serde(default)]
    pub cors: CorsConfig,
    /// Environment variable holding the HMAC secret shared with the login
    /// system. Callers present `Bearer <caller_id>.<hex hmac-sha256>`.
    /// If the env var is unset the gateway accepts unsigned `<caller_id>`
    /// tokens (dev mode) and logs a warning at startup.
    #[serde(default = "d_identity_secret_env")]
    pub identity_secret_env: String,
    /// Optional coarse per-IP token bucket in front of every route.
    /// Per-identity tutoring limits live in `[rate_limits]`.
    #[serde(default)]
    pub ip_rate_limit: Option<IpRateLimitConfig>,
    /// Upper bound on in-flight requests across the whole server.
    #[serde(default = "d_256")]
    pub max_concurrent_requests: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: 8787,
            host: "127.0.0.1".into(),
            cors: CorsConfig::default(),
            identity_secret_env: d_identity_secret_env(),
            ip_rate_limit: None,
            max_concurrent_requests: 256,
        }
    }
}

/// Per-IP token-bucket limiting (`tower_governor`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IpRateLimitConfig {
    /// One token is added every `1 / requests_per_second` seconds.
    pub requests_per_second: u64,
    /// Maximum tokens in the bucket.
    pub burst_size: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CorsConfig {
    /// Origins allowed for CORS. `http://host:*` matches any port.
    #[serde(default = "d_cors_origins")]
    pub allowed_origins: Vec<String>,
}

impl Default for CorsConfig {
    fn default() -> Self {
        Self {
            allowed_origins: d_cors_origins(),
        }
    }
}

// ── serde default helpers ───────────────────────────────────────────

fn d_8787() -> u16 {
    8787
}
fn d_host() -> String {
    "127.0.0.1".into()
}
fn d_256() -> usize {
    256
}
fn d_cors_origins() -> Vec<String> {
    vec!["http://localhost:*".into(), "http://127.0.0.1:*".into()]
}
fn d_identity_secret_env() -> String {
    "TG_IDENTITY_SECRET".into()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_toml_uses_all_defaults() {
        let cfg: ServerConfig = toml::from_str("").unwrap();
        assert_eq!(cfg.port, 8787);
        assert_eq!(cfg.host, "127.0.0.1");
        assert_eq!(cfg.identity_secret_env, "TG_IDENTITY_SECRET");
        assert_eq!(cfg.max_concurrent_requests, 256);
        assert!(cfg.ip_rate_limit.is_none());
    }

    #[test]
    fn parses_ip_rate_limit() {
        let toml_str = r#"
            port = 9000

            [ip_rate_limit]
            requests_per_second = 5
            burst_size = 20
        "#;
        let cfg: ServerConfig = toml::from_str(toml_str).unwrap();
        let rl = cfg.ip_rate_limit.expect("ip_rate_limit should be Some");
        assert_eq!(cfg.port, 9000);
        assert_eq!(rl.requests_per_second, 5);
        assert_eq!(rl.burst_size, 20);
    }
}
