use serde::{Deserialize, Serialize};

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Generation service
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    /// Hard upper bound on one generation call. On expiry the student is
    /// asked to resend; the conversation stays open.
    #[serde(default = "d_25000")]
    pub timeout_ms: u64,
    /// What to do at startup when the credential cannot be resolved.
    #[serde(default)]
    pub startup_policy: LlmStartupPolicy,
    #[serde(default)]
    pub provider: ProviderConfig,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            timeout_ms: 25_000,
            startup_policy: LlmStartupPolicy::AllowNone,
            provider: ProviderConfig::default(),
        }
    }
}

/// Controls how the gateway handles a missing generation credential.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum LlmStartupPolicy {
    /// Boot anyway; `/v1/tutor/*` answers 503 until a credential exists.
    #[default]
    AllowNone,
    /// Abort startup.
    RequireOne,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    #[serde(default = "d_provider_id")]
    pub id: String,
    #[serde(default = "d_base_url")]
    pub base_url: String,
    #[serde(default = "d_auth")]
    pub auth: AuthConfig,
    #[serde(default = "d_model")]
    pub model: String,
    #[serde(default = "d_1024")]
    pub max_tokens: u32,
    #[serde(default)]
    pub temperature: Option<f32>,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            id: d_provider_id(),
            base_url: d_base_url(),
            auth: d_auth(),
            model: d_model(),
            max_tokens: 1024,
            temperature: None,
        }
    }
}

/// Where the generation credential comes from.
///
/// Resolution order: plaintext `key`, OS keychain (`service` + `account`),
/// then `env`.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AuthConfig {
    /// Env var containing the key.
    #[serde(default)]
    pub env: Option<String>,
    /// Direct key (prefer env or keychain).
    #[serde(default)]
    pub key: Option<String>,
    /// Keychain service name (e.g. "tutorgate").
    #[serde(default)]
    pub service: Option<String>,
    /// Keychain account name (e.g. "anthropic-api-key").
    #[serde(default)]
    pub account: Option<String>,
}

// ── serde default helpers ───────────────────────────────────────────

fn d_25000() -> u64 {
    25_000
}
fn d_1024() -> u32 {
    1024
}
fn d_provider_id() -> String {
    "anthropic".into()
}
fn d_base_url() -> String {
    "https://api.anthropic.com".into()
}
fn d_model() -> String {
    "claude-sonnet-4-20250514".into()
}
fn d_auth() -> AuthConfig {
    AuthConfig {
        env: Some("ANTHROPIC_API_KEY".into()),
        ..Default::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_timeout_is_25_seconds() {
        let cfg: LlmConfig = toml::from_str("").unwrap();
        assert_eq!(cfg.timeout_ms, 25_000);
        assert_eq!(cfg.startup_policy, LlmStartupPolicy::AllowNone);
        assert_eq!(cfg.provider.auth.env.as_deref(), Some("ANTHROPIC_API_KEY"));
    }

    #[test]
    fn provider_section_overrides_defaults() {
        let toml_str = r#"
            timeout_ms = 5000
            startup_policy = "require_one"

            [provider]
            model = "claude-3-5-haiku-latest"
            max_tokens = 400

            [provider.auth]
            service = "tutorgate"
            account = "anthropic-api-key"
        "#;
        let cfg: LlmConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(cfg.timeout_ms, 5000);
        assert_eq!(cfg.startup_policy, LlmStartupPolicy::RequireOne);
        assert_eq!(cfg.provider.model, "claude-3-5-haiku-latest");
        assert_eq!(cfg.provider.max_tokens, 400);
        assert_eq!(cfg.provider.base_url, "https://api.anthropic.com");
        // An explicit [provider.auth] table replaces the default env lookup.
        assert!(cfg.provider.auth.env.is_none());
        assert_eq!(cfg.provider.auth.service.as_deref(), Some("tutorgate"));
    }
}
