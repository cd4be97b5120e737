mod llm;
mod observability;
mod rate_limits;
mod server;
mod storage;
mod tutor;

pub use llm::*;
pub use observability::*;
pub use rate_limits::*;
pub use server::*;
pub use storage::*;
pub use tutor::*;

use serde::{Deserialize, Serialize};
use std::fmt;

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Top-level config
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub llm: LlmConfig,
    #[serde(default)]
    pub tutor: TutorConfig,
    #[serde(default)]
    pub quality: QualityConfig,
    #[serde(default)]
    pub rate_limits: RateLimitsConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub observability: ObservabilityConfig,
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Config validation
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Severity level for a configuration issue.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigSeverity {
    Error,
    Warning,
}

/// A single configuration validation issue.
#[derive(Debug, Clone)]
pub struct ConfigError {
    pub severity: ConfigSeverity,
    pub field: String,
    pub message: String,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let tag = match self.severity {
            ConfigSeverity::Error => "ERROR",
            ConfigSeverity::Warning => "WARN",
        };
        write!(f, "[{tag}] {}: {}", self.field, self.message)
    }
}

impl ConfigError {
    fn error(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            severity: ConfigSeverity::Error,
            field: field.into(),
            message: message.into(),
        }
    }

    fn warning(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            severity: ConfigSeverity::Warning,
            field: field.into(),
            message: message.into(),
        }
    }
}

impl Config {
    /// Validate the configuration and return a list of issues.
    ///
    /// Returns an empty vec when everything looks good.
    pub fn validate(&self) -> Vec<ConfigError> {
        let mut errors = Vec::new();

        if self.server.port == 0 {
            errors.push(ConfigError::error("server.port", "port must be greater than 0"));
        }
        if self.server.host.is_empty() {
            errors.push(ConfigError::error("server.host", "host must not be empty"));
        }
        if self.server.max_concurrent_requests == 0 {
            errors.push(ConfigError::error(
                "server.max_concurrent_requests",
                "must be greater than 0",
            ));
        }
        if let Some(rl) = &self.server.ip_rate_limit {
            if rl.requests_per_second == 0 || rl.burst_size == 0 {
                errors.push(ConfigError::error(
                    "server.ip_rate_limit",
                    "requests_per_second and burst_size must be > 0",
                ));
            }
        }
        if self.server.cors.allowed_origins.len() == 1
            && self.server.cors.allowed_origins[0] == "*"
        {
            errors.push(ConfigError::warning(
                "server.cors.allowed_origins",
                "wildcard \"*\" allows all origins (not recommended for production)",
            ));
        }

        if self.llm.timeout_ms == 0 {
            errors.push(ConfigError::error("llm.timeout_ms", "timeout must be greater than 0"));
        }
        if self.llm.provider.base_url.is_empty() {
            errors.push(ConfigError::error(
                "llm.provider.base_url",
                "base_url must not be empty",
            ));
        }
        if self.llm.provider.max_tokens == 0 {
            errors.push(ConfigError::error(
                "llm.provider.max_tokens",
                "max_tokens must be greater than 0",
            ));
        }

        let tutor = &self.tutor;
        if tutor.max_message_chars == 0 {
            errors.push(ConfigError::error(
                "tutor.max_message_chars",
                "must be greater than 0",
            ));
        }
        if tutor.min_exchanges_floor == 0 || tutor.min_exchanges_floor > tutor.min_exchanges_ceiling
        {
            errors.push(ConfigError::error(
                "tutor.min_exchanges_floor",
                "floor must be >= 1 and <= min_exchanges_ceiling",
            ));
        }
        if tutor.completion_sentinel.trim().is_empty() {
            errors.push(ConfigError::error(
                "tutor.completion_sentinel",
                "sentinel must not be blank",
            ));
        }
        if tutor.crisis_context_turns == 0 {
            errors.push(ConfigError::warning(
                "tutor.crisis_context_turns",
                "crisis alerts will carry no conversation context",
            ));
        }

        if self.quality.min_words == 0 {
            errors.push(ConfigError::warning(
                "quality.min_words",
                "0 disables the word-count check",
            ));
        }
        if self.quality.generated_weak_marker_threshold == 0 {
            errors.push(ConfigError::error(
                "quality.generated_weak_marker_threshold",
                "must be greater than 0",
            ));
        }

        for (name, policy) in [
            ("rate_limits.tutor", &self.rate_limits.tutor),
            ("rate_limits.standard", &self.rate_limits.standard),
        ] {
            if policy.window_secs == 0 || policy.max_requests == 0 {
                errors.push(ConfigError::error(
                    name,
                    "window_secs and max_requests must be > 0",
                ));
            }
        }
        if self.rate_limits.tutor.max_requests > self.rate_limits.standard.max_requests {
            errors.push(ConfigError::warning(
                "rate_limits.tutor",
                "tutor cap is looser than the standard cap",
            ));
        }

        if self.storage.backend == StorageBackend::Rest && self.storage.rest.base_url.is_empty() {
            errors.push(ConfigError::error(
                "storage.rest.base_url",
                "base_url must not be empty for the rest backend",
            ));
        }
        if self.storage.backend == StorageBackend::Memory {
            errors.push(ConfigError::warning(
                "storage.backend",
                "memory backend drops crisis alerts and sessions on restart",
            ));
        }

        errors
    }
}
