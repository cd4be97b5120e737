//! AppState construction extracted from `main.rs`.
//!
//! [`build_app_state`] is the `serve` boot path: it validates config and
//! resolves every external dependency once. [`assemble`] wires already
//! constructed parts together and is shared with the integration tests.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;

use tg_domain::config::{Config, ConfigSeverity, LlmStartupPolicy};
use tg_providers::{AnthropicProvider, LlmProvider};
use tg_records::{create_store, RecordStore};

use crate::api::auth::IdentityVerifier;
use crate::pipeline::dispatch::SideEffectDispatcher;
use crate::pipeline::generation::GenerationGateway;
use crate::pipeline::rate_limit::FixedWindowLimiter;
use crate::pipeline::TutorPipeline;
use crate::state::AppState;

/// Validate config, initialize every subsystem and return a fully-wired
/// [`AppState`].
pub async fn build_app_state(config: Arc<Config>) -> anyhow::Result<AppState> {
    // ── Config validation ────────────────────────────────────────────
    let issues = config.validate();
    for issue in &issues {
        match issue.severity {
            ConfigSeverity::Warning => tracing::warn!("config: {issue}"),
            ConfigSeverity::Error => tracing::error!("config: {issue}"),
        }
    }
    let error_count = issues
        .iter()
        .filter(|i| i.severity == ConfigSeverity::Error)
        .count();
    if error_count > 0 {
        anyhow::bail!("config validation failed with {error_count} error(s)");
    }

    // ── Generation credential (resolved exactly once) ────────────────
    let generator: Option<Arc<dyn LlmProvider>> =
        match AnthropicProvider::from_config(&config.llm.provider) {
            Ok(p) => {
                tracing::info!(
                    provider = %config.llm.provider.id,
                    model = %config.llm.provider.model,
                    "generation provider ready"
                );
                Some(Arc::new(p))
            }
            Err(e) => match config.llm.startup_policy {
                LlmStartupPolicy::RequireOne => {
                    return Err(e).context("llm.startup_policy = \"require_one\"");
                }
                LlmStartupPolicy::AllowNone => {
                    tracing::warn!(
                        error = %e,
                        "no generation credential; tutoring endpoints will answer 503"
                    );
                    None
                }
            },
        };

    // ── Record store ─────────────────────────────────────────────────
    let store = create_store(&config.storage).context("creating record store")?;
    tracing::info!(backend = store.backend(), "record store ready");

    // ── Identity secret (read once) ──────────────────────────────────
    let env_var = &config.server.identity_secret_env;
    let secret = std::env::var(env_var)
        .ok()
        .filter(|s| !s.trim().is_empty())
        .map(String::into_bytes);
    if secret.is_some() {
        tracing::info!(env = %env_var, "signed identity tokens required");
    } else {
        tracing::warn!(
            "identity verification DISABLED (dev mode); set {env_var} to require signed tokens"
        );
    }

    assemble(config, generator, store, secret)
}

/// Wire the pipeline and state from already-constructed collaborators.
pub fn assemble(
    config: Arc<Config>,
    generator: Option<Arc<dyn LlmProvider>>,
    store: Arc<dyn RecordStore>,
    identity_secret: Option<Vec<u8>>,
) -> anyhow::Result<AppState> {
    let limiter = Arc::new(FixedWindowLimiter::new(&config.rate_limits));
    let dispatcher = SideEffectDispatcher::new(store.clone());
    let timeout = Duration::from_millis(config.llm.timeout_ms);
    let generator = generator.map(|p| GenerationGateway::new(p, timeout));

    let pipeline = TutorPipeline::new(&config, limiter.clone(), generator, dispatcher.clone())
        .context("compiling classifier patterns")?;
    tracing::info!(
        tutor_cap = config.rate_limits.tutor.max_requests,
        window_secs = config.rate_limits.tutor.window_secs,
        "tutoring pipeline ready"
    );

    Ok(AppState {
        config,
        pipeline: Arc::new(pipeline),
        limiter,
        dispatcher,
        store,
        identity: Arc::new(IdentityVerifier::new(identity_secret)),
    })
}
