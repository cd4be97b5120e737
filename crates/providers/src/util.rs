//! Shared helpers for provider adapters.

use tg_domain::config::AuthConfig;
use tg_domain::error::{Error, Result};

/// Convert a [`reqwest::Error`] into the domain [`Error`] type.
///
/// Timeout errors map to [`Error::Timeout`]; everything else maps to
/// [`Error::Http`].
pub(crate) fn from_reqwest(e: reqwest::Error) -> Error {
    if e.is_timeout() {
        Error::Timeout(e.to_string())
    } else {
        Error::Http(e.to_string())
    }
}

/// Resolve the generation credential from an [`AuthConfig`].
///
/// Called once at startup. Precedence:
/// 1. `key` field (plaintext, warns)
/// 2. `service` + `account` in the OS keychain
/// 3. `env` field
///
/// Blank values count as missing.
pub fn resolve_api_key(auth: &AuthConfig) -> Result<String> {
    if let Some(key) = auth.key.as_deref().filter(|k| !k.trim().is_empty()) {
        tracing::warn!(
            "API key loaded from plaintext config field 'key'; \
             prefer 'env' or the OS keychain"
        );
        return Ok(key.to_owned());
    }

    if let (Some(service), Some(account)) = (&auth.service, &auth.account) {
        match resolve_from_keychain(service, account) {
            Ok(secret) if !secret.trim().is_empty() => return Ok(secret),
            Ok(_) => {
                tracing::warn!(service = %service, account = %account, "keychain entry is blank");
            }
            Err(e) => {
                tracing::warn!(
                    service = %service,
                    account = %account,
                    error = %e,
                    "keychain lookup failed, falling through to env"
                );
            }
        }
    }

    if let Some(ref env_var) = auth.env {
        return match std::env::var(env_var) {
            Ok(v) if !v.trim().is_empty() => Ok(v),
            Ok(_) => Err(Error::Auth(format!("environment variable '{env_var}' is empty"))),
            Err(_) => Err(Error::Auth(format!(
                "environment variable '{env_var}' not set or not valid UTF-8"
            ))),
        };
    }

    Err(Error::Auth(
        "no API key configured: set 'key', 'env', or keychain 'service'+'account'".into(),
    ))
}

/// Read a secret from the OS keychain (macOS Keychain, Windows Credential
/// Manager, Linux Secret Service). Fails on headless hosts without a daemon.
pub fn resolve_from_keychain(service: &str, account: &str) -> Result<String> {
    let entry = keyring::Entry::new(service, account)
        .map_err(|e| Error::Auth(format!("keyring entry creation failed: {e}")))?;
    entry
        .get_password()
        .map_err(|e| Error::Auth(format!("keyring get_password failed: {e}")))
}
