//! Signed-identity authentication middleware.
//!
//! The login system issues `Authorization: Bearer <caller_id>.<sig>` where
//! `sig` is the hex HMAC-SHA256 of `caller_id` under a shared secret. The
//! secret is read **once at startup** from the env var named by
//! `server.identity_secret_env` (default `TG_IDENTITY_SECRET`).
//! - With a secret, the signature is checked in constant time.
//! - Without one the server runs in dev mode: the token (minus any
//!   signature suffix) is taken as the caller id unchecked.
//!
//! A missing or malformed token is always 401.

use axum::body::Body;
use axum::extract::State;
use axum::http::Request;
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use hmac::{Hmac, Mac};
use sha2::Sha256;
use subtle::ConstantTimeEq;

use crate::api::error::ApiError;
use crate::state::AppState;

type HmacSha256 = Hmac<Sha256>;

const MAX_CALLER_ID_LEN: usize = 128;

/// The authenticated caller, inserted into request extensions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallerId(pub String);

pub struct IdentityVerifier {
    /// `None` in dev mode.
    secret: Option<Vec<u8>>,
}

impl IdentityVerifier {
    pub fn new(secret: Option<Vec<u8>>) -> Self {
        Self {
            secret: secret.filter(|s| !s.is_empty()),
        }
    }

    pub fn is_dev_mode(&self) -> bool {
        self.secret.is_none()
    }

    /// Return the caller id carried by `token`, or `None` if it does not
    /// verify.
    pub fn verify(&self, token: &str) -> Option<CallerId> {
        let token = token.trim();
        let caller = match &self.secret {
            None => token.rsplit_once('.').map_or(token, |(id, _)| id),
            Some(secret) => {
                let (id, sig_hex) = token.rsplit_once('.')?;
                let provided = hex::decode(sig_hex).ok()?;
                let mut mac = HmacSha256::new_from_slice(secret).ok()?;
                mac.update(id.as_bytes());
                let expected = mac.finalize().into_bytes();
                if !bool::from(expected.as_slice().ct_eq(&provided)) {
                    return None;
                }
                id
            }
        };
        well_formed(caller).then(|| CallerId(caller.to_owned()))
    }
}

fn well_formed(caller: &str) -> bool {
    !caller.is_empty()
        && caller.len() <= MAX_CALLER_ID_LEN
        && !caller.chars().any(|c| c.is_whitespace() || c.is_control())
}

/// Produce a token for `caller_id` under `secret`.
pub fn sign(secret: &[u8], caller_id: &str) -> Option<String> {
    let mut mac = HmacSha256::new_from_slice(secret).ok()?;
    mac.update(caller_id.as_bytes());
    Some(format!(
        "{caller_id}.{}",
        hex::encode(mac.finalize().into_bytes())
    ))
}

/// Axum middleware enforcing signed identity on protected routes.
/// Attach via `axum::middleware::from_fn_with_state`.
pub async fn require_identity(
    State(state): State<AppState>,
    mut req: Request<Body>,
    next: Next,
) -> Response {
    let caller = req
        .headers()
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .and_then(|token| state.identity.verify(token));

    match caller {
        Some(caller) => {
            req.extensions_mut().insert(caller);
            next.run(req).await
        }
        None => ApiError::Unauthorized.into_response(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &[u8] = b"shared-with-login";

    #[test]
    fn signed_token_round_trips() {
        let v = IdentityVerifier::new(Some(SECRET.to_vec()));
        let token = sign(SECRET, "student-7").unwrap();
        assert_eq!(v.verify(&token), Some(CallerId("student-7".into())));
    }

    #[test]
    fn tampered_or_foreign_tokens_fail() {
        let v = IdentityVerifier::new(Some(SECRET.to_vec()));
        let token = sign(SECRET, "student-7").unwrap();
        let forged = token.replacen("student-7", "student-8", 1);
        assert_eq!(v.verify(&forged), None);
        assert_eq!(v.verify(&sign(b"other-secret", "student-7").unwrap()), None);
        assert_eq!(v.verify("student-7"), None);
        assert_eq!(v.verify("student-7.zz"), None);
        assert_eq!(v.verify(""), None);
    }

    #[test]
    fn dev_mode_accepts_bare_ids() {
        let v = IdentityVerifier::new(None);
        assert!(v.is_dev_mode());
        assert_eq!(v.verify("teacher-demo"), Some(CallerId("teacher-demo".into())));
        assert_eq!(v.verify("teacher-demo.deadbeef"), Some(CallerId("teacher-demo".into())));
        assert_eq!(v.verify("   "), None);
    }

    #[test]
    fn empty_secret_means_dev_mode() {
        assert!(IdentityVerifier::new(Some(Vec::new())).is_dev_mode());
    }
}
