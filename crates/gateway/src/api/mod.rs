pub mod auth;
pub mod error;
pub mod health;
pub mod tutor;

use axum::middleware;
use axum::routing::{get, post};
use axum::Router;

use crate::state::AppState;

/// Build the full API router.
///
/// Routes are split into **public** (no identity required) and
/// **protected** (gated behind the signed-identity middleware).
///
/// `state` is needed to wire up the auth middleware at build time.
pub fn router(state: AppState) -> Router<AppState> {
    let public = Router::new().route("/v1/health", get(health::health));

    let protected = Router::new()
        .route("/v1/tutor/chat", post(tutor::chat))
        .route("/v1/tutor/modes", get(tutor::modes))
        .route_layer(middleware::from_fn_with_state(
            state,
            auth::require_identity,
        ));

    public.merge(protected)
}
