//! Tutoring endpoints.
//!
//! - `POST /v1/tutor/chat`: one student turn through the full pipeline
//! - `GET  /v1/tutor/modes`: supported pedagogical modes

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::response::{IntoResponse, Json, Response};
use axum::Extension;
use serde_json::Value;
use tg_domain::conversation::PedagogicalMode;
use tg_domain::trace::TraceEvent;

use crate::api::auth::CallerId;
use crate::api::error::ApiError;
use crate::pipeline::rate_limit::RouteClass;
use crate::state::AppState;

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// POST /v1/tutor/chat
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

pub async fn chat(
    State(state): State<AppState>,
    Extension(caller): Extension<CallerId>,
    body: Result<Json<Value>, JsonRejection>,
) -> Response {
    if !state.pipeline.generator_configured() {
        return ApiError::from(crate::pipeline::PipelineError::NotConfigured).into_response();
    }
    let Json(body) = match body {
        Ok(b) => b,
        Err(rejection) => return ApiError::MalformedBody(rejection.body_text()).into_response(),
    };

    match state.pipeline.handle(&caller.0, &body).await {
        Ok(reply) => Json(reply).into_response(),
        Err(e) => {
            tracing::debug!(error = %e, "tutor turn rejected");
            ApiError::from(e).into_response()
        }
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// GET /v1/tutor/modes
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

fn describe(mode: &PedagogicalMode) -> &'static str {
    match mode {
        PedagogicalMode::DoNow => "Warm-up question that connects the lesson to prior knowledge.",
        PedagogicalMode::ExitTicket => "End-of-lesson check for understanding of the skill.",
        PedagogicalMode::Reflection => "Metacognitive reflection on how the student learned.",
        PedagogicalMode::SkillPractice => "Guided practice problems on the lesson skill.",
        PedagogicalMode::Unrecognized(_) => "General Socratic conversation about the lesson.",
    }
}

pub async fn modes(
    State(state): State<AppState>,
    Extension(caller): Extension<CallerId>,
) -> Result<impl IntoResponse, ApiError> {
    let decision = state.limiter.check(&caller.0, RouteClass::Standard);
    if !decision.allowed {
        let retry_after_secs = decision.retry_after_secs();
        TraceEvent::RateLimited {
            route_class: RouteClass::Standard.as_str().into(),
            retry_after_secs,
        }
        .emit();
        return Err(ApiError::RateLimited { retry_after_secs });
    }

    let modes: Vec<Value> = PedagogicalMode::KNOWN
        .iter()
        .map(|m| serde_json::json!({ "id": m.as_str(), "description": describe(m) }))
        .collect();

    Ok(Json(serde_json::json!({
        "modes": modes,
        "min_exchanges": {
            "min": state.config.tutor.min_exchanges_floor,
            "max": state.config.tutor.min_exchanges_ceiling,
        },
    })))
}
