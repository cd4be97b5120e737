//! HTTP-facing error type for every handler.

use axum::http::{header, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;

use crate::pipeline::PipelineError;

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("{message}")]
    ClientInput { field: String, message: String },
    #[error("malformed request body: {0}")]
    MalformedBody(String),
    #[error("invalid or missing identity token")]
    Unauthorized,
    #[error("{0}")]
    Forbidden(String),
    #[error("too many requests; retry in {retry_after_secs}s")]
    RateLimited { retry_after_secs: u64 },
    #[error("{0}")]
    ServiceUnavailable(String),
    #[error("internal error")]
    Internal(String),
}

impl From<PipelineError> for ApiError {
    fn from(e: PipelineError) -> Self {
        match e {
            PipelineError::NotConfigured => ApiError::ServiceUnavailable(
                "the tutor is not available right now; please try again later".into(),
            ),
            PipelineError::Invalid(v) => ApiError::ClientInput {
                field: v.field,
                message: v.message,
            },
            PipelineError::ForeignStudent => ApiError::Forbidden(
                "student_id does not match the signed-in identity".into(),
            ),
            PipelineError::RateLimited { retry_after_secs } => {
                ApiError::RateLimited { retry_after_secs }
            }
            PipelineError::Generation(_) => ApiError::ServiceUnavailable(
                "the tutor is temporarily unavailable; please try again".into(),
            ),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::ClientInput { field, message } => (
                StatusCode::BAD_REQUEST,
                Json(json!({ "error": format!("{field} {message}"), "field": field })),
            )
                .into_response(),
            ApiError::MalformedBody(detail) => (
                StatusCode::BAD_REQUEST,
                Json(json!({ "error": format!("malformed request body: {detail}") })),
            )
                .into_response(),
            ApiError::Unauthorized => (
                StatusCode::UNAUTHORIZED,
                Json(json!({ "error": "invalid or missing identity token" })),
            )
                .into_response(),
            ApiError::Forbidden(message) => {
                (StatusCode::FORBIDDEN, Json(json!({ "error": message }))).into_response()
            }
            ApiError::RateLimited { retry_after_secs } => {
                let mut resp = (
                    StatusCode::TOO_MANY_REQUESTS,
                    Json(json!({
                        "error": "too many requests; slow down and try again shortly",
                        "retry_after_secs": retry_after_secs,
                    })),
                )
                    .into_response();
                resp.headers_mut()
                    .insert(header::RETRY_AFTER, HeaderValue::from(retry_after_secs));
                resp
            }
            ApiError::ServiceUnavailable(message) => (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({ "error": message })),
            )
                .into_response(),
            ApiError::Internal(detail) => {
                tracing::error!(detail = %detail, "internal error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(json!({ "error": "internal error" })),
                )
                    .into_response()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rate_limited_sets_retry_after_header() {
        let resp = ApiError::RateLimited { retry_after_secs: 42 }.into_response();
        assert_eq!(resp.status(), StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(resp.headers()[header::RETRY_AFTER], "42");
    }

    #[test]
    fn validation_maps_to_400() {
        let resp = ApiError::ClientInput {
            field: "message".into(),
            message: "must not be blank".into(),
        }
        .into_response();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn foreign_student_maps_to_403() {
        let err: ApiError = PipelineError::ForeignStudent.into();
        assert_eq!(err.into_response().status(), StatusCode::FORBIDDEN);
    }

    #[test]
    fn generation_failure_maps_to_503() {
        let err: ApiError = PipelineError::Generation(
            crate::pipeline::generation::GenerationError::EmptyReply,
        )
        .into();
        assert_eq!(err.into_response().status(), StatusCode::SERVICE_UNAVAILABLE);
    }
}
