use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use docrag_core::RagError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("failed to bind {0}: {1}")]
    Bind(String, std::io::Error),
    #[error("server error: {0}")]
    Server(String),
}

/// Request failure reported to the client as `400 {"error": "..."}`.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    Validation(String),
    #[error(transparent)]
    Pipeline(#[from] RagError),
}

impl ApiError {
    pub(crate) fn required(message: &'static str) -> Self {
        Self::Validation(message.to_owned())
    }
}

#[derive(serde::Serialize)]
struct ErrorBody {
    error: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let error = self.to_string();
        tracing::warn!(%error, "request failed");
        (StatusCode::BAD_REQUEST, Json(ErrorBody { error })).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pipeline_error_keeps_message() {
        let err = ApiError::from(RagError::Generation("model offline".into()));
        assert_eq!(err.to_string(), "answer generation failed: model offline");
    }

    #[test]
    fn every_error_is_bad_request() {
        let resp = ApiError::required("Query is required.").into_response();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

        let resp = ApiError::from(RagError::Generation("x".into())).into_response();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }
}
