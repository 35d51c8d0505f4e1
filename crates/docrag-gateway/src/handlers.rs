use std::path::Path;

use axum::Json;
use axum::extract::State;
use axum::extract::rejection::JsonRejection;
use axum::response::IntoResponse;

use super::error::ApiError;
use super::server::AppState;

#[derive(serde::Deserialize)]
pub(crate) struct BuildIndexRequest {
    pub directory_path: Option<String>,
}

#[derive(serde::Deserialize)]
pub(crate) struct ProcessQueryRequest {
    pub query: Option<String>,
}

#[derive(serde::Serialize)]
struct MessageResponse {
    message: &'static str,
}

#[derive(serde::Serialize)]
struct AnswerResponse {
    answer: String,
}

#[derive(serde::Serialize)]
struct HealthResponse {
    status: &'static str,
    uptime_secs: u64,
}

/// Treats a missing, null or blank field the same way.
fn required(value: Option<String>, message: &'static str) -> Result<String, ApiError> {
    value
        .filter(|v| !v.trim().is_empty())
        .ok_or_else(|| ApiError::required(message))
}

pub(crate) async fn build_index_handler(
    State(state): State<AppState>,
    payload: Result<Json<BuildIndexRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Json(payload) = payload.map_err(|e| ApiError::Validation(e.body_text()))?;
    let dir = required(payload.directory_path, "Directory path is required.")?;

    state.pipeline.build_index(Path::new(&dir)).await?;
    Ok(Json(MessageResponse {
        message: "Index built successfully.",
    }))
}

pub(crate) async fn process_query_handler(
    State(state): State<AppState>,
    payload: Result<Json<ProcessQueryRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Json(payload) = payload.map_err(|e| ApiError::Validation(e.body_text()))?;
    let query = required(payload.query, "Query is required.")?;

    let answer = state.pipeline.answer(&query).await?;
    Ok(Json(AnswerResponse { answer }))
}

pub(crate) async fn health_handler(State(state): State<AppState>) -> impl IntoResponse {
    Json(HealthResponse {
        status: "ok",
        uptime_secs: state.started_at.elapsed().as_secs(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn required_rejects_blank_values() {
        assert!(required(None, "missing").is_err());
        assert!(required(Some("   ".into()), "missing").is_err());
        assert_eq!(required(Some("docs".into()), "missing").unwrap(), "docs");
    }

    #[test]
    fn request_fields_are_optional() {
        let payload: BuildIndexRequest = serde_json::from_str("{}").unwrap();
        assert!(payload.directory_path.is_none());
        let payload: ProcessQueryRequest =
            serde_json::from_str(r#"{"query":"What color is the sky?"}"#).unwrap();
        assert_eq!(payload.query.as_deref(), Some("What color is the sky?"));
    }

    #[test]
    fn health_response_serializes() {
        let resp = HealthResponse {
            status: "ok",
            uptime_secs: 42,
        };
        let json = serde_json::to_string(&resp).unwrap();
        assert!(json.contains("\"status\":\"ok\""));
    }
}
