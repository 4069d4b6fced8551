// Error responses for HTTP handlers
use crate::application::layout_editor::EditorError;
use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    BadRequest(String),

    #[error(transparent)]
    Editor(#[from] EditorError),

    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
}

impl ApiError {
    pub fn dashboard_not_found(id: &str) -> Self {
        ApiError::NotFound(format!("dashboard `{}` not found", id))
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self {
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Editor(EditorError::TemplateNotFound(_)) => StatusCode::NOT_FOUND,
            ApiError::Editor(EditorError::DuplicateBlockId(_) | EditorError::NoRoom(_)) => StatusCode::CONFLICT,
            ApiError::Editor(EditorError::InvalidConfig(_) | EditorError::InvalidImport(_)) => {
                StatusCode::UNPROCESSABLE_ENTITY
            }
            ApiError::Editor(EditorError::Persistence(_)) => StatusCode::BAD_GATEWAY,
            ApiError::Internal(e) => {
                tracing::error!("request failed: {:#}", e);
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };

        (status, Json(ErrorResponse { error: self.to_string() })).into_response()
    }
}
