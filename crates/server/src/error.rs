use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use recommender::RecommendError;
use serde_json::json;

/// Errors a handler can return, each mapped to one HTTP status
#[derive(thiserror::Error, Debug)]
pub enum AppError {
    #[error(transparent)]
    Recommend(#[from] RecommendError),

    /// Malformed request parameters (unparseable, unknown, missing)
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Internal server error: {0}")]
    Internal(String),
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Recommend(RecommendError::NotFound { .. })
            | AppError::Recommend(RecommendError::EmptyResult { .. }) => StatusCode::NOT_FOUND,
            AppError::Recommend(RecommendError::Validation(_)) | AppError::InvalidInput(_) => {
                StatusCode::UNPROCESSABLE_ENTITY
            }
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(error = %self, "Request failed");
        }

        let body = Json(json!({
            "error": self.to_string()
        }));

        (status, body).into_response()
    }
}

pub type AppResult<T> = Result<T, AppError>;
