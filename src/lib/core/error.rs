use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum TodoError {
    #[error("{0}")]
    Validation(String),
    #[error("Invalid todo ID: {0}")]
    InvalidId(String),
    #[error("Todo not found")]
    NotFound,
    #[error("Failed to {action}")]
    Storage {
        action: &'static str,
        #[source]
        source: anyhow::Error,
    },
}

impl TodoError {
    pub fn storage(action: &'static str, source: anyhow::Error) -> Self {
        Self::Storage { action, source }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            TodoError::Validation(_) | TodoError::InvalidId(_) => StatusCode::BAD_REQUEST,
            TodoError::NotFound => StatusCode::NOT_FOUND,
            TodoError::Storage { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for TodoError {
    fn into_response(self) -> Response {
        let message = match &self {
            TodoError::InvalidId(_) => "Invalid todo ID".to_string(),
            TodoError::Storage { action, source } => {
                #[cfg(feature = "tracing")]
                tracing::error!(action = %action, error = ?source, "Storage operation failed");
                #[cfg(not(feature = "tracing"))]
                let _ = source;
                format!("Failed to {action}")
            }
            other => other.to_string(),
        };
        (self.status(), Json(json!({ "error": message }))).into_response()
    }
}
