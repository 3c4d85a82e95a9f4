//! Error handling for the HTTP layer

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use library_db::StoreError;
use serde::Serialize;
use serde_json::{json, Value};
use thiserror::Error;
use time::{format_description::well_known::Rfc3339, OffsetDateTime};
use uuid::Uuid;

/// Body of every error response, nested under `"error"`.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub code: &'static str,
    pub message: String,
    pub details: Vec<Value>,
    pub trace_id: String,
    pub timestamp: String,
}

/// Every failure a handler can report. Each variant owns its status and code.
#[derive(Error, Debug)]
pub enum AppError {
    #[error("validation error: {message}")]
    Validation { message: String, details: Vec<Value> },

    #[error("conflict: {message}")]
    Conflict { message: String, details: Vec<Value> },

    #[error("not found: {0}")]
    NotFound(String),

    #[error("unauthorized: {0}")]
    Unauthorized(String),

    #[error("bad request: {0}")]
    BadRequest(String),

    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    pub fn validation(details: Vec<Value>, message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
            details,
        }
    }

    pub fn conflict(details: Vec<Value>, message: impl Into<String>) -> Self {
        Self::Conflict {
            message: message.into(),
            details,
        }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound(message.into())
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::Unauthorized(message.into())
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::BadRequest(message.into())
    }

    /// HTTP status this error is reported with
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Validation { .. } => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::Conflict { .. } => StatusCode::CONFLICT,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Machine-readable code placed in the response body
    pub fn code(&self) -> &'static str {
        match self {
            AppError::Validation { .. } => "validation_error",
            AppError::Conflict { .. } => "conflict",
            AppError::NotFound(_) => "not_found",
            AppError::Unauthorized(_) => "unauthorized",
            AppError::BadRequest(_) => "bad_request",
            AppError::Internal(_) => "internal_error",
        }
    }
}

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound { .. } => AppError::not_found(err.to_string()),
            StoreError::Conflict { entity, message } => AppError::conflict(
                vec![json!({ "entity": entity, "error": message })],
                format!("{} could not be saved", entity),
            ),
            StoreError::Invalid { entity, message } => AppError::validation(
                vec![json!({ "entity": entity, "error": message })],
                format!("{} could not be saved", entity),
            ),
            StoreError::Database(e) => AppError::Internal(anyhow::Error::new(e)),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let trace_id = Uuid::new_v4();
        let status = self.status();
        let code = self.code();

        let (message, details) = match self {
            AppError::Validation { message, details } | AppError::Conflict { message, details } => {
                (message, details)
            }
            AppError::NotFound(message)
            | AppError::Unauthorized(message)
            | AppError::BadRequest(message) => (message, Vec::new()),
            AppError::Internal(e) => {
                tracing::error!(trace_id = %trace_id, error = ?e, "internal error");
                // Driver and bootstrap errors stay in the log in release builds.
                let message = if cfg!(debug_assertions) {
                    e.to_string()
                } else {
                    "An internal server error occurred".to_string()
                };
                (message, Vec::new())
            }
        };

        if status.is_server_error() {
            tracing::error!(trace_id = %trace_id, error_code = code, status_code = status.as_u16(), "request failed");
        } else {
            tracing::debug!(trace_id = %trace_id, error_code = code, status_code = status.as_u16(), "request rejected");
        }

        let body = ErrorBody {
            code,
            message,
            details,
            trace_id: trace_id.to_string(),
            timestamp: OffsetDateTime::now_utc()
                .format(&Rfc3339)
                .unwrap_or_default(),
        };

        (status, Json(json!({ "error": body }))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;

    async fn body_json(response: Response) -> Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[test]
    fn validation_keeps_details() {
        let details = vec![json!({"field": "stock", "error": "out of range"})];
        let error = AppError::validation(details.clone(), "Validation failed");

        assert_eq!(error.code(), "validation_error");
        match error {
            AppError::Validation {
                message,
                details: d,
            } => {
                assert_eq!(d, details);
                assert_eq!(message, "Validation failed");
            }
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[test]
    fn internal_error_is_500() {
        let error = AppError::Internal(anyhow::anyhow!("Database connection failed"));
        assert_eq!(error.code(), "internal_error");
        assert_eq!(error.into_response().status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn store_errors_map_to_statuses() {
        let cases = [
            (StoreError::not_found("book", 3), StatusCode::NOT_FOUND),
            (
                StoreError::Conflict {
                    entity: "author",
                    message: "duplicate".to_string(),
                },
                StatusCode::CONFLICT,
            ),
            (
                StoreError::Invalid {
                    entity: "book",
                    message: "overflow".to_string(),
                },
                StatusCode::UNPROCESSABLE_ENTITY,
            ),
            (
                StoreError::Database(sqlx::Error::PoolTimedOut),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];

        for (store_error, expected) in cases {
            assert_eq!(AppError::from(store_error).status(), expected);
        }
    }

    #[tokio::test]
    async fn response_body_carries_code_and_trace_id() {
        let response = AppError::from(StoreError::not_found("book", 7)).into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let body = body_json(response).await;
        assert_eq!(body["error"]["code"], "not_found");
        assert_eq!(body["error"]["message"], "book 7 not found");
        assert!(body["error"]["details"].as_array().unwrap().is_empty());
        assert!(Uuid::parse_str(body["error"]["trace_id"].as_str().unwrap()).is_ok());
        assert!(body["error"]["timestamp"].as_str().unwrap().contains('T'));
    }

    #[tokio::test]
    async fn conflict_body_lists_details() {
        let response = AppError::from(StoreError::Conflict {
            entity: "author",
            message: "duplicate key".to_string(),
        })
        .into_response();

        let body = body_json(response).await;
        assert_eq!(body["error"]["code"], "conflict");
        assert_eq!(body["error"]["details"][0]["entity"], "author");
    }
}
