use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::domain::ports::StoreError;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Service unavailable: {0}")]
    Unavailable(String),

    #[error("Internal server error: {0}")]
    Internal(String),
}

impl AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::Unavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = Json(json!({
            "error": self.to_string(),
            "status": status.as_u16(),
        }));

        (status, body).into_response()
    }
}

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound(msg) => AppError::NotFound(msg),
            StoreError::Conflict(msg) => AppError::Conflict(msg),
            StoreError::InvalidInput(msg) => AppError::Validation(msg),
            StoreError::Unavailable(msg) => AppError::Unavailable(msg),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_error_status_code() {
        let error = AppError::Validation("reference_id must not be empty".to_string());
        assert_eq!(error.status_code(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_not_found_error_status_code() {
        let error = AppError::NotFound("transaction T-404 not found".to_string());
        assert_eq!(error.status_code(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn test_conflict_error_status_code() {
        let error = AppError::Conflict("status already advanced".to_string());
        assert_eq!(error.status_code(), StatusCode::CONFLICT);
    }

    #[test]
    fn test_unavailable_error_status_code() {
        let error = AppError::Unavailable("store down".to_string());
        assert_eq!(error.status_code(), StatusCode::SERVICE_UNAVAILABLE);
    }

    #[test]
    fn test_store_error_mapping() {
        let conflict: AppError = StoreError::Conflict("stale".into()).into();
        assert!(matches!(conflict, AppError::Conflict(_)));

        let missing: AppError = StoreError::NotFound("gone".into()).into();
        assert!(matches!(missing, AppError::NotFound(_)));

        let invalid: AppError = StoreError::InvalidInput("page".into()).into();
        assert!(matches!(invalid, AppError::Validation(_)));

        let down: AppError = StoreError::Unavailable("io".into()).into();
        assert!(matches!(down, AppError::Unavailable(_)));
    }

    #[tokio::test]
    async fn test_conflict_error_response() {
        let error = AppError::Conflict("transaction T-1 is success, expected pending".to_string());
        let response = error.into_response();

        assert_eq!(response.status(), StatusCode::CONFLICT);
    }

    #[tokio::test]
    async fn test_validation_error_response() {
        let error = AppError::Validation("page must be >= 1".to_string());
        let response = error.into_response();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}
