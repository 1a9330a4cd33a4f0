use axum::{
    Json,
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;

use crate::{admission::Rejection, store::StoreError};

#[derive(Debug)]
pub enum AppError {
    BadRequest(String),
    NotFound(String),
    Conflict(String),
    Store(StoreError),
}

impl AppError {
    pub fn unresolved_ip() -> Self {
        AppError::BadRequest("Could not determine IP address".into())
    }
}

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Rejected(rejection @ Rejection::NotFound) => {
                AppError::NotFound(rejection.to_string())
            }
            StoreError::Rejected(rejection) => AppError::Conflict(rejection.to_string()),
            other => AppError::Store(other),
        }
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::BadRequest(format!("Invalid request body: {}", rejection.body_text()))
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            AppError::Conflict(msg) => (StatusCode::CONFLICT, msg),
            AppError::Store(err) => {
                tracing::error!("Storage error: {:?}", err);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal Server Error".to_string(),
                )
            }
        };

        (
            status,
            Json(json!({
                "success": false,
                "error": message,
            })),
        )
            .into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejections_map_to_client_errors() {
        let status = |err: StoreError| AppError::from(err).into_response().status();

        assert_eq!(
            status(StoreError::Rejected(Rejection::NotFound)),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            status(StoreError::Rejected(Rejection::Duplicate)),
            StatusCode::CONFLICT
        );
        assert_eq!(
            status(StoreError::Rejected(Rejection::LimitExceeded)),
            StatusCode::CONFLICT
        );
        assert_eq!(
            status(StoreError::Database(sqlx::Error::PoolTimedOut)),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
