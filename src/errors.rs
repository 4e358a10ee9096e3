use crate::services::{
    auth_service::AuthError, model_service::ModelError, upload_service::UploadError,
};
use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use std::fmt;

/// A lightweight wrapper for general errors that keeps the message local.
#[derive(Debug)]
pub struct AppError {
    pub status: StatusCode,
    pub message: String,
}

impl AppError {
    /// Create a new AppError with a specific status and message.
    pub fn new(status: StatusCode, msg: impl Into<String>) -> Self {
        Self {
            status,
            message: msg.into(),
        }
    }

    /// Shortcut for a 500 Internal Server Error
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, msg)
    }

    /// Shortcut for 404 Not Found
    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, msg)
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for AppError {}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        if self.status.is_server_error() {
            tracing::error!("{}", self.message);
        }

        let body = Json(json!({
            "error": self.message,
            "status": self.status.as_u16()
        }));

        (self.status, body).into_response()
    }
}

impl From<AuthError> for AppError {
    fn from(err: AuthError) -> Self {
        AppError::internal(err.to_string())
    }
}

impl From<ModelError> for AppError {
    fn from(err: ModelError) -> Self {
        match err {
            ModelError::NotFound { .. } => AppError::not_found(err.to_string()),
            ModelError::CreateNotAllowed(_) => {
                AppError::new(StatusCode::METHOD_NOT_ALLOWED, err.to_string())
            }
            ModelError::Conflict(_) => AppError::new(StatusCode::CONFLICT, err.to_string()),
            ModelError::Sqlx(_) => AppError::internal(err.to_string()),
        }
    }
}

impl From<UploadError> for AppError {
    fn from(err: UploadError) -> Self {
        match err {
            UploadError::NotFound(_) | UploadError::InvalidName => {
                AppError::not_found(err.to_string())
            }
            UploadError::Io(_) => AppError::internal(err.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn model_errors_map_to_statuses() {
        let not_found: AppError = ModelError::NotFound {
            view: "ban",
            id: "7".into(),
        }
        .into();
        assert_eq!(not_found.status, StatusCode::NOT_FOUND);
        assert_eq!(not_found.message, "ban `7` not found");

        let create: AppError = ModelError::CreateNotAllowed("configpair").into();
        assert_eq!(create.status, StatusCode::METHOD_NOT_ALLOWED);

        let upload: AppError = UploadError::InvalidName.into();
        assert_eq!(upload.status, StatusCode::NOT_FOUND);

        let timeout: AppError = AuthError::SessionTimeout(u64::MAX).into();
        assert_eq!(timeout.status, StatusCode::INTERNAL_SERVER_ERROR);
    }
}
