//! Error types for fintrack-api

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use fintrack_core::{
    CoreError, DefaultErrorLogger, ErrorCode, ErrorContext, ErrorLogger, FieldError, StoreError,
};
use serde::Serialize;
use thiserror::Error;

use crate::auth::AuthUser;

#[derive(Error, Debug)]
pub enum ApiError {
    /// A failure from the transaction layer, with the operation it came from
    #[error("{error}")]
    Core {
        error: CoreError,
        context: ErrorContext,
    },

    /// Request body or query string could not be decoded at all
    #[error("Bad request: {message}")]
    BadRequest { message: String },
}

impl ApiError {
    /// Map a core error raised while serving `operation` for `user`
    pub fn during<'a>(operation: &'static str, user: &'a AuthUser) -> impl FnOnce(CoreError) -> ApiError + 'a {
        move |error| ApiError::Core {
            error,
            context: ErrorContext::new(operation).with_user_id(user.user_id.clone()),
        }
    }

    pub fn unauthorized(reason: &str) -> Self {
        ApiError::Core {
            error: CoreError::Unauthorized,
            context: ErrorContext::new(format!("authenticate: {}", reason)),
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::BadRequest { .. } => StatusCode::BAD_REQUEST,
            ApiError::Core { error, .. } => match error {
                CoreError::Validation(_)
                | CoreError::InvalidId { .. }
                | CoreError::EmptyUpdate
                | CoreError::TypeMismatch { .. } => StatusCode::BAD_REQUEST,
                CoreError::Unauthorized => StatusCode::UNAUTHORIZED,
                CoreError::NotFound { .. } => StatusCode::NOT_FOUND,
                CoreError::Store(StoreError::Timeout { .. }) => StatusCode::SERVICE_UNAVAILABLE,
                CoreError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
        }
    }
}

/// Body of every failed response
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub success: bool,
    pub message: String,
    pub code: ErrorCode,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<FieldError>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub suggestions: Vec<String>,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = match self {
            ApiError::Core { error, context } => {
                DefaultErrorLogger.log_error(&error, &context);
                let details = error.to_details();
                let message = match &error {
                    // store internals are not shown to callers
                    CoreError::Store(StoreError::Backend { .. }) => {
                        "Failed to access transaction store".to_string()
                    }
                    _ => details.message,
                };
                ErrorBody {
                    success: false,
                    message,
                    code: details.code,
                    errors: details.errors,
                    suggestions: details.suggestions,
                }
            }
            ApiError::BadRequest { message } => {
                log::debug!(target: "fintrack::error", "bad request: {}", message);
                ErrorBody {
                    success: false,
                    message,
                    code: ErrorCode::ValidationError,
                    errors: vec![],
                    suggestions: vec![],
                }
            }
        };
        (status, Json(body)).into_response()
    }
}
