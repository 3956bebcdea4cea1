//! Error types for fintrack-core
//!
//! Every failure a transaction operation can produce, with stable codes for
//! programmatic handling and field-level detail for validation failures.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::store::StoreError;

/// Error codes for programmatic error handling
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    ValidationError,
    InvalidId,
    NotFound,
    EmptyUpdate,
    TypeMismatch,
    Unauthorized,
    StoreTimeout,
    StoreError,
}

impl std::fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ErrorCode::ValidationError => write!(f, "VALIDATION_ERROR"),
            ErrorCode::InvalidId => write!(f, "INVALID_ID"),
            ErrorCode::NotFound => write!(f, "NOT_FOUND"),
            ErrorCode::EmptyUpdate => write!(f, "EMPTY_UPDATE"),
            ErrorCode::TypeMismatch => write!(f, "TYPE_MISMATCH"),
            ErrorCode::Unauthorized => write!(f, "UNAUTHORIZED"),
            ErrorCode::StoreTimeout => write!(f, "STORE_TIMEOUT"),
            ErrorCode::StoreError => write!(f, "STORE_ERROR"),
        }
    }
}

/// One offending input field
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldError {
    pub field: String,
    pub reason: String,
}

impl FieldError {
    pub fn new(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            reason: reason.into(),
        }
    }
}

/// Every offending field of a rejected payload, in input order
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ValidationErrors(pub Vec<FieldError>);

impl ValidationErrors {
    pub fn single(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self(vec![FieldError::new(field, reason)])
    }

    pub fn push(&mut self, field: impl Into<String>, reason: impl Into<String>) {
        self.0.push(FieldError::new(field, reason));
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl std::fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let parts: Vec<String> = self
            .0
            .iter()
            .map(|e| format!("{}: {}", e.field, e.reason))
            .collect();
        f.write_str(&parts.join("; "))
    }
}

/// Error severity levels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ErrorSeverity {
    Info,
    Warning,
    Error,
}

impl std::fmt::Display for ErrorSeverity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ErrorSeverity::Info => write!(f, "info"),
            ErrorSeverity::Warning => write!(f, "warning"),
            ErrorSeverity::Error => write!(f, "error"),
        }
    }
}

/// Main error type for fintrack-core
#[derive(Error, Debug)]
pub enum CoreError {
    #[error("Validation failed: {0}")]
    Validation(ValidationErrors),

    #[error("Invalid transaction id: {id}")]
    InvalidId { id: String },

    #[error("Transaction not found: {id}")]
    NotFound { id: String },

    #[error("Update must contain at least one field")]
    EmptyUpdate,

    #[error("Type mismatch: {message}")]
    TypeMismatch { message: String },

    #[error("Unauthorized access")]
    Unauthorized,

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl CoreError {
    /// Get the error code
    pub fn code(&self) -> ErrorCode {
        match self {
            CoreError::Validation(_) => ErrorCode::ValidationError,
            CoreError::InvalidId { .. } => ErrorCode::InvalidId,
            CoreError::NotFound { .. } => ErrorCode::NotFound,
            CoreError::EmptyUpdate => ErrorCode::EmptyUpdate,
            CoreError::TypeMismatch { .. } => ErrorCode::TypeMismatch,
            CoreError::Unauthorized => ErrorCode::Unauthorized,
            CoreError::Store(StoreError::Timeout { .. }) => ErrorCode::StoreTimeout,
            CoreError::Store(_) => ErrorCode::StoreError,
        }
    }

    /// Get the severity level
    pub fn severity(&self) -> ErrorSeverity {
        match self {
            CoreError::Validation(_)
            | CoreError::InvalidId { .. }
            | CoreError::NotFound { .. }
            | CoreError::EmptyUpdate
            | CoreError::TypeMismatch { .. } => ErrorSeverity::Info,
            CoreError::Unauthorized => ErrorSeverity::Warning,
            CoreError::Store(_) => ErrorSeverity::Error,
        }
    }

    /// Convert to detailed error info
    pub fn to_details(&self) -> ErrorDetails {
        let mut details = ErrorDetails::new(self.code(), self.to_string());

        match self {
            CoreError::Validation(errors) => {
                details.errors = errors.0.clone();
            }
            CoreError::InvalidId { .. } => {
                details = details.with_suggestion("Transaction ids are UUIDs.".to_string());
            }
            CoreError::EmptyUpdate => {
                details = details.with_suggestion(
                    "Send at least one of the transaction fields to change.".to_string()
                );
            }
            CoreError::TypeMismatch { .. } => {
                details = details.with_suggestion(
                    "Income records take `source`; expense records take `paymentMethod`.".to_string()
                );
            }
            CoreError::Store(StoreError::Timeout { .. }) => {
                details = details.with_suggestion(
                    "The write was not retried; check whether it was applied before resending.".to_string()
                );
            }
            _ => {}
        }

        details
    }
}

/// Result type with CoreError
pub type CoreResult<T> = Result<T, CoreError>;

/// Detailed error information for API responses
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorDetails {
    pub code: ErrorCode,
    pub message: String,
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub errors: Vec<FieldError>,
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub suggestions: Vec<String>,
}

impl ErrorDetails {
    pub fn new(code: ErrorCode, message: String) -> Self {
        Self {
            code,
            message,
            errors: vec![],
            suggestions: vec![],
        }
    }

    pub fn with_suggestion(mut self, suggestion: String) -> Self {
        self.suggestions.push(suggestion);
        self
    }
}

impl std::fmt::Display for ErrorDetails {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}] {}", self.code, self.message)?;
        if !self.suggestions.is_empty() {
            write!(f, "\nSuggestions:")?;
            for suggestion in &self.suggestions {
                write!(f, "\n  - {}", suggestion)?;
            }
        }
        Ok(())
    }
}

/// Error context for reporting
#[derive(Debug, Clone, Default)]
pub struct ErrorContext {
    /// User ID (if authenticated)
    pub user_id: Option<String>,
    /// Operation being performed
    pub operation: String,
}

impl ErrorContext {
    pub fn new(operation: impl Into<String>) -> Self {
        Self {
            user_id: None,
            operation: operation.into(),
        }
    }

    pub fn with_user_id(mut self, user_id: impl Into<String>) -> Self {
        self.user_id = Some(user_id.into());
        self
    }
}

/// Error logger trait
pub trait ErrorLogger: Send + Sync {
    fn log_error(&self, error: &CoreError, context: &ErrorContext);
}

/// Default error logger using log crate
#[derive(Default)]
pub struct DefaultErrorLogger;

impl ErrorLogger for DefaultErrorLogger {
    fn log_error(&self, error: &CoreError, context: &ErrorContext) {
        let level = match error.severity() {
            ErrorSeverity::Info => log::Level::Debug,
            ErrorSeverity::Warning => log::Level::Warn,
            ErrorSeverity::Error => log::Level::Error,
        };
        log::log!(
            target: "fintrack::error",
            level,
            "[{}] {} - Operation: {} - User: {:?}",
            error.code(),
            error,
            context.operation,
            context.user_id
        );
    }
}

// ==================== Tests ====================
