//! Error types and UI-boundary response structures

use super::category::ErrorCategory;
use super::codes::ErrorCode;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use thiserror::Error;

/// Application error with structured error code and details
///
/// This is the primary error type of the engine, providing:
/// - Standardized error codes via [`ErrorCode`]
/// - Human-readable messages
/// - Optional structured details (amounts, limits, codes)
#[derive(Debug, Clone, Error, PartialEq)]
#[error("{message}")]
pub struct AppError {
    /// The error code identifying the type of error
    pub code: ErrorCode,
    /// Human-readable error message
    pub message: String,
    /// Optional additional details
    pub details: Option<HashMap<String, Value>>,
}

impl AppError {
    /// Create a new error with the default message for the error code
    pub fn new(code: ErrorCode) -> Self {
        Self {
            message: code.message().to_string(),
            code,
            details: None,
        }
    }

    /// Create a new error with a custom message
    pub fn with_message(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            details: None,
        }
    }

    /// Add a detail entry to this error
    pub fn with_detail(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.details
            .get_or_insert_with(HashMap::new)
            .insert(key.into(), value.into());
        self
    }

    pub fn category(&self) -> ErrorCategory {
        self.code.category()
    }

    /// Whether the UI should offer a retry (infrastructure failures only)
    pub fn is_retryable(&self) -> bool {
        self.category().is_retryable()
    }

    // ==================== Convenience constructors ====================

    /// Create a validation error
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::with_message(ErrorCode::ValidationFailed, msg)
    }

    /// Create an internal error
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::with_message(ErrorCode::InternalError, msg)
    }

    /// Create a database error
    pub fn database(msg: impl Into<String>) -> Self {
        Self::with_message(ErrorCode::DatabaseError, msg)
    }

    /// Create an invalid request error
    pub fn invalid_request(msg: impl Into<String>) -> Self {
        Self::with_message(ErrorCode::InvalidRequest, msg)
    }
}

/// Result envelope handed to UI event handlers
///
/// Failures never cross the UI boundary as panics or raw errors; the
/// handler receives this structure and decides between an inline message
/// (`retryable == false`) and a retry affordance (`retryable == true`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActionResponse<T> {
    /// Error code (0 for success)
    pub code: u16,
    /// Human-readable message
    pub message: String,
    /// Whether retrying the same action may succeed
    pub retryable: bool,
    /// Response data (present on success)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    /// Additional error details (present on failure)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<HashMap<String, Value>>,
}

impl<T> ActionResponse<T> {
    /// Create a success response with data
    pub fn success(data: T) -> Self {
        Self {
            code: ErrorCode::Success.code(),
            message: "OK".to_string(),
            retryable: false,
            data: Some(data),
            details: None,
        }
    }

    /// Create an error response from an AppError
    pub fn error(err: &AppError) -> Self {
        Self {
            code: err.code.code(),
            message: err.message.clone(),
            retryable: err.is_retryable(),
            data: None,
            details: err.details.clone(),
        }
    }

    pub fn is_success(&self) -> bool {
        self.code == ErrorCode::Success.code()
    }
}

impl<T> From<AppResult<T>> for ActionResponse<T> {
    fn from(result: AppResult<T>) -> Self {
        match result {
            Ok(data) => Self::success(data),
            Err(err) => Self::error(&err),
        }
    }
}

/// Type alias for Result with AppError
pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_app_error_new() {
        let err = AppError::new(ErrorCode::CouponExpired);
        assert_eq!(err.code, ErrorCode::CouponExpired);
        assert_eq!(err.message, "This coupon has expired");
        assert!(err.details.is_none());
    }

    #[test]
    fn test_app_error_with_detail() {
        let err = AppError::new(ErrorCode::MinimumRedemption)
            .with_detail("minimum", 50)
            .with_detail("minimum_rupees", 0.5);

        let details = err.details.unwrap();
        assert_eq!(details.get("minimum").unwrap(), 50);
        assert_eq!(details.get("minimum_rupees").unwrap(), 0.5);
    }

    #[test]
    fn test_retryable_follows_category() {
        assert!(AppError::database("locked").is_retryable());
        assert!(AppError::internal("boom").is_retryable());
        assert!(!AppError::new(ErrorCode::InsufficientBalance).is_retryable());
        assert!(!AppError::validation("bad").is_retryable());
    }

    #[test]
    fn test_app_error_display() {
        let err = AppError::with_message(ErrorCode::CouponNotFound, "Invalid coupon code");
        assert_eq!(format!("{}", err), "Invalid coupon code");
    }

    #[test]
    fn test_action_response_from_result() {
        let ok: ActionResponse<i64> = Ok::<_, AppError>(42).into();
        assert!(ok.is_success());
        assert_eq!(ok.data, Some(42));

        let err: ActionResponse<i64> =
            Err::<i64, _>(AppError::new(ErrorCode::DatabaseError)).into();
        assert_eq!(err.code, 9002);
        assert!(err.retryable);
        assert!(err.data.is_none());
    }

    #[test]
    fn test_action_response_serialize() {
        let response = ActionResponse::success("hello");
        let json = serde_json::to_string(&response).unwrap();
        assert!(json.contains("\"code\":0"));
        assert!(json.contains("\"data\":\"hello\""));
        assert!(!json.contains("details"));
    }
}
