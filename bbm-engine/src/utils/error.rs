//! Service-layer error type
//!
//! `ServiceError` bridges DB-layer errors (`RepoError`, `sqlx::Error`) and the
//! boundary error (`AppError`), so services can use `?` on both without
//! `.map_err(...)` boilerplate.

pub use shared::error::{ActionResponse, AppError, AppResult, ErrorCategory, ErrorCode};

use crate::db::repository::RepoError;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Service-layer error with two severities.
///
/// - `Db`: infrastructure failure (logged, surfaced as a generic retryable error)
/// - `App`: validation / business-rule failure (passed through with its code)
#[derive(Debug)]
pub enum ServiceError {
    Db(BoxError),
    App(AppError),
}

impl ServiceError {
    /// The business error, if this is one
    pub fn as_app(&self) -> Option<&AppError> {
        match self {
            ServiceError::App(e) => Some(e),
            ServiceError::Db(_) => None,
        }
    }

    pub fn code(&self) -> ErrorCode {
        match self {
            ServiceError::App(e) => e.code,
            ServiceError::Db(_) => ErrorCode::InternalError,
        }
    }
}

impl std::fmt::Display for ServiceError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ServiceError::Db(e) => write!(f, "infrastructure error: {e}"),
            ServiceError::App(e) => write!(f, "{e}"),
        }
    }
}

impl std::error::Error for ServiceError {}

impl From<sqlx::Error> for ServiceError {
    fn from(e: sqlx::Error) -> Self {
        ServiceError::Db(e.into())
    }
}

impl From<RepoError> for ServiceError {
    fn from(e: RepoError) -> Self {
        ServiceError::Db(e.into())
    }
}

impl From<BoxError> for ServiceError {
    fn from(e: BoxError) -> Self {
        ServiceError::Db(e)
    }
}

impl From<AppError> for ServiceError {
    fn from(e: AppError) -> Self {
        ServiceError::App(e)
    }
}

impl From<ServiceError> for AppError {
    fn from(e: ServiceError) -> Self {
        match e {
            ServiceError::App(app_err) => app_err,
            ServiceError::Db(db_err) => {
                tracing::error!(error = %db_err, "Service infrastructure error");
                AppError::new(ErrorCode::InternalError)
            }
        }
    }
}

/// Convenience type alias for service-layer results
pub type ServiceResult<T> = Result<T, ServiceError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_db_error_becomes_generic_retryable() {
        let err: ServiceError = RepoError::Database("disk I/O error".into()).into();
        assert!(err.as_app().is_none());

        let app: AppError = err.into();
        assert_eq!(app.code, ErrorCode::InternalError);
        assert!(app.is_retryable());
        assert!(!app.message.contains("disk"));
    }

    #[test]
    fn test_business_error_passes_through() {
        let err: ServiceError = AppError::new(ErrorCode::CouponExpired).into();
        assert_eq!(err.code(), ErrorCode::CouponExpired);

        let app: AppError = err.into();
        assert_eq!(app.code, ErrorCode::CouponExpired);
        assert!(!app.is_retryable());
    }
}
