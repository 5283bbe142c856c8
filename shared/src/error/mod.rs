//! Unified error system for the BBM storefront engine
//!
//! - [`ErrorCode`]: Standardized error codes for all error types
//! - [`ErrorCategory`]: Classification of errors by domain
//! - [`AppError`]: Rich error type with codes, messages, and details
//! - [`ActionResponse`]: Result envelope for UI event handlers
//!
//! # Error Code Ranges
//!
//! - 0xxx: General errors
//! - 1xxx: Loyalty errors
//! - 2xxx: Coupon errors
//! - 3xxx: Checkout errors
//! - 9xxx: System errors
//!
//! # Example
//!
//! ```
//! use shared::error::{ActionResponse, AppError, ErrorCode};
//!
//! let err = AppError::new(ErrorCode::InsufficientBalance)
//!     .with_detail("available", 40);
//! assert!(!err.is_retryable());
//!
//! let response = ActionResponse::<()>::error(&err);
//! assert_eq!(response.code, 1002);
//! ```

mod category;
mod codes;
mod types;

pub use category::ErrorCategory;
pub use codes::{ErrorCode, InvalidErrorCode};
pub use types::{ActionResponse, AppError, AppResult};
