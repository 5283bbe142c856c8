//! Utilities
//!
//! - [`ServiceError`] - service-layer error bridging DB and business errors
//! - [`AppError`] - boundary error type (from shared::error)
//! - logger setup

pub mod error;
pub mod logger;

pub use error::{ActionResponse, AppError, AppResult, ErrorCategory, ErrorCode};
pub use error::{ServiceError, ServiceResult};
