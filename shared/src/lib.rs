//! Shared types for the BBM storefront engine
//!
//! Data models, the unified error system and small utilities used by the
//! engine and by the storefront app that embeds it.

pub mod error;
pub mod models;
pub mod util;

// Re-exports
pub use error::{ActionResponse, AppError, AppResult, ErrorCategory, ErrorCode};
pub use serde::{Deserialize, Serialize};
