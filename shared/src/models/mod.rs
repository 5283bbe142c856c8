//! Data models
//!
//! Shared between the engine and the storefront app.
//! DB row types use `#[cfg_attr(feature = "db", derive(sqlx::FromRow))]`.

pub mod cart;
pub mod coupon;
pub mod loyalty;

// Re-exports
pub use cart::*;
pub use coupon::*;
pub use loyalty::*;
