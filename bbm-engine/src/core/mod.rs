//! Core engine infrastructure: configuration and background tasks

pub mod config;
pub mod tasks;

pub use config::{CheckoutConfig, Config, RewardBase};
pub use tasks::{BackgroundTasks, TaskKind};
