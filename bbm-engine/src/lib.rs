//! BBM Engine - storefront loyalty, coupon and checkout core
//!
//! # Architecture
//!
//! - **Loyalty** (`loyalty`): BBM Bucks tiers, award, redeem, expiry sweep
//! - **Coupons** (`coupons`): gate checks, discount arithmetic, usage recording
//! - **Checkout** (`checkout`): orchestrates both around payment and order placement
//! - **Database** (`db`): SQLite pool, migrations, repositories
//!
//! # Layout
//!
//! ```text
//! bbm-engine/src/
//! ├── core/          # config, background tasks
//! ├── utils/         # errors, logger
//! ├── db/            # DbService + repositories
//! ├── loyalty/       # BBM Bucks ledger
//! ├── coupons/       # coupon engine
//! ├── checkout/      # orchestrator + collaborator traits
//! ├── notify/        # confirmation requests, mail outbox
//! ├── cart.rs        # cart validation
//! └── money.rs       # Decimal helpers
//! ```

pub mod cart;
pub mod checkout;
pub mod core;
pub mod coupons;
pub mod db;
pub mod loyalty;
pub mod money;
pub mod notify;
pub mod utils;

pub use cart::OrderContext;
pub use checkout::CheckoutOrchestrator;
pub use crate::core::{BackgroundTasks, CheckoutConfig, Config, RewardBase, TaskKind};
pub use coupons::{CouponEngine, CouponService};
pub use db::DbService;
pub use loyalty::{ExpirySweeper, LoyaltyLedger, LoyaltyService};
pub use notify::MailOutbox;
pub use utils::{AppError, AppResult, ErrorCategory, ErrorCode, ServiceError, ServiceResult};

pub use utils::logger::{init_logger, init_logger_with_file};

/// Load `.env` and initialize logging from the environment
pub fn setup_environment() -> Config {
    let _ = dotenvy::dotenv();
    let config = Config::from_env();
    init_logger_with_file(
        Some(&config.log_level),
        config.log_json,
        config.log_dir.as_deref(),
    );
    config
}
