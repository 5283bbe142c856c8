use std::str::FromStr;

/// Engine configuration
///
/// # Environment variables
///
/// | Variable | Default | Description |
/// |----------|---------|-------------|
/// | ENVIRONMENT | development | Runtime environment |
/// | DATABASE_PATH | bbm.db | SQLite database file |
/// | LOG_LEVEL | info | Log level for engine crates |
/// | LOG_JSON | false | Emit JSON log lines |
/// | LOG_DIR | (unset) | Directory for daily rolling log files |
/// | EXPIRY_SWEEP_INTERVAL_SECS | 3600 | Expiry sweep period |
/// | SHIPPING_FEE | 50 | Flat shipping fee (rupees) |
/// | TAX_RATE_PERCENT | 18 | Flat tax rate |
/// | REWARD_BASE | subtotal | `subtotal` or `payable` |
///
/// # Example
///
/// ```ignore
/// DATABASE_PATH=/data/bbm.db REWARD_BASE=payable cargo run
/// ```
#[derive(Debug, Clone)]
pub struct Config {
    /// development | staging | production
    pub environment: String,
    pub database_path: String,
    pub log_level: String,
    pub log_json: bool,
    pub log_dir: Option<String>,
    pub expiry_sweep_interval_secs: u64,
    pub checkout: CheckoutConfig,
}

impl Config {
    /// Load configuration from the environment, falling back to defaults
    pub fn from_env() -> Self {
        Self {
            environment: std::env::var("ENVIRONMENT").unwrap_or_else(|_| "development".into()),
            database_path: std::env::var("DATABASE_PATH").unwrap_or_else(|_| "bbm.db".into()),
            log_level: std::env::var("LOG_LEVEL").unwrap_or_else(|_| "info".into()),
            log_json: std::env::var("LOG_JSON")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(false),
            log_dir: std::env::var("LOG_DIR").ok().filter(|d| !d.is_empty()),
            expiry_sweep_interval_secs: std::env::var("EXPIRY_SWEEP_INTERVAL_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .filter(|v| *v > 0)
                .unwrap_or(3600),
            checkout: CheckoutConfig::from_env(),
        }
    }

    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }

    pub fn is_development(&self) -> bool {
        self.environment == "development"
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::from_env()
    }
}

/// Amount the loyalty award is computed on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RewardBase {
    /// Item subtotal before coupon and BBM Bucks discounts
    #[default]
    Subtotal,
    /// Taxable amount after coupon and BBM Bucks discounts
    Payable,
}

impl FromStr for RewardBase {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "subtotal" => Ok(RewardBase::Subtotal),
            "payable" => Ok(RewardBase::Payable),
            other => Err(format!("unknown reward base: {other}")),
        }
    }
}

/// Checkout pricing knobs
#[derive(Debug, Clone, PartialEq)]
pub struct CheckoutConfig {
    /// Flat shipping fee in rupees
    pub shipping_fee: f64,
    /// 18 = 18%
    pub tax_rate_percent: f64,
    pub reward_base: RewardBase,
}

impl CheckoutConfig {
    pub const DEFAULT_SHIPPING_FEE: f64 = 50.0;
    pub const DEFAULT_TAX_RATE_PERCENT: f64 = 18.0;

    pub fn from_env() -> Self {
        let reward_base = match std::env::var("REWARD_BASE") {
            Ok(v) => v.parse().unwrap_or_else(|e: String| {
                tracing::warn!(error = %e, "Invalid REWARD_BASE, using subtotal");
                RewardBase::Subtotal
            }),
            Err(_) => RewardBase::Subtotal,
        };
        Self {
            shipping_fee: std::env::var("SHIPPING_FEE")
                .ok()
                .and_then(|v| v.parse().ok())
                .filter(|v: &f64| v.is_finite() && *v >= 0.0)
                .unwrap_or(Self::DEFAULT_SHIPPING_FEE),
            tax_rate_percent: std::env::var("TAX_RATE_PERCENT")
                .ok()
                .and_then(|v| v.parse().ok())
                .filter(|v: &f64| v.is_finite() && *v >= 0.0)
                .unwrap_or(Self::DEFAULT_TAX_RATE_PERCENT),
            reward_base,
        }
    }
}

impl Default for CheckoutConfig {
    fn default() -> Self {
        Self {
            shipping_fee: Self::DEFAULT_SHIPPING_FEE,
            tax_rate_percent: Self::DEFAULT_TAX_RATE_PERCENT,
            reward_base: RewardBase::Subtotal,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reward_base_parse() {
        assert_eq!("subtotal".parse::<RewardBase>(), Ok(RewardBase::Subtotal));
        assert_eq!(" Payable ".parse::<RewardBase>(), Ok(RewardBase::Payable));
        assert!("total".parse::<RewardBase>().is_err());
    }

    #[test]
    fn test_checkout_defaults() {
        let config = CheckoutConfig::default();
        assert_eq!(config.shipping_fee, 50.0);
        assert_eq!(config.tax_rate_percent, 18.0);
        assert_eq!(config.reward_base, RewardBase::Subtotal);
    }
}
