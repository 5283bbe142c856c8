//! External collaborators of checkout
//!
//! Order persistence, payment and notification delivery live outside the
//! engine; checkout only sees these traits.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use shared::models::CartItem;

use super::types::OrderTotals;
use crate::notify::OrderConfirmation;

pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Result type for collaborator calls
pub type CollaboratorResult<T> = Result<T, BoxError>;

/// Successful charge
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PaymentReceipt {
    pub payment_id: String,
    pub amount: f64,
}

/// Order as handed to the order store
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OrderDraft {
    /// Checkout reference, also used as the payment reference
    pub checkout_ref: String,
    pub user_id: String,
    pub items: Vec<CartItem>,
    pub totals: OrderTotals,
    pub coupon_code: Option<String>,
    pub redeem_points: i64,
    pub payment_id: String,
}

/// Durably placed order
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PlacedOrder {
    pub order_id: String,
    /// Human-facing order number
    pub order_number: String,
}

#[async_trait]
pub trait PaymentGateway: Send + Sync {
    async fn charge(&self, user_id: &str, amount: f64, reference: &str) -> CollaboratorResult<PaymentReceipt>;
}

#[async_trait]
pub trait OrderGateway: Send + Sync {
    async fn place_order(&self, draft: &OrderDraft) -> CollaboratorResult<PlacedOrder>;
}

#[async_trait]
pub trait OrderNotifier: Send + Sync {
    async fn send_confirmation(&self, confirmation: &OrderConfirmation) -> CollaboratorResult<()>;
}
