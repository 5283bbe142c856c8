//! Checkout orchestration
//!
//! [`CheckoutOrchestrator`] sequences the loyalty ledger and coupon engine
//! around the external payment, order and notification collaborators.

mod collaborators;
mod orchestrator;
mod types;

pub use collaborators::{
    BoxError, CollaboratorResult, OrderDraft, OrderGateway, OrderNotifier, PaymentGateway,
    PaymentReceipt, PlacedOrder,
};
pub use orchestrator::CheckoutOrchestrator;
pub use types::{
    CheckoutQuote, CheckoutReceipt, CheckoutRequest, CouponUsageOutcome, CustomerContact,
    LoyaltyOutcome, NotificationOutcome, OrderTotals, RedemptionOutcome,
};
