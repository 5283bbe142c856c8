//! Order confirmation notifications
//!
//! The engine only builds the confirmation request; delivery (email or
//! WhatsApp) belongs to whatever implements `OrderNotifier`.

mod outbox;

pub use outbox::MailOutbox;

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Template identifier for order confirmations
pub const ORDER_CONFIRMATION_TEMPLATE: &str = "order_confirmation";

/// Confirmation request handed to the notification collaborator
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OrderConfirmation {
    pub recipient: String,
    pub subject: String,
    pub template: String,
    pub metadata: BTreeMap<String, String>,
}

impl OrderConfirmation {
    pub fn new(recipient: impl Into<String>, order_number: &str) -> Self {
        Self {
            recipient: recipient.into(),
            subject: format!("Your BBM order {order_number} is confirmed"),
            template: ORDER_CONFIRMATION_TEMPLATE.to_string(),
            metadata: BTreeMap::from([("order_number".to_string(), order_number.to_string())]),
        }
    }

    pub fn with_meta(mut self, key: impl Into<String>, value: impl ToString) -> Self {
        self.metadata.insert(key.into(), value.to_string());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_confirmation_request() {
        let c = OrderConfirmation::new("a@example.com", "BBM-1001").with_meta("total", 1180.5);
        assert_eq!(c.template, "order_confirmation");
        assert!(c.subject.contains("BBM-1001"));
        assert_eq!(c.metadata.get("total").map(String::as_str), Some("1180.5"));
        assert_eq!(c.metadata.get("order_number").map(String::as_str), Some("BBM-1001"));
    }
}
