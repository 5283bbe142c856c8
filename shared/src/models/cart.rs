//! Cart Models

use serde::{Deserialize, Serialize};

/// Cart line item as sent by the storefront
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CartItem {
    pub product_id: String,
    pub name: String,
    /// Unit price in rupees
    pub price: f64,
    pub quantity: i32,
    pub category: Option<String>,
}

impl CartItem {
    pub fn new(
        product_id: impl Into<String>,
        name: impl Into<String>,
        price: f64,
        quantity: i32,
        category: Option<&str>,
    ) -> Self {
        Self {
            product_id: product_id.into(),
            name: name.into(),
            price,
            quantity,
            category: category.map(str::to_string),
        }
    }
}
