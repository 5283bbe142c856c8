//! Cart validation and order context
//!
//! The storefront sends prices as f64; everything is checked here before it
//! reaches the coupon or loyalty arithmetic.

use rust_decimal::Decimal;
use shared::error::{AppError, ErrorCode};
use shared::models::CartItem;

use crate::money::{line_total, to_f64};

/// Maximum allowed unit price (₹1,00,00,000)
const MAX_PRICE: f64 = 10_000_000.0;
/// Maximum allowed quantity per line
const MAX_QUANTITY: i32 = 9999;

#[inline]
fn require_finite(value: f64, field_name: &str) -> Result<(), AppError> {
    if !value.is_finite() {
        return Err(AppError::with_message(
            ErrorCode::InvalidCartItem,
            format!("{field_name} must be a finite number, got {value}"),
        ));
    }
    Ok(())
}

/// Validate one cart line
pub fn validate_cart_item(item: &CartItem) -> Result<(), AppError> {
    require_finite(item.price, "price")?;
    if item.price < 0.0 {
        return Err(AppError::with_message(
            ErrorCode::InvalidCartItem,
            format!("price must be non-negative, got {}", item.price),
        ));
    }
    if item.price > MAX_PRICE {
        return Err(AppError::with_message(
            ErrorCode::InvalidCartItem,
            format!("price exceeds maximum allowed ({MAX_PRICE}), got {}", item.price),
        ));
    }
    if item.quantity <= 0 {
        return Err(AppError::with_message(
            ErrorCode::InvalidCartItem,
            format!("quantity must be positive, got {}", item.quantity),
        ));
    }
    if item.quantity > MAX_QUANTITY {
        return Err(AppError::with_message(
            ErrorCode::InvalidCartItem,
            format!(
                "quantity exceeds maximum allowed ({MAX_QUANTITY}), got {}",
                item.quantity
            ),
        ));
    }
    Ok(())
}

/// Validated cart with its item subtotal
#[derive(Debug, Clone, PartialEq)]
pub struct OrderContext {
    pub items: Vec<CartItem>,
    subtotal: Decimal,
}

impl OrderContext {
    /// Validate every line and compute the subtotal
    pub fn new(items: Vec<CartItem>) -> Result<Self, AppError> {
        if items.is_empty() {
            return Err(AppError::new(ErrorCode::CartEmpty));
        }
        for item in &items {
            validate_cart_item(item).map_err(|e| e.with_detail("product_id", item.product_id.clone()))?;
        }
        let subtotal = items.iter().map(|i| line_total(i.price, i.quantity)).sum();
        Ok(Self { items, subtotal })
    }

    pub fn subtotal(&self) -> Decimal {
        self.subtotal
    }

    pub fn subtotal_f64(&self) -> f64 {
        to_f64(self.subtotal)
    }

    /// Distinct non-blank categories present in the cart
    pub fn categories(&self) -> Vec<String> {
        Self::categories_of(&self.items)
    }

    pub fn categories_of(items: &[CartItem]) -> Vec<String> {
        let mut out: Vec<String> = Vec::new();
        for category in items.iter().filter_map(|i| i.category.as_deref()) {
            let category = category.trim();
            if !category.is_empty() && !out.iter().any(|c| c == category) {
                out.push(category.to_string());
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_subtotal() {
        let ctx = OrderContext::new(vec![
            CartItem::new("p1", "Drill", 1500.0, 2, Some("TOOLS")),
            CartItem::new("p2", "Paint", 249.5, 1, Some("PAINTS")),
        ])
        .unwrap();
        assert_eq!(ctx.subtotal_f64(), 3249.5);
        assert_eq!(ctx.categories(), vec!["TOOLS", "PAINTS"]);
    }

    #[test]
    fn test_empty_cart_rejected() {
        let err = OrderContext::new(vec![]).unwrap_err();
        assert_eq!(err.code, ErrorCode::CartEmpty);
    }

    #[test]
    fn test_invalid_lines_rejected() {
        for item in [
            CartItem::new("p", "x", f64::NAN, 1, None),
            CartItem::new("p", "x", -1.0, 1, None),
            CartItem::new("p", "x", 10.0, 0, None),
            CartItem::new("p", "x", 10.0, MAX_QUANTITY + 1, None),
            CartItem::new("p", "x", MAX_PRICE + 1.0, 1, None),
        ] {
            let err = OrderContext::new(vec![item]).unwrap_err();
            assert_eq!(err.code, ErrorCode::InvalidCartItem);
        }
    }
}
