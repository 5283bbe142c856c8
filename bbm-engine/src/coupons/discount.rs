//! Coupon discount arithmetic

use rust_decimal::Decimal;
use shared::models::{CartItem, Coupon, CouponApplication, DiscountType};

use super::matcher::matches_any;
use crate::money::{line_total, round_money, to_decimal, to_f64};

/// Amount the discount applies to
///
/// With applicable categories: line totals of items that match one and no
/// excluded category. Otherwise the whole subtotal.
pub fn discount_base(coupon: &Coupon, items: &[CartItem], subtotal: Decimal) -> Decimal {
    if !coupon.has_category_restriction() {
        return subtotal;
    }
    items
        .iter()
        .filter(|item| matches_any(&coupon.applicable_categories, item.category.as_deref()))
        .filter(|item| !matches_any(&coupon.excluded_categories, item.category.as_deref()))
        .map(|item| line_total(item.price, item.quantity))
        .sum()
}

/// Benefit of an already validated coupon
///
/// Free shipping never reduces the item total; it reports `shipping_fee`
/// as savings for display.
pub fn apply(coupon: &Coupon, items: &[CartItem], subtotal: Decimal, shipping_fee: f64) -> CouponApplication {
    let base = discount_base(coupon, items, subtotal).max(Decimal::ZERO);
    let value = to_decimal(coupon.discount_value).max(Decimal::ZERO);

    let (discount, waives_shipping) = match coupon.discount_type {
        DiscountType::Percentage => {
            let raw = base * value / Decimal::ONE_HUNDRED;
            let capped = match coupon.max_discount.map(to_decimal) {
                Some(cap) if cap > Decimal::ZERO => raw.min(cap),
                _ => raw,
            };
            (capped, false)
        }
        DiscountType::Fixed => (value, false),
        DiscountType::FreeShipping => (Decimal::ZERO, true),
    };

    let discount = round_money(discount.min(base));
    CouponApplication {
        coupon: coupon.clone(),
        discount_amount: to_f64(discount),
        discount_base: to_f64(base),
        waives_shipping,
        shipping_savings: if waives_shipping { shipping_fee } else { 0.0 },
    }
}
