//! Category matching
//!
//! Storefront category names are free text ("Paint", "PAINTS", "Wall Paints"),
//! so a coupon category matches an item category when, after trimming and
//! case folding, either contains the other.

/// Normalized form used for comparisons
fn normalize(category: &str) -> String {
    category.trim().to_lowercase()
}

pub fn category_matches(coupon_category: &str, item_category: &str) -> bool {
    let a = normalize(coupon_category);
    let b = normalize(item_category);
    if a.is_empty() || b.is_empty() {
        return false;
    }
    a == b || a.contains(&b) || b.contains(&a)
}

/// Whether `item_category` matches any entry of `coupon_categories`
pub fn matches_any(coupon_categories: &[String], item_category: Option<&str>) -> bool {
    let Some(item_category) = item_category else {
        return false;
    };
    coupon_categories
        .iter()
        .any(|c| category_matches(c, item_category))
}
