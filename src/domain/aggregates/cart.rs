//! Cart lines and the pure summary/validation logic behind checkout.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::domain::value_objects::{Money, MIXED_CURRENCY};
use crate::error::Error;

/// Reference to the single catalog entity a cart or order line points at.
/// The two sides are mutually exclusive by construction.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LineRef {
    Product(Uuid),
    Package(Uuid),
}

impl LineRef {
    /// Builds the reference from the two optional ids of a request body,
    /// rejecting both-set and neither-set.
    pub fn from_ids(product_id: Option<Uuid>, package_id: Option<Uuid>) -> Result<Self, Error> {
        match (product_id, package_id) {
            (Some(id), None) => Ok(Self::Product(id)),
            (None, Some(id)) => Ok(Self::Package(id)),
            (Some(_), Some(_)) => Err(Error::Validation(
                "a line cannot reference a product and a package at the same time".into(),
            )),
            (None, None) => Err(Error::Validation("a product or package reference is required".into())),
        }
    }

    pub fn product_id(&self) -> Option<Uuid> {
        match self { Self::Product(id) => Some(*id), Self::Package(_) => None }
    }

    pub fn package_id(&self) -> Option<Uuid> {
        match self { Self::Package(id) => Some(*id), Self::Product(_) => None }
    }
}

/// A cart line joined with the catalog entity it references. `unit_price` is
/// the product's base price or the package's total price; `available` is
/// false once the entity is unavailable or soft-deleted.
#[derive(Clone, Debug, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct CartLine {
    pub id: Uuid,
    pub user_id: Uuid,
    pub product_id: Option<Uuid>,
    pub package_id: Option<Uuid>,
    pub quantity: i32,
    pub name: String,
    pub unit_price: Decimal,
    pub currency: String,
    pub available: bool,
    pub created_at: DateTime<Utc>,
}

impl CartLine {
    pub fn line_total(&self) -> Decimal {
        self.unit_price * Decimal::from(self.quantity)
    }
}

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CartSummary {
    pub items: Vec<CartLine>,
    pub total_items: i64,
    pub total_amount: Decimal,
    pub currency: String,
    pub is_empty: bool,
}

/// Totals a set of cart lines. Lines spanning currencies report the `MIXED`
/// sentinel, as does an empty cart.
pub fn summarize(items: Vec<CartLine>) -> CartSummary {
    let mut total_items: i64 = 0;
    let mut total: Option<Money> = None;
    for line in &items {
        total_items += i64::from(line.quantity);
        match &mut total {
            Some(money) => money.accumulate(line.line_total(), &line.currency),
            None => total = Some(Money::new(line.line_total(), &line.currency)),
        }
    }
    let (total_amount, currency) = match total {
        Some(money) => (money.amount(), money.currency().to_string()),
        None => (Decimal::ZERO, MIXED_CURRENCY.to_string()),
    };
    CartSummary { is_empty: items.is_empty(), items, total_items, total_amount, currency }
}

/// Checkout guard: the cart must be non-empty and every referenced catalog
/// entity still available at this instant.
pub fn validate_for_checkout(items: &[CartLine]) -> Result<(), Error> {
    if items.is_empty() {
        return Err(Error::Validation("cart is empty".into()));
    }
    let unavailable: Vec<&str> =
        items.iter().filter(|l| !l.available).map(|l| l.name.as_str()).collect();
    if !unavailable.is_empty() {
        return Err(Error::Conflict(format!(
            "the following items are no longer available: {}",
            unavailable.join(", ")
        )));
    }
    Ok(())
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct AddToCartRequest {
    pub product_id: Option<Uuid>,
    pub package_id: Option<Uuid>,
    #[validate(range(min = 1))]
    pub quantity: Option<i32>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateCartItemRequest {
    pub quantity: i32,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn line(name: &str, unit_price: Decimal, currency: &str, quantity: i32, available: bool) -> CartLine {
        CartLine {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            product_id: Some(Uuid::new_v4()),
            package_id: None,
            quantity,
            name: name.into(),
            unit_price,
            currency: currency.into(),
            available,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_line_ref_xor() {
        let id = Uuid::new_v4();
        assert_eq!(LineRef::from_ids(Some(id), None).unwrap(), LineRef::Product(id));
        assert_eq!(LineRef::from_ids(None, Some(id)).unwrap(), LineRef::Package(id));
        assert!(LineRef::from_ids(Some(id), Some(id)).is_err());
        assert!(LineRef::from_ids(None, None).is_err());
    }

    #[test]
    fn test_summary_totals() {
        // Product at 50 x2 plus a package at 120 x1.
        let summary = summarize(vec![
            line("Flight MAD-EZE", dec!(50), "USD", 2, true),
            line("Patagonia Week", dec!(120), "USD", 1, true),
        ]);
        assert_eq!(summary.total_items, 3);
        assert_eq!(summary.total_amount, dec!(220));
        assert_eq!(summary.currency, "USD");
        assert!(!summary.is_empty);
    }

    #[test]
    fn test_summary_mixed_currencies() {
        let summary = summarize(vec![
            line("Hotel Centro", dec!(80), "USD", 1, true),
            line("City Tour", dec!(30), "EUR", 1, true),
        ]);
        assert_eq!(summary.total_amount, dec!(110));
        assert_eq!(summary.currency, MIXED_CURRENCY);
    }

    #[test]
    fn test_summary_empty_cart() {
        let summary = summarize(vec![]);
        assert!(summary.is_empty);
        assert_eq!(summary.total_items, 0);
        assert_eq!(summary.total_amount, Decimal::ZERO);
        assert_eq!(summary.currency, MIXED_CURRENCY);
    }

    #[test]
    fn test_validate_rejects_empty_cart() {
        assert!(matches!(validate_for_checkout(&[]), Err(Error::Validation(_))));
    }

    #[test]
    fn test_validate_lists_unavailable_names() {
        let items = vec![
            line("Flight MAD-EZE", dec!(50), "USD", 1, true),
            line("Ski Pass", dec!(90), "USD", 1, false),
        ];
        match validate_for_checkout(&items) {
            Err(Error::Conflict(msg)) => assert!(msg.contains("Ski Pass")),
            other => panic!("expected conflict, got {other:?}"),
        }
    }
}
