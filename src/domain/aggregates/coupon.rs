//! Coupons: time-windowed, usage-capped discounts applied at checkout.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::error::Error;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DiscountType {
    #[sqlx(rename = "PERCENTAGE")]
    Percentage,
    #[sqlx(rename = "FIXED_AMOUNT")]
    FixedAmount,
}

#[derive(Clone, Debug, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Coupon {
    pub id: Uuid,
    pub code: String,
    pub description: Option<String>,
    pub discount_type: DiscountType,
    pub discount_value: Decimal,
    pub min_amount: Option<Decimal>,
    pub max_uses: Option<i32>,
    pub current_uses: i32,
    pub valid_from: DateTime<Utc>,
    pub valid_until: DateTime<Utc>,
    pub active: bool,
    pub created_at: DateTime<Utc>,
}

/// Codes are stored and matched uppercase.
pub fn normalize_code(code: &str) -> String {
    code.trim().to_uppercase()
}

impl Coupon {
    /// Inclusive on both ends: valid when `valid_from <= now <= valid_until`.
    pub fn is_within_window(&self, now: DateTime<Utc>) -> bool {
        self.valid_from <= now && now <= self.valid_until
    }

    /// Checks every redemption precondition against an order amount. An
    /// inactive or out-of-window coupon reads the same as a missing one.
    pub fn check_redeemable(&self, order_amount: Decimal, now: DateTime<Utc>) -> Result<(), Error> {
        if !self.active || !self.is_within_window(now) {
            return Err(Error::NotFound("coupon is not valid or has expired".into()));
        }
        if let Some(min) = self.min_amount {
            if order_amount < min {
                return Err(Error::Validation(format!(
                    "the minimum order amount for this coupon is {min}"
                )));
            }
        }
        if let Some(max) = self.max_uses {
            if self.current_uses >= max {
                return Err(Error::Conflict("coupon has reached its usage limit".into()));
            }
        }
        Ok(())
    }

    /// Discount for an order amount. A fixed discount is not clamped to the
    /// amount; applying one larger than the order drives the total negative.
    pub fn discount_for(&self, order_amount: Decimal) -> Decimal {
        match self.discount_type {
            DiscountType::Percentage => order_amount * self.discount_value / Decimal::from(100),
            DiscountType::FixedAmount => self.discount_value,
        }
    }
}

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CouponValidation {
    pub is_valid: bool,
    pub coupon: Coupon,
    pub discount_amount: Decimal,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateCouponRequest {
    #[validate(length(min = 1))]
    pub code: String,
    pub description: Option<String>,
    pub discount_type: DiscountType,
    pub discount_value: Decimal,
    pub min_amount: Option<Decimal>,
    #[validate(range(min = 1))]
    pub max_uses: Option<i32>,
    pub valid_from: DateTime<Utc>,
    pub valid_until: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidateCouponRequest {
    pub code: String,
    pub order_amount: Decimal,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApplyCouponRequest {
    pub code: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use rust_decimal_macros::dec;

    fn coupon(discount_type: DiscountType, value: Decimal) -> Coupon {
        let now = Utc::now();
        Coupon {
            id: Uuid::new_v4(),
            code: "SUMMER20".into(),
            description: None,
            discount_type,
            discount_value: value,
            min_amount: None,
            max_uses: None,
            current_uses: 0,
            valid_from: now - Duration::days(1),
            valid_until: now + Duration::days(1),
            active: true,
            created_at: now,
        }
    }

    #[test]
    fn test_normalize_code() {
        assert_eq!(normalize_code("  summer20 "), "SUMMER20");
    }

    #[test]
    fn test_percentage_discount() {
        let c = coupon(DiscountType::Percentage, dec!(20));
        assert_eq!(c.discount_for(dec!(220)), dec!(44));
    }

    #[test]
    fn test_fixed_discount_is_not_clamped() {
        let c = coupon(DiscountType::FixedAmount, dec!(300));
        assert_eq!(c.discount_for(dec!(220)), dec!(300));
    }

    #[test]
    fn test_redeemable_happy_path() {
        let c = coupon(DiscountType::Percentage, dec!(20));
        assert!(c.check_redeemable(dec!(220), Utc::now()).is_ok());
    }

    #[test]
    fn test_below_minimum_amount() {
        let mut c = coupon(DiscountType::Percentage, dec!(20));
        c.min_amount = Some(dec!(500));
        assert!(matches!(c.check_redeemable(dec!(220), Utc::now()), Err(Error::Validation(_))));
    }

    #[test]
    fn test_exhausted_coupon() {
        let mut c = coupon(DiscountType::Percentage, dec!(20));
        c.max_uses = Some(1);
        c.current_uses = 1;
        assert!(matches!(c.check_redeemable(dec!(220), Utc::now()), Err(Error::Conflict(_))));
    }

    #[test]
    fn test_out_of_window_reads_as_missing() {
        let c = coupon(DiscountType::Percentage, dec!(20));
        let late = c.valid_until + Duration::seconds(1);
        assert!(matches!(c.check_redeemable(dec!(220), late), Err(Error::NotFound(_))));
    }

    #[test]
    fn test_inactive_reads_as_missing() {
        let mut c = coupon(DiscountType::Percentage, dec!(20));
        c.active = false;
        assert!(matches!(c.check_redeemable(dec!(220), Utc::now()), Err(Error::NotFound(_))));
    }

    #[test]
    fn test_window_is_inclusive() {
        let c = coupon(DiscountType::Percentage, dec!(20));
        assert!(c.is_within_window(c.valid_from));
        assert!(c.is_within_window(c.valid_until));
    }
}
