//! Coupon persistence. Redemption is arbitrated by a conditional increment:
//! whoever bumps `current_uses` under the cap wins; everyone else gets a
//! conflict, regardless of interleaving.

use chrono::Utc;
use uuid::Uuid;

use super::Store;
use crate::domain::aggregates::coupon::{normalize_code, Coupon, CouponValidation, CreateCouponRequest};
use crate::domain::aggregates::order::Order;
use crate::error::{Error, Result};

impl Store {
    pub async fn create_coupon(&self, req: &CreateCouponRequest) -> Result<Coupon> {
        let code = normalize_code(&req.code);
        if req.valid_until < req.valid_from {
            return Err(Error::Validation("validUntil must not precede validFrom".into()));
        }
        let existing: Option<(Uuid,)> = sqlx::query_as("SELECT id FROM coupons WHERE code = $1")
            .bind(&code)
            .fetch_optional(&self.db)
            .await?;
        if existing.is_some() {
            return Err(Error::Conflict(format!("a coupon with code {code} already exists")));
        }

        let coupon = sqlx::query_as::<_, Coupon>(
            "INSERT INTO coupons \
                (id, code, description, discount_type, discount_value, min_amount, max_uses, \
                 current_uses, valid_from, valid_until, active) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, 0, $8, $9, TRUE) RETURNING *",
        )
        .bind(Uuid::now_v7())
        .bind(&code)
        .bind(&req.description)
        .bind(req.discount_type)
        .bind(req.discount_value)
        .bind(req.min_amount)
        .bind(req.max_uses)
        .bind(req.valid_from)
        .bind(req.valid_until)
        .fetch_one(&self.db)
        .await?;
        Ok(coupon)
    }

    pub async fn get_coupon(&self, code: &str) -> Result<Coupon> {
        let code = normalize_code(code);
        sqlx::query_as::<_, Coupon>("SELECT * FROM coupons WHERE code = $1")
            .bind(&code)
            .fetch_optional(&self.db)
            .await?
            .ok_or_else(|| Error::NotFound(format!("coupon {code} not found")))
    }

    pub async fn list_active_coupons(&self) -> Result<Vec<Coupon>> {
        let coupons = sqlx::query_as::<_, Coupon>(
            "SELECT * FROM coupons WHERE active = TRUE AND valid_until >= NOW() \
             ORDER BY valid_until ASC",
        )
        .fetch_all(&self.db)
        .await?;
        Ok(coupons)
    }

    pub async fn deactivate_coupon(&self, code: &str) -> Result<Coupon> {
        let code = normalize_code(code);
        sqlx::query_as::<_, Coupon>(
            "UPDATE coupons SET active = FALSE WHERE code = $1 RETURNING *",
        )
        .bind(&code)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| Error::NotFound(format!("coupon {code} not found")))
    }

    /// Read-only validation against a hypothetical order amount.
    pub async fn validate_coupon(&self, code: &str, order_amount: rust_decimal::Decimal) -> Result<CouponValidation> {
        let coupon = self.get_coupon(code).await.map_err(|e| match e {
            Error::NotFound(_) => Error::NotFound("coupon is not valid or has expired".into()),
            other => other,
        })?;
        coupon.check_redeemable(order_amount, Utc::now())?;
        let discount_amount = coupon.discount_for(order_amount);
        Ok(CouponValidation { is_valid: true, coupon, discount_amount })
    }

    /// Redeems a coupon against an order: re-validates against the order's
    /// current total, claims a use, and reduces the total, in one
    /// transaction. Concurrent redemptions settle on the conditional update.
    pub async fn apply_coupon(&self, order_id: Uuid, code: &str) -> Result<Order> {
        let code = normalize_code(code);
        let mut tx = self.db.begin().await?;

        let order = sqlx::query_as::<_, Order>("SELECT * FROM orders WHERE id = $1 FOR UPDATE")
            .bind(order_id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or_else(|| Error::NotFound(format!("order {order_id} not found")))?;

        let coupon = sqlx::query_as::<_, Coupon>("SELECT * FROM coupons WHERE code = $1")
            .bind(&code)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or_else(|| Error::NotFound("coupon is not valid or has expired".into()))?;

        coupon.check_redeemable(order.total_amount, Utc::now())?;
        let discount = coupon.discount_for(order.total_amount);

        let claimed = sqlx::query(
            "UPDATE coupons SET current_uses = current_uses + 1 \
             WHERE id = $1 AND active = TRUE \
               AND valid_from <= NOW() AND valid_until >= NOW() \
               AND (max_uses IS NULL OR current_uses < max_uses)",
        )
        .bind(coupon.id)
        .execute(&mut *tx)
        .await?;
        if claimed.rows_affected() == 0 {
            // Lost the race since the check above.
            return Err(Error::Conflict("coupon has reached its usage limit".into()));
        }

        let updated = sqlx::query_as::<_, Order>(
            "UPDATE orders SET total_amount = total_amount - $2, updated_at = NOW() \
             WHERE id = $1 RETURNING *",
        )
        .bind(order_id)
        .bind(discount)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(updated)
    }
}
