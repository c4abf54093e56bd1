//! Cart persistence. The add-or-increment path is a single upsert against
//! the partial unique indexes, so concurrent adds of the same line cannot
//! produce duplicate rows.

use uuid::Uuid;

use super::Store;
use crate::domain::aggregates::cart::{CartLine, LineRef};
use crate::error::{Error, Result};

fn line_query(filter: &str) -> String {
    format!(
        "SELECT ci.id, ci.user_id, ci.product_id, ci.package_id, ci.quantity, ci.created_at, \
                COALESCE(p.name, pk.name) AS name, \
                COALESCE(p.base_price, pk.total_price) AS unit_price, \
                COALESCE(p.currency, pk.currency) AS currency, \
                COALESCE(p.available AND p.deleted_at IS NULL, \
                         pk.available AND pk.deleted_at IS NULL, FALSE) AS available \
         FROM cart_items ci \
         LEFT JOIN products p ON p.id = ci.product_id \
         LEFT JOIN packages pk ON pk.id = ci.package_id \
         {filter}"
    )
}

impl Store {
    pub async fn cart_lines(&self, user_id: Uuid) -> Result<Vec<CartLine>> {
        let lines = sqlx::query_as::<_, CartLine>(&line_query("WHERE ci.user_id = $1 ORDER BY ci.created_at DESC"))
            .bind(user_id)
            .fetch_all(&self.db)
            .await?;
        Ok(lines)
    }

    async fn cart_line(&self, id: Uuid) -> Result<CartLine> {
        sqlx::query_as::<_, CartLine>(&line_query("WHERE ci.id = $1"))
            .bind(id)
            .fetch_optional(&self.db)
            .await?
            .ok_or_else(|| Error::NotFound("cart item not found".into()))
    }

    /// Adds a line or bumps the quantity of the existing one, atomically.
    pub async fn add_cart_item(&self, user_id: Uuid, line: LineRef, quantity: i32) -> Result<CartLine> {
        if quantity < 1 {
            return Err(Error::Validation("quantity must be at least 1".into()));
        }

        match line {
            LineRef::Product(id) => {
                let available: Option<bool> = sqlx::query_scalar(
                    "SELECT available FROM products WHERE id = $1 AND deleted_at IS NULL",
                )
                .bind(id)
                .fetch_optional(&self.db)
                .await?;
                if available != Some(true) {
                    return Err(Error::NotFound("product not found or unavailable".into()));
                }
            }
            LineRef::Package(id) => {
                let available: Option<bool> = sqlx::query_scalar(
                    "SELECT available FROM packages WHERE id = $1 AND deleted_at IS NULL",
                )
                .bind(id)
                .fetch_optional(&self.db)
                .await?;
                if available != Some(true) {
                    return Err(Error::NotFound("package not found or unavailable".into()));
                }
            }
        }

        let (id,): (Uuid,) = match line {
            LineRef::Product(product_id) => {
                sqlx::query_as(
                    "INSERT INTO cart_items (id, user_id, product_id, quantity) \
                     VALUES ($1, $2, $3, $4) \
                     ON CONFLICT (user_id, product_id) WHERE product_id IS NOT NULL \
                     DO UPDATE SET quantity = cart_items.quantity + EXCLUDED.quantity, \
                                   updated_at = NOW() \
                     RETURNING id",
                )
                .bind(Uuid::now_v7())
                .bind(user_id)
                .bind(product_id)
                .bind(quantity)
                .fetch_one(&self.db)
                .await?
            }
            LineRef::Package(package_id) => {
                sqlx::query_as(
                    "INSERT INTO cart_items (id, user_id, package_id, quantity) \
                     VALUES ($1, $2, $3, $4) \
                     ON CONFLICT (user_id, package_id) WHERE package_id IS NOT NULL \
                     DO UPDATE SET quantity = cart_items.quantity + EXCLUDED.quantity, \
                                   updated_at = NOW() \
                     RETURNING id",
                )
                .bind(Uuid::now_v7())
                .bind(user_id)
                .bind(package_id)
                .bind(quantity)
                .fetch_one(&self.db)
                .await?
            }
        };

        self.cart_line(id).await
    }

    /// Sets a line's quantity; zero or less deletes the line and returns
    /// `None`. Lines belonging to other users read as missing.
    pub async fn update_cart_quantity(
        &self,
        user_id: Uuid,
        item_id: Uuid,
        quantity: i32,
    ) -> Result<Option<CartLine>> {
        if quantity <= 0 {
            let result = sqlx::query("DELETE FROM cart_items WHERE id = $1 AND user_id = $2")
                .bind(item_id)
                .bind(user_id)
                .execute(&self.db)
                .await?;
            if result.rows_affected() == 0 {
                return Err(Error::NotFound("cart item not found".into()));
            }
            return Ok(None);
        }

        let updated: Option<(Uuid,)> = sqlx::query_as(
            "UPDATE cart_items SET quantity = $3, updated_at = NOW() \
             WHERE id = $1 AND user_id = $2 RETURNING id",
        )
        .bind(item_id)
        .bind(user_id)
        .bind(quantity)
        .fetch_optional(&self.db)
        .await?;
        match updated {
            Some((id,)) => Ok(Some(self.cart_line(id).await?)),
            None => Err(Error::NotFound("cart item not found".into())),
        }
    }

    /// Idempotent removal.
    pub async fn remove_cart_item(&self, user_id: Uuid, item_id: Uuid) -> Result<()> {
        sqlx::query("DELETE FROM cart_items WHERE id = $1 AND user_id = $2")
            .bind(item_id)
            .bind(user_id)
            .execute(&self.db)
            .await?;
        Ok(())
    }

    pub async fn clear_cart(&self, user_id: Uuid) -> Result<()> {
        sqlx::query("DELETE FROM cart_items WHERE user_id = $1")
            .bind(user_id)
            .execute(&self.db)
            .await?;
        Ok(())
    }
}
