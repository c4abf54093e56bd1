//! PostgreSQL store. Soft-deleted catalog rows are filtered here, in one
//! place, rather than at each call site.

pub mod cart;
pub mod catalog;
pub mod coupon;
pub mod notifier;
pub mod order;
pub mod payment;

pub use notifier::Notifier;

use sqlx::PgPool;

#[derive(Clone)]
pub struct Store {
    db: PgPool,
}

impl Store {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    pub fn pool(&self) -> &PgPool {
        &self.db
    }
}

/// Clamped pagination: page >= 1, page size capped at 100, default 20.
/// Returns (page, limit, offset).
pub(crate) fn page_limits(page: Option<u32>, per_page: Option<u32>) -> (u32, i64, i64) {
    let page = page.unwrap_or(1).max(1);
    let per_page = per_page.unwrap_or(20).min(100);
    (page, i64::from(per_page), i64::from((page - 1) * per_page))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_limits_defaults() {
        assert_eq!(page_limits(None, None), (1, 20, 0));
    }

    #[test]
    fn test_page_limits_clamps() {
        assert_eq!(page_limits(Some(0), Some(500)), (1, 100, 0));
        assert_eq!(page_limits(Some(3), Some(10)), (3, 10, 20));
    }
}
