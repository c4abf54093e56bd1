//! HTTP surface: JSON envelope, pagination, the trusted identity context,
//! and the router.

pub mod cart;
pub mod coupons;
pub mod notifications;
pub mod orders;
pub mod packages;
pub mod payments;
pub mod products;

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use axum::routing::{delete, get, post, put};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::Error;
use crate::AppState;

/// Success envelope; errors render `{ok: false, error}` through
/// [`Error::into_response`].
#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub ok: bool,
    pub data: T,
}

pub fn ok<T>(data: T) -> Json<ApiResponse<T>> {
    Json(ApiResponse { ok: true, data })
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListParams {
    pub page: Option<u32>,
    pub per_page: Option<u32>,
}

#[derive(Debug, Serialize)]
pub struct PaginatedResponse<T> {
    pub data: Vec<T>,
    pub total: i64,
    pub page: u32,
}

/// Caller role as asserted by the upstream identity gateway.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
    Client,
    SalesAgent,
    Admin,
}

/// Authenticated caller. Identity terminates upstream; this service trusts
/// the forwarded headers and enforces ownership and role checks itself.
#[derive(Clone, Copy, Debug)]
pub struct AuthUser {
    pub id: Uuid,
    pub role: Role,
}

impl AuthUser {
    pub fn is_staff(&self) -> bool {
        matches!(self.role, Role::Admin | Role::SalesAgent)
    }

    pub fn require_staff(&self) -> Result<(), Error> {
        if self.is_staff() {
            Ok(())
        } else {
            Err(Error::Forbidden("insufficient role for this operation".into()))
        }
    }

    pub fn require_admin(&self) -> Result<(), Error> {
        if self.role == Role::Admin {
            Ok(())
        } else {
            Err(Error::Forbidden("insufficient role for this operation".into()))
        }
    }
}

#[axum::async_trait]
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = Error;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let id = parts
            .headers
            .get("x-user-id")
            .and_then(|v| v.to_str().ok())
            .and_then(|v| Uuid::parse_str(v).ok())
            .ok_or_else(|| Error::Forbidden("missing or invalid identity context".into()))?;
        let role = match parts.headers.get("x-user-role").and_then(|v| v.to_str().ok()) {
            Some("CLIENT") => Role::Client,
            Some("SALES_AGENT") => Role::SalesAgent,
            Some("ADMIN") => Role::Admin,
            _ => return Err(Error::Forbidden("missing or invalid identity context".into())),
        };
        Ok(AuthUser { id, role })
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/api/v1/products", get(products::list).post(products::create))
        .route(
            "/api/v1/products/:id",
            get(products::get_by_id).put(products::update).delete(products::remove),
        )
        .route("/api/v1/packages", get(packages::list).post(packages::create))
        .route(
            "/api/v1/packages/:id",
            get(packages::get_by_id).put(packages::update).delete(packages::remove),
        )
        .route("/api/v1/packages/:id/items", post(packages::add_item))
        .route("/api/v1/packages/:id/items/:product_id", delete(packages::remove_item))
        .route("/api/v1/cart", get(cart::list).post(cart::add).delete(cart::clear))
        .route("/api/v1/cart/summary", get(cart::summary))
        .route("/api/v1/cart/:item_id", put(cart::update_quantity).delete(cart::remove))
        .route("/api/v1/coupons", get(coupons::list_active).post(coupons::create))
        .route("/api/v1/coupons/validate", post(coupons::validate))
        .route("/api/v1/coupons/:code", get(coupons::get_by_code).delete(coupons::deactivate))
        .route("/api/v1/orders", get(orders::list_mine).post(orders::create))
        .route("/api/v1/orders/all", get(orders::list_all))
        .route("/api/v1/orders/number/:order_number", get(orders::get_by_number))
        .route("/api/v1/orders/:id", get(orders::get_by_id))
        .route("/api/v1/orders/:id/status", put(orders::update_status))
        .route("/api/v1/orders/:id/cancel", post(orders::cancel))
        .route("/api/v1/orders/:id/coupon", post(orders::apply_coupon))
        .route("/api/v1/payments", get(payments::list_all).post(payments::process))
        .route("/api/v1/payments/:id", get(payments::get_status))
        .route("/api/v1/payments/:id/cancel", post(payments::cancel))
        .route("/api/v1/payments/:id/refund", post(payments::refund))
        .route("/api/v1/notifications", get(notifications::list))
        .route("/api/v1/notifications/:id/read", put(notifications::mark_read))
        .with_state(state)
}

async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({"status": "healthy", "service": "terravia-commerce"}))
}
