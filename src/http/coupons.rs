//! Coupon handlers. Validation is open to any authenticated caller; the
//! admin surface manages the coupon lifecycle.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use validator::Validate;

use crate::domain::aggregates::coupon::{
    Coupon, CouponValidation, CreateCouponRequest, ValidateCouponRequest,
};
use crate::error::Result;
use crate::http::{ok, ApiResponse, AuthUser};
use crate::AppState;

pub async fn create(
    State(state): State<AppState>,
    user: AuthUser,
    Json(req): Json<CreateCouponRequest>,
) -> Result<(StatusCode, Json<ApiResponse<Coupon>>)> {
    user.require_admin()?;
    req.validate()?;
    let coupon = state.store.create_coupon(&req).await?;
    Ok((StatusCode::CREATED, ok(coupon)))
}

pub async fn list_active(
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<Json<ApiResponse<Vec<Coupon>>>> {
    user.require_staff()?;
    Ok(ok(state.store.list_active_coupons().await?))
}

pub async fn get_by_code(
    State(state): State<AppState>,
    user: AuthUser,
    Path(code): Path<String>,
) -> Result<Json<ApiResponse<Coupon>>> {
    user.require_staff()?;
    Ok(ok(state.store.get_coupon(&code).await?))
}

pub async fn deactivate(
    State(state): State<AppState>,
    user: AuthUser,
    Path(code): Path<String>,
) -> Result<Json<ApiResponse<Coupon>>> {
    user.require_admin()?;
    Ok(ok(state.store.deactivate_coupon(&code).await?))
}

pub async fn validate(
    State(state): State<AppState>,
    _user: AuthUser,
    Json(req): Json<ValidateCouponRequest>,
) -> Result<Json<ApiResponse<CouponValidation>>> {
    let validation = state.store.validate_coupon(&req.code, req.order_amount).await?;
    Ok(ok(validation))
}
