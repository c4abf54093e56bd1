//! Notification feed handlers.

use axum::extract::{Path, Query, State};
use axum::Json;
use uuid::Uuid;

use crate::domain::events::{Notification, NotificationFilters};
use crate::error::Result;
use crate::http::{ok, ApiResponse, AuthUser, PaginatedResponse};
use crate::AppState;

pub async fn list(
    State(state): State<AppState>,
    user: AuthUser,
    Query(filters): Query<NotificationFilters>,
) -> Result<Json<ApiResponse<PaginatedResponse<Notification>>>> {
    let (data, total, page) = state.store.list_notifications(user.id, &filters).await?;
    Ok(ok(PaginatedResponse { data, total, page }))
}

pub async fn mark_read(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<Notification>>> {
    Ok(ok(state.store.mark_notification_read(user.id, id).await?))
}
