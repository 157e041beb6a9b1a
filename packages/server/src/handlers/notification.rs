use axum::extract::{Path, State};
use axum::Json;
use tracing::instrument;

use crate::error::{AppError, ErrorBody};
use crate::extractors::auth::AuthUser;
use crate::extractors::json::AppQuery;
use crate::models::notification::*;
use crate::models::shared::{Pagination, page_params};
use crate::notification::service;
use crate::state::AppState;

#[utoipa::path(
    get,
    path = "/",
    tag = "Notifications",
    operation_id = "listNotifications",
    summary = "List own notifications",
    description = "Returns the current user's notifications, newest first.",
    params(NotificationListQuery),
    responses(
        (status = 200, description = "Notifications", body = NotificationListResponse),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, query), fields(user_id = auth_user.user_id))]
pub async fn list_notifications(
    auth_user: AuthUser,
    State(state): State<AppState>,
    AppQuery(query): AppQuery<NotificationListQuery>,
) -> Result<Json<NotificationListResponse>, AppError> {
    let (page, per_page) = page_params(query.page, query.per_page);
    let (rows, total) = service::list(
        &state.db,
        auth_user.user_id,
        query.unread_only.unwrap_or(false),
        page,
        per_page,
    )
    .await?;

    Ok(Json(NotificationListResponse {
        data: rows
            .into_iter()
            .map(|(n, m)| NotificationResponse::from_parts(n, m))
            .collect(),
        pagination: Pagination::new(page, per_page, total),
    }))
}

#[utoipa::path(
    get,
    path = "/unread-count",
    tag = "Notifications",
    operation_id = "countUnreadNotifications",
    summary = "Count unread notifications",
    responses(
        (status = 200, description = "Unread count", body = UnreadCountResponse),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(user_id = auth_user.user_id))]
pub async fn unread_count(
    auth_user: AuthUser,
    State(state): State<AppState>,
) -> Result<Json<UnreadCountResponse>, AppError> {
    let unread = service::unread_count(&state.db, auth_user.user_id).await?;
    Ok(Json(UnreadCountResponse { unread }))
}

#[utoipa::path(
    post,
    path = "/{id}/read",
    tag = "Notifications",
    operation_id = "markNotificationRead",
    summary = "Mark a notification as read",
    description = "Idempotent. Notifications of other users are reported as not found.",
    params(("id" = i32, Path, description = "Notification ID")),
    responses(
        (status = 200, description = "Notification", body = NotificationResponse),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 404, description = "Notification not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(user_id = auth_user.user_id))]
pub async fn mark_read(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<NotificationResponse>, AppError> {
    let model = service::mark_read(&state.db, auth_user.user_id, id).await?;
    Ok(Json(NotificationResponse::from_parts(model, None)))
}

#[utoipa::path(
    post,
    path = "/read-all",
    tag = "Notifications",
    operation_id = "markAllNotificationsRead",
    summary = "Mark all notifications as read",
    description = "Returns how many notifications changed; a repeated call reports 0.",
    responses(
        (status = 200, description = "Number updated", body = MarkAllReadResponse),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(user_id = auth_user.user_id))]
pub async fn mark_all_read(
    auth_user: AuthUser,
    State(state): State<AppState>,
) -> Result<Json<MarkAllReadResponse>, AppError> {
    let updated = service::mark_all_read(&state.db, auth_user.user_id).await?;
    Ok(Json(MarkAllReadResponse { updated }))
}
