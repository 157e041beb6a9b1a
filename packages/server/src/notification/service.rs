use sea_orm::prelude::Expr;
use sea_orm::*;
use tracing::{info, instrument};

use crate::entity::{movie, notification};
use crate::error::AppError;
use crate::models::shared::page_offset;

/// Mark one of the user's notifications as read.
///
/// Notifications of other users are reported as `NotFound`. Marking an
/// already read notification succeeds without a write.
#[instrument(skip(db))]
pub async fn mark_read(
    db: &DatabaseConnection,
    user_id: i32,
    notification_id: i32,
) -> Result<notification::Model, AppError> {
    let existing = notification::Entity::find_by_id(notification_id)
        .filter(notification::Column::UserId.eq(user_id))
        .one(db)
        .await?
        .ok_or_else(|| AppError::NotFound("Notification not found".into()))?;

    if existing.is_read {
        return Ok(existing);
    }

    let mut active: notification::ActiveModel = existing.into();
    active.is_read = Set(true);
    Ok(active.update(db).await?)
}

/// Mark every unread notification of the user as read; returns how many changed.
#[instrument(skip(db))]
pub async fn mark_all_read(db: &DatabaseConnection, user_id: i32) -> Result<u64, AppError> {
    let result = notification::Entity::update_many()
        .col_expr(notification::Column::IsRead, Expr::value(true))
        .filter(notification::Column::UserId.eq(user_id))
        .filter(notification::Column::IsRead.eq(false))
        .exec(db)
        .await?;

    if result.rows_affected > 0 {
        info!(user_id, updated = result.rows_affected, "Notifications marked read");
    }
    Ok(result.rows_affected)
}

pub async fn unread_count(db: &DatabaseConnection, user_id: i32) -> Result<u64, AppError> {
    Ok(notification::Entity::find()
        .filter(notification::Column::UserId.eq(user_id))
        .filter(notification::Column::IsRead.eq(false))
        .count(db)
        .await?)
}

/// One page of the user's notifications, newest first, with the movie each refers to.
pub async fn list(
    db: &DatabaseConnection,
    user_id: i32,
    unread_only: bool,
    page: u64,
    per_page: u64,
) -> Result<(Vec<(notification::Model, Option<movie::Model>)>, u64), AppError> {
    let mut select = notification::Entity::find().filter(notification::Column::UserId.eq(user_id));
    if unread_only {
        select = select.filter(notification::Column::IsRead.eq(false));
    }

    let total = select.clone().count(db).await?;

    let rows = select
        .order_by_desc(notification::Column::CreatedAt)
        .order_by_desc(notification::Column::Id)
        .find_also_related(movie::Entity)
        .offset(Some(page_offset(page, per_page)))
        .limit(Some(per_page))
        .all(db)
        .await?;

    Ok((rows, total))
}
