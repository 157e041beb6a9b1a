use chrono::Utc;
use sea_orm::*;
use tracing::{info, instrument};

use super::aggregator;
use crate::entity::rating;
use crate::error::AppError;
use crate::models::rating::{
    SubmitRatingRequest, UpdateRatingRequest, validate_submit_rating, validate_update_rating,
};

/// Whether a comment counts as a review: non-empty after trimming whitespace.
pub fn has_comment(comment: Option<&str>) -> bool {
    comment.is_some_and(|c| !c.trim().is_empty())
}

/// Insert a rating and refresh the movie summary in one transaction.
///
/// A second rating for the same `(user, movie)` is rejected with `Conflict`
/// and leaves the existing row untouched.
#[instrument(skip(db, req), fields(movie_id = req.movie_id, score = req.score))]
pub async fn submit_rating(
    db: &DatabaseConnection,
    user_id: i32,
    req: SubmitRatingRequest,
) -> Result<rating::Model, AppError> {
    validate_submit_rating(&req)?;

    let txn = db.begin().await?;
    aggregator::lock_movie(&txn, req.movie_id).await?;

    let existing = rating::Entity::find()
        .filter(rating::Column::UserId.eq(user_id))
        .filter(rating::Column::MovieId.eq(req.movie_id))
        .one(&txn)
        .await?;
    if existing.is_some() {
        return Err(AppError::Conflict(
            "You have already rated this movie".into(),
        ));
    }

    let now = Utc::now();
    let flag = has_comment(req.comment.as_deref());
    let model = rating::ActiveModel {
        user_id: Set(user_id),
        movie_id: Set(req.movie_id),
        score: Set(req.score),
        comment: Set(req.comment),
        has_comment: Set(flag),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    }
    .insert(&txn)
    .await
    .map_err(|e| match e.sql_err() {
        Some(SqlErr::UniqueConstraintViolation(_)) => {
            AppError::Conflict("You have already rated this movie".into())
        }
        _ => AppError::from(e),
    })?;

    aggregator::recompute(&txn, model.movie_id).await?;
    txn.commit().await?;

    info!(rating_id = model.id, user_id, "Rating submitted");
    Ok(model)
}

/// Change score and/or comment of a rating owned by `user_id`.
#[instrument(skip(db, req))]
pub async fn update_rating(
    db: &DatabaseConnection,
    user_id: i32,
    rating_id: i32,
    req: UpdateRatingRequest,
) -> Result<rating::Model, AppError> {
    validate_update_rating(&req)?;

    let txn = db.begin().await?;
    let existing = find_owned_locked(&txn, user_id, rating_id).await?;

    let mut active: rating::ActiveModel = existing.into();
    if let Some(score) = req.score {
        active.score = Set(score);
    }
    if let Some(comment) = req.comment {
        active.has_comment = Set(has_comment(comment.as_deref()));
        active.comment = Set(comment);
    }
    active.updated_at = Set(Utc::now());
    let model = active.update(&txn).await.map_err(|e| match e {
        DbErr::RecordNotUpdated => AppError::NotFound("Rating not found".into()),
        e => AppError::from(e),
    })?;

    aggregator::recompute(&txn, model.movie_id).await?;
    txn.commit().await?;

    Ok(model)
}

/// Delete a rating owned by `user_id` and refresh the movie summary.
#[instrument(skip(db))]
pub async fn delete_rating(
    db: &DatabaseConnection,
    user_id: i32,
    rating_id: i32,
) -> Result<(), AppError> {
    let txn = db.begin().await?;
    let existing = find_owned_locked(&txn, user_id, rating_id).await?;
    let movie_id = existing.movie_id;

    let res = rating::Entity::delete_by_id(existing.id).exec(&txn).await?;
    if res.rows_affected == 0 {
        return Err(AppError::NotFound("Rating not found".into()));
    }

    aggregator::recompute(&txn, movie_id).await?;
    txn.commit().await?;

    info!(rating_id, movie_id, "Rating deleted");
    Ok(())
}

/// Lock the rated movie, then load the rating again under that lock.
///
/// The first read only tells us which movie to lock. A concurrent delete of
/// the same rating commits before our lock is granted, so the second read is
/// the one that decides `NotFound`.
async fn find_owned_locked<C: ConnectionTrait>(
    conn: &C,
    user_id: i32,
    rating_id: i32,
) -> Result<rating::Model, AppError> {
    let movie_id = find_owned(conn, user_id, rating_id).await?.movie_id;
    aggregator::lock_movie(conn, movie_id).await?;
    find_owned(conn, user_id, rating_id).await
}

/// Load a rating only if it belongs to `user_id`; anything else is `NotFound`.
async fn find_owned<C: ConnectionTrait>(
    conn: &C,
    user_id: i32,
    rating_id: i32,
) -> Result<rating::Model, AppError> {
    rating::Entity::find_by_id(rating_id)
        .filter(rating::Column::UserId.eq(user_id))
        .one(conn)
        .await?
        .ok_or_else(|| AppError::NotFound("Rating not found".into()))
}
