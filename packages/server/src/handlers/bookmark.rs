use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use chrono::Utc;
use sea_orm::*;
use tracing::instrument;

use super::movie::find_movie;
use crate::entity::{bookmark, movie};
use crate::error::{AppError, ErrorBody};
use crate::extractors::auth::AuthUser;
use crate::extractors::json::AppJson;
use crate::models::bookmark::{BookmarkResponse, CreateBookmarkRequest};
use crate::state::AppState;

#[utoipa::path(
    get,
    path = "/",
    tag = "Bookmarks",
    operation_id = "listBookmarks",
    summary = "List own bookmarks",
    description = "Returns the current user's bookmarks, newest first, with movie summaries.",
    responses(
        (status = 200, description = "Bookmarks", body = Vec<BookmarkResponse>),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(user_id = auth_user.user_id))]
pub async fn list_bookmarks(
    auth_user: AuthUser,
    State(state): State<AppState>,
) -> Result<Json<Vec<BookmarkResponse>>, AppError> {
    let rows = bookmark::Entity::find()
        .filter(bookmark::Column::UserId.eq(auth_user.user_id))
        .order_by_desc(bookmark::Column::CreatedAt)
        .order_by_desc(bookmark::Column::Id)
        .find_also_related(movie::Entity)
        .all(&state.db)
        .await?;

    Ok(Json(
        rows.into_iter()
            .map(|(b, m)| BookmarkResponse::new(b, m))
            .collect(),
    ))
}

#[utoipa::path(
    post,
    path = "/",
    tag = "Bookmarks",
    operation_id = "createBookmark",
    summary = "Bookmark a movie",
    request_body = CreateBookmarkRequest,
    responses(
        (status = 201, description = "Bookmark created", body = BookmarkResponse),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 404, description = "Movie not found (NOT_FOUND)", body = ErrorBody),
        (status = 409, description = "Already bookmarked (CONFLICT)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, payload), fields(user_id = auth_user.user_id, movie_id = payload.movie_id))]
pub async fn create_bookmark(
    auth_user: AuthUser,
    State(state): State<AppState>,
    AppJson(payload): AppJson<CreateBookmarkRequest>,
) -> Result<impl IntoResponse, AppError> {
    let movie = find_movie(&state.db, payload.movie_id).await?;

    let model = bookmark::ActiveModel {
        user_id: Set(auth_user.user_id),
        movie_id: Set(movie.id),
        created_at: Set(Utc::now()),
        ..Default::default()
    }
    .insert(&state.db)
    .await
    .map_err(|e| match e.sql_err() {
        Some(SqlErr::UniqueConstraintViolation(_)) => {
            AppError::Conflict("Movie is already bookmarked".into())
        }
        _ => AppError::from(e),
    })?;

    Ok((
        StatusCode::CREATED,
        Json(BookmarkResponse::new(model, Some(movie))),
    ))
}

#[utoipa::path(
    delete,
    path = "/{id}",
    tag = "Bookmarks",
    operation_id = "deleteBookmark",
    summary = "Remove a bookmark",
    params(("id" = i32, Path, description = "Bookmark ID")),
    responses(
        (status = 204, description = "Bookmark removed"),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 404, description = "No such bookmark of this user (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(user_id = auth_user.user_id))]
pub async fn delete_bookmark(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<StatusCode, AppError> {
    let result = bookmark::Entity::delete_many()
        .filter(bookmark::Column::Id.eq(id))
        .filter(bookmark::Column::UserId.eq(auth_user.user_id))
        .exec(&state.db)
        .await?;
    if result.rows_affected == 0 {
        return Err(AppError::NotFound("Bookmark not found".into()));
    }
    Ok(StatusCode::NO_CONTENT)
}
