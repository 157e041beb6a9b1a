use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use sea_orm::*;
use tracing::instrument;

use super::movie::find_movie;
use crate::entity::{rating, user};
use crate::error::{AppError, ErrorBody};
use crate::extractors::auth::AuthUser;
use crate::extractors::json::{AppJson, AppQuery};
use crate::models::rating::*;
use crate::models::shared::{Pagination, page_offset, page_params};
use crate::rating::service;
use crate::state::AppState;

#[utoipa::path(
    post,
    path = "/",
    tag = "Ratings",
    operation_id = "submitRating",
    summary = "Rate a movie",
    description = "Stores the current user's score (1-5) and optional review for a movie and refreshes the movie's rating summary. A user can rate a movie once; use PATCH to change it.",
    request_body = SubmitRatingRequest,
    responses(
        (status = 201, description = "Rating stored", body = RatingResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 404, description = "Movie not found (NOT_FOUND)", body = ErrorBody),
        (status = 409, description = "Movie already rated by this user (CONFLICT)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, payload), fields(user_id = auth_user.user_id))]
pub async fn submit_rating(
    auth_user: AuthUser,
    State(state): State<AppState>,
    AppJson(payload): AppJson<SubmitRatingRequest>,
) -> Result<impl IntoResponse, AppError> {
    let model = service::submit_rating(&state.db, auth_user.user_id, payload).await?;
    Ok((StatusCode::CREATED, Json(RatingResponse::from(model))))
}

#[utoipa::path(
    patch,
    path = "/{id}",
    tag = "Ratings",
    operation_id = "updateRating",
    summary = "Change a rating",
    description = "Changes the score and/or review of one of the current user's ratings. `comment: null` removes the review.",
    params(("id" = i32, Path, description = "Rating ID")),
    request_body = UpdateRatingRequest,
    responses(
        (status = 200, description = "Rating updated", body = RatingResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 404, description = "No such rating of this user (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, payload), fields(user_id = auth_user.user_id))]
pub async fn update_rating(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
    AppJson(payload): AppJson<UpdateRatingRequest>,
) -> Result<Json<RatingResponse>, AppError> {
    let model = service::update_rating(&state.db, auth_user.user_id, id, payload).await?;
    Ok(Json(model.into()))
}

#[utoipa::path(
    delete,
    path = "/{id}",
    tag = "Ratings",
    operation_id = "deleteRating",
    summary = "Delete a rating",
    description = "Deletes one of the current user's ratings and refreshes the movie's rating summary.",
    params(("id" = i32, Path, description = "Rating ID")),
    responses(
        (status = 204, description = "Rating deleted"),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 404, description = "No such rating of this user (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(user_id = auth_user.user_id))]
pub async fn delete_rating(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<StatusCode, AppError> {
    service::delete_rating(&state.db, auth_user.user_id, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    get,
    path = "/{id}/ratings",
    tag = "Ratings",
    operation_id = "listMovieRatings",
    summary = "List ratings of a movie",
    description = "Paginated ratings of a movie, newest first.",
    params(("id" = i32, Path, description = "Movie ID"), RatingListQuery),
    responses(
        (status = 200, description = "Ratings", body = RatingListResponse),
        (status = 404, description = "Movie not found (NOT_FOUND)", body = ErrorBody),
    ),
)]
#[instrument(skip(state, query))]
pub async fn list_movie_ratings(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    AppQuery(query): AppQuery<RatingListQuery>,
) -> Result<Json<RatingListResponse>, AppError> {
    list_page(&state.db, id, false, query).await.map(Json)
}

#[utoipa::path(
    get,
    path = "/{id}/reviews",
    tag = "Ratings",
    operation_id = "listMovieReviews",
    summary = "List reviews of a movie",
    description = "Paginated ratings of a movie that carry review text, newest first.",
    params(("id" = i32, Path, description = "Movie ID"), RatingListQuery),
    responses(
        (status = 200, description = "Reviews", body = RatingListResponse),
        (status = 404, description = "Movie not found (NOT_FOUND)", body = ErrorBody),
    ),
)]
#[instrument(skip(state, query))]
pub async fn list_movie_reviews(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    AppQuery(query): AppQuery<RatingListQuery>,
) -> Result<Json<RatingListResponse>, AppError> {
    list_page(&state.db, id, true, query).await.map(Json)
}

async fn list_page(
    db: &DatabaseConnection,
    movie_id: i32,
    reviews_only: bool,
    query: RatingListQuery,
) -> Result<RatingListResponse, AppError> {
    find_movie(db, movie_id).await?;
    let (page, per_page) = page_params(query.page, query.per_page);
    let (data, total) = load_rating_items(db, movie_id, reviews_only, page, per_page).await?;
    Ok(RatingListResponse {
        data,
        pagination: Pagination::new(page, per_page, total),
    })
}

/// One page of a movie's ratings with the author's username, newest first.
pub(crate) async fn load_rating_items(
    db: &DatabaseConnection,
    movie_id: i32,
    reviews_only: bool,
    page: u64,
    per_page: u64,
) -> Result<(Vec<RatingListItem>, u64), AppError> {
    let mut select = rating::Entity::find().filter(rating::Column::MovieId.eq(movie_id));
    if reviews_only {
        select = select.filter(rating::Column::HasComment.eq(true));
    }

    let total = select.clone().count(db).await?;

    let rows = select
        .order_by_desc(rating::Column::CreatedAt)
        .order_by_desc(rating::Column::Id)
        .find_also_related(user::Entity)
        .offset(Some(page_offset(page, per_page)))
        .limit(Some(per_page))
        .all(db)
        .await?;

    let items = rows
        .into_iter()
        .map(|(r, u)| RatingListItem {
            id: r.id,
            user_id: r.user_id,
            username: u.map(|u| u.username).unwrap_or_default(),
            score: r.score,
            comment: r.comment,
            has_comment: r.has_comment,
            created_at: r.created_at,
        })
        .collect();

    Ok((items, total))
}
