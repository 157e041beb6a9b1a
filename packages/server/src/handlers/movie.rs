use std::str::FromStr;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use chrono::Utc;
use common::MovieKind;
use sea_orm::prelude::Expr;
use sea_orm::sea_query::{Func, LikeExpr, LockType, Query as SeaQuery};
use sea_orm::*;
use tracing::{info, instrument};

use super::rating::load_rating_items;
use crate::entity::{
    banner, bookmark, episode, episode_progress, genre, movie, movie_genre, notification, rating,
};
use crate::error::{AppError, ErrorBody};
use crate::extractors::auth::AuthUser;
use crate::extractors::json::{AppJson, AppQuery};
use crate::models::catalog::*;
use crate::models::shared::{Pagination, escape_like, page_offset, page_params};
use crate::notification::fanout;
use crate::state::AppState;
use crate::utils::slug::{slugify, unique_slug};

/// Ratings embedded in the movie detail response.
const DETAIL_RATINGS: u64 = 20;

#[utoipa::path(
    post,
    path = "/",
    tag = "Movies",
    operation_id = "createMovie",
    summary = "Add a movie",
    description = "Creates a movie and announces it to every user. Requires `movie:create` permission. The slug is derived from the title and made unique with a numeric suffix.",
    request_body = CreateMovieRequest,
    responses(
        (status = 201, description = "Movie created", body = MovieResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, payload), fields(title = %payload.title))]
pub async fn create_movie(
    auth_user: AuthUser,
    State(state): State<AppState>,
    AppJson(payload): AppJson<CreateMovieRequest>,
) -> Result<impl IntoResponse, AppError> {
    auth_user.require_permission("movie:create")?;
    validate_create_movie(&payload)?;

    let title = payload.title.trim().to_string();

    let txn = state.db.begin().await?;
    let genres = find_genres(&txn, &payload.genre_ids).await?;
    let slug = next_movie_slug(&txn, &title).await?;

    let now = Utc::now();
    let model = movie::ActiveModel {
        title: Set(title),
        slug: Set(slug),
        description: Set(payload.description),
        kind: Set(payload.kind),
        release_year: Set(payload.release_year),
        poster_url: Set(payload.poster_url),
        rating_avg: Set(0.0),
        rating_count: Set(0),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    }
    .insert(&txn)
    .await
    .map_err(|e| match e.sql_err() {
        Some(SqlErr::UniqueConstraintViolation(_)) => {
            AppError::Conflict("A movie with this slug was just created, retry".into())
        }
        _ => AppError::from(e),
    })?;

    link_genres(&txn, model.id, &genres).await?;
    txn.commit().await?;

    info!(movie_id = model.id, slug = %model.slug, "Movie created");

    fanout::dispatch(&state, &model).await;

    Ok((StatusCode::CREATED, Json(MovieResponse::new(model, genres))))
}

#[utoipa::path(
    get,
    path = "/",
    tag = "Movies",
    operation_id = "listMovies",
    summary = "List movies",
    description = "Paginated catalog with optional title search, genre and kind filters. Sorts by `created_at` (default), `rating_avg` or `title`.",
    params(MovieListQuery),
    responses(
        (status = 200, description = "Movies", body = MovieListResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
    ),
)]
#[instrument(skip(state, query))]
pub async fn list_movies(
    State(state): State<AppState>,
    AppQuery(query): AppQuery<MovieListQuery>,
) -> Result<Json<MovieListResponse>, AppError> {
    let (page, per_page) = page_params(query.page, query.per_page);

    let mut select = movie::Entity::find();

    if let Some(ref search) = query.search {
        let term = escape_like(search.trim());
        if !term.is_empty() {
            select = select.filter(
                Expr::expr(Func::lower(Expr::col(movie::Column::Title)))
                    .like(LikeExpr::new(format!("%{}%", term.to_lowercase())).escape('\\')),
            );
        }
    }

    if let Some(ref kind) = query.kind {
        let kind = MovieKind::from_str(kind).map_err(|e| AppError::Validation(e.to_string()))?;
        select = select.filter(movie::Column::Kind.eq(kind));
    }

    if let Some(ref slug) = query.genre {
        let genre_id = genre::Entity::find()
            .filter(genre::Column::Slug.eq(slug.trim()))
            .one(&state.db)
            .await?
            .map(|g| g.id);
        let Some(genre_id) = genre_id else {
            return Ok(Json(MovieListResponse {
                data: Vec::new(),
                pagination: Pagination::new(page, per_page, 0),
            }));
        };
        select = select.filter(
            movie::Column::Id.in_subquery(
                SeaQuery::select()
                    .column(movie_genre::Column::MovieId)
                    .from(movie_genre::Entity)
                    .and_where(movie_genre::Column::GenreId.eq(genre_id))
                    .to_owned(),
            ),
        );
    }

    let sort_order = if query.sort_order.as_deref() == Some("asc") {
        Order::Asc
    } else {
        Order::Desc
    };
    let sort_column = match query.sort_by.as_deref().unwrap_or("created_at") {
        "created_at" => movie::Column::CreatedAt,
        "rating_avg" => movie::Column::RatingAvg,
        "title" => movie::Column::Title,
        _ => {
            return Err(AppError::Validation(
                "sort_by: must be one of: created_at, rating_avg, title".into(),
            ));
        }
    };

    let total = select.clone().count(&state.db).await?;

    let data = select
        .order_by(sort_column, sort_order.clone())
        .order_by(movie::Column::Id, sort_order)
        .offset(Some(page_offset(page, per_page)))
        .limit(Some(per_page))
        .all(&state.db)
        .await?
        .into_iter()
        .map(Into::into)
        .collect();

    Ok(Json(MovieListResponse {
        data,
        pagination: Pagination::new(page, per_page, total),
    }))
}

#[utoipa::path(
    get,
    path = "/{id}",
    tag = "Movies",
    operation_id = "getMovie",
    summary = "Get a movie",
    description = "Returns the movie with its genres, episodes in season order and its most recent ratings.",
    params(("id" = i32, Path, description = "Movie ID")),
    responses(
        (status = 200, description = "Movie details", body = MovieDetailResponse),
        (status = 404, description = "Movie not found (NOT_FOUND)", body = ErrorBody),
    ),
)]
#[instrument(skip(state))]
pub async fn get_movie(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<MovieDetailResponse>, AppError> {
    let model = find_movie(&state.db, id).await?;
    let genres = movie_genres(&state.db, id).await?;

    let episodes = episode::Entity::find()
        .filter(episode::Column::MovieId.eq(id))
        .order_by_asc(episode::Column::Season)
        .order_by_asc(episode::Column::EpisodeNumber)
        .all(&state.db)
        .await?
        .into_iter()
        .map(Into::into)
        .collect();

    let (ratings, _) = load_rating_items(&state.db, id, false, 1, DETAIL_RATINGS).await?;

    Ok(Json(MovieDetailResponse {
        movie: MovieResponse::new(model, genres),
        episodes,
        ratings,
    }))
}

#[utoipa::path(
    patch,
    path = "/{id}",
    tag = "Movies",
    operation_id = "updateMovie",
    summary = "Edit a movie",
    description = "Updates movie metadata. Requires `movie:edit` permission. Editing never re-announces the movie and never changes its rating summary.",
    params(("id" = i32, Path, description = "Movie ID")),
    request_body = UpdateMovieRequest,
    responses(
        (status = 200, description = "Movie updated", body = MovieResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Movie not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, payload))]
pub async fn update_movie(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
    AppJson(payload): AppJson<UpdateMovieRequest>,
) -> Result<Json<MovieResponse>, AppError> {
    auth_user.require_permission("movie:edit")?;
    validate_update_movie(&payload)?;

    let txn = state.db.begin().await?;
    let existing = find_movie_for_update(&txn, id).await?;

    let mut active: movie::ActiveModel = existing.into();
    if let Some(title) = payload.title {
        active.title = Set(title.trim().to_string());
    }
    if let Some(description) = payload.description {
        active.description = Set(description);
    }
    if let Some(kind) = payload.kind {
        active.kind = Set(kind);
    }
    if let Some(release_year) = payload.release_year {
        active.release_year = Set(release_year);
    }
    if let Some(poster_url) = payload.poster_url {
        active.poster_url = Set(poster_url);
    }
    active.updated_at = Set(Utc::now());
    let model = active.update(&txn).await?;

    let genres = match payload.genre_ids {
        Some(ids) => {
            let genres = find_genres(&txn, &ids).await?;
            movie_genre::Entity::delete_many()
                .filter(movie_genre::Column::MovieId.eq(id))
                .exec(&txn)
                .await?;
            link_genres(&txn, id, &genres).await?;
            genres
        }
        None => movie_genres(&txn, id).await?,
    };

    txn.commit().await?;
    Ok(Json(MovieResponse::new(model, genres)))
}

#[utoipa::path(
    delete,
    path = "/{id}",
    tag = "Movies",
    operation_id = "deleteMovie",
    summary = "Delete a movie",
    description = "Deletes a movie together with its episodes, watch progress, ratings, bookmarks, banners and notifications. Requires `movie:delete` permission.",
    params(("id" = i32, Path, description = "Movie ID")),
    responses(
        (status = 204, description = "Movie deleted"),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Movie not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user))]
pub async fn delete_movie(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<StatusCode, AppError> {
    auth_user.require_permission("movie:delete")?;

    let txn = state.db.begin().await?;
    find_movie_for_update(&txn, id).await?;

    episode_progress::Entity::delete_many()
        .filter(
            episode_progress::Column::EpisodeId.in_subquery(
                SeaQuery::select()
                    .column(episode::Column::Id)
                    .from(episode::Entity)
                    .and_where(episode::Column::MovieId.eq(id))
                    .to_owned(),
            ),
        )
        .exec(&txn)
        .await?;
    episode::Entity::delete_many()
        .filter(episode::Column::MovieId.eq(id))
        .exec(&txn)
        .await?;
    rating::Entity::delete_many()
        .filter(rating::Column::MovieId.eq(id))
        .exec(&txn)
        .await?;
    bookmark::Entity::delete_many()
        .filter(bookmark::Column::MovieId.eq(id))
        .exec(&txn)
        .await?;
    notification::Entity::delete_many()
        .filter(notification::Column::MovieId.eq(id))
        .exec(&txn)
        .await?;
    banner::Entity::delete_many()
        .filter(banner::Column::MovieId.eq(id))
        .exec(&txn)
        .await?;
    movie_genre::Entity::delete_many()
        .filter(movie_genre::Column::MovieId.eq(id))
        .exec(&txn)
        .await?;
    movie::Entity::delete_by_id(id).exec(&txn).await?;

    txn.commit().await?;
    info!(movie_id = id, "Movie deleted");
    Ok(StatusCode::NO_CONTENT)
}

pub(crate) async fn find_movie<C: ConnectionTrait>(
    db: &C,
    id: i32,
) -> Result<movie::Model, AppError> {
    movie::Entity::find_by_id(id)
        .one(db)
        .await?
        .ok_or_else(|| AppError::NotFound("Movie not found".into()))
}

async fn find_movie_for_update(
    txn: &DatabaseTransaction,
    id: i32,
) -> Result<movie::Model, AppError> {
    movie::Entity::find_by_id(id)
        .lock(LockType::Update)
        .one(txn)
        .await?
        .ok_or_else(|| AppError::NotFound("Movie not found".into()))
}

/// First free slug for `title`: `dune`, then `dune-2`, `dune-3`, ...
async fn next_movie_slug<C: ConnectionTrait>(db: &C, title: &str) -> Result<String, AppError> {
    let mut base = slugify(title);
    if base.is_empty() {
        base = "movie".into();
    }

    let taken: Vec<String> = movie::Entity::find()
        .select_only()
        .column(movie::Column::Slug)
        .filter(
            Condition::any()
                .add(movie::Column::Slug.eq(base.as_str()))
                .add(
                    Expr::col(movie::Column::Slug)
                        .like(LikeExpr::new(format!("{}-%", escape_like(&base))).escape('\\')),
                ),
        )
        .into_tuple()
        .all(db)
        .await?;

    Ok(unique_slug(&base, &taken))
}

/// Load the genres with the given ids, rejecting unknown ids.
async fn find_genres<C: ConnectionTrait>(
    db: &C,
    ids: &[i32],
) -> Result<Vec<genre::Model>, AppError> {
    if ids.is_empty() {
        return Ok(Vec::new());
    }
    let genres = genre::Entity::find()
        .filter(genre::Column::Id.is_in(ids.iter().copied()))
        .order_by_asc(genre::Column::Name)
        .all(db)
        .await?;
    if let Some(missing) = ids.iter().find(|id| !genres.iter().any(|g| g.id == **id)) {
        return Err(AppError::Validation(format!(
            "genre_ids: genre {missing} does not exist"
        )));
    }
    Ok(genres)
}

async fn link_genres<C: ConnectionTrait>(
    db: &C,
    movie_id: i32,
    genres: &[genre::Model],
) -> Result<(), AppError> {
    if genres.is_empty() {
        return Ok(());
    }
    movie_genre::Entity::insert_many(genres.iter().map(|g| movie_genre::ActiveModel {
        movie_id: Set(movie_id),
        genre_id: Set(g.id),
    }))
    .exec_without_returning(db)
    .await?;
    Ok(())
}

async fn movie_genres<C: ConnectionTrait>(
    db: &C,
    movie_id: i32,
) -> Result<Vec<genre::Model>, AppError> {
    Ok(genre::Entity::find()
        .filter(
            genre::Column::Id.in_subquery(
                SeaQuery::select()
                    .column(movie_genre::Column::GenreId)
                    .from(movie_genre::Entity)
                    .and_where(movie_genre::Column::MovieId.eq(movie_id))
                    .to_owned(),
            ),
        )
        .order_by_asc(genre::Column::Name)
        .all(db)
        .await?)
}
