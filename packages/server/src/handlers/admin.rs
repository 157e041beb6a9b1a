use axum::extract::{Path, State};
use axum::Json;
use chrono::{Duration, Utc};
use sea_orm::*;
use tracing::{info, instrument};

use crate::entity::{bookmark, episode, genre, movie, movie_genre, rating, user};
use crate::error::{AppError, ErrorBody};
use crate::extractors::auth::AuthUser;
use crate::models::admin::{DashboardResponse, DashboardTotals, rank_genres};
use crate::notification::fanout::{self, FanoutReport};
use crate::rating::aggregator::{self, RecomputeAllReport};
use crate::state::AppState;

const TOP_MOVIES: u64 = 5;
const TOP_GENRES: usize = 10;
const RECENT_DAYS: i64 = 30;

#[utoipa::path(
    get,
    path = "/dashboard",
    tag = "Admin",
    operation_id = "getDashboard",
    summary = "Site statistics",
    description = "Site totals, movies added in the last 30 days, the average score, the most rated movies and the genres with the most movies. Requires `dashboard:view` permission.",
    responses(
        (status = 200, description = "Dashboard", body = DashboardResponse),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user))]
pub async fn dashboard(
    auth_user: AuthUser,
    State(state): State<AppState>,
) -> Result<Json<DashboardResponse>, AppError> {
    auth_user.require_permission("dashboard:view")?;
    let db = &state.db;

    let totals = DashboardTotals {
        users: user::Entity::find().count(db).await?,
        premium_users: user::Entity::find()
            .filter(user::Column::IsPremium.eq(true))
            .count(db)
            .await?,
        active_users: user::Entity::find()
            .filter(user::Column::IsActive.eq(true))
            .count(db)
            .await?,
        movies: movie::Entity::find().count(db).await?,
        recent_movies: movie::Entity::find()
            .filter(movie::Column::CreatedAt.gte(Utc::now() - Duration::days(RECENT_DAYS)))
            .count(db)
            .await?,
        episodes: episode::Entity::find().count(db).await?,
        genres: genre::Entity::find().count(db).await?,
        ratings: rating::Entity::find().count(db).await?,
        reviews: rating::Entity::find()
            .filter(rating::Column::HasComment.eq(true))
            .count(db)
            .await?,
        bookmarks: bookmark::Entity::find().count(db).await?,
    };

    let average_score = aggregator::site_summary(db).await?.average;

    let top_movies = movie::Entity::find()
        .filter(movie::Column::RatingCount.gt(0))
        .order_by_desc(movie::Column::RatingCount)
        .order_by_desc(movie::Column::RatingAvg)
        .order_by_asc(movie::Column::Id)
        .limit(TOP_MOVIES)
        .all(db)
        .await?
        .into_iter()
        .map(Into::into)
        .collect();

    let genres: Vec<(i32, String, String)> = genre::Entity::find()
        .select_only()
        .column(genre::Column::Id)
        .column(genre::Column::Name)
        .column(genre::Column::Slug)
        .into_tuple()
        .all(db)
        .await?;
    let counts: Vec<(i32, i64)> = movie_genre::Entity::find()
        .select_only()
        .column(movie_genre::Column::GenreId)
        .column_as(movie_genre::Column::MovieId.count(), "movie_count")
        .group_by(movie_genre::Column::GenreId)
        .into_tuple()
        .all(db)
        .await?;
    let top_genres = rank_genres(genres, &counts, TOP_GENRES);

    Ok(Json(DashboardResponse {
        totals,
        average_score,
        top_movies,
        top_genres,
    }))
}

#[utoipa::path(
    post,
    path = "/ratings/recompute",
    tag = "Admin",
    operation_id = "recomputeRatings",
    summary = "Recompute all rating summaries",
    description = "Rebuilds `rating_avg` and `rating_count` of every movie from its ratings. Requires `rating:recompute` permission.",
    responses(
        (status = 200, description = "Recompute report", body = RecomputeAllReport),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(user_id = auth_user.user_id))]
pub async fn recompute_ratings(
    auth_user: AuthUser,
    State(state): State<AppState>,
) -> Result<Json<RecomputeAllReport>, AppError> {
    auth_user.require_permission("rating:recompute")?;
    let report = aggregator::recompute_all(&state.db).await?;
    Ok(Json(report))
}

#[utoipa::path(
    post,
    path = "/movies/{id}/fanout",
    tag = "Admin",
    operation_id = "rerunFanout",
    summary = "Re-announce a movie",
    description = "Runs the new-movie notification again; only users still missing it get one. Requires `notification:fanout` permission.",
    params(("id" = i32, Path, description = "Movie ID")),
    responses(
        (status = 200, description = "Fan-out report", body = FanoutReport),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Movie not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(user_id = auth_user.user_id))]
pub async fn rerun_fanout(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<FanoutReport>, AppError> {
    auth_user.require_permission("notification:fanout")?;
    let report = fanout::rerun(&state.db, id, &state.config.fanout).await?;
    info!(movie_id = id, created = report.created, "Fan-out rerun finished");
    Ok(Json(report))
}
