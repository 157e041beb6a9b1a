use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use sea_orm::*;
use tracing::{info, instrument};

use crate::entity::genre;
use crate::error::{AppError, ErrorBody};
use crate::extractors::auth::AuthUser;
use crate::extractors::json::AppJson;
use crate::models::catalog::{CreateGenreRequest, GenreResponse, validate_create_genre};
use crate::state::AppState;
use crate::utils::slug::slugify;

#[utoipa::path(
    get,
    path = "/",
    tag = "Genres",
    operation_id = "listGenres",
    summary = "List genres",
    description = "Returns all genres ordered by name.",
    responses((status = 200, description = "Genres", body = Vec<GenreResponse>)),
)]
#[instrument(skip(state))]
pub async fn list_genres(
    State(state): State<AppState>,
) -> Result<Json<Vec<GenreResponse>>, AppError> {
    let genres = genre::Entity::find()
        .order_by_asc(genre::Column::Name)
        .all(&state.db)
        .await?;
    Ok(Json(genres.into_iter().map(Into::into).collect()))
}

#[utoipa::path(
    post,
    path = "/",
    tag = "Genres",
    operation_id = "createGenre",
    summary = "Create a genre",
    description = "Requires `genre:manage` permission. The slug is derived from the name when omitted.",
    request_body = CreateGenreRequest,
    responses(
        (status = 201, description = "Genre created", body = GenreResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 409, description = "Name or slug taken (CONFLICT)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, payload), fields(name = %payload.name))]
pub async fn create_genre(
    auth_user: AuthUser,
    State(state): State<AppState>,
    AppJson(payload): AppJson<CreateGenreRequest>,
) -> Result<impl IntoResponse, AppError> {
    auth_user.require_permission("genre:manage")?;
    validate_create_genre(&payload)?;

    let name = payload.name.trim().to_string();
    let slug = slugify(payload.slug.as_deref().unwrap_or(&name));
    if slug.is_empty() {
        return Err(AppError::Validation(
            "slug: must contain letters or digits".into(),
        ));
    }

    let model = genre::ActiveModel {
        name: Set(name),
        slug: Set(slug),
        ..Default::default()
    }
    .insert(&state.db)
    .await
    .map_err(|e| match e.sql_err() {
        Some(SqlErr::UniqueConstraintViolation(_)) => {
            AppError::Conflict("Genre name or slug already exists".into())
        }
        _ => AppError::from(e),
    })?;

    info!(genre_id = model.id, slug = %model.slug, "Genre created");
    Ok((StatusCode::CREATED, Json(GenreResponse::from(model))))
}
