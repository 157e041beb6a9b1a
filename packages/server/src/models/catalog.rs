use chrono::{DateTime, NaiveDate, Utc};
use common::MovieKind;
use serde::{Deserialize, Serialize};

use super::rating::RatingListItem;
use super::shared::{Pagination, double_option, validate_optional_url, validate_title};
use crate::entity::{banner, episode, genre, movie};
use crate::error::AppError;

// ---------------------------------------------------------------------------
// Genres
// ---------------------------------------------------------------------------

#[derive(Deserialize, utoipa::ToSchema)]
pub struct CreateGenreRequest {
    #[schema(example = "Science Fiction")]
    pub name: String,
    /// Derived from `name` when absent.
    #[schema(example = "sci-fi")]
    pub slug: Option<String>,
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct GenreResponse {
    pub id: i32,
    #[schema(example = "Science Fiction")]
    pub name: String,
    #[schema(example = "science-fiction")]
    pub slug: String,
}

impl From<genre::Model> for GenreResponse {
    fn from(m: genre::Model) -> Self {
        Self {
            id: m.id,
            name: m.name,
            slug: m.slug,
        }
    }
}

pub fn validate_create_genre(req: &CreateGenreRequest) -> Result<(), AppError> {
    let name = req.name.trim();
    if name.is_empty() || name.chars().count() > 100 {
        return Err(AppError::Validation("name: must be 1-100 characters".into()));
    }
    if let Some(slug) = &req.slug
        && (slug.trim().is_empty() || slug.len() > 120)
    {
        return Err(AppError::Validation("slug: must be 1-120 characters".into()));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Movies
// ---------------------------------------------------------------------------

/// Request body for adding a movie. Rating fields are derived and not accepted.
#[derive(Deserialize, utoipa::ToSchema)]
pub struct CreateMovieRequest {
    #[schema(example = "Dune: Part Two")]
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub kind: MovieKind,
    #[schema(example = 2024)]
    pub release_year: Option<i32>,
    pub poster_url: Option<String>,
    #[serde(default)]
    pub genre_ids: Vec<i32>,
}

#[derive(Deserialize, Default, utoipa::ToSchema)]
pub struct UpdateMovieRequest {
    pub title: Option<String>,
    pub description: Option<String>,
    pub kind: Option<MovieKind>,
    #[serde(default, deserialize_with = "double_option")]
    #[schema(value_type = Option<i32>)]
    pub release_year: Option<Option<i32>>,
    #[serde(default, deserialize_with = "double_option")]
    #[schema(value_type = Option<String>)]
    pub poster_url: Option<Option<String>>,
    /// Replaces the genre set when present.
    pub genre_ids: Option<Vec<i32>>,
}

#[derive(Deserialize, utoipa::IntoParams)]
#[into_params(parameter_in = Query)]
pub struct MovieListQuery {
    pub page: Option<u64>,
    pub per_page: Option<u64>,
    /// Case-insensitive title search.
    pub search: Option<String>,
    /// Genre slug.
    pub genre: Option<String>,
    /// `movie` or `series`.
    pub kind: Option<String>,
    /// `created_at` (default), `rating_avg` or `title`.
    pub sort_by: Option<String>,
    /// `asc` or `desc` (default).
    pub sort_order: Option<String>,
}

/// Compact movie representation used in lists and nested objects.
#[derive(Serialize, utoipa::ToSchema)]
pub struct MovieSummary {
    pub id: i32,
    #[schema(example = "Dune: Part Two")]
    pub title: String,
    #[schema(example = "dune-part-two")]
    pub slug: String,
    pub kind: MovieKind,
    pub release_year: Option<i32>,
    pub poster_url: Option<String>,
    #[schema(example = 4.3)]
    pub rating_avg: f64,
    #[schema(example = 12)]
    pub rating_count: i32,
    pub created_at: DateTime<Utc>,
}

impl From<movie::Model> for MovieSummary {
    fn from(m: movie::Model) -> Self {
        Self {
            id: m.id,
            title: m.title,
            slug: m.slug,
            kind: m.kind,
            release_year: m.release_year,
            poster_url: m.poster_url,
            rating_avg: m.rating_avg,
            rating_count: m.rating_count,
            created_at: m.created_at,
        }
    }
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct MovieListResponse {
    pub data: Vec<MovieSummary>,
    pub pagination: Pagination,
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct MovieResponse {
    pub id: i32,
    pub title: String,
    pub slug: String,
    pub description: String,
    pub kind: MovieKind,
    pub release_year: Option<i32>,
    pub poster_url: Option<String>,
    pub rating_avg: f64,
    pub rating_count: i32,
    pub genres: Vec<GenreResponse>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl MovieResponse {
    pub fn new(m: movie::Model, genres: Vec<genre::Model>) -> Self {
        Self {
            id: m.id,
            title: m.title,
            slug: m.slug,
            description: m.description,
            kind: m.kind,
            release_year: m.release_year,
            poster_url: m.poster_url,
            rating_avg: m.rating_avg,
            rating_count: m.rating_count,
            genres: genres.into_iter().map(Into::into).collect(),
            created_at: m.created_at,
            updated_at: m.updated_at,
        }
    }
}

/// Full movie page: metadata, episodes and ratings.
#[derive(Serialize, utoipa::ToSchema)]
pub struct MovieDetailResponse {
    #[serde(flatten)]
    pub movie: MovieResponse,
    pub episodes: Vec<EpisodeResponse>,
    pub ratings: Vec<RatingListItem>,
}

fn validate_release_year(year: Option<i32>) -> Result<(), AppError> {
    if let Some(year) = year
        && !(1870..=2200).contains(&year)
    {
        return Err(AppError::Validation(
            "release_year: must be between 1870 and 2200".into(),
        ));
    }
    Ok(())
}

fn validate_description(description: &str) -> Result<(), AppError> {
    if description.len() > 100_000 {
        return Err(AppError::Validation(
            "description: must be at most 100000 bytes".into(),
        ));
    }
    Ok(())
}

pub fn validate_create_movie(req: &CreateMovieRequest) -> Result<(), AppError> {
    validate_title(&req.title)?;
    validate_description(&req.description)?;
    validate_release_year(req.release_year)?;
    validate_optional_url(req.poster_url.as_deref(), "poster_url")
}

pub fn validate_update_movie(req: &UpdateMovieRequest) -> Result<(), AppError> {
    if let Some(title) = &req.title {
        validate_title(title)?;
    }
    if let Some(description) = &req.description {
        validate_description(description)?;
    }
    if let Some(year) = req.release_year {
        validate_release_year(year)?;
    }
    if let Some(poster_url) = &req.poster_url {
        validate_optional_url(poster_url.as_deref(), "poster_url")?;
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Episodes
// ---------------------------------------------------------------------------

#[derive(Deserialize, utoipa::ToSchema)]
pub struct CreateEpisodeRequest {
    /// Defaults to 1.
    pub season: Option<i32>,
    #[schema(example = 1)]
    pub episode_number: i32,
    #[serde(default)]
    pub title: String,
    pub description: Option<String>,
    pub video_url: Option<String>,
    #[serde(default)]
    #[schema(example = "1080p")]
    pub quality: String,
    pub release_date: Option<NaiveDate>,
    #[schema(example = 2700)]
    pub duration_secs: Option<i32>,
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct EpisodeResponse {
    pub id: i32,
    pub movie_id: i32,
    pub season: i32,
    pub episode_number: i32,
    pub title: String,
    pub description: Option<String>,
    pub video_url: Option<String>,
    pub quality: String,
    pub release_date: Option<NaiveDate>,
    pub duration_secs: Option<i32>,
}

impl From<episode::Model> for EpisodeResponse {
    fn from(m: episode::Model) -> Self {
        Self {
            id: m.id,
            movie_id: m.movie_id,
            season: m.season,
            episode_number: m.episode_number,
            title: m.title,
            description: m.description,
            video_url: m.video_url,
            quality: m.quality,
            release_date: m.release_date,
            duration_secs: m.duration_secs,
        }
    }
}

pub fn validate_create_episode(req: &CreateEpisodeRequest) -> Result<(), AppError> {
    if req.season.is_some_and(|s| s < 1) {
        return Err(AppError::Validation("season: must be >= 1".into()));
    }
    if req.episode_number < 1 {
        return Err(AppError::Validation("episode_number: must be >= 1".into()));
    }
    if req.title.chars().count() > 255 {
        return Err(AppError::Validation(
            "title: must be at most 255 characters".into(),
        ));
    }
    if req.quality.chars().count() > 50 {
        return Err(AppError::Validation(
            "quality: must be at most 50 characters".into(),
        ));
    }
    if req.duration_secs.is_some_and(|d| d < 0) {
        return Err(AppError::Validation("duration_secs: must be >= 0".into()));
    }
    validate_optional_url(req.video_url.as_deref(), "video_url")
}

// ---------------------------------------------------------------------------
// Banners
// ---------------------------------------------------------------------------

#[derive(Deserialize, utoipa::ToSchema)]
pub struct CreateBannerRequest {
    pub movie_id: i32,
    pub photo_url: Option<String>,
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct BannerResponse {
    pub id: i32,
    pub photo_url: Option<String>,
    pub movie: Option<MovieSummary>,
}

impl BannerResponse {
    pub fn new(b: banner::Model, movie: Option<movie::Model>) -> Self {
        Self {
            id: b.id,
            photo_url: b.photo_url,
            movie: movie.map(Into::into),
        }
    }
}

pub fn validate_create_banner(req: &CreateBannerRequest) -> Result<(), AppError> {
    validate_optional_url(req.photo_url.as_deref(), "photo_url")
}
