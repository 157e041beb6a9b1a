use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::catalog::MovieSummary;
use crate::error::AppError;

#[derive(Deserialize, utoipa::ToSchema)]
pub struct CreateBookmarkRequest {
    pub movie_id: i32,
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct BookmarkResponse {
    pub id: i32,
    pub movie: Option<MovieSummary>,
    pub created_at: DateTime<Utc>,
}

impl BookmarkResponse {
    pub fn new(
        b: crate::entity::bookmark::Model,
        movie: Option<crate::entity::movie::Model>,
    ) -> Self {
        Self {
            id: b.id,
            movie: movie.map(Into::into),
            created_at: b.created_at,
        }
    }
}

#[derive(Deserialize, utoipa::ToSchema)]
pub struct UpdateProgressRequest {
    #[schema(example = 42)]
    pub watched_minutes: i32,
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct ProgressResponse {
    pub episode_id: i32,
    pub watched_minutes: i32,
    pub updated_at: DateTime<Utc>,
}

impl From<crate::entity::episode_progress::Model> for ProgressResponse {
    fn from(m: crate::entity::episode_progress::Model) -> Self {
        Self {
            episode_id: m.episode_id,
            watched_minutes: m.watched_minutes,
            updated_at: m.updated_at,
        }
    }
}

pub fn validate_update_progress(req: &UpdateProgressRequest) -> Result<(), AppError> {
    if req.watched_minutes < 0 {
        return Err(AppError::Validation(
            "watched_minutes: must be >= 0".into(),
        ));
    }
    Ok(())
}
