use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::shared::{Pagination, double_option};
use crate::error::AppError;

/// Maximum length of review text, in characters.
pub const MAX_COMMENT_CHARS: usize = 10_000;

/// Request body for rating a movie.
#[derive(Deserialize, utoipa::ToSchema)]
pub struct SubmitRatingRequest {
    #[schema(example = 7)]
    pub movie_id: i32,
    /// Score from 1 to 5.
    #[schema(example = 4)]
    pub score: i32,
    /// Optional review text.
    #[schema(example = "Slow start, great ending.")]
    pub comment: Option<String>,
}

/// Request body for changing one's own rating.
#[derive(Deserialize, Default, utoipa::ToSchema)]
pub struct UpdateRatingRequest {
    #[schema(example = 5)]
    pub score: Option<i32>,
    /// Absent keeps the comment, `null` removes it.
    #[serde(default, deserialize_with = "double_option")]
    #[schema(value_type = Option<String>)]
    pub comment: Option<Option<String>>,
}

#[derive(Deserialize, utoipa::IntoParams)]
#[into_params(parameter_in = Query)]
pub struct RatingListQuery {
    pub page: Option<u64>,
    pub per_page: Option<u64>,
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct RatingResponse {
    pub id: i32,
    pub user_id: i32,
    pub movie_id: i32,
    pub score: i32,
    pub comment: Option<String>,
    pub has_comment: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<crate::entity::rating::Model> for RatingResponse {
    fn from(m: crate::entity::rating::Model) -> Self {
        Self {
            id: m.id,
            user_id: m.user_id,
            movie_id: m.movie_id,
            score: m.score,
            comment: m.comment,
            has_comment: m.has_comment,
            created_at: m.created_at,
            updated_at: m.updated_at,
        }
    }
}

/// A rating as shown on a movie page.
#[derive(Serialize, utoipa::ToSchema)]
pub struct RatingListItem {
    pub id: i32,
    pub user_id: i32,
    #[schema(example = "alice")]
    pub username: String,
    pub score: i32,
    pub comment: Option<String>,
    pub has_comment: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct RatingListResponse {
    pub data: Vec<RatingListItem>,
    pub pagination: Pagination,
}

pub fn validate_score(score: i32) -> Result<(), AppError> {
    if !(1..=5).contains(&score) {
        return Err(AppError::Validation(
            "score: must be between 1 and 5".into(),
        ));
    }
    Ok(())
}

fn validate_comment(comment: Option<&str>) -> Result<(), AppError> {
    if let Some(comment) = comment
        && comment.chars().count() > MAX_COMMENT_CHARS
    {
        return Err(AppError::Validation(format!(
            "comment: must be at most {MAX_COMMENT_CHARS} characters"
        )));
    }
    Ok(())
}

pub fn validate_submit_rating(req: &SubmitRatingRequest) -> Result<(), AppError> {
    validate_score(req.score)?;
    validate_comment(req.comment.as_deref())
}

pub fn validate_update_rating(req: &UpdateRatingRequest) -> Result<(), AppError> {
    if let Some(score) = req.score {
        validate_score(score)?;
    }
    if let Some(comment) = &req.comment {
        validate_comment(comment.as_deref())?;
    }
    Ok(())
}
