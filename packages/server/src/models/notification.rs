use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::shared::Pagination;

#[derive(Deserialize, utoipa::IntoParams)]
#[into_params(parameter_in = Query)]
pub struct NotificationListQuery {
    /// Only return unread notifications.
    pub unread_only: Option<bool>,
    pub page: Option<u64>,
    pub per_page: Option<u64>,
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct NotificationResponse {
    pub id: i32,
    #[schema(example = "New movie added: Dune")]
    pub message: String,
    pub movie_id: Option<i32>,
    /// Title of the referenced movie, if any.
    #[schema(example = "Dune")]
    pub movie_title: Option<String>,
    pub is_read: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct NotificationListResponse {
    pub data: Vec<NotificationResponse>,
    pub pagination: Pagination,
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct UnreadCountResponse {
    #[schema(example = 3)]
    pub unread: u64,
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct MarkAllReadResponse {
    /// Notifications flipped from unread to read by this call.
    #[schema(example = 3)]
    pub updated: u64,
}

impl NotificationResponse {
    pub fn from_parts(
        n: crate::entity::notification::Model,
        movie: Option<crate::entity::movie::Model>,
    ) -> Self {
        Self {
            id: n.id,
            message: n.message,
            movie_id: n.movie_id,
            movie_title: movie.map(|m| m.title),
            is_read: n.is_read,
            created_at: n.created_at,
        }
    }
}
