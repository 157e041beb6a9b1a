use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Request to notify every user about a newly created movie.
///
/// Consumers may see the same job more than once; the fan-out skips users
/// that already hold a notification for the movie.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FanoutJob {
    pub job_id: String,
    pub movie_id: i32,
    pub requested_at: DateTime<Utc>,
}

impl FanoutJob {
    pub fn new(movie_id: i32) -> Self {
        Self {
            job_id: uuid::Uuid::new_v4().to_string(),
            movie_id,
            requested_at: Utc::now(),
        }
    }
}
