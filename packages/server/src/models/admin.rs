use std::collections::HashMap;

use serde::Serialize;

use super::catalog::MovieSummary;

/// Site-wide totals for the admin dashboard.
#[derive(Serialize, utoipa::ToSchema)]
pub struct DashboardTotals {
    pub users: u64,
    pub premium_users: u64,
    pub active_users: u64,
    pub movies: u64,
    /// Movies created during the last 30 days.
    pub recent_movies: u64,
    pub episodes: u64,
    pub genres: u64,
    pub ratings: u64,
    /// Ratings carrying review text.
    pub reviews: u64,
    pub bookmarks: u64,
}

/// A genre with the number of movies filed under it.
#[derive(Debug, PartialEq, Serialize, utoipa::ToSchema)]
pub struct GenreStat {
    pub id: i32,
    pub name: String,
    pub slug: String,
    pub movie_count: i64,
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct DashboardResponse {
    pub totals: DashboardTotals,
    /// Mean of every score on the site, one decimal. `0.0` without ratings.
    #[schema(example = 3.8)]
    pub average_score: f64,
    /// Most rated movies, highest `rating_count` first.
    pub top_movies: Vec<MovieSummary>,
    /// Genres with the most movies.
    pub top_genres: Vec<GenreStat>,
}

/// Attach movie counts to `(id, name, slug)` genre rows and keep the `limit` largest.
///
/// Genres without movies count as zero. Ties are broken by name.
pub fn rank_genres(
    genres: Vec<(i32, String, String)>,
    counts: &[(i32, i64)],
    limit: usize,
) -> Vec<GenreStat> {
    let counts: HashMap<i32, i64> = counts.iter().copied().collect();
    let mut stats: Vec<GenreStat> = genres
        .into_iter()
        .map(|(id, name, slug)| GenreStat {
            movie_count: counts.get(&id).copied().unwrap_or(0),
            id,
            name,
            slug,
        })
        .collect();
    stats.sort_by(|a, b| {
        b.movie_count
            .cmp(&a.movie_count)
            .then_with(|| a.name.cmp(&b.name))
    });
    stats.truncate(limit);
    stats
}
