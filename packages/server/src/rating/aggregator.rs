use sea_orm::sea_query::LockType;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, DbErr, EntityTrait,
    QueryFilter, QueryOrder, QuerySelect, Select, Set, TransactionTrait,
};
use serde::Serialize;
use tracing::{debug, info, instrument, warn};

use crate::entity::{movie, rating};
use crate::error::AppError;

/// Derived `(average, count)` of the ratings of one movie.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, utoipa::ToSchema)]
pub struct RatingSummary {
    /// Mean score rounded half-up to one decimal.
    #[schema(example = 4.5)]
    pub average: f64,
    #[schema(example = 12)]
    pub count: i32,
}

impl RatingSummary {
    pub const EMPTY: Self = Self {
        average: 0.0,
        count: 0,
    };

    /// Summary of `count` scores adding up to `sum`.
    ///
    /// Rounds the exact rational mean half-up to tenths using integer
    /// arithmetic: `floor((20 * sum + count) / (2 * count))`.
    pub fn from_totals(count: i64, sum: i64) -> Self {
        if count <= 0 {
            return Self::EMPTY;
        }
        let tenths = (20 * sum + count).div_euclid(2 * count);
        Self {
            average: tenths as f64 / 10.0,
            count: count as i32,
        }
    }

    fn matches(&self, average: f64, count: i32) -> bool {
        count == self.count && average == self.average
    }
}

/// Outcome of a recompute.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Recomputed {
    pub summary: RatingSummary,
    /// Whether the stored values differed and were rewritten.
    pub changed: bool,
}

/// Lock a movie row for the rest of the transaction.
///
/// Rating writers take this lock before touching `rating`, so writes and
/// recomputes for one movie are serialized while other movies proceed.
pub async fn lock_movie<C: ConnectionTrait>(
    conn: &C,
    movie_id: i32,
) -> Result<movie::Model, AppError> {
    movie::Entity::find_by_id(movie_id)
        .lock(LockType::Update)
        .one(conn)
        .await?
        .ok_or_else(|| AppError::NotFound("Movie not found".into()))
}

/// Recompute the summary of `movie_id` from its rating rows and store it if it changed.
///
/// Call on the transaction of the triggering rating write. Errors must abort
/// that transaction.
#[instrument(skip(conn))]
pub async fn recompute<C: ConnectionTrait>(
    conn: &C,
    movie_id: i32,
) -> Result<Recomputed, AppError> {
    let movie = lock_movie(conn, movie_id).await?;
    let summary = load_summary(conn, movie_id).await?;

    if summary.matches(movie.rating_avg, movie.rating_count) {
        debug!(average = summary.average, count = summary.count, "Rating summary unchanged");
        return Ok(Recomputed {
            summary,
            changed: false,
        });
    }

    let previous = (movie.rating_avg, movie.rating_count);
    let mut active: movie::ActiveModel = movie.into();
    active.rating_avg = Set(summary.average);
    active.rating_count = Set(summary.count);
    active.update(conn).await?;

    info!(
        old_average = previous.0,
        old_count = previous.1,
        average = summary.average,
        count = summary.count,
        "Rating summary updated"
    );

    Ok(Recomputed {
        summary,
        changed: true,
    })
}

/// Count and total of the scores of one movie, aggregated in the database.
async fn load_summary<C: ConnectionTrait>(
    conn: &C,
    movie_id: i32,
) -> Result<RatingSummary, DbErr> {
    summarize(
        conn,
        rating::Entity::find().filter(rating::Column::MovieId.eq(movie_id)),
    )
    .await
}

/// Average over every rating on the site, rounded like a movie summary.
pub async fn site_summary<C: ConnectionTrait>(conn: &C) -> Result<RatingSummary, DbErr> {
    summarize(conn, rating::Entity::find()).await
}

async fn summarize<C: ConnectionTrait>(
    conn: &C,
    select: Select<rating::Entity>,
) -> Result<RatingSummary, DbErr> {
    let totals: Option<(i64, Option<i64>)> = select
        .select_only()
        .column_as(rating::Column::Id.count(), "count")
        .column_as(rating::Column::Score.sum(), "sum")
        .into_tuple()
        .one(conn)
        .await?;

    let (count, sum) = totals.unwrap_or((0, None));
    Ok(RatingSummary::from_totals(count, sum.unwrap_or(0)))
}

/// Result of [`recompute_all`].
#[derive(Debug, Clone, Default, Serialize, utoipa::ToSchema)]
pub struct RecomputeAllReport {
    /// Movies examined.
    pub movies: u64,
    /// Movies whose stored summary was stale and got rewritten.
    pub updated: u64,
}

/// Recompute every movie, each in its own transaction.
pub async fn recompute_all(db: &DatabaseConnection) -> Result<RecomputeAllReport, AppError> {
    let movie_ids: Vec<i32> = movie::Entity::find()
        .select_only()
        .column(movie::Column::Id)
        .order_by_asc(movie::Column::Id)
        .into_tuple()
        .all(db)
        .await?;

    let mut report = RecomputeAllReport::default();

    for movie_id in movie_ids {
        let txn = db.begin().await?;
        match recompute(&txn, movie_id).await {
            Ok(outcome) => {
                txn.commit().await?;
                report.movies += 1;
                if outcome.changed {
                    report.updated += 1;
                }
            }
            Err(AppError::NotFound(_)) => {
                warn!(movie_id, "Movie deleted during recompute, skipping");
            }
            Err(e) => return Err(e),
        }
    }

    info!(
        movies = report.movies,
        updated = report.updated,
        "Recomputed all rating summaries"
    );

    Ok(report)
}
