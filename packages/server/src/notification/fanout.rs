use std::collections::HashSet;

use chrono::Utc;
use common::FanoutConfig;
use common::FanoutJob;
use common::mq::publish_job;
use common::retry::calculate_backoff;
use futures::stream::{self, StreamExt};
use sea_orm::sea_query::OnConflict;
use sea_orm::*;
use serde::Serialize;
use thiserror::Error;
use tracing::{error, info, instrument, warn};

use crate::entity::{movie, notification, user};
use crate::error::AppError;
use crate::state::AppState;

#[derive(Debug, Error)]
pub enum FanoutError {
    #[error("Movie {0} not found")]
    MovieNotFound(i32),

    #[error(transparent)]
    Db(#[from] DbErr),
}

impl From<FanoutError> for AppError {
    fn from(err: FanoutError) -> Self {
        match err {
            FanoutError::MovieNotFound(_) => AppError::NotFound("Movie not found".into()),
            FanoutError::Db(e) => AppError::from(e),
        }
    }
}

/// Outcome of one fan-out run over all users.
#[derive(Debug, Clone, PartialEq, Serialize, utoipa::ToSchema)]
pub struct FanoutReport {
    pub movie_id: i32,
    /// Users that existed when the run started.
    pub total_users: u64,
    /// Users skipped because they already had a notification for the movie.
    pub already_notified: u64,
    /// Notifications inserted by this run.
    pub created: u64,
    /// Users whose batch kept failing after all retries.
    pub failed_user_ids: Vec<i32>,
}

impl FanoutReport {
    pub fn is_complete(&self) -> bool {
        self.failed_user_ids.is_empty()
    }
}

/// Announcement text for a new movie.
pub fn announcement(title: &str) -> String {
    format!("New movie added: {title}")
}

/// Split users lacking a notification into insert batches of at most `batch_size`.
pub fn plan_batches(
    user_ids: &[i32],
    notified: &HashSet<i32>,
    batch_size: usize,
) -> Vec<Vec<i32>> {
    let pending: Vec<i32> = user_ids
        .iter()
        .copied()
        .filter(|id| !notified.contains(id))
        .collect();
    pending
        .chunks(batch_size.max(1))
        .map(<[i32]>::to_vec)
        .collect()
}

/// Create the announcement of `movie` for every user that does not have it yet.
///
/// Safe to run any number of times: rows already present are skipped, so a
/// rerun only fills the gaps of an earlier partial run.
#[instrument(skip(db, movie, config), fields(movie_id = movie.id))]
pub async fn run(
    db: &DatabaseConnection,
    movie: &movie::Model,
    config: &FanoutConfig,
) -> Result<FanoutReport, FanoutError> {
    let user_ids: Vec<i32> = user::Entity::find()
        .select_only()
        .column(user::Column::Id)
        .order_by_asc(user::Column::Id)
        .into_tuple()
        .all(db)
        .await?;

    let notified: HashSet<i32> = notification::Entity::find()
        .select_only()
        .column(notification::Column::UserId)
        .filter(notification::Column::MovieId.eq(movie.id))
        .into_tuple::<i32>()
        .all(db)
        .await?
        .into_iter()
        .collect();

    let batches = plan_batches(&user_ids, &notified, config.batch_size);
    let message = announcement(&movie.title);

    let results = stream::iter(batches.into_iter().map(|batch| {
        let message = message.as_str();
        async move {
            let outcome = insert_batch_with_retry(db, movie.id, message, &batch, config).await;
            (batch, outcome)
        }
    }))
    .buffer_unordered(config.max_concurrency.max(1))
    .collect::<Vec<_>>()
    .await;

    let mut report = FanoutReport {
        movie_id: movie.id,
        total_users: user_ids.len() as u64,
        already_notified: user_ids.iter().filter(|id| notified.contains(id)).count() as u64,
        created: 0,
        failed_user_ids: Vec::new(),
    };

    for (batch, outcome) in results {
        match outcome {
            Ok(inserted) => report.created += inserted,
            Err(e) => {
                error!(
                    movie_id = movie.id,
                    user_ids = ?batch,
                    error = %e,
                    "Notification batch failed, users missed"
                );
                report.failed_user_ids.extend(batch);
            }
        }
    }
    report.failed_user_ids.sort_unstable();

    if report.is_complete() {
        info!(
            total_users = report.total_users,
            already_notified = report.already_notified,
            created = report.created,
            "Notification fan-out complete"
        );
    } else {
        warn!(
            created = report.created,
            missed = report.failed_user_ids.len(),
            "Notification fan-out partially failed"
        );
    }

    Ok(report)
}

/// Run the fan-out again for an existing movie.
pub async fn rerun(
    db: &DatabaseConnection,
    movie_id: i32,
    config: &FanoutConfig,
) -> Result<FanoutReport, FanoutError> {
    let movie = movie::Entity::find_by_id(movie_id)
        .one(db)
        .await?
        .ok_or(FanoutError::MovieNotFound(movie_id))?;
    run(db, &movie, config).await
}

/// Announce a freshly committed movie.
///
/// Queues a [`FanoutJob`] when the message queue is enabled and otherwise
/// runs the fan-out inline. Failures are logged and never surface to the
/// caller; the movie already exists at this point.
pub async fn dispatch(state: &AppState, movie: &movie::Model) {
    if let Some(mq) = &state.mq {
        let job = FanoutJob::new(movie.id);
        match publish_job(mq, &state.config.mq.fanout_queue_name, &job).await {
            Ok(()) => {
                info!(job_id = %job.job_id, movie_id = movie.id, "Fan-out job enqueued");
                return;
            }
            Err(e) => {
                warn!(movie_id = movie.id, error = %e, "Failed to enqueue fan-out job, running inline");
            }
        }
    }

    if let Err(e) = run(&state.db, movie, &state.config.fanout).await {
        error!(movie_id = movie.id, error = %e, "Notification fan-out failed");
    }
}

async fn insert_batch_with_retry(
    db: &DatabaseConnection,
    movie_id: i32,
    message: &str,
    user_ids: &[i32],
    config: &FanoutConfig,
) -> Result<u64, DbErr> {
    let mut attempt = 0;
    loop {
        match insert_batch(db, movie_id, message, user_ids).await {
            Ok(inserted) => return Ok(inserted),
            Err(e) if attempt < config.max_batch_retries => {
                attempt += 1;
                let delay = calculate_backoff(attempt, config.retry_base_ms, config.retry_max_ms);
                warn!(
                    movie_id,
                    attempt,
                    delay_ms = delay.as_millis() as u64,
                    error = %e,
                    "Notification batch failed, retrying"
                );
                tokio::time::sleep(delay).await;
            }
            Err(e) => return Err(e),
        }
    }
}

/// Insert one batch; rows that already exist are left alone.
async fn insert_batch(
    db: &DatabaseConnection,
    movie_id: i32,
    message: &str,
    user_ids: &[i32],
) -> Result<u64, DbErr> {
    let now = Utc::now();
    let rows = user_ids.iter().map(|&user_id| notification::ActiveModel {
        user_id: Set(user_id),
        movie_id: Set(Some(movie_id)),
        message: Set(message.to_string()),
        is_read: Set(false),
        created_at: Set(now),
        ..Default::default()
    });

    let result = notification::Entity::insert_many(rows)
        .on_conflict(
            OnConflict::columns([notification::Column::UserId, notification::Column::MovieId])
                .do_nothing()
                .to_owned(),
        )
        .exec_without_returning(db)
        .await;

    match result {
        Ok(inserted) => Ok(inserted),
        Err(DbErr::RecordNotInserted) => Ok(0),
        Err(e) => Err(e),
    }
}
