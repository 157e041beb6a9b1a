use std::sync::Arc;

use common::FanoutConfig;
use common::FanoutJob;
use common::mq::{BroccoliError, BrokerMessage, Mq};
use sea_orm::DatabaseConnection;
use tracing::{error, info, warn};

use crate::notification::fanout::{self, FanoutError};

/// Consume fan-out jobs published on movie creation.
///
/// A job whose run misses users is failed back to the queue so it gets
/// redelivered; the rerun only inserts the missing rows.
pub async fn consume_fanout_jobs(
    db: DatabaseConnection,
    mq: Arc<Mq>,
    queue_name: String,
    config: FanoutConfig,
    concurrency: usize,
) {
    info!(queue = %queue_name, concurrency, "Starting fan-out consumer");

    let result = mq
        .process_messages(
            &queue_name,
            Some(concurrency.max(1)),
            None,
            move |message: BrokerMessage<FanoutJob>| {
                let db = db.clone();
                let config = config.clone();
                async move {
                    let job = message.payload;

                    match fanout::rerun(&db, job.movie_id, &config).await {
                        Ok(report) if report.is_complete() => Ok(()),
                        Ok(report) => {
                            warn!(
                                job_id = %job.job_id,
                                movie_id = job.movie_id,
                                missed = report.failed_user_ids.len(),
                                "Fan-out job incomplete, requeueing"
                            );
                            Err(BroccoliError::Job(format!(
                                "{} users not notified",
                                report.failed_user_ids.len()
                            )))
                        }
                        Err(FanoutError::MovieNotFound(movie_id)) => {
                            warn!(job_id = %job.job_id, movie_id, "Movie gone before fan-out, dropping job");
                            Ok(())
                        }
                        Err(e) => {
                            error!(
                                job_id = %job.job_id,
                                movie_id = job.movie_id,
                                error = %e,
                                "Fan-out job failed"
                            );
                            Err(BroccoliError::Job(e.to_string()))
                        }
                    }
                }
            },
        )
        .await;

    if let Err(e) = result {
        error!(error = %e, "Fan-out consumer stopped unexpectedly");
    }
}
