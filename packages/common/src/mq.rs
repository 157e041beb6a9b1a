pub use broccoli_queue::{
    brokers::broker::BrokerMessage,
    error::BroccoliError,
    queue::BroccoliQueue,
};
use serde::{Serialize, de::DeserializeOwned};
use thiserror::Error;
use tracing::info;

pub type Mq = BroccoliQueue;

#[derive(Debug, Error)]
pub enum MqError {
    #[error("Failed to connect to broker at {url}: {detail}")]
    Connect { url: String, detail: String },

    #[error("Failed to publish to '{queue}': {detail}")]
    Publish { queue: String, detail: String },
}

pub struct MqConfig {
    pub url: String,
    pub pool_size: u8,
}

pub async fn init_mq(config: MqConfig) -> Result<Mq, MqError> {
    let mq = BroccoliQueue::builder(&config.url)
        .pool_connections(config.pool_size)
        .build()
        .await
        .map_err(|e| MqError::Connect {
            url: config.url.clone(),
            detail: e.to_string(),
        })?;

    info!(pool_size = config.pool_size, "MQ connected");
    Ok(mq)
}

/// Publish one job to `queue`.
pub async fn publish_job<T>(mq: &Mq, queue: &str, job: &T) -> Result<(), MqError>
where
    T: Serialize + DeserializeOwned + Clone,
{
    mq.publish(queue, None, job, None)
        .await
        .map(|_| ())
        .map_err(|e| MqError::Publish {
            queue: queue.to_string(),
            detail: e.to_string(),
        })
}
