use serde::Deserialize;

/// App-level MQ configuration.
#[derive(Debug, Deserialize, Clone)]
pub struct MqAppConfig {
    /// Whether MQ is enabled. Default: false.
    /// When disabled, notification fan-out runs inline after the movie is committed.
    #[serde(default = "default_mq_enabled")]
    pub enabled: bool,
    /// Redis connection URL. Default: "redis://localhost:6379".
    #[serde(default = "default_mq_url")]
    pub url: String,
    /// Connection pool size. Default: 5.
    #[serde(default = "default_mq_pool_size")]
    pub pool_size: u8,
    /// Queue carrying fan-out jobs (server publishes and consumes). Default: "notification_fanout".
    #[serde(default = "default_fanout_queue_name")]
    pub fanout_queue_name: String,
    /// Concurrent fan-out jobs handled by the consumer. Default: 2.
    #[serde(default = "default_consumer_concurrency")]
    pub consumer_concurrency: usize,
}

fn default_mq_enabled() -> bool {
    false
}
fn default_mq_url() -> String {
    "redis://localhost:6379".into()
}
fn default_mq_pool_size() -> u8 {
    5
}
fn default_fanout_queue_name() -> String {
    "notification_fanout".into()
}
fn default_consumer_concurrency() -> usize {
    2
}

impl Default for MqAppConfig {
    fn default() -> Self {
        Self {
            enabled: default_mq_enabled(),
            url: default_mq_url(),
            pool_size: default_mq_pool_size(),
            fanout_queue_name: default_fanout_queue_name(),
            consumer_concurrency: default_consumer_concurrency(),
        }
    }
}

/// Tuning for the notification fan-out.
#[derive(Debug, Deserialize, Clone)]
pub struct FanoutConfig {
    /// Notification rows per INSERT statement. Default: 500.
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
    /// Batches in flight at once. Default: 4.
    #[serde(default = "default_max_concurrency")]
    pub max_concurrency: usize,
    /// Extra attempts for a failed batch before its users are reported as missed. Default: 3.
    #[serde(default = "default_max_batch_retries")]
    pub max_batch_retries: u32,
    #[serde(default = "default_retry_base_ms")]
    pub retry_base_ms: u64,
    #[serde(default = "default_retry_max_ms")]
    pub retry_max_ms: u64,
}

fn default_batch_size() -> usize {
    500
}
fn default_max_concurrency() -> usize {
    4
}
fn default_max_batch_retries() -> u32 {
    3
}
fn default_retry_base_ms() -> u64 {
    200
}
fn default_retry_max_ms() -> u64 {
    5_000
}

impl Default for FanoutConfig {
    fn default() -> Self {
        Self {
            batch_size: default_batch_size(),
            max_concurrency: default_max_concurrency(),
            max_batch_retries: default_max_batch_retries(),
            retry_base_ms: default_retry_base_ms(),
            retry_max_ms: default_retry_max_ms(),
        }
    }
}
