pub mod config;
pub mod fanout_job;
pub mod movie_kind;
pub mod mq;
pub mod otp_purpose;
pub mod retry;

pub use config::{FanoutConfig, MqAppConfig};
pub use fanout_job::FanoutJob;
pub use movie_kind::MovieKind;
pub use otp_purpose::OtpPurpose;
