use std::sync::Arc;

use common::mq::Mq;
use sea_orm::DatabaseConnection;

use crate::config::AppConfig;
use crate::otp::OtpSender;

#[derive(Clone)]
pub struct AppState {
    pub db: DatabaseConnection,
    pub config: AppConfig,
    /// `None` when MQ is disabled; fan-out then runs inline.
    pub mq: Option<Arc<Mq>>,
    pub otp_sender: Arc<dyn OtpSender>,
}
