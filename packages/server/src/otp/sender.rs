use async_trait::async_trait;
use common::OtpPurpose;
use tracing::info;

/// Delivers a freshly issued code to its owner.
#[async_trait]
pub trait OtpSender: Send + Sync {
    async fn send(&self, email: &str, purpose: OtpPurpose, code: &str) -> anyhow::Result<()>;
}

/// Writes codes to the log instead of delivering them.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogOtpSender;

#[async_trait]
impl OtpSender for LogOtpSender {
    async fn send(&self, email: &str, purpose: OtpPurpose, code: &str) -> anyhow::Result<()> {
        info!(email, %purpose, code, "One-time code issued");
        Ok(())
    }
}
