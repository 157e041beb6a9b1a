//! One-time codes for email verification and password resets.

pub mod sender;
pub mod store;

pub use sender::{LogOtpSender, OtpSender};
