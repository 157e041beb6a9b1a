//! User notifications: movie announcements and read state.

pub mod fanout;
pub mod service;

pub use fanout::{FanoutError, FanoutReport};
