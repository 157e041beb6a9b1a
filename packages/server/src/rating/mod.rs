//! Ratings and the derived per-movie summary.
//!
//! Every rating write goes through [`service`], which locks the movie row,
//! applies the write and calls [`aggregator::recompute`] on the same
//! transaction. The write and the summary commit together or not at all.

pub mod aggregator;
pub mod service;

pub use aggregator::{Recomputed, RatingSummary};
