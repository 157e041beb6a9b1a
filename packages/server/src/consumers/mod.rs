pub mod fanout;

pub use fanout::consume_fanout_jobs;
