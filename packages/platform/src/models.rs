pub mod contest;
pub mod problem;
pub mod stats;
pub mod submission;
pub mod user;
