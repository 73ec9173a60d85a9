pub mod judge;

pub use judge::process_job;
