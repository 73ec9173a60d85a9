pub mod config;
pub mod contest;
pub mod ids;
pub mod judge_job;
pub mod judge_result;
pub mod problem;
pub mod retry;
pub mod submission;
pub mod submission_status;
pub mod user;
pub mod validation;

pub use config::JudgeSettings;
pub use ids::{ContestId, ProblemId, SubmissionId, TestCaseId, UserId};
pub use submission_status::{SubmissionStatus, Verdict};
