//! In-memory record stores. Each record sits behind its own map entry so
//! writers to different records never contend.

pub mod contest;
pub mod problem;
pub mod user;

pub use contest::ContestStore;
pub use problem::ProblemStore;
pub use user::UserStore;
