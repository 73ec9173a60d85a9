//! Platform operations, one module per entity.

pub mod contest;
pub mod problem;
pub mod stats;
pub mod submission;
pub mod user;

/// Id for a record created without one.
pub(crate) fn generated_id(prefix: &str) -> String {
    format!("{prefix}-{}", uuid::Uuid::now_v7().simple())
}
