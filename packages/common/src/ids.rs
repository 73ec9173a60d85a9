//! Identifier newtypes.
//!
//! Every entity is keyed by an opaque string so that ids coming from authoring
//! surfaces (`"p1"`, `"c2"`, ...) can be used as-is.

use serde::{Deserialize, Serialize};
use std::fmt;

macro_rules! string_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(s: &str) -> Self {
                Self(s.to_string())
            }
        }

        impl From<String> for $name {
            fn from(s: String) -> Self {
                Self(s)
            }
        }
    };
}

string_id!(
    /// Problem identifier.
    ProblemId
);
string_id!(
    /// Test case identifier, unique within its problem.
    TestCaseId
);
string_id!(
    /// Contest identifier.
    ContestId
);
string_id!(
    /// User identifier.
    UserId
);
string_id!(
    /// Submission identifier.
    SubmissionId
);

impl SubmissionId {
    /// Generate a fresh, time-ordered submission id.
    pub fn generate() -> Self {
        Self(uuid::Uuid::now_v7().to_string())
    }
}
