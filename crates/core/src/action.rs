//! Agent actions — the terminal decision vocabulary for an execution.

use serde::{Deserialize, Serialize};

/// The decision an agent submits for one execution.
///
/// Serialized lowercase on the wire (`"approve"`, `"reject"`,
/// `"flag"`, `"skip"`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Action {
    /// Approve the result/task and advance it through the workflow.
    Approve,
    /// Reject it, returning it to the annotator for correction.
    Reject,
    /// Flag it for manual human review.
    Flag,
    /// Acknowledge the execution without taking any workflow action.
    Skip,
}

impl Action {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Approve => "approve",
            Self::Reject => "reject",
            Self::Flag => "flag",
            Self::Skip => "skip",
        }
    }
}

impl std::fmt::Display for Action {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
