//! Assignment status derived from the current user's submission.

use std::fmt;

use serde::{Deserialize, Serialize};

use coursevault_core::Submission;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AssignmentStatus {
    Pending,
    Submitted,
    Graded,
}

impl AssignmentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AssignmentStatus::Pending => "pending",
            AssignmentStatus::Submitted => "submitted",
            AssignmentStatus::Graded => "graded",
        }
    }

    /// Checked in the task list.
    pub fn is_done(&self) -> bool {
        matches!(self, AssignmentStatus::Submitted | AssignmentStatus::Graded)
    }
}

impl fmt::Display for AssignmentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A grade (even an empty one) wins over the workflow state.
pub fn derive_status(submission: Option<&Submission>) -> AssignmentStatus {
    let Some(sub) = submission else {
        return AssignmentStatus::Pending;
    };
    if sub.grade.is_some() || sub.workflow_state.as_deref() == Some("graded") {
        return AssignmentStatus::Graded;
    }
    match sub.workflow_state.as_deref() {
        Some("submitted") | Some("pending_review") => AssignmentStatus::Submitted,
        _ => AssignmentStatus::Pending,
    }
}
