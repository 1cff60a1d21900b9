//! Stage definitions and the workflow transition table
//!
//! The workflow is a fixed directed graph:
//!
//! ```text
//! Start -> research -> writing -> approval --approved--> finalize -> End
//!                                      \---rejected--> rejected -> End
//! ```
//!
//! Stages are tagged variants rather than dynamically dispatched nodes, which
//! keeps the checkpoint format trivial: a checkpoint records the next stage
//! by name plus the serialized state.

use crate::error::GraphError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A named unit of execution in the workflow graph
///
/// Each stage runs to completion before the next begins. `Approval` is the
/// single suspension point: it pauses the workflow until a resume payload
/// routes it to `Finalize` or `Rejected`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Stage {
    /// Analyze the prompt and gather findings per topic
    Research,
    /// Render a draft from the research findings
    Writing,
    /// Suspend for human review of the draft
    Approval,
    /// Terminal success: promote the draft to the final result
    Finalize,
    /// Terminal failure: record the rejection feedback
    Rejected,
}

impl Stage {
    /// The stage that follows on the unconditional edge, if any
    ///
    /// `Approval` has no unconditional successor: routing depends on the
    /// resume payload. Terminal stages return `None`.
    pub fn next(&self) -> Option<Stage> {
        match self {
            Stage::Research => Some(Stage::Writing),
            Stage::Writing => Some(Stage::Approval),
            Stage::Approval | Stage::Finalize | Stage::Rejected => None,
        }
    }

    /// Whether this stage ends the workflow
    pub fn is_terminal(&self) -> bool {
        matches!(self, Stage::Finalize | Stage::Rejected)
    }

    /// Stage name as stored in checkpoints
    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::Research => "research",
            Stage::Writing => "writing",
            Stage::Approval => "approval",
            Stage::Finalize => "finalize",
            Stage::Rejected => "rejected",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Stage {
    type Err = GraphError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "research" => Ok(Stage::Research),
            "writing" => Ok(Stage::Writing),
            "approval" => Ok(Stage::Approval),
            "finalize" => Ok(Stage::Finalize),
            "rejected" => Ok(Stage::Rejected),
            other => Err(GraphError::UnknownStage(other.to_string())),
        }
    }
}
