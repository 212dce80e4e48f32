//! Wire-format models for the Taskline streaming protocol.
//!
//! One [`StreamEvent`] is carried per WebSocket frame as UTF-8 JSON, tagged
//! by a `type` field. Field names follow the wire exactly (`stepId`,
//! `agentId`, `currentTaskId`); Rust-side names are snake_case with explicit
//! renames.

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Plan model
// ---------------------------------------------------------------------------

/// Lifecycle of one plan step. Advances pending → running → completed (or
/// → error) and never regresses; see [`StepStatus::can_advance_to`].
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum StepStatus {
    Pending,
    Running,
    Completed,
    Error,
}

impl StepStatus {
    /// Whether a transition to `next` is a forward move. Completed and Error
    /// are terminal.
    pub fn can_advance_to(self, next: StepStatus) -> bool {
        match (self, next) {
            (StepStatus::Pending, StepStatus::Running) => true,
            (StepStatus::Pending | StepStatus::Running, StepStatus::Completed) => true,
            (StepStatus::Pending | StepStatus::Running, StepStatus::Error) => true,
            _ => false,
        }
    }
}

/// One unit of work in an agent's execution plan.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PlanStep {
    /// Unique within one plan.
    pub id: String,
    pub title: String,
    pub description: String,
    pub status: StepStatus,
}

// ---------------------------------------------------------------------------
// Stream events
// ---------------------------------------------------------------------------

/// One decoded unit of the real-time protocol.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type")]
pub enum StreamEvent {
    /// A fresh plan announcement; fully supersedes any prior plan.
    #[serde(rename = "plan")]
    Plan { plan: Vec<PlanStep> },

    /// The referenced step began executing.
    #[serde(rename = "stepStart")]
    StepStart {
        #[serde(rename = "stepId")]
        step_id: String,
    },

    /// The referenced step finished.
    #[serde(rename = "stepEnd")]
    StepEnd {
        #[serde(rename = "stepId")]
        step_id: String,
    },

    /// An incremental text fragment, optionally attributed to a step.
    #[serde(rename = "text")]
    Text {
        #[serde(rename = "stepId", default, skip_serializing_if = "Option::is_none")]
        step_id: Option<String>,
        text: String,
    },
}

// ---------------------------------------------------------------------------
// Transcript
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    User,
    Agent,
}

/// One chat-log entry. Agent messages are append-only: consecutive `text`
/// fragments for the same step accumulate into one message.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Message {
    /// Monotonic per session.
    pub id: u64,
    pub role: MessageRole,
    pub content: String,
    #[serde(rename = "stepId", default, skip_serializing_if = "Option::is_none")]
    pub step_id: Option<String>,
}

// ---------------------------------------------------------------------------
// Gateway HTTP payloads
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SubmitTaskRequest {
    pub message: String,
    #[serde(rename = "agentId")]
    pub agent_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SubmitTaskResponse {
    #[serde(rename = "currentTaskId")]
    pub current_task_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CancelTaskRequest {
    #[serde(rename = "agentId")]
    pub agent_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CancelTaskResponse {
    #[serde(rename = "currentTaskId")]
    pub current_task_id: String,
}
