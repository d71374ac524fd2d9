//! Lifecycle events for logic tasks.
//!
//! Every observable transition of a logic task is recorded as an immutable
//! event in the workflow instance's append-only log.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A single event in the append-only lifecycle log.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Event {
    /// Unique identifier for this event
    pub id: Uuid,

    /// When this event occurred (ISO 8601)
    pub timestamp: DateTime<Utc>,

    /// The workflow run this event belongs to
    pub workflow_instance_id: i64,

    /// Task instance the event is about
    pub task_instance_id: i64,

    /// Task definition code of that instance
    pub task_code: i64,

    /// Type of event
    pub event_type: EventType,

    /// Human-readable summary
    pub payload_summary: String,

    /// Phase of the task after this event
    pub phase: TaskPhase,

    /// Outcome of a condition evaluation (ConditionEvaluated only)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub condition_success: Option<bool>,
}

impl Event {
    /// Create a new event with the current timestamp
    pub fn new(
        workflow_instance_id: i64,
        task_instance_id: i64,
        task_code: i64,
        event_type: EventType,
        payload_summary: String,
        phase: TaskPhase,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            timestamp: Utc::now(),
            workflow_instance_id,
            task_instance_id,
            task_code,
            event_type,
            payload_summary,
            phase,
            condition_success: None,
        }
    }

    /// Attach the condition outcome
    pub fn with_condition(mut self, condition_success: bool) -> Self {
        self.condition_success = Some(condition_success);
        self
    }
}

/// Types of lifecycle events
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventType {
    /// Task was picked up and is running
    TaskRunning,

    /// Condition expression was evaluated
    ConditionEvaluated,

    /// Task completed successfully
    TaskSucceeded,

    /// A pause request was received and not honored
    PauseIgnored,

    /// A kill request was received and not honored
    KillIgnored,
}

/// Phase of a logic task execution attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskPhase {
    /// Constructed, not yet reported as running
    Created,

    /// Reported as running
    Running,

    /// Completed successfully (terminal)
    Success,
}
