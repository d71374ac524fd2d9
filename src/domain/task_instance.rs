//! Task instance records.
//!
//! A TaskInstance is one executed occurrence of a task definition inside one
//! workflow run. The engine owns these records; the condition task only
//! reads them (and writes back its own parameters).

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Execution status of a task instance, shared across the whole engine.
///
/// The condition evaluator only ever compares two of these for equality.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TaskExecutionStatus {
    SubmittedSuccess,
    RunningExecution,
    Pause,
    Failure,
    Success,
    NeedFaultTolerance,
    Kill,
    DelayExecution,
    ForcedSuccess,
    Dispatch,
}

impl fmt::Display for TaskExecutionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::SubmittedSuccess => "SUBMITTED_SUCCESS",
            Self::RunningExecution => "RUNNING_EXECUTION",
            Self::Pause => "PAUSE",
            Self::Failure => "FAILURE",
            Self::Success => "SUCCESS",
            Self::NeedFaultTolerance => "NEED_FAULT_TOLERANCE",
            Self::Kill => "KILL",
            Self::DelayExecution => "DELAY_EXECUTION",
            Self::ForcedSuccess => "FORCED_SUCCESS",
            Self::Dispatch => "DISPATCH",
        };
        f.pad(name)
    }
}

/// Whether a record belongs to a test run or a production run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TestFlag {
    Production,
    Test,
}

impl Default for TestFlag {
    fn default() -> Self {
        Self::Production
    }
}

impl From<bool> for TestFlag {
    fn from(test: bool) -> Self {
        if test {
            Self::Test
        } else {
            Self::Production
        }
    }
}

/// Validity of a task instance record.
///
/// A record becomes `Stale` once a later attempt (retry, rerun) supersedes it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InstanceFlag {
    Valid,
    Stale,
}

impl Default for InstanceFlag {
    fn default() -> Self {
        Self::Valid
    }
}

/// One executed occurrence of a task within one workflow run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskInstance {
    /// Unique identifier of this instance record
    pub id: i64,

    /// Stable identifier of the task definition (unique per valid set)
    pub task_code: i64,

    /// The workflow run this instance belongs to
    pub workflow_instance_id: i64,

    /// Human-readable task name
    #[serde(default)]
    pub name: String,

    /// Task type (e.g. "CONDITIONS", "SHELL")
    #[serde(default)]
    pub task_type: String,

    /// Current execution status
    pub state: TaskExecutionStatus,

    /// Attempt number (0 for the first attempt)
    #[serde(default)]
    pub retry_times: u32,

    /// Validity of this record
    #[serde(default)]
    pub flag: InstanceFlag,

    /// Test or production run
    #[serde(default)]
    pub test_flag: TestFlag,

    /// Serialized task parameters (JSON)
    #[serde(default)]
    pub task_params: String,

    /// When this version of the record was written
    #[serde(default = "Utc::now")]
    pub updated_at: DateTime<Utc>,
}

impl TaskInstance {
    /// Create a valid production instance with empty parameters
    pub fn new(id: i64, task_code: i64, workflow_instance_id: i64, state: TaskExecutionStatus) -> Self {
        Self {
            id,
            task_code,
            workflow_instance_id,
            name: String::new(),
            task_type: String::new(),
            state,
            retry_times: 0,
            flag: InstanceFlag::Valid,
            test_flag: TestFlag::Production,
            task_params: String::new(),
            updated_at: Utc::now(),
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn with_task_type(mut self, task_type: impl Into<String>) -> Self {
        self.task_type = task_type.into();
        self
    }

    pub fn with_retry_times(mut self, retry_times: u32) -> Self {
        self.retry_times = retry_times;
        self
    }

    pub fn with_test_flag(mut self, test_flag: TestFlag) -> Self {
        self.test_flag = test_flag;
        self
    }

    pub fn with_task_params(mut self, task_params: impl Into<String>) -> Self {
        self.task_params = task_params.into();
        self
    }

    /// Mark this record as superseded
    pub fn stale(mut self) -> Self {
        self.flag = InstanceFlag::Stale;
        self
    }

    /// True if this record is valid for dependency lookups in the given mode
    pub fn is_valid_for(&self, test_flag: TestFlag) -> bool {
        self.flag == InstanceFlag::Valid && self.test_flag == test_flag
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_wire_format() {
        let json = serde_json::to_string(&TaskExecutionStatus::RunningExecution).unwrap();
        assert_eq!(json, "\"RUNNING_EXECUTION\"");

        let parsed: TaskExecutionStatus = serde_json::from_str("\"FORCED_SUCCESS\"").unwrap();
        assert_eq!(parsed, TaskExecutionStatus::ForcedSuccess);
        assert_eq!(parsed.to_string(), "FORCED_SUCCESS");
    }

    #[test]
    fn test_minimal_record_defaults() {
        let json = r#"{"id": 7, "task_code": 100, "workflow_instance_id": 1, "state": "SUCCESS"}"#;
        let instance: TaskInstance = serde_json::from_str(json).unwrap();

        assert_eq!(instance.flag, InstanceFlag::Valid);
        assert_eq!(instance.test_flag, TestFlag::Production);
        assert_eq!(instance.retry_times, 0);
        assert!(instance.task_params.is_empty());
    }

    #[test]
    fn test_validity() {
        let instance = TaskInstance::new(1, 100, 1, TaskExecutionStatus::Success);
        assert!(instance.is_valid_for(TestFlag::Production));
        assert!(!instance.is_valid_for(TestFlag::Test));

        let stale = instance.stale();
        assert!(!stale.is_valid_for(TestFlag::Production));
    }
}
