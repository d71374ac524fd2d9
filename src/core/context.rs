//! Execution context handed to logic tasks.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::domain::{TaskInstance, TestFlag};

/// What the engine tells a task about the attempt it is running
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskExecutionContext {
    pub task_instance_id: i64,
    pub workflow_instance_id: i64,
    pub test_flag: TestFlag,

    /// Raw parameter JSON of the task
    pub task_params: String,
}

impl TaskExecutionContext {
    /// Build the context for running `task_instance`
    pub fn for_instance(task_instance: &TaskInstance) -> Self {
        Self {
            task_instance_id: task_instance.id,
            workflow_instance_id: task_instance.workflow_instance_id,
            test_flag: task_instance.test_flag,
            task_params: task_instance.task_params.clone(),
        }
    }
}

/// View of a running workflow that resolves task instances by id
pub trait WorkflowExecutionContext: Send + Sync {
    fn resolve_task_instance(&self, task_instance_id: i64) -> Option<TaskInstance>;
}

/// In-memory execution graph of one workflow run
#[derive(Debug, Clone, Default)]
pub struct WorkflowExecutionGraph {
    task_instances: HashMap<i64, TaskInstance>,
}

impl WorkflowExecutionGraph {
    /// Build a graph from the instances currently scheduled in a run
    pub fn from_instances(task_instances: impl IntoIterator<Item = TaskInstance>) -> Self {
        Self {
            task_instances: task_instances
                .into_iter()
                .map(|instance| (instance.id, instance))
                .collect(),
        }
    }
}

impl WorkflowExecutionContext for WorkflowExecutionGraph {
    fn resolve_task_instance(&self, task_instance_id: i64) -> Option<TaskInstance> {
        self.task_instances.get(&task_instance_id).cloned()
    }
}
