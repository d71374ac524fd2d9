//! Condition task controller.
//!
//! Drives one execution attempt of a condition task: resolve the dependency
//! snapshot of the workflow run, evaluate the condition, persist the outcome
//! in the task parameters and report completion.
//!
//! The task itself always completes successfully. `conditionSuccess` in its
//! parameters is what the engine reads to pick the downstream branch.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;
use tracing::{info, instrument, warn};

use crate::domain::{
    ConditionsParameters, EventType, TaskExecutionStatus, TaskInstance, TaskPhase,
};

use super::context::{TaskExecutionContext, WorkflowExecutionContext};
use super::dependency::{DependResult, DependencyEvaluator};
use super::lifecycle::TaskLifecycle;
use super::logic_task::{JsonParameterDeserializer, LogicTask, TaskParameterDeserializer};
use super::store::{StoreError, TaskInstanceStore};

/// Errors raised while constructing or running a condition task
#[derive(Debug, Error)]
pub enum ConditionTaskError {
    #[error("Malformed condition task parameters: {0}")]
    MalformedParameters(#[source] serde_json::Error),

    #[error("Task instance {0} not found in workflow execution graph")]
    TaskInstanceNotFound(i64),

    #[error("Failed to serialize condition task parameters: {0}")]
    SerializeParameters(#[source] serde_json::Error),

    #[error("Task instance store error: {0}")]
    Store(#[from] StoreError),

    #[error("Condition task {0} already completed")]
    AlreadyCompleted(i64),
}

/// Controller of one condition task execution attempt
pub struct ConditionTask {
    task_execution_context: TaskExecutionContext,
    task_instance: TaskInstance,
    parameters: ConditionsParameters,
    store: Arc<dyn TaskInstanceStore>,
    lifecycle: Arc<dyn TaskLifecycle>,
    phase: TaskPhase,
}

impl std::fmt::Debug for ConditionTask {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConditionTask")
            .field("task_execution_context", &self.task_execution_context)
            .field("task_instance", &self.task_instance)
            .field("parameters", &self.parameters)
            .field("phase", &self.phase)
            .finish_non_exhaustive()
    }
}

impl ConditionTask {
    /// Parse parameters, resolve the task instance and report it running.
    ///
    /// Nothing is reported when the parameters are malformed.
    pub async fn new(
        workflow: &dyn WorkflowExecutionContext,
        task_execution_context: TaskExecutionContext,
        store: Arc<dyn TaskInstanceStore>,
        lifecycle: Arc<dyn TaskLifecycle>,
    ) -> Result<Self, ConditionTaskError> {
        let parameters = Self::parameter_deserializer()
            .deserialize(&task_execution_context.task_params)
            .map_err(ConditionTaskError::MalformedParameters)?;

        let task_instance = workflow
            .resolve_task_instance(task_execution_context.task_instance_id)
            .ok_or(ConditionTaskError::TaskInstanceNotFound(
                task_execution_context.task_instance_id,
            ))?;

        let mut task = Self {
            task_execution_context,
            task_instance,
            parameters,
            store,
            lifecycle,
            phase: TaskPhase::Created,
        };
        task.on_task_running().await;

        Ok(task)
    }

    pub fn task_instance(&self) -> &TaskInstance {
        &self.task_instance
    }

    pub fn parameters(&self) -> &ConditionsParameters {
        &self.parameters
    }

    pub fn phase(&self) -> TaskPhase {
        self.phase
    }

    /// Persisted outcome of the last evaluation
    pub fn condition_success(&self) -> bool {
        self.parameters.condition_result.condition_success
    }

    async fn on_task_running(&mut self) {
        self.phase = TaskPhase::Running;
        self.task_instance.state = TaskExecutionStatus::RunningExecution;
        self.lifecycle.on_running(&self.task_instance).await;
    }

    async fn on_task_success(&mut self) {
        self.phase = TaskPhase::Success;
        self.task_instance.state = TaskExecutionStatus::Success;
        self.lifecycle.on_success(&self.task_instance).await;
    }

    #[instrument(skip(self), fields(task_instance_id = self.task_instance.id, task_code = self.task_instance.task_code))]
    async fn run_to_completion(&mut self) -> Result<DependResult, ConditionTaskError> {
        if self.phase == TaskPhase::Success {
            return Err(ConditionTaskError::AlreadyCompleted(self.task_instance.id));
        }

        let condition_result = self.calculate_condition_result().await?;
        info!(%condition_result, "Condition evaluated");

        let condition_success = condition_result == DependResult::Success;
        self.parameters.condition_result.condition_success = condition_success;

        self.task_instance.task_params = serde_json::to_string(&self.parameters)
            .map_err(ConditionTaskError::SerializeParameters)?;
        self.store.update_task_params(&self.task_instance).await?;

        self.lifecycle
            .on_condition_evaluated(&self.task_instance, condition_success)
            .await;
        self.on_task_success().await;

        Ok(condition_result)
    }

    async fn calculate_condition_result(&self) -> Result<DependResult, ConditionTaskError> {
        let task_instances = self
            .store
            .query_valid_task_instances(
                self.task_execution_context.workflow_instance_id,
                self.task_execution_context.test_flag,
            )
            .await?;

        let evaluator = DependencyEvaluator::new(build_task_instance_map(task_instances));
        Ok(evaluator.evaluate(&self.parameters.dependence))
    }
}

/// Key valid instances by task code.
///
/// When a code appears more than once the instance with the highest attempt
/// number wins, then the highest id.
pub fn build_task_instance_map(task_instances: Vec<TaskInstance>) -> HashMap<i64, TaskInstance> {
    let mut map: HashMap<i64, TaskInstance> = HashMap::with_capacity(task_instances.len());

    for instance in task_instances {
        let replace = match map.get(&instance.task_code) {
            Some(existing) => {
                let newer = (instance.retry_times, instance.id) > (existing.retry_times, existing.id);
                warn!(
                    task_code = instance.task_code,
                    kept = if newer { instance.id } else { existing.id },
                    dropped = if newer { existing.id } else { instance.id },
                    "Duplicate valid task instances for task code"
                );
                newer
            }
            None => true,
        };

        if replace {
            map.insert(instance.task_code, instance);
        }
    }

    map
}

#[async_trait]
impl LogicTask for ConditionTask {
    type Parameters = ConditionsParameters;
    type Output = DependResult;
    type Error = ConditionTaskError;

    fn parameter_deserializer() -> Box<dyn TaskParameterDeserializer<ConditionsParameters>> {
        Box::new(JsonParameterDeserializer::<ConditionsParameters>::new())
    }

    async fn start(&mut self) -> Result<DependResult, ConditionTaskError> {
        self.run_to_completion().await
    }

    async fn pause(&mut self) -> Result<(), ConditionTaskError> {
        info!(
            task_instance_id = self.task_instance.id,
            "The ConditionTask does not support pause operation"
        );
        self.lifecycle
            .on_request_ignored(&self.task_instance, EventType::PauseIgnored)
            .await;
        Ok(())
    }

    async fn kill(&mut self) -> Result<(), ConditionTaskError> {
        info!(
            task_instance_id = self.task_instance.id,
            "The ConditionTask does not support kill operation"
        );
        self.lifecycle
            .on_request_ignored(&self.task_instance, EventType::KillIgnored)
            .await;
        Ok(())
    }
}
