//! Task lifecycle notifications.
//!
//! Logic tasks report their transitions to a `TaskLifecycle`. Notifications
//! are one-directional: a task never inspects the outcome, so implementations
//! log their own failures instead of returning them.

use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use tracing::{info, warn};

use crate::domain::{Event, EventType, TaskExecutionStatus, TaskInstance, TaskPhase};

use super::event_store::EventStore;
use super::store::TaskInstanceStore;

/// Receiver of task lifecycle transitions
#[async_trait]
pub trait TaskLifecycle: Send + Sync {
    /// The task has been picked up and is running
    async fn on_running(&self, task_instance: &TaskInstance);

    /// The task completed successfully
    async fn on_success(&self, task_instance: &TaskInstance);

    /// A condition task computed its outcome
    async fn on_condition_evaluated(&self, _task_instance: &TaskInstance, _condition_success: bool) {}

    /// A pause or kill request was accepted without effect
    async fn on_request_ignored(&self, _task_instance: &TaskInstance, _event_type: EventType) {}
}

/// Lifecycle that records transitions in the workflow run's event log and
/// keeps the task instance state current in the store
pub struct EventLifecycle {
    /// Directory holding one subdirectory per workflow run
    base_dir: PathBuf,

    store: Arc<dyn TaskInstanceStore>,
}

impl EventLifecycle {
    pub fn new(base_dir: PathBuf, store: Arc<dyn TaskInstanceStore>) -> Self {
        Self { base_dir, store }
    }

    async fn record(&self, task_instance: &TaskInstance, event: Event) {
        let result = async {
            let events = EventStore::open_in(&self.base_dir, task_instance.workflow_instance_id).await?;
            events.append(&event).await
        }
        .await;

        if let Err(e) = result {
            warn!(
                task_instance_id = task_instance.id,
                event_type = ?event.event_type,
                error = %e,
                "Failed to record lifecycle event"
            );
        }
    }

    /// Move the stored record to `state`, keeping every other field as
    /// last written
    async fn persist_state(&self, task_instance: &TaskInstance, state: TaskExecutionStatus) {
        let result = async {
            let mut current = self
                .store
                .find_task_instance(task_instance.workflow_instance_id, task_instance.id)
                .await?
                .unwrap_or_else(|| task_instance.clone());
            current.state = state;
            self.store.upsert(&current).await
        }
        .await;

        if let Err(e) = result {
            warn!(
                task_instance_id = task_instance.id,
                %state,
                error = %e,
                "Failed to persist task state"
            );
        }
    }
}

#[async_trait]
impl TaskLifecycle for EventLifecycle {
    async fn on_running(&self, task_instance: &TaskInstance) {
        info!(task_instance_id = task_instance.id, "Task running");

        self.persist_state(task_instance, TaskExecutionStatus::RunningExecution)
            .await;

        let event = Event::new(
            task_instance.workflow_instance_id,
            task_instance.id,
            task_instance.task_code,
            EventType::TaskRunning,
            format!("Task '{}' running", task_instance.name),
            TaskPhase::Running,
        );
        self.record(task_instance, event).await;
    }

    async fn on_success(&self, task_instance: &TaskInstance) {
        info!(task_instance_id = task_instance.id, "Task succeeded");

        self.persist_state(task_instance, TaskExecutionStatus::Success)
            .await;

        let event = Event::new(
            task_instance.workflow_instance_id,
            task_instance.id,
            task_instance.task_code,
            EventType::TaskSucceeded,
            format!("Task '{}' succeeded", task_instance.name),
            TaskPhase::Success,
        );
        self.record(task_instance, event).await;
    }

    async fn on_condition_evaluated(&self, task_instance: &TaskInstance, condition_success: bool) {
        let event = Event::new(
            task_instance.workflow_instance_id,
            task_instance.id,
            task_instance.task_code,
            EventType::ConditionEvaluated,
            format!(
                "Condition of task '{}' evaluated to {}",
                task_instance.name, condition_success
            ),
            TaskPhase::Running,
        )
        .with_condition(condition_success);
        self.record(task_instance, event).await;
    }

    async fn on_request_ignored(&self, task_instance: &TaskInstance, event_type: EventType) {
        let phase = match task_instance.state {
            TaskExecutionStatus::Success => TaskPhase::Success,
            _ => TaskPhase::Running,
        };

        let event = Event::new(
            task_instance.workflow_instance_id,
            task_instance.id,
            task_instance.task_code,
            event_type,
            format!("Task '{}' ignored {:?}", task_instance.name, event_type),
            phase,
        );
        self.record(task_instance, event).await;
    }
}
