//! Core condition task logic.
//!
//! This module contains:
//! - Dependency: Pure AND/OR evaluation of condition expressions
//! - ConditionTask: Controller driving one condition task attempt
//! - Store: Task instance persistence seam and JSONL implementation
//! - Lifecycle: Task transition notifications
//! - EventStore: Append-only lifecycle event log
//! - Jsonl: Locked line appends shared by both logs

pub mod condition_task;
pub mod context;
pub mod dependency;
pub mod event_store;
pub mod jsonl;
pub mod lifecycle;
pub mod logic_task;
pub mod store;

// Re-export commonly used types
pub use condition_task::{build_task_instance_map, ConditionTask, ConditionTaskError};
pub use context::{TaskExecutionContext, WorkflowExecutionContext, WorkflowExecutionGraph};
pub use dependency::{result_for_relation, DependResult, DependencyEvaluator};
pub use event_store::EventStore;
pub use lifecycle::{EventLifecycle, TaskLifecycle};
pub use logic_task::{JsonParameterDeserializer, LogicTask, TaskParameterDeserializer};
pub use store::{FileTaskInstanceStore, StoreError, TaskInstanceStore};
