//! Domain types for condition tasks.
//!
//! This module contains the core data structures:
//! - TaskInstance: Executed occurrences of tasks within a workflow run
//! - Parameters: The condition expression and its persisted outcome
//! - Events: Immutable records of task lifecycle transitions

pub mod events;
pub mod parameters;
pub mod task_instance;

// Re-export commonly used types
pub use events::{Event, EventType, TaskPhase};
pub use parameters::{
    ConditionDependency, ConditionDependentItem, ConditionResult, ConditionsParameters,
    DependentRelation, DependentTaskModel,
};
pub use task_instance::{InstanceFlag, TaskExecutionStatus, TaskInstance, TestFlag};
