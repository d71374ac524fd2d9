//! condgate - Condition task evaluator for DAG workflow engines
//!
//! A condition task is a workflow node that checks the states of upstream
//! task instances and records whether its condition holds. The engine then
//! follows the success or failed branch of the DAG accordingly.
//!
//! # Architecture
//!
//! - Evaluation is a pure function of the condition expression and a
//!   snapshot of task instance states
//! - The controller reads that snapshot once, evaluates, persists the
//!   outcome in the task parameters and always completes successfully
//! - Storage, workflow context and lifecycle are injected traits
//!
//! # Modules
//!
//! - `core`: Evaluation, the condition task controller and its collaborators
//! - `domain`: Data structures (TaskInstance, ConditionsParameters, Event)
//! - `config`: Path and logging configuration
//! - `cli`: Command-line interface
//!
//! # Usage
//!
//! ```bash
//! # Evaluate parameters against a snapshot
//! condgate evaluate --params condition.json --snapshot instances.json
//!
//! # Run a recorded condition task
//! condgate run <workflow-instance-id> <task-instance-id>
//! ```

pub mod cli;
pub mod config;
pub mod core;
pub mod domain;

// Re-export main types at crate root for convenience
pub use core::{ConditionTask, DependResult, DependencyEvaluator, LogicTask};
pub use domain::{ConditionsParameters, TaskExecutionStatus, TaskInstance, TestFlag};
