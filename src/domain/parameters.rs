//! Condition task parameters.
//!
//! The parameter blob is stored as JSON on the task instance record. Field
//! names follow the engine's camelCase wire format.

use serde::{Deserialize, Serialize};

use super::task_instance::TaskExecutionStatus;

/// Combinator applied to a list of sub-results
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum DependentRelation {
    And,
    Or,
}

/// A single leaf comparison: the task with `dep_task_code` must be in `status`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConditionDependentItem {
    pub dep_task_code: i64,
    pub status: TaskExecutionStatus,
}

impl ConditionDependentItem {
    pub fn new(dep_task_code: i64, status: TaskExecutionStatus) -> Self {
        Self {
            dep_task_code,
            status,
        }
    }
}

/// One row of items combined with a relation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DependentTaskModel {
    pub relation: DependentRelation,
    pub depend_item_list: Vec<ConditionDependentItem>,
}

impl DependentTaskModel {
    pub fn new(relation: DependentRelation, depend_item_list: Vec<ConditionDependentItem>) -> Self {
        Self {
            relation,
            depend_item_list,
        }
    }
}

/// The full two-level expression evaluated for one condition task
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConditionDependency {
    pub relation: DependentRelation,
    pub depend_task_list: Vec<DependentTaskModel>,
}

impl ConditionDependency {
    pub fn new(relation: DependentRelation, depend_task_list: Vec<DependentTaskModel>) -> Self {
        Self {
            relation,
            depend_task_list,
        }
    }
}

/// Persisted outcome of a condition evaluation plus the branches it selects
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConditionResult {
    #[serde(default)]
    pub condition_success: bool,

    /// Downstream task codes taken when the condition holds
    #[serde(default)]
    pub success_node: Vec<i64>,

    /// Downstream task codes taken when it does not
    #[serde(default)]
    pub failed_node: Vec<i64>,
}

impl ConditionResult {
    /// The downstream branch selected by the current outcome
    pub fn next_branch(&self) -> &[i64] {
        if self.condition_success {
            &self.success_node
        } else {
            &self.failed_node
        }
    }
}

/// Parameters of a condition task
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConditionsParameters {
    pub dependence: ConditionDependency,
    #[serde(default)]
    pub condition_result: ConditionResult,
}
