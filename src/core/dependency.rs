//! Dependency evaluation for condition tasks.
//!
//! Evaluates a two-level AND/OR expression of `(task code, expected status)`
//! items against a snapshot of task instances keyed by task code. Pure: no
//! I/O, no shared state.
//!
//! Empty collections evaluate to `Failed`, for AND as well as OR.

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::domain::{
    ConditionDependency, ConditionDependentItem, DependentRelation, DependentTaskModel,
    TaskInstance,
};

/// Result of a dependency check.
///
/// `Waiting` exists for the engine-wide combinator; the condition evaluator
/// itself only yields `Success` or `Failed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DependResult {
    Success,
    Failed,
    Waiting,
}

impl fmt::Display for DependResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Success => f.write_str("SUCCESS"),
            Self::Failed => f.write_str("FAILED"),
            Self::Waiting => f.write_str("WAITING"),
        }
    }
}

/// Combine results with a relation using three-valued logic.
///
/// - AND: any `Failed` wins, then any `Waiting`, else `Success`
/// - OR: any `Success` wins, then any `Waiting`, else `Failed`
/// - no results: `Failed`
pub fn result_for_relation(relation: DependentRelation, results: &[DependResult]) -> DependResult {
    if results.is_empty() {
        return DependResult::Failed;
    }

    let any = |wanted: DependResult| results.iter().any(|r| *r == wanted);

    match relation {
        DependentRelation::And => {
            if any(DependResult::Failed) {
                DependResult::Failed
            } else if any(DependResult::Waiting) {
                DependResult::Waiting
            } else {
                DependResult::Success
            }
        }
        DependentRelation::Or => {
            if any(DependResult::Success) {
                DependResult::Success
            } else if any(DependResult::Waiting) {
                DependResult::Waiting
            } else {
                DependResult::Failed
            }
        }
    }
}

/// Evaluates condition expressions against a task instance snapshot
#[derive(Debug, Clone, Default)]
pub struct DependencyEvaluator {
    task_instances: HashMap<i64, TaskInstance>,
}

impl DependencyEvaluator {
    /// Create an evaluator over a lookup keyed by task code
    pub fn new(task_instances: HashMap<i64, TaskInstance>) -> Self {
        Self { task_instances }
    }

    /// Evaluate the whole expression
    pub fn evaluate(&self, dependence: &ConditionDependency) -> DependResult {
        let results: Vec<DependResult> = dependence
            .depend_task_list
            .iter()
            .map(|group| self.evaluate_group(group))
            .collect();

        result_for_relation(dependence.relation, &results)
    }

    /// Evaluate one group; every item is evaluated so each one is logged
    pub fn evaluate_group(&self, group: &DependentTaskModel) -> DependResult {
        let results: Vec<DependResult> = group
            .depend_item_list
            .iter()
            .map(|item| self.evaluate_item(item))
            .collect();

        result_for_relation(group.relation, &results)
    }

    /// Evaluate one leaf comparison
    pub fn evaluate_item(&self, item: &ConditionDependentItem) -> DependResult {
        let Some(task_instance) = self.task_instances.get(&item.dep_task_code) else {
            info!(
                dep_task_code = item.dep_task_code,
                result = %DependResult::Failed,
                "Depend item has not completed yet"
            );
            return DependResult::Failed;
        };

        let result = if task_instance.state == item.status {
            DependResult::Success
        } else {
            DependResult::Failed
        };

        info!(
            dep_task_code = item.dep_task_code,
            expected = %item.status,
            actual = %task_instance.state,
            result = %result,
            "Depend item evaluated"
        );

        result
    }
}
