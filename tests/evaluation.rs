//! Condition Evaluation Integration Tests
//!
//! Tests for AND/OR semantics, fail-closed defaults and determinism of the
//! dependency evaluator.

use std::collections::HashMap;

use condgate::core::{DependResult, DependencyEvaluator};
use condgate::domain::{
    ConditionDependency, ConditionDependentItem, ConditionsParameters, DependentRelation,
    DependentTaskModel, TaskExecutionStatus, TaskInstance,
};

fn snapshot(states: &[(i64, TaskExecutionStatus)]) -> DependencyEvaluator {
    let map: HashMap<i64, TaskInstance> = states
        .iter()
        .map(|(code, state)| (*code, TaskInstance::new(*code * 10, *code, 1, *state)))
        .collect();
    DependencyEvaluator::new(map)
}

/// `{AND, [{OR, [{1, SUCCESS}, {2, SUCCESS}]}]}`
fn either_succeeded() -> ConditionDependency {
    ConditionDependency::new(
        DependentRelation::And,
        vec![DependentTaskModel::new(
            DependentRelation::Or,
            vec![
                ConditionDependentItem::new(1, TaskExecutionStatus::Success),
                ConditionDependentItem::new(2, TaskExecutionStatus::Success),
            ],
        )],
    )
}

#[test]
fn test_or_group_with_failed_and_missing_task() {
    let evaluator = snapshot(&[(1, TaskExecutionStatus::Failure)]);

    assert_eq!(evaluator.evaluate(&either_succeeded()), DependResult::Failed);
}

#[test]
fn test_or_group_satisfied_by_one_item() {
    let evaluator = snapshot(&[(1, TaskExecutionStatus::Success)]);

    assert_eq!(evaluator.evaluate(&either_succeeded()), DependResult::Success);
}

#[test]
fn test_top_level_or_over_groups() {
    let evaluator = snapshot(&[
        (1, TaskExecutionStatus::Failure),
        (2, TaskExecutionStatus::Success),
    ]);

    let expression = ConditionDependency::new(
        DependentRelation::Or,
        vec![
            // group A fails
            DependentTaskModel::new(
                DependentRelation::And,
                vec![ConditionDependentItem::new(1, TaskExecutionStatus::Success)],
            ),
            // group B succeeds
            DependentTaskModel::new(
                DependentRelation::And,
                vec![ConditionDependentItem::new(2, TaskExecutionStatus::Success)],
            ),
        ],
    );

    assert_eq!(evaluator.evaluate(&expression), DependResult::Success);
}

#[test]
fn test_top_level_and_requires_every_group() {
    let evaluator = snapshot(&[
        (1, TaskExecutionStatus::Failure),
        (2, TaskExecutionStatus::Success),
    ]);

    let expression = ConditionDependency::new(
        DependentRelation::And,
        vec![
            DependentTaskModel::new(
                DependentRelation::And,
                vec![ConditionDependentItem::new(1, TaskExecutionStatus::Failure)],
            ),
            DependentTaskModel::new(
                DependentRelation::And,
                vec![ConditionDependentItem::new(2, TaskExecutionStatus::Failure)],
            ),
        ],
    );

    assert_eq!(evaluator.evaluate(&expression), DependResult::Failed);
}

#[test]
fn test_expecting_failure_matches_failed_task() {
    let evaluator = snapshot(&[(1, TaskExecutionStatus::Failure)]);

    let expression = ConditionDependency::new(
        DependentRelation::And,
        vec![DependentTaskModel::new(
            DependentRelation::And,
            vec![ConditionDependentItem::new(1, TaskExecutionStatus::Failure)],
        )],
    );

    assert_eq!(evaluator.evaluate(&expression), DependResult::Success);
}

#[test]
fn test_no_partial_status_matching() {
    // FORCED_SUCCESS is not SUCCESS
    let evaluator = snapshot(&[(1, TaskExecutionStatus::ForcedSuccess)]);

    assert_eq!(
        evaluator.evaluate_item(&ConditionDependentItem::new(1, TaskExecutionStatus::Success)),
        DependResult::Failed
    );
}

#[test]
fn test_evaluator_never_waits() {
    let evaluator = snapshot(&[(1, TaskExecutionStatus::RunningExecution)]);

    let result = evaluator.evaluate(&either_succeeded());
    assert_ne!(result, DependResult::Waiting);
    assert_eq!(result, DependResult::Failed);
}

#[test]
fn test_evaluation_from_wire_parameters() {
    let json = r#"{
        "dependence": {
            "relation": "OR",
            "dependTaskList": [
                { "relation": "AND", "dependItemList": [
                    { "depTaskCode": 1, "status": "SUCCESS" },
                    { "depTaskCode": 2, "status": "SUCCESS" }
                ]},
                { "relation": "AND", "dependItemList": [
                    { "depTaskCode": 3, "status": "KILL" }
                ]}
            ]
        },
        "conditionResult": { "conditionSuccess": false }
    }"#;
    let params: ConditionsParameters = serde_json::from_str(json).unwrap();

    let evaluator = snapshot(&[
        (1, TaskExecutionStatus::Success),
        (2, TaskExecutionStatus::Failure),
        (3, TaskExecutionStatus::Kill),
    ]);

    assert_eq!(evaluator.evaluate(&params.dependence), DependResult::Success);
}

#[test]
fn test_same_snapshot_same_result() {
    let evaluator = snapshot(&[
        (1, TaskExecutionStatus::Failure),
        (2, TaskExecutionStatus::Success),
    ]);
    let expression = either_succeeded();

    let results: Vec<DependResult> = (0..10).map(|_| evaluator.evaluate(&expression)).collect();
    assert!(results.iter().all(|r| *r == results[0]));
}
