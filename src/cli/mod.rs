//! Command-line interface for condgate.
//!
//! Provides commands for evaluating condition parameters offline, recording
//! task instances, running condition tasks against the local store and
//! inspecting lifecycle events.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};

use crate::core::{
    build_task_instance_map, ConditionTask, DependencyEvaluator, EventLifecycle, EventStore,
    FileTaskInstanceStore, JsonParameterDeserializer, LogicTask, TaskExecutionContext,
    TaskInstanceStore, TaskParameterDeserializer, WorkflowExecutionGraph,
};
use crate::domain::{ConditionsParameters, TaskInstance, TestFlag};

/// condgate - Condition task evaluator for DAG workflow engines
#[derive(Parser, Debug)]
#[command(name = "condgate")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Evaluate condition parameters against a snapshot file (no side effects)
    Evaluate {
        /// Condition task parameters (JSON)
        #[arg(short, long)]
        params: PathBuf,

        /// Task instances (JSON array)
        #[arg(short, long)]
        snapshot: PathBuf,

        /// Evaluate against test-run instances
        #[arg(long)]
        test: bool,
    },

    /// Record a task instance (JSON) in its workflow run's store
    Record {
        /// Task instance file
        file: PathBuf,
    },

    /// List valid task instances of a workflow run
    Instances {
        /// Workflow instance ID
        workflow_instance_id: i64,

        /// Show test-run instances
        #[arg(long)]
        test: bool,
    },

    /// Run a recorded condition task to completion
    Run {
        /// Workflow instance ID
        workflow_instance_id: i64,

        /// Task instance ID of the condition task
        task_instance_id: i64,
    },

    /// Show the lifecycle event log of a workflow run
    Events {
        /// Workflow instance ID
        workflow_instance_id: i64,

        /// Only show events of this task instance
        #[arg(short, long)]
        task: Option<i64>,
    },

    /// List workflow runs with local state
    Workflows,

    /// Show resolved configuration (debug)
    Config,
}

impl Cli {
    /// Execute the CLI command
    pub async fn execute(self) -> Result<()> {
        match self.command {
            Commands::Evaluate {
                params,
                snapshot,
                test,
            } => evaluate(&params, &snapshot, TestFlag::from(test)),
            Commands::Record { file } => record_instance(&file).await,
            Commands::Instances {
                workflow_instance_id,
                test,
            } => list_instances(workflow_instance_id, TestFlag::from(test)).await,
            Commands::Run {
                workflow_instance_id,
                task_instance_id,
            } => run_condition_task(workflow_instance_id, task_instance_id).await,
            Commands::Events {
                workflow_instance_id,
                task,
            } => show_events(workflow_instance_id, task).await,
            Commands::Workflows => list_workflows().await,
            Commands::Config => show_config(),
        }
    }
}

fn read_file(path: &Path) -> Result<String> {
    std::fs::read_to_string(path).with_context(|| format!("Failed to read file: {}", path.display()))
}

/// Evaluate parameters against a snapshot without touching any store
fn evaluate(params_path: &Path, snapshot_path: &Path, test_flag: TestFlag) -> Result<()> {
    let params = JsonParameterDeserializer::<ConditionsParameters>::new()
        .deserialize(&read_file(params_path)?)
        .with_context(|| format!("Invalid condition parameters: {}", params_path.display()))?;

    let instances: Vec<TaskInstance> = serde_json::from_str(&read_file(snapshot_path)?)
        .with_context(|| format!("Invalid task instance snapshot: {}", snapshot_path.display()))?;

    let valid = instances
        .into_iter()
        .filter(|instance| instance.is_valid_for(test_flag))
        .collect();
    let evaluator = DependencyEvaluator::new(build_task_instance_map(valid));
    let result = evaluator.evaluate(&params.dependence);

    let mut outcome = params.condition_result.clone();
    outcome.condition_success = result == crate::core::DependResult::Success;

    println!("Result: {}", result);
    println!("Next branch: {:?}", outcome.next_branch());

    Ok(())
}

/// Append a task instance version to the local store
async fn record_instance(path: &Path) -> Result<()> {
    let instance: TaskInstance = serde_json::from_str(&read_file(path)?)
        .with_context(|| format!("Invalid task instance: {}", path.display()))?;

    let store = FileTaskInstanceStore::open_default().await?;
    store.upsert(&instance).await?;

    println!(
        "Recorded task instance {} (task code {}) in workflow {}",
        instance.id, instance.task_code, instance.workflow_instance_id
    );

    Ok(())
}

/// List valid instances of a workflow run
async fn list_instances(workflow_instance_id: i64, test_flag: TestFlag) -> Result<()> {
    let store = FileTaskInstanceStore::open_default().await?;
    let instances = store
        .query_valid_task_instances(workflow_instance_id, test_flag)
        .await?;

    if instances.is_empty() {
        println!("No valid task instances for workflow {}", workflow_instance_id);
        return Ok(());
    }

    println!("{:<8} {:<12} {:<24} {:<22} {}", "ID", "CODE", "NAME", "STATE", "ATTEMPT");
    for instance in instances {
        println!(
            "{:<8} {:<12} {:<24} {:<22} {}",
            instance.id, instance.task_code, instance.name, instance.state, instance.retry_times
        );
    }

    Ok(())
}

/// Run a condition task stored in the local store
async fn run_condition_task(workflow_instance_id: i64, task_instance_id: i64) -> Result<()> {
    let store = Arc::new(FileTaskInstanceStore::open_default().await?);

    let graph = WorkflowExecutionGraph::from_instances(
        store.replay(workflow_instance_id).await?.into_values(),
    );
    let task_instance = store
        .find_task_instance(workflow_instance_id, task_instance_id)
        .await?
        .with_context(|| {
            format!(
                "Task instance {} not found in workflow {}",
                task_instance_id, workflow_instance_id
            )
        })?;

    let lifecycle = Arc::new(EventLifecycle::new(store.root().to_path_buf(), store.clone()));
    let mut task = ConditionTask::new(
        &graph,
        TaskExecutionContext::for_instance(&task_instance),
        store,
        lifecycle,
    )
    .await?;

    let result = task.start().await?;

    println!("Condition result: {}", result);
    println!("Condition success: {}", task.condition_success());
    println!(
        "Next branch: {:?}",
        task.parameters().condition_result.next_branch()
    );

    Ok(())
}

/// Print the event log of a workflow run
async fn show_events(workflow_instance_id: i64, task_instance_id: Option<i64>) -> Result<()> {
    let store = EventStore::open(workflow_instance_id).await?;
    let events = match task_instance_id {
        Some(id) => store.events_for_task(id).await?,
        None => store.replay().await?,
    };

    if events.is_empty() {
        println!("No events for workflow {}", workflow_instance_id);
        return Ok(());
    }

    for event in events {
        println!(
            "{} task={} {:?} {:?} {}",
            event.timestamp.format("%Y-%m-%d %H:%M:%S"),
            event.task_instance_id,
            event.event_type,
            event.phase,
            event.payload_summary
        );
    }

    Ok(())
}

/// List workflow runs with local state
async fn list_workflows() -> Result<()> {
    let workflows = EventStore::list_workflows().await?;

    if workflows.is_empty() {
        println!("No workflow runs found");
        return Ok(());
    }

    for id in workflows {
        println!("{}", id);
    }

    Ok(())
}

/// Show resolved configuration
fn show_config() -> Result<()> {
    let cfg = crate::config::config()?;

    println!("condgate configuration");
    println!();
    println!(
        "Config file: {}",
        cfg.config_file
            .as_ref()
            .map(|p| p.display().to_string())
            .unwrap_or_else(|| "(none - using defaults)".to_string())
    );
    println!("Home:        {}", cfg.home.display());
    println!("Workflows:   {}", cfg.workflows_dir().display());
    println!("Log level:   {}", cfg.log_level);

    Ok(())
}
