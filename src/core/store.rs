//! Task instance persistence.
//!
//! `TaskInstanceStore` is the seam the condition task reads its dependency
//! snapshot through. `FileTaskInstanceStore` implements it with the same
//! append-only JSONL approach as the event log: every write appends a full
//! version of a record, and the current state is the last version per id.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use anyhow::Result;
use async_trait::async_trait;
use chrono::Utc;
use thiserror::Error;
use tokio::fs;
use tracing::debug;

use crate::domain::{TaskInstance, TestFlag};

use super::jsonl;

const TASK_INSTANCES_FILE: &str = "task_instances.jsonl";

/// Errors raised by task instance stores
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Task instance not found: {0}")]
    NotFound(i64),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Read/write access to persisted task instances
#[async_trait]
pub trait TaskInstanceStore: Send + Sync {
    /// All valid instances of a workflow run in the given mode, ordered by id
    async fn query_valid_task_instances(
        &self,
        workflow_instance_id: i64,
        test_flag: TestFlag,
    ) -> Result<Vec<TaskInstance>, StoreError>;

    /// Latest version of one instance, valid or not
    async fn find_task_instance(
        &self,
        workflow_instance_id: i64,
        task_instance_id: i64,
    ) -> Result<Option<TaskInstance>, StoreError>;

    /// Record a new version of an instance
    async fn upsert(&self, task_instance: &TaskInstance) -> Result<(), StoreError>;

    /// Persist the parameter blob held by `task_instance`
    async fn update_task_params(&self, task_instance: &TaskInstance) -> Result<(), StoreError> {
        let mut current = self
            .find_task_instance(task_instance.workflow_instance_id, task_instance.id)
            .await?
            .ok_or(StoreError::NotFound(task_instance.id))?;
        current.task_params = task_instance.task_params.clone();
        self.upsert(&current).await
    }
}

/// JSONL-backed store, one file per workflow run
pub struct FileTaskInstanceStore {
    /// Directory holding one subdirectory per workflow run
    root: PathBuf,
}

impl FileTaskInstanceStore {
    /// Create a store rooted at `root`
    pub fn new(root: PathBuf) -> Self {
        Self { root }
    }

    /// Open the store in the configured workflows directory
    pub async fn open_default() -> Result<Self> {
        let root = crate::config::workflows_dir()?;
        fs::create_dir_all(&root).await?;
        Ok(Self::new(root))
    }

    /// Root directory of this store
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Path of the JSONL file for a workflow run
    pub fn instances_path(&self, workflow_instance_id: i64) -> PathBuf {
        self.root
            .join(workflow_instance_id.to_string())
            .join(TASK_INSTANCES_FILE)
    }

    /// Replay the log of a workflow run into the latest version per id
    pub async fn replay(
        &self,
        workflow_instance_id: i64,
    ) -> Result<HashMap<i64, TaskInstance>, StoreError> {
        let mut instances = HashMap::new();

        for line in jsonl::read_lines(&self.instances_path(workflow_instance_id)).await? {
            let instance: TaskInstance = serde_json::from_str(&line)?;
            instances.insert(instance.id, instance);
        }

        Ok(instances)
    }
}

#[async_trait]
impl TaskInstanceStore for FileTaskInstanceStore {
    async fn query_valid_task_instances(
        &self,
        workflow_instance_id: i64,
        test_flag: TestFlag,
    ) -> Result<Vec<TaskInstance>, StoreError> {
        let instances = self.replay(workflow_instance_id).await?;

        let mut valid: Vec<TaskInstance> = instances
            .into_values()
            .filter(|instance| instance.is_valid_for(test_flag))
            .collect();
        valid.sort_by_key(|instance| instance.id);

        debug!(
            workflow_instance_id,
            ?test_flag,
            count = valid.len(),
            "Queried valid task instances"
        );

        Ok(valid)
    }

    async fn find_task_instance(
        &self,
        workflow_instance_id: i64,
        task_instance_id: i64,
    ) -> Result<Option<TaskInstance>, StoreError> {
        let mut instances = self.replay(workflow_instance_id).await?;
        Ok(instances.remove(&task_instance_id))
    }

    async fn upsert(&self, task_instance: &TaskInstance) -> Result<(), StoreError> {
        let path = self.instances_path(task_instance.workflow_instance_id);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await?;
        }

        let mut version = task_instance.clone();
        version.updated_at = Utc::now();
        let json = serde_json::to_string(&version)?;

        jsonl::append_line(&path, json).await?;
        Ok(())
    }
}
