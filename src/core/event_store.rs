//! Append-only lifecycle event log.
//!
//! One `events.jsonl` per workflow run, next to that run's task instance
//! log. Writes go through the same locked append as the store.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tokio::fs;

use crate::domain::Event;

use super::jsonl;

const EVENTS_FILE: &str = "events.jsonl";

/// Event log of one workflow run
pub struct EventStore {
    events_path: PathBuf,
}

impl EventStore {
    /// Open the log of a workflow run in the configured directory
    pub async fn open(workflow_instance_id: i64) -> Result<Self> {
        let base_dir = crate::config::workflows_dir()?;
        Self::open_in(&base_dir, workflow_instance_id).await
    }

    /// Open the log of a workflow run under `base_dir`
    pub async fn open_in(base_dir: &Path, workflow_instance_id: i64) -> Result<Self> {
        let workflow_dir = base_dir.join(workflow_instance_id.to_string());

        fs::create_dir_all(&workflow_dir)
            .await
            .with_context(|| format!("Failed to create workflow directory: {}", workflow_dir.display()))?;

        Ok(Self {
            events_path: workflow_dir.join(EVENTS_FILE),
        })
    }

    pub async fn append(&self, event: &Event) -> Result<()> {
        let json = serde_json::to_string(event).context("Failed to serialize event")?;

        jsonl::append_line(&self.events_path, json)
            .await
            .with_context(|| format!("Failed to append to {}", self.events_path.display()))
    }

    /// All events in append order
    pub async fn replay(&self) -> Result<Vec<Event>> {
        let lines = jsonl::read_lines(&self.events_path)
            .await
            .with_context(|| format!("Failed to read {}", self.events_path.display()))?;

        lines
            .iter()
            .map(|line| {
                serde_json::from_str(line).with_context(|| format!("Failed to parse event: {}", line))
            })
            .collect()
    }

    /// Events of one task instance, in append order
    pub async fn events_for_task(&self, task_instance_id: i64) -> Result<Vec<Event>> {
        let events = self.replay().await?;
        Ok(events
            .into_iter()
            .filter(|e| e.task_instance_id == task_instance_id)
            .collect())
    }

    /// Workflow instance ids with a directory under `base_dir`, ascending
    pub async fn list_workflows_in(base_dir: &Path) -> Result<Vec<i64>> {
        if !base_dir.exists() {
            return Ok(Vec::new());
        }

        let mut workflows = Vec::new();
        let mut entries = fs::read_dir(base_dir).await?;

        while let Some(entry) = entries.next_entry().await? {
            if !entry.file_type().await?.is_dir() {
                continue;
            }
            if let Some(id) = entry.file_name().to_str().and_then(|n| n.parse::<i64>().ok()) {
                workflows.push(id);
            }
        }

        workflows.sort_unstable();
        Ok(workflows)
    }

    /// Workflow instance ids in the configured directory
    pub async fn list_workflows() -> Result<Vec<i64>> {
        let base_dir = crate::config::workflows_dir()?;
        Self::list_workflows_in(&base_dir).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{EventType, TaskPhase};
    use tempfile::TempDir;

    fn event(task_instance_id: i64, event_type: EventType, phase: TaskPhase) -> Event {
        Event::new(1, task_instance_id, 100, event_type, format!("{:?}", event_type), phase)
    }

    #[tokio::test]
    async fn test_empty_log_replays_nothing() {
        let temp_dir = TempDir::new().unwrap();
        let store = EventStore::open_in(temp_dir.path(), 1).await.unwrap();

        assert!(store.replay().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_events_for_task() {
        let temp_dir = TempDir::new().unwrap();
        let store = EventStore::open_in(temp_dir.path(), 1).await.unwrap();

        store
            .append(&event(1, EventType::TaskRunning, TaskPhase::Running))
            .await
            .unwrap();
        store
            .append(&event(2, EventType::TaskRunning, TaskPhase::Running))
            .await
            .unwrap();
        store
            .append(&event(1, EventType::TaskSucceeded, TaskPhase::Success))
            .await
            .unwrap();

        let first: Vec<EventType> = store
            .events_for_task(1)
            .await
            .unwrap()
            .into_iter()
            .map(|e| e.event_type)
            .collect();
        assert_eq!(first, vec![EventType::TaskRunning, EventType::TaskSucceeded]);
        assert_eq!(store.events_for_task(2).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_corrupt_line_is_an_error() {
        let temp_dir = TempDir::new().unwrap();
        let store = EventStore::open_in(temp_dir.path(), 1).await.unwrap();
        std::fs::write(temp_dir.path().join("1").join(EVENTS_FILE), "{not json\n").unwrap();

        assert!(store.replay().await.is_err());
    }

    #[tokio::test]
    async fn test_list_workflows_ignores_non_numeric() {
        let temp_dir = TempDir::new().unwrap();
        EventStore::open_in(temp_dir.path(), 3).await.unwrap();
        EventStore::open_in(temp_dir.path(), 1).await.unwrap();
        std::fs::create_dir_all(temp_dir.path().join("scratch")).unwrap();

        let workflows = EventStore::list_workflows_in(temp_dir.path()).await.unwrap();
        assert_eq!(workflows, vec![1, 3]);
    }
}
