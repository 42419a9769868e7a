//! Downstream processing tasks
//!
//! Tasks are produced by the task-creation tier and handed to an external
//! executor, which owns timeouts, status advancement and dependency
//! resolution.

pub mod builder;
pub mod queue;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{PipelineError, Result};

pub use builder::TaskContext;
pub use queue::{compute_priority, estimate_complexity, sort_task_queue};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskType {
    Extraction,
    Transformation,
    Validation,
    Synthesis,
    Summarization,
    Classification,
    Analysis,
    Enrichment,
}

impl TaskType {
    /// Nominal duration before complexity scaling.
    pub fn base_duration_ms(&self) -> u64 {
        match self {
            TaskType::Extraction => 2_000,
            TaskType::Transformation => 3_000,
            TaskType::Validation => 1_000,
            TaskType::Synthesis => 5_000,
            TaskType::Summarization => 4_000,
            TaskType::Classification => 1_500,
            TaskType::Analysis => 3_000,
            TaskType::Enrichment => 2_500,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    Pending,
    Assigned,
    InProgress,
    Completed,
    Failed,
    Cancelled,
}

impl TaskStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            TaskStatus::Completed | TaskStatus::Failed | TaskStatus::Cancelled
        )
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskParameters {
    pub input: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expected_output: Option<String>,
    #[serde(default)]
    pub options: Map<String, Value>,
    pub quality_threshold: f64,
    pub timeout_ms: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskMetadata {
    pub source: String,
    pub confidence: f64,
    pub complexity: f64,
    pub estimated_duration_ms: u64,
    pub required_capabilities: Vec<String>,
    pub tags: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessingTask {
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub task_type: TaskType,
    pub priority: u8,
    pub status: TaskStatus,
    pub content_id: String,
    pub parameters: TaskParameters,
    /// Ids of tasks that must complete first. Built-in strategies leave it empty.
    #[serde(default)]
    pub dependencies: Vec<String>,
    pub metadata: TaskMetadata,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ProcessingTask {
    /// Move to `next`, refusing to leave a terminal state.
    pub fn transition(&mut self, next: TaskStatus) -> Result<()> {
        if self.status.is_terminal() && self.status != next {
            return Err(PipelineError::InvalidTransition {
                from: format!("{:?}", self.status),
                to: format!("{:?}", next),
            });
        }
        self.status = next;
        self.updated_at = Utc::now();
        Ok(())
    }
}
