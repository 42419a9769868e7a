//! Pipeline configuration
//!
//! Loaded from a TOML file; every field has a default so an empty file (or no
//! file) yields the stock pipeline.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::capabilities::Capability;
use crate::error::{PipelineError, Result};
use crate::strategies::tasks::{
    TaskStrategySet, ENTITY_STRATEGY, KEYWORD_STRATEGY, SENTIMENT_STRATEGY, STRUCTURE_STRATEGY,
    TOPIC_STRATEGY,
};

/// Smallest chunk size that still fits any UTF-8 character.
pub const MIN_CHUNK_SIZE: usize = 4;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PipelineConfig {
    #[serde(default)]
    pub reading: ReadingConfig,
    #[serde(default)]
    pub task_creation: TaskCreationConfig,
    #[serde(default)]
    pub store: StoreConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReadingConfig {
    /// Files processed per batch
    #[serde(default = "default_concurrency_limit")]
    pub concurrency_limit: usize,
    /// Chunk size in bytes
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,
    /// Number of content-reading agents
    #[serde(default = "default_reading_agents")]
    pub agents: usize,
    /// Directory relative descriptor paths are resolved against
    #[serde(default = "default_base_path")]
    pub base_path: PathBuf,
    /// Extra capability descriptors, applied after the built-ins
    #[serde(default)]
    pub capabilities: Vec<Capability>,
}

fn default_concurrency_limit() -> usize {
    100
}

fn default_chunk_size() -> usize {
    1024 * 1024
}

fn default_reading_agents() -> usize {
    4
}

fn default_base_path() -> PathBuf {
    PathBuf::from(".")
}

impl Default for ReadingConfig {
    fn default() -> Self {
        Self {
            concurrency_limit: default_concurrency_limit(),
            chunk_size: default_chunk_size(),
            agents: default_reading_agents(),
            base_path: default_base_path(),
            capabilities: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskAgentConfig {
    pub name: String,
    /// Names of the task strategies the agent owns
    pub strategies: Vec<String>,
}

impl TaskAgentConfig {
    fn new(name: &str, strategies: &[&str]) -> Self {
        Self {
            name: name.to_string(),
            strategies: strategies.iter().map(|s| s.to_string()).collect(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskCreationConfig {
    #[serde(default = "default_quality_threshold")]
    pub quality_threshold: f64,
    /// Agents in registration order; ties in routing go to the earlier one
    #[serde(default = "default_task_agents")]
    pub agents: Vec<TaskAgentConfig>,
}

fn default_quality_threshold() -> f64 {
    0.7
}

/// One specialist per analysis type, then a generalist owning everything.
fn default_task_agents() -> Vec<TaskAgentConfig> {
    vec![
        TaskAgentConfig::new("sentiment-specialist", &[SENTIMENT_STRATEGY]),
        TaskAgentConfig::new("entity-specialist", &[ENTITY_STRATEGY]),
        TaskAgentConfig::new("topic-specialist", &[TOPIC_STRATEGY]),
        TaskAgentConfig::new("keyword-specialist", &[KEYWORD_STRATEGY]),
        TaskAgentConfig::new("structure-specialist", &[STRUCTURE_STRATEGY]),
        TaskAgentConfig::new(
            "generalist",
            &[
                SENTIMENT_STRATEGY,
                ENTITY_STRATEGY,
                TOPIC_STRATEGY,
                KEYWORD_STRATEGY,
                STRUCTURE_STRATEGY,
            ],
        ),
    ]
}

impl Default for TaskCreationConfig {
    fn default() -> Self {
        Self {
            quality_threshold: default_quality_threshold(),
            agents: default_task_agents(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    #[serde(default = "default_store_enabled")]
    pub enabled: bool,
    #[serde(default = "default_store_path")]
    pub path: PathBuf,
}

fn default_store_enabled() -> bool {
    true
}

fn default_store_path() -> PathBuf {
    let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
    PathBuf::from(home).join(".tierflow").join("pipeline.db")
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            enabled: default_store_enabled(),
            path: default_store_path(),
        }
    }
}

impl PipelineConfig {
    pub fn from_toml(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| PipelineError::invalid_config("toml", e.to_string()))
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())?;
        Self::from_toml(&content)
    }

    pub fn validate(&self, strategies: &TaskStrategySet) -> Result<()> {
        if self.reading.concurrency_limit == 0 {
            return Err(PipelineError::invalid_config(
                "reading.concurrency_limit",
                "must be at least 1",
            ));
        }
        if self.reading.chunk_size < MIN_CHUNK_SIZE {
            return Err(PipelineError::invalid_config(
                "reading.chunk_size",
                format!("must be at least {} bytes", MIN_CHUNK_SIZE),
            ));
        }
        if self.reading.agents == 0 {
            return Err(PipelineError::invalid_config(
                "reading.agents",
                "must be at least 1",
            ));
        }
        if !(0.0..=1.0).contains(&self.task_creation.quality_threshold) {
            return Err(PipelineError::invalid_config(
                "task_creation.quality_threshold",
                "must be within [0, 1]",
            ));
        }
        for agent in &self.task_creation.agents {
            for name in &agent.strategies {
                if strategies.get(name).is_none() {
                    return Err(PipelineError::invalid_config(
                        "task_creation.agents",
                        format!("agent '{}' owns unknown strategy '{}'", agent.name, name),
                    ));
                }
            }
        }
        Ok(())
    }
}
