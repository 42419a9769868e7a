use serde::de::DeserializeOwned;
use serde::Serialize;
use sled::Db;
use std::path::PathBuf;
use tracing::debug;

use crate::agents::AgentSnapshot;
use crate::content::ExtractionResult;
use crate::error::Result;
use crate::tasks::ProcessingTask;

const EXTRACTION_PREFIX: &str = "extraction:";
const QUEUE_PREFIX: &str = "queue:";
const AGENT_PREFIX: &str = "agent:";

/// Embedded store for extraction results, task queues and agent stats.
/// Values are JSON; keys are `<kind>:<id>`.
pub struct PipelineStore {
    db: Db,
}

impl PipelineStore {
    pub fn open(db_path: impl Into<PathBuf>) -> Result<Self> {
        let db_path = db_path.into();
        debug!("Opening pipeline store at {}", db_path.display());
        let db = sled::open(db_path)?;
        Ok(Self { db })
    }

    fn put<T: Serialize>(&self, key: String, value: &T) -> Result<()> {
        let serialized = serde_json::to_vec(value)?;
        self.db.insert(key.as_bytes(), serialized)?;
        self.db.flush()?;
        Ok(())
    }

    fn get<T: DeserializeOwned>(&self, key: String) -> Result<Option<T>> {
        match self.db.get(key.as_bytes())? {
            Some(data) => Ok(Some(serde_json::from_slice(&data)?)),
            None => Ok(None),
        }
    }

    fn ids_with_prefix(&self, prefix: &str) -> Result<Vec<String>> {
        let mut ids = Vec::new();
        for entry in self.db.scan_prefix(prefix.as_bytes()) {
            let (key, _) = entry?;
            if let Ok(key_str) = std::str::from_utf8(&key) {
                if let Some(id) = key_str.strip_prefix(prefix) {
                    ids.push(id.to_string());
                }
            }
        }
        Ok(ids)
    }

    pub fn save_extraction(&self, result: &ExtractionResult) -> Result<()> {
        self.put(format!("{}{}", EXTRACTION_PREFIX, result.file_id), result)
    }

    pub fn load_extraction(&self, file_id: &str) -> Result<Option<ExtractionResult>> {
        self.get(format!("{}{}", EXTRACTION_PREFIX, file_id))
    }

    pub fn save_queue(&self, content_id: &str, tasks: &[ProcessingTask]) -> Result<()> {
        self.put(format!("{}{}", QUEUE_PREFIX, content_id), &tasks)
    }

    pub fn load_queue(&self, content_id: &str) -> Result<Option<Vec<ProcessingTask>>> {
        self.get(format!("{}{}", QUEUE_PREFIX, content_id))
    }

    /// Content ids with a stored queue, in key order.
    pub fn list_queues(&self) -> Result<Vec<String>> {
        self.ids_with_prefix(QUEUE_PREFIX)
    }

    pub fn save_agent(&self, snapshot: &AgentSnapshot) -> Result<()> {
        self.put(format!("{}{}", AGENT_PREFIX, snapshot.id), snapshot)
    }

    pub fn load_agents(&self) -> Result<Vec<AgentSnapshot>> {
        let mut snapshots = Vec::new();
        for entry in self.db.scan_prefix(AGENT_PREFIX.as_bytes()) {
            let (_, data) = entry?;
            snapshots.push(serde_json::from_slice(&data)?);
        }
        Ok(snapshots)
    }
}
