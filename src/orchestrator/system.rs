use std::sync::Arc;
use tracing::{debug, info};

use crate::agents::{
    AgentDescriptor, AgentSnapshot, ContentReadingCoordinator, TaskCreationCoordinator,
    TaskCreationReport,
};
use crate::analysis::{ContentAnalysis, ContentClassification};
use crate::capabilities::{Capability, CapabilityRegistry};
use crate::config::PipelineConfig;
use crate::content::{ExtractionResult, FileDescriptor};
use crate::error::Result;
use crate::store::PipelineStore;
use crate::strategies::{ReadingStrategySet, TaskStrategySet};
use crate::tasks::ProcessingTask;
use crate::tools::FileAccess;

/// Both pipeline tiers plus the optional store behind one entry point.
pub struct PipelineSystem {
    registry: Arc<CapabilityRegistry>,
    reader: ContentReadingCoordinator,
    task_creator: TaskCreationCoordinator,
    files: FileAccess,
    store: Option<PipelineStore>,
}

impl PipelineSystem {
    pub fn new(config: PipelineConfig) -> Result<Self> {
        let task_strategies = TaskStrategySet::builtin();
        config.validate(&task_strategies)?;

        let registry = Arc::new(CapabilityRegistry::with_builtins(
            config.reading.capabilities.clone(),
        )?);
        let files = FileAccess::new(config.reading.base_path.clone());

        let reader = ContentReadingCoordinator::new(
            registry.clone(),
            ReadingStrategySet::builtin(),
            files.clone(),
            &config.reading,
        )?;
        let task_creator = TaskCreationCoordinator::new(task_strategies, &config.task_creation)?;

        let store = if config.store.enabled {
            Some(PipelineStore::open(config.store.path.clone())?)
        } else {
            None
        };

        let system = Self {
            registry,
            reader,
            task_creator,
            files,
            store,
        };
        system.restore_agents()?;

        info!(
            capabilities = system.registry.capabilities().len(),
            reading_agents = system.reader.pool().len(),
            task_agents = system.task_creator.pool().len(),
            store = system.store.is_some(),
            "Pipeline initialized"
        );
        Ok(system)
    }

    fn restore_agents(&self) -> Result<()> {
        if let Some(store) = &self.store {
            let snapshots = store.load_agents()?;
            debug!("Restoring {} agent snapshots", snapshots.len());
            self.reader.pool().restore(&snapshots);
            self.task_creator.pool().restore(&snapshots);
        }
        Ok(())
    }

    /// Write every agent's stats to the store. No-op without a store.
    pub fn persist_agents(&self) -> Result<()> {
        if let Some(store) = &self.store {
            for agent in self.agents() {
                store.save_agent(&AgentSnapshot::from(&agent))?;
            }
        }
        Ok(())
    }

    /// Walk `paths` (files or directories) and read everything found.
    pub async fn read_paths(&self, paths: &[String]) -> Result<Vec<ExtractionResult>> {
        let descriptors = self.files.collect_descriptors(paths).await?;
        info!("Collected {} files", descriptors.len());
        self.read_files(&descriptors).await
    }

    pub async fn read_files(&self, files: &[FileDescriptor]) -> Result<Vec<ExtractionResult>> {
        let results = self.reader.read_content(files).await;

        if let Some(store) = &self.store {
            for result in &results {
                store.save_extraction(result)?;
            }
        }
        self.persist_agents()?;
        Ok(results)
    }

    /// Build and store the task queue for `content_id`.
    pub async fn create_tasks(
        &self,
        analyses: &[ContentAnalysis],
        classification: &ContentClassification,
        content_id: &str,
    ) -> Result<TaskCreationReport> {
        let report = self
            .task_creator
            .create_tasks_with_report(analyses, classification, content_id)
            .await;

        if let Some(store) = &self.store {
            store.save_queue(content_id, &report.tasks)?;
        }
        self.persist_agents()?;
        Ok(report)
    }

    pub fn stored_extraction(&self, file_id: &str) -> Result<Option<ExtractionResult>> {
        match &self.store {
            Some(store) => store.load_extraction(file_id),
            None => Ok(None),
        }
    }

    pub fn stored_queue(&self, content_id: &str) -> Result<Option<Vec<ProcessingTask>>> {
        match &self.store {
            Some(store) => store.load_queue(content_id),
            None => Ok(None),
        }
    }

    pub fn stored_queues(&self) -> Result<Vec<String>> {
        match &self.store {
            Some(store) => store.list_queues(),
            None => Ok(Vec::new()),
        }
    }

    /// Reading agents first, then task-creation agents, each in registration order.
    pub fn agents(&self) -> Vec<AgentDescriptor> {
        let mut agents = self.reader.pool().snapshot();
        agents.extend(self.task_creator.pool().snapshot());
        agents
    }

    pub fn capabilities(&self) -> &[Capability] {
        self.registry.capabilities()
    }
}
