use futures_util::future::join_all;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

use super::base::{AgentDescriptor, AgentPool, AgentTier};
use crate::capabilities::{extension_of, CapabilityRegistry};
use crate::config::ReadingConfig;
use crate::content::{
    assess_quality, chunk_content, detect_structure, ChunkType, ExtractionMetadata,
    ExtractionResult, FileDescriptor,
};
use crate::error::{PipelineError, Result};
use crate::strategies::reading::{RawContent, ReadingStrategySet};
use crate::tools::FileAccess;

/// Content-reading tier: resolves each file's capability, picks a reading
/// strategy, extracts, chunks and scores the content.
pub struct ContentReadingCoordinator {
    pool: AgentPool,
    capabilities: Arc<CapabilityRegistry>,
    strategies: ReadingStrategySet,
    files: FileAccess,
    concurrency_limit: usize,
    chunk_size: usize,
}

impl ContentReadingCoordinator {
    pub fn new(
        capabilities: Arc<CapabilityRegistry>,
        strategies: ReadingStrategySet,
        files: FileAccess,
        config: &ReadingConfig,
    ) -> Result<Self> {
        strategies.validate(&capabilities)?;
        // reads wait for an idle agent
        if config.agents == 0 {
            return Err(PipelineError::invalid_config(
                "reading.agents",
                "must be at least 1",
            ));
        }

        let file_types: Vec<String> = capabilities
            .capabilities()
            .iter()
            .map(|c| c.file_type.clone())
            .collect();
        let agents = (1..=config.agents)
            .map(|i| {
                AgentDescriptor::new(
                    format!("reader-{}", i),
                    AgentTier::ContentReading,
                    file_types.clone(),
                )
            })
            .collect();

        Ok(Self {
            pool: AgentPool::new(AgentTier::ContentReading, agents)?,
            capabilities,
            strategies,
            files,
            concurrency_limit: config.concurrency_limit.max(1),
            chunk_size: config.chunk_size,
        })
    }

    pub fn pool(&self) -> &AgentPool {
        &self.pool
    }

    /// One result per input file, in input order.
    pub async fn read_content(&self, files: &[FileDescriptor]) -> Vec<ExtractionResult> {
        let mut results = Vec::with_capacity(files.len());

        for (batch_idx, batch) in files.chunks(self.concurrency_limit).enumerate() {
            info!(batch = batch_idx, files = batch.len(), "Reading batch");
            let batch_results = join_all(batch.iter().map(|file| self.read_file(file))).await;
            results.extend(batch_results);
        }

        let failed = results.iter().filter(|r| !r.is_success()).count();
        info!(
            total = results.len(),
            failed = failed,
            "Content reading finished"
        );
        results
    }

    pub async fn read_file(&self, file: &FileDescriptor) -> ExtractionResult {
        let started = Instant::now();

        let Some(capability) = self.capabilities.resolve_path(&file.path) else {
            let err = PipelineError::UnsupportedFileType {
                extension: extension_of(&file.path).unwrap_or_else(|| "<none>".to_string()),
            };
            warn!(file = %file.path, "{}", err);
            return ExtractionResult::failure(file, "unknown", err.to_string(), elapsed_ms(started));
        };

        if file.size > capability.max_size {
            let err = PipelineError::SizeExceeded {
                size: file.size,
                limit: capability.max_size,
            };
            warn!(file = %file.path, "{}", err);
            return ExtractionResult::failure(
                file,
                capability.file_type.clone(),
                err.to_string(),
                elapsed_ms(started),
            );
        }

        let strategy = self.strategies.select(file, capability);
        let lease = self.pool.acquire().await;
        debug!(
            file = %file.path,
            strategy = %strategy.name,
            agent = %lease.agent_id(),
            "Reading file"
        );

        let outcome = strategy.reader.read(file, &self.files).await;
        let elapsed = started.elapsed().as_secs_f64() * 1000.0;
        lease.record(outcome.is_ok(), elapsed);

        match outcome {
            Ok(raw) => {
                let mut result = self.build_result(file, &capability.file_type, &strategy.name, raw);
                result.metadata.extraction_time = elapsed_ms(started);
                result.metadata.agent_id = Some(lease.agent_id().to_string());
                result
            }
            Err(e) => {
                warn!(file = %file.path, strategy = %strategy.name, "Extraction failed: {}", e);
                let mut result = ExtractionResult::failure(
                    file,
                    capability.file_type.clone(),
                    e.to_string(),
                    elapsed_ms(started),
                );
                result.metadata.agent_id = Some(lease.agent_id().to_string());
                result
            }
        }
    }

    fn build_result(
        &self,
        file: &FileDescriptor,
        file_type: &str,
        method: &str,
        raw: RawContent,
    ) -> ExtractionResult {
        let chunks = chunk_content(&file.id, &raw.content, self.chunk_size, &raw.encoding);
        let is_text = chunks.iter().all(|c| c.chunk_type == ChunkType::Text);
        let quality = assess_quality(&raw.content, is_text);
        let structure = detect_structure(&raw.content);

        ExtractionResult {
            file_id: file.id.clone(),
            path: file.path.clone(),
            metadata: ExtractionMetadata {
                file_size: file.size,
                file_type: file_type.to_string(),
                encoding: raw.encoding,
                extraction_method: method.to_string(),
                extraction_time: 0,
                content_length: raw.content.len(),
                agent_id: None,
                quality,
                structure,
            },
            content: raw.content,
            chunks,
            errors: Vec::new(),
        }
    }
}

fn elapsed_ms(started: Instant) -> u64 {
    started.elapsed().as_millis() as u64
}
