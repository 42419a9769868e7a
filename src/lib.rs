//! Two-tier content pipeline.
//!
//! The content-reading tier turns file descriptors into chunked, scored
//! [`ExtractionResult`](content::ExtractionResult)s. The task-creation tier
//! turns externally produced analyses into an ordered queue of
//! [`ProcessingTask`](tasks::ProcessingTask)s. Both tiers route work through
//! pools of agents whose performance is tracked with moving averages.

pub mod agents;
pub mod analysis;
pub mod capabilities;
pub mod config;
pub mod content;
pub mod error;
pub mod orchestrator;
pub mod store;
pub mod strategies;
pub mod tasks;
pub mod tools;

pub use config::PipelineConfig;
pub use error::{PipelineError, Result};
pub use orchestrator::PipelineSystem;
