pub mod base;
pub mod coordinator;
pub mod reader;

pub use base::{
    fingerprint, AgentDescriptor, AgentLease, AgentPerformance, AgentPool, AgentSnapshot,
    AgentStatus, AgentTier,
};
pub use coordinator::{StrategyFailure, TaskCreationCoordinator, TaskCreationReport};
pub use reader::ContentReadingCoordinator;
