use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::f64::consts::TAU;
use std::sync::{Mutex, MutexGuard, PoisonError};
use tokio::sync::Notify;
use tracing::debug;

use crate::error::{PipelineError, Result};

/// Length of every agent fingerprint vector.
pub const FINGERPRINT_DIM: usize = 1024;

const EMA_WEIGHT: f64 = 0.1;
const SUCCESS_QUALITY: f64 = 0.9;
const FAILURE_QUALITY: f64 = 0.3;

/// Pipeline stage an agent belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AgentTier {
    ContentReading,
    TaskCreation,
}

impl AgentTier {
    pub fn as_str(&self) -> &'static str {
        match self {
            AgentTier::ContentReading => "content_reading",
            AgentTier::TaskCreation => "task_creation",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AgentStatus {
    Idle,
    Busy,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AgentPerformance {
    pub success_rate: f64,
    pub quality_score: f64,
    pub avg_processing_time_ms: f64,
    pub last_updated: DateTime<Utc>,
}

impl Default for AgentPerformance {
    fn default() -> Self {
        Self {
            success_rate: 1.0,
            quality_score: 0.8,
            avg_processing_time_ms: 0.0,
            last_updated: Utc::now(),
        }
    }
}

impl AgentPerformance {
    /// Fold one unit of work into the moving averages.
    pub fn record(&mut self, success: bool, elapsed_ms: f64) {
        let outcome = if success { 1.0 } else { 0.0 };
        let quality = if success {
            SUCCESS_QUALITY
        } else {
            FAILURE_QUALITY
        };

        self.success_rate = ema(self.success_rate, outcome).clamp(0.0, 1.0);
        self.quality_score = ema(self.quality_score, quality).clamp(0.0, 1.0);
        self.avg_processing_time_ms = ema(self.avg_processing_time_ms, elapsed_ms.max(0.0));
        self.last_updated = Utc::now();
    }
}

fn ema(current: f64, sample: f64) -> f64 {
    current * (1.0 - EMA_WEIGHT) + sample * EMA_WEIGHT
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AgentDescriptor {
    pub id: String,
    pub name: String,
    pub tier: AgentTier,
    pub specializations: Vec<String>,
    /// Descriptive only; routing ranks agents by `performance.quality_score`.
    #[serde(skip)]
    pub fingerprint: Vec<f64>,
    pub performance: AgentPerformance,
    pub status: AgentStatus,
    pub processed_count: u64,
}

impl AgentDescriptor {
    pub fn new(name: impl Into<String>, tier: AgentTier, specializations: Vec<String>) -> Self {
        let name = name.into();
        let fingerprint = if specializations.is_empty() {
            fingerprint(&[tier.as_str().to_string()])
        } else {
            fingerprint(&specializations)
        };

        Self {
            id: format!("{}:{}", tier.as_str(), name),
            name,
            tier,
            specializations,
            fingerprint,
            performance: AgentPerformance::default(),
            status: AgentStatus::Idle,
            processed_count: 0,
        }
    }

    pub fn update_performance(&mut self, success: bool, elapsed_ms: f64) {
        self.performance.record(success, elapsed_ms);
        self.processed_count += 1;
    }
}

/// Persisted subset of an agent's state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AgentSnapshot {
    pub id: String,
    pub performance: AgentPerformance,
    pub processed_count: u64,
}

impl From<&AgentDescriptor> for AgentSnapshot {
    fn from(agent: &AgentDescriptor) -> Self {
        Self {
            id: agent.id.clone(),
            performance: agent.performance.clone(),
            processed_count: agent.processed_count,
        }
    }
}

/// Unit-norm descriptor derived from specialization tags.
///
/// Each tag's SHA-256 digest seeds a phase and frequency; the per-tag
/// sinusoids are summed and L2-normalized.
pub fn fingerprint(tags: &[String]) -> Vec<f64> {
    let mut vector = vec![0.0; FINGERPRINT_DIM];

    for tag in tags {
        let digest = Sha256::digest(tag.as_bytes());
        let mut seed_bytes = [0u8; 8];
        seed_bytes.copy_from_slice(&digest[..8]);
        let seed = u64::from_le_bytes(seed_bytes);

        let phase = (seed % 10_000) as f64 / 10_000.0 * TAU;
        let frequency = 1.0 + ((seed >> 16) % 64) as f64;

        for (i, v) in vector.iter_mut().enumerate() {
            let t = i as f64 / FINGERPRINT_DIM as f64;
            *v += (frequency * t * TAU + phase).sin();
        }
    }

    let norm = vector.iter().map(|v| v * v).sum::<f64>().sqrt();
    if norm < 1e-12 {
        let uniform = 1.0 / (FINGERPRINT_DIM as f64).sqrt();
        return vec![uniform; FINGERPRINT_DIM];
    }
    vector.iter().map(|v| v / norm).collect()
}

/// Arena of agents for one tier, indexed by registration order.
///
/// An agent is handed out through an [`AgentLease`]; while the lease lives the
/// agent is `Busy` and no other caller can reserve it.
pub struct AgentPool {
    tier: AgentTier,
    agents: Mutex<Vec<AgentDescriptor>>,
    index: HashMap<String, usize>,
    released: Notify,
}

impl AgentPool {
    pub fn new(tier: AgentTier, agents: Vec<AgentDescriptor>) -> Result<Self> {
        let mut index = HashMap::new();

        for (idx, agent) in agents.iter().enumerate() {
            if agent.tier != tier {
                return Err(PipelineError::InvalidRegistry(format!(
                    "agent '{}' belongs to tier {} not {}",
                    agent.id,
                    agent.tier.as_str(),
                    tier.as_str()
                )));
            }
            if index.insert(agent.id.clone(), idx).is_some() {
                return Err(PipelineError::InvalidRegistry(format!(
                    "agent '{}' registered twice",
                    agent.id
                )));
            }
        }

        Ok(Self {
            tier,
            agents: Mutex::new(agents),
            index,
            released: Notify::new(),
        })
    }

    fn lock(&self) -> MutexGuard<'_, Vec<AgentDescriptor>> {
        self.agents.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn tier(&self) -> AgentTier {
        self.tier
    }

    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    pub fn get(&self, id: &str) -> Option<AgentDescriptor> {
        let idx = *self.index.get(id)?;
        Some(self.lock()[idx].clone())
    }

    /// All agents in registration order.
    pub fn snapshot(&self) -> Vec<AgentDescriptor> {
        self.lock().clone()
    }

    /// Reserve the idle agent with the highest quality score among those
    /// accepted by `eligible`. Ties go to the earliest registered agent.
    pub fn try_acquire<F>(&self, eligible: F) -> Option<AgentLease<'_>>
    where
        F: Fn(&AgentDescriptor) -> bool,
    {
        let mut agents = self.lock();

        let mut best: Option<usize> = None;
        for (idx, agent) in agents.iter().enumerate() {
            if agent.status != AgentStatus::Idle || !eligible(agent) {
                continue;
            }
            match best {
                Some(b)
                    if agents[b].performance.quality_score
                        >= agent.performance.quality_score => {}
                _ => best = Some(idx),
            }
        }

        let idx = best?;
        agents[idx].status = AgentStatus::Busy;
        let id = agents[idx].id.clone();
        debug!(agent = %id, tier = self.tier.as_str(), "Agent reserved");

        Some(AgentLease {
            pool: self,
            index: idx,
            id,
        })
    }

    /// Wait until any agent of the pool is idle and reserve it.
    pub async fn acquire(&self) -> AgentLease<'_> {
        loop {
            let notified = self.released.notified();
            if let Some(lease) = self.try_acquire(|_| true) {
                return lease;
            }
            notified.await;
        }
    }

    pub fn update_performance(&self, id: &str, success: bool, elapsed_ms: f64) -> Result<()> {
        let idx = *self
            .index
            .get(id)
            .ok_or_else(|| PipelineError::AgentNotFound(id.to_string()))?;
        self.lock()[idx].update_performance(success, elapsed_ms);
        Ok(())
    }

    /// Apply persisted stats. Unknown ids are ignored.
    pub fn restore(&self, snapshots: &[AgentSnapshot]) {
        let mut agents = self.lock();
        for snap in snapshots {
            if let Some(&idx) = self.index.get(&snap.id) {
                agents[idx].performance = snap.performance.clone();
                agents[idx].processed_count = snap.processed_count;
            }
        }
    }

    fn release(&self, idx: usize) {
        self.lock()[idx].status = AgentStatus::Idle;
        self.released.notify_waiters();
    }
}

/// Reservation of one agent. Dropping the lease returns the agent to `Idle`.
pub struct AgentLease<'a> {
    pool: &'a AgentPool,
    index: usize,
    id: String,
}

impl AgentLease<'_> {
    pub fn agent_id(&self) -> &str {
        &self.id
    }

    pub fn record(&self, success: bool, elapsed_ms: f64) {
        self.pool.lock()[self.index].update_performance(success, elapsed_ms);
    }
}

impl Drop for AgentLease<'_> {
    fn drop(&mut self) {
        self.pool.release(self.index);
        debug!(agent = %self.id, "Agent released");
    }
}
