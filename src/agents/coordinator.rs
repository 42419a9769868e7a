use serde::Serialize;
use std::collections::HashMap;
use std::time::Instant;
use tracing::{debug, info, warn};

use super::base::{AgentDescriptor, AgentPool, AgentTier};
use crate::analysis::{AnalysisType, ContentAnalysis, ContentClassification};
use crate::config::TaskCreationConfig;
use crate::error::{PipelineError, Result};
use crate::strategies::tasks::{TaskStrategy, TaskStrategySet};
use crate::tasks::{
    compute_priority, estimate_complexity, sort_task_queue, ProcessingTask, TaskContext,
};

/// A task strategy that raised instead of emitting tasks.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StrategyFailure {
    pub analysis_type: AnalysisType,
    pub strategy: String,
    pub agent_id: String,
    pub message: String,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct TaskCreationReport {
    /// Ordered task queue
    pub tasks: Vec<ProcessingTask>,
    pub failures: Vec<StrategyFailure>,
}

/// Task-creation tier: routes every analysis to the best qualifying agent and
/// merges the tasks its strategies emit into one ordered queue.
pub struct TaskCreationCoordinator {
    pool: AgentPool,
    strategies: TaskStrategySet,
    /// Agent id -> owned strategy names, in configured order
    owned: HashMap<String, Vec<String>>,
    quality_threshold: f64,
}

impl TaskCreationCoordinator {
    pub fn new(strategies: TaskStrategySet, config: &TaskCreationConfig) -> Result<Self> {
        let mut agents = Vec::with_capacity(config.agents.len());
        let mut owned = HashMap::new();

        for agent in &config.agents {
            if let Some(unknown) = agent.strategies.iter().find(|s| strategies.get(s).is_none()) {
                return Err(PipelineError::invalid_config(
                    "task_creation.agents",
                    format!("agent '{}' owns unknown strategy '{}'", agent.name, unknown),
                ));
            }
            let descriptor = AgentDescriptor::new(
                agent.name.clone(),
                AgentTier::TaskCreation,
                agent.strategies.clone(),
            );
            owned.insert(descriptor.id.clone(), agent.strategies.clone());
            agents.push(descriptor);
        }

        Ok(Self {
            pool: AgentPool::new(AgentTier::TaskCreation, agents)?,
            strategies,
            owned,
            quality_threshold: config.quality_threshold,
        })
    }

    pub fn pool(&self) -> &AgentPool {
        &self.pool
    }

    fn owns_support(&self, agent: &AgentDescriptor, analysis_type: AnalysisType) -> bool {
        agent.specializations.iter().any(|name| {
            self.strategies
                .get(name)
                .is_some_and(|s| s.supports(analysis_type))
        })
    }

    fn strategies_for(&self, agent_id: &str, analysis_type: AnalysisType) -> Vec<&TaskStrategy> {
        self.owned
            .get(agent_id)
            .into_iter()
            .flatten()
            .filter_map(|name| self.strategies.get(name))
            .filter(|s| s.supports(analysis_type))
            .collect()
    }

    /// Ordered task queue for `content_id`. Strategy failures are logged and
    /// otherwise dropped; use [`create_tasks_with_report`](Self::create_tasks_with_report)
    /// to inspect them.
    pub async fn create_tasks(
        &self,
        analyses: &[ContentAnalysis],
        classification: &ContentClassification,
        content_id: &str,
    ) -> Vec<ProcessingTask> {
        let report = self
            .create_tasks_with_report(analyses, classification, content_id)
            .await;
        for failure in &report.failures {
            warn!(
                content_id = content_id,
                strategy = %failure.strategy,
                agent = %failure.agent_id,
                "Task strategy failed: {}",
                failure.message
            );
        }
        report.tasks
    }

    pub async fn create_tasks_with_report(
        &self,
        analyses: &[ContentAnalysis],
        classification: &ContentClassification,
        content_id: &str,
    ) -> TaskCreationReport {
        let mut report = TaskCreationReport::default();
        for analysis in analyses {
            let (tasks, failures) = self.process_analysis(analysis, classification, content_id);
            report.tasks.extend(tasks);
            report.failures.extend(failures);
        }
        sort_task_queue(&mut report.tasks);

        info!(
            content_id = content_id,
            analyses = analyses.len(),
            tasks = report.tasks.len(),
            failures = report.failures.len(),
            "Task queue created"
        );
        report
    }

    fn process_analysis(
        &self,
        analysis: &ContentAnalysis,
        classification: &ContentClassification,
        content_id: &str,
    ) -> (Vec<ProcessingTask>, Vec<StrategyFailure>) {
        let analysis_type = analysis.analysis_type;

        // only idle agents qualify; none means zero tasks for this analysis
        let Some(lease) = self
            .pool
            .try_acquire(|agent| self.owns_support(agent, analysis_type))
        else {
            debug!(
                analysis = analysis_type.as_str(),
                "No idle agent supports analysis type, skipping"
            );
            return (Vec::new(), Vec::new());
        };

        let started = Instant::now();
        let confidence = analysis.confidence.clamp(0.0, 1.0);
        let priority = compute_priority(
            classification.completeness(),
            confidence,
            classification.complexity(),
        );
        let complexity = estimate_complexity(
            analysis.results.len(),
            classification.complexity(),
            confidence,
        );
        let ctx = TaskContext::new(
            content_id,
            analysis_type.as_str(),
            priority,
            complexity,
            confidence,
            self.quality_threshold,
        );

        let mut tasks = Vec::new();
        let mut failures = Vec::new();
        for strategy in self.strategies_for(lease.agent_id(), analysis_type) {
            match (strategy.emit)(analysis, &ctx) {
                Ok(emitted) => {
                    debug!(
                        strategy = %strategy.name,
                        agent = %lease.agent_id(),
                        tasks = emitted.len(),
                        "Strategy emitted tasks"
                    );
                    tasks.extend(emitted);
                }
                Err(e) => failures.push(StrategyFailure {
                    analysis_type,
                    strategy: strategy.name.clone(),
                    agent_id: lease.agent_id().to_string(),
                    message: e.to_string(),
                }),
            }
        }

        lease.record(failures.is_empty(), started.elapsed().as_secs_f64() * 1000.0);
        (tasks, failures)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agents::base::AgentStatus;
    use crate::analysis::AnalysisResult;
    use crate::config::TaskAgentConfig;
    use serde_json::json;

    fn coordinator() -> TaskCreationCoordinator {
        TaskCreationCoordinator::new(TaskStrategySet::builtin(), &TaskCreationConfig::default())
            .unwrap()
    }

    fn sentiment(label: &str, score: f64, ms: f64) -> ContentAnalysis {
        ContentAnalysis::new(
            AnalysisType::Sentiment,
            vec![AnalysisResult::new(
                "sentiment",
                json!({ "sentiment": label, "score": score }),
            )],
            0.8,
        )
        .with_processing_time(ms)
    }

    fn topics(confidence: f64) -> ContentAnalysis {
        ContentAnalysis::new(
            AnalysisType::Topic,
            vec![
                AnalysisResult::new("topic", json!({ "name": "rust", "relevance": 0.9 })),
                AnalysisResult::new("topic", json!({ "name": "go", "relevance": 0.2 })),
            ],
            confidence,
        )
    }

    #[tokio::test]
    async fn test_negative_sentiment_queue() {
        let coord = coordinator();
        let classification = ContentClassification::new(0.8, 0.3);

        let tasks = coord
            .create_tasks(&[sentiment("negative", -0.5, 1500.0)], &classification, "doc-1")
            .await;

        assert_eq!(tasks.len(), 3);
        assert!(tasks.iter().all(|t| t.content_id == "doc-1"));
        assert!(tasks.iter().all(|t| t.metadata.source == "sentiment-strategy"));
        assert!(tasks.iter().all(|t| t.priority == 5));
        let names: Vec<&str> = tasks.iter().map(|t| t.name.as_str()).collect();
        assert_eq!(
            names,
            vec!["deep-sentiment", "emotion-detection", "sentiment-trend"]
        );
    }

    #[tokio::test]
    async fn test_positive_sentiment_queue() {
        let coord = coordinator();
        let tasks = coord
            .create_tasks(
                &[sentiment("positive", 0.8, 200.0)],
                &ContentClassification::new(0.8, 0.3),
                "doc-2",
            )
            .await;
        assert_eq!(tasks.len(), 1);
        assert_eq!(tasks[0].name, "emotion-detection");
    }

    #[tokio::test]
    async fn test_routes_to_best_agent() {
        let coord = coordinator();
        let classification = ContentClassification::new(0.5, 0.5);

        coord
            .create_tasks(&[topics(0.7)], &classification, "doc")
            .await;
        let specialist = coord.pool().get("task_creation:topic-specialist").unwrap();
        assert_eq!(specialist.processed_count, 1);
        assert_eq!(
            coord.pool().get("task_creation:generalist").unwrap().processed_count,
            0
        );

        coord
            .pool()
            .update_performance("task_creation:topic-specialist", false, 5.0)
            .unwrap();
        coord
            .create_tasks(&[topics(0.7)], &classification, "doc")
            .await;
        assert_eq!(
            coord.pool().get("task_creation:generalist").unwrap().processed_count,
            1
        );
        assert!(coord
            .pool()
            .snapshot()
            .iter()
            .all(|a| a.status == AgentStatus::Idle));
    }

    #[tokio::test]
    async fn test_busy_agents_yield_no_tasks() {
        let coord = coordinator();
        let classification = ContentClassification::new(0.5, 0.5);

        let specialist = coord
            .pool()
            .try_acquire(|a| a.name == "topic-specialist")
            .unwrap();
        let generalist = coord.pool().try_acquire(|a| a.name == "generalist").unwrap();

        let report = coord
            .create_tasks_with_report(&[topics(0.7)], &classification, "doc")
            .await;
        assert!(report.tasks.is_empty());
        assert!(report.failures.is_empty());

        drop(specialist);
        drop(generalist);
        let tasks = coord
            .create_tasks(&[topics(0.7)], &classification, "doc")
            .await;
        assert_eq!(tasks.len(), 2);
    }

    #[tokio::test]
    async fn test_unsupported_analysis_yields_nothing() {
        let coord = coordinator();
        let other = ContentAnalysis::new(
            AnalysisType::Other,
            vec![AnalysisResult::new("language", json!({ "code": "vi" }))],
            0.9,
        );
        let report = coord
            .create_tasks_with_report(&[other], &ContentClassification::new(1.0, 0.0), "doc")
            .await;
        assert!(report.tasks.is_empty());
        assert!(report.failures.is_empty());
    }

    #[tokio::test]
    async fn test_strategy_failure_is_reported() {
        let coord = coordinator();
        let broken = ContentAnalysis::new(
            AnalysisType::Sentiment,
            vec![AnalysisResult::new("sentiment", json!({ "score": "awful" }))],
            0.6,
        );

        let report = coord
            .create_tasks_with_report(
                &[broken, topics(0.9)],
                &ContentClassification::new(0.9, 0.1),
                "doc",
            )
            .await;

        assert_eq!(report.failures.len(), 1);
        let failure = &report.failures[0];
        assert_eq!(failure.analysis_type, AnalysisType::Sentiment);
        assert_eq!(failure.strategy, "sentiment");
        assert_eq!(failure.agent_id, "task_creation:sentiment-specialist");
        assert!(failure.message.contains("not numeric"));

        let names: Vec<&str> = report.tasks.iter().map(|t| t.name.as_str()).collect();
        assert_eq!(names, vec!["topic-modeling", "topic-summary"]);

        let agent = coord
            .pool()
            .get("task_creation:sentiment-specialist")
            .unwrap();
        assert!(agent.performance.success_rate < 1.0);
        assert!(agent.performance.quality_score < 0.8);
    }

    #[tokio::test]
    async fn test_queue_is_ordered() {
        let coord = coordinator();
        let keywords = ContentAnalysis::new(
            AnalysisType::Keyword,
            vec![AnalysisResult::new("keyword", json!({ "keyword": "tokio", "score": 0.4 }))],
            0.3,
        );
        let structure = ContentAnalysis::new(
            AnalysisType::Structure,
            vec![AnalysisResult::new("structure", json!({ "paragraphCount": 6 }))],
            0.95,
        );

        let tasks = coord
            .create_tasks(
                &[keywords, topics(0.6), structure],
                &ContentClassification::new(0.6, 0.4),
                "doc",
            )
            .await;

        assert_eq!(tasks.len(), 6);
        assert!(tasks.iter().all(|t| (1..=5).contains(&t.priority)));
        for pair in tasks.windows(2) {
            let (a, b) = (&pair[0], &pair[1]);
            assert!(
                a.priority > b.priority
                    || (a.priority == b.priority
                        && a.metadata.confidence >= b.metadata.confidence)
            );
        }
        assert_eq!(tasks[0].metadata.source, "structure-strategy");
    }

    #[tokio::test]
    async fn test_custom_agents() {
        let config = TaskCreationConfig {
            quality_threshold: 0.9,
            agents: vec![TaskAgentConfig {
                name: "topics-only".to_string(),
                strategies: vec!["topic".to_string()],
            }],
        };
        let coord = TaskCreationCoordinator::new(TaskStrategySet::builtin(), &config).unwrap();

        let tasks = coord
            .create_tasks(
                &[sentiment("negative", -0.9, 0.0), topics(0.5)],
                &ContentClassification::new(0.5, 0.5),
                "doc",
            )
            .await;
        assert!(tasks.iter().all(|t| t.metadata.source == "topic-strategy"));
        assert!(tasks.iter().all(|t| t.parameters.quality_threshold == 0.9));

        let bad = TaskCreationConfig {
            quality_threshold: 0.7,
            agents: vec![TaskAgentConfig {
                name: "x".to_string(),
                strategies: vec!["translation".to_string()],
            }],
        };
        assert!(TaskCreationCoordinator::new(TaskStrategySet::builtin(), &bad).is_err());
    }
}
