use chrono::Utc;
use serde_json::{Map, Value};
use uuid::Uuid;

use super::{ProcessingTask, TaskMetadata, TaskParameters, TaskStatus, TaskType};

/// Everything a strategy needs to stamp out tasks for one analysis.
#[derive(Debug, Clone, PartialEq)]
pub struct TaskContext {
    pub content_id: String,
    pub analysis: String,
    pub priority: u8,
    pub complexity: f64,
    pub confidence: f64,
    pub quality_threshold: f64,
}

impl TaskContext {
    pub fn new(
        content_id: impl Into<String>,
        analysis: impl Into<String>,
        priority: u8,
        complexity: f64,
        confidence: f64,
        quality_threshold: f64,
    ) -> Self {
        Self {
            content_id: content_id.into(),
            analysis: analysis.into(),
            priority: priority.clamp(1, 5),
            complexity: complexity.max(0.0),
            confidence: confidence.clamp(0.0, 1.0),
            quality_threshold: quality_threshold.clamp(0.0, 1.0),
        }
    }

    pub fn task(
        &self,
        name: &str,
        task_type: TaskType,
        input: Value,
        capabilities: &[&str],
    ) -> ProcessingTask {
        let estimated = (task_type.base_duration_ms() as f64 * (1.0 + self.complexity)).round() as u64;
        let now = Utc::now();

        let mut options = Map::new();
        options.insert("operation".to_string(), Value::String(name.to_string()));

        ProcessingTask {
            id: Uuid::new_v4().to_string(),
            name: name.to_string(),
            task_type,
            priority: self.priority,
            status: TaskStatus::Pending,
            content_id: self.content_id.clone(),
            parameters: TaskParameters {
                input,
                expected_output: None,
                options,
                quality_threshold: self.quality_threshold,
                timeout_ms: estimated * 3,
            },
            dependencies: Vec::new(),
            metadata: TaskMetadata {
                source: format!("{}-strategy", self.analysis),
                confidence: self.confidence,
                complexity: self.complexity,
                estimated_duration_ms: estimated,
                required_capabilities: capabilities.iter().map(|c| c.to_string()).collect(),
                tags: vec![self.analysis.clone(), name.to_string()],
            },
            created_at: now,
            updated_at: now,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_task_fields() {
        let ctx = TaskContext::new("c1", "topic", 9, 0.5, 1.2, 0.7);
        assert_eq!(ctx.priority, 5);
        assert_eq!(ctx.confidence, 1.0);

        let task = ctx.task("topic-modeling", TaskType::Analysis, json!({"n": 1}), &["topic_modeling"]);
        assert_eq!(task.metadata.estimated_duration_ms, 4_500);
        assert_eq!(task.parameters.timeout_ms, 13_500);
        assert_eq!(task.metadata.source, "topic-strategy");
        assert_eq!(task.metadata.tags, vec!["topic", "topic-modeling"]);
        assert_eq!(task.parameters.options["operation"], json!("topic-modeling"));
        assert!(task.dependencies.is_empty());
    }

    #[test]
    fn test_ids_are_unique() {
        let ctx = TaskContext::new("c1", "keyword", 3, 0.1, 0.5, 0.7);
        let a = ctx.task("keyword-expansion", TaskType::Enrichment, Value::Null, &[]);
        let b = ctx.task("keyword-expansion", TaskType::Enrichment, Value::Null, &[]);
        assert_ne!(a.id, b.id);
    }
}
