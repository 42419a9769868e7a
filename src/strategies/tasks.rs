//! Task-creation strategies
//!
//! Each strategy turns one analysis into zero or more downstream tasks. The
//! emission policy of the built-ins:
//!
//! | strategy  | always                  | conditional                                              |
//! |-----------|-------------------------|----------------------------------------------------------|
//! | sentiment | emotion-detection       | deep-sentiment (negative or score < -0.3), sentiment-trend (> 1000 ms) |
//! | entity    | one extraction per type | relationship-extraction (> 1 type)                       |
//! | topic     | topic-modeling          | topic-summary per topic with relevance > 0.5             |
//! | keyword   | keyword-expansion       | semantic-analysis for each of the top 5 keywords         |
//! | structure | structure-validation    | content-summarization (paragraphCount > 3)               |

use serde_json::{json, Value};

use crate::analysis::{AnalysisResult, AnalysisType, ContentAnalysis};
use crate::error::{PipelineError, Result};
use crate::tasks::{ProcessingTask, TaskContext, TaskType};

pub const SENTIMENT_STRATEGY: &str = "sentiment";
pub const ENTITY_STRATEGY: &str = "entity";
pub const TOPIC_STRATEGY: &str = "topic";
pub const KEYWORD_STRATEGY: &str = "keyword";
pub const STRUCTURE_STRATEGY: &str = "structure";

const NEGATIVE_SCORE: f64 = -0.3;
const TREND_PROCESSING_MS: f64 = 1000.0;
const TOPIC_RELEVANCE: f64 = 0.5;
const TOP_KEYWORDS: usize = 5;
const SUMMARY_PARAGRAPHS: u64 = 3;

pub type EmitFn = fn(&ContentAnalysis, &TaskContext) -> Result<Vec<ProcessingTask>>;

#[derive(Debug, Clone)]
pub struct TaskStrategy {
    pub name: String,
    pub analysis_type: AnalysisType,
    pub emit: EmitFn,
}

impl TaskStrategy {
    pub fn new(name: impl Into<String>, analysis_type: AnalysisType, emit: EmitFn) -> Self {
        Self {
            name: name.into(),
            analysis_type,
            emit,
        }
    }

    pub fn supports(&self, analysis_type: AnalysisType) -> bool {
        self.analysis_type == analysis_type
    }
}

/// Results of `result_type`, rejecting any whose value is not an object.
fn results_of<'a>(
    strategy: &str,
    analysis: &'a ContentAnalysis,
    result_type: &'a str,
) -> Result<Vec<&'a AnalysisResult>> {
    let results: Vec<&AnalysisResult> = analysis.results_of(result_type).collect();
    if let Some(bad) = results.iter().find(|r| !r.value.is_object()) {
        return Err(PipelineError::strategy(
            strategy,
            format!("malformed {} result: {}", result_type, bad.value),
        ));
    }
    Ok(results)
}

fn sentiment_tasks(analysis: &ContentAnalysis, ctx: &TaskContext) -> Result<Vec<ProcessingTask>> {
    let results = results_of(SENTIMENT_STRATEGY, analysis, "sentiment")?;
    let first = results.first();

    let label = first.and_then(|r| r.str_field("sentiment")).unwrap_or("neutral");
    let score = match first.and_then(|r| r.value.get("score")) {
        None | Some(Value::Null) => 0.0,
        Some(v) => v.as_f64().ok_or_else(|| {
            PipelineError::strategy(SENTIMENT_STRATEGY, format!("sentiment score is not numeric: {}", v))
        })?,
    };
    let input = json!({ "sentiment": label, "score": score });

    let mut tasks = Vec::new();
    if label == "negative" || score < NEGATIVE_SCORE {
        tasks.push(ctx.task(
            "deep-sentiment",
            TaskType::Analysis,
            input.clone(),
            &["sentiment_analysis", "deep_learning"],
        ));
    }
    tasks.push(ctx.task(
        "emotion-detection",
        TaskType::Classification,
        input.clone(),
        &["emotion_detection"],
    ));
    if analysis.metadata.processing_time_ms > TREND_PROCESSING_MS {
        tasks.push(ctx.task(
            "sentiment-trend",
            TaskType::Analysis,
            json!({ "sentiment": label, "score": score, "processingTimeMs": analysis.metadata.processing_time_ms }),
            &["trend_analysis"],
        ));
    }
    Ok(tasks)
}

fn entity_tasks(analysis: &ContentAnalysis, ctx: &TaskContext) -> Result<Vec<ProcessingTask>> {
    let results = results_of(ENTITY_STRATEGY, analysis, "entity")?;

    // distinct entity types, first-seen order
    let mut types: Vec<(&str, Vec<&str>)> = Vec::new();
    for r in &results {
        let Some(entity_type) = r.str_field("entityType").or_else(|| r.str_field("type")) else {
            continue;
        };
        let text = r.str_field("text").unwrap_or_default();
        match types.iter_mut().find(|(t, _)| *t == entity_type) {
            Some((_, texts)) => texts.push(text),
            None => types.push((entity_type, vec![text])),
        }
    }

    let mut tasks: Vec<ProcessingTask> = types
        .iter()
        .map(|(entity_type, texts)| {
            ctx.task(
                &format!("{}-extraction", entity_type.to_lowercase()),
                TaskType::Extraction,
                json!({ "entityType": entity_type, "entities": texts }),
                &["entity_extraction"],
            )
        })
        .collect();

    if types.len() > 1 {
        let names: Vec<&str> = types.iter().map(|(t, _)| *t).collect();
        tasks.push(ctx.task(
            "relationship-extraction",
            TaskType::Analysis,
            json!({ "entityTypes": names }),
            &["relationship_extraction"],
        ));
    }
    Ok(tasks)
}

fn topic_tasks(analysis: &ContentAnalysis, ctx: &TaskContext) -> Result<Vec<ProcessingTask>> {
    let results = results_of(TOPIC_STRATEGY, analysis, "topic")?;
    let topics: Vec<(&str, f64)> = results
        .iter()
        .map(|r| {
            (
                r.str_field("name").unwrap_or_default(),
                r.f64_field("relevance").unwrap_or(0.0),
            )
        })
        .collect();

    let names: Vec<&str> = topics.iter().map(|(n, _)| *n).collect();
    let mut tasks = vec![ctx.task(
        "topic-modeling",
        TaskType::Analysis,
        json!({ "topics": names }),
        &["topic_modeling"],
    )];

    for (name, relevance) in topics.iter().filter(|(_, r)| *r > TOPIC_RELEVANCE) {
        tasks.push(ctx.task(
            "topic-summary",
            TaskType::Summarization,
            json!({ "topic": name, "relevance": relevance }),
            &["summarization"],
        ));
    }
    Ok(tasks)
}

fn keyword_tasks(analysis: &ContentAnalysis, ctx: &TaskContext) -> Result<Vec<ProcessingTask>> {
    let results = results_of(KEYWORD_STRATEGY, analysis, "keyword")?;
    let mut keywords: Vec<(&str, f64)> = results
        .iter()
        .map(|r| {
            (
                r.str_field("keyword").unwrap_or_default(),
                r.f64_field("score").unwrap_or(0.0),
            )
        })
        .collect();

    let all: Vec<&str> = keywords.iter().map(|(k, _)| *k).collect();
    let mut tasks = vec![ctx.task(
        "keyword-expansion",
        TaskType::Enrichment,
        json!({ "keywords": all }),
        &["keyword_expansion"],
    )];

    keywords.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
    for (keyword, score) in keywords.iter().take(TOP_KEYWORDS) {
        tasks.push(ctx.task(
            "semantic-analysis",
            TaskType::Analysis,
            json!({ "keyword": keyword, "score": score }),
            &["semantic_analysis"],
        ));
    }
    Ok(tasks)
}

fn structure_tasks(analysis: &ContentAnalysis, ctx: &TaskContext) -> Result<Vec<ProcessingTask>> {
    let results = results_of(STRUCTURE_STRATEGY, analysis, "structure")?;
    let structure = results.first().map(|r| r.value.clone()).unwrap_or(Value::Null);
    let paragraphs = match structure.get("paragraphCount") {
        None | Some(Value::Null) => 0,
        Some(v) => v.as_u64().ok_or_else(|| {
            PipelineError::strategy(STRUCTURE_STRATEGY, format!("paragraphCount is not a count: {}", v))
        })?,
    };

    let mut tasks = vec![ctx.task(
        "structure-validation",
        TaskType::Validation,
        structure.clone(),
        &["structure_validation"],
    )];
    if paragraphs > SUMMARY_PARAGRAPHS {
        tasks.push(ctx.task(
            "content-summarization",
            TaskType::Summarization,
            json!({ "paragraphCount": paragraphs }),
            &["summarization"],
        ));
    }
    Ok(tasks)
}

/// All strategies known to the task-creation tier, in registration order.
#[derive(Debug, Clone)]
pub struct TaskStrategySet {
    strategies: Vec<TaskStrategy>,
}

impl TaskStrategySet {
    pub fn new(strategies: Vec<TaskStrategy>) -> Result<Self> {
        for (i, s) in strategies.iter().enumerate() {
            if strategies[..i].iter().any(|other| other.name == s.name) {
                return Err(PipelineError::InvalidRegistry(format!(
                    "task strategy '{}' registered twice",
                    s.name
                )));
            }
        }
        Ok(Self { strategies })
    }

    pub fn builtin() -> Self {
        Self {
            strategies: vec![
                TaskStrategy::new(SENTIMENT_STRATEGY, AnalysisType::Sentiment, sentiment_tasks),
                TaskStrategy::new(ENTITY_STRATEGY, AnalysisType::Entity, entity_tasks),
                TaskStrategy::new(TOPIC_STRATEGY, AnalysisType::Topic, topic_tasks),
                TaskStrategy::new(KEYWORD_STRATEGY, AnalysisType::Keyword, keyword_tasks),
                TaskStrategy::new(STRUCTURE_STRATEGY, AnalysisType::Structure, structure_tasks),
            ],
        }
    }

    pub fn get(&self, name: &str) -> Option<&TaskStrategy> {
        self.strategies.iter().find(|s| s.name == name)
    }

    pub fn names(&self) -> Vec<&str> {
        self.strategies.iter().map(|s| s.name.as_str()).collect()
    }
}

impl Default for TaskStrategySet {
    fn default() -> Self {
        Self::builtin()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::AnalysisResult;

    fn ctx() -> TaskContext {
        TaskContext::new("c1", "test", 3, 0.4, 0.8, 0.7)
    }

    fn names(tasks: &[ProcessingTask]) -> Vec<&str> {
        tasks.iter().map(|t| t.name.as_str()).collect()
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

    #[test]
    fn test_negative_slow_sentiment() {
        let tasks = sentiment_tasks(&sentiment("negative", -0.5, 1500.0), &ctx()).unwrap();
        assert_eq!(
            names(&tasks),
            vec!["deep-sentiment", "emotion-detection", "sentiment-trend"]
        );
    }

    #[test]
    fn test_positive_fast_sentiment() {
        let tasks = sentiment_tasks(&sentiment("positive", 0.8, 200.0), &ctx()).unwrap();
        assert_eq!(names(&tasks), vec!["emotion-detection"]);
    }

    #[test]
    fn test_low_score_triggers_deep_sentiment() {
        let tasks = sentiment_tasks(&sentiment("neutral", -0.4, 0.0), &ctx()).unwrap();
        assert_eq!(names(&tasks), vec!["deep-sentiment", "emotion-detection"]);
    }

    #[test]
    fn test_malformed_sentiment_score() {
        let analysis = ContentAnalysis::new(
            AnalysisType::Sentiment,
            vec![AnalysisResult::new("sentiment", json!({ "score": "very bad" }))],
            0.5,
        );
        let err = sentiment_tasks(&analysis, &ctx()).unwrap_err();
        assert!(err.to_string().contains("not numeric"));

        let not_object = ContentAnalysis::new(
            AnalysisType::Sentiment,
            vec![AnalysisResult::new("sentiment", json!("negative"))],
            0.5,
        );
        assert!(sentiment_tasks(&not_object, &ctx()).is_err());
    }

    #[test]
    fn test_entity_types() {
        let analysis = ContentAnalysis::new(
            AnalysisType::Entity,
            vec![
                AnalysisResult::new("entity", json!({ "text": "Lan", "entityType": "PERSON" })),
                AnalysisResult::new("entity", json!({ "text": "Hanoi", "entityType": "LOCATION" })),
                AnalysisResult::new("entity", json!({ "text": "Minh", "entityType": "PERSON" })),
            ],
            0.9,
        );
        let tasks = entity_tasks(&analysis, &ctx()).unwrap();
        assert_eq!(
            names(&tasks),
            vec!["person-extraction", "location-extraction", "relationship-extraction"]
        );
        assert_eq!(tasks[0].parameters.input["entities"], json!(["Lan", "Minh"]));

        let single = ContentAnalysis::new(
            AnalysisType::Entity,
            vec![AnalysisResult::new("entity", json!({ "text": "Lan", "entityType": "PERSON" }))],
            0.9,
        );
        assert_eq!(names(&entity_tasks(&single, &ctx()).unwrap()), vec!["person-extraction"]);
    }

    #[test]
    fn test_topic_summaries() {
        let analysis = ContentAnalysis::new(
            AnalysisType::Topic,
            vec![
                AnalysisResult::new("topic", json!({ "name": "math", "relevance": 0.9 })),
                AnalysisResult::new("topic", json!({ "name": "art", "relevance": 0.5 })),
                AnalysisResult::new("topic", json!({ "name": "music", "relevance": 0.6 })),
            ],
            0.7,
        );
        let tasks = topic_tasks(&analysis, &ctx()).unwrap();
        assert_eq!(
            names(&tasks),
            vec!["topic-modeling", "topic-summary", "topic-summary"]
        );
        assert_eq!(tasks[2].parameters.input["topic"], "music");
    }

    #[test]
    fn test_keyword_top_five() {
        let results = (0..7)
            .map(|i| {
                AnalysisResult::new(
                    "keyword",
                    json!({ "keyword": format!("k{}", i), "score": i as f64 / 10.0 }),
                )
            })
            .collect();
        let analysis = ContentAnalysis::new(AnalysisType::Keyword, results, 0.6);
        let tasks = keyword_tasks(&analysis, &ctx()).unwrap();
        assert_eq!(tasks.len(), 6);
        assert_eq!(tasks[0].name, "keyword-expansion");
        assert_eq!(tasks[1].parameters.input["keyword"], "k6");
        assert_eq!(tasks[5].parameters.input["keyword"], "k2");
    }

    #[test]
    fn test_structure_summary_threshold() {
        let make = |count: u64| {
            ContentAnalysis::new(
                AnalysisType::Structure,
                vec![AnalysisResult::new(
                    "structure",
                    json!({ "paragraphCount": count, "hasHeaders": true }),
                )],
                0.9,
            )
        };
        assert_eq!(
            names(&structure_tasks(&make(3), &ctx()).unwrap()),
            vec!["structure-validation"]
        );
        assert_eq!(
            names(&structure_tasks(&make(4), &ctx()).unwrap()),
            vec!["structure-validation", "content-summarization"]
        );
    }

    #[test]
    fn test_duplicate_strategy_rejected() {
        let s = TaskStrategy::new("dup", AnalysisType::Topic, topic_tasks);
        assert!(TaskStrategySet::new(vec![s.clone(), s]).is_err());
        assert_eq!(TaskStrategySet::builtin().names().len(), 5);
    }
}
