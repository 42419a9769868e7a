//! Inputs supplied by the analysis/classification collaborator

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AnalysisType {
    Sentiment,
    #[serde(alias = "entities")]
    Entity,
    #[serde(alias = "topics")]
    Topic,
    #[serde(alias = "keywords")]
    Keyword,
    Structure,
    #[serde(other)]
    Other,
}

impl AnalysisType {
    pub fn as_str(&self) -> &'static str {
        match self {
            AnalysisType::Sentiment => "sentiment",
            AnalysisType::Entity => "entity",
            AnalysisType::Topic => "topic",
            AnalysisType::Keyword => "keyword",
            AnalysisType::Structure => "structure",
            AnalysisType::Other => "other",
        }
    }
}

/// One item of an analysis, e.g. `{type: "topic", value: {name, relevance}}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResult {
    #[serde(rename = "type")]
    pub result_type: String,
    #[serde(default)]
    pub value: Value,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl AnalysisResult {
    pub fn new(result_type: impl Into<String>, value: Value) -> Self {
        Self {
            result_type: result_type.into(),
            value,
            extra: Map::new(),
        }
    }

    pub fn str_field(&self, key: &str) -> Option<&str> {
        self.value.get(key).and_then(Value::as_str)
    }

    pub fn f64_field(&self, key: &str) -> Option<f64> {
        self.value.get(key).and_then(Value::as_f64)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisMetadata {
    #[serde(default)]
    pub processing_time_ms: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContentAnalysis {
    pub analysis_type: AnalysisType,
    #[serde(default)]
    pub results: Vec<AnalysisResult>,
    #[serde(default)]
    pub confidence: f64,
    #[serde(default)]
    pub metadata: AnalysisMetadata,
}

impl ContentAnalysis {
    pub fn new(analysis_type: AnalysisType, results: Vec<AnalysisResult>, confidence: f64) -> Self {
        Self {
            analysis_type,
            results,
            confidence,
            metadata: AnalysisMetadata::default(),
        }
    }

    pub fn with_processing_time(mut self, ms: f64) -> Self {
        self.metadata.processing_time_ms = ms;
        self
    }

    pub fn results_of<'a>(&'a self, result_type: &'a str) -> impl Iterator<Item = &'a AnalysisResult> {
        self.results
            .iter()
            .filter(move |r| r.result_type == result_type)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QualityClassification {
    #[serde(default)]
    pub completeness: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ComplexityClassification {
    #[serde(default)]
    pub overall: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Classifications {
    #[serde(default)]
    pub quality: QualityClassification,
    #[serde(default)]
    pub complexity: ComplexityClassification,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ContentClassification {
    #[serde(default)]
    pub classifications: Classifications,
}

impl ContentClassification {
    pub fn new(completeness: f64, complexity: f64) -> Self {
        Self {
            classifications: Classifications {
                quality: QualityClassification { completeness },
                complexity: ComplexityClassification {
                    overall: complexity,
                },
            },
        }
    }

    pub fn completeness(&self) -> f64 {
        self.classifications.quality.completeness.clamp(0.0, 1.0)
    }

    pub fn complexity(&self) -> f64 {
        self.classifications.complexity.overall.clamp(0.0, 1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_deserialize_analysis() {
        let raw = json!({
            "analysisType": "topics",
            "results": [
                {"type": "topic", "value": {"name": "grades", "relevance": 0.8}, "source": "nlp"}
            ],
            "confidence": 0.9,
            "metadata": {"processingTimeMs": 120}
        });
        let analysis: ContentAnalysis = serde_json::from_value(raw).unwrap();
        assert_eq!(analysis.analysis_type, AnalysisType::Topic);
        assert_eq!(analysis.metadata.processing_time_ms, 120.0);
        let topic = analysis.results_of("topic").next().unwrap();
        assert_eq!(topic.str_field("name"), Some("grades"));
        assert_eq!(topic.extra.get("source"), Some(&json!("nlp")));
    }

    #[test]
    fn test_unknown_analysis_type() {
        let analysis: ContentAnalysis =
            serde_json::from_value(json!({"analysisType": "readability"})).unwrap();
        assert_eq!(analysis.analysis_type, AnalysisType::Other);
        assert!(analysis.results.is_empty());
    }

    #[test]
    fn test_classification_clamps() {
        let raw = json!({"classifications": {"quality": {"completeness": 1.4}, "complexity": {"overall": -0.2}}});
        let c: ContentClassification = serde_json::from_value(raw).unwrap();
        assert_eq!(c.completeness(), 1.0);
        assert_eq!(c.complexity(), 0.0);
    }
}
