pub mod chunking;
pub mod classify;
pub mod quality;

use serde::{Deserialize, Serialize};

pub use chunking::chunk_content;
pub use classify::classify_chunk;
pub use quality::{assess_quality, detect_structure};

/// A file handed to the pipeline by the file supply collaborator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileDescriptor {
    pub id: String,
    pub path: String,
    pub size: u64,
}

impl FileDescriptor {
    pub fn new(id: impl Into<String>, path: impl Into<String>, size: u64) -> Self {
        Self {
            id: id.into(),
            path: path.into(),
            size,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChunkType {
    Text,
    Binary,
    Image,
    Structured,
    Mixed,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContentChunk {
    pub id: String,
    pub sequence: usize,
    pub content: String,
    pub size: usize,
    #[serde(rename = "type")]
    pub chunk_type: ChunkType,
    /// Byte offset of the first byte, inclusive
    pub start: usize,
    /// Byte offset one past the last byte
    pub end: usize,
    pub encoding: String,
    pub confidence: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct QualityMetrics {
    pub completeness: f64,
    pub accuracy: f64,
    pub readability: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StructureFlags {
    pub has_headers: bool,
    pub has_tables: bool,
    pub has_images: bool,
    pub has_embedded_content: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtractionMetadata {
    pub file_size: u64,
    pub file_type: String,
    pub encoding: String,
    pub extraction_method: String,
    /// Milliseconds spent on the file
    pub extraction_time: u64,
    pub content_length: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub agent_id: Option<String>,
    pub quality: QualityMetrics,
    pub structure: StructureFlags,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtractionResult {
    pub file_id: String,
    pub path: String,
    pub content: String,
    pub metadata: ExtractionMetadata,
    pub chunks: Vec<ContentChunk>,
    pub errors: Vec<String>,
}

impl ExtractionResult {
    /// Result for a file that could not be read. Quality is zeroed and the
    /// extraction method is reported as `failed`.
    pub fn failure(
        file: &FileDescriptor,
        file_type: impl Into<String>,
        error: impl Into<String>,
        elapsed_ms: u64,
    ) -> Self {
        Self {
            file_id: file.id.clone(),
            path: file.path.clone(),
            content: String::new(),
            metadata: ExtractionMetadata {
                file_size: file.size,
                file_type: file_type.into(),
                encoding: "unknown".to_string(),
                extraction_method: "failed".to_string(),
                extraction_time: elapsed_ms,
                content_length: 0,
                agent_id: None,
                quality: QualityMetrics::default(),
                structure: StructureFlags::default(),
            },
            chunks: Vec::new(),
            errors: vec![error.into()],
        }
    }

    pub fn is_success(&self) -> bool {
        self.errors.is_empty()
    }
}
