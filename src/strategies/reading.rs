//! Reading strategies
//!
//! A strategy is a plain record: a name, an applicability predicate over the
//! file and its capability, and the reader that performs the extraction.

use async_trait::async_trait;
use std::sync::Arc;

use crate::capabilities::{extension_of, Capability, CapabilityRegistry};
use crate::content::FileDescriptor;
use crate::error::{PipelineError, Result};
use crate::tools::FileAccess;

pub const TEXT_READER: &str = "text_reader";
pub const STRUCTURED_READER: &str = "structured_reader";
pub const MARKUP_READER: &str = "markup_reader";
pub const IMAGE_READER: &str = "image_reader";
pub const BINARY_READER: &str = "binary_reader";
pub const DIRECT_READ: &str = "direct_read";

pub const UTF8: &str = "utf-8";
pub const BINARY: &str = "binary";

/// Content produced by a reader, before chunking and scoring.
#[derive(Debug, Clone, PartialEq)]
pub struct RawContent {
    pub content: String,
    pub encoding: String,
}

impl RawContent {
    fn utf8(content: String) -> Self {
        Self {
            content,
            encoding: UTF8.to_string(),
        }
    }

    fn binary(bytes: &[u8]) -> Self {
        Self {
            content: bytes_to_binary_string(bytes),
            encoding: BINARY.to_string(),
        }
    }
}

/// Map each byte to the code point with the same value, so byte-level
/// signatures survive as a prefix of the string.
pub fn bytes_to_binary_string(bytes: &[u8]) -> String {
    bytes.iter().map(|&b| b as char).collect()
}

#[async_trait]
pub trait ContentReader: Send + Sync {
    async fn read(&self, file: &FileDescriptor, files: &FileAccess) -> Result<RawContent>;
}

pub type Predicate = fn(&FileDescriptor, &Capability) -> bool;

#[derive(Clone)]
pub struct ReadingStrategy {
    pub name: String,
    pub applies: Predicate,
    pub reader: Arc<dyn ContentReader>,
}

impl ReadingStrategy {
    pub fn new(name: impl Into<String>, applies: Predicate, reader: Arc<dyn ContentReader>) -> Self {
        Self {
            name: name.into(),
            applies,
            reader,
        }
    }
}

impl std::fmt::Debug for ReadingStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReadingStrategy")
            .field("name", &self.name)
            .finish()
    }
}

fn decode_utf8(strategy: &str, bytes: Vec<u8>) -> Result<String> {
    String::from_utf8(bytes)
        .map_err(|e| PipelineError::strategy(strategy, format!("content is not valid UTF-8: {}", e)))
}

struct TextReader;

#[async_trait]
impl ContentReader for TextReader {
    async fn read(&self, file: &FileDescriptor, files: &FileAccess) -> Result<RawContent> {
        let text = decode_utf8(TEXT_READER, files.read_bytes(&file.path).await?)?;
        let text = match text.strip_prefix('\u{feff}') {
            Some(stripped) => stripped.to_string(),
            None => text,
        };
        Ok(RawContent::utf8(text))
    }
}

struct StructuredReader;

#[async_trait]
impl ContentReader for StructuredReader {
    async fn read(&self, file: &FileDescriptor, files: &FileAccess) -> Result<RawContent> {
        let text = decode_utf8(STRUCTURED_READER, files.read_bytes(&file.path).await?)?;
        let invalid = |kind: &str, e: &dyn std::fmt::Display| {
            PipelineError::strategy(STRUCTURED_READER, format!("invalid {}: {}", kind, e))
        };

        match extension_of(&file.path).as_deref() {
            Some("json") => {
                serde_json::from_str::<serde_json::Value>(&text).map_err(|e| invalid("JSON", &e))?;
            }
            Some("yaml") | Some("yml") => {
                serde_yaml::from_str::<serde_yaml::Value>(&text).map_err(|e| invalid("YAML", &e))?;
            }
            Some("toml") => {
                toml::from_str::<toml::Value>(&text).map_err(|e| invalid("TOML", &e))?;
            }
            _ => {}
        }

        Ok(RawContent::utf8(text))
    }
}

struct MarkupReader;

#[async_trait]
impl ContentReader for MarkupReader {
    async fn read(&self, file: &FileDescriptor, files: &FileAccess) -> Result<RawContent> {
        let text = decode_utf8(MARKUP_READER, files.read_bytes(&file.path).await?)?;
        let normalized = text
            .replace("\r\n", "\n")
            .replace('\r', "\n")
            .lines()
            .map(str::trim_end)
            .collect::<Vec<_>>()
            .join("\n");
        Ok(RawContent::utf8(normalized))
    }
}

struct ImageReader;

const IMAGE_SIGNATURES: [&[u8]; 8] = [
    b"\x89PNG\r\n\x1a\n",
    b"\xff\xd8\xff",
    b"GIF87a",
    b"GIF89a",
    b"BM",
    b"II*\0",
    b"MM\0*",
    b"RIFF",
];

#[async_trait]
impl ContentReader for ImageReader {
    async fn read(&self, file: &FileDescriptor, files: &FileAccess) -> Result<RawContent> {
        let bytes = files.read_bytes(&file.path).await?;
        if !IMAGE_SIGNATURES.iter().any(|sig| bytes.starts_with(sig)) {
            return Err(PipelineError::strategy(
                IMAGE_READER,
                "no recognized image signature",
            ));
        }
        Ok(RawContent::binary(&bytes))
    }
}

struct BinaryReader;

#[async_trait]
impl ContentReader for BinaryReader {
    async fn read(&self, file: &FileDescriptor, files: &FileAccess) -> Result<RawContent> {
        Ok(RawContent::binary(&files.read_bytes(&file.path).await?))
    }
}

struct DirectReader;

#[async_trait]
impl ContentReader for DirectReader {
    async fn read(&self, file: &FileDescriptor, files: &FileAccess) -> Result<RawContent> {
        let bytes = files.read_bytes(&file.path).await?;
        Ok(match String::from_utf8(bytes) {
            Ok(text) => RawContent::utf8(text),
            Err(e) => RawContent::binary(e.as_bytes()),
        })
    }
}

fn is_textual(_: &FileDescriptor, cap: &Capability) -> bool {
    !matches!(cap.file_type.as_str(), "image" | "audio" | "archive")
}

fn is_parseable_structured(file: &FileDescriptor, _: &Capability) -> bool {
    matches!(
        extension_of(&file.path).as_deref(),
        Some("json" | "yaml" | "yml" | "toml" | "csv" | "tsv" | "xml")
    )
}

fn is_markup(file: &FileDescriptor, _: &Capability) -> bool {
    matches!(
        extension_of(&file.path).as_deref(),
        Some("html" | "htm" | "xhtml" | "xml" | "md")
    )
}

fn is_image(_: &FileDescriptor, cap: &Capability) -> bool {
    cap.file_type == "image"
}

fn always(_: &FileDescriptor, _: &Capability) -> bool {
    true
}

/// Named reading strategies plus the universal `direct_read` fallback.
#[derive(Debug, Clone)]
pub struct ReadingStrategySet {
    strategies: Vec<ReadingStrategy>,
    fallback: ReadingStrategy,
}

impl ReadingStrategySet {
    pub fn new(strategies: Vec<ReadingStrategy>) -> Self {
        Self {
            strategies,
            fallback: ReadingStrategy::new(DIRECT_READ, always, Arc::new(DirectReader)),
        }
    }

    pub fn builtin() -> Self {
        Self::new(vec![
            ReadingStrategy::new(TEXT_READER, is_textual, Arc::new(TextReader)),
            ReadingStrategy::new(
                STRUCTURED_READER,
                is_parseable_structured,
                Arc::new(StructuredReader),
            ),
            ReadingStrategy::new(MARKUP_READER, is_markup, Arc::new(MarkupReader)),
            ReadingStrategy::new(IMAGE_READER, is_image, Arc::new(ImageReader)),
            ReadingStrategy::new(BINARY_READER, always, Arc::new(BinaryReader)),
        ])
    }

    pub fn get(&self, name: &str) -> Option<&ReadingStrategy> {
        if name == self.fallback.name {
            return Some(&self.fallback);
        }
        self.strategies.iter().find(|s| s.name == name)
    }

    /// First strategy, in the capability's method order, that accepts the
    /// file; `direct_read` when none does.
    pub fn select(&self, file: &FileDescriptor, capability: &Capability) -> &ReadingStrategy {
        capability
            .reading_methods
            .iter()
            .filter_map(|method| self.get(method))
            .find(|strategy| (strategy.applies)(file, capability))
            .unwrap_or(&self.fallback)
    }

    /// Every method a capability names must exist.
    pub fn validate(&self, registry: &CapabilityRegistry) -> Result<()> {
        for cap in registry.capabilities() {
            for method in &cap.reading_methods {
                if self.get(method).is_none() {
                    return Err(PipelineError::InvalidRegistry(format!(
                        "capability '{}' names unknown reading method '{}'",
                        cap.file_type, method
                    )));
                }
            }
        }
        Ok(())
    }
}

impl Default for ReadingStrategySet {
    fn default() -> Self {
        Self::builtin()
    }
}
