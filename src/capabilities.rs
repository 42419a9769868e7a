//! Capability registry
//!
//! Maps a file extension to the ingestion limits and preferred extraction
//! methods for that kind of file.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;

use crate::error::{PipelineError, Result};

const KIB: u64 = 1024;
const MIB: u64 = 1024 * KIB;
const GIB: u64 = 1024 * MIB;

/// Declared ingestion limits and methods for one file type
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Capability {
    pub file_type: String,
    pub extensions: Vec<String>,
    pub max_size: u64,
    /// Reading strategy names, most preferred first
    pub reading_methods: Vec<String>,
    #[serde(default)]
    pub quality_metrics: Vec<String>,
}

impl Capability {
    fn new(
        file_type: &str,
        extensions: &[&str],
        max_size: u64,
        reading_methods: &[&str],
        quality_metrics: &[&str],
    ) -> Self {
        Self {
            file_type: file_type.to_string(),
            extensions: extensions.iter().map(|e| e.to_string()).collect(),
            max_size,
            reading_methods: reading_methods.iter().map(|m| m.to_string()).collect(),
            quality_metrics: quality_metrics.iter().map(|m| m.to_string()).collect(),
        }
    }
}

/// The built-in capability table. Order matters: a later entry claiming an
/// extension already claimed replaces it.
pub fn builtin_capabilities() -> Vec<Capability> {
    let text_metrics = ["completeness", "accuracy", "readability"];
    let binary_metrics = ["completeness", "accuracy"];

    vec![
        Capability::new(
            "text",
            &["txt", "log", "rst", "md", "markdown"],
            100 * MIB,
            &["text_reader", "direct_read"],
            &text_metrics,
        ),
        Capability::new(
            "code",
            &[
                "rs", "py", "js", "ts", "java", "go", "c", "cpp", "h", "sql", "sh",
            ],
            10 * MIB,
            &["text_reader", "direct_read"],
            &text_metrics,
        ),
        Capability::new(
            "structured",
            &["json", "yaml", "yml", "toml", "csv", "tsv", "xml"],
            50 * MIB,
            &["structured_reader", "text_reader"],
            &binary_metrics,
        ),
        Capability::new(
            "document",
            &["html", "htm", "xhtml", "xml", "md"],
            100 * MIB,
            &["markup_reader", "text_reader"],
            &text_metrics,
        ),
        Capability::new(
            "image",
            &["png", "jpg", "jpeg", "gif", "bmp", "tif", "tiff", "webp"],
            50 * MIB,
            &["image_reader", "binary_reader"],
            &binary_metrics,
        ),
        Capability::new(
            "audio",
            &["wav", "mp3", "ogg", "flac"],
            200 * MIB,
            &["binary_reader"],
            &binary_metrics,
        ),
        Capability::new(
            "archive",
            &["zip", "tar", "gz", "tgz", "7z"],
            GIB,
            &["binary_reader"],
            &binary_metrics,
        ),
    ]
}

/// Lowercased suffix after the last '.' of the file name, if any.
pub fn extension_of(path: &str) -> Option<String> {
    let name = Path::new(path).file_name()?.to_str()?;
    let (_, ext) = name.rsplit_once('.')?;
    if ext.is_empty() {
        None
    } else {
        Some(ext.to_lowercase())
    }
}

/// Extension → capability lookup, built once and read-only afterwards.
#[derive(Debug, Clone)]
pub struct CapabilityRegistry {
    capabilities: Vec<Capability>,
    by_extension: HashMap<String, usize>,
}

impl CapabilityRegistry {
    pub fn new(descriptors: Vec<Capability>) -> Result<Self> {
        let mut by_extension = HashMap::new();

        for (idx, cap) in descriptors.iter().enumerate() {
            if cap.extensions.is_empty() {
                return Err(PipelineError::InvalidRegistry(format!(
                    "capability '{}' declares no extensions",
                    cap.file_type
                )));
            }
            if cap.max_size == 0 {
                return Err(PipelineError::InvalidRegistry(format!(
                    "capability '{}' has a zero size limit",
                    cap.file_type
                )));
            }
            if cap.reading_methods.is_empty() {
                return Err(PipelineError::InvalidRegistry(format!(
                    "capability '{}' declares no reading methods",
                    cap.file_type
                )));
            }

            for ext in &cap.extensions {
                let ext = ext.trim_start_matches('.').to_lowercase();
                by_extension.insert(ext, idx);
            }
        }

        Ok(Self {
            capabilities: descriptors,
            by_extension,
        })
    }

    /// Built-in table followed by `extra` descriptors (which win on conflict).
    pub fn with_builtins(extra: Vec<Capability>) -> Result<Self> {
        let mut descriptors = builtin_capabilities();
        descriptors.extend(extra);
        Self::new(descriptors)
    }

    pub fn resolve(&self, extension: &str) -> Option<&Capability> {
        let ext = extension.trim_start_matches('.').to_lowercase();
        self.by_extension
            .get(&ext)
            .map(|&idx| &self.capabilities[idx])
    }

    pub fn resolve_path(&self, path: &str) -> Option<&Capability> {
        extension_of(path).and_then(|ext| self.resolve(&ext))
    }

    pub fn capabilities(&self) -> &[Capability] {
        &self.capabilities
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_builtin() {
        let registry = CapabilityRegistry::with_builtins(Vec::new()).unwrap();
        let cap = registry.resolve("txt").unwrap();
        assert_eq!(cap.file_type, "text");
        assert_eq!(cap.reading_methods[0], "text_reader");

        let zip = registry.resolve("ZIP").unwrap();
        assert_eq!(zip.max_size, GIB);
        assert!(registry.resolve("exe").is_none());
    }

    #[test]
    fn test_last_write_wins() {
        let registry = CapabilityRegistry::with_builtins(Vec::new()).unwrap();
        assert_eq!(registry.resolve("md").unwrap().file_type, "document");
        assert_eq!(registry.resolve("xml").unwrap().file_type, "document");
    }

    #[test]
    fn test_extension_of() {
        assert_eq!(extension_of("notes.txt").as_deref(), Some("txt"));
        assert_eq!(extension_of("dir.v2/Archive.TAR.GZ").as_deref(), Some("gz"));
        assert_eq!(extension_of("Makefile"), None);
        assert_eq!(extension_of("trailing."), None);
    }

    #[test]
    fn test_malformed_registry_rejected() {
        let bad = Capability::new("empty", &[], MIB, &["text_reader"], &[]);
        assert!(matches!(
            CapabilityRegistry::new(vec![bad]),
            Err(PipelineError::InvalidRegistry(_))
        ));

        let no_methods = Capability::new("bare", &["bin"], MIB, &[], &[]);
        assert!(CapabilityRegistry::new(vec![no_methods]).is_err());
    }

    #[test]
    fn test_extra_descriptor_overrides() {
        let extra = Capability::new("notebook", &["txt"], KIB, &["direct_read"], &[]);
        let registry = CapabilityRegistry::with_builtins(vec![extra]).unwrap();
        assert_eq!(registry.resolve_path("a/b/notes.txt").unwrap().file_type, "notebook");
    }
}
