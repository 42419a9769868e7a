use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{debug, warn};
use walkdir::WalkDir;

use crate::content::FileDescriptor;
use crate::error::Result;

/// Filesystem access for reading strategies, rooted at a base directory.
#[derive(Debug, Clone)]
pub struct FileAccess {
    base_path: PathBuf,
}

impl FileAccess {
    pub fn new(base_path: impl Into<PathBuf>) -> Self {
        Self {
            base_path: base_path.into(),
        }
    }

    pub fn resolve_path(&self, path: &str) -> PathBuf {
        let path = Path::new(path);
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.base_path.join(path)
        }
    }

    pub async fn read_bytes(&self, path: &str) -> Result<Vec<u8>> {
        let full_path = self.resolve_path(path);
        debug!("Reading file: {:?}", full_path);
        Ok(fs::read(&full_path).await?)
    }

    /// Build descriptors for the given paths. Directories are walked
    /// recursively; the descriptor id is the path as given or discovered.
    pub async fn collect_descriptors(&self, paths: &[String]) -> Result<Vec<FileDescriptor>> {
        let mut descriptors = Vec::new();

        for path in paths {
            let full_path = self.resolve_path(path);
            let metadata = fs::metadata(&full_path).await?;

            if metadata.is_file() {
                descriptors.push(FileDescriptor::new(path.clone(), path.clone(), metadata.len()));
                continue;
            }

            let mut found: Vec<FileDescriptor> = WalkDir::new(&full_path)
                .follow_links(true)
                .into_iter()
                .filter_map(|e| match e {
                    Ok(entry) => Some(entry),
                    Err(err) => {
                        warn!("Skipping unreadable entry: {}", err);
                        None
                    }
                })
                .filter(|e| e.file_type().is_file())
                .filter_map(|e| {
                    let size = e.metadata().ok()?.len();
                    let p = e.path().to_str()?.to_string();
                    Some(FileDescriptor::new(p.clone(), p, size))
                })
                .collect();
            found.sort_by(|a, b| a.path.cmp(&b.path));
            descriptors.extend(found);
        }

        Ok(descriptors)
    }
}
