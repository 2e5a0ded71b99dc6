//! Filesystem-backed content.

use std::io::ErrorKind;
use std::path::{Component, Path, PathBuf};

use async_trait::async_trait;

use super::{parse_document, ContentSource, RawDocument};
use crate::error::SourceError;
use crate::path::LogicalPath;

/// Reads documents relative to a root directory.
///
/// Logical paths are always relative; absolute paths and `..` never escape
/// the root and are reported as not found.
#[derive(Debug, Clone)]
pub struct FsSource {
    root: PathBuf,
}

impl FsSource {
    /// Create a source rooted at `root`.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// The root directory.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Resolve a logical path to a file under the root.
    pub fn resolve(&self, path: &LogicalPath) -> Option<PathBuf> {
        let relative = Path::new(path.as_str());
        let contained = relative
            .components()
            .all(|c| matches!(c, Component::Normal(_) | Component::CurDir));

        contained.then(|| self.root.join(relative))
    }
}

#[async_trait]
impl ContentSource for FsSource {
    async fn fetch(&self, path: &LogicalPath) -> Result<RawDocument, SourceError> {
        let file = self
            .resolve(path)
            .ok_or_else(|| SourceError::NotFound { path: path.clone() })?;

        let text = tokio::fs::read_to_string(&file).await.map_err(|e| match e.kind() {
            ErrorKind::NotFound => SourceError::NotFound { path: path.clone() },
            ErrorKind::InvalidData => SourceError::Parse {
                path: path.clone(),
                reason: format!("not valid UTF-8: {e}"),
            },
            _ => SourceError::Unavailable {
                path: path.clone(),
                reason: format!("cannot read {}: {e}", file.display()),
            },
        })?;

        parse_document(path, &text)
    }

    fn name(&self) -> &str {
        "fs"
    }
}
