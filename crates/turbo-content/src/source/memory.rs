//! Bundled in-memory documents.

use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;

use super::{parse_document, ContentSource, RawDocument};
use crate::error::SourceError;
use crate::path::LogicalPath;

/// Documents compiled into the binary or assembled in tests.
///
/// Text is kept unparsed and parsed on every fetch, like reading a file.
#[derive(Debug, Default)]
pub struct MemorySource {
    documents: RwLock<HashMap<LogicalPath, String>>,
}

impl MemorySource {
    /// Create an empty source.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a document, builder style.
    pub fn with_document(self, path: LogicalPath, text: impl Into<String>) -> Self {
        self.insert(path, text);
        self
    }

    /// Add or replace a document.
    ///
    /// Cached outcomes are unaffected until the path is invalidated.
    pub fn insert(&self, path: LogicalPath, text: impl Into<String>) {
        self.documents
            .write()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .insert(path, text.into());
    }

    /// Remove a document.
    pub fn remove(&self, path: &LogicalPath) -> bool {
        self.documents
            .write()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .remove(path)
            .is_some()
    }

    /// Number of documents held.
    pub fn len(&self) -> usize {
        self.documents
            .read()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .len()
    }

    /// Whether no documents are held.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl ContentSource for MemorySource {
    async fn fetch(&self, path: &LogicalPath) -> Result<RawDocument, SourceError> {
        let text = self
            .documents
            .read()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .get(path)
            .cloned()
            .ok_or_else(|| SourceError::NotFound { path: path.clone() })?;

        parse_document(path, &text)
    }

    fn name(&self) -> &str {
        "memory"
    }
}
