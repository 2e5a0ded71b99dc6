//! Content sources: where raw documents come from.

mod fs;
mod memory;

pub use fs::FsSource;
pub use memory::MemorySource;

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;

use crate::error::SourceError;
use crate::path::LogicalPath;

/// A parsed document before validation.
pub type RawDocument = Value;

/// Fetches raw documents by logical path.
///
/// Implementations only report absence or malformed data; they know nothing
/// about schemas or caching.
#[async_trait]
pub trait ContentSource: Send + Sync {
    /// Fetch and parse the document at `path`.
    async fn fetch(&self, path: &LogicalPath) -> Result<RawDocument, SourceError>;

    /// Short name for logs.
    fn name(&self) -> &str {
        "content"
    }
}

#[async_trait]
impl<S: ContentSource + ?Sized> ContentSource for Arc<S> {
    async fn fetch(&self, path: &LogicalPath) -> Result<RawDocument, SourceError> {
        (**self).fetch(path).await
    }

    fn name(&self) -> &str {
        (**self).name()
    }
}

/// Document syntax, chosen from the path extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentFormat {
    Json,
    Toml,
}

impl DocumentFormat {
    /// Pick a format for `path`. Anything that is not `.toml` is JSON.
    pub fn for_path(path: &LogicalPath) -> Self {
        match path.extension() {
            Some("toml") => Self::Toml,
            _ => Self::Json,
        }
    }
}

/// Parse document text according to the path's format.
pub fn parse_document(path: &LogicalPath, text: &str) -> Result<RawDocument, SourceError> {
    let parsed = match DocumentFormat::for_path(path) {
        DocumentFormat::Json => serde_json::from_str::<Value>(text).map_err(|e| e.to_string()),
        DocumentFormat::Toml => toml::from_str::<Value>(text).map_err(|e| e.to_string()),
    };

    parsed.map_err(|reason| SourceError::Parse {
        path: path.clone(),
        reason,
    })
}
