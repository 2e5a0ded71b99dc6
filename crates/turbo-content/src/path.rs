//! Logical document paths.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors for malformed logical paths.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PathError {
    /// The path was empty or whitespace.
    #[error("logical path must not be empty")]
    Empty,

    /// The path contained a control character.
    #[error("logical path contains a control character: {0:?}")]
    ControlCharacter(String),
}

/// Stable identifier naming one configuration document.
///
/// A path identifies exactly one cache slot. Cloning is cheap.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct LogicalPath(Arc<str>);

impl LogicalPath {
    /// Create a logical path, rejecting empty or control-character input.
    pub fn new(path: impl Into<String>) -> Result<Self, PathError> {
        let path = path.into();
        if path.trim().is_empty() {
            return Err(PathError::Empty);
        }
        if path.chars().any(char::is_control) {
            return Err(PathError::ControlCharacter(path));
        }
        Ok(Self(Arc::from(path)))
    }

    /// Get the path as a string.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// File extension of the last segment, if any.
    pub fn extension(&self) -> Option<&str> {
        let last = self.0.rsplit('/').next()?;
        let (stem, ext) = last.rsplit_once('.')?;
        if stem.is_empty() {
            None
        } else {
            Some(ext)
        }
    }
}

impl fmt::Display for LogicalPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for LogicalPath {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl FromStr for LogicalPath {
    type Err = PathError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl TryFrom<String> for LogicalPath {
    type Error = PathError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::new(s)
    }
}

impl TryFrom<&str> for LogicalPath {
    type Error = PathError;

    fn try_from(s: &str) -> Result<Self, Self::Error> {
        Self::new(s)
    }
}

impl From<LogicalPath> for String {
    fn from(path: LogicalPath) -> Self {
        path.0.to_string()
    }
}
