//! Content loading error types.

use serde::Serialize;
use thiserror::Error;

use crate::outcome::{FieldError, FieldErrors};
use crate::path::LogicalPath;

/// Errors reported by a content source.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SourceError {
    /// No document exists at the path.
    #[error("content not found: {path}")]
    NotFound { path: LogicalPath },

    /// The document exists but is not well-formed.
    #[error("failed to parse {path}: {reason}")]
    Parse { path: LogicalPath, reason: String },

    /// The backing store could not be read.
    #[error("content source unavailable for {path}: {reason}")]
    Unavailable { path: LogicalPath, reason: String },
}

/// Why a load produced `Outcome::Invalid`.
///
/// Stored in the cache alongside successful content; never raised past the
/// loader.
#[derive(Error, Debug)]
pub enum LoadError {
    /// The source has no document at the path.
    #[error("content not found: {path}")]
    SourceNotFound { path: LogicalPath },

    /// The source could not parse the document.
    #[error("failed to parse {path}: {reason}")]
    SourceParseFailure { path: LogicalPath, reason: String },

    /// The source failed for a reason other than absence or syntax.
    #[error("content source unavailable for {path}: {reason}")]
    SourceUnavailable { path: LogicalPath, reason: String },

    /// The document did not match the schema for its kind.
    #[error("{path} failed {kind} validation:\n{errors}")]
    SchemaValidation {
        path: LogicalPath,
        kind: &'static str,
        errors: FieldErrors,
    },

    /// The path is cached with a different content type than requested.
    #[error("{path} is cached as a different content kind than {expected}")]
    KindMismatch {
        path: LogicalPath,
        expected: &'static str,
    },

    /// The validator panicked while judging the document.
    #[error("{kind} validator panicked while checking {path}")]
    ValidatorPanicked {
        path: LogicalPath,
        kind: &'static str,
    },

    /// The in-flight load was dropped before producing an outcome.
    #[error("load of {path} was abandoned before completing")]
    Abandoned { path: LogicalPath },
}

/// Coarse category of a `LoadError`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    SourceNotFound,
    SourceParseFailure,
    SourceUnavailable,
    SchemaValidation,
    KindMismatch,
    ValidatorPanicked,
    Abandoned,
}

impl FailureKind {
    /// Stable name for logs and reports.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::SourceNotFound => "source_not_found",
            Self::SourceParseFailure => "source_parse_failure",
            Self::SourceUnavailable => "source_unavailable",
            Self::SchemaValidation => "schema_validation",
            Self::KindMismatch => "kind_mismatch",
            Self::ValidatorPanicked => "validator_panicked",
            Self::Abandoned => "abandoned",
        }
    }
}

impl std::fmt::Display for FailureKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl LoadError {
    /// The failure category.
    pub fn kind(&self) -> FailureKind {
        match self {
            Self::SourceNotFound { .. } => FailureKind::SourceNotFound,
            Self::SourceParseFailure { .. } => FailureKind::SourceParseFailure,
            Self::SourceUnavailable { .. } => FailureKind::SourceUnavailable,
            Self::SchemaValidation { .. } => FailureKind::SchemaValidation,
            Self::KindMismatch { .. } => FailureKind::KindMismatch,
            Self::ValidatorPanicked { .. } => FailureKind::ValidatorPanicked,
            Self::Abandoned { .. } => FailureKind::Abandoned,
        }
    }

    /// The logical path the failure belongs to.
    pub fn path(&self) -> &LogicalPath {
        match self {
            Self::SourceNotFound { path }
            | Self::SourceParseFailure { path, .. }
            | Self::SourceUnavailable { path, .. }
            | Self::SchemaValidation { path, .. }
            | Self::KindMismatch { path, .. }
            | Self::ValidatorPanicked { path, .. }
            | Self::Abandoned { path } => path,
        }
    }

    /// Whether the document is simply missing.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::SourceNotFound { .. })
    }

    /// Failure as an ordered list of field errors.
    ///
    /// Non-schema failures become a single error at the document root.
    pub fn field_errors(&self) -> Vec<FieldError> {
        match self {
            Self::SchemaValidation { errors, .. } => errors.as_slice().to_vec(),
            other => vec![FieldError::root(other.to_string())],
        }
    }
}

impl From<SourceError> for LoadError {
    fn from(err: SourceError) -> Self {
        match err {
            SourceError::NotFound { path } => LoadError::SourceNotFound { path },
            SourceError::Parse { path, reason } => LoadError::SourceParseFailure { path, reason },
            SourceError::Unavailable { path, reason } => {
                LoadError::SourceUnavailable { path, reason }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::FieldPath;

    fn path() -> LogicalPath {
        LogicalPath::new("content/navigation.json").unwrap()
    }

    #[test]
    fn test_source_error_conversion() {
        let err: LoadError = SourceError::NotFound { path: path() }.into();
        assert_eq!(err.kind(), FailureKind::SourceNotFound);
        assert!(err.is_not_found());

        let err: LoadError = SourceError::Parse {
            path: path(),
            reason: "expected value at line 1".into(),
        }
        .into();
        assert_eq!(err.kind(), FailureKind::SourceParseFailure);
        assert_eq!(err.path(), &path());
    }

    #[test]
    fn test_schema_error_field_errors() {
        let errors = FieldErrors::new(vec![FieldError::new(
            FieldPath::root().field("header").field("nav_items"),
            "\"nav_items\" is a required property",
        )]);
        let err = LoadError::SchemaValidation {
            path: path(),
            kind: "navigation",
            errors,
        };

        let fields = err.field_errors();
        assert_eq!(fields.len(), 1);
        assert_eq!(fields[0].path.to_string(), "header.nav_items");
        assert!(err.to_string().contains("navigation validation"));
    }

    #[test]
    fn test_non_schema_error_is_root_field_error() {
        let err = LoadError::SourceNotFound { path: path() };
        let fields = err.field_errors();
        assert_eq!(fields.len(), 1);
        assert!(fields[0].path.is_root());
        assert!(fields[0].message.contains("content/navigation.json"));
    }

    #[test]
    fn test_failure_kind_display() {
        assert_eq!(FailureKind::SchemaValidation.to_string(), "schema_validation");
        assert_eq!(
            serde_json::to_string(&FailureKind::SourceNotFound).unwrap(),
            r#""source_not_found""#
        );
    }
}
