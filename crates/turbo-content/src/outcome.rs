//! Load outcomes and structured field errors.

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::LoadError;

/// One step into a structured document.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PathSegment {
    /// Object member name.
    Field(String),
    /// Array position.
    Index(usize),
}

/// Location of a value inside a document, e.g. `header.nav_items[0].href`.
///
/// An empty path is the document root.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FieldPath(Vec<PathSegment>);

impl FieldPath {
    /// The document root.
    pub fn root() -> Self {
        Self::default()
    }

    /// Parse a JSON Pointer (`/header/nav_items/0`) into `document`.
    ///
    /// A token is an array index only where `document` holds an array at
    /// that point, so numeric object keys such as `"404"` stay fields.
    /// Tokens past the end of the document are fields.
    pub fn from_json_pointer(pointer: &str, document: &Value) -> Self {
        let mut node = Some(document);
        let segments = pointer
            .split('/')
            .skip(1)
            .map(|token| {
                let token = token.replace("~1", "/").replace("~0", "~");
                let current = node;
                match current {
                    Some(Value::Array(items)) => match token.parse::<usize>() {
                        Ok(index) => {
                            node = items.get(index);
                            PathSegment::Index(index)
                        }
                        Err(_) => {
                            node = None;
                            PathSegment::Field(token)
                        }
                    },
                    Some(Value::Object(members)) => {
                        node = members.get(&token);
                        PathSegment::Field(token)
                    }
                    _ => {
                        node = None;
                        PathSegment::Field(token)
                    }
                }
            })
            .collect();
        Self(segments)
    }

    /// Append a field segment.
    pub fn push_field(&mut self, name: impl Into<String>) {
        self.0.push(PathSegment::Field(name.into()));
    }

    /// Append an index segment.
    pub fn push_index(&mut self, index: usize) {
        self.0.push(PathSegment::Index(index));
    }

    /// Return a copy extended by a field segment.
    pub fn field(&self, name: impl Into<String>) -> Self {
        let mut path = self.clone();
        path.push_field(name);
        path
    }

    /// Return a copy extended by an index segment.
    pub fn index(&self, index: usize) -> Self {
        let mut path = self.clone();
        path.push_index(index);
        path
    }

    /// Path segments.
    pub fn segments(&self) -> &[PathSegment] {
        &self.0
    }

    /// Whether this is the document root.
    pub fn is_root(&self) -> bool {
        self.0.is_empty()
    }

    /// Whether `prefix` (in dotted form) is a prefix of this path.
    pub fn starts_with(&self, prefix: &str) -> bool {
        let rendered = self.to_string();
        rendered == prefix
            || rendered
                .strip_prefix(prefix)
                .is_some_and(|rest| rest.starts_with('.') || rest.starts_with('['))
    }
}

impl fmt::Display for FieldPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, segment) in self.0.iter().enumerate() {
            match segment {
                PathSegment::Field(name) if i == 0 => write!(f, "{name}")?,
                PathSegment::Field(name) => write!(f, ".{name}")?,
                PathSegment::Index(index) => write!(f, "[{index}]")?,
            }
        }
        Ok(())
    }
}

impl<S: Into<String>> FromIterator<S> for FieldPath {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self(iter.into_iter().map(|s| PathSegment::Field(s.into())).collect())
    }
}

/// A single validation failure at a location in the document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldError {
    /// Where the failure was found.
    pub path: FieldPath,
    /// Human-readable description.
    pub message: String,
}

impl FieldError {
    /// Create a field error.
    pub fn new(path: FieldPath, message: impl Into<String>) -> Self {
        Self {
            path,
            message: message.into(),
        }
    }

    /// Create an error located at the document root.
    pub fn root(message: impl Into<String>) -> Self {
        Self::new(FieldPath::root(), message)
    }
}

impl fmt::Display for FieldError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.path.is_root() {
            write!(f, "(root): {}", self.message)
        } else {
            write!(f, "{}: {}", self.path, self.message)
        }
    }
}

/// Ordered list of field errors from one validation run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FieldErrors(Vec<FieldError>);

impl FieldErrors {
    /// Wrap a list of errors.
    pub fn new(errors: Vec<FieldError>) -> Self {
        Self(errors)
    }

    /// Number of errors.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether there are no errors.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterate over errors in order.
    pub fn iter(&self) -> std::slice::Iter<'_, FieldError> {
        self.0.iter()
    }

    /// Borrow as a slice.
    pub fn as_slice(&self) -> &[FieldError] {
        &self.0
    }

    /// Whether any error is located at or below `path` (dotted form).
    pub fn touches(&self, path: &str) -> bool {
        self.0.iter().any(|e| e.path.starts_with(path))
    }
}

impl fmt::Display for FieldErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, error) in self.0.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            write!(f, "  {error}")?;
        }
        Ok(())
    }
}

impl From<Vec<FieldError>> for FieldErrors {
    fn from(errors: Vec<FieldError>) -> Self {
        Self(errors)
    }
}

impl<'a> IntoIterator for &'a FieldErrors {
    type Item = &'a FieldError;
    type IntoIter = std::slice::Iter<'a, FieldError>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

/// Result of loading one document.
///
/// Both arms are shared: every caller that hits the same cache entry holds
/// the same allocation.
pub enum Outcome<T> {
    /// Schema-conformant content.
    Valid(Arc<T>),
    /// The document could not be fetched or did not validate.
    Invalid(Arc<LoadError>),
}

impl<T> Outcome<T> {
    /// Wrap validated content.
    pub fn valid(content: T) -> Self {
        Self::Valid(Arc::new(content))
    }

    /// Wrap a load failure.
    pub fn invalid(error: LoadError) -> Self {
        Self::Invalid(Arc::new(error))
    }

    /// Whether this outcome carries content.
    pub fn is_valid(&self) -> bool {
        matches!(self, Self::Valid(_))
    }

    /// Whether this outcome carries a failure.
    pub fn is_invalid(&self) -> bool {
        matches!(self, Self::Invalid(_))
    }

    /// The content, if valid.
    pub fn content(&self) -> Option<&Arc<T>> {
        match self {
            Self::Valid(content) => Some(content),
            Self::Invalid(_) => None,
        }
    }

    /// The failure, if invalid.
    pub fn error(&self) -> Option<&LoadError> {
        match self {
            Self::Valid(_) => None,
            Self::Invalid(error) => Some(error),
        }
    }

    /// Convert into a `Result`.
    pub fn into_result(self) -> Result<Arc<T>, Arc<LoadError>> {
        match self {
            Self::Valid(content) => Ok(content),
            Self::Invalid(error) => Err(error),
        }
    }

    /// Whether both outcomes share the same allocation.
    pub fn ptr_eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Valid(a), Self::Valid(b)) => Arc::ptr_eq(a, b),
            (Self::Invalid(a), Self::Invalid(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl<T> Clone for Outcome<T> {
    fn clone(&self) -> Self {
        match self {
            Self::Valid(content) => Self::Valid(Arc::clone(content)),
            Self::Invalid(error) => Self::Invalid(Arc::clone(error)),
        }
    }
}

impl<T: fmt::Debug> fmt::Debug for Outcome<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Valid(content) => f.debug_tuple("Valid").field(content).finish(),
            Self::Invalid(error) => f.debug_tuple("Invalid").field(error).finish(),
        }
    }
}

impl<T: PartialEq> PartialEq for Outcome<T> {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Valid(a), Self::Valid(b)) => a == b,
            (Self::Invalid(a), Self::Invalid(b)) => {
                Arc::ptr_eq(a, b) || a.to_string() == b.to_string()
            }
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::LogicalPath;
    use serde_json::json;

    #[test]
    fn test_field_path_display() {
        let path = FieldPath::root().field("header").field("nav_items").index(2).field("href");
        assert_eq!(path.to_string(), "header.nav_items[2].href");
        assert_eq!(FieldPath::root().to_string(), "");
    }

    #[test]
    fn test_field_path_from_json_pointer() {
        let doc = json!({ "header": { "nav_items": [{ "label": "Shop" }] } });
        let path = FieldPath::from_json_pointer("/header/nav_items/0/label", &doc);
        assert_eq!(path.to_string(), "header.nav_items[0].label");

        let escaped = FieldPath::from_json_pointer("/messages/a~1b/c~0d", &json!({}));
        assert_eq!(
            escaped.segments(),
            &[
                PathSegment::Field("messages".into()),
                PathSegment::Field("a/b".into()),
                PathSegment::Field("c~d".into()),
            ]
        );

        assert!(FieldPath::from_json_pointer("", &doc).is_root());
    }

    #[test]
    fn test_field_path_numeric_object_key() {
        let doc = json!({ "messages": { "404": 3 }, "pages": [{ "10": "x" }] });

        let key = FieldPath::from_json_pointer("/messages/404", &doc);
        assert_eq!(
            key.segments(),
            &[PathSegment::Field("messages".into()), PathSegment::Field("404".into())]
        );
        assert_eq!(key.to_string(), "messages.404");

        let nested = FieldPath::from_json_pointer("/pages/0/10", &doc);
        assert_eq!(nested.to_string(), "pages[0].10");
    }

    #[test]
    fn test_field_path_starts_with() {
        let doc = json!({ "header": { "nav_items": [{}, {}] } });
        let path = FieldPath::from_json_pointer("/header/nav_items/1", &doc);
        assert!(path.starts_with("header"));
        assert!(path.starts_with("header.nav_items"));
        assert!(!path.starts_with("header.nav"));
        assert!(!path.starts_with("footer"));
    }

    #[test]
    fn test_field_error_display() {
        let error = FieldError::new(["header", "nav_items"].into_iter().collect(), "is required");
        assert_eq!(error.to_string(), "header.nav_items: is required");

        let root = FieldError::root("expected an object");
        assert_eq!(root.to_string(), "(root): expected an object");
    }

    #[test]
    fn test_field_errors_touches() {
        let errors = FieldErrors::new(vec![
            FieldError::new(FieldPath::root().field("footer").field("columns").index(0).field("title"), "blank"),
        ]);
        assert!(errors.touches("footer.columns"));
        assert!(!errors.touches("header"));
    }

    #[test]
    fn test_outcome_accessors() {
        let valid: Outcome<u32> = Outcome::valid(7);
        assert!(valid.is_valid());
        assert_eq!(valid.content().map(|c| **c), Some(7));
        assert!(valid.error().is_none());

        let path = LogicalPath::new("missing.json").unwrap();
        let invalid: Outcome<u32> = Outcome::invalid(LoadError::SourceNotFound { path });
        assert!(invalid.is_invalid());
        assert!(invalid.content().is_none());
        assert!(invalid.clone().into_result().is_err());
    }

    #[test]
    fn test_outcome_ptr_eq() {
        let a: Outcome<String> = Outcome::valid("nav".to_string());
        let b = a.clone();
        let c: Outcome<String> = Outcome::valid("nav".to_string());

        assert!(a.ptr_eq(&b));
        assert!(!a.ptr_eq(&c));
        assert_eq!(a, c);
    }
}
