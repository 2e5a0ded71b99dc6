//! Schema validators: the per-kind judgement of a raw document.
//!
//! The loader is generic over [`SchemaValidator`] and never looks at the
//! concrete content kind. [`JsonSchemaValidator`] is the standard
//! implementation: a JSON Schema (Draft 2020-12, `format` asserted) gate,
//! a serde decode into the typed content, then optional semantic checks on
//! the decoded value.

use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

use jsonschema::error::ValidationErrorKind;
use jsonschema::{ValidationError, Validator};
use serde::de::DeserializeOwned;
use serde_json::Value;
use thiserror::Error;

use crate::outcome::{FieldError, FieldPath};
use crate::source::RawDocument;

/// Judges raw documents of one content kind.
///
/// Implementations are cheap to clone; the loader clones the validator into
/// the task that performs the load.
pub trait SchemaValidator: Send + Sync + 'static {
    /// Validated content type.
    type Output: Send + Sync + 'static;

    /// Content kind name, e.g. `"navigation"`.
    fn kind(&self) -> &'static str;

    /// Validate `raw`, returning typed content or ordered field errors.
    fn validate(&self, raw: &RawDocument) -> Result<Self::Output, Vec<FieldError>>;
}

/// Errors building a validator.
#[derive(Error, Debug)]
pub enum SchemaError {
    /// The schema itself is not a valid JSON Schema.
    #[error("invalid schema for {kind}: {reason}")]
    Build { kind: &'static str, reason: String },
}

/// Semantic checks run after a document decodes.
pub type Checks<T> = fn(&T) -> Vec<FieldError>;

/// JSON Schema gate followed by a typed serde decode.
pub struct JsonSchemaValidator<T> {
    kind: &'static str,
    compiled: Arc<Validator>,
    checks: Option<Checks<T>>,
    _content: PhantomData<fn() -> T>,
}

impl<T> JsonSchemaValidator<T>
where
    T: DeserializeOwned + Send + Sync + 'static,
{
    /// Compile `schema` for content kind `kind`.
    pub fn new(kind: &'static str, schema: &Value) -> Result<Self, SchemaError> {
        let mut opts = jsonschema::options();
        opts.with_draft(jsonschema::Draft::Draft202012)
            .should_validate_formats(true);

        let compiled = opts.build(schema).map_err(|e| SchemaError::Build {
            kind,
            reason: e.to_string(),
        })?;

        Ok(Self {
            kind,
            compiled: Arc::new(compiled),
            checks: None,
            _content: PhantomData,
        })
    }

    /// Run `checks` on every successfully decoded document.
    pub fn with_checks(mut self, checks: Checks<T>) -> Self {
        self.checks = Some(checks);
        self
    }
}

impl<T> Clone for JsonSchemaValidator<T> {
    fn clone(&self) -> Self {
        Self {
            kind: self.kind,
            compiled: Arc::clone(&self.compiled),
            checks: self.checks,
            _content: PhantomData,
        }
    }
}

impl<T> fmt::Debug for JsonSchemaValidator<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JsonSchemaValidator")
            .field("kind", &self.kind)
            .field("checks", &self.checks.is_some())
            .finish()
    }
}

impl<T> SchemaValidator for JsonSchemaValidator<T>
where
    T: DeserializeOwned + Send + Sync + 'static,
{
    type Output = T;

    fn kind(&self) -> &'static str {
        self.kind
    }

    fn validate(&self, raw: &RawDocument) -> Result<T, Vec<FieldError>> {
        let errors: Vec<FieldError> = self
            .compiled
            .iter_errors(raw)
            .map(|err| violation(err, raw))
            .collect();
        if !errors.is_empty() {
            return Err(errors);
        }

        let content = T::deserialize(raw).map_err(|e| {
            vec![FieldError::root(format!(
                "document does not match {} content: {e}",
                self.kind
            ))]
        })?;

        if let Some(checks) = self.checks {
            let errors = checks(&content);
            if !errors.is_empty() {
                return Err(errors);
            }
        }

        Ok(content)
    }
}

/// Convert a schema violation into a field error.
///
/// `required` violations are reported at the parent object; the missing
/// property is appended so the path names the field itself.
fn violation(err: ValidationError<'_>, raw: &RawDocument) -> FieldError {
    let mut path = FieldPath::from_json_pointer(err.instance_path.as_str(), raw);
    if let ValidationErrorKind::Required { property } = &err.kind {
        if let Some(name) = property.as_str() {
            path.push_field(name);
        }
    }
    FieldError::new(path, err.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::outcome::PathSegment;
    use serde::Deserialize;
    use serde_json::json;

    #[derive(Debug, Deserialize, PartialEq)]
    struct Banner {
        headline: String,
        #[serde(default)]
        links: Vec<String>,
    }

    fn banner_schema() -> Value {
        json!({
            "type": "object",
            "required": ["headline"],
            "properties": {
                "headline": { "type": "string", "minLength": 1 },
                "links": { "type": "array", "items": { "type": "string" } }
            }
        })
    }

    fn no_http(banner: &Banner) -> Vec<FieldError> {
        banner
            .links
            .iter()
            .enumerate()
            .filter(|(_, link)| link.starts_with("http://"))
            .map(|(i, _)| {
                FieldError::new(FieldPath::root().field("links").index(i), "must not use http")
            })
            .collect()
    }

    #[test]
    fn test_valid_document() {
        let validator = JsonSchemaValidator::<Banner>::new("banner", &banner_schema()).unwrap();
        let banner = validator
            .validate(&json!({ "headline": "Spring sale", "links": ["/sale"] }))
            .unwrap();
        assert_eq!(banner.headline, "Spring sale");
        assert_eq!(validator.kind(), "banner");
    }

    #[test]
    fn test_missing_required_field_names_the_field() {
        let validator = JsonSchemaValidator::<Banner>::new("banner", &banner_schema()).unwrap();
        let errors = validator.validate(&json!({ "links": [] })).unwrap_err();

        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].path.to_string(), "headline");
        assert!(errors[0].message.contains("headline"));
    }

    #[test]
    fn test_nested_type_error_path() {
        let validator = JsonSchemaValidator::<Banner>::new("banner", &banner_schema()).unwrap();
        let errors = validator
            .validate(&json!({ "headline": "x", "links": ["/a", 3] }))
            .unwrap_err();

        assert_eq!(errors[0].path.to_string(), "links[1]");
    }

    #[test]
    fn test_checks_run_after_decode() {
        let validator = JsonSchemaValidator::<Banner>::new("banner", &banner_schema())
            .unwrap()
            .with_checks(no_http);

        let errors = validator
            .validate(&json!({ "headline": "x", "links": ["/ok", "http://plain"] }))
            .unwrap_err();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].path.to_string(), "links[1]");

        assert!(validator.validate(&json!({ "headline": "x" })).is_ok());
    }

    #[test]
    fn test_numeric_object_key_stays_a_field() {
        let schema = json!({
            "type": "object",
            "properties": {
                "messages": { "type": "object", "additionalProperties": { "type": "string" } }
            }
        });
        let validator = JsonSchemaValidator::<Value>::new("messages", &schema).unwrap();
        let errors = validator
            .validate(&json!({ "messages": { "404": 3 } }))
            .unwrap_err();

        assert_eq!(
            errors[0].path.segments(),
            &[
                PathSegment::Field("messages".into()),
                PathSegment::Field("404".into())
            ]
        );
        assert_eq!(errors[0].path.to_string(), "messages.404");
    }

    #[test]
    fn test_date_format_is_asserted() {
        let schema = json!({
            "type": "object",
            "properties": { "published": { "type": "string", "format": "date" } }
        });
        let validator = JsonSchemaValidator::<Value>::new("post", &schema).unwrap();

        let errors = validator
            .validate(&json!({ "published": "2023-02-29" }))
            .unwrap_err();
        assert_eq!(errors[0].path.to_string(), "published");
        assert!(validator.validate(&json!({ "published": "2024-02-29" })).is_ok());
    }

    #[test]
    fn test_invalid_schema_rejected() {
        let err = JsonSchemaValidator::<Banner>::new("banner", &json!({ "type": 12 })).unwrap_err();
        assert!(matches!(err, SchemaError::Build { kind: "banner", .. }));
    }

    #[test]
    fn test_clone_shares_compiled_schema() {
        let validator = JsonSchemaValidator::<Banner>::new("banner", &banner_schema()).unwrap();
        let copy = validator.clone();
        assert!(Arc::ptr_eq(&validator.compiled, &copy.compiled));
    }
}
