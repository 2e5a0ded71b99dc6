//! Static policy pages (privacy, returns, terms, ...).

use std::sync::Arc;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::json;
use turbo_content::{
    FieldError, FieldPath, JsonSchemaValidator, LogicalPath, RawDocument, SchemaError,
    SchemaValidator,
};

/// Content kind name for policy documents.
pub const POLICY_KIND: &str = "policy";

/// A policy page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PolicyPage {
    pub slug: String,
    pub title: String,
    pub last_updated: NaiveDate,
    pub sections: Vec<PolicySection>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PolicySection {
    pub heading: String,
    pub paragraphs: Vec<String>,
}

impl PolicyPage {
    /// Words across all paragraphs, for reading-time estimates.
    pub fn word_count(&self) -> usize {
        self.sections
            .iter()
            .flat_map(|s| s.paragraphs.iter())
            .map(|p| p.split_whitespace().count())
            .sum()
    }
}

/// Whether `slug` is a usable policy slug: lowercase ascii letters, digits
/// and inner `-`.
pub fn is_valid_slug(slug: &str) -> bool {
    !slug.is_empty()
        && !slug.starts_with('-')
        && !slug.ends_with('-')
        && slug
            .bytes()
            .all(|b| b.is_ascii_lowercase() || b.is_ascii_digit() || b == b'-')
}

/// Logical path of the policy `slug` under `dir`, if the slug is valid.
pub fn policy_path(dir: &str, slug: &str) -> Option<LogicalPath> {
    if !is_valid_slug(slug) {
        return None;
    }
    let dir = dir.trim_end_matches('/');
    let path = if dir.is_empty() {
        format!("{slug}.json")
    } else {
        format!("{dir}/{slug}.json")
    };
    LogicalPath::new(path).ok()
}

fn check_policy(page: &PolicyPage) -> Vec<FieldError> {
    let mut errors = Vec::new();
    if page.title.trim().is_empty() {
        errors.push(FieldError::new(FieldPath::root().field("title"), "title must not be blank"));
    }
    if page.sections.is_empty() {
        errors.push(FieldError::new(
            FieldPath::root().field("sections"),
            "policy needs at least one section",
        ));
    }
    errors
}

/// Validator for one policy page.
///
/// Besides the document shape it checks that the document's `slug` matches
/// the slug it was requested under.
#[derive(Debug, Clone)]
pub struct PolicyValidator {
    inner: JsonSchemaValidator<PolicyPage>,
    slug: Arc<str>,
}

/// Shape validator shared by every policy page.
pub fn policy_schema_validator() -> Result<JsonSchemaValidator<PolicyPage>, SchemaError> {
    let schema = json!({
        "type": "object",
        "required": ["slug", "title", "last_updated", "sections"],
        "properties": {
            "slug": { "type": "string" },
            "title": { "type": "string" },
            "last_updated": { "type": "string", "format": "date" },
            "sections": {
                "type": "array",
                "items": {
                    "type": "object",
                    "required": ["heading", "paragraphs"],
                    "properties": {
                        "heading": { "type": "string", "minLength": 1 },
                        "paragraphs": { "type": "array", "items": { "type": "string" } }
                    }
                }
            }
        }
    });

    Ok(JsonSchemaValidator::new(POLICY_KIND, &schema)?.with_checks(check_policy))
}

impl PolicyValidator {
    pub fn new(slug: &str) -> Result<Self, SchemaError> {
        Ok(Self::with_schema(policy_schema_validator()?, slug))
    }

    /// Reuse an already compiled shape validator.
    pub fn with_schema(inner: JsonSchemaValidator<PolicyPage>, slug: &str) -> Self {
        Self {
            inner,
            slug: Arc::from(slug),
        }
    }

    /// Slug this validator expects.
    pub fn slug(&self) -> &str {
        &self.slug
    }
}

impl SchemaValidator for PolicyValidator {
    type Output = PolicyPage;

    fn kind(&self) -> &'static str {
        POLICY_KIND
    }

    fn validate(&self, raw: &RawDocument) -> Result<PolicyPage, Vec<FieldError>> {
        let page = self.inner.validate(raw)?;
        if page.slug != *self.slug {
            return Err(vec![FieldError::new(
                FieldPath::root().field("slug"),
                format!("expected slug {:?}, found {:?}", &*self.slug, page.slug),
            )]);
        }
        Ok(page)
    }
}
