//! Form validation message templates.
//!
//! Templates use `{name}` placeholders, filled in by [`ValidationMessages::render`].

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::json;
use turbo_content::{FieldError, FieldPath, JsonSchemaValidator, SchemaError};

/// Content kind name for validation message documents.
pub const MESSAGES_KIND: &str = "validation_messages";

/// Message templates for one locale, keyed by message id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationMessages {
    pub locale: String,
    pub messages: BTreeMap<String, String>,
}

impl ValidationMessages {
    /// Raw template for `key`.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.messages.get(key).map(String::as_str)
    }

    /// Render `key` with `params`.
    ///
    /// Falls back to the key itself when no template exists. Placeholders
    /// without a matching parameter are left in place.
    pub fn render(&self, key: &str, params: &[(&str, &str)]) -> String {
        let Some(template) = self.get(key) else {
            return key.to_string();
        };

        let mut out = String::with_capacity(template.len());
        let mut rest = template;
        while let Some(open) = rest.find('{') {
            out.push_str(&rest[..open]);
            let after = &rest[open + 1..];
            match after.find('}') {
                Some(close) => {
                    let name = &after[..close];
                    match params.iter().find(|(k, _)| *k == name) {
                        Some((_, value)) => out.push_str(value),
                        None => {
                            out.push('{');
                            out.push_str(name);
                            out.push('}');
                        }
                    }
                    rest = &after[close + 1..];
                }
                None => {
                    out.push_str(&rest[open..]);
                    rest = "";
                }
            }
        }
        out.push_str(rest);
        out
    }
}

/// Placeholder names in `template`, or a description of the first syntax error.
pub fn placeholders(template: &str) -> Result<Vec<&str>, String> {
    let mut names = Vec::new();
    let mut start = None;

    for (i, c) in template.char_indices() {
        match (c, start) {
            ('{', None) => start = Some(i + 1),
            ('{', Some(_)) => return Err(format!("nested '{{' at byte {i}")),
            ('}', Some(s)) => {
                let name = &template[s..i];
                if name.is_empty() || !name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
                    return Err(format!("invalid placeholder {{{name}}}"));
                }
                names.push(name);
                start = None;
            }
            ('}', None) => return Err(format!("unmatched '}}' at byte {i}")),
            _ => {}
        }
    }

    match start {
        Some(s) => Err(format!("unclosed '{{' at byte {}", s - 1)),
        None => Ok(names),
    }
}

fn check_messages(doc: &ValidationMessages) -> Vec<FieldError> {
    let messages = FieldPath::root().field("messages");
    doc.messages
        .iter()
        .filter_map(|(key, template)| {
            let at = messages.field(key.as_str());
            if template.trim().is_empty() {
                return Some(FieldError::new(at, "template must not be blank"));
            }
            placeholders(template).err().map(|reason| FieldError::new(at, reason))
        })
        .collect()
}

/// Validator for `content/validation-messages.json`.
pub fn messages_validator() -> Result<JsonSchemaValidator<ValidationMessages>, SchemaError> {
    let schema = json!({
        "type": "object",
        "required": ["locale", "messages"],
        "properties": {
            "locale": { "type": "string", "pattern": "^[a-z]{2}(-[A-Z]{2})?$" },
            "messages": {
                "type": "object",
                "additionalProperties": { "type": "string" }
            }
        }
    });

    Ok(JsonSchemaValidator::new(MESSAGES_KIND, &schema)?.with_checks(check_messages))
}
