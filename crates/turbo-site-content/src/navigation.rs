//! Header and footer navigation.

use serde::{Deserialize, Serialize};
use serde_json::json;
use turbo_content::{FieldError, FieldPath, JsonSchemaValidator, SchemaError};

/// Content kind name for navigation documents.
pub const NAVIGATION_KIND: &str = "navigation";

/// Site navigation menus.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Navigation {
    pub header: Header,
    #[serde(default)]
    pub footer: Footer,
}

/// Header menu.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Header {
    pub nav_items: Vec<NavItem>,
    /// Call-to-action button shown next to the menu.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cta: Option<NavLink>,
}

/// Top-level header entry, optionally with a dropdown.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NavItem {
    pub label: String,
    pub href: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<NavLink>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NavLink {
    pub label: String,
    pub href: String,
}

/// Footer menu.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Footer {
    #[serde(default)]
    pub columns: Vec<FooterColumn>,
    #[serde(default)]
    pub legal: Vec<NavLink>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FooterColumn {
    pub title: String,
    pub links: Vec<NavLink>,
}

impl Navigation {
    /// Total number of links across header and footer.
    pub fn link_count(&self) -> usize {
        let header: usize = self
            .header
            .nav_items
            .iter()
            .map(|item| 1 + item.children.len())
            .sum();
        let cta = usize::from(self.header.cta.is_some());
        let columns: usize = self.footer.columns.iter().map(|c| c.links.len()).sum();
        header + cta + columns + self.footer.legal.len()
    }
}

/// Whether `href` may appear in storefront navigation.
///
/// Site-relative paths, `https://` and `mailto:` links are accepted.
/// Protocol-relative `//host` links are not.
pub fn is_allowed_href(href: &str) -> bool {
    (href.starts_with('/') && !href.starts_with("//"))
        || href.starts_with("https://")
        || href.starts_with("mailto:")
}

fn check_link(path: &FieldPath, label: &str, href: &str, errors: &mut Vec<FieldError>) {
    if label.trim().is_empty() {
        errors.push(FieldError::new(path.field("label"), "label must not be blank"));
    }
    if !is_allowed_href(href) {
        errors.push(FieldError::new(
            path.field("href"),
            format!("unsupported link target {href:?}"),
        ));
    }
}

fn check_navigation(nav: &Navigation) -> Vec<FieldError> {
    let mut errors = Vec::new();

    let items = FieldPath::root().field("header").field("nav_items");
    for (i, item) in nav.header.nav_items.iter().enumerate() {
        let at = items.index(i);
        check_link(&at, &item.label, &item.href, &mut errors);
        for (j, child) in item.children.iter().enumerate() {
            check_link(
                &at.field("children").index(j),
                &child.label,
                &child.href,
                &mut errors,
            );
        }
    }

    if let Some(cta) = &nav.header.cta {
        let at = FieldPath::root().field("header").field("cta");
        check_link(&at, &cta.label, &cta.href, &mut errors);
    }

    let footer = FieldPath::root().field("footer");
    for (i, column) in nav.footer.columns.iter().enumerate() {
        let at = footer.field("columns").index(i);
        if column.title.trim().is_empty() {
            errors.push(FieldError::new(at.field("title"), "title must not be blank"));
        }
        for (j, link) in column.links.iter().enumerate() {
            check_link(&at.field("links").index(j), &link.label, &link.href, &mut errors);
        }
    }
    for (i, link) in nav.footer.legal.iter().enumerate() {
        check_link(&footer.field("legal").index(i), &link.label, &link.href, &mut errors);
    }

    errors
}

/// Validator for `content/navigation.json`.
pub fn navigation_validator() -> Result<JsonSchemaValidator<Navigation>, SchemaError> {
    let link = json!({
        "type": "object",
        "required": ["label", "href"],
        "properties": {
            "label": { "type": "string" },
            "href": { "type": "string", "minLength": 1 }
        }
    });

    let schema = json!({
        "type": "object",
        "required": ["header"],
        "properties": {
            "header": {
                "type": "object",
                "required": ["nav_items"],
                "properties": {
                    "nav_items": {
                        "type": "array",
                        "items": {
                            "type": "object",
                            "required": ["label", "href"],
                            "properties": {
                                "label": { "type": "string" },
                                "href": { "type": "string", "minLength": 1 },
                                "children": { "type": "array", "items": link }
                            }
                        }
                    },
                    "cta": link
                }
            },
            "footer": {
                "type": "object",
                "properties": {
                    "columns": {
                        "type": "array",
                        "items": {
                            "type": "object",
                            "required": ["title", "links"],
                            "properties": {
                                "title": { "type": "string" },
                                "links": { "type": "array", "items": link }
                            }
                        }
                    },
                    "legal": { "type": "array", "items": link }
                }
            }
        }
    });

    Ok(JsonSchemaValidator::new(NAVIGATION_KIND, &schema)?.with_checks(check_navigation))
}
