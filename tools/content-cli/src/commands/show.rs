//! Print validated content.

use anyhow::{bail, Result};
use serde::Serialize;
use turbo_content::{LoadError, Outcome};

use super::{ShowArgs, ShowCommand};
use crate::context::Context;

/// Run the show command.
pub async fn run(args: ShowArgs, ctx: &Context) -> Result<()> {
    let site = ctx.site()?;
    if let Some(report) = site.preload().await {
        ctx.output.debug(&format!(
            "preloaded {} document(s), {} invalid",
            report.documents.len(),
            report.invalid_count()
        ));
    }

    match args.command {
        ShowCommand::Navigation => print_outcome(ctx, site.navigation().await),
        ShowCommand::Policy { slug } => print_outcome(ctx, site.policy_page(&slug).await),
        ShowCommand::Messages { render: None, .. } => {
            print_outcome(ctx, site.validation_messages().await)
        }
        ShowCommand::Messages {
            render: Some(key),
            params,
        } => {
            let messages = match site.validation_messages().await.into_result() {
                Ok(messages) => messages,
                Err(err) => return report_failure(ctx, &err),
            };
            if messages.get(&key).is_none() {
                ctx.output.warn(&format!("No template for {key:?}"));
            }
            let params: Vec<(&str, &str)> =
                params.iter().map(|(k, v)| (k.as_str(), v.as_str())).collect();
            let rendered = messages.render(&key, &params);
            if ctx.output.is_json() {
                ctx.output.json(&serde_json::json!({ "key": key, "message": rendered }));
            } else {
                println!("{rendered}");
            }
            Ok(())
        }
    }
}

fn print_outcome<T: Serialize>(ctx: &Context, outcome: Outcome<T>) -> Result<()> {
    match outcome.into_result() {
        Ok(content) => {
            ctx.output.json(&*content);
            Ok(())
        }
        Err(err) => report_failure(ctx, &err),
    }
}

fn report_failure(ctx: &Context, err: &LoadError) -> Result<()> {
    let errors = err.field_errors();
    if ctx.output.is_json() {
        ctx.output.json(&serde_json::json!({
            "path": err.path(),
            "failure": err.kind(),
            "errors": errors,
        }));
    } else {
        for field in &errors {
            ctx.output.list_item(&field.to_string());
        }
    }
    bail!(failure_summary(err))
}

/// One-line summary; the details are already printed per field.
fn failure_summary(err: &LoadError) -> String {
    format!("{} failed for {}", err.kind(), err.path())
}

#[cfg(test)]
mod tests {
    use super::*;
    use turbo_content::{FieldError, FieldErrors, FieldPath, LogicalPath};

    #[test]
    fn test_failure_summary_omits_field_details() {
        let err = LoadError::SchemaValidation {
            path: LogicalPath::new("content/navigation.json").unwrap(),
            kind: "navigation",
            errors: FieldErrors::new(vec![FieldError::new(
                FieldPath::root().field("header").field("nav_items"),
                "\"nav_items\" is a required property",
            )]),
        };

        let summary = failure_summary(&err);
        assert_eq!(summary, "schema_validation failed for content/navigation.json");
        assert!(!summary.contains("nav_items"));
    }

    #[test]
    fn test_failure_summary_for_missing_document() {
        let err = LoadError::SourceNotFound {
            path: LogicalPath::new("content/policies/terms.json").unwrap(),
        };
        assert_eq!(
            failure_summary(&err),
            "source_not_found failed for content/policies/terms.json"
        );
    }
}
