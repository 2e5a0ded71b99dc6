//! Load and validate every configured content document.

use anyhow::{bail, Result};
use serde::Serialize;
use turbo_content::CacheStats;
use turbo_site_content::WarmReport;

use super::CheckArgs;
use crate::context::Context;
use crate::output::status_badge;

#[derive(Serialize)]
struct CheckSummary<'a> {
    healthy: bool,
    #[serde(flatten)]
    report: &'a WarmReport,
    #[serde(skip_serializing_if = "Option::is_none")]
    stats: Option<CacheStats>,
}

/// Run the check command.
pub async fn run(args: CheckArgs, ctx: &Context) -> Result<()> {
    let site = ctx.site()?;
    match &ctx.config_path {
        Some(path) => ctx.output.debug(&format!("config: {}", path.display())),
        None => ctx.output.debug("no config file found, using defaults"),
    }

    ctx.output.header("Checking storefront content");
    let spinner = ctx.output.spinner("Loading content documents...");
    let report = site.warm().await;
    spinner.finish_and_clear();

    let stats = args.stats.then(|| site.stats());

    if ctx.output.is_json() {
        ctx.output.json(&CheckSummary {
            healthy: report.is_healthy(),
            report: &report,
            stats,
        });
    } else {
        for doc in &report.documents {
            ctx.output.kv(
                doc.path.as_str(),
                &format!("{} ({})", status_badge(doc.is_valid()), doc.kind),
            );
            for err in &doc.errors {
                ctx.output.list_item(&err.to_string());
            }
        }

        if let Some(stats) = stats {
            ctx.output.header("Cache");
            ctx.output.kv("loads", &stats.loads.to_string());
            ctx.output.kv("hits", &stats.hits.to_string());
            ctx.output.kv("coalesced", &stats.coalesced.to_string());
            ctx.output.kv("valid", &stats.valid.to_string());
            ctx.output.kv("invalid", &stats.invalid.to_string());
        }
    }

    if !report.is_healthy() {
        bail!(
            "{} of {} content document(s) invalid",
            report.invalid_count(),
            report.documents.len()
        );
    }

    ctx.output
        .success(&format!("All {} content documents are valid", report.documents.len()));
    Ok(())
}
