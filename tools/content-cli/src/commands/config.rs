//! Configuration management commands.

use std::fs;

use anyhow::{bail, Context as _, Result};
use turbo_site_content::{generate_default_config, CONFIG_FILE_NAMES};

use super::{ConfigArgs, ConfigCommand};
use crate::context::Context;

/// Run the config command.
pub async fn run(args: ConfigArgs, ctx: &Context) -> Result<()> {
    match args.command {
        ConfigCommand::Show => show_config(ctx),
        ConfigCommand::Init { force } => init_config(force, ctx),
    }
}

fn show_config(ctx: &Context) -> Result<()> {
    if ctx.output.is_json() {
        ctx.output.json(&ctx.config);
        return Ok(());
    }

    ctx.output.header("Current Configuration");
    match &ctx.config_path {
        Some(path) => ctx.output.kv("file", &path.display().to_string()),
        None => ctx.output.kv("file", "(defaults)"),
    }

    let config = &ctx.config;
    ctx.output
        .kv("root", &config.root_dir(ctx.base_dir()).display().to_string());
    ctx.output.kv("navigation", &config.navigation);
    ctx.output.kv("validation_messages", &config.validation_messages);
    ctx.output.kv("preload", &config.preload.to_string());

    ctx.output.info("[policies]");
    ctx.output.kv("dir", &config.policies.dir);
    for slug in &config.policies.pages {
        ctx.output.list_item(slug);
    }

    Ok(())
}

fn init_config(force: bool, ctx: &Context) -> Result<()> {
    let config_path = ctx.cwd.join(CONFIG_FILE_NAMES[0]);

    if config_path.exists() && !force {
        bail!(
            "Config file already exists: {}. Use --force to overwrite.",
            config_path.display()
        );
    }

    fs::write(&config_path, generate_default_config())
        .with_context(|| format!("Failed to write config file: {}", config_path.display()))?;

    ctx.output.success(&format!("Created: {}", config_path.display()));
    Ok(())
}
