//! CLI command implementations.

pub mod check;
pub mod config;
pub mod show;

use clap::{Args, Subcommand};

/// Arguments for the check command.
#[derive(Args)]
pub struct CheckArgs {
    /// Also print cache statistics.
    #[arg(long)]
    pub stats: bool,
}

/// Arguments for the show command.
#[derive(Args)]
pub struct ShowArgs {
    #[command(subcommand)]
    pub command: ShowCommand,
}

#[derive(Subcommand)]
pub enum ShowCommand {
    /// Header and footer navigation.
    Navigation,
    /// Validation message templates.
    Messages {
        /// Render one message instead of printing every template.
        #[arg(long)]
        render: Option<String>,

        /// Placeholder value for --render, as name=value.
        #[arg(short, long = "param", value_parser = parse_param)]
        params: Vec<(String, String)>,
    },
    /// A policy page.
    Policy {
        /// Policy slug, e.g. "privacy".
        slug: String,
    },
}

fn parse_param(raw: &str) -> Result<(String, String), String> {
    raw.split_once('=')
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .ok_or_else(|| format!("expected name=value, got {raw:?}"))
}

/// Arguments for the config command.
#[derive(Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Subcommand)]
pub enum ConfigCommand {
    /// Show current configuration.
    Show,
    /// Initialize a new config file.
    Init {
        /// Force overwrite existing config.
        #[arg(short, long)]
        force: bool,
    },
}
