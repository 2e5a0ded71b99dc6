//! Content CLI - check and inspect storefront content.
//!
//! Commands:
//! - `turbo-content check` - Load and validate every configured document
//! - `turbo-content show` - Print validated content as JSON
//! - `turbo-content config` - Manage configuration

mod commands;
mod context;
mod output;
mod telemetry;

use anyhow::Result;
use clap::{Parser, Subcommand};

use commands::{CheckArgs, ConfigArgs, ShowArgs};

/// Check and inspect TurboCommerce storefront content
#[derive(Parser)]
#[command(name = "turbo-content")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Use JSON output format
    #[arg(long, global = true)]
    json: bool,

    /// Config file path
    #[arg(short, long, global = true)]
    config: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Load and validate every configured content document
    Check(CheckArgs),

    /// Print a validated content document
    Show(ShowArgs),

    /// Manage configuration
    Config(ConfigArgs),
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    telemetry::init(cli.verbose, cli.json)?;
    tracing::debug!(version = env!("CARGO_PKG_VERSION"), "turbo-content starting");
    let output = output::Output::new(cli.verbose, cli.json);

    let ctx = match context::Context::load(cli.config.as_deref(), output.clone()) {
        Ok(ctx) => ctx,
        Err(e) => {
            output.error(&format!("{:#}", e));
            std::process::exit(1);
        }
    };

    let result = match cli.command {
        Commands::Check(args) => commands::check::run(args, &ctx).await,
        Commands::Show(args) => commands::show::run(args, &ctx).await,
        Commands::Config(args) => commands::config::run(args, &ctx).await,
    };

    if let Err(e) = result {
        ctx.output.error(&format!("{:#}", e));
        std::process::exit(1);
    }

    Ok(())
}
