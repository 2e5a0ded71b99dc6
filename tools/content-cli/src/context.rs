//! CLI execution context.

use std::path::{Path, PathBuf};

use anyhow::{Context as _, Result};
use turbo_site_content::{ContentConfig, SiteContent};

use crate::output::Output;

/// Execution context for CLI commands.
pub struct Context {
    /// Content configuration.
    pub config: ContentConfig,
    /// Config file the configuration came from, if any.
    pub config_path: Option<PathBuf>,
    pub output: Output,
    pub cwd: PathBuf,
}

impl Context {
    /// Load context from an explicit config file, or search upwards from the
    /// working directory. Without any config file the defaults apply.
    pub fn load(config_path: Option<&str>, output: Output) -> Result<Self> {
        let cwd = std::env::current_dir().context("Failed to get current directory")?;

        let (config_path, config) = match config_path {
            Some(path) => {
                let path = resolve(&cwd, path);
                let config = ContentConfig::load(&path)?;
                (Some(path), config)
            }
            None => match ContentConfig::find(&cwd) {
                Some((path, config)) => (Some(path), config),
                None => (None, ContentConfig::default()),
            },
        };

        Ok(Self {
            config,
            config_path,
            output,
            cwd,
        })
    }

    /// Directory content paths are resolved against.
    pub fn base_dir(&self) -> &Path {
        self.config_path
            .as_deref()
            .and_then(Path::parent)
            .unwrap_or(self.cwd.as_path())
    }

    /// Content facade over the configured content root.
    pub fn site(&self) -> Result<SiteContent> {
        SiteContent::from_config(&self.config, self.base_dir())
            .context("Failed to set up storefront content")
    }
}

fn resolve(cwd: &Path, path: &str) -> PathBuf {
    let path = PathBuf::from(path);
    if path.is_absolute() {
        path
    } else {
        cwd.join(path)
    }
}
