//! Content configuration (`content.toml` / `content.json`).

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use turbo_content::{LogicalPath, PathError};

use crate::policy::policy_path;

/// File names searched for when no config path is given, in order.
pub const CONFIG_FILE_NAMES: [&str; 3] = ["content.toml", ".content.toml", "content.json"];

/// Errors loading or saving content configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to write config file {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse TOML config {path}: {source}")]
    Toml {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("failed to parse JSON config {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to serialize config: {0}")]
    Serialize(String),

    #[error("invalid content path in config: {0}")]
    Path(#[from] PathError),

    #[error("invalid policy slug in config: {0}")]
    Slug(String),
}

/// Where storefront content lives and which documents to expect.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentConfig {
    /// Content root directory, relative to the config file.
    #[serde(default = "default_root")]
    pub root: PathBuf,

    /// Navigation document.
    #[serde(default = "default_navigation")]
    pub navigation: String,

    /// Validation messages document.
    #[serde(default = "default_validation_messages")]
    pub validation_messages: String,

    /// Policy pages.
    #[serde(default)]
    pub policies: PolicyConfig,

    /// Load every configured document when the site starts.
    #[serde(default = "default_true")]
    pub preload: bool,
}

/// Policy page configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PolicyConfig {
    /// Directory holding `<slug>.json` documents.
    #[serde(default = "default_policy_dir")]
    pub dir: String,

    /// Slugs of the pages the storefront links to.
    #[serde(default)]
    pub pages: Vec<String>,
}

fn default_root() -> PathBuf {
    PathBuf::from(".")
}

fn default_navigation() -> String {
    "content/navigation.json".to_string()
}

fn default_validation_messages() -> String {
    "content/validation-messages.json".to_string()
}

fn default_policy_dir() -> String {
    "content/policies".to_string()
}

fn default_true() -> bool {
    true
}

impl Default for ContentConfig {
    fn default() -> Self {
        Self {
            root: default_root(),
            navigation: default_navigation(),
            validation_messages: default_validation_messages(),
            policies: PolicyConfig::default(),
            preload: true,
        }
    }
}

impl Default for PolicyConfig {
    fn default() -> Self {
        Self {
            dir: default_policy_dir(),
            pages: Vec::new(),
        }
    }
}

impl ContentConfig {
    /// Load config from a file; `.json` files are JSON, anything else TOML.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;

        if is_json(path) {
            serde_json::from_str(&content).map_err(|source| ConfigError::Json {
                path: path.to_path_buf(),
                source,
            })
        } else {
            toml::from_str(&content).map_err(|source| ConfigError::Toml {
                path: path.to_path_buf(),
                source,
            })
        }
    }

    /// Save config to a file in the format its extension implies.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let path = path.as_ref();
        let content = if is_json(path) {
            serde_json::to_string_pretty(self).map_err(|e| ConfigError::Serialize(e.to_string()))?
        } else {
            toml::to_string_pretty(self).map_err(|e| ConfigError::Serialize(e.to_string()))?
        };

        std::fs::write(path, content).map_err(|source| ConfigError::Write {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Find a config file in `start` or any parent directory.
    ///
    /// Files that fail to parse are skipped.
    pub fn find(start: &Path) -> Option<(PathBuf, Self)> {
        let mut current = start.to_path_buf();
        loop {
            for name in CONFIG_FILE_NAMES {
                let candidate = current.join(name);
                if candidate.is_file() {
                    match Self::load(&candidate) {
                        Ok(config) => return Some((candidate, config)),
                        Err(err) => {
                            tracing::warn!(path = %candidate.display(), %err, "skipping config file");
                        }
                    }
                }
            }

            if !current.pop() {
                return None;
            }
        }
    }

    /// Content root resolved against the directory holding the config file.
    pub fn root_dir(&self, base: &Path) -> PathBuf {
        if self.root.is_absolute() {
            self.root.clone()
        } else {
            base.join(&self.root)
        }
    }

    /// Logical path of the navigation document.
    pub fn navigation_path(&self) -> Result<LogicalPath, ConfigError> {
        Ok(LogicalPath::new(self.navigation.as_str())?)
    }

    /// Logical path of the validation messages document.
    pub fn validation_messages_path(&self) -> Result<LogicalPath, ConfigError> {
        Ok(LogicalPath::new(self.validation_messages.as_str())?)
    }

    /// Logical path of the policy directory itself.
    pub fn policy_dir_path(&self) -> Result<LogicalPath, ConfigError> {
        let dir = self.policies.dir.trim_end_matches('/');
        Ok(LogicalPath::new(if dir.is_empty() { "." } else { dir })?)
    }

    /// Logical paths of every configured policy page, with their slugs.
    pub fn policy_paths(&self) -> Result<Vec<(String, LogicalPath)>, ConfigError> {
        self.policies
            .pages
            .iter()
            .map(|slug| {
                policy_path(&self.policies.dir, slug)
                    .map(|path| (slug.clone(), path))
                    .ok_or_else(|| ConfigError::Slug(slug.clone()))
            })
            .collect()
    }
}

fn is_json(path: &Path) -> bool {
    path.extension().is_some_and(|ext| ext.eq_ignore_ascii_case("json"))
}

/// Generate a default `content.toml`.
pub fn generate_default_config() -> String {
    r#"# Storefront content configuration

# Content root, relative to this file
root = "."

# Header and footer menus
navigation = "content/navigation.json"

# Form validation message templates
validation_messages = "content/validation-messages.json"

# Load every document below at startup
preload = true

[policies]
dir = "content/policies"
pages = ["privacy", "returns", "terms"]
"#
    .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config: ContentConfig = toml::from_str("").unwrap();
        assert_eq!(config, ContentConfig::default());
        assert_eq!(config.navigation_path().unwrap().as_str(), "content/navigation.json");
        assert!(config.preload);
    }

    #[test]
    fn test_default_template_parses() {
        let config: ContentConfig = toml::from_str(&generate_default_config()).unwrap();
        assert_eq!(config.policies.pages, vec!["privacy", "returns", "terms"]);

        let paths = config.policy_paths().unwrap();
        assert_eq!(paths[1].0, "returns");
        assert_eq!(paths[1].1.as_str(), "content/policies/returns.json");
    }

    #[test]
    fn test_bad_slug_rejected() {
        let mut config = ContentConfig::default();
        config.policies.pages.push("../secrets".to_string());
        assert!(matches!(config.policy_paths(), Err(ConfigError::Slug(_))));
    }

    #[test]
    fn test_load_json_and_toml() {
        let dir = tempfile::tempdir().unwrap();

        let toml_path = dir.path().join("content.toml");
        std::fs::write(&toml_path, "navigation = \"nav.toml\"\npreload = false\n").unwrap();
        let config = ContentConfig::load(&toml_path).unwrap();
        assert_eq!(config.navigation, "nav.toml");
        assert!(!config.preload);

        let json_path = dir.path().join("content.json");
        std::fs::write(&json_path, r#"{"policies": {"pages": ["terms"]}}"#).unwrap();
        let config = ContentConfig::load(&json_path).unwrap();
        assert_eq!(config.policies.pages, vec!["terms"]);
        assert_eq!(config.policies.dir, "content/policies");
    }

    #[test]
    fn test_save_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("content.toml");

        let mut config = ContentConfig::default();
        config.policies.pages = vec!["privacy".to_string()];
        config.save(&path).unwrap();

        assert_eq!(ContentConfig::load(&path).unwrap(), config);
    }

    #[test]
    fn test_find_walks_up() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("content.toml"), "preload = false\n").unwrap();
        let nested = dir.path().join("a").join("b");
        std::fs::create_dir_all(&nested).unwrap();

        let (found, config) = ContentConfig::find(&nested).unwrap();
        assert_eq!(found, dir.path().join("content.toml"));
        assert!(!config.preload);
    }

    #[test]
    fn test_policy_dir_path() {
        let mut config = ContentConfig::default();
        assert_eq!(config.policy_dir_path().unwrap().as_str(), "content/policies");

        config.policies.dir = "pages/".to_string();
        assert_eq!(config.policy_dir_path().unwrap().as_str(), "pages");

        config.policies.dir = String::new();
        assert_eq!(config.policy_dir_path().unwrap().as_str(), ".");
    }

    #[test]
    fn test_root_dir() {
        let config = ContentConfig {
            root: PathBuf::from("site"),
            ..ContentConfig::default()
        };
        assert_eq!(config.root_dir(Path::new("/srv")), PathBuf::from("/srv/site"));
    }

    #[test]
    fn test_load_missing_file() {
        let err = ContentConfig::load("/nonexistent/content.toml").unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));
    }
}
