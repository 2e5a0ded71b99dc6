//! Cache-backed access to every storefront content document.

use std::path::Path;
use std::time::Instant;

use serde::Serialize;
use thiserror::Error;
use tracing::{debug, info, warn};
use turbo_content::{
    CacheStats, ContentLoader, ContentSource, FailureKind, FieldError, FsSource,
    JsonSchemaValidator, LoadError, LogicalPath, Outcome, SchemaError,
};

use crate::config::{ConfigError, ContentConfig};
use crate::messages::{messages_validator, ValidationMessages, MESSAGES_KIND};
use crate::navigation::{navigation_validator, Navigation, NAVIGATION_KIND};
use crate::policy::{policy_path, policy_schema_validator, PolicyPage, PolicyValidator, POLICY_KIND};

/// Errors setting up [`SiteContent`].
#[derive(Error, Debug)]
pub enum SiteError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Schema(#[from] SchemaError),
}

/// Storefront content facade.
///
/// Every document goes through one shared [`ContentLoader`], so concurrent
/// requests for the same document trigger a single load and repeated
/// requests are served from the cache until [`SiteContent::reload`].
#[derive(Debug, Clone)]
pub struct SiteContent {
    loader: ContentLoader,
    navigation_path: LogicalPath,
    messages_path: LogicalPath,
    policy_dir: String,
    policy_root: LogicalPath,
    policy_pages: Vec<(String, LogicalPath)>,
    preload: bool,
    navigation: JsonSchemaValidator<Navigation>,
    messages: JsonSchemaValidator<ValidationMessages>,
    policy: JsonSchemaValidator<PolicyPage>,
}

impl SiteContent {
    /// Content served from `source`, laid out as `config` describes.
    pub fn new<S: ContentSource + 'static>(
        source: S,
        config: &ContentConfig,
    ) -> Result<Self, SiteError> {
        Ok(Self {
            loader: ContentLoader::new(source),
            navigation_path: config.navigation_path()?,
            messages_path: config.validation_messages_path()?,
            policy_dir: config.policies.dir.clone(),
            policy_root: config.policy_dir_path()?,
            policy_pages: config.policy_paths()?,
            preload: config.preload,
            navigation: navigation_validator()?,
            messages: messages_validator()?,
            policy: policy_schema_validator()?,
        })
    }

    /// Content read from disk under the config's root, resolved against `base`.
    pub fn from_config(config: &ContentConfig, base: &Path) -> Result<Self, SiteError> {
        let root = config.root_dir(base);
        debug!(root = %root.display(), "serving content from filesystem");
        Self::new(FsSource::new(root), config)
    }

    /// The loader every document goes through.
    pub fn loader(&self) -> &ContentLoader {
        &self.loader
    }

    /// Header and footer navigation.
    pub async fn navigation(&self) -> Outcome<Navigation> {
        self.loader.load(&self.navigation_path, &self.navigation).await
    }

    /// Form validation message templates.
    pub async fn validation_messages(&self) -> Outcome<ValidationMessages> {
        self.loader.load(&self.messages_path, &self.messages).await
    }

    /// Policy page `slug`.
    ///
    /// A malformed slug is reported as not found without touching the cache.
    pub async fn policy_page(&self, slug: &str) -> Outcome<PolicyPage> {
        let Some(path) = policy_path(&self.policy_dir, slug) else {
            debug!(slug, "rejected policy slug");
            return Outcome::invalid(LoadError::SourceNotFound {
                path: self.rejected_slug_path(slug),
            });
        };
        let validator = PolicyValidator::with_schema(self.policy.clone(), slug);
        self.loader.load(&path, &validator).await
    }

    /// Path reported for a slug that names no policy document. It is never
    /// loaded or cached.
    fn rejected_slug_path(&self, slug: &str) -> LogicalPath {
        let raw = format!("{}/{}", self.policy_root, slug.escape_default());
        LogicalPath::new(raw).unwrap_or_else(|_| self.policy_root.clone())
    }

    /// Slugs of the configured policy pages.
    pub fn policy_slugs(&self) -> impl Iterator<Item = &str> {
        self.policy_pages.iter().map(|(slug, _)| slug.as_str())
    }

    /// Load every configured document concurrently.
    pub async fn warm(&self) -> WarmReport {
        let started = Instant::now();

        let policies = futures::future::join_all(self.policy_pages.iter().map(
            |(slug, path)| async move {
                let outcome = self.policy_page(slug).await;
                DocumentReport::new(path.clone(), POLICY_KIND, &outcome)
            },
        ));
        let (navigation, messages, policies) =
            futures::join!(self.navigation(), self.validation_messages(), policies);

        let mut documents = Vec::with_capacity(2 + policies.len());
        documents.push(DocumentReport::new(
            self.navigation_path.clone(),
            NAVIGATION_KIND,
            &navigation,
        ));
        documents.push(DocumentReport::new(
            self.messages_path.clone(),
            MESSAGES_KIND,
            &messages,
        ));
        documents.extend(policies);

        let report = WarmReport { documents };
        let elapsed_ms = started.elapsed().as_millis() as u64;
        if report.is_healthy() {
            info!(documents = report.documents.len(), elapsed_ms, "content warmed");
        } else {
            warn!(
                documents = report.documents.len(),
                invalid = report.invalid_count(),
                elapsed_ms,
                "content warmed with invalid documents"
            );
        }
        report
    }

    /// Warm the cache if the config asks for preloading.
    ///
    /// Returns the warm report, or `None` when preloading is off and
    /// documents load on first access instead.
    pub async fn preload(&self) -> Option<WarmReport> {
        if !self.preload {
            debug!("preload disabled, content loads on first access");
            return None;
        }
        Some(self.warm().await)
    }

    /// Drop every cached document; the next access reloads from the source.
    pub fn reload(&self) -> usize {
        let cleared = self.loader.invalidate_all();
        info!(cleared, "content reloaded");
        cleared
    }

    /// Cache counters for the shared loader.
    pub fn stats(&self) -> CacheStats {
        self.loader.stats()
    }
}

/// Result of loading one document.
#[derive(Debug, Clone, Serialize)]
pub struct DocumentReport {
    pub path: LogicalPath,
    pub kind: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failure: Option<FailureKind>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<FieldError>,
}

impl DocumentReport {
    pub fn new<T>(path: LogicalPath, kind: &'static str, outcome: &Outcome<T>) -> Self {
        match outcome.error() {
            None => Self {
                path,
                kind,
                failure: None,
                errors: Vec::new(),
            },
            Some(err) => Self {
                path,
                kind,
                failure: Some(err.kind()),
                errors: err.field_errors(),
            },
        }
    }

    pub fn is_valid(&self) -> bool {
        self.failure.is_none()
    }
}

/// Outcome of [`SiteContent::warm`].
#[derive(Debug, Clone, Serialize)]
pub struct WarmReport {
    pub documents: Vec<DocumentReport>,
}

impl WarmReport {
    pub fn is_healthy(&self) -> bool {
        self.documents.iter().all(DocumentReport::is_valid)
    }

    pub fn invalid_count(&self) -> usize {
        self.documents.iter().filter(|d| !d.is_valid()).count()
    }
}
