//! The content loader: source -> validator -> store.

use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Instant;

use futures::FutureExt;
use tracing::{debug, info, warn};

use crate::error::LoadError;
use crate::outcome::{FieldErrors, Outcome};
use crate::path::LogicalPath;
use crate::schema::SchemaValidator;
use crate::source::ContentSource;
use crate::store::{CacheStats, CacheStore, Claim, EntryState, StoredOutcome};

/// Loads validated content, caching one outcome per logical path.
///
/// The loader never raises: missing documents, malformed documents, schema
/// violations and validator panics all come back as `Outcome::Invalid`,
/// and are cached like successful content until invalidated.
///
/// Cloning is cheap and clones share the same cache.
#[derive(Clone)]
pub struct ContentLoader {
    source: Arc<dyn ContentSource>,
    store: CacheStore,
}

impl ContentLoader {
    /// Create a loader with a fresh cache.
    pub fn new<S: ContentSource + 'static>(source: S) -> Self {
        Self::with_store(source, CacheStore::new())
    }

    /// Create a loader over an existing store.
    pub fn with_store<S: ContentSource + 'static>(source: S, store: CacheStore) -> Self {
        Self {
            source: Arc::new(source),
            store,
        }
    }

    /// Get validated content for `path` using `validator`.
    ///
    /// A cached outcome is returned without I/O. Otherwise the first caller
    /// fetches and validates while concurrent callers for the same path wait
    /// for its outcome. The load runs on its own task, so dropping this
    /// future does not leave the entry loading.
    ///
    /// Callers own the pairing of path and validator. Requesting a path that
    /// is cached under a different content type yields `KindMismatch`
    /// without disturbing the cached entry.
    pub async fn load<V>(&self, path: &LogicalPath, validator: &V) -> Outcome<V::Output>
    where
        V: SchemaValidator + Clone,
    {
        let stored = loop {
            match self.store.begin_load(path) {
                Claim::Hit(stored) => {
                    debug!(path = %path, kind = validator.kind(), "content cache hit");
                    break Some(stored);
                }
                Claim::Follower(in_flight) if in_flight.is_stale() => {
                    debug!(path = %path, kind = validator.kind(), "waiting out invalidated load");
                    in_flight.wait().await;
                }
                Claim::Follower(in_flight) => {
                    debug!(path = %path, kind = validator.kind(), "waiting on in-flight load");
                    break in_flight.wait().await;
                }
                Claim::Leader(ticket) => {
                    let in_flight = ticket.subscribe();
                    let source = Arc::clone(&self.source);
                    let store = self.store.clone();
                    let validator = validator.clone();

                    tokio::spawn(async move {
                        let path = ticket.path().clone();
                        let outcome = fetch_and_validate(source.as_ref(), &path, &validator).await;
                        let valid = outcome.is_valid();
                        store.complete(ticket, Arc::new(outcome), valid);
                    });

                    break in_flight.wait().await;
                }
            }
        };

        match stored {
            Some(stored) => downcast(path, validator.kind(), stored),
            None => Outcome::invalid(LoadError::Abandoned { path: path.clone() }),
        }
    }

    /// Discard the outcome for `path`; the next load fetches afresh.
    ///
    /// A load already in flight is left to finish for the callers waiting on
    /// it, and later callers wait for it before fetching again. Returns
    /// whether anything was discarded.
    pub fn invalidate(&self, path: &LogicalPath) -> bool {
        let reset = self.store.reset(path);
        if reset {
            info!(path = %path, "content invalidated");
        }
        reset
    }

    /// Discard every outcome, as [`ContentLoader::invalidate`] does per path.
    /// Returns how many entries were reset.
    pub fn invalidate_all(&self) -> usize {
        let count = self.store.reset_all();
        info!(entries = count, "content cache cleared");
        count
    }

    /// Current state of `path`, without waiting.
    pub fn status(&self, path: &LogicalPath) -> EntryState {
        self.store.get(path)
    }

    /// Paths currently holding an outcome.
    pub fn cached_paths(&self) -> Vec<LogicalPath> {
        self.store.cached_paths()
    }

    /// Cache counters.
    pub fn stats(&self) -> CacheStats {
        self.store.stats()
    }

    /// Name of the underlying source.
    pub fn source_name(&self) -> &str {
        self.source.name()
    }
}

impl std::fmt::Debug for ContentLoader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ContentLoader")
            .field("source", &self.source.name())
            .field("store", &self.store)
            .finish()
    }
}

/// Fetch and validate one document, turning every failure into `Invalid`.
async fn fetch_and_validate<V: SchemaValidator>(
    source: &dyn ContentSource,
    path: &LogicalPath,
    validator: &V,
) -> Outcome<V::Output> {
    let started = Instant::now();
    let kind = validator.kind();

    let attempt = AssertUnwindSafe(async {
        let raw = source.fetch(path).await.map_err(LoadError::from)?;
        let content = validator
            .validate(&raw)
            .map_err(|errors| LoadError::SchemaValidation {
                path: path.clone(),
                kind,
                errors: FieldErrors::new(errors),
            })?;
        Ok::<_, LoadError>(content)
    })
    .catch_unwind()
    .await;

    let outcome = match attempt {
        Ok(Ok(content)) => Outcome::valid(content),
        Ok(Err(err)) => Outcome::invalid(err),
        Err(_) => Outcome::invalid(LoadError::ValidatorPanicked {
            path: path.clone(),
            kind,
        }),
    };

    let elapsed_us = started.elapsed().as_micros() as u64;
    match &outcome {
        Outcome::Valid(_) => {
            info!(path = %path, kind, source = source.name(), elapsed_us, "content loaded");
        }
        Outcome::Invalid(err) => {
            warn!(
                path = %path,
                kind,
                source = source.name(),
                failure = %err.kind(),
                errors = err.field_errors().len(),
                elapsed_us,
                "content invalid: {err}"
            );
        }
    }

    outcome
}

fn downcast<T: Send + Sync + 'static>(
    path: &LogicalPath,
    kind: &'static str,
    stored: StoredOutcome,
) -> Outcome<T> {
    match stored.downcast_ref::<Outcome<T>>() {
        Some(outcome) => outcome.clone(),
        None => {
            warn!(path = %path, kind, "path requested with a different content kind");
            Outcome::invalid(LoadError::KindMismatch {
                path: path.clone(),
                expected: kind,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::FailureKind;
    use crate::outcome::FieldError;
    use crate::source::{MemorySource, RawDocument};

    #[derive(Clone)]
    struct Headline;

    impl SchemaValidator for Headline {
        type Output = String;

        fn kind(&self) -> &'static str {
            "headline"
        }

        fn validate(&self, raw: &RawDocument) -> Result<String, Vec<FieldError>> {
            raw.get("headline")
                .and_then(|h| h.as_str())
                .map(str::to_string)
                .ok_or_else(|| vec![FieldError::root("missing headline")])
        }
    }

    #[derive(Clone)]
    struct Count;

    impl SchemaValidator for Count {
        type Output = u64;

        fn kind(&self) -> &'static str {
            "count"
        }

        fn validate(&self, raw: &RawDocument) -> Result<u64, Vec<FieldError>> {
            raw.as_u64().ok_or_else(|| vec![FieldError::root("not a count")])
        }
    }

    #[derive(Clone)]
    struct Exploding;

    impl SchemaValidator for Exploding {
        type Output = ();

        fn kind(&self) -> &'static str {
            "exploding"
        }

        fn validate(&self, _raw: &RawDocument) -> Result<(), Vec<FieldError>> {
            panic!("validator bug")
        }
    }

    fn path(s: &str) -> LogicalPath {
        LogicalPath::new(s).unwrap()
    }

    fn loader() -> ContentLoader {
        ContentLoader::new(
            MemorySource::new()
                .with_document(path("hero.json"), r#"{"headline": "Spring sale"}"#)
                .with_document(path("empty.json"), "{}")
                .with_document(path("count.json"), "3"),
        )
    }

    #[tokio::test]
    async fn test_load_valid() {
        let loader = loader();
        let outcome = loader.load(&path("hero.json"), &Headline).await;
        assert_eq!(outcome.content().map(|s| s.as_str()), Some("Spring sale"));
        assert_eq!(loader.status(&path("hero.json")), EntryState::Cached { valid: true });
    }

    #[tokio::test]
    async fn test_load_schema_failure_is_data() {
        let loader = loader();
        let outcome = loader.load(&path("empty.json"), &Headline).await;
        let err = outcome.error().unwrap();
        assert_eq!(err.kind(), FailureKind::SchemaValidation);
        assert_eq!(loader.status(&path("empty.json")), EntryState::Cached { valid: false });
    }

    #[tokio::test]
    async fn test_load_missing_is_cached() {
        let loader = loader();
        let first = loader.load(&path("nope.json"), &Headline).await;
        let second = loader.load(&path("nope.json"), &Headline).await;

        assert!(first.error().unwrap().is_not_found());
        assert!(first.ptr_eq(&second));
        assert_eq!(loader.stats().loads, 1);
        assert_eq!(loader.stats().hits, 1);
    }

    #[tokio::test]
    async fn test_validator_panic_is_invalid() {
        let loader = loader();
        let outcome = loader.load(&path("hero.json"), &Exploding).await;
        assert_eq!(outcome.error().unwrap().kind(), FailureKind::ValidatorPanicked);
        assert_eq!(loader.status(&path("hero.json")), EntryState::Cached { valid: false });
    }

    #[tokio::test]
    async fn test_kind_mismatch_leaves_entry_alone() {
        let loader = loader();
        let count = loader.load(&path("count.json"), &Count).await;
        assert!(count.is_valid());

        let wrong = loader.load(&path("count.json"), &Headline).await;
        assert_eq!(wrong.error().unwrap().kind(), FailureKind::KindMismatch);

        let again = loader.load(&path("count.json"), &Count).await;
        assert!(count.ptr_eq(&again));
    }

    #[tokio::test]
    async fn test_invalidate_and_invalidate_all() {
        let loader = loader();
        let first = loader.load(&path("hero.json"), &Headline).await;
        loader.load(&path("count.json"), &Count).await;

        assert!(loader.invalidate(&path("hero.json")));
        assert!(!loader.invalidate(&path("hero.json")));
        assert_eq!(loader.status(&path("hero.json")), EntryState::Empty);

        let second = loader.load(&path("hero.json"), &Headline).await;
        assert!(!first.ptr_eq(&second));
        assert_eq!(first, second);

        assert_eq!(loader.cached_paths().len(), 2);
        assert_eq!(loader.invalidate_all(), 2);
        assert!(loader.cached_paths().is_empty());
    }
}
