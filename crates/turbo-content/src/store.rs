//! Per-path outcome storage with single-flight coordination.
//!
//! Each logical path moves through `Empty -> Loading -> Cached`. The
//! `Empty -> Loading` step is an atomic check-and-set under the slot map
//! lock: exactly one caller becomes the leader for a path, everyone else
//! arriving before completion becomes a follower and waits on the leader's
//! watch channel. Outcomes are stored type-erased so one store can hold
//! structurally unrelated content kinds.
//!
//! Resetting a `Loading` entry marks it stale instead of removing it, so a
//! path never has two loads in flight. Callers arriving at a stale entry
//! wait for it to finish and then claim again; the stale outcome reaches
//! only the callers that joined before the reset and is never cached.

use std::any::Any;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use serde::Serialize;
use tokio::sync::watch;
use tracing::debug;

use crate::path::LogicalPath;

/// A stored outcome with its content type erased.
pub type StoredOutcome = Arc<dyn Any + Send + Sync>;

/// Observable state of one cache entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "lowercase")]
pub enum EntryState {
    /// Never loaded, or invalidated.
    Empty,
    /// A fetch and validation is in flight.
    Loading,
    /// An outcome is stored.
    Cached { valid: bool },
}

/// Counters describing cache behaviour since creation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CacheStats {
    /// Requests answered from a cached outcome.
    pub hits: u64,
    /// Requests that became the leader and performed a load.
    pub loads: u64,
    /// Requests that attached to an in-flight load.
    pub coalesced: u64,
    /// Loads that completed with valid content.
    pub valid: u64,
    /// Loads that completed with a failure.
    pub invalid: u64,
    /// Entries reset by invalidation.
    pub invalidations: u64,
    /// Loads dropped before completing.
    pub abandoned: u64,
}

#[derive(Debug, Default)]
struct Counters {
    hits: AtomicU64,
    loads: AtomicU64,
    coalesced: AtomicU64,
    valid: AtomicU64,
    invalid: AtomicU64,
    invalidations: AtomicU64,
    abandoned: AtomicU64,
}

impl Counters {
    fn bump(counter: &AtomicU64, by: u64) {
        counter.fetch_add(by, Ordering::Relaxed);
    }

    fn snapshot(&self) -> CacheStats {
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            loads: self.loads.load(Ordering::Relaxed),
            coalesced: self.coalesced.load(Ordering::Relaxed),
            valid: self.valid.load(Ordering::Relaxed),
            invalid: self.invalid.load(Ordering::Relaxed),
            invalidations: self.invalidations.load(Ordering::Relaxed),
            abandoned: self.abandoned.load(Ordering::Relaxed),
        }
    }
}

enum Slot {
    Loading {
        generation: u64,
        done: watch::Receiver<Option<StoredOutcome>>,
        stale: bool,
    },
    Cached {
        outcome: StoredOutcome,
        valid: bool,
    },
}

#[derive(Default)]
struct StoreInner {
    slots: Mutex<HashMap<LogicalPath, Slot>>,
    generation: AtomicU64,
    counters: Counters,
}

impl StoreInner {
    fn slots(&self) -> MutexGuard<'_, HashMap<LogicalPath, Slot>> {
        self.slots.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Keyed outcome storage shared by every caller in the process.
///
/// Cloning is cheap and clones share state. Stored outcomes are only
/// replaced through `complete` after `reset`; they are never mutated.
#[derive(Clone, Default)]
pub struct CacheStore {
    inner: Arc<StoreInner>,
}

/// What a caller must do after `begin_load`.
pub enum Claim {
    /// The outcome is already cached.
    Hit(StoredOutcome),
    /// Another caller is loading; wait for its outcome.
    Follower(InFlight),
    /// This caller must load and then `complete` the ticket.
    Leader(LoadTicket),
}

/// Handle on an in-flight load's eventual outcome.
pub struct InFlight {
    done: watch::Receiver<Option<StoredOutcome>>,
    stale: bool,
}

impl InFlight {
    /// Whether the load was invalidated before this caller joined.
    ///
    /// Its outcome predates the invalidation: wait for it to finish, then
    /// claim the path again.
    pub fn is_stale(&self) -> bool {
        self.stale
    }

    /// Wait for the leader's outcome.
    ///
    /// Returns `None` if the load was abandoned without completing.
    pub async fn wait(mut self) -> Option<StoredOutcome> {
        let result = self.done.wait_for(Option::is_some).await;
        result.ok().and_then(|outcome| outcome.clone())
    }
}

/// Leadership of one in-flight load.
///
/// Dropping a ticket without completing it returns the entry to `Empty` and
/// releases followers with no outcome.
pub struct LoadTicket {
    inner: Arc<StoreInner>,
    path: LogicalPath,
    generation: u64,
    done: watch::Sender<Option<StoredOutcome>>,
    completed: bool,
}

impl LoadTicket {
    /// The path being loaded.
    pub fn path(&self) -> &LogicalPath {
        &self.path
    }

    /// A waiter for this load's outcome.
    pub fn subscribe(&self) -> InFlight {
        InFlight {
            done: self.done.subscribe(),
            stale: false,
        }
    }
}

impl Drop for LoadTicket {
    fn drop(&mut self) {
        if self.completed {
            return;
        }

        let mut slots = self.inner.slots();
        let current = matches!(
            slots.get(&self.path),
            Some(Slot::Loading { generation, .. }) if *generation == self.generation
        );
        if current {
            slots.remove(&self.path);
        }
        drop(slots);

        Counters::bump(&self.inner.counters.abandoned, 1);
        debug!(path = %self.path, "load abandoned");
    }
}

impl CacheStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Current state of `path`, without blocking on in-flight loads.
    pub fn get(&self, path: &LogicalPath) -> EntryState {
        match self.inner.slots().get(path) {
            None => EntryState::Empty,
            Some(Slot::Loading { .. }) => EntryState::Loading,
            Some(Slot::Cached { valid, .. }) => EntryState::Cached { valid: *valid },
        }
    }

    /// Atomically resolve the caller's role for `path`.
    ///
    /// An empty entry moves to `Loading` and the caller becomes the leader.
    pub fn begin_load(&self, path: &LogicalPath) -> Claim {
        let counters = &self.inner.counters;
        let mut slots = self.inner.slots();

        match slots.get(path) {
            Some(Slot::Cached { outcome, .. }) => {
                Counters::bump(&counters.hits, 1);
                Claim::Hit(Arc::clone(outcome))
            }
            Some(Slot::Loading { done, stale, .. }) => {
                Counters::bump(&counters.coalesced, 1);
                Claim::Follower(InFlight {
                    done: done.clone(),
                    stale: *stale,
                })
            }
            None => {
                let generation = self.inner.generation.fetch_add(1, Ordering::Relaxed);
                let (tx, rx) = watch::channel(None);
                slots.insert(
                    path.clone(),
                    Slot::Loading {
                        generation,
                        done: rx,
                        stale: false,
                    },
                );
                Counters::bump(&counters.loads, 1);

                Claim::Leader(LoadTicket {
                    inner: Arc::clone(&self.inner),
                    path: path.clone(),
                    generation,
                    done: tx,
                    completed: false,
                })
            }
        }
    }

    /// Store the leader's outcome and release every follower with it.
    ///
    /// If the entry was reset while loading, followers still receive the
    /// outcome but it is not cached and the entry returns to `Empty`.
    pub fn complete(&self, mut ticket: LoadTicket, outcome: StoredOutcome, valid: bool) {
        let counters = &self.inner.counters;
        let stored = {
            let mut slots = self.inner.slots();
            let current = match slots.get(&ticket.path) {
                Some(Slot::Loading {
                    generation, stale, ..
                }) if *generation == ticket.generation => Some(!*stale),
                _ => None,
            };
            match current {
                Some(true) => {
                    slots.insert(
                        ticket.path.clone(),
                        Slot::Cached {
                            outcome: Arc::clone(&outcome),
                            valid,
                        },
                    );
                    true
                }
                Some(false) => {
                    slots.remove(&ticket.path);
                    false
                }
                None => false,
            }
        };

        if valid {
            Counters::bump(&counters.valid, 1);
        } else {
            Counters::bump(&counters.invalid, 1);
        }
        if !stored {
            debug!(path = %ticket.path, "entry reset while loading, outcome not cached");
        }

        ticket.completed = true;
        ticket.done.send_replace(Some(outcome));
    }

    /// Discard the outcome for `path`.
    ///
    /// A cached entry returns to `Empty`. A loading entry is marked stale and
    /// returns to `Empty` once its load finishes. Returns whether anything
    /// was discarded.
    pub fn reset(&self, path: &LogicalPath) -> bool {
        let reset = {
            let mut slots = self.inner.slots();
            match slots.get_mut(path) {
                Some(Slot::Loading { stale, .. }) => !std::mem::replace(stale, true),
                Some(Slot::Cached { .. }) => slots.remove(path).is_some(),
                None => false,
            }
        };
        if reset {
            Counters::bump(&self.inner.counters.invalidations, 1);
        }
        reset
    }

    /// Discard every outcome as [`CacheStore::reset`] does. Returns how many
    /// entries were reset.
    pub fn reset_all(&self) -> usize {
        let reset = {
            let mut slots = self.inner.slots();
            let mut count = 0;
            slots.retain(|_, slot| match slot {
                Slot::Loading { stale, .. } => {
                    if !std::mem::replace(stale, true) {
                        count += 1;
                    }
                    true
                }
                Slot::Cached { .. } => {
                    count += 1;
                    false
                }
            });
            count
        };
        Counters::bump(&self.inner.counters.invalidations, reset as u64);
        reset
    }

    /// Paths currently holding an outcome, sorted.
    pub fn cached_paths(&self) -> Vec<LogicalPath> {
        let mut paths: Vec<LogicalPath> = self
            .inner
            .slots()
            .iter()
            .filter(|(_, slot)| matches!(slot, Slot::Cached { .. }))
            .map(|(path, _)| path.clone())
            .collect();
        paths.sort();
        paths
    }

    /// Snapshot of the counters.
    pub fn stats(&self) -> CacheStats {
        self.inner.counters.snapshot()
    }
}

impl std::fmt::Debug for CacheStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CacheStore")
            .field("entries", &self.inner.slots().len())
            .field("stats", &self.stats())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn path(s: &str) -> LogicalPath {
        LogicalPath::new(s).unwrap()
    }

    fn erased(value: u32) -> StoredOutcome {
        Arc::new(value)
    }

    fn leader(claim: Claim) -> LoadTicket {
        match claim {
            Claim::Leader(ticket) => ticket,
            _ => panic!("expected leader"),
        }
    }

    #[test]
    fn test_first_claim_leads() {
        let store = CacheStore::new();
        let p = path("a.json");

        assert_eq!(store.get(&p), EntryState::Empty);
        let ticket = leader(store.begin_load(&p));
        assert_eq!(ticket.path(), &p);
        assert_eq!(store.get(&p), EntryState::Loading);

        assert!(matches!(store.begin_load(&p), Claim::Follower(_)));
        store.complete(ticket, erased(1), true);

        assert_eq!(store.get(&p), EntryState::Cached { valid: true });
        assert!(matches!(store.begin_load(&p), Claim::Hit(_)));

        let stats = store.stats();
        assert_eq!(stats.loads, 1);
        assert_eq!(stats.coalesced, 1);
        assert_eq!(stats.hits, 1);
        assert_eq!(stats.valid, 1);
    }

    #[tokio::test]
    async fn test_followers_receive_leader_outcome() {
        let store = CacheStore::new();
        let p = path("a.json");

        let ticket = leader(store.begin_load(&p));
        let followers: Vec<InFlight> = (0..3)
            .map(|_| match store.begin_load(&p) {
                Claim::Follower(waiter) => waiter,
                _ => panic!("expected follower"),
            })
            .collect();

        let outcome = erased(42);
        store.complete(ticket, Arc::clone(&outcome), true);

        for follower in followers {
            let received = follower.wait().await.unwrap();
            assert!(Arc::ptr_eq(&received, &outcome));
        }
    }

    #[tokio::test]
    async fn test_dropped_ticket_resets_entry() {
        let store = CacheStore::new();
        let p = path("a.json");

        let ticket = leader(store.begin_load(&p));
        let follower = match store.begin_load(&p) {
            Claim::Follower(waiter) => waiter,
            _ => panic!("expected follower"),
        };

        drop(ticket);
        assert_eq!(store.get(&p), EntryState::Empty);
        assert!(follower.wait().await.is_none());
        assert_eq!(store.stats().abandoned, 1);

        assert!(matches!(store.begin_load(&p), Claim::Leader(_)));
    }

    #[tokio::test]
    async fn test_reset_during_load_marks_stale() {
        let store = CacheStore::new();
        let p = path("a.json");

        let stale = leader(store.begin_load(&p));
        let early = match store.begin_load(&p) {
            Claim::Follower(waiter) => waiter,
            _ => panic!("expected follower"),
        };
        assert!(!early.is_stale());

        assert!(store.reset(&p));
        assert!(!store.reset(&p));
        assert_eq!(store.get(&p), EntryState::Loading);

        let late = match store.begin_load(&p) {
            Claim::Follower(waiter) => waiter,
            _ => panic!("no second leader while a load is in flight"),
        };
        assert!(late.is_stale());

        store.complete(stale, erased(1), true);
        assert_eq!(store.get(&p), EntryState::Empty);
        assert!(early.wait().await.is_some());
        assert!(late.wait().await.is_some());

        let fresh = leader(store.begin_load(&p));
        store.complete(fresh, erased(2), false);
        assert_eq!(store.get(&p), EntryState::Cached { valid: false });
        assert_eq!(store.stats().loads, 2);
        assert_eq!(store.stats().invalidations, 1);
    }

    #[test]
    fn test_reset_all_marks_loading_stale() {
        let store = CacheStore::new();
        let cached = leader(store.begin_load(&path("a.json")));
        store.complete(cached, erased(0), true);
        let loading = leader(store.begin_load(&path("b.json")));

        assert_eq!(store.reset_all(), 2);
        assert_eq!(store.get(&path("a.json")), EntryState::Empty);
        assert_eq!(store.get(&path("b.json")), EntryState::Loading);
        assert_eq!(store.reset_all(), 0);

        store.complete(loading, erased(1), true);
        assert_eq!(store.get(&path("b.json")), EntryState::Empty);
        assert!(store.cached_paths().is_empty());
    }

    #[test]
    fn test_reset_and_reset_all() {
        let store = CacheStore::new();
        for name in ["a.json", "b.json", "c.json"] {
            let ticket = leader(store.begin_load(&path(name)));
            store.complete(ticket, erased(0), true);
        }

        assert_eq!(
            store.cached_paths(),
            vec![path("a.json"), path("b.json"), path("c.json")]
        );

        assert!(store.reset(&path("b.json")));
        assert!(!store.reset(&path("b.json")));
        assert_eq!(store.reset_all(), 2);
        assert!(store.cached_paths().is_empty());
        assert_eq!(store.stats().invalidations, 3);
    }

    #[test]
    fn test_paths_are_independent() {
        let store = CacheStore::new();
        let a = leader(store.begin_load(&path("a.json")));
        let b = leader(store.begin_load(&path("b.json")));

        store.complete(a, erased(1), true);
        assert_eq!(store.get(&path("a.json")), EntryState::Cached { valid: true });
        assert_eq!(store.get(&path("b.json")), EntryState::Loading);

        store.complete(b, erased(2), false);
        assert_eq!(store.get(&path("a.json")), EntryState::Cached { valid: true });
    }
}
