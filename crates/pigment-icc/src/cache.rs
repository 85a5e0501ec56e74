//! Transform cache keyed by profile identity.
//!
//! Building a transform is expensive, so each color space keeps the
//! transforms it has built in a [`TransformCache`]. Lookups go through a
//! single most-recently-used slot first, then the per-pair map. A miss
//! builds the transform outside any lock and inserts it first-writer-wins,
//! so concurrent callers never wait on a build they did not start.
//!
//! Keys use `Arc` identity: two structurally identical profiles loaded as
//! separate objects get separate entries. Entries hold clones of both
//! `Arc<Profile>`s, so an address cannot be reused while it is a key.

use crate::{Intent, Profile, ProfileFormat, Transform};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing::{debug, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
struct TransformKey {
    source: usize,
    source_format: ProfileFormat,
    dest: usize,
    dest_format: ProfileFormat,
    intent: Intent,
}

impl TransformKey {
    fn new(
        source: &Arc<Profile>,
        source_format: ProfileFormat,
        dest: &Arc<Profile>,
        dest_format: ProfileFormat,
        intent: Intent,
    ) -> Self {
        Self {
            source: Arc::as_ptr(source) as usize,
            source_format,
            dest: Arc::as_ptr(dest) as usize,
            dest_format,
            intent,
        }
    }
}

struct Slot {
    _source: Arc<Profile>,
    _dest: Arc<Profile>,
    // None records a failed build so it is not retried on every pixel.
    transform: Option<Arc<Transform>>,
}

/// One transform a caller expects to need, for [`TransformCache::prewarm`].
#[derive(Debug, Clone)]
pub struct TransformRequest {
    /// Source profile.
    pub source: Arc<Profile>,
    /// Source float format.
    pub source_format: ProfileFormat,
    /// Destination profile.
    pub dest: Arc<Profile>,
    /// Destination float format.
    pub dest_format: ProfileFormat,
    /// Rendering intent.
    pub intent: Intent,
}

/// Counters describing how lookups were served.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    /// Served by the most-recently-used slot.
    pub last_hits: u64,
    /// Served by the per-pair map.
    pub map_hits: u64,
    /// New transforms built.
    pub builds: u64,
    /// Builds that failed.
    pub failures: u64,
}

/// Per-owner cache of transforms between profile pairs.
pub struct TransformCache {
    black_point_compensation: bool,
    map: Mutex<HashMap<TransformKey, Slot>>,
    last: Mutex<Option<(TransformKey, Arc<Transform>)>>,
    last_hits: AtomicU64,
    map_hits: AtomicU64,
    builds: AtomicU64,
    failures: AtomicU64,
}

fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(PoisonError::into_inner)
}

impl TransformCache {
    /// Creates an empty cache. `black_point_compensation` is passed to every
    /// transform it builds.
    pub fn new(black_point_compensation: bool) -> Self {
        Self {
            black_point_compensation,
            map: Mutex::new(HashMap::new()),
            last: Mutex::new(None),
            last_hits: AtomicU64::new(0),
            map_hits: AtomicU64::new(0),
            builds: AtomicU64::new(0),
            failures: AtomicU64::new(0),
        }
    }

    /// Returns the transform between two profiles, building it on first use.
    ///
    /// Returns `None` if either profile is invalid or the engine cannot
    /// build the pair. That is an expected outcome; callers fall back to an
    /// uncalibrated path.
    pub fn get_or_create(
        &self,
        source: &Arc<Profile>,
        source_format: ProfileFormat,
        dest: &Arc<Profile>,
        dest_format: ProfileFormat,
        intent: Intent,
    ) -> Option<Arc<Transform>> {
        if !source.is_valid() || !dest.is_valid() {
            return None;
        }
        let key = TransformKey::new(source, source_format, dest, dest_format, intent);

        if let Some((last_key, t)) = lock(&self.last).as_ref() {
            if *last_key == key {
                self.last_hits.fetch_add(1, Ordering::Relaxed);
                return Some(Arc::clone(t));
            }
        }

        let cached = lock(&self.map).get(&key).map(|slot| slot.transform.clone());
        if let Some(found) = cached {
            let t = found?;
            self.map_hits.fetch_add(1, Ordering::Relaxed);
            *lock(&self.last) = Some((key, Arc::clone(&t)));
            return Some(t);
        }

        debug!(
            source = source.name(),
            dest = dest.name(),
            ?source_format,
            ?dest_format,
            %intent,
            "building transform"
        );
        let built = match Transform::new(
            source,
            source_format,
            dest,
            dest_format,
            intent,
            self.black_point_compensation,
        ) {
            Ok(t) => {
                self.builds.fetch_add(1, Ordering::Relaxed);
                Some(Arc::new(t))
            }
            Err(e) => {
                self.failures.fetch_add(1, Ordering::Relaxed);
                warn!(source = source.name(), dest = dest.name(), error = %e, "transform unavailable");
                None
            }
        };

        let winner = {
            let mut map = lock(&self.map);
            let slot = map.entry(key).or_insert_with(|| Slot {
                _source: Arc::clone(source),
                _dest: Arc::clone(dest),
                transform: built,
            });
            slot.transform.clone()
        };
        if let Some(t) = &winner {
            *lock(&self.last) = Some((key, Arc::clone(t)));
        }
        winner
    }

    /// Builds transforms ahead of time so later lookups only read.
    ///
    /// Returns how many of the requests are now available.
    pub fn prewarm<I>(&self, requests: I) -> usize
    where
        I: IntoIterator<Item = TransformRequest>,
    {
        requests
            .into_iter()
            .filter(|r| {
                self.get_or_create(&r.source, r.source_format, &r.dest, r.dest_format, r.intent)
                    .is_some()
            })
            .count()
    }

    /// Number of cached pairs, failed builds included.
    pub fn len(&self) -> usize {
        lock(&self.map).len()
    }

    /// Returns `true` if nothing is cached.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drops every cached transform.
    pub fn clear(&self) {
        lock(&self.map).clear();
        *lock(&self.last) = None;
    }

    /// Whether built transforms use black-point compensation.
    pub fn black_point_compensation(&self) -> bool {
        self.black_point_compensation
    }

    /// Lookup counters.
    pub fn stats(&self) -> CacheStats {
        CacheStats {
            last_hits: self.last_hits.load(Ordering::Relaxed),
            map_hits: self.map_hits.load(Ordering::Relaxed),
            builds: self.builds.load(Ordering::Relaxed),
            failures: self.failures.load(Ordering::Relaxed),
        }
    }
}

impl Default for TransformCache {
    fn default() -> Self {
        Self::new(false)
    }
}

impl std::fmt::Debug for TransformCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TransformCache")
            .field("black_point_compensation", &self.black_point_compensation)
            .field("len", &self.len())
            .field("stats", &self.stats())
            .finish()
    }
}
