use std::collections::HashMap;
use std::sync::{Mutex, OnceLock, Weak};

use tycho_types::TypeEnv;

use crate::shape::{ShapeInner, TypeShape};

/// Sweep every bucket (not just the touched one) once per this many interns.
const FULL_PURGE_INTERVAL: u64 = 64;

static GLOBAL_CACHE: OnceLock<ShapeCache> = OnceLock::new();

#[derive(Default)]
struct CacheInner {
    buckets: HashMap<u64, Vec<Weak<ShapeInner>>>,
    interns: u64,
}

/// Concurrency-safe structural interner for composite type shapes.
///
/// Entries are held weakly: a shape nobody references anymore is purged
/// opportunistically on later interns, never while a caller still holds it.
/// Plain raw-class, primitive and sentinel shapes bypass the cache entirely;
/// they are cheap enough to reconstruct.
#[derive(Default)]
pub struct ShapeCache {
    inner: Mutex<CacheInner>,
}

impl ShapeCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// The process-wide cache used by the `TypeShape` constructors.
    pub fn global() -> &'static ShapeCache {
        GLOBAL_CACHE.get_or_init(ShapeCache::new)
    }

    /// Insert-if-absent: return the canonical shape structurally equal to
    /// `candidate`, inserting `candidate` as canonical when none exists.
    ///
    /// Linearizable: concurrent calls with equal candidates all observe the
    /// same canonical entry.
    pub fn intern(&self, env: &dyn TypeEnv, candidate: TypeShape) -> TypeShape {
        if !candidate.is_cacheable() {
            return candidate;
        }

        let canonical = {
            let mut inner = self.inner.lock().expect("shape cache mutex poisoned");
            inner.interns += 1;
            if inner.interns % FULL_PURGE_INTERVAL == 0 {
                purge(&mut inner);
            }

            let bucket = inner
                .buckets
                .entry(candidate.structural_hash())
                .or_default();
            bucket.retain(|weak| weak.strong_count() > 0);

            match bucket
                .iter()
                .find_map(|weak| weak.upgrade().filter(|existing| **existing == *candidate.inner))
            {
                Some(existing) => TypeShape { inner: existing },
                None => {
                    bucket.push(std::sync::Arc::downgrade(&candidate.inner));
                    candidate
                }
            }
        };

        // Prime the erased raw type on the canonical entry so every later
        // lookup shares the memo instead of recomputing.
        let _ = canonical.raw_type(env);
        canonical
    }

    /// Number of live entries. Dead weak references are not counted.
    pub fn len(&self) -> usize {
        let inner = self.inner.lock().expect("shape cache mutex poisoned");
        inner
            .buckets
            .values()
            .flatten()
            .filter(|weak| weak.strong_count() > 0)
            .count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn purge(inner: &mut CacheInner) {
    let before: usize = inner.buckets.values().map(Vec::len).sum();
    inner.buckets.retain(|_, bucket| {
        bucket.retain(|weak| weak.strong_count() > 0);
        !bucket.is_empty()
    });
    let after: usize = inner.buckets.values().map(Vec::len).sum();
    if before != after {
        tracing::debug!(purged = before - after, live = after, "purged dead shape cache entries");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tycho_types::{Type, TypeStore};

    #[test]
    fn bare_class_shapes_bypass_the_cache() {
        let store = TypeStore::with_minimal_jdk();
        let cache = ShapeCache::new();
        let string = store.well_known().string;

        let a = TypeShape::new_uncached(
            store.universe_id(),
            Type::class(string, vec![]),
            None,
            None,
            None,
        );
        let b = cache.intern(&store, a.clone());
        assert!(TypeShape::ptr_eq(&a, &b));
        assert_eq!(cache.len(), 0);
    }

    #[test]
    fn equal_composites_share_one_canonical_entry() {
        let store = TypeStore::with_minimal_jdk();
        let cache = ShapeCache::new();
        let list = store.well_known().list;
        let string = store.well_known().string;

        let make = || {
            TypeShape::new_uncached(
                store.universe_id(),
                Type::class(list, vec![Type::class(string, vec![])]),
                None,
                None,
                None,
            )
        };

        let first = cache.intern(&store, make());
        let second = cache.intern(&store, make());
        assert!(TypeShape::ptr_eq(&first, &second));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn dead_entries_are_purged_on_later_interns() {
        let store = TypeStore::with_minimal_jdk();
        let cache = ShapeCache::new();
        let list = store.well_known().list;
        let integer = store.well_known().integer;

        let dead = cache.intern(
            &store,
            TypeShape::new_uncached(
                store.universe_id(),
                Type::class(list, vec![Type::class(integer, vec![])]),
                None,
                None,
                None,
            ),
        );
        assert_eq!(cache.len(), 1);
        drop(dead);
        assert_eq!(cache.len(), 0);

        // Interning an equal shape after the drop must insert fresh, not
        // resurrect a dead slot.
        let revived = cache.intern(
            &store,
            TypeShape::new_uncached(
                store.universe_id(),
                Type::class(list, vec![Type::class(integer, vec![])]),
                None,
                None,
                None,
            ),
        );
        assert_eq!(cache.len(), 1);
        drop(revived);
    }
}
