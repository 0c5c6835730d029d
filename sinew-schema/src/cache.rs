//! Process-wide descriptor registry.
//!
//! Descriptors are built lazily the first time a type is used and reused for
//! the lifetime of the process. Each entry is keyed by the [`TypeId`] of the
//! stored value, so one registry can hold the descriptors of every model.
//!
//! # Examples
//!
//! ```rust
//! use sinew_schema::cache::DescriptorCache;
//!
//! #[derive(Debug)]
//! struct UserSchema(&'static str);
//!
//! let cache = DescriptorCache::new();
//! let first = cache
//!     .get_or_try_insert(|| Ok::<_, ()>(UserSchema("users")))
//!     .unwrap();
//! let second = cache
//!     .get_or_try_insert(|| Ok::<_, ()>(UserSchema("ignored")))
//!     .unwrap();
//!
//! assert_eq!(second.0, "users");
//! assert!(std::sync::Arc::ptr_eq(&first, &second));
//! ```

use parking_lot::RwLock;
use std::any::{Any, TypeId};
use std::collections::{HashMap, hash_map};
use std::sync::Arc;

type Entry = Arc<dyn Any + Send + Sync>;

/// A memoizing, thread-safe map from type to built descriptor.
#[derive(Default)]
pub struct DescriptorCache {
    entries: RwLock<HashMap<TypeId, Entry>>,
    stats: RwLock<CacheStats>,
}

/// Statistics for the descriptor cache.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CacheStats {
    /// Lookups served from the cache.
    pub hits: u64,
    /// Lookups that had to build a descriptor.
    pub misses: u64,
    /// Builds discarded because another caller inserted first.
    pub races: u64,
    /// Number of descriptors currently cached.
    pub cached_count: usize,
}

impl CacheStats {
    /// Get the cache hit rate.
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}

impl std::fmt::Debug for DescriptorCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DescriptorCache")
            .field("cached_count", &self.len())
            .finish()
    }
}

impl DescriptorCache {
    /// Create a new empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the cached value of type `T`, building it with `build` on a miss.
    ///
    /// The builder runs outside the lock. When two callers race, the first
    /// insertion wins and every caller receives that same `Arc`.
    pub fn get_or_try_insert<T, E, F>(&self, build: F) -> Result<Arc<T>, E>
    where
        T: Any + Send + Sync,
        F: FnOnce() -> Result<T, E>,
    {
        let key = TypeId::of::<T>();

        if let Some(found) = self.lookup::<T>(key) {
            self.stats.write().hits += 1;
            return Ok(found);
        }

        let built: Arc<T> = Arc::new(build()?);
        let existing = {
            let mut entries = self.entries.write();
            match entries.entry(key) {
                hash_map::Entry::Occupied(slot) => Arc::clone(slot.get()).downcast::<T>().ok(),
                hash_map::Entry::Vacant(slot) => {
                    slot.insert(Arc::clone(&built) as Entry);
                    None
                }
            }
        };

        {
            let mut stats = self.stats.write();
            stats.misses += 1;
            if existing.is_some() {
                stats.races += 1;
            }
        }

        match existing {
            Some(winner) => {
                tracing::trace!(
                    descriptor = std::any::type_name::<T>(),
                    "descriptor built concurrently, reusing first"
                );
                Ok(winner)
            }
            None => {
                tracing::debug!(
                    descriptor = std::any::type_name::<T>(),
                    "descriptor cached"
                );
                Ok(built)
            }
        }
    }

    fn lookup<T: Any + Send + Sync>(&self, key: TypeId) -> Option<Arc<T>> {
        let entries = self.entries.read();
        entries
            .get(&key)
            .and_then(|entry| Arc::clone(entry).downcast::<T>().ok())
    }

    /// Check whether a value of type `T` is cached.
    pub fn contains<T: Any>(&self) -> bool {
        self.entries.read().contains_key(&TypeId::of::<T>())
    }

    /// Remove every cached descriptor.
    pub fn clear(&self) {
        self.entries.write().clear();
    }

    /// Get cache statistics.
    pub fn stats(&self) -> CacheStats {
        let mut stats = self.stats.read().clone();
        stats.cached_count = self.len();
        stats
    }

    /// Get the number of cached descriptors.
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    /// Check if the cache is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }
}

/// Global descriptor registry.
pub static DESCRIPTORS: std::sync::LazyLock<DescriptorCache> =
    std::sync::LazyLock::new(DescriptorCache::new);

/// Get or build a descriptor in the global registry.
pub fn descriptor<T, E, F>(build: F) -> Result<Arc<T>, E>
where
    T: Any + Send + Sync,
    F: FnOnce() -> Result<T, E>,
{
    DESCRIPTORS.get_or_try_insert(build)
}
