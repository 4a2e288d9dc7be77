use crate::ViewConfiguration;
use crate::location::ViewLocationResult;
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use std::any::Any;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, trace};

type CachedView = Arc<dyn Any + Send + Sync>;

/// Compiled views keyed by their location.
///
/// Each engine decides what it stores (raw text, a parsed template, ...). Concurrent
/// callers asking for the same key see the factory run at most once: the factory
/// runs while the map entry is locked, the other callers wait and get the stored value.
pub struct ViewCache {
    cache: DashMap<ViewLocationResult, CachedView>,
    disable_caches: bool,
    runtime_view_updates: bool,
}

impl ViewCache {
    pub fn new(configuration: &ViewConfiguration) -> Self {
        Self {
            cache: DashMap::new(),
            disable_caches: configuration.disable_caches(),
            runtime_view_updates: configuration.runtime_view_updates(),
        }
    }

    /// Returns the view cached for `key`, compiling it with `factory` on a miss.
    ///
    /// A failing factory stores nothing. With caches disabled the factory runs on
    /// every call and its result is never stored.
    ///
    /// The factory runs while the key's shard of the map is locked. It must not call
    /// back into this cache: a nested `get_or_add` on a key of the same shard deadlocks.
    pub fn get_or_add<T, E, F>(&self, key: &ViewLocationResult, factory: F) -> Result<Arc<T>, E>
    where
        T: Any + Send + Sync,
        F: FnOnce(&ViewLocationResult) -> Result<T, E>,
    {
        if self.disable_caches {
            return factory(key).map(Arc::new);
        }

        if self.runtime_view_updates && key.is_stale() && self.cache.remove(key).is_some() {
            debug!(view = %key, "stale view evicted");
        }

        match self.cache.entry(key.clone()) {
            Entry::Occupied(mut entry) => {
                if let Ok(view) = Arc::clone(entry.get()).downcast::<T>() {
                    trace!(view = %key, "view cache hit");
                    return Ok(view);
                }

                debug!(view = %key, "cached view has another type, recompiling");
                let view = Arc::new(factory(key)?);
                entry.insert(Arc::clone(&view) as CachedView);
                Ok(view)
            }
            Entry::Vacant(entry) => {
                let view = Arc::new(factory(key)?);
                entry.insert(Arc::clone(&view) as CachedView);
                trace!(view = %key, "view compiled and cached");
                Ok(view)
            }
        }
    }

    pub fn contains(&self, key: &ViewLocationResult) -> bool {
        self.cache.contains_key(key)
    }

    pub fn remove(&self, key: &ViewLocationResult) -> bool {
        self.cache.remove(key).is_some()
    }

    pub fn clear(&self) {
        self.cache.clear();
    }

    pub fn len(&self) -> usize {
        self.cache.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cache.is_empty()
    }
}

impl fmt::Debug for ViewCache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ViewCache")
            .field("len", &self.cache.len())
            .field("disable_caches", &self.disable_caches)
            .field("runtime_view_updates", &self.runtime_view_updates)
            .finish()
    }
}
