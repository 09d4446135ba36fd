use crate::error::{ExplicitAbort, HandlerError, ResolutionError};
use crate::handler::HandlerModule;
use crate::loader::DefinitionLoader;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Apply the failure policy to a resolution error.
///
/// In debug mode the error is passed on unchanged for rendering. Otherwise it
/// becomes `ExplicitAbort{ABORTED, FORBIDDEN}` and the details stay in the log.
#[must_use]
pub fn conceal(err: ResolutionError, debug: bool) -> HandlerError {
    if debug {
        HandlerError::Resolution(err)
    } else {
        warn!(error = %err, "Handler resolution failed - answering FORBIDDEN");
        HandlerError::Abort(ExplicitAbort::forbidden())
    }
}

/// Cache of loaded handler definitions in front of a [`DefinitionLoader`].
///
/// At most one definition is live per key. Lookups share a read lock; loads,
/// reloads and evictions take the write lock, so a definition is never built
/// twice concurrently for the same cache state.
///
/// Cloning is cheap and clones share the cache.
#[derive(Clone)]
pub struct Resolver {
    loader: Arc<dyn DefinitionLoader>,
    cache: Arc<RwLock<HashMap<String, Arc<HandlerModule>>>>,
    generation: Arc<AtomicU64>,
}

impl Resolver {
    pub fn new(loader: Arc<dyn DefinitionLoader>) -> Self {
        Self {
            loader,
            cache: Arc::new(RwLock::new(HashMap::new())),
            generation: Arc::new(AtomicU64::new(0)),
        }
    }

    /// The definition for `key`.
    ///
    /// With `debug` set, any cached definition is discarded and the loader's
    /// `reload` runs unconditionally. Otherwise a cached definition is returned
    /// as is and the loader only runs on a miss.
    pub fn resolve(&self, key: &str, debug: bool) -> Result<Arc<HandlerModule>, ResolutionError> {
        if debug {
            return self.reload(key);
        }

        // Fast path: shared lock only
        if let Some(module) = self.cache.read().get(key) {
            debug!(
                key = %key,
                generation = module.generation(),
                "Handler definition cache hit"
            );
            return Ok(Arc::clone(module));
        }

        let mut cache = self.cache.write();
        // Another thread may have loaded it while we waited for the write lock
        if let Some(module) = cache.get(key) {
            return Ok(Arc::clone(module));
        }

        let module = self.stamp(self.loader.load(key)?);
        cache.insert(key.to_string(), Arc::clone(&module));
        info!(
            key = %key,
            generation = module.generation(),
            cache_size = cache.len(),
            "Handler definition loaded and cached"
        );
        Ok(module)
    }

    /// [`resolve`](Self::resolve) with the failure policy of [`conceal`] applied.
    pub fn resolve_or_conceal(
        &self,
        key: &str,
        debug: bool,
    ) -> Result<Arc<HandlerModule>, HandlerError> {
        self.resolve(key, debug).map_err(|err| conceal(err, debug))
    }

    /// Discard the cached definition for `key` and build it again.
    ///
    /// On failure nothing is cached for `key`.
    pub fn reload(&self, key: &str) -> Result<Arc<HandlerModule>, ResolutionError> {
        let mut cache = self.cache.write();
        let previous = cache.remove(key).map(|m| m.generation());

        let module = self.stamp(self.loader.reload(key)?);
        cache.insert(key.to_string(), Arc::clone(&module));
        info!(
            key = %key,
            previous_generation = ?previous,
            generation = module.generation(),
            "Handler definition reloaded"
        );
        Ok(module)
    }

    /// Drop the cached definition for `key`; the next resolve loads it again.
    pub fn evict(&self, key: &str) -> bool {
        let removed = self.cache.write().remove(key).is_some();
        if removed {
            info!(key = %key, "Handler definition evicted");
        }
        removed
    }

    /// Drop every cached definition.
    pub fn clear(&self) {
        let mut cache = self.cache.write();
        let dropped = cache.len();
        cache.clear();
        info!(dropped = dropped, "Handler definition cache cleared");
    }

    /// Cached definition for `key`, without loading.
    #[must_use]
    pub fn cached(&self, key: &str) -> Option<Arc<HandlerModule>> {
        self.cache.read().get(key).cloned()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.cache.read().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.cache.read().is_empty()
    }

    fn stamp(&self, mut module: HandlerModule) -> Arc<HandlerModule> {
        let generation = self.generation.fetch_add(1, Ordering::Relaxed) + 1;
        module.set_generation(generation);
        Arc::new(module)
    }
}

impl fmt::Debug for Resolver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Resolver")
            .field("cached", &self.len())
            .field("generation", &self.generation.load(Ordering::Relaxed))
            .finish_non_exhaustive()
    }
}
