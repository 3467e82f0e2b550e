//! Counter registry and call-site handle cache.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use crate::error::{Result, TraceError};

/// A registered trace region.
///
/// Strings are shared so resolving events at export time is a refcount bump.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Counter {
    name: Arc<str>,
    category: Arc<str>,
}

impl Counter {
    /// Create a counter.
    #[must_use]
    pub fn new(name: &str, category: &str) -> Self {
        Self {
            name: Arc::from(name),
            category: Arc::from(category),
        }
    }

    /// Region name as shown in the trace viewer.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Comma separated category list.
    #[must_use]
    pub fn category(&self) -> &str {
        &self.category
    }
}

/// Index of a counter in the registry of the tracer that issued it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CounterHandle(usize);

impl CounterHandle {
    #[cfg(test)]
    pub(crate) const fn from_index(index: usize) -> Self {
        Self(index)
    }

    /// Raw registry index.
    #[must_use]
    pub const fn index(self) -> usize {
        self.0
    }
}

/// Append-only list of counters.
///
/// Handles are never reused and the registry never shrinks, so a handle stays
/// valid for the lifetime of the owning tracer.
#[derive(Debug, Default)]
pub struct CounterRegistry {
    counters: Vec<Counter>,
    /// Call-site address -> handle, so each site registers once per tracer.
    sites: HashMap<usize, CounterHandle>,
}

impl CounterRegistry {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a counter and return its handle.
    ///
    /// Not idempotent: registering the same name twice yields two handles.
    pub fn register(&mut self, name: &str, category: &str) -> CounterHandle {
        self.counters.push(Counter::new(name, category));
        CounterHandle(self.counters.len() - 1)
    }

    /// Handle for a static call site, registering it on first use.
    pub fn register_site(&mut self, site: &'static CallSite) -> CounterHandle {
        let key = site.key();
        if let Some(&handle) = self.sites.get(&key) {
            return handle;
        }
        let handle = self.register(site.name(), site.category());
        self.sites.insert(key, handle);
        handle
    }

    /// Look up a counter.
    #[must_use]
    pub fn get(&self, handle: CounterHandle) -> Option<&Counter> {
        self.counters.get(handle.0)
    }

    /// Look up a counter, failing for handles this registry never issued.
    pub fn validate(&self, handle: CounterHandle) -> Result<&Counter> {
        self.get(handle).ok_or(TraceError::InvalidHandle {
            handle: handle.0,
            registered: self.counters.len(),
        })
    }

    /// Number of registered counters.
    #[must_use]
    pub fn len(&self) -> usize {
        self.counters.len()
    }

    /// Check if nothing has been registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.counters.is_empty()
    }

    /// The counter table, indexed by handle.
    #[must_use]
    pub fn counters(&self) -> &[Counter] {
        &self.counters
    }

    /// Copy of the counter table, used to resolve events outside the lock.
    #[must_use]
    pub fn snapshot(&self) -> Vec<Counter> {
        self.counters.clone()
    }
}

/// A statically allocated instrumentation site.
///
/// Declared by [`trace_scope!`](crate::trace_scope) as a `static`. Caches the
/// handle of the last tracer that used it; other tracers fall back to their
/// own site map.
#[derive(Debug)]
pub struct CallSite {
    name: &'static str,
    category: &'static str,
    /// `tracer id << 32 | handle`, 0 when empty.
    cache: AtomicU64,
}

impl CallSite {
    /// Create an uncached call site.
    #[must_use]
    pub const fn new(name: &'static str, category: &'static str) -> Self {
        Self {
            name,
            category,
            cache: AtomicU64::new(0),
        }
    }

    /// Region name.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        self.name
    }

    /// Region category.
    #[must_use]
    pub const fn category(&self) -> &'static str {
        self.category
    }

    fn key(&'static self) -> usize {
        std::ptr::from_ref(self) as usize
    }

    /// Cached handle if it was issued by tracer `tracer_id`.
    #[inline]
    pub(crate) fn cached(&self, tracer_id: u32) -> Option<CounterHandle> {
        let packed = self.cache.load(Ordering::Acquire);
        if packed == 0 || packed >> 32 != u64::from(tracer_id) {
            return None;
        }
        usize::try_from(packed & u64::from(u32::MAX))
            .ok()
            .map(CounterHandle)
    }

    pub(crate) fn store(&self, tracer_id: u32, handle: CounterHandle) {
        if let Ok(index) = u32::try_from(handle.0) {
            let packed = (u64::from(tracer_id) << 32) | u64::from(index);
            self.cache.store(packed, Ordering::Release);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn register_appends_without_dedup() {
        let mut registry = CounterRegistry::new();
        let a = registry.register("load", "io");
        let b = registry.register("load", "io");

        assert_ne!(a, b);
        assert_eq!(a.index(), 0);
        assert_eq!(b.index(), 1);
        assert_eq!(registry.len(), 2);
        assert_eq!(registry.get(b).unwrap().category(), "io");
    }

    #[test]
    fn validate_rejects_foreign_handle() {
        let mut registry = CounterRegistry::new();
        registry.register("a", "");

        let err = registry.validate(CounterHandle(5)).unwrap_err();
        assert!(matches!(
            err,
            TraceError::InvalidHandle {
                handle: 5,
                registered: 1
            }
        ));
    }

    #[test]
    fn register_site_is_idempotent() {
        static SITE: CallSite = CallSite::new("parse", "frontend");
        let mut registry = CounterRegistry::new();
        registry.register("unrelated", "");

        let first = registry.register_site(&SITE);
        let second = registry.register_site(&SITE);

        assert_eq!(first, second);
        assert_eq!(registry.len(), 2);
        assert_eq!(registry.get(first).unwrap().name(), "parse");
    }

    #[test]
    fn call_site_cache_is_keyed_by_tracer() {
        let site = CallSite::new("x", "");
        assert_eq!(site.cached(1), None);

        site.store(1, CounterHandle(7));
        assert_eq!(site.cached(1), Some(CounterHandle(7)));
        assert_eq!(site.cached(2), None);

        site.store(2, CounterHandle(0));
        assert_eq!(site.cached(1), None);
        assert_eq!(site.cached(2), Some(CounterHandle(0)));
    }
}
