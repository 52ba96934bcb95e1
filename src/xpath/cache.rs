//! Compiled expression cache
//!
//! Parsing and compiling an XPath string is repeated work for the selectors
//! an application issues over and over; compiled programs are kept in a
//! bounded LRU keyed by the query text.

use std::num::NonZeroUsize;
use std::sync::{Arc, Mutex};

use lru::LruCache;
use tracing::trace;

use super::compiler::{compile, CompiledExpr};

/// Default number of compiled expressions kept
pub const DEFAULT_CAPACITY: usize = 256;

pub struct ExprCache {
    inner: Mutex<LruCache<String, Arc<CompiledExpr>>>,
}

impl ExprCache {
    pub fn new(capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity.max(1)).unwrap_or(NonZeroUsize::MIN);
        ExprCache {
            inner: Mutex::new(LruCache::new(capacity)),
        }
    }

    /// Return the compiled program for `xpath`, compiling it on a miss.
    /// Failed compilations are not cached.
    pub fn get_or_compile(&self, xpath: &str) -> Result<Arc<CompiledExpr>, String> {
        {
            let mut cache = self.inner.lock().unwrap_or_else(|e| e.into_inner());
            if let Some(hit) = cache.get(xpath) {
                trace!(xpath, "compiled expression cache hit");
                return Ok(Arc::clone(hit));
            }
        }

        let compiled = Arc::new(compile(xpath)?);
        let mut cache = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        cache.put(xpath.to_string(), Arc::clone(&compiled));
        Ok(compiled)
    }

    pub fn len(&self) -> usize {
        self.inner.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for ExprCache {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hit_returns_same_program() {
        let cache = ExprCache::default();
        let first = cache.get_or_compile("//a").unwrap();
        let second = cache.get_or_compile("//a").unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_eviction_and_errors() {
        let cache = ExprCache::new(2);
        for q in ["//a", "//b", "//c"] {
            cache.get_or_compile(q).unwrap();
        }
        assert_eq!(cache.len(), 2);
        assert!(cache.get_or_compile("//a[").is_err());
        assert_eq!(cache.len(), 2);
    }

    #[test]
    fn test_zero_capacity_still_works() {
        let cache = ExprCache::new(0);
        assert!(cache.get_or_compile("//a").is_ok());
        assert!(!cache.is_empty());
    }
}
