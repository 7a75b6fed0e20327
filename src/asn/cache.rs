//! Attribution caching

use super::resolver::AttributionResult;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

/// Thread-safe cache of attributions by ASN label
#[derive(Debug, Clone)]
pub struct AttributionCache {
    cache: Arc<Mutex<HashMap<String, AttributionResult>>>,
}

impl AttributionCache {
    /// Create a new empty cache
    pub fn new() -> Self {
        Self {
            cache: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Look up a cached attribution
    pub fn get(&self, asn: &str) -> Option<AttributionResult> {
        let cache = self.cache.lock().expect("mutex poisoned");
        cache.get(asn).cloned()
    }

    /// Insert an attribution
    pub fn insert(&self, result: AttributionResult) {
        let mut cache = self.cache.lock().expect("mutex poisoned");
        cache.insert(result.asn.clone(), result);
    }

    /// Get the number of entries in the cache
    pub fn len(&self) -> usize {
        let cache = self.cache.lock().expect("mutex poisoned");
        cache.len()
    }

    /// Check if the cache is empty
    pub fn is_empty(&self) -> bool {
        let cache = self.cache.lock().expect("mutex poisoned");
        cache.is_empty()
    }

    /// Clear all entries from the cache
    pub fn clear(&self) {
        let mut cache = self.cache.lock().expect("mutex poisoned");
        cache.clear();
    }
}

impl Default for AttributionCache {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::asn::provider::{CountrySet, Source};

    #[test]
    fn test_attribution_cache() {
        let cache = AttributionCache::new();
        assert!(cache.is_empty());

        let result = AttributionResult::resolved(
            "AS64500",
            Source::Whois,
            CountrySet::from_codes(["BR"]),
        );
        cache.insert(result.clone());
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.get("AS64500"), Some(result));
        assert_eq!(cache.get("AS64501"), None);

        cache.insert(AttributionResult::unresolved("AS99999"));
        assert_eq!(cache.len(), 2);
        assert!(cache.get("AS99999").unwrap().is_missing());

        cache.clear();
        assert!(cache.is_empty());
    }

    #[test]
    fn test_clones_share_entries() {
        let cache = AttributionCache::new();
        let other = cache.clone();
        other.insert(AttributionResult::unresolved("AS1"));
        assert_eq!(cache.len(), 1);
    }
}
