use crate::{
    cache::{Cache, CacheConfig, CacheKey},
    value::Value,
};
use std::collections::HashMap;

///
/// PerpetualCache
///
/// The plain unbounded hash map store backing every namespace cache.
///

#[derive(Debug)]
pub struct PerpetualCache {
    config: CacheConfig,
    entries: HashMap<CacheKey, Value>,
}

impl PerpetualCache {
    #[must_use]
    pub fn new(config: CacheConfig) -> Self {
        Self {
            config,
            entries: HashMap::new(),
        }
    }
}

impl Cache for PerpetualCache {
    fn config(&self) -> &CacheConfig {
        &self.config
    }

    fn get(&self, key: &CacheKey) -> Option<Value> {
        self.entries.get(key).cloned()
    }

    fn put(&mut self, key: CacheKey, value: Value) {
        self.entries.insert(key, value);
    }

    fn remove(&mut self, key: &CacheKey) -> Option<Value> {
        self.entries.remove(key)
    }

    fn clear(&mut self) {
        self.entries.clear();
    }

    fn len(&self) -> usize {
        self.entries.len()
    }
}
