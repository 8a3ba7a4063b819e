use crate::cache::{
    CacheConfig, FifoCache, LruCache, PerpetualCache, SharedCache, lru::DEFAULT_EVICTION_SIZE,
};
use mapstone_schema::node::CacheDescriptor;
use mapstone_schema::types::{CacheImplKind, EvictionKind};
use std::{
    collections::BTreeMap,
    sync::{Arc, RwLock},
    time::Duration,
};

///
/// CacheBuilder
///
/// Assembles one namespace cache: base implementation wrapped by the
/// configured eviction decorator.
///

#[derive(Debug)]
pub struct CacheBuilder {
    config: CacheConfig,
}

impl CacheBuilder {
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            config: CacheConfig {
                id: id.into(),
                implementation: CacheImplKind::Perpetual,
                eviction: EvictionKind::Lru,
                flush_interval: None,
                size: None,
                read_only: false,
                blocking: false,
                properties: BTreeMap::new(),
            },
        }
    }

    #[must_use]
    pub fn from_descriptor(id: impl Into<String>, descriptor: &CacheDescriptor) -> Self {
        let mut builder = Self::new(id);
        builder.config.implementation = descriptor.implementation;
        builder.config.eviction = descriptor.eviction;
        builder.config.flush_interval = descriptor.flush_interval_ms.map(Duration::from_millis);
        builder.config.size = descriptor.size;
        builder.config.read_only = descriptor.read_only;
        builder.config.blocking = descriptor.blocking;
        builder.config.properties = descriptor.properties.clone();
        builder
    }

    #[must_use]
    pub const fn eviction(mut self, eviction: EvictionKind) -> Self {
        self.config.eviction = eviction;
        self
    }

    #[must_use]
    pub const fn size(mut self, size: Option<usize>) -> Self {
        self.config.size = size;
        self
    }

    #[must_use]
    pub const fn read_only(mut self, read_only: bool) -> Self {
        self.config.read_only = read_only;
        self
    }

    #[must_use]
    pub fn build(self) -> SharedCache {
        let eviction = self.config.eviction;
        let capacity = self.config.size.unwrap_or(DEFAULT_EVICTION_SIZE);
        let base = PerpetualCache::new(self.config);

        match eviction {
            EvictionKind::Lru => {
                let cache: SharedCache =
                    Arc::new(RwLock::new(LruCache::new(Box::new(base), capacity)));
                cache
            }
            EvictionKind::Fifo => {
                let cache: SharedCache =
                    Arc::new(RwLock::new(FifoCache::new(Box::new(base), capacity)));
                cache
            }
            EvictionKind::None => {
                let cache: SharedCache = Arc::new(RwLock::new(base));
                cache
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::CacheKey;
    use crate::value::Value;

    #[test]
    fn builds_with_the_descriptor_configuration() {
        let descriptor = CacheDescriptor {
            eviction: EvictionKind::Fifo,
            size: Some(8),
            read_only: true,
            flush_interval_ms: Some(60_000),
            ..CacheDescriptor::default()
        };

        let cache = CacheBuilder::from_descriptor("app.users", &descriptor).build();
        let guard = cache.read().expect("cache lock poisoned");
        assert_eq!(guard.id(), "app.users");
        assert_eq!(guard.config().eviction, EvictionKind::Fifo);
        assert_eq!(guard.config().size, Some(8));
        assert!(guard.config().read_only);
        assert_eq!(guard.config().flush_interval, Some(Duration::from_secs(60)));
    }

    #[test]
    fn built_cache_stores_values() {
        let cache = CacheBuilder::new("app.users").build();
        let mut key = CacheKey::new();
        key.update_str("row");

        cache
            .write()
            .expect("cache lock poisoned")
            .put(key.clone(), Value::I64(9));
        assert_eq!(
            cache.read().expect("cache lock poisoned").get(&key),
            Some(Value::I64(9))
        );
    }
}
