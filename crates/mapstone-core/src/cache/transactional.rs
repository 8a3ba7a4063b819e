use crate::{
    cache::{CacheKey, SharedCache},
    value::Value,
};
use std::collections::HashMap;

///
/// TransactionalCache
///
/// Per-unit-of-work overlay over one shared cache. Puts are buffered, not
/// written through; reads serve the buffer first and fall back to the
/// shared cache (unless a clear is pending, which hides it). `commit`
/// publishes the buffered clear and writes; `rollback` discards them
/// without touching the shared cache.
///

#[derive(Debug)]
pub struct TransactionalCache {
    delegate: SharedCache,
    clear_pending: bool,
    pending_puts: HashMap<CacheKey, Value>,
}

impl TransactionalCache {
    #[must_use]
    pub fn new(delegate: SharedCache) -> Self {
        Self {
            delegate,
            clear_pending: false,
            pending_puts: HashMap::new(),
        }
    }

    #[must_use]
    pub fn get(&self, key: &CacheKey) -> Option<Value> {
        if let Some(buffered) = self.pending_puts.get(key) {
            return Some(buffered.clone());
        }
        if self.clear_pending {
            return None;
        }
        self.delegate.read().expect("cache lock poisoned").get(key)
    }

    pub fn put(&mut self, key: CacheKey, value: Value) {
        self.pending_puts.insert(key, value);
    }

    pub fn clear(&mut self) {
        self.clear_pending = true;
        self.pending_puts.clear();
    }

    pub fn commit(&mut self) {
        let mut delegate = self.delegate.write().expect("cache lock poisoned");
        if self.clear_pending {
            delegate.clear();
        }
        for (key, value) in self.pending_puts.drain() {
            delegate.put(key, value);
        }
        self.clear_pending = false;
    }

    pub fn rollback(&mut self) {
        self.pending_puts.clear();
        self.clear_pending = false;
    }
}

///
/// TransactionalCacheManager
///
/// Exactly one overlay per distinct shared cache within a unit of work,
/// created lazily on first access and discarded with the unit of work.
///

#[derive(Debug, Default)]
pub struct TransactionalCacheManager {
    overlays: HashMap<String, TransactionalCache>,
}

impl TransactionalCacheManager {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn overlay(&mut self, cache: &SharedCache) -> &mut TransactionalCache {
        let id = cache.read().expect("cache lock poisoned").id().to_string();
        self.overlays
            .entry(id)
            .or_insert_with(|| TransactionalCache::new(SharedCache::clone(cache)))
    }

    pub fn get(&mut self, cache: &SharedCache, key: &CacheKey) -> Option<Value> {
        self.overlay(cache).get(key)
    }

    pub fn put(&mut self, cache: &SharedCache, key: CacheKey, value: Value) {
        self.overlay(cache).put(key, value);
    }

    pub fn clear(&mut self, cache: &SharedCache) {
        self.overlay(cache).clear();
    }

    pub fn commit(&mut self) {
        for overlay in self.overlays.values_mut() {
            overlay.commit();
        }
    }

    pub fn rollback(&mut self) {
        for overlay in self.overlays.values_mut() {
            overlay.rollback();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::CacheBuilder;

    fn key(text: &str) -> CacheKey {
        let mut key = CacheKey::new();
        key.update_str(text);
        key
    }

    #[test]
    fn buffered_puts_are_visible_through_the_overlay_only() {
        let shared = CacheBuilder::new("app.users").build();
        let mut overlay = TransactionalCache::new(SharedCache::clone(&shared));

        overlay.put(key("k"), Value::I64(1));
        assert_eq!(overlay.get(&key("k")), Some(Value::I64(1)));
        assert!(
            shared.read().expect("cache lock poisoned").get(&key("k")).is_none(),
            "puts must not write through before commit"
        );
    }

    #[test]
    fn rollback_discards_without_touching_the_shared_cache() {
        let shared = CacheBuilder::new("app.users").build();
        let mut overlay = TransactionalCache::new(SharedCache::clone(&shared));

        overlay.put(key("k"), Value::I64(1));
        overlay.rollback();

        assert!(overlay.get(&key("k")).is_none());
        assert!(shared.read().expect("cache lock poisoned").get(&key("k")).is_none());
    }

    #[test]
    fn commit_publishes_buffered_writes() {
        let shared = CacheBuilder::new("app.users").build();
        let mut overlay = TransactionalCache::new(SharedCache::clone(&shared));

        overlay.put(key("k"), Value::I64(1));
        overlay.commit();

        assert_eq!(
            shared.read().expect("cache lock poisoned").get(&key("k")),
            Some(Value::I64(1))
        );
    }

    #[test]
    fn pending_clear_hides_shared_entries_until_commit() {
        let shared = CacheBuilder::new("app.users").build();
        shared
            .write()
            .expect("cache lock poisoned")
            .put(key("old"), Value::I64(1));

        let mut overlay = TransactionalCache::new(SharedCache::clone(&shared));
        assert_eq!(overlay.get(&key("old")), Some(Value::I64(1)));

        overlay.clear();
        assert!(overlay.get(&key("old")).is_none(), "cleared view hides shared entries");
        assert_eq!(
            shared.read().expect("cache lock poisoned").get(&key("old")),
            Some(Value::I64(1)),
            "shared cache untouched before commit"
        );

        overlay.commit();
        assert!(shared.read().expect("cache lock poisoned").get(&key("old")).is_none());
    }

    #[test]
    fn manager_keeps_one_overlay_per_distinct_cache() {
        let users = CacheBuilder::new("app.users").build();
        let orders = CacheBuilder::new("app.orders").build();
        let mut manager = TransactionalCacheManager::new();

        manager.put(&users, key("u"), Value::I64(1));
        manager.put(&orders, key("o"), Value::I64(2));
        assert_eq!(manager.overlays.len(), 2);

        manager.commit();
        assert_eq!(
            users.read().expect("cache lock poisoned").get(&key("u")),
            Some(Value::I64(1))
        );
        assert_eq!(
            orders.read().expect("cache lock poisoned").get(&key("o")),
            Some(Value::I64(2))
        );
    }
}
