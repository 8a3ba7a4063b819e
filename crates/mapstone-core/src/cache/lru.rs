use crate::{
    cache::{Cache, CacheConfig, CacheKey},
    value::Value,
};
use std::collections::VecDeque;

// Evicting caches default to this bound when the descriptor names none.
pub(crate) const DEFAULT_EVICTION_SIZE: usize = 1024;

///
/// LruCache
///
/// Least-recently-written eviction decorator over a delegate store.
/// Rewriting a key refreshes its position; writes past capacity evict
/// from the cold end.
///

#[derive(Debug)]
pub struct LruCache {
    delegate: Box<dyn Cache>,
    capacity: usize,
    order: VecDeque<CacheKey>,
}

impl LruCache {
    #[must_use]
    pub fn new(delegate: Box<dyn Cache>, capacity: usize) -> Self {
        Self {
            delegate,
            capacity: capacity.max(1),
            order: VecDeque::new(),
        }
    }

    fn evict_over_capacity(&mut self) {
        while self.order.len() > self.capacity {
            if let Some(coldest) = self.order.pop_front() {
                self.delegate.remove(&coldest);
            }
        }
    }
}

impl Cache for LruCache {
    fn config(&self) -> &CacheConfig {
        self.delegate.config()
    }

    fn get(&self, key: &CacheKey) -> Option<Value> {
        self.delegate.get(key)
    }

    fn put(&mut self, key: CacheKey, value: Value) {
        if let Some(pos) = self.order.iter().position(|k| k == &key) {
            self.order.remove(pos);
        }
        self.order.push_back(key.clone());
        self.delegate.put(key, value);
        self.evict_over_capacity();
    }

    fn remove(&mut self, key: &CacheKey) -> Option<Value> {
        if let Some(pos) = self.order.iter().position(|k| k == key) {
            self.order.remove(pos);
        }
        self.delegate.remove(key)
    }

    fn clear(&mut self) {
        self.order.clear();
        self.delegate.clear();
    }

    fn len(&self) -> usize {
        self.delegate.len()
    }
}

///
/// FifoCache
///
/// First-in-first-out eviction decorator; insertion order only, reads do
/// not refresh.
///

#[derive(Debug)]
pub struct FifoCache {
    delegate: Box<dyn Cache>,
    capacity: usize,
    order: VecDeque<CacheKey>,
}

impl FifoCache {
    #[must_use]
    pub fn new(delegate: Box<dyn Cache>, capacity: usize) -> Self {
        Self {
            delegate,
            capacity: capacity.max(1),
            order: VecDeque::new(),
        }
    }
}

impl Cache for FifoCache {
    fn config(&self) -> &CacheConfig {
        self.delegate.config()
    }

    fn get(&self, key: &CacheKey) -> Option<Value> {
        self.delegate.get(key)
    }

    fn put(&mut self, key: CacheKey, value: Value) {
        if !self.order.contains(&key) {
            self.order.push_back(key.clone());
        }
        self.delegate.put(key, value);
        while self.order.len() > self.capacity {
            if let Some(oldest) = self.order.pop_front() {
                self.delegate.remove(&oldest);
            }
        }
    }

    fn remove(&mut self, key: &CacheKey) -> Option<Value> {
        if let Some(pos) = self.order.iter().position(|k| k == key) {
            self.order.remove(pos);
        }
        self.delegate.remove(key)
    }

    fn clear(&mut self) {
        self.order.clear();
        self.delegate.clear();
    }

    fn len(&self) -> usize {
        self.delegate.len()
    }
}
