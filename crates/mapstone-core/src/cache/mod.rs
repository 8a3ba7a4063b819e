mod builder;
mod key;
mod lru;
mod perpetual;
mod transactional;

pub use builder::CacheBuilder;
pub use key::CacheKey;
pub use lru::{FifoCache, LruCache};
pub use perpetual::PerpetualCache;
pub use transactional::{TransactionalCache, TransactionalCacheManager};

use crate::value::Value;
use mapstone_schema::types::{CacheImplKind, EvictionKind};
use std::{
    collections::BTreeMap,
    fmt,
    sync::{Arc, RwLock},
    time::Duration,
};

/// A namespace cache as shared between statements (and across namespaces
/// through cache refs). Arc identity is cache identity.
pub type SharedCache = Arc<RwLock<dyn Cache>>;

///
/// CacheConfig
///
/// Compiled cache configuration. `read_only` and `blocking` are surface
/// for the execution layer; the in-memory stores here do not interpret
/// them.
///

#[derive(Clone, Debug)]
pub struct CacheConfig {
    pub id: String,
    pub implementation: CacheImplKind,
    pub eviction: EvictionKind,
    pub flush_interval: Option<Duration>,
    pub size: Option<usize>,
    pub read_only: bool,
    pub blocking: bool,
    pub properties: BTreeMap<String, String>,
}

///
/// Cache
///

pub trait Cache: Send + Sync + fmt::Debug {
    fn config(&self) -> &CacheConfig;

    fn get(&self, key: &CacheKey) -> Option<Value>;

    fn put(&mut self, key: CacheKey, value: Value);

    fn remove(&mut self, key: &CacheKey) -> Option<Value>;

    fn clear(&mut self);

    fn len(&self) -> usize;

    fn id(&self) -> &str {
        &self.config().id
    }

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
