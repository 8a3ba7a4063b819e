use crate::types::{CacheImplKind, EvictionKind};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

///
/// CacheDescriptor
///
/// Configuration for a namespace's shared cache. Free-form `properties`
/// are forwarded to the cache implementation untouched.
///

#[derive(Clone, Debug, Default, Deserialize, Serialize)]
pub struct CacheDescriptor {
    #[serde(default)]
    pub implementation: CacheImplKind,

    #[serde(default)]
    pub eviction: EvictionKind,

    /// Periodic flush interval in milliseconds; `None` means never.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub flush_interval_ms: Option<u64>,

    /// Bounded entry count for evicting caches.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<usize>,

    #[serde(default)]
    pub read_only: bool,

    #[serde(default)]
    pub blocking: bool,

    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub properties: BTreeMap<String, String>,
}
