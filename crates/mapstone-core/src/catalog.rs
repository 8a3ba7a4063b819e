use crate::{
    builder::{CacheRefResolver, PendingStatement, ResultMapResolver},
    cache::SharedCache,
    convert::ConverterRegistry,
    error::ErrorClass,
    mapping::{ParamMap, ResultMap, Statement},
    types::TypeRegistry,
};
use derive_more::Display;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use thiserror::Error as ThisError;

///
/// RegistryError
///

#[derive(Clone, Debug, ThisError)]
pub enum RegistryError {
    #[error("{kind} '{id}' already registered")]
    Duplicate { kind: RegistryKind, id: String },

    #[error("{kind} '{id}' not found")]
    NotFound { kind: RegistryKind, id: String },

    #[error("{kind} short id '{id}' is ambiguous (candidates include '{first}' and '{second}')")]
    Ambiguous {
        kind: RegistryKind,
        id: String,
        first: String,
        second: String,
    },
}

impl RegistryError {
    #[must_use]
    pub const fn class(&self) -> ErrorClass {
        match self {
            Self::Duplicate { .. } => ErrorClass::Conflict,
            Self::NotFound { .. } => ErrorClass::NotFound,
            Self::Ambiguous { .. } => ErrorClass::Resolution,
        }
    }
}

///
/// RegistryKind
///

#[derive(Clone, Copy, Debug, Display, Eq, PartialEq)]
#[remain::sorted]
pub enum RegistryKind {
    #[display("cache")]
    Cache,
    #[display("parameter map")]
    ParamMap,
    #[display("result map")]
    ResultMap,
    #[display("statement")]
    Statement,
}

// Short-name index entry: unique short ids resolve to their qualified id,
// clashes become poisoned markers that fail lookup with both candidates.
#[derive(Clone, Debug)]
enum ShortEntry {
    Unique(String),
    Ambiguous(String, String),
}

///
/// Registry
///
/// Strict qualified-id table: duplicate ids are conflicts, lookups accept a
/// unique short name as a convenience, ambiguous short names refuse to
/// guess.
///

#[derive(Debug)]
pub(crate) struct Registry<T> {
    kind: RegistryKind,
    entries: HashMap<String, T>,
    short: HashMap<String, ShortEntry>,
}

impl<T: Clone> Registry<T> {
    pub(crate) fn new(kind: RegistryKind) -> Self {
        Self {
            kind,
            entries: HashMap::new(),
            short: HashMap::new(),
        }
    }

    pub(crate) fn insert(&mut self, id: &str, value: T) -> Result<(), RegistryError> {
        if self.entries.contains_key(id) {
            return Err(RegistryError::Duplicate {
                kind: self.kind,
                id: id.to_string(),
            });
        }

        if let Some((_, short_id)) = id.rsplit_once('.') {
            match self.short.get(short_id) {
                None => {
                    self.short
                        .insert(short_id.to_string(), ShortEntry::Unique(id.to_string()));
                }
                Some(ShortEntry::Unique(existing)) => {
                    let marker = ShortEntry::Ambiguous(existing.clone(), id.to_string());
                    self.short.insert(short_id.to_string(), marker);
                }
                Some(ShortEntry::Ambiguous(..)) => {}
            }
        }

        self.entries.insert(id.to_string(), value);
        Ok(())
    }

    pub(crate) fn get(&self, id: &str) -> Result<T, RegistryError> {
        if let Some(value) = self.entries.get(id) {
            return Ok(value.clone());
        }

        match self.short.get(id) {
            Some(ShortEntry::Unique(full)) => self.get(full),
            Some(ShortEntry::Ambiguous(first, second)) => Err(RegistryError::Ambiguous {
                kind: self.kind,
                id: id.to_string(),
                first: first.clone(),
                second: second.clone(),
            }),
            None => Err(RegistryError::NotFound {
                kind: self.kind,
                id: id.to_string(),
            }),
        }
    }

    pub(crate) fn contains(&self, id: &str) -> bool {
        self.get(id).is_ok()
    }

    pub(crate) fn ids(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }
}

///
/// CatalogSettings
///

#[derive(Clone, Copy, Debug, Default)]
pub struct CatalogSettings {
    pub lazy_loading_enabled: bool,
    pub default_fetch_size: Option<u32>,
    pub default_statement_timeout: Option<u32>,
}

///
/// Catalog
///
/// Process-wide compiled registry: single writer while units load, then
/// read-only and shared across query-executing threads. The three pending
/// collections belong to the deferred-resolution coordinator and drain to
/// empty (or to a terminal aggregate error) before a build finishes.
///

#[derive(Debug)]
pub struct Catalog {
    types: TypeRegistry,
    converters: ConverterRegistry,
    statements: Registry<Arc<Statement>>,
    result_maps: Registry<Arc<ResultMap>>,
    param_maps: Registry<Arc<ParamMap>>,
    caches: Registry<SharedCache>,
    cache_refs: HashMap<String, String>,
    loaded_units: HashSet<String>,
    settings: CatalogSettings,

    pending_cache_refs: Vec<CacheRefResolver>,
    pending_result_maps: Vec<ResultMapResolver>,
    pending_statements: Vec<PendingStatement>,
}

impl Default for Catalog {
    fn default() -> Self {
        Self::new()
    }
}

impl Catalog {
    #[must_use]
    pub fn new() -> Self {
        Self {
            types: TypeRegistry::new(),
            converters: ConverterRegistry::new(),
            statements: Registry::new(RegistryKind::Statement),
            result_maps: Registry::new(RegistryKind::ResultMap),
            param_maps: Registry::new(RegistryKind::ParamMap),
            caches: Registry::new(RegistryKind::Cache),
            cache_refs: HashMap::new(),
            loaded_units: HashSet::new(),
            settings: CatalogSettings::default(),
            pending_cache_refs: Vec::new(),
            pending_result_maps: Vec::new(),
            pending_statements: Vec::new(),
        }
    }

    // ---------------------------------------------------------------------
    // Registries
    // ---------------------------------------------------------------------

    #[must_use]
    pub const fn types(&self) -> &TypeRegistry {
        &self.types
    }

    pub const fn types_mut(&mut self) -> &mut TypeRegistry {
        &mut self.types
    }

    #[must_use]
    pub const fn converters(&self) -> &ConverterRegistry {
        &self.converters
    }

    pub const fn converters_mut(&mut self) -> &mut ConverterRegistry {
        &mut self.converters
    }

    #[must_use]
    pub const fn settings(&self) -> &CatalogSettings {
        &self.settings
    }

    pub const fn settings_mut(&mut self) -> &mut CatalogSettings {
        &mut self.settings
    }

    // ---------------------------------------------------------------------
    // Compiled artifacts
    // ---------------------------------------------------------------------

    pub(crate) fn add_statement(&mut self, statement: Arc<Statement>) -> Result<(), RegistryError> {
        let id = statement.id().to_string();
        self.statements.insert(&id, statement)
    }

    pub fn statement(&self, id: &str) -> Result<Arc<Statement>, RegistryError> {
        self.statements.get(id)
    }

    #[must_use]
    pub fn has_statement(&self, id: &str) -> bool {
        self.statements.contains(id)
    }

    pub fn statement_ids(&self) -> impl Iterator<Item = &str> {
        self.statements.ids()
    }

    #[must_use]
    pub fn statement_count(&self) -> usize {
        self.statements.len()
    }

    pub(crate) fn add_result_map(&mut self, map: Arc<ResultMap>) -> Result<(), RegistryError> {
        let id = map.id().to_string();
        self.result_maps.insert(&id, map)
    }

    pub fn result_map(&self, id: &str) -> Result<Arc<ResultMap>, RegistryError> {
        self.result_maps.get(id)
    }

    #[must_use]
    pub fn has_result_map(&self, id: &str) -> bool {
        self.result_maps.contains(id)
    }

    pub(crate) fn add_param_map(&mut self, map: Arc<ParamMap>) -> Result<(), RegistryError> {
        let id = map.id().to_string();
        self.param_maps.insert(&id, map)
    }

    pub fn param_map(&self, id: &str) -> Result<Arc<ParamMap>, RegistryError> {
        self.param_maps.get(id)
    }

    // ---------------------------------------------------------------------
    // Caches
    // ---------------------------------------------------------------------

    pub(crate) fn add_cache(&mut self, cache: SharedCache) -> Result<(), RegistryError> {
        let id = cache.read().expect("cache lock poisoned").id().to_string();
        self.caches.insert(&id, cache)
    }

    pub fn cache(&self, id: &str) -> Result<SharedCache, RegistryError> {
        self.caches.get(id)
    }

    #[must_use]
    pub fn has_cache(&self, id: &str) -> bool {
        self.caches.contains(id)
    }

    pub(crate) fn add_cache_ref(&mut self, namespace: &str, referenced: &str) {
        self.cache_refs
            .insert(namespace.to_string(), referenced.to_string());
    }

    #[must_use]
    pub fn cache_ref(&self, namespace: &str) -> Option<&str> {
        self.cache_refs.get(namespace).map(String::as_str)
    }

    // ---------------------------------------------------------------------
    // Load bookkeeping
    // ---------------------------------------------------------------------

    #[must_use]
    pub fn is_unit_loaded(&self, namespace: &str) -> bool {
        self.loaded_units.contains(namespace)
    }

    pub(crate) fn mark_unit_loaded(&mut self, namespace: &str) {
        self.loaded_units.insert(namespace.to_string());
    }

    pub(crate) fn pend_cache_ref(&mut self, item: CacheRefResolver) {
        self.pending_cache_refs.push(item);
    }

    pub(crate) fn take_pending_cache_refs(&mut self) -> Vec<CacheRefResolver> {
        std::mem::take(&mut self.pending_cache_refs)
    }

    pub(crate) fn pend_result_map(&mut self, item: ResultMapResolver) {
        self.pending_result_maps.push(item);
    }

    pub(crate) fn take_pending_result_maps(&mut self) -> Vec<ResultMapResolver> {
        std::mem::take(&mut self.pending_result_maps)
    }

    pub(crate) fn pend_statement(&mut self, item: PendingStatement) {
        self.pending_statements.push(item);
    }

    pub(crate) fn take_pending_statements(&mut self) -> Vec<PendingStatement> {
        std::mem::take(&mut self.pending_statements)
    }

    #[must_use]
    pub fn pending_count(&self) -> usize {
        self.pending_cache_refs.len()
            + self.pending_result_maps.len()
            + self.pending_statements.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strict_registry_rejects_duplicates() {
        let mut registry: Registry<u32> = Registry::new(RegistryKind::Statement);
        registry.insert("app.users.findAll", 1).unwrap();

        let err = registry.insert("app.users.findAll", 2).unwrap_err();
        assert!(matches!(err, RegistryError::Duplicate { .. }));
    }

    #[test]
    fn unique_short_names_resolve_and_clashes_refuse_to_guess() {
        let mut registry: Registry<u32> = Registry::new(RegistryKind::ResultMap);
        registry.insert("app.users.userMap", 1).unwrap();

        assert_eq!(registry.get("userMap").unwrap(), 1);

        registry.insert("app.admin.userMap", 2).unwrap();
        let err = registry.get("userMap").unwrap_err();
        assert!(matches!(err, RegistryError::Ambiguous { .. }));

        // fully qualified lookups still work
        assert_eq!(registry.get("app.admin.userMap").unwrap(), 2);
    }

    #[test]
    fn missing_ids_report_not_found() {
        let registry: Registry<u32> = Registry::new(RegistryKind::Cache);
        assert!(matches!(
            registry.get("app.ghost"),
            Err(RegistryError::NotFound { .. })
        ));
    }
}
