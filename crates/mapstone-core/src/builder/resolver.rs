use crate::{
    builder::BuilderAssistant,
    cache::SharedCache,
    catalog::Catalog,
    error::LoadError,
    mapping::{Discriminator, ResultBinding, ResultMap, Statement},
    types::LogicalType,
};
use mapstone_schema::node::StatementDescriptor;
use std::sync::Arc;

///
/// CacheRefResolver
///
/// Pending adoption of another namespace's cache; retried after each unit
/// until the referenced namespace has loaded its cache.
///

#[derive(Clone, Debug)]
pub struct CacheRefResolver {
    pub namespace: String,
    pub referenced: String,
}

impl CacheRefResolver {
    #[must_use]
    pub fn new(namespace: impl Into<String>, referenced: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            referenced: referenced.into(),
        }
    }

    pub fn resolve(&self, catalog: &mut Catalog) -> Result<SharedCache, LoadError> {
        BuilderAssistant::new(&self.namespace).use_cache_ref(catalog, &self.referenced)
    }
}

///
/// ResultMapResolver
///
/// A fully prepared result map waiting on its `extends` parent. Bindings
/// (including nested inline maps, which were registered eagerly) are kept
/// as built; only the merge and registration re-run on retry.
///

#[derive(Clone, Debug)]
pub struct ResultMapResolver {
    pub namespace: String,
    pub id: String,
    pub target: LogicalType,
    pub extends: Option<String>,
    pub discriminator: Option<Discriminator>,
    pub bindings: Vec<ResultBinding>,
    pub auto_mapping: Option<bool>,
}

impl ResultMapResolver {
    pub fn resolve(&self, catalog: &mut Catalog) -> Result<Arc<ResultMap>, LoadError> {
        BuilderAssistant::new(&self.namespace).add_result_map(
            catalog,
            &self.id,
            self.target.clone(),
            self.extends.as_deref(),
            self.discriminator.clone(),
            self.bindings.clone(),
            self.auto_mapping,
        )
    }
}

///
/// PendingStatement
///
/// A statement declaration whose dependencies (cache ref, parameter map,
/// result map) were not loaded yet; the descriptor replays in full on
/// retry since nothing was registered before the incomplete signal.
///

#[derive(Clone, Debug)]
pub struct PendingStatement {
    pub namespace: String,
    pub descriptor: StatementDescriptor,
}

impl PendingStatement {
    pub fn resolve(&self, catalog: &mut Catalog) -> Result<Arc<Statement>, LoadError> {
        BuilderAssistant::new(&self.namespace).add_statement(catalog, &self.descriptor)
    }
}
