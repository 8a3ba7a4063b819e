use crate::{
    cache::SharedCache,
    mapping::{BoundSql, ParamMap, ResultMap, SqlSource},
    value::Value,
};
use mapstone_schema::types::CommandKind;
use std::sync::Arc;

///
/// Statement
///
/// One fully compiled executable statement. Immutable once built; owned by
/// the catalog and shared by reference with every executing thread.
///

#[derive(Clone, Debug)]
pub struct Statement {
    id: String,
    kind: CommandKind,
    sql_source: SqlSource,
    param_map: Arc<ParamMap>,
    result_maps: Vec<Arc<ResultMap>>,
    cache: Option<SharedCache>,
    flush_cache: bool,
    use_cache: bool,
    fetch_size: Option<u32>,
    timeout: Option<u32>,
    result_ordered: bool,
}

impl Statement {
    #[must_use]
    pub fn builder(
        id: impl Into<String>,
        kind: CommandKind,
        sql_source: SqlSource,
        param_map: Arc<ParamMap>,
    ) -> StatementBuilder {
        let is_select = kind.is_select();

        StatementBuilder {
            statement: Self {
                id: id.into(),
                kind,
                sql_source,
                param_map,
                result_maps: Vec::new(),
                cache: None,
                // reads default to cached, writes to flushing
                flush_cache: !is_select,
                use_cache: is_select,
                fetch_size: None,
                timeout: None,
                result_ordered: false,
            },
        }
    }

    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    #[must_use]
    pub const fn kind(&self) -> CommandKind {
        self.kind
    }

    #[must_use]
    pub const fn sql_source(&self) -> &SqlSource {
        &self.sql_source
    }

    #[must_use]
    pub fn param_map(&self) -> &Arc<ParamMap> {
        &self.param_map
    }

    #[must_use]
    pub fn result_maps(&self) -> &[Arc<ResultMap>] {
        &self.result_maps
    }

    #[must_use]
    pub const fn cache(&self) -> Option<&SharedCache> {
        self.cache.as_ref()
    }

    #[must_use]
    pub const fn flush_cache(&self) -> bool {
        self.flush_cache
    }

    #[must_use]
    pub const fn use_cache(&self) -> bool {
        self.use_cache
    }

    #[must_use]
    pub const fn fetch_size(&self) -> Option<u32> {
        self.fetch_size
    }

    #[must_use]
    pub const fn timeout(&self) -> Option<u32> {
        self.timeout
    }

    #[must_use]
    pub const fn result_ordered(&self) -> bool {
        self.result_ordered
    }

    /// Resolve the final SQL text and ordered parameter bindings for one
    /// execution. With no inline expressions compiled, the statement's
    /// explicit parameter map supplies the bindings.
    #[must_use]
    pub fn bound_sql(&self, parameter: Option<Value>) -> BoundSql {
        let mut bindings = self.sql_source.bindings().to_vec();
        if bindings.is_empty() && !self.param_map.bindings().is_empty() {
            bindings = self.param_map.bindings().to_vec();
        }

        BoundSql::new(self.sql_source.sql(), bindings, parameter)
    }
}

///
/// StatementBuilder
///

#[derive(Debug)]
pub struct StatementBuilder {
    statement: Statement,
}

impl StatementBuilder {
    #[must_use]
    pub fn result_maps(mut self, result_maps: Vec<Arc<ResultMap>>) -> Self {
        self.statement.result_maps = result_maps;
        self
    }

    #[must_use]
    pub fn cache(mut self, cache: Option<SharedCache>) -> Self {
        self.statement.cache = cache;
        self
    }

    #[must_use]
    pub const fn flush_cache(mut self, flush_cache: Option<bool>) -> Self {
        if let Some(flush_cache) = flush_cache {
            self.statement.flush_cache = flush_cache;
        }
        self
    }

    #[must_use]
    pub const fn use_cache(mut self, use_cache: Option<bool>) -> Self {
        if let Some(use_cache) = use_cache {
            self.statement.use_cache = use_cache;
        }
        self
    }

    #[must_use]
    pub const fn fetch_size(mut self, fetch_size: Option<u32>) -> Self {
        self.statement.fetch_size = fetch_size;
        self
    }

    #[must_use]
    pub const fn timeout(mut self, timeout: Option<u32>) -> Self {
        self.statement.timeout = timeout;
        self
    }

    #[must_use]
    pub const fn result_ordered(mut self, result_ordered: bool) -> Self {
        self.statement.result_ordered = result_ordered;
        self
    }

    #[must_use]
    pub fn build(self) -> Statement {
        self.statement
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::LogicalType;

    fn empty_param_map() -> Arc<ParamMap> {
        Arc::new(ParamMap::new("test-Inline", LogicalType::Unknown, Vec::new()))
    }

    #[test]
    fn cache_flags_default_by_command_kind() {
        let select = Statement::builder(
            "app.users.findAll",
            CommandKind::Select,
            SqlSource::new("SELECT 1", Vec::new()),
            empty_param_map(),
        )
        .build();
        assert!(select.use_cache());
        assert!(!select.flush_cache());

        let update = Statement::builder(
            "app.users.touch",
            CommandKind::Update,
            SqlSource::new("UPDATE users SET t = 1", Vec::new()),
            empty_param_map(),
        )
        .build();
        assert!(!update.use_cache());
        assert!(update.flush_cache());
    }

    #[test]
    fn explicit_flags_override_the_defaults() {
        let statement = Statement::builder(
            "app.users.findAll",
            CommandKind::Select,
            SqlSource::new("SELECT 1", Vec::new()),
            empty_param_map(),
        )
        .flush_cache(Some(true))
        .use_cache(Some(false))
        .build();

        assert!(statement.flush_cache());
        assert!(!statement.use_cache());
    }
}
