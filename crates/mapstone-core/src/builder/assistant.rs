use crate::{
    builder::expr::InlineExpression,
    cache::{CacheBuilder, SharedCache},
    catalog::Catalog,
    convert::Converter,
    error::{BuilderError, Incomplete, LoadError, PendingKind},
    mapping::{
        BindingFlags, Discriminator, ParamBinding, ParamMap, ResultBinding, ResultMap, SqlSource,
        Statement,
    },
    obs::{self, BuildEvent},
    types::{LogicalType, PropertyPath, StorageType, TypeError},
};
use mapstone_schema::{
    NAMESPACE_SEPARATOR,
    node::{CacheDescriptor, ParamDescriptor, ParamMapDescriptor, StatementDescriptor},
    types::ParamMode,
};
use std::{collections::BTreeMap, sync::Arc};

///
/// FieldSpec
///
/// Assistant-level input for one result field binding, shared by plain
/// fields, constructor arguments, nested children, and the discriminator
/// control binding.
///

#[derive(Clone, Debug, Default)]
pub struct FieldSpec {
    pub property: Option<String>,
    pub column: Option<String>,
    pub logical_type: Option<String>,
    pub storage_type: Option<String>,
    pub converter: Option<String>,
    pub nested_result_map: Option<String>,
    pub nested_query: Option<String>,
    pub flags: BindingFlags,
    pub lazy: Option<bool>,
}

///
/// BuilderAssistant
///
/// Namespace-scoped build services: id qualification, type/converter
/// resolution, and assembly of bindings, result maps, caches, and
/// statements into the catalog. Stateless beyond the namespace so deferred
/// retries can recreate one cheaply.
///

#[derive(Clone, Debug)]
pub struct BuilderAssistant {
    namespace: String,
}

impl BuilderAssistant {
    #[must_use]
    pub fn new(namespace: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
        }
    }

    #[must_use]
    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    /// Qualify an id with the current namespace. References pass through
    /// when already qualified; declarations must be simple names.
    pub fn qualify(&self, base: &str, is_reference: bool) -> Result<String, BuilderError> {
        if is_reference {
            if base.contains(NAMESPACE_SEPARATOR) {
                return Ok(base.to_string());
            }
        } else {
            let own_prefix = format!("{}{}", self.namespace, NAMESPACE_SEPARATOR);
            if base.starts_with(&own_prefix) {
                return Ok(base.to_string());
            }
            if base.contains(NAMESPACE_SEPARATOR) {
                return Err(BuilderError::DottedSimpleId {
                    id: base.to_string(),
                });
            }
        }

        Ok(format!("{}{}{base}", self.namespace, NAMESPACE_SEPARATOR))
    }

    // ---------------------------------------------------------------------
    // Caches
    // ---------------------------------------------------------------------

    /// The shared cache serving this namespace: the referenced namespace's
    /// cache when a cache-ref is declared, else the namespace's own.
    /// A declared-but-unresolved cache-ref is an incomplete signal.
    pub fn namespace_cache(&self, catalog: &Catalog) -> Result<Option<SharedCache>, Incomplete> {
        if let Some(referenced) = catalog.cache_ref(&self.namespace) {
            return catalog
                .cache(referenced)
                .map(Some)
                .map_err(|_| Incomplete::new(PendingKind::CacheRef, referenced));
        }

        Ok(catalog.cache(&self.namespace).ok())
    }

    /// Construct this namespace's own cache from its descriptor.
    pub fn use_new_cache(
        &self,
        catalog: &mut Catalog,
        descriptor: &CacheDescriptor,
    ) -> Result<SharedCache, BuilderError> {
        let cache = CacheBuilder::from_descriptor(&self.namespace, descriptor).build();
        catalog.add_cache(SharedCache::clone(&cache))?;
        obs::sink::emit(&BuildEvent::CacheBuilt {
            id: self.namespace.clone(),
        });

        Ok(cache)
    }

    /// Adopt another namespace's cache. Unresolved targets signal
    /// incomplete rather than failing the load.
    pub fn use_cache_ref(
        &self,
        catalog: &mut Catalog,
        referenced: &str,
    ) -> Result<SharedCache, LoadError> {
        catalog.add_cache_ref(&self.namespace, referenced);
        let cache = catalog
            .cache(referenced)
            .map_err(|_| Incomplete::new(PendingKind::CacheRef, referenced))?;

        Ok(cache)
    }

    // ---------------------------------------------------------------------
    // Bindings
    // ---------------------------------------------------------------------

    pub fn build_param_binding(
        &self,
        catalog: &Catalog,
        param_type: &LogicalType,
        descriptor: &ParamDescriptor,
    ) -> Result<ParamBinding, BuilderError> {
        let storage = parse_storage(descriptor.storage_type.as_deref())?;
        let logical = match &descriptor.logical_type {
            Some(name) => catalog.types().resolve_required(name)?,
            None => infer_param_type(catalog, param_type, &descriptor.property, storage),
        };
        let converter =
            resolve_converter(catalog, descriptor.converter.as_deref(), &logical, storage)?;

        Ok(ParamBinding::new(&descriptor.property, logical, converter)
            .mode(descriptor.mode)
            .storage_type(storage)
            .numeric_scale(descriptor.numeric_scale))
    }

    pub fn build_result_binding(
        &self,
        catalog: &Catalog,
        result_type: &LogicalType,
        spec: FieldSpec,
    ) -> Result<ResultBinding, BuilderError> {
        let storage = parse_storage(spec.storage_type.as_deref())?;
        let logical = match &spec.logical_type {
            Some(name) => catalog.types().resolve_required(name)?,
            None => spec
                .property
                .as_deref()
                .and_then(|property| {
                    catalog
                        .types()
                        .property_type(result_type, &PropertyPath::parse(property))
                })
                .unwrap_or(LogicalType::Unknown),
        };
        let converter = resolve_converter(catalog, spec.converter.as_deref(), &logical, storage)?;

        let (column, composites) = match &spec.column {
            Some(raw) if raw.contains('=') || raw.contains(',') => {
                (None, parse_composite_column(catalog, raw)?)
            }
            other => (other.clone(), Vec::new()),
        };

        let nested_result_map = spec
            .nested_result_map
            .map(|id| self.qualify(&id, true))
            .transpose()?;
        let nested_query = spec
            .nested_query
            .map(|id| self.qualify(&id, true))
            .transpose()?;

        Ok(ResultBinding::builder(spec.property, logical, converter)
            .column(column)
            .storage_type(storage)
            .nested_result_map(nested_result_map)
            .nested_query(nested_query)
            .composites(composites)
            .flags(spec.flags)
            .lazy(spec
                .lazy
                .unwrap_or(catalog.settings().lazy_loading_enabled))
            .build())
    }

    pub fn build_discriminator(
        &self,
        catalog: &Catalog,
        result_type: &LogicalType,
        control: FieldSpec,
        cases: BTreeMap<String, String>,
    ) -> Result<Discriminator, BuilderError> {
        let binding = self.build_result_binding(catalog, result_type, control)?;

        let mut qualified = BTreeMap::new();
        for (value, result_map) in cases {
            qualified.insert(value, self.qualify(&result_map, true)?);
        }

        Ok(Discriminator::new(binding, qualified))
    }

    // ---------------------------------------------------------------------
    // Maps and statements
    // ---------------------------------------------------------------------

    pub fn add_param_map(
        &self,
        catalog: &mut Catalog,
        descriptor: &ParamMapDescriptor,
    ) -> Result<Arc<ParamMap>, BuilderError> {
        let id = self.qualify(&descriptor.id, false)?;
        let target = catalog.types().resolve_required(&descriptor.type_name)?;

        let mut bindings = Vec::with_capacity(descriptor.params.len());
        for param in &descriptor.params {
            bindings.push(self.build_param_binding(catalog, &target, param)?);
        }

        let map = Arc::new(ParamMap::new(id, target, bindings));
        catalog.add_param_map(Arc::clone(&map))?;

        Ok(map)
    }

    /// Merge inherited bindings, build, and register one result map.
    /// A declared constructor fully replaces the inherited one; other
    /// inherited bindings merge with duplicates (by property and column)
    /// removed.
    #[allow(clippy::too_many_arguments)]
    pub fn add_result_map(
        &self,
        catalog: &mut Catalog,
        id: &str,
        target: LogicalType,
        extends: Option<&str>,
        discriminator: Option<Discriminator>,
        bindings: Vec<ResultBinding>,
        auto_mapping: Option<bool>,
    ) -> Result<Arc<ResultMap>, LoadError> {
        let id = self.qualify(id, false)?;
        let extends = extends.map(|e| self.qualify(e, true)).transpose()?;

        let mut all = bindings;
        if let Some(parent_id) = extends {
            if !catalog.has_result_map(&parent_id) {
                return Err(Incomplete::new(PendingKind::ResultMap, parent_id).into());
            }
            let parent = catalog.result_map(&parent_id).map_err(BuilderError::from)?;

            let mut inherited: Vec<ResultBinding> = parent.bindings().to_vec();
            inherited.retain(|binding| !all.contains(binding));
            if all.iter().any(|binding| binding.flags().constructor) {
                inherited.retain(|binding| !binding.flags().constructor);
            }
            all.extend(inherited);
        }

        let map = Arc::new(
            ResultMap::builder(id, target)
                .bindings(all)
                .discriminator(discriminator)
                .auto_mapping(auto_mapping)
                .build(catalog.types())?,
        );
        catalog
            .add_result_map(Arc::clone(&map))
            .map_err(BuilderError::from)?;

        Ok(map)
    }

    /// Assemble and register one statement. Requires the namespace's
    /// cache-ref (if any) to be resolved first.
    pub fn add_statement(
        &self,
        catalog: &mut Catalog,
        descriptor: &StatementDescriptor,
    ) -> Result<Arc<Statement>, LoadError> {
        let cache = self.namespace_cache(catalog)?;
        let id = self.qualify(&descriptor.id, false)?;

        let param_type = match &descriptor.parameter_type {
            Some(name) => catalog
                .types()
                .resolve_required(name)
                .map_err(BuilderError::from)?,
            None => LogicalType::Unknown,
        };

        let sql_source = self.compile_sql_source(catalog, &descriptor.sql, &param_type)?;
        let param_map = self.statement_param_map(catalog, descriptor, &id, param_type)?;
        let result_maps = self.statement_result_maps(catalog, descriptor, &id)?;

        let settings = *catalog.settings();
        let statement = Arc::new(
            Statement::builder(id, descriptor.kind, sql_source, param_map)
                .result_maps(result_maps)
                .cache(cache)
                .flush_cache(descriptor.flush_cache)
                .use_cache(descriptor.use_cache)
                .fetch_size(descriptor.fetch_size.or(settings.default_fetch_size))
                .timeout(descriptor.timeout.or(settings.default_statement_timeout))
                .result_ordered(descriptor.result_ordered)
                .build(),
        );
        catalog
            .add_statement(Arc::clone(&statement))
            .map_err(BuilderError::from)?;

        Ok(statement)
    }

    fn statement_param_map(
        &self,
        catalog: &Catalog,
        descriptor: &StatementDescriptor,
        statement_id: &str,
        param_type: LogicalType,
    ) -> Result<Arc<ParamMap>, LoadError> {
        if let Some(reference) = &descriptor.parameter_map {
            let qualified = self.qualify(reference, true)?;
            return catalog
                .param_map(&qualified)
                .map_err(|_| Incomplete::new(PendingKind::ParamMap, qualified).into());
        }

        Ok(Arc::new(ParamMap::new(
            format!("{statement_id}-Inline"),
            param_type,
            Vec::new(),
        )))
    }

    fn statement_result_maps(
        &self,
        catalog: &Catalog,
        descriptor: &StatementDescriptor,
        statement_id: &str,
    ) -> Result<Vec<Arc<ResultMap>>, LoadError> {
        let references: Vec<&str> = descriptor.result_map_refs().collect();
        if !references.is_empty() {
            let mut maps = Vec::with_capacity(references.len());
            for reference in references {
                let qualified = self.qualify(reference, true)?;
                let map = catalog
                    .result_map(&qualified)
                    .map_err(|_| Incomplete::new(PendingKind::ResultMap, qualified.clone()))?;
                maps.push(map);
            }
            return Ok(maps);
        }

        if let Some(result_type) = &descriptor.result_type {
            let target = catalog
                .types()
                .resolve_required(result_type)
                .map_err(BuilderError::from)?;
            let inline = ResultMap::builder(format!("{statement_id}-Inline"), target)
                .build(catalog.types())
                .map_err(LoadError::Builder)?;
            return Ok(vec![Arc::new(inline)]);
        }

        Ok(Vec::new())
    }

    // ---------------------------------------------------------------------
    // SQL template compilation
    // ---------------------------------------------------------------------

    /// Scan `#{...}` spans, compile one parameter binding per span in
    /// encounter order, and replace each span with a `?` slot.
    pub fn compile_sql_source(
        &self,
        catalog: &Catalog,
        sql: &str,
        param_type: &LogicalType,
    ) -> Result<SqlSource, BuilderError> {
        let mut out = String::with_capacity(sql.len());
        let mut bindings = Vec::new();

        let mut rest = sql;
        while let Some(open) = rest.find("#{") {
            out.push_str(&rest[..open]);
            let after = &rest[open + 2..];
            let Some(close) = after.find('}') else {
                return Err(BuilderError::UnclosedPlaceholder {
                    position: sql.len() - rest.len() + open,
                });
            };
            bindings.push(self.inline_param_binding(catalog, &after[..close], param_type)?);
            out.push('?');
            rest = &after[close + 1..];
        }
        out.push_str(rest);

        Ok(SqlSource::new(out, bindings))
    }

    fn inline_param_binding(
        &self,
        catalog: &Catalog,
        content: &str,
        param_type: &LogicalType,
    ) -> Result<ParamBinding, BuilderError> {
        let parsed = InlineExpression::parse(content)?;
        if let Some(expression) = parsed.expression() {
            return Err(BuilderError::ExpressionParam {
                expression: expression.to_string(),
            });
        }
        let Some(property) = parsed.property() else {
            return Err(BuilderError::Expr(crate::builder::ExprError {
                expression: content.to_string(),
                position: 0,
            }));
        };

        let storage = parse_storage(parsed.storage_type())?;
        let mut mode = ParamMode::In;
        let mut logical_override = None;
        let mut numeric_scale = None;
        let mut converter_name = None;

        for (name, value) in parsed.options() {
            match name {
                "mode" => {
                    mode = value
                        .parse::<ParamMode>()
                        .map_err(|_| invalid_option(name, value))?;
                }
                "logical_type" => {
                    logical_override = Some(catalog.types().resolve_required(value)?);
                }
                "numeric_scale" => {
                    numeric_scale = Some(
                        value
                            .parse::<u32>()
                            .map_err(|_| invalid_option(name, value))?,
                    );
                }
                "converter" => converter_name = Some(value),
                _ => return Err(invalid_option(name, value)),
            }
        }

        let logical = logical_override
            .unwrap_or_else(|| infer_param_type(catalog, param_type, property, storage));
        let converter = resolve_converter(catalog, converter_name, &logical, storage)?;

        Ok(ParamBinding::new(property, logical, converter)
            .mode(mode)
            .storage_type(storage)
            .numeric_scale(numeric_scale))
    }
}

// ---------------------------------------------------------------------
// Shared resolution helpers
// ---------------------------------------------------------------------

fn invalid_option(name: &str, value: &str) -> BuilderError {
    BuilderError::InvalidOption {
        name: name.to_string(),
        value: value.to_string(),
    }
}

pub(crate) fn parse_storage(name: Option<&str>) -> Result<Option<StorageType>, BuilderError> {
    name.map(|name| {
        name.parse::<StorageType>()
            .map_err(|_| TypeError::UnknownStorageType {
                name: name.to_string(),
            })
    })
    .transpose()
    .map_err(Into::into)
}

// Explicit type wins (handled by callers); otherwise cursor parameters and
// untyped parameter objects stay unknown, and declared types infer through
// their property table.
fn infer_param_type(
    catalog: &Catalog,
    param_type: &LogicalType,
    property: &str,
    storage: Option<StorageType>,
) -> LogicalType {
    if storage == Some(StorageType::Cursor) {
        return LogicalType::Unknown;
    }
    if !param_type.is_named() {
        return LogicalType::Unknown;
    }

    catalog
        .types()
        .property_type(param_type, &PropertyPath::parse(property))
        .unwrap_or(LogicalType::Unknown)
}

fn resolve_converter(
    catalog: &Catalog,
    name: Option<&str>,
    logical: &LogicalType,
    storage: Option<StorageType>,
) -> Result<Arc<dyn Converter>, BuilderError> {
    if let Some(name) = name {
        return catalog
            .converters()
            .instance(name, Some(logical), catalog.types())
            .map_err(Into::into);
    }

    Ok(catalog
        .converters()
        .lookup(catalog.types(), logical, storage)
        .unwrap_or_else(|| catalog.converters().untyped()))
}

// Composite column spec `{col1=propA, col2=propB}` (braces optional) into
// sub-bindings carrying the untyped converter.
fn parse_composite_column(
    catalog: &Catalog,
    raw: &str,
) -> Result<Vec<ResultBinding>, BuilderError> {
    let tokens: Vec<&str> = raw
        .split(['{', '}', '=', ',', ' '])
        .filter(|token| !token.is_empty())
        .collect();
    if tokens.is_empty() || tokens.len() % 2 != 0 {
        return Err(BuilderError::CompositeColumn {
            column: raw.to_string(),
        });
    }

    Ok(tokens
        .chunks_exact(2)
        .map(|pair| {
            ResultBinding::builder(
                Some(pair[0].to_string()),
                LogicalType::Unknown,
                catalog.converters().untyped(),
            )
            .column(Some(pair[1].to_string()))
            .build()
        })
        .collect())
}
