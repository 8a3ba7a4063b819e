use crate::{
    builder::{
        BuilderAssistant, CacheRefResolver, FieldSpec, PendingStatement, ResultMapResolver,
        assistant::parse_storage,
    },
    catalog::Catalog,
    error::{BuilderError, LoadError, PendingKind, UnresolvedReport},
    mapping::{BindingFlags, Discriminator, ResultBinding, ResultMap},
    obs::{self, BuildEvent},
    types::LogicalType,
};
use mapstone_schema::{
    node::{
        BindingDescriptor, ConverterDescriptor, DiscriminatorDescriptor, FieldDescriptor,
        NestedDescriptor, ResultMapDescriptor, UnitDescriptor,
    },
    validate::ValidateNode,
};
use std::{collections::BTreeMap, sync::Arc};

///
/// UnitLoader
///
/// The deferred-resolution coordinator. Units load one at a time in any
/// order; declarations whose dependencies are missing park in the
/// catalog's pending collections and are retried after every unit.
/// `finish` drives the pending work to a fixed point and turns anything
/// still parked into one aggregate error.
///

#[derive(Debug, Default)]
pub struct UnitLoader {
    catalog: Catalog,
}

impl UnitLoader {
    #[must_use]
    pub fn new() -> Self {
        Self {
            catalog: Catalog::new(),
        }
    }

    /// Start from a pre-populated catalog (declared types, extra
    /// converters, settings).
    #[must_use]
    pub const fn with_catalog(catalog: Catalog) -> Self {
        Self { catalog }
    }

    #[must_use]
    pub const fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub const fn catalog_mut(&mut self) -> &mut Catalog {
        &mut self.catalog
    }

    /// Load one unit, then retry everything pending once.
    pub fn load(&mut self, unit: &UnitDescriptor) -> Result<(), BuilderError> {
        unit.validate().map_err(BuilderError::Descriptor)?;

        if !self.catalog.is_unit_loaded(&unit.namespace) {
            self.process_unit(unit)?;
            self.catalog.mark_unit_loaded(&unit.namespace);
            obs::sink::emit(&BuildEvent::UnitLoaded {
                namespace: unit.namespace.clone(),
                statements: unit.statements.len(),
                result_maps: unit.result_maps.len(),
            });
        }

        self.retry_pending()
    }

    /// Load a unit that must declare the expected namespace.
    pub fn load_expecting(
        &mut self,
        namespace: &str,
        unit: &UnitDescriptor,
    ) -> Result<(), BuilderError> {
        if unit.namespace != namespace {
            return Err(BuilderError::NamespaceMismatch {
                expected: namespace.to_string(),
                found: unit.namespace.clone(),
            });
        }

        self.load(unit)
    }

    /// Drive pending work to a fixed point; anything still unresolved is a
    /// terminal failure enumerating every broken reference at once.
    pub fn finish(mut self) -> Result<Catalog, BuilderError> {
        loop {
            let before = self.catalog.pending_count();
            self.retry_pending()?;
            if self.catalog.pending_count() == before {
                break;
            }
        }

        let mut report = UnresolvedReport::default();

        for item in self.catalog.take_pending_cache_refs() {
            match item.resolve(&mut self.catalog) {
                Ok(_) => {}
                Err(LoadError::Incomplete(signal)) => {
                    report.push(PendingKind::CacheRef, &item.namespace, signal.reference);
                }
                Err(LoadError::Builder(err)) => return Err(err),
            }
        }
        for item in self.catalog.take_pending_result_maps() {
            match item.resolve(&mut self.catalog) {
                Ok(_) => {}
                Err(LoadError::Incomplete(signal)) => {
                    let id = format!("{}.{}", item.namespace, item.id);
                    report.push(PendingKind::ResultMap, id, signal.reference);
                }
                Err(LoadError::Builder(err)) => return Err(err),
            }
        }
        for item in self.catalog.take_pending_statements() {
            match item.resolve(&mut self.catalog) {
                Ok(_) => {}
                Err(LoadError::Incomplete(signal)) => {
                    let id = format!("{}.{}", item.namespace, item.descriptor.id);
                    report.push(PendingKind::Statement, id, signal.reference);
                }
                Err(LoadError::Builder(err)) => return Err(err),
            }
        }

        if report.is_empty() {
            Ok(self.catalog)
        } else {
            Err(BuilderError::Unresolved(report))
        }
    }

    // ---------------------------------------------------------------------
    // Unit processing, declarations in encounter order
    // ---------------------------------------------------------------------

    fn process_unit(&mut self, unit: &UnitDescriptor) -> Result<(), BuilderError> {
        let assistant = BuilderAssistant::new(&unit.namespace);

        if let Some(referenced) = &unit.cache_ref {
            match assistant.use_cache_ref(&mut self.catalog, referenced) {
                Ok(_) => {}
                Err(LoadError::Incomplete(_)) => self
                    .catalog
                    .pend_cache_ref(CacheRefResolver::new(&unit.namespace, referenced)),
                Err(LoadError::Builder(err)) => return Err(err),
            }
        }

        if let Some(cache) = &unit.cache {
            assistant.use_new_cache(&mut self.catalog, cache)?;
        }

        for converter in &unit.converters {
            self.register_converter(converter)?;
        }

        for param_map in &unit.param_maps {
            assistant.add_param_map(&mut self.catalog, param_map)?;
        }

        for result_map in &unit.result_maps {
            match self.build_result_map(&assistant, result_map) {
                Ok(_) | Err(LoadError::Incomplete(_)) => {}
                Err(LoadError::Builder(err)) => return Err(err),
            }
        }

        for statement in &unit.statements {
            match assistant.add_statement(&mut self.catalog, statement) {
                Ok(_) => {}
                Err(LoadError::Incomplete(_)) => self.catalog.pend_statement(PendingStatement {
                    namespace: unit.namespace.clone(),
                    descriptor: statement.clone(),
                }),
                Err(LoadError::Builder(err)) => return Err(err),
            }
        }

        Ok(())
    }

    fn register_converter(&mut self, descriptor: &ConverterDescriptor) -> Result<(), BuilderError> {
        let logical = descriptor
            .logical_type
            .as_deref()
            .map(|name| self.catalog.types().resolve_required(name))
            .transpose()?;
        let storage = parse_storage(descriptor.storage_type.as_deref())?;

        let instance = self.catalog.converters().instance(
            &descriptor.converter,
            logical.as_ref(),
            self.catalog.types(),
        )?;

        match (logical, storage) {
            (Some(logical), Some(storage)) => {
                self.catalog
                    .converters()
                    .register(logical, Some(storage), instance);
            }
            (Some(logical), None) => {
                self.catalog.converters().register_logical(logical, instance);
            }
            (None, Some(storage)) => {
                self.catalog
                    .converters_mut()
                    .register_storage(storage, instance);
            }
            (None, None) => self.catalog.converters().register_converter(instance),
        }

        obs::sink::emit(&BuildEvent::ConverterRegistered {
            name: descriptor.converter.clone(),
        });

        Ok(())
    }

    // ---------------------------------------------------------------------
    // Result maps (nested inline maps compile eagerly, the outer map may
    // park on its extends parent)
    // ---------------------------------------------------------------------

    fn build_result_map(
        &mut self,
        assistant: &BuilderAssistant,
        descriptor: &ResultMapDescriptor,
    ) -> Result<Arc<ResultMap>, LoadError> {
        let target = self
            .catalog
            .types()
            .resolve_required(&descriptor.type_name)
            .map_err(BuilderError::from)?;

        let mut bindings = Vec::with_capacity(descriptor.bindings.len());
        for binding in &descriptor.bindings {
            bindings.push(self.build_binding(assistant, &target, &descriptor.id, binding)?);
        }

        let discriminator = descriptor
            .discriminator
            .as_ref()
            .map(|d| self.build_discriminator(assistant, &target, &descriptor.id, &bindings, d))
            .transpose()?;

        let resolver = ResultMapResolver {
            namespace: assistant.namespace().to_string(),
            id: descriptor.id.clone(),
            target,
            extends: descriptor.extends.clone(),
            discriminator,
            bindings,
            auto_mapping: descriptor.auto_mapping,
        };

        match resolver.resolve(&mut self.catalog) {
            Err(LoadError::Incomplete(signal)) => {
                self.catalog.pend_result_map(resolver);
                Err(signal.into())
            }
            other => other,
        }
    }

    fn build_binding(
        &mut self,
        assistant: &BuilderAssistant,
        target: &LogicalType,
        parent_id: &str,
        descriptor: &BindingDescriptor,
    ) -> Result<ResultBinding, BuilderError> {
        match descriptor {
            BindingDescriptor::Result(field) => {
                self.field_binding(assistant, target, field, BindingFlags::default())
            }
            BindingDescriptor::Id(field) => {
                self.field_binding(assistant, target, field, BindingFlags::ID)
            }
            BindingDescriptor::Arg(field) => {
                self.field_binding(assistant, target, field, BindingFlags::CONSTRUCTOR)
            }
            BindingDescriptor::IdArg(field) => {
                self.field_binding(assistant, target, field, BindingFlags::ID_CONSTRUCTOR)
            }
            BindingDescriptor::Association(nested) => {
                self.nested_binding(assistant, target, parent_id, "association", nested)
            }
            BindingDescriptor::Collection(nested) => {
                self.nested_binding(assistant, target, parent_id, "collection", nested)
            }
        }
    }

    fn field_binding(
        &mut self,
        assistant: &BuilderAssistant,
        target: &LogicalType,
        field: &FieldDescriptor,
        flags: BindingFlags,
    ) -> Result<ResultBinding, BuilderError> {
        assistant.build_result_binding(
            &self.catalog,
            target,
            FieldSpec {
                property: Some(field.property.clone()),
                column: field.column.clone(),
                logical_type: field.logical_type.clone(),
                storage_type: field.storage_type.clone(),
                converter: field.converter.clone(),
                flags,
                ..FieldSpec::default()
            },
        )
    }

    fn nested_binding(
        &mut self,
        assistant: &BuilderAssistant,
        target: &LogicalType,
        parent_id: &str,
        kind: &str,
        nested: &NestedDescriptor,
    ) -> Result<ResultBinding, BuilderError> {
        // without a remote query reference, an anonymous inline map takes
        // the nested bindings under a generated id
        let nested_result_map = if nested.select.is_some() {
            None
        } else if let Some(reference) = &nested.result_map {
            Some(reference.clone())
        } else {
            let anon_id = format!("{parent_id}_{kind}[{}]", nested.property);
            let nested_target = self.nested_target(target, nested)?;

            let mut bindings = Vec::with_capacity(nested.bindings.len());
            for binding in &nested.bindings {
                bindings.push(self.build_binding(assistant, &nested_target, &anon_id, binding)?);
            }

            let map = register_anonymous(
                assistant,
                &mut self.catalog,
                &anon_id,
                nested_target,
                bindings,
            )?;
            Some(map.id().to_string())
        };

        assistant.build_result_binding(
            &self.catalog,
            target,
            FieldSpec {
                property: Some(nested.property.clone()),
                column: nested.column.clone(),
                nested_result_map,
                nested_query: nested.select.clone(),
                lazy: nested.lazy,
                ..FieldSpec::default()
            },
        )
    }

    // Nested map target: declared, else the parent property's declared
    // type, else unknown.
    fn nested_target(
        &self,
        parent: &LogicalType,
        nested: &NestedDescriptor,
    ) -> Result<LogicalType, BuilderError> {
        if let Some(name) = &nested.type_name {
            return self
                .catalog
                .types()
                .resolve_required(name)
                .map_err(Into::into);
        }

        Ok(self
            .catalog
            .types()
            .property_type(parent, &crate::types::PropertyPath::parse(&nested.property))
            .unwrap_or(LogicalType::Unknown))
    }

    fn build_discriminator(
        &mut self,
        assistant: &BuilderAssistant,
        target: &LogicalType,
        parent_id: &str,
        enclosing: &[ResultBinding],
        descriptor: &DiscriminatorDescriptor,
    ) -> Result<Discriminator, BuilderError> {
        let mut cases = BTreeMap::new();
        for case in &descriptor.cases {
            let reference = if let Some(reference) = &case.result_map {
                reference.clone()
            } else {
                // inline case maps also inherit the enclosing bindings
                let anon_id = format!("{parent_id}_case[{}]", case.value);
                let case_target = match &case.type_name {
                    Some(name) => self.catalog.types().resolve_required(name)?,
                    None => target.clone(),
                };

                let mut bindings = enclosing.to_vec();
                for binding in &case.bindings {
                    bindings.push(self.build_binding(assistant, &case_target, &anon_id, binding)?);
                }

                let map = register_anonymous(
                    assistant,
                    &mut self.catalog,
                    &anon_id,
                    case_target,
                    bindings,
                )?;
                map.id().to_string()
            };
            cases.insert(case.value.clone(), reference);
        }

        assistant.build_discriminator(
            &self.catalog,
            target,
            FieldSpec {
                column: Some(descriptor.column.clone()),
                logical_type: descriptor.logical_type.clone(),
                storage_type: descriptor.storage_type.clone(),
                converter: descriptor.converter.clone(),
                ..FieldSpec::default()
            },
            cases,
        )
    }

    // ---------------------------------------------------------------------
    // Deferred retries, in insertion order, one pass per set
    // ---------------------------------------------------------------------

    fn retry_pending(&mut self) -> Result<(), BuilderError> {
        for item in self.catalog.take_pending_result_maps() {
            let reference = format!("{}.{}", item.namespace, item.id);
            match item.resolve(&mut self.catalog) {
                Ok(_) => emit_retry(PendingKind::ResultMap, reference, true),
                Err(LoadError::Incomplete(_)) => {
                    emit_retry(PendingKind::ResultMap, reference, false);
                    self.catalog.pend_result_map(item);
                }
                Err(LoadError::Builder(err)) => return Err(err),
            }
        }

        for item in self.catalog.take_pending_cache_refs() {
            let reference = item.referenced.clone();
            match item.resolve(&mut self.catalog) {
                Ok(_) => emit_retry(PendingKind::CacheRef, reference, true),
                Err(LoadError::Incomplete(_)) => {
                    emit_retry(PendingKind::CacheRef, reference, false);
                    self.catalog.pend_cache_ref(item);
                }
                Err(LoadError::Builder(err)) => return Err(err),
            }
        }

        for item in self.catalog.take_pending_statements() {
            let reference = format!("{}.{}", item.namespace, item.descriptor.id);
            match item.resolve(&mut self.catalog) {
                Ok(_) => emit_retry(PendingKind::Statement, reference, true),
                Err(LoadError::Incomplete(_)) => {
                    emit_retry(PendingKind::Statement, reference, false);
                    self.catalog.pend_statement(item);
                }
                Err(LoadError::Builder(err)) => return Err(err),
            }
        }

        Ok(())
    }
}

fn emit_retry(kind: PendingKind, reference: String, resolved: bool) {
    obs::sink::emit(&BuildEvent::PendingRetried {
        kind,
        reference,
        resolved,
    });
}

// Anonymous inline maps have no extends parent, so an incomplete signal
// cannot legitimately occur; treat one as a broken reference.
fn register_anonymous(
    assistant: &BuilderAssistant,
    catalog: &mut Catalog,
    id: &str,
    target: LogicalType,
    bindings: Vec<ResultBinding>,
) -> Result<Arc<ResultMap>, BuilderError> {
    match assistant.add_result_map(catalog, id, target, None, None, bindings, None) {
        Ok(map) => Ok(map),
        Err(LoadError::Builder(err)) => Err(err),
        Err(LoadError::Incomplete(signal)) => {
            let mut report = UnresolvedReport::default();
            report.push(signal.kind, id, signal.reference);
            Err(BuilderError::Unresolved(report))
        }
    }
}
