use crate::{
    convert::{
        BlobBytesConverter, BoolConverter, BytesConverter, ClobTextConverter, ConvertError,
        Converter, ConverterError, DateConverter, DecimalConverter, EnumNameConverter,
        F32Converter, F64Converter, I32Converter, I64Converter, TextConverter, TimeConverter,
        TimestampConverter, UntypedConverter,
    },
    types::{LogicalType, StorageType, TypeKind, TypeRegistry},
    value::{StorageValue, Value},
};
use std::{
    collections::HashMap,
    sync::{Arc, RwLock},
};

/// Per-logical-type dispatch table. The `None` key is the wildcard slot for
/// registrations without a storage type.
type StorageMap = HashMap<Option<StorageType>, Arc<dyn Converter>>;

/// Constructs a converter instance, optionally bound to a logical type.
pub type ConverterFactory = Arc<
    dyn Fn(Option<&LogicalType>, &TypeRegistry) -> Result<Arc<dyn Converter>, ConverterError>
        + Send
        + Sync,
>;

const ENUM_FACTORY: &str = "EnumNameConverter";

///
/// ConverterRegistry
///
/// Two-level (logical type × storage type) converter dispatch. Lookup
/// results for declared types are memoized under the requested type,
/// including a confirmed-absent sentinel, behind an `RwLock`: first-use
/// enum registration may race concurrent readers after the build
/// completes.
///

pub struct ConverterRegistry {
    storage_only: HashMap<StorageType, Arc<dyn Converter>>,
    by_logical: RwLock<HashMap<LogicalType, StorageMap>>,
    memo: RwLock<HashMap<LogicalType, Option<StorageMap>>>,
    by_name: RwLock<HashMap<&'static str, Arc<dyn Converter>>>,
    factories: HashMap<String, ConverterFactory>,
    untyped: Arc<dyn Converter>,
}

impl std::fmt::Debug for ConverterRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConverterRegistry")
            .field("storage_only", &self.storage_only.len())
            .field("factories", &self.factories.len())
            .finish_non_exhaustive()
    }
}

impl Default for ConverterRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl ConverterRegistry {
    /// Build a registry seeded with the builtin converters and factories.
    #[must_use]
    pub fn new() -> Self {
        let untyped: Arc<dyn Converter> = Arc::new(UntypedConverter);

        let mut registry = Self {
            storage_only: HashMap::new(),
            by_logical: RwLock::new(HashMap::new()),
            memo: RwLock::new(HashMap::new()),
            by_name: RwLock::new(HashMap::new()),
            factories: HashMap::new(),
            untyped: Arc::clone(&untyped),
        };

        registry.register_converter(Arc::new(BoolConverter));
        registry.register_storage(StorageType::Boolean, Arc::new(BoolConverter));
        registry.register_storage(StorageType::Bit, Arc::new(BoolConverter));

        registry.register_converter(Arc::new(I32Converter));
        registry.register_storage(StorageType::Integer, Arc::new(I32Converter));
        registry.register_storage(StorageType::Smallint, Arc::new(I32Converter));
        registry.register_storage(StorageType::Tinyint, Arc::new(I32Converter));

        registry.register_converter(Arc::new(I64Converter));
        registry.register_storage(StorageType::Bigint, Arc::new(I64Converter));

        registry.register_converter(Arc::new(F32Converter));
        registry.register_storage(StorageType::Float, Arc::new(F32Converter));

        registry.register_converter(Arc::new(F64Converter));
        registry.register_storage(StorageType::Double, Arc::new(F64Converter));

        registry.register_converter(Arc::new(DecimalConverter));
        registry.register_storage(StorageType::Decimal, Arc::new(DecimalConverter));
        registry.register_storage(StorageType::Numeric, Arc::new(DecimalConverter));
        registry.register_storage(StorageType::Real, Arc::new(DecimalConverter));

        registry.register_converter(Arc::new(TextConverter));
        registry.register_converter(Arc::new(ClobTextConverter));
        registry.register_storage(StorageType::Char, Arc::new(TextConverter));
        registry.register_storage(StorageType::Varchar, Arc::new(TextConverter));
        registry.register_storage(StorageType::Clob, Arc::new(ClobTextConverter));

        registry.register_converter(Arc::new(BytesConverter));
        registry.register_converter(Arc::new(BlobBytesConverter));
        registry.register_storage(StorageType::Binary, Arc::new(BytesConverter));
        registry.register_storage(StorageType::Blob, Arc::new(BlobBytesConverter));

        registry.register_converter(Arc::new(DateConverter));
        registry.register_storage(StorageType::Date, Arc::new(DateConverter));

        registry.register_converter(Arc::new(TimeConverter));
        registry.register_storage(StorageType::Time, Arc::new(TimeConverter));

        registry.register_converter(Arc::new(TimestampConverter));
        registry.register_storage(StorageType::Timestamp, Arc::new(TimestampConverter));

        registry.register_converter(Arc::clone(&untyped));
        registry.register_storage(StorageType::Other, untyped);

        registry.seed_factories();

        registry
    }

    fn seed_factories(&mut self) {
        self.add_factory("BoolConverter", |_, _| Ok(Arc::new(BoolConverter)));
        self.add_factory("I32Converter", |_, _| Ok(Arc::new(I32Converter)));
        self.add_factory("I64Converter", |_, _| Ok(Arc::new(I64Converter)));
        self.add_factory("F32Converter", |_, _| Ok(Arc::new(F32Converter)));
        self.add_factory("F64Converter", |_, _| Ok(Arc::new(F64Converter)));
        self.add_factory("DecimalConverter", |_, _| Ok(Arc::new(DecimalConverter)));
        self.add_factory("TextConverter", |_, _| Ok(Arc::new(TextConverter)));
        self.add_factory("ClobTextConverter", |_, _| Ok(Arc::new(ClobTextConverter)));
        self.add_factory("BytesConverter", |_, _| Ok(Arc::new(BytesConverter)));
        self.add_factory("BlobBytesConverter", |_, _| Ok(Arc::new(BlobBytesConverter)));
        self.add_factory("DateConverter", |_, _| Ok(Arc::new(DateConverter)));
        self.add_factory("TimeConverter", |_, _| Ok(Arc::new(TimeConverter)));
        self.add_factory("TimestampConverter", |_, _| Ok(Arc::new(TimestampConverter)));
        self.add_factory("UntypedConverter", |_, _| Ok(Arc::new(UntypedConverter)));
        self.add_factory(ENUM_FACTORY, |logical, types| {
            let Some(logical) = logical else {
                return Err(ConverterError::Construction {
                    name: ENUM_FACTORY.to_string(),
                    reason: "an enum logical type is required".to_string(),
                });
            };
            enum_converter_for(logical, types)
        });
    }

    fn add_factory(
        &mut self,
        name: &str,
        factory: impl Fn(Option<&LogicalType>, &TypeRegistry) -> Result<Arc<dyn Converter>, ConverterError>
        + Send
        + Sync
        + 'static,
    ) {
        self.factories.insert(name.to_string(), Arc::new(factory));
    }

    /// Register a user-supplied factory under a converter name.
    pub fn register_factory(&mut self, name: impl Into<String>, factory: ConverterFactory) {
        self.factories.insert(name.into(), factory);
    }

    // ---------------------------------------------------------------------
    // Registration
    // ---------------------------------------------------------------------

    /// Register a converter for an exact (logical, storage) pair. A `None`
    /// storage type fills the wildcard slot.
    pub fn register(
        &self,
        logical: LogicalType,
        storage: Option<StorageType>,
        converter: Arc<dyn Converter>,
    ) {
        self.remember_name(&converter);
        {
            let mut by_logical = self
                .by_logical
                .write()
                .expect("converter table lock poisoned");
            by_logical
                .entry(logical.clone())
                .or_default()
                .insert(storage, converter);
        }
        // drop any memoized walk result for this exact type
        self.memo
            .write()
            .expect("converter memo lock poisoned")
            .remove(&logical);
    }

    /// Register a converter for a logical type, honoring its declared
    /// storage types.
    pub fn register_logical(&self, logical: LogicalType, converter: Arc<dyn Converter>) {
        let meta = converter.meta();
        if meta.storage_types.is_empty() {
            self.register(logical, None, converter);
            return;
        }
        for storage in &meta.storage_types {
            self.register(logical.clone(), Some(*storage), Arc::clone(&converter));
        }
        if meta.wildcard_storage {
            self.register(logical, None, converter);
        }
    }

    /// Auto-detecting registration: declared logical types first, then the
    /// instance's bound type, else name-only (usable by explicit requests).
    pub fn register_converter(&self, converter: Arc<dyn Converter>) {
        let declared = converter.meta().logical_types;
        if !declared.is_empty() {
            for logical in declared {
                self.register_logical(logical, Arc::clone(&converter));
            }
            return;
        }
        if let Some(bound) = converter.bound_logical_type() {
            self.register_logical(bound, converter);
            return;
        }
        self.remember_name(&converter);
    }

    /// Register a converter in the storage-type-only table.
    pub fn register_storage(&mut self, storage: StorageType, converter: Arc<dyn Converter>) {
        self.remember_name(&converter);
        self.storage_only.insert(storage, converter);
    }

    fn remember_name(&self, converter: &Arc<dyn Converter>) {
        self.by_name
            .write()
            .expect("converter name table lock poisoned")
            .insert(converter.name(), Arc::clone(converter));
    }

    // ---------------------------------------------------------------------
    // Lookup
    // ---------------------------------------------------------------------

    /// Resolve a converter for a (logical, storage) pair.
    ///
    /// Storage dimension: exact match, then the wildcard slot, then the
    /// sole converter when exactly one distinct converter is registered
    /// across all storage types for this logical type. More than one
    /// distinct converter means ambiguity and resolves to `None` rather
    /// than a guess.
    #[must_use]
    pub fn lookup(
        &self,
        types: &TypeRegistry,
        logical: &LogicalType,
        storage: Option<StorageType>,
    ) -> Option<Arc<dyn Converter>> {
        let map = self.resolved_map(types, logical)?;

        if let Some(storage) = storage {
            if let Some(converter) = map.get(&Some(storage)) {
                return Some(Arc::clone(converter));
            }
        }
        if let Some(converter) = map.get(&None) {
            return Some(Arc::clone(converter));
        }

        pick_sole(&map)
    }

    /// Resolve a converter from the storage-type-only table.
    #[must_use]
    pub fn lookup_storage(&self, storage: StorageType) -> Option<Arc<dyn Converter>> {
        self.storage_only.get(&storage).cloned()
    }

    #[must_use]
    pub fn has_converter(
        &self,
        types: &TypeRegistry,
        logical: &LogicalType,
        storage: Option<StorageType>,
    ) -> bool {
        self.lookup(types, logical, storage).is_some()
    }

    /// Name-based relookup for descriptors that reference a converter by
    /// name rather than by value type.
    #[must_use]
    pub fn by_name(&self, name: &str) -> Option<Arc<dyn Converter>> {
        self.by_name
            .read()
            .expect("converter name table lock poisoned")
            .get(name)
            .cloned()
    }

    /// The converter serving `Unknown` logical slots.
    #[must_use]
    pub fn untyped(&self) -> Arc<dyn Converter> {
        Arc::clone(&self.untyped)
    }

    /// Resolve a converter by name, reusing a registered instance when one
    /// exists, else constructing through the named factory.
    pub fn instance(
        &self,
        name: &str,
        logical: Option<&LogicalType>,
        types: &TypeRegistry,
    ) -> Result<Arc<dyn Converter>, ConverterError> {
        if let Some(existing) = self.by_name(name) {
            return Ok(existing);
        }
        self.construct(name, logical, types)
    }

    // Factory-only construction; used where a fresh bound instance matters
    // (enum rebinding must not reuse an instance bound to another type).
    fn construct(
        &self,
        name: &str,
        logical: Option<&LogicalType>,
        types: &TypeRegistry,
    ) -> Result<Arc<dyn Converter>, ConverterError> {
        let factory = self
            .factories
            .get(name)
            .ok_or_else(|| ConverterError::Unknown {
                name: name.to_string(),
            })?;

        factory(logical, types)
    }

    // ---------------------------------------------------------------------
    // Hierarchy walk + memoization
    // ---------------------------------------------------------------------

    fn resolved_map(&self, types: &TypeRegistry, logical: &LogicalType) -> Option<StorageMap> {
        if let Some(hit) = self
            .memo
            .read()
            .expect("converter memo lock poisoned")
            .get(logical)
        {
            return hit.clone();
        }

        let resolved = self.resolve_map_uncached(types, logical);
        self.memo
            .write()
            .expect("converter memo lock poisoned")
            .insert(logical.clone(), resolved.clone());

        resolved
    }

    fn resolve_map_uncached(
        &self,
        types: &TypeRegistry,
        logical: &LogicalType,
    ) -> Option<StorageMap> {
        if let Some(map) = self
            .by_logical
            .read()
            .expect("converter table lock poisoned")
            .get(logical)
        {
            return Some(map.clone());
        }

        let def = types.def_of(logical)?;
        if def.kind == TypeKind::Enum {
            if let Some(map) = self.interface_map_for_enum(types, logical, &def.interfaces) {
                return Some(map);
            }
            // no interface carries an entry: auto-register the default enum
            // converter bound to this exact enum type
            let converter = enum_converter_for(logical, types).ok()?;
            self.register(logical.clone(), None, converter);
            return self
                .by_logical
                .read()
                .expect("converter table lock poisoned")
                .get(logical)
                .cloned();
        }

        // non-enum declared types walk the parent chain
        let mut parent = def.parent.clone();
        while let Some(name) = parent {
            let ancestor = LogicalType::named(&name);
            if let Some(map) = self
                .by_logical
                .read()
                .expect("converter table lock poisoned")
                .get(&ancestor)
            {
                return Some(map.clone());
            }
            parent = types.get(&name).and_then(|d| d.parent.clone());
        }

        None
    }

    // Depth-first search of the enum's implemented interfaces; entries found
    // under an interface are re-constructed bound to the exact enum type.
    fn interface_map_for_enum(
        &self,
        types: &TypeRegistry,
        enum_logical: &LogicalType,
        interfaces: &[String],
    ) -> Option<StorageMap> {
        for interface in interfaces {
            let key = LogicalType::named(interface);
            // take and drop the read guard before any recursive descent
            let direct = {
                self.by_logical
                    .read()
                    .expect("converter table lock poisoned")
                    .get(&key)
                    .cloned()
            };
            let found = direct.or_else(|| {
                let def = types.get(interface)?;
                self.interface_map_for_enum(types, enum_logical, &def.interfaces)
            });

            if let Some(map) = found {
                let mut rebound = StorageMap::new();
                for (storage, converter) in map {
                    let instance = self
                        .construct(converter.name(), Some(enum_logical), types)
                        .unwrap_or(converter);
                    rebound.insert(storage, instance);
                }
                return Some(rebound);
            }
        }

        None
    }

    // ---------------------------------------------------------------------
    // Execution-facing helpers
    // ---------------------------------------------------------------------

    /// Convert a logical value through the registry using its own type.
    pub fn write_value(
        &self,
        types: &TypeRegistry,
        value: &Value,
        storage: Option<StorageType>,
    ) -> Result<StorageValue, ConvertError> {
        let converter = self
            .lookup(types, &value.logical_type(), storage)
            .unwrap_or_else(|| self.untyped());

        converter.to_storage(value, storage)
    }
}

// `None` when more than one distinct converter (by name) is registered.
fn pick_sole(map: &StorageMap) -> Option<Arc<dyn Converter>> {
    let mut sole: Option<&Arc<dyn Converter>> = None;
    for converter in map.values() {
        match sole {
            None => sole = Some(converter),
            Some(existing) if existing.name() == converter.name() => {}
            Some(_) => return None,
        }
    }

    sole.map(Arc::clone)
}

fn enum_converter_for(
    logical: &LogicalType,
    types: &TypeRegistry,
) -> Result<Arc<dyn Converter>, ConverterError> {
    let Some(def) = types.def_of(logical).filter(|def| def.kind == TypeKind::Enum) else {
        return Err(ConverterError::Construction {
            name: ENUM_FACTORY.to_string(),
            reason: format!("'{logical}' is not a declared enum type"),
        });
    };

    Ok(Arc::new(EnumNameConverter::new(
        def.name.clone(),
        def.variants().to_vec(),
    )))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::TypeDef;

    fn types_with_enum() -> TypeRegistry {
        let mut types = TypeRegistry::new();
        types.register_type(TypeDef::enumeration("app.model.Role", ["Admin", "User"]));
        types
    }

    #[test]
    fn exact_pair_beats_wildcard_beats_sole() {
        let registry = ConverterRegistry::new();
        let types = TypeRegistry::new();

        let exact = registry
            .lookup(&types, &LogicalType::Text, Some(StorageType::Clob))
            .expect("clob entry is seeded");
        assert_eq!(exact.name(), "ClobTextConverter");

        let wildcard = registry
            .lookup(&types, &LogicalType::Text, Some(StorageType::Timestamp))
            .expect("wildcard entry is seeded");
        assert_eq!(wildcard.name(), "TextConverter");
    }

    #[test]
    fn sole_converter_fallback_and_ambiguity_guard() {
        let registry = ConverterRegistry::new();
        let mut types = TypeRegistry::new();
        types.register_type(TypeDef::structure("app.model.Money"));
        types.register_type(TypeDef::structure("app.model.Weight"));

        let money = LogicalType::named("app.model.Money");
        registry.register(money.clone(), Some(StorageType::Decimal), Arc::new(DecimalConverter));

        // one distinct converter registered overall: returned despite the
        // storage-type mismatch
        let sole = registry
            .lookup(&types, &money, Some(StorageType::Varchar))
            .expect("sole converter is returned");
        assert_eq!(sole.name(), "DecimalConverter");

        // two distinct converters: ambiguous, do not guess
        let weight = LogicalType::named("app.model.Weight");
        registry.register(weight.clone(), Some(StorageType::Decimal), Arc::new(DecimalConverter));
        registry.register(weight.clone(), Some(StorageType::Double), Arc::new(F64Converter));
        assert!(
            registry
                .lookup(&types, &weight, Some(StorageType::Varchar))
                .is_none()
        );
    }

    #[test]
    fn distinct_pairs_resolve_their_own_converters() {
        let registry = ConverterRegistry::new();
        let mut types = TypeRegistry::new();
        types.register_type(TypeDef::structure("app.model.Amount"));
        let amount = LogicalType::named("app.model.Amount");

        registry.register(amount.clone(), Some(StorageType::Decimal), Arc::new(DecimalConverter));
        registry.register(amount.clone(), Some(StorageType::Varchar), Arc::new(TextConverter));

        let decimal = registry
            .lookup(&types, &amount, Some(StorageType::Decimal))
            .unwrap();
        let text = registry
            .lookup(&types, &amount, Some(StorageType::Varchar))
            .unwrap();
        assert_eq!(decimal.name(), "DecimalConverter");
        assert_eq!(text.name(), "TextConverter");
    }

    #[test]
    fn first_use_of_an_enum_type_registers_the_default_enum_converter() {
        let registry = ConverterRegistry::new();
        let types = types_with_enum();
        let role = LogicalType::named("app.model.Role");

        let converter = registry
            .lookup(&types, &role, None)
            .expect("default enum converter is constructed on first use");
        assert_eq!(converter.name(), "EnumNameConverter");
        assert_eq!(converter.bound_logical_type(), Some(role.clone()));

        // second lookup is served from the registered table
        assert!(registry.lookup(&types, &role, None).is_some());
        assert!(registry.by_name("EnumNameConverter").is_some());
    }

    #[test]
    fn enum_interface_entries_are_rebound_to_the_exact_enum_type() {
        let mut registry = ConverterRegistry::new();
        let mut types = TypeRegistry::new();
        types.register_type(TypeDef::interface("app.model.Coded"));
        types.register_type(
            TypeDef::enumeration("app.model.Status", ["Open", "Closed"])
                .implements("app.model.Coded"),
        );

        // the interface carries the default enum converter registration
        let coded = LogicalType::named("app.model.Coded");
        registry.register_factory(
            "StatusLike",
            Arc::new(|logical, types| {
                let logical = logical.cloned().unwrap_or(LogicalType::Unknown);
                enum_converter_for(&logical, types)
            }),
        );
        #[derive(Debug)]
        struct StatusLike;
        impl Converter for StatusLike {
            fn name(&self) -> &'static str {
                "StatusLike"
            }
            fn to_storage(
                &self,
                value: &Value,
                storage: Option<StorageType>,
            ) -> Result<StorageValue, ConvertError> {
                UntypedConverter.to_storage(value, storage)
            }
            fn from_storage(&self, value: &StorageValue) -> Result<Value, ConvertError> {
                UntypedConverter.from_storage(value)
            }
        }
        registry.register(coded, None, Arc::new(StatusLike));

        let status = LogicalType::named("app.model.Status");
        let converter = registry
            .lookup(&types, &status, None)
            .expect("interface walk finds an entry");
        assert_eq!(
            converter.bound_logical_type(),
            Some(status.clone()),
            "rebinding must pin the exact enum type"
        );
    }

    #[test]
    fn parent_chain_walk_is_memoized_with_absent_sentinel() {
        let registry = ConverterRegistry::new();
        let mut types = TypeRegistry::new();
        types.register_type(TypeDef::structure("app.model.Base"));
        types.register_type(TypeDef::structure("app.model.Derived").parent("app.model.Base"));
        types.register_type(TypeDef::structure("app.model.Orphan"));

        let base = LogicalType::named("app.model.Base");
        let derived = LogicalType::named("app.model.Derived");
        registry.register(base, Some(StorageType::Varchar), Arc::new(TextConverter));

        let via_parent = registry
            .lookup(&types, &derived, Some(StorageType::Varchar))
            .expect("parent entry found through the chain");
        assert_eq!(via_parent.name(), "TextConverter");

        // confirmed-absent sentinel: repeated misses stay misses
        let orphan = LogicalType::named("app.model.Orphan");
        assert!(registry.lookup(&types, &orphan, None).is_none());
        assert!(registry.lookup(&types, &orphan, None).is_none());
    }

    #[test]
    fn name_relookup_returns_registered_instances() {
        let registry = ConverterRegistry::new();
        let types = TypeRegistry::new();

        let named = registry.by_name("DecimalConverter").unwrap();
        assert_eq!(named.name(), "DecimalConverter");

        let constructed = registry.instance("DecimalConverter", None, &types).unwrap();
        assert!(Arc::ptr_eq(&named, &constructed), "instance() reuses registered converters");

        assert!(matches!(
            registry.instance("GhostConverter", None, &types),
            Err(ConverterError::Unknown { .. })
        ));
    }
}
