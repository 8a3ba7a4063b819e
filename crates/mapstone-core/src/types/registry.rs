use crate::types::{LogicalType, PropertyPath, TypeError};
use derive_more::Display;
use serde::{Deserialize, Serialize};
use std::{collections::HashMap, sync::Arc};

///
/// TypeKind
///

#[derive(Clone, Copy, Debug, Deserialize, Display, Eq, PartialEq, Serialize)]
#[remain::sorted]
pub enum TypeKind {
    #[display("enum")]
    Enum,
    #[display("interface")]
    Interface,
    #[display("struct")]
    Struct,
}

///
/// TypeDef
///
/// Declared metadata for one named type: the statically known property and
/// constructor-parameter tables the compiler matches against instead of
/// runtime introspection.
///

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct TypeDef {
    pub name: String,
    pub kind: TypeKind,
    pub parent: Option<String>,
    pub interfaces: Vec<String>,
    properties: Vec<(String, LogicalType)>,
    constructors: Vec<ConstructorDef>,
    variants: Vec<String>,
}

impl TypeDef {
    #[must_use]
    pub fn structure(name: impl Into<String>) -> Self {
        Self::new(name, TypeKind::Struct)
    }

    #[must_use]
    pub fn enumeration(
        name: impl Into<String>,
        variants: impl IntoIterator<Item = impl Into<String>>,
    ) -> Self {
        let mut def = Self::new(name, TypeKind::Enum);
        def.variants = variants.into_iter().map(Into::into).collect();
        def
    }

    #[must_use]
    pub fn interface(name: impl Into<String>) -> Self {
        Self::new(name, TypeKind::Interface)
    }

    fn new(name: impl Into<String>, kind: TypeKind) -> Self {
        Self {
            name: name.into(),
            kind,
            parent: None,
            interfaces: Vec::new(),
            properties: Vec::new(),
            constructors: Vec::new(),
            variants: Vec::new(),
        }
    }

    #[must_use]
    pub fn parent(mut self, name: impl Into<String>) -> Self {
        self.parent = Some(name.into());
        self
    }

    #[must_use]
    pub fn implements(mut self, name: impl Into<String>) -> Self {
        self.interfaces.push(name.into());
        self
    }

    #[must_use]
    pub fn property(mut self, name: impl Into<String>, ty: LogicalType) -> Self {
        self.properties.push((name.into(), ty));
        self
    }

    /// Declare a constructor by its ordered (name, type) parameter list.
    #[must_use]
    pub fn constructor(
        mut self,
        params: impl IntoIterator<Item = (&'static str, LogicalType)>,
    ) -> Self {
        self.constructors.push(ConstructorDef {
            params: params
                .into_iter()
                .map(|(name, ty)| (name.to_string(), ty))
                .collect(),
        });
        self
    }

    #[must_use]
    pub fn property_type(&self, name: &str) -> Option<&LogicalType> {
        self.properties
            .iter()
            .find(|(p, _)| p.as_str() == name)
            .map(|(_, ty)| ty)
    }

    #[must_use]
    pub fn constructors(&self) -> &[ConstructorDef] {
        &self.constructors
    }

    #[must_use]
    pub fn variants(&self) -> &[String] {
        &self.variants
    }

    #[must_use]
    pub fn has_variant(&self, variant: &str) -> bool {
        self.variants.iter().any(|v| v.as_str() == variant)
    }
}

///
/// ConstructorDef
///

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct ConstructorDef {
    pub params: Vec<(String, LogicalType)>,
}

impl ConstructorDef {
    pub fn param_names(&self) -> impl Iterator<Item = &str> {
        self.params.iter().map(|(name, _)| name.as_str())
    }

    #[must_use]
    pub fn param_type(&self, name: &str) -> Option<&LogicalType> {
        self.params
            .iter()
            .find(|(p, _)| p.as_str() == name)
            .map(|(_, ty)| ty)
    }
}

// Alias targets either land on a builtin scalar directly or chain to a
// declared type name.
#[derive(Clone, Debug)]
enum AliasTarget {
    Builtin(LogicalType),
    Name(String),
}

///
/// TypeRegistry
///
/// Alias table plus declared-type table. Alias resolution is
/// case-insensitive and last-write-wins so descriptors can override the
/// seeded defaults; full type names resolve verbatim.
///

#[derive(Debug)]
pub struct TypeRegistry {
    aliases: HashMap<String, AliasTarget>,
    types: HashMap<String, Arc<TypeDef>>,
}

impl Default for TypeRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl TypeRegistry {
    #[must_use]
    pub fn new() -> Self {
        let mut registry = Self {
            aliases: HashMap::new(),
            types: HashMap::new(),
        };

        for (alias, ty) in [
            ("bool", LogicalType::Bool),
            ("boolean", LogicalType::Bool),
            ("bytes", LogicalType::Bytes),
            ("binary", LogicalType::Bytes),
            ("date", LogicalType::Date),
            ("decimal", LogicalType::Decimal),
            ("float", LogicalType::Float32),
            ("f32", LogicalType::Float32),
            ("double", LogicalType::Float64),
            ("f64", LogicalType::Float64),
            ("int", LogicalType::Int32),
            ("integer", LogicalType::Int32),
            ("i32", LogicalType::Int32),
            ("long", LogicalType::Int64),
            ("i64", LogicalType::Int64),
            ("string", LogicalType::Text),
            ("str", LogicalType::Text),
            ("text", LogicalType::Text),
            ("time", LogicalType::Time),
            ("datetime", LogicalType::Timestamp),
            ("timestamp", LogicalType::Timestamp),
            ("map", LogicalType::Unknown),
            ("object", LogicalType::Unknown),
        ] {
            registry
                .aliases
                .insert(alias.to_string(), AliasTarget::Builtin(ty));
        }

        registry
    }

    /// Map a short name onto a declared type name. Last write wins so
    /// descriptors can override framework defaults.
    pub fn register_alias(&mut self, alias: impl Into<String>, target: impl Into<String>) {
        self.aliases
            .insert(alias.into().to_ascii_lowercase(), AliasTarget::Name(target.into()));
    }

    /// Declare (or redeclare) a named type.
    pub fn register_type(&mut self, def: TypeDef) {
        self.types.insert(def.name.clone(), Arc::new(def));
    }

    /// Alias table first (case-insensitive), then declared type names verbatim.
    #[must_use]
    pub fn resolve(&self, name: &str) -> Option<LogicalType> {
        match self.aliases.get(&name.to_ascii_lowercase()) {
            Some(AliasTarget::Builtin(ty)) => Some(ty.clone()),
            Some(AliasTarget::Name(target)) => self.resolve_declared(target),
            None => self.resolve_declared(name),
        }
    }

    pub fn resolve_required(&self, name: &str) -> Result<LogicalType, TypeError> {
        self.resolve(name).ok_or_else(|| TypeError::UnknownType {
            name: name.to_string(),
        })
    }

    fn resolve_declared(&self, name: &str) -> Option<LogicalType> {
        self.types
            .contains_key(name)
            .then(|| LogicalType::named(name))
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Arc<TypeDef>> {
        self.types.get(name)
    }

    #[must_use]
    pub fn def_of(&self, ty: &LogicalType) -> Option<&Arc<TypeDef>> {
        ty.name().and_then(|name| self.types.get(name))
    }

    #[must_use]
    pub fn is_enum(&self, ty: &LogicalType) -> bool {
        self.def_of(ty).is_some_and(|def| def.kind == TypeKind::Enum)
    }

    /// Walk a property path through declared types. Returns `None` when any
    /// segment is undeclared; indexed segments yield `Unknown` (element
    /// types are not modeled).
    #[must_use]
    pub fn property_type(&self, owner: &LogicalType, path: &PropertyPath) -> Option<LogicalType> {
        let mut current = owner.clone();
        for segment in path.segments() {
            let def = self.def_of(&current)?;
            current = def.property_type(&segment.name)?.clone();
            if segment.index.is_some() {
                current = LogicalType::Unknown;
            }
        }

        Some(current)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn registry_with_user() -> TypeRegistry {
        let mut registry = TypeRegistry::new();
        registry.register_type(
            TypeDef::structure("app.model.User")
                .property("id", LogicalType::Int64)
                .property("name", LogicalType::Text)
                .property("address", LogicalType::named("app.model.Address")),
        );
        registry.register_type(
            TypeDef::structure("app.model.Address").property("city", LogicalType::Text),
        );
        registry.register_alias("User", "app.model.User");
        registry
    }

    #[test]
    fn alias_resolution_is_case_insensitive_then_falls_back_to_full_names() {
        let registry = registry_with_user();

        assert_eq!(
            registry.resolve("user"),
            Some(LogicalType::named("app.model.User"))
        );
        assert_eq!(
            registry.resolve("app.model.User"),
            Some(LogicalType::named("app.model.User"))
        );
        assert_eq!(registry.resolve("STRING"), Some(LogicalType::Text));
        assert_eq!(registry.resolve("app.model.Missing"), None);
    }

    #[test]
    fn duplicate_alias_registration_overwrites() {
        let mut registry = registry_with_user();
        registry.register_type(TypeDef::structure("app.model.Customer"));
        registry.register_alias("User", "app.model.Customer");

        assert_eq!(
            registry.resolve("user"),
            Some(LogicalType::named("app.model.Customer"))
        );
    }

    #[test]
    fn property_types_walk_nested_paths() {
        let registry = registry_with_user();
        let owner = LogicalType::named("app.model.User");

        assert_eq!(
            registry.property_type(&owner, &PropertyPath::parse("address.city")),
            Some(LogicalType::Text)
        );
        assert_eq!(
            registry.property_type(&owner, &PropertyPath::parse("missing")),
            None
        );
    }
}
