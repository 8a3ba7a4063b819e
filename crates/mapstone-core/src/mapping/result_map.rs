use crate::{
    error::BuilderError,
    mapping::ResultBinding,
    types::{LogicalType, TypeRegistry},
};
use std::collections::{BTreeMap, BTreeSet};

///
/// Discriminator
///
/// Per-row conditional: one control binding plus literal value → result map
/// id, consulted during row materialization to pick the concrete map.
///

#[derive(Clone, Debug)]
pub struct Discriminator {
    binding: ResultBinding,
    cases: BTreeMap<String, String>,
}

impl Discriminator {
    #[must_use]
    pub const fn new(binding: ResultBinding, cases: BTreeMap<String, String>) -> Self {
        Self { binding, cases }
    }

    #[must_use]
    pub const fn binding(&self) -> &ResultBinding {
        &self.binding
    }

    #[must_use]
    pub fn result_map_for(&self, value: &str) -> Option<&str> {
        self.cases.get(value).map(String::as_str)
    }

    #[must_use]
    pub const fn cases(&self) -> &BTreeMap<String, String> {
        &self.cases
    }
}

///
/// ResultMap
///
/// A compiled whole-object mapping: ordered bindings partitioned into
/// constructor / id / property buckets. Invariant: with no identifying
/// binding declared, *every* binding is identifying (row-identity
/// comparison falls back to the full column set). Frozen after build.
///

#[derive(Clone, Debug)]
pub struct ResultMap {
    id: String,
    target: LogicalType,
    bindings: Vec<ResultBinding>,
    id_indices: Vec<usize>,
    constructor_indices: Vec<usize>,
    property_indices: Vec<usize>,
    mapped_columns: BTreeSet<String>,
    mapped_properties: BTreeSet<String>,
    discriminator: Option<Discriminator>,
    has_nested_result_maps: bool,
    has_nested_queries: bool,
    auto_mapping: Option<bool>,
}

impl ResultMap {
    #[must_use]
    pub fn builder(id: impl Into<String>, target: LogicalType) -> ResultMapBuilder {
        ResultMapBuilder {
            id: id.into(),
            target,
            bindings: Vec::new(),
            discriminator: None,
            auto_mapping: None,
        }
    }

    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    #[must_use]
    pub const fn target_type(&self) -> &LogicalType {
        &self.target
    }

    #[must_use]
    pub fn bindings(&self) -> &[ResultBinding] {
        &self.bindings
    }

    pub fn id_bindings(&self) -> impl Iterator<Item = &ResultBinding> {
        self.id_indices.iter().map(|&i| &self.bindings[i])
    }

    pub fn constructor_bindings(&self) -> impl Iterator<Item = &ResultBinding> {
        self.constructor_indices.iter().map(|&i| &self.bindings[i])
    }

    pub fn property_bindings(&self) -> impl Iterator<Item = &ResultBinding> {
        self.property_indices.iter().map(|&i| &self.bindings[i])
    }

    #[must_use]
    pub const fn mapped_columns(&self) -> &BTreeSet<String> {
        &self.mapped_columns
    }

    #[must_use]
    pub const fn mapped_properties(&self) -> &BTreeSet<String> {
        &self.mapped_properties
    }

    #[must_use]
    pub const fn discriminator(&self) -> Option<&Discriminator> {
        self.discriminator.as_ref()
    }

    #[must_use]
    pub const fn has_nested_result_maps(&self) -> bool {
        self.has_nested_result_maps
    }

    #[must_use]
    pub const fn has_nested_queries(&self) -> bool {
        self.has_nested_queries
    }

    #[must_use]
    pub const fn auto_mapping(&self) -> Option<bool> {
        self.auto_mapping
    }
}

///
/// ResultMapBuilder
///

#[derive(Debug)]
pub struct ResultMapBuilder {
    id: String,
    target: LogicalType,
    bindings: Vec<ResultBinding>,
    discriminator: Option<Discriminator>,
    auto_mapping: Option<bool>,
}

impl ResultMapBuilder {
    #[must_use]
    pub fn binding(mut self, binding: ResultBinding) -> Self {
        self.bindings.push(binding);
        self
    }

    #[must_use]
    pub fn bindings(mut self, bindings: impl IntoIterator<Item = ResultBinding>) -> Self {
        self.bindings.extend(bindings);
        self
    }

    #[must_use]
    pub fn discriminator(mut self, discriminator: Option<Discriminator>) -> Self {
        self.discriminator = discriminator;
        self
    }

    #[must_use]
    pub const fn auto_mapping(mut self, auto_mapping: Option<bool>) -> Self {
        self.auto_mapping = auto_mapping;
        self
    }

    /// Partition, flag, and freeze the map; constructor bindings are checked
    /// and ordered against the target type's declared constructors.
    pub fn build(self, types: &TypeRegistry) -> Result<ResultMap, BuilderError> {
        let mut map = ResultMap {
            id: self.id,
            target: self.target,
            bindings: self.bindings,
            id_indices: Vec::new(),
            constructor_indices: Vec::new(),
            property_indices: Vec::new(),
            mapped_columns: BTreeSet::new(),
            mapped_properties: BTreeSet::new(),
            discriminator: self.discriminator,
            has_nested_result_maps: false,
            has_nested_queries: false,
            auto_mapping: self.auto_mapping,
        };

        let mut constructor_arg_names = Vec::new();
        for (index, binding) in map.bindings.iter().enumerate() {
            map.has_nested_queries = map.has_nested_queries || binding.nested_query().is_some();
            map.has_nested_result_maps =
                map.has_nested_result_maps || binding.nested_result_map().is_some();

            if let Some(column) = binding.column() {
                map.mapped_columns.insert(column.to_ascii_uppercase());
            } else if binding.is_composite() {
                for composite in binding.composites() {
                    if let Some(column) = composite.column() {
                        map.mapped_columns.insert(column.to_ascii_uppercase());
                    }
                }
            }
            if let Some(property) = binding.property() {
                map.mapped_properties.insert(property.to_string());
            }

            if binding.flags().constructor {
                map.constructor_indices.push(index);
                if let Some(property) = binding.property() {
                    constructor_arg_names.push(property.to_string());
                }
            } else {
                map.property_indices.push(index);
            }
            if binding.flags().id {
                map.id_indices.push(index);
            }
        }

        if map.id_indices.is_empty() {
            map.id_indices = (0..map.bindings.len()).collect();
        }

        if !constructor_arg_names.is_empty() {
            let actual_names = matching_constructor_names(&map, types, &constructor_arg_names)
                .ok_or_else(|| BuilderError::ConstructorMismatch {
                    result_map: map.id.clone(),
                    type_name: map.target.to_string(),
                    arg_names: constructor_arg_names.clone(),
                })?;

            // order constructor bindings by the declared parameter positions
            map.constructor_indices.sort_by_key(|&i| {
                map.bindings[i]
                    .property()
                    .and_then(|p| actual_names.iter().position(|n| n.as_str() == p))
                    .unwrap_or(usize::MAX)
            });
        }

        Ok(map)
    }
}

// Search the target type's declared constructors for one whose parameter
// names cover the declared arg names and whose parameter types match the
// bindings positionally after aligning by name.
fn matching_constructor_names(
    map: &ResultMap,
    types: &TypeRegistry,
    arg_names: &[String],
) -> Option<Vec<String>> {
    let def = types.def_of(&map.target)?;

    'next: for constructor in def.constructors() {
        if constructor.params.len() != arg_names.len() {
            continue;
        }
        let param_names: Vec<String> = constructor.param_names().map(str::to_string).collect();
        if !param_names.iter().all(|name| arg_names.contains(name)) {
            continue;
        }
        for (i, arg_name) in arg_names.iter().enumerate() {
            let declared = constructor.param_type(arg_name)?;
            let specified = map
                .constructor_indices
                .get(i)
                .map(|&idx| map.bindings[idx].logical_type())?;
            if declared != specified {
                continue 'next;
            }
        }
        return Some(param_names);
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        convert::{I64Converter, TextConverter},
        mapping::BindingFlags,
        types::TypeDef,
    };
    use std::sync::Arc;

    fn types_with_point() -> TypeRegistry {
        let mut types = TypeRegistry::new();
        types.register_type(
            TypeDef::structure("geo.Point")
                .property("label", LogicalType::Text)
                .constructor([("x", LogicalType::Int64), ("y", LogicalType::Int64)]),
        );
        types
    }

    fn arg(property: &str) -> ResultBinding {
        ResultBinding::builder(
            Some(property.to_string()),
            LogicalType::Int64,
            Arc::new(I64Converter),
        )
        .column(Some(property.to_string()))
        .flags(BindingFlags::CONSTRUCTOR)
        .build()
    }

    #[test]
    fn constructor_bindings_are_sorted_into_declared_order() {
        let types = types_with_point();
        let map = ResultMap::builder("geo.pointMap", LogicalType::named("geo.Point"))
            .binding(arg("y"))
            .binding(arg("x"))
            .build(&types)
            .unwrap();

        let ordered: Vec<_> = map
            .constructor_bindings()
            .map(|b| b.property().unwrap().to_string())
            .collect();
        assert_eq!(ordered, vec!["x", "y"]);
    }

    #[test]
    fn missing_constructor_is_reported_with_attempted_names() {
        let types = types_with_point();
        let err = ResultMap::builder("geo.pointMap", LogicalType::named("geo.Point"))
            .binding(arg("x"))
            .binding(arg("z"))
            .build(&types)
            .unwrap_err();

        let text = err.to_string();
        assert!(text.contains("geo.Point"), "error names the target type: {text}");
        assert!(text.contains('z'), "error cites the attempted arg names: {text}");
    }

    #[test]
    fn constructor_type_mismatch_is_rejected() {
        let types = types_with_point();
        let bad_arg = ResultBinding::builder(
            Some("x".to_string()),
            LogicalType::Text,
            Arc::new(TextConverter),
        )
        .flags(BindingFlags::CONSTRUCTOR)
        .build();

        let err = ResultMap::builder("geo.pointMap", LogicalType::named("geo.Point"))
            .binding(bad_arg)
            .binding(arg("y"))
            .build(&types)
            .unwrap_err();
        assert!(matches!(err, BuilderError::ConstructorMismatch { .. }));
    }

    #[test]
    fn without_id_bindings_every_binding_identifies_the_row() {
        let types = TypeRegistry::new();
        let binding = ResultBinding::builder(
            Some("name".to_string()),
            LogicalType::Text,
            Arc::new(TextConverter),
        )
        .column(Some("name".to_string()))
        .build();

        let map = ResultMap::builder("app.anon", LogicalType::Unknown)
            .binding(binding)
            .build(&types)
            .unwrap();
        assert_eq!(map.id_bindings().count(), map.bindings().len());
    }

    #[test]
    fn id_bindings_partition_away_from_properties() {
        let types = TypeRegistry::new();
        let id = ResultBinding::builder(
            Some("id".to_string()),
            LogicalType::Int64,
            Arc::new(I64Converter),
        )
        .column(Some("id".to_string()))
        .flags(BindingFlags::ID)
        .build();
        let name = ResultBinding::builder(
            Some("name".to_string()),
            LogicalType::Text,
            Arc::new(TextConverter),
        )
        .column(Some("name".to_string()))
        .build();

        let map = ResultMap::builder("app.userMap", LogicalType::Unknown)
            .binding(id)
            .binding(name)
            .build(&types)
            .unwrap();

        assert_eq!(map.id_bindings().count(), 1);
        assert_eq!(map.property_bindings().count(), 2);
        assert!(map.mapped_columns().contains("ID"));
        assert!(map.mapped_properties().contains("name"));
    }
}
