use crate::{
    convert::Converter,
    types::{LogicalType, StorageType},
};
use mapstone_schema::types::ParamMode;
use std::sync::Arc;

///
/// BindingFlags
///

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct BindingFlags {
    pub id: bool,
    pub constructor: bool,
}

impl BindingFlags {
    pub const ID: Self = Self {
        id: true,
        constructor: false,
    };
    pub const CONSTRUCTOR: Self = Self {
        id: false,
        constructor: true,
    };
    pub const ID_CONSTRUCTOR: Self = Self {
        id: true,
        constructor: true,
    };
}

///
/// ResultBinding
///
/// One field binding of a result map: where the value comes from (column or
/// composite column set), what it becomes (logical type + converter), and
/// how (nested map, nested query, flags). Owned by exactly one result map
/// or discriminator case.
///

#[derive(Clone, Debug)]
pub struct ResultBinding {
    property: Option<String>,
    column: Option<String>,
    logical_type: LogicalType,
    storage_type: Option<StorageType>,
    converter: Arc<dyn Converter>,
    nested_result_map: Option<String>,
    nested_query: Option<String>,
    composites: Vec<ResultBinding>,
    flags: BindingFlags,
    lazy: bool,
}

// duplicate removal during `extends` merging compares source and target,
// never the resolved converter
impl PartialEq for ResultBinding {
    fn eq(&self, other: &Self) -> bool {
        self.property == other.property && self.column == other.column
    }
}

impl ResultBinding {
    #[must_use]
    pub fn builder(
        property: Option<String>,
        logical_type: LogicalType,
        converter: Arc<dyn Converter>,
    ) -> ResultBindingBuilder {
        ResultBindingBuilder {
            binding: Self {
                property,
                column: None,
                logical_type,
                storage_type: None,
                converter,
                nested_result_map: None,
                nested_query: None,
                composites: Vec::new(),
                flags: BindingFlags::default(),
                lazy: false,
            },
        }
    }

    #[must_use]
    pub fn property(&self) -> Option<&str> {
        self.property.as_deref()
    }

    #[must_use]
    pub fn column(&self) -> Option<&str> {
        self.column.as_deref()
    }

    #[must_use]
    pub const fn logical_type(&self) -> &LogicalType {
        &self.logical_type
    }

    #[must_use]
    pub const fn storage_type(&self) -> Option<StorageType> {
        self.storage_type
    }

    #[must_use]
    pub fn converter(&self) -> &Arc<dyn Converter> {
        &self.converter
    }

    #[must_use]
    pub fn nested_result_map(&self) -> Option<&str> {
        self.nested_result_map.as_deref()
    }

    #[must_use]
    pub fn nested_query(&self) -> Option<&str> {
        self.nested_query.as_deref()
    }

    #[must_use]
    pub fn composites(&self) -> &[ResultBinding] {
        &self.composites
    }

    #[must_use]
    pub fn is_composite(&self) -> bool {
        !self.composites.is_empty()
    }

    #[must_use]
    pub const fn flags(&self) -> BindingFlags {
        self.flags
    }

    #[must_use]
    pub const fn is_lazy(&self) -> bool {
        self.lazy
    }
}

///
/// ResultBindingBuilder
///

#[derive(Debug)]
pub struct ResultBindingBuilder {
    binding: ResultBinding,
}

impl ResultBindingBuilder {
    #[must_use]
    pub fn column(mut self, column: Option<String>) -> Self {
        self.binding.column = column;
        self
    }

    #[must_use]
    pub fn storage_type(mut self, storage_type: Option<StorageType>) -> Self {
        self.binding.storage_type = storage_type;
        self
    }

    #[must_use]
    pub fn nested_result_map(mut self, id: Option<String>) -> Self {
        self.binding.nested_result_map = id;
        self
    }

    #[must_use]
    pub fn nested_query(mut self, id: Option<String>) -> Self {
        self.binding.nested_query = id;
        self
    }

    #[must_use]
    pub fn composites(mut self, composites: Vec<ResultBinding>) -> Self {
        self.binding.composites = composites;
        self
    }

    #[must_use]
    pub const fn flags(mut self, flags: BindingFlags) -> Self {
        self.binding.flags = flags;
        self
    }

    #[must_use]
    pub const fn lazy(mut self, lazy: bool) -> Self {
        self.binding.lazy = lazy;
        self
    }

    #[must_use]
    pub fn build(self) -> ResultBinding {
        self.binding
    }
}

///
/// ParamBinding
///
/// One parameter slot of a statement: property to read, direction, and the
/// resolved conversion into the storage medium.
///

#[derive(Clone, Debug)]
pub struct ParamBinding {
    property: String,
    mode: ParamMode,
    logical_type: LogicalType,
    storage_type: Option<StorageType>,
    numeric_scale: Option<u32>,
    converter: Arc<dyn Converter>,
}

impl ParamBinding {
    #[must_use]
    pub fn new(
        property: impl Into<String>,
        logical_type: LogicalType,
        converter: Arc<dyn Converter>,
    ) -> Self {
        Self {
            property: property.into(),
            mode: ParamMode::In,
            logical_type,
            storage_type: None,
            numeric_scale: None,
            converter,
        }
    }

    #[must_use]
    pub fn mode(mut self, mode: ParamMode) -> Self {
        self.mode = mode;
        self
    }

    #[must_use]
    pub fn storage_type(mut self, storage_type: Option<StorageType>) -> Self {
        self.storage_type = storage_type;
        self
    }

    #[must_use]
    pub fn numeric_scale(mut self, scale: Option<u32>) -> Self {
        self.numeric_scale = scale;
        self
    }

    #[must_use]
    pub fn property_name(&self) -> &str {
        &self.property
    }

    #[must_use]
    pub const fn param_mode(&self) -> ParamMode {
        self.mode
    }

    #[must_use]
    pub const fn logical_type(&self) -> &LogicalType {
        &self.logical_type
    }

    #[must_use]
    pub const fn storage(&self) -> Option<StorageType> {
        self.storage_type
    }

    #[must_use]
    pub const fn scale(&self) -> Option<u32> {
        self.numeric_scale
    }

    #[must_use]
    pub fn converter(&self) -> &Arc<dyn Converter> {
        &self.converter
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::convert::TextConverter;

    fn text_binding(property: &str, column: &str) -> ResultBinding {
        ResultBinding::builder(
            Some(property.to_string()),
            LogicalType::Text,
            Arc::new(TextConverter),
        )
        .column(Some(column.to_string()))
        .build()
    }

    #[test]
    fn equality_is_by_property_and_column() {
        assert_eq!(text_binding("name", "user_name"), text_binding("name", "user_name"));
        assert_ne!(text_binding("name", "user_name"), text_binding("name", "full_name"));
        assert_ne!(text_binding("name", "user_name"), text_binding("alias", "user_name"));
    }
}
