use crate::{mapping::ParamBinding, types::LogicalType};

///
/// ParamMap
///
/// Named, ordered parameter bindings with a declared parameter type.
/// Statements without an explicit reference get an anonymous inline map.
///

#[derive(Clone, Debug)]
pub struct ParamMap {
    id: String,
    target: LogicalType,
    bindings: Vec<ParamBinding>,
}

impl ParamMap {
    #[must_use]
    pub fn new(id: impl Into<String>, target: LogicalType, bindings: Vec<ParamBinding>) -> Self {
        Self {
            id: id.into(),
            target,
            bindings,
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
    pub fn bindings(&self) -> &[ParamBinding] {
        &self.bindings
    }
}
