use crate::{
    error::ErrorTree,
    types::ParamMode,
    validate::{ValidateNode, validate_simple_id},
};
use serde::{Deserialize, Serialize};

///
/// ParamMapDescriptor
///
/// A reusable, ordered list of parameter field bindings for statements that
/// opt out of inline parameter expressions.
///

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct ParamMapDescriptor {
    pub id: String,
    pub type_name: String,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub params: Vec<ParamDescriptor>,
}

impl ValidateNode for ParamMapDescriptor {
    fn validate(&self) -> Result<(), ErrorTree> {
        let mut errs = ErrorTree::new();

        if let Err(e) = validate_simple_id(&self.id) {
            errs.add(e);
        }
        if self.type_name.is_empty() {
            errs.add("target type is empty");
        }
        for param in &self.params {
            if param.property.is_empty() {
                errs.add("parameter property is empty");
            }
        }

        errs.result()
    }
}

///
/// ParamDescriptor
///

#[derive(Clone, Debug, Default, Deserialize, Serialize)]
pub struct ParamDescriptor {
    pub property: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub logical_type: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub storage_type: Option<String>,

    #[serde(default)]
    pub mode: ParamMode,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub numeric_scale: Option<u32>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub converter: Option<String>,
}

impl ParamDescriptor {
    #[must_use]
    pub fn new(property: impl Into<String>) -> Self {
        Self {
            property: property.into(),
            ..Self::default()
        }
    }
}
