use crate::{
    error::ErrorTree,
    validate::{ValidateNode, validate_simple_id},
};
use serde::{Deserialize, Serialize};

///
/// ResultMapDescriptor
///
/// Declarative shape of one whole-object mapping: ordered child bindings,
/// optional `extends` parent reference, optional discriminator. The
/// tri-state `auto_mapping` is passed through to the compiled map untouched.
///

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct ResultMapDescriptor {
    pub id: String,
    pub type_name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extends: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auto_mapping: Option<bool>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub bindings: Vec<BindingDescriptor>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub discriminator: Option<DiscriminatorDescriptor>,
}

impl ResultMapDescriptor {
    #[must_use]
    pub fn new(id: impl Into<String>, type_name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            type_name: type_name.into(),
            extends: None,
            auto_mapping: None,
            bindings: Vec::new(),
            discriminator: None,
        }
    }
}

impl ValidateNode for ResultMapDescriptor {
    fn validate(&self) -> Result<(), ErrorTree> {
        let mut errs = ErrorTree::new();

        if let Err(e) = validate_simple_id(&self.id) {
            errs.add(e);
        }
        if self.type_name.is_empty() {
            errs.add("target type is empty");
        }
        for binding in &self.bindings {
            if let Err(tree) = binding.validate() {
                errs.merge(binding.property(), tree);
            }
        }
        if let Some(discriminator) = &self.discriminator {
            if let Err(tree) = discriminator.validate() {
                errs.merge("discriminator", tree);
            }
        }

        errs.result()
    }
}

///
/// BindingDescriptor
///
/// One child of a result map. `Id`/`IdArg` mark identifying bindings,
/// `Arg`/`IdArg` constructor arguments, `Association`/`Collection` nested
/// mappings (inline or by remote reference).
///

#[derive(Clone, Debug, Deserialize, Serialize)]
pub enum BindingDescriptor {
    Result(FieldDescriptor),
    Id(FieldDescriptor),
    Arg(FieldDescriptor),
    IdArg(FieldDescriptor),
    Association(NestedDescriptor),
    Collection(NestedDescriptor),
}

impl BindingDescriptor {
    #[must_use]
    pub fn property(&self) -> &str {
        match self {
            Self::Result(f) | Self::Id(f) | Self::Arg(f) | Self::IdArg(f) => &f.property,
            Self::Association(n) | Self::Collection(n) => &n.property,
        }
    }

    #[must_use]
    pub const fn is_constructor(&self) -> bool {
        matches!(self, Self::Arg(_) | Self::IdArg(_))
    }
}

impl ValidateNode for BindingDescriptor {
    fn validate(&self) -> Result<(), ErrorTree> {
        let mut errs = ErrorTree::new();

        if self.property().is_empty() {
            errs.add("property is empty");
        }
        if let Self::Association(nested) | Self::Collection(nested) = self {
            if nested.select.is_some() && !nested.bindings.is_empty() {
                errs.add("nested query and inline bindings are mutually exclusive");
            }
            if nested.select.is_some() && nested.result_map.is_some() {
                errs.add("nested query and result map reference are mutually exclusive");
            }
        }

        errs.result()
    }
}

///
/// FieldDescriptor
///

#[derive(Clone, Debug, Default, Deserialize, Serialize)]
pub struct FieldDescriptor {
    pub property: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub column: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub logical_type: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub storage_type: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub converter: Option<String>,
}

impl FieldDescriptor {
    #[must_use]
    pub fn new(property: impl Into<String>, column: impl Into<String>) -> Self {
        Self {
            property: property.into(),
            column: Some(column.into()),
            ..Self::default()
        }
    }
}

///
/// NestedDescriptor
///
/// An association or collection child. With `select` set, rows trigger a
/// nested query; otherwise `result_map` references a remote map or the
/// inline `bindings` compile into an anonymous one.
///

#[derive(Clone, Debug, Default, Deserialize, Serialize)]
pub struct NestedDescriptor {
    pub property: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub column: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub type_name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result_map: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub select: Option<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub bindings: Vec<BindingDescriptor>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lazy: Option<bool>,
}

///
/// DiscriminatorDescriptor
///

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct DiscriminatorDescriptor {
    pub column: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub logical_type: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub storage_type: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub converter: Option<String>,

    pub cases: Vec<DiscriminatorCaseDescriptor>,
}

impl ValidateNode for DiscriminatorDescriptor {
    fn validate(&self) -> Result<(), ErrorTree> {
        let mut errs = ErrorTree::new();

        if self.column.is_empty() {
            errs.add("control column is empty");
        }
        if self.cases.is_empty() {
            errs.add("discriminator declares no cases");
        }
        for case in &self.cases {
            if case.result_map.is_none() && case.bindings.is_empty() {
                errs.add_at(
                    &case.value,
                    "case needs a result map reference or inline bindings",
                );
            }
        }

        errs.result()
    }
}

///
/// DiscriminatorCaseDescriptor
///

#[derive(Clone, Debug, Default, Deserialize, Serialize)]
pub struct DiscriminatorCaseDescriptor {
    pub value: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result_map: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub type_name: Option<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub bindings: Vec<BindingDescriptor>,
}
