use serde::{Deserialize, Serialize};

///
/// ConverterDescriptor
///
/// Registers a named converter for a (logical type, storage type) pair.
/// Either side of the pair may be omitted; the converter's own declared
/// metadata then drives registration.
///

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct ConverterDescriptor {
    pub converter: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub logical_type: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub storage_type: Option<String>,
}
