mod builtin;
mod registry;

pub use builtin::{
    BlobBytesConverter, BoolConverter, BytesConverter, ClobTextConverter, DateConverter,
    DecimalConverter, EnumNameConverter, F32Converter, F64Converter, I32Converter, I64Converter,
    TextConverter, TimeConverter, TimestampConverter, UntypedConverter,
};
pub use registry::{ConverterFactory, ConverterRegistry};

use crate::{
    types::{LogicalType, StorageType},
    value::{StorageValue, Value},
};
use std::fmt;
use thiserror::Error as ThisError;

///
/// ConverterError
///
/// Registration/construction failures. Always fatal; surfaced through the
/// builder error.
///

#[derive(Debug, ThisError)]
pub enum ConverterError {
    #[error("unknown converter '{name}'")]
    Unknown { name: String },

    #[error("failed constructing converter '{name}': {reason}")]
    Construction { name: String, reason: String },
}

///
/// ConvertError
///
/// Runtime conversion failure between a logical value and a storage slot.
///

#[derive(Debug, ThisError)]
pub enum ConvertError {
    #[error("converter '{converter}' cannot write {found} as storage type {storage}")]
    ToStorage {
        converter: &'static str,
        found: String,
        storage: StorageType,
    },

    #[error("converter '{converter}' cannot read storage value {found}")]
    FromStorage {
        converter: &'static str,
        found: String,
    },

    #[error("value out of range for {target}: {value}")]
    OutOfRange { target: &'static str, value: String },

    #[error("unknown variant '{variant}' for enum '{type_name}'")]
    UnknownVariant { type_name: String, variant: String },
}

///
/// ConverterMeta
///
/// Declared registration targets. An empty storage list registers the
/// converter under the wildcard storage slot; a non-empty list registers
/// each entry, plus the wildcard only when `wildcard_storage` is set.
///

#[derive(Clone, Debug, Default)]
pub struct ConverterMeta {
    pub logical_types: Vec<LogicalType>,
    pub storage_types: Vec<StorageType>,
    pub wildcard_storage: bool,
}

///
/// Converter
///
/// Bidirectional logic between one logical type and one or more storage
/// types. `name` is the registry identity used for name-based relookup and
/// for the sole-converter ambiguity guard.
///

pub trait Converter: fmt::Debug + Send + Sync {
    fn name(&self) -> &'static str;

    fn meta(&self) -> ConverterMeta {
        ConverterMeta::default()
    }

    /// The logical type this instance is bound to, when the converter's own
    /// construction pins one (the generic-parameterization analog).
    fn bound_logical_type(&self) -> Option<LogicalType> {
        None
    }

    fn to_storage(
        &self,
        value: &Value,
        storage: Option<StorageType>,
    ) -> Result<StorageValue, ConvertError>;

    fn from_storage(&self, value: &StorageValue) -> Result<Value, ConvertError>;
}

// Shared null handling: absent values keep an explicit storage tag.
pub(crate) fn null_storage(storage: Option<StorageType>, default: StorageType) -> StorageValue {
    StorageValue::Null(storage.unwrap_or(default))
}

pub(crate) fn to_storage_mismatch(
    converter: &'static str,
    value: &Value,
    storage: Option<StorageType>,
    default: StorageType,
) -> ConvertError {
    ConvertError::ToStorage {
        converter,
        found: format!("{value:?}"),
        storage: storage.unwrap_or(default),
    }
}

pub(crate) fn from_storage_mismatch(converter: &'static str, value: &StorageValue) -> ConvertError {
    ConvertError::FromStorage {
        converter,
        found: format!("{value:?}"),
    }
}
