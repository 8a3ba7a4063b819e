mod property;
mod registry;

pub use property::{PropertyPath, PropertySegment};
pub use registry::{ConstructorDef, TypeDef, TypeKind, TypeRegistry};

use derive_more::{Display, FromStr};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error as ThisError;

///
/// TypeError
///

#[derive(Debug, ThisError)]
pub enum TypeError {
    #[error("could not resolve type or alias '{name}'")]
    UnknownType { name: String },

    #[error("unknown storage type '{name}'")]
    UnknownStorageType { name: String },
}

///
/// StorageType
///
/// Persistence-medium type tag used when binding or reading a slot value.
///

#[derive(
    Clone, Copy, Debug, Deserialize, Display, Eq, FromStr, Hash, PartialEq, Serialize,
)]
#[remain::sorted]
pub enum StorageType {
    Bigint,
    Binary,
    Bit,
    Blob,
    Boolean,
    Char,
    Clob,
    Cursor,
    Date,
    Decimal,
    Double,
    Float,
    Integer,
    Numeric,
    Other,
    Real,
    Smallint,
    Time,
    Timestamp,
    Tinyint,
    Varchar,
}

///
/// LogicalType
///
/// The in-memory type of a mapped value. Scalars are closed; `Named` covers
/// every type declared in the [`TypeRegistry`] (structs, enums, interfaces).
/// `Unknown` is the inference fallback, served by the untyped converter.
///

#[derive(Clone, Debug, Deserialize, Eq, Hash, PartialEq, Serialize)]
#[remain::sorted]
pub enum LogicalType {
    Bool,
    Bytes,
    Date,
    Decimal,
    Float32,
    Float64,
    Int32,
    Int64,
    Named(String),
    Text,
    Time,
    Timestamp,
    Unknown,
}

impl LogicalType {
    #[must_use]
    pub fn named(name: impl Into<String>) -> Self {
        Self::Named(name.into())
    }

    #[must_use]
    pub const fn name(&self) -> Option<&String> {
        match self {
            Self::Named(name) => Some(name),
            _ => None,
        }
    }

    #[must_use]
    pub const fn is_named(&self) -> bool {
        matches!(self, Self::Named(_))
    }
}

impl fmt::Display for LogicalType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool => write!(f, "bool"),
            Self::Bytes => write!(f, "bytes"),
            Self::Date => write!(f, "date"),
            Self::Decimal => write!(f, "decimal"),
            Self::Float32 => write!(f, "float32"),
            Self::Float64 => write!(f, "float64"),
            Self::Int32 => write!(f, "int32"),
            Self::Int64 => write!(f, "int64"),
            Self::Named(name) => write!(f, "{name}"),
            Self::Text => write!(f, "text"),
            Self::Time => write!(f, "time"),
            Self::Timestamp => write!(f, "timestamp"),
            Self::Unknown => write!(f, "unknown"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn storage_type_parses_descriptor_spelling() {
        assert_eq!("Varchar".parse::<StorageType>().unwrap(), StorageType::Varchar);
        assert_eq!("VARCHAR".parse::<StorageType>().unwrap(), StorageType::Varchar);
        assert!("Jsonb".parse::<StorageType>().is_err());
    }

    #[test]
    fn named_types_display_their_declared_name() {
        assert_eq!(LogicalType::named("app.model.User").to_string(), "app.model.User");
        assert_eq!(LogicalType::Int64.to_string(), "int64");
    }
}
