use crate::types::{LogicalType, StorageType};
use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use xxhash_rust::xxh3::Xxh3;

///
/// Value
///
/// A logical (application-level) value as seen by converters and the
/// executor collaborator. `Map` doubles as the generic parameter-object
/// shape for statements without a declared parameter type.
///

#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub enum Value {
    Null,
    Bool(bool),
    I32(i32),
    I64(i64),
    F32(f32),
    F64(f64),
    Decimal(Decimal),
    Text(String),
    Bytes(Vec<u8>),
    Date(NaiveDate),
    Time(NaiveTime),
    Timestamp(NaiveDateTime),
    Enum(EnumValue),
    List(Vec<Value>),
    Map(BTreeMap<String, Value>),
}

impl Value {
    #[must_use]
    pub const fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// The logical type this value inhabits. `Null`, `List`, and `Map`
    /// carry no type of their own and report `Unknown`.
    #[must_use]
    pub fn logical_type(&self) -> LogicalType {
        match self {
            Self::Bool(_) => LogicalType::Bool,
            Self::I32(_) => LogicalType::Int32,
            Self::I64(_) => LogicalType::Int64,
            Self::F32(_) => LogicalType::Float32,
            Self::F64(_) => LogicalType::Float64,
            Self::Decimal(_) => LogicalType::Decimal,
            Self::Text(_) => LogicalType::Text,
            Self::Bytes(_) => LogicalType::Bytes,
            Self::Date(_) => LogicalType::Date,
            Self::Time(_) => LogicalType::Time,
            Self::Timestamp(_) => LogicalType::Timestamp,
            Self::Enum(e) => LogicalType::named(&e.type_name),
            Self::Null | Self::List(_) | Self::Map(_) => LogicalType::Unknown,
        }
    }

    /// Fetch a field of a `Map` parameter object.
    #[must_use]
    pub fn field(&self, name: &str) -> Option<&Self> {
        match self {
            Self::Map(map) => map.get(name),
            _ => None,
        }
    }

    /// Stable content hash used for executor cache keys.
    #[must_use]
    pub fn stable_hash(&self) -> u64 {
        let mut hasher = Xxh3::new();
        self.write_canonical(&mut hasher);
        hasher.digest()
    }

    // Tag byte plus canonical little-endian payload per variant; containers
    // recurse so nesting order is part of the hash.
    fn write_canonical(&self, hasher: &mut Xxh3) {
        match self {
            Self::Null => hasher.update(&[0]),
            Self::Bool(v) => {
                hasher.update(&[1, u8::from(*v)]);
            }
            Self::I32(v) => {
                hasher.update(&[2]);
                hasher.update(&v.to_le_bytes());
            }
            Self::I64(v) => {
                hasher.update(&[3]);
                hasher.update(&v.to_le_bytes());
            }
            Self::F32(v) => {
                hasher.update(&[4]);
                hasher.update(&v.to_bits().to_le_bytes());
            }
            Self::F64(v) => {
                hasher.update(&[5]);
                hasher.update(&v.to_bits().to_le_bytes());
            }
            Self::Decimal(v) => {
                hasher.update(&[6]);
                hasher.update(&v.serialize());
            }
            Self::Text(v) => {
                hasher.update(&[7]);
                hasher.update(v.as_bytes());
            }
            Self::Bytes(v) => {
                hasher.update(&[8]);
                hasher.update(v);
            }
            Self::Date(v) => {
                hasher.update(&[9]);
                hasher.update(v.to_string().as_bytes());
            }
            Self::Time(v) => {
                hasher.update(&[10]);
                hasher.update(v.to_string().as_bytes());
            }
            Self::Timestamp(v) => {
                hasher.update(&[11]);
                hasher.update(&v.and_utc().timestamp_micros().to_le_bytes());
            }
            Self::Enum(e) => {
                hasher.update(&[12]);
                hasher.update(e.type_name.as_bytes());
                hasher.update(&[0]);
                hasher.update(e.variant.as_bytes());
            }
            Self::List(items) => {
                hasher.update(&[13]);
                for item in items {
                    item.write_canonical(hasher);
                }
            }
            Self::Map(map) => {
                hasher.update(&[14]);
                for (key, item) in map {
                    hasher.update(key.as_bytes());
                    hasher.update(&[0]);
                    item.write_canonical(hasher);
                }
            }
        }
    }
}

///
/// EnumValue
///
/// A variant of a declared enum type, carried by name.
///

#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct EnumValue {
    pub type_name: String,
    pub variant: String,
}

impl EnumValue {
    #[must_use]
    pub fn new(type_name: impl Into<String>, variant: impl Into<String>) -> Self {
        Self {
            type_name: type_name.into(),
            variant: variant.into(),
        }
    }
}

///
/// StorageValue
///
/// A storage-medium value as bound to (or read from) a statement slot.
/// `Null` keeps its storage type tag so binding layers can emit the right
/// wire format for absent values.
///

#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub enum StorageValue {
    Null(StorageType),
    Bool(bool),
    I32(i32),
    I64(i64),
    F32(f32),
    F64(f64),
    Decimal(Decimal),
    Text(String),
    Bytes(Vec<u8>),
    Date(NaiveDate),
    Time(NaiveTime),
    Timestamp(NaiveDateTime),
}

impl StorageValue {
    #[must_use]
    pub const fn is_null(&self) -> bool {
        matches!(self, Self::Null(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stable_hash_distinguishes_values_and_types() {
        assert_eq!(Value::I64(1).stable_hash(), Value::I64(1).stable_hash());
        assert_ne!(Value::I64(1).stable_hash(), Value::I64(2).stable_hash());
        assert_ne!(Value::I64(1).stable_hash(), Value::I32(1).stable_hash());
        assert_ne!(
            Value::Text("1".to_string()).stable_hash(),
            Value::I64(1).stable_hash()
        );
    }

    #[test]
    fn map_fields_are_reachable_for_parameter_objects() {
        let mut fields = BTreeMap::new();
        fields.insert("id".to_string(), Value::I64(7));
        let param = Value::Map(fields);

        assert_eq!(param.field("id"), Some(&Value::I64(7)));
        assert_eq!(param.field("missing"), None);
    }

    #[test]
    fn enum_values_report_their_declared_type() {
        let value = Value::Enum(EnumValue::new("app.model.Role", "Admin"));
        assert_eq!(value.logical_type(), LogicalType::named("app.model.Role"));
    }

    #[test]
    fn values_round_trip_through_serde() {
        let mut fields = BTreeMap::new();
        fields.insert("id".to_string(), Value::I64(7));
        fields.insert("name".to_string(), Value::Text("ada".to_string()));
        let value = Value::List(vec![Value::Map(fields), Value::Null]);

        let json = serde_json::to_string(&value).expect("value serializes");
        let back: Value = serde_json::from_str(&json).expect("value deserializes");
        assert_eq!(back, value);
    }
}
