use crate::{
    convert::{
        ConvertError, Converter, ConverterMeta, from_storage_mismatch, null_storage,
        to_storage_mismatch,
    },
    types::{LogicalType, StorageType},
    value::{EnumValue, StorageValue, Value},
};
use rust_decimal::Decimal;

///
/// BoolConverter
///

#[derive(Debug, Default)]
pub struct BoolConverter;

impl Converter for BoolConverter {
    fn name(&self) -> &'static str {
        "BoolConverter"
    }

    fn meta(&self) -> ConverterMeta {
        ConverterMeta {
            logical_types: vec![LogicalType::Bool],
            ..ConverterMeta::default()
        }
    }

    fn to_storage(
        &self,
        value: &Value,
        storage: Option<StorageType>,
    ) -> Result<StorageValue, ConvertError> {
        match value {
            Value::Null => Ok(null_storage(storage, StorageType::Boolean)),
            Value::Bool(v) => Ok(StorageValue::Bool(*v)),
            other => Err(to_storage_mismatch(
                self.name(),
                other,
                storage,
                StorageType::Boolean,
            )),
        }
    }

    fn from_storage(&self, value: &StorageValue) -> Result<Value, ConvertError> {
        match value {
            StorageValue::Null(_) => Ok(Value::Null),
            StorageValue::Bool(v) => Ok(Value::Bool(*v)),
            StorageValue::I32(v) => Ok(Value::Bool(*v != 0)),
            other => Err(from_storage_mismatch(self.name(), other)),
        }
    }
}

///
/// I32Converter
///

#[derive(Debug, Default)]
pub struct I32Converter;

impl Converter for I32Converter {
    fn name(&self) -> &'static str {
        "I32Converter"
    }

    fn meta(&self) -> ConverterMeta {
        ConverterMeta {
            logical_types: vec![LogicalType::Int32],
            ..ConverterMeta::default()
        }
    }

    fn to_storage(
        &self,
        value: &Value,
        storage: Option<StorageType>,
    ) -> Result<StorageValue, ConvertError> {
        match value {
            Value::Null => Ok(null_storage(storage, StorageType::Integer)),
            Value::I32(v) => Ok(StorageValue::I32(*v)),
            other => Err(to_storage_mismatch(
                self.name(),
                other,
                storage,
                StorageType::Integer,
            )),
        }
    }

    fn from_storage(&self, value: &StorageValue) -> Result<Value, ConvertError> {
        match value {
            StorageValue::Null(_) => Ok(Value::Null),
            StorageValue::I32(v) => Ok(Value::I32(*v)),
            StorageValue::I64(v) => i32::try_from(*v).map(Value::I32).map_err(|_| {
                ConvertError::OutOfRange {
                    target: "i32",
                    value: v.to_string(),
                }
            }),
            other => Err(from_storage_mismatch(self.name(), other)),
        }
    }
}

///
/// I64Converter
///

#[derive(Debug, Default)]
pub struct I64Converter;

impl Converter for I64Converter {
    fn name(&self) -> &'static str {
        "I64Converter"
    }

    fn meta(&self) -> ConverterMeta {
        ConverterMeta {
            logical_types: vec![LogicalType::Int64],
            ..ConverterMeta::default()
        }
    }

    fn to_storage(
        &self,
        value: &Value,
        storage: Option<StorageType>,
    ) -> Result<StorageValue, ConvertError> {
        match value {
            Value::Null => Ok(null_storage(storage, StorageType::Bigint)),
            Value::I64(v) => Ok(StorageValue::I64(*v)),
            Value::I32(v) => Ok(StorageValue::I64(i64::from(*v))),
            other => Err(to_storage_mismatch(
                self.name(),
                other,
                storage,
                StorageType::Bigint,
            )),
        }
    }

    fn from_storage(&self, value: &StorageValue) -> Result<Value, ConvertError> {
        match value {
            StorageValue::Null(_) => Ok(Value::Null),
            StorageValue::I64(v) => Ok(Value::I64(*v)),
            StorageValue::I32(v) => Ok(Value::I64(i64::from(*v))),
            other => Err(from_storage_mismatch(self.name(), other)),
        }
    }
}

///
/// F32Converter
///

#[derive(Debug, Default)]
pub struct F32Converter;

impl Converter for F32Converter {
    fn name(&self) -> &'static str {
        "F32Converter"
    }

    fn meta(&self) -> ConverterMeta {
        ConverterMeta {
            logical_types: vec![LogicalType::Float32],
            ..ConverterMeta::default()
        }
    }

    fn to_storage(
        &self,
        value: &Value,
        storage: Option<StorageType>,
    ) -> Result<StorageValue, ConvertError> {
        match value {
            Value::Null => Ok(null_storage(storage, StorageType::Float)),
            Value::F32(v) => Ok(StorageValue::F32(*v)),
            other => Err(to_storage_mismatch(
                self.name(),
                other,
                storage,
                StorageType::Float,
            )),
        }
    }

    fn from_storage(&self, value: &StorageValue) -> Result<Value, ConvertError> {
        match value {
            StorageValue::Null(_) => Ok(Value::Null),
            StorageValue::F32(v) => Ok(Value::F32(*v)),
            other => Err(from_storage_mismatch(self.name(), other)),
        }
    }
}

///
/// F64Converter
///

#[derive(Debug, Default)]
pub struct F64Converter;

impl Converter for F64Converter {
    fn name(&self) -> &'static str {
        "F64Converter"
    }

    fn meta(&self) -> ConverterMeta {
        ConverterMeta {
            logical_types: vec![LogicalType::Float64],
            ..ConverterMeta::default()
        }
    }

    fn to_storage(
        &self,
        value: &Value,
        storage: Option<StorageType>,
    ) -> Result<StorageValue, ConvertError> {
        match value {
            Value::Null => Ok(null_storage(storage, StorageType::Double)),
            Value::F64(v) => Ok(StorageValue::F64(*v)),
            Value::F32(v) => Ok(StorageValue::F64(f64::from(*v))),
            other => Err(to_storage_mismatch(
                self.name(),
                other,
                storage,
                StorageType::Double,
            )),
        }
    }

    fn from_storage(&self, value: &StorageValue) -> Result<Value, ConvertError> {
        match value {
            StorageValue::Null(_) => Ok(Value::Null),
            StorageValue::F64(v) => Ok(Value::F64(*v)),
            StorageValue::F32(v) => Ok(Value::F64(f64::from(*v))),
            other => Err(from_storage_mismatch(self.name(), other)),
        }
    }
}

///
/// DecimalConverter
///

#[derive(Debug, Default)]
pub struct DecimalConverter;

impl Converter for DecimalConverter {
    fn name(&self) -> &'static str {
        "DecimalConverter"
    }

    fn meta(&self) -> ConverterMeta {
        ConverterMeta {
            logical_types: vec![LogicalType::Decimal],
            ..ConverterMeta::default()
        }
    }

    fn to_storage(
        &self,
        value: &Value,
        storage: Option<StorageType>,
    ) -> Result<StorageValue, ConvertError> {
        match value {
            Value::Null => Ok(null_storage(storage, StorageType::Decimal)),
            Value::Decimal(v) => Ok(StorageValue::Decimal(*v)),
            Value::I32(v) => Ok(StorageValue::Decimal(Decimal::from(*v))),
            Value::I64(v) => Ok(StorageValue::Decimal(Decimal::from(*v))),
            other => Err(to_storage_mismatch(
                self.name(),
                other,
                storage,
                StorageType::Decimal,
            )),
        }
    }

    fn from_storage(&self, value: &StorageValue) -> Result<Value, ConvertError> {
        match value {
            StorageValue::Null(_) => Ok(Value::Null),
            StorageValue::Decimal(v) => Ok(Value::Decimal(*v)),
            StorageValue::I32(v) => Ok(Value::Decimal(Decimal::from(*v))),
            StorageValue::I64(v) => Ok(Value::Decimal(Decimal::from(*v))),
            other => Err(from_storage_mismatch(self.name(), other)),
        }
    }
}

///
/// TextConverter
///

#[derive(Debug, Default)]
pub struct TextConverter;

impl Converter for TextConverter {
    fn name(&self) -> &'static str {
        "TextConverter"
    }

    fn meta(&self) -> ConverterMeta {
        ConverterMeta {
            logical_types: vec![LogicalType::Text],
            storage_types: vec![StorageType::Char, StorageType::Varchar],
            wildcard_storage: true,
        }
    }

    fn to_storage(
        &self,
        value: &Value,
        storage: Option<StorageType>,
    ) -> Result<StorageValue, ConvertError> {
        match value {
            Value::Null => Ok(null_storage(storage, StorageType::Varchar)),
            Value::Text(v) => Ok(StorageValue::Text(v.clone())),
            other => Err(to_storage_mismatch(
                self.name(),
                other,
                storage,
                StorageType::Varchar,
            )),
        }
    }

    fn from_storage(&self, value: &StorageValue) -> Result<Value, ConvertError> {
        match value {
            StorageValue::Null(_) => Ok(Value::Null),
            StorageValue::Text(v) => Ok(Value::Text(v.clone())),
            other => Err(from_storage_mismatch(self.name(), other)),
        }
    }
}

///
/// ClobTextConverter
///
/// Same logical shape as [`TextConverter`] but registered for the large
/// character storage type; the distinct name keeps the sole-converter
/// ambiguity guard honest.
///

#[derive(Debug, Default)]
pub struct ClobTextConverter;

impl Converter for ClobTextConverter {
    fn name(&self) -> &'static str {
        "ClobTextConverter"
    }

    fn meta(&self) -> ConverterMeta {
        ConverterMeta {
            logical_types: vec![LogicalType::Text],
            storage_types: vec![StorageType::Clob],
            wildcard_storage: false,
        }
    }

    fn to_storage(
        &self,
        value: &Value,
        storage: Option<StorageType>,
    ) -> Result<StorageValue, ConvertError> {
        match value {
            Value::Null => Ok(null_storage(storage, StorageType::Clob)),
            Value::Text(v) => Ok(StorageValue::Text(v.clone())),
            other => Err(to_storage_mismatch(
                self.name(),
                other,
                storage,
                StorageType::Clob,
            )),
        }
    }

    fn from_storage(&self, value: &StorageValue) -> Result<Value, ConvertError> {
        match value {
            StorageValue::Null(_) => Ok(Value::Null),
            StorageValue::Text(v) => Ok(Value::Text(v.clone())),
            other => Err(from_storage_mismatch(self.name(), other)),
        }
    }
}

///
/// BytesConverter
///

#[derive(Debug, Default)]
pub struct BytesConverter;

impl Converter for BytesConverter {
    fn name(&self) -> &'static str {
        "BytesConverter"
    }

    fn meta(&self) -> ConverterMeta {
        ConverterMeta {
            logical_types: vec![LogicalType::Bytes],
            ..ConverterMeta::default()
        }
    }

    fn to_storage(
        &self,
        value: &Value,
        storage: Option<StorageType>,
    ) -> Result<StorageValue, ConvertError> {
        match value {
            Value::Null => Ok(null_storage(storage, StorageType::Binary)),
            Value::Bytes(v) => Ok(StorageValue::Bytes(v.clone())),
            other => Err(to_storage_mismatch(
                self.name(),
                other,
                storage,
                StorageType::Binary,
            )),
        }
    }

    fn from_storage(&self, value: &StorageValue) -> Result<Value, ConvertError> {
        match value {
            StorageValue::Null(_) => Ok(Value::Null),
            StorageValue::Bytes(v) => Ok(Value::Bytes(v.clone())),
            other => Err(from_storage_mismatch(self.name(), other)),
        }
    }
}

///
/// BlobBytesConverter
///

#[derive(Debug, Default)]
pub struct BlobBytesConverter;

impl Converter for BlobBytesConverter {
    fn name(&self) -> &'static str {
        "BlobBytesConverter"
    }

    fn meta(&self) -> ConverterMeta {
        ConverterMeta {
            logical_types: vec![LogicalType::Bytes],
            storage_types: vec![StorageType::Blob],
            wildcard_storage: false,
        }
    }

    fn to_storage(
        &self,
        value: &Value,
        storage: Option<StorageType>,
    ) -> Result<StorageValue, ConvertError> {
        match value {
            Value::Null => Ok(null_storage(storage, StorageType::Blob)),
            Value::Bytes(v) => Ok(StorageValue::Bytes(v.clone())),
            other => Err(to_storage_mismatch(
                self.name(),
                other,
                storage,
                StorageType::Blob,
            )),
        }
    }

    fn from_storage(&self, value: &StorageValue) -> Result<Value, ConvertError> {
        match value {
            StorageValue::Null(_) => Ok(Value::Null),
            StorageValue::Bytes(v) => Ok(Value::Bytes(v.clone())),
            other => Err(from_storage_mismatch(self.name(), other)),
        }
    }
}

///
/// DateConverter
///

#[derive(Debug, Default)]
pub struct DateConverter;

impl Converter for DateConverter {
    fn name(&self) -> &'static str {
        "DateConverter"
    }

    fn meta(&self) -> ConverterMeta {
        ConverterMeta {
            logical_types: vec![LogicalType::Date],
            ..ConverterMeta::default()
        }
    }

    fn to_storage(
        &self,
        value: &Value,
        storage: Option<StorageType>,
    ) -> Result<StorageValue, ConvertError> {
        match value {
            Value::Null => Ok(null_storage(storage, StorageType::Date)),
            Value::Date(v) => Ok(StorageValue::Date(*v)),
            Value::Timestamp(v) => Ok(StorageValue::Date(v.date())),
            other => Err(to_storage_mismatch(
                self.name(),
                other,
                storage,
                StorageType::Date,
            )),
        }
    }

    fn from_storage(&self, value: &StorageValue) -> Result<Value, ConvertError> {
        match value {
            StorageValue::Null(_) => Ok(Value::Null),
            StorageValue::Date(v) => Ok(Value::Date(*v)),
            StorageValue::Timestamp(v) => Ok(Value::Date(v.date())),
            other => Err(from_storage_mismatch(self.name(), other)),
        }
    }
}

///
/// TimeConverter
///

#[derive(Debug, Default)]
pub struct TimeConverter;

impl Converter for TimeConverter {
    fn name(&self) -> &'static str {
        "TimeConverter"
    }

    fn meta(&self) -> ConverterMeta {
        ConverterMeta {
            logical_types: vec![LogicalType::Time],
            ..ConverterMeta::default()
        }
    }

    fn to_storage(
        &self,
        value: &Value,
        storage: Option<StorageType>,
    ) -> Result<StorageValue, ConvertError> {
        match value {
            Value::Null => Ok(null_storage(storage, StorageType::Time)),
            Value::Time(v) => Ok(StorageValue::Time(*v)),
            Value::Timestamp(v) => Ok(StorageValue::Time(v.time())),
            other => Err(to_storage_mismatch(
                self.name(),
                other,
                storage,
                StorageType::Time,
            )),
        }
    }

    fn from_storage(&self, value: &StorageValue) -> Result<Value, ConvertError> {
        match value {
            StorageValue::Null(_) => Ok(Value::Null),
            StorageValue::Time(v) => Ok(Value::Time(*v)),
            StorageValue::Timestamp(v) => Ok(Value::Time(v.time())),
            other => Err(from_storage_mismatch(self.name(), other)),
        }
    }
}

///
/// TimestampConverter
///

#[derive(Debug, Default)]
pub struct TimestampConverter;

impl Converter for TimestampConverter {
    fn name(&self) -> &'static str {
        "TimestampConverter"
    }

    fn meta(&self) -> ConverterMeta {
        ConverterMeta {
            logical_types: vec![LogicalType::Timestamp],
            ..ConverterMeta::default()
        }
    }

    fn to_storage(
        &self,
        value: &Value,
        storage: Option<StorageType>,
    ) -> Result<StorageValue, ConvertError> {
        match value {
            Value::Null => Ok(null_storage(storage, StorageType::Timestamp)),
            Value::Timestamp(v) => Ok(StorageValue::Timestamp(*v)),
            Value::Date(v) => Ok(StorageValue::Timestamp(v.and_hms_opt(0, 0, 0).unwrap_or_default())),
            other => Err(to_storage_mismatch(
                self.name(),
                other,
                storage,
                StorageType::Timestamp,
            )),
        }
    }

    fn from_storage(&self, value: &StorageValue) -> Result<Value, ConvertError> {
        match value {
            StorageValue::Null(_) => Ok(Value::Null),
            StorageValue::Timestamp(v) => Ok(Value::Timestamp(*v)),
            other => Err(from_storage_mismatch(self.name(), other)),
        }
    }
}

///
/// EnumNameConverter
///
/// Default converter for declared enum types: variants travel by name.
/// Bound to one exact enum type at construction; the variant snapshot is
/// taken from the declared type table.
///

#[derive(Debug)]
pub struct EnumNameConverter {
    enum_type: String,
    variants: Vec<String>,
}

impl EnumNameConverter {
    #[must_use]
    pub fn new(enum_type: impl Into<String>, variants: Vec<String>) -> Self {
        Self {
            enum_type: enum_type.into(),
            variants,
        }
    }

    #[must_use]
    pub fn enum_type(&self) -> &str {
        &self.enum_type
    }
}

impl Converter for EnumNameConverter {
    fn name(&self) -> &'static str {
        "EnumNameConverter"
    }

    fn bound_logical_type(&self) -> Option<LogicalType> {
        Some(LogicalType::named(&self.enum_type))
    }

    fn to_storage(
        &self,
        value: &Value,
        storage: Option<StorageType>,
    ) -> Result<StorageValue, ConvertError> {
        match value {
            Value::Null => Ok(null_storage(storage, StorageType::Varchar)),
            Value::Enum(e) if e.type_name == self.enum_type => {
                Ok(StorageValue::Text(e.variant.clone()))
            }
            other => Err(to_storage_mismatch(
                self.name(),
                other,
                storage,
                StorageType::Varchar,
            )),
        }
    }

    fn from_storage(&self, value: &StorageValue) -> Result<Value, ConvertError> {
        match value {
            StorageValue::Null(_) => Ok(Value::Null),
            StorageValue::Text(v) => {
                if self.variants.iter().any(|candidate| candidate == v) {
                    Ok(Value::Enum(EnumValue::new(&self.enum_type, v)))
                } else {
                    Err(ConvertError::UnknownVariant {
                        type_name: self.enum_type.clone(),
                        variant: v.clone(),
                    })
                }
            }
            other => Err(from_storage_mismatch(self.name(), other)),
        }
    }
}

///
/// UntypedConverter
///
/// Serves `Unknown` logical slots: each scalar maps to its natural storage
/// shape, enums degrade to text, containers are rejected.
///

#[derive(Debug, Default)]
pub struct UntypedConverter;

impl Converter for UntypedConverter {
    fn name(&self) -> &'static str {
        "UntypedConverter"
    }

    fn meta(&self) -> ConverterMeta {
        ConverterMeta {
            logical_types: vec![LogicalType::Unknown],
            storage_types: vec![StorageType::Other],
            wildcard_storage: true,
        }
    }

    fn to_storage(
        &self,
        value: &Value,
        storage: Option<StorageType>,
    ) -> Result<StorageValue, ConvertError> {
        match value {
            Value::Null => Ok(null_storage(storage, StorageType::Other)),
            Value::Bool(v) => Ok(StorageValue::Bool(*v)),
            Value::I32(v) => Ok(StorageValue::I32(*v)),
            Value::I64(v) => Ok(StorageValue::I64(*v)),
            Value::F32(v) => Ok(StorageValue::F32(*v)),
            Value::F64(v) => Ok(StorageValue::F64(*v)),
            Value::Decimal(v) => Ok(StorageValue::Decimal(*v)),
            Value::Text(v) => Ok(StorageValue::Text(v.clone())),
            Value::Bytes(v) => Ok(StorageValue::Bytes(v.clone())),
            Value::Date(v) => Ok(StorageValue::Date(*v)),
            Value::Time(v) => Ok(StorageValue::Time(*v)),
            Value::Timestamp(v) => Ok(StorageValue::Timestamp(*v)),
            Value::Enum(e) => Ok(StorageValue::Text(e.variant.clone())),
            other @ (Value::List(_) | Value::Map(_)) => Err(to_storage_mismatch(
                self.name(),
                other,
                storage,
                StorageType::Other,
            )),
        }
    }

    fn from_storage(&self, value: &StorageValue) -> Result<Value, ConvertError> {
        Ok(match value {
            StorageValue::Null(_) => Value::Null,
            StorageValue::Bool(v) => Value::Bool(*v),
            StorageValue::I32(v) => Value::I32(*v),
            StorageValue::I64(v) => Value::I64(*v),
            StorageValue::F32(v) => Value::F32(*v),
            StorageValue::F64(v) => Value::F64(*v),
            StorageValue::Decimal(v) => Value::Decimal(*v),
            StorageValue::Text(v) => Value::Text(v.clone()),
            StorageValue::Bytes(v) => Value::Bytes(v.clone()),
            StorageValue::Date(v) => Value::Date(*v),
            StorageValue::Time(v) => Value::Time(*v),
            StorageValue::Timestamp(v) => Value::Timestamp(*v),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn enum_converter_round_trips_declared_variants() {
        let converter =
            EnumNameConverter::new("app.model.Role", vec!["Admin".to_string(), "User".to_string()]);

        let stored = converter
            .to_storage(&Value::Enum(EnumValue::new("app.model.Role", "Admin")), None)
            .unwrap();
        assert_eq!(stored, StorageValue::Text("Admin".to_string()));

        let read = converter.from_storage(&stored).unwrap();
        assert_eq!(read, Value::Enum(EnumValue::new("app.model.Role", "Admin")));
    }

    #[test]
    fn enum_converter_rejects_unknown_variants() {
        let converter = EnumNameConverter::new("app.model.Role", vec!["Admin".to_string()]);
        let err = converter
            .from_storage(&StorageValue::Text("Ghost".to_string()))
            .unwrap_err();
        assert!(matches!(err, ConvertError::UnknownVariant { .. }));
    }

    #[test]
    fn null_values_keep_an_explicit_storage_tag() {
        let stored = I64Converter
            .to_storage(&Value::Null, Some(StorageType::Numeric))
            .unwrap();
        assert_eq!(stored, StorageValue::Null(StorageType::Numeric));

        let stored = I64Converter.to_storage(&Value::Null, None).unwrap();
        assert_eq!(stored, StorageValue::Null(StorageType::Bigint));
    }

    #[test]
    fn narrowing_reads_are_range_checked() {
        let err = I32Converter
            .from_storage(&StorageValue::I64(i64::MAX))
            .unwrap_err();
        assert!(matches!(err, ConvertError::OutOfRange { .. }));
    }
}
