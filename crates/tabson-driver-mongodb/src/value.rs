//! Host-side values returned by `get_object`

use bson::Bson;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::bson_text;
use crate::type_info::BsonTypeName;

/// A BSON value handed out for columns without a single host type
///
/// Polymorphic and composite columns return this wrapper from `get_object`.
/// [`as_text`](Self::as_text) is the rendering that matches what `get_string`
/// returns for the same value, `None` included. `Display` differs for binary
/// values, which it writes as extended JSON instead of leaving empty.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BsonValue(Bson);

impl BsonValue {
    /// Host type name reported by column metadata
    pub const TYPE_NAME: &'static str = "BsonValue";

    pub fn new(value: Bson) -> Self {
        Self(value)
    }

    pub fn as_bson(&self) -> &Bson {
        &self.0
    }

    pub fn into_bson(self) -> Bson {
        self.0
    }

    pub fn type_name(&self) -> BsonTypeName {
        BsonTypeName::of_value(&self.0)
    }

    pub fn is_null(&self) -> bool {
        self.type_name().is_null_like()
    }

    /// Text of the wrapped value, `None` for null-like and binary values
    pub fn as_text(&self) -> Option<String> {
        bson_text::to_text(&self.0)
    }

    pub fn to_extended_json(&self) -> String {
        bson_text::to_extended_json(&self.0)
    }
}

impl From<Bson> for BsonValue {
    fn from(value: Bson) -> Self {
        Self(value)
    }
}

impl std::fmt::Display for BsonValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.as_text() {
            Some(text) => f.write_str(&text),
            None => f.write_str(&self.to_extended_json()),
        }
    }
}

/// A value converted to its host representation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum HostValue {
    /// SQL NULL
    Null,
    Bool(bool),
    Int32(i32),
    Int64(i64),
    Float64(f64),
    Decimal(Decimal),
    String(String),
    /// Binary data
    Bytes(Vec<u8>),
    /// Binary data with a UUID subtype
    Uuid(Uuid),
    Timestamp(DateTime<Utc>),
    /// Value of a polymorphic or composite column
    Bson(BsonValue),
}

impl HostValue {
    pub fn is_null(&self) -> bool {
        matches!(self, HostValue::Null)
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            HostValue::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            HostValue::Int32(v) => Some(*v as i64),
            HostValue::Int64(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            HostValue::Float64(v) => Some(*v),
            HostValue::Int32(v) => Some(*v as f64),
            HostValue::Int64(v) => Some(*v as f64),
            _ => None,
        }
    }

    pub fn as_bson(&self) -> Option<&BsonValue> {
        match self {
            HostValue::Bson(v) => Some(v),
            _ => None,
        }
    }
}

impl<T: Into<HostValue>> From<Option<T>> for HostValue {
    fn from(value: Option<T>) -> Self {
        value.map_or(HostValue::Null, Into::into)
    }
}

impl From<bool> for HostValue {
    fn from(v: bool) -> Self {
        HostValue::Bool(v)
    }
}

impl From<i32> for HostValue {
    fn from(v: i32) -> Self {
        HostValue::Int32(v)
    }
}

impl From<i64> for HostValue {
    fn from(v: i64) -> Self {
        HostValue::Int64(v)
    }
}

impl From<f64> for HostValue {
    fn from(v: f64) -> Self {
        HostValue::Float64(v)
    }
}

impl From<Decimal> for HostValue {
    fn from(v: Decimal) -> Self {
        HostValue::Decimal(v)
    }
}

impl From<String> for HostValue {
    fn from(v: String) -> Self {
        HostValue::String(v)
    }
}

impl From<DateTime<Utc>> for HostValue {
    fn from(v: DateTime<Utc>) -> Self {
        HostValue::Timestamp(v)
    }
}

impl std::fmt::Display for HostValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            HostValue::Null => write!(f, "NULL"),
            HostValue::Bool(v) => write!(f, "{}", v),
            HostValue::Int32(v) => write!(f, "{}", v),
            HostValue::Int64(v) => write!(f, "{}", v),
            HostValue::Float64(v) => write!(f, "{}", bson_text::format_double(*v)),
            HostValue::Decimal(v) => write!(f, "{}", v),
            HostValue::String(v) => write!(f, "{}", v),
            HostValue::Bytes(v) => write!(f, "<{} bytes>", v.len()),
            HostValue::Uuid(v) => write!(f, "{}", v),
            HostValue::Timestamp(v) => write!(f, "{}", v.format("%Y-%m-%dT%H:%M:%S%.3fZ")),
            HostValue::Bson(v) => write!(f, "{}", v),
        }
    }
}
