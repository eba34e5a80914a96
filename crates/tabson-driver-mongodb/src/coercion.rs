//! Conversion of BSON values to host types
//!
//! One [`Coercion`] serves both conversion modes. Null and undefined always
//! convert to the target's zero value. Any other value the target cannot
//! represent fails with `InvalidTypeCoercion` in strict mode and converts to
//! the zero value in relaxed mode.

use bson::spec::BinarySubtype;
use bson::{Bson, Decimal128};
use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use std::str::FromStr;
use tabson_core::{ConversionMode, Result, TabsonError};
use uuid::Uuid;

use crate::bson_text;
use crate::type_info::{BsonTypeInfo, BsonTypeName};
use crate::value::{BsonValue, HostValue};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Coercion {
    mode: ConversionMode,
}

fn is_null(value: &Bson) -> bool {
    matches!(value, Bson::Null | Bson::Undefined)
}

impl Coercion {
    pub fn new(mode: ConversionMode) -> Self {
        Self { mode }
    }

    pub fn mode(&self) -> ConversionMode {
        self.mode
    }

    fn mismatch<T>(&self, value: &Bson, target: &str, zero: T) -> Result<T> {
        if self.mode.is_strict() {
            return Err(TabsonError::coercion(
                BsonTypeName::of_value(value).as_str(),
                target,
            ));
        }
        Ok(zero)
    }

    pub fn to_string(&self, value: &Bson) -> Result<Option<String>> {
        match value {
            Bson::Binary(_) => self.mismatch(value, "string", None),
            other => Ok(bson_text::to_text(other)),
        }
    }

    /// Strings are always true, numbers are true when non-zero
    pub fn to_boolean(&self, value: &Bson) -> Result<bool> {
        match value {
            Bson::Null | Bson::Undefined => Ok(false),
            Bson::Boolean(b) => Ok(*b),
            Bson::String(_) => Ok(true),
            Bson::Int32(v) => Ok(*v != 0),
            Bson::Int64(v) => Ok(*v != 0),
            Bson::Double(v) => Ok(*v != 0.0),
            Bson::Decimal128(v) => Ok(decimal128_to_f64(v).is_some_and(|f| f != 0.0)),
            Bson::DateTime(dt) => Ok(dt.timestamp_millis() != 0),
            other => self.mismatch(other, "boolean", false),
        }
    }

    pub fn to_long(&self, value: &Bson) -> Result<i64> {
        match value {
            Bson::Null | Bson::Undefined => Ok(0),
            Bson::Boolean(b) => Ok(*b as i64),
            Bson::Int32(v) => Ok(*v as i64),
            Bson::Int64(v) => Ok(*v),
            Bson::Double(v) => Ok(*v as i64),
            Bson::DateTime(dt) => Ok(dt.timestamp_millis()),
            Bson::Decimal128(v) => match decimal128_to_i64(v) {
                Some(n) => Ok(n),
                None => self.mismatch(value, "long", 0),
            },
            other => self.mismatch(other, "long", 0),
        }
    }

    /// Narrowing conversions truncate like a two's complement cast
    pub fn to_int(&self, value: &Bson) -> Result<i32> {
        self.narrow(value, "int").map(|v| v as i32)
    }

    pub fn to_short(&self, value: &Bson) -> Result<i16> {
        self.narrow(value, "short").map(|v| v as i16)
    }

    pub fn to_byte(&self, value: &Bson) -> Result<i8> {
        self.narrow(value, "byte").map(|v| v as i8)
    }

    fn narrow(&self, value: &Bson, target: &str) -> Result<i64> {
        self.to_long(value).map_err(|e| retarget(e, target))
    }

    pub fn to_double(&self, value: &Bson) -> Result<f64> {
        match value {
            Bson::Null | Bson::Undefined => Ok(0.0),
            Bson::Boolean(b) => Ok(if *b { 1.0 } else { 0.0 }),
            Bson::Int32(v) => Ok(*v as f64),
            Bson::Int64(v) => Ok(*v as f64),
            Bson::Double(v) => Ok(*v),
            Bson::DateTime(dt) => Ok(dt.timestamp_millis() as f64),
            Bson::Decimal128(v) => match decimal128_to_f64(v) {
                Some(f) => Ok(f),
                None => self.mismatch(value, "double", 0.0),
            },
            other => self.mismatch(other, "double", 0.0),
        }
    }

    pub fn to_float(&self, value: &Bson) -> Result<f32> {
        self.to_double(value)
            .map(|v| v as f32)
            .map_err(|e| retarget(e, "float"))
    }

    pub fn to_decimal(&self, value: &Bson) -> Result<Decimal> {
        let converted = match value {
            Bson::Null | Bson::Undefined => Some(Decimal::ZERO),
            Bson::Boolean(b) => Some(if *b { Decimal::ONE } else { Decimal::ZERO }),
            Bson::Int32(v) => Some(Decimal::from(*v)),
            Bson::Int64(v) => Some(Decimal::from(*v)),
            Bson::Double(v) => Decimal::try_from(*v).ok(),
            Bson::DateTime(dt) => Some(Decimal::from(dt.timestamp_millis())),
            Bson::Decimal128(v) => decimal128_to_decimal(v),
            _ => None,
        };
        match converted {
            Some(d) => Ok(d),
            None => self.mismatch(value, "decimal", Decimal::ZERO),
        }
    }

    pub fn to_bytes(&self, value: &Bson) -> Result<Option<Vec<u8>>> {
        match value {
            Bson::Null | Bson::Undefined => Ok(None),
            Bson::Binary(binary) => Ok(Some(binary.bytes.clone())),
            other => self.mismatch(other, "bytes", None),
        }
    }

    /// Dates convert directly, numbers are read as epoch milliseconds
    pub fn to_timestamp(&self, value: &Bson) -> Result<Option<DateTime<Utc>>> {
        let millis = match value {
            Bson::Null | Bson::Undefined => return Ok(None),
            Bson::DateTime(dt) => Some(dt.timestamp_millis()),
            Bson::Int32(v) => Some(*v as i64),
            Bson::Int64(v) => Some(*v),
            Bson::Double(v) => Some(*v as i64),
            Bson::Decimal128(v) => decimal128_to_i64(v),
            _ => None,
        };
        match millis.and_then(DateTime::<Utc>::from_timestamp_millis) {
            Some(ts) => Ok(Some(ts)),
            None => self.mismatch(value, "timestamp", None),
        }
    }

    pub fn to_date(&self, value: &Bson) -> Result<Option<NaiveDate>> {
        self.to_timestamp(value)
            .map(|ts| ts.map(|ts| ts.date_naive()))
            .map_err(|e| retarget(e, "date"))
    }

    pub fn to_time(&self, value: &Bson) -> Result<Option<NaiveTime>> {
        self.to_timestamp(value)
            .map(|ts| ts.map(|ts| ts.time()))
            .map_err(|e| retarget(e, "time"))
    }

    /// Host value for a column declared with `declared` type
    ///
    /// Polymorphic and composite columns yield the value wrapped in
    /// [`BsonValue`]; other columns convert with the accessor for their type.
    pub fn to_object(&self, value: &Bson, declared: &BsonTypeInfo) -> Result<HostValue> {
        if is_null(value) {
            return Ok(HostValue::Null);
        }
        let Ok(name) = declared.name.parse::<BsonTypeName>() else {
            return Ok(HostValue::Bson(BsonValue::new(value.clone())));
        };
        Ok(match name {
            BsonTypeName::Int => self.to_int(value)?.into(),
            BsonTypeName::Long => self.to_long(value)?.into(),
            BsonTypeName::Double => self.to_double(value)?.into(),
            BsonTypeName::Decimal => self.to_decimal(value)?.into(),
            BsonTypeName::Bool => self.to_boolean(value)?.into(),
            BsonTypeName::String | BsonTypeName::ObjectId => self.to_string(value)?.into(),
            BsonTypeName::Date => self.to_timestamp(value)?.into(),
            BsonTypeName::BinData => match value {
                Bson::Binary(binary)
                    if matches!(binary.subtype, BinarySubtype::Uuid | BinarySubtype::UuidOld) =>
                {
                    match Uuid::from_slice(&binary.bytes) {
                        Ok(uuid) => HostValue::Uuid(uuid),
                        Err(_) => HostValue::Bytes(binary.bytes.clone()),
                    }
                }
                other => self.to_bytes(other)?.map_or(HostValue::Null, HostValue::Bytes),
            },
            BsonTypeName::Null => HostValue::Null,
            _ => HostValue::Bson(BsonValue::new(value.clone())),
        })
    }
}

/// Names the accessor actually called in a coercion error
fn retarget(e: TabsonError, target: &str) -> TabsonError {
    match e {
        TabsonError::InvalidTypeCoercion { from, .. } => TabsonError::coercion(from, target),
        other => other,
    }
}

fn decimal128_to_decimal(v: &Decimal128) -> Option<Decimal> {
    let text = v.to_string();
    Decimal::from_str(&text)
        .or_else(|_| Decimal::from_scientific(&text))
        .ok()
}

fn decimal128_to_f64(v: &Decimal128) -> Option<f64> {
    v.to_string().parse::<f64>().ok()
}

fn decimal128_to_i64(v: &Decimal128) -> Option<i64> {
    match decimal128_to_decimal(v) {
        Some(d) => d.trunc().to_i64(),
        None => decimal128_to_f64(v).filter(|f| !f.is_nan()).map(|f| f as i64),
    }
}
