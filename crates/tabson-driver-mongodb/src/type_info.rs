//! Static relational attributes of BSON types
//!
//! Every BSON type has exactly one [`BsonTypeInfo`] entry describing how a
//! column of that type is reported through result metadata. Columns whose
//! values may take more than one BSON type are reported under the synthetic
//! `bson` entry.

use bson::Bson;
use std::fmt;
use std::str::FromStr;
use strum::{EnumIter, IntoStaticStr};
use tabson_core::{MetadataStrategy, Result, SqlType, TabsonError};

use crate::value::BsonValue;

/// Canonical BSON type names as they appear in `bsonType`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, EnumIter, IntoStaticStr)]
pub enum BsonTypeName {
    #[strum(serialize = "double")]
    Double,
    #[strum(serialize = "string")]
    String,
    #[strum(serialize = "object")]
    Object,
    #[strum(serialize = "array")]
    Array,
    #[strum(serialize = "binData")]
    BinData,
    #[strum(serialize = "undefined")]
    Undefined,
    #[strum(serialize = "objectId")]
    ObjectId,
    #[strum(serialize = "bool")]
    Bool,
    #[strum(serialize = "date")]
    Date,
    #[strum(serialize = "null")]
    Null,
    #[strum(serialize = "regex")]
    Regex,
    #[strum(serialize = "dbPointer")]
    DbPointer,
    #[strum(serialize = "javascript")]
    JavaScript,
    #[strum(serialize = "symbol")]
    Symbol,
    #[strum(serialize = "javascriptWithScope")]
    JavaScriptWithScope,
    #[strum(serialize = "int")]
    Int,
    #[strum(serialize = "timestamp")]
    Timestamp,
    #[strum(serialize = "long")]
    Long,
    #[strum(serialize = "decimal")]
    Decimal,
    #[strum(serialize = "minKey")]
    MinKey,
    #[strum(serialize = "maxKey")]
    MaxKey,
}

impl BsonTypeName {
    pub fn as_str(self) -> &'static str {
        self.into()
    }

    /// The type of a concrete value
    pub fn of_value(value: &Bson) -> BsonTypeName {
        match value {
            Bson::Double(_) => BsonTypeName::Double,
            Bson::String(_) => BsonTypeName::String,
            Bson::Document(_) => BsonTypeName::Object,
            Bson::Array(_) => BsonTypeName::Array,
            Bson::Binary(_) => BsonTypeName::BinData,
            Bson::Undefined => BsonTypeName::Undefined,
            Bson::ObjectId(_) => BsonTypeName::ObjectId,
            Bson::Boolean(_) => BsonTypeName::Bool,
            Bson::DateTime(_) => BsonTypeName::Date,
            Bson::Null => BsonTypeName::Null,
            Bson::RegularExpression(_) => BsonTypeName::Regex,
            Bson::DbPointer(_) => BsonTypeName::DbPointer,
            Bson::JavaScriptCode(_) => BsonTypeName::JavaScript,
            Bson::Symbol(_) => BsonTypeName::Symbol,
            Bson::JavaScriptCodeWithScope(_) => BsonTypeName::JavaScriptWithScope,
            Bson::Int32(_) => BsonTypeName::Int,
            Bson::Timestamp(_) => BsonTypeName::Timestamp,
            Bson::Int64(_) => BsonTypeName::Long,
            Bson::Decimal128(_) => BsonTypeName::Decimal,
            Bson::MinKey => BsonTypeName::MinKey,
            Bson::MaxKey => BsonTypeName::MaxKey,
        }
    }

    /// Null and undefined both read as SQL NULL
    pub fn is_null_like(self) -> bool {
        matches!(self, BsonTypeName::Null | BsonTypeName::Undefined)
    }
}

impl fmt::Display for BsonTypeName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BsonTypeName {
    type Err = TabsonError;

    fn from_str(s: &str) -> Result<Self> {
        use strum::IntoEnumIterator;
        BsonTypeName::iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| TabsonError::InvalidTypeName(s.to_string()))
    }
}

/// Relational attributes reported for a column of one BSON type
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BsonTypeInfo {
    /// Type name reported as the column type name
    pub name: &'static str,
    pub sql_type: SqlType,
    pub display_size: u32,
    pub precision: u32,
    pub scale: u32,
    pub signed: bool,
    pub case_sensitive: bool,
    /// Host type returned by `get_object`, `None` for the null type
    pub host_class: Option<&'static str>,
}

/// Leading decimal digits reported for `decimal` when a result schema is known
pub const DECIMAL_PRECISION_SCHEMA_KNOWN: u32 = 6145;
/// Leading decimal digits reported for `decimal` when types come from rows
pub const DECIMAL_PRECISION_ROW_DERIVED: u32 = 11;

/// Type name of columns that may hold values of several BSON types
pub const POLYMORPHIC_TYPE_NAME: &str = "bson";

const fn entry(
    name: &'static str,
    sql_type: SqlType,
    display_size: u32,
    scale: u32,
    signed: bool,
    case_sensitive: bool,
    host_class: Option<&'static str>,
) -> BsonTypeInfo {
    BsonTypeInfo {
        name,
        sql_type,
        display_size,
        precision: display_size,
        scale,
        signed,
        case_sensitive,
        host_class,
    }
}

const fn other(name: &'static str, case_sensitive: bool) -> BsonTypeInfo {
    entry(
        name,
        SqlType::Other,
        0,
        0,
        false,
        case_sensitive,
        Some(BsonValue::TYPE_NAME),
    )
}

pub static BSON_DOUBLE: BsonTypeInfo =
    entry("double", SqlType::Double, 15, 15, true, false, Some("f64"));
pub static BSON_STRING: BsonTypeInfo =
    entry("string", SqlType::LongVarchar, 0, 0, false, true, Some("String"));
pub static BSON_INT: BsonTypeInfo =
    entry("int", SqlType::Integer, 10, 0, true, false, Some("i32"));
// 64-bit values keep the 32-bit INTEGER code that existing consumers expect.
pub static BSON_LONG: BsonTypeInfo =
    entry("long", SqlType::Integer, 19, 0, true, false, Some("i64"));
pub static BSON_DECIMAL: BsonTypeInfo = entry(
    "decimal",
    SqlType::Decimal,
    34,
    34,
    true,
    false,
    Some("rust_decimal::Decimal"),
);
pub static BSON_OBJECT_ID: BsonTypeInfo =
    entry("objectId", SqlType::LongVarchar, 24, 0, false, false, Some("String"));
pub static BSON_DATE: BsonTypeInfo = entry(
    "date",
    SqlType::Timestamp,
    24,
    0,
    false,
    false,
    Some("chrono::DateTime<Utc>"),
);
pub static BSON_BOOL: BsonTypeInfo =
    entry("bool", SqlType::Bit, 1, 0, false, false, Some("bool"));
pub static BSON_BIN_DATA: BsonTypeInfo =
    entry("binData", SqlType::Blob, 0, 0, false, false, Some("Vec<u8>"));
pub static BSON_NULL: BsonTypeInfo = entry("null", SqlType::Null, 0, 0, false, false, None);
pub static BSON_ANY: BsonTypeInfo = BsonTypeInfo {
    signed: true,
    ..other(POLYMORPHIC_TYPE_NAME, false)
};

pub static BSON_OBJECT: BsonTypeInfo = other("object", false);
pub static BSON_ARRAY: BsonTypeInfo = other("array", false);
pub static BSON_UNDEFINED: BsonTypeInfo = other("undefined", false);
pub static BSON_REGEX: BsonTypeInfo = other("regex", true);
pub static BSON_DB_POINTER: BsonTypeInfo = other("dbPointer", false);
pub static BSON_JAVASCRIPT: BsonTypeInfo = other("javascript", true);
pub static BSON_SYMBOL: BsonTypeInfo = other("symbol", true);
pub static BSON_JAVASCRIPT_WITH_SCOPE: BsonTypeInfo = other("javascriptWithScope", true);
pub static BSON_TIMESTAMP: BsonTypeInfo = other("timestamp", false);
pub static BSON_MIN_KEY: BsonTypeInfo = other("minKey", false);
pub static BSON_MAX_KEY: BsonTypeInfo = other("maxKey", false);

/// All registered entries, including the polymorphic `bson` entry
pub static TYPE_INFOS: [&BsonTypeInfo; 22] = [
    &BSON_DOUBLE,
    &BSON_STRING,
    &BSON_OBJECT,
    &BSON_ARRAY,
    &BSON_BIN_DATA,
    &BSON_UNDEFINED,
    &BSON_OBJECT_ID,
    &BSON_BOOL,
    &BSON_DATE,
    &BSON_NULL,
    &BSON_REGEX,
    &BSON_DB_POINTER,
    &BSON_JAVASCRIPT,
    &BSON_SYMBOL,
    &BSON_JAVASCRIPT_WITH_SCOPE,
    &BSON_INT,
    &BSON_TIMESTAMP,
    &BSON_LONG,
    &BSON_DECIMAL,
    &BSON_MIN_KEY,
    &BSON_MAX_KEY,
    &BSON_ANY,
];

impl BsonTypeInfo {
    /// Look up an entry by type name, `bson` included
    pub fn lookup(name: &str) -> Result<&'static BsonTypeInfo> {
        TYPE_INFOS
            .iter()
            .copied()
            .find(|info| info.name == name)
            .ok_or_else(|| TabsonError::InvalidTypeName(name.to_string()))
    }

    pub fn of(name: BsonTypeName) -> &'static BsonTypeInfo {
        match name {
            BsonTypeName::Double => &BSON_DOUBLE,
            BsonTypeName::String => &BSON_STRING,
            BsonTypeName::Object => &BSON_OBJECT,
            BsonTypeName::Array => &BSON_ARRAY,
            BsonTypeName::BinData => &BSON_BIN_DATA,
            BsonTypeName::Undefined => &BSON_UNDEFINED,
            BsonTypeName::ObjectId => &BSON_OBJECT_ID,
            BsonTypeName::Bool => &BSON_BOOL,
            BsonTypeName::Date => &BSON_DATE,
            BsonTypeName::Null => &BSON_NULL,
            BsonTypeName::Regex => &BSON_REGEX,
            BsonTypeName::DbPointer => &BSON_DB_POINTER,
            BsonTypeName::JavaScript => &BSON_JAVASCRIPT,
            BsonTypeName::Symbol => &BSON_SYMBOL,
            BsonTypeName::JavaScriptWithScope => &BSON_JAVASCRIPT_WITH_SCOPE,
            BsonTypeName::Int => &BSON_INT,
            BsonTypeName::Timestamp => &BSON_TIMESTAMP,
            BsonTypeName::Long => &BSON_LONG,
            BsonTypeName::Decimal => &BSON_DECIMAL,
            BsonTypeName::MinKey => &BSON_MIN_KEY,
            BsonTypeName::MaxKey => &BSON_MAX_KEY,
        }
    }

    /// The entry for a concrete value's own type
    pub fn of_value(value: &Bson) -> &'static BsonTypeInfo {
        Self::of(BsonTypeName::of_value(value))
    }

    /// The entry used for columns whose values may take several types
    pub fn polymorphic() -> &'static BsonTypeInfo {
        &BSON_ANY
    }

    pub fn is_polymorphic(&self) -> bool {
        self.name == POLYMORPHIC_TYPE_NAME
    }

    /// Precision as reported under the given metadata strategy
    ///
    /// Only `decimal` differs between strategies.
    pub fn precision_for(&self, strategy: MetadataStrategy) -> u32 {
        if self.sql_type != SqlType::Decimal {
            return self.precision;
        }
        match strategy {
            MetadataStrategy::SchemaKnown => DECIMAL_PRECISION_SCHEMA_KNOWN,
            MetadataStrategy::RowDerived => DECIMAL_PRECISION_ROW_DERIVED,
        }
    }
}
