//! Core types for Tabson

use crate::{Result, TabsonError};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use strum::{EnumIter, IntoStaticStr};

/// SQL type codes reported through column metadata
///
/// Codes are the `java.sql.Types` constants so that values can be
/// handed to JDBC-style consumers unchanged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, IntoStaticStr)]
#[strum(serialize_all = "UPPERCASE")]
pub enum SqlType {
    Bit,
    TinyInt,
    SmallInt,
    Integer,
    BigInt,
    Float,
    Real,
    Double,
    Numeric,
    Decimal,
    Char,
    Varchar,
    LongVarchar,
    Date,
    Time,
    Timestamp,
    Binary,
    VarBinary,
    LongVarBinary,
    Null,
    Other,
    #[strum(serialize = "JAVA_OBJECT")]
    JavaObject,
    Array,
    Blob,
    Clob,
    Boolean,
}

impl SqlType {
    /// The numeric type code
    pub fn code(self) -> i32 {
        match self {
            SqlType::Bit => -7,
            SqlType::TinyInt => -6,
            SqlType::SmallInt => 5,
            SqlType::Integer => 4,
            SqlType::BigInt => -5,
            SqlType::Float => 6,
            SqlType::Real => 7,
            SqlType::Double => 8,
            SqlType::Numeric => 2,
            SqlType::Decimal => 3,
            SqlType::Char => 1,
            SqlType::Varchar => 12,
            SqlType::LongVarchar => -1,
            SqlType::Date => 91,
            SqlType::Time => 92,
            SqlType::Timestamp => 93,
            SqlType::Binary => -2,
            SqlType::VarBinary => -3,
            SqlType::LongVarBinary => -4,
            SqlType::Null => 0,
            SqlType::Other => 1111,
            SqlType::JavaObject => 2000,
            SqlType::Array => 2003,
            SqlType::Blob => 2004,
            SqlType::Clob => 2005,
            SqlType::Boolean => 16,
        }
    }

    /// Look up a type by its numeric code
    pub fn from_code(code: i32) -> Option<SqlType> {
        use strum::IntoEnumIterator;
        SqlType::iter().find(|t| t.code() == code)
    }

    /// The upper-case SQL name, e.g. `LONGVARCHAR`
    pub fn name(self) -> &'static str {
        self.into()
    }
}

impl fmt::Display for SqlType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for SqlType {
    type Err = TabsonError;

    fn from_str(s: &str) -> Result<Self> {
        use strum::IntoEnumIterator;
        SqlType::iter()
            .find(|t| t.name() == s)
            .ok_or_else(|| TabsonError::Other(format!("unknown SQL type name '{}'", s)))
    }
}

/// Column nullability as reported by result metadata
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, EnumIter,
)]
#[serde(rename_all = "snake_case")]
pub enum Nullability {
    /// The column never holds NULL
    NoNulls,
    /// The column may hold NULL
    #[default]
    Nullable,
    /// Nothing is known about the column's nullability
    Unknown,
}

impl Nullability {
    pub fn code(self) -> i32 {
        match self {
            Nullability::NoNulls => 0,
            Nullability::Nullable => 1,
            Nullability::Unknown => 2,
        }
    }

    pub fn from_code(code: i32) -> Option<Nullability> {
        match code {
            0 => Some(Nullability::NoNulls),
            1 => Some(Nullability::Nullable),
            2 => Some(Nullability::Unknown),
            _ => None,
        }
    }

    /// The `IS_NULLABLE` catalog string: `NO`, `YES`, or empty when unknown
    pub fn as_str(self) -> &'static str {
        match self {
            Nullability::NoNulls => "NO",
            Nullability::Nullable => "YES",
            Nullability::Unknown => "",
        }
    }
}

impl FromStr for Nullability {
    type Err = TabsonError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "NO" => Ok(Nullability::NoNulls),
            "YES" => Ok(Nullability::Nullable),
            "" => Ok(Nullability::Unknown),
            other => Err(TabsonError::Other(format!(
                "unknown nullability flag '{}'",
                other
            ))),
        }
    }
}

impl fmt::Display for Nullability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How accessors react to a value whose BSON type does not fit the target
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConversionMode {
    /// Fail with `InvalidTypeCoercion`
    Strict,
    /// Return the target type's zero value
    #[default]
    Relaxed,
}

impl ConversionMode {
    pub fn is_strict(self) -> bool {
        matches!(self, ConversionMode::Strict)
    }
}

impl FromStr for ConversionMode {
    type Err = TabsonError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "strict" => Ok(ConversionMode::Strict),
            "relaxed" => Ok(ConversionMode::Relaxed),
            other => Err(TabsonError::Configuration(format!(
                "unknown conversion mode '{}', expected 'strict' or 'relaxed'",
                other
            ))),
        }
    }
}

/// Where column metadata comes from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MetadataStrategy {
    /// A result schema is known before the first row is fetched
    #[default]
    SchemaKnown,
    /// Columns and types are read off each row as it arrives
    RowDerived,
}

impl MetadataStrategy {
    /// Maps a connection `dialect` property to a strategy
    pub fn from_dialect(dialect: &str) -> Result<Self> {
        match dialect.to_ascii_lowercase().as_str() {
            "mongosql" => Ok(MetadataStrategy::SchemaKnown),
            "mysql" => Ok(MetadataStrategy::RowDerived),
            other => Err(TabsonError::Configuration(format!(
                "unknown dialect '{}', expected 'mongosql' or 'mysql'",
                other
            ))),
        }
    }
}

/// A reference to a result column, either by 1-based index or by label
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnRef<'a> {
    Index(usize),
    Label(&'a str),
}

impl From<usize> for ColumnRef<'_> {
    fn from(index: usize) -> Self {
        ColumnRef::Index(index)
    }
}

impl<'a> From<&'a str> for ColumnRef<'a> {
    fn from(label: &'a str) -> Self {
        ColumnRef::Label(label)
    }
}

impl<'a> From<&'a String> for ColumnRef<'a> {
    fn from(label: &'a String) -> Self {
        ColumnRef::Label(label.as_str())
    }
}

impl fmt::Display for ColumnRef<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ColumnRef::Index(i) => write!(f, "#{}", i),
            ColumnRef::Label(l) => f.write_str(l),
        }
    }
}
