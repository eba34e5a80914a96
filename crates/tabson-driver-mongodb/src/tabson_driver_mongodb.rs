//! Typed tabular access to MongoDB query results
//!
//! This crate bridges per-value dynamic BSON types and the fixed per-column
//! types a relational caller expects. It provides:
//!
//! - A static registry of BSON type attributes (`BsonTypeInfo`)
//! - A canonical result schema model and simplifier (`JsonSchema`)
//! - Column metadata derived from a known schema or from each row
//! - Strict and relaxed conversion of values to host types
//! - A forward-only `ResultSet` over any `DocumentCursor`
//!
//! # Example
//!
//! ```ignore
//! use tabson_driver_mongodb::{ResultSet, ResultSchema, VecCursor};
//! use tabson_core::ResultSetOptions;
//!
//! let schema = ResultSchema::from_document(&schema_doc)?;
//! let mut rs = ResultSet::with_schema(VecCursor::new(docs), &schema, ResultSetOptions::new())?;
//! while rs.next()? {
//!     println!("{:?}", rs.get_string("name")?);
//! }
//! ```

pub mod bson_text;
#[cfg(test)]
mod bson_text_tests;
mod coercion;
#[cfg(test)]
mod coercion_tests;
mod cursor;
#[cfg(test)]
mod cursor_tests;
mod json_schema;
#[cfg(test)]
mod json_schema_tests;
mod metadata;
#[cfg(test)]
mod metadata_tests;
#[cfg(feature = "mongodb")]
mod mongo;
mod result_set;
#[cfg(test)]
mod result_set_tests;
mod type_info;
#[cfg(test)]
mod type_info_tests;
mod value;

pub use coercion::*;
pub use cursor::*;
pub use json_schema::*;
pub use metadata::*;
#[cfg(feature = "mongodb")]
pub use mongo::*;
pub use result_set::*;
pub use type_info::*;
pub use value::*;
