//! Tabson Core - shared vocabulary for tabular access to document results
//!
//! This crate provides the types every tabson driver depends on:
//!
//! - `TabsonError` - the error taxonomy surfaced by result sets
//! - `SqlType` / `Nullability` - JDBC-compatible column type codes
//! - `ConversionMode` - strict vs relaxed accessor coercion
//! - `MetadataStrategy` - schema-known vs row-derived column metadata
//! - `ResultSetOptions` - configuration for building a result set

pub mod config;
mod error;
mod types;

pub use config::ResultSetOptions;
pub use error::*;
pub use types::*;
