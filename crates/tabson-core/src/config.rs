//! Result set configuration
//!
//! Options can be built in code, read from a TOML table, or derived from
//! connection properties (`conversionMode`, `dialect`, `database`).
//!
//! ```toml
//! conversion_mode = "strict"
//! metadata_strategy = "row_derived"
//! database = "sales"
//! ```

use crate::{ConversionMode, MetadataStrategy, Result, TabsonError};
use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;

/// Connection property naming the conversion mode
pub const CONVERSION_MODE_PARAM: &str = "conversionMode";
/// Connection property naming the SQL dialect, which selects the metadata strategy
pub const DIALECT_PARAM: &str = "dialect";
pub const DATABASE_PARAM: &str = "database";

/// Options fixed for the lifetime of one result set
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResultSetOptions {
    /// Strict accessors fail on type mismatches, relaxed ones return zero values
    pub conversion_mode: ConversionMode,
    pub metadata_strategy: MetadataStrategy,
    /// Order tables and columns by name instead of schema declaration order
    pub sort_fields_alphabetically: bool,
    /// Reported as the catalog name of every column
    pub database: String,
}

impl ResultSetOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn strict(mut self) -> Self {
        self.conversion_mode = ConversionMode::Strict;
        self
    }

    pub fn relaxed(mut self) -> Self {
        self.conversion_mode = ConversionMode::Relaxed;
        self
    }

    pub fn with_strategy(mut self, strategy: MetadataStrategy) -> Self {
        self.metadata_strategy = strategy;
        self
    }

    pub fn with_database(mut self, database: impl Into<String>) -> Self {
        self.database = database.into();
        self
    }

    pub fn sorted(mut self, sort: bool) -> Self {
        self.sort_fields_alphabetically = sort;
        self
    }

    /// Parse options from a TOML document
    pub fn from_toml_str(s: &str) -> Result<Self> {
        toml::from_str(s).map_err(|e| TabsonError::Configuration(e.to_string()))
    }

    /// Read options from a TOML file on disk
    pub fn load(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read result set options from {}", path.display()))?;
        let options = Self::from_toml_str(&contents)
            .with_context(|| format!("invalid result set options in {}", path.display()))?;
        Ok(options)
    }

    /// Derive options from connection properties
    ///
    /// Missing properties keep their defaults. A `conversionMode` other than
    /// `strict` or `relaxed`, or an unknown `dialect`, is a configuration error.
    pub fn from_params(params: &HashMap<String, String>) -> Result<Self> {
        let mut options = Self::default();
        if let Some(mode) = params.get(CONVERSION_MODE_PARAM) {
            options.conversion_mode = mode.to_ascii_lowercase().parse()?;
        }
        if let Some(dialect) = params.get(DIALECT_PARAM) {
            options.metadata_strategy = MetadataStrategy::from_dialect(dialect)?;
        }
        if let Some(database) = params.get(DATABASE_PARAM) {
            options.database = database.clone();
        }
        tracing::debug!(
            mode = ?options.conversion_mode,
            strategy = ?options.metadata_strategy,
            "resolved result set options"
        );
        Ok(options)
    }
}

#[cfg(test)]
mod tests;
