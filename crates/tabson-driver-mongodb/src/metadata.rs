//! Column metadata for document result sets
//!
//! A [`ResultSetMetadata`] is an immutable snapshot of the columns of a
//! result. Snapshots come from a [`MetadataProvider`]:
//!
//! - [`SchemaMetadataProvider`] flattens a known result schema once and hands
//!   out the same snapshot for every row
//! - [`RowMetadataProvider`] reads the columns and their types off each row,
//!   so consecutive rows of heterogeneous documents may report different types

use bson::{Bson, Document};
use std::sync::Arc;
use tabson_core::{
    ColumnRef, MetadataStrategy, Nullability, Result, ResultSetOptions, SqlType, TabsonError,
};

use crate::json_schema::{JsonSchema, ResultSchema};
use crate::type_info::BsonTypeInfo;

/// One result column
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnInfo {
    /// Catalog the column belongs to
    pub database: String,
    /// Datasource name; empty for unqualified fields
    pub table: String,
    pub table_alias: String,
    pub column: String,
    pub column_label: String,
    pub type_info: &'static BsonTypeInfo,
    /// Precision under the active strategy
    pub precision: u32,
    pub nullability: Nullability,
}

impl ColumnInfo {
    pub fn new(
        database: impl Into<String>,
        table: impl Into<String>,
        column: impl Into<String>,
        type_info: &'static BsonTypeInfo,
        nullability: Nullability,
        strategy: MetadataStrategy,
    ) -> Self {
        let table = table.into();
        let column = column.into();
        Self {
            database: database.into(),
            table_alias: table.clone(),
            table,
            column_label: column.clone(),
            column,
            type_info,
            precision: type_info.precision_for(strategy),
            nullability,
        }
    }

    pub fn sql_type(&self) -> SqlType {
        self.type_info.sql_type
    }

    pub fn type_name(&self) -> &'static str {
        self.type_info.name
    }

    pub fn is_polymorphic(&self) -> bool {
        self.type_info.is_polymorphic()
    }

    /// Reads this column's value out of a result document
    ///
    /// Values live at `doc[table][column]`. Unqualified columns not found under
    /// `doc[""]` are read from `doc[column]`. Absent fields read as null.
    pub fn extract(&self, doc: &Document) -> Bson {
        if let Ok(datasource) = doc.get_document(&self.table)
            && let Some(value) = datasource.get(&self.column)
        {
            return value.clone();
        }
        if self.table.is_empty()
            && let Some(value) = doc.get(&self.column)
        {
            return value.clone();
        }
        Bson::Null
    }
}

/// Immutable description of the columns of a result
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResultSetMetadata {
    columns: Vec<ColumnInfo>,
}

impl ResultSetMetadata {
    pub fn new(columns: Vec<ColumnInfo>) -> Self {
        Self { columns }
    }

    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    pub fn columns(&self) -> &[ColumnInfo] {
        &self.columns
    }

    /// The column at a 1-based index
    pub fn column(&self, index: usize) -> Result<&ColumnInfo> {
        index
            .checked_sub(1)
            .and_then(|i| self.columns.get(i))
            .ok_or(TabsonError::InvalidColumnIndex {
                index,
                count: self.columns.len(),
            })
    }

    /// 1-based index of the first column with this label
    ///
    /// An exact match wins; otherwise the first case-insensitive match is used.
    pub fn find_column_index(&self, label: &str) -> Option<usize> {
        self.columns
            .iter()
            .position(|c| c.column_label == label)
            .or_else(|| {
                self.columns
                    .iter()
                    .position(|c| c.column_label.eq_ignore_ascii_case(label))
            })
            .map(|i| i + 1)
    }

    /// Resolve a column reference to a checked 1-based index
    pub fn resolve(&self, column: ColumnRef<'_>) -> Result<usize> {
        match column {
            ColumnRef::Index(index) => self.column(index).map(|_| index),
            ColumnRef::Label(label) => self
                .find_column_index(label)
                .ok_or_else(|| TabsonError::ColumnNotFound(label.to_string())),
        }
    }

    pub fn column_name(&self, index: usize) -> Result<&str> {
        Ok(&self.column(index)?.column)
    }

    pub fn column_label(&self, index: usize) -> Result<&str> {
        Ok(&self.column(index)?.column_label)
    }

    pub fn table_name(&self, index: usize) -> Result<&str> {
        Ok(&self.column(index)?.table)
    }

    pub fn catalog_name(&self, index: usize) -> Result<&str> {
        Ok(&self.column(index)?.database)
    }

    /// Always empty; documents have no schema level
    pub fn schema_name(&self, index: usize) -> Result<&str> {
        self.column(index).map(|_| "")
    }

    /// The numeric SQL type code
    pub fn column_type(&self, index: usize) -> Result<i32> {
        Ok(self.column(index)?.sql_type().code())
    }

    pub fn sql_type(&self, index: usize) -> Result<SqlType> {
        Ok(self.column(index)?.sql_type())
    }

    pub fn column_type_name(&self, index: usize) -> Result<&'static str> {
        Ok(self.column(index)?.type_name())
    }

    /// Host type `get_object` returns for the column, empty for the null type
    pub fn column_class_name(&self, index: usize) -> Result<&'static str> {
        Ok(self.column(index)?.type_info.host_class.unwrap_or(""))
    }

    pub fn column_display_size(&self, index: usize) -> Result<u32> {
        Ok(self.column(index)?.type_info.display_size)
    }

    pub fn precision(&self, index: usize) -> Result<u32> {
        Ok(self.column(index)?.precision)
    }

    pub fn scale(&self, index: usize) -> Result<u32> {
        Ok(self.column(index)?.type_info.scale)
    }

    pub fn is_signed(&self, index: usize) -> Result<bool> {
        Ok(self.column(index)?.type_info.signed)
    }

    pub fn is_case_sensitive(&self, index: usize) -> Result<bool> {
        Ok(self.column(index)?.type_info.case_sensitive)
    }

    pub fn is_nullable(&self, index: usize) -> Result<Nullability> {
        Ok(self.column(index)?.nullability)
    }

    pub fn is_auto_increment(&self, index: usize) -> Result<bool> {
        self.column(index).map(|_| false)
    }

    pub fn is_currency(&self, index: usize) -> Result<bool> {
        self.column(index).map(|_| false)
    }

    pub fn is_searchable(&self, index: usize) -> Result<bool> {
        self.column(index).map(|_| true)
    }

    pub fn is_read_only(&self, index: usize) -> Result<bool> {
        self.column(index).map(|_| true)
    }

    pub fn is_writable(&self, index: usize) -> Result<bool> {
        self.column(index).map(|_| false)
    }

    pub fn is_definitely_writable(&self, index: usize) -> Result<bool> {
        self.column(index).map(|_| false)
    }
}

/// Source of column metadata for a result set
pub trait MetadataProvider: Send {
    fn strategy(&self) -> MetadataStrategy;

    /// Metadata describing `row`, or the result as a whole when no row is at hand
    fn metadata_for(&self, row: Option<&Document>) -> Result<Arc<ResultSetMetadata>>;
}

/// Metadata flattened once from a known result schema
///
/// The top-level schema must be an object whose properties are the result's
/// datasources (tables), each itself an object whose properties are columns.
#[derive(Debug, Clone)]
pub struct SchemaMetadataProvider {
    metadata: Arc<ResultSetMetadata>,
}

impl SchemaMetadataProvider {
    pub fn new(schema: &ResultSchema, options: &ResultSetOptions) -> Result<Self> {
        let top = schema
            .schema
            .as_object()
            .ok_or_else(|| TabsonError::SchemaFormat("result schema must be an object".into()))?;

        let mut pairs: Vec<(&str, &str)> = Vec::new();
        for (table, table_schema) in &top.properties {
            let table_object = table_schema.as_object().ok_or_else(|| {
                TabsonError::SchemaFormat(format!("datasource '{}' must be an object", table))
            })?;
            for column in table_object.properties.keys() {
                pairs.push((table.as_str(), column.as_str()));
            }
        }

        if let Some(order) = &schema.select_order {
            pairs = order
                .iter()
                .map(|(table, column)| {
                    pairs
                        .iter()
                        .find(|(t, c)| *t == table.as_str() && *c == column.as_str())
                        .copied()
                        .ok_or_else(|| {
                            TabsonError::SchemaFormat(format!(
                                "selectOrder names unknown column '{}.{}'",
                                table, column
                            ))
                        })
                })
                .collect::<Result<Vec<_>>>()?;
        } else if options.sort_fields_alphabetically {
            pairs.sort();
        }

        let mut columns = Vec::with_capacity(pairs.len());
        for (table, column) in pairs {
            let Some(table_object) = top.properties.get(table).and_then(JsonSchema::as_object)
            else {
                continue;
            };
            let Some(column_schema) = table_object.properties.get(column) else {
                continue;
            };
            let nullability = table_object
                .nullability(column)
                .unwrap_or(Nullability::Nullable);
            columns.push(ColumnInfo::new(
                options.database.clone(),
                table,
                column,
                column_schema.type_info(),
                nullability,
                MetadataStrategy::SchemaKnown,
            ));
        }

        tracing::debug!(columns = columns.len(), "built schema metadata");
        Ok(Self {
            metadata: Arc::new(ResultSetMetadata::new(columns)),
        })
    }

    pub fn metadata(&self) -> &Arc<ResultSetMetadata> {
        &self.metadata
    }
}

impl MetadataProvider for SchemaMetadataProvider {
    fn strategy(&self) -> MetadataStrategy {
        MetadataStrategy::SchemaKnown
    }

    fn metadata_for(&self, _row: Option<&Document>) -> Result<Arc<ResultSetMetadata>> {
        Ok(Arc::clone(&self.metadata))
    }
}

/// Metadata read off each row
///
/// A top-level field holding a document is a datasource whose fields are
/// columns. Any other top-level field is a column of the unnamed datasource.
/// Column types are the concrete types of the row's values and nullability
/// is always `Unknown`.
#[derive(Debug, Clone, Default)]
pub struct RowMetadataProvider {
    database: String,
    placeholder: Option<Document>,
}

impl RowMetadataProvider {
    pub fn new(options: &ResultSetOptions) -> Self {
        Self {
            database: options.database.clone(),
            placeholder: None,
        }
    }

    /// Document describing the columns of a result that has no rows
    pub fn with_placeholder(mut self, placeholder: Document) -> Self {
        self.placeholder = Some(placeholder);
        self
    }

    fn describe(&self, row: &Document) -> ResultSetMetadata {
        let mut columns = Vec::new();
        for (key, value) in row {
            match value {
                Bson::Document(datasource) => {
                    for (column, value) in datasource {
                        columns.push(self.column(key, column, value));
                    }
                }
                other => columns.push(self.column("", key, other)),
            }
        }
        ResultSetMetadata::new(columns)
    }

    fn column(&self, table: &str, column: &str, value: &Bson) -> ColumnInfo {
        ColumnInfo::new(
            self.database.clone(),
            table,
            column,
            BsonTypeInfo::of_value(value),
            Nullability::Unknown,
            MetadataStrategy::RowDerived,
        )
    }
}

impl MetadataProvider for RowMetadataProvider {
    fn strategy(&self) -> MetadataStrategy {
        MetadataStrategy::RowDerived
    }

    fn metadata_for(&self, row: Option<&Document>) -> Result<Arc<ResultSetMetadata>> {
        let metadata = match row.or(self.placeholder.as_ref()) {
            Some(doc) => self.describe(doc),
            None => ResultSetMetadata::default(),
        };
        tracing::trace!(columns = metadata.column_count(), "derived row metadata");
        Ok(Arc::new(metadata))
    }
}
