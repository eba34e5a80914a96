//! Forward-only typed result sets over document cursors
//!
//! A [`ResultSet`] pulls one document per [`ResultSet::next`] call, keeps it as
//! the current row, and converts its values through typed accessors. Columns
//! may be addressed by 1-based index or by label.
//!
//! ```ignore
//! let mut rs = ResultSet::with_schema(cursor, &schema, ResultSetOptions::new().strict())?;
//! while rs.next()? {
//!     let id = rs.get_long("id")?;
//!     let name = rs.get_string(2)?;
//! }
//! rs.close()?;
//! ```

use bson::{Bson, Document};
use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use rust_decimal::Decimal;
use std::io::Cursor;
use std::sync::Arc;
use std::time::Instant;
use tabson_core::{
    ColumnRef, ConversionMode, MetadataStrategy, Result, ResultSetOptions, TabsonError,
};

use crate::coercion::Coercion;
use crate::cursor::{DocumentCursor, SchemaProvider, StatementHandle};
use crate::json_schema::ResultSchema;
use crate::metadata::{
    ColumnInfo, MetadataProvider, ResultSetMetadata, RowMetadataProvider, SchemaMetadataProvider,
};
use crate::value::HostValue;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResultSetState {
    BeforeFirst,
    OnRow,
    AfterLast,
    Closed,
}

/// Cursor traversal direction; only forward is supported
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchDirection {
    Forward,
}

/// The values of the current row, aligned with the active metadata
#[derive(Debug, Clone, PartialEq)]
pub struct Row {
    values: Vec<Bson>,
}

impl Row {
    pub fn from_document(metadata: &ResultSetMetadata, doc: &Document) -> Self {
        Self {
            values: metadata
                .columns()
                .iter()
                .map(|column| column.extract(doc))
                .collect(),
        }
    }

    /// Value at a 1-based index
    pub fn get(&self, index: usize) -> Option<&Bson> {
        index.checked_sub(1).and_then(|i| self.values.get(i))
    }

    pub fn values(&self) -> &[Bson] {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// A forward-only, read-only result set
///
/// Not safe for concurrent use; accessors take `&mut self`. The cursor is
/// released exactly once: on exhaustion, on [`close`](Self::close), or on drop.
pub struct ResultSet {
    cursor: Option<Box<dyn DocumentCursor>>,
    /// Document fetched ahead of `next` to answer metadata before the first row
    pending: Option<Document>,
    provider: Box<dyn MetadataProvider>,
    metadata: Arc<ResultSetMetadata>,
    current: Option<Row>,
    state: ResultSetState,
    row_num: usize,
    was_null: bool,
    coercion: Coercion,
    statement: Option<Arc<dyn StatementHandle>>,
}

impl std::fmt::Debug for ResultSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResultSet")
            .field("state", &self.state)
            .field("row_num", &self.row_num)
            .field("columns", &self.metadata.column_count())
            .field("mode", &self.coercion.mode())
            .finish_non_exhaustive()
    }
}

impl ResultSet {
    /// Build a result set over `cursor` with column metadata from `provider`
    ///
    /// Row-derived providers get the first document fetched ahead of time so
    /// that metadata is available before the first call to `next`.
    #[tracing::instrument(skip(cursor, provider, options), fields(strategy = ?provider.strategy()))]
    pub fn new(
        cursor: impl DocumentCursor + 'static,
        provider: Box<dyn MetadataProvider>,
        options: ResultSetOptions,
    ) -> Result<Self> {
        let mut cursor: Box<dyn DocumentCursor> = Box::new(cursor);
        let pending = match provider.strategy() {
            MetadataStrategy::RowDerived => cursor.next_document()?,
            MetadataStrategy::SchemaKnown => None,
        };
        let metadata = provider.metadata_for(pending.as_ref())?;
        tracing::debug!(
            columns = metadata.column_count(),
            mode = ?options.conversion_mode,
            "result set opened"
        );
        Ok(Self {
            cursor: Some(cursor),
            pending,
            provider,
            metadata,
            current: None,
            state: ResultSetState::BeforeFirst,
            row_num: 0,
            was_null: false,
            coercion: Coercion::new(options.conversion_mode),
            statement: None,
        })
    }

    /// Result set whose columns come from a known schema
    pub fn with_schema(
        cursor: impl DocumentCursor + 'static,
        schema: &ResultSchema,
        options: ResultSetOptions,
    ) -> Result<Self> {
        let provider = SchemaMetadataProvider::new(schema, &options)?;
        Self::new(cursor, Box::new(provider), options)
    }

    /// Result set whose schema is fetched from `provider` before any row is read
    pub fn with_schema_provider(
        cursor: impl DocumentCursor + 'static,
        provider: &dyn SchemaProvider,
        options: ResultSetOptions,
    ) -> Result<Self> {
        let reply = provider.result_schema().map_err(|e| match e {
            TabsonError::SchemaUnavailable(msg) => TabsonError::SchemaUnavailable(msg),
            other => TabsonError::SchemaUnavailable(other.to_string()),
        })?;
        let schema = ResultSchema::from_document(&reply)?;
        Self::with_schema(cursor, &schema, options)
    }

    /// Result set whose columns are read off each row
    pub fn row_derived(
        cursor: impl DocumentCursor + 'static,
        options: ResultSetOptions,
    ) -> Result<Self> {
        let provider = RowMetadataProvider::new(&options);
        Self::new(cursor, Box::new(provider), options)
    }

    /// Result set built with the strategy named in `options`
    ///
    /// A schema is only consulted under the schema-known strategy.
    pub fn open(
        cursor: impl DocumentCursor + 'static,
        schema: Option<&dyn SchemaProvider>,
        options: ResultSetOptions,
    ) -> Result<Self> {
        match (options.metadata_strategy, schema) {
            (MetadataStrategy::RowDerived, _) => Self::row_derived(cursor, options),
            (MetadataStrategy::SchemaKnown, Some(provider)) => {
                Self::with_schema_provider(cursor, provider, options)
            }
            (MetadataStrategy::SchemaKnown, None) => Err(TabsonError::SchemaUnavailable(
                "no schema provider for a schema-known result set".into(),
            )),
        }
    }

    /// Attach the statement that produced this result
    pub fn with_statement(mut self, statement: Arc<dyn StatementHandle>) -> Self {
        self.statement = Some(statement);
        self
    }

    fn ensure_open(&self) -> Result<()> {
        if self.state == ResultSetState::Closed {
            return Err(TabsonError::ResultSetClosed);
        }
        Ok(())
    }

    fn has_more(&mut self) -> Result<bool> {
        if self.pending.is_some() {
            return Ok(true);
        }
        match self.cursor.as_mut() {
            Some(cursor) => cursor.has_next(),
            None => Ok(false),
        }
    }

    fn release_cursor(&mut self) -> Result<()> {
        self.pending = None;
        match self.cursor.take() {
            Some(mut cursor) => {
                tracing::debug!(rows = self.row_num, "releasing cursor");
                cursor.close()
            }
            None => Ok(()),
        }
    }

    /// Advance to the next row
    ///
    /// Returns `false` once the cursor is exhausted.
    pub fn next(&mut self) -> Result<bool> {
        self.ensure_open()?;
        if self.state == ResultSetState::AfterLast {
            return Ok(false);
        }
        let start = Instant::now();
        let doc = match self.pending.take() {
            Some(doc) => Some(doc),
            None => match self.cursor.as_mut() {
                Some(cursor) => cursor.next_document()?,
                None => None,
            },
        };

        let Some(doc) = doc else {
            self.current = None;
            self.state = ResultSetState::AfterLast;
            tracing::debug!(rows = self.row_num, "result set exhausted");
            self.release_cursor()?;
            return Ok(false);
        };

        if self.provider.strategy() == MetadataStrategy::RowDerived {
            self.metadata = self.provider.metadata_for(Some(&doc))?;
        }
        self.current = Some(Row::from_document(&self.metadata, &doc));
        self.state = ResultSetState::OnRow;
        self.row_num += 1;
        tracing::trace!(
            row = self.row_num,
            elapsed_us = start.elapsed().as_micros() as u64,
            "advanced result set"
        );
        Ok(true)
    }

    /// Close the result set and release its cursor
    ///
    /// Closing twice is a no-op. If the owning statement asked to close on
    /// completion, it is closed too, even when releasing the cursor fails.
    /// The first error encountered is returned.
    pub fn close(&mut self) -> Result<()> {
        if self.state == ResultSetState::Closed {
            return Ok(());
        }
        self.state = ResultSetState::Closed;
        self.current = None;
        let released = self.release_cursor();
        if let Err(e) = &released {
            tracing::warn!(error = %e, "failed to release cursor");
        }
        let completed = match &self.statement {
            Some(statement) if statement.is_close_on_completion() && !statement.is_closed() => {
                tracing::debug!("closing statement on completion");
                statement.close()
            }
            _ => Ok(()),
        };
        tracing::debug!(rows = self.row_num, "result set closed");
        released.and(completed)
    }

    pub fn is_closed(&self) -> bool {
        self.state == ResultSetState::Closed
    }

    pub fn state(&self) -> ResultSetState {
        self.state
    }

    /// Metadata of the current row, or of the result before the first row
    pub fn metadata(&self) -> Result<Arc<ResultSetMetadata>> {
        self.ensure_open()?;
        Ok(Arc::clone(&self.metadata))
    }

    /// 1-based index of the first column with this label
    pub fn find_column(&self, label: &str) -> Result<usize> {
        self.ensure_open()?;
        self.metadata.resolve(ColumnRef::Label(label))
    }

    /// Whether the most recent accessor read a null or undefined value
    pub fn was_null(&self) -> Result<bool> {
        self.ensure_open()?;
        Ok(self.was_null)
    }

    /// 1-based number of the current row, 0 when not on a row
    pub fn row_number(&self) -> Result<usize> {
        self.ensure_open()?;
        Ok(match self.state {
            ResultSetState::OnRow => self.row_num,
            _ => 0,
        })
    }

    pub fn is_first(&self) -> Result<bool> {
        self.ensure_open()?;
        Ok(self.state == ResultSetState::OnRow && self.row_num == 1)
    }

    /// True when no further row can be fetched
    ///
    /// A result without rows is always on its last row.
    pub fn is_last(&mut self) -> Result<bool> {
        self.ensure_open()?;
        Ok(!self.has_more()?)
    }

    pub fn is_before_first(&mut self) -> Result<bool> {
        self.ensure_open()?;
        Ok(self.state == ResultSetState::BeforeFirst && self.has_more()?)
    }

    pub fn is_after_last(&self) -> Result<bool> {
        self.ensure_open()?;
        Ok(self.state == ResultSetState::AfterLast && self.row_num > 0)
    }

    pub fn fetch_direction(&self) -> Result<FetchDirection> {
        self.ensure_open()?;
        Ok(FetchDirection::Forward)
    }

    pub fn conversion_mode(&self) -> ConversionMode {
        self.coercion.mode()
    }

    /// Reads one value of the current row through `convert`
    ///
    /// `was_null` is only updated when the conversion succeeds.
    fn read<T>(
        &mut self,
        column: ColumnRef<'_>,
        convert: impl FnOnce(&Coercion, &ColumnInfo, &Bson) -> Result<T>,
    ) -> Result<T> {
        self.ensure_open()?;
        let row = self.current.as_ref().ok_or(TabsonError::NoCurrentRow)?;
        let index = self.metadata.resolve(column)?;
        let info = self.metadata.column(index)?;
        let value = row.get(index).unwrap_or(&Bson::Null);
        let null = matches!(value, Bson::Null | Bson::Undefined);
        let out = convert(&self.coercion, info, value)?;
        self.was_null = null;
        Ok(out)
    }

    pub fn get_string<'a>(&mut self, column: impl Into<ColumnRef<'a>>) -> Result<Option<String>> {
        self.read(column.into(), |c, _, v| c.to_string(v))
    }

    pub fn get_boolean<'a>(&mut self, column: impl Into<ColumnRef<'a>>) -> Result<bool> {
        self.read(column.into(), |c, _, v| c.to_boolean(v))
    }

    pub fn get_byte<'a>(&mut self, column: impl Into<ColumnRef<'a>>) -> Result<i8> {
        self.read(column.into(), |c, _, v| c.to_byte(v))
    }

    pub fn get_short<'a>(&mut self, column: impl Into<ColumnRef<'a>>) -> Result<i16> {
        self.read(column.into(), |c, _, v| c.to_short(v))
    }

    pub fn get_int<'a>(&mut self, column: impl Into<ColumnRef<'a>>) -> Result<i32> {
        self.read(column.into(), |c, _, v| c.to_int(v))
    }

    pub fn get_long<'a>(&mut self, column: impl Into<ColumnRef<'a>>) -> Result<i64> {
        self.read(column.into(), |c, _, v| c.to_long(v))
    }

    pub fn get_float<'a>(&mut self, column: impl Into<ColumnRef<'a>>) -> Result<f32> {
        self.read(column.into(), |c, _, v| c.to_float(v))
    }

    pub fn get_double<'a>(&mut self, column: impl Into<ColumnRef<'a>>) -> Result<f64> {
        self.read(column.into(), |c, _, v| c.to_double(v))
    }

    pub fn get_big_decimal<'a>(&mut self, column: impl Into<ColumnRef<'a>>) -> Result<Decimal> {
        self.read(column.into(), |c, _, v| c.to_decimal(v))
    }

    /// Raw bytes; only binary values convert
    pub fn get_bytes<'a>(&mut self, column: impl Into<ColumnRef<'a>>) -> Result<Option<Vec<u8>>> {
        self.read(column.into(), |c, _, v| c.to_bytes(v))
    }

    pub fn get_blob<'a>(
        &mut self,
        column: impl Into<ColumnRef<'a>>,
    ) -> Result<Option<bytes::Bytes>> {
        self.get_bytes(column).map(|b| b.map(bytes::Bytes::from))
    }

    pub fn get_binary_stream<'a>(
        &mut self,
        column: impl Into<ColumnRef<'a>>,
    ) -> Result<Option<Cursor<Vec<u8>>>> {
        self.get_bytes(column).map(|b| b.map(Cursor::new))
    }

    /// The string value as a stream of its UTF-8 bytes
    pub fn get_ascii_stream<'a>(
        &mut self,
        column: impl Into<ColumnRef<'a>>,
    ) -> Result<Option<Cursor<Vec<u8>>>> {
        self.get_string(column)
            .map(|s| s.map(|s| Cursor::new(s.into_bytes())))
    }

    pub fn get_timestamp<'a>(
        &mut self,
        column: impl Into<ColumnRef<'a>>,
    ) -> Result<Option<DateTime<Utc>>> {
        self.read(column.into(), |c, _, v| c.to_timestamp(v))
    }

    pub fn get_date<'a>(&mut self, column: impl Into<ColumnRef<'a>>) -> Result<Option<NaiveDate>> {
        self.read(column.into(), |c, _, v| c.to_date(v))
    }

    pub fn get_time<'a>(&mut self, column: impl Into<ColumnRef<'a>>) -> Result<Option<NaiveTime>> {
        self.read(column.into(), |c, _, v| c.to_time(v))
    }

    /// The value as the host type of its column
    pub fn get_object<'a>(&mut self, column: impl Into<ColumnRef<'a>>) -> Result<HostValue> {
        self.read(column.into(), |c, info, v| c.to_object(v, info.type_info))
    }

    /// The raw BSON value
    pub fn get_bson<'a>(&mut self, column: impl Into<ColumnRef<'a>>) -> Result<Bson> {
        self.read(column.into(), |_, _, v| Ok(v.clone()))
    }
}

impl Drop for ResultSet {
    fn drop(&mut self) {
        if let Err(e) = self.release_cursor() {
            tracing::warn!(error = %e, "failed to release cursor");
        }
    }
}
