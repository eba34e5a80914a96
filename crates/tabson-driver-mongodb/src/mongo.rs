//! Adapters over the blocking MongoDB client
//!
//! Enabled with the `mongodb` feature.

use bson::{Bson, Document};
use mongodb::sync::{Cursor, Database};
use tabson_core::{Result, TabsonError};

use crate::cursor::{DocumentCursor, SchemaProvider};

/// A [`DocumentCursor`] over a server cursor
///
/// `has_next` may fetch the next document ahead of time; it is handed out by
/// the following `next_document` call.
pub struct MongoCursor {
    inner: Option<Cursor<Document>>,
    peeked: Option<Document>,
}

impl MongoCursor {
    pub fn new(cursor: Cursor<Document>) -> Self {
        Self {
            inner: Some(cursor),
            peeked: None,
        }
    }

    /// Run an aggregation pipeline against the database
    #[tracing::instrument(skip(db, pipeline), fields(database = db.name(), stages = pipeline.len()))]
    pub fn aggregate(db: &Database, pipeline: Vec<Document>) -> Result<Self> {
        let cursor = db
            .aggregate(pipeline)
            .run()
            .map_err(|e| TabsonError::Cursor(format!("aggregate failed: {}", e)))?;
        Ok(Self::new(cursor))
    }

    fn fetch(&mut self) -> Result<Option<Document>> {
        let Some(cursor) = self.inner.as_mut() else {
            return Err(TabsonError::Cursor("cursor is closed".into()));
        };
        cursor
            .next()
            .transpose()
            .map_err(|e| TabsonError::Cursor(e.to_string()))
    }
}

impl DocumentCursor for MongoCursor {
    fn has_next(&mut self) -> Result<bool> {
        if self.peeked.is_none() {
            self.peeked = self.fetch()?;
        }
        Ok(self.peeked.is_some())
    }

    fn next_document(&mut self) -> Result<Option<Document>> {
        match self.peeked.take() {
            Some(doc) => Ok(Some(doc)),
            None => self.fetch(),
        }
    }

    fn close(&mut self) -> Result<()> {
        // dropping the cursor kills it on the server
        self.inner = None;
        self.peeked = None;
        Ok(())
    }
}

/// Fetches the result schema by running a command
///
/// The command is typically `{sqlGetResultSchema: 1, pipeline: [...]}`.
pub struct CommandSchemaProvider {
    db: Database,
    command: Document,
}

impl CommandSchemaProvider {
    pub fn new(db: Database, command: Document) -> Self {
        Self { db, command }
    }
}

impl SchemaProvider for CommandSchemaProvider {
    fn result_schema(&self) -> Result<Document> {
        let reply = self
            .db
            .run_command(self.command.clone())
            .run()
            .map_err(|e| TabsonError::SchemaUnavailable(format!("schema command failed: {}", e)))?;

        if let Some(ok) = reply.get("ok")
            && ok.as_f64().or_else(|| as_integer(ok).map(|v| v as f64)) != Some(1.0)
        {
            let message = reply.get_str("errmsg").unwrap_or("Unknown error");
            return Err(TabsonError::SchemaUnavailable(message.to_string()));
        }
        Ok(reply)
    }
}

fn as_integer(value: &Bson) -> Option<i64> {
    match value {
        Bson::Int32(v) => Some(*v as i64),
        Bson::Int64(v) => Some(*v),
        _ => None,
    }
}
