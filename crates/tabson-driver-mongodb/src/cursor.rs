//! Collaborators consumed by a result set
//!
//! - [`DocumentCursor`] yields result documents one at a time
//! - [`SchemaProvider`] answers the result schema of a query before any row is read
//! - [`StatementHandle`] is the statement that produced the result

use bson::Document;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use tabson_core::{Result, TabsonError};

/// A forward-only source of result documents
///
/// Exhaustion is a normal outcome, not an error.
pub trait DocumentCursor: Send {
    /// True if another document can be fetched
    fn has_next(&mut self) -> Result<bool>;

    /// The next document, or `None` once the cursor is exhausted
    fn next_document(&mut self) -> Result<Option<Document>>;

    /// Release any server-side resources held by the cursor
    fn close(&mut self) -> Result<()> {
        Ok(())
    }
}

impl DocumentCursor for Box<dyn DocumentCursor> {
    fn has_next(&mut self) -> Result<bool> {
        (**self).has_next()
    }

    fn next_document(&mut self) -> Result<Option<Document>> {
        (**self).next_document()
    }

    fn close(&mut self) -> Result<()> {
        (**self).close()
    }
}

/// A cursor over documents already in memory
#[derive(Debug, Clone, Default)]
pub struct VecCursor {
    docs: VecDeque<Document>,
    closed: bool,
}

impl VecCursor {
    pub fn new(docs: impl IntoIterator<Item = Document>) -> Self {
        Self {
            docs: docs.into_iter().collect(),
            closed: false,
        }
    }

    pub fn empty() -> Self {
        Self::default()
    }

    pub fn remaining(&self) -> usize {
        self.docs.len()
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }
}

impl DocumentCursor for VecCursor {
    fn has_next(&mut self) -> Result<bool> {
        if self.closed {
            return Err(TabsonError::Cursor("cursor is closed".into()));
        }
        Ok(!self.docs.is_empty())
    }

    fn next_document(&mut self) -> Result<Option<Document>> {
        if self.closed {
            return Err(TabsonError::Cursor("cursor is closed".into()));
        }
        Ok(self.docs.pop_front())
    }

    fn close(&mut self) -> Result<()> {
        self.closed = true;
        self.docs.clear();
        Ok(())
    }
}

/// Answers the result schema of a query
///
/// The returned document is either a bare schema or the versioned
/// `{schema: {version, jsonSchema}, selectOrder}` envelope.
pub trait SchemaProvider {
    fn result_schema(&self) -> Result<Document>;
}

/// A schema provider that returns a fixed document
#[derive(Debug, Clone)]
pub struct StaticSchemaProvider {
    schema: Document,
}

impl StaticSchemaProvider {
    pub fn new(schema: Document) -> Self {
        Self { schema }
    }
}

impl SchemaProvider for StaticSchemaProvider {
    fn result_schema(&self) -> Result<Document> {
        Ok(self.schema.clone())
    }
}

impl<F> SchemaProvider for F
where
    F: Fn() -> Result<Document>,
{
    fn result_schema(&self) -> Result<Document> {
        self()
    }
}

/// The statement a result set belongs to
pub trait StatementHandle: Send + Sync {
    fn is_closed(&self) -> bool;

    /// True if the statement closes itself once its result set is closed
    fn is_close_on_completion(&self) -> bool;

    /// Close the statement; closing twice is a no-op
    fn close(&self) -> Result<()>;
}

/// A minimal statement tracking its own lifecycle
#[derive(Debug, Default)]
pub struct Statement {
    closed: AtomicBool,
    close_on_completion: AtomicBool,
}

impl Statement {
    pub fn new() -> Self {
        Self::default()
    }

    /// Close this statement when its result set is closed
    pub fn close_on_completion(&self) {
        self.close_on_completion.store(true, Ordering::SeqCst);
    }
}

impl StatementHandle for Statement {
    fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    fn is_close_on_completion(&self) -> bool {
        self.close_on_completion.load(Ordering::SeqCst)
    }

    fn close(&self) -> Result<()> {
        if !self.closed.swap(true, Ordering::SeqCst) {
            tracing::debug!("statement closed");
        }
        Ok(())
    }
}
