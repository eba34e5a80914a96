//! Result schema model and simplifier
//!
//! Schemas arrive as `$jsonSchema`-style documents in which `bsonType` may be
//! a single name or a list and unions are spelled with `anyOf`. Parsing
//! produces the canonical form:
//!
//! - a list-valued `bsonType` becomes an `anyOf` of single-type branches
//! - nested `anyOf` branches are spliced into their parent
//! - duplicate branches are removed and a single remaining branch is unwrapped
//! - object nodes always carry (possibly empty) `properties` and `required`
//! - a node with no `bsonType`, `anyOf` or `properties` is the dynamic "any" type
//!
//! Nullable leaves stay `anyOf[T, null]`. Simplification is deterministic, and
//! parsing the document produced by [`JsonSchema::to_document`] yields the same
//! schema again.

use bson::{Bson, Document, doc};
use indexmap::IndexMap;
use std::collections::BTreeSet;
use tabson_core::{Nullability, Result, TabsonError};

use crate::type_info::{BsonTypeInfo, BsonTypeName};

/// A canonical schema node
#[derive(Debug, Clone)]
pub enum JsonSchema {
    /// Values of any type
    Any,
    /// A single scalar type; never `object` or `array`
    Scalar(BsonTypeName),
    Object(ObjectSchema),
    /// An array whose elements match the item schema
    Array(Box<JsonSchema>),
    /// At least two distinct alternatives, none of which is itself `AnyOf`
    AnyOf(Vec<JsonSchema>),
}

/// Properties of an object node
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ObjectSchema {
    /// Property schemas in declaration order
    pub properties: IndexMap<String, JsonSchema>,
    pub required: BTreeSet<String>,
    pub additional_properties: bool,
}

impl PartialEq for JsonSchema {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (JsonSchema::Any, JsonSchema::Any) => true,
            (JsonSchema::Scalar(a), JsonSchema::Scalar(b)) => a == b,
            (JsonSchema::Object(a), JsonSchema::Object(b)) => a == b,
            (JsonSchema::Array(a), JsonSchema::Array(b)) => a == b,
            // branches are deduplicated, so equal length plus containment is set equality
            (JsonSchema::AnyOf(a), JsonSchema::AnyOf(b)) => {
                a.len() == b.len() && a.iter().all(|branch| b.contains(branch))
            }
            _ => false,
        }
    }
}

fn format_err(msg: impl Into<String>) -> TabsonError {
    TabsonError::SchemaFormat(msg.into())
}

impl JsonSchema {
    /// Parse and simplify a schema document
    pub fn from_document(doc: &Document) -> Result<JsonSchema> {
        let mut branches = Vec::new();

        match doc.get("bsonType") {
            None => {}
            Some(Bson::String(name)) => branches.push(Self::typed(name, doc)?),
            Some(Bson::Array(names)) => {
                if names.is_empty() {
                    return Err(format_err("bsonType list is empty"));
                }
                for name in names {
                    match name {
                        Bson::String(name) => branches.push(Self::typed(name, doc)?),
                        other => {
                            return Err(format_err(format!(
                                "bsonType entries must be strings, found {}",
                                other
                            )));
                        }
                    }
                }
            }
            Some(other) => {
                return Err(format_err(format!(
                    "bsonType must be a string or a list of strings, found {}",
                    other
                )));
            }
        }

        match doc.get("anyOf") {
            None => {}
            Some(Bson::Array(alternatives)) => {
                if alternatives.is_empty() {
                    return Err(format_err("anyOf list is empty"));
                }
                for alternative in alternatives {
                    match alternative {
                        Bson::Document(sub) => branches.push(Self::from_document(sub)?),
                        other => {
                            return Err(format_err(format!(
                                "anyOf entries must be schemas, found {}",
                                other
                            )));
                        }
                    }
                }
            }
            Some(other) => {
                return Err(format_err(format!("anyOf must be a list, found {}", other)));
            }
        }

        if branches.is_empty() {
            if doc.contains_key("properties") {
                return Ok(JsonSchema::Object(ObjectSchema::from_document(doc)?));
            }
            return Ok(JsonSchema::Any);
        }
        Ok(Self::any_of(branches))
    }

    /// Parse and simplify a schema given as JSON
    pub fn from_json(value: &serde_json::Value) -> Result<JsonSchema> {
        let doc = bson::to_document(value)
            .map_err(|e| format_err(format!("schema is not a document: {}", e)))?;
        Self::from_document(&doc)
    }

    /// The branch for one type name, taking the node's keywords that apply to it
    fn typed(name: &str, doc: &Document) -> Result<JsonSchema> {
        let name: BsonTypeName = name.parse()?;
        Ok(match name {
            BsonTypeName::Object => JsonSchema::Object(ObjectSchema::from_document(doc)?),
            BsonTypeName::Array => JsonSchema::Array(Box::new(Self::items(doc)?)),
            scalar => JsonSchema::Scalar(scalar),
        })
    }

    fn items(doc: &Document) -> Result<JsonSchema> {
        match doc.get("items") {
            None => Ok(JsonSchema::Any),
            Some(Bson::Document(items)) => Self::from_document(items),
            // tuple-typed arrays have no single element type
            Some(Bson::Array(_)) => Ok(JsonSchema::Any),
            Some(other) => Err(format_err(format!(
                "items must be a schema or a list of schemas, found {}",
                other
            ))),
        }
    }

    /// Union of branches in canonical form
    ///
    /// Nested unions are spliced, duplicates removed, a union containing
    /// `Any` becomes `Any`, and a single branch is returned unwrapped.
    pub fn any_of(branches: impl IntoIterator<Item = JsonSchema>) -> JsonSchema {
        let mut flat: Vec<JsonSchema> = Vec::new();
        let mut pending: Vec<JsonSchema> = branches.into_iter().collect();
        pending.reverse();
        while let Some(branch) = pending.pop() {
            match branch {
                JsonSchema::AnyOf(nested) => pending.extend(nested.into_iter().rev()),
                JsonSchema::Any => return JsonSchema::Any,
                other => {
                    if !flat.contains(&other) {
                        flat.push(other);
                    }
                }
            }
        }
        match flat.len() {
            0 => JsonSchema::Any,
            1 => flat.remove(0),
            _ => JsonSchema::AnyOf(flat),
        }
    }

    /// Write the canonical form back out as a schema document
    pub fn to_document(&self) -> Document {
        match self {
            JsonSchema::Any => Document::new(),
            JsonSchema::Scalar(name) => doc! { "bsonType": name.as_str() },
            JsonSchema::Object(object) => object.to_document(),
            JsonSchema::Array(items) => doc! {
                "bsonType": "array",
                "items": items.to_document(),
            },
            JsonSchema::AnyOf(branches) => doc! {
                "anyOf": branches.iter().map(|b| Bson::Document(b.to_document())).collect::<Vec<_>>(),
            },
        }
    }

    pub fn is_any(&self) -> bool {
        matches!(self, JsonSchema::Any)
    }

    pub fn as_object(&self) -> Option<&ObjectSchema> {
        match self {
            JsonSchema::Object(object) => Some(object),
            _ => None,
        }
    }

    /// True for `null` and `undefined` leaves
    pub fn is_null_type(&self) -> bool {
        matches!(self, JsonSchema::Scalar(name) if name.is_null_like())
    }

    /// True if a value matching this schema may be NULL
    pub fn admits_null(&self) -> bool {
        match self {
            JsonSchema::Any => true,
            JsonSchema::AnyOf(branches) => branches.iter().any(JsonSchema::is_null_type),
            other => other.is_null_type(),
        }
    }

    /// Type attributes reported for a column with this schema
    ///
    /// A union with two or more non-null branches is reported as the
    /// polymorphic `bson` type.
    pub fn type_info(&self) -> &'static BsonTypeInfo {
        match self {
            JsonSchema::Any => BsonTypeInfo::polymorphic(),
            JsonSchema::Scalar(name) => BsonTypeInfo::of(*name),
            JsonSchema::Object(_) => BsonTypeInfo::of(BsonTypeName::Object),
            JsonSchema::Array(_) => BsonTypeInfo::of(BsonTypeName::Array),
            JsonSchema::AnyOf(branches) => {
                let mut concrete = branches.iter().filter(|b| !b.is_null_type());
                match (concrete.next(), concrete.next()) {
                    (Some(only), None) => only.type_info(),
                    (None, _) => BsonTypeInfo::of(BsonTypeName::Null),
                    _ => BsonTypeInfo::polymorphic(),
                }
            }
        }
    }
}

impl ObjectSchema {
    fn from_document(doc: &Document) -> Result<ObjectSchema> {
        let mut properties = IndexMap::new();
        match doc.get("properties") {
            None => {}
            Some(Bson::Document(props)) => {
                for (name, value) in props {
                    let Bson::Document(sub) = value else {
                        return Err(format_err(format!(
                            "property '{}' is not a schema",
                            name
                        )));
                    };
                    properties.insert(name.clone(), JsonSchema::from_document(sub)?);
                }
            }
            Some(other) => {
                return Err(format_err(format!(
                    "properties must be a document, found {}",
                    other
                )));
            }
        }

        let mut required = BTreeSet::new();
        match doc.get("required") {
            None => {}
            Some(Bson::Array(names)) => {
                for name in names {
                    let Bson::String(name) = name else {
                        return Err(format_err(format!(
                            "required entries must be strings, found {}",
                            name
                        )));
                    };
                    required.insert(name.clone());
                }
            }
            Some(other) => {
                return Err(format_err(format!("required must be a list, found {}", other)));
            }
        }

        let additional_properties = match doc.get("additionalProperties") {
            None => false,
            Some(Bson::Boolean(allowed)) => *allowed,
            Some(Bson::Document(_)) => true,
            Some(other) => {
                return Err(format_err(format!(
                    "additionalProperties must be a boolean or a schema, found {}",
                    other
                )));
            }
        };

        Ok(ObjectSchema {
            properties,
            required,
            additional_properties,
        })
    }

    fn to_document(&self) -> Document {
        let mut properties = Document::new();
        for (name, schema) in &self.properties {
            properties.insert(name.clone(), schema.to_document());
        }
        doc! {
            "bsonType": "object",
            "properties": properties,
            "required": self.required.iter().cloned().collect::<Vec<_>>(),
            "additionalProperties": self.additional_properties,
        }
    }

    pub fn is_required(&self, name: &str) -> bool {
        self.required.contains(name)
    }

    /// Nullability of the named property
    ///
    /// An undeclared property is `Unknown` when it is required or additional
    /// properties are allowed, and `None` otherwise.
    pub fn nullability(&self, name: &str) -> Option<Nullability> {
        let required = self.is_required(name);
        let Some(schema) = self.properties.get(name) else {
            return (required || self.additional_properties).then_some(Nullability::Unknown);
        };
        if schema.admits_null() || !required {
            Some(Nullability::Nullable)
        } else {
            Some(Nullability::NoNulls)
        }
    }
}

/// The reply to a result schema request
///
/// Accepts either the versioned envelope
/// `{ok: 1, schema: {version: 1, jsonSchema: {...}}, selectOrder: [[table, column], ...]}`
/// or a bare schema document.
#[derive(Debug, Clone, PartialEq)]
pub struct ResultSchema {
    pub version: Option<i64>,
    pub schema: JsonSchema,
    /// Column order requested by the query, as (table, column) pairs
    pub select_order: Option<Vec<(String, String)>>,
}

impl ResultSchema {
    pub fn new(schema: JsonSchema) -> Self {
        Self {
            version: None,
            schema,
            select_order: None,
        }
    }

    pub fn from_document(doc: &Document) -> Result<ResultSchema> {
        let Some(envelope) = doc.get("schema") else {
            return Ok(Self::new(JsonSchema::from_document(doc)?));
        };
        if let Some(ok) = doc.get("ok")
            && !bson_truthy(ok)
        {
            let message = doc.get_str("errmsg").unwrap_or("server reported failure");
            return Err(TabsonError::SchemaUnavailable(message.to_string()));
        }
        let Bson::Document(envelope) = envelope else {
            return Err(format_err("schema must be a document"));
        };
        let version = match envelope.get("version") {
            None => None,
            Some(Bson::Int32(v)) => Some(*v as i64),
            Some(Bson::Int64(v)) => Some(*v),
            Some(other) => {
                return Err(format_err(format!("schema version must be an integer, found {}", other)));
            }
        };
        let schema = match envelope.get("jsonSchema") {
            Some(Bson::Document(json_schema)) => JsonSchema::from_document(json_schema)?,
            Some(other) => {
                return Err(format_err(format!("jsonSchema must be a document, found {}", other)));
            }
            None => return Err(format_err("schema envelope has no jsonSchema")),
        };
        let select_order = match doc.get("selectOrder") {
            None | Some(Bson::Null) => None,
            Some(Bson::Array(entries)) => Some(
                entries
                    .iter()
                    .map(parse_select_entry)
                    .collect::<Result<Vec<_>>>()?,
            ),
            Some(other) => {
                return Err(format_err(format!("selectOrder must be a list, found {}", other)));
            }
        };
        Ok(ResultSchema {
            version,
            schema,
            select_order,
        })
    }

    pub fn with_select_order(mut self, order: Vec<(String, String)>) -> Self {
        self.select_order = Some(order);
        self
    }
}

impl From<JsonSchema> for ResultSchema {
    fn from(schema: JsonSchema) -> Self {
        Self::new(schema)
    }
}

fn parse_select_entry(entry: &Bson) -> Result<(String, String)> {
    if let Bson::Array(pair) = entry
        && let [Bson::String(table), Bson::String(column)] = pair.as_slice()
    {
        return Ok((table.clone(), column.clone()));
    }
    Err(format_err(format!(
        "selectOrder entries must be [table, column] pairs, found {}",
        entry
    )))
}

fn bson_truthy(value: &Bson) -> bool {
    match value {
        Bson::Boolean(b) => *b,
        Bson::Int32(v) => *v != 0,
        Bson::Int64(v) => *v != 0,
        Bson::Double(v) => *v != 0.0,
        Bson::Null | Bson::Undefined => false,
        _ => true,
    }
}
