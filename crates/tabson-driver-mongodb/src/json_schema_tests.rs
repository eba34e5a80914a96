//! Unit tests for schema parsing and simplification

use super::*;

use bson::{Document, doc};
use indexmap::IndexMap;
use pretty_assertions::assert_eq;
use std::collections::BTreeSet;
use tabson_core::{Nullability, TabsonError};

fn scalar(name: BsonTypeName) -> JsonSchema {
    JsonSchema::Scalar(name)
}

fn parse(doc: Document) -> JsonSchema {
    JsonSchema::from_document(&doc).unwrap()
}

fn object(props: Vec<(&str, JsonSchema)>, required: &[&str]) -> JsonSchema {
    JsonSchema::Object(ObjectSchema {
        properties: props
            .into_iter()
            .map(|(k, v)| (k.to_string(), v))
            .collect::<IndexMap<_, _>>(),
        required: required.iter().map(|s| s.to_string()).collect::<BTreeSet<_>>(),
        additional_properties: false,
    })
}

// ============================================================================
// Simplification Tests
// ============================================================================

mod simplify_tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_single_bson_type() {
        assert_eq!(parse(doc! { "bsonType": "int" }), scalar(BsonTypeName::Int));
    }

    #[test]
    fn test_bson_type_list_becomes_any_of() {
        assert_eq!(
            parse(doc! { "bsonType": ["int", "string"] }),
            JsonSchema::AnyOf(vec![scalar(BsonTypeName::Int), scalar(BsonTypeName::String)])
        );
    }

    #[test]
    fn test_any_of_compares_as_set() {
        assert_eq!(
            parse(doc! { "bsonType": ["string", "int"] }),
            parse(doc! { "anyOf": [{ "bsonType": "int" }, { "bsonType": "string" }] })
        );
    }

    #[test]
    fn test_nullable_leaf_is_kept() {
        let schema = parse(doc! { "bsonType": ["int", "null"] });
        assert_eq!(
            schema,
            JsonSchema::AnyOf(vec![scalar(BsonTypeName::Int), scalar(BsonTypeName::Null)])
        );
        assert!(schema.admits_null());
    }

    #[test]
    fn test_duplicates_removed_and_single_branch_unwrapped() {
        assert_eq!(
            parse(doc! { "anyOf": [{ "bsonType": "int" }, { "bsonType": "int" }] }),
            scalar(BsonTypeName::Int)
        );
        assert_eq!(
            parse(doc! { "bsonType": ["long", "long"] }),
            scalar(BsonTypeName::Long)
        );
    }

    #[test]
    fn test_nested_any_of_is_flattened() {
        let schema = parse(doc! {
            "anyOf": [
                { "bsonType": "int" },
                { "anyOf": [{ "bsonType": "string" }, { "anyOf": [{ "bsonType": "null" }] }] },
            ]
        });
        assert_eq!(
            schema,
            JsonSchema::AnyOf(vec![
                scalar(BsonTypeName::Int),
                scalar(BsonTypeName::String),
                scalar(BsonTypeName::Null),
            ])
        );
    }

    #[test]
    fn test_bson_type_and_any_of_are_merged() {
        assert_eq!(
            parse(doc! { "bsonType": "int", "anyOf": [{ "bsonType": "null" }] }),
            JsonSchema::AnyOf(vec![scalar(BsonTypeName::Int), scalar(BsonTypeName::Null)])
        );
    }

    #[test]
    fn test_empty_schema_is_any() {
        assert_eq!(parse(doc! {}), JsonSchema::Any);
        assert!(parse(doc! { "description": "anything" }).is_any());
    }

    #[test]
    fn test_any_absorbs_union() {
        assert_eq!(
            parse(doc! { "anyOf": [{ "bsonType": "int" }, {}] }),
            JsonSchema::Any
        );
    }

    #[test]
    fn test_properties_without_type_is_object() {
        let schema = parse(doc! { "properties": { "a": { "bsonType": "int" } } });
        assert_eq!(schema, object(vec![("a", scalar(BsonTypeName::Int))], &[]));
    }

    #[test]
    fn test_object_keeps_empty_properties_and_required() {
        let schema = parse(doc! { "bsonType": "object" });
        let object = schema.as_object().unwrap();
        assert!(object.properties.is_empty());
        assert!(object.required.is_empty());
        assert!(!object.additional_properties);
    }

    #[test]
    fn test_recursion_into_properties_and_items() {
        let schema = parse(doc! {
            "bsonType": "object",
            "properties": {
                "tags": { "bsonType": "array", "items": { "bsonType": ["string", "string"] } },
                "nested": { "bsonType": "object", "properties": { "x": { "bsonType": ["double"] } } },
            },
            "required": ["tags"],
        });
        assert_eq!(
            schema,
            object(
                vec![
                    ("tags", JsonSchema::Array(Box::new(scalar(BsonTypeName::String)))),
                    ("nested", object(vec![("x", scalar(BsonTypeName::Double))], &[])),
                ],
                &["tags"],
            )
        );
    }

    #[test]
    fn test_object_branch_of_type_list_takes_properties() {
        let schema = parse(doc! {
            "bsonType": ["object", "null"],
            "properties": { "a": { "bsonType": "int" } },
        });
        assert_eq!(
            schema,
            JsonSchema::AnyOf(vec![
                object(vec![("a", scalar(BsonTypeName::Int))], &[]),
                scalar(BsonTypeName::Null),
            ])
        );
    }

    #[test]
    fn test_array_items_defaults() {
        assert_eq!(
            parse(doc! { "bsonType": "array" }),
            JsonSchema::Array(Box::new(JsonSchema::Any))
        );
        assert_eq!(
            parse(doc! { "bsonType": "array", "items": [{ "bsonType": "int" }] }),
            JsonSchema::Array(Box::new(JsonSchema::Any))
        );
    }

    #[test]
    fn test_additional_properties() {
        let schema = parse(doc! { "bsonType": "object", "additionalProperties": true });
        assert!(schema.as_object().unwrap().additional_properties);
        let schema = parse(doc! { "bsonType": "object", "additionalProperties": { "bsonType": "int" } });
        assert!(schema.as_object().unwrap().additional_properties);
    }

    #[test]
    fn test_from_json() {
        let json = serde_json::json!({ "bsonType": ["int", "null"] });
        assert_eq!(
            JsonSchema::from_json(&json).unwrap(),
            parse(doc! { "bsonType": ["null", "int"] })
        );
    }
}

// ============================================================================
// Idempotence Tests
// ============================================================================

mod idempotence_tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn assert_idempotent(doc: Document) {
        let once = parse(doc);
        let twice = JsonSchema::from_document(&once.to_document()).unwrap();
        assert_eq!(twice, once);
        assert_eq!(twice.to_document(), once.to_document());
    }

    #[test]
    fn test_scalar() {
        assert_idempotent(doc! { "bsonType": "decimal" });
    }

    #[test]
    fn test_any() {
        assert_idempotent(doc! {});
    }

    #[test]
    fn test_nested() {
        assert_idempotent(doc! {
            "bsonType": "object",
            "properties": {
                "foo": {
                    "bsonType": "object",
                    "properties": {
                        "a": { "anyOf": [{ "bsonType": "int" }, { "bsonType": "string" }] },
                        "b": { "bsonType": ["int", "null"] },
                        "c": { "bsonType": "array", "items": { "bsonType": ["object", "null"] } },
                    },
                    "required": ["a"],
                    "additionalProperties": false,
                },
            },
        });
    }
}

// ============================================================================
// Malformed Schema Tests
// ============================================================================

mod malformed_tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn parse_err(doc: Document) -> TabsonError {
        JsonSchema::from_document(&doc).unwrap_err()
    }

    #[test]
    fn test_property_not_a_schema() {
        let err = parse_err(doc! { "bsonType": "object", "properties": { "a": 5 } });
        assert!(matches!(err, TabsonError::SchemaFormat(ref m) if m.contains("'a'")));
    }

    #[test]
    fn test_bad_bson_type_value() {
        assert!(matches!(parse_err(doc! { "bsonType": 3 }), TabsonError::SchemaFormat(_)));
        assert!(matches!(parse_err(doc! { "bsonType": [1] }), TabsonError::SchemaFormat(_)));
        assert!(matches!(parse_err(doc! { "bsonType": [] }), TabsonError::SchemaFormat(_)));
    }

    #[test]
    fn test_unknown_type_name() {
        assert!(matches!(
            parse_err(doc! { "bsonType": "integer" }),
            TabsonError::InvalidTypeName(_)
        ));
    }

    #[test]
    fn test_bad_any_of() {
        assert!(matches!(parse_err(doc! { "anyOf": [] }), TabsonError::SchemaFormat(_)));
        assert!(matches!(parse_err(doc! { "anyOf": ["int"] }), TabsonError::SchemaFormat(_)));
        assert!(matches!(parse_err(doc! { "anyOf": { "bsonType": "int" } }), TabsonError::SchemaFormat(_)));
    }

    #[test]
    fn test_bad_required_and_items() {
        assert!(matches!(
            parse_err(doc! { "bsonType": "object", "required": "a" }),
            TabsonError::SchemaFormat(_)
        ));
        assert!(matches!(
            parse_err(doc! { "bsonType": "object", "required": [1] }),
            TabsonError::SchemaFormat(_)
        ));
        assert!(matches!(
            parse_err(doc! { "bsonType": "array", "items": "int" }),
            TabsonError::SchemaFormat(_)
        ));
        assert!(matches!(
            parse_err(doc! { "bsonType": "object", "additionalProperties": 1 }),
            TabsonError::SchemaFormat(_)
        ));
    }

    #[test]
    fn test_json_must_be_object() {
        assert!(matches!(
            JsonSchema::from_json(&serde_json::json!([1, 2])),
            Err(TabsonError::SchemaFormat(_))
        ));
    }
}

// ============================================================================
// Nullability and Column Type Tests
// ============================================================================

mod nullability_tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn foo() -> ObjectSchema {
        parse(doc! {
            "bsonType": "object",
            "properties": {
                "a": { "bsonType": "int" },
                "b": { "bsonType": ["int", "null"] },
                "c": { "bsonType": "null" },
                "d": {},
                "e": { "bsonType": ["int", "string"] },
                "f": { "bsonType": "string" },
            },
            "required": ["a", "b", "c", "d", "e", "z"],
        })
        .as_object()
        .cloned()
        .unwrap()
    }

    #[test]
    fn test_required_scalar_has_no_nulls() {
        assert_eq!(foo().nullability("a"), Some(Nullability::NoNulls));
    }

    #[test]
    fn test_null_branch_is_nullable() {
        assert_eq!(foo().nullability("b"), Some(Nullability::Nullable));
        assert_eq!(foo().nullability("c"), Some(Nullability::Nullable));
    }

    #[test]
    fn test_any_is_nullable() {
        assert_eq!(foo().nullability("d"), Some(Nullability::Nullable));
    }

    #[test]
    fn test_required_union_without_null() {
        assert_eq!(foo().nullability("e"), Some(Nullability::NoNulls));
    }

    #[test]
    fn test_optional_field_is_nullable() {
        assert_eq!(foo().nullability("f"), Some(Nullability::Nullable));
    }

    #[test]
    fn test_undeclared_fields() {
        assert_eq!(foo().nullability("z"), Some(Nullability::Unknown));
        assert_eq!(foo().nullability("nope"), None);
    }

    #[test]
    fn test_column_type_info() {
        let foo = foo();
        assert_eq!(foo.properties["a"].type_info().name, "int");
        assert_eq!(foo.properties["b"].type_info().name, "int");
        assert_eq!(foo.properties["c"].type_info().name, "null");
        assert_eq!(foo.properties["d"].type_info().name, "bson");
        assert_eq!(foo.properties["e"].type_info().name, "bson");
        assert_eq!(parse(doc! { "bsonType": "object" }).type_info().name, "object");
        assert_eq!(parse(doc! { "bsonType": "array" }).type_info().name, "array");
    }
}

// ============================================================================
// Result Schema Envelope Tests
// ============================================================================

mod result_schema_tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_versioned_envelope() {
        let reply = doc! {
            "ok": 1,
            "schema": {
                "version": 1,
                "jsonSchema": {
                    "bsonType": "object",
                    "properties": { "foo": { "bsonType": "object", "properties": { "a": { "bsonType": "int" } } } },
                },
            },
            "selectOrder": [["foo", "a"]],
        };
        let result = ResultSchema::from_document(&reply).unwrap();
        assert_eq!(result.version, Some(1));
        assert_eq!(
            result.select_order,
            Some(vec![("foo".to_string(), "a".to_string())])
        );
        assert!(result.schema.as_object().unwrap().properties.contains_key("foo"));
    }

    #[test]
    fn test_bare_schema() {
        let result = ResultSchema::from_document(&doc! { "bsonType": "object" }).unwrap();
        assert_eq!(result.version, None);
        assert_eq!(result.select_order, None);
        assert_eq!(result, ResultSchema::new(parse(doc! { "bsonType": "object" })));
    }

    #[test]
    fn test_failed_reply() {
        let reply = doc! { "ok": 0, "errmsg": "no such collection", "schema": {} };
        let err = ResultSchema::from_document(&reply).unwrap_err();
        assert!(matches!(err, TabsonError::SchemaUnavailable(ref m) if m == "no such collection"));
    }

    #[test]
    fn test_malformed_envelope() {
        assert!(matches!(
            ResultSchema::from_document(&doc! { "schema": { "version": 1 } }),
            Err(TabsonError::SchemaFormat(_))
        ));
        assert!(matches!(
            ResultSchema::from_document(&doc! {
                "schema": { "jsonSchema": {} },
                "selectOrder": [["only-table"]],
            }),
            Err(TabsonError::SchemaFormat(_))
        ));
    }
}
