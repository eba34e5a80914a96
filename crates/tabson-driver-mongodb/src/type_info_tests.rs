//! Unit tests for the BSON type registry

use super::*;

use bson::{Bson, doc, oid::ObjectId};
use pretty_assertions::assert_eq;
use rstest::rstest;
use strum::IntoEnumIterator;
use tabson_core::{MetadataStrategy, SqlType, TabsonError};

// ============================================================================
// Registry Entry Tests
// ============================================================================

mod registry_tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[rstest]
    #[case("double", SqlType::Double, 15, 15, true)]
    #[case("string", SqlType::LongVarchar, 0, 0, false)]
    #[case("int", SqlType::Integer, 10, 0, true)]
    #[case("long", SqlType::Integer, 19, 0, true)]
    #[case("decimal", SqlType::Decimal, 34, 34, true)]
    #[case("objectId", SqlType::LongVarchar, 24, 0, false)]
    #[case("date", SqlType::Timestamp, 24, 0, false)]
    #[case("bool", SqlType::Bit, 1, 0, false)]
    #[case("binData", SqlType::Blob, 0, 0, false)]
    #[case("null", SqlType::Null, 0, 0, false)]
    #[case("bson", SqlType::Other, 0, 0, true)]
    fn test_entry_attributes(
        #[case] name: &str,
        #[case] sql_type: SqlType,
        #[case] display_size: u32,
        #[case] scale: u32,
        #[case] signed: bool,
    ) {
        let info = BsonTypeInfo::lookup(name).unwrap();
        assert_eq!(info.name, name);
        assert_eq!(info.sql_type, sql_type);
        assert_eq!(info.display_size, display_size);
        assert_eq!(info.scale, scale);
        assert_eq!(info.signed, signed);
    }

    #[test]
    fn test_long_keeps_integer_code() {
        assert_eq!(BSON_LONG.sql_type.code(), 4);
        assert_eq!(BSON_LONG.precision, 19);
    }

    #[test]
    fn test_string_is_case_sensitive() {
        assert!(BSON_STRING.case_sensitive);
        assert!(BSON_REGEX.case_sensitive);
        assert!(!BSON_INT.case_sensitive);
        assert!(!BSON_OBJECT_ID.case_sensitive);
    }

    #[test]
    fn test_unknown_name_is_rejected() {
        let err = BsonTypeInfo::lookup("varchar").unwrap_err();
        assert!(matches!(err, TabsonError::InvalidTypeName(ref n) if n == "varchar"));
        assert!(matches!(
            "Int".parse::<BsonTypeName>(),
            Err(TabsonError::InvalidTypeName(_))
        ));
    }

    #[test]
    fn test_polymorphic_entry() {
        let info = BsonTypeInfo::polymorphic();
        assert_eq!(info.name, "bson");
        assert!(info.is_polymorphic());
        assert_eq!(info.host_class, Some(BsonValue::TYPE_NAME));
        assert!(!BSON_INT.is_polymorphic());
    }

    #[test]
    fn test_every_name_has_an_entry() {
        for name in BsonTypeName::iter() {
            let info = BsonTypeInfo::of(name);
            assert_eq!(info.name, name.as_str());
            assert_eq!(BsonTypeInfo::lookup(name.as_str()).unwrap(), info);
        }
        assert_eq!(TYPE_INFOS.len(), BsonTypeName::iter().count() + 1);
    }

    #[test]
    fn test_name_round_trip() {
        for name in BsonTypeName::iter() {
            assert_eq!(name.as_str().parse::<BsonTypeName>().unwrap(), name);
            assert_eq!(name.to_string(), name.as_str());
        }
    }

    #[test]
    fn test_null_has_no_host_class() {
        assert_eq!(BSON_NULL.host_class, None);
        assert_eq!(BSON_DOUBLE.host_class, Some("f64"));
        assert_eq!(BSON_OBJECT.host_class, Some(BsonValue::TYPE_NAME));
    }
}

// ============================================================================
// Decimal Precision Tests
// ============================================================================

mod precision_tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_decimal_precision_depends_on_strategy() {
        assert_eq!(BSON_DECIMAL.precision_for(MetadataStrategy::SchemaKnown), 6145);
        assert_eq!(BSON_DECIMAL.precision_for(MetadataStrategy::RowDerived), 11);
    }

    #[test]
    fn test_other_precisions_ignore_strategy() {
        for strategy in [MetadataStrategy::SchemaKnown, MetadataStrategy::RowDerived] {
            assert_eq!(BSON_INT.precision_for(strategy), 10);
            assert_eq!(BSON_DATE.precision_for(strategy), 24);
            assert_eq!(BSON_STRING.precision_for(strategy), 0);
        }
    }
}

// ============================================================================
// Value Classification Tests
// ============================================================================

mod value_tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[rstest]
    #[case(Bson::Int32(1), "int")]
    #[case(Bson::Int64(1), "long")]
    #[case(Bson::Double(1.5), "double")]
    #[case(Bson::String("a".into()), "string")]
    #[case(Bson::Boolean(true), "bool")]
    #[case(Bson::Null, "null")]
    #[case(Bson::Undefined, "undefined")]
    #[case(Bson::Document(doc! { "a": 1 }), "object")]
    #[case(Bson::Array(vec![]), "array")]
    #[case(Bson::DateTime(bson::DateTime::from_millis(0)), "date")]
    #[case(Bson::ObjectId(ObjectId::new()), "objectId")]
    #[case(Bson::MinKey, "minKey")]
    #[case(Bson::Symbol("s".into()), "symbol")]
    fn test_of_value(#[case] value: Bson, #[case] expected: &str) {
        assert_eq!(BsonTypeName::of_value(&value).as_str(), expected);
        assert_eq!(BsonTypeInfo::of_value(&value).name, expected);
    }

    #[test]
    fn test_null_like() {
        assert!(BsonTypeName::Null.is_null_like());
        assert!(BsonTypeName::Undefined.is_null_like());
        assert!(!BsonTypeName::Int.is_null_like());
    }
}
