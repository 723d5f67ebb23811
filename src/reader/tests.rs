use std::sync::Arc;

use super::*;
use crate::shape::ScalarKind;

fn result_shape() -> Arc<MessageShape> {
    Arc::new(
        MessageShape::new(QName::types("Result"))
            .nillable_scalar("id", QName::types("id"), ScalarKind::String)
            .nillable_scalar("title", QName::types("title"), ScalarKind::String)
            .nillable_scalar("exactMass", QName::types("exactMass"), ScalarKind::String)
            .nillable_scalar("score", QName::types("score"), ScalarKind::String),
    )
}

fn record_info_shape() -> Arc<MessageShape> {
    Arc::new(
        MessageShape::new(QName::types("RecordInfo"))
            .nillable_scalar("id", QName::types("id"), ScalarKind::String)
            .nillable_scalar("info", QName::types("info"), ScalarKind::String),
    )
}

fn search_result_shape() -> Arc<MessageShape> {
    Arc::new(
        MessageShape::new(QName::types("SearchResult"))
            .scalar("numResults", QName::types("numResults"), ScalarKind::Int)
            .complex_array("results", QName::types("results"), result_shape()),
    )
}

fn registry() -> TypeRegistry {
    let mut types = TypeRegistry::new();
    types.register(result_shape());
    types.register(record_info_shape());
    types.register(search_result_shape());
    types
}

const SEARCH_RESULT: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<ns1:return xmlns:ns1="http://api.massbank" xmlns:ax21="http://api.massbank/xsd">
  <ax21:numResults>2</ax21:numResults>
  <ax21:results>
    <ax21:id>KO000001</ax21:id>
    <ax21:title>Glutamate</ax21:title>
    <ax21:exactMass>147.05</ax21:exactMass>
    <ax21:score>0.92</ax21:score>
  </ax21:results>
  <ax21:results>
    <ax21:id>KO000002</ax21:id>
    <ax21:title>Glutamine</ax21:title>
    <ax21:exactMass>146.07</ax21:exactMass>
    <ax21:score>0.31</ax21:score>
  </ax21:results>
</ns1:return>"#;

#[test]
fn test_parse_nested_records_and_array() {
    let types = registry();
    let rec = from_bytes(SEARCH_RESULT.as_bytes(), &search_result_shape(), &types).unwrap();

    assert_eq!(rec.get("numResults").unwrap().unwrap().as_int(), Some(2));
    let results = rec.get("results").unwrap().unwrap().as_array().unwrap();
    assert_eq!(results.len(), 2);

    let first = results[0].as_ref().unwrap().as_record().unwrap();
    assert_eq!(first.get("id").unwrap().unwrap().as_str(), Some("KO000001"));
    assert_eq!(first.get("score").unwrap().unwrap().as_str(), Some("0.92"));
    let second = results[1].as_ref().unwrap().as_record().unwrap();
    assert_eq!(second.get("title").unwrap().unwrap().as_str(), Some("Glutamine"));
}

#[test]
fn test_unmatched_field_is_absent_without_consuming_input() {
    // title is missing; exactMass must still bind to its own
    // descriptor further down the list.
    let xml = r#"<ax21:results xmlns:ax21="http://api.massbank/xsd">
        <ax21:id>KO000001</ax21:id>
        <ax21:exactMass>147.05</ax21:exactMass>
    </ax21:results>"#;
    let types = registry();
    let rec = from_bytes(xml.as_bytes(), &result_shape(), &types).unwrap();

    assert_eq!(rec.get("id").unwrap().unwrap().as_str(), Some("KO000001"));
    assert!(rec.field("title").unwrap().is_absent());
    assert_eq!(
        rec.get("exactMass").unwrap().unwrap().as_str(),
        Some("147.05")
    );
}

#[test]
fn test_nil_marker_parses_to_present_null() {
    let xml = r#"<ax21:results xmlns:ax21="http://api.massbank/xsd"
        xmlns:xsi="http://www.w3.org/2001/XMLSchema-instance">
        <ax21:id xsi:nil="1"/>
        <ax21:title>Glutamate</ax21:title>
    </ax21:results>"#;
    let types = registry();
    let rec = from_bytes(xml.as_bytes(), &result_shape(), &types).unwrap();

    assert!(rec.field("id").unwrap().is_null());
    assert!(rec.field("exactMass").unwrap().is_absent());
}

#[test]
fn test_nil_accepts_true_lexical_form() {
    let xml = r#"<ax21:results xmlns:ax21="http://api.massbank/xsd"
        xmlns:xsi="http://www.w3.org/2001/XMLSchema-instance">
        <ax21:id xsi:nil="true"></ax21:id>
    </ax21:results>"#;
    let types = registry();
    let rec = from_bytes(xml.as_bytes(), &result_shape(), &types).unwrap();
    assert!(rec.field("id").unwrap().is_null());
}

#[test]
fn test_scalar_whitespace_is_preserved() {
    let xml = r#"<ax21:results xmlns:ax21="http://api.massbank/xsd">
        <ax21:id>  KO 000001  </ax21:id>
        <ax21:title>   </ax21:title>
    </ax21:results>"#;
    let types = registry();
    let rec = from_bytes(xml.as_bytes(), &result_shape(), &types).unwrap();

    assert_eq!(
        rec.get("id").unwrap().unwrap().as_str(),
        Some("  KO 000001  ")
    );
    assert_eq!(rec.get("title").unwrap().unwrap().as_str(), Some("   "));
}

#[test]
fn test_stray_text_between_fields_is_rejected() {
    let xml = r#"<ax21:results xmlns:ax21="http://api.massbank/xsd">
        <ax21:id>KO000001</ax21:id>stray</ax21:results>"#;
    let types = registry();
    let err = from_bytes(xml.as_bytes(), &result_shape(), &types).unwrap_err();
    assert!(matches!(err, BindError::MalformedStream(_)));
}

#[test]
fn test_nil_root_parses_to_all_absent_record() {
    let xml = r#"<ns1:return xmlns:ns1="http://api.massbank"
        xmlns:xsi="http://www.w3.org/2001/XMLSchema-instance" xsi:nil="1"/>"#;
    let types = registry();
    let rec = from_bytes(xml.as_bytes(), &result_shape(), &types).unwrap();

    for name in ["id", "title", "exactMass", "score"] {
        assert!(rec.field(name).unwrap().is_absent());
    }
}

#[test]
fn test_array_preserves_order_and_interior_nulls() {
    let shape = Arc::new(
        MessageShape::new(QName::service("getRecordInfo"))
            .scalar_array("ids", QName::service("ids"), ScalarKind::String),
    );
    let xml = r#"<ns1:getRecordInfo xmlns:ns1="http://api.massbank"
        xmlns:xsi="http://www.w3.org/2001/XMLSchema-instance">
        <ns1:ids xsi:nil="1"/>
        <ns1:ids>a</ns1:ids>
        <ns1:ids xsi:nil="1"/>
        <ns1:ids>b</ns1:ids>
    </ns1:getRecordInfo>"#;
    let types = TypeRegistry::new();
    let rec = from_bytes(xml.as_bytes(), &shape, &types).unwrap();

    let items = rec.get("ids").unwrap().unwrap().as_array().unwrap();
    assert_eq!(items.len(), 4);
    assert!(items[0].is_none());
    assert_eq!(items[1].as_ref().unwrap().as_str(), Some("a"));
    assert!(items[2].is_none());
    assert_eq!(items[3].as_ref().unwrap().as_str(), Some("b"));
}

#[test]
fn test_trailing_element_is_schema_violation() {
    let xml = r#"<ax21:results xmlns:ax21="http://api.massbank/xsd">
        <ax21:id>KO000001</ax21:id>
        <ax21:bogus>?</ax21:bogus>
    </ax21:results>"#;
    let types = registry();
    let err = from_bytes(xml.as_bytes(), &result_shape(), &types).unwrap_err();
    assert!(matches!(err, BindError::UnexpectedElement(name) if name.contains("bogus")));
}

#[test]
fn test_element_out_of_declared_order_is_rejected() {
    // score precedes id: the descriptor walk passes score's slot
    // before reaching it, so it surfaces as an unexpected trailer.
    let xml = r#"<ax21:results xmlns:ax21="http://api.massbank/xsd">
        <ax21:score>0.92</ax21:score>
        <ax21:id>KO000001</ax21:id>
    </ax21:results>"#;
    let types = registry();
    let rec = from_bytes(xml.as_bytes(), &result_shape(), &types);
    // score binds, id then trails out of schema
    assert!(matches!(
        rec.unwrap_err(),
        BindError::UnexpectedElement(name) if name.contains("id")
    ));
}

#[test]
fn test_xsi_type_dispatches_to_registered_shape() {
    let xml = r#"<ns1:return xmlns:ns1="http://api.massbank"
        xmlns:ax21="http://api.massbank/xsd"
        xmlns:xsi="http://www.w3.org/2001/XMLSchema-instance"
        xsi:type="ax21:RecordInfo">
        <ax21:id>KO000001</ax21:id>
        <ax21:info>ACCESSION: KO000001</ax21:info>
    </ns1:return>"#;
    let types = registry();
    // Statically we expect a Result, but the wire declares RecordInfo.
    let rec = from_bytes(xml.as_bytes(), &result_shape(), &types).unwrap();

    assert_eq!(rec.shape().type_name, QName::types("RecordInfo"));
    assert_eq!(
        rec.get("info").unwrap().unwrap().as_str(),
        Some("ACCESSION: KO000001")
    );
}

#[test]
fn test_xsi_type_naming_expected_type_is_not_an_override() {
    let xml = r#"<ns1:return xmlns:ns1="http://api.massbank"
        xmlns:ax21="http://api.massbank/xsd"
        xmlns:xsi="http://www.w3.org/2001/XMLSchema-instance"
        xsi:type="ax21:Result">
        <ax21:id>KO000001</ax21:id>
    </ns1:return>"#;
    let types = TypeRegistry::new(); // empty: dispatch must not be consulted
    let rec = from_bytes(xml.as_bytes(), &result_shape(), &types).unwrap();
    assert_eq!(rec.shape().type_name, QName::types("Result"));
}

#[test]
fn test_unregistered_xsi_type_fails() {
    let xml = r#"<ns1:return xmlns:ns1="http://api.massbank"
        xmlns:ax21="http://api.massbank/xsd"
        xmlns:xsi="http://www.w3.org/2001/XMLSchema-instance"
        xsi:type="ax21:Mystery"/>"#;
    let types = registry();
    let err = from_bytes(xml.as_bytes(), &result_shape(), &types).unwrap_err();
    assert!(matches!(err, BindError::UnsupportedType(name) if name.contains("Mystery")));
}

#[test]
fn test_premature_end_of_input() {
    let xml = r#"<ax21:results xmlns:ax21="http://api.massbank/xsd"><ax21:id>KO"#;
    let types = registry();
    let err = from_bytes(xml.as_bytes(), &result_shape(), &types).unwrap_err();
    assert!(matches!(
        err,
        BindError::MalformedStream(_) | BindError::Xml(_)
    ));
}

#[test]
fn test_undeclared_prefix_is_malformed() {
    let xml = r#"<ax21:results><ax21:id>KO000001</ax21:id></ax21:results>"#;
    let types = registry();
    let err = from_bytes(xml.as_bytes(), &result_shape(), &types).unwrap_err();
    assert!(matches!(err, BindError::MalformedStream(_)));
}

#[test]
fn test_empty_string_element() {
    let xml = r#"<ax21:results xmlns:ax21="http://api.massbank/xsd">
        <ax21:id></ax21:id>
    </ax21:results>"#;
    let types = registry();
    let rec = from_bytes(xml.as_bytes(), &result_shape(), &types).unwrap();
    assert_eq!(rec.get("id").unwrap().unwrap().as_str(), Some(""));
}
