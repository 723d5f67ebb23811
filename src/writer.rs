//! Serialization of typed records into XML elements.
//!
//! The writer walks a message shape's field descriptors in declaration
//! order: absent fields emit nothing, null fields emit a nil-marked
//! element, arrays emit one sibling element per item, and nested
//! records recurse. Namespace prefixes are allocated once per
//! top-level call and every binding the record tree needs is declared
//! on the root element, so no prefix is ever used outside the scope
//! that declares it.

use std::io::Write;

use quick_xml::events::{BytesEnd, BytesStart, BytesText, Event};
use quick_xml::Writer;

use crate::error::BindError;
use crate::namespace::PrefixScope;
use crate::qname::{QName, NS_XSI};
use crate::shape::{FieldDescriptor, FieldKind};
use crate::value::{Field, Record, Value};

/// Streaming writer turning records into XML.
pub struct ElementWriter<W: Write> {
    writer: Writer<W>,
}

impl<W: Write> ElementWriter<W> {
    pub fn new(inner: W) -> Self {
        Self {
            writer: Writer::new(inner),
        }
    }

    pub fn into_inner(self) -> W {
        self.writer.into_inner()
    }

    /// Serialize one record as a complete element tree.
    ///
    /// The element is named `name`, or the shape's well-known element
    /// name when `name` is `None`. `declare_type` adds an `xsi:type`
    /// attribute naming the record's runtime type; callers request it
    /// when the statically declared type differs from the actual one.
    pub fn serialize(
        &mut self,
        record: &Record,
        name: Option<&QName>,
        declare_type: bool,
    ) -> Result<(), BindError> {
        let elem = match name.or(record.shape().element_name.as_ref()) {
            Some(q) => q.clone(),
            None => {
                return Err(BindError::NoElementName(
                    record.shape().type_name.to_string(),
                ))
            }
        };

        // One prefix scope per top-level invocation. All namespaces
        // the tree will touch are bound now and declared on the root
        // element; nested elements only ever reference them.
        let mut scope = PrefixScope::new();
        let mut uris = Vec::new();
        collect_namespaces(record, &elem, declare_type, &mut uris);
        let mut declarations = Vec::new();
        for uri in &uris {
            let (prefix, fresh) = scope.register_or_get(uri);
            if fresh {
                declarations.push((prefix, uri.clone()));
            }
        }

        self.write_record(record, &elem, declare_type, &declarations, &scope)
    }

    fn write_record(
        &mut self,
        record: &Record,
        elem: &QName,
        declare_type: bool,
        declarations: &[(String, String)],
        scope: &PrefixScope,
    ) -> Result<(), BindError> {
        // Nillability is checked for the whole message before its
        // start tag goes out, so a failure leaves no partial output
        // for this message.
        check_nillable(record)?;

        let tag = qualified(scope, elem);
        let mut start = BytesStart::new(tag.as_str());
        for (prefix, uri) in declarations {
            start.push_attribute((format!("xmlns:{prefix}").as_str(), uri.as_str()));
        }
        if declare_type {
            let type_name = &record.shape().type_name;
            log::debug!("declaring xsi:type {} on <{}>", type_name, elem);
            start.push_attribute((
                format!("{}:type", xsi_prefix(scope)).as_str(),
                qualified(scope, type_name).as_str(),
            ));
        }
        self.writer.write_event(Event::Start(start))?;

        let shape = record.shape().clone();
        for (fd, field) in shape.fields.iter().zip(record.fields()) {
            match field {
                Field::Absent => {}
                Field::Null => self.write_nil(&fd.qname, scope)?,
                Field::Set(Value::Array(items)) => {
                    for item in items {
                        match item {
                            None => self.write_nil(&fd.qname, scope)?,
                            Some(v) => self.write_item(fd, v, scope)?,
                        }
                    }
                }
                Field::Set(v) => self.write_item(fd, v, scope)?,
            }
        }

        self.writer
            .write_event(Event::End(BytesEnd::new(tag.as_str())))?;
        Ok(())
    }

    fn write_item(
        &mut self,
        fd: &FieldDescriptor,
        value: &Value,
        scope: &PrefixScope,
    ) -> Result<(), BindError> {
        match value {
            Value::Scalar(s) => {
                let tag = qualified(scope, &fd.qname);
                self.writer
                    .write_event(Event::Start(BytesStart::new(tag.as_str())))?;
                self.writer
                    .write_event(Event::Text(BytesText::new(&s.to_lexical())))?;
                self.writer
                    .write_event(Event::End(BytesEnd::new(tag.as_str())))?;
                Ok(())
            }
            Value::Record(r) => {
                let declare = match &fd.kind {
                    FieldKind::Complex(expected) => r.shape().type_name != expected.type_name,
                    // A record under a scalar descriptor is rejected
                    // at set() time; never declared here.
                    FieldKind::Scalar(_) => false,
                };
                self.write_record(r, &fd.qname, declare, &[], scope)
            }
            // Nested arrays are unrepresentable through set().
            Value::Array(_) => Err(BindError::ValueShapeMismatch {
                field: fd.name.clone(),
                reason: "nested array".into(),
            }),
        }
    }

    fn write_nil(&mut self, qname: &QName, scope: &PrefixScope) -> Result<(), BindError> {
        let tag = qualified(scope, qname);
        let mut start = BytesStart::new(tag.as_str());
        start.push_attribute((format!("{}:nil", xsi_prefix(scope)).as_str(), "1"));
        self.writer.write_event(Event::Empty(start))?;
        Ok(())
    }
}

/// Serialize a record to a UTF-8 byte buffer.
pub fn to_bytes(
    record: &Record,
    name: Option<&QName>,
    declare_type: bool,
) -> Result<Vec<u8>, BindError> {
    let mut writer = ElementWriter::new(Vec::new());
    writer.serialize(record, name, declare_type)?;
    Ok(writer.into_inner())
}

/// Prefix bound to the XML Schema instance namespace in this scope.
/// `collect_namespaces` registers it ahead of every nil marker or
/// type declaration, so the lookup succeeds whenever this is called.
fn xsi_prefix(scope: &PrefixScope) -> &str {
    scope.lookup(NS_XSI).unwrap_or("xsi")
}

fn qualified(scope: &PrefixScope, qname: &QName) -> String {
    match scope.lookup(&qname.namespace) {
        Some(prefix) if !prefix.is_empty() => format!("{}:{}", prefix, qname.local),
        _ => qname.local.clone(),
    }
}

/// Order-preserving collection of every namespace URI the element
/// tree will reference, so the root element can declare them all.
fn collect_namespaces(record: &Record, elem: &QName, declare_type: bool, out: &mut Vec<String>) {
    push_uri(out, &elem.namespace);
    if declare_type {
        push_uri(out, NS_XSI);
        push_uri(out, &record.shape().type_name.namespace);
    }

    let shape = record.shape().clone();
    for (fd, field) in shape.fields.iter().zip(record.fields()) {
        let nested_declare = |r: &Record| match &fd.kind {
            FieldKind::Complex(expected) => r.shape().type_name != expected.type_name,
            FieldKind::Scalar(_) => false,
        };
        match field {
            Field::Absent => {}
            Field::Null => {
                push_uri(out, NS_XSI);
                push_uri(out, &fd.qname.namespace);
            }
            Field::Set(Value::Scalar(_)) => push_uri(out, &fd.qname.namespace),
            Field::Set(Value::Record(r)) => {
                collect_namespaces(r, &fd.qname, nested_declare(r), out);
            }
            Field::Set(Value::Array(items)) => {
                push_uri(out, &fd.qname.namespace);
                for item in items {
                    match item {
                        None => push_uri(out, NS_XSI),
                        Some(Value::Record(r)) => {
                            collect_namespaces(r, &fd.qname, nested_declare(r), out);
                        }
                        Some(_) => {}
                    }
                }
            }
        }
    }
}

fn push_uri(out: &mut Vec<String>, uri: &str) {
    if !uri.is_empty() && !out.iter().any(|u| u == uri) {
        out.push(uri.to_string());
    }
}

fn check_nillable(record: &Record) -> Result<(), BindError> {
    for (fd, field) in record.shape().fields.iter().zip(record.fields()) {
        if fd.nillable {
            continue;
        }
        let null = match field {
            Field::Null => true,
            Field::Set(Value::Array(items)) => items.iter().any(Option::is_none),
            _ => false,
        };
        if null {
            return Err(BindError::FieldCannotBeNull(fd.name.clone()));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::shape::{MessageShape, ScalarKind};

    fn result_shape() -> Arc<MessageShape> {
        Arc::new(
            MessageShape::new(QName::types("Result"))
                .nillable_scalar("id", QName::types("id"), ScalarKind::String)
                .nillable_scalar("score", QName::types("score"), ScalarKind::Double),
        )
    }

    fn request_shape() -> Arc<MessageShape> {
        Arc::new(
            MessageShape::new(QName::service("getRecordInfo"))
                .element(QName::service("getRecordInfo"))
                .scalar_array("ids", QName::service("ids"), ScalarKind::String),
        )
    }

    fn xml(record: &Record, name: Option<&QName>, declare: bool) -> String {
        String::from_utf8(to_bytes(record, name, declare).unwrap()).unwrap()
    }

    #[test]
    fn test_absent_field_emits_nothing() {
        let mut rec = Record::new(result_shape());
        rec.set("id", Value::string("XX000001")).unwrap();

        let out = xml(&rec, Some(&QName::service("return")), false);
        assert_eq!(
            out,
            "<ns1:return xmlns:ns1=\"http://api.massbank\" xmlns:ax21=\"http://api.massbank/xsd\">\
             <ax21:id>XX000001</ax21:id></ns1:return>"
        );
    }

    #[test]
    fn test_null_field_emits_nil_marker() {
        let mut rec = Record::new(result_shape());
        rec.set_null("score").unwrap();

        let out = xml(&rec, Some(&QName::service("return")), false);
        assert!(out.contains("<ax21:score xsi:nil=\"1\"/>"));
        assert!(out.contains("xmlns:xsi=\"http://www.w3.org/2001/XMLSchema-instance\""));
    }

    #[test]
    fn test_array_emits_one_sibling_per_item() {
        let mut rec = Record::new(request_shape());
        rec.set(
            "ids",
            Value::strings([None, Some("a".to_string()), None, Some("b".to_string())]),
        )
        .unwrap();

        let out = xml(&rec, None, false);
        assert_eq!(
            out,
            "<ns1:getRecordInfo xmlns:ns1=\"http://api.massbank\" \
             xmlns:xsi=\"http://www.w3.org/2001/XMLSchema-instance\">\
             <ns1:ids xsi:nil=\"1\"/><ns1:ids>a</ns1:ids>\
             <ns1:ids xsi:nil=\"1\"/><ns1:ids>b</ns1:ids>\
             </ns1:getRecordInfo>"
        );
    }

    #[test]
    fn test_declare_type_emits_xsi_type() {
        let mut rec = Record::new(result_shape());
        rec.set("id", Value::string("XX000001")).unwrap();

        let out = xml(&rec, Some(&QName::service("return")), true);
        assert!(out.contains("xsi:type=\"ax21:Result\""));
    }

    #[test]
    fn test_required_null_fails_before_output() {
        let shape = Arc::new(
            MessageShape::new(QName::service("getJobStatus"))
                .element(QName::service("getJobStatus"))
                .nillable_scalar("jobId", QName::service("jobId"), ScalarKind::String)
                .required(),
        );
        let mut rec = Record::new(shape);
        rec.set_null("jobId").unwrap();

        let mut writer = ElementWriter::new(Vec::new());
        let err = writer.serialize(&rec, None, false).unwrap_err();
        assert!(matches!(err, BindError::FieldCannotBeNull(f) if f == "jobId"));
        assert!(writer.into_inner().is_empty());
    }

    #[test]
    fn test_required_array_rejects_nil_items() {
        let shape = Arc::new(
            MessageShape::new(QName::service("getRecordInfo"))
                .element(QName::service("getRecordInfo"))
                .scalar_array("ids", QName::service("ids"), ScalarKind::String)
                .required(),
        );
        let mut rec = Record::new(shape);
        rec.set("ids", Value::strings([Some("KO000001".to_string()), None]))
            .unwrap();

        let mut writer = ElementWriter::new(Vec::new());
        let err = writer.serialize(&rec, None, false).unwrap_err();
        assert!(matches!(err, BindError::FieldCannotBeNull(f) if f == "ids"));
        assert!(writer.into_inner().is_empty());
    }

    #[test]
    fn test_text_content_is_escaped() {
        let mut rec = Record::new(result_shape());
        rec.set("id", Value::string("a<b&c")).unwrap();

        let out = xml(&rec, Some(&QName::service("return")), false);
        assert!(out.contains("<ax21:id>a&lt;b&amp;c</ax21:id>"));
    }

    #[test]
    fn test_missing_element_name_is_an_error() {
        let rec = Record::new(result_shape());
        let err = to_bytes(&rec, None, false).unwrap_err();
        assert!(matches!(err, BindError::NoElementName(_)));
    }
}
