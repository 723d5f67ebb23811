//! Message shapes: the descriptor tables that drive the generic
//! writer and reader.
//!
//! A `MessageShape` is an ordered list of field descriptors. Field
//! order is fixed and significant: the wire carries fields in
//! declaration order and the reader walks descriptors in the same
//! order. One shape replaces one generated per-message class.

use std::sync::Arc;

use crate::qname::QName;

/// Lexical space of a scalar field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScalarKind {
    String,
    Int,
    Long,
    Double,
    Boolean,
}

impl ScalarKind {
    pub fn name(&self) -> &'static str {
        match self {
            ScalarKind::String => "string",
            ScalarKind::Int => "int",
            ScalarKind::Long => "long",
            ScalarKind::Double => "double",
            ScalarKind::Boolean => "boolean",
        }
    }
}

/// Declared type of a field: a scalar or a nested complex type.
#[derive(Debug, Clone)]
pub enum FieldKind {
    Scalar(ScalarKind),
    /// Nested message; the shape's `type_name` is the statically
    /// expected type, subject to `xsi:type` substitution on the wire.
    Complex(Arc<MessageShape>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cardinality {
    Single,
    /// Repeated sibling elements sharing one qualified name.
    Array,
}

/// One field of a message shape.
#[derive(Debug, Clone)]
pub struct FieldDescriptor {
    /// Accessor key used by callers; not on the wire.
    pub name: String,
    /// Wire element name.
    pub qname: QName,
    pub kind: FieldKind,
    pub cardinality: Cardinality,
    pub nillable: bool,
}

/// An ordered list of field descriptors plus the wire identity of the
/// message: its schema type name and, for top-level messages, its
/// well-known element name.
#[derive(Debug)]
pub struct MessageShape {
    /// (namespace, type-name) pair used for `xsi:type` dispatch.
    pub type_name: QName,
    /// Well-known top-level element name, if this shape is ever the
    /// document root of a serialize/parse invocation.
    pub element_name: Option<QName>,
    pub fields: Vec<FieldDescriptor>,
}

impl MessageShape {
    pub fn new(type_name: QName) -> Self {
        Self {
            type_name,
            element_name: None,
            fields: Vec::new(),
        }
    }

    pub fn element(mut self, name: QName) -> Self {
        self.element_name = Some(name);
        self
    }

    pub fn scalar(self, name: &str, qname: QName, kind: ScalarKind) -> Self {
        self.push(name, qname, FieldKind::Scalar(kind), Cardinality::Single, false)
    }

    pub fn nillable_scalar(self, name: &str, qname: QName, kind: ScalarKind) -> Self {
        self.push(name, qname, FieldKind::Scalar(kind), Cardinality::Single, true)
    }

    pub fn scalar_array(self, name: &str, qname: QName, kind: ScalarKind) -> Self {
        self.push(name, qname, FieldKind::Scalar(kind), Cardinality::Array, true)
    }

    pub fn complex(self, name: &str, qname: QName, shape: Arc<MessageShape>) -> Self {
        self.push(name, qname, FieldKind::Complex(shape), Cardinality::Single, true)
    }

    pub fn complex_array(self, name: &str, qname: QName, shape: Arc<MessageShape>) -> Self {
        self.push(name, qname, FieldKind::Complex(shape), Cardinality::Array, true)
    }

    /// Mark the most recently added field as non-nillable.
    pub fn required(mut self) -> Self {
        if let Some(last) = self.fields.last_mut() {
            last.nillable = false;
        }
        self
    }

    fn push(
        mut self,
        name: &str,
        qname: QName,
        kind: FieldKind,
        cardinality: Cardinality,
        nillable: bool,
    ) -> Self {
        self.fields.push(FieldDescriptor {
            name: name.to_string(),
            qname,
            kind,
            cardinality,
            nillable,
        });
        self
    }

    pub fn field_index(&self, name: &str) -> Option<usize> {
        self.fields.iter().position(|f| f.name == name)
    }

    pub fn descriptor(&self, name: &str) -> Option<&FieldDescriptor> {
        self.field_index(name).map(|i| &self.fields[i])
    }
}
