//! Runtime values and the three-state field representation.
//!
//! A field is `Absent` (never set), `Null` (explicitly set to no
//! value, serialized with `xsi:nil`), or `Set` (carrying a value).
//! This replaces the generated tracker-boolean-plus-nullable pattern
//! and makes the invalid (untracked, non-null) combination
//! unrepresentable.

use std::sync::Arc;

use crate::error::BindError;
use crate::shape::{Cardinality, FieldDescriptor, FieldKind, MessageShape, ScalarKind};

/// A scalar leaf value with a canonical lexical form.
#[derive(Debug, Clone, PartialEq)]
pub enum Scalar {
    String(String),
    Int(i32),
    Long(i64),
    Double(f64),
    Boolean(bool),
}

impl Scalar {
    pub fn kind(&self) -> ScalarKind {
        match self {
            Scalar::String(_) => ScalarKind::String,
            Scalar::Int(_) => ScalarKind::Int,
            Scalar::Long(_) => ScalarKind::Long,
            Scalar::Double(_) => ScalarKind::Double,
            Scalar::Boolean(_) => ScalarKind::Boolean,
        }
    }

    /// Canonical string form written as element text.
    pub fn to_lexical(&self) -> String {
        match self {
            Scalar::String(s) => s.clone(),
            Scalar::Int(v) => v.to_string(),
            Scalar::Long(v) => v.to_string(),
            Scalar::Double(v) => v.to_string(),
            Scalar::Boolean(v) => v.to_string(),
        }
    }

    /// Parse element text into a scalar of the declared kind.
    pub fn from_lexical(kind: ScalarKind, text: &str) -> Result<Self, BindError> {
        let invalid = || BindError::InvalidScalar {
            kind: kind.name(),
            text: text.to_string(),
        };
        match kind {
            ScalarKind::String => Ok(Scalar::String(text.to_string())),
            ScalarKind::Int => text.trim().parse().map(Scalar::Int).map_err(|_| invalid()),
            ScalarKind::Long => text.trim().parse().map(Scalar::Long).map_err(|_| invalid()),
            ScalarKind::Double => text.trim().parse().map(Scalar::Double).map_err(|_| invalid()),
            ScalarKind::Boolean => match text.trim() {
                "true" | "1" => Ok(Scalar::Boolean(true)),
                "false" | "0" => Ok(Scalar::Boolean(false)),
                _ => Err(invalid()),
            },
        }
    }
}

/// A field's runtime content: a scalar, a nested message, or an
/// ordered sequence of either. Array entries are `None` where the
/// corresponding sibling element carried a nil marker.
#[derive(Debug, Clone)]
pub enum Value {
    Scalar(Scalar),
    Record(Record),
    Array(Vec<Option<Value>>),
}

impl Value {
    pub fn string(s: &str) -> Self {
        Value::Scalar(Scalar::String(s.to_string()))
    }

    pub fn int(v: i32) -> Self {
        Value::Scalar(Scalar::Int(v))
    }

    pub fn long(v: i64) -> Self {
        Value::Scalar(Scalar::Long(v))
    }

    pub fn double(v: f64) -> Self {
        Value::Scalar(Scalar::Double(v))
    }

    pub fn boolean(v: bool) -> Self {
        Value::Scalar(Scalar::Boolean(v))
    }

    /// Array of string items; `None` entries become nil-marked
    /// elements on the wire.
    pub fn strings<I: IntoIterator<Item = Option<String>>>(items: I) -> Self {
        Value::Array(
            items
                .into_iter()
                .map(|s| s.map(|s| Value::Scalar(Scalar::String(s))))
                .collect(),
        )
    }

    pub fn records<I: IntoIterator<Item = Record>>(items: I) -> Self {
        Value::Array(items.into_iter().map(|r| Some(Value::Record(r))).collect())
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Scalar(Scalar::String(s)) => Some(s),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i32> {
        match self {
            Value::Scalar(Scalar::Int(v)) => Some(*v),
            _ => None,
        }
    }

    pub fn as_long(&self) -> Option<i64> {
        match self {
            Value::Scalar(Scalar::Long(v)) => Some(*v),
            _ => None,
        }
    }

    pub fn as_double(&self) -> Option<f64> {
        match self {
            Value::Scalar(Scalar::Double(v)) => Some(*v),
            _ => None,
        }
    }

    pub fn as_boolean(&self) -> Option<bool> {
        match self {
            Value::Scalar(Scalar::Boolean(v)) => Some(*v),
            _ => None,
        }
    }

    pub fn as_record(&self) -> Option<&Record> {
        match self {
            Value::Record(r) => Some(r),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&[Option<Value>]> {
        match self {
            Value::Array(items) => Some(items),
            _ => None,
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Scalar(a), Value::Scalar(b)) => a == b,
            (Value::Record(a), Value::Record(b)) => a == b,
            (Value::Array(a), Value::Array(b)) => a == b,
            _ => false,
        }
    }
}

/// Three-state field content.
///
/// An empty tracked array is indistinguishable on the wire from an
/// absent one (neither emits any elements), so the reader never
/// produces `Set(Array(vec![]))`; a repeated field with no matching
/// siblings parses back to `Absent`.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Field {
    #[default]
    Absent,
    Null,
    Set(Value),
}

impl Field {
    pub fn is_absent(&self) -> bool {
        matches!(self, Field::Absent)
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Field::Null)
    }

    pub fn value(&self) -> Option<&Value> {
        match self {
            Field::Set(v) => Some(v),
            _ => None,
        }
    }
}

/// A typed message instance: a shape plus one `Field` slot per
/// descriptor, in declaration order.
#[derive(Debug, Clone)]
pub struct Record {
    shape: Arc<MessageShape>,
    fields: Vec<Field>,
}

impl Record {
    /// New record with every field absent.
    pub fn new(shape: Arc<MessageShape>) -> Self {
        let fields = vec![Field::Absent; shape.fields.len()];
        Self { shape, fields }
    }

    pub fn shape(&self) -> &Arc<MessageShape> {
        &self.shape
    }

    /// Set a field to a value, validating it against the descriptor.
    pub fn set(&mut self, name: &str, value: Value) -> Result<(), BindError> {
        let idx = self.index_of(name)?;
        check_value(&self.shape.fields[idx], &value)?;
        self.fields[idx] = Field::Set(value);
        Ok(())
    }

    /// Set a field explicitly to null (serialized with a nil marker).
    pub fn set_null(&mut self, name: &str) -> Result<(), BindError> {
        let idx = self.index_of(name)?;
        self.fields[idx] = Field::Null;
        Ok(())
    }

    /// Reset a field to the absent state.
    pub fn clear(&mut self, name: &str) -> Result<(), BindError> {
        let idx = self.index_of(name)?;
        self.fields[idx] = Field::Absent;
        Ok(())
    }

    pub fn field(&self, name: &str) -> Result<&Field, BindError> {
        Ok(&self.fields[self.index_of(name)?])
    }

    /// Value of a field, or `None` if the field is absent or null.
    pub fn get(&self, name: &str) -> Result<Option<&Value>, BindError> {
        Ok(self.field(name)?.value())
    }

    pub(crate) fn fields(&self) -> &[Field] {
        &self.fields
    }

    pub(crate) fn set_by_index(&mut self, idx: usize, field: Field) {
        self.fields[idx] = field;
    }

    fn index_of(&self, name: &str) -> Result<usize, BindError> {
        self.shape
            .field_index(name)
            .ok_or_else(|| BindError::UnknownField {
                shape: self.shape.type_name.to_string(),
                field: name.to_string(),
            })
    }
}

impl PartialEq for Record {
    fn eq(&self, other: &Self) -> bool {
        self.shape.type_name == other.shape.type_name && self.fields == other.fields
    }
}

fn check_value(fd: &FieldDescriptor, value: &Value) -> Result<(), BindError> {
    let mismatch = |reason: String| BindError::ValueShapeMismatch {
        field: fd.name.clone(),
        reason,
    };
    match (fd.cardinality, value) {
        (Cardinality::Single, Value::Array(_)) => {
            Err(mismatch("array value for a single-valued field".into()))
        }
        (Cardinality::Single, v) => check_item(fd, v).map_err(mismatch),
        (Cardinality::Array, Value::Array(items)) => {
            for item in items.iter().flatten() {
                check_item(fd, item).map_err(&mismatch)?;
            }
            Ok(())
        }
        (Cardinality::Array, _) => Err(mismatch("single value for a repeated field".into())),
    }
}

fn check_item(fd: &FieldDescriptor, value: &Value) -> Result<(), String> {
    match (&fd.kind, value) {
        (FieldKind::Scalar(kind), Value::Scalar(s)) => {
            if s.kind() == *kind {
                Ok(())
            } else {
                Err(format!("expected {}, got {}", kind.name(), s.kind().name()))
            }
        }
        // Any record is accepted: the wire marks substituted types
        // with xsi:type and the reader gates them via the registry.
        (FieldKind::Complex(_), Value::Record(_)) => Ok(()),
        (FieldKind::Scalar(kind), _) => Err(format!("expected {} scalar", kind.name())),
        (FieldKind::Complex(shape), _) => {
            Err(format!("expected {} record", shape.type_name))
        }
    }
}
