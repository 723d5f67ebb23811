//! Registry of concrete types for `xsi:type` dispatch.
//!
//! Populated once at start-up, read-only afterwards; lookups from
//! concurrent parse calls are safe through a shared reference.

use std::collections::HashMap;
use std::sync::Arc;

use crate::qname::QName;
use crate::shape::MessageShape;

/// Maps (namespace, type-name) to the shape that parses it.
#[derive(Debug, Default)]
pub struct TypeRegistry {
    shapes: HashMap<QName, Arc<MessageShape>>,
}

impl TypeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a shape under its own type name.
    pub fn register(&mut self, shape: Arc<MessageShape>) {
        self.shapes.insert(shape.type_name.clone(), shape);
    }

    pub fn get(&self, type_name: &QName) -> Option<&Arc<MessageShape>> {
        self.shapes.get(type_name)
    }

    pub fn len(&self) -> usize {
        self.shapes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.shapes.is_empty()
    }
}
