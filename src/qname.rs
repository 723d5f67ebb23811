//! Qualified names and the fixed wire namespaces.
//!
//! Two namespaces cover the whole MassBank wire surface: one for the
//! operation wrapper elements and one for the shared complex types.

use std::fmt;

/// Namespace of the operation/message wrapper elements.
pub const NS_SERVICE: &str = "http://api.massbank";

/// Namespace of the shared leaf-level complex types.
pub const NS_TYPES: &str = "http://api.massbank/xsd";

/// XML Schema instance namespace (`xsi:nil`, `xsi:type`).
pub const NS_XSI: &str = "http://www.w3.org/2001/XMLSchema-instance";

/// A namespace URI paired with a local element or type name.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct QName {
    pub namespace: String,
    pub local: String,
}

impl QName {
    pub fn new(namespace: &str, local: &str) -> Self {
        Self {
            namespace: namespace.to_string(),
            local: local.to_string(),
        }
    }

    /// A name with no namespace (unqualified element).
    pub fn unqualified(local: &str) -> Self {
        Self::new("", local)
    }

    /// Wrapper-element name in the service namespace.
    pub fn service(local: &str) -> Self {
        Self::new(NS_SERVICE, local)
    }

    /// Complex-type name in the shared types namespace.
    pub fn types(local: &str) -> Self {
        Self::new(NS_TYPES, local)
    }
}

impl fmt::Display for QName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.namespace.is_empty() {
            write!(f, "{}", self.local)
        } else {
            write!(f, "{{{}}}{}", self.namespace, self.local)
        }
    }
}
