//! Translation of protocol-level faults into typed errors.
//!
//! A fault registry maps (fault element name, operation name) to a
//! detail shape and a typed constructor. Translation is best-effort:
//! an unregistered key, a detail that fails to parse, or a constructor
//! that rejects the detail all surface the original untyped fault
//! unchanged, so the remote error is never dropped.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use crate::error::BindError;
use crate::qname::QName;
use crate::reader::{ElementReader, TokenCursor};
use crate::shape::MessageShape;
use crate::types::TypeRegistry;
use crate::value::Record;

/// An untyped protocol fault as surfaced by the transport.
#[derive(Debug, Clone)]
pub struct SoapFault {
    /// SOAP fault code (e.g. `soapenv:Receiver`).
    pub code: String,
    /// Human-readable fault reason.
    pub reason: String,
    /// Qualified name of the first detail child element, if any.
    pub element: Option<QName>,
    /// Raw XML of the fault detail payload.
    pub detail: Vec<u8>,
}

impl fmt::Display for SoapFault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SOAP fault {}: {}", self.code, self.reason)
    }
}

impl std::error::Error for SoapFault {}

type FaultCtor<E> = Box<dyn Fn(Record) -> Option<E> + Send + Sync>;

struct FaultEntry<E> {
    shape: Arc<MessageShape>,
    build: FaultCtor<E>,
}

/// Registry of typed-fault constructors keyed by
/// (fault element name, operation name). Populated once at start-up.
pub struct FaultRegistry<E> {
    entries: HashMap<(QName, String), FaultEntry<E>>,
}

impl<E> Default for FaultRegistry<E> {
    fn default() -> Self {
        Self {
            entries: HashMap::new(),
        }
    }
}

impl<E> FaultRegistry<E> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register<F>(
        &mut self,
        element: QName,
        operation: &str,
        shape: Arc<MessageShape>,
        build: F,
    ) where
        F: Fn(Record) -> Option<E> + Send + Sync + 'static,
    {
        self.entries.insert(
            (element, operation.to_string()),
            FaultEntry {
                shape,
                build: Box::new(build),
            },
        );
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Translate a fault raised by `operation` into a typed error.
    ///
    /// `Err` carries the original fault unmodified whenever a typed
    /// translation is not possible.
    pub fn translate(
        &self,
        fault: SoapFault,
        operation: &str,
        types: &TypeRegistry,
    ) -> Result<E, SoapFault> {
        let Some(element) = fault.element.clone() else {
            log::warn!("fault '{}' carries no detail element; surfacing untyped", fault.code);
            return Err(fault);
        };
        let Some(entry) = self.entries.get(&(element.clone(), operation.to_string())) else {
            log::warn!(
                "no typed fault registered for <{}> in operation '{}'; surfacing untyped",
                element,
                operation
            );
            return Err(fault);
        };

        match self.parse_detail(&fault.detail, &entry.shape, types) {
            Ok(detail) => match (entry.build)(detail) {
                Some(typed) => Ok(typed),
                None => {
                    log::warn!(
                        "typed fault constructor for <{}> rejected the detail; surfacing untyped",
                        element
                    );
                    Err(fault)
                }
            },
            Err(e) => {
                log::warn!("failed to parse fault detail for <{}>: {}; surfacing untyped", element, e);
                Err(fault)
            }
        }
    }

    fn parse_detail(
        &self,
        detail: &[u8],
        shape: &Arc<MessageShape>,
        types: &TypeRegistry,
    ) -> Result<Record, BindError> {
        let mut cursor = TokenCursor::new(detail);
        ElementReader::new(types).parse(&mut cursor, shape)
    }
}
