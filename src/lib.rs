//! # mzbind - Typed XML Data Binding for Mass Spectrometry Web Services
//!
//! `mzbind` is a streaming XML data-binding engine for SOAP-based mass
//! spectrometry search services, with a complete binding surface for
//! the MassBank spectrum-search API.
//!
//! Instead of one generated class per wire message, each message is a
//! descriptor table (a [`shape::MessageShape`]) consumed by one
//! generic writer and one generic reader:
//!
//! - **Three-state fields**: a field is absent, explicitly null
//!   (`xsi:nil` on the wire), or set - the invalid
//!   tracked-but-unset combination cannot be expressed.
//!
//! - **Streaming parse**: a pull cursor over `quick-xml` with one
//!   token of lookahead; fields are optional-positional and unmatched
//!   descriptors consume no input.
//!
//! - **Polymorphic dispatch**: `xsi:type` attributes resolve through a
//!   type registry populated once at start-up, replacing hard-coded
//!   type-identity branching.
//!
//! - **Typed faults with fallback**: protocol faults translate through
//!   a fault registry; any failure surfaces the original untyped
//!   fault unchanged.
//!
//! ## Quick Start
//!
//! ```rust
//! use mzbind::massbank::{bindings, record_info_request};
//! use mzbind::reader::from_bytes;
//! use mzbind::writer::to_bytes;
//!
//! // Build a getRecordInfo request and serialize it.
//! let request = record_info_request(["KO000001", "KO000002"])?;
//! let xml = to_bytes(&request, None, false)?;
//!
//! // Parse it back: tracked fields survive the round trip.
//! let b = bindings();
//! let shape = &b.operation("getRecordInfo").unwrap().request;
//! let parsed = from_bytes(&xml, shape, &b.types)?;
//! assert_eq!(
//!     parsed.get("ids")?.unwrap().as_array().unwrap().len(),
//!     2
//! );
//! # Ok::<(), mzbind::error::BindError>(())
//! ```
//!
//! ## Architecture
//!
//! - [`qname`]: qualified names and the fixed wire namespaces
//! - [`shape`]: field descriptors and message shapes
//! - [`value`]: three-state fields, scalars and records
//! - [`namespace`]: per-call namespace-prefix allocation
//! - [`types`]: `xsi:type` dispatch registry
//! - [`writer`]: record to XML serialization
//! - [`reader`]: streaming XML to record parsing
//! - [`fault`]: typed fault translation with untyped fallback
//! - [`massbank`]: shapes and registries for the MassBank API
//!
//! The SOAP envelope and HTTP transport are external collaborators:
//! this crate consumes and produces the XML inside the envelope body
//! and exposes each operation's SOAP action string as opaque data.

pub mod error;
pub mod fault;
pub mod massbank;
pub mod namespace;
pub mod qname;
pub mod reader;
pub mod shape;
pub mod types;
pub mod value;
pub mod writer;

pub use error::BindError;
pub use fault::{FaultRegistry, SoapFault};
pub use qname::QName;
pub use reader::{ElementReader, TokenCursor};
pub use shape::{Cardinality, FieldDescriptor, FieldKind, MessageShape, ScalarKind};
pub use types::TypeRegistry;
pub use value::{Field, Record, Scalar, Value};
pub use writer::ElementWriter;
