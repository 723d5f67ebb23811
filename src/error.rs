/// Errors that can occur while binding typed records to and from XML.
#[derive(Debug, thiserror::Error)]
pub enum BindError {
    /// Error from the underlying XML parser or writer
    #[error("XML error: {0}")]
    Xml(#[from] quick_xml::Error),

    /// I/O error while writing serialized output
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// UTF-8 encoding error in element or attribute content
    #[error("UTF-8 encoding error: {0}")]
    Utf8(#[from] std::str::Utf8Error),

    /// A start element remained after all known fields were consumed
    #[error("unexpected element <{0}>")]
    UnexpectedElement(String),

    /// Unterminated element or premature end of input
    #[error("malformed stream: {0}")]
    MalformedStream(String),

    /// An xsi:type attribute named a type with no registered shape
    #[error("unsupported type {0}")]
    UnsupportedType(String),

    /// A non-nillable field was explicitly set to null
    #[error("field '{0}' cannot be null")]
    FieldCannotBeNull(String),

    /// A field name not present in the message shape
    #[error("message shape '{shape}' has no field named '{field}'")]
    UnknownField { shape: String, field: String },

    /// A value whose type does not match its field descriptor
    #[error("value for field '{field}' does not match its declared shape: {reason}")]
    ValueShapeMismatch { field: String, reason: String },

    /// Element text that cannot be converted to the declared scalar type
    #[error("invalid {kind} value: '{text}'")]
    InvalidScalar { kind: &'static str, text: String },

    /// Serialization was asked for a top-level element with no name
    #[error("message shape '{0}' has no well-known element name")]
    NoElementName(String),
}
