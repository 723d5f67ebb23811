//! Streaming reconstruction of typed records from XML.
//!
//! The reader is a pull-based state machine over a [`TokenCursor`]:
//! for each field descriptor in declaration order it seeks the next
//! start element, consumes it when the qualified name matches, and
//! otherwise leaves the input untouched and records the field as
//! absent. Fields are optional-positional, never strictly required.
//! A start element remaining after the last descriptor is the schema
//! violation detector and fails the parse.
//!
//! When an element carries an `xsi:type` naming a registered type
//! other than the statically expected one, parsing is delegated
//! wholesale to the substituted shape.

use std::io::BufRead;
use std::sync::Arc;

pub use cursor::{StartToken, Token, TokenCursor};

use crate::error::BindError;
use crate::qname::QName;
use crate::shape::{Cardinality, FieldDescriptor, FieldKind, MessageShape};
use crate::types::TypeRegistry;
use crate::value::{Field, Record, Scalar, Value};

mod cursor;

#[cfg(test)]
mod tests;

/// Streaming parser turning XML element trees back into records.
pub struct ElementReader<'a> {
    types: &'a TypeRegistry,
}

impl<'a> ElementReader<'a> {
    pub fn new(types: &'a TypeRegistry) -> Self {
        Self { types }
    }

    /// Parse one element tree into a record of `shape`, consuming the
    /// element and everything inside it from the cursor.
    ///
    /// A nil-marked root element parses to a record with every field
    /// absent; nullness of the message itself is carried by the field
    /// that holds it, so a root-level nil has no slot to land in.
    pub fn parse<R: BufRead>(
        &self,
        cursor: &mut TokenCursor<R>,
        shape: &Arc<MessageShape>,
    ) -> Result<Record, BindError> {
        let start = seek_start(cursor)?;
        self.parse_record(cursor, shape, start)
    }

    fn parse_record<R: BufRead>(
        &self,
        cursor: &mut TokenCursor<R>,
        shape: &Arc<MessageShape>,
        start: StartToken,
    ) -> Result<Record, BindError> {
        let shape = match &start.type_override {
            Some(t) if *t != shape.type_name => {
                let alt = self
                    .types
                    .get(t)
                    .ok_or_else(|| BindError::UnsupportedType(t.to_string()))?;
                log::debug!(
                    "xsi:type substitution: parsing <{}> as {} instead of {}",
                    start.name,
                    t,
                    shape.type_name
                );
                alt.clone()
            }
            _ => shape.clone(),
        };

        let mut record = Record::new(shape.clone());
        if start.nil {
            consume_end(cursor, &start.name)?;
            return Ok(record);
        }

        for (idx, fd) in shape.fields.iter().enumerate() {
            skip_text(cursor)?;
            if !at_field(cursor, fd)? {
                // Not this field's element: leave the input alone and
                // move on to the next descriptor.
                continue;
            }
            let field = match fd.cardinality {
                Cardinality::Single => match self.parse_field(cursor, fd)? {
                    Some(v) => Field::Set(v),
                    None => Field::Null,
                },
                Cardinality::Array => {
                    let mut items = Vec::new();
                    loop {
                        items.push(self.parse_field(cursor, fd)?);
                        skip_text(cursor)?;
                        if !at_field(cursor, fd)? {
                            break;
                        }
                    }
                    Field::Set(Value::Array(items))
                }
            };
            record.set_by_index(idx, field);
        }

        // All descriptors consumed; anything still open here is out
        // of schema.
        skip_text(cursor)?;
        match cursor.next_token()? {
            Token::End(name) if name == start.name => Ok(record),
            Token::End(name) => Err(BindError::MalformedStream(format!(
                "mismatched closing tag </{}> inside <{}>",
                name, start.name
            ))),
            Token::Start(st) => Err(BindError::UnexpectedElement(st.name.to_string())),
            Token::Text(_) => Err(BindError::MalformedStream(format!(
                "stray text inside <{}>",
                start.name
            ))),
            Token::Eof => Err(BindError::MalformedStream(format!(
                "unterminated element <{}>",
                start.name
            ))),
        }
    }

    /// Consume one field element. `None` means the element carried a
    /// nil marker.
    fn parse_field<R: BufRead>(
        &self,
        cursor: &mut TokenCursor<R>,
        fd: &FieldDescriptor,
    ) -> Result<Option<Value>, BindError> {
        let start = seek_start(cursor)?;
        if start.nil {
            consume_end(cursor, &start.name)?;
            return Ok(None);
        }
        match &fd.kind {
            FieldKind::Complex(expected) => {
                let rec = self.parse_record(cursor, expected, start)?;
                Ok(Some(Value::Record(rec)))
            }
            FieldKind::Scalar(kind) => {
                let mut text = String::new();
                loop {
                    match cursor.next_token()? {
                        Token::Text(t) => text.push_str(&t),
                        Token::End(name) if name == start.name => break,
                        Token::End(name) => {
                            return Err(BindError::MalformedStream(format!(
                                "mismatched closing tag </{}> inside <{}>",
                                name, start.name
                            )))
                        }
                        Token::Start(st) => {
                            return Err(BindError::UnexpectedElement(st.name.to_string()))
                        }
                        Token::Eof => {
                            return Err(BindError::MalformedStream(format!(
                                "unterminated element <{}>",
                                start.name
                            )))
                        }
                    }
                }
                Ok(Some(Value::Scalar(Scalar::from_lexical(*kind, &text)?)))
            }
        }
    }
}

/// Parse a complete record out of a byte buffer.
pub fn from_bytes(
    data: &[u8],
    shape: &Arc<MessageShape>,
    types: &TypeRegistry,
) -> Result<Record, BindError> {
    let mut cursor = TokenCursor::new(data);
    ElementReader::new(types).parse(&mut cursor, shape)
}

fn at_field<R: BufRead>(
    cursor: &mut TokenCursor<R>,
    fd: &FieldDescriptor,
) -> Result<bool, BindError> {
    Ok(matches!(cursor.peek()?, Token::Start(st) if st.name == fd.qname))
}

fn seek_start<R: BufRead>(cursor: &mut TokenCursor<R>) -> Result<StartToken, BindError> {
    loop {
        match cursor.next_token()? {
            Token::Start(st) => return Ok(st),
            Token::Text(_) => continue,
            Token::End(name) => {
                return Err(BindError::MalformedStream(format!(
                    "expected element, found closing tag </{}>",
                    name
                )))
            }
            Token::Eof => {
                return Err(BindError::MalformedStream(
                    "premature end of input".to_string(),
                ))
            }
        }
    }
}

/// Skip ignorable whitespace between elements. Non-whitespace text is
/// left in place: verbatim character data belongs to scalar leaves
/// only, and anywhere else it is a stream error.
fn skip_text<R: BufRead>(cursor: &mut TokenCursor<R>) -> Result<(), BindError> {
    while matches!(cursor.peek()?, Token::Text(t) if t.trim().is_empty()) {
        cursor.next_token()?;
    }
    Ok(())
}

/// Consume up to and including the closing tag of `name`, tolerating
/// stray text inside nil-marked elements.
fn consume_end<R: BufRead>(cursor: &mut TokenCursor<R>, name: &QName) -> Result<(), BindError> {
    loop {
        match cursor.next_token()? {
            Token::Text(_) => continue,
            Token::End(n) if n == *name => return Ok(()),
            Token::End(n) => {
                return Err(BindError::MalformedStream(format!(
                    "mismatched closing tag </{}> inside <{}>",
                    n, name
                )))
            }
            Token::Start(st) => return Err(BindError::UnexpectedElement(st.name.to_string())),
            Token::Eof => {
                return Err(BindError::MalformedStream(format!(
                    "unterminated element <{}>",
                    name
                )))
            }
        }
    }
}
