//! Owned-token pull cursor over a namespace-resolving XML reader.
//!
//! The cursor flattens `quick_xml` events into self-contained tokens
//! carrying resolved qualified names and the pre-extracted `xsi:nil`
//! and `xsi:type` attributes, and buffers exactly one token of
//! lookahead. The one-token peek is what lets the field loop decide a
//! field is absent without consuming input.
//!
//! A cursor holds exclusive ownership of its position: nested complex
//! types recurse synchronously depth-first on the same cursor.

use std::io::BufRead;

use quick_xml::events::{BytesStart, Event};
use quick_xml::name::{QName as XmlQName, ResolveResult};
use quick_xml::NsReader;

use crate::error::BindError;
use crate::qname::{QName, NS_XSI};

/// A start element with its binding-relevant attributes.
#[derive(Debug, Clone)]
pub struct StartToken {
    pub name: QName,
    /// The element carried `xsi:nil="1"` (or `"true"`).
    pub nil: bool,
    /// Resolved value of an `xsi:type` attribute, if present.
    pub type_override: Option<QName>,
}

#[derive(Debug, Clone)]
pub enum Token {
    Start(StartToken),
    End(QName),
    /// Unescaped character data, verbatim. Whether inter-element
    /// whitespace is ignorable is the consumer's call, not the
    /// cursor's.
    Text(String),
    Eof,
}

/// Pull cursor with one token of lookahead.
pub struct TokenCursor<R: BufRead> {
    reader: NsReader<R>,
    peeked: Option<Token>,
    /// Synthesized closing tag for a self-closing element.
    pending_end: Option<QName>,
}

impl<R: BufRead> TokenCursor<R> {
    pub fn new(source: R) -> Self {
        Self {
            reader: NsReader::from_reader(source),
            peeked: None,
            pending_end: None,
        }
    }

    /// Next token without consuming it.
    pub fn peek(&mut self) -> Result<&Token, BindError> {
        if self.peeked.is_none() {
            let token = self.read_token()?;
            self.peeked = Some(token);
        }
        match self.peeked.as_ref() {
            Some(token) => Ok(token),
            None => Ok(&Token::Eof),
        }
    }

    /// Consume and return the next token.
    pub fn next_token(&mut self) -> Result<Token, BindError> {
        match self.peeked.take() {
            Some(token) => Ok(token),
            None => self.read_token(),
        }
    }

    fn read_token(&mut self) -> Result<Token, BindError> {
        if let Some(name) = self.pending_end.take() {
            return Ok(Token::End(name));
        }
        let mut buf = Vec::new();
        loop {
            buf.clear();
            let (resolve, event) = self.reader.read_resolved_event_into(&mut buf)?;
            let namespace = resolved_namespace(&resolve)?;
            match event {
                Event::Start(e) => return self.start_token(namespace, &e),
                Event::Empty(e) => {
                    let token = self.start_token(namespace, &e)?;
                    if let Token::Start(ref st) = token {
                        self.pending_end = Some(st.name.clone());
                    }
                    return Ok(token);
                }
                Event::End(e) => {
                    let local = std::str::from_utf8(e.local_name().as_ref())?.to_string();
                    return Ok(Token::End(QName {
                        namespace,
                        local,
                    }));
                }
                Event::Text(t) => {
                    let text = t.unescape()?.into_owned();
                    if !text.is_empty() {
                        return Ok(Token::Text(text));
                    }
                }
                Event::CData(t) => {
                    let text = std::str::from_utf8(&t)?.to_string();
                    if !text.is_empty() {
                        return Ok(Token::Text(text));
                    }
                }
                Event::Eof => return Ok(Token::Eof),
                // Declarations, comments, PIs and doctypes carry no
                // binding content.
                _ => {}
            }
        }
    }

    fn start_token(&self, namespace: String, e: &BytesStart) -> Result<Token, BindError> {
        let local = std::str::from_utf8(e.local_name().as_ref())?.to_string();
        let mut nil = false;
        let mut type_override = None;

        for attr in e.attributes() {
            let attr = attr.map_err(|err| BindError::Xml(quick_xml::Error::from(err)))?;
            let (attr_resolve, attr_local) = self.reader.resolve_attribute(attr.key);
            let attr_ns = resolved_namespace(&attr_resolve)?;
            if attr_ns != NS_XSI {
                continue;
            }
            match attr_local.as_ref() {
                b"nil" => {
                    let value = attr.unescape_value()?;
                    nil = value.as_ref() == "1" || value.as_ref() == "true";
                }
                b"type" => {
                    let value = attr.unescape_value()?;
                    type_override = Some(self.resolve_type_name(value.as_ref())?);
                }
                _ => {}
            }
        }

        Ok(Token::Start(StartToken {
            name: QName { namespace, local },
            nil,
            type_override,
        }))
    }

    /// Resolve the prefixed QName carried as an `xsi:type` value
    /// against the bindings in force at the current element.
    fn resolve_type_name(&self, value: &str) -> Result<QName, BindError> {
        let (resolve, local) = self
            .reader
            .resolve(XmlQName(value.as_bytes()), false);
        let namespace = resolved_namespace(&resolve)?;
        let local = std::str::from_utf8(local.as_ref())?.to_string();
        Ok(QName { namespace, local })
    }
}

fn resolved_namespace(resolve: &ResolveResult) -> Result<String, BindError> {
    match resolve {
        ResolveResult::Bound(ns) => Ok(std::str::from_utf8(ns.as_ref())?.to_string()),
        ResolveResult::Unbound => Ok(String::new()),
        ResolveResult::Unknown(prefix) => Err(BindError::MalformedStream(format!(
            "undeclared namespace prefix '{}'",
            String::from_utf8_lossy(prefix)
        ))),
    }
}
