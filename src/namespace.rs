//! Per-call namespace-prefix allocation.
//!
//! A `PrefixScope` lives for exactly one top-level serialize or parse
//! invocation. Bindings are never removed before the call completes,
//! and nothing is cached across calls, so repeated serialization of
//! the same type always yields the same prefixes.

use crate::qname::{NS_SERVICE, NS_TYPES, NS_XSI};

/// Fixed preferred prefixes, matching what the wire peer emits.
const PREFERRED: &[(&str, &str)] = &[
    (NS_XSI, "xsi"),
    (NS_SERVICE, "ns1"),
    (NS_TYPES, "ax21"),
];

/// Prefix bindings for one write or read scope.
#[derive(Debug, Default)]
pub struct PrefixScope {
    bindings: Vec<(String, String)>, // (prefix, uri)
}

impl PrefixScope {
    pub fn new() -> Self {
        Self::default()
    }

    /// Prefix already bound to `uri` in this scope, if any.
    pub fn lookup(&self, uri: &str) -> Option<&str> {
        self.bindings
            .iter()
            .find(|(_, u)| u == uri)
            .map(|(p, _)| p.as_str())
    }

    /// Return the prefix bound to `uri`, binding one if necessary.
    ///
    /// Resolution order: an existing binding in scope, then the
    /// preferred prefix if free, then generated `nsN` prefixes probed
    /// upward until one is unused. The second tuple element is true
    /// when this call created the binding (the caller owes an xmlns
    /// declaration for it).
    pub fn register_or_get(&mut self, uri: &str) -> (String, bool) {
        if uri.is_empty() {
            return (String::new(), false);
        }
        if let Some(prefix) = self.lookup(uri) {
            return (prefix.to_string(), false);
        }
        let prefix = match self.preferred(uri) {
            Some(p) => p.to_string(),
            None => self.generate(),
        };
        log::debug!("binding namespace prefix {}=\"{}\"", prefix, uri);
        self.bindings.push((prefix.clone(), uri.to_string()));
        (prefix, true)
    }

    fn preferred(&self, uri: &str) -> Option<&'static str> {
        PREFERRED
            .iter()
            .find(|(u, p)| *u == uri && !self.taken(p))
            .map(|(_, p)| *p)
    }

    fn generate(&self) -> String {
        let mut n = 2;
        loop {
            let candidate = format!("ns{n}");
            if !self.taken(&candidate) {
                return candidate;
            }
            n += 1;
        }
    }

    fn taken(&self, prefix: &str) -> bool {
        self.bindings.iter().any(|(p, _)| p == prefix)
    }
}
