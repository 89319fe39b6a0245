//! XML namespace handling
//!
//! Qualified names, the in-scope namespace bindings used while parsing, and
//! [`PrefixMap`], the bidirectional prefix table used to name the namespaces
//! of a schema pile.

use crate::error::{Error, Result};
use crate::names::is_valid_ncname;
use std::collections::{BTreeMap, HashMap};
use std::fmt;

/// XML Namespace URI
pub type NamespaceUri = String;

/// Namespace prefix
pub type Prefix = String;

/// OWL namespace
pub const OWL_NAMESPACE: &str = "http://www.w3.org/2002/07/owl#";

/// RDF namespace
pub const RDF_NAMESPACE: &str = "http://www.w3.org/1999/02/22-rdf-syntax-ns#";

/// RDF Schema namespace
pub const RDFS_NAMESPACE: &str = "http://www.w3.org/2000/01/rdf-schema#";

/// XSD datatype namespace as used by RDF serializations
pub const XSD_RDF_NAMESPACE: &str = "http://www.w3.org/2001/XMLSchema#";

/// Prefixes bound in every new [`PrefixMap`]
const WELL_KNOWN_PREFIXES: &[(&str, &str)] = &[
    ("owl", OWL_NAMESPACE),
    ("rdf", RDF_NAMESPACE),
    ("rdfs", RDFS_NAMESPACE),
    ("xsd", XSD_RDF_NAMESPACE),
];

/// Qualified name (QName) - combination of namespace and local name
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct QName {
    /// Namespace URI (None for no namespace)
    pub namespace: Option<NamespaceUri>,
    /// Local name
    pub local_name: String,
}

impl QName {
    /// Create a new QName
    pub fn new(namespace: Option<impl Into<String>>, local_name: impl Into<String>) -> Self {
        Self {
            namespace: namespace.map(|s| s.into()),
            local_name: local_name.into(),
        }
    }

    /// Create a QName without a namespace
    pub fn local(local_name: impl Into<String>) -> Self {
        Self {
            namespace: None,
            local_name: local_name.into(),
        }
    }

    /// Create a QName with a namespace
    pub fn namespaced(namespace: impl Into<String>, local_name: impl Into<String>) -> Self {
        Self {
            namespace: Some(namespace.into()),
            local_name: local_name.into(),
        }
    }

    /// True if this name has the given namespace and local name
    pub fn is(&self, namespace: &str, local_name: &str) -> bool {
        self.namespace.as_deref() == Some(namespace) && self.local_name == local_name
    }
}

impl fmt::Display for QName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.namespace {
            Some(ns) => write!(f, "{{{}}}{}", ns, self.local_name),
            None => write!(f, "{}", self.local_name),
        }
    }
}

/// Namespace bindings in scope at one point of a document
#[derive(Debug, Clone, Default)]
pub struct NamespaceContext {
    /// Mapping from prefix to namespace URI
    prefixes: HashMap<Prefix, NamespaceUri>,
    /// Default namespace (no prefix)
    default_namespace: Option<NamespaceUri>,
}

impl NamespaceContext {
    /// Create a new empty namespace context
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a namespace prefix mapping
    pub fn add_prefix(&mut self, prefix: impl Into<String>, namespace: impl Into<String>) {
        self.prefixes.insert(prefix.into(), namespace.into());
    }

    /// Set the default namespace; an empty URI undeclares it
    pub fn set_default_namespace(&mut self, namespace: impl Into<String>) {
        let namespace = namespace.into();
        self.default_namespace = if namespace.is_empty() { None } else { Some(namespace) };
    }

    /// Get the namespace for a prefix
    pub fn get_namespace(&self, prefix: &str) -> Option<&str> {
        match prefix {
            "xml" => Some(crate::XML_NAMESPACE),
            _ => self.prefixes.get(prefix).map(|s| s.as_str()),
        }
    }

    /// Get the default namespace
    pub fn get_default_namespace(&self) -> Option<&str> {
        self.default_namespace.as_deref()
    }

    /// Resolve an element name; unprefixed names take the default namespace
    pub fn resolve_element(&self, prefixed_name: &str) -> Result<QName> {
        if let Some((prefix, local)) = prefixed_name.split_once(':') {
            let namespace = self
                .get_namespace(prefix)
                .ok_or_else(|| Error::Xml(format!("Unknown prefix: {}", prefix)))?;
            Ok(QName::namespaced(namespace, local))
        } else {
            Ok(QName::new(self.default_namespace.clone(), prefixed_name))
        }
    }

    /// Resolve an attribute name; unprefixed attributes are in no namespace
    pub fn resolve_attribute(&self, prefixed_name: &str) -> Result<QName> {
        if prefixed_name.contains(':') {
            self.resolve_element(prefixed_name)
        } else {
            Ok(QName::local(prefixed_name))
        }
    }
}

/// Bidirectional prefix ↔ namespace URI table
///
/// Prefixes and URIs are each unique within the table. Collisions on
/// [`assign_prefix`](Self::assign_prefix) are resolved by appending `_1`,
/// `_2`, ... to the preferred prefix.
#[derive(Debug, Clone)]
pub struct PrefixMap {
    prefix_to_uri: BTreeMap<Prefix, NamespaceUri>,
    uri_to_prefix: HashMap<NamespaceUri, Prefix>,
}

impl PrefixMap {
    /// Create a table holding only the well-known prefixes
    pub fn new() -> Self {
        let mut map = Self::empty();
        for (prefix, uri) in WELL_KNOWN_PREFIXES {
            map.insert(prefix.to_string(), uri.to_string());
        }
        map
    }

    /// Create a table with no bindings at all
    pub fn empty() -> Self {
        Self {
            prefix_to_uri: BTreeMap::new(),
            uri_to_prefix: HashMap::new(),
        }
    }

    /// Assign a prefix to `uri`, preferring `preferred`
    ///
    /// Returns the existing prefix if `uri` already has one. A preferred
    /// prefix that is not an NCName is replaced by `ns`.
    pub fn assign_prefix(&mut self, preferred: &str, uri: &str) -> String {
        if let Some(existing) = self.uri_to_prefix.get(uri) {
            return existing.clone();
        }
        let base = if is_valid_ncname(preferred) { preferred } else { "ns" };
        let mut candidate = base.to_string();
        let mut counter = 0usize;
        while self.prefix_to_uri.contains_key(&candidate) {
            counter += 1;
            candidate = format!("{}_{}", base, counter);
        }
        self.insert(candidate.clone(), uri.to_string());
        candidate
    }

    /// Bind `prefix` to `uri`, failing if the prefix belongs to another URI
    ///
    /// Binding a URI that already has a different prefix moves it to the new
    /// prefix.
    pub fn bind(&mut self, prefix: &str, uri: &str) -> Result<()> {
        match self.prefix_to_uri.get(prefix) {
            Some(existing) if existing == uri => Ok(()),
            Some(existing) => Err(Error::DuplicatePrefix {
                prefix: prefix.to_string(),
                existing: existing.clone(),
                requested: uri.to_string(),
            }),
            None => {
                self.change_prefix(prefix, uri);
                Ok(())
            }
        }
    }

    /// Rebind `uri` to `new_prefix`, releasing its old prefix
    ///
    /// Returns false (and changes nothing) when `new_prefix` is held by a
    /// different URI.
    pub fn change_prefix(&mut self, new_prefix: &str, uri: &str) -> bool {
        match self.prefix_to_uri.get(new_prefix) {
            Some(holder) if holder == uri => return true,
            Some(_) => return false,
            None => {}
        }
        if let Some(old) = self.uri_to_prefix.remove(uri) {
            self.prefix_to_uri.remove(&old);
        }
        self.insert(new_prefix.to_string(), uri.to_string());
        true
    }

    /// Prefix assigned to `uri`
    pub fn get_prefix(&self, uri: &str) -> Option<&str> {
        self.uri_to_prefix.get(uri).map(|s| s.as_str())
    }

    /// URI bound to `prefix`
    pub fn get_uri(&self, prefix: &str) -> Option<&str> {
        self.prefix_to_uri.get(prefix).map(|s| s.as_str())
    }

    /// All bindings in prefix order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.prefix_to_uri.iter().map(|(p, u)| (p.as_str(), u.as_str()))
    }

    /// Number of bindings
    pub fn len(&self) -> usize {
        self.prefix_to_uri.len()
    }

    /// True when nothing is bound
    pub fn is_empty(&self) -> bool {
        self.prefix_to_uri.is_empty()
    }

    fn insert(&mut self, prefix: Prefix, uri: NamespaceUri) {
        self.uri_to_prefix.insert(uri.clone(), prefix.clone());
        self.prefix_to_uri.insert(prefix, uri);
    }
}

impl Default for PrefixMap {
    fn default() -> Self {
        Self::new()
    }
}
