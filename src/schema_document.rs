//! Schema documents
//!
//! A [`SchemaDocument`] wraps one parsed XML file and exposes what pile
//! resolution needs from it: target namespace, version, `xs:import` and
//! `xs:include` elements, the inventory of namespace declarations, and the
//! documentation annotations of any element.
//!
//! Any well-formed XML document can be loaded. A document whose root is not
//! `xs:schema` simply reports an empty target namespace; deciding whether it
//! is acceptable is up to the caller.

use std::io::ErrorKind;
use std::path::Path;

use crate::documents::{Document, Element};
use crate::error::{Error, Result};
use crate::kinds::{classify_uri, UtilityKind};
use crate::loaders::Loader;
use crate::locations;
use crate::{XML_NAMESPACE, XSD_NAMESPACE};

/// An `xs:import` element
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportElement {
    /// The `namespace` attribute
    pub namespace: Option<String>,
    /// The `schemaLocation` hint
    pub schema_location: Option<String>,
    /// Source line of the element
    pub line: usize,
}

/// An `xs:include` (or `xs:redefine` / `xs:override`) element
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IncludeElement {
    /// The `schemaLocation` attribute
    pub schema_location: Option<String>,
    /// Source line of the element
    pub line: usize,
}

/// One namespace declaration found in the document
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NamespaceDecl {
    /// Declared prefix, empty for a default namespace declaration
    pub prefix: String,
    /// Declared namespace URI
    pub uri: String,
    /// Line of the element carrying the declaration
    pub line: usize,
    /// Depth of that element, 0 for the root
    pub depth: usize,
}

/// An `xs:documentation` annotation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Documentation {
    /// The `xml:lang` attribute
    pub lang: Option<String>,
    /// Text with whitespace runs collapsed to single spaces
    pub text: String,
}

/// One loaded XML Schema (or other XML) document
#[derive(Debug)]
pub struct SchemaDocument {
    uri: String,
    doc: Document,
    target_namespace: String,
    version: String,
    imports: Vec<ImportElement>,
    includes: Vec<IncludeElement>,
    namespace_decls: Vec<NamespaceDecl>,
}

impl SchemaDocument {
    /// Load and parse a local file
    pub fn from_file(path: &Path, loader: &Loader) -> Result<Self> {
        let uri = locations::canonical_file_uri(path).map_err(|e| match e {
            Error::Io(io) if io.kind() == ErrorKind::NotFound => {
                Error::FileNotFound(path.display().to_string())
            }
            other => other,
        })?;
        let doc = loader.load_document(path)?;
        Ok(Self::from_document(doc, &uri))
    }

    /// Parse a document held in memory, recording `uri` as its location
    pub fn from_str(xml: &str, uri: &str) -> Result<Self> {
        Ok(Self::from_document(Document::from_string(xml)?, uri))
    }

    /// Wrap an already parsed document
    pub fn from_document(doc: Document, uri: &str) -> Self {
        let root = doc.root();
        let is_schema = root.is(XSD_NAMESPACE, "schema");

        let (target_namespace, version, imports, includes) = if is_schema {
            let imports = root
                .children_named(XSD_NAMESPACE, "import")
                .map(|e| ImportElement {
                    namespace: e.get_attribute("namespace").map(str::to_string),
                    schema_location: e.get_attribute("schemaLocation").map(str::to_string),
                    line: e.line,
                })
                .collect();
            let includes = root
                .children
                .iter()
                .filter(|e| {
                    e.namespace() == Some(XSD_NAMESPACE)
                        && matches!(e.local_name(), "include" | "redefine" | "override")
                })
                .map(|e| IncludeElement {
                    schema_location: e.get_attribute("schemaLocation").map(str::to_string),
                    line: e.line,
                })
                .collect();
            (
                root.get_attribute("targetNamespace").unwrap_or_default().to_string(),
                root.get_attribute("version").unwrap_or_default().to_string(),
                imports,
                includes,
            )
        } else {
            (String::new(), String::new(), Vec::new(), Vec::new())
        };

        let namespace_decls = root
            .descendants()
            .flat_map(|e| {
                e.namespace_decls.iter().map(move |(prefix, uri)| NamespaceDecl {
                    prefix: prefix.clone().unwrap_or_default(),
                    uri: uri.clone(),
                    line: e.line,
                    depth: e.depth,
                })
            })
            .collect();

        Self {
            uri: uri.to_string(),
            target_namespace,
            version,
            imports,
            includes,
            namespace_decls,
            doc,
        }
    }

    /// Canonical URI of the file
    pub fn uri(&self) -> &str {
        &self.uri
    }

    /// Target namespace, empty when absent or not a schema
    pub fn target_namespace(&self) -> &str {
        &self.target_namespace
    }

    /// The schema's `version` attribute
    pub fn version(&self) -> &str {
        &self.version
    }

    /// True if the root element is `xs:schema`
    pub fn is_schema(&self) -> bool {
        self.doc.root().is(XSD_NAMESPACE, "schema")
    }

    /// Root element
    pub fn root(&self) -> &Element {
        self.doc.root()
    }

    /// `xs:import` elements in document order
    pub fn imports(&self) -> &[ImportElement] {
        &self.imports
    }

    /// `xs:include`-like elements in document order
    pub fn includes(&self) -> &[IncludeElement] {
        &self.includes
    }

    /// Every namespace declaration in document order, shadowed ones included
    pub fn namespace_decls(&self) -> &[NamespaceDecl] {
        &self.namespace_decls
    }

    /// Prefix the root element declares for `uri`, if any
    pub fn root_prefix_for(&self, uri: &str) -> Option<&str> {
        self.namespace_decls
            .iter()
            .find(|d| d.depth == 0 && d.uri == uri && !d.prefix.is_empty())
            .map(|d| d.prefix.as_str())
    }

    /// Conformance targets asserted on the root element
    ///
    /// The assertion is the `conformanceTargets` attribute in any namespace
    /// recognised as the NIEM conformance-targets utility.
    pub fn conformance_targets(&self) -> Vec<String> {
        self.root()
            .attributes
            .iter()
            .filter(|(qname, _)| {
                qname.local_name == "conformanceTargets"
                    && qname
                        .namespace
                        .as_deref()
                        .map(|ns| classify_uri(ns).utility_kind == UtilityKind::ConformanceTargets)
                        .unwrap_or(false)
            })
            .flat_map(|(_, value)| value.split_whitespace().map(str::to_string).collect::<Vec<_>>())
            .collect()
    }

    /// Documentation annotations directly attached to `elem`
    pub fn documentation(&self, elem: &Element) -> Vec<Documentation> {
        elem.children_named(XSD_NAMESPACE, "annotation")
            .flat_map(|ann| ann.children_named(XSD_NAMESPACE, "documentation"))
            .map(|doc| Documentation {
                lang: doc.get_attribute_ns(XML_NAMESPACE, "lang").map(str::to_string),
                text: normalize_whitespace(&doc.text_content()),
            })
            .collect()
    }

    /// Documentation annotations of the schema element itself
    pub fn document_documentation(&self) -> Vec<Documentation> {
        self.documentation(self.root())
    }
}

/// Collapse whitespace runs to single spaces and trim the ends
fn normalize_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}
