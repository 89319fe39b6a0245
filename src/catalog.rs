//! XML Catalog support for namespace resolution
//!
//! This module implements the subset of OASIS XML Catalogs needed to map
//! namespace URIs (and `schemaLocation` identifiers) to local schema files.
//!
//! XML Catalogs are defined by OASIS:
//! https://www.oasis-open.org/committees/entity/spec-2001-08-06.html
//!
//! # Supported Elements
//!
//! - `<catalog>` - Root element (honours `xml:base`)
//! - `<group>` - Grouping element (inherits base from parent, may override)
//! - `<uri>` - Maps a URI to a resource
//! - `<rewriteURI>` - Rewrites a URI prefix
//! - `<system>` - Maps system identifiers to URIs
//! - `<rewriteSystem>` - Rewrites a system identifier prefix
//! - `<nextCatalog>` - Chains another catalog file
//!
//! # Example
//!
//! ```xml
//! <catalog xmlns="urn:oasis:names:tc:entity:xmlns:xml:catalog">
//!   <uri name="http://release.niem.gov/niem/niem-core/5.0/" uri="niem/niem-core.xsd"/>
//!   <rewriteURI uriStartString="http://example.com/remote/" rewritePrefix="http://mirror.example.com/"/>
//!   <nextCatalog catalog="niem/xml-catalog.xml"/>
//! </catalog>
//! ```
//!
//! A [`CatalogResolver`] loads a chain of such files and answers every
//! lookup with a [`Resolution`]: a local file URI, [`Resolution::Remote`]
//! or [`Resolution::NoMap`]. Problems with individual catalog files are
//! recorded as messages rather than returned as errors.

use indexmap::IndexMap;
use std::cell::RefCell;
use std::collections::HashSet;
use std::fmt;
use std::path::PathBuf;
use tracing::{debug, trace, warn};

use crate::documents::{Document, Element};
use crate::error::{Error, Result};
use crate::loaders::Loader;
use crate::locations::{self, Location};
use crate::XML_NAMESPACE;

/// The XML Catalog namespace
pub const CATALOG_NS: &str = "urn:oasis:names:tc:entity:xmlns:xml:catalog";

/// Outcome string for a URI that maps to a remote resource
pub const REMOTE_MAP: &str = "REMOTE MAP";

/// Outcome string for a URI no catalog maps
pub const NO_MAP: &str = "NO MAP";

/// Result of a catalog lookup
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    /// Mapped to a local `file:` URI
    Local(String),
    /// Mapped (or lexically resolved) to something outside the filesystem
    Remote,
    /// No catalog entry matched
    NoMap,
}

impl Resolution {
    /// The local file URI, if any
    pub fn local(&self) -> Option<&str> {
        match self {
            Resolution::Local(uri) => Some(uri),
            _ => None,
        }
    }
}

impl fmt::Display for Resolution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Resolution::Local(uri) => write!(f, "{}", uri),
            Resolution::Remote => write!(f, "{}", REMOTE_MAP),
            Resolution::NoMap => write!(f, "{}", NO_MAP),
        }
    }
}

/// One entry of a catalog file; targets are absolute URIs
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CatalogEntry {
    /// `<uri name=".." uri=".."/>`
    Uri {
        /// Namespace or URI matched exactly
        name: String,
        /// Mapped location
        target: String,
    },
    /// `<rewriteURI uriStartString=".." rewritePrefix=".."/>`
    RewriteUri {
        /// Matched URI prefix
        prefix: String,
        /// Replacement prefix
        rewrite: String,
    },
    /// `<system systemId=".." uri=".."/>`
    System {
        /// System identifier matched exactly
        id: String,
        /// Mapped location
        target: String,
    },
    /// `<rewriteSystem systemIdStartString=".." rewritePrefix=".."/>`
    RewriteSystem {
        /// Matched identifier prefix
        prefix: String,
        /// Replacement prefix
        rewrite: String,
    },
    /// `<nextCatalog catalog=".."/>`
    NextCatalog {
        /// Location of the chained catalog
        target: String,
    },
}

/// One parsed catalog file
#[derive(Debug, Clone)]
pub struct Catalog {
    uri: String,
    entries: Vec<CatalogEntry>,
}

impl Catalog {
    /// Build a catalog from a parsed document located at `uri`
    pub fn from_document(doc: &Document, uri: &str) -> Result<Self> {
        let root = doc.root();
        if !Self::is_catalog_root(root) {
            return Err(Error::Xml(format!(
                "expected catalog root element, got {}",
                root.qname
            )));
        }
        let mut catalog = Catalog {
            uri: uri.to_string(),
            entries: Vec::new(),
        };
        let base = element_base(root, uri);
        catalog.process_catalog_children(&root.children, &base);
        Ok(catalog)
    }

    /// True if the element is an OASIS catalog root
    pub fn is_catalog_root(root: &Element) -> bool {
        root.local_name() == "catalog" && matches!(root.namespace(), Some(CATALOG_NS) | None)
    }

    /// Canonical URI of the catalog file
    pub fn uri(&self) -> &str {
        &self.uri
    }

    /// Entries in document order
    pub fn entries(&self) -> &[CatalogEntry] {
        &self.entries
    }

    /// Process children of a catalog or group element
    fn process_catalog_children(&mut self, children: &[Element], base: &str) {
        for child in children {
            if matches!(child.namespace(), Some(ns) if ns != CATALOG_NS) {
                continue;
            }
            let resolve = |reference: &str| {
                locations::resolve_reference(base, reference).unwrap_or_else(|| reference.to_string())
            };
            match child.local_name() {
                "uri" => {
                    if let (Some(name), Some(uri)) = (child.get_attribute("name"), child.get_attribute("uri")) {
                        self.entries.push(CatalogEntry::Uri {
                            name: name.to_string(),
                            target: resolve(uri),
                        });
                    }
                }
                "rewriteURI" => {
                    if let (Some(prefix), Some(rewrite)) = (
                        child.get_attribute("uriStartString"),
                        child.get_attribute("rewritePrefix"),
                    ) {
                        self.entries.push(CatalogEntry::RewriteUri {
                            prefix: prefix.to_string(),
                            rewrite: resolve(rewrite),
                        });
                    }
                }
                "system" => {
                    if let (Some(id), Some(uri)) = (child.get_attribute("systemId"), child.get_attribute("uri")) {
                        self.entries.push(CatalogEntry::System {
                            id: id.to_string(),
                            target: resolve(uri),
                        });
                    }
                }
                "rewriteSystem" => {
                    if let (Some(prefix), Some(rewrite)) = (
                        child.get_attribute("systemIdStartString"),
                        child.get_attribute("rewritePrefix"),
                    ) {
                        self.entries.push(CatalogEntry::RewriteSystem {
                            prefix: prefix.to_string(),
                            rewrite: resolve(rewrite),
                        });
                    }
                }
                "nextCatalog" => {
                    if let Some(catalog) = child.get_attribute("catalog") {
                        self.entries.push(CatalogEntry::NextCatalog {
                            target: resolve(catalog),
                        });
                    }
                }
                "group" => {
                    let group_base = element_base(child, base);
                    self.process_catalog_children(&child.children, &group_base);
                }
                _ => {
                    // Skip unknown elements (public, delegates, annotations)
                }
            }
        }
    }

    /// Targets of `nextCatalog` entries in document order
    pub fn next_catalogs(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().filter_map(|e| match e {
            CatalogEntry::NextCatalog { target } => Some(target.as_str()),
            _ => None,
        })
    }

    /// Match `uri` against `uri` entries, then the longest `rewriteURI` prefix
    pub fn match_uri(&self, uri: &str) -> Option<String> {
        let exact = self.entries.iter().find_map(|e| match e {
            CatalogEntry::Uri { name, target } if name == uri => Some(target.clone()),
            _ => None,
        });
        exact.or_else(|| {
            longest_rewrite(uri, self.entries.iter().filter_map(|e| match e {
                CatalogEntry::RewriteUri { prefix, rewrite } => Some((prefix, rewrite)),
                _ => None,
            }))
        })
    }

    /// Match a system identifier against `system` then `rewriteSystem` entries
    pub fn match_system(&self, id: &str) -> Option<String> {
        let exact = self.entries.iter().find_map(|e| match e {
            CatalogEntry::System { id: sys, target } if sys == id => Some(target.clone()),
            _ => None,
        });
        exact.or_else(|| {
            longest_rewrite(id, self.entries.iter().filter_map(|e| match e {
                CatalogEntry::RewriteSystem { prefix, rewrite } => Some((prefix, rewrite)),
                _ => None,
            }))
        })
    }
}

/// Apply the rewrite rule with the longest matching prefix
fn longest_rewrite<'a>(
    value: &str,
    rules: impl Iterator<Item = (&'a String, &'a String)>,
) -> Option<String> {
    let mut best: Option<(&String, &String)> = None;
    for (prefix, rewrite) in rules {
        if value.starts_with(prefix.as_str()) && best.map_or(true, |(p, _)| prefix.len() > p.len()) {
            best = Some((prefix, rewrite));
        }
    }
    best.map(|(prefix, rewrite)| format!("{}{}", rewrite, &value[prefix.len()..]))
}

/// Base URI in effect for an element's children
fn element_base(elem: &Element, inherited: &str) -> String {
    match elem.get_attribute_ns(XML_NAMESPACE, "base") {
        Some(base) => {
            locations::resolve_reference(inherited, base).unwrap_or_else(|| inherited.to_string())
        }
        None => inherited.to_string(),
    }
}

/// Resolver over a chain of catalog files
#[derive(Debug)]
pub struct CatalogResolver {
    loader: Loader,
    catalogs: Vec<Catalog>,
    messages: Vec<String>,
    resolutions: RefCell<IndexMap<String, String>>,
}

impl CatalogResolver {
    /// Load the catalogs named by `paths` (paths or `file:` URIs) and every
    /// catalog they chain to
    pub fn new<I>(paths: I) -> Self
    where
        I: IntoIterator,
        I::Item: AsRef<str>,
    {
        Self::with_loader(paths, Loader::new())
    }

    /// As [`new`](Self::new), reading files through `loader`
    pub fn with_loader<I>(paths: I, loader: Loader) -> Self
    where
        I: IntoIterator,
        I::Item: AsRef<str>,
    {
        let mut resolver = Self {
            loader,
            catalogs: Vec::new(),
            messages: Vec::new(),
            resolutions: RefCell::new(IndexMap::new()),
        };
        let initial: Vec<String> = paths.into_iter().map(|p| p.as_ref().to_string()).collect();
        resolver.load_all(initial);
        resolver
    }

    /// Depth-first load: each catalog, then its nextCatalog chain, then the
    /// next initial catalog
    fn load_all(&mut self, initial: Vec<String>) {
        let mut visited: HashSet<String> = HashSet::new();
        let mut stack: Vec<String> = initial.into_iter().rev().collect();

        while let Some(reference) = stack.pop() {
            if !visited.insert(reference.clone()) {
                continue;
            }
            let path = match Self::catalog_path(&reference) {
                Some(path) => path,
                None => {
                    self.message(format!(
                        "Catalog file {} not found (remote catalogs are never fetched)",
                        reference
                    ));
                    continue;
                }
            };
            let uri = match locations::canonical_file_uri(&path) {
                Ok(uri) => uri,
                Err(_) => {
                    self.message(format!("Catalog file {} not found", reference));
                    continue;
                }
            };
            if uri != reference && !visited.insert(uri.clone()) {
                continue;
            }
            if let Err(e) = self.loader.limits().check_catalogs(self.catalogs.len() + 1) {
                self.message(format!("Catalog file {} not loaded: {}", uri, e));
                break;
            }
            let catalog = match self
                .loader
                .load_document(&path)
                .and_then(|doc| Catalog::from_document(&doc, &uri))
            {
                Ok(catalog) => catalog,
                Err(Error::FileNotFound(_)) => {
                    self.message(format!("Catalog file {} not found", uri));
                    continue;
                }
                Err(e) => {
                    self.message(format!("Invalid content in catalog file {}: {}", uri, e));
                    continue;
                }
            };
            debug!(catalog = %uri, entries = catalog.entries().len(), "loaded XML catalog");
            let next: Vec<String> = catalog.next_catalogs().map(str::to_string).collect();
            stack.extend(next.into_iter().rev());
            self.catalogs.push(catalog);
        }
    }

    fn catalog_path(reference: &str) -> Option<PathBuf> {
        match Location::from_arg(reference) {
            Ok(Location::Path(path)) => Some(path),
            _ => None,
        }
    }

    fn message(&mut self, msg: String) {
        warn!("{}", msg);
        self.messages.push(msg);
    }

    fn classify(target: Option<String>, query: &str) -> Resolution {
        match target {
            Some(t) if locations::is_file_uri(&t) => Resolution::Local(t),
            Some(_) => Resolution::Remote,
            None if locations::is_remote_uri(query) => Resolution::Remote,
            None => Resolution::NoMap,
        }
    }

    fn record(&self, query: &str, outcome: &Resolution) {
        trace!(query, outcome = %outcome, "catalog resolution");
        self.resolutions
            .borrow_mut()
            .insert(query.to_string(), outcome.to_string());
    }

    /// Resolve a namespace URI through `uri`/`rewriteURI` entries
    pub fn resolve_uri(&self, uri: &str) -> Resolution {
        let target = self.catalogs.iter().find_map(|c| c.match_uri(uri));
        let outcome = Self::classify(target, uri);
        self.record(uri, &outcome);
        outcome
    }

    /// Resolve a system identifier (e.g. a `schemaLocation` URN) through
    /// `system`/`rewriteSystem` entries, falling back to URI entries
    pub fn resolve_system(&self, id: &str) -> Resolution {
        let target = self
            .catalogs
            .iter()
            .find_map(|c| c.match_system(id))
            .or_else(|| self.catalogs.iter().find_map(|c| c.match_uri(id)));
        let outcome = Self::classify(target, id);
        self.record(id, &outcome);
        outcome
    }

    /// URIs of every catalog loaded, in discovery order
    pub fn all_catalogs(&self) -> Vec<String> {
        self.catalogs.iter().map(|c| c.uri().to_string()).collect()
    }

    /// Loaded catalogs in discovery order
    pub fn catalogs(&self) -> &[Catalog] {
        &self.catalogs
    }

    /// Diagnostics accumulated while loading
    pub fn all_messages(&self) -> &[String] {
        &self.messages
    }

    /// Every query issued so far mapped to its outcome string
    pub fn all_resolutions(&self) -> IndexMap<String, String> {
        self.resolutions.borrow().clone()
    }
}
