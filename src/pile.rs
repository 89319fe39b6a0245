//! Schema pile construction
//!
//! A [`SchemaPile`] is the transitive closure of schema documents reachable
//! from a list of starting points: schema files, catalog files and namespace
//! URIs. Every namespace in the pile maps to exactly one local document.
//!
//! Construction fails only when an *initial* input cannot be located or
//! classified. Problems met while following imports (no mapping, a remote
//! location, a missing file, a namespace mismatch) are recorded in
//! [`SchemaPile::messages`] and the rest of the pile is still built.
//!
//! # Example
//!
//! ```rust,ignore
//! use xsdpile::SchemaPile;
//!
//! let pile = SchemaPile::from_args(&["catalog.xml", "http://example.com/goodXsTest/"])?;
//! for ns in pile.schema_namespaces() {
//!     println!("{} -> {}", ns, pile.schema_document(ns).unwrap().uri());
//! }
//! ```

use indexmap::{IndexMap, IndexSet};
use serde::Serialize;
use std::collections::{HashSet, VecDeque};
use std::path::PathBuf;
use std::rc::Rc;
use tracing::{debug, info, warn};
use url::Url;

use crate::catalog::{Catalog, CatalogResolver, Resolution, REMOTE_MAP};
use crate::error::{Error, Result};
use crate::kinds::{ndr_conformance, Kind, NamespaceKinds, UtilityKind};
use crate::limits::Limits;
use crate::loaders::Loader;
use crate::locations::{self, Location};
use crate::namespaces::PrefixMap;
use crate::schema_document::SchemaDocument;
use crate::validation::{ImportConsistencyValidator, SchemaValidator};
use crate::{XML_NAMESPACE, XSD_INSTANCE_NAMESPACE, XSD_NAMESPACE};

/// Options controlling pile construction
#[derive(Debug, Clone, Default)]
pub struct PileOptions {
    /// Resource limits
    pub limits: Limits,
    /// Also load namespaces that are declared but never imported, when the
    /// catalog maps them to local files
    pub follow_namespace_declarations: bool,
}

/// Builder for [`SchemaPile`]
pub struct SchemaPileBuilder {
    options: PileOptions,
    validator: Box<dyn SchemaValidator>,
}

impl Default for SchemaPileBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl SchemaPileBuilder {
    /// Builder with default options and the import consistency validator
    pub fn new() -> Self {
        Self {
            options: PileOptions::default(),
            validator: Box::new(ImportConsistencyValidator),
        }
    }

    /// Set the options
    pub fn options(mut self, options: PileOptions) -> Self {
        self.options = options;
        self
    }

    /// Set the resource limits
    pub fn limits(mut self, limits: Limits) -> Self {
        self.options.limits = limits;
        self
    }

    /// Set whether undeclared-but-imported namespaces are followed
    pub fn follow_namespace_declarations(mut self, follow: bool) -> Self {
        self.options.follow_namespace_declarations = follow;
        self
    }

    /// Set the validator run over the finished document set
    pub fn validator(mut self, validator: Box<dyn SchemaValidator>) -> Self {
        self.validator = validator;
        self
    }

    /// Build a pile from an ordered argument list
    ///
    /// Each argument is a schema file path, a catalog file path, a `file:`
    /// URI, or an absolute namespace URI.
    pub fn build<S: AsRef<str>>(self, args: &[S]) -> Result<SchemaPile> {
        let loader = Loader::new().with_limits(self.options.limits.clone());
        let mut parsed = IndexMap::new();
        let inputs = partition(args, &loader, &mut parsed)?;

        let catalogs: Vec<String> = inputs
            .iter()
            .filter_map(|i| match i {
                Input::Catalog(uri) => Some(uri.clone()),
                _ => None,
            })
            .collect();
        if catalogs.is_empty() {
            if let Some(Input::Namespace(uri)) = inputs.iter().find(|i| matches!(i, Input::Namespace(_))) {
                return Err(Error::Unresolved {
                    uri: uri.clone(),
                    reason: "no XML catalog supplied".to_string(),
                });
            }
        }

        let resolver = CatalogResolver::with_loader(&catalogs, loader.clone());
        let mut build = Build {
            loader,
            options: self.options,
            resolver,
            pile_root: None,
            loaded: parsed,
            namespaces: IndexMap::new(),
            included: Vec::new(),
            messages: Vec::new(),
            attempted: HashSet::new(),
            queue: VecDeque::new(),
        };
        build.messages.extend(build.resolver.all_messages().iter().cloned());
        if let Some(first) = catalogs.first() {
            build.pile_root = locations::parent_dir_uri(first);
        }

        let mut initial_schema_docs = Vec::new();
        let mut initial_ns = Vec::new();
        for input in inputs {
            match input {
                Input::Catalog(_) => {}
                Input::Schema(doc) => {
                    build.note_root(doc.uri());
                    initial_schema_docs.push(doc.uri().to_string());
                    build.add_initial(doc);
                }
                Input::Namespace(ns) => {
                    let doc = build.resolve_initial_namespace(&ns)?;
                    initial_schema_docs.push(doc.uri().to_string());
                    initial_ns.push(ns);
                    build.add_initial(doc);
                }
            }
        }

        build.close();

        let documents: Vec<&SchemaDocument> = build.loaded.values().map(|d| d.as_ref()).collect();
        let validator_messages = self.validator.validate(&documents);
        for msg in &validator_messages {
            debug!("validator: {}", msg);
        }

        info!(
            namespaces = build.namespaces.len(),
            documents = build.loaded.len(),
            diagnostics = build.messages.len(),
            "schema pile built"
        );

        Ok(SchemaPile {
            pile_root: build.pile_root,
            initial_schema_docs,
            initial_catalogs: catalogs,
            initial_ns,
            resolver: build.resolver,
            namespaces: build.namespaces,
            included: build.included,
            messages: build.messages,
            validator_messages,
        })
    }
}

/// One classified argument
enum Input {
    Catalog(String),
    Schema(Rc<SchemaDocument>),
    Namespace(String),
}

/// Classify every argument, loading local files to tell catalogs from schemas.
///
/// Schema files land in `parsed` keyed by canonical file URI; a file named
/// twice is parsed once.
fn partition<S: AsRef<str>>(
    args: &[S],
    loader: &Loader,
    parsed: &mut IndexMap<String, Rc<SchemaDocument>>,
) -> Result<Vec<Input>> {
    let mut inputs = Vec::with_capacity(args.len());
    let mut catalogs = HashSet::new();
    for arg in args {
        let arg = arg.as_ref();
        let path = match Location::from_arg(arg)? {
            Location::Namespace(uri) => {
                inputs.push(Input::Namespace(uri));
                continue;
            }
            Location::Path(path) => path,
        };
        let uri = locations::canonical_file_uri(&path).map_err(|_| Error::FileNotFound(arg.to_string()))?;
        if let Some(existing) = parsed.get(&uri) {
            inputs.push(Input::Schema(Rc::clone(existing)));
            continue;
        }
        if catalogs.contains(&uri) {
            inputs.push(Input::Catalog(uri));
            continue;
        }
        let doc = match loader.load_document(&path) {
            Ok(doc) => doc,
            Err(Error::FileNotFound(_)) => return Err(Error::FileNotFound(uri)),
            Err(Error::Xml(_)) => return Err(Error::NotSchemaOrCatalog(uri)),
            Err(e) => return Err(e),
        };
        if Catalog::is_catalog_root(doc.root()) {
            catalogs.insert(uri.clone());
            inputs.push(Input::Catalog(uri));
        } else {
            let schema = SchemaDocument::from_document(doc, &uri);
            if !schema.is_schema() {
                return Err(Error::NotSchemaOrCatalog(uri));
            }
            loader.limits().check_documents(parsed.len() + 1)?;
            let schema = Rc::new(schema);
            parsed.insert(uri, Rc::clone(&schema));
            inputs.push(Input::Schema(schema));
        }
    }
    Ok(inputs)
}

/// Mutable state of one pile build
struct Build {
    loader: Loader,
    options: PileOptions,
    resolver: CatalogResolver,
    pile_root: Option<String>,
    /// Every document parsed, keyed by canonical file URI
    loaded: IndexMap<String, Rc<SchemaDocument>>,
    namespaces: IndexMap<String, Rc<SchemaDocument>>,
    included: Vec<Rc<SchemaDocument>>,
    messages: Vec<String>,
    /// (namespace, chosen file) pairs already tried
    attempted: HashSet<(String, String)>,
    queue: VecDeque<Rc<SchemaDocument>>,
}

impl Build {
    fn diagnostic(&mut self, msg: String) {
        warn!("{}", msg);
        self.messages.push(msg);
    }

    fn note_root(&mut self, file_uri: &str) {
        if self.pile_root.is_none() {
            self.pile_root = locations::parent_dir_uri(file_uri);
        }
    }

    /// Load (or fetch from cache) the schema document at a `file:` URI
    fn load(&mut self, file_uri: &str) -> Result<Rc<SchemaDocument>> {
        let path: PathBuf =
            locations::file_uri_to_path(file_uri).ok_or_else(|| Error::FileNotFound(file_uri.to_string()))?;
        let canonical =
            locations::canonical_file_uri(&path).map_err(|_| Error::FileNotFound(file_uri.to_string()))?;
        if let Some(existing) = self.loaded.get(&canonical) {
            return Ok(Rc::clone(existing));
        }
        self.loader.limits().check_documents(self.loaded.len() + 1)?;
        let doc = match SchemaDocument::from_file(&path, &self.loader) {
            Ok(doc) => doc,
            Err(Error::Xml(_)) => return Err(Error::NotSchema(canonical)),
            Err(Error::FileNotFound(_)) => return Err(Error::FileNotFound(canonical)),
            Err(e) => return Err(e),
        };
        if !doc.is_schema() {
            return Err(Error::NotSchema(canonical));
        }
        debug!(uri = %canonical, namespace = doc.target_namespace(), "loaded schema document");
        let doc = Rc::new(doc);
        self.loaded.insert(canonical, Rc::clone(&doc));
        Ok(doc)
    }

    /// Load `file_uri` and check it declares `namespace`
    fn load_namespace(&mut self, namespace: &str, file_uri: &str) -> Result<Rc<SchemaDocument>> {
        let doc = self.load(file_uri)?;
        if doc.target_namespace() != namespace {
            return Err(Error::WrongTargetNamespace {
                file: doc.uri().to_string(),
                expected: namespace.to_string(),
                found: doc.target_namespace().to_string(),
            });
        }
        Ok(doc)
    }

    fn resolve_initial_namespace(&mut self, ns: &str) -> Result<Rc<SchemaDocument>> {
        let file_uri = match self.resolver.resolve_uri(ns) {
            Resolution::Local(uri) => uri,
            Resolution::Remote => {
                return Err(Error::NotLocal {
                    uri: ns.to_string(),
                    target: REMOTE_MAP.to_string(),
                })
            }
            Resolution::NoMap => {
                return Err(Error::Unresolved {
                    uri: ns.to_string(),
                    reason: "no catalog entry".to_string(),
                })
            }
        };
        if locations::file_uri_to_path(&file_uri).is_none() {
            return Err(Error::HostnameNotAllowed(file_uri));
        }
        let doc = self.load_namespace(ns, &file_uri)?;
        self.note_root(doc.uri());
        Ok(doc)
    }

    /// Put an initial document in the pile and queue it for traversal
    fn add_initial(&mut self, doc: Rc<SchemaDocument>) {
        let ns = doc.target_namespace().to_string();
        if ns.is_empty() {
            self.diagnostic(format!("{} has no target namespace", doc.uri()));
        } else if let Some(existing) = self.namespaces.get(&ns) {
            if existing.uri() != doc.uri() {
                let msg = format!(
                    "Namespace {} is already provided by {}; {} ignored",
                    ns,
                    existing.uri(),
                    doc.uri()
                );
                self.diagnostic(msg);
            }
            return;
        } else {
            self.namespaces.insert(ns, Rc::clone(&doc));
        }
        self.queue.push_back(doc);
    }

    /// Follow includes and imports until no new documents appear
    fn close(&mut self) {
        let mut processed: IndexSet<String> = IndexSet::new();
        while let Some(doc) = self.queue.pop_front() {
            if !processed.insert(doc.uri().to_string()) {
                continue;
            }
            self.follow_includes(&doc);
            self.follow_imports(&doc);
            if self.options.follow_namespace_declarations {
                self.follow_declarations(&doc);
            }
        }
    }

    fn follow_includes(&mut self, doc: &Rc<SchemaDocument>) {
        for include in doc.includes() {
            let Some(location) = include.schema_location.as_deref() else {
                self.diagnostic(format!(
                    "{}:{}: xs:include without a schemaLocation attribute",
                    doc.uri(),
                    include.line
                ));
                continue;
            };
            let file_uri = match self.resolve_hint(doc.uri(), location) {
                Resolution::Local(uri) => uri,
                other => {
                    self.diagnostic(format!(
                        "{}:{}: included schema {} resolves to {}, which is not a local URI",
                        doc.uri(),
                        include.line,
                        location,
                        other
                    ));
                    continue;
                }
            };
            let part = match self.load(&file_uri) {
                Ok(part) => part,
                Err(e) => {
                    self.diagnostic(format!("{} (included by {})", e, doc.uri()));
                    continue;
                }
            };
            let part_ns = part.target_namespace();
            if !part_ns.is_empty() && part_ns != doc.target_namespace() {
                let err = Error::WrongTargetNamespace {
                    file: part.uri().to_string(),
                    expected: doc.target_namespace().to_string(),
                    found: part_ns.to_string(),
                };
                self.diagnostic(format!("{} (included by {})", err, doc.uri()));
                continue;
            }
            let known = Rc::ptr_eq(&part, doc)
                || self.included.iter().any(|d| Rc::ptr_eq(d, &part))
                || self.namespaces.values().any(|d| Rc::ptr_eq(d, &part));
            if !known {
                self.included.push(Rc::clone(&part));
                self.queue.push_back(part);
            }
        }
    }

    fn follow_imports(&mut self, doc: &Rc<SchemaDocument>) {
        for import in doc.imports() {
            let Some(ns) = import.namespace.as_deref() else {
                self.diagnostic(format!(
                    "{}:{}: xs:import without a namespace attribute",
                    doc.uri(),
                    import.line
                ));
                continue;
            };
            if self.namespaces.contains_key(ns) {
                continue;
            }

            let from_catalog = self.resolver.resolve_uri(ns);
            let from_hint = import
                .schema_location
                .as_deref()
                .map(|hint| self.resolve_hint(doc.uri(), hint));

            let file_uri = match (&from_catalog, &from_hint) {
                (Resolution::Local(cat), Some(Resolution::Local(hint))) => {
                    if !same_file(cat, hint) {
                        self.diagnostic(format!(
                            "{}:{}: schemaLocation {} for namespace {} disagrees with catalog mapping {}; using the catalog",
                            doc.uri(),
                            import.line,
                            hint,
                            ns,
                            cat
                        ));
                    }
                    cat.clone()
                }
                (Resolution::Local(cat), _) => cat.clone(),
                (_, Some(Resolution::Local(hint))) => hint.clone(),
                _ => {
                    if ns == XML_NAMESPACE {
                        continue;
                    }
                    if !self.attempted.insert((ns.to_string(), String::new())) {
                        continue;
                    }
                    let remote = from_catalog == Resolution::Remote || from_hint == Some(Resolution::Remote);
                    let msg = if remote {
                        format!(
                            "{}:{}: imported namespace {} resolves to {}, which is not a local URI",
                            doc.uri(),
                            import.line,
                            ns,
                            REMOTE_MAP
                        )
                    } else {
                        format!("{}:{}: Can't resolve imported namespace {}", doc.uri(), import.line, ns)
                    };
                    self.diagnostic(msg);
                    continue;
                }
            };

            if !self.attempted.insert((ns.to_string(), file_uri.clone())) {
                continue;
            }
            match self.load_namespace(ns, &file_uri) {
                Ok(imported) => {
                    self.namespaces.insert(ns.to_string(), Rc::clone(&imported));
                    self.queue.push_back(imported);
                }
                Err(e) => self.diagnostic(format!("{} (imported by {})", e, doc.uri())),
            }
        }
    }

    fn follow_declarations(&mut self, doc: &Rc<SchemaDocument>) {
        let uris: Vec<String> = doc.namespace_decls().iter().map(|d| d.uri.clone()).collect();
        for ns in uris {
            if ns.is_empty()
                || self.namespaces.contains_key(&ns)
                || matches!(ns.as_str(), XSD_NAMESPACE | XSD_INSTANCE_NAMESPACE | XML_NAMESPACE)
            {
                continue;
            }
            let Resolution::Local(file_uri) = self.resolver.resolve_uri(&ns) else {
                continue;
            };
            if !self.attempted.insert((ns.clone(), file_uri.clone())) {
                continue;
            }
            if let Ok(found) = self.load_namespace(&ns, &file_uri) {
                self.namespaces.insert(ns, Rc::clone(&found));
                self.queue.push_back(found);
            }
        }
    }

    /// Resolve a `schemaLocation` value: absolute identifiers go through the
    /// catalog, relative ones are taken against the referring document
    fn resolve_hint(&self, base_uri: &str, hint: &str) -> Resolution {
        let absolute = Url::parse(hint).map(|u| u.scheme().len() > 1).unwrap_or(false);
        if absolute && !locations::is_file_uri(hint) {
            if let Resolution::Local(uri) = self.resolver.resolve_system(hint) {
                return Resolution::Local(uri);
            }
            return Resolution::Remote;
        }
        match locations::resolve_reference(base_uri, hint) {
            Some(uri) if locations::is_file_uri(&uri) => Resolution::Local(uri),
            Some(_) => Resolution::Remote,
            None => Resolution::NoMap,
        }
    }
}

/// Compare two file URIs by the file they name
fn same_file(a: &str, b: &str) -> bool {
    let canonical = |uri: &str| {
        locations::file_uri_to_path(uri)
            .and_then(|p| locations::canonical_file_uri(&p).ok())
            .unwrap_or_else(|| uri.to_string())
    };
    a == b || canonical(a) == canonical(b)
}

/// The resolved schema pile
#[derive(Debug)]
pub struct SchemaPile {
    pile_root: Option<String>,
    initial_schema_docs: Vec<String>,
    initial_catalogs: Vec<String>,
    initial_ns: Vec<String>,
    resolver: CatalogResolver,
    namespaces: IndexMap<String, Rc<SchemaDocument>>,
    included: Vec<Rc<SchemaDocument>>,
    messages: Vec<String>,
    validator_messages: Vec<String>,
}

impl SchemaPile {
    /// Build a pile with default options
    pub fn from_args<S: AsRef<str>>(args: &[S]) -> Result<Self> {
        SchemaPileBuilder::new().build(args)
    }

    /// Directory URI anchoring the pile (trailing slash included)
    pub fn pile_root(&self) -> Option<&str> {
        self.pile_root.as_deref()
    }

    /// File URIs of the initial schema documents, in argument order
    pub fn initial_schema_docs(&self) -> &[String] {
        &self.initial_schema_docs
    }

    /// File URIs of the catalogs given as arguments
    pub fn initial_catalogs(&self) -> &[String] {
        &self.initial_catalogs
    }

    /// Namespace URIs given as arguments
    pub fn initial_namespaces(&self) -> &[String] {
        &self.initial_ns
    }

    /// The catalog resolver used to build the pile
    pub fn resolver(&self) -> &CatalogResolver {
        &self.resolver
    }

    /// Every namespace in the pile, in discovery order
    pub fn schema_namespaces(&self) -> Vec<&str> {
        self.namespaces.keys().map(|k| k.as_str()).collect()
    }

    /// The document for a namespace
    pub fn schema_document(&self, namespace: &str) -> Option<&SchemaDocument> {
        self.namespaces.get(namespace).map(|d| d.as_ref())
    }

    /// Namespace → document pairs in discovery order
    pub fn documents(&self) -> impl Iterator<Item = (&str, &SchemaDocument)> {
        self.namespaces.iter().map(|(k, v)| (k.as_str(), v.as_ref()))
    }

    /// Documents reached through `xs:include` rather than as a namespace
    pub fn included_documents(&self) -> impl Iterator<Item = &SchemaDocument> {
        self.included.iter().map(|d| d.as_ref())
    }

    /// Diagnostics recorded while building
    pub fn messages(&self) -> &[String] {
        &self.messages
    }

    /// Diagnostics returned by the schema validator
    pub fn validator_messages(&self) -> &[String] {
        &self.validator_messages
    }

    /// Register pile namespaces that assert NIEM conformance as extensions
    ///
    /// Only namespaces without an explicit record whose URI is otherwise
    /// unrecognised are touched. Returns the namespaces registered.
    pub fn classify(&self, kinds: &mut NamespaceKinds) -> Vec<String> {
        let mut registered = Vec::new();
        for (ns, doc) in self.documents() {
            if kinds.is_overridden(ns) || kinds.kind(ns) != Kind::Unrecognized {
                continue;
            }
            let conformance = doc.conformance_targets().iter().find_map(|t| ndr_conformance(t));
            if let Some((architecture, version)) = conformance {
                kinds.set(ns, architecture, Kind::Extension, UtilityKind::NotUtility, &version);
                registered.push(ns.to_string());
            }
        }
        registered
    }

    /// Allocate a prefix for every pile namespace
    ///
    /// The preferred prefix is the one the namespace's own document declares
    /// for it, else the first declaration found in any pile document.
    pub fn assign_prefixes(&self, map: &mut PrefixMap) -> Vec<(String, String)> {
        let mut assigned = Vec::new();
        for (ns, doc) in self.documents() {
            let preferred = doc
                .root_prefix_for(ns)
                .or_else(|| self.namespaces.values().find_map(|d| d.root_prefix_for(ns)))
                .unwrap_or("ns")
                .to_string();
            let prefix = map.assign_prefix(&preferred, ns);
            assigned.push((ns.to_string(), prefix));
        }
        assigned
    }

    /// Serializable summary of the pile
    pub fn to_report(&self, kinds: &NamespaceKinds) -> PileReport {
        PileReport {
            pile_root: self.pile_root.clone(),
            initial_schema_docs: self.initial_schema_docs.clone(),
            initial_catalogs: self.initial_catalogs.clone(),
            initial_namespaces: self.initial_ns.clone(),
            catalogs: self.resolver.all_catalogs(),
            namespaces: self
                .documents()
                .map(|(ns, doc)| {
                    let rec = kinds.record(ns);
                    NamespaceReport {
                        uri: ns.to_string(),
                        document: doc.uri().to_string(),
                        architecture: rec.architecture.to_string(),
                        kind: rec.kind.to_string(),
                        utility_kind: rec.utility_kind.to_string(),
                        version: rec.version,
                    }
                })
                .collect(),
            included_documents: self.included.iter().map(|d| d.uri().to_string()).collect(),
            resolutions: self.resolver.all_resolutions(),
            messages: self.messages.clone(),
            validator_messages: self.validator_messages.clone(),
        }
    }
}

/// Serializable pile summary
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PileReport {
    /// Pile root directory URI
    pub pile_root: Option<String>,
    /// Initial schema document URIs
    pub initial_schema_docs: Vec<String>,
    /// Initial catalog URIs
    pub initial_catalogs: Vec<String>,
    /// Initial namespace arguments
    pub initial_namespaces: Vec<String>,
    /// Every catalog loaded
    pub catalogs: Vec<String>,
    /// Namespaces with their documents and classification
    pub namespaces: Vec<NamespaceReport>,
    /// Documents reached by include
    pub included_documents: Vec<String>,
    /// Catalog queries and outcomes
    pub resolutions: IndexMap<String, String>,
    /// Build diagnostics
    pub messages: Vec<String>,
    /// Validator diagnostics
    pub validator_messages: Vec<String>,
}

/// One namespace of a [`PileReport`]
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NamespaceReport {
    /// Namespace URI
    pub uri: String,
    /// File URI of its document
    pub document: String,
    /// Architecture tag
    pub architecture: String,
    /// Kind tag
    pub kind: String,
    /// Utility kind tag
    pub utility_kind: String,
    /// Version segment
    pub version: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const XS: &str = "http://www.w3.org/2001/XMLSchema";

    fn write(dir: &TempDir, name: &str, content: &str) -> String {
        let path = dir.path().join(name);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).unwrap();
        }
        std::fs::write(&path, content).unwrap();
        path.to_string_lossy().to_string()
    }

    fn schema(tns: &str, body: &str) -> String {
        format!(
            "<xs:schema xmlns:xs=\"{}\" targetNamespace=\"{}\">{}</xs:schema>",
            XS, tns, body
        )
    }

    #[test]
    fn test_single_schema_no_imports() {
        let dir = TempDir::new().unwrap();
        let a = write(&dir, "a.xsd", &schema("urn:a", ""));
        let pile = SchemaPile::from_args(&[&a]).unwrap();
        assert_eq!(pile.schema_namespaces(), vec!["urn:a"]);
        assert!(pile.messages().is_empty());
        assert!(pile.validator_messages().is_empty());
        assert!(pile.initial_namespaces().is_empty());
        assert_eq!(pile.initial_schema_docs().len(), 1);
        let root = pile.pile_root().unwrap();
        assert!(root.starts_with("file:///") && root.ends_with('/'));
    }

    #[test]
    fn test_hint_and_include_following() {
        let dir = TempDir::new().unwrap();
        let a = write(
            &dir,
            "a.xsd",
            &schema(
                "urn:a",
                r#"<xs:include schemaLocation="a-part.xsd"/><xs:import namespace="urn:b" schemaLocation="sub/b.xsd"/>"#,
            ),
        );
        write(
            &dir,
            "a-part.xsd",
            &schema("urn:a", r#"<xs:import namespace="urn:c" schemaLocation="c.xsd"/>"#),
        );
        write(&dir, "sub/b.xsd", &schema("urn:b", ""));
        write(&dir, "c.xsd", &schema("urn:c", ""));

        let pile = SchemaPile::from_args(&[&a]).unwrap();
        assert_eq!(pile.schema_namespaces(), vec!["urn:a", "urn:b", "urn:c"]);
        assert_eq!(pile.included_documents().count(), 1);
        assert!(pile.messages().is_empty(), "{:?}", pile.messages());
    }

    #[test]
    fn test_import_cycle_terminates() {
        let dir = TempDir::new().unwrap();
        let a = write(
            &dir,
            "a.xsd",
            &schema("urn:a", r#"<xs:import namespace="urn:b" schemaLocation="b.xsd"/>"#),
        );
        write(
            &dir,
            "b.xsd",
            &schema("urn:b", r#"<xs:import namespace="urn:a" schemaLocation="a.xsd"/>"#),
        );
        let pile = SchemaPile::from_args(&[&a]).unwrap();
        assert_eq!(pile.schema_namespaces(), vec!["urn:a", "urn:b"]);
    }

    #[test]
    fn test_transitive_failures_are_diagnostics() {
        let dir = TempDir::new().unwrap();
        let a = write(
            &dir,
            "a.xsd",
            &schema(
                "urn:a",
                r#"<xs:import namespace="urn:missing"/>
                   <xs:import namespace="urn:gone" schemaLocation="gone.xsd"/>
                   <xs:import namespace="urn:wrong" schemaLocation="w.xsd"/>
                   <xs:import namespace="urn:far" schemaLocation="http://example.com/far.xsd"/>
                   <xs:import namespace="http://www.w3.org/XML/1998/namespace"/>"#,
            ),
        );
        write(&dir, "w.xsd", &schema("urn:not-wrong", ""));

        let pile = SchemaPile::from_args(&[&a]).unwrap();
        assert_eq!(pile.schema_namespaces(), vec!["urn:a"]);
        let messages = pile.messages();
        assert_eq!(messages.len(), 4, "{:?}", messages);
        assert!(messages[0].contains("Can't resolve"));
        assert!(messages[1].contains("cannot find the file"));
        assert!(messages[2].contains("wrong target namespace"));
        assert!(messages[3].contains("not a local URI"));
        assert_eq!(pile.validator_messages().len(), 4);
    }

    fn catalog(entries: &str) -> String {
        format!(
            "<catalog xmlns=\"urn:oasis:names:tc:entity:xmlns:xml:catalog\">{}</catalog>",
            entries
        )
    }

    #[test]
    fn test_catalog_beats_disagreeing_hint() {
        let dir = TempDir::new().unwrap();
        let cat = write(&dir, "catalog.xml", &catalog(r#"<uri name="urn:b" uri="b.xsd"/>"#));
        let a = write(
            &dir,
            "a.xsd",
            &schema("urn:a", r#"<xs:import namespace="urn:b" schemaLocation="old/b.xsd"/>"#),
        );
        write(&dir, "b.xsd", &schema("urn:b", ""));
        write(&dir, "old/b.xsd", &schema("urn:b", ""));

        let pile = SchemaPile::from_args(&[&cat, &a]).unwrap();
        assert!(pile.schema_document("urn:b").unwrap().uri().ends_with("/b.xsd"));
        assert!(!pile.schema_document("urn:b").unwrap().uri().contains("/old/"));
        assert_eq!(pile.messages().len(), 1);
        assert!(pile.messages()[0].contains("disagrees with catalog"));
    }

    #[test]
    fn test_agreeing_hint_is_silent() {
        let dir = TempDir::new().unwrap();
        let cat = write(&dir, "catalog.xml", &catalog(r#"<uri name="urn:b" uri="b.xsd"/>"#));
        let a = write(
            &dir,
            "a.xsd",
            &schema("urn:a", r#"<xs:import namespace="urn:b" schemaLocation="./b.xsd"/>"#),
        );
        write(&dir, "b.xsd", &schema("urn:b", ""));
        let pile = SchemaPile::from_args(&[&cat, &a]).unwrap();
        assert_eq!(pile.schema_namespaces(), vec!["urn:a", "urn:b"]);
        assert!(pile.messages().is_empty(), "{:?}", pile.messages());
    }

    #[test]
    fn test_follow_namespace_declarations() {
        let dir = TempDir::new().unwrap();
        let cat = write(&dir, "catalog.xml", &catalog(r#"<uri name="urn:d" uri="d.xsd"/>"#));
        let a = write(
            &dir,
            "a.xsd",
            &format!(
                "<xs:schema xmlns:xs=\"{}\" xmlns:d=\"urn:d\" xmlns:u=\"urn:unmapped\" targetNamespace=\"urn:a\"/>",
                XS
            ),
        );
        write(&dir, "d.xsd", &schema("urn:d", ""));

        let pile = SchemaPile::from_args(&[&cat, &a]).unwrap();
        assert_eq!(pile.schema_namespaces(), vec!["urn:a"]);

        let pile = SchemaPileBuilder::new()
            .follow_namespace_declarations(true)
            .build(&[&cat, &a])
            .unwrap();
        assert_eq!(pile.schema_namespaces(), vec!["urn:a", "urn:d"]);
        assert!(pile.messages().is_empty());
    }

    #[test]
    fn test_initial_namespace_conflict() {
        let dir = TempDir::new().unwrap();
        let one = write(&dir, "one.xsd", &schema("urn:a", ""));
        let two = write(&dir, "two.xsd", &schema("urn:a", ""));
        let pile = SchemaPile::from_args(&[&one, &two]).unwrap();
        assert_eq!(pile.schema_namespaces(), vec!["urn:a"]);
        assert!(pile.schema_document("urn:a").unwrap().uri().ends_with("one.xsd"));
        assert_eq!(pile.initial_schema_docs().len(), 2);
        assert!(pile.messages()[0].contains("already provided by"));
    }

    #[test]
    fn test_no_namespace_schema() {
        let dir = TempDir::new().unwrap();
        let a = write(
            &dir,
            "a.xsd",
            &format!(
                "<xs:schema xmlns:xs=\"{}\"><xs:import namespace=\"urn:b\" schemaLocation=\"b.xsd\"/></xs:schema>",
                XS
            ),
        );
        write(&dir, "b.xsd", &schema("urn:b", ""));
        let pile = SchemaPile::from_args(&[&a]).unwrap();
        assert_eq!(pile.schema_namespaces(), vec!["urn:b"]);
        assert!(pile.messages()[0].contains("has no target namespace"));
    }

    #[test]
    fn test_custom_validator_messages_recorded() {
        struct Complainer;
        impl SchemaValidator for Complainer {
            fn validate(&self, documents: &[&SchemaDocument]) -> Vec<String> {
                documents.iter().map(|d| format!("checked {}", d.target_namespace())).collect()
            }
        }
        let dir = TempDir::new().unwrap();
        let a = write(&dir, "a.xsd", &schema("urn:a", ""));
        let pile = SchemaPileBuilder::new()
            .validator(Box::new(Complainer))
            .build(&[&a])
            .unwrap();
        assert_eq!(pile.validator_messages(), ["checked urn:a".to_string()]);
    }

    #[test]
    fn test_namespace_argument_without_catalog() {
        let err = SchemaPile::from_args(&["http://example.com/ns/"]).unwrap_err();
        assert!(err.to_string().contains("Can't resolve"));
    }

    #[test]
    fn test_non_schema_initial_file() {
        let dir = TempDir::new().unwrap();
        let x = write(&dir, "x.xml", "<root/>");
        let err = SchemaPile::from_args(&[&x]).unwrap_err();
        assert!(err.to_string().contains("not a schema document or XML catalog"));

        let bad = write(&dir, "bad.xsd", "<xs:schema");
        let err = SchemaPile::from_args(&[&bad]).unwrap_err();
        assert!(err.to_string().contains("not a schema document or XML catalog"));

        let err = SchemaPile::from_args(&[dir.path().join("none.xsd").to_string_lossy()]).unwrap_err();
        assert!(err.to_string().contains("cannot find the file"));
    }

    #[test]
    fn test_unreadable_mapped_file() {
        let dir = TempDir::new().unwrap();
        std::fs::create_dir(dir.path().join("adir")).unwrap();
        let cat = write(&dir, "catalog.xml", &catalog(r#"<uri name="http://e.com/ns/" uri="adir"/>"#));
        let err = SchemaPile::from_args(&[cat.as_str(), "http://e.com/ns/"]).unwrap_err();
        assert!(matches!(err, Error::FileNotFound(_)), "{:?}", err);
        assert!(err.to_string().contains("cannot find the file"));

        let a = write(
            &dir,
            "a.xsd",
            &schema("urn:a", r#"<xs:import namespace="urn:d" schemaLocation="adir"/>"#),
        );
        let pile = SchemaPile::from_args(&[&a]).unwrap();
        assert_eq!(pile.messages().len(), 1, "{:?}", pile.messages());
        assert!(pile.messages()[0].contains("cannot find the file"));

        let err = SchemaPile::from_args(&[dir.path().join("adir").to_string_lossy()]).unwrap_err();
        assert!(err.to_string().contains("cannot find the file"), "{}", err);
    }

    #[test]
    fn test_repeated_file_argument_parsed_once() {
        let dir = TempDir::new().unwrap();
        let a = write(&dir, "a.xsd", &schema("urn:a", ""));
        let a_uri = locations::canonical_file_uri(std::path::Path::new(&a)).unwrap();
        let loader = Loader::new();
        let mut parsed = IndexMap::new();
        let inputs = partition(&[a.as_str(), a_uri.as_str()], &loader, &mut parsed).unwrap();

        assert_eq!(parsed.len(), 1);
        match (&inputs[0], &inputs[1]) {
            (Input::Schema(first), Input::Schema(second)) => assert!(Rc::ptr_eq(first, second)),
            _ => panic!("expected two schema inputs"),
        }

        let pile = SchemaPile::from_args(&[a.as_str(), a_uri.as_str()]).unwrap();
        assert_eq!(pile.initial_schema_docs().len(), 2);
        assert_eq!(pile.schema_namespaces(), vec!["urn:a"]);
        assert!(pile.messages().is_empty(), "{:?}", pile.messages());
    }

    #[test]
    fn test_document_limit() {
        let dir = TempDir::new().unwrap();
        let a = write(
            &dir,
            "a.xsd",
            &schema("urn:a", r#"<xs:import namespace="urn:b" schemaLocation="b.xsd"/>"#),
        );
        write(&dir, "b.xsd", &schema("urn:b", ""));
        let limits = Limits {
            max_documents: 1,
            ..Limits::default()
        };
        let pile = SchemaPileBuilder::new().limits(limits).build(&[&a]).unwrap();
        assert_eq!(pile.schema_namespaces(), vec!["urn:a"]);
        assert!(pile.messages()[0].contains("limit exceeded"));
    }

    #[test]
    fn test_assign_prefixes_from_declarations() {
        let dir = TempDir::new().unwrap();
        let a = write(
            &dir,
            "a.xsd",
            &format!(
                "<xs:schema xmlns:xs=\"{}\" xmlns:a=\"urn:a\" xmlns:b=\"urn:b\" targetNamespace=\"urn:a\">\
                 <xs:import namespace=\"urn:b\" schemaLocation=\"b.xsd\"/></xs:schema>",
                XS
            ),
        );
        write(&dir, "b.xsd", &schema("urn:b", ""));
        let pile = SchemaPile::from_args(&[&a]).unwrap();

        let mut map = PrefixMap::new();
        map.assign_prefix("b", "urn:squatter");
        let assigned = pile.assign_prefixes(&mut map);
        assert_eq!(
            assigned,
            vec![
                ("urn:a".to_string(), "a".to_string()),
                ("urn:b".to_string(), "b_1".to_string()),
            ]
        );
    }
}
