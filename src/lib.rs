//! # xsdpile
//!
//! Resolves a set of XML Schema documents, XML catalogs and namespace URIs
//! into a *schema pile*: the transitive closure of schema documents reachable
//! through `xs:import` and `xs:include`, with every namespace mapped to one
//! local file.
//!
//! ## Features
//!
//! - OASIS XML catalog chains (`uri`, `rewriteURI`, `system`,
//!   `rewriteSystem`, `nextCatalog`, `group`, `xml:base`)
//! - Import and include traversal with diagnostics instead of hard failures
//! - NIEM namespace classification by URI pattern, with caller overrides
//! - Namespace prefix allocation without collisions
//! - Resource limits for untrusted input
//!
//! Nothing is ever fetched from the network. A namespace that resolves to a
//! remote location is reported, not downloaded.
//!
//! ## Example
//!
//! ```rust,ignore
//! use xsdpile::{NamespaceKinds, PrefixMap, SchemaPile};
//!
//! let pile = SchemaPile::from_args(&["niem/xml-catalog.xml", "http://example.com/ext/1.0/"])?;
//!
//! let mut kinds = NamespaceKinds::new();
//! pile.classify(&mut kinds);
//! for (ns, doc) in pile.documents() {
//!     println!("{} {} {}", kinds.kind(ns), ns, doc.uri());
//! }
//!
//! let mut prefixes = PrefixMap::new();
//! pile.assign_prefixes(&mut prefixes);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

// Foundation
pub mod error;
pub mod limits;

// Names and locations
pub mod namespaces;
pub mod names;
pub mod locations;

// Resource loading
pub mod loaders;
pub mod documents;

// Catalogs and schema documents
pub mod catalog;
pub mod kinds;
pub mod schema_document;
pub mod validation;

// Pile construction
pub mod pile;

// Re-exports for convenience
pub use catalog::{CatalogResolver, Resolution};
pub use error::{Error, Result};
pub use kinds::{Architecture, Kind, NamespaceKinds, UtilityKind};
pub use namespaces::PrefixMap;
pub use pile::{PileOptions, SchemaPile, SchemaPileBuilder};
pub use schema_document::SchemaDocument;

/// Version of the xsdpile library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// XML Schema namespace
pub const XSD_NAMESPACE: &str = "http://www.w3.org/2001/XMLSchema";

/// XML Schema instance namespace
pub const XSD_INSTANCE_NAMESPACE: &str = "http://www.w3.org/2001/XMLSchema-instance";

/// XML namespace
pub const XML_NAMESPACE: &str = "http://www.w3.org/XML/1998/namespace";
