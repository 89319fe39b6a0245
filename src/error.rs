//! Error types for xsdpile
//!
//! Every unrecoverable condition raised while building a schema pile is a
//! variant of [`Error`]. Advisory problems (a malformed secondary catalog, an
//! import that cannot be followed) are not errors; they are collected as
//! diagnostic strings on the resolver and the pile.

use thiserror::Error;

/// Result type alias using xsdpile Error
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for schema pile resolution
#[derive(Error, Debug)]
pub enum Error {
    /// A namespace URI has no catalog mapping (or no catalog was supplied)
    #[error("Can't resolve namespace URI {uri}: {reason}")]
    Unresolved {
        /// The namespace URI
        uri: String,
        /// Why resolution failed
        reason: String,
    },

    /// A namespace URI resolved only to a remote resource
    #[error("{uri} resolves to {target}, which is not a local URI")]
    NotLocal {
        /// The namespace URI
        uri: String,
        /// The remote resolution outcome
        target: String,
    },

    /// A local file named by an argument or a catalog does not exist
    #[error("cannot find the file {0}")]
    FileNotFound(String),

    /// A `file:` URI carried a host component
    #[error("A hostname is not allowed in file URI {0}")]
    HostnameNotAllowed(String),

    /// An initial file argument is neither a schema document nor a catalog
    #[error("{0} is not a schema document or XML catalog")]
    NotSchemaOrCatalog(String),

    /// A file resolved for a namespace URI is not a schema document
    #[error("{0} is not a schema document")]
    NotSchema(String),

    /// The resolved document declares a different target namespace
    #[error("{file} has wrong target namespace: expected {expected}, found \"{found}\"")]
    WrongTargetNamespace {
        /// The resolved file URI
        file: String,
        /// The namespace requested
        expected: String,
        /// The namespace the document declares
        found: String,
    },

    /// A prefix is already bound to another namespace
    #[error("Duplicate namespace prefix \"{prefix}\": bound to {existing}, cannot bind to {requested}")]
    DuplicatePrefix {
        /// The prefix
        prefix: String,
        /// URI currently bound to the prefix
        existing: String,
        /// URI the caller tried to bind
        requested: String,
    },

    /// Resource loading error
    #[error("resource error: {0}")]
    Resource(String),

    /// Limit exceeded error
    #[error("limit exceeded: {0}")]
    LimitExceeded(String),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// XML parsing error
    #[error("XML error: {0}")]
    Xml(String),
}

impl Error {
    /// True for errors caused by content that is not well-formed XML
    pub fn is_xml(&self) -> bool {
        matches!(self, Error::Xml(_))
    }
}
