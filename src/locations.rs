//! Resource location resolution
//!
//! Classifies the raw strings handed to the pile builder (filesystem paths,
//! `file:` URIs, namespace URIs) and converts between local paths and the
//! canonical `file:` URIs used as keys everywhere else in the crate.

use crate::error::{Error, Result};
use std::fs;
use std::path::{Path, PathBuf};
use url::Url;

/// Resource location - a local file or a namespace URI
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Location {
    /// Local file system path (from a plain path or a `file:` URI)
    Path(PathBuf),
    /// Absolute, non-file URI (`http:`, `https:`, `urn:`, ...)
    Namespace(String),
}

impl Location {
    /// Classify one builder argument
    ///
    /// A `file:` URI with a host other than `localhost` is rejected. Anything
    /// that does not parse as an absolute URI is taken as a filesystem path.
    pub fn from_arg(arg: &str) -> Result<Self> {
        if let Ok(url) = Url::parse(arg) {
            match url.scheme() {
                "file" => return file_url_to_path(&url).map(Location::Path),
                // Windows drive letters parse as one-letter schemes
                s if s.len() == 1 => {}
                _ => return Ok(Location::Namespace(arg.to_string())),
            }
        }
        Ok(Location::Path(PathBuf::from(arg)))
    }
}

/// Convert a `file:` URL to a path, refusing host components
fn file_url_to_path(url: &Url) -> Result<PathBuf> {
    match url.host_str() {
        None | Some("") | Some("localhost") => {}
        Some(_) => return Err(Error::HostnameNotAllowed(url.to_string())),
    }
    url.to_file_path()
        .map_err(|_| Error::Resource(format!("Invalid file URI '{}'", url)))
}

/// Canonical `file:` URI of an existing local file or directory
pub fn canonical_file_uri(path: &Path) -> Result<String> {
    let canonical = fs::canonicalize(path)?;
    let url = if canonical.is_dir() {
        Url::from_directory_path(&canonical)
    } else {
        Url::from_file_path(&canonical)
    };
    url.map(|u| u.to_string())
        .map_err(|_| Error::Resource(format!("Cannot express '{}' as a file URI", path.display())))
}

/// Local path named by a `file:` URI string
pub fn file_uri_to_path(uri: &str) -> Option<PathBuf> {
    let url = Url::parse(uri).ok()?;
    if url.scheme() != "file" {
        return None;
    }
    file_url_to_path(&url).ok()
}

/// Directory URI (with trailing slash) containing a `file:` URI
pub fn parent_dir_uri(file_uri: &str) -> Option<String> {
    let url = Url::parse(file_uri).ok()?;
    url.join("./").ok().map(|u| u.to_string())
}

/// True when `uri` looks like an absolute remote address (scheme plus host)
pub fn is_remote_uri(uri: &str) -> bool {
    match Url::parse(uri) {
        Ok(url) => url.scheme() != "file" && url.scheme().len() > 1 && url.has_host(),
        Err(_) => false,
    }
}

/// Resolve a reference (relative path or absolute URI) against a base URI
pub fn resolve_reference(base_uri: &str, reference: &str) -> Option<String> {
    if let Ok(url) = Url::parse(reference) {
        if url.scheme().len() > 1 {
            return Some(url.to_string());
        }
    }
    let base = Url::parse(base_uri).ok()?;
    base.join(reference).ok().map(|u| u.to_string())
}

/// True for `file:` URIs
pub fn is_file_uri(uri: &str) -> bool {
    uri.starts_with("file:")
}
