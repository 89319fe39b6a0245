//! Resource loading utilities
//!
//! Reads local catalog and schema files under the configured [`Limits`].
//! Remote resources are never fetched.

use crate::documents::Document;
use crate::error::{Error, Result};
use crate::limits::Limits;
use std::fs;
use std::io::ErrorKind;
use std::path::Path;
use tracing::trace;

/// Resource loader for catalogs and schema documents
#[derive(Debug, Clone, Default)]
pub struct Loader {
    /// Resource limits
    limits: Limits,
}

impl Loader {
    /// Create a new loader with default settings
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the limits
    pub fn with_limits(mut self, limits: Limits) -> Self {
        self.limits = limits;
        self
    }

    /// The limits in force
    pub fn limits(&self) -> &Limits {
        &self.limits
    }

    /// Read and parse a local XML file
    pub fn load_document(&self, path: &Path) -> Result<Document> {
        let content = self.read_file(path)?;
        Document::parse(&content, &self.limits)
    }

    /// Any read failure (missing, a directory, no permission) is reported
    /// as [`Error::FileNotFound`].
    fn read_file(&self, path: &Path) -> Result<Vec<u8>> {
        trace!(path = %path.display(), "reading file");
        let content = fs::read(path).map_err(|e| match e.kind() {
            ErrorKind::NotFound => Error::FileNotFound(path.display().to_string()),
            _ => Error::FileNotFound(format!("{} ({})", path.display(), e)),
        })?;

        // Check size limits
        self.limits.check_xml_size(content.len())?;

        Ok(content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_load_from_file() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "<root>test</root>").unwrap();

        let loader = Loader::new();
        let doc = loader.load_document(file.path()).unwrap();
        assert_eq!(doc.root().local_name(), "root");
    }

    #[test]
    fn test_missing_file() {
        let loader = Loader::new();
        let err = loader
            .load_document(Path::new("/definitely/not/here.xsd"))
            .unwrap_err();
        assert!(err.to_string().contains("cannot find the file"));
    }

    #[test]
    fn test_unreadable_path_is_file_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let err = Loader::new().load_document(dir.path()).unwrap_err();
        assert!(matches!(err, Error::FileNotFound(_)), "{:?}", err);
        assert!(err.to_string().contains("cannot find the file"));
    }

    #[test]
    fn test_size_limit() {
        let mut file = NamedTempFile::new().unwrap();
        let large_content = "x".repeat(11 * 1024 * 1024); // 11 MB
        write!(file, "{}", large_content).unwrap();

        let loader = Loader::new().with_limits(Limits::strict());
        let result = loader.load_document(file.path());

        // Strict limits (10 MB max) should reject 11MB file
        assert!(matches!(result, Err(Error::LimitExceeded(_))));
    }
}
