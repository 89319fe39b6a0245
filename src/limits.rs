//! Limits for schema pile construction
//!
//! Bounds on the resources a single pile build may consume. A limit exceeded
//! by an initial input aborts the build; one exceeded by a secondary
//! resource (a chained catalog, an imported schema) becomes a diagnostic.

use crate::error::{Error, Result};

/// Resource limits applied while loading catalogs and schema documents
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Limits {
    /// Maximum element nesting depth of any loaded document
    pub max_xml_depth: usize,

    /// Maximum size of any loaded file in bytes
    pub max_xml_size: usize,

    /// Maximum number of catalog files in one resolver
    pub max_catalogs: usize,

    /// Maximum number of schema documents in one pile
    pub max_documents: usize,
}

impl Default for Limits {
    fn default() -> Self {
        Self {
            max_xml_depth: 1000,
            max_xml_size: 100 * 1024 * 1024, // 100 MB
            max_catalogs: 1000,
            max_documents: 10000,
        }
    }
}

impl Limits {
    /// Create a new Limits with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Create strict limits (more restrictive)
    pub fn strict() -> Self {
        Self {
            max_xml_depth: 100,
            max_xml_size: 10 * 1024 * 1024, // 10 MB
            max_catalogs: 50,
            max_documents: 500,
        }
    }

    /// Create permissive limits (less restrictive, use with caution)
    pub fn permissive() -> Self {
        Self {
            max_xml_depth: 10000,
            max_xml_size: 1024 * 1024 * 1024, // 1 GB
            max_catalogs: 100000,
            max_documents: 1000000,
        }
    }

    /// Check if XML depth is within limits
    pub fn check_xml_depth(&self, depth: usize) -> Result<()> {
        if depth > self.max_xml_depth {
            Err(Error::LimitExceeded(format!(
                "XML depth {} exceeds maximum {}",
                depth, self.max_xml_depth
            )))
        } else {
            Ok(())
        }
    }

    /// Check if XML size is within limits
    pub fn check_xml_size(&self, size: usize) -> Result<()> {
        if size > self.max_xml_size {
            Err(Error::LimitExceeded(format!(
                "XML size {} bytes exceeds maximum {} bytes",
                size, self.max_xml_size
            )))
        } else {
            Ok(())
        }
    }

    /// Check if the number of loaded catalogs is within limits
    pub fn check_catalogs(&self, count: usize) -> Result<()> {
        if count > self.max_catalogs {
            Err(Error::LimitExceeded(format!(
                "Catalog count {} exceeds maximum {}",
                count, self.max_catalogs
            )))
        } else {
            Ok(())
        }
    }

    /// Check if the number of pile documents is within limits
    pub fn check_documents(&self, count: usize) -> Result<()> {
        if count > self.max_documents {
            Err(Error::LimitExceeded(format!(
                "Schema document count {} exceeds maximum {}",
                count, self.max_documents
            )))
        } else {
            Ok(())
        }
    }
}
