//! Schema validation hook
//!
//! Full XML Schema validation of a pile is performed by an external
//! validator. The pile builder hands every discovered document to a
//! [`SchemaValidator`] and keeps whatever messages it returns; those
//! messages never abort pile construction.

use std::collections::HashSet;

use crate::schema_document::SchemaDocument;
use crate::XML_NAMESPACE;

/// Validator consulted once the pile's documents are known
pub trait SchemaValidator {
    /// Validate the documents as one schema set, returning diagnostics
    fn validate(&self, documents: &[&SchemaDocument]) -> Vec<String>;
}

/// Default validator: checks import consistency across the document set
///
/// Reports documents that import their own target namespace and imports
/// whose namespace has no document in the set.
#[derive(Debug, Default, Clone, Copy)]
pub struct ImportConsistencyValidator;

impl SchemaValidator for ImportConsistencyValidator {
    fn validate(&self, documents: &[&SchemaDocument]) -> Vec<String> {
        let available: HashSet<&str> = documents.iter().map(|d| d.target_namespace()).collect();
        let mut messages = Vec::new();
        for doc in documents {
            for import in doc.imports() {
                let Some(ns) = import.namespace.as_deref() else {
                    continue;
                };
                if ns == doc.target_namespace() {
                    messages.push(format!(
                        "{}:{}: xs:import cannot import the schema's own targetNamespace {}",
                        doc.uri(),
                        import.line,
                        ns
                    ));
                } else if !available.contains(ns) && ns != XML_NAMESPACE {
                    messages.push(format!(
                        "{}:{}: imported namespace {} has no schema document",
                        doc.uri(),
                        import.line,
                        ns
                    ));
                }
            }
        }
        messages
    }
}

/// Validator that accepts everything
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopValidator;

impl SchemaValidator for NoopValidator {
    fn validate(&self, _documents: &[&SchemaDocument]) -> Vec<String> {
        Vec::new()
    }
}
