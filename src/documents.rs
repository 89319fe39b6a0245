//! XML document handling
//!
//! A small element tree built with quick-xml. Names are namespace-resolved
//! while parsing, and every element remembers the line of its start tag, its
//! nesting depth and the namespace declarations it carries.

use crate::error::{Error, Result};
use crate::limits::Limits;
use crate::namespaces::{NamespaceContext, QName};
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use std::collections::HashMap;
use std::rc::Rc;

/// XML Element in the document tree
#[derive(Debug, Clone)]
pub struct Element {
    /// Element qualified name
    pub qname: QName,
    /// Element attributes (namespace declarations excluded)
    pub attributes: HashMap<QName, String>,
    /// Text before the first child element (if any)
    pub text: Option<String>,
    /// Text after this element's end tag, up to the next sibling or the
    /// parent's end tag
    pub tail: Option<String>,
    /// Child elements
    pub children: Vec<Element>,
    /// Namespace declarations on this element, in attribute order.
    /// A `None` prefix is a default namespace declaration.
    pub namespace_decls: Vec<(Option<String>, String)>,
    /// 1-based line of the start tag
    pub line: usize,
    /// Nesting depth, 0 for the root
    pub depth: usize,
}

impl Element {
    /// Create a new element
    pub fn new(qname: QName) -> Self {
        Self {
            qname,
            attributes: HashMap::new(),
            text: None,
            tail: None,
            children: Vec::new(),
            namespace_decls: Vec::new(),
            line: 0,
            depth: 0,
        }
    }

    /// Get the local name of the element
    pub fn local_name(&self) -> &str {
        &self.qname.local_name
    }

    /// Get the namespace of the element
    pub fn namespace(&self) -> Option<&str> {
        self.qname.namespace.as_deref()
    }

    /// True if the element has the given namespace and local name
    pub fn is(&self, namespace: &str, local_name: &str) -> bool {
        self.qname.is(namespace, local_name)
    }

    /// Get an unqualified attribute value by name
    pub fn get_attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(qname, _)| qname.namespace.is_none() && qname.local_name == name)
            .map(|(_, value)| value.as_str())
    }

    /// Get a namespaced attribute value
    pub fn get_attribute_ns(&self, namespace: &str, local_name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(qname, _)| qname.is(namespace, local_name))
            .map(|(_, value)| value.as_str())
    }

    /// Add a child element
    pub fn add_child(&mut self, child: Element) {
        self.children.push(child);
    }

    /// Append character data at the current end of this element's content.
    /// Once a child has been added the text lands in that child's tail.
    pub fn push_text(&mut self, text: &str) {
        let slot = match self.children.last_mut() {
            Some(child) => &mut child.tail,
            None => &mut self.text,
        };
        match slot {
            Some(existing) => existing.push_str(text),
            None => *slot = Some(text.to_string()),
        }
    }

    /// Child elements with the given namespace and local name
    pub fn children_named<'a>(
        &'a self,
        namespace: &'a str,
        local_name: &'a str,
    ) -> impl Iterator<Item = &'a Element> + 'a {
        self.children.iter().filter(move |e| e.is(namespace, local_name))
    }

    /// All text inside this element and its descendants, in document order
    pub fn text_content(&self) -> String {
        let mut out = String::new();
        self.collect_text(&mut out);
        out
    }

    fn collect_text(&self, out: &mut String) {
        if let Some(text) = &self.text {
            out.push_str(text);
        }
        for child in &self.children {
            child.collect_text(out);
            if let Some(tail) = &child.tail {
                out.push_str(tail);
            }
        }
    }

    /// This element followed by all its descendants, in document order
    pub fn descendants(&self) -> Descendants<'_> {
        Descendants { stack: vec![self] }
    }
}

/// Pre-order iterator over an element subtree
pub struct Descendants<'a> {
    stack: Vec<&'a Element>,
}

impl<'a> Iterator for Descendants<'a> {
    type Item = &'a Element;

    fn next(&mut self) -> Option<Self::Item> {
        let elem = self.stack.pop()?;
        self.stack.extend(elem.children.iter().rev());
        Some(elem)
    }
}

/// XML Document representation
#[derive(Debug)]
pub struct Document {
    /// Root element of the document
    pub root: Element,
}

impl Document {
    /// Parse an XML document from a string
    pub fn from_string(xml: &str) -> Result<Self> {
        Self::parse(xml.as_bytes(), &Limits::default())
    }

    /// Parse an XML document from bytes
    pub fn parse(xml: &[u8], limits: &Limits) -> Result<Self> {
        // Text is kept untrimmed so mixed content keeps its spacing
        let mut reader = Reader::from_reader(xml);

        let mut root: Option<Element> = None;
        let mut element_stack: Vec<Element> = Vec::new();
        let mut scope_stack: Vec<Rc<NamespaceContext>> = vec![Rc::new(NamespaceContext::new())];
        let mut lines = LineCounter::new(xml);
        let mut buf = Vec::new();

        loop {
            match reader.read_event_into(&mut buf) {
                Ok(Event::Start(e)) => {
                    let depth = element_stack.len();
                    limits.check_xml_depth(depth)?;
                    let line = lines.line_of_tag_ending_at(reader.buffer_position());
                    let parent_scope = scope_stack.last().cloned().unwrap_or_default();
                    let (element, scope) = Self::parse_element(&e, &parent_scope, line, depth)?;
                    element_stack.push(element);
                    scope_stack.push(scope);
                }
                Ok(Event::End(_)) => {
                    scope_stack.pop();
                    if let Some(current) = element_stack.pop() {
                        if let Some(parent) = element_stack.last_mut() {
                            parent.add_child(current);
                        } else {
                            Self::set_root(&mut root, current)?;
                        }
                    }
                }
                Ok(Event::Empty(e)) => {
                    let depth = element_stack.len();
                    limits.check_xml_depth(depth)?;
                    let line = lines.line_of_tag_ending_at(reader.buffer_position());
                    let parent_scope = scope_stack.last().cloned().unwrap_or_default();
                    let (element, _) = Self::parse_element(&e, &parent_scope, line, depth)?;
                    if let Some(parent) = element_stack.last_mut() {
                        parent.add_child(element);
                    } else {
                        Self::set_root(&mut root, element)?;
                    }
                }
                Ok(Event::Text(e)) => {
                    if let Some(current) = element_stack.last_mut() {
                        let text = e
                            .unescape()
                            .map_err(|e| Error::Xml(format!("Failed to unescape text: {}", e)))?;
                        current.push_text(&text);
                    }
                }
                Ok(Event::CData(e)) => {
                    if let Some(current) = element_stack.last_mut() {
                        let raw = e.into_inner();
                        current.push_text(&String::from_utf8_lossy(&raw));
                    }
                }
                Ok(Event::Eof) => break,
                Err(e) => {
                    return Err(Error::Xml(format!(
                        "Error parsing XML at position {}: {}",
                        reader.buffer_position(),
                        e
                    )))
                }
                _ => {} // Ignore other events (comments, processing instructions, etc.)
            }
            buf.clear();
        }

        if !element_stack.is_empty() {
            return Err(Error::Xml("Unexpected end of document: unclosed elements".to_string()));
        }
        let root = root.ok_or_else(|| Error::Xml("Document has no root element".to_string()))?;
        Ok(Document { root })
    }

    fn set_root(slot: &mut Option<Element>, element: Element) -> Result<()> {
        if slot.is_some() {
            return Err(Error::Xml("Document has more than one root element".to_string()));
        }
        *slot = Some(element);
        Ok(())
    }

    /// Parse element from BytesStart event, returning it with its scope
    fn parse_element(
        start: &BytesStart,
        parent_scope: &Rc<NamespaceContext>,
        line: usize,
        depth: usize,
    ) -> Result<(Element, Rc<NamespaceContext>)> {
        let name_bytes = start.name();
        let name = std::str::from_utf8(name_bytes.as_ref())
            .map_err(|e| Error::Xml(format!("Invalid element name: {}", e)))?
            .to_string();

        let mut decls = Vec::new();
        let mut raw_attributes = Vec::new();
        for attr_result in start.attributes() {
            let attr = attr_result
                .map_err(|e| Error::Xml(format!("Failed to parse attribute: {}", e)))?;

            let attr_name = std::str::from_utf8(attr.key.as_ref())
                .map_err(|e| Error::Xml(format!("Invalid attribute name: {}", e)))?
                .to_string();

            let attr_value = attr
                .unescape_value()
                .map_err(|e| Error::Xml(format!("Failed to unescape attribute value: {}", e)))?
                .to_string();

            if attr_name == "xmlns" {
                decls.push((None, attr_value));
            } else if let Some(prefix) = attr_name.strip_prefix("xmlns:") {
                decls.push((Some(prefix.to_string()), attr_value));
            } else {
                raw_attributes.push((attr_name, attr_value));
            }
        }

        let scope = if decls.is_empty() {
            Rc::clone(parent_scope)
        } else {
            let mut ctx = NamespaceContext::clone(parent_scope);
            for (prefix, uri) in &decls {
                match prefix {
                    Some(p) => ctx.add_prefix(p.clone(), uri.clone()),
                    None => ctx.set_default_namespace(uri.clone()),
                }
            }
            Rc::new(ctx)
        };

        let mut element = Element::new(scope.resolve_element(&name)?);
        element.line = line;
        element.depth = depth;
        element.namespace_decls = decls;
        for (attr_name, attr_value) in raw_attributes {
            element
                .attributes
                .insert(scope.resolve_attribute(&attr_name)?, attr_value);
        }

        Ok((element, scope))
    }

    /// Get the root element
    pub fn root(&self) -> &Element {
        &self.root
    }
}

/// Maps byte offsets to 1-based line numbers, scanning the input once
struct LineCounter<'a> {
    xml: &'a [u8],
    scanned: usize,
    line: usize,
}

impl<'a> LineCounter<'a> {
    fn new(xml: &'a [u8]) -> Self {
        Self { xml, scanned: 0, line: 1 }
    }

    /// Line of the `<` opening the tag that ends just before `end`
    fn line_of_tag_ending_at(&mut self, end: usize) -> usize {
        let end = end.min(self.xml.len());
        let start = self.xml[..end]
            .iter()
            .rposition(|&b| b == b'<')
            .unwrap_or(end)
            .max(self.scanned);
        self.line += self.xml[self.scanned..start].iter().filter(|&&b| b == b'\n').count();
        self.scanned = start;
        self.line
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_simple_xml() {
        let xml = r#"<root><child>text</child></root>"#;
        let doc = Document::from_string(xml).unwrap();

        let root = doc.root();
        assert_eq!(root.local_name(), "root");
        assert_eq!(root.children.len(), 1);
        assert_eq!(root.children[0].local_name(), "child");
        assert_eq!(root.children[0].text.as_deref(), Some("text"));
    }

    #[test]
    fn test_parse_with_attributes() {
        let xml = r#"<root attr1="value1" attr2="value2"><child/></root>"#;
        let doc = Document::from_string(xml).unwrap();

        let root = doc.root();
        assert_eq!(root.get_attribute("attr1"), Some("value1"));
        assert_eq!(root.get_attribute("attr2"), Some("value2"));
    }

    #[test]
    fn test_namespaces_resolved() {
        let xml = r#"<xs:schema xmlns:xs="http://www.w3.org/2001/XMLSchema" xmlns="urn:default">
  <xs:import namespace="urn:a"/>
  <other xml:lang="en"/>
</xs:schema>"#;
        let doc = Document::from_string(xml).unwrap();
        let root = doc.root();
        assert!(root.is(crate::XSD_NAMESPACE, "schema"));
        assert_eq!(
            root.namespace_decls,
            vec![
                (Some("xs".to_string()), crate::XSD_NAMESPACE.to_string()),
                (None, "urn:default".to_string()),
            ]
        );
        assert!(root.children[0].is(crate::XSD_NAMESPACE, "import"));
        assert!(root.children[1].is("urn:default", "other"));
        assert_eq!(
            root.children[1].get_attribute_ns(crate::XML_NAMESPACE, "lang"),
            Some("en")
        );
    }

    #[test]
    fn test_lines_and_depths() {
        let xml = "<?xml version=\"1.0\"?>\n<root>\n  <a>\n    <b/>\n  </a>\n  <c\n     x=\"1\"/>\n</root>\n";
        let doc = Document::from_string(xml).unwrap();
        let root = doc.root();
        assert_eq!((root.line, root.depth), (2, 0));
        let a = &root.children[0];
        assert_eq!((a.line, a.depth), (3, 1));
        assert_eq!((a.children[0].line, a.children[0].depth), (4, 2));
        assert_eq!(root.children[1].line, 6);
    }

    #[test]
    fn test_descendants_in_document_order() {
        let doc = Document::from_string("<r><a><b/></a><c/></r>").unwrap();
        let names: Vec<_> = doc.root().descendants().map(|e| e.local_name().to_string()).collect();
        assert_eq!(names, vec!["r", "a", "b", "c"]);
    }

    #[test]
    fn test_malformed_documents_fail() {
        assert!(Document::from_string("").is_err());
        assert!(Document::from_string("just some text").is_err());
        assert!(Document::from_string("<a><b></a>").is_err());
        assert!(Document::from_string("<a>").is_err());
        assert!(Document::from_string("<p:a/>").is_err());
    }

    #[test]
    fn test_depth_limit() {
        let mut limits = Limits::default();
        limits.max_xml_depth = 2;
        let err = Document::parse(b"<a><b><c><d/></c></b></a>", &limits).unwrap_err();
        assert!(matches!(err, Error::LimitExceeded(_)));
    }

    #[test]
    fn test_text_content_keeps_document_order() {
        let xml = r#"<root>A <b>bold</b> and <i><![CDATA[x<y]]></i> done.</root>"#;
        let doc = Document::from_string(xml).unwrap();

        let root = doc.root();
        assert_eq!(root.text.as_deref(), Some("A "));
        assert_eq!(root.children[0].tail.as_deref(), Some(" and "));
        assert_eq!(root.children[1].tail.as_deref(), Some(" done."));
        assert_eq!(root.text_content(), "A bold and x<y done.");
        assert_eq!(root.children[1].text_content(), "x<y");
    }

    #[test]
    fn test_whitespace_between_elements_kept() {
        let doc = Document::from_string("<r>\n  <a>1</a>\n  <b/>\n</r>").unwrap();
        let root = doc.root();
        assert_eq!(root.children.len(), 2);
        assert_eq!(root.text.as_deref(), Some("\n  "));
        assert_eq!(root.text_content(), "\n  1\n  \n");
    }
}
