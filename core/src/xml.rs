//! Minimal read-only XML tree interface used by the response interpreter.
//!
//! The interpreter only needs element names, direct text and element
//! children, so it is written against `XmlNode` rather than a particular XML
//! library. `roxmltree` provides the one production implementation.

/// An element in a parsed XML document.
pub trait XmlNode: Sized {
    /// Local name of the element.
    fn name(&self) -> &str;

    /// Concatenated direct text content (text and CDATA children only).
    fn text(&self) -> String;

    /// Element children in document order. Text, comments and processing
    /// instructions are skipped.
    fn children(&self) -> Vec<Self>;

    /// First element child named `name`.
    fn child(&self, name: &str) -> Option<Self> {
        self.children().into_iter().find(|c| c.name() == name)
    }

    /// Source markup of the element, kept for diagnostics.
    fn markup(&self) -> String;
}

impl<'a, 'input: 'a> XmlNode for roxmltree::Node<'a, 'input> {
    fn name(&self) -> &str {
        self.tag_name().name()
    }

    fn text(&self) -> String {
        roxmltree::Node::children(self)
            .filter(|n| n.is_text())
            .filter_map(|n| n.text())
            .collect()
    }

    fn children(&self) -> Vec<Self> {
        roxmltree::Node::children(self)
            .filter(|n| n.is_element())
            .collect()
    }

    fn markup(&self) -> String {
        self.document().input_text()[self.range()].to_string()
    }
}

/// Parse a response body. DTDs are refused, so no entity expansion happens.
pub fn parse_document(body: &str) -> Result<roxmltree::Document<'_>, roxmltree::Error> {
    roxmltree::Document::parse(body)
}
