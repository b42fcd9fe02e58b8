//! Response Tree
//!
//! Read-only view over a parsed Query API response document. Every response
//! is turned into a tree of named nodes with optional (trimmed) text, and
//! decoders walk that tree by node name.

use quick_xml::events::Event;
use quick_xml::Reader;

/// Error raised when a response body is not well-formed XML
#[derive(Debug, thiserror::Error)]
pub enum XmlError {
    #[error("malformed XML: {0}")]
    Syntax(#[from] quick_xml::Error),
    #[error("non UTF-8 element name")]
    Encoding(#[from] std::str::Utf8Error),
    #[error("document has no root element")]
    Empty,
    #[error("unbalanced element </{0}>")]
    Unbalanced(String),
}

/// One element of a response document
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ResponseNode {
    name: String,
    text: Option<String>,
    children: Vec<ResponseNode>,
}

impl ResponseNode {
    /// Create an element with no text and no children
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            text: None,
            children: Vec::new(),
        }
    }

    /// Builder: set the text value
    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }

    /// Builder: append a child element
    pub fn with_child(mut self, child: ResponseNode) -> Self {
        self.children.push(child);
        self
    }

    /// Builder: append a `<name>text</name>` leaf
    pub fn with_leaf(self, name: &str, text: &str) -> Self {
        self.with_child(ResponseNode::new(name).with_text(text))
    }

    /// Parse a complete document and return its root element.
    ///
    /// Namespace prefixes are dropped and text is trimmed. A leaf whose text
    /// is whitespace only has the empty string as its value; a self-closed
    /// leaf has none. Layout whitespace around child elements is dropped.
    pub fn parse(xml: &str) -> Result<Self, XmlError> {
        let mut reader = Reader::from_str(xml);

        // Open elements; the bottom entry collects the root
        let mut stack: Vec<ResponseNode> = vec![ResponseNode::new("#document")];

        loop {
            match reader.read_event()? {
                Event::Start(e) => {
                    let name = std::str::from_utf8(e.local_name().as_ref())?.to_string();
                    stack.push(ResponseNode::new(name));
                },
                Event::Empty(e) => {
                    let name = std::str::from_utf8(e.local_name().as_ref())?.to_string();
                    if let Some(parent) = stack.last_mut() {
                        parent.children.push(ResponseNode::new(name));
                    }
                },
                Event::End(e) => {
                    let name = std::str::from_utf8(e.local_name().as_ref())?.to_string();
                    if stack.len() < 2 {
                        return Err(XmlError::Unbalanced(name));
                    }
                    if let Some(mut done) = stack.pop() {
                        done.finish_text();
                        if let Some(parent) = stack.last_mut() {
                            parent.children.push(done);
                        }
                    }
                },
                Event::Text(t) => {
                    let value = t.unescape()?;
                    if let Some(node) = stack.last_mut() {
                        node.push_text(&value);
                    }
                },
                Event::CData(c) => {
                    let value = String::from_utf8_lossy(&c.into_inner()).into_owned();
                    if let Some(node) = stack.last_mut() {
                        node.push_text(&value);
                    }
                },
                Event::Eof => break,
                _ => {},
            }
        }

        if stack.len() != 1 {
            let open = stack.last().map(|n| n.name.clone()).unwrap_or_default();
            return Err(XmlError::Unbalanced(open));
        }

        stack
            .pop()
            .and_then(|doc| doc.children.into_iter().next())
            .ok_or(XmlError::Empty)
    }

    /// Trim collected text; elements with children only keep real content
    fn finish_text(&mut self) {
        let has_children = self.has_children();
        self.text = self
            .text
            .take()
            .map(|t| t.trim().to_string())
            .filter(|t| !(has_children && t.is_empty()));
    }

    fn push_text(&mut self, value: &str) {
        match self.text {
            Some(ref mut existing) => existing.push_str(value),
            None => self.text = Some(value.to_string()),
        }
    }

    /// Element name without namespace prefix
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Case-insensitive name comparison
    pub fn is_named(&self, name: &str) -> bool {
        self.name.eq_ignore_ascii_case(name)
    }

    /// Trimmed text value; `None` when the element has no text at all,
    /// `Some("")` when it only held whitespace
    pub fn text(&self) -> Option<&str> {
        self.text.as_deref()
    }

    /// Direct children in document order
    pub fn children(&self) -> &[ResponseNode] {
        &self.children
    }

    pub fn has_children(&self) -> bool {
        !self.children.is_empty()
    }

    /// Direct children with the given (exact) name
    pub fn children_named<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a ResponseNode> + 'a {
        self.children.iter().filter(move |c| c.name == name)
    }

    /// First direct child with the given name, case-insensitive
    pub fn child(&self, name: &str) -> Option<&ResponseNode> {
        self.children.iter().find(|c| c.is_named(name))
    }

    /// Text of the first direct child with the given name
    pub fn child_text(&self, name: &str) -> Option<&str> {
        self.child(name).and_then(|c| c.text())
    }

    /// All elements with the given name at any depth, this node included,
    /// in document order
    pub fn find_by_name(&self, name: &str) -> Vec<&ResponseNode> {
        let mut found = Vec::new();
        self.collect_named(name, &mut found);
        found
    }

    fn collect_named<'a>(&'a self, name: &str, found: &mut Vec<&'a ResponseNode>) {
        if self.name == name {
            found.push(self);
        }
        for child in &self.children {
            child.collect_named(name, found);
        }
    }

    /// First element with the given name at any depth
    pub fn find_first(&self, name: &str) -> Option<&ResponseNode> {
        if self.name == name {
            return Some(self);
        }
        self.children.iter().find_map(|c| c.find_first(name))
    }

    /// Text of the first element with the given name at any depth
    pub fn find_text(&self, name: &str) -> Option<&str> {
        self.find_first(name).and_then(|n| n.text())
    }

    /// Elements named `item` under every `container` element, e.g.
    /// `volumeSet/item` or `MetricAlarms/member`
    pub fn items<'a>(&'a self, container: &str, item: &'a str) -> Vec<&'a ResponseNode> {
        self.find_by_name(container)
            .into_iter()
            .flat_map(|set| set.children_named(item))
            .collect()
    }
}
