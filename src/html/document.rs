// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

//! Parsed HTML documents

use html5ever::parse_document;
use html5ever::tendril::TendrilSink;
use html5ever::ParseOpts;
use markup5ever_rcdom::{Handle, NodeData, RcDom};

use super::selector::Selector;
use crate::error::{Error, Result};

/// A parsed HTML document
pub struct Document {
    dom: RcDom,
}

impl std::fmt::Debug for Document {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Document").finish_non_exhaustive()
    }
}

impl Document {
    /// Parse an HTML string.
    ///
    /// The tree builder runs with scripting enabled, as browsers do, so the
    /// content of `<noscript>` is kept as raw text. Use
    /// [`Document::noscript_documents`] to query inside it.
    pub fn parse(html: &str) -> Result<Self> {
        let dom = parse_document(RcDom::default(), ParseOpts::default())
            .from_utf8()
            .read_from(&mut html.as_bytes())
            .map_err(|e| Error::other(format!("HTML parse failed: {}", e)))?;

        Ok(Self { dom })
    }

    fn root(&self) -> Element {
        Element {
            handle: self.dom.document.clone(),
        }
    }

    /// All elements matching a selector, in document order
    pub fn select(&self, selector: &Selector) -> Vec<Element> {
        let mut found = Vec::new();
        self.root().collect_descendants(&mut |el| {
            if selector.matches(el) {
                found.push(el.clone());
            }
        });
        found
    }

    /// First element matching a selector string
    pub fn select_first(&self, selector: &str) -> Result<Option<Element>> {
        let selector = Selector::parse(selector)?;
        Ok(self.select(&selector).into_iter().next())
    }

    /// Elements matching a selector string
    pub fn select_all(&self, selector: &str) -> Result<Vec<Element>> {
        let selector = Selector::parse(selector)?;
        Ok(self.select(&selector))
    }

    /// Re-parse the content of each `<noscript>` element as its own document
    pub fn noscript_documents(&self) -> Result<Vec<Document>> {
        self.select_all("noscript")?
            .iter()
            .map(|el| Document::parse(&el.text()))
            .collect()
    }

    /// Text of every inline `<script>` element (those without `src`), in order
    pub fn inline_scripts(&self) -> Result<Vec<String>> {
        Ok(self
            .select_all("script")?
            .into_iter()
            .filter(|el| el.attr("src").is_none())
            .map(|el| el.text())
            .collect())
    }

    /// Concatenated text content of the whole document
    pub fn text(&self) -> String {
        self.root().text()
    }
}

/// An element inside a parsed document
#[derive(Clone)]
pub struct Element {
    handle: Handle,
}

impl std::fmt::Debug for Element {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Element")
            .field("name", &self.name())
            .finish()
    }
}

impl Element {
    /// Lowercase tag name (None for non-element nodes)
    pub fn name(&self) -> Option<String> {
        match self.handle.data {
            NodeData::Element { ref name, .. } => Some(name.local.to_string()),
            _ => None,
        }
    }

    /// Attribute value
    pub fn attr(&self, attr_name: &str) -> Option<String> {
        match self.handle.data {
            NodeData::Element { ref attrs, .. } => attrs
                .borrow()
                .iter()
                .find(|a| (*a.name.local).eq_ignore_ascii_case(attr_name))
                .map(|a| a.value.to_string()),
            _ => None,
        }
    }

    /// Whitespace-separated classes
    pub fn has_class(&self, class: &str) -> bool {
        self.attr("class")
            .map_or(false, |c| c.split_whitespace().any(|c| c == class))
    }

    /// Concatenated text of all descendant text nodes
    pub fn text(&self) -> String {
        let mut out = String::new();
        collect_text(&self.handle, &mut out);
        out
    }

    fn collect_descendants(&self, visit: &mut dyn FnMut(&Element)) {
        for child in self.handle.children.borrow().iter() {
            let el = Element {
                handle: child.clone(),
            };
            if el.name().is_some() {
                visit(&el);
            }
            el.collect_descendants(visit);
        }
    }
}

fn collect_text(handle: &Handle, out: &mut String) {
    match handle.data {
        NodeData::Text { ref contents } => out.push_str(&contents.borrow()),
        _ => {
            for child in handle.children.borrow().iter() {
                collect_text(child, out);
            }
        }
    }
}

/// Text content of an HTML snippet, with entities decoded.
/// Unparseable input comes back unchanged.
pub fn strip_html(html: &str) -> String {
    if !html.contains('<') && !html.contains('&') {
        return html.to_string();
    }
    match Document::parse(html) {
        Ok(doc) => doc.text(),
        Err(_) => html.to_string(),
    }
}
