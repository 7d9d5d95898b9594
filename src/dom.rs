//! Line-annotated content documents
//!
//! Parses an XHTML content document and records, for every element, the
//! source line its start tag begins on. Lines live in a side table keyed by
//! node identity so the tree itself stays a plain `roxmltree::Document`.
//!
//! XHTML 1.1 content documents often use HTML named entities (`&nbsp;`,
//! `&mdash;`) that an XML parser rejects without the DTD. Run the text
//! through [`numeric_entities`] before [`AnnotatedDocument::parse`].

use std::borrow::Cow;
use std::collections::HashMap;
use std::fmt::Write;
use std::sync::LazyLock;

use regex::{Captures, Regex};
use roxmltree::{Document, Node, NodeId, ParsingOptions};

use crate::cfi;

static NAMED_ENTITY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"&([A-Za-z][A-Za-z0-9]*);").expect("entity pattern is valid")
});

/// Rewrite HTML named entities as numeric character references.
///
/// XML's own five entities and unknown names are left alone. A reference
/// never spans lines, so line numbers are unchanged.
pub fn numeric_entities(text: &str) -> Cow<'_, str> {
    NAMED_ENTITY.replace_all(text, |caps: &Captures<'_>| {
        let whole = &caps[0];
        // Entities every XML parser knows
        if matches!(&caps[1], "amp" | "lt" | "gt" | "quot" | "apos") {
            return whole.to_string();
        }

        let decoded = html_escape::decode_html_entities(whole);
        if decoded == whole {
            return whole.to_string();
        }

        let mut numeric = String::new();
        for ch in decoded.chars() {
            let _ = write!(numeric, "&#{};", u32::from(ch));
        }
        numeric
    })
}

/// A parsed document plus the line number of each element.
pub struct AnnotatedDocument<'input> {
    doc: Document<'input>,
    lines: HashMap<NodeId, u32>,
}

impl<'input> AnnotatedDocument<'input> {
    /// Parse `text`, annotating every element with its 1-based line.
    pub fn parse(text: &'input str) -> Result<Self, roxmltree::Error> {
        // XHTML content documents carry `<!DOCTYPE html>`
        let options = ParsingOptions {
            allow_dtd: true,
            ..ParsingOptions::default()
        };
        let doc = Document::parse_with_options(text, options)?;

        let lines = doc
            .descendants()
            .filter(Node::is_element)
            .map(|node| (node.id(), doc.text_pos_at(node.range().start).row))
            .collect();

        Ok(Self { doc, lines })
    }

    pub fn document(&self) -> &Document<'input> {
        &self.doc
    }

    /// The document element (`<html>` for content documents).
    pub fn root_element(&self) -> Node<'_, 'input> {
        self.doc.root_element()
    }

    /// Line recorded for `node` at parse time, if any.
    pub fn line_of(&self, node: Node<'_, 'input>) -> Option<u32> {
        self.lines.get(&node.id()).copied()
    }

    /// Resolve `cfi` from the document element and return the line of the
    /// element it lands on. Zero lines are treated as missing.
    pub fn line_for_cfi(&self, cfi: &str) -> Option<u32> {
        let node = cfi::resolve(self.root_element(), cfi)?;
        self.line_of(node).filter(|&line| line > 0)
    }
}
