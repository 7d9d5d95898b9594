//! CFI (Canonical Fragment Identifier) module for EPUB
//!
//! Ace points at offending elements with CFI paths. This module parses those
//! paths and resolves them against a parsed content document.
//!
//! # Example CFI
//!
//! ```text
//! epubcfi(/6/4[chapter1]!/4/2/1:42)
//!         │  │          │ │ │ │ └── character offset 42
//!         │  │          │ │ │ └──── text node (odd = text)
//!         │  │          │ │ └────── element step
//!         │  │          │ └──────── element step (body)
//!         │  │          └────────── indirection (into content doc)
//!         │  └───────────────────── spine item with ID
//!         └──────────────────────── spine element
//! ```
//!
//! # Usage
//!
//! ```ignore
//! use ace_check::cfi::resolve;
//!
//! let doc = roxmltree::Document::parse(r#"<a><b id="x"/><c/></a>"#).unwrap();
//! let node = resolve(doc.root_element(), "/6[x]").unwrap();
//! assert_eq!(node.tag_name().name(), "b");
//! ```

mod parser;
mod resolver;
mod types;

pub use types::{
    CharacterOffset, Cfi, CfiPath, CfiRange, CfiStep, SpatialOffset, StepType, TemporalOffset,
    TextAssertion,
};

pub use parser::{parse, CfiParseError};

pub use resolver::{resolve, resolve_parsed};
