//! ARIA role suggestions for `epub:type` semantics
//!
//! Ace's `epub-type-has-matching-role` rule fires when an element carries an
//! `epub:type` without the matching ARIA role. The table follows the DPUB-ARIA
//! mapping from the EPUB Type to ARIA Role Authoring Guide.

use std::sync::LazyLock;

use regex::Regex;

/// Ace rule that asks for a role matching the element's `epub:type`
pub const MATCHING_ROLE_RULE: &str = "epub-type-has-matching-role";

static EPUB_TYPE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"epub:type\s*=\s*["']([^"']*)["']"#).expect("epub:type pattern is valid")
});

/// Role for a single `epub:type` token
pub fn role_for_epub_type(epub_type: &str) -> Option<&'static str> {
    let role = match epub_type {
        "abstract" => "doc-abstract",
        "acknowledgments" => "doc-acknowledgments",
        "afterword" => "doc-afterword",
        "appendix" => "doc-appendix",
        "backlink" => "doc-backlink",
        "biblioentry" => "doc-biblioentry",
        "bibliography" => "doc-bibliography",
        "biblioref" => "doc-biblioref",
        "chapter" => "doc-chapter",
        "colophon" => "doc-colophon",
        "conclusion" => "doc-conclusion",
        "cover" => "doc-cover",
        "credit" => "doc-credit",
        "credits" => "doc-credits",
        "dedication" => "doc-dedication",
        "endnote" | "rearnote" => "doc-endnote",
        "endnotes" | "rearnotes" => "doc-endnotes",
        "epigraph" => "doc-epigraph",
        "epilogue" => "doc-epilogue",
        "errata" => "doc-errata",
        "example" => "doc-example",
        "footnote" => "doc-footnote",
        "glossary" => "doc-glossary",
        "glossref" => "doc-glossref",
        "index" => "doc-index",
        "introduction" => "doc-introduction",
        "noteref" => "doc-noteref",
        "notice" => "doc-notice",
        "pagebreak" => "doc-pagebreak",
        "page-list" => "doc-pagelist",
        "part" => "doc-part",
        "preface" => "doc-preface",
        "prologue" => "doc-prologue",
        "pullquote" => "doc-pullquote",
        "qna" => "doc-qna",
        "subtitle" => "doc-subtitle",
        "tip" => "doc-tip",
        "toc" => "doc-toc",
        "glossdef" => "definition",
        "glossterm" => "term",
        "figure" => "figure",
        "list" => "list",
        "list-item" => "listitem",
        "table" => "table",
        "table-row" => "row",
        "table-cell" => "cell",
        _ => return None,
    };
    Some(role)
}

/// Suggest a role for the outermost element of an HTML snippet.
///
/// Only the first `epub:type` attribute is considered; its tokens are tried
/// in order and the first one with a known role wins.
pub fn suggest_role(html: &str) -> Option<&'static str> {
    let captures = EPUB_TYPE.captures(html)?;
    captures[1]
        .split_whitespace()
        .find_map(role_for_epub_type)
}
