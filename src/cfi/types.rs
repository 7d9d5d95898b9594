//! CFI (Canonical Fragment Identifier) types for EPUB
//!
//! Ace cites findings with CFIs relative to the content document, e.g.
//! `/4/2[chap01]/6`. Full package CFIs look like
//! `epubcfi(/6/4[chap01ref]!/4/2/22/3:268)`.
//!
//! Reference: <https://idpf.org/epub/linking/cfi/epub-cfi.html>

use std::fmt;

/// A complete EPUB CFI
#[derive(Debug, Clone, PartialEq)]
pub struct Cfi {
    /// The path components of this CFI
    pub path: CfiPath,
    /// Optional range end (for selections)
    pub range: Option<CfiRange>,
}

/// A CFI path (sequence of steps)
#[derive(Debug, Clone, PartialEq)]
pub struct CfiPath {
    pub steps: Vec<CfiStep>,
    /// Optional character offset at the end
    pub character_offset: Option<CharacterOffset>,
    /// Optional temporal offset (for audio/video)
    pub temporal_offset: Option<TemporalOffset>,
    /// Optional spatial offset (for images)
    pub spatial_offset: Option<SpatialOffset>,
}

/// A CFI range (for text selections)
#[derive(Debug, Clone, PartialEq)]
pub struct CfiRange {
    /// Start of the range (relative path from common ancestor)
    pub start: CfiPath,
    /// End of the range (relative path from common ancestor)
    pub end: CfiPath,
}

/// A single step in a CFI path
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CfiStep {
    pub step_type: StepType,
    /// Optional ID assertion [id]
    pub id_assertion: Option<String>,
    /// Optional text assertion (side bias)
    pub text_assertion: Option<TextAssertion>,
}

/// Type of CFI step
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepType {
    /// Element step with ordinal (e.g., /4)
    Element(u32),
    /// Indirection step (!) - steps into a referenced document
    Indirection,
}

/// Text location assertion for disambiguation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextAssertion {
    pub prefix: Option<String>,
    pub suffix: Option<String>,
    pub parameters: Vec<(String, String)>,
}

/// Character offset within a text node
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CharacterOffset {
    pub offset: u32,
    pub assertion: Option<TextAssertion>,
}

/// Temporal offset for audio/video (in seconds)
#[derive(Debug, Clone, PartialEq)]
pub struct TemporalOffset {
    pub seconds: f64,
}

/// Spatial offset for images (percentage-based)
#[derive(Debug, Clone, PartialEq)]
pub struct SpatialOffset {
    pub x: f64,
    pub y: f64,
}

impl Cfi {
    pub fn new(path: CfiPath) -> Self {
        Self { path, range: None }
    }

    /// Check if this CFI represents a range (text selection)
    pub fn is_range(&self) -> bool {
        self.range.is_some()
    }

    /// Steps that address the innermost document.
    ///
    /// Everything up to and including the last `!` walks the package
    /// document, so only the tail applies to a content document tree.
    pub fn content_steps(&self) -> &[CfiStep] {
        let steps = &self.path.steps;
        match steps.iter().rposition(CfiStep::is_indirection) {
            Some(last) => &steps[last + 1..],
            None => steps,
        }
    }
}

impl CfiPath {
    pub fn with_steps(steps: Vec<CfiStep>) -> Self {
        Self {
            steps,
            character_offset: None,
            temporal_offset: None,
            spatial_offset: None,
        }
    }
}

impl CfiStep {
    /// Create an element step
    pub fn element(index: u32) -> Self {
        Self {
            step_type: StepType::Element(index),
            id_assertion: None,
            text_assertion: None,
        }
    }

    /// Create an element step with ID assertion
    pub fn element_with_id(index: u32, id: impl Into<String>) -> Self {
        Self {
            step_type: StepType::Element(index),
            id_assertion: Some(id.into()),
            text_assertion: None,
        }
    }

    pub fn indirection() -> Self {
        Self {
            step_type: StepType::Indirection,
            id_assertion: None,
            text_assertion: None,
        }
    }

    pub fn is_indirection(&self) -> bool {
        matches!(self.step_type, StepType::Indirection)
    }

    /// Get the element ordinal if this is an element step
    pub fn element_index(&self) -> Option<u32> {
        match self.step_type {
            StepType::Element(n) => Some(n),
            StepType::Indirection => None,
        }
    }
}

impl fmt::Display for Cfi {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "epubcfi({}", self.path)?;
        if let Some(ref range) = self.range {
            write!(f, ",{},{}", range.start, range.end)?;
        }
        write!(f, ")")
    }
}

impl fmt::Display for CfiPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for step in &self.steps {
            write!(f, "{}", step)?;
        }
        if let Some(ref offset) = self.character_offset {
            write!(f, ":{}", offset.offset)?;
            if let Some(ref assertion) = offset.assertion {
                write!(f, "{}", assertion)?;
            }
        }
        if let Some(ref temporal) = self.temporal_offset {
            write!(f, "~{}", temporal.seconds)?;
        }
        if let Some(ref spatial) = self.spatial_offset {
            write!(f, "@{}:{}", spatial.x, spatial.y)?;
        }
        Ok(())
    }
}

/// Write `text` with `^` before every character that is special inside a
/// bracketed assertion.
fn write_escaped(f: &mut fmt::Formatter<'_>, text: &str) -> fmt::Result {
    for ch in text.chars() {
        if matches!(ch, '^' | '[' | ']' | '(' | ')' | ',' | ';' | '=') {
            write!(f, "^")?;
        }
        write!(f, "{}", ch)?;
    }
    Ok(())
}

impl fmt::Display for CfiStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.step_type {
            StepType::Element(n) => write!(f, "/{}", n)?,
            StepType::Indirection => write!(f, "!")?,
        }
        if let Some(ref id) = self.id_assertion {
            write!(f, "[")?;
            write_escaped(f, id)?;
            write!(f, "]")?;
        }
        if let Some(ref assertion) = self.text_assertion {
            write!(f, "{}", assertion)?;
        }
        Ok(())
    }
}

impl fmt::Display for TextAssertion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[")?;
        if let Some(ref prefix) = self.prefix {
            write_escaped(f, prefix)?;
        }
        if self.prefix.is_some() || self.suffix.is_some() {
            write!(f, ",")?;
        }
        if let Some(ref suffix) = self.suffix {
            write_escaped(f, suffix)?;
        }
        for (key, value) in &self.parameters {
            write!(f, ";{}={}", key, value)?;
        }
        write!(f, "]")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_content_steps_without_indirection() {
        let cfi = Cfi::new(CfiPath::with_steps(vec![
            CfiStep::element(4),
            CfiStep::element_with_id(2, "intro"),
        ]));

        assert_eq!(cfi.content_steps().len(), 2);
        assert_eq!(cfi.to_string(), "epubcfi(/4/2[intro])");
    }

    #[test]
    fn test_content_steps_after_last_indirection() {
        let cfi = Cfi::new(CfiPath::with_steps(vec![
            CfiStep::element(6),
            CfiStep::element_with_id(4, "chapter1"),
            CfiStep::indirection(),
            CfiStep::element(4),
            CfiStep::element(10),
        ]));

        let tail = cfi.content_steps();
        assert_eq!(tail.len(), 2);
        assert_eq!(tail[0].element_index(), Some(4));
        assert_eq!(tail[1].element_index(), Some(10));
    }

    #[test]
    fn test_content_steps_trailing_indirection_is_empty() {
        let cfi = Cfi::new(CfiPath::with_steps(vec![
            CfiStep::element(6),
            CfiStep::indirection(),
        ]));

        assert!(cfi.content_steps().is_empty());
    }
}
