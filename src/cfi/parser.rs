//! CFI Parser
//!
//! Parses EPUB CFI strings into structured Cfi objects. Both the wrapped
//! form (`epubcfi(/6/4!/4/2)`) and the bare path form Ace puts in its
//! reports (`/4/2[intro]/6`) are accepted.
//!
//! Grammar (simplified):
//! ```text
//! cfi       = "epubcfi(" body ")" | body
//! body      = path ["," path "," path]
//! path      = step+ [offset]
//! step      = "/" number [id] | "!" [id]
//! id        = "[" text "]"
//! offset    = ":" number [assertion] | "~" number | "@" number ":" number
//! ```

use super::types::*;
use thiserror::Error;

/// CFI parsing errors
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CfiParseError {
    #[error("Empty CFI string")]
    Empty,

    #[error("CFI must end with ')'")]
    MissingClosingParen,

    #[error("Expected '/' or '!' at position {0}")]
    ExpectedStep(usize),

    #[error("Expected number at position {0}")]
    ExpectedNumber(usize),

    #[error("Unclosed bracket at position {0}")]
    UnclosedBracket(usize),

    #[error("Unexpected character '{0}' at position {1}")]
    UnexpectedChar(char, usize),
}

struct Parser<'a> {
    input: &'a str,
    pos: usize,
}

impl<'a> Parser<'a> {
    fn new(input: &'a str) -> Self {
        Self { input, pos: 0 }
    }

    fn peek(&self) -> Option<char> {
        self.input[self.pos..].chars().next()
    }

    fn advance(&mut self) -> Option<char> {
        let ch = self.peek()?;
        self.pos += ch.len_utf8();
        Some(ch)
    }

    fn skip_if(&mut self, expected: char) -> bool {
        if self.peek() == Some(expected) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn expect(&mut self, expected: char) -> Result<(), CfiParseError> {
        if self.skip_if(expected) {
            Ok(())
        } else {
            Err(CfiParseError::UnexpectedChar(
                self.peek().unwrap_or('\0'),
                self.pos,
            ))
        }
    }

    fn skip_str(&mut self, s: &str) -> bool {
        if self.input[self.pos..].starts_with(s) {
            self.pos += s.len();
            true
        } else {
            false
        }
    }

    fn at_end(&self) -> bool {
        self.pos >= self.input.len()
    }

    fn take_digits(&mut self) -> usize {
        let start = self.pos;
        while matches!(self.peek(), Some(ch) if ch.is_ascii_digit()) {
            self.advance();
        }
        start
    }

    fn parse_number(&mut self) -> Result<u32, CfiParseError> {
        let start = self.take_digits();
        if self.pos == start {
            return Err(CfiParseError::ExpectedNumber(start));
        }

        self.input[start..self.pos]
            .parse()
            .map_err(|_| CfiParseError::ExpectedNumber(start))
    }

    fn parse_float(&mut self) -> Result<f64, CfiParseError> {
        let start = self.pos;
        self.skip_if('-');
        self.take_digits();
        if self.skip_if('.') {
            self.take_digits();
        }

        if self.pos == start {
            return Err(CfiParseError::ExpectedNumber(start));
        }

        self.input[start..self.pos]
            .parse()
            .map_err(|_| CfiParseError::ExpectedNumber(start))
    }

    /// Parse text inside brackets, handling `^` escapes. Also returns the
    /// byte offsets (in the unescaped text) of unescaped `,` and `;`.
    fn parse_bracket_content(&mut self) -> Result<(String, Vec<(char, usize)>), CfiParseError> {
        let start = self.pos;
        let mut result = String::new();
        let mut separators = Vec::new();
        let mut escaped = false;

        while let Some(ch) = self.peek() {
            if escaped {
                result.push(ch);
                escaped = false;
            } else if ch == '^' {
                escaped = true;
            } else if ch == ']' {
                return Ok((result, separators));
            } else if ch == '[' {
                return Err(CfiParseError::UnexpectedChar('[', self.pos));
            } else {
                if ch == ',' || ch == ';' {
                    separators.push((ch, result.len()));
                }
                result.push(ch);
            }
            self.advance();
        }

        Err(CfiParseError::UnclosedBracket(start))
    }

    /// Parse an ID assertion [id] or text assertion [prefix,suffix]
    fn parse_assertion(
        &mut self,
    ) -> Result<(Option<String>, Option<TextAssertion>), CfiParseError> {
        if !self.skip_if('[') {
            return Ok((None, None));
        }

        let (content, separators) = self.parse_bracket_content()?;
        self.expect(']')?;

        let Some(comma_pos) = separators
            .iter()
            .find(|(ch, _)| *ch == ',')
            .map(|&(_, pos)| pos)
        else {
            return Ok((Some(content), None));
        };

        let prefix = Some(&content[..comma_pos])
            .filter(|p| !p.is_empty())
            .map(str::to_string);

        let semi_pos = separators
            .iter()
            .find(|&&(ch, pos)| ch == ';' && pos > comma_pos)
            .map(|&(_, pos)| pos);

        let (suffix_str, parameters) = match semi_pos {
            Some(semi_pos) => (
                &content[comma_pos + 1..semi_pos],
                parse_parameters(&content[semi_pos + 1..]),
            ),
            None => (&content[comma_pos + 1..], Vec::new()),
        };

        let suffix = Some(suffix_str)
            .filter(|s| !s.is_empty())
            .map(str::to_string);

        Ok((
            None,
            Some(TextAssertion {
                prefix,
                suffix,
                parameters,
            }),
        ))
    }

    fn parse_step(&mut self) -> Result<CfiStep, CfiParseError> {
        if self.skip_if('/') {
            let index = self.parse_number()?;
            let (id_assertion, text_assertion) = self.parse_assertion()?;

            Ok(CfiStep {
                step_type: StepType::Element(index),
                id_assertion,
                text_assertion,
            })
        } else if self.skip_if('!') {
            let (id_assertion, text_assertion) = self.parse_assertion()?;

            Ok(CfiStep {
                step_type: StepType::Indirection,
                id_assertion,
                text_assertion,
            })
        } else {
            Err(CfiParseError::ExpectedStep(self.pos))
        }
    }

    fn parse_path(&mut self) -> Result<CfiPath, CfiParseError> {
        let mut steps = Vec::new();
        while matches!(self.peek(), Some('/') | Some('!')) {
            steps.push(self.parse_step()?);
        }

        let mut path = CfiPath::with_steps(steps);

        if self.skip_if(':') {
            let offset = self.parse_number()?;
            let (_, assertion) = self.parse_assertion()?;
            path.character_offset = Some(CharacterOffset { offset, assertion });
        }

        if self.skip_if('~') {
            let seconds = self.parse_float()?;
            path.temporal_offset = Some(TemporalOffset { seconds });
        }

        if self.skip_if('@') {
            let x = self.parse_float()?;
            self.expect(':')?;
            let y = self.parse_float()?;
            path.spatial_offset = Some(SpatialOffset { x, y });
        }

        Ok(path)
    }

    fn parse_body(&mut self) -> Result<Cfi, CfiParseError> {
        if !matches!(self.peek(), Some('/') | Some('!')) {
            return Err(CfiParseError::ExpectedStep(self.pos));
        }

        let path = self.parse_path()?;

        let range = if self.skip_if(',') {
            let start = self.parse_path()?;
            self.expect(',')?;
            let end = self.parse_path()?;
            Some(CfiRange { start, end })
        } else {
            None
        };

        Ok(Cfi { path, range })
    }

    fn parse_cfi(&mut self) -> Result<Cfi, CfiParseError> {
        if self.skip_str("epubcfi(") {
            let cfi = self.parse_body()?;
            if !self.skip_if(')') {
                return Err(CfiParseError::MissingClosingParen);
            }
            Ok(cfi)
        } else {
            self.parse_body()
        }
    }
}

/// Parse parameters from a string like "key1=value1;key2=value2"
fn parse_parameters(s: &str) -> Vec<(String, String)> {
    s.split(';')
        .filter_map(|part| {
            let (key, value) = part.split_once('=')?;
            let key = key.trim();
            (!key.is_empty()).then(|| (key.to_string(), value.trim().to_string()))
        })
        .collect()
}

/// Parse a CFI string into a Cfi struct
pub fn parse(input: &str) -> Result<Cfi, CfiParseError> {
    let input = input.trim();
    if input.is_empty() {
        return Err(CfiParseError::Empty);
    }

    let mut parser = Parser::new(input);
    let cfi = parser.parse_cfi()?;

    if !parser.at_end() {
        return Err(CfiParseError::UnexpectedChar(
            parser.peek().unwrap_or('\0'),
            parser.pos,
        ));
    }

    Ok(cfi)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_bare_path() {
        let cfi = parse("/4/2[intro]/6").unwrap();
        assert_eq!(cfi.path.steps.len(), 3);
        assert_eq!(cfi.path.steps[0].step_type, StepType::Element(4));
        assert_eq!(cfi.path.steps[1].id_assertion.as_deref(), Some("intro"));
        assert_eq!(cfi.path.steps[2].step_type, StepType::Element(6));
        assert!(!cfi.is_range());
    }

    #[test]
    fn test_parse_wrapped_cfi() {
        let cfi = parse("epubcfi(/6/4!/4/2)").unwrap();
        assert_eq!(cfi.path.steps.len(), 5);
        assert_eq!(cfi.path.steps[2].step_type, StepType::Indirection);
        assert_eq!(cfi.to_string(), "epubcfi(/6/4!/4/2)");
    }

    #[test]
    fn test_parse_character_offset_with_assertion() {
        let cfi = parse("epubcfi(/6/4!/4/2/1:42[hello,world])").unwrap();
        let offset = cfi.path.character_offset.as_ref().unwrap();
        assert_eq!(offset.offset, 42);
        let assertion = offset.assertion.as_ref().unwrap();
        assert_eq!(assertion.prefix.as_deref(), Some("hello"));
        assert_eq!(assertion.suffix.as_deref(), Some("world"));
    }

    #[test]
    fn test_parse_range() {
        let cfi = parse("epubcfi(/6/4!/4/2,/1:0,/1:10)").unwrap();
        assert!(cfi.is_range());
        let range = cfi.range.as_ref().unwrap();
        assert_eq!(range.end.character_offset.as_ref().unwrap().offset, 10);
    }

    #[test]
    fn test_parse_spatial_and_temporal_offsets() {
        let cfi = parse("/4~12.5@50.5:25.0").unwrap();
        assert_eq!(cfi.path.temporal_offset.as_ref().unwrap().seconds, 12.5);
        assert_eq!(cfi.path.spatial_offset.as_ref().unwrap().x, 50.5);
    }

    #[test]
    fn test_escaped_bracket() {
        let cfi = parse("/4[test^]value]/2").unwrap();
        assert_eq!(cfi.path.steps[0].id_assertion.as_deref(), Some("test]value"));
    }

    #[test]
    fn test_escaped_comma_stays_in_id() {
        let cfi = parse("/4[a^,b]").unwrap();
        assert_eq!(cfi.path.steps[0].id_assertion.as_deref(), Some("a,b"));
        assert!(cfi.path.steps[0].text_assertion.is_none());
    }

    #[test]
    fn test_display_reescapes_assertions() {
        for input in [
            "epubcfi(/4[test^]value]/2)",
            "epubcfi(/4[a^,b^[c^^]/2)",
            "epubcfi(/4/2:10[x^,y,z^]])",
        ] {
            let cfi = parse(input).unwrap();
            assert_eq!(cfi.to_string(), input);
            assert_eq!(parse(&cfi.to_string()).unwrap(), cfi);
        }
    }

    #[test]
    fn test_error_empty() {
        assert_eq!(parse("   "), Err(CfiParseError::Empty));
    }

    #[test]
    fn test_error_unclosed_bracket() {
        assert!(matches!(
            parse("/4/2[intro/6"),
            Err(CfiParseError::UnclosedBracket(_))
        ));
    }

    #[test]
    fn test_error_stray_closing_bracket() {
        assert!(matches!(
            parse("/4/2]"),
            Err(CfiParseError::UnexpectedChar(']', 4))
        ));
    }

    #[test]
    fn test_error_missing_paren() {
        assert_eq!(
            parse("epubcfi(/6/4"),
            Err(CfiParseError::MissingClosingParen)
        );
    }

    #[test]
    fn test_error_missing_number() {
        assert_eq!(parse("/4/x"), Err(CfiParseError::ExpectedNumber(3)));
    }

    #[test]
    fn test_error_not_a_path() {
        assert_eq!(parse("chapter1"), Err(CfiParseError::ExpectedStep(0)));
    }
}
