//! Jump-to-location
//!
//! The resolver only finds nodes; moving a cursor is up to whoever hosts it.
//! [`Navigator`] is that seam: it receives a file reference and a 1-based line.

use std::io::Write;
use std::process::Command;

use crate::dom::AnnotatedDocument;
use crate::error::{AppError, Result};

/// Something that can show `file` at `line`.
pub trait Navigator {
    fn goto(&mut self, file: &str, line: u32) -> Result<()>;
}

/// Resolve `cfi` in `doc` and hand its line to `navigator`.
///
/// Returns `false` without calling the navigator when the CFI does not
/// resolve or the element has no usable line.
pub fn jump_to_location<N: Navigator + ?Sized>(
    navigator: &mut N,
    doc: &AnnotatedDocument<'_>,
    file: &str,
    cfi: &str,
) -> Result<bool> {
    match doc.line_for_cfi(cfi) {
        Some(line) => {
            navigator.goto(file, line)?;
            Ok(true)
        }
        None => {
            tracing::debug!(file, cfi, "Location unavailable");
            Ok(false)
        }
    }
}

/// Writes `file:line` to a stream
pub struct PrintNavigator<W: Write> {
    out: W,
}

impl<W: Write> PrintNavigator<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write> Navigator for PrintNavigator<W> {
    fn goto(&mut self, file: &str, line: u32) -> Result<()> {
        writeln!(self.out, "{}:{}", file, line)?;
        Ok(())
    }
}

/// Opens an editor at the location.
///
/// The command may use `{file}` and `{line}` placeholders
/// (e.g. `code -g {file}:{line}`); without them `+<line> <file>` is appended,
/// which vi, emacs, nano and most terminal editors understand.
pub struct EditorNavigator {
    command: String,
}

impl EditorNavigator {
    pub fn new(command: impl Into<String>) -> Self {
        Self {
            command: command.into(),
        }
    }

    /// Program and arguments for a jump to `file` at `line`. Empty when the
    /// command is blank.
    pub fn command_line(&self, file: &str, line: u32) -> Vec<String> {
        let templated = self.command.contains("{file}") || self.command.contains("{line}");

        let mut parts: Vec<String> = self
            .command
            .split_whitespace()
            .map(|part| {
                part.replace("{file}", file)
                    .replace("{line}", &line.to_string())
            })
            .collect();

        if !parts.is_empty() && !templated {
            parts.push(format!("+{}", line));
            parts.push(file.to_string());
        }
        parts
    }
}

impl Navigator for EditorNavigator {
    fn goto(&mut self, file: &str, line: u32) -> Result<()> {
        let parts = self.command_line(file, line);
        let (program, args) = parts
            .split_first()
            .ok_or_else(|| AppError::Config("editor command is empty".to_string()))?;

        tracing::info!(program = %program, file, line, "Opening editor");

        let status = Command::new(program).args(args).status()?;
        if status.success() {
            Ok(())
        } else {
            Err(AppError::Navigation(format!(
                "'{}' exited with {}",
                program, status
            )))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct Recorder {
        jumps: Vec<(String, u32)>,
    }

    impl Navigator for Recorder {
        fn goto(&mut self, file: &str, line: u32) -> Result<()> {
            self.jumps.push((file.to_string(), line));
            Ok(())
        }
    }

    const DOC: &str = "<html>\n<head/>\n<body>\n<p id=\"a\">x</p>\n</body>\n</html>";

    #[test]
    fn test_jump_calls_navigator_with_line() {
        let doc = AnnotatedDocument::parse(DOC).unwrap();
        let mut nav = Recorder::default();

        assert!(jump_to_location(&mut nav, &doc, "ch1.xhtml", "/6[a]").unwrap());
        assert_eq!(nav.jumps, vec![("ch1.xhtml".to_string(), 4)]);
    }

    #[test]
    fn test_unresolved_jump_is_noop() {
        let doc = AnnotatedDocument::parse(DOC).unwrap();
        let mut nav = Recorder::default();

        assert!(!jump_to_location(&mut nav, &doc, "ch1.xhtml", "/6[missing]").unwrap());
        assert!(!jump_to_location(&mut nav, &doc, "ch1.xhtml", "/6[a").unwrap());
        assert!(nav.jumps.is_empty());
    }

    #[test]
    fn test_print_navigator() {
        let mut nav = PrintNavigator::new(Vec::new());
        nav.goto("Text/ch1.xhtml", 12).unwrap();
        assert_eq!(String::from_utf8(nav.into_inner()).unwrap(), "Text/ch1.xhtml:12\n");
    }

    #[test]
    fn test_editor_command_line() {
        assert_eq!(
            EditorNavigator::new("vim").command_line("a.xhtml", 7),
            vec!["vim", "+7", "a.xhtml"]
        );
        assert_eq!(
            EditorNavigator::new("code -g {file}:{line}").command_line("a.xhtml", 7),
            vec!["code", "-g", "a.xhtml:7"]
        );
    }

    #[test]
    fn test_empty_editor_is_config_error() {
        assert!(EditorNavigator::new("   ").command_line("a.xhtml", 1).is_empty());

        let mut nav = EditorNavigator::new("   ");
        assert!(matches!(nav.goto("a.xhtml", 1), Err(AppError::Config(_))));

        let mut nav = EditorNavigator::new("");
        assert!(matches!(nav.goto("a.xhtml", 1), Err(AppError::Config(_))));
    }
}
