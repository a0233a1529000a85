//! Source code representation and error management.

use std::{cell::RefCell, fmt, ops::Range};

use log::debug;

pub mod error;

pub use error::{CompileError, DiagnosticKind, LexError, ParseError, SemanticError};

/// Represents source code.
pub struct Source<'a> {
    /// The source text.
    pub content: &'a str,
    /// Accumulated errors.
    pub errors: ErrorReporter,
    /// Byte offset of the first character of every line.
    line_starts: Vec<usize>,
}

impl<'a> Source<'a> {
    /// Create a new `Source` with the specified `content`.
    pub fn new(content: &'a str) -> Self {
        let line_starts = std::iter::once(0)
            .chain(content.match_indices('\n').map(|(i, _)| i + 1))
            .collect();
        Self {
            content,
            errors: ErrorReporter::new(),
            line_starts,
        }
    }

    /// Returns `true` if `Source` has no accumulated errors. Returns `false` otherwise.
    pub fn has_no_errors(&self) -> bool {
        self.errors.is_empty()
    }

    /// Returns the 1-based line and column of the byte `offset`.
    /// Offsets past the end of the content are clamped to the end.
    pub fn position(&self, offset: usize) -> Position {
        let offset = offset.min(self.content.len());
        let line = match self.line_starts.binary_search(&offset) {
            Ok(line) => line,
            Err(next_line) => next_line - 1,
        };
        let line_start = self.line_starts[line];
        let column = self
            .content
            .get(line_start..offset)
            .map_or(offset - line_start, |prefix| prefix.chars().count());
        Position {
            line: line + 1,
            column: column + 1,
        }
    }

    /// Returns the text of the 1-based `line`, without its line terminator.
    pub fn line(&self, line: usize) -> Option<&'a str> {
        let start = *self.line_starts.get(line.checked_sub(1)?)?;
        let end = self
            .line_starts
            .get(line)
            .map_or(self.content.len(), |next| next - 1);
        self.content
            .get(start..end)
            .map(|line| line.strip_suffix('\r').unwrap_or(line))
    }

    /// Records `error` at `span`.
    pub fn add_error(&self, error: impl Into<CompileError>, span: Range<usize>) {
        let error = error.into();
        let position = self.position(span.start);
        debug!("{} error at {}: {}", error.kind(), position, error);
        self.errors.add_error(Diagnostic {
            error,
            span,
            position,
        });
    }

    /// Consumes the `Source` and returns every recorded diagnostic in report order.
    pub fn into_diagnostics(self) -> Vec<Diagnostic> {
        self.errors.errors.into_inner()
    }
}

impl<'a> From<&'a str> for Source<'a> {
    fn from(content: &'a str) -> Self {
        Source::new(content)
    }
}

/// A 1-based line and column (in characters).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Position {
    pub line: usize,
    pub column: usize,
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

/// An error (compile time error) attached to a location in the source.
#[derive(Debug, Clone, PartialEq)]
pub struct Diagnostic {
    pub error: CompileError,
    /// Byte range of the offending text.
    pub span: Range<usize>,
    /// Position of `span.start`.
    pub position: Position,
}

impl Diagnostic {
    pub fn kind(&self) -> DiagnosticKind {
        self.error.kind()
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{kind} error: {message} at {position}",
            kind = self.kind(),
            message = self.error,
            position = self.position
        )
    }
}

/// Manages all the errors.
pub struct ErrorReporter {
    errors: RefCell<Vec<Diagnostic>>,
}

impl ErrorReporter {
    /// Create an empty `ErrorReporter`.
    pub fn new() -> Self {
        Self {
            errors: RefCell::new(Vec::new()),
        }
    }

    /// Adds an error to the `ErrorReporter`.
    /// This method uses the interior mutability pattern. This does not require mutability for ergonomics.
    pub fn add_error(&self, diagnostic: Diagnostic) {
        // This should be the only place where self.errors is borrowed mutably.
        self.errors.borrow_mut().push(diagnostic);
    }

    pub fn len(&self) -> usize {
        self.errors.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.errors.borrow().is_empty()
    }
}

impl Default for ErrorReporter {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ErrorReporter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let errors = self.errors.borrow();
        for error in errors.iter() {
            writeln!(
                f,
                "ERROR[{kind}]: {message} at {position}",
                kind = error.kind(),
                message = error.error,
                position = error.position
            )?;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_position() {
        let source = Source::new("let x = 1\nlet y = \"é\" z\n\nfoo");
        assert_eq!(source.position(0), Position { line: 1, column: 1 });
        assert_eq!(source.position(4), Position { line: 1, column: 5 });
        assert_eq!(source.position(9), Position { line: 1, column: 10 });
        assert_eq!(source.position(10), Position { line: 2, column: 1 });
        // `z` comes after a two byte character
        assert_eq!(source.position(23), Position { line: 2, column: 13 });
        assert_eq!(source.position(25), Position { line: 3, column: 1 });
        assert_eq!(source.position(26), Position { line: 4, column: 1 });
        assert_eq!(source.position(1000), Position { line: 4, column: 4 });
    }

    #[test]
    fn test_line() {
        let source = Source::new("first\r\nsecond\n\nlast");
        assert_eq!(source.line(1), Some("first"));
        assert_eq!(source.line(2), Some("second"));
        assert_eq!(source.line(3), Some(""));
        assert_eq!(source.line(4), Some("last"));
        assert_eq!(source.line(5), None);
        assert_eq!(source.line(0), None);
    }

    #[test]
    fn test_error_reporter() {
        let source: Source = "let x = \n  $".into();
        assert!(source.has_no_errors());

        source.add_error(LexError::IllegalCharacter("$".to_string()), 11..12);
        source.add_error(
            ParseError::UnexpectedToken {
                expected: "expression".to_string(),
                found: "end of input".to_string(),
            },
            12..12,
        );

        assert!(!source.has_no_errors());
        assert_eq!(source.errors.len(), 2);
        assert_eq!(
            source.errors.to_string(),
            "ERROR[lex]: illegal character `$` at 2:3\n\
             ERROR[parse]: expected expression, found end of input at 2:4\n"
        );

        let diagnostics = source.into_diagnostics();
        assert_eq!(diagnostics[0].kind(), DiagnosticKind::Lex);
        assert_eq!(diagnostics[1].kind(), DiagnosticKind::Parse);
        assert_eq!(
            diagnostics[1].to_string(),
            "parse error: expected expression, found end of input at 2:4"
        );
    }
}
