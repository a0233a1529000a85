//! Error taxonomy for every stage of the front end.

use std::fmt;

use thiserror::Error;

/// An error found while turning source text into tokens.
/// The lexer never stops on these: the offending lexeme becomes an `Illegal` token.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LexError {
    #[error("unterminated string literal")]
    UnterminatedString,
    #[error("malformed numeric literal `{0}`")]
    MalformedNumber(String),
    #[error("integer literal `{0}` is out of range")]
    IntegerOutOfRange(String),
    /// A lone `&` or `|` that is not part of `&&` or `||`.
    #[error("dangling `{0}`, did you mean `{0}{0}`?")]
    DanglingOperator(char),
    #[error("illegal character `{0}`")]
    IllegalCharacter(String),
}

/// An error in the structure of the token stream.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("expected {expected}, found {found}")]
    UnexpectedToken { expected: String, found: String },
    /// End of input was reached before the delimiter was closed.
    #[error("unclosed delimiter `{0}`")]
    UnclosedDelimiter(char),
    /// A closing delimiter without a matching opening one.
    #[error("unmatched closing delimiter `{0}`")]
    UnmatchedDelimiter(char),
    #[error("invalid literal `{0}`")]
    InvalidLiteral(String),
    /// Expressions or blocks nested more than the given number of levels.
    #[error("nesting exceeds the limit of {0} levels")]
    NestingTooDeep(usize),
}

/// An error in the meaning of an otherwise well-formed program.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SemanticError {
    #[error("cannot find `{0}` in this scope")]
    UndeclaredIdentifier(String),
    #[error("`{0}` is already declared in this scope")]
    DuplicateDeclaration(String),
    #[error("cannot assign twice to constant `{0}`")]
    AssignToConstant(String),
    #[error("`return` outside of a function body")]
    ReturnOutsideFunction,
}

/// Any error that can be reported against a [`Source`](crate::Source).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CompileError {
    #[error(transparent)]
    Lex(#[from] LexError),
    #[error(transparent)]
    Parse(#[from] ParseError),
    #[error(transparent)]
    Semantic(#[from] SemanticError),
}

impl CompileError {
    pub fn kind(&self) -> DiagnosticKind {
        match self {
            CompileError::Lex(_) => DiagnosticKind::Lex,
            CompileError::Parse(_) => DiagnosticKind::Parse,
            CompileError::Semantic(_) => DiagnosticKind::Semantic,
        }
    }
}

/// The stage an error was found in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DiagnosticKind {
    Lex,
    Parse,
    Semantic,
}

impl fmt::Display for DiagnosticKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            DiagnosticKind::Lex => "lex",
            DiagnosticKind::Parse => "parse",
            DiagnosticKind::Semantic => "semantic",
        })
    }
}
