use std::fmt;
use std::ops::Range;

use log::trace;
use logos::Logos;
use slow_source::{LexError, Source};

#[derive(Debug, Logos, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
    // literals
    #[regex(r"[0-9]+")]
    Int,
    #[regex(r"[0-9]+\.[0-9]*")]
    Float,
    #[regex(r#""[^"]*""#)]
    String,

    // identifiers
    #[regex(r"[\p{XID_Start}_]\p{XID_Continue}*")]
    Identifier,

    // keywords
    #[token("let")]
    Let,
    #[token("const")]
    Const,
    #[token("function")]
    Function,
    #[token("return")]
    Return,
    #[token("if")]
    If,
    #[token("else")]
    Else,

    // unary operators
    #[token("!")]
    Bang,

    // binary operators
    // - arithmetics
    #[token("+")]
    Plus,
    #[token("-")]
    Minus, // NOTE: can also be unary
    #[token("*")]
    Asterisk,
    #[token("/")]
    Slash,
    #[token("%")]
    Percent,
    #[token("^")]
    Caret,
    // - assignment
    #[token("=")]
    Equals,
    // - equality
    #[token("==")]
    EqualsEquals,
    #[token("!=")]
    NotEquals,
    // - ordering
    #[token(">")]
    GreaterThan,
    #[token(">=")]
    GreaterThanEquals,
    #[token("<")]
    LessThan,
    #[token("<=")]
    LessThanEquals,
    // - logical
    #[token("&&")]
    AndAnd,
    #[token("||")]
    OrOr,

    // punctuation
    #[token("(")]
    OpenParen,
    #[token(")")]
    CloseParen,
    #[token("{")]
    OpenBrace,
    #[token("}")]
    CloseBrace,
    #[token(",")]
    Comma,
    #[token(";")]
    Semi,

    // misc
    #[regex(r"\s+", logos::skip)]
    #[regex(r"//[^\n]*", logos::skip)] // single line comments
    #[token("&")] // dangling `&` (not `&&`)
    #[token("|")] // dangling `|` (not `||`)
    #[regex(r"[0-9]+\.[0-9]*\.[0-9.]*")] // more than one decimal point
    #[regex(r#""[^"]*"#)] // unterminated string
    #[error]
    Illegal,

    /// Emitted exactly once, after the last token of the source.
    Eof,
}

/// Binding power of prefix operators. Binds tighter than `*` but looser than `^`, so `-2^2` is `-(2^2)`.
pub const PREFIX_BP: u8 = 15;

impl TokenKind {
    /// Returns the binary binding power or `None` if invalid binop token.
    /// Binding power `0` and `1` is reserved for accepting any expression.
    /// Exponentiation (`TokenKind::Caret`) is right associative with `(17, 16)`.
    pub fn binop_bp(&self) -> Option<(u8, u8)> {
        match self {
            /* Logical */
            TokenKind::OrOr => Some((2, 3)),
            TokenKind::AndAnd => Some((4, 5)),
            /* Equality */
            TokenKind::EqualsEquals | TokenKind::NotEquals => Some((6, 7)),
            TokenKind::GreaterThan
            | TokenKind::GreaterThanEquals
            | TokenKind::LessThan
            | TokenKind::LessThanEquals => Some((8, 9)),
            /* Additive */
            TokenKind::Plus | TokenKind::Minus => Some((10, 11)),
            /* Multiplicative */
            TokenKind::Asterisk | TokenKind::Slash | TokenKind::Percent => Some((12, 13)),
            /* Exponent */
            TokenKind::Caret => Some((17, 16)),
            _ => None,
        }
    }

    /// Returns `true` for keywords that can only appear at the start of a statement.
    pub fn starts_statement(&self) -> bool {
        matches!(
            self,
            TokenKind::Let | TokenKind::Const | TokenKind::Function | TokenKind::Return | TokenKind::If
        )
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            TokenKind::Int => "integer literal",
            TokenKind::Float => "float literal",
            TokenKind::String => "string literal",
            TokenKind::Identifier => "identifier",
            TokenKind::Let => "`let`",
            TokenKind::Const => "`const`",
            TokenKind::Function => "`function`",
            TokenKind::Return => "`return`",
            TokenKind::If => "`if`",
            TokenKind::Else => "`else`",
            TokenKind::Bang => "`!`",
            TokenKind::Plus => "`+`",
            TokenKind::Minus => "`-`",
            TokenKind::Asterisk => "`*`",
            TokenKind::Slash => "`/`",
            TokenKind::Percent => "`%`",
            TokenKind::Caret => "`^`",
            TokenKind::Equals => "`=`",
            TokenKind::EqualsEquals => "`==`",
            TokenKind::NotEquals => "`!=`",
            TokenKind::GreaterThan => "`>`",
            TokenKind::GreaterThanEquals => "`>=`",
            TokenKind::LessThan => "`<`",
            TokenKind::LessThanEquals => "`<=`",
            TokenKind::AndAnd => "`&&`",
            TokenKind::OrOr => "`||`",
            TokenKind::OpenParen => "`(`",
            TokenKind::CloseParen => "`)`",
            TokenKind::OpenBrace => "`{`",
            TokenKind::CloseBrace => "`}`",
            TokenKind::Comma => "`,`",
            TokenKind::Semi => "`;`",
            TokenKind::Illegal => "illegal token",
            TokenKind::Eof => "end of input",
        };
        f.write_str(s)
    }
}

/// A lexeme together with its kind and location.
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    /// The exact lexeme. String literals exclude the surrounding quotes.
    pub text: String,
    /// Byte range in the source, quotes included.
    pub span: Range<usize>,
}

impl Token {
    pub fn new(kind: TokenKind, text: impl Into<String>, span: Range<usize>) -> Self {
        Self {
            kind,
            text: text.into(),
            span,
        }
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            TokenKind::Int | TokenKind::Float | TokenKind::Identifier => {
                write!(f, "{} `{}`", self.kind, self.text)
            }
            TokenKind::String => write!(f, "{} \"{}\"", self.kind, self.text),
            _ => write!(f, "{}", self.kind),
        }
    }
}

/// Lazily turns source text into [`Token`]s.
/// Lexing errors are reported to the [`Source`] and surface as [`TokenKind::Illegal`] tokens.
pub struct Lexer<'a> {
    inner: logos::Lexer<'a, TokenKind>,
    source: &'a Source<'a>,
    /// Set once the [`TokenKind::Eof`] token has been emitted.
    done: bool,
}

impl<'a> Lexer<'a> {
    pub fn new(source: &'a Source<'a>) -> Self {
        Self {
            inner: TokenKind::lexer(source.content),
            source,
            done: false,
        }
    }

    fn illegal(&self, slice: &str, span: Range<usize>) -> Token {
        let error = match slice.chars().next() {
            Some('"') => LexError::UnterminatedString,
            Some(c @ ('&' | '|')) if slice.len() == 1 => LexError::DanglingOperator(c),
            Some(c) if c.is_ascii_digit() => LexError::MalformedNumber(slice.to_string()),
            _ => LexError::IllegalCharacter(slice.to_string()),
        };
        self.source.add_error(error, span.clone());
        Token::new(TokenKind::Illegal, slice, span)
    }
}

impl<'a> Iterator for Lexer<'a> {
    type Item = Token;

    fn next(&mut self) -> Option<Token> {
        let kind = match self.inner.next() {
            Some(kind) => kind,
            None if self.done => return None,
            None => {
                self.done = true;
                let end = self.source.content.len();
                return Some(Token::new(TokenKind::Eof, "", end..end));
            }
        };
        let span = self.inner.span();
        let slice = self.inner.slice();

        let token = match kind {
            TokenKind::String => Token::new(kind, &slice[1..slice.len() - 1], span),
            TokenKind::Int if slice.parse::<i64>().is_err() => {
                self.source
                    .add_error(LexError::IntegerOutOfRange(slice.to_string()), span.clone());
                Token::new(TokenKind::Illegal, slice, span)
            }
            TokenKind::Illegal => self.illegal(slice, span),
            _ => Token::new(kind, slice, span),
        };
        trace!("lexed {:?} {:?} at {:?}", token.kind, token.text, token.span);
        Some(token)
    }
}

/// Collects every token of `source`, ending with [`TokenKind::Eof`].
pub fn tokenize(source: &Source) -> Vec<Token> {
    Lexer::new(source).collect()
}
