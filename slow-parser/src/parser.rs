use crate::ast::{Expr, Mutability, Program, Stmt};
use crate::lexer::{Lexer, Token, TokenKind};
use crate::symbol_table::{ScopeId, Symbol, SymbolTable, SymbolType};
use log::debug;
use slow_source::{ParseError, SemanticError, Source};
use std::mem;
use std::ops::Range;

mod expr;
mod stmt;

/// Maximum number of nested expressions and blocks. Deeper input is reported instead of parsed.
pub const MAX_NESTING: usize = 256;

/// Recursive descent parser.
///
/// Tokens are pulled one at a time from `I` (by default a [`Lexer`] over the source), with a single token of
/// look-ahead in `current_token`. Declarations and references are checked against a [`SymbolTable`] while
/// parsing. Errors are reported to the [`Source`] and never abort the parse.
pub struct Parser<'a, I = Lexer<'a>> {
    /// Cached token for peeking.
    current_token: Token,
    /// End of the last consumed token.
    prev_end: usize,
    tokens: I,
    /// Source code
    source: &'a Source<'a>,
    symbols: SymbolTable,
    /// Active scopes, innermost last. Never empty.
    scopes: Vec<ScopeId>,
    /// Number of enclosing function bodies.
    function_depth: u32,
    /// Number of enclosing expressions and blocks, bounded by [`MAX_NESTING`].
    nesting: usize,
    /// Set by the first parse error of a statement and cleared once the parser has resynchronized.
    /// While set, further parse errors are not reported.
    panicking: bool,
}

impl<'a> Parser<'a> {
    pub fn new(source: &'a Source<'a>) -> Self {
        Self::with_tokens(source, Lexer::new(source))
    }
}

impl<'a, I> Parser<'a, I>
where
    I: Iterator<Item = Token>,
{
    /// Create a parser over already lexed `tokens` of `source`.
    pub fn with_tokens(source: &'a Source<'a>, tokens: impl IntoIterator<Item = Token, IntoIter = I>) -> Self {
        let symbols = SymbolTable::new();
        let root = symbols.root();
        let mut parser = Self {
            current_token: Token::new(TokenKind::Eof, "", 0..0),
            prev_end: 0,
            tokens: tokens.into_iter(),
            source,
            symbols,
            scopes: vec![root],
            function_depth: 0,
            nesting: 0,
            panicking: false,
        };
        parser.next();
        parser.prev_end = 0;
        parser
    }

    /// Declares a host provided `const` symbol (e.g. `print`) in the global scope.
    pub fn declare_builtin(&mut self, name: impl Into<String>) -> Result<(), SemanticError> {
        let root = self.symbols.root();
        self.symbols
            .define(root, Symbol::new(name, SymbolType::Object, Mutability::Const))
    }

    pub fn symbol_table(&self) -> &SymbolTable {
        &self.symbols
    }

    /// Consumes the parser and returns every scope created while parsing.
    pub fn into_symbol_table(self) -> SymbolTable {
        self.symbols
    }

    /// The innermost active scope. This is the global scope outside of any block.
    pub fn current_scope(&self) -> ScopeId {
        self.scopes
            .last()
            .copied()
            .unwrap_or_else(|| self.symbols.root())
    }

    pub fn parse_program(&mut self) -> Program {
        let mut statements = Vec::new();
        loop {
            match self.current_token.kind {
                TokenKind::Eof => break,
                TokenKind::Semi => {
                    self.next();
                }
                TokenKind::CloseBrace => {
                    let token = self.next();
                    self.error(ParseError::UnmatchedDelimiter('}'), token.span);
                    self.synchronize();
                }
                _ => statements.push(self.parse_declaration()),
            }
        }
        Program { statements }
    }
}

/// Scopes and symbols
impl<'a, I> Parser<'a, I>
where
    I: Iterator<Item = Token>,
{
    /// Runs `f` inside a new child scope of the current scope.
    fn with_scope<T>(&mut self, f: impl FnOnce(&mut Self) -> T) -> T {
        let scope = self.symbols.enter_scope(self.current_scope());
        debug!("entering scope {:?}", scope);
        self.scopes.push(scope);
        let result = f(self);
        self.scopes.pop();
        debug!("exiting scope {:?}", scope);
        result
    }

    /// Defines `symbol` in the current scope. `span` is the span of the declared name.
    fn declare(&mut self, symbol: Symbol, span: Range<usize>) {
        let scope = self.current_scope();
        debug!("declaring `{}` in scope {:?}", symbol.name, scope);
        if let Err(error) = self.symbols.define(scope, symbol) {
            self.source.add_error(error, span);
        }
    }

    /// Resolves `name` from the current scope, reporting an error if it is not declared.
    fn resolve(&self, name: &str, span: Range<usize>) -> Option<&Symbol> {
        let symbol = self.symbols.resolve(self.current_scope(), name);
        if symbol.is_none() {
            self.source
                .add_error(SemanticError::UndeclaredIdentifier(name.to_string()), span);
        }
        symbol
    }

    /// Best effort type of `expr` for the symbol it initializes.
    fn infer_type(&self, expr: &Expr) -> SymbolType {
        match expr {
            Expr::Literal(literal) => literal.symbol_type(),
            Expr::Identifier(name) => self
                .symbols
                .resolve(self.current_scope(), name)
                .map_or(SymbolType::Object, |symbol| symbol.declared_type),
            Expr::Unary {
                op: TokenKind::Minus,
                arg,
            } => match self.infer_type(arg) {
                ty @ (SymbolType::Int | SymbolType::Float) => ty,
                _ => SymbolType::Object,
            },
            _ => SymbolType::Object,
        }
    }
}

/// Parse utilities
impl<'a, I> Parser<'a, I>
where
    I: Iterator<Item = Token>,
{
    /// Advances to the next token and returns the consumed one.
    /// `Illegal` tokens are skipped, the lexer already reported them.
    fn next(&mut self) -> Token {
        let token = loop {
            match self.tokens.next() {
                Some(token) if token.kind == TokenKind::Illegal => continue,
                Some(token) => break token,
                None => {
                    let end = self.source.content.len();
                    break Token::new(TokenKind::Eof, "", end..end);
                }
            }
        };
        self.prev_end = self.current_token.span.end;
        mem::replace(&mut self.current_token, token)
    }

    /// Predicate that tests whether the current token has the same kind and eats it if yes as a side effect.
    fn eat(&mut self, kind: TokenKind) -> bool {
        if self.current_token.kind == kind {
            self.next(); // eat token
            true
        } else {
            false
        }
    }

    fn expect(&mut self, kind: TokenKind) -> bool {
        if self.eat(kind) {
            true
        } else {
            self.unexpected(kind.to_string());
            false
        }
    }

    fn expect_identifier(&mut self) -> Option<Token> {
        if self.current_token.kind == TokenKind::Identifier {
            Some(self.next())
        } else {
            self.unexpected("identifier");
            None
        }
    }

    /// Raises an unexpected token error.
    fn unexpected(&mut self, expected: impl Into<String>) {
        let error = ParseError::UnexpectedToken {
            expected: expected.into(),
            found: self.current_token.to_string(),
        };
        self.error(error, self.current_token.span.clone());
    }

    /// Reports a missing closing delimiter for `open`.
    /// At end of input this is an unclosed delimiter, otherwise an unexpected token.
    ///
    /// An unclosed delimiter points at `open`, away from any earlier error of the statement,
    /// so it is reported even in panic mode.
    fn unclosed(&mut self, open: &Token, expected: &str) {
        if self.current_token.kind == TokenKind::Eof {
            let delimiter = match open.kind {
                TokenKind::OpenBrace => '{',
                _ => '(',
            };
            self.panicking = true;
            self.source
                .add_error(ParseError::UnclosedDelimiter(delimiter), open.span.clone());
        } else {
            self.unexpected(expected);
        }
    }

    /// Runs `f` one nesting level deeper.
    /// Past [`MAX_NESTING`] levels, reports [`ParseError::NestingTooDeep`] at the current token and returns
    /// `too_deep` without consuming anything.
    fn nested<T>(&mut self, too_deep: T, f: impl FnOnce(&mut Self) -> T) -> T {
        if self.nesting >= MAX_NESTING {
            self.error(
                ParseError::NestingTooDeep(MAX_NESTING),
                self.current_token.span.clone(),
            );
            return too_deep;
        }
        self.nesting += 1;
        let result = f(self);
        self.nesting -= 1;
        result
    }

    /// Reports a parse error unless one was already reported for the current statement.
    fn error(&mut self, error: ParseError, span: Range<usize>) {
        if self.panicking {
            return;
        }
        self.panicking = true;
        self.source.add_error(error, span);
    }

    /// Returns `true` if a line break separates the current token from the previous one.
    fn at_line_start(&self) -> bool {
        self.source
            .content
            .get(self.prev_end..self.current_token.span.start)
            .map_or(false, |gap| gap.contains('\n'))
    }

    /// Skips tokens until the probable start of the next statement.
    /// Stops after a `;`, or before a `}`, a statement keyword, a token on a new line or the end of input.
    /// Blocks opened while skipping are skipped as a whole.
    fn synchronize(&mut self) {
        let mut depth = 0usize;
        loop {
            match self.current_token.kind {
                TokenKind::Eof => break,
                TokenKind::CloseBrace if depth == 0 => break,
                TokenKind::CloseBrace => depth -= 1,
                TokenKind::OpenBrace => depth += 1,
                TokenKind::Semi if depth == 0 => {
                    self.next();
                    break;
                }
                kind if depth == 0 && (kind.starts_statement() || self.at_line_start()) => break,
                _ => {}
            }
            debug!("skipping {} while recovering", self.current_token);
            self.next();
        }
        self.panicking = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::Literal;
    use crate::lexer::tokenize;
    use insta::assert_debug_snapshot;
    use slow_source::{CompileError, Diagnostic};

    fn parse(source: &str) -> (Program, Vec<Diagnostic>) {
        let source = Source::new(source);
        let program = Parser::new(&source).parse_program();
        (program, source.into_diagnostics())
    }

    fn errors(source: &str) -> Vec<CompileError> {
        parse(source).1.into_iter().map(|d| d.error).collect()
    }

    #[test]
    fn test_empty_program() {
        assert_eq!(parse(""), (Program::default(), Vec::new()));
        assert_eq!(parse(" ;; // nothing\n"), (Program::default(), Vec::new()));
    }

    #[test]
    fn test_let_declaration() {
        let source = Source::new("let x = 5");
        let mut parser = Parser::new(&source);
        let program = parser.parse_program();
        assert!(source.has_no_errors());
        assert_debug_snapshot!(program, @r###"
        Program {
            statements: [
                VariableDeclaration {
                    name: "x",
                    mutability: Let,
                    initializer: Literal(
                        Int(
                            5,
                        ),
                    ),
                },
            ],
        }
        "###);

        let scope = parser.current_scope();
        assert_eq!(scope, parser.symbol_table().root());
        let symbol = parser.symbol_table().resolve(scope, "x").unwrap();
        assert_eq!(symbol.declared_type, SymbolType::Int);
        assert_eq!(symbol.value, Some(Literal::Int(5)));
        assert_eq!(symbol.mutability, Mutability::Let);
    }

    #[test]
    fn test_statements_in_source_order() {
        let (program, diagnostics) = parse("let a = 1\nconst b = 2; a = b\nfunction f() {}\nf()");
        assert!(diagnostics.is_empty(), "{:?}", diagnostics);
        let names: Vec<_> = program
            .statements
            .iter()
            .map(|stmt| match stmt {
                Stmt::VariableDeclaration { name, .. } => name.as_str(),
                Stmt::Assignment { target, .. } => target.as_str(),
                Stmt::FunctionDeclaration { name, .. } => name.as_str(),
                Stmt::Expr(Expr::FunctionCall { callee, .. }) => callee.as_str(),
                stmt => panic!("unexpected statement {:?}", stmt),
            })
            .collect();
        assert_eq!(names, ["a", "b", "a", "f", "f"]);
    }

    #[test]
    fn test_idempotent() {
        let input = "const pi = 3.14\nfunction area(r) { return pi * r ^ 2 }\nlet a = area(2) + 1";
        let source = Source::new(input);
        let tokens = tokenize(&source);

        let first = Parser::with_tokens(&source, tokens.clone()).parse_program();
        let second = Parser::with_tokens(&source, tokens).parse_program();
        assert!(source.has_no_errors());
        assert_eq!(first, second);
        assert_eq!(first, parse(input).0);
    }

    #[test]
    fn test_illegal_tokens_are_skipped() {
        let (program, diagnostics) = parse("let x = 1 @\nlet y = x");
        assert_eq!(program.statements.len(), 2);
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(
            diagnostics[0].error,
            CompileError::Lex(slow_source::LexError::IllegalCharacter("@".to_string()))
        );
    }

    #[test]
    fn test_unmatched_close_brace() {
        let (program, diagnostics) = parse("let x = 1\n}\nlet y = 2");
        assert_eq!(program.statements.len(), 2);
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(
            diagnostics[0].error,
            CompileError::Parse(ParseError::UnmatchedDelimiter('}'))
        );
        assert_eq!(diagnostics[0].position.line, 2);
    }

    #[test]
    fn test_recovery_reports_every_broken_statement() {
        let input = "let a = 1\n\
                     let = 2\n\
                     let b = 3\n\
                     const c 4\n\
                     b = a +\n\
                     let d = (a\n\
                     a = d";
        let (program, diagnostics) = parse(input);

        let lines: Vec<_> = diagnostics.iter().map(|d| d.position.line).collect();
        assert_eq!(lines, [2, 4, 6, 7], "{:#?}", diagnostics);
        assert!(diagnostics
            .iter()
            .all(|d| matches!(d.error, CompileError::Parse(ParseError::UnexpectedToken { .. }))));

        // valid statements survive
        assert!(program.statements.contains(&Stmt::VariableDeclaration {
            name: "b".to_string(),
            mutability: Mutability::Let,
            initializer: Expr::Literal(Literal::Int(3)),
        }));
        assert_eq!(
            program.statements.last(),
            Some(&Stmt::Assignment {
                target: "a".to_string(),
                value: Expr::Identifier("d".to_string()),
            })
        );
    }

    #[test]
    fn test_semicolon_recovery() {
        // the error token is followed by `;` on the same line; the next statement is kept
        let (program, diagnostics) = parse("let x = ; let y = 2; y = 3");
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(program.statements.len(), 3);
        assert_eq!(
            program.statements[2],
            Stmt::Assignment {
                target: "y".to_string(),
                value: Expr::Literal(Literal::Int(3)),
            }
        );
    }

    #[test]
    fn test_unexpected_statement_start() {
        assert_eq!(
            errors("5 + 3"),
            [CompileError::Parse(ParseError::UnexpectedToken {
                expected: "statement".to_string(),
                found: "integer literal `5`".to_string(),
            })]
        );
        assert_eq!(
            errors("foo)\nlet x = 1"),
            [
                CompileError::Semantic(SemanticError::UndeclaredIdentifier("foo".to_string())),
                CompileError::Parse(ParseError::UnmatchedDelimiter(')')),
            ]
        );
    }

    #[test]
    fn test_partial_program_on_errors() {
        let (program, diagnostics) = parse("let = = =");
        assert_eq!(program.statements, [Stmt::Error]);
        assert_eq!(diagnostics.len(), 1);
    }

    #[test]
    fn test_deep_nesting_is_reported() {
        let too_deep = [CompileError::Parse(ParseError::NestingTooDeep(MAX_NESTING))];

        let parens = format!("let x = {}1", "(".repeat(100_000));
        assert_eq!(errors(&parens), too_deep);

        let negations = format!("let x = {}1", "-".repeat(100_000));
        assert_eq!(errors(&negations), too_deep);

        let blocks = format!("{}{}", "if 1 {\n".repeat(10_000), "}\n".repeat(10_000));
        let (program, diagnostics) = parse(&blocks);
        assert_eq!(
            diagnostics.into_iter().map(|d| d.error).collect::<Vec<_>>(),
            too_deep
        );
        assert_eq!(program.statements.len(), 1);

        let else_ifs = format!("let a = 1\nif a {{}}{}", " else if a {}".repeat(10_000));
        assert_eq!(errors(&else_ifs).first(), too_deep.first());

        // the parser is usable again after the deep statement
        let (program, diagnostics) = parse(&format!("{}\nlet y = 2", parens));
        assert_eq!(diagnostics.len(), 1);
        assert!(matches!(
            program.statements.last(),
            Some(Stmt::VariableDeclaration { name, .. }) if name == "y"
        ));
    }

    #[test]
    fn test_nesting_below_limit() {
        let depth = MAX_NESTING - 1;
        let source = format!("let x = {}1{}", "(".repeat(depth), ")".repeat(depth));
        assert!(errors(&source).is_empty());
    }
}
