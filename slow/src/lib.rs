//! Entry points tying the lexer, parser and symbol table together.

use log::{debug, warn};
use slow_parser::ast::Program;
use slow_parser::lexer::Token;
use slow_parser::parser::Parser;
use slow_parser::symbol_table::SymbolTable;
use slow_source::Source;

pub use slow_parser::{ast, lexer, symbol_table};
pub use slow_source::{
    CompileError, Diagnostic, DiagnosticKind, LexError, ParseError, Position, SemanticError,
};

/// Everything produced by checking one source text.
#[derive(Debug)]
pub struct Analysis {
    /// The (possibly partial) AST.
    pub program: Program,
    /// Every scope created while parsing. Global symbols live in [`SymbolTable::root`].
    pub symbols: SymbolTable,
    /// Lexing, parsing and semantic errors in the order they were found.
    pub diagnostics: Vec<Diagnostic>,
}

impl Analysis {
    pub fn has_errors(&self) -> bool {
        !self.diagnostics.is_empty()
    }
}

/// Lexes, parses and checks `content`. `builtins` are predeclared as global constants.
pub fn analyze(content: &str, builtins: &[impl AsRef<str>]) -> Analysis {
    let source = Source::new(content);
    let mut parser = Parser::new(&source);
    for builtin in builtins {
        if let Err(error) = parser.declare_builtin(builtin.as_ref()) {
            warn!("ignoring builtin: {}", error);
        }
    }

    let program = parser.parse_program();
    let symbols = parser.into_symbol_table();
    debug!(
        "parsed {} top level statements with {} diagnostics",
        program.statements.len(),
        source.errors.len()
    );
    if !source.has_no_errors() {
        debug!("diagnostics:\n{}", source.errors);
    }
    let diagnostics = source.into_diagnostics();

    Analysis {
        program,
        symbols,
        diagnostics,
    }
}

/// Parses `content`, returning the AST only if no error of any kind was found.
pub fn parse(content: &str) -> Result<Program, Vec<Diagnostic>> {
    let analysis = analyze(content, &[] as &[&str]);
    if analysis.has_errors() {
        Err(analysis.diagnostics)
    } else {
        Ok(analysis.program)
    }
}

/// Lexes `content` into tokens (ending with `Eof`) and the lexing errors found on the way.
pub fn tokenize(content: &str) -> (Vec<Token>, Vec<Diagnostic>) {
    let source = Source::new(content);
    let tokens = slow_parser::lexer::tokenize(&source);
    (tokens, source.into_diagnostics())
}

/// Renders `diagnostic` with the offending line of `content` and a caret underline.
///
/// ```text
/// parse error: expected `=`, found integer literal `5`
///  --> 1:7
///   |
/// 1 | let x 5
///   |       ^
/// ```
pub fn render_diagnostic(content: &str, diagnostic: &Diagnostic) -> String {
    let source = Source::new(content);
    let position = diagnostic.position;
    let gutter = position.line.to_string().len();

    let mut rendered = format!(
        "{} error: {}\n{:gutter$}--> {}\n",
        diagnostic.kind(),
        diagnostic.error,
        "",
        position
    );

    if let Some(line) = source.line(position.line) {
        let width = content
            .get(diagnostic.span.clone())
            .and_then(|text| text.lines().next())
            .map_or(0, |text| text.chars().count())
            .max(1);
        rendered.push_str(&format!("{:gutter$} |\n", ""));
        rendered.push_str(&format!("{} | {}\n", position.line, line));
        rendered.push_str(&format!(
            "{:gutter$} | {}{}\n",
            "",
            " ".repeat(position.column - 1),
            "^".repeat(width)
        ));
    }

    rendered
}
