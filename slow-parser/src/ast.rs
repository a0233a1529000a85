use crate::lexer::TokenKind;
use crate::symbol_table::SymbolType;

#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    Int(i64),
    Float(f64),
    String(String),
}

impl Literal {
    pub fn symbol_type(&self) -> SymbolType {
        match self {
            Literal::Int(_) => SymbolType::Int,
            Literal::Float(_) => SymbolType::Float,
            Literal::String(_) => SymbolType::String,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Mutability {
    /// Declared with `const`. Cannot be assigned to.
    Const,
    /// Declared with `let`.
    Let,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Literal(Literal),
    /// An identifier (e.g. `foo`).
    Identifier(String),
    /// A function call (e.g. `foo(1, bar)`).
    FunctionCall {
        callee: String,
        arguments: Vec<Expr>,
    },
    /// A binary expression (e.g. `1+1`).
    Binary {
        lhs: Box<Expr>,
        op: TokenKind,
        rhs: Box<Expr>,
    },
    /// A prefix expression (e.g. `-x` or `!x`).
    Unary {
        op: TokenKind,
        arg: Box<Expr>,
    },
    Error,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Stmt {
    /// `let x = ...` or `const x = ...`
    VariableDeclaration {
        name: String,
        mutability: Mutability,
        initializer: Expr,
    },
    /// `x = ...`
    Assignment {
        target: String,
        value: Expr,
    },
    FunctionDeclaration {
        name: String,
        parameters: Vec<String>,
        body: Vec<Stmt>,
    },
    /// An expression used as a statement. Always starts with an identifier (e.g. `foo(1)`).
    Expr(Expr),
    Return(Option<Expr>),
    If {
        condition: Expr,
        then_branch: Vec<Stmt>,
        /// `else if` is represented as a single nested `Stmt::If`.
        else_branch: Option<Vec<Stmt>>,
    },
    Error,
}

/// The root of the AST.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Program {
    /// Top level statements in source order.
    pub statements: Vec<Stmt>,
}
