//! Lexer, parser and symbol table for the `slow` scripting language.

pub mod ast;
pub mod lexer;
pub mod parser;
pub mod symbol_table;
