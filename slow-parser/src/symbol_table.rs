//! Lexically scoped symbol table.
//!
//! Scopes live in an arena owned by the [`SymbolTable`] and are addressed with [`ScopeId`]s.
//! A scope only knows its parent through an index, so lookups can walk outwards while
//! ownership stays with the table.

use indexmap::IndexMap;
use slow_source::SemanticError;

use crate::ast::{Literal, Mutability};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SymbolType {
    Int,
    Float,
    String,
    /// Functions, parameters and anything whose type is not known while parsing.
    Object,
}

/// Represents a symbol (created using `let`, `const` or `function` declaration statement).
#[derive(Debug, Clone, PartialEq)]
pub struct Symbol {
    pub name: String,
    pub declared_type: SymbolType,
    /// The initializer, if it is a literal.
    pub value: Option<Literal>,
    pub mutability: Mutability,
}

impl Symbol {
    pub fn new(name: impl Into<String>, declared_type: SymbolType, mutability: Mutability) -> Self {
        Self {
            name: name.into(),
            declared_type,
            value: None,
            mutability,
        }
    }

    pub fn with_value(mut self, value: Option<Literal>) -> Self {
        self.value = value;
        self
    }
}

/// Handle to a scope inside a [`SymbolTable`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ScopeId(usize);

#[derive(Debug, Clone, Default)]
struct Scope {
    /// Symbols in declaration order.
    symbols: IndexMap<String, Symbol>,
    parent: Option<ScopeId>,
}

#[derive(Debug, Clone)]
pub struct SymbolTable {
    scopes: Vec<Scope>,
}

impl SymbolTable {
    /// Creates a table containing only the root (global) scope.
    pub fn new() -> Self {
        Self {
            scopes: vec![Scope::default()],
        }
    }

    pub fn root(&self) -> ScopeId {
        ScopeId(0)
    }

    /// Creates a new empty scope whose lookups fall back to `parent`.
    pub fn enter_scope(&mut self, parent: ScopeId) -> ScopeId {
        let id = ScopeId(self.scopes.len());
        self.scopes.push(Scope {
            symbols: IndexMap::new(),
            parent: Some(parent),
        });
        id
    }

    pub fn parent(&self, scope: ScopeId) -> Option<ScopeId> {
        self.scopes[scope.0].parent
    }

    /// Inserts `symbol` into `scope`.
    ///
    /// # Errors
    /// Returns [`SemanticError::DuplicateDeclaration`] if `scope` itself already has a symbol with the same name.
    /// Symbols of enclosing scopes are shadowed, not reported.
    pub fn define(&mut self, scope: ScopeId, symbol: Symbol) -> Result<(), SemanticError> {
        let symbols = &mut self.scopes[scope.0].symbols;
        if symbols.contains_key(&symbol.name) {
            return Err(SemanticError::DuplicateDeclaration(symbol.name));
        }
        symbols.insert(symbol.name.clone(), symbol);
        Ok(())
    }

    /// Looks up `name` in `scope` and then in every enclosing scope.
    /// Returns `None` if the root scope is exhausted.
    pub fn resolve(&self, scope: ScopeId, name: &str) -> Option<&Symbol> {
        let mut current = Some(scope);
        while let Some(id) = current {
            let scope = &self.scopes[id.0];
            if let Some(symbol) = scope.symbols.get(name) {
                return Some(symbol);
            }
            current = scope.parent;
        }
        None
    }

    /// Looks up `name` in `scope` only.
    pub fn resolve_local(&self, scope: ScopeId, name: &str) -> Option<&Symbol> {
        self.scopes[scope.0].symbols.get(name)
    }

    /// Every scope in creation order, starting with the root.
    pub fn scopes(&self) -> impl Iterator<Item = ScopeId> {
        (0..self.scopes.len()).map(ScopeId)
    }

    /// Symbols declared directly in `scope`, in declaration order.
    pub fn symbols(&self, scope: ScopeId) -> impl Iterator<Item = &Symbol> {
        self.scopes[scope.0].symbols.values()
    }
}

impl Default for SymbolTable {
    fn default() -> Self {
        Self::new()
    }
}
