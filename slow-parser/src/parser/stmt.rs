use super::*;

impl<'a, I> Parser<'a, I>
where
    I: Iterator<Item = Token>,
{
    /// Parses a declaration (or statement).
    /// If the statement contains a parse error, the parser skips ahead to the next probable statement.
    pub fn parse_declaration(&mut self) -> Stmt {
        let stmt = match self.current_token.kind {
            TokenKind::Let | TokenKind::Const => self.parse_variable_declaration(),
            TokenKind::Function => self.parse_function_declaration(),
            _ => self.parse_stmt(),
        };

        if self.panicking {
            self.synchronize();
        } else {
            self.eat(TokenKind::Semi);
        }
        stmt
    }

    /// Parses a statement.
    fn parse_stmt(&mut self) -> Stmt {
        match self.current_token.kind {
            TokenKind::Return => self.parse_return_stmt(),
            TokenKind::If => self.parse_if_stmt(),
            TokenKind::Identifier => self.parse_identifier_stmt(),
            TokenKind::CloseParen => {
                let token = self.next();
                self.error(ParseError::UnmatchedDelimiter(')'), token.span);
                Stmt::Error
            }
            _ => {
                self.unexpected("statement");
                self.next();
                Stmt::Error
            }
        }
    }

    /// Parses `{ ... }`. Returns `None` if the opening brace is missing.
    /// The caller is responsible for entering a scope for the block.
    fn parse_block(&mut self) -> Option<Vec<Stmt>> {
        self.nested(None, |this| this.parse_block_body())
    }

    fn parse_block_body(&mut self) -> Option<Vec<Stmt>> {
        let open = self.current_token.clone();
        if !self.expect(TokenKind::OpenBrace) {
            return None;
        }

        let mut body = Vec::new();
        loop {
            match self.current_token.kind {
                TokenKind::CloseBrace => {
                    self.next();
                    break;
                }
                TokenKind::Eof => {
                    self.unclosed(&open, "`}`");
                    break;
                }
                TokenKind::Semi => {
                    self.next();
                }
                _ => body.push(self.parse_declaration()),
            }
        }

        Some(body)
    }

    fn parse_variable_declaration(&mut self) -> Stmt {
        let mutability = match self.next().kind {
            TokenKind::Const => Mutability::Const,
            _ => Mutability::Let,
        };
        let ident = match self.expect_identifier() {
            Some(ident) => ident,
            None => return Stmt::Error,
        };
        if !self.expect(TokenKind::Equals) {
            // Declare anyway so that later uses are not reported as undeclared.
            self.declare(Symbol::new(ident.text, SymbolType::Object, mutability), ident.span);
            return Stmt::Error;
        }

        // The initializer is resolved before the new symbol exists: `let x = x` refers to an outer `x`.
        let initializer = self.parse_expr();
        let value = match &initializer {
            Expr::Literal(literal) => Some(literal.clone()),
            _ => None,
        };
        let symbol = Symbol::new(ident.text.clone(), self.infer_type(&initializer), mutability).with_value(value);
        self.declare(symbol, ident.span);

        Stmt::VariableDeclaration {
            name: ident.text,
            mutability,
            initializer,
        }
    }

    fn parse_function_declaration(&mut self) -> Stmt {
        self.expect(TokenKind::Function);
        let ident = match self.expect_identifier() {
            Some(ident) => ident,
            None => return Stmt::Error,
        };
        // Add symbol first to allow for recursion.
        self.declare(
            Symbol::new(ident.text.clone(), SymbolType::Object, Mutability::Const),
            ident.span,
        );

        let open = self.current_token.clone();
        if !self.expect(TokenKind::OpenParen) {
            return Stmt::Error;
        }

        // parameters and body share one scope
        let parsed = self.with_scope(|this| {
            let parameters = this.parse_parameters(&open)?;
            this.function_depth += 1;
            let body = this.parse_block();
            this.function_depth -= 1;
            Some((parameters, body?))
        });

        match parsed {
            Some((parameters, body)) => Stmt::FunctionDeclaration {
                name: ident.text,
                parameters,
                body,
            },
            None => Stmt::Error,
        }
    }

    /// Parses the parameter list after `open` up to and including the closing `)`.
    /// Every parameter is declared in the current scope.
    fn parse_parameters(&mut self, open: &Token) -> Option<Vec<String>> {
        let mut parameters = Vec::new();
        if self.eat(TokenKind::CloseParen) {
            return Some(parameters);
        }

        loop {
            let ident = self.expect_identifier()?;
            self.declare(
                Symbol::new(ident.text.clone(), SymbolType::Object, Mutability::Let),
                ident.span,
            );
            parameters.push(ident.text);

            if self.eat(TokenKind::CloseParen) {
                break;
            } else if !self.eat(TokenKind::Comma) {
                self.unclosed(open, "`,` or `)`");
                return None;
            }
        }

        Some(parameters)
    }

    fn parse_return_stmt(&mut self) -> Stmt {
        let keyword = self.next();
        if self.function_depth == 0 {
            self.source
                .add_error(SemanticError::ReturnOutsideFunction, keyword.span);
        }

        let kind = self.current_token.kind;
        if matches!(kind, TokenKind::Semi | TokenKind::CloseBrace | TokenKind::Eof)
            || kind.starts_statement()
            || self.at_line_start()
        {
            Stmt::Return(None)
        } else {
            Stmt::Return(Some(self.parse_expr()))
        }
    }

    fn parse_if_stmt(&mut self) -> Stmt {
        self.expect(TokenKind::If);
        let condition = self.parse_expr();
        let then_branch = match self.with_scope(|this| this.parse_block()) {
            Some(body) => body,
            None => return Stmt::Error,
        };

        let else_branch = if !self.eat(TokenKind::Else) {
            None
        } else if self.current_token.kind == TokenKind::If {
            Some(vec![self.nested(Stmt::Error, |this| this.parse_if_stmt())])
        } else {
            match self.with_scope(|this| this.parse_block()) {
                Some(body) => Some(body),
                None => return Stmt::Error,
            }
        };

        Stmt::If {
            condition,
            then_branch,
            else_branch,
        }
    }

    /// Parses a statement starting with an identifier: an assignment, a call or a reference.
    fn parse_identifier_stmt(&mut self) -> Stmt {
        let ident = self.next();

        if self.eat(TokenKind::Equals) {
            if let Some(symbol) = self.resolve(&ident.text, ident.span.clone()) {
                if symbol.mutability == Mutability::Const {
                    self.source.add_error(
                        SemanticError::AssignToConstant(ident.text.clone()),
                        ident.span.clone(),
                    );
                }
            }
            let value = self.parse_expr();
            return Stmt::Assignment {
                target: ident.text,
                value,
            };
        }

        let expr = self.parse_identifier_or_call_expr(ident);
        Stmt::Expr(self.parse_binary_expr(expr, 0))
    }
}
