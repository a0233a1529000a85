use super::*;
use crate::ast::Literal;
use crate::lexer::PREFIX_BP;

impl<'a, I> Parser<'a, I>
where
    I: Iterator<Item = Token>,
{
    /* Expressions */
    /// Parses any expression.
    /// This is equivalent to calling [`Self::parse_expr_bp`] with `min_bp = 0`.
    pub fn parse_expr(&mut self) -> Expr {
        self.parse_expr_bp(0) // 0 to accept any expression
    }

    /// Parses a primary (atom) expression.
    fn parse_primary_expr(&mut self) -> Expr {
        // NOTE: prefix operators are handled here
        match self.current_token.kind {
            TokenKind::Int | TokenKind::Float | TokenKind::String => self.parse_literal_expr(),
            TokenKind::Identifier => {
                let ident = self.next();
                self.parse_identifier_or_call_expr(ident)
            }
            TokenKind::OpenParen => self.parse_grouping_expr(),
            TokenKind::Minus | TokenKind::Bang => {
                let op = self.next().kind;
                Expr::Unary {
                    op,
                    arg: Box::new(self.parse_expr_bp(PREFIX_BP)),
                }
            }
            _ => {
                self.unexpected("expression");
                Expr::Error
            }
        }
    }

    /// Parses an expression with the specified `min_bp`.
    /// To parse any expression use, [`Self::parse_expr`].
    fn parse_expr_bp(&mut self, min_bp: u8) -> Expr {
        self.nested(Expr::Error, |this| {
            let lhs = this.parse_primary_expr();
            this.parse_binary_expr(lhs, min_bp)
        })
    }

    /// Parses the binary operators following an already parsed `lhs`.
    pub(super) fn parse_binary_expr(&mut self, mut lhs: Expr, min_bp: u8) -> Expr {
        loop {
            let (l_bp, r_bp) = match self.current_token.kind.binop_bp() {
                Some(bp) => bp,
                None => break, // not a valid binop, stop parsing
            };
            if l_bp < min_bp {
                break; // less than the min_bp, stop parsing
            }

            // self.current_token is a valid binop
            let op = self.next().kind;

            let rhs = self.parse_expr_bp(r_bp);

            lhs = Expr::Binary {
                lhs: Box::new(lhs),
                op,
                rhs: Box::new(rhs),
            }
        }

        lhs
    }

    /* Expressions.Literals */
    /// Parses a literal expression.
    /// A literal can be an integer, a float or a string literal.
    fn parse_literal_expr(&mut self) -> Expr {
        let token = self.next();
        let literal = match token.kind {
            TokenKind::Int => token.text.parse().ok().map(Literal::Int),
            TokenKind::Float => token.text.parse().ok().map(Literal::Float),
            TokenKind::String => Some(Literal::String(token.text.clone())),
            _ => None,
        };
        match literal {
            Some(literal) => Expr::Literal(literal),
            None => {
                self.error(ParseError::InvalidLiteral(token.text), token.span);
                Expr::Error
            }
        }
    }

    /* Expressions.Identifier */
    /// Parses an identifier or a call expression. `ident` is the already consumed identifier token.
    pub(super) fn parse_identifier_or_call_expr(&mut self, ident: Token) -> Expr {
        self.resolve(&ident.text, ident.span.clone());

        if self.current_token.kind != TokenKind::OpenParen {
            // parse identifier expression
            return Expr::Identifier(ident.text);
        }

        // parse call expression
        let open = self.next();
        let mut arguments = Vec::new();

        if !self.eat(TokenKind::CloseParen) {
            loop {
                arguments.push(self.parse_expr());

                if self.eat(TokenKind::CloseParen) {
                    break;
                } else if !self.eat(TokenKind::Comma) {
                    self.unclosed(&open, "`,` or `)`");
                    break;
                }
            }
        }

        Expr::FunctionCall {
            callee: ident.text,
            arguments,
        }
    }

    /// Parses a parenthesized expression.
    fn parse_grouping_expr(&mut self) -> Expr {
        let open = self.next();
        let expr = self.parse_expr();
        if !self.eat(TokenKind::CloseParen) {
            self.unclosed(&open, "`)`");
        }
        expr
    }
}
