//! Expression parsing by precedence climbing.
//!
//! One method per precedence level, from loosest to tightest:
//!
//! | Level | Operators | Associativity |
//! |-------|-----------|---------------|
//! | assignment | `=` | right |
//! | logical or | `\|\|` | left |
//! | logical and | `&&` | left |
//! | equality | `==` `!=` | left |
//! | relational | `<` `<=` `>` `>=` | left |
//! | bitwise or | `\|` | left |
//! | bitwise xor | `^` | left |
//! | bitwise and | `&` | left |
//! | shift | `<<` `>>` | left |
//! | additive | `+` `-` | left |
//! | multiplicative | `*` `/` `%` | left |
//! | cast | `as` | left |
//! | unary prefix | `!` `-` `~` `*` `&` | right |
//! | postfix | call, `.member`, `[index]` | left |
//!
//! Each level loops on its own operators and delegates to the next-tighter
//! level, which keeps the grammar free of left recursion while producing
//! left-associative trees.

use emc_lex::TokenKind;

use crate::ast::*;
use crate::{PResult, Parser};

impl<'a> Parser<'a> {
    /// Entry point: parses a full expression.
    pub(crate) fn parse_expression(&mut self) -> PResult<Expr> {
        self.parse_assignment()
    }

    /// Assignment is right-associative and its target must be an lvalue
    /// (identifier or dereference). An invalid target is reported but the
    /// node is still constructed so later passes can surface related errors.
    fn parse_assignment(&mut self) -> PResult<Expr> {
        let expr = self.parse_logical_or()?;

        if self.match_kind(TokenKind::Eq) {
            let value = self.parse_assignment()?;

            if !matches!(expr, Expr::Identifier(_) | Expr::Deref(_)) {
                self.error_at("invalid assignment target", expr.span());
            }

            let span = expr.span();
            return Ok(Expr::Assign(AssignExpr {
                id: self.fresh_id(),
                span,
                target: Box::new(expr),
                value: Box::new(value),
            }));
        }

        Ok(expr)
    }

    fn parse_logical_or(&mut self) -> PResult<Expr> {
        let mut expr = self.parse_logical_and()?;
        while self.match_kind(TokenKind::OrOr) {
            let right = self.parse_logical_and()?;
            expr = self.binary(expr, BinOp::Or, right);
        }
        Ok(expr)
    }

    fn parse_logical_and(&mut self) -> PResult<Expr> {
        let mut expr = self.parse_equality()?;
        while self.match_kind(TokenKind::AndAnd) {
            let right = self.parse_equality()?;
            expr = self.binary(expr, BinOp::And, right);
        }
        Ok(expr)
    }

    fn parse_equality(&mut self) -> PResult<Expr> {
        let mut expr = self.parse_relational()?;
        loop {
            let op = match self.current_token().kind {
                TokenKind::EqEq => BinOp::Eq,
                TokenKind::NotEq => BinOp::Ne,
                _ => break,
            };
            self.advance();
            let right = self.parse_relational()?;
            expr = self.binary(expr, op, right);
        }
        Ok(expr)
    }

    fn parse_relational(&mut self) -> PResult<Expr> {
        let mut expr = self.parse_bit_or()?;
        loop {
            let op = match self.current_token().kind {
                TokenKind::Lt => BinOp::Lt,
                TokenKind::LtEq => BinOp::Le,
                TokenKind::Gt => BinOp::Gt,
                TokenKind::GtEq => BinOp::Ge,
                _ => break,
            };
            self.advance();
            let right = self.parse_bit_or()?;
            expr = self.binary(expr, op, right);
        }
        Ok(expr)
    }

    fn parse_bit_or(&mut self) -> PResult<Expr> {
        let mut expr = self.parse_bit_xor()?;
        while self.match_kind(TokenKind::Pipe) {
            let right = self.parse_bit_xor()?;
            expr = self.binary(expr, BinOp::BitOr, right);
        }
        Ok(expr)
    }

    fn parse_bit_xor(&mut self) -> PResult<Expr> {
        let mut expr = self.parse_bit_and()?;
        while self.match_kind(TokenKind::Caret) {
            let right = self.parse_bit_and()?;
            expr = self.binary(expr, BinOp::BitXor, right);
        }
        Ok(expr)
    }

    fn parse_bit_and(&mut self) -> PResult<Expr> {
        let mut expr = self.parse_shift()?;
        while self.match_kind(TokenKind::Amp) {
            let right = self.parse_shift()?;
            expr = self.binary(expr, BinOp::BitAnd, right);
        }
        Ok(expr)
    }

    fn parse_shift(&mut self) -> PResult<Expr> {
        let mut expr = self.parse_additive()?;
        loop {
            let op = match self.current_token().kind {
                TokenKind::Shl => BinOp::Shl,
                TokenKind::Shr => BinOp::Shr,
                _ => break,
            };
            self.advance();
            let right = self.parse_additive()?;
            expr = self.binary(expr, op, right);
        }
        Ok(expr)
    }

    fn parse_additive(&mut self) -> PResult<Expr> {
        let mut expr = self.parse_multiplicative()?;
        loop {
            let op = match self.current_token().kind {
                TokenKind::Plus => BinOp::Add,
                TokenKind::Minus => BinOp::Sub,
                _ => break,
            };
            self.advance();
            let right = self.parse_multiplicative()?;
            expr = self.binary(expr, op, right);
        }
        Ok(expr)
    }

    fn parse_multiplicative(&mut self) -> PResult<Expr> {
        let mut expr = self.parse_cast()?;
        loop {
            let op = match self.current_token().kind {
                TokenKind::Star => BinOp::Mul,
                TokenKind::Slash => BinOp::Div,
                TokenKind::Percent => BinOp::Mod,
                _ => break,
            };
            self.advance();
            let right = self.parse_cast()?;
            expr = self.binary(expr, op, right);
        }
        Ok(expr)
    }

    /// `operand as type`, chainable: `x as int64 as double`
    fn parse_cast(&mut self) -> PResult<Expr> {
        let mut expr = self.parse_unary()?;
        while self.match_kind(TokenKind::As) {
            let target_type = self.parse_type_in_expr()?;
            let span = expr.span();
            expr = Expr::Cast(CastExpr {
                id: self.fresh_id(),
                span,
                operand: Box::new(expr),
                target_type,
            });
        }
        Ok(expr)
    }

    /// Prefix operators: `!` `-` `~`, plus pointer `*` and `&`.
    fn parse_unary(&mut self) -> PResult<Expr> {
        let span = self.current_token().span();

        let op = match self.current_token().kind {
            TokenKind::Not => Some(UnOp::Not),
            TokenKind::Minus => Some(UnOp::Neg),
            TokenKind::Tilde => Some(UnOp::BitNot),
            _ => None,
        };
        if let Some(op) = op {
            self.advance();
            let operand = self.parse_unary()?;
            return Ok(Expr::Unary(UnaryExpr {
                id: self.fresh_id(),
                span,
                op,
                operand: Box::new(operand),
            }));
        }

        if self.match_kind(TokenKind::Star) {
            let operand = self.parse_unary()?;
            return Ok(Expr::Deref(DerefExpr {
                id: self.fresh_id(),
                span,
                operand: Box::new(operand),
            }));
        }

        if self.match_kind(TokenKind::Amp) {
            let operand = self.parse_unary()?;
            return Ok(Expr::AddrOf(AddrOfExpr {
                id: self.fresh_id(),
                span,
                operand: Box::new(operand),
            }));
        }

        self.parse_postfix()
    }

    /// Postfix forms chain greedily: calls, member access, indexing.
    ///
    /// A call targets only a named function: when the callee is anything but
    /// a plain identifier, the arguments are still consumed (to keep the
    /// cursor sane) but an error is recorded and the callee expression is
    /// kept unchanged.
    fn parse_postfix(&mut self) -> PResult<Expr> {
        let mut expr = self.parse_primary()?;

        loop {
            if self.match_kind(TokenKind::LParen) {
                let arguments = self.parse_argument_list()?;
                self.consume(TokenKind::RParen, "expected ')' after arguments")?;

                if let Expr::Identifier(ident) = &expr {
                    let span = ident.span;
                    let callee = ident.name.clone();
                    expr = Expr::Call(CallExpr {
                        id: self.fresh_id(),
                        span,
                        callee,
                        arguments,
                    });
                } else {
                    self.error_at("invalid function call target", expr.span());
                }
            } else if self.match_kind(TokenKind::Dot) {
                let member = self.consume(TokenKind::Identifier, "expected member name after '.'")?;
                let span = expr.span();
                expr = Expr::Member(MemberExpr {
                    id: self.fresh_id(),
                    span,
                    object: Box::new(expr),
                    member: member.lexeme,
                });
            } else if self.match_kind(TokenKind::LBracket) {
                let index = self.parse_expression()?;
                self.consume(TokenKind::RBracket, "expected ']' after index")?;
                let span = expr.span();
                expr = Expr::Index(IndexExpr {
                    id: self.fresh_id(),
                    span,
                    object: Box::new(expr),
                    index: Box::new(index),
                });
            } else {
                break;
            }
        }

        Ok(expr)
    }

    /// `(expr, expr, ...)` - parentheses consumed by the caller
    fn parse_argument_list(&mut self) -> PResult<Vec<Expr>> {
        let mut arguments = Vec::new();
        if !self.check(TokenKind::RParen) {
            loop {
                arguments.push(self.parse_expression()?);
                if !self.match_kind(TokenKind::Comma) {
                    break;
                }
            }
        }
        Ok(arguments)
    }

    /// Literals, identifiers, parenthesised expressions, array and object
    /// literals.
    fn parse_primary(&mut self) -> PResult<Expr> {
        let token = self.current_token().clone();
        let span = token.span();

        let lit_kind = match token.kind {
            TokenKind::Int => Some(LitKind::Int),
            TokenKind::Float => Some(LitKind::Float),
            TokenKind::Char => Some(LitKind::Char),
            TokenKind::Str => Some(LitKind::Str),
            TokenKind::Bool => Some(LitKind::Bool),
            TokenKind::Null => Some(LitKind::Null),
            _ => None,
        };
        if let Some(kind) = lit_kind {
            self.advance();
            return Ok(Expr::Literal(LiteralExpr {
                id: self.fresh_id(),
                span,
                kind,
                value: token.lexeme,
            }));
        }

        match token.kind {
            TokenKind::Identifier => {
                self.advance();
                Ok(Expr::Identifier(IdentifierExpr {
                    id: self.fresh_id(),
                    span,
                    name: token.lexeme,
                }))
            },
            TokenKind::LParen => {
                self.advance();
                let expr = self.parse_expression()?;
                self.consume(TokenKind::RParen, "expected ')' after expression")?;
                Ok(expr)
            },
            TokenKind::LBracket => self.parse_array_literal(),
            TokenKind::LBrace => self.parse_object_literal(),
            _ => Err(self.error_here("expected expression")),
        }
    }

    /// `[a, b, c]`
    fn parse_array_literal(&mut self) -> PResult<Expr> {
        let open = self.consume(TokenKind::LBracket, "expected '['")?;

        let mut elements = Vec::new();
        if !self.check(TokenKind::RBracket) {
            loop {
                elements.push(self.parse_expression()?);
                if !self.match_kind(TokenKind::Comma) {
                    break;
                }
            }
        }
        self.consume(TokenKind::RBracket, "expected ']' after array elements")?;

        Ok(Expr::Array(ArrayExpr {
            id: self.fresh_id(),
            span: open.span(),
            elements,
        }))
    }

    /// `{ key: value, ... }` in expression position
    fn parse_object_literal(&mut self) -> PResult<Expr> {
        let open = self.consume(TokenKind::LBrace, "expected '{'")?;

        let mut fields = Vec::new();
        if !self.check(TokenKind::RBrace) {
            loop {
                let key = self.consume(TokenKind::Identifier, "expected field name")?;
                self.consume(TokenKind::Colon, "expected ':' after field name")?;
                let value = self.parse_expression()?;
                fields.push((key.lexeme, value));
                if !self.match_kind(TokenKind::Comma) {
                    break;
                }
            }
        }
        self.consume(TokenKind::RBrace, "expected '}' after object fields")?;

        Ok(Expr::Object(ObjectExpr {
            id: self.fresh_id(),
            span: open.span(),
            fields,
        }))
    }

    fn binary(&mut self, left: Expr, op: BinOp, right: Expr) -> Expr {
        let span = left.span();
        Expr::Binary(BinaryExpr {
            id: self.fresh_id(),
            span,
            op,
            left: Box::new(left),
            right: Box::new(right),
        })
    }
}
