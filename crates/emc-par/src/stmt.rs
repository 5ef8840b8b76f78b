//! Statement and declaration parsing.
//!
//! Statements dispatch on their leading token. Declarations (`let`/`const`,
//! `function`, `extern function`) are statements at the grammar level, so
//! they parse here too.

use emc_lex::TokenKind;

use crate::ast::*;
use crate::{PResult, Parser};

impl<'a> Parser<'a> {
    /// Parses a single statement.
    pub(crate) fn parse_statement(&mut self) -> PResult<Stmt> {
        match self.current_token().kind {
            TokenKind::Let | TokenKind::Const => self.parse_var_decl(),
            TokenKind::Function => self.parse_fn_decl(),
            TokenKind::Extern => self.parse_extern_fn_decl(),
            TokenKind::If => self.parse_if(),
            TokenKind::While => self.parse_while(),
            TokenKind::For => self.parse_for(),
            TokenKind::Return => self.parse_return(),
            TokenKind::LBrace => Ok(Stmt::Block(self.parse_block()?)),
            _ => self.parse_expr_stmt(),
        }
    }

    /// `let name (: type)? (= init)? ;` or `const ...`
    fn parse_var_decl(&mut self) -> PResult<Stmt> {
        let is_const = self.match_kind(TokenKind::Const);
        if !is_const {
            self.consume(TokenKind::Let, "expected 'let' or 'const'")?;
        }
        let keyword_span = self.previous().span();

        let name = self.consume(TokenKind::Identifier, "expected variable name")?;

        let ty = if self.match_kind(TokenKind::Colon) {
            Some(self.parse_type()?)
        } else {
            None
        };

        let initializer = if self.match_kind(TokenKind::Eq) {
            Some(self.parse_expression()?)
        } else {
            None
        };

        self.consume(TokenKind::Semicolon, "expected ';' after variable declaration")?;

        Ok(Stmt::VarDecl(VarDecl {
            span: keyword_span,
            name: name.lexeme,
            ty,
            initializer,
            is_const,
        }))
    }

    /// `function name(params) (: type)? { body }`
    fn parse_fn_decl(&mut self) -> PResult<Stmt> {
        self.consume(TokenKind::Function, "expected 'function'")?;
        let name = self.consume(TokenKind::Identifier, "expected function name")?;

        self.consume(TokenKind::LParen, "expected '(' after function name")?;
        let params = self.parse_parameter_list()?;
        self.consume(TokenKind::RParen, "expected ')' after parameters")?;

        let return_type = if self.match_kind(TokenKind::Colon) {
            Some(self.parse_type()?)
        } else {
            None
        };

        let body = self.parse_block()?;

        Ok(Stmt::FnDecl(FnDecl {
            span: name.span(),
            name: name.lexeme,
            params,
            return_type,
            body,
        }))
    }

    /// `extern function name(params) (: type)? ;`
    fn parse_extern_fn_decl(&mut self) -> PResult<Stmt> {
        self.consume(TokenKind::Extern, "expected 'extern'")?;
        self.consume(TokenKind::Function, "expected 'function' after 'extern'")?;
        let name = self.consume(TokenKind::Identifier, "expected function name")?;

        self.consume(TokenKind::LParen, "expected '(' after function name")?;
        let params = self.parse_parameter_list()?;
        self.consume(TokenKind::RParen, "expected ')' after parameters")?;

        let return_type = if self.match_kind(TokenKind::Colon) {
            Some(self.parse_type()?)
        } else {
            None
        };

        self.consume(
            TokenKind::Semicolon,
            "expected ';' after extern function declaration",
        )?;

        Ok(Stmt::ExternFnDecl(ExternFnDecl {
            span: name.span(),
            name: name.lexeme,
            params,
            return_type,
        }))
    }

    /// `(name: type, ...)` - the parentheses are consumed by the caller
    fn parse_parameter_list(&mut self) -> PResult<Vec<Param>> {
        let mut params = Vec::new();

        if !self.check(TokenKind::RParen) {
            loop {
                let name = self.consume(TokenKind::Identifier, "expected parameter name")?;
                self.consume(TokenKind::Colon, "expected ':' after parameter name")?;
                let ty = self.parse_type()?;
                params.push(Param {
                    span: name.span(),
                    name: name.lexeme,
                    ty,
                });
                if !self.match_kind(TokenKind::Comma) {
                    break;
                }
            }
        }

        Ok(params)
    }

    /// `if (cond) stmt (else stmt)?`
    fn parse_if(&mut self) -> PResult<Stmt> {
        let keyword = self.consume(TokenKind::If, "expected 'if'")?;
        self.consume(TokenKind::LParen, "expected '(' after 'if'")?;
        let condition = self.parse_expression()?;
        self.consume(TokenKind::RParen, "expected ')' after if condition")?;

        let then_branch = Box::new(self.parse_statement()?);

        let else_branch = if self.match_kind(TokenKind::Else) {
            Some(Box::new(self.parse_statement()?))
        } else {
            None
        };

        Ok(Stmt::If(IfStmt {
            span: keyword.span(),
            condition,
            then_branch,
            else_branch,
        }))
    }

    /// `while (cond) stmt`
    fn parse_while(&mut self) -> PResult<Stmt> {
        let keyword = self.consume(TokenKind::While, "expected 'while'")?;
        self.consume(TokenKind::LParen, "expected '(' after 'while'")?;
        let condition = self.parse_expression()?;
        self.consume(TokenKind::RParen, "expected ')' after while condition")?;

        let body = Box::new(self.parse_statement()?);

        Ok(Stmt::While(WhileStmt {
            span: keyword.span(),
            condition,
            body,
        }))
    }

    /// `for (init?; cond?; incr?) stmt`
    ///
    /// `init` is a variable declaration or an expression statement; each of
    /// the three head slots may be empty.
    fn parse_for(&mut self) -> PResult<Stmt> {
        let keyword = self.consume(TokenKind::For, "expected 'for'")?;
        self.consume(TokenKind::LParen, "expected '(' after 'for'")?;

        let init = if self.match_kind(TokenKind::Semicolon) {
            None
        } else if self.check(TokenKind::Let) || self.check(TokenKind::Const) {
            Some(Box::new(self.parse_var_decl()?))
        } else {
            let stmt = self.parse_expr_stmt()?;
            Some(Box::new(stmt))
        };

        let condition = if self.check(TokenKind::Semicolon) {
            None
        } else {
            Some(self.parse_expression()?)
        };
        self.consume(TokenKind::Semicolon, "expected ';' after for condition")?;

        let increment = if self.check(TokenKind::RParen) {
            None
        } else {
            Some(self.parse_expression()?)
        };
        self.consume(TokenKind::RParen, "expected ')' after for clauses")?;

        let body = Box::new(self.parse_statement()?);

        Ok(Stmt::For(ForStmt {
            span: keyword.span(),
            init,
            condition,
            increment,
            body,
        }))
    }

    /// `return expr?;`
    fn parse_return(&mut self) -> PResult<Stmt> {
        let keyword = self.consume(TokenKind::Return, "expected 'return'")?;

        let value = if self.check(TokenKind::Semicolon) {
            None
        } else {
            Some(self.parse_expression()?)
        };

        self.consume(TokenKind::Semicolon, "expected ';' after return value")?;

        Ok(Stmt::Return(ReturnStmt {
            span: keyword.span(),
            value,
        }))
    }

    /// `{ stmt* }`
    ///
    /// Recovers inside the block: a failed statement synchronizes and the
    /// loop continues, so one bad line does not swallow the whole block.
    pub(crate) fn parse_block(&mut self) -> PResult<BlockStmt> {
        let open = self.consume(TokenKind::LBrace, "expected '{'")?;

        let mut statements = Vec::new();
        while !self.check(TokenKind::RBrace) && !self.is_at_end() {
            match self.parse_statement() {
                Ok(stmt) => statements.push(stmt),
                Err(crate::ParseError) => self.synchronize(),
            }
        }

        self.consume(TokenKind::RBrace, "expected '}' after block")?;

        Ok(BlockStmt {
            span: open.span(),
            statements,
        })
    }

    /// `expr ;`
    fn parse_expr_stmt(&mut self) -> PResult<Stmt> {
        let expr = self.parse_expression()?;
        self.consume(TokenKind::Semicolon, "expected ';' after expression")?;
        Ok(Stmt::Expr(ExprStmt {
            span: expr.span(),
            expr,
        }))
    }
}

#[cfg(test)]
mod tests {
    use crate::ast::*;
    use crate::parse_source;
    use emc_util::Handler;

    fn parse_ok(source: &str) -> Program {
        let handler = Handler::new();
        let program = parse_source(source, &handler);
        assert!(
            !handler.has_errors(),
            "unexpected errors: {:?}",
            handler.diagnostics()
        );
        program
    }

    #[test]
    fn test_var_decl() {
        let program = parse_ok("let x: int32 = 42;");
        match &program.statements[0] {
            Stmt::VarDecl(v) => {
                assert_eq!(v.name, "x");
                assert_eq!(v.ty.as_deref(), Some("int32"));
                assert!(v.initializer.is_some());
                assert!(!v.is_const);
            },
            other => panic!("expected VarDecl, got {:?}", other),
        }
    }

    #[test]
    fn test_const_decl() {
        let program = parse_ok("const k: int32 = 1;");
        match &program.statements[0] {
            Stmt::VarDecl(v) => assert!(v.is_const),
            other => panic!("expected VarDecl, got {:?}", other),
        }
    }

    #[test]
    fn test_var_decl_inferred_type() {
        let program = parse_ok("let x = 5;");
        match &program.statements[0] {
            Stmt::VarDecl(v) => assert!(v.ty.is_none()),
            other => panic!("expected VarDecl, got {:?}", other),
        }
    }

    #[test]
    fn test_legacy_type_canonicalised() {
        let program = parse_ok("let x: int = 5;");
        match &program.statements[0] {
            Stmt::VarDecl(v) => assert_eq!(v.ty.as_deref(), Some("int32")),
            other => panic!("expected VarDecl, got {:?}", other),
        }
    }

    #[test]
    fn test_pointer_type() {
        let program = parse_ok("let p: int32* = null;");
        match &program.statements[0] {
            Stmt::VarDecl(v) => assert_eq!(v.ty.as_deref(), Some("int32*")),
            other => panic!("expected VarDecl, got {:?}", other),
        }
    }

    #[test]
    fn test_double_pointer_type() {
        let program = parse_ok("let pp: int32** = null;");
        match &program.statements[0] {
            Stmt::VarDecl(v) => assert_eq!(v.ty.as_deref(), Some("int32**")),
            other => panic!("expected VarDecl, got {:?}", other),
        }
    }

    #[test]
    fn test_function_decl() {
        let program = parse_ok("function add(a: int32, b: int32): int32 { return a + b; }");
        match &program.statements[0] {
            Stmt::FnDecl(f) => {
                assert_eq!(f.name, "add");
                assert_eq!(f.params.len(), 2);
                assert_eq!(f.params[0].name, "a");
                assert_eq!(f.params[1].ty, "int32");
                assert_eq!(f.return_type.as_deref(), Some("int32"));
                assert_eq!(f.body.statements.len(), 1);
            },
            other => panic!("expected FnDecl, got {:?}", other),
        }
    }

    #[test]
    fn test_function_no_return_type() {
        let program = parse_ok("function side_effect() { emlang_println(); }");
        match &program.statements[0] {
            Stmt::FnDecl(f) => assert!(f.return_type.is_none()),
            other => panic!("expected FnDecl, got {:?}", other),
        }
    }

    #[test]
    fn test_extern_fn_decl() {
        let program = parse_ok("extern function puts(s: str): int32;");
        match &program.statements[0] {
            Stmt::ExternFnDecl(f) => {
                assert_eq!(f.name, "puts");
                assert_eq!(f.params.len(), 1);
                assert_eq!(f.return_type.as_deref(), Some("int32"));
            },
            other => panic!("expected ExternFnDecl, got {:?}", other),
        }
    }

    #[test]
    fn test_if_else() {
        let program = parse_ok("function f(c: bool) { if (c) { return; } else { return; } }");
        match &program.statements[0] {
            Stmt::FnDecl(f) => match &f.body.statements[0] {
                Stmt::If(i) => assert!(i.else_branch.is_some()),
                other => panic!("expected If, got {:?}", other),
            },
            other => panic!("expected FnDecl, got {:?}", other),
        }
    }

    #[test]
    fn test_while() {
        let program = parse_ok("function f() { while (true) { } }");
        match &program.statements[0] {
            Stmt::FnDecl(f) => assert!(matches!(f.body.statements[0], Stmt::While(_))),
            other => panic!("expected FnDecl, got {:?}", other),
        }
    }

    #[test]
    fn test_for_full_head() {
        let program =
            parse_ok("function f() { for (let i: int32 = 0; i < 10; i = i + 1) { } }");
        match &program.statements[0] {
            Stmt::FnDecl(f) => match &f.body.statements[0] {
                Stmt::For(fs) => {
                    assert!(fs.init.is_some());
                    assert!(fs.condition.is_some());
                    assert!(fs.increment.is_some());
                },
                other => panic!("expected For, got {:?}", other),
            },
            other => panic!("expected FnDecl, got {:?}", other),
        }
    }

    #[test]
    fn test_for_empty_head() {
        let program = parse_ok("function f() { for (;;) { } }");
        match &program.statements[0] {
            Stmt::FnDecl(f) => match &f.body.statements[0] {
                Stmt::For(fs) => {
                    assert!(fs.init.is_none());
                    assert!(fs.condition.is_none());
                    assert!(fs.increment.is_none());
                },
                other => panic!("expected For, got {:?}", other),
            },
            other => panic!("expected FnDecl, got {:?}", other),
        }
    }

    #[test]
    fn test_return_without_value() {
        let program = parse_ok("function f() { return; }");
        match &program.statements[0] {
            Stmt::FnDecl(f) => match &f.body.statements[0] {
                Stmt::Return(r) => assert!(r.value.is_none()),
                other => panic!("expected Return, got {:?}", other),
            },
            other => panic!("expected FnDecl, got {:?}", other),
        }
    }

    #[test]
    fn test_nested_blocks() {
        let program = parse_ok("function f() { { let x = 1; { let y = 2; } } }");
        match &program.statements[0] {
            Stmt::FnDecl(f) => assert!(matches!(f.body.statements[0], Stmt::Block(_))),
            other => panic!("expected FnDecl, got {:?}", other),
        }
    }

    #[test]
    fn test_block_recovery_keeps_later_statements() {
        let handler = Handler::new();
        let program = parse_source("function f() { let = 1; let ok = 2; }", &handler);
        assert!(handler.has_errors());
        match &program.statements[0] {
            Stmt::FnDecl(f) => {
                assert!(f
                    .body
                    .statements
                    .iter()
                    .any(|s| matches!(s, Stmt::VarDecl(v) if v.name == "ok")));
            },
            other => panic!("expected FnDecl, got {:?}", other),
        }
    }

    #[test]
    fn test_statement_span_lines() {
        let program = parse_ok("let a = 1;\nlet b = 2;");
        assert_eq!(program.statements[0].span().line, 1);
        assert_eq!(program.statements[1].span().line, 2);
    }
}
