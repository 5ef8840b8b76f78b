//! emc-par - Recursive descent parser for EMLang.
//!
//! Consumes the token vector produced by `emc-lex` and builds a [`Program`].
//! Statements parse by dispatch on the leading keyword; expressions parse by
//! precedence climbing (one function per precedence level, each looping on
//! its operators and calling the next-tighter level).
//!
//! Errors use panic-mode recovery: when a statement fails, the parser
//! records one diagnostic, discards tokens up to the next `;` or
//! statement-start keyword, and resumes. A source file with syntax errors
//! still yields a best-effort `Program` so later stages can surface related
//! diagnostics; the driver gates on the handler's error count.
//!
//! Newline tokens are preserved in the token stream by contract but carry no
//! structure, so the parser's cursor skips them.

pub mod ast;
pub mod dump;
mod expr;
mod stmt;
pub mod types;

pub use ast::*;

use emc_lex::{Token, TokenKind};
use emc_util::{Handler, Span};

/// Raised internally when a production cannot continue. The diagnostic has
/// already been recorded by the time this is constructed; recovery happens
/// at statement boundaries.
#[derive(Debug)]
pub struct ParseError;

pub(crate) type PResult<T> = Result<T, ParseError>;

/// Recursive descent parser over a token vector.
pub struct Parser<'a> {
    tokens: Vec<Token>,
    current: usize,
    handler: &'a Handler,
    next_id: u32,
}

impl<'a> Parser<'a> {
    /// Creates a parser over `tokens`, reporting errors to `handler`.
    ///
    /// Newline tokens are dropped here; they are structurally insignificant.
    pub fn new(tokens: Vec<Token>, handler: &'a Handler) -> Self {
        let mut tokens: Vec<Token> = tokens
            .into_iter()
            .filter(|t| t.kind != TokenKind::Newline)
            .collect();
        if tokens.is_empty() {
            tokens.push(Token::new(TokenKind::Eof, "", 0, 0));
        }
        Self {
            tokens,
            current: 0,
            handler,
            next_id: 0,
        }
    }

    /// Parses the whole token stream into a program.
    ///
    /// Never panics; failed statements are skipped after recovery.
    pub fn parse(mut self) -> Program {
        let mut statements = Vec::new();

        while !self.is_at_end() {
            match self.parse_statement() {
                Ok(stmt) => statements.push(stmt),
                Err(ParseError) => self.synchronize(),
            }
        }

        Program { statements }
    }

    // =========================================================================
    // Token navigation
    // =========================================================================

    pub(crate) fn current_token(&self) -> &Token {
        &self.tokens[self.current.min(self.tokens.len() - 1)]
    }

    pub(crate) fn peek(&self, offset: usize) -> &Token {
        let index = (self.current + offset).min(self.tokens.len() - 1);
        &self.tokens[index]
    }

    pub(crate) fn is_at_end(&self) -> bool {
        self.current_token().kind == TokenKind::Eof
    }

    pub(crate) fn check(&self, kind: TokenKind) -> bool {
        self.current_token().kind == kind
    }

    pub(crate) fn match_kind(&mut self, kind: TokenKind) -> bool {
        if self.check(kind) {
            self.advance();
            true
        } else {
            false
        }
    }

    pub(crate) fn advance(&mut self) -> Token {
        let token = self.current_token().clone();
        if !self.is_at_end() {
            self.current += 1;
        }
        token
    }

    pub(crate) fn previous(&self) -> &Token {
        &self.tokens[self.current.saturating_sub(1)]
    }

    /// Consumes a token of the expected kind or records an error.
    pub(crate) fn consume(&mut self, kind: TokenKind, message: &str) -> PResult<Token> {
        if self.check(kind) {
            Ok(self.advance())
        } else {
            Err(self.error_here(message))
        }
    }

    // =========================================================================
    // Errors and recovery
    // =========================================================================

    /// Records an error at the current token and returns the marker.
    pub(crate) fn error_here(&self, message: &str) -> ParseError {
        let tok = self.current_token();
        let detail = if tok.kind == TokenKind::Eof {
            format!("{}, found end of file", message)
        } else {
            format!("{}, found '{}'", message, tok.lexeme)
        };
        self.handler.error(detail, tok.span());
        ParseError
    }

    /// Records an error at an explicit span.
    pub(crate) fn error_at(&self, message: impl Into<String>, span: Span) {
        self.handler.error(message, span);
    }

    /// Panic-mode recovery: discard tokens until a statement boundary.
    ///
    /// Stops just past the next `;`, or just before a statement-start
    /// keyword (which the retry loop then parses normally). Every statement
    /// production consumes at least its leading keyword, so stopping on one
    /// cannot loop.
    pub(crate) fn synchronize(&mut self) {
        while !self.is_at_end() {
            match self.current_token().kind {
                TokenKind::Semicolon => {
                    self.advance();
                    return;
                },
                TokenKind::Function
                | TokenKind::Extern
                | TokenKind::Let
                | TokenKind::Const
                | TokenKind::For
                | TokenKind::If
                | TokenKind::While
                | TokenKind::Return => return,
                _ => {
                    self.advance();
                },
            }
        }
    }

    /// Allocates the next expression node id.
    pub(crate) fn fresh_id(&mut self) -> NodeId {
        let id = NodeId(self.next_id);
        self.next_id += 1;
        id
    }
}

/// Convenience: lex and parse a source string in one step.
pub fn parse_source(source: &str, handler: &Handler) -> Program {
    let tokens = emc_lex::Lexer::new(source, handler).tokenize();
    Parser::new(tokens, handler).parse()
}

#[cfg(test)]
mod tests {
    use super::*;

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

    fn parse_err(source: &str) -> (Program, Handler) {
        let handler = Handler::new();
        let program = parse_source(source, &handler);
        assert!(handler.has_errors(), "expected errors for {:?}", source);
        (program, handler)
    }

    #[test]
    fn test_empty_program() {
        let program = parse_ok("");
        assert!(program.statements.is_empty());
    }

    #[test]
    fn test_newlines_only() {
        let program = parse_ok("\n\n\n");
        assert!(program.statements.is_empty());
    }

    #[test]
    fn test_top_level_order() {
        let program = parse_ok("let a = 1;\nlet b = 2;\nfunction f() {}\n");
        assert_eq!(program.statements.len(), 3);
        assert!(matches!(program.statements[0], Stmt::VarDecl(_)));
        assert!(matches!(program.statements[2], Stmt::FnDecl(_)));
    }

    #[test]
    fn test_missing_semicolon_recovers() {
        let (program, handler) = parse_err("let a = 1\nlet b = 2;");
        assert_eq!(handler.error_count(), 1);
        // Recovery resumes at `let`, so the second declaration survives
        assert!(program
            .statements
            .iter()
            .any(|s| matches!(s, Stmt::VarDecl(v) if v.name == "b")));
    }

    #[test]
    fn test_two_independent_errors() {
        let (_, handler) = parse_err("let = 1;\nconst = 2;\nlet ok = 3;");
        assert_eq!(handler.error_count(), 2);
    }

    #[test]
    fn test_multiline_expression() {
        // Newlines inside an expression are insignificant
        let program = parse_ok("let x = 1 +\n2;");
        assert_eq!(program.statements.len(), 1);
    }

    #[test]
    fn test_node_ids_unique() {
        let handler = Handler::new();
        let program = parse_source("let x = 1 + 2 * 3;", &handler);
        let mut ids = Vec::new();
        fn collect(expr: &Expr, ids: &mut Vec<NodeId>) {
            ids.push(expr.id());
            if let Expr::Binary(b) = expr {
                collect(&b.left, ids);
                collect(&b.right, ids);
            }
        }
        if let Stmt::VarDecl(v) = &program.statements[0] {
            collect(v.initializer.as_ref().unwrap(), &mut ids);
        }
        let len = ids.len();
        ids.sort();
        ids.dedup();
        assert_eq!(ids.len(), len);
    }
}
