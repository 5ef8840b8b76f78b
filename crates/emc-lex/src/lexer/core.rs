//! Core lexer implementation.
//!
//! This module contains the main Lexer struct, the per-character dispatch,
//! and the `tokenize` entry point.

use emc_util::{Handler, Span};

use crate::cursor::Cursor;
use crate::token::{Token, TokenKind};

/// Lexer for EMLang source code.
///
/// Produces tokens on demand via [`next_token`](Lexer::next_token) or all at
/// once via [`tokenize`](Lexer::tokenize). Errors go to the shared diagnostic
/// handler; the lexer itself never fails.
pub struct Lexer<'a> {
    /// Character cursor for source traversal.
    pub(crate) cursor: Cursor<'a>,

    /// Error handler for reporting lexical errors.
    handler: &'a Handler,

    /// Starting byte offset of the current token.
    pub(crate) token_start: usize,

    /// Line where the current token starts (1-based).
    token_start_line: u32,

    /// Column where the current token starts (1-based).
    token_start_column: u32,
}

impl<'a> Lexer<'a> {
    /// Creates a new lexer over `source` reporting errors to `handler`.
    pub fn new(source: &'a str, handler: &'a Handler) -> Self {
        Self {
            cursor: Cursor::new(source),
            handler,
            token_start: 0,
            token_start_line: 1,
            token_start_column: 1,
        }
    }

    /// Lexes the entire source into a token vector.
    ///
    /// The result preserves source order, keeps newline tokens, and ends
    /// with exactly one EOF token. Invalid input produces `Invalid` tokens
    /// alongside reported errors; the vector is always well-formed.
    pub fn tokenize(mut self) -> Vec<Token> {
        let mut tokens = Vec::new();
        loop {
            let token = self.next_token();
            let done = token.kind == TokenKind::Eof;
            tokens.push(token);
            if done {
                break;
            }
        }
        tokens
    }

    /// Returns the next token from the source.
    ///
    /// Skips whitespace and comments, records the token start position, and
    /// dispatches on the lookahead character.
    pub fn next_token(&mut self) -> Token {
        self.skip_whitespace_and_comments();

        self.token_start = self.cursor.position();
        self.token_start_line = self.cursor.line();
        self.token_start_column = self.cursor.column();

        if self.cursor.is_at_end() {
            return self.make_token(TokenKind::Eof, "");
        }

        match self.cursor.current_char() {
            '\n' => {
                self.cursor.advance();
                self.make_token(TokenKind::Newline, "\n")
            },
            '"' => self.lex_string(),
            '\'' => self.lex_char(),
            c if c.is_ascii_digit() => self.lex_number(),
            c if c.is_ascii_alphabetic() || c == '_' => self.lex_identifier(),
            _ => self.lex_operator(),
        }
    }

    /// Builds a token positioned at the current token start.
    pub(crate) fn make_token(&self, kind: TokenKind, lexeme: impl Into<String>) -> Token {
        Token::new(kind, lexeme, self.token_start_line, self.token_start_column)
    }

    /// Builds a token whose lexeme is the source slice since the token start.
    pub(crate) fn make_spanned_token(&self, kind: TokenKind) -> Token {
        let lexeme = self.cursor.slice_from(self.token_start).to_string();
        self.make_token(kind, lexeme)
    }

    /// Reports a lexical error at the current token position.
    pub(crate) fn report_error(&self, message: impl Into<String>) {
        let span = Span::new(
            self.token_start,
            self.cursor.position(),
            self.token_start_line,
            self.token_start_column,
        );
        self.handler.error(message, span);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lex(source: &str) -> (Vec<Token>, Handler) {
        let handler = Handler::new();
        let tokens = {
            let lexer = Lexer::new(source, &handler);
            lexer.tokenize()
        };
        (tokens, handler)
    }

    fn kinds(tokens: &[Token]) -> Vec<TokenKind> {
        tokens.iter().map(|t| t.kind).collect()
    }

    #[test]
    fn test_empty_source() {
        let (tokens, handler) = lex("");
        assert_eq!(kinds(&tokens), vec![TokenKind::Eof]);
        assert!(!handler.has_errors());
    }

    #[test]
    fn test_single_eof() {
        let (tokens, _) = lex("let x = 1;");
        let eofs = tokens.iter().filter(|t| t.is_eof()).count();
        assert_eq!(eofs, 1);
        assert!(tokens.last().unwrap().is_eof());
    }

    #[test]
    fn test_variable_declaration() {
        let (tokens, handler) = lex("let x: int32 = 42;");
        assert!(!handler.has_errors());
        assert_eq!(
            kinds(&tokens),
            vec![
                TokenKind::Let,
                TokenKind::Identifier,
                TokenKind::Colon,
                TokenKind::TypeName,
                TokenKind::Eq,
                TokenKind::Int,
                TokenKind::Semicolon,
                TokenKind::Eof,
            ]
        );
        assert_eq!(tokens[1].lexeme, "x");
        assert_eq!(tokens[3].lexeme, "int32");
        assert_eq!(tokens[5].lexeme, "42");
    }

    #[test]
    fn test_newlines_preserved() {
        let (tokens, _) = lex("let a;\nlet b;");
        assert!(tokens.iter().any(|t| t.kind == TokenKind::Newline));
    }

    #[test]
    fn test_positions() {
        let (tokens, _) = lex("let x;\nlet y;");
        // `y` is on line 2, column 5
        let y = tokens
            .iter()
            .find(|t| t.kind == TokenKind::Identifier && t.lexeme == "y")
            .unwrap();
        assert_eq!(y.line, 2);
        assert_eq!(y.column, 5);
    }

    #[test]
    fn test_unexpected_character() {
        let (tokens, handler) = lex("let @ x;");
        assert!(handler.has_errors());
        assert_eq!(handler.error_count(), 1);
        let invalid = tokens.iter().find(|t| t.kind == TokenKind::Invalid).unwrap();
        assert_eq!(invalid.lexeme, "@");
        // Lexing continued past the bad byte
        assert!(tokens.iter().any(|t| t.lexeme == "x"));
        assert!(tokens.last().unwrap().is_eof());
    }

    #[test]
    fn test_comments_discarded() {
        let (tokens, handler) = lex("// line\n/* block */ /** doc */ let x;");
        assert!(!handler.has_errors());
        assert!(tokens.iter().any(|t| t.kind == TokenKind::Let));
        assert!(!tokens.iter().any(|t| t.lexeme.contains("block")));
    }

    #[test]
    fn test_unterminated_block_comment() {
        let (tokens, handler) = lex("let x; /* never closed");
        assert!(handler.has_errors());
        assert!(tokens.last().unwrap().is_eof());
    }

    #[test]
    fn test_function_header() {
        let (tokens, handler) = lex("function add(a: int32, b: int32): int32 { return a + b; }");
        assert!(!handler.has_errors());
        assert_eq!(tokens[0].kind, TokenKind::Function);
        assert_eq!(tokens[1].lexeme, "add");
        assert!(tokens.iter().any(|t| t.kind == TokenKind::Return));
        assert!(tokens.iter().any(|t| t.kind == TokenKind::Plus));
    }

    #[test]
    fn test_relex_concatenated_lexemes() {
        // Re-lexing the joined lexemes reproduces the same kinds
        let (tokens, _) = lex("let x = 1 + 2;");
        let joined: String = tokens
            .iter()
            .filter(|t| !t.is_eof())
            .map(|t| format!("{} ", t.lexeme))
            .collect();
        let (relexed, handler) = lex(&joined);
        assert!(!handler.has_errors());
        let orig: Vec<TokenKind> = tokens
            .iter()
            .filter(|t| t.kind != TokenKind::Newline)
            .map(|t| t.kind)
            .collect();
        let again: Vec<TokenKind> = relexed
            .iter()
            .filter(|t| t.kind != TokenKind::Newline)
            .map(|t| t.kind)
            .collect();
        assert_eq!(orig, again);
    }
}
