//! Number literal lexing.
//!
//! Numeric literals are decimal only. The lexer reads the maximal run of
//! digits containing at most one `.`; the presence of the dot decides
//! between `Int` and `Float`. Range checking happens later, in semantic
//! analysis, against the declared type's width.

use crate::token::{Token, TokenKind};
use crate::Lexer;

impl<'a> Lexer<'a> {
    /// Lexes a decimal integer or floating point literal.
    pub(crate) fn lex_number(&mut self) -> Token {
        let mut has_dot = false;

        loop {
            let c = self.cursor.current_char();
            if c.is_ascii_digit() {
                self.cursor.advance();
            } else if c == '.' && !has_dot && self.cursor.peek_char(1).is_ascii_digit() {
                has_dot = true;
                self.cursor.advance();
            } else {
                break;
            }
        }

        let kind = if has_dot {
            TokenKind::Float
        } else {
            TokenKind::Int
        };
        self.make_spanned_token(kind)
    }
}
