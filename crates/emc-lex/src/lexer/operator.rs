//! Operator and delimiter lexing.
//!
//! Two-character operators are greedily preferred over their one-character
//! prefixes, so `<=` never lexes as `<` `=`.

use crate::token::{Token, TokenKind};
use crate::Lexer;

impl<'a> Lexer<'a> {
    /// Lexes an operator or delimiter, or reports an unexpected character.
    pub(crate) fn lex_operator(&mut self) -> Token {
        let c = self.cursor.current_char();
        let next = self.cursor.peek_char(1);

        // Two-character operators first
        let two = match (c, next) {
            ('=', '=') => Some(TokenKind::EqEq),
            ('!', '=') => Some(TokenKind::NotEq),
            ('<', '=') => Some(TokenKind::LtEq),
            ('>', '=') => Some(TokenKind::GtEq),
            ('&', '&') => Some(TokenKind::AndAnd),
            ('|', '|') => Some(TokenKind::OrOr),
            ('<', '<') => Some(TokenKind::Shl),
            ('>', '>') => Some(TokenKind::Shr),
            _ => None,
        };
        if let Some(kind) = two {
            self.cursor.advance();
            self.cursor.advance();
            return self.make_spanned_token(kind);
        }

        let kind = match c {
            '+' => TokenKind::Plus,
            '-' => TokenKind::Minus,
            '*' => TokenKind::Star,
            '/' => TokenKind::Slash,
            '%' => TokenKind::Percent,
            '=' => TokenKind::Eq,
            '<' => TokenKind::Lt,
            '>' => TokenKind::Gt,
            '!' => TokenKind::Not,
            '&' => TokenKind::Amp,
            '|' => TokenKind::Pipe,
            '^' => TokenKind::Caret,
            '~' => TokenKind::Tilde,
            ';' => TokenKind::Semicolon,
            ',' => TokenKind::Comma,
            '.' => TokenKind::Dot,
            ':' => TokenKind::Colon,
            '(' => TokenKind::LParen,
            ')' => TokenKind::RParen,
            '{' => TokenKind::LBrace,
            '}' => TokenKind::RBrace,
            '[' => TokenKind::LBracket,
            ']' => TokenKind::RBracket,
            _ => {
                self.cursor.advance();
                self.report_error(format!("unexpected character '{}'", c));
                return self.make_token(TokenKind::Invalid, c.to_string());
            },
        };

        self.cursor.advance();
        self.make_spanned_token(kind)
    }
}
